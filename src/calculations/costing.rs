use crate::allocation::AllocatedResource;
use crate::error::{CostError, CostResult};
use crate::level::ResourceLevel;
use crate::rate_card::{RateTable, resolve_rate};
use chrono::NaiveDate;
use serde::{Deserialize, Serialize};

/// Working days billed per calendar year. A policy ratio, not a calendar.
pub const WORKING_DAYS_PER_YEAR: i64 = 235;
pub const CALENDAR_DAYS_PER_YEAR: i64 = 365;

/// Cost of a single allocation. Derived on every reconciliation, never stored.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct LineItemCost {
    pub resource_id: String,
    pub resource_name: String,
    pub level: ResourceLevel,
    /// Calendar days covered, counting both endpoints.
    pub days_total: i64,
    pub working_days: i64,
    pub rate: f64,
    pub cost: f64,
}

/// Inclusive calendar-day span between two dates. `None` when `end` precedes
/// `start`.
pub fn inclusive_days(start: NaiveDate, end: NaiveDate) -> Option<i64> {
    let span = (end - start).num_days();
    (span >= 0).then_some(span + 1)
}

/// Converts calendar days to billable working days at 235/365, rounded to
/// the nearest day.
///
/// 235/365 reduces to 47/73, so the scaled value never lands exactly on a
/// half and adding `365 / 2` before dividing rounds correctly.
pub fn working_days(days_total: i64) -> i64 {
    (days_total * WORKING_DAYS_PER_YEAR + CALENDAR_DAYS_PER_YEAR / 2) / CALENDAR_DAYS_PER_YEAR
}

/// Costs every allocation against the project and global rate tables.
///
/// Output order matches input order, one line item per allocation. Open
/// allocations run through `reference_date`, which callers pass explicitly.
pub fn compute_line_items(
    allocations: &[AllocatedResource],
    project_rates: &RateTable,
    global_rates: &RateTable,
    reference_date: NaiveDate,
) -> CostResult<Vec<LineItemCost>> {
    allocations
        .iter()
        .map(|allocation| line_item(allocation, project_rates, global_rates, reference_date))
        .collect()
}

fn line_item(
    allocation: &AllocatedResource,
    project_rates: &RateTable,
    global_rates: &RateTable,
    reference_date: NaiveDate,
) -> CostResult<LineItemCost> {
    let end = allocation.effective_end(reference_date);
    let days_total =
        inclusive_days(allocation.start_date, end).ok_or_else(|| CostError::InvalidDateRange {
            resource_id: allocation.resource_id.clone(),
            start: allocation.start_date,
            end,
        })?;

    let rate = resolve_rate(&allocation.level, project_rates, global_rates);
    if !rate.is_finite() || rate < 0.0 {
        return Err(CostError::InvalidRate {
            level: allocation.level.clone(),
            rate,
        });
    }

    let working_days = working_days(days_total);
    Ok(LineItemCost {
        resource_id: allocation.resource_id.clone(),
        resource_name: allocation.resource_name.clone(),
        level: allocation.level.clone(),
        days_total,
        working_days,
        rate,
        cost: working_days as f64 * rate,
    })
}
