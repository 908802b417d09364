use crate::level::ResourceLevel;
use chrono::NaiveDate;
use thiserror::Error;

/// Inputs the cost engine refuses to reconcile.
///
/// A level with no project or global rate is not an error: it is costed at a
/// zero rate. Empty allocation or requirement lists are valid too.
#[derive(Debug, Clone, PartialEq, Error)]
pub enum CostError {
    #[error("allocation for '{resource_id}' ends on {end} before it starts on {start}")]
    InvalidDateRange {
        resource_id: String,
        start: NaiveDate,
        end: NaiveDate,
    },
    #[error("quoted budget {0} must be a finite, non-negative amount")]
    InvalidBudget(f64),
    #[error("rate {rate} for level '{level}' must be a finite, non-negative amount")]
    InvalidRate { level: ResourceLevel, rate: f64 },
}

pub type CostResult<T> = Result<T, CostError>;
