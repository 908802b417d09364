use super::costing::LineItemCost;
use crate::error::{CostError, CostResult};
use crate::level::ResourceLevel;
use serde::{Deserialize, Serialize};
use std::fmt;

/// Absolute currency delta within which spend and quoted budget count as equal.
pub const BUDGET_TOLERANCE: f64 = 50.0;

/// How total spend compares with the quoted budget.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum BudgetStatus {
    /// Spend is within the tolerance band of the quoted budget.
    Exact,
    /// Spend is below budget: money is left over.
    Surplus,
    /// Spend is above budget.
    Deficit,
}

impl BudgetStatus {
    pub fn as_str(&self) -> &'static str {
        match self {
            BudgetStatus::Exact => "exact",
            BudgetStatus::Surplus => "surplus",
            BudgetStatus::Deficit => "deficit",
        }
    }

    pub fn is_over_budget(&self) -> bool {
        matches!(self, BudgetStatus::Deficit)
    }
}

impl fmt::Display for BudgetStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Reconciliation {
    pub total_spend: f64,
    pub quoted_budget: f64,
    /// `quoted_budget - total_spend`; positive when money is left over.
    pub variance: f64,
    pub status: BudgetStatus,
}

impl Reconciliation {
    /// Share of the quoted budget consumed. `None` for a zero budget.
    pub fn utilization(&self) -> Option<f64> {
        (self.quoted_budget > 0.0).then(|| self.total_spend / self.quoted_budget)
    }
}

pub fn validate_budget(quoted_budget: f64) -> CostResult<()> {
    if !quoted_budget.is_finite() || quoted_budget < 0.0 {
        return Err(CostError::InvalidBudget(quoted_budget));
    }
    Ok(())
}

/// Status for a given spend and budget, using [`BUDGET_TOLERANCE`] exclusively:
/// a delta of exactly 50 is outside the band.
pub fn budget_status(total_spend: f64, quoted_budget: f64) -> BudgetStatus {
    if (total_spend - quoted_budget).abs() < BUDGET_TOLERANCE {
        BudgetStatus::Exact
    } else if total_spend < quoted_budget {
        BudgetStatus::Surplus
    } else {
        BudgetStatus::Deficit
    }
}

/// Sums line-item costs in input order and classifies them against the budget.
pub fn classify(line_items: &[LineItemCost], quoted_budget: f64) -> CostResult<Reconciliation> {
    validate_budget(quoted_budget)?;
    let total_spend = line_items.iter().fold(0.0, |acc, item| acc + item.cost);
    Ok(Reconciliation {
        total_spend,
        quoted_budget,
        variance: quoted_budget - total_spend,
        status: budget_status(total_spend, quoted_budget),
    })
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct LevelSpend {
    pub level: ResourceLevel,
    pub working_days: i64,
    pub cost: f64,
}

/// Spend per level, in order of each level's first appearance.
pub fn spend_by_level(line_items: &[LineItemCost]) -> Vec<LevelSpend> {
    let mut totals: Vec<LevelSpend> = Vec::new();
    for item in line_items {
        match totals.iter_mut().find(|entry| entry.level == item.level) {
            Some(entry) => {
                entry.working_days += item.working_days;
                entry.cost += item.cost;
            }
            None => totals.push(LevelSpend {
                level: item.level.clone(),
                working_days: item.working_days,
                cost: item.cost,
            }),
        }
    }
    totals
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn tolerance_band_is_exclusive() {
        assert_eq!(budget_status(1049.0, 1000.0), BudgetStatus::Exact);
        assert_eq!(budget_status(1050.0, 1000.0), BudgetStatus::Deficit);
        assert_eq!(budget_status(1051.0, 1000.0), BudgetStatus::Deficit);
        assert_eq!(budget_status(951.0, 1000.0), BudgetStatus::Exact);
        assert_eq!(budget_status(950.0, 1000.0), BudgetStatus::Surplus);
    }

    #[test]
    fn rejects_unusable_budgets() {
        assert_eq!(classify(&[], -1.0), Err(CostError::InvalidBudget(-1.0)));
        assert!(classify(&[], f64::NAN).is_err());
        assert!(classify(&[], f64::INFINITY).is_err());
    }

    #[test]
    fn empty_spend_against_zero_budget_is_exact() {
        let result = classify(&[], 0.0).unwrap();
        assert_eq!(result.total_spend, 0.0);
        assert_eq!(result.status, BudgetStatus::Exact);
        assert_eq!(result.utilization(), None);
    }
}
