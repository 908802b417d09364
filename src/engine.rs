use crate::calculations::{
    LevelSpend, LineItemCost, OpenPosition, Reconciliation, classify, compute_line_items,
    find_open_positions, reconciliation::validate_budget, spend_by_level,
};
use crate::error::CostResult;
use crate::project::Project;
use crate::rate_card::{RateBook, RateCardEntry};
use chrono::NaiveDate;
use rayon::prelude::*;
use serde::{Deserialize, Serialize};
use tracing::{debug, warn};

/// Everything a budget view renders for one project.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ProjectBudgetReport {
    pub project_id: u32,
    pub reference_date: NaiveDate,
    pub line_items: Vec<LineItemCost>,
    pub spend_by_level: Vec<LevelSpend>,
    pub reconciliation: Reconciliation,
    pub open_positions: Vec<OpenPosition>,
}

impl ProjectBudgetReport {
    pub fn to_cli_summary(&self) -> String {
        let mut parts = vec![
            format!("project={}", self.project_id),
            format!("as_of={}", self.reference_date),
            format!("spend={:.2}", self.reconciliation.total_spend),
            format!("budget={:.2}", self.reconciliation.quoted_budget),
            format!("status={}", self.reconciliation.status),
        ];
        if !self.open_positions.is_empty() {
            let open = self
                .open_positions
                .iter()
                .map(|position| format!("{}x{}", position.level, position.remaining))
                .collect::<Vec<_>>()
                .join(",");
            parts.push(format!("open={}", open));
        }
        parts.join(", ")
    }
}

/// Runs costing, classification and gap analysis for one project snapshot.
///
/// The budget is checked before any costing so a bad budget is reported even
/// when allocations are also broken.
pub fn reconcile_project(
    project: &Project,
    rates: &RateBook,
    reference_date: NaiveDate,
) -> CostResult<ProjectBudgetReport> {
    validate_budget(project.quoted_budget)?;
    let line_items = compute_line_items(
        &project.allocations,
        &rates.project,
        &rates.global,
        reference_date,
    )?;
    let reconciliation = classify(&line_items, project.quoted_budget)?;
    let open_positions = find_open_positions(&project.requirements, &project.allocations);

    debug!(
        project_id = project.id,
        line_items = line_items.len(),
        total_spend = reconciliation.total_spend,
        status = %reconciliation.status,
        "reconciled project budget"
    );

    Ok(ProjectBudgetReport {
        project_id: project.id,
        reference_date,
        spend_by_level: spend_by_level(&line_items),
        line_items,
        reconciliation,
        open_positions,
    })
}

/// Reconciles every project independently and in parallel. Results keep the
/// input order; one project's rejection does not affect the others.
pub fn reconcile_portfolio(
    projects: &[Project],
    rate_cards: &[RateCardEntry],
    reference_date: NaiveDate,
) -> Vec<(u32, CostResult<ProjectBudgetReport>)> {
    projects
        .par_iter()
        .map(|project| {
            let rates = RateBook::for_project(project.id, rate_cards);
            let result = reconcile_project(project, &rates, reference_date);
            if let Err(err) = &result {
                warn!(project_id = project.id, error = %err, "project budget rejected");
            }
            (project.id, result)
        })
        .collect()
}
