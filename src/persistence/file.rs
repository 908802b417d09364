use super::PersistenceResult;
use crate::engine::ProjectBudgetReport;
use crate::portfolio::{IssuedIds, Portfolio};
use crate::project::{Client, Project};
use crate::rate_card::RateCardEntry;
use serde::{Deserialize, Serialize};
use std::fs::File;
use std::io::Write;
use std::path::Path;
use tracing::info;

/// On-disk shape of a portfolio.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct PortfolioSnapshot {
    #[serde(default)]
    pub clients: Vec<Client>,
    #[serde(default)]
    pub projects: Vec<Project>,
    #[serde(default)]
    pub rate_cards: Vec<RateCardEntry>,
    #[serde(default)]
    pub issued_ids: IssuedIds,
}

impl PortfolioSnapshot {
    pub fn from_portfolio(portfolio: &Portfolio) -> Self {
        Self {
            clients: portfolio.clients().to_vec(),
            projects: portfolio.projects().to_vec(),
            rate_cards: portfolio.rate_cards().to_vec(),
            issued_ids: portfolio.issued_ids(),
        }
    }

    pub fn into_portfolio(self) -> PersistenceResult<Portfolio> {
        let portfolio = Portfolio::from_parts(self.clients, self.projects, self.rate_cards)?;
        Ok(portfolio.with_issued_ids(self.issued_ids))
    }
}

pub fn save_portfolio_to_json<P: AsRef<Path>>(
    portfolio: &Portfolio,
    path: P,
) -> PersistenceResult<()> {
    let snapshot = PortfolioSnapshot::from_portfolio(portfolio);
    let file = File::create(path.as_ref())?;
    serde_json::to_writer_pretty(file, &snapshot)?;
    info!(
        path = %path.as_ref().display(),
        projects = snapshot.projects.len(),
        "portfolio saved"
    );
    Ok(())
}

pub fn load_portfolio_from_json<P: AsRef<Path>>(path: P) -> PersistenceResult<Portfolio> {
    let file = File::open(path.as_ref())?;
    let snapshot: PortfolioSnapshot = serde_json::from_reader(file)?;
    let portfolio = snapshot.into_portfolio()?;
    info!(
        path = %path.as_ref().display(),
        projects = portfolio.projects().len(),
        "portfolio loaded"
    );
    Ok(portfolio)
}

#[derive(Serialize)]
struct LineItemCsvRecord {
    resource_id: String,
    resource_name: String,
    level: String,
    days_total: i64,
    working_days: i64,
    rate: String,
    cost: String,
}

const TOTAL_ROW_ID: &str = "TOTAL";

/// Writes one row per line item followed by a `TOTAL` row whose name column
/// carries the budget status.
pub fn write_report_csv<W: Write>(
    report: &ProjectBudgetReport,
    writer: W,
) -> PersistenceResult<()> {
    let mut writer = csv::Writer::from_writer(writer);
    for item in &report.line_items {
        writer.serialize(LineItemCsvRecord {
            resource_id: item.resource_id.clone(),
            resource_name: item.resource_name.clone(),
            level: item.level.to_string(),
            days_total: item.days_total,
            working_days: item.working_days,
            rate: format_amount(item.rate),
            cost: format_amount(item.cost),
        })?;
    }

    writer.serialize(LineItemCsvRecord {
        resource_id: TOTAL_ROW_ID.to_string(),
        resource_name: report.reconciliation.status.to_string(),
        level: String::new(),
        days_total: report.line_items.iter().map(|item| item.days_total).sum(),
        working_days: report.line_items.iter().map(|item| item.working_days).sum(),
        rate: String::new(),
        cost: format_amount(report.reconciliation.total_spend),
    })?;
    writer.flush()?;
    Ok(())
}

pub fn save_report_to_csv<P: AsRef<Path>>(
    report: &ProjectBudgetReport,
    path: P,
) -> PersistenceResult<()> {
    let file = File::create(path)?;
    write_report_csv(report, file)
}

fn format_amount(value: f64) -> String {
    format!("{value:.2}")
}
