use anyhow::{Context, anyhow};
use chrono::{Local, NaiveDate};
use clap::{Parser, Subcommand};
use resource_ledger::{
    LogConfig, Portfolio, ProjectBudgetReport, load_portfolio_from_json, save_report_to_csv,
    telemetry::init_tracing,
};
use std::path::PathBuf;

#[derive(Debug, Parser)]
#[command(name = "ledger", about = "Budget reconciliation over a portfolio snapshot")]
struct Cli {
    #[command(subcommand)]
    command: Command,
}

#[derive(Debug, Subcommand)]
enum Command {
    /// Cost breakdown and budget status for one project
    Report {
        snapshot: PathBuf,
        project_id: u32,
        /// Reference date for open allocations (defaults to today)
        #[arg(long)]
        as_of: Option<NaiveDate>,
        /// Also write the line items to this CSV file
        #[arg(long)]
        csv: Option<PathBuf>,
    },
    /// Levels still short of required headcount
    OpenPositions { snapshot: PathBuf, project_id: u32 },
    /// One status line per project
    Summary {
        snapshot: PathBuf,
        #[arg(long)]
        as_of: Option<NaiveDate>,
    },
}

fn render_row<'a>(widths: &[usize], cells: impl Iterator<Item = &'a str>) -> String {
    let mut line = String::from("|");
    for (ci, cell) in cells.enumerate() {
        line.push(' ');
        line.push_str(cell);
        line.push_str(&" ".repeat(widths[ci].saturating_sub(cell.len())));
        line.push_str(" |");
    }
    line
}

fn render_text_table(headers: &[&str], rows: &[Vec<String>]) -> String {
    let mut widths: Vec<usize> = headers.iter().map(|h| h.len()).collect();
    for row in rows {
        for (ci, cell) in row.iter().enumerate() {
            if cell.len() > widths[ci] {
                widths[ci] = cell.len();
            }
        }
    }

    let mut sep = String::from("+");
    for w in &widths {
        sep.push_str(&"-".repeat(*w + 2));
        sep.push('+');
    }

    let mut out = String::new();
    out.push_str(&sep);
    out.push('\n');
    out.push_str(&render_row(&widths, headers.iter().copied()));
    out.push('\n');
    out.push_str(&sep);
    out.push('\n');
    for row in rows {
        out.push_str(&render_row(&widths, row.iter().map(String::as_str)));
        out.push('\n');
    }
    out.push_str(&sep);
    out
}

fn print_report(portfolio: &Portfolio, report: &ProjectBudgetReport) {
    let name = portfolio
        .find_project(report.project_id)
        .map(|p| p.name.as_str())
        .unwrap_or_default();
    println!("Project {} ({}) as of {}", report.project_id, name, report.reference_date);

    let rows: Vec<Vec<String>> = report
        .line_items
        .iter()
        .map(|item| {
            vec![
                item.resource_id.clone(),
                item.resource_name.clone(),
                item.level.to_string(),
                item.days_total.to_string(),
                item.working_days.to_string(),
                format!("{:.2}", item.rate),
                format!("{:.2}", item.cost),
            ]
        })
        .collect();
    println!(
        "{}",
        render_text_table(
            &["resource", "name", "level", "days", "working_days", "rate", "cost"],
            &rows
        )
    );

    let reconciliation = &report.reconciliation;
    println!("Total spend   : {:.2}", reconciliation.total_spend);
    println!("Quoted budget : {:.2}", reconciliation.quoted_budget);
    println!("Variance      : {:.2}", reconciliation.variance);
    println!("Status        : {}", reconciliation.status);
    if let Some(utilization) = reconciliation.utilization() {
        println!("Utilization   : {:.1}%", utilization * 100.0);
    }
    for position in &report.open_positions {
        println!(
            "Open position : {} ({} of {} unfilled)",
            position.level, position.remaining, position.required
        );
    }
}

fn today() -> NaiveDate {
    Local::now().date_naive()
}

fn main() -> anyhow::Result<()> {
    let cli = Cli::parse();
    let log = LogConfig {
        default_filter: "resource_ledger=warn".to_string(),
        json: false,
    };
    init_tracing(&log).map_err(|err| anyhow!("failed to install tracing subscriber: {err}"))?;

    match cli.command {
        Command::Report {
            snapshot,
            project_id,
            as_of,
            csv,
        } => {
            let portfolio = load_portfolio_from_json(&snapshot)
                .with_context(|| format!("failed to load {}", snapshot.display()))?;
            let report = portfolio.budget_report(project_id, as_of.unwrap_or_else(today))?;
            print_report(&portfolio, &report);
            if let Some(path) = csv {
                save_report_to_csv(&report, &path)?;
                println!("Line items written to {}", path.display());
            }
        }
        Command::OpenPositions {
            snapshot,
            project_id,
        } => {
            let portfolio = load_portfolio_from_json(&snapshot)
                .with_context(|| format!("failed to load {}", snapshot.display()))?;
            let positions = portfolio.open_positions(project_id)?;
            if positions.is_empty() {
                println!("Project {project_id} is fully staffed.");
            }
            let rows: Vec<Vec<String>> = positions
                .iter()
                .map(|p| vec![p.level.to_string(), p.required.to_string(), p.remaining.to_string()])
                .collect();
            if !rows.is_empty() {
                println!("{}", render_text_table(&["level", "required", "remaining"], &rows));
            }
        }
        Command::Summary { snapshot, as_of } => {
            let portfolio = load_portfolio_from_json(&snapshot)
                .with_context(|| format!("failed to load {}", snapshot.display()))?;
            for (project_id, result) in portfolio.portfolio_reports(as_of.unwrap_or_else(today)) {
                match result {
                    Ok(report) => println!("{}", report.to_cli_summary()),
                    Err(err) => println!("project={project_id}, error={err}"),
                }
            }
        }
    }
    Ok(())
}
