#![cfg(feature = "sqlite")]

use chrono::NaiveDate;
use resource_ledger::{
    NewAllocationRequest, NewClientRequest, NewProjectRequest, NewRateCardRequest,
    NewRequirementRequest, Portfolio, PortfolioStore, SqlitePortfolioStore,
};
use tempfile::NamedTempFile;

fn d(y: i32, m: u32, d: u32) -> NaiveDate {
    NaiveDate::from_ymd_opt(y, m, d).unwrap()
}

fn populated_portfolio() -> Portfolio {
    let mut portfolio = Portfolio::new();
    let client = portfolio
        .create_client(NewClientRequest {
            name: "Globex".into(),
            contact_email: None,
        })
        .expect("create client");
    portfolio
        .create_project(NewProjectRequest {
            name: "Billing rewrite".into(),
            client_id: Some(client.id),
            quoted_budget: 42_000.0,
        })
        .expect("create project");
    portfolio
        .upsert_rate_card(NewRateCardRequest {
            level: "SR".into(),
            rate: 320.0,
            project_id: None,
        })
        .expect("global rate");
    portfolio
        .upsert_rate_card(NewRateCardRequest {
            level: "SR".into(),
            rate: 360.0,
            project_id: Some(1),
        })
        .expect("project rate");
    portfolio
        .allocate(
            1,
            NewAllocationRequest {
                resource_id: "emp-7".into(),
                resource_name: "Hedy".into(),
                level: "SR".into(),
                start_date: d(2025, 1, 6),
                end_date: None,
            },
        )
        .expect("allocate");
    portfolio
        .add_requirement(1, NewRequirementRequest { level: "SR".into(), quantity: 2 })
        .expect("requirement");
    portfolio
}

#[test]
fn empty_store_has_no_portfolio() {
    let store = SqlitePortfolioStore::in_memory().unwrap();
    assert!(store.load_portfolio().unwrap().is_none());
}

#[test]
fn empty_portfolio_is_distinct_from_nothing_saved() {
    let store = SqlitePortfolioStore::in_memory().unwrap();
    store.save_portfolio(&Portfolio::new()).unwrap();
    assert_eq!(store.load_portfolio().unwrap(), Some(Portfolio::new()));
}

#[test]
fn sqlite_store_round_trip_portfolio() {
    let file = NamedTempFile::new().unwrap();
    let portfolio = populated_portfolio();
    {
        let store = SqlitePortfolioStore::new(file.path()).unwrap();
        store.save_portfolio(&portfolio).unwrap();
    }

    let reopened = SqlitePortfolioStore::new(file.path()).unwrap();
    let loaded = reopened.load_portfolio().unwrap().expect("stored portfolio");
    assert_eq!(loaded, portfolio);

    let report = loaded.budget_report(1, d(2025, 1, 6)).unwrap();
    assert_eq!(report.line_items[0].rate, 360.0);
    assert_eq!(report.open_positions[0].remaining, 1);
}

#[test]
fn saving_replaces_previous_contents() {
    let store = SqlitePortfolioStore::in_memory().unwrap();
    let mut portfolio = populated_portfolio();
    store.save_portfolio(&portfolio).unwrap();

    assert!(portfolio.delete_project(1));
    store.save_portfolio(&portfolio).unwrap();

    let mut loaded = store.load_portfolio().unwrap().unwrap();
    assert!(loaded.projects().is_empty());
    assert_eq!(loaded.rate_cards().len(), 1);
    assert_eq!(loaded.clients().len(), 1);

    let next = loaded
        .create_project(NewProjectRequest {
            name: "Successor".into(),
            client_id: None,
            quoted_budget: 1.0,
        })
        .unwrap();
    assert_eq!(next.id, 2);
}
