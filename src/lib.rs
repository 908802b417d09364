//! Cost reconciliation for project resourcing: rate resolution, allocation
//! costing, budget classification and staffing gap analysis, plus the record
//! model, persistence and service surface around them.

pub mod allocation;
pub mod calculations;
pub mod config;
pub mod engine;
pub mod error;
#[cfg(feature = "http_api")]
pub mod http_api;
pub mod level;
pub mod persistence;
pub mod portfolio;
pub mod project;
pub mod rate_card;
pub mod requests;
pub mod session;
pub mod telemetry;
pub mod validation;

pub use allocation::{AllocatedResource, ResourceRequirement};
pub use calculations::{
    BudgetStatus, LevelSpend, LevelStaffing, LineItemCost, OpenPosition, Reconciliation,
    StaffingState, classify, compute_line_items, find_open_positions, staffing_balance,
};
pub use config::{LogConfig, ServiceConfig};
pub use engine::{ProjectBudgetReport, reconcile_portfolio, reconcile_project};
pub use error::{CostError, CostResult};
pub use level::ResourceLevel;
#[cfg(feature = "sqlite")]
pub use persistence::sqlite::SqlitePortfolioStore;
pub use persistence::{
    PersistenceError, PortfolioSnapshot, PortfolioStore, load_portfolio_from_json,
    save_portfolio_to_json, save_report_to_csv, write_report_csv,
};
pub use portfolio::{IssuedIds, Portfolio, PortfolioError};
pub use project::{Client, Project};
pub use rate_card::{RateBook, RateCardEntry, RateScope, RateTable, resolve_rate};
pub use requests::{
    NewAllocationRequest, NewClientRequest, NewProjectRequest, NewRateCardRequest,
    NewRequirementRequest, UpdateBudgetRequest,
};
pub use session::{Capability, Claims, Role, Session, SessionError};
pub use validation::ValidationError;
