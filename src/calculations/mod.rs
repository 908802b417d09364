pub mod costing;
pub mod reconciliation;
pub mod staffing;

pub use costing::{LineItemCost, compute_line_items, inclusive_days, working_days};
pub use reconciliation::{
    BUDGET_TOLERANCE, BudgetStatus, LevelSpend, Reconciliation, budget_status, classify,
    spend_by_level,
};
pub use staffing::{
    LevelStaffing, OpenPosition, StaffingState, find_open_positions, staffing_balance,
};
