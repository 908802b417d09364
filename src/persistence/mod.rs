use crate::portfolio::Portfolio;
use crate::validation::ValidationError;
use std::io;
use thiserror::Error;

#[derive(Debug, Error)]
pub enum PersistenceError {
    #[error("serialization error: {0}")]
    Serialization(#[from] serde_json::Error),
    #[error("io error: {0}")]
    Io(#[from] io::Error),
    #[cfg(feature = "sqlite")]
    #[error("sqlite error: {0}")]
    Sqlite(#[from] rusqlite::Error),
    #[error("csv error: {0}")]
    Csv(#[from] csv::Error),
    #[error("invalid data: {0}")]
    InvalidData(String),
}

impl From<ValidationError> for PersistenceError {
    fn from(value: ValidationError) -> Self {
        Self::InvalidData(value.to_string())
    }
}

pub type PersistenceResult<T> = Result<T, PersistenceError>;

pub trait PortfolioStore {
    fn save_portfolio(&self, portfolio: &Portfolio) -> PersistenceResult<()>;
    /// `Ok(None)` when nothing has been stored yet.
    fn load_portfolio(&self) -> PersistenceResult<Option<Portfolio>>;
}

pub mod file;
#[cfg(feature = "sqlite")]
pub mod sqlite;

pub use file::{
    PortfolioSnapshot, load_portfolio_from_json, save_portfolio_to_json, save_report_to_csv,
    write_report_csv,
};
