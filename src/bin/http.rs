use anyhow::Context;
use resource_ledger::{
    Portfolio, ServiceConfig, http_api::{self, AppState}, load_portfolio_from_json,
    telemetry::init_tracing,
};

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let config = ServiceConfig::from_env()?;
    init_tracing(&config.log).context("failed to install tracing subscriber")?;

    let portfolio = match &config.snapshot_path {
        Some(path) => load_portfolio_from_json(path)
            .with_context(|| format!("failed to load snapshot {}", path.display()))?,
        None => Portfolio::new(),
    };

    let state = build_state(&config, portfolio)?;
    http_api::serve(config.http_addr, state).await?;
    Ok(())
}

/// A stored portfolio wins over the snapshot; an empty store is seeded from it.
#[cfg(feature = "sqlite")]
fn build_state(config: &ServiceConfig, portfolio: Portfolio) -> anyhow::Result<AppState> {
    use resource_ledger::{PortfolioStore, SqlitePortfolioStore};
    use std::sync::Arc;
    use tracing::info;

    let Some(path) = &config.sqlite_path else {
        return Ok(AppState::new(portfolio));
    };
    let store = SqlitePortfolioStore::new(path)
        .with_context(|| format!("failed to open sqlite store {}", path.display()))?;
    let portfolio = match store.load_portfolio()? {
        Some(stored) => {
            info!(path = %path.display(), "loaded portfolio from sqlite");
            stored
        }
        None => {
            store.save_portfolio(&portfolio)?;
            portfolio
        }
    };
    Ok(AppState::new(portfolio).with_store(Arc::new(store)))
}

#[cfg(not(feature = "sqlite"))]
fn build_state(config: &ServiceConfig, portfolio: Portfolio) -> anyhow::Result<AppState> {
    if config.sqlite_path.is_some() {
        anyhow::bail!("rebuild with the `sqlite` feature to use RESOURCE_LEDGER_SQLITE");
    }
    Ok(AppState::new(portfolio))
}
