use super::{PersistenceResult, PortfolioStore};
use crate::portfolio::{IssuedIds, Portfolio};
use crate::project::{Client, Project};
use crate::rate_card::RateCardEntry;
use rusqlite::{Connection, OptionalExtension, params};
use serde::de::DeserializeOwned;
use std::sync::Mutex;
use tracing::info;

pub struct SqlitePortfolioStore {
    connection: Mutex<Connection>,
}

impl SqlitePortfolioStore {
    pub fn new<P: AsRef<std::path::Path>>(path: P) -> PersistenceResult<Self> {
        let connection = Connection::open(path)?;
        Self::initialize_schema(&connection)?;
        Ok(Self {
            connection: Mutex::new(connection),
        })
    }

    pub fn in_memory() -> PersistenceResult<Self> {
        let connection = Connection::open_in_memory()?;
        Self::initialize_schema(&connection)?;
        Ok(Self {
            connection: Mutex::new(connection),
        })
    }

    fn initialize_schema(connection: &Connection) -> PersistenceResult<()> {
        let ddl = r#"
            CREATE TABLE IF NOT EXISTS clients (
                id INTEGER PRIMARY KEY,
                client_json TEXT NOT NULL
            );
            CREATE TABLE IF NOT EXISTS projects (
                id INTEGER PRIMARY KEY,
                project_json TEXT NOT NULL
            );
            CREATE TABLE IF NOT EXISTS rate_cards (
                position INTEGER PRIMARY KEY,
                rate_card_json TEXT NOT NULL
            );
            CREATE TABLE IF NOT EXISTS portfolio_marker (
                id INTEGER PRIMARY KEY CHECK (id = 1),
                last_client_id INTEGER NOT NULL DEFAULT 0,
                last_project_id INTEGER NOT NULL DEFAULT 0
            );
        "#;
        connection.execute_batch(ddl)?;
        Ok(())
    }

    fn load_rows<T: DeserializeOwned>(conn: &Connection, sql: &str) -> PersistenceResult<Vec<T>> {
        let mut stmt = conn.prepare(sql)?;
        let rows = stmt.query_map([], |row| row.get::<_, String>(0))?;
        let mut records = Vec::new();
        for json in rows {
            records.push(serde_json::from_str(&json?)?);
        }
        Ok(records)
    }
}

impl PortfolioStore for SqlitePortfolioStore {
    fn save_portfolio(&self, portfolio: &Portfolio) -> PersistenceResult<()> {
        let mut conn = self.connection.lock().expect("sqlite mutex poisoned");
        let tx = conn.transaction()?;
        tx.execute("DELETE FROM clients", [])?;
        tx.execute("DELETE FROM projects", [])?;
        tx.execute("DELETE FROM rate_cards", [])?;
        let issued = portfolio.issued_ids();
        tx.execute(
            "INSERT OR REPLACE INTO portfolio_marker (id, last_client_id, last_project_id) \
             VALUES (1, ?1, ?2)",
            params![issued.last_client_id, issued.last_project_id],
        )?;
        {
            let mut stmt = tx.prepare("INSERT INTO clients (id, client_json) VALUES (?1, ?2)")?;
            for client in portfolio.clients() {
                stmt.execute(params![client.id, serde_json::to_string(client)?])?;
            }
            let mut stmt = tx.prepare("INSERT INTO projects (id, project_json) VALUES (?1, ?2)")?;
            for project in portfolio.projects() {
                stmt.execute(params![project.id, serde_json::to_string(project)?])?;
            }
            let mut stmt =
                tx.prepare("INSERT INTO rate_cards (position, rate_card_json) VALUES (?1, ?2)")?;
            for (position, entry) in portfolio.rate_cards().iter().enumerate() {
                stmt.execute(params![position as i64, serde_json::to_string(entry)?])?;
            }
        }
        tx.commit()?;
        info!(
            clients = portfolio.clients().len(),
            projects = portfolio.projects().len(),
            rate_cards = portfolio.rate_cards().len(),
            "portfolio stored in sqlite"
        );
        Ok(())
    }

    fn load_portfolio(&self) -> PersistenceResult<Option<Portfolio>> {
        let conn = self.connection.lock().expect("sqlite mutex poisoned");
        let issued = conn
            .query_row(
                "SELECT last_client_id, last_project_id FROM portfolio_marker WHERE id = 1",
                [],
                |row| {
                    Ok(IssuedIds {
                        last_client_id: row.get(0)?,
                        last_project_id: row.get(1)?,
                    })
                },
            )
            .optional()?;
        let Some(issued) = issued else {
            return Ok(None);
        };

        let clients: Vec<Client> =
            Self::load_rows(&conn, "SELECT client_json FROM clients ORDER BY id ASC")?;
        let projects: Vec<Project> =
            Self::load_rows(&conn, "SELECT project_json FROM projects ORDER BY id ASC")?;
        let rate_cards: Vec<RateCardEntry> = Self::load_rows(
            &conn,
            "SELECT rate_card_json FROM rate_cards ORDER BY position ASC",
        )?;

        let portfolio = Portfolio::from_parts(clients, projects, rate_cards)?;
        Ok(Some(portfolio.with_issued_ids(issued)))
    }
}
