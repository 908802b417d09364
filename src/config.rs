use std::net::SocketAddr;
use std::path::PathBuf;
use thiserror::Error;

pub const ENV_HTTP_ADDR: &str = "RESOURCE_LEDGER_HTTP_ADDR";
pub const ENV_SNAPSHOT: &str = "RESOURCE_LEDGER_SNAPSHOT";
pub const ENV_SQLITE: &str = "RESOURCE_LEDGER_SQLITE";
pub const ENV_LOG: &str = "RESOURCE_LEDGER_LOG";
pub const ENV_LOG_JSON: &str = "RESOURCE_LEDGER_LOG_JSON";

const DEFAULT_HTTP_ADDR: &str = "0.0.0.0:3000";
const DEFAULT_LOG_FILTER: &str = "resource_ledger=info";

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ConfigError {
    #[error("{var} has invalid value '{value}': {reason}")]
    InvalidValue {
        var: &'static str,
        value: String,
        reason: String,
    },
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct LogConfig {
    /// Filter directive used when `RUST_LOG` is not set.
    pub default_filter: String,
    pub json: bool,
}

impl Default for LogConfig {
    fn default() -> Self {
        Self {
            default_filter: DEFAULT_LOG_FILTER.to_string(),
            json: false,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ServiceConfig {
    pub http_addr: SocketAddr,
    /// JSON snapshot loaded at startup.
    pub snapshot_path: Option<PathBuf>,
    /// SQLite database used to load at startup and persist on change.
    pub sqlite_path: Option<PathBuf>,
    pub log: LogConfig,
}

impl Default for ServiceConfig {
    fn default() -> Self {
        Self {
            http_addr: DEFAULT_HTTP_ADDR
                .parse()
                .unwrap_or_else(|_| SocketAddr::from(([0, 0, 0, 0], 3000))),
            snapshot_path: None,
            sqlite_path: None,
            log: LogConfig::default(),
        }
    }
}

impl ServiceConfig {
    pub fn from_env() -> Result<Self, ConfigError> {
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    /// Builds the configuration from an arbitrary key lookup; unset or blank
    /// keys fall back to defaults.
    pub fn from_lookup<F>(lookup: F) -> Result<Self, ConfigError>
    where
        F: Fn(&str) -> Option<String>,
    {
        let get = |key: &str| {
            lookup(key)
                .map(|value| value.trim().to_string())
                .filter(|value| !value.is_empty())
        };

        let mut config = Self::default();
        if let Some(addr) = get(ENV_HTTP_ADDR) {
            config.http_addr = addr.parse().map_err(|e: std::net::AddrParseError| {
                ConfigError::InvalidValue {
                    var: ENV_HTTP_ADDR,
                    value: addr.clone(),
                    reason: e.to_string(),
                }
            })?;
        }
        config.snapshot_path = get(ENV_SNAPSHOT).map(PathBuf::from);
        config.sqlite_path = get(ENV_SQLITE).map(PathBuf::from);
        if let Some(filter) = get(ENV_LOG) {
            config.log.default_filter = filter;
        }
        if let Some(json) = get(ENV_LOG_JSON) {
            config.log.json = json.parse().map_err(|e: std::str::ParseBoolError| {
                ConfigError::InvalidValue {
                    var: ENV_LOG_JSON,
                    value: json.clone(),
                    reason: e.to_string(),
                }
            })?;
        }
        Ok(config)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashMap;

    fn lookup_from(pairs: &[(&str, &str)]) -> impl Fn(&str) -> Option<String> {
        let map: HashMap<String, String> = pairs
            .iter()
            .map(|(k, v)| (k.to_string(), v.to_string()))
            .collect();
        move |key| map.get(key).cloned()
    }

    #[test]
    fn defaults_apply_when_unset() {
        let config = ServiceConfig::from_lookup(|_| None).unwrap();
        assert_eq!(config, ServiceConfig::default());
        assert_eq!(config.http_addr.port(), 3000);
    }

    #[test]
    fn reads_overrides() {
        let config = ServiceConfig::from_lookup(lookup_from(&[
            (ENV_HTTP_ADDR, "127.0.0.1:8080"),
            (ENV_SNAPSHOT, "/tmp/ledger.json"),
            (ENV_LOG, "resource_ledger=debug"),
            (ENV_LOG_JSON, "true"),
        ]))
        .unwrap();
        assert_eq!(config.http_addr.port(), 8080);
        assert_eq!(config.snapshot_path, Some(PathBuf::from("/tmp/ledger.json")));
        assert_eq!(config.log.default_filter, "resource_ledger=debug");
        assert!(config.log.json);
    }

    #[test]
    fn rejects_bad_address() {
        let err =
            ServiceConfig::from_lookup(lookup_from(&[(ENV_HTTP_ADDR, "nowhere")])).unwrap_err();
        assert!(err.to_string().starts_with(ENV_HTTP_ADDR));
    }
}
