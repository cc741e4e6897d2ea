//! Configuration loading from environment variables.
//!
//! | variable | default |
//! |----------|---------|
//! | `INVOICER_BIND_ADDR` | `0.0.0.0:10000` |
//! | `DATABASE_URL` | `sqlite://invoice.db` (`memory` selects the in-memory store) |
//! | `INVOICER_DB_MAX_CONNECTIONS` | `5` |
//! | `INVOICER_LOG_FORMAT` | `json` (`json` or `pretty`) |

use std::env;
use std::net::SocketAddr;
use std::sync::Arc;

use thiserror::Error;

use invoicer_observability::LogFormat;

use crate::repository::{
    InMemoryInvoiceRepository, InvoiceRepository, RepositoryError, SqliteInvoiceRepository,
};

pub const BIND_ADDR_VAR: &str = "INVOICER_BIND_ADDR";
pub const DATABASE_URL_VAR: &str = "DATABASE_URL";
pub const MAX_CONNECTIONS_VAR: &str = "INVOICER_DB_MAX_CONNECTIONS";
pub const LOG_FORMAT_VAR: &str = "INVOICER_LOG_FORMAT";

const DEFAULT_BIND_ADDR: &str = "0.0.0.0:10000";
const DEFAULT_DATABASE_URL: &str = "sqlite://invoice.db";
const DEFAULT_MAX_CONNECTIONS: u32 = 5;
const IN_MEMORY_URL: &str = "memory";

/// A malformed configuration value.
#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum ConfigError {
    #[error("{var}: invalid value {value:?}: {reason}")]
    Invalid {
        var: &'static str,
        value: String,
        reason: String,
    },
}

impl ConfigError {
    fn invalid(var: &'static str, value: &str, reason: impl ToString) -> Self {
        Self::Invalid {
            var,
            value: value.to_string(),
            reason: reason.to_string(),
        }
    }
}

/// Where invoices are stored.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum StorageBackend {
    Sqlite { url: String, max_connections: u32 },
    InMemory,
}

impl StorageBackend {
    /// Open the configured repository. The SQLite schema is created if absent.
    pub async fn open(&self) -> Result<Arc<dyn InvoiceRepository>, RepositoryError> {
        match self {
            StorageBackend::Sqlite {
                url,
                max_connections,
            } => {
                let repo = SqliteInvoiceRepository::connect(url, *max_connections).await?;
                Ok(Arc::new(repo))
            }
            StorageBackend::InMemory => Ok(Arc::new(InMemoryInvoiceRepository::new())),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AppConfig {
    pub bind_addr: SocketAddr,
    pub storage: StorageBackend,
    pub log_format: LogFormat,
}

impl AppConfig {
    /// Read the configuration from the process environment.
    pub fn from_env() -> Result<Self, ConfigError> {
        Self::from_lookup(|name| env::var(name).ok())
    }

    /// Read the configuration through `lookup`; unset or blank variables take
    /// their default.
    pub fn from_lookup<F>(lookup: F) -> Result<Self, ConfigError>
    where
        F: Fn(&str) -> Option<String>,
    {
        let get = |name: &str| lookup(name).filter(|v| !v.trim().is_empty());

        let bind_raw = get(BIND_ADDR_VAR).unwrap_or_else(|| DEFAULT_BIND_ADDR.to_string());
        let bind_addr = bind_raw
            .trim()
            .parse::<SocketAddr>()
            .map_err(|e| ConfigError::invalid(BIND_ADDR_VAR, &bind_raw, e))?;

        let max_connections = match get(MAX_CONNECTIONS_VAR) {
            None => DEFAULT_MAX_CONNECTIONS,
            Some(raw) => match raw.trim().parse::<u32>() {
                Ok(0) => {
                    return Err(ConfigError::invalid(
                        MAX_CONNECTIONS_VAR,
                        &raw,
                        "must be at least 1",
                    ));
                }
                Ok(n) => n,
                Err(e) => return Err(ConfigError::invalid(MAX_CONNECTIONS_VAR, &raw, e)),
            },
        };

        let url = get(DATABASE_URL_VAR).unwrap_or_else(|| DEFAULT_DATABASE_URL.to_string());
        let url = url.trim();
        let storage = if url.eq_ignore_ascii_case(IN_MEMORY_URL) {
            StorageBackend::InMemory
        } else if url.starts_with("sqlite:") {
            StorageBackend::Sqlite {
                url: url.to_string(),
                max_connections,
            }
        } else {
            return Err(ConfigError::invalid(
                DATABASE_URL_VAR,
                url,
                "expected a sqlite: URL or \"memory\"",
            ));
        };

        let log_format = match get(LOG_FORMAT_VAR) {
            None => LogFormat::default(),
            Some(raw) => raw
                .parse::<LogFormat>()
                .map_err(|e| ConfigError::invalid(LOG_FORMAT_VAR, &raw, e))?,
        };

        Ok(Self {
            bind_addr,
            storage,
            log_format,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashMap;

    fn config(vars: &[(&str, &str)]) -> Result<AppConfig, ConfigError> {
        let vars: HashMap<String, String> = vars
            .iter()
            .map(|(k, v)| (k.to_string(), v.to_string()))
            .collect();
        AppConfig::from_lookup(|name| vars.get(name).cloned())
    }

    #[test]
    fn defaults_apply_when_nothing_is_set() {
        let cfg = config(&[]).unwrap();
        assert_eq!(cfg.bind_addr, "0.0.0.0:10000".parse().unwrap());
        assert_eq!(
            cfg.storage,
            StorageBackend::Sqlite {
                url: "sqlite://invoice.db".to_string(),
                max_connections: 5,
            }
        );
        assert_eq!(cfg.log_format, LogFormat::Json);
    }

    #[test]
    fn memory_url_selects_in_memory_store() {
        let cfg = config(&[(DATABASE_URL_VAR, "memory")]).unwrap();
        assert_eq!(cfg.storage, StorageBackend::InMemory);
    }

    #[test]
    fn explicit_values_override_defaults() {
        let cfg = config(&[
            (BIND_ADDR_VAR, "127.0.0.1:8080"),
            (DATABASE_URL_VAR, "sqlite:///var/lib/invoicer/invoices.db"),
            (MAX_CONNECTIONS_VAR, "12"),
            (LOG_FORMAT_VAR, "pretty"),
        ])
        .unwrap();

        assert_eq!(cfg.bind_addr.port(), 8080);
        assert_eq!(
            cfg.storage,
            StorageBackend::Sqlite {
                url: "sqlite:///var/lib/invoicer/invoices.db".to_string(),
                max_connections: 12,
            }
        );
        assert_eq!(cfg.log_format, LogFormat::Pretty);
    }

    #[test]
    fn blank_values_fall_back_to_defaults() {
        let cfg = config(&[(BIND_ADDR_VAR, "  "), (LOG_FORMAT_VAR, "")]).unwrap();
        assert_eq!(cfg.bind_addr.port(), 10000);
        assert_eq!(cfg.log_format, LogFormat::Json);
    }

    #[test]
    fn malformed_values_are_reported_with_their_variable() {
        let err = config(&[(BIND_ADDR_VAR, "not-an-addr")]).unwrap_err();
        assert!(matches!(err, ConfigError::Invalid { var: BIND_ADDR_VAR, .. }));

        let err = config(&[(MAX_CONNECTIONS_VAR, "0")]).unwrap_err();
        assert!(matches!(err, ConfigError::Invalid { var: MAX_CONNECTIONS_VAR, .. }));

        let err = config(&[(DATABASE_URL_VAR, "postgres://db")]).unwrap_err();
        assert!(matches!(err, ConfigError::Invalid { var: DATABASE_URL_VAR, .. }));

        let err = config(&[(LOG_FORMAT_VAR, "xml")]).unwrap_err();
        assert!(err.to_string().contains(LOG_FORMAT_VAR));
    }

    #[tokio::test]
    async fn in_memory_backend_opens() {
        let repo = StorageBackend::InMemory.open().await.unwrap();
        let id = invoicer_core::InvoiceId::from_raw(1).unwrap();
        assert!(repo.load(id).await.unwrap().is_none());
    }
}
