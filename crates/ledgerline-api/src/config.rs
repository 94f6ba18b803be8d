//! Server configuration read from the environment.

use std::net::SocketAddr;

use ledgerline_account::application::command_handlers::ConflictPolicy;

use crate::error::AppError;

const DEFAULT_HOST: &str = "0.0.0.0";
const DEFAULT_PORT: u16 = 3000;
const DEFAULT_MAX_CONNECTIONS: u32 = 10;
const DEFAULT_COMMAND_MAX_ATTEMPTS: u32 = 3;

/// Which event store backs the server.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum EventStoreConfig {
    /// Process-local store; events are lost on shutdown.
    Memory,
    /// PostgreSQL store.
    Postgres {
        /// Connection string.
        database_url: String,
        /// Pool size.
        max_connections: u32,
    },
}

/// Startup configuration for the API server.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AppConfig {
    /// Interface to bind.
    pub host: String,
    /// Port to bind.
    pub port: u16,
    /// Event store backend.
    pub event_store: EventStoreConfig,
    /// Total append attempts per command; `1` surfaces conflicts.
    pub command_max_attempts: u32,
}

fn parse<T: std::str::FromStr>(name: &str, value: Option<String>, default: T) -> Result<T, AppError>
where
    T::Err: std::fmt::Display,
{
    match value {
        None => Ok(default),
        Some(raw) => raw
            .trim()
            .parse()
            .map_err(|e| AppError::Config(format!("{name} must be a valid number: {e}"))),
    }
}

impl AppConfig {
    /// Reads the configuration from process environment variables.
    ///
    /// # Errors
    ///
    /// Returns `AppError::Config` if a variable is malformed or a required
    /// one is missing.
    pub fn from_env() -> Result<Self, AppError> {
        Self::from_lookup(|name| std::env::var(name).ok())
    }

    /// Reads the configuration through `lookup`, which maps a variable name
    /// to its value.
    ///
    /// # Errors
    ///
    /// Returns `AppError::Config` if a variable is malformed or a required
    /// one is missing.
    pub fn from_lookup(lookup: impl Fn(&str) -> Option<String>) -> Result<Self, AppError> {
        let host = lookup("HOST").unwrap_or_else(|| DEFAULT_HOST.to_owned());
        let port = parse("PORT", lookup("PORT"), DEFAULT_PORT)?;
        let command_max_attempts = parse(
            "COMMAND_MAX_ATTEMPTS",
            lookup("COMMAND_MAX_ATTEMPTS"),
            DEFAULT_COMMAND_MAX_ATTEMPTS,
        )?;
        if command_max_attempts == 0 {
            return Err(AppError::Config(
                "COMMAND_MAX_ATTEMPTS must be at least 1".into(),
            ));
        }

        let event_store = match lookup("EVENT_STORE").as_deref().map(str::trim) {
            None | Some("memory") => EventStoreConfig::Memory,
            Some("postgres") => {
                let database_url = lookup("DATABASE_URL").ok_or_else(|| {
                    AppError::Config(
                        "DATABASE_URL environment variable must be set for EVENT_STORE=postgres"
                            .into(),
                    )
                })?;
                let max_connections = parse(
                    "DATABASE_MAX_CONNECTIONS",
                    lookup("DATABASE_MAX_CONNECTIONS"),
                    DEFAULT_MAX_CONNECTIONS,
                )?;
                EventStoreConfig::Postgres {
                    database_url,
                    max_connections,
                }
            }
            Some(other) => {
                return Err(AppError::Config(format!(
                    "EVENT_STORE must be 'memory' or 'postgres', got '{other}'"
                )));
            }
        };

        Ok(Self {
            host,
            port,
            event_store,
            command_max_attempts,
        })
    }

    /// Returns the socket address to bind.
    ///
    /// # Errors
    ///
    /// Returns `AppError::Config` if `host` and `port` do not form an address.
    pub fn bind_addr(&self) -> Result<SocketAddr, AppError> {
        format!("{}:{}", self.host, self.port)
            .parse()
            .map_err(|e| AppError::Config(format!("invalid HOST:PORT combination: {e}")))
    }

    /// Returns the conflict policy command handlers run with.
    #[must_use]
    pub fn conflict_policy(&self) -> ConflictPolicy {
        ConflictPolicy::from_max_attempts(self.command_max_attempts)
    }
}
