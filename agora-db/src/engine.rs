//! Engine provider
//!
//! The engine owns the sqlx `PgPool`. The pool is created lazily on first
//! use and never connects eagerly, so a bad URL surfaces as
//! [`DbError::Configuration`] the first time a session needs a connection.

use std::str::FromStr;
use std::sync::atomic::{AtomicU32, Ordering};
use std::sync::{Arc, OnceLock};
use std::time::Duration;

use agora_core::DatabaseSettings;
use sqlx::postgres::{PgConnectOptions, PgConnection, PgPoolOptions};
use sqlx::{ConnectOptions, Connection, PgPool};

use crate::error::{DbError, Result};

/// Default maximum connections for the pool.
const DEFAULT_MAX_CONNECTIONS: u32 = 10;

/// How long a session waits for a pooled connection.
const DEFAULT_ACQUIRE_TIMEOUT: Duration = Duration::from_secs(30);

/// Engine construction parameters
#[derive(Debug, Clone)]
pub struct EngineConfig {
    /// PostgreSQL connection string
    pub database_url: Option<String>,
    pub max_connections: u32,
    pub acquire_timeout: Duration,
    /// Log every SQL statement
    pub echo: bool,
}

impl EngineConfig {
    pub fn new(database_url: impl Into<String>) -> Self {
        Self {
            database_url: Some(database_url.into()),
            ..Self::default()
        }
    }
}

impl Default for EngineConfig {
    fn default() -> Self {
        Self {
            database_url: None,
            max_connections: DEFAULT_MAX_CONNECTIONS,
            acquire_timeout: DEFAULT_ACQUIRE_TIMEOUT,
            echo: false,
        }
    }
}

impl From<&DatabaseSettings> for EngineConfig {
    fn from(settings: &DatabaseSettings) -> Self {
        Self {
            database_url: settings.url.clone(),
            max_connections: settings.max_connections,
            echo: settings.echo,
            ..Self::default()
        }
    }
}

/// Marks one pooled connection as held by a session.
///
/// Dropped as soon as the session's transaction ends, so the held count
/// is exact when `commit`, `rollback` or `close` returns. sqlx moves the
/// connection back to its idle queue on a background task.
pub(crate) struct Checkout {
    held: Arc<AtomicU32>,
}

impl Drop for Checkout {
    fn drop(&mut self) {
        self.held.fetch_sub(1, Ordering::AcqRel);
    }
}

/// Durable connection pool bound to one database URL
pub struct Engine {
    config: EngineConfig,
    pool: OnceLock<PgPool>,
    held: Arc<AtomicU32>,
}

impl Engine {
    pub fn new(config: EngineConfig) -> Self {
        Self {
            config,
            pool: OnceLock::new(),
            held: Arc::new(AtomicU32::new(0)),
        }
    }

    pub fn config(&self) -> &EngineConfig {
        &self.config
    }

    fn connect_options(&self) -> Result<PgConnectOptions> {
        let url = self
            .config
            .database_url
            .as_deref()
            .ok_or_else(|| DbError::Configuration("DATABASE_URL is not set".into()))?;

        let options = PgConnectOptions::from_str(url).map_err(DbError::from_connect)?;

        Ok(if self.config.echo {
            options
        } else {
            options.disable_statement_logging()
        })
    }

    /// Get the pool, building it on first call.
    ///
    /// Must be called from within a tokio runtime: the pool spawns its
    /// maintenance task on creation.
    pub fn pool(&self) -> Result<&PgPool> {
        if let Some(pool) = self.pool.get() {
            return Ok(pool);
        }

        let options = self.connect_options()?;
        let pool = PgPoolOptions::new()
            .max_connections(self.config.max_connections)
            .acquire_timeout(self.config.acquire_timeout)
            .connect_lazy_with(options);

        tracing::debug!(
            max_connections = self.config.max_connections,
            "database pool created"
        );

        // A concurrent first caller may have won; its pool is kept and ours dropped.
        Ok(self.pool.get_or_init(|| pool))
    }

    /// Pooled connections currently held by sessions.
    pub fn checked_out(&self) -> u32 {
        self.held.load(Ordering::Acquire)
    }

    pub(crate) fn checkout(&self) -> Checkout {
        self.held.fetch_add(1, Ordering::AcqRel);
        Checkout {
            held: Arc::clone(&self.held),
        }
    }

    /// Open one connection outside the pool.
    ///
    /// Used for startup work that must not hold a pooled connection.
    pub async fn connect_dedicated(&self) -> Result<PgConnection> {
        let options = self.connect_options()?;
        PgConnection::connect_with(&options)
            .await
            .map_err(DbError::from_connect)
    }

    /// Close the pool and wait for checked-out connections to return.
    pub async fn dispose(&self) {
        if let Some(pool) = self.pool.get() {
            pool.close().await;
            tracing::info!("database pool closed");
        }
    }
}

/// Builds the engine once and hands out the same instance afterwards
pub struct EngineProvider {
    config: EngineConfig,
    engine: OnceLock<Arc<Engine>>,
}

impl EngineProvider {
    pub fn new(config: EngineConfig) -> Self {
        Self {
            config,
            engine: OnceLock::new(),
        }
    }

    /// Get the process engine. Repeated calls return the same instance.
    pub fn get_engine(&self) -> Arc<Engine> {
        self.engine
            .get_or_init(|| Arc::new(Engine::new(self.config.clone())))
            .clone()
    }
}
