//! Warehouse connections.
//!
//! Redshift speaks the PostgreSQL wire protocol, so the production
//! implementation is a plain `sqlx` [`PgConnection`]. Connections are opened
//! per operation and never pooled across requests.

use std::sync::{Arc, Mutex};
use std::time::Duration;

use async_trait::async_trait;
use sqlx::postgres::{PgConnectOptions, PgConnection};
use sqlx::{ConnectOptions, Connection};
use tracing::{debug, warn};

use crate::config::WarehouseConfig;
use crate::error::WarehouseError;

/// Opens sessions against the warehouse.
#[async_trait]
pub trait Warehouse: Send + Sync {
    async fn connect(&self) -> Result<Box<dyn WarehouseSession>, WarehouseError>;
}

/// One open connection.
///
/// A session dropped without [`close`](WarehouseSession::close) still
/// releases its connection; any statement left uncommitted is rolled back.
#[async_trait]
pub trait WarehouseSession: Send {
    /// Run a statement in its own transaction and commit it.
    async fn execute_committed(&mut self, statement: &str) -> Result<u64, WarehouseError>;

    async fn close(self: Box<Self>) -> Result<(), WarehouseError>;
}

pub struct PgWarehouse {
    options: PgConnectOptions,
    connect_timeout: Duration,
}

impl PgWarehouse {
    pub fn from_config(config: &WarehouseConfig) -> Self {
        let mut options = PgConnectOptions::new()
            .host(&config.host)
            .port(config.port)
            .database(&config.dbname)
            .username(&config.user)
            .disable_statement_logging();
        if let Some(password) = config.resolve_password() {
            options = options.password(&password);
        }

        Self {
            options,
            connect_timeout: Duration::from_secs(config.connect_timeout_secs),
        }
    }
}

#[async_trait]
impl Warehouse for PgWarehouse {
    async fn connect(&self) -> Result<Box<dyn WarehouseSession>, WarehouseError> {
        let conn = tokio::time::timeout(self.connect_timeout, self.options.connect())
            .await
            .map_err(|_| WarehouseError::ConnectTimeout(self.connect_timeout.as_secs()))??;
        debug!("opened warehouse connection");
        Ok(Box::new(PgSession { conn }))
    }
}

struct PgSession {
    conn: PgConnection,
}

#[async_trait]
impl WarehouseSession for PgSession {
    async fn execute_committed(&mut self, statement: &str) -> Result<u64, WarehouseError> {
        let mut tx = self.conn.begin().await?;
        // A bare &str carries no arguments, so it goes over the simple-query
        // protocol; COPY/UNLOAD cannot be prepared.
        let done = sqlx::Executor::execute(&mut *tx, statement).await?;
        tx.commit().await?;
        Ok(done.rows_affected())
    }

    async fn close(self: Box<Self>) -> Result<(), WarehouseError> {
        let PgSession { conn } = *self;
        conn.close().await?;
        Ok(())
    }
}

// ============ In-memory ============

/// Records statements instead of executing them; used by tests and local runs.
///
/// Statements containing the configured failure pattern fail with a backend
/// error and are not recorded.
#[derive(Default)]
pub struct MemoryWarehouse {
    state: Arc<MemoryState>,
    unreachable: bool,
}

#[derive(Default)]
struct MemoryState {
    executed: Mutex<Vec<String>>,
    fail_pattern: Mutex<Option<String>>,
}

impl MemoryWarehouse {
    pub fn new() -> Self {
        Self::default()
    }

    /// A warehouse whose connection attempts always fail.
    pub fn unreachable() -> Self {
        Self {
            unreachable: true,
            ..Self::default()
        }
    }

    pub fn fail_when_contains(&self, pattern: impl Into<String>) {
        if let Ok(mut slot) = self.state.fail_pattern.lock() {
            *slot = Some(pattern.into());
        }
    }

    /// Statements committed so far, in order.
    pub fn statements(&self) -> Vec<String> {
        self.state
            .executed
            .lock()
            .map(|s| s.clone())
            .unwrap_or_default()
    }
}

#[async_trait]
impl Warehouse for MemoryWarehouse {
    async fn connect(&self) -> Result<Box<dyn WarehouseSession>, WarehouseError> {
        if self.unreachable {
            return Err(WarehouseError::Backend(
                "could not connect to server: Connection refused".to_string(),
            ));
        }
        Ok(Box::new(MemorySession {
            state: self.state.clone(),
        }))
    }
}

struct MemorySession {
    state: Arc<MemoryState>,
}

#[async_trait]
impl WarehouseSession for MemorySession {
    async fn execute_committed(&mut self, statement: &str) -> Result<u64, WarehouseError> {
        let pattern = self.state.fail_pattern.lock().ok().and_then(|p| p.clone());
        if let Some(pattern) = pattern {
            if statement.contains(&pattern) {
                warn!(%pattern, "simulated warehouse failure");
                return Err(WarehouseError::Backend(format!(
                    "Load into table failed. Check 'stl_load_errors' system table for details. ({})",
                    pattern
                )));
            }
        }
        if let Ok(mut executed) = self.state.executed.lock() {
            executed.push(statement.to_string());
        }
        Ok(0)
    }

    async fn close(self: Box<Self>) -> Result<(), WarehouseError> {
        Ok(())
    }
}
