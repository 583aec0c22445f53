//! DuckDB connection wrapper.
//!
//! One [`Store`] is opened per pipeline stage and closed when the stage's
//! scope ends, on success and failure alike. Multi-statement stage work goes
//! through [`Store::with_tx`], which commits only if the closure succeeds
//! and otherwise rolls back on drop.

use duckdb::{Connection, Transaction};
use pipeline_core::{Error, Result};
use tracing::info;

use crate::config::StoreConfig;
use crate::schema;

/// Wrap a storage engine error with context at the store boundary.
pub(crate) fn store_err(err: duckdb::Error) -> Error {
    Error::store(err.to_string())
}

/// Handle to the on-disk DuckDB database.
pub struct Store {
    conn: Connection,
    config: StoreConfig,
}

impl Store {
    /// Opens the database file, applies engine settings, and ensures the
    /// entity tables exist.
    pub fn open(config: StoreConfig) -> Result<Self> {
        let conn = Connection::open(&config.path).map_err(store_err)?;
        conn.execute_batch(&schema::init_sql(&config.memory_limit, config.threads))
            .map_err(store_err)?;

        info!(path = %config.path, "Opened DuckDB store");

        Ok(Self { conn, config })
    }

    /// Opens an in-memory database with the same schema (tests).
    pub fn open_in_memory() -> Result<Self> {
        let config = StoreConfig::default();
        let conn = Connection::open_in_memory().map_err(store_err)?;
        conn.execute_batch(&schema::init_sql(&config.memory_limit, config.threads))
            .map_err(store_err)?;
        Ok(Self { conn, config })
    }

    /// Returns the underlying connection for read-only statements.
    pub fn conn(&self) -> &Connection {
        &self.conn
    }

    /// Returns the configuration.
    pub fn config(&self) -> &StoreConfig {
        &self.config
    }

    /// Runs `f` inside a transaction, committing on success.
    ///
    /// If `f` or the commit fails the transaction rolls back when it drops,
    /// leaving the store in its pre-stage state.
    pub fn with_tx<T>(&mut self, f: impl FnOnce(&Transaction<'_>) -> Result<T>) -> Result<T> {
        let tx = self.conn.transaction().map_err(store_err)?;
        let out = f(&tx)?;
        tx.commit().map_err(store_err)?;
        Ok(out)
    }
}
