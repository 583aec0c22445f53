//! Store configuration.

use serde::{Deserialize, Serialize};

/// DuckDB store configuration.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct StoreConfig {
    /// Path of the on-disk database file.
    #[serde(default = "default_path")]
    pub path: String,
    /// Explicit engine memory limit. The engine default (80% of system RAM)
    /// is never acceptable for a batch process sharing a host.
    #[serde(default = "default_memory_limit")]
    pub memory_limit: String,
    /// Background thread pool size for the embedded engine.
    #[serde(default = "default_threads")]
    pub threads: u32,
}

fn default_path() -> String {
    "orders.duckdb".to_string()
}

fn default_memory_limit() -> String {
    "1GB".to_string()
}

fn default_threads() -> u32 {
    2
}

impl Default for StoreConfig {
    fn default() -> Self {
        Self {
            path: default_path(),
            memory_limit: default_memory_limit(),
            threads: default_threads(),
        }
    }
}
