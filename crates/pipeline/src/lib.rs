//! The three pipeline stages and their sequential runner.
//!
//! Data flow is strictly linear: raw Parquet batch → staging table →
//! normalized entity tables → derived analytics tables. Each stage acquires
//! its own store handle, does its work inside one transaction, and releases
//! the handle when its scope ends.

pub mod analytics;
pub mod ingest;
pub mod normalize;

use std::path::Path;

use duckdb_store::{Store, StoreConfig};
use pipeline_core::Result;
use tracing::info;

pub use analytics::AnalyzeSummary;
pub use ingest::IngestOutcome;
pub use normalize::NormalizeSummary;

/// Outcome of one full Ingest → Normalize → Analyze run.
#[derive(Debug, Clone)]
pub struct PipelineReport {
    pub ingest: IngestOutcome,
    pub normalize: Option<NormalizeSummary>,
    pub analyze: AnalyzeSummary,
}

/// Runs the full three-stage sequence.
///
/// No stage is re-entered and there is no partial/resume state; on failure
/// the current stage's transaction rolls back and the error propagates.
/// A fresh store handle is opened per stage, matching the standalone
/// subcommands.
pub fn run_all(store_config: &StoreConfig, source: &Path) -> Result<PipelineReport> {
    let ingest = {
        let mut store = Store::open(store_config.clone())?;
        ingest::run(&mut store, source)?
    };

    let normalize = {
        let mut store = Store::open(store_config.clone())?;
        normalize::run(&mut store)?
    };

    let analyze = {
        let mut store = Store::open(store_config.clone())?;
        analytics::run(&mut store)?
    };

    info!(path = %store_config.path, "Pipeline complete; data is ready to view");

    Ok(PipelineReport {
        ingest,
        normalize,
        analyze,
    })
}
