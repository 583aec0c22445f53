//! Ingest stage: raw Parquet batch → transient staging table.

use std::path::Path;

use duckdb_store::{staging, Store};
use pipeline_core::Result;
use tracing::{info, warn};

/// Result of the ingest stage.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum IngestOutcome {
    /// The batch file was staged.
    Loaded { rows: usize },
    /// The batch file does not exist. Reported, not an error: the rest of
    /// the pipeline still runs against whatever entity data is present.
    SourceMissing,
}

/// Loads the raw batch file into the staging table.
///
/// The whole load is one `CREATE OR REPLACE TABLE ... AS read_parquet(...)`
/// statement inside a transaction, so a failed load leaves any previously
/// staged batch untouched.
pub fn run(store: &mut Store, source: &Path) -> Result<IngestOutcome> {
    if !source.exists() {
        warn!(source = %source.display(), "Raw batch file not found; skipping ingest");
        return Ok(IngestOutcome::SourceMissing);
    }

    let path = source.to_string_lossy().into_owned();
    let rows = store.with_tx(|tx| staging::load_from_parquet(tx, &path))?;

    info!(source = %source.display(), rows, "Staged raw order batch");
    Ok(IngestOutcome::Loaded { rows })
}
