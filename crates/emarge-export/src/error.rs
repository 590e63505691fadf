//! Export error taxonomy.
//!
//! Only whole-export failures surface here. Per-row image problems are
//! contained inside the engine (blank cell, warn log) and never abort the
//! export; notification failures are logged by the caller and never
//! surfaced as export errors either.

use emarge_store::StoreError;
use thiserror::Error;

/// Errors aborting a whole export.
#[derive(Error, Debug)]
pub enum ExportError {
    #[error("workbook assembly failed: {0}")]
    Workbook(String),

    #[error(transparent)]
    Store(#[from] StoreError),
}
