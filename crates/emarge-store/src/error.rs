//! Storage error taxonomy.

use thiserror::Error;

pub type Result<T> = std::result::Result<T, StoreError>;

/// Errors from storage backends.
#[derive(Error, Debug)]
pub enum StoreError {
    #[error("{entity} not found: {id}")]
    NotFound { entity: &'static str, id: String },

    /// A uniqueness constraint rejected the write. Deterministic under
    /// concurrency: of two racing duplicate inserts exactly one succeeds.
    #[error("uniqueness conflict on {constraint}: {key}")]
    Conflict {
        constraint: &'static str,
        key: String,
    },

    #[error("storage backend failure: {0}")]
    Backend(String),
}

impl StoreError {
    pub fn not_found(entity: &'static str, id: impl std::fmt::Display) -> Self {
        StoreError::NotFound {
            entity,
            id: id.to_string(),
        }
    }

    pub fn conflict(constraint: &'static str, key: impl std::fmt::Display) -> Self {
        StoreError::Conflict {
            constraint,
            key: key.to_string(),
        }
    }

    pub fn is_conflict(&self) -> bool {
        matches!(self, StoreError::Conflict { .. })
    }
}
