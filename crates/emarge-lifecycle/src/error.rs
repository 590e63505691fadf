//! Lifecycle error taxonomy.

use emarge_store::StoreError;
use emarge_types::{EventId, EventStatus};
use thiserror::Error;

pub type Result<T> = std::result::Result<T, LifecycleError>;

/// Errors from the lifecycle service.
#[derive(Error, Debug)]
pub enum LifecycleError {
    /// The requested status change is not an edge of the lifecycle graph.
    /// Surfaced to the caller, never auto-retried; status is unchanged.
    #[error("illegal status transition: {from} -> {to}")]
    IllegalTransition { from: EventStatus, to: EventStatus },

    #[error("caller does not own event {0}")]
    NotOwner(EventId),

    #[error("caller is not an administrator")]
    NotAdmin,

    #[error("unknown signing token")]
    UnknownToken,

    #[error("validation failure: {0}")]
    Validation(String),

    #[error(transparent)]
    Store(#[from] StoreError),
}
