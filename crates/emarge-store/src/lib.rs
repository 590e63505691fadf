//! Emarge Store - Storage seam for the attendance engine.
//!
//! Persistence is an external capability: this crate defines the traits the
//! engine consumes ([`AttendanceStore`] for entities, [`BlobStore`] for
//! signature images) and an in-memory backend suitable for development and
//! testing.
//!
//! Two invariants are the backend's responsibility, not the caller's:
//!
//! - at most one [`emarge_types::Signature`] per (participant, session)
//! - at most one [`emarge_types::AttendanceDay`] per (event, date)
//!
//! A concurrent duplicate insert must fail deterministically with
//! [`StoreError::Conflict`], never silently double-write. The same applies
//! to the event signing-token index.

pub mod error;
pub mod memory;
pub mod traits;

pub use error::{Result, StoreError};
pub use memory::{InMemoryBlobStore, InMemoryStore};
pub use traits::{AttendanceStore, BlobStore, WriteOrigin};
