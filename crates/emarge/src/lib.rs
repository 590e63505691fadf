//! Emarge - Attendance and signature collection for organized events.
//!
//! This crate wires the engine together: the event lifecycle state machine,
//! the abuse-resistant public signature intake, and the finalization export
//! pipeline, all sharing one storage seam. Embedders construct an
//! [`AttendanceService`] with their store, blob store, and notifier, and get
//! the complete behavior behind one object.
//!
//! ## Key Concepts
//!
//! - **Lifecycle**: event status transitions (`Draft` → `Open` →
//!   `Finalized` ⇄ `Reopened`) with automatic day/session provisioning
//! - **Intake**: anonymous signature submissions gated by CAPTCHA, rate
//!   limits, status checks, and upload sanitization
//! - **Export**: on finalization, an audit workbook with embedded signature
//!   thumbnails is built and emailed to the organizer, fire-and-forget

pub mod config;
pub mod service;
pub mod sink;

pub use config::ServiceConfig;
pub use service::AttendanceService;
pub use sink::ExportFinalizeSink;

pub use emarge_export::{ExportEngine, ExportOutcome, ImageOptimizer, Notifier};
pub use emarge_intake::{Submission, SubmissionIdentity};
pub use emarge_lifecycle::{ResolveHint, SigningResolution};
pub use emarge_types::{Caller, Event, EventStatus, NewEvent};
