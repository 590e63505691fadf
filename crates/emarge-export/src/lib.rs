//! Emarge Export - Audit spreadsheet production for finalized events.
//!
//! One workbook per finalized event: a header block of event metadata, then
//! one row per (day x session x signed participant) with the signature
//! embedded as a thumbnail. Per-row failures (missing image, codec error)
//! are contained: the cell stays blank, the export completes. The finished
//! workbook is handed to a [`Notifier`]; delivery is best-effort and its
//! failure is only logged, since the finalized status upstream is the
//! system-of-record event.

pub mod engine;
pub mod error;
pub mod notify;
pub mod optimizer;

pub use engine::{export_filename, ExportConfig, ExportEngine, ExportOutcome};
pub use error::ExportError;
pub use notify::{Attachment, Notifier, NotifyError, RecordingNotifier};
pub use optimizer::{ImageOptimizer, OptimizeError};
