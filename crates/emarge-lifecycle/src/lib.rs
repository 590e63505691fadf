//! Emarge Lifecycle - Event status state machine and attendance provisioning.
//!
//! The lifecycle service is the system-of-record for event status: it
//! enforces the legal transition graph, provisions attendance days and
//! sessions from the event's configured dates, and fires the finalization
//! side effects (export + notification) without ever letting them roll a
//! transition back.

pub mod error;
pub mod lifecycle;
pub mod provisioner;
pub mod token;

pub use error::{LifecycleError, Result};
pub use lifecycle::{
    DaySchedule, EventLifecycle, FinalizeSink, LoggingFinalizeSink, ResolveHint, SigningResolution,
};
pub use provisioner::AttendanceProvisioner;
pub use token::SigningTokenGenerator;
