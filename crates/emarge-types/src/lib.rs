//! Emarge Types - Core domain model for attendance tracking
//!
//! Emarge tracks attendance and collects legally-relevant signatures for
//! organized events (hospitality/expense disclosure compliance). This crate
//! holds the entities shared by every other layer.
//!
//! ## Key Concepts
//!
//! - **Event**: an organized occurrence spanning one or more dates, with a
//!   status lifecycle and a public signing token
//! - **AttendanceDay**: one calendar date within an event, derived from the
//!   event's configured dates by the provisioner, never user-created
//! - **Session**: a sub-slot within a day requiring its own signature
//! - **Participant**: an attendee identity, reusable across events
//! - **Signature**: a participant's recorded presence for one session,
//!   backed by an image asset
//! - **Caller**: the authenticated (or anonymous) identity behind a request

pub mod attendance;
pub mod caller;
pub mod event;
pub mod ids;
pub mod participant;
pub mod signature;

// Re-export main types
pub use attendance::{AttendanceDay, Session, SessionTemplate, DEFAULT_SESSION_NAME};
pub use caller::{Caller, OrganizerId};
pub use event::{Event, EventStatus, ExpenseClass, NewEvent, QrGranularity, SigningToken};
pub use ids::{DayId, EventId, ImageId, ParticipantId, SessionId, SignatureId};
pub use participant::{BeneficiaryType, Participant};
pub use signature::Signature;
