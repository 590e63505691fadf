//! Attendance days and sessions.
//!
//! Both are derived records: the provisioner creates exactly one
//! [`AttendanceDay`] per distinct configured date, and each day's sessions
//! from its template (or a single default session). Neither is ever created
//! directly by users.

use chrono::{NaiveDate, NaiveTime};
use serde::{Deserialize, Serialize};

use crate::ids::{DayId, EventId, SessionId};

/// Name given to the single session of a day with no configured template.
pub const DEFAULT_SESSION_NAME: &str = "Session principale";

/// One calendar date within an event.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AttendanceDay {
    pub id: DayId,
    pub event_id: EventId,
    pub date: NaiveDate,
}

/// A sub-slot within a day requiring its own signature.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Session {
    pub id: SessionId,
    pub day_id: DayId,
    pub name: String,
    pub starts_at: Option<NaiveTime>,
    pub ends_at: Option<NaiveTime>,
}

/// Organizer-configured blueprint for a day's sessions.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SessionTemplate {
    pub name: String,
    pub starts_at: Option<NaiveTime>,
    pub ends_at: Option<NaiveTime>,
}

impl SessionTemplate {
    pub fn named(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            starts_at: None,
            ends_at: None,
        }
    }

    /// The default single-session template used when a date has none.
    pub fn default_session() -> Self {
        Self::named(DEFAULT_SESSION_NAME)
    }

    /// Materialize a session for the given day.
    pub fn instantiate(&self, day_id: DayId) -> Session {
        Session {
            id: SessionId::generate(),
            day_id,
            name: self.name.clone(),
            starts_at: self.starts_at,
            ends_at: self.ends_at,
        }
    }
}
