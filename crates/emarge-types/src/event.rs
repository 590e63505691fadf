//! Event entity and its status lifecycle.

use std::collections::HashMap;

use chrono::{DateTime, NaiveDate, Utc};
use serde::{Deserialize, Serialize};

use crate::attendance::SessionTemplate;
use crate::caller::OrganizerId;
use crate::ids::{DayId, EventId, ParticipantId};

/// Event status lifecycle.
///
/// Legal transitions form a fixed graph: `Draft → Open → Finalized ⇄
/// Reopened`. Everything else is rejected. Finalization is the terminal
/// organizer action freezing intake and triggering the audit export; a
/// finalized event may be reopened for corrections and re-finalized.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum EventStatus {
    /// Being configured, not yet accepting signatures
    Draft,
    /// Live, accepting public signatures
    Open,
    /// Frozen, audit export produced
    Finalized,
    /// Unfrozen after finalization, accepting signatures again
    Reopened,
}

impl EventStatus {
    /// Whether moving from `self` to `next` is a legal lifecycle edge.
    ///
    /// Only checked when the status actually changes; `self == next` is not
    /// a transition.
    pub fn can_transition_to(self, next: EventStatus) -> bool {
        use EventStatus::*;
        matches!(
            (self, next),
            (Draft, Open) | (Open, Finalized) | (Finalized, Reopened) | (Reopened, Finalized)
        )
    }

    /// Whether signatures may be recorded in this status.
    pub fn accepts_signatures(self) -> bool {
        matches!(self, EventStatus::Open | EventStatus::Reopened)
    }

    pub fn is_finalized(self) -> bool {
        matches!(self, EventStatus::Finalized)
    }
}

impl std::fmt::Display for EventStatus {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let s = match self {
            EventStatus::Draft => "draft",
            EventStatus::Open => "open",
            EventStatus::Finalized => "finalized",
            EventStatus::Reopened => "reopened",
        };
        write!(f, "{s}")
    }
}

/// Granularity of the public signing link / QR code.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum QrGranularity {
    /// One code for the whole event
    Event,
    /// One code per attendance day
    Day,
    /// One code per session
    Session,
}

/// Expense classification for the disclosure report.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ExpenseClass {
    Hospitality,
    Catering,
    Transport,
    Accommodation,
    Other(String),
}

impl std::fmt::Display for ExpenseClass {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            ExpenseClass::Hospitality => write!(f, "hospitality"),
            ExpenseClass::Catering => write!(f, "catering"),
            ExpenseClass::Transport => write!(f, "transport"),
            ExpenseClass::Accommodation => write!(f, "accommodation"),
            ExpenseClass::Other(label) => write!(f, "{label}"),
        }
    }
}

/// Opaque, unguessable token embedded in the public signing link.
///
/// Assigned once at event creation and never null afterwards. Regeneration
/// is an explicit owner-only operation that invalidates previously
/// distributed links and QR codes.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct SigningToken(String);

impl SigningToken {
    pub fn new(token: impl Into<String>) -> Self {
        Self(token.into())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl std::fmt::Display for SigningToken {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// An organized occurrence with tracked attendance.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Event {
    pub id: EventId,

    pub title: String,

    pub location: String,

    /// Owning organizer
    pub organizer: OrganizerId,

    /// Where the finalized spreadsheet is sent
    pub organizer_email: String,

    pub expense_class: ExpenseClass,

    pub status: EventStatus,

    pub signing_token: SigningToken,

    pub qr_granularity: QrGranularity,

    /// Presentation theme, carried opaquely; never interpreted by the engine
    pub theme: serde_json::Value,

    /// Dates the organizer configured, in entry order; may contain
    /// duplicates, which the provisioner deduplicates
    pub selected_dates: Vec<NaiveDate>,

    /// Optional per-date session templates
    pub session_templates: HashMap<NaiveDate, Vec<SessionTemplate>>,

    /// Provisioned attendance days, synchronized by the provisioner
    pub days: Vec<DayId>,

    /// Invited participant roster
    pub participants: Vec<ParticipantId>,

    pub created_at: DateTime<Utc>,

    pub updated_at: DateTime<Utc>,
}

impl Event {
    /// Session templates configured for a given date, if any.
    pub fn templates_for(&self, date: &NaiveDate) -> Option<&[SessionTemplate]> {
        self.session_templates
            .get(date)
            .map(|t| t.as_slice())
            .filter(|t| !t.is_empty())
    }
}

/// Organizer input for event creation. The engine assigns the id, the
/// signing token, and the initial `Draft` status.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct NewEvent {
    pub title: String,
    pub location: String,
    pub organizer: OrganizerId,
    pub organizer_email: String,
    pub expense_class: ExpenseClass,
    pub qr_granularity: QrGranularity,
    #[serde(default)]
    pub theme: serde_json::Value,
    pub selected_dates: Vec<NaiveDate>,
    #[serde(default)]
    pub session_templates: HashMap<NaiveDate, Vec<SessionTemplate>>,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn legal_edges_are_exactly_four() {
        use EventStatus::*;
        let all = [Draft, Open, Finalized, Reopened];
        let legal: Vec<_> = all
            .iter()
            .flat_map(|a| all.iter().map(move |b| (*a, *b)))
            .filter(|(a, b)| a.can_transition_to(*b))
            .collect();
        assert_eq!(
            legal,
            vec![
                (Draft, Open),
                (Open, Finalized),
                (Finalized, Reopened),
                (Reopened, Finalized)
            ]
        );
    }

    #[test]
    fn signature_acceptance_follows_status() {
        assert!(!EventStatus::Draft.accepts_signatures());
        assert!(EventStatus::Open.accepts_signatures());
        assert!(!EventStatus::Finalized.accepts_signatures());
        assert!(EventStatus::Reopened.accepts_signatures());
    }

    #[test]
    fn status_serializes_snake_case() {
        let json = serde_json::to_string(&EventStatus::Reopened).unwrap();
        assert_eq!(json, "\"reopened\"");
    }
}
