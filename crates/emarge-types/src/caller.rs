//! Caller identity.
//!
//! Authentication itself is an external capability; the engine only needs
//! the resolved identity and two predicates derived from it.

use serde::{Deserialize, Serialize};

use crate::event::Event;

/// Identifies an organizer account.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct OrganizerId(String);

impl OrganizerId {
    pub fn new(id: impl Into<String>) -> Self {
        Self(id.into())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl std::fmt::Display for OrganizerId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// The identity behind a request.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Caller {
    /// Public signing-link visitor
    Anonymous,
    /// Authenticated organizer, scoped to their own events
    Organizer(OrganizerId),
    /// Back-office administrator
    Admin,
}

impl Caller {
    /// Ownership predicate: organizers own only their events, admins own
    /// everything, anonymous callers own nothing.
    pub fn owns(&self, event: &Event) -> bool {
        match self {
            Caller::Anonymous => false,
            Caller::Organizer(id) => &event.organizer == id,
            Caller::Admin => true,
        }
    }

    pub fn is_admin(&self) -> bool {
        matches!(self, Caller::Admin)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::event::{EventStatus, ExpenseClass, QrGranularity, SigningToken};
    use crate::ids::EventId;

    fn event_owned_by(organizer: &str) -> Event {
        Event {
            id: EventId::generate(),
            title: "Symposium".into(),
            location: "Lyon".into(),
            organizer: OrganizerId::new(organizer),
            organizer_email: "org@example.com".into(),
            expense_class: ExpenseClass::Hospitality,
            status: EventStatus::Draft,
            signing_token: SigningToken::new("tok"),
            qr_granularity: QrGranularity::Event,
            theme: serde_json::Value::Null,
            selected_dates: vec![],
            session_templates: Default::default(),
            days: vec![],
            participants: vec![],
            created_at: chrono::Utc::now(),
            updated_at: chrono::Utc::now(),
        }
    }

    #[test]
    fn ownership_scoping() {
        let event = event_owned_by("alice");
        assert!(Caller::Organizer(OrganizerId::new("alice")).owns(&event));
        assert!(!Caller::Organizer(OrganizerId::new("bob")).owns(&event));
        assert!(Caller::Admin.owns(&event));
        assert!(!Caller::Anonymous.owns(&event));
    }
}
