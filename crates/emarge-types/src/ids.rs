//! Identifier newtypes for the core entities.

use serde::{Deserialize, Serialize};
use uuid::Uuid;

macro_rules! define_id {
    ($(#[$doc:meta])* $name:ident) => {
        $(#[$doc])*
        #[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
        pub struct $name(String);

        impl $name {
            /// Generate a fresh random identifier.
            pub fn generate() -> Self {
                Self(Uuid::new_v4().to_string())
            }

            pub fn new(id: impl Into<String>) -> Self {
                Self(id.into())
            }

            pub fn as_str(&self) -> &str {
                &self.0
            }
        }

        impl std::fmt::Display for $name {
            fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
                write!(f, "{}", self.0)
            }
        }
    };
}

define_id!(
    /// Identifies an [`crate::Event`].
    EventId
);
define_id!(
    /// Identifies an [`crate::AttendanceDay`].
    DayId
);
define_id!(
    /// Identifies a [`crate::Session`].
    SessionId
);
define_id!(
    /// Identifies a [`crate::Participant`].
    ParticipantId
);
define_id!(
    /// Identifies a [`crate::Signature`].
    SignatureId
);
define_id!(
    /// Identifies a stored signature image blob.
    ImageId
);
