//! Signature records.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::ids::{ImageId, ParticipantId, SessionId, SignatureId};

/// A participant's recorded presence for one session.
///
/// At most one signature exists per (participant, session) pair; the store
/// enforces this as a hard constraint, first writer wins. Creation is only
/// permitted while the owning event is `Open` or `Reopened`.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Signature {
    pub id: SignatureId,
    pub participant_id: ParticipantId,
    pub session_id: SessionId,
    /// Sanitized signature image in the blob store
    pub image: ImageId,
    /// Consent to data processing, recorded with the signature
    pub consent: bool,
    pub created_at: DateTime<Utc>,
}

impl Signature {
    pub fn new(
        participant_id: ParticipantId,
        session_id: SessionId,
        image: ImageId,
        consent: bool,
    ) -> Self {
        Self {
            id: SignatureId::generate(),
            participant_id,
            session_id,
            image,
            consent,
            created_at: Utc::now(),
        }
    }
}
