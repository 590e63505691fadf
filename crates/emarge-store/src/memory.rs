//! In-memory implementations of the storage traits.
//!
//! Suitable for development and testing. Production deployments use a
//! persistent backend with equivalent uniqueness constraints.

use async_trait::async_trait;
use chrono::NaiveDate;
use dashmap::mapref::entry::Entry;
use dashmap::DashMap;
use emarge_types::{
    AttendanceDay, DayId, Event, EventId, ImageId, Participant, ParticipantId, Session, SessionId,
    Signature, SignatureId, SigningToken,
};
use tracing::debug;

use crate::error::{Result, StoreError};
use crate::traits::{AttendanceStore, BlobStore, WriteOrigin};

/// In-memory entity store backed by concurrent maps.
///
/// Uniqueness constraints are enforced through secondary index maps using
/// the atomic `entry` API, so racing duplicate inserts resolve
/// deterministically: one wins, the rest get [`StoreError::Conflict`].
pub struct InMemoryStore {
    events: DashMap<EventId, Event>,
    event_by_token: DashMap<String, EventId>,

    days: DashMap<DayId, AttendanceDay>,
    day_by_date: DashMap<(EventId, NaiveDate), DayId>,
    days_by_event: DashMap<EventId, Vec<DayId>>,

    sessions: DashMap<SessionId, Session>,
    sessions_by_day: DashMap<DayId, Vec<SessionId>>,

    participants: DashMap<ParticipantId, Participant>,
    participant_by_email: DashMap<String, ParticipantId>,

    signatures: DashMap<SignatureId, Signature>,
    signature_by_pair: DashMap<(ParticipantId, SessionId), SignatureId>,
    signatures_by_session: DashMap<SessionId, Vec<SignatureId>>,
}

impl InMemoryStore {
    pub fn new() -> Self {
        Self {
            events: DashMap::new(),
            event_by_token: DashMap::new(),
            days: DashMap::new(),
            day_by_date: DashMap::new(),
            days_by_event: DashMap::new(),
            sessions: DashMap::new(),
            sessions_by_day: DashMap::new(),
            participants: DashMap::new(),
            participant_by_email: DashMap::new(),
            signatures: DashMap::new(),
            signature_by_pair: DashMap::new(),
            signatures_by_session: DashMap::new(),
        }
    }

    /// Claim a signing token for an event, atomically.
    fn claim_token(&self, token: &SigningToken, event_id: &EventId) -> Result<()> {
        match self.event_by_token.entry(token.as_str().to_string()) {
            Entry::Occupied(existing) if existing.get() != event_id => {
                Err(StoreError::conflict("event.signing_token", token))
            }
            Entry::Occupied(_) => Ok(()),
            Entry::Vacant(slot) => {
                slot.insert(event_id.clone());
                Ok(())
            }
        }
    }
}

impl Default for InMemoryStore {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait]
impl AttendanceStore for InMemoryStore {
    async fn insert_event(&self, event: Event) -> Result<()> {
        if self.events.contains_key(&event.id) {
            return Err(StoreError::conflict("event.id", &event.id));
        }
        self.claim_token(&event.signing_token, &event.id)?;
        self.events.insert(event.id.clone(), event);
        Ok(())
    }

    async fn update_event(&self, event: Event, origin: WriteOrigin) -> Result<()> {
        let previous_token = match self.events.get(&event.id) {
            Some(current) => current.signing_token.clone(),
            None => return Err(StoreError::not_found("event", &event.id)),
        };

        if previous_token != event.signing_token {
            self.claim_token(&event.signing_token, &event.id)?;
            self.event_by_token.remove(previous_token.as_str());
        }

        debug!(event_id = %event.id, ?origin, "event updated");
        self.events.insert(event.id.clone(), event);
        Ok(())
    }

    async fn get_event(&self, id: &EventId) -> Result<Option<Event>> {
        Ok(self.events.get(id).map(|e| e.clone()))
    }

    async fn find_event_by_token(&self, token: &SigningToken) -> Result<Option<Event>> {
        let Some(id) = self.event_by_token.get(token.as_str()) else {
            return Ok(None);
        };
        Ok(self.events.get(&id).map(|e| e.clone()))
    }

    async fn attach_participant(
        &self,
        event_id: &EventId,
        participant_id: &ParticipantId,
    ) -> Result<()> {
        // get_mut holds the shard lock, serializing concurrent appends
        let Some(mut event) = self.events.get_mut(event_id) else {
            return Err(StoreError::not_found("event", event_id));
        };
        if !event.participants.contains(participant_id) {
            event.participants.push(participant_id.clone());
            event.updated_at = chrono::Utc::now();
        }
        Ok(())
    }

    async fn insert_day(&self, day: AttendanceDay) -> Result<()> {
        let key = (day.event_id.clone(), day.date);
        match self.day_by_date.entry(key) {
            Entry::Occupied(_) => {
                return Err(StoreError::conflict(
                    "attendance_day.(event, date)",
                    format!("{}/{}", day.event_id, day.date),
                ));
            }
            Entry::Vacant(slot) => {
                slot.insert(day.id.clone());
            }
        }

        self.days_by_event
            .entry(day.event_id.clone())
            .or_default()
            .push(day.id.clone());
        self.days.insert(day.id.clone(), day);
        Ok(())
    }

    async fn get_day(&self, id: &DayId) -> Result<Option<AttendanceDay>> {
        Ok(self.days.get(id).map(|d| d.clone()))
    }

    async fn days_for_event(&self, event_id: &EventId) -> Result<Vec<AttendanceDay>> {
        let mut result = Vec::new();
        if let Some(ids) = self.days_by_event.get(event_id) {
            for id in ids.iter() {
                if let Some(day) = self.days.get(id) {
                    result.push(day.clone());
                }
            }
        }
        Ok(result)
    }

    async fn delete_day(&self, id: &DayId) -> Result<()> {
        let Some((_, day)) = self.days.remove(id) else {
            return Err(StoreError::not_found("attendance_day", id));
        };

        self.day_by_date.remove(&(day.event_id.clone(), day.date));
        if let Some(mut ids) = self.days_by_event.get_mut(&day.event_id) {
            ids.retain(|d| d != id);
        }

        // Cascade to sessions and their signatures
        let session_ids = self
            .sessions_by_day
            .remove(id)
            .map(|(_, ids)| ids)
            .unwrap_or_default();
        for session_id in session_ids {
            self.sessions.remove(&session_id);
            let signature_ids = self
                .signatures_by_session
                .remove(&session_id)
                .map(|(_, ids)| ids)
                .unwrap_or_default();
            for signature_id in signature_ids {
                if let Some((_, signature)) = self.signatures.remove(&signature_id) {
                    self.signature_by_pair
                        .remove(&(signature.participant_id, signature.session_id));
                }
            }
        }
        Ok(())
    }

    async fn insert_session(&self, session: Session) -> Result<()> {
        self.sessions_by_day
            .entry(session.day_id.clone())
            .or_default()
            .push(session.id.clone());
        self.sessions.insert(session.id.clone(), session);
        Ok(())
    }

    async fn get_session(&self, id: &SessionId) -> Result<Option<Session>> {
        Ok(self.sessions.get(id).map(|s| s.clone()))
    }

    async fn sessions_for_day(&self, day_id: &DayId) -> Result<Vec<Session>> {
        let mut result = Vec::new();
        if let Some(ids) = self.sessions_by_day.get(day_id) {
            for id in ids.iter() {
                if let Some(session) = self.sessions.get(id) {
                    result.push(session.clone());
                }
            }
        }
        Ok(result)
    }

    async fn insert_participant(&self, participant: Participant) -> Result<()> {
        // Email index keeps the first registration; participants are not
        // unique, the index only serves identity reuse lookups.
        self.participant_by_email
            .entry(participant.email.to_lowercase())
            .or_insert_with(|| participant.id.clone());
        self.participants
            .insert(participant.id.clone(), participant);
        Ok(())
    }

    async fn get_participant(&self, id: &ParticipantId) -> Result<Option<Participant>> {
        Ok(self.participants.get(id).map(|p| p.clone()))
    }

    async fn find_participant_by_email(&self, email: &str) -> Result<Option<Participant>> {
        let Some(id) = self.participant_by_email.get(&email.to_lowercase()) else {
            return Ok(None);
        };
        Ok(self.participants.get(&id).map(|p| p.clone()))
    }

    async fn insert_signature(&self, signature: Signature) -> Result<()> {
        let key = (
            signature.participant_id.clone(),
            signature.session_id.clone(),
        );
        match self.signature_by_pair.entry(key) {
            Entry::Occupied(_) => {
                return Err(StoreError::conflict(
                    "signature.(participant, session)",
                    format!("{}/{}", signature.participant_id, signature.session_id),
                ));
            }
            Entry::Vacant(slot) => {
                slot.insert(signature.id.clone());
            }
        }

        self.signatures_by_session
            .entry(signature.session_id.clone())
            .or_default()
            .push(signature.id.clone());
        self.signatures.insert(signature.id.clone(), signature);
        Ok(())
    }

    async fn signature_for(
        &self,
        participant_id: &ParticipantId,
        session_id: &SessionId,
    ) -> Result<Option<Signature>> {
        let key = (participant_id.clone(), session_id.clone());
        let Some(id) = self.signature_by_pair.get(&key) else {
            return Ok(None);
        };
        Ok(self.signatures.get(&id).map(|s| s.clone()))
    }

    async fn signatures_for_session(&self, session_id: &SessionId) -> Result<Vec<Signature>> {
        let mut result = Vec::new();
        if let Some(ids) = self.signatures_by_session.get(session_id) {
            for id in ids.iter() {
                if let Some(signature) = self.signatures.get(id) {
                    result.push(signature.clone());
                }
            }
        }
        Ok(result)
    }
}

/// In-memory blob store.
pub struct InMemoryBlobStore {
    blobs: DashMap<ImageId, Vec<u8>>,
}

impl InMemoryBlobStore {
    pub fn new() -> Self {
        Self {
            blobs: DashMap::new(),
        }
    }

    /// Number of stored blobs. Test and metrics hook.
    pub fn stored(&self) -> usize {
        self.blobs.len()
    }
}

impl Default for InMemoryBlobStore {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait]
impl BlobStore for InMemoryBlobStore {
    async fn put(&self, bytes: Vec<u8>) -> Result<ImageId> {
        let id = ImageId::generate();
        self.blobs.insert(id.clone(), bytes);
        Ok(id)
    }

    async fn get(&self, id: &ImageId) -> Result<Option<Vec<u8>>> {
        Ok(self.blobs.get(id).map(|b| b.clone()))
    }

    async fn delete(&self, id: &ImageId) -> Result<()> {
        self.blobs.remove(id);
        Ok(())
    }
}
