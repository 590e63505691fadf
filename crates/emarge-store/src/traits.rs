//! Storage trait definitions.
//!
//! Relationship traversal is always an explicit query-by-foreign-key
//! contract: callers never assume an entity arrives with its relations
//! pre-joined.

use async_trait::async_trait;
use emarge_types::{
    AttendanceDay, DayId, Event, EventId, ImageId, Participant, ParticipantId, Session, SessionId,
    Signature, SigningToken,
};

use crate::error::Result;

/// Marks what kind of write is being performed on an event.
///
/// The provisioner's day-set synchronization writes back to the event that
/// triggered it; tagging that write lets the lifecycle layer tell it apart
/// from an organizer edit and never re-enter provisioning.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum WriteOrigin {
    /// Organizer- or admin-initiated write; triggers provisioning
    Organizer,
    /// Provisioner write-back; must never trigger provisioning again
    Reconcile,
}

/// Entity storage for the attendance engine.
///
/// Backends must enforce three uniqueness constraints atomically:
/// `Event.signing_token`, (event, date) for attendance days, and
/// (participant, session) for signatures.
#[async_trait]
pub trait AttendanceStore: Send + Sync {
    // ── Events ───────────────────────────────────────────────────────

    async fn insert_event(&self, event: Event) -> Result<()>;

    async fn update_event(&self, event: Event, origin: WriteOrigin) -> Result<()>;

    async fn get_event(&self, id: &EventId) -> Result<Option<Event>>;

    async fn find_event_by_token(&self, token: &SigningToken) -> Result<Option<Event>>;

    /// Append a participant to the event roster if not already on it,
    /// atomically with respect to concurrent appends.
    async fn attach_participant(
        &self,
        event_id: &EventId,
        participant_id: &ParticipantId,
    ) -> Result<()>;

    // ── Attendance days ──────────────────────────────────────────────

    /// Insert a day; fails with a conflict if the (event, date) pair exists.
    async fn insert_day(&self, day: AttendanceDay) -> Result<()>;

    async fn get_day(&self, id: &DayId) -> Result<Option<AttendanceDay>>;

    /// Days for an event, in insertion order.
    async fn days_for_event(&self, event_id: &EventId) -> Result<Vec<AttendanceDay>>;

    /// Remove a day and its sessions. Admin-path only; the provisioner
    /// never deletes.
    async fn delete_day(&self, id: &DayId) -> Result<()>;

    // ── Sessions ─────────────────────────────────────────────────────

    async fn insert_session(&self, session: Session) -> Result<()>;

    async fn get_session(&self, id: &SessionId) -> Result<Option<Session>>;

    /// Sessions for a day, in insertion order.
    async fn sessions_for_day(&self, day_id: &DayId) -> Result<Vec<Session>>;

    // ── Participants ─────────────────────────────────────────────────

    async fn insert_participant(&self, participant: Participant) -> Result<()>;

    async fn get_participant(&self, id: &ParticipantId) -> Result<Option<Participant>>;

    async fn find_participant_by_email(&self, email: &str) -> Result<Option<Participant>>;

    // ── Signatures ───────────────────────────────────────────────────

    /// Insert a signature; fails with a conflict if the (participant,
    /// session) pair already has one. First writer wins.
    async fn insert_signature(&self, signature: Signature) -> Result<()>;

    async fn signature_for(
        &self,
        participant_id: &ParticipantId,
        session_id: &SessionId,
    ) -> Result<Option<Signature>>;

    /// Signatures for a session, in insertion order.
    async fn signatures_for_session(&self, session_id: &SessionId) -> Result<Vec<Signature>>;
}

/// Binary storage for sanitized signature images.
#[async_trait]
pub trait BlobStore: Send + Sync {
    async fn put(&self, bytes: Vec<u8>) -> Result<ImageId>;

    async fn get(&self, id: &ImageId) -> Result<Option<Vec<u8>>>;

    /// Remove a blob. Deleting an unknown id is a no-op.
    async fn delete(&self, id: &ImageId) -> Result<()>;
}
