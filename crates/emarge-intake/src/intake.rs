//! Signature intake pipeline.

use std::sync::Arc;

use emarge_store::{AttendanceStore, BlobStore};
use emarge_types::{
    BeneficiaryType, Caller, EventStatus, Participant, ParticipantId, SessionId, Signature,
};
use tracing::{debug, info, instrument};

use crate::captcha::CaptchaService;
use crate::error::IntakeError;
use crate::rate_limit::{RateCheck, RateLimiter};
use crate::scrub::strip_markup;
use crate::upload::UploadSanitizer;

/// Identity fields supplied by the attendee. Free text; scrubbed before
/// persisting.
#[derive(Debug, Clone)]
pub struct SubmissionIdentity {
    pub first_name: String,
    pub last_name: String,
    pub email: String,
    pub city: String,
    pub professional_number: Option<String>,
    pub beneficiary: BeneficiaryType,
}

impl SubmissionIdentity {
    fn scrubbed(self) -> Self {
        Self {
            first_name: strip_markup(&self.first_name),
            last_name: strip_markup(&self.last_name),
            email: strip_markup(&self.email),
            city: strip_markup(&self.city),
            professional_number: self.professional_number.as_deref().map(strip_markup),
            beneficiary: match self.beneficiary {
                BeneficiaryType::Other(label) => BeneficiaryType::Other(strip_markup(&label)),
                other => other,
            },
        }
    }
}

/// One public signature submission.
#[derive(Debug, Clone)]
pub struct Submission {
    pub session_id: SessionId,
    pub identity: SubmissionIdentity,
    /// Raw upload bytes, exactly as received
    pub image: Vec<u8>,
    pub consent: bool,
    /// Opaque device identity for rate limiting
    pub device_key: String,
    pub captcha_proof: Option<String>,
}

/// Orchestrates the ordered gating chain for signature submissions.
pub struct SignatureIntake {
    store: Arc<dyn AttendanceStore>,
    blobs: Arc<dyn BlobStore>,
    rate_limiter: Arc<RateLimiter>,
    captcha: Arc<dyn CaptchaService>,
    sanitizer: UploadSanitizer,
}

impl SignatureIntake {
    pub fn new(
        store: Arc<dyn AttendanceStore>,
        blobs: Arc<dyn BlobStore>,
        rate_limiter: Arc<RateLimiter>,
        captcha: Arc<dyn CaptchaService>,
        sanitizer: UploadSanitizer,
    ) -> Self {
        Self {
            store,
            blobs,
            rate_limiter,
            captcha,
            sanitizer,
        }
    }

    /// Validate and persist one submission, or reject it with the error of
    /// the first failing gate.
    #[instrument(skip(self, caller, submission), fields(session_id = %submission.session_id))]
    pub async fn submit(
        &self,
        caller: &Caller,
        submission: Submission,
    ) -> Result<Signature, IntakeError> {
        // Anonymous submissions face the abuse gates before anything else
        if matches!(caller, Caller::Anonymous) {
            self.abuse_gates(&submission).await?;
        }

        // Resolve session -> day -> event and gate on status
        let session = self
            .store
            .get_session(&submission.session_id)
            .await?
            .ok_or(IntakeError::SessionNotFound)?;
        let day = self
            .store
            .get_day(&session.day_id)
            .await?
            .ok_or(IntakeError::SessionNotFound)?;
        let event = self
            .store
            .get_event(&day.event_id)
            .await?
            .ok_or(IntakeError::SessionNotFound)?;

        // The walk-in bypass is scoped to ownership: an organizer signing
        // on someone else's event faces the same gates as the public
        if caller.owns(&event) {
            debug!("abuse gates bypassed for event owner");
        } else if !matches!(caller, Caller::Anonymous) {
            self.abuse_gates(&submission).await?;
        }

        match event.status {
            EventStatus::Draft => return Err(IntakeError::NotOpenYet),
            EventStatus::Finalized => return Err(IntakeError::NoLongerOpen),
            EventStatus::Open | EventStatus::Reopened => {}
        }

        // Canonicalize the upload before anything touches storage
        let sanitized = self.sanitizer.sanitize(&submission.image)?;

        let identity = submission.identity.scrubbed();
        let participant = self.resolve_participant(identity).await?;

        if self
            .store
            .signature_for(&participant.id, &session.id)
            .await?
            .is_some()
        {
            return Err(IntakeError::DuplicateSignature);
        }

        let image_id = self.blobs.put(sanitized).await?;
        let signature = Signature::new(
            participant.id.clone(),
            session.id.clone(),
            image_id,
            submission.consent,
        );
        // The store constraint is authoritative: a racing duplicate loses
        // here even after the read above saw nothing
        match self.store.insert_signature(signature.clone()).await {
            Ok(()) => {}
            Err(e) if e.is_conflict() => {
                // The blob was stored for a signature that never landed
                if let Err(e) = self.blobs.delete(&signature.image).await {
                    debug!(image_id = %signature.image, error = %e, "orphan blob cleanup failed");
                }
                return Err(IntakeError::DuplicateSignature);
            }
            Err(e) => return Err(e.into()),
        }

        self.attach_to_roster(&event.id, &participant.id).await?;

        info!(
            signature_id = %signature.id,
            participant_id = %participant.id,
            "signature recorded"
        );
        Ok(signature)
    }

    /// Rate-check probe: what a submission from `device_key` would face,
    /// without counting anything.
    pub fn check_rate(&self, device_key: &str) -> RateCheck {
        self.rate_limiter.probe(device_key)
    }

    /// CAPTCHA and rate-limit gating for submissions without owner
    /// privileges.
    async fn abuse_gates(&self, submission: &Submission) -> Result<(), IntakeError> {
        // A supplied proof must verify, whatever the rate tier
        let mut proof_valid = false;
        if let Some(proof) = &submission.captcha_proof {
            if !self.captcha.verify(proof).await? {
                return Err(IntakeError::CaptchaInvalid);
            }
            proof_valid = true;
        }

        let verdict = self.rate_limiter.check_and_count(&submission.device_key);
        if verdict.is_blocked() {
            // Hard threshold: rejected regardless of proof
            return Err(IntakeError::RateLimitExceeded);
        }
        if verdict.needs_challenge() && !proof_valid {
            return Err(IntakeError::CaptchaRequired);
        }
        Ok(())
    }

    /// Reuse an existing participant identity by email or create one.
    async fn resolve_participant(
        &self,
        identity: SubmissionIdentity,
    ) -> Result<Participant, IntakeError> {
        if let Some(existing) = self
            .store
            .find_participant_by_email(&identity.email)
            .await?
        {
            return Ok(existing);
        }

        let participant = Participant {
            id: ParticipantId::generate(),
            first_name: identity.first_name,
            last_name: identity.last_name,
            email: identity.email,
            city: identity.city,
            professional_number: identity.professional_number,
            beneficiary: identity.beneficiary,
        };
        self.store.insert_participant(participant.clone()).await?;
        Ok(participant)
    }

    /// Add the participant to the event roster if not already on it.
    async fn attach_to_roster(
        &self,
        event_id: &emarge_types::EventId,
        participant_id: &ParticipantId,
    ) -> Result<(), IntakeError> {
        self.store
            .attach_participant(event_id, participant_id)
            .await?;
        Ok(())
    }
}
