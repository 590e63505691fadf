//! The assembled attendance service.

use std::sync::Arc;

use emarge_export::{ExportEngine, ImageOptimizer, Notifier};
use emarge_intake::{IntakeError, RateCheck, RateLimiter, SignatureIntake, Submission, UploadSanitizer};
use emarge_lifecycle::{EventLifecycle, LifecycleError, ResolveHint, SigningResolution};
use emarge_store::{AttendanceStore, BlobStore};
use emarge_types::{Caller, DayId, Event, EventId, EventStatus, NewEvent, Signature, SigningToken};

use crate::config::ServiceConfig;
use crate::sink::ExportFinalizeSink;

/// Everything an embedder needs, behind one object.
///
/// Construction wires the finalization export into the lifecycle: a
/// transition into `Finalized` builds the workbook and mails it to the
/// organizer on a background task.
pub struct AttendanceService {
    lifecycle: EventLifecycle,
    intake: SignatureIntake,
}

impl AttendanceService {
    pub fn new(
        store: Arc<dyn AttendanceStore>,
        blobs: Arc<dyn BlobStore>,
        notifier: Arc<dyn Notifier>,
        config: ServiceConfig,
    ) -> Self {
        let engine = ExportEngine::new(
            store.clone(),
            blobs.clone(),
            ImageOptimizer::default(),
            config.export,
        );
        let sink = Arc::new(ExportFinalizeSink::new(engine, notifier));
        let lifecycle = EventLifecycle::new(store.clone(), sink);

        let intake = SignatureIntake::new(
            store,
            blobs,
            Arc::new(RateLimiter::new(config.rate_limit)),
            config.captcha.build(),
            UploadSanitizer::new(config.upload),
        );

        Self { lifecycle, intake }
    }

    // Lifecycle

    pub async fn create_event(
        &self,
        caller: &Caller,
        new: NewEvent,
    ) -> Result<Event, LifecycleError> {
        self.lifecycle.create_event(caller, new).await
    }

    pub async fn update_event(
        &self,
        caller: &Caller,
        updated: Event,
    ) -> Result<Event, LifecycleError> {
        self.lifecycle.update_event(caller, updated).await
    }

    pub async fn transition(
        &self,
        caller: &Caller,
        event_id: &EventId,
        to: EventStatus,
    ) -> Result<Event, LifecycleError> {
        self.lifecycle.transition(caller, event_id, to).await
    }

    pub async fn regenerate_token(
        &self,
        caller: &Caller,
        event_id: &EventId,
    ) -> Result<SigningToken, LifecycleError> {
        self.lifecycle.regenerate_token(caller, event_id).await
    }

    pub async fn resolve_signing_link(
        &self,
        token: &SigningToken,
        hint: &ResolveHint,
    ) -> Result<SigningResolution, LifecycleError> {
        self.lifecycle.resolve_signing_link(token, hint).await
    }

    pub async fn remove_day(&self, caller: &Caller, day_id: &DayId) -> Result<(), LifecycleError> {
        self.lifecycle.remove_day(caller, day_id).await
    }

    // Intake

    pub async fn submit_signature(
        &self,
        caller: &Caller,
        submission: Submission,
    ) -> Result<Signature, IntakeError> {
        self.intake.submit(caller, submission).await
    }

    /// Non-counting probe for the UI to decide whether to show a challenge.
    pub fn check_rate(&self, device_key: &str) -> RateCheck {
        self.intake.check_rate(device_key)
    }
}
