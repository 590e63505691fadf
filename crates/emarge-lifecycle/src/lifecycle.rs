//! Event lifecycle service.
//!
//! Enforces the status transition graph, owns signing-token issuance, runs
//! the provisioner on every organizer write, and fires finalization side
//! effects. The status write is authoritative: export and notification run
//! fire-and-forget on a spawned task, and their failure is logged, never
//! rolled back into the transition.

use std::sync::Arc;

use async_trait::async_trait;
use chrono::Utc;
use emarge_store::{AttendanceStore, WriteOrigin};
use emarge_types::{
    AttendanceDay, Caller, DayId, Event, EventId, EventStatus, NewEvent, Session, SessionId,
    SigningToken,
};
use tracing::{error, info, instrument};

use crate::error::{LifecycleError, Result};
use crate::provisioner::AttendanceProvisioner;
use crate::token::SigningTokenGenerator;

/// Receiver of the finalization side effect (export + notification).
///
/// Invoked on a spawned task after every transition into `Finalized`; the
/// transition does not wait on it and a failure never reverts it. No
/// cancellation: retry means finalizing again after a reopen.
#[async_trait]
pub trait FinalizeSink: Send + Sync {
    async fn on_finalized(&self, event: Event) -> anyhow::Result<()>;
}

/// Sink that only logs. Placeholder for wiring without an export pipeline.
pub struct LoggingFinalizeSink;

#[async_trait]
impl FinalizeSink for LoggingFinalizeSink {
    async fn on_finalized(&self, event: Event) -> anyhow::Result<()> {
        info!(event_id = %event.id, "event finalized (no export sink configured)");
        Ok(())
    }
}

/// A day with its sessions, as resolved for the public signing page.
#[derive(Debug, Clone)]
pub struct DaySchedule {
    pub day: AttendanceDay,
    pub sessions: Vec<Session>,
}

/// Optional narrowing carried by day- or session-granular QR codes.
#[derive(Debug, Clone, Default)]
pub struct ResolveHint {
    pub day: Option<DayId>,
    pub session: Option<SessionId>,
}

/// Live event state behind a signing token.
#[derive(Debug, Clone)]
pub struct SigningResolution {
    pub event: Event,
    pub schedule: Vec<DaySchedule>,
}

/// The event status state machine and its side-effect orchestration.
pub struct EventLifecycle {
    store: Arc<dyn AttendanceStore>,
    provisioner: AttendanceProvisioner,
    tokens: SigningTokenGenerator,
    finalize_sink: Arc<dyn FinalizeSink>,
}

impl EventLifecycle {
    pub fn new(store: Arc<dyn AttendanceStore>, finalize_sink: Arc<dyn FinalizeSink>) -> Self {
        Self {
            provisioner: AttendanceProvisioner::new(store.clone()),
            store,
            tokens: SigningTokenGenerator::new(),
            finalize_sink,
        }
    }

    /// Create an event in `Draft`, assign its signing token, and provision
    /// days/sessions from the configured dates.
    #[instrument(skip(self, caller, new), fields(title = %new.title))]
    pub async fn create_event(&self, caller: &Caller, new: NewEvent) -> Result<Event> {
        match caller {
            Caller::Anonymous => {
                return Err(LifecycleError::Validation(
                    "anonymous callers cannot create events".into(),
                ))
            }
            Caller::Organizer(id) if id != &new.organizer => {
                return Err(LifecycleError::Validation(
                    "organizer mismatch between caller and event".into(),
                ))
            }
            _ => {}
        }
        if new.title.trim().is_empty() {
            return Err(LifecycleError::Validation("title must not be empty".into()));
        }

        let now = Utc::now();
        let event = Event {
            id: EventId::generate(),
            title: new.title,
            location: new.location,
            organizer: new.organizer,
            organizer_email: new.organizer_email,
            expense_class: new.expense_class,
            status: EventStatus::Draft,
            // Assigned exactly once here; only regenerate_token replaces it
            signing_token: self.tokens.generate(),
            qr_granularity: new.qr_granularity,
            theme: new.theme,
            selected_dates: new.selected_dates,
            session_templates: new.session_templates,
            days: vec![],
            participants: vec![],
            created_at: now,
            updated_at: now,
        };

        self.store.insert_event(event.clone()).await?;
        self.provisioner.provision(&event).await?;

        let created = self.require_event(&event.id).await?;
        info!(event_id = %created.id, "event created");
        Ok(created)
    }

    /// Apply an organizer edit: validate any status change against the
    /// transition graph, persist, re-provision, and fire finalization side
    /// effects when the event just became `Finalized`.
    #[instrument(skip(self, caller, updated), fields(event_id = %updated.id))]
    pub async fn update_event(&self, caller: &Caller, updated: Event) -> Result<Event> {
        let current = self.require_event(&updated.id).await?;
        if !caller.owns(&current) {
            return Err(LifecycleError::NotOwner(current.id));
        }

        let status_changed = current.status != updated.status;
        if status_changed && !current.status.can_transition_to(updated.status) {
            return Err(LifecycleError::IllegalTransition {
                from: current.status,
                to: updated.status,
            });
        }

        let mut next = updated;
        // Token and provenance fields are not editable through updates
        next.signing_token = current.signing_token.clone();
        next.created_at = current.created_at;
        next.updated_at = Utc::now();

        self.store
            .update_event(next.clone(), WriteOrigin::Organizer)
            .await?;
        self.provisioner.provision(&next).await?;

        let persisted = self.require_event(&next.id).await?;
        if status_changed {
            info!(
                event_id = %persisted.id,
                from = %current.status,
                to = %persisted.status,
                "event status transitioned"
            );
            if persisted.status.is_finalized() {
                self.spawn_finalize_side_effects(persisted.clone());
            }
        }
        Ok(persisted)
    }

    /// Convenience for pure status changes.
    pub async fn transition(
        &self,
        caller: &Caller,
        event_id: &EventId,
        to: EventStatus,
    ) -> Result<Event> {
        let mut event = self.require_event(event_id).await?;
        event.status = to;
        self.update_event(caller, event).await
    }

    /// Replace the signing token, invalidating previously distributed links
    /// and QR codes. Explicit and owner-only; never happens implicitly.
    #[instrument(skip(self, caller), fields(event_id = %event_id))]
    pub async fn regenerate_token(
        &self,
        caller: &Caller,
        event_id: &EventId,
    ) -> Result<SigningToken> {
        let mut event = self.require_event(event_id).await?;
        if !caller.owns(&event) {
            return Err(LifecycleError::NotOwner(event.id));
        }

        event.signing_token = self.tokens.generate();
        event.updated_at = Utc::now();
        let token = event.signing_token.clone();
        self.store
            .update_event(event, WriteOrigin::Organizer)
            .await?;

        info!(event_id = %event_id, "signing token regenerated, prior links invalidated");
        Ok(token)
    }

    /// Resolve a public signing token to live event state, narrowed by the
    /// optional day/session hint from a finer-granularity QR code.
    pub async fn resolve_signing_link(
        &self,
        token: &SigningToken,
        hint: &ResolveHint,
    ) -> Result<SigningResolution> {
        let event = self
            .store
            .find_event_by_token(token)
            .await?
            .ok_or(LifecycleError::UnknownToken)?;

        let mut schedule = Vec::new();
        for day in self.store.days_for_event(&event.id).await? {
            if hint.day.as_ref().is_some_and(|d| d != &day.id) {
                continue;
            }
            let mut sessions = self.store.sessions_for_day(&day.id).await?;
            if let Some(wanted) = &hint.session {
                sessions.retain(|s| &s.id == wanted);
                if sessions.is_empty() {
                    continue;
                }
            }
            schedule.push(DaySchedule { day, sessions });
        }

        Ok(SigningResolution { event, schedule })
    }

    /// Remove a provisioned day. Admin-only: provisioning itself never
    /// deletes, whatever happens to `selected_dates`.
    #[instrument(skip(self, caller), fields(day_id = %day_id))]
    pub async fn remove_day(&self, caller: &Caller, day_id: &DayId) -> Result<()> {
        if !caller.is_admin() {
            return Err(LifecycleError::NotAdmin);
        }
        let day = self
            .store
            .get_day(day_id)
            .await?
            .ok_or_else(|| emarge_store::StoreError::not_found("attendance_day", day_id))?;
        self.store.delete_day(day_id).await?;

        // Drop the day from its event's synchronized set
        if let Some(mut event) = self.store.get_event(&day.event_id).await? {
            event.days.retain(|d| d != day_id);
            event.updated_at = Utc::now();
            self.store
                .update_event(event, WriteOrigin::Reconcile)
                .await?;
        }
        info!(day_id = %day_id, "attendance day removed by admin");
        Ok(())
    }

    fn spawn_finalize_side_effects(&self, event: Event) {
        let sink = self.finalize_sink.clone();
        let event_id = event.id.clone();
        tokio::spawn(async move {
            if let Err(e) = sink.on_finalized(event).await {
                // Finalized status stays authoritative regardless
                error!(event_id = %event_id, error = %e, "finalization export/notify failed");
            }
        });
    }

    async fn require_event(&self, id: &EventId) -> Result<Event> {
        self.store
            .get_event(id)
            .await?
            .ok_or_else(|| emarge_store::StoreError::not_found("event", id).into())
    }
}
