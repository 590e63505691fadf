//! Attendance provisioning: derive day and session records from an event's
//! configured dates.
//!
//! Provisioning is idempotent and strictly additive. Re-running with the
//! same dates creates nothing; removing a date from the configuration never
//! deletes its day. Deletion is a separate admin-only operation on the
//! lifecycle service.

use std::collections::HashSet;
use std::sync::Arc;

use chrono::Utc;
use emarge_store::{AttendanceStore, WriteOrigin};
use emarge_types::{AttendanceDay, DayId, Event, SessionTemplate};
use tracing::{debug, info, instrument};

use crate::error::Result;

/// Derives AttendanceDay/Session records from an event's `selected_dates`
/// and per-date session templates.
pub struct AttendanceProvisioner {
    store: Arc<dyn AttendanceStore>,
}

impl AttendanceProvisioner {
    pub fn new(store: Arc<dyn AttendanceStore>) -> Self {
        Self { store }
    }

    /// Ensure exactly one day per distinct configured date, each with its
    /// template sessions (or the single default session), then synchronize
    /// the event's day set.
    ///
    /// The synchronizing write-back is tagged [`WriteOrigin::Reconcile`] so
    /// the lifecycle layer never re-enters provisioning from it.
    #[instrument(skip(self, event), fields(event_id = %event.id))]
    pub async fn provision(&self, event: &Event) -> Result<Vec<AttendanceDay>> {
        let existing = self.store.days_for_event(&event.id).await?;
        let mut covered: HashSet<_> = existing.iter().map(|d| d.date).collect();

        let mut created = 0usize;
        for date in &event.selected_dates {
            // Exact-duplicate configured dates collapse to one day
            if !covered.insert(*date) {
                continue;
            }

            let day = AttendanceDay {
                id: DayId::generate(),
                event_id: event.id.clone(),
                date: *date,
            };
            match self.store.insert_day(day.clone()).await {
                Ok(()) => {
                    for template in self.templates_for(event, date) {
                        self.store
                            .insert_session(template.instantiate(day.id.clone()))
                            .await?;
                    }
                    created += 1;
                }
                // A concurrent provisioning run won the (event, date) slot;
                // the constraint holding is what matters
                Err(e) if e.is_conflict() => {
                    debug!(date = %date, "day already provisioned concurrently");
                }
                Err(e) => return Err(e.into()),
            }
        }

        let days = self.store.days_for_event(&event.id).await?;
        self.reconcile_day_set(event, &days).await?;

        if created > 0 {
            info!(created, total = days.len(), "attendance days provisioned");
        }
        Ok(days)
    }

    fn templates_for(&self, event: &Event, date: &chrono::NaiveDate) -> Vec<SessionTemplate> {
        match event.templates_for(date) {
            Some(templates) => templates.to_vec(),
            None => vec![SessionTemplate::default_session()],
        }
    }

    /// Write the current day set back onto the event if it drifted.
    async fn reconcile_day_set(&self, event: &Event, days: &[AttendanceDay]) -> Result<()> {
        let day_ids: Vec<DayId> = days.iter().map(|d| d.id.clone()).collect();
        if day_ids == event.days {
            return Ok(());
        }

        // Re-read so the reconcile write never clobbers a concurrent edit
        // with the stale snapshot we were handed
        let Some(mut current) = self.store.get_event(&event.id).await? else {
            return Ok(());
        };
        current.days = day_ids;
        current.updated_at = Utc::now();
        self.store
            .update_event(current, WriteOrigin::Reconcile)
            .await?;
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use std::collections::HashMap;

    use chrono::NaiveDate;
    use emarge_store::InMemoryStore;
    use emarge_types::{
        EventId, EventStatus, ExpenseClass, OrganizerId, QrGranularity, SigningToken,
        DEFAULT_SESSION_NAME,
    };

    use super::*;

    fn date(day: u32) -> NaiveDate {
        NaiveDate::from_ymd_opt(2026, 3, day).unwrap()
    }

    fn event_with_dates(dates: Vec<NaiveDate>) -> Event {
        Event {
            id: EventId::generate(),
            title: "Congrès".into(),
            location: "Nantes".into(),
            organizer: OrganizerId::new("org-1"),
            organizer_email: "org@example.com".into(),
            expense_class: ExpenseClass::Hospitality,
            status: EventStatus::Draft,
            signing_token: SigningToken::new("tok"),
            qr_granularity: QrGranularity::Day,
            theme: serde_json::Value::Null,
            selected_dates: dates,
            session_templates: HashMap::new(),
            days: vec![],
            participants: vec![],
            created_at: Utc::now(),
            updated_at: Utc::now(),
        }
    }

    async fn setup(event: &Event) -> (Arc<InMemoryStore>, AttendanceProvisioner) {
        let store = Arc::new(InMemoryStore::new());
        store.insert_event(event.clone()).await.unwrap();
        let provisioner = AttendanceProvisioner::new(store.clone());
        (store, provisioner)
    }

    #[tokio::test]
    async fn duplicate_dates_collapse_to_one_day() {
        let event = event_with_dates(vec![date(15), date(16), date(15)]);
        let (store, provisioner) = setup(&event).await;

        let days = provisioner.provision(&event).await.unwrap();
        assert_eq!(days.len(), 2);

        for day in &days {
            let sessions = store.sessions_for_day(&day.id).await.unwrap();
            assert_eq!(sessions.len(), 1);
            assert_eq!(sessions[0].name, DEFAULT_SESSION_NAME);
        }
    }

    #[tokio::test]
    async fn provisioning_is_idempotent() {
        let event = event_with_dates(vec![date(15), date(16)]);
        let (store, provisioner) = setup(&event).await;

        let first = provisioner.provision(&event).await.unwrap();
        let second = provisioner.provision(&event).await.unwrap();

        let first_ids: Vec<_> = first.iter().map(|d| d.id.clone()).collect();
        let second_ids: Vec<_> = second.iter().map(|d| d.id.clone()).collect();
        assert_eq!(first_ids, second_ids);

        for day in &second {
            assert_eq!(store.sessions_for_day(&day.id).await.unwrap().len(), 1);
        }
    }

    #[tokio::test]
    async fn templates_shape_sessions() {
        let mut event = event_with_dates(vec![date(15)]);
        event.session_templates.insert(
            date(15),
            vec![
                SessionTemplate::named("Matin"),
                SessionTemplate::named("Après-midi"),
            ],
        );
        let (store, provisioner) = setup(&event).await;

        let days = provisioner.provision(&event).await.unwrap();
        let sessions = store.sessions_for_day(&days[0].id).await.unwrap();
        let names: Vec<_> = sessions.iter().map(|s| s.name.clone()).collect();
        assert_eq!(names, vec!["Matin", "Après-midi"]);
    }

    #[tokio::test]
    async fn removing_a_date_keeps_its_day() {
        let mut event = event_with_dates(vec![date(15), date(16)]);
        let (_store, provisioner) = setup(&event).await;
        provisioner.provision(&event).await.unwrap();

        event.selected_dates = vec![date(16)];
        let days = provisioner.provision(&event).await.unwrap();
        assert_eq!(days.len(), 2);
    }

    #[tokio::test]
    async fn day_set_written_back_with_reconcile_origin() {
        let event = event_with_dates(vec![date(15)]);
        let (store, provisioner) = setup(&event).await;

        let days = provisioner.provision(&event).await.unwrap();

        let stored = store.get_event(&event.id).await.unwrap().unwrap();
        assert_eq!(stored.days, vec![days[0].id.clone()]);
    }
}
