//! Finalization sink: binds the export pipeline to the lifecycle.

use std::sync::Arc;

use async_trait::async_trait;
use emarge_export::{ExportEngine, Notifier};
use emarge_lifecycle::FinalizeSink;
use emarge_types::Event;
use tracing::info;

/// Builds and mails the audit workbook whenever an event is finalized.
///
/// Runs on the lifecycle's spawned side-effect task: an error here is
/// logged by the lifecycle and never reverts the finalization.
pub struct ExportFinalizeSink {
    engine: ExportEngine,
    notifier: Arc<dyn Notifier>,
}

impl ExportFinalizeSink {
    pub fn new(engine: ExportEngine, notifier: Arc<dyn Notifier>) -> Self {
        Self { engine, notifier }
    }
}

#[async_trait]
impl FinalizeSink for ExportFinalizeSink {
    async fn on_finalized(&self, event: Event) -> anyhow::Result<()> {
        let outcome = self
            .engine
            .export_and_notify(&event, self.notifier.as_ref())
            .await?;
        info!(
            event_id = %event.id,
            rows = outcome.rows,
            missing_images = outcome.missing_images,
            "finalization export complete"
        );
        Ok(())
    }
}
