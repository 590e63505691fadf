//! Export engine: assembles the audit workbook for a finalized event.

use std::sync::Arc;

use chrono::{NaiveDate, Utc};
use emarge_store::{AttendanceStore, BlobStore};
use emarge_types::Event;
use rust_xlsxwriter::{Format, Image, Workbook, Worksheet};
use tracing::{info, instrument, warn};

use crate::error::ExportError;
use crate::notify::{Attachment, Notifier};
use crate::optimizer::ImageOptimizer;

const XLSX_CONTENT_TYPE: &str =
    "application/vnd.openxmlformats-officedocument.spreadsheetml.sheet";

/// Export policy.
#[derive(Debug, Clone)]
pub struct ExportConfig {
    /// Email-attachment ceiling; exceeding it only logs a warning, the
    /// export still proceeds
    pub attachment_ceiling_bytes: usize,

    /// Row height, in points, for rows carrying an embedded signature
    pub signature_row_height: f64,
}

impl Default for ExportConfig {
    fn default() -> Self {
        Self {
            attachment_ceiling_bytes: 8 * 1024 * 1024, // 8 MiB
            signature_row_height: 45.0,
        }
    }
}

/// A finished export.
#[derive(Debug, Clone)]
pub struct ExportOutcome {
    pub filename: String,
    pub workbook: Vec<u8>,
    /// Signature rows written
    pub rows: usize,
    /// Rows whose signature cell stayed blank
    pub missing_images: usize,
}

/// Deterministic export filename: normalized title plus the given date.
/// Alphanumeric in the Unicode sense, so accented titles keep their letters.
pub fn export_filename(title: &str, date: NaiveDate) -> String {
    let normalized: String = title
        .to_lowercase()
        .chars()
        .filter(|c| c.is_alphanumeric())
        .collect();
    let stem = if normalized.is_empty() {
        "emargement"
    } else {
        normalized.as_str()
    };
    format!("{stem}-{}.xlsx", date.format("%Y-%m-%d"))
}

/// Builds the audit workbook and hands it to the notifier.
pub struct ExportEngine {
    store: Arc<dyn AttendanceStore>,
    blobs: Arc<dyn BlobStore>,
    optimizer: ImageOptimizer,
    config: ExportConfig,
}

impl ExportEngine {
    pub fn new(
        store: Arc<dyn AttendanceStore>,
        blobs: Arc<dyn BlobStore>,
        optimizer: ImageOptimizer,
        config: ExportConfig,
    ) -> Self {
        Self {
            store,
            blobs,
            optimizer,
            config,
        }
    }

    /// Assemble the workbook: header block, then one row per
    /// (day x session x signed participant), days and sessions in stored
    /// order, signatures re-queried per session.
    #[instrument(skip(self, event), fields(event_id = %event.id))]
    pub async fn build(&self, event: &Event) -> Result<ExportOutcome, ExportError> {
        let mut workbook = Workbook::new();
        let sheet = workbook.add_worksheet();

        self.write_header(sheet, event)?;

        let bold = Format::new().set_bold();
        let columns = [
            "Prénom",
            "Nom",
            "Email",
            "Ville",
            "N° professionnel",
            "Catégorie",
            "Date",
            "Session",
            "Consentement",
            "Signature",
        ];
        let header_row: u32 = 6;
        for (col, label) in columns.iter().enumerate() {
            sheet
                .write_string_with_format(header_row, col as u16, *label, &bold)
                .map_err(|e| ExportError::Workbook(e.to_string()))?;
        }

        let mut row = header_row + 1;
        let mut rows_written = 0usize;
        let mut missing_images = 0usize;

        for day in self.store.days_for_event(&event.id).await? {
            for session in self.store.sessions_for_day(&day.id).await? {
                // Signatures are never assumed pre-joined; always re-query
                for signature in self.store.signatures_for_session(&session.id).await? {
                    let Some(participant) =
                        self.store.get_participant(&signature.participant_id).await?
                    else {
                        warn!(
                            signature_id = %signature.id,
                            "participant missing, row skipped"
                        );
                        continue;
                    };

                    let cells = [
                        participant.first_name.as_str(),
                        participant.last_name.as_str(),
                        participant.email.as_str(),
                        participant.city.as_str(),
                        participant.professional_number.as_deref().unwrap_or(""),
                        &participant.beneficiary.to_string(),
                        &day.date.to_string(),
                        session.name.as_str(),
                        if signature.consent { "oui" } else { "non" },
                    ];
                    for (col, value) in cells.iter().enumerate() {
                        sheet
                            .write_string(row, col as u16, *value)
                            .map_err(|e| ExportError::Workbook(e.to_string()))?;
                    }

                    if self.embed_signature(sheet, row, &signature).await {
                        sheet
                            .set_row_height(row, self.config.signature_row_height)
                            .map_err(|e| ExportError::Workbook(e.to_string()))?;
                    } else {
                        missing_images += 1;
                    }

                    rows_written += 1;
                    row += 1;
                }
            }
        }

        let bytes = workbook
            .save_to_buffer()
            .map_err(|e| ExportError::Workbook(e.to_string()))?;
        if bytes.len() > self.config.attachment_ceiling_bytes {
            warn!(
                bytes = bytes.len(),
                ceiling = self.config.attachment_ceiling_bytes,
                "export exceeds attachment ceiling, proceeding anyway"
            );
        }

        let filename = export_filename(&event.title, Utc::now().date_naive());
        info!(
            rows = rows_written,
            missing_images,
            bytes = bytes.len(),
            %filename,
            "export workbook assembled"
        );
        Ok(ExportOutcome {
            filename,
            workbook: bytes,
            rows: rows_written,
            missing_images,
        })
    }

    /// Build the workbook and hand it to the notifier. Delivery failure is
    /// logged only; the export outcome is returned regardless.
    pub async fn export_and_notify(
        &self,
        event: &Event,
        notifier: &dyn Notifier,
    ) -> Result<ExportOutcome, ExportError> {
        let outcome = self.build(event).await?;

        let subject = format!("Feuille d'émargement : {}", event.title);
        let body = format!(
            "<p>La feuille d'émargement de l'événement <strong>{}</strong> \
             est en pièce jointe ({} signatures).</p>",
            event.title, outcome.rows
        );
        let attachment = Attachment {
            filename: outcome.filename.clone(),
            content_type: XLSX_CONTENT_TYPE.to_string(),
            bytes: outcome.workbook.clone(),
        };

        let recipients = vec![event.organizer_email.clone()];
        match notifier
            .send(&recipients, &subject, &body, vec![attachment])
            .await
        {
            Ok(()) => info!(event_id = %event.id, "export notification sent"),
            Err(e) => {
                warn!(event_id = %event.id, error = %e, "export notification failed")
            }
        }
        Ok(outcome)
    }

    fn write_header(&self, sheet: &mut Worksheet, event: &Event) -> Result<(), ExportError> {
        let bold = Format::new().set_bold();
        let rows: [(&str, String); 5] = [
            ("Événement", event.title.clone()),
            ("Lieu", event.location.clone()),
            ("Organisateur", event.organizer_email.clone()),
            ("Nature de la dépense", event.expense_class.to_string()),
            ("Généré le", Utc::now().format("%Y-%m-%d %H:%M UTC").to_string()),
        ];
        for (row, (label, value)) in rows.iter().enumerate() {
            sheet
                .write_string_with_format(row as u32, 0, *label, &bold)
                .map_err(|e| ExportError::Workbook(e.to_string()))?;
            sheet
                .write_string(row as u32, 1, value)
                .map_err(|e| ExportError::Workbook(e.to_string()))?;
        }
        Ok(())
    }

    /// Fetch, optimize, and anchor one signature thumbnail. Returns false
    /// (blank cell) on any failure; the export never aborts per row.
    async fn embed_signature(
        &self,
        sheet: &mut Worksheet,
        row: u32,
        signature: &emarge_types::Signature,
    ) -> bool {
        let bytes = match self.blobs.get(&signature.image).await {
            Ok(Some(bytes)) => bytes,
            Ok(None) => {
                warn!(image_id = %signature.image, "signature image missing, cell left blank");
                return false;
            }
            Err(e) => {
                warn!(image_id = %signature.image, error = %e, "signature image fetch failed");
                return false;
            }
        };

        let optimized = match self.optimizer.optimize(&bytes) {
            Ok(optimized) => optimized,
            Err(e) => {
                warn!(image_id = %signature.image, error = %e, "signature image unusable");
                return false;
            }
        };

        let image = match Image::new_from_buffer(&optimized) {
            Ok(image) => image,
            Err(e) => {
                warn!(image_id = %signature.image, error = %e, "workbook rejected image");
                return false;
            }
        };
        if let Err(e) = sheet.insert_image(row, 9, &image) {
            warn!(image_id = %signature.image, error = %e, "image anchor failed");
            return false;
        }
        true
    }
}

#[cfg(test)]
mod tests {
    use std::collections::HashMap;
    use std::io::Cursor;

    use chrono::NaiveDate;
    use emarge_store::{InMemoryBlobStore, InMemoryStore};
    use emarge_types::{
        AttendanceDay, BeneficiaryType, DayId, EventId, EventStatus, ExpenseClass, ImageId,
        OrganizerId, Participant, ParticipantId, QrGranularity, Session, SessionId, Signature,
        SigningToken,
    };

    use super::*;
    use crate::notify::RecordingNotifier;

    fn png_bytes() -> Vec<u8> {
        let img = image::RgbImage::from_pixel(4, 4, image::Rgb([0, 0, 0]));
        let mut out = Cursor::new(Vec::new());
        image::DynamicImage::ImageRgb8(img)
            .write_to(&mut out, image::ImageFormat::Png)
            .unwrap();
        out.into_inner()
    }

    struct Fixture {
        store: Arc<InMemoryStore>,
        blobs: Arc<InMemoryBlobStore>,
        engine: ExportEngine,
        event: Event,
        session: SessionId,
    }

    async fn fixture() -> Fixture {
        let store = Arc::new(InMemoryStore::new());
        let blobs = Arc::new(InMemoryBlobStore::new());

        let event = Event {
            id: EventId::generate(),
            title: "Symposium Cardio".into(),
            location: "Toulouse".into(),
            organizer: OrganizerId::new("org-1"),
            organizer_email: "org@example.com".into(),
            expense_class: ExpenseClass::Hospitality,
            status: EventStatus::Finalized,
            signing_token: SigningToken::new("tok"),
            qr_granularity: QrGranularity::Event,
            theme: serde_json::Value::Null,
            selected_dates: vec![],
            session_templates: HashMap::new(),
            days: vec![],
            participants: vec![],
            created_at: Utc::now(),
            updated_at: Utc::now(),
        };
        store.insert_event(event.clone()).await.unwrap();

        let day = AttendanceDay {
            id: DayId::generate(),
            event_id: event.id.clone(),
            date: NaiveDate::from_ymd_opt(2026, 3, 15).unwrap(),
        };
        store.insert_day(day.clone()).await.unwrap();

        let session = Session {
            id: SessionId::generate(),
            day_id: day.id.clone(),
            name: "Session principale".into(),
            starts_at: None,
            ends_at: None,
        };
        store.insert_session(session.clone()).await.unwrap();

        let engine = ExportEngine::new(
            store.clone(),
            blobs.clone(),
            ImageOptimizer::default(),
            ExportConfig::default(),
        );

        Fixture {
            store,
            blobs,
            engine,
            event,
            session: session.id,
        }
    }

    async fn add_signed_participant(f: &Fixture, email: &str, image: Option<ImageId>) {
        let participant = Participant {
            id: ParticipantId::generate(),
            first_name: "Claire".into(),
            last_name: "Martin".into(),
            email: email.into(),
            city: "Toulouse".into(),
            professional_number: Some("42".into()),
            beneficiary: BeneficiaryType::HealthProfessional,
        };
        f.store.insert_participant(participant.clone()).await.unwrap();

        let image_id = match image {
            Some(id) => id,
            None => f.blobs.put(png_bytes()).await.unwrap(),
        };
        f.store
            .insert_signature(Signature::new(
                participant.id,
                f.session.clone(),
                image_id,
                true,
            ))
            .await
            .unwrap();
    }

    #[tokio::test]
    async fn unfetchable_image_leaves_a_blank_cell_without_failing() {
        let f = fixture().await;
        add_signed_participant(&f, "a@b.fr", None).await;
        // Image id that exists on the signature but not in the blob store
        add_signed_participant(&f, "c@d.fr", Some(ImageId::generate())).await;

        let outcome = f.engine.build(&f.event).await.unwrap();
        assert_eq!(outcome.rows, 2);
        assert_eq!(outcome.missing_images, 1);
        // A workbook is a zip archive
        assert_eq!(&outcome.workbook[..2], b"PK");
    }

    #[tokio::test]
    async fn empty_event_exports_header_only() {
        let f = fixture().await;
        let outcome = f.engine.build(&f.event).await.unwrap();
        assert_eq!(outcome.rows, 0);
        assert_eq!(outcome.missing_images, 0);
    }

    #[tokio::test]
    async fn notifier_receives_the_attachment() {
        let f = fixture().await;
        add_signed_participant(&f, "a@b.fr", None).await;

        let notifier = RecordingNotifier::new();
        let outcome = f
            .engine
            .export_and_notify(&f.event, &notifier)
            .await
            .unwrap();

        let sent = notifier.sent().await;
        assert_eq!(sent.len(), 1);
        assert_eq!(sent[0].recipients, vec!["org@example.com".to_string()]);
        assert_eq!(sent[0].attachment_names, vec![outcome.filename.clone()]);
    }

    #[tokio::test]
    async fn delivery_failure_does_not_fail_the_export() {
        let f = fixture().await;
        add_signed_participant(&f, "a@b.fr", None).await;

        let notifier = RecordingNotifier::failing();
        let outcome = f
            .engine
            .export_and_notify(&f.event, &notifier)
            .await
            .unwrap();
        assert_eq!(outcome.rows, 1);
    }

    #[test]
    fn filename_is_normalized_and_dated() {
        let date = NaiveDate::from_ymd_opt(2026, 4, 2).unwrap();
        assert_eq!(
            export_filename("Symposium Cardio 2026 !", date),
            "symposiumcardio2026-2026-04-02.xlsx"
        );
        assert_eq!(
            export_filename("Réunion d'Été", date),
            "réuniondété-2026-04-02.xlsx"
        );
        assert_eq!(export_filename("***", date), "emargement-2026-04-02.xlsx");
    }
}
