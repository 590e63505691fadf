//! Notification hand-off.
//!
//! Delivery transport (SMTP, provider API) is an external capability; the
//! engine only needs this seam. Delivery is best-effort downstream of
//! finalization and its failure never reverts anything.

use async_trait::async_trait;
use thiserror::Error;
use tokio::sync::Mutex;

#[derive(Error, Debug)]
pub enum NotifyError {
    #[error("notification delivery failed: {0}")]
    Delivery(String),
}

/// A file attached to an outgoing notification.
#[derive(Debug, Clone)]
pub struct Attachment {
    pub filename: String,
    pub content_type: String,
    pub bytes: Vec<u8>,
}

/// Outbound notification transport.
#[async_trait]
pub trait Notifier: Send + Sync {
    async fn send(
        &self,
        recipients: &[String],
        subject: &str,
        html_body: &str,
        attachments: Vec<Attachment>,
    ) -> Result<(), NotifyError>;
}

/// A captured outgoing message.
#[derive(Debug, Clone)]
pub struct SentMessage {
    pub recipients: Vec<String>,
    pub subject: String,
    pub html_body: String,
    pub attachment_names: Vec<String>,
}

/// Capturing notifier for tests and development.
pub struct RecordingNotifier {
    sent: Mutex<Vec<SentMessage>>,
    fail: bool,
}

impl RecordingNotifier {
    pub fn new() -> Self {
        Self {
            sent: Mutex::new(Vec::new()),
            fail: false,
        }
    }

    /// A notifier whose every send fails, for delivery-failure paths.
    pub fn failing() -> Self {
        Self {
            sent: Mutex::new(Vec::new()),
            fail: true,
        }
    }

    pub async fn sent(&self) -> Vec<SentMessage> {
        self.sent.lock().await.clone()
    }
}

impl Default for RecordingNotifier {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait]
impl Notifier for RecordingNotifier {
    async fn send(
        &self,
        recipients: &[String],
        subject: &str,
        html_body: &str,
        attachments: Vec<Attachment>,
    ) -> Result<(), NotifyError> {
        self.sent.lock().await.push(SentMessage {
            recipients: recipients.to_vec(),
            subject: subject.to_string(),
            html_body: html_body.to_string(),
            attachment_names: attachments.into_iter().map(|a| a.filename).collect(),
        });
        if self.fail {
            return Err(NotifyError::Delivery("smtp relay refused".into()));
        }
        Ok(())
    }
}
