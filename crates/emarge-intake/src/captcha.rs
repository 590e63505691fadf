//! CAPTCHA verification against an external challenge service.

use async_trait::async_trait;
use serde::Deserialize;
use thiserror::Error;
use tracing::warn;

/// Errors reaching the challenge service.
#[derive(Error, Debug)]
pub enum CaptchaError {
    #[error("captcha service unreachable: {0}")]
    Unavailable(String),
}

/// Pass-through verification of a client-solved challenge proof.
#[async_trait]
pub trait CaptchaService: Send + Sync {
    /// `Ok(true)` if the proof is valid, `Ok(false)` if the service
    /// rejected it.
    async fn verify(&self, proof: &str) -> Result<bool, CaptchaError>;
}

/// Challenge service configuration.
#[derive(Debug, Clone, Default)]
pub struct CaptchaConfig {
    /// Verification endpoint. When absent, verification is disabled
    /// entirely — a dev-only convenience, never a production default.
    pub verify_url: Option<String>,

    /// Server-side secret shared with the challenge service.
    pub secret: String,
}

impl CaptchaConfig {
    /// Build the verifier this configuration describes. Unconfigured means
    /// every proof passes, which is logged loudly.
    pub fn build(&self) -> std::sync::Arc<dyn CaptchaService> {
        match &self.verify_url {
            Some(url) => std::sync::Arc::new(HttpCaptchaVerifier::new(url.clone(), &self.secret)),
            None => {
                warn!("captcha verification disabled: no verify_url configured (dev-only)");
                std::sync::Arc::new(DisabledCaptcha)
            }
        }
    }
}

#[derive(Debug, Deserialize)]
struct VerifyResponse {
    success: bool,
}

/// Verifies proofs against an hCaptcha/reCAPTCHA-style `siteverify`
/// endpoint.
pub struct HttpCaptchaVerifier {
    client: reqwest::Client,
    verify_url: String,
    secret: String,
}

impl HttpCaptchaVerifier {
    pub fn new(verify_url: String, secret: &str) -> Self {
        Self {
            client: reqwest::Client::new(),
            verify_url,
            secret: secret.to_string(),
        }
    }
}

#[async_trait]
impl CaptchaService for HttpCaptchaVerifier {
    async fn verify(&self, proof: &str) -> Result<bool, CaptchaError> {
        let response = self
            .client
            .post(&self.verify_url)
            .form(&[("secret", self.secret.as_str()), ("response", proof)])
            .send()
            .await
            .map_err(|e| CaptchaError::Unavailable(e.to_string()))?;

        let body: VerifyResponse = response
            .json()
            .await
            .map_err(|e| CaptchaError::Unavailable(e.to_string()))?;
        Ok(body.success)
    }
}

/// Always-pass verifier for unconfigured (development) deployments.
pub struct DisabledCaptcha;

#[async_trait]
impl CaptchaService for DisabledCaptcha {
    async fn verify(&self, _proof: &str) -> Result<bool, CaptchaError> {
        Ok(true)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn disabled_captcha_accepts_anything() {
        assert!(DisabledCaptcha.verify("whatever").await.unwrap());
    }

    #[tokio::test]
    async fn unconfigured_build_falls_back_to_disabled() {
        let verifier = CaptchaConfig::default().build();
        assert!(verifier.verify("proof").await.unwrap());
    }
}
