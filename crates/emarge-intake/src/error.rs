//! Intake error taxonomy.
//!
//! Each gating step rejects with its own variant: `RateLimitExceeded` means
//! wait, `CaptchaRequired` triggers a client-side challenge and
//! resubmission, `CaptchaInvalid` is a hard failure without a fresh proof,
//! `Upload` variants are non-retryable without a different file, and
//! `DuplicateSignature` is a semantic conflict, not a server error.

use emarge_store::StoreError;
use thiserror::Error;

use crate::captcha::CaptchaError;
use crate::upload::UploadError;

/// Errors from the signature intake pipeline.
#[derive(Error, Debug)]
pub enum IntakeError {
    #[error("rate limit exceeded, retry later")]
    RateLimitExceeded,

    /// Soft-threshold escalation: the submission is acceptable only with a
    /// valid CAPTCHA proof.
    #[error("captcha challenge required")]
    CaptchaRequired,

    #[error("captcha proof rejected")]
    CaptchaInvalid,

    #[error(transparent)]
    CaptchaUnavailable(#[from] CaptchaError),

    #[error(transparent)]
    Upload(#[from] UploadError),

    #[error("event is not open for signing yet")]
    NotOpenYet,

    #[error("event is finalized and no longer accepting signatures")]
    NoLongerOpen,

    #[error("session not found")]
    SessionNotFound,

    #[error("a signature already exists for this participant and session")]
    DuplicateSignature,

    #[error(transparent)]
    Store(#[from] StoreError),
}
