//! Emarge Intake - Abuse-resistant public signature intake.
//!
//! One anonymous submission passes an ordered gating chain before anything
//! is persisted: CAPTCHA proof verification, rate-limit tiers with CAPTCHA
//! escalation, event-status gating, (participant, session) uniqueness,
//! markup scrubbing of free-text fields, and upload sanitization through a
//! real image codec. Each gate rejects with its own error so clients can
//! react distinctly (wait, solve a challenge, pick another file).
//!
//! Organizers bypass the abuse gates on events they own (the
//! organizer-entered walk-in path), admins everywhere; an organizer on
//! someone else's event faces the same gates as the public.

pub mod captcha;
pub mod error;
pub mod intake;
pub mod rate_limit;
pub mod scrub;
pub mod upload;

pub use captcha::{CaptchaConfig, CaptchaError, CaptchaService, DisabledCaptcha, HttpCaptchaVerifier};
pub use error::IntakeError;
pub use intake::{SignatureIntake, Submission, SubmissionIdentity};
pub use rate_limit::{Clock, RateCheck, RateLimitConfig, RateLimiter, RateVerdict, SystemClock};
pub use scrub::strip_markup;
pub use upload::{UploadError, UploadPolicy, UploadSanitizer};
