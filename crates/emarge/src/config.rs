//! Service-level configuration.

use emarge_export::ExportConfig;
use emarge_intake::{CaptchaConfig, RateLimitConfig, UploadPolicy};

/// Aggregated knobs for one [`AttendanceService`](crate::AttendanceService).
///
/// The defaults are the production values; tests and dev setups override
/// individual fields.
#[derive(Debug, Clone, Default)]
pub struct ServiceConfig {
    pub rate_limit: RateLimitConfig,
    pub captcha: CaptchaConfig,
    pub upload: UploadPolicy,
    pub export: ExportConfig,
}
