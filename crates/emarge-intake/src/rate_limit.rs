//! Per-device fixed-window rate limiting with CAPTCHA escalation tiers.
//!
//! State is process-local and advisory: it gates a soft abuse control, not
//! authorization, so a horizontally scaled deployment deliberately rate
//! limits per instance. Entries live in a concurrent map, created on first
//! use and purged once idle, keeping the map bounded.

use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;
use std::time::{Duration, Instant};

use dashmap::DashMap;
use tracing::debug;

/// Time source, injectable for deterministic window tests.
pub trait Clock: Send + Sync {
    fn now(&self) -> Instant;
}

/// Wall-clock monotonic time.
pub struct SystemClock;

impl Clock for SystemClock {
    fn now(&self) -> Instant {
        Instant::now()
    }
}

/// Rate-limiting policy.
#[derive(Debug, Clone)]
pub struct RateLimitConfig {
    /// Fixed window length
    pub window: Duration,

    /// Requests per window before CAPTCHA escalation
    pub soft_limit: u32,

    /// Hard block beyond `soft_limit * block_multiplier`
    pub block_multiplier: u32,
}

impl Default for RateLimitConfig {
    fn default() -> Self {
        Self {
            window: Duration::from_secs(60),
            soft_limit: 10,
            block_multiplier: 2,
        }
    }
}

impl RateLimitConfig {
    fn block_limit(&self) -> u32 {
        self.soft_limit.saturating_mul(self.block_multiplier)
    }
}

/// Outcome of counting one request.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RateVerdict {
    /// Under the soft threshold
    Allowed,
    /// Between soft and block thresholds; a valid CAPTCHA proof is required
    ChallengeRequired,
    /// Over the block threshold; rejected regardless of proof
    Blocked,
}

impl RateVerdict {
    pub fn is_blocked(self) -> bool {
        matches!(self, RateVerdict::Blocked)
    }

    pub fn needs_challenge(self) -> bool {
        matches!(self, RateVerdict::ChallengeRequired)
    }
}

/// Non-counting probe result for pre-empting submission with a challenge.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RateCheck {
    pub allowed: bool,
    pub should_challenge: bool,
}

struct WindowEntry {
    started: Instant,
    count: u32,
    last_seen: Instant,
}

/// How many counted requests between opportunistic idle purges.
const PURGE_EVERY: u64 = 1024;

/// Process-wide fixed-window counter keyed by opaque device identity.
pub struct RateLimiter {
    entries: DashMap<String, WindowEntry>,
    config: RateLimitConfig,
    clock: Arc<dyn Clock>,
    checks: AtomicU64,
}

impl RateLimiter {
    pub fn new(config: RateLimitConfig) -> Self {
        Self::with_clock(config, Arc::new(SystemClock))
    }

    pub fn with_clock(config: RateLimitConfig, clock: Arc<dyn Clock>) -> Self {
        Self {
            entries: DashMap::new(),
            config,
            clock,
            checks: AtomicU64::new(0),
        }
    }

    /// Count one request for `device_key` and return the verdict.
    ///
    /// The first request starts the window; the first request after the
    /// window has elapsed resets it.
    pub fn check_and_count(&self, device_key: &str) -> RateVerdict {
        let now = self.clock.now();
        let count = {
            let mut entry =
                self.entries
                    .entry(device_key.to_string())
                    .or_insert_with(|| WindowEntry {
                        started: now,
                        count: 0,
                        last_seen: now,
                    });
            if now.duration_since(entry.started) >= self.config.window {
                entry.started = now;
                entry.count = 0;
            }
            entry.count += 1;
            entry.last_seen = now;
            entry.count
        };

        if self.checks.fetch_add(1, Ordering::Relaxed) % PURGE_EVERY == PURGE_EVERY - 1 {
            self.purge_idle();
        }

        let verdict = self.verdict_for(count);
        if verdict != RateVerdict::Allowed {
            debug!(device_key, count, ?verdict, "rate limit escalation");
        }
        verdict
    }

    /// What the next counted request for `device_key` would get, without
    /// performing a write.
    pub fn probe(&self, device_key: &str) -> RateCheck {
        let now = self.clock.now();
        let upcoming = match self.entries.get(device_key) {
            Some(entry) if now.duration_since(entry.started) < self.config.window => {
                entry.count + 1
            }
            _ => 1,
        };
        let verdict = self.verdict_for(upcoming);
        RateCheck {
            allowed: !verdict.is_blocked(),
            should_challenge: verdict.needs_challenge(),
        }
    }

    /// Drop entries idle for more than twice the window.
    pub fn purge_idle(&self) {
        let now = self.clock.now();
        let horizon = self.config.window * 2;
        self.entries
            .retain(|_, entry| now.duration_since(entry.last_seen) < horizon);
    }

    /// Number of tracked devices. Test and metrics hook.
    pub fn tracked_devices(&self) -> usize {
        self.entries.len()
    }

    fn verdict_for(&self, count: u32) -> RateVerdict {
        if count <= self.config.soft_limit {
            RateVerdict::Allowed
        } else if count <= self.config.block_limit() {
            RateVerdict::ChallengeRequired
        } else {
            RateVerdict::Blocked
        }
    }
}

#[cfg(test)]
mod tests {
    use std::sync::Mutex;

    use super::*;

    struct TestClock {
        base: Instant,
        offset: Mutex<Duration>,
    }

    impl TestClock {
        fn new() -> Self {
            Self {
                base: Instant::now(),
                offset: Mutex::new(Duration::ZERO),
            }
        }

        fn advance(&self, by: Duration) {
            *self.offset.lock().unwrap() += by;
        }
    }

    impl Clock for TestClock {
        fn now(&self) -> Instant {
            self.base + *self.offset.lock().unwrap()
        }
    }

    fn limiter() -> (RateLimiter, Arc<TestClock>) {
        let clock = Arc::new(TestClock::new());
        (
            RateLimiter::with_clock(RateLimitConfig::default(), clock.clone()),
            clock,
        )
    }

    #[test]
    fn tiers_follow_default_thresholds() {
        let (limiter, _clock) = limiter();

        for i in 1..=10 {
            assert_eq!(
                limiter.check_and_count("device"),
                RateVerdict::Allowed,
                "request {i}"
            );
        }
        for i in 11..=20 {
            assert_eq!(
                limiter.check_and_count("device"),
                RateVerdict::ChallengeRequired,
                "request {i}"
            );
        }
        for i in 21..=25 {
            assert_eq!(
                limiter.check_and_count("device"),
                RateVerdict::Blocked,
                "request {i}"
            );
        }
    }

    #[test]
    fn window_resets_after_elapsing_from_first_request() {
        let (limiter, clock) = limiter();

        for _ in 0..15 {
            limiter.check_and_count("device");
        }
        assert!(limiter.check_and_count("device").needs_challenge());

        clock.advance(Duration::from_secs(60));
        assert_eq!(limiter.check_and_count("device"), RateVerdict::Allowed);
    }

    #[test]
    fn devices_are_independent() {
        let (limiter, _clock) = limiter();
        for _ in 0..30 {
            limiter.check_and_count("noisy");
        }
        assert_eq!(limiter.check_and_count("quiet"), RateVerdict::Allowed);
    }

    #[test]
    fn probe_does_not_count() {
        let (limiter, _clock) = limiter();
        for _ in 0..100 {
            let check = limiter.probe("device");
            assert!(check.allowed);
            assert!(!check.should_challenge);
        }
        assert_eq!(limiter.check_and_count("device"), RateVerdict::Allowed);
    }

    #[test]
    fn probe_predicts_escalation() {
        let (limiter, _clock) = limiter();
        for _ in 0..10 {
            limiter.check_and_count("device");
        }
        let check = limiter.probe("device");
        assert!(check.allowed);
        assert!(check.should_challenge);

        for _ in 0..10 {
            limiter.check_and_count("device");
        }
        let check = limiter.probe("device");
        assert!(!check.allowed);
    }

    #[test]
    fn idle_entries_are_purged_after_two_windows() {
        let (limiter, clock) = limiter();
        limiter.check_and_count("device");
        assert_eq!(limiter.tracked_devices(), 1);

        clock.advance(Duration::from_secs(119));
        limiter.purge_idle();
        assert_eq!(limiter.tracked_devices(), 1);

        clock.advance(Duration::from_secs(2));
        limiter.purge_idle();
        assert_eq!(limiter.tracked_devices(), 0);
    }

    #[test]
    fn multiplier_is_configurable() {
        let clock = Arc::new(TestClock::new());
        let limiter = RateLimiter::with_clock(
            RateLimitConfig {
                window: Duration::from_secs(60),
                soft_limit: 2,
                block_multiplier: 3,
            },
            clock,
        );

        assert_eq!(limiter.check_and_count("d"), RateVerdict::Allowed);
        assert_eq!(limiter.check_and_count("d"), RateVerdict::Allowed);
        for _ in 3..=6 {
            assert_eq!(limiter.check_and_count("d"), RateVerdict::ChallengeRequired);
        }
        assert_eq!(limiter.check_and_count("d"), RateVerdict::Blocked);
    }
}
