//! Lockout policy for brute-force protection.
//!
//! After `threshold` consecutive failures every attempt is rejected outright
//! for `window`. Time is the board's monotonic uptime, passed in by the
//! caller, so the policy itself never reads a clock.

use std::time::Duration;

use doorlock_core::ControllerConfig;
use tracing::{info, warn};

/// Result of evaluating the lockout window.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LockStatus {
    Unlocked,
    LockedWithRemaining(Duration),
}

impl LockStatus {
    /// Remaining lockout in whole seconds, truncated, as shown on the display.
    pub fn remaining_secs(&self) -> Option<u64> {
        match self {
            Self::Unlocked => None,
            Self::LockedWithRemaining(remaining) => Some(remaining.as_secs()),
        }
    }
}

/// Consecutive-failure lockout.
///
/// # Examples
///
/// ```
/// use std::time::Duration;
/// use doorlock_controller::{LockStatus, LockoutPolicy};
///
/// let mut policy = LockoutPolicy::new(3, Duration::from_secs(10));
/// let t0 = Duration::from_secs(100);
///
/// assert!(!policy.record_failure(t0));
/// assert!(!policy.record_failure(t0));
/// assert!(policy.record_failure(t0));
///
/// assert_eq!(
///     policy.tick(t0 + Duration::from_secs(4)),
///     LockStatus::LockedWithRemaining(Duration::from_secs(6))
/// );
/// assert_eq!(policy.tick(t0 + Duration::from_secs(10)), LockStatus::Unlocked);
/// assert_eq!(policy.failures(), 0);
/// ```
#[derive(Debug, Clone)]
pub struct LockoutPolicy {
    threshold: u32,
    window: Duration,
    failures: u32,
    locked_at: Option<Duration>,
}

impl LockoutPolicy {
    /// Policy engaging after `threshold` failures for `window`.
    pub fn new(threshold: u32, window: Duration) -> Self {
        Self {
            threshold,
            window,
            failures: 0,
            locked_at: None,
        }
    }

    /// Policy with the configured threshold and window.
    pub fn from_config(config: &ControllerConfig) -> Self {
        Self::new(config.lockout_threshold, config.lockout_window())
    }

    /// Count a failed attempt made at `now`.
    ///
    /// Returns whether the lockout is engaged after this failure. A failure
    /// reported while already locked neither counts nor restarts the window.
    pub fn record_failure(&mut self, now: Duration) -> bool {
        if self.is_locked() {
            return true;
        }

        self.failures = self.failures.saturating_add(1);
        if self.failures >= self.threshold {
            self.locked_at = Some(now);
            warn!(
                failures = self.failures,
                window_secs = self.window.as_secs(),
                "Lockout engaged"
            );
            return true;
        }
        false
    }

    /// Reset the failure counter after a successful attempt.
    ///
    /// Does not lift an engaged lockout.
    pub fn record_success(&mut self) {
        self.failures = 0;
    }

    /// Evaluate the lockout window at `now`. Must be called every loop
    /// iteration; this is what lifts an expired lockout.
    pub fn tick(&mut self, now: Duration) -> LockStatus {
        let Some(locked_at) = self.locked_at else {
            return LockStatus::Unlocked;
        };

        let elapsed = now.saturating_sub(locked_at);
        if elapsed >= self.window {
            self.locked_at = None;
            self.failures = 0;
            info!("Lockout lifted");
            LockStatus::Unlocked
        } else {
            LockStatus::LockedWithRemaining(self.window - elapsed)
        }
    }

    pub fn is_locked(&self) -> bool {
        self.locked_at.is_some()
    }

    /// Consecutive failures counted so far.
    pub fn failures(&self) -> u32 {
        self.failures
    }

    /// Failures left before the lockout engages.
    pub fn attempts_remaining(&self) -> u32 {
        self.threshold.saturating_sub(self.failures)
    }
}

impl Default for LockoutPolicy {
    fn default() -> Self {
        Self::from_config(&ControllerConfig::default())
    }
}
