//! Authentication engine.
//!
//! Classifies presented credentials against the [`CredentialStore`] and
//! keeps the [`LockoutPolicy`] up to date. Feedback, logging and the door
//! cycle are the caller's job; the engine only decides.

use std::time::Duration;

use doorlock_core::{ControllerConfig, User};
use doorlock_hardware::FingerScan;
use tracing::{info, warn};

use crate::credentials::CredentialStore;
use crate::lockout::LockoutPolicy;

/// Result of a password submission.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PasswordOutcome {
    Granted(User),
    Denied,
}

/// Result of one fingerprint poll.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FingerprintOutcome {
    Granted(User),
    /// A finger was imaged but is not a household member's.
    UnknownFinger,
    /// Nothing on the sensor this poll. Not an attempt.
    NoFingerPresent,
}

/// Result of the timed admin fingerprint challenge.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum AdminChallengeOutcome {
    Granted,
    /// A household member other than the admin. Not counted as a failure.
    WrongFinger,
    /// An unrecognized finger. Counted as a failure.
    UnknownFinger,
    TimedOut,
}

/// Credential verification plus failure accounting.
///
/// # Examples
///
/// ```
/// use std::time::Duration;
/// use doorlock_controller::{Authenticator, PasswordOutcome};
/// use doorlock_core::User;
///
/// let mut auth = Authenticator::default();
/// let now = Duration::ZERO;
///
/// assert_eq!(auth.try_password("1111", now), PasswordOutcome::Granted(User::Father));
/// assert_eq!(auth.try_password("0000", now), PasswordOutcome::Denied);
/// assert_eq!(auth.lockout().failures(), 1);
/// ```
#[derive(Debug, Clone)]
pub struct Authenticator {
    credentials: CredentialStore,
    lockout: LockoutPolicy,
}

impl Authenticator {
    pub fn new(credentials: CredentialStore, lockout: LockoutPolicy) -> Self {
        Self {
            credentials,
            lockout,
        }
    }

    /// Engine with the configured password table and lockout policy.
    pub fn from_config(config: &ControllerConfig) -> Self {
        Self::new(
            CredentialStore::new(&config.passwords),
            LockoutPolicy::from_config(config),
        )
    }

    /// Verify a submitted password.
    ///
    /// While locked out every submission is denied without being checked
    /// or counted.
    pub fn try_password(&mut self, input: &str, now: Duration) -> PasswordOutcome {
        if self.lockout.is_locked() {
            return PasswordOutcome::Denied;
        }

        match self.credentials.verify_password(input) {
            Some(user) => {
                self.lockout.record_success();
                info!(user = user.label(), method = "password", "Credential accepted");
                PasswordOutcome::Granted(user)
            }
            None => {
                self.lockout.record_failure(now);
                warn!(
                    method = "password",
                    remaining = self.lockout.attempts_remaining(),
                    "Credential rejected"
                );
                PasswordOutcome::Denied
            }
        }
    }

    /// Classify one sensor poll.
    pub fn try_fingerprint(&mut self, scan: Option<FingerScan>, now: Duration) -> FingerprintOutcome {
        let Some(scan) = scan else {
            return FingerprintOutcome::NoFingerPresent;
        };
        if self.lockout.is_locked() {
            return FingerprintOutcome::UnknownFinger;
        }

        match self.identify(scan) {
            Some(user) => {
                self.lockout.record_success();
                info!(user = user.label(), method = "fingerprint", "Credential accepted");
                FingerprintOutcome::Granted(user)
            }
            None => {
                self.lockout.record_failure(now);
                warn!(
                    method = "fingerprint",
                    remaining = self.lockout.attempts_remaining(),
                    "Credential rejected"
                );
                FingerprintOutcome::UnknownFinger
            }
        }
    }

    /// Classify one poll of the admin challenge.
    ///
    /// Returns `None` while nothing is on the sensor and the challenge,
    /// started at `started`, has not exceeded `timeout`.
    pub fn try_admin_finger(
        &mut self,
        scan: Option<FingerScan>,
        started: Duration,
        timeout: Duration,
        now: Duration,
    ) -> Option<AdminChallengeOutcome> {
        let Some(scan) = scan else {
            if now.saturating_sub(started) >= timeout {
                info!("Admin challenge timed out");
                return Some(AdminChallengeOutcome::TimedOut);
            }
            return None;
        };

        let outcome = match self.identify(scan) {
            Some(User::Admin) => {
                self.lockout.record_success();
                info!("Admin challenge passed");
                AdminChallengeOutcome::Granted
            }
            Some(user) => {
                warn!(user = user.label(), "Admin challenge answered by non-admin");
                AdminChallengeOutcome::WrongFinger
            }
            None => {
                self.lockout.record_failure(now);
                warn!("Admin challenge answered by unknown finger");
                AdminChallengeOutcome::UnknownFinger
            }
        };
        Some(outcome)
    }

    fn identify(&self, scan: FingerScan) -> Option<User> {
        match scan {
            FingerScan::Matched { id, .. } => self.credentials.verify_fingerprint(id),
            FingerScan::NoMatch => None,
        }
    }

    pub fn credentials(&self) -> &CredentialStore {
        &self.credentials
    }

    pub fn credentials_mut(&mut self) -> &mut CredentialStore {
        &mut self.credentials
    }

    pub fn lockout(&self) -> &LockoutPolicy {
        &self.lockout
    }

    pub fn lockout_mut(&mut self) -> &mut LockoutPolicy {
        &mut self.lockout
    }
}

impl Default for Authenticator {
    fn default() -> Self {
        Self::from_config(&ControllerConfig::default())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const NOW: Duration = Duration::from_secs(5);

    fn matched(id: u16) -> Option<FingerScan> {
        Some(FingerScan::Matched {
            id,
            confidence: Some(90),
        })
    }

    #[test]
    fn test_admin_password_granted() {
        let mut auth = Authenticator::default();
        assert_eq!(
            auth.try_password("9999", NOW),
            PasswordOutcome::Granted(User::Admin)
        );
    }

    #[test]
    fn test_three_bad_passwords_lock() {
        let mut auth = Authenticator::default();

        assert_eq!(auth.try_password("0000", NOW), PasswordOutcome::Denied);
        assert_eq!(auth.try_password("0000", NOW), PasswordOutcome::Denied);
        assert!(!auth.lockout().is_locked());
        assert_eq!(auth.try_password("0000", NOW), PasswordOutcome::Denied);
        assert!(auth.lockout().is_locked());
    }

    #[test]
    fn test_correct_password_rejected_while_locked() {
        let mut auth = Authenticator::default();
        for _ in 0..3 {
            auth.try_password("0000", NOW);
        }

        assert_eq!(auth.try_password("1111", NOW), PasswordOutcome::Denied);
        assert_eq!(auth.lockout().failures(), 3);
    }

    #[test]
    fn test_success_clears_failures() {
        let mut auth = Authenticator::default();
        auth.try_password("0000", NOW);
        auth.try_password("0000", NOW);
        auth.try_password("2222", NOW);

        assert_eq!(auth.lockout().failures(), 0);
    }

    #[test]
    fn test_no_finger_is_not_an_attempt() {
        let mut auth = Authenticator::default();

        assert_eq!(
            auth.try_fingerprint(None, NOW),
            FingerprintOutcome::NoFingerPresent
        );
        assert_eq!(auth.lockout().failures(), 0);
    }

    #[test]
    fn test_unregistered_finger_counts_as_failure() {
        let mut auth = Authenticator::default();

        assert_eq!(
            auth.try_fingerprint(matched(7), NOW),
            FingerprintOutcome::UnknownFinger
        );
        assert_eq!(
            auth.try_fingerprint(Some(FingerScan::NoMatch), NOW),
            FingerprintOutcome::UnknownFinger
        );
        assert_eq!(auth.lockout().failures(), 2);
    }

    #[test]
    fn test_known_finger_granted() {
        let mut auth = Authenticator::default();
        assert_eq!(
            auth.try_fingerprint(matched(4), NOW),
            FingerprintOutcome::Granted(User::Son)
        );
    }

    #[test]
    fn test_admin_challenge_outcomes() {
        let mut auth = Authenticator::default();
        let start = Duration::ZERO;
        let timeout = Duration::from_secs(10);

        assert_eq!(auth.try_admin_finger(None, start, timeout, NOW), None);
        assert_eq!(
            auth.try_admin_finger(matched(2), start, timeout, NOW),
            Some(AdminChallengeOutcome::WrongFinger)
        );
        assert_eq!(auth.lockout().failures(), 0);
        assert_eq!(
            auth.try_admin_finger(matched(9), start, timeout, NOW),
            Some(AdminChallengeOutcome::UnknownFinger)
        );
        assert_eq!(auth.lockout().failures(), 1);
        assert_eq!(
            auth.try_admin_finger(matched(1), start, timeout, NOW),
            Some(AdminChallengeOutcome::Granted)
        );
        assert_eq!(
            auth.try_admin_finger(None, start, timeout, Duration::from_secs(10)),
            Some(AdminChallengeOutcome::TimedOut)
        );
    }
}
