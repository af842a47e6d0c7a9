//! Controller configuration.
//!
//! Every field has a default, so an empty TOML document is a valid
//! configuration:
//!
//! ```
//! use doorlock_core::ControllerConfig;
//!
//! let config = ControllerConfig::from_toml_str("").unwrap();
//! assert_eq!(config.lockout_threshold, 3);
//!
//! let config = ControllerConfig::from_toml_str(
//!     "unlock_hold_secs = 8\n[passwords]\nfather = \"4321\"\n",
//! )
//! .unwrap();
//! assert_eq!(config.unlock_hold().as_secs(), 8);
//! assert!(config.passwords.father.matches("4321"));
//! ```

use std::path::Path;
use std::time::Duration;

use serde::{Deserialize, Serialize};

use crate::constants::*;
use crate::{Error, Password, Result, User};

/// Tunable parameters of the controller.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct ControllerConfig {
    /// Consecutive failures that engage the lockout.
    pub lockout_threshold: u32,

    /// Lockout duration.
    pub lockout_window_secs: u64,

    /// How long the relay stays energized after a granted access.
    pub unlock_hold_secs: u64,

    /// Admin fingerprint presentation timeout.
    pub admin_challenge_secs: u64,

    /// Idle timeout for keypad prompts inside admin sub-flows.
    pub prompt_timeout_secs: u64,

    /// How long transient messages stay visible.
    pub message_secs: u64,

    /// Busy-poll delay between loop iterations.
    pub poll_interval_ms: u64,

    /// Buzzer frequency for feedback tones.
    pub feedback_tone_hz: u32,

    /// Initial (volatile) password table.
    pub passwords: InitialPasswords,
}

/// Factory password table, one entry per [`User`].
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct InitialPasswords {
    pub admin: Password,
    pub father: Password,
    pub mother: Password,
    pub son: Password,
    pub daughter: Password,
}

impl InitialPasswords {
    /// Password configured for `user`.
    #[must_use]
    pub fn for_user(&self, user: User) -> &Password {
        match user {
            User::Admin => &self.admin,
            User::Father => &self.father,
            User::Mother => &self.mother,
            User::Son => &self.son,
            User::Daughter => &self.daughter,
        }
    }
}

impl Default for InitialPasswords {
    fn default() -> Self {
        // Literals are within the length limit.
        let fixed = |s: &str| Password::new(s).unwrap_or_default();
        Self {
            admin: fixed("9999"),
            father: fixed("1111"),
            mother: fixed("2222"),
            son: fixed("3333"),
            daughter: fixed("4444"),
        }
    }
}

impl Default for ControllerConfig {
    fn default() -> Self {
        Self {
            lockout_threshold: DEFAULT_LOCKOUT_THRESHOLD,
            lockout_window_secs: DEFAULT_LOCKOUT_WINDOW_SECS,
            unlock_hold_secs: DEFAULT_UNLOCK_HOLD_SECS,
            admin_challenge_secs: DEFAULT_ADMIN_CHALLENGE_SECS,
            prompt_timeout_secs: DEFAULT_PROMPT_TIMEOUT_SECS,
            message_secs: DEFAULT_MESSAGE_SECS,
            poll_interval_ms: DEFAULT_POLL_INTERVAL_MS,
            feedback_tone_hz: DEFAULT_FEEDBACK_TONE_HZ,
            passwords: InitialPasswords::default(),
        }
    }
}

impl ControllerConfig {
    /// Parse and validate a TOML document.
    ///
    /// # Errors
    /// Returns `Error::Config` on syntax errors or failed validation.
    pub fn from_toml_str(s: &str) -> Result<Self> {
        let config: Self = toml::from_str(s).map_err(|e| Error::Config(e.to_string()))?;
        config.validate()?;
        Ok(config)
    }

    /// Load and validate a TOML file.
    ///
    /// # Errors
    /// Returns `Error::Io` if the file cannot be read, `Error::Config` otherwise.
    pub fn load(path: impl AsRef<Path>) -> Result<Self> {
        let content = std::fs::read_to_string(path)?;
        Self::from_toml_str(&content)
    }

    /// Reject values that would make the controller unusable.
    ///
    /// # Errors
    /// Returns `Error::Config` naming the first offending key.
    pub fn validate(&self) -> Result<()> {
        let non_zero = [
            ("lockout_threshold", u64::from(self.lockout_threshold)),
            ("lockout_window_secs", self.lockout_window_secs),
            ("unlock_hold_secs", self.unlock_hold_secs),
            ("admin_challenge_secs", self.admin_challenge_secs),
            ("prompt_timeout_secs", self.prompt_timeout_secs),
            ("poll_interval_ms", self.poll_interval_ms),
        ];
        if let Some((key, _)) = non_zero.iter().find(|(_, v)| *v == 0) {
            return Err(Error::Config(format!("{key} must be greater than zero")));
        }
        // The lockout countdown must outlast the denial notice before it
        if self.message_secs >= self.lockout_window_secs {
            return Err(Error::Config(
                "message_secs must be shorter than lockout_window_secs".to_string(),
            ));
        }

        for user in User::ALL {
            let len = self.passwords.for_user(user).len();
            if len > MAX_PASSWORD_LEN {
                return Err(Error::Config(format!(
                    "passwords.{} exceeds {MAX_PASSWORD_LEN} characters",
                    user.label().to_lowercase()
                )));
            }
        }
        Ok(())
    }

    #[must_use]
    pub fn lockout_window(&self) -> Duration {
        Duration::from_secs(self.lockout_window_secs)
    }

    #[must_use]
    pub fn unlock_hold(&self) -> Duration {
        Duration::from_secs(self.unlock_hold_secs)
    }

    #[must_use]
    pub fn admin_challenge_timeout(&self) -> Duration {
        Duration::from_secs(self.admin_challenge_secs)
    }

    #[must_use]
    pub fn prompt_timeout(&self) -> Duration {
        Duration::from_secs(self.prompt_timeout_secs)
    }

    #[must_use]
    pub fn message_duration(&self) -> Duration {
        Duration::from_secs(self.message_secs)
    }

    #[must_use]
    pub fn poll_interval(&self) -> Duration {
        Duration::from_millis(self.poll_interval_ms)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rstest::rstest;
    use std::io::Write;

    #[test]
    fn test_defaults() {
        let config = ControllerConfig::default();
        assert_eq!(config.lockout_threshold, 3);
        assert_eq!(config.lockout_window(), Duration::from_secs(10));
        assert_eq!(config.unlock_hold(), Duration::from_secs(5));
        assert_eq!(config.admin_challenge_timeout(), Duration::from_secs(10));
        assert!(config.passwords.admin.matches("9999"));
        assert!(config.passwords.father.matches("1111"));
        assert!(config.validate().is_ok());
    }

    #[test]
    fn test_partial_document_keeps_other_defaults() {
        let config = ControllerConfig::from_toml_str("lockout_window_secs = 30").unwrap();
        assert_eq!(config.lockout_window(), Duration::from_secs(30));
        assert_eq!(config.lockout_threshold, 3);
    }

    #[test]
    fn test_disabled_password_from_config() {
        let config = ControllerConfig::from_toml_str("[passwords]\nson = \"\"").unwrap();
        assert!(config.passwords.for_user(User::Son).is_disabled());
        assert!(config.passwords.for_user(User::Mother).matches("2222"));
    }

    #[rstest]
    #[case("lockout_threshold = 0")]
    #[case("lockout_window_secs = 0")]
    #[case("poll_interval_ms = 0")]
    fn test_zero_values_rejected(#[case] doc: &str) {
        assert!(matches!(
            ControllerConfig::from_toml_str(doc),
            Err(Error::Config(_))
        ));
    }

    #[rstest]
    #[case("message_secs = 30")]
    #[case("message_secs = 45")]
    #[case("lockout_window_secs = 2")]
    fn test_message_outlasting_lockout_rejected(#[case] doc: &str) {
        let err = ControllerConfig::from_toml_str(doc).unwrap_err();
        assert!(err.to_string().contains("message_secs"));
    }

    #[test]
    fn test_overlong_password_rejected() {
        let doc = "[passwords]\nadmin = \"12345678901234567\"";
        assert!(matches!(
            ControllerConfig::from_toml_str(doc),
            Err(Error::Config(_))
        ));
    }

    #[test]
    fn test_syntax_error_is_config_error() {
        assert!(matches!(
            ControllerConfig::from_toml_str("lockout_threshold = ["),
            Err(Error::Config(_))
        ));
    }

    #[test]
    fn test_load_from_file() {
        let mut file = tempfile::NamedTempFile::new().unwrap();
        writeln!(file, "message_secs = 1").unwrap();

        let config = ControllerConfig::load(file.path()).unwrap();
        assert_eq!(config.message_duration(), Duration::from_secs(1));
    }

    #[test]
    fn test_load_missing_file() {
        assert!(matches!(
            ControllerConfig::load("/nonexistent/doorlock.toml"),
            Err(Error::Io(_))
        ));
    }
}
