//! Session state machine.
//!
//! One interactive session at a time moves through the following modes:
//!
//! - `Selection`: main menu (fingerprint, password, admin, time)
//! - `FingerprintWait`: polling the sensor for a finger
//! - `PasswordEntry`: collecting a password on the keypad
//! - `AdminMenu` and its sub-menus: management under an admin session
//!
//! # Valid Transitions
//!
//! - Selection → FingerprintWait | PasswordEntry | AdminMenu
//! - FingerprintWait → Selection | AdminMenu
//! - PasswordEntry → Selection | AdminMenu
//! - AdminMenu → Selection | any admin sub-menu
//! - admin sub-menu → AdminMenu
//!
//! Entering an admin mode requires the admin flag; leaving to `Selection`
//! always drops it. [`Session::reset`] returns to `Selection` from anywhere
//! and is what the lockout overlay uses.
//!
//! # Examples
//!
//! ```
//! use std::time::Duration;
//! use doorlock_controller::{Session, SessionMode, SessionState};
//!
//! let mut session = Session::new();
//! let now = Duration::ZERO;
//!
//! session.transition_to(SessionState::password_entry(), now).unwrap();
//! assert_eq!(session.mode(), SessionMode::PasswordEntry);
//!
//! // Admin modes need the admin flag
//! assert!(session.transition_to(SessionState::AdminMenu, now).is_err());
//! session.grant_admin();
//! session.transition_to(SessionState::AdminMenu, now).unwrap();
//! ```

use std::collections::VecDeque;
use std::fmt;
use std::time::Duration;

use doorlock_core::{Error, Result, constants::MAX_PASSWORD_LEN};
use serde::{Deserialize, Serialize};
use tracing::debug;

/// Maximum number of state transitions to keep in history.
const MAX_HISTORY_SIZE: usize = 100;

/// Characters typed so far in password entry.
///
/// Holds at most one display row of characters. Never printed in clear:
/// `Debug` is redacted and the display shows [`PasswordBuffer::masked`].
#[derive(Clone, Default, PartialEq, Eq)]
pub struct PasswordBuffer(String);

impl PasswordBuffer {
    /// Append `c`. Returns `false` (and ignores `c`) when the buffer is full.
    pub fn push(&mut self, c: char) -> bool {
        if self.len() >= MAX_PASSWORD_LEN {
            return false;
        }
        self.0.push(c);
        true
    }

    pub fn clear(&mut self) {
        self.0.clear();
    }

    /// Take the typed text, leaving the buffer empty.
    pub fn take(&mut self) -> String {
        std::mem::take(&mut self.0)
    }

    pub fn len(&self) -> usize {
        self.0.chars().count()
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    /// One `*` per typed character.
    pub fn masked(&self) -> String {
        "*".repeat(self.len())
    }
}

impl fmt::Debug for PasswordBuffer {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "PasswordBuffer({} chars)", self.len())
    }
}

/// Current session state, including the data owned by the state.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SessionState {
    Selection,
    FingerprintWait,
    PasswordEntry(PasswordBuffer),
    AdminMenu,
    AdminManageFingerprints,
    AdminManagePasswords,
    AdminViewLog,
    AdminClearConfirm,
}

impl SessionState {
    /// Password entry with an empty buffer.
    pub fn password_entry() -> Self {
        Self::PasswordEntry(PasswordBuffer::default())
    }

    /// The state's mode, without its data.
    pub fn mode(&self) -> SessionMode {
        match self {
            Self::Selection => SessionMode::Selection,
            Self::FingerprintWait => SessionMode::FingerprintWait,
            Self::PasswordEntry(_) => SessionMode::PasswordEntry,
            Self::AdminMenu => SessionMode::AdminMenu,
            Self::AdminManageFingerprints => SessionMode::AdminManageFingerprints,
            Self::AdminManagePasswords => SessionMode::AdminManagePasswords,
            Self::AdminViewLog => SessionMode::AdminViewLog,
            Self::AdminClearConfirm => SessionMode::AdminClearConfirm,
        }
    }
}

/// Data-free discriminant of [`SessionState`], used for transition rules
/// and history.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum SessionMode {
    Selection,
    FingerprintWait,
    PasswordEntry,
    AdminMenu,
    AdminManageFingerprints,
    AdminManagePasswords,
    AdminViewLog,
    AdminClearConfirm,
}

impl fmt::Display for SessionMode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            Self::Selection => "Selection",
            Self::FingerprintWait => "FingerprintWait",
            Self::PasswordEntry => "PasswordEntry",
            Self::AdminMenu => "AdminMenu",
            Self::AdminManageFingerprints => "AdminManageFingerprints",
            Self::AdminManagePasswords => "AdminManagePasswords",
            Self::AdminViewLog => "AdminViewLog",
            Self::AdminClearConfirm => "AdminClearConfirm",
        };
        f.write_str(name)
    }
}

impl SessionMode {
    /// Whether this mode is only reachable in an admin session.
    pub fn requires_admin(&self) -> bool {
        matches!(
            self,
            Self::AdminMenu
                | Self::AdminManageFingerprints
                | Self::AdminManagePasswords
                | Self::AdminViewLog
                | Self::AdminClearConfirm
        )
    }

    /// Check if transition to `target` is valid from this mode.
    ///
    /// ```
    /// use doorlock_controller::SessionMode;
    ///
    /// assert!(SessionMode::Selection.can_transition_to(&SessionMode::FingerprintWait));
    /// assert!(!SessionMode::FingerprintWait.can_transition_to(&SessionMode::PasswordEntry));
    /// ```
    pub fn can_transition_to(&self, target: &SessionMode) -> bool {
        use SessionMode::*;

        matches!(
            (self, target),
            // From Selection
            (Selection, FingerprintWait | PasswordEntry | AdminMenu)
            // Credential entry ends in the main menu or, for the admin, the admin menu
            | (FingerprintWait | PasswordEntry, Selection | AdminMenu)
            // From AdminMenu
            | (
                AdminMenu,
                Selection
                    | AdminManageFingerprints
                    | AdminManagePasswords
                    | AdminViewLog
                    | AdminClearConfirm
            )
            // Sub-menus return to AdminMenu
            | (
                AdminManageFingerprints | AdminManagePasswords | AdminViewLog | AdminClearConfirm,
                AdminMenu
            )
        )
    }
}

/// One recorded transition.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct StateTransition {
    pub from: SessionMode,
    pub to: SessionMode,
    /// Board uptime when the transition happened.
    pub at: Duration,
}

/// The session: current state, admin flag and transition history.
#[derive(Debug, Clone)]
pub struct Session {
    state: SessionState,
    admin: bool,
    entered_at: Duration,
    history: VecDeque<StateTransition>,
}

impl Session {
    /// Session in `Selection` without admin rights.
    pub fn new() -> Self {
        Self {
            state: SessionState::Selection,
            admin: false,
            entered_at: Duration::ZERO,
            history: VecDeque::with_capacity(MAX_HISTORY_SIZE),
        }
    }

    pub fn state(&self) -> &SessionState {
        &self.state
    }

    pub fn mode(&self) -> SessionMode {
        self.state.mode()
    }

    pub fn is_admin(&self) -> bool {
        self.admin
    }

    /// Set the admin flag after a verified admin credential.
    pub fn grant_admin(&mut self) {
        self.admin = true;
    }

    /// The password buffer, when in password entry.
    pub fn password_buffer(&mut self) -> Option<&mut PasswordBuffer> {
        match &mut self.state {
            SessionState::PasswordEntry(buffer) => Some(buffer),
            _ => None,
        }
    }

    /// Time spent in the current state at `now`.
    pub fn time_in_state(&self, now: Duration) -> Duration {
        now.saturating_sub(self.entered_at)
    }

    /// Transition to `next`, validating the move.
    ///
    /// # Errors
    ///
    /// Returns `Error::InvalidStateTransition` if the move is not allowed
    /// from the current mode, or `Error::AdminRequired` if `next` is an
    /// admin mode and the admin flag is not set.
    pub fn transition_to(&mut self, next: SessionState, now: Duration) -> Result<StateTransition> {
        let from = self.mode();
        let to = next.mode();

        if !from.can_transition_to(&to) {
            return Err(Error::InvalidStateTransition {
                from: from.to_string(),
                to: to.to_string(),
            });
        }
        if to.requires_admin() && !self.admin {
            return Err(Error::AdminRequired {
                state: to.to_string(),
            });
        }

        Ok(self.perform_state_change(next, now))
    }

    /// Return to `Selection` from any state, dropping admin rights.
    pub fn reset(&mut self, now: Duration) -> StateTransition {
        self.perform_state_change(SessionState::Selection, now)
    }

    /// Transition history, oldest first.
    pub fn history(&self) -> &VecDeque<StateTransition> {
        &self.history
    }

    /// The last `count` transitions, oldest first.
    pub fn last_transitions(&self, count: usize) -> Vec<StateTransition> {
        let skip = self.history.len().saturating_sub(count);
        self.history.iter().skip(skip).copied().collect()
    }

    fn perform_state_change(&mut self, next: SessionState, now: Duration) -> StateTransition {
        let transition = StateTransition {
            from: self.mode(),
            to: next.mode(),
            at: now,
        };

        if transition.to == SessionMode::Selection {
            self.admin = false;
        }
        self.state = next;
        self.entered_at = now;

        if self.history.len() >= MAX_HISTORY_SIZE {
            self.history.pop_front();
        }
        self.history.push_back(transition);

        debug!(from = %transition.from, to = %transition.to, "Session transition");
        transition
    }
}

impl Default for Session {
    fn default() -> Self {
        Self::new()
    }
}
