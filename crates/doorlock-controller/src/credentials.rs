//! Credential store: password table and enrolled fingerprint identifiers.
//!
//! Credentials live in memory only. Passwords revert to the configured
//! initial table on every power cycle.

use std::collections::BTreeSet;

use doorlock_core::{FingerprintId, Password, User, config::InitialPasswords};
use tracing::info;

/// Passwords and enrolled fingerprints of the household.
///
/// # Examples
///
/// ```
/// use doorlock_controller::CredentialStore;
/// use doorlock_core::{Password, User};
///
/// let mut store = CredentialStore::default();
/// assert_eq!(store.verify_password("1111"), Some(User::Father));
/// assert_eq!(store.verify_fingerprint(3), Some(User::Mother));
///
/// store.clear_password(User::Father);
/// assert_eq!(store.verify_password("1111"), None);
/// assert_eq!(store.verify_fingerprint(2), Some(User::Father));
/// ```
#[derive(Debug, Clone)]
pub struct CredentialStore {
    /// Indexed in [`User::ALL`] order.
    passwords: [Password; User::ALL.len()],
    enrolled: BTreeSet<FingerprintId>,
}

impl CredentialStore {
    /// Store with `passwords` and every user's fingerprint enrolled.
    pub fn new(passwords: &InitialPasswords) -> Self {
        Self {
            passwords: User::ALL.map(|user| passwords.for_user(user).clone()),
            enrolled: User::ALL.iter().map(User::fingerprint_id).collect(),
        }
    }

    /// The user whose non-empty password equals `input` exactly.
    ///
    /// Every stored password is compared, matched or not, so the time taken
    /// does not reveal which slot matched. If two users share a password the
    /// first in roster order wins.
    pub fn verify_password(&self, input: &str) -> Option<User> {
        let mut found = None;
        for (user, password) in User::ALL.iter().zip(&self.passwords) {
            if password.matches(input) && found.is_none() {
                found = Some(*user);
            }
        }
        found
    }

    /// The user owning fingerprint `id`, if `id` is enrolled and assigned.
    ///
    /// Identifiers outside 1-127, not enrolled, or enrolled but not
    /// assigned to a household member all yield `None`.
    pub fn verify_fingerprint(&self, id: u16) -> Option<User> {
        let id = FingerprintId::new(id).ok()?;
        if !self.enrolled.contains(&id) {
            return None;
        }
        User::from_fingerprint_id(id)
    }

    /// Current password of `user`.
    pub fn password(&self, user: User) -> &Password {
        &self.passwords[index(user)]
    }

    /// Overwrite the password of `user`.
    pub fn set_password(&mut self, user: User, password: Password) {
        self.passwords[index(user)] = password;
        info!(user = user.label(), "Password changed");
    }

    /// Disable password login for `user`. Fingerprint login is unaffected.
    pub fn clear_password(&mut self, user: User) {
        self.passwords[index(user)] = Password::disabled();
        info!(user = user.label(), "Password deleted");
    }

    pub fn is_enrolled(&self, id: FingerprintId) -> bool {
        self.enrolled.contains(&id)
    }

    /// Record that the sensor now holds a template for `id`.
    pub fn enroll(&mut self, id: FingerprintId) {
        self.enrolled.insert(id);
    }

    /// Record that the sensor no longer holds `id`. Returns whether it did.
    pub fn remove(&mut self, id: FingerprintId) -> bool {
        self.enrolled.remove(&id)
    }

    /// Enrolled identifiers in ascending order.
    pub fn enrolled(&self) -> impl Iterator<Item = FingerprintId> + '_ {
        self.enrolled.iter().copied()
    }
}

impl Default for CredentialStore {
    fn default() -> Self {
        Self::new(&InitialPasswords::default())
    }
}

fn index(user: User) -> usize {
    User::ALL.iter().position(|u| *u == user).unwrap_or_default()
}
