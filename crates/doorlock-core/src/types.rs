use crate::{
    Result,
    constants::{MAX_FINGERPRINT_ID, MAX_PASSWORD_LEN, MIN_FINGERPRINT_ID, TIMESTAMP_FORMAT},
    error::Error,
};
use chrono::NaiveDateTime;
use serde::{Deserialize, Serialize};
use std::fmt;
use subtle::ConstantTimeEq;

/// Household member known to the controller.
///
/// The roster is fixed at manufacture. Each member owns exactly one password
/// slot and exactly one fingerprint identifier.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum User {
    Admin,
    Father,
    Mother,
    Son,
    Daughter,
}

impl User {
    /// Every user, in fingerprint identifier order.
    pub const ALL: [User; 5] = [
        User::Admin,
        User::Father,
        User::Mother,
        User::Son,
        User::Daughter,
    ];

    /// Label written to the audit log and shown on the display.
    #[must_use]
    pub fn label(&self) -> &'static str {
        match self {
            User::Admin => "Admin",
            User::Father => "Father",
            User::Mother => "Mother",
            User::Son => "Son",
            User::Daughter => "Daughter",
        }
    }

    /// Fixed fingerprint identifier assigned at enrollment time.
    ///
    /// ```
    /// use doorlock_core::User;
    ///
    /// assert_eq!(User::Admin.fingerprint_id().as_u16(), 1);
    /// assert_eq!(User::Daughter.fingerprint_id().as_u16(), 5);
    /// ```
    #[must_use]
    pub fn fingerprint_id(&self) -> FingerprintId {
        let raw = match self {
            User::Admin => 1,
            User::Father => 2,
            User::Mother => 3,
            User::Son => 4,
            User::Daughter => 5,
        };
        FingerprintId(raw)
    }

    /// Resolve the user owning a fingerprint identifier, if any.
    #[must_use]
    pub fn from_fingerprint_id(id: FingerprintId) -> Option<Self> {
        User::ALL.into_iter().find(|u| u.fingerprint_id() == id)
    }

    /// Resolve a keypad menu selection (`1` = Admin .. `5` = Daughter).
    ///
    /// # Errors
    /// Returns `Error::UnknownUser` for any other digit.
    pub fn from_selection(digit: u8) -> Result<Self> {
        match digit {
            1..=5 => Ok(User::ALL[usize::from(digit - 1)]),
            _ => Err(Error::UnknownUser(digit.to_string())),
        }
    }

    /// Whether this user opens the admin menu instead of the door.
    #[must_use]
    pub fn is_admin(&self) -> bool {
        matches!(self, User::Admin)
    }
}

impl fmt::Display for User {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        f.write_str(self.label())
    }
}

/// Template slot identifier on the fingerprint sensor (1-127).
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub struct FingerprintId(u16);

impl FingerprintId {
    /// Create an identifier with range validation.
    ///
    /// # Errors
    /// Returns `Error::InvalidFingerprintId` outside 1-127.
    ///
    /// ```
    /// use doorlock_core::FingerprintId;
    ///
    /// assert!(FingerprintId::new(127).is_ok());
    /// assert!(FingerprintId::new(128).is_err());
    /// assert!(FingerprintId::new(0).is_err());
    /// ```
    pub fn new(id: u16) -> Result<Self> {
        if !(MIN_FINGERPRINT_ID..=MAX_FINGERPRINT_ID).contains(&id) {
            return Err(Error::InvalidFingerprintId(id));
        }
        Ok(FingerprintId(id))
    }

    #[must_use]
    pub fn as_u16(&self) -> u16 {
        self.0
    }
}

impl fmt::Display for FingerprintId {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

impl std::str::FromStr for FingerprintId {
    type Err = Error;

    fn from_str(s: &str) -> Result<Self> {
        let id: u16 = s
            .parse()
            .map_err(|_| Error::InvalidFingerprintId(u16::MAX))?;
        FingerprintId::new(id)
    }
}

/// Stored password.
///
/// Kept in plaintext, matching the device's storage model. An empty password
/// means password login is disabled for its owner and never matches.
#[derive(Clone, Default, Serialize, Deserialize)]
#[serde(transparent)]
pub struct Password(String);

impl Password {
    /// Create a password, rejecting values longer than the entry buffer.
    ///
    /// # Errors
    /// Returns `Error::PasswordTooLong` above 16 characters.
    pub fn new(value: impl Into<String>) -> Result<Self> {
        let value = value.into();
        let len = value.chars().count();
        if len > MAX_PASSWORD_LEN {
            return Err(Error::PasswordTooLong {
                len,
                max: MAX_PASSWORD_LEN,
            });
        }
        Ok(Password(value))
    }

    /// The disabled (empty) password.
    #[must_use]
    pub fn disabled() -> Self {
        Password(String::new())
    }

    #[must_use]
    pub fn is_disabled(&self) -> bool {
        self.0.is_empty()
    }

    /// Length in characters.
    #[must_use]
    pub fn len(&self) -> usize {
        self.0.chars().count()
    }

    /// Case-sensitive exact comparison in constant time.
    ///
    /// ```
    /// use doorlock_core::Password;
    ///
    /// let password = Password::new("1111").unwrap();
    /// assert!(password.matches("1111"));
    /// assert!(!password.matches("111"));
    /// assert!(!Password::disabled().matches(""));
    /// ```
    #[must_use]
    pub fn matches(&self, input: &str) -> bool {
        if self.is_disabled() {
            return false;
        }
        self.0.as_bytes().ct_eq(input.as_bytes()).into()
    }
}

impl fmt::Debug for Password {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        if self.is_disabled() {
            f.write_str("Password(disabled)")
        } else {
            f.write_str("Password(***)")
        }
    }
}

/// Wall-clock reading in the device format (`YYYY/MM/DD HH:MM:SS`).
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub struct Timestamp(NaiveDateTime);

impl Timestamp {
    #[must_use]
    pub fn from_datetime(dt: NaiveDateTime) -> Self {
        Timestamp(dt)
    }

    /// Parse from device format: "2024/03/15 08:30:00".
    ///
    /// # Errors
    /// Returns `Error::InvalidTimestamp` if the string is not exactly that format.
    pub fn parse(s: &str) -> Result<Self> {
        NaiveDateTime::parse_from_str(s, TIMESTAMP_FORMAT)
            .map(Timestamp)
            .map_err(|e| Error::InvalidTimestamp {
                value: s.to_string(),
                reason: e.to_string(),
            })
    }

    /// Format as the 19-character device string.
    #[must_use]
    pub fn format(&self) -> String {
        self.0.format(TIMESTAMP_FORMAT).to_string()
    }

    #[must_use]
    pub fn inner(&self) -> &NaiveDateTime {
        &self.0
    }
}

impl fmt::Display for Timestamp {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        write!(f, "{}", self.format())
    }
}

impl From<NaiveDateTime> for Timestamp {
    fn from(dt: NaiveDateTime) -> Self {
        Timestamp(dt)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rstest::rstest;

    #[rstest]
    #[case(User::Admin, 1)]
    #[case(User::Father, 2)]
    #[case(User::Mother, 3)]
    #[case(User::Son, 4)]
    #[case(User::Daughter, 5)]
    fn test_fingerprint_mapping_is_one_to_one(#[case] user: User, #[case] raw: u16) {
        let id = FingerprintId::new(raw).unwrap();
        assert_eq!(user.fingerprint_id(), id);
        assert_eq!(User::from_fingerprint_id(id), Some(user));
    }

    #[test]
    fn test_unmapped_fingerprint_has_no_user() {
        let id = FingerprintId::new(7).unwrap();
        assert_eq!(User::from_fingerprint_id(id), None);
    }

    #[test]
    fn test_labels_fit_log_field() {
        for user in User::ALL {
            assert!(user.label().len() <= crate::constants::LABEL_WIDTH);
        }
    }

    #[rstest]
    #[case(1, User::Admin)]
    #[case(2, User::Father)]
    #[case(5, User::Daughter)]
    fn test_user_selection(#[case] digit: u8, #[case] expected: User) {
        assert_eq!(User::from_selection(digit).unwrap(), expected);
    }

    #[rstest]
    #[case(0)]
    #[case(6)]
    #[case(9)]
    fn test_user_selection_out_of_range(#[case] digit: u8) {
        assert!(matches!(
            User::from_selection(digit),
            Err(Error::UnknownUser(_))
        ));
    }

    #[rstest]
    #[case(0)]
    #[case(128)]
    #[case(u16::MAX)]
    fn test_fingerprint_id_range(#[case] raw: u16) {
        assert!(matches!(
            FingerprintId::new(raw),
            Err(Error::InvalidFingerprintId(_))
        ));
    }

    #[test]
    fn test_fingerprint_id_from_str() {
        assert_eq!("42".parse::<FingerprintId>().unwrap().as_u16(), 42);
        assert!("abc".parse::<FingerprintId>().is_err());
        assert!("128".parse::<FingerprintId>().is_err());
    }

    #[test]
    fn test_password_is_case_sensitive() {
        let password = Password::new("AB12").unwrap();
        assert!(password.matches("AB12"));
        assert!(!password.matches("ab12"));
    }

    #[test]
    fn test_disabled_password_never_matches() {
        let password = Password::disabled();
        assert!(!password.matches(""));
        assert!(!password.matches("1111"));
    }

    #[test]
    fn test_password_length_limit() {
        assert!(Password::new("1234567890123456").is_ok());
        assert!(matches!(
            Password::new("12345678901234567"),
            Err(Error::PasswordTooLong { len: 17, max: 16 })
        ));
    }

    #[test]
    fn test_password_debug_is_redacted() {
        let password = Password::new("9999").unwrap();
        assert!(!format!("{password:?}").contains("9999"));
    }

    #[test]
    fn test_timestamp_roundtrip() {
        let timestamp = Timestamp::parse("2024/03/15 08:30:00").unwrap();
        assert_eq!(timestamp.format(), "2024/03/15 08:30:00");
        assert_eq!(timestamp.to_string().len(), 19);
    }

    #[test]
    fn test_timestamp_rejects_other_formats() {
        assert!(Timestamp::parse("15/03/2024 08:30:00").is_err());
        assert!(Timestamp::parse("").is_err());
    }
}
