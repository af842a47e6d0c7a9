//! Value types exchanged with peripherals.

use serde::{Deserialize, Serialize};
use std::fmt;

use crate::error::{HardwareError, Result};

/// A key on the 4x4 matrix keypad.
///
/// The alphabet is `0-9`, `A-D`, `*` and `#`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum Key {
    /// Numeric digit (0-9).
    Digit(u8),

    /// Letter key (A-D).
    Letter(char),

    /// Star key (*), used for cancel and clear.
    Star,

    /// Hash key (#), used for submit and confirm.
    Hash,
}

impl Key {
    /// Parse a keypad character.
    ///
    /// # Errors
    ///
    /// Returns an error if the character is not on the keypad.
    ///
    /// # Examples
    ///
    /// ```
    /// use doorlock_hardware::Key;
    ///
    /// assert_eq!(Key::from_char('7').unwrap(), Key::Digit(7));
    /// assert_eq!(Key::from_char('B').unwrap(), Key::Letter('B'));
    /// assert!(Key::from_char('E').is_err());
    /// ```
    pub fn from_char(c: char) -> Result<Self> {
        match c {
            '0'..='9' => Ok(Self::Digit(c as u8 - b'0')),
            'A'..='D' => Ok(Self::Letter(c)),
            '*' => Ok(Self::Star),
            '#' => Ok(Self::Hash),
            other => Err(HardwareError::invalid_data(format!(
                "Not a keypad key: {other:?}"
            ))),
        }
    }

    /// The character printed on the key.
    pub fn as_char(&self) -> char {
        match self {
            Self::Digit(d) => char::from(b'0' + d),
            Self::Letter(c) => *c,
            Self::Star => '*',
            Self::Hash => '#',
        }
    }

    /// Whether the key may be typed into a password.
    pub fn is_password_char(&self) -> bool {
        matches!(self, Self::Digit(_) | Self::Letter(_))
    }
}

impl fmt::Display for Key {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.as_char())
    }
}

/// Result of one identification pass with a finger on the sensor.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum FingerScan {
    /// The finger matched a stored template.
    Matched {
        /// Template slot that matched.
        id: u16,
        /// Match score, when the sensor reports one.
        confidence: Option<u16>,
    },

    /// A finger was imaged but matched no stored template.
    NoMatch,
}

/// Which of the two enrollment captures is being taken.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum TemplateSlot {
    First,
    Second,
}

/// Fault reported by the fingerprint sensor during capture, enroll or delete.
///
/// Codes follow the confirmation bytes of the common optical sensor family
/// and are shown on the display so a technician can tell faults apart.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum SensorFault {
    /// Corrupted packet on the serial link.
    PacketError,
    /// No finger on the sensor when one was required.
    NoFinger,
    /// The image could not be captured.
    ImagingFailed,
    /// The image was too messy to extract features.
    ImageTooMessy,
    /// Too few feature points.
    FeatureFail,
    /// The two enrollment captures do not belong to the same finger.
    EnrollMismatch,
    /// Template slot outside the sensor library.
    BadLocation,
    /// Could not delete the template.
    DeleteFailed,
    /// Could not write the template library.
    FlashWriteError,
}

impl SensorFault {
    /// Numeric code for display.
    pub fn code(&self) -> u8 {
        match self {
            Self::PacketError => 0x01,
            Self::NoFinger => 0x02,
            Self::ImagingFailed => 0x03,
            Self::ImageTooMessy => 0x06,
            Self::FeatureFail => 0x07,
            Self::EnrollMismatch => 0x0A,
            Self::BadLocation => 0x0B,
            Self::DeleteFailed => 0x10,
            Self::FlashWriteError => 0x18,
        }
    }
}

impl fmt::Display for SensorFault {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let text = match self {
            Self::PacketError => "packet error",
            Self::NoFinger => "no finger",
            Self::ImagingFailed => "imaging failed",
            Self::ImageTooMessy => "image too messy",
            Self::FeatureFail => "feature extraction failed",
            Self::EnrollMismatch => "captures do not match",
            Self::BadLocation => "bad template location",
            Self::DeleteFailed => "delete failed",
            Self::FlashWriteError => "flash write error",
        };
        f.write_str(text)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rstest::rstest;

    #[rstest]
    #[case('0', Key::Digit(0))]
    #[case('9', Key::Digit(9))]
    #[case('A', Key::Letter('A'))]
    #[case('D', Key::Letter('D'))]
    #[case('*', Key::Star)]
    #[case('#', Key::Hash)]
    fn test_key_char_mapping(#[case] c: char, #[case] key: Key) {
        assert_eq!(Key::from_char(c).unwrap(), key);
        assert_eq!(key.as_char(), c);
    }

    #[rstest]
    #[case('a')]
    #[case('E')]
    #[case(' ')]
    fn test_key_rejects_foreign_chars(#[case] c: char) {
        assert!(matches!(
            Key::from_char(c),
            Err(HardwareError::InvalidData { .. })
        ));
    }

    #[test]
    fn test_password_chars() {
        assert!(Key::Digit(3).is_password_char());
        assert!(Key::Letter('C').is_password_char());
        assert!(!Key::Star.is_password_char());
        assert!(!Key::Hash.is_password_char());
    }

    #[test]
    fn test_sensor_fault_codes_are_distinct() {
        let faults = [
            SensorFault::PacketError,
            SensorFault::NoFinger,
            SensorFault::ImagingFailed,
            SensorFault::ImageTooMessy,
            SensorFault::FeatureFail,
            SensorFault::EnrollMismatch,
            SensorFault::BadLocation,
            SensorFault::DeleteFailed,
            SensorFault::FlashWriteError,
        ];
        let mut codes: Vec<u8> = faults.iter().map(SensorFault::code).collect();
        codes.sort_unstable();
        codes.dedup();
        assert_eq!(codes.len(), faults.len());
    }
}
