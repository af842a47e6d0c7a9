//! Fixed parameters of the door controller.
//!
//! Values that define the durable log layout are not configurable: changing
//! them invalidates every EEPROM image written by a previous build. Timing
//! parameters here are only the defaults for [`ControllerConfig`](crate::ControllerConfig).
//!
//! # Durable Layout
//!
//! ```text
//! addr 0        : cursor (next slot to overwrite, 0..LOG_CAPACITY)
//! addr 1 + 28*i : slot i = [label x8][timestamp x19][0x00]
//! ```

// ============================================================================
// Audit Log Layout
// ============================================================================

/// Number of slots in the circular audit log.
pub const LOG_CAPACITY: usize = 10;

/// Width of the user label field, space padded on write.
pub const LABEL_WIDTH: usize = 8;

/// Width of a formatted timestamp (`YYYY/MM/DD HH:MM:SS`).
pub const TIMESTAMP_WIDTH: usize = 19;

/// Bytes per slot: label, timestamp and one terminator byte.
///
/// ```
/// use doorlock_core::constants::*;
///
/// assert_eq!(RECORD_SIZE, LABEL_WIDTH + TIMESTAMP_WIDTH + 1);
/// assert_eq!(RECORD_SIZE, 28);
/// ```
pub const RECORD_SIZE: usize = LABEL_WIDTH + TIMESTAMP_WIDTH + 1;

/// In-band terminator written after the timestamp.
pub const RECORD_TERMINATOR: u8 = 0x00;

/// Address of the persisted cursor byte.
pub const CURSOR_ADDRESS: usize = 0;

/// Address of slot 0.
pub const LOG_BASE_ADDRESS: usize = CURSOR_ADDRESS + 1;

/// Total bytes of durable storage used by the log, cursor included.
pub const LOG_FOOTPRINT: usize = LOG_BASE_ADDRESS + LOG_CAPACITY * RECORD_SIZE;

/// `chrono` format string for [`Timestamp`](crate::Timestamp).
pub const TIMESTAMP_FORMAT: &str = "%Y/%m/%d %H:%M:%S";

// ============================================================================
// Credentials
// ============================================================================

/// Lowest identifier the fingerprint sensor accepts.
pub const MIN_FINGERPRINT_ID: u16 = 1;

/// Highest identifier the fingerprint sensor accepts.
pub const MAX_FINGERPRINT_ID: u16 = 127;

/// Longest password the entry buffer holds (one LCD row).
pub const MAX_PASSWORD_LEN: usize = 16;

// ============================================================================
// Display
// ============================================================================

/// Character rows on the LCD.
pub const LCD_ROWS: usize = 2;

/// Character columns on the LCD.
pub const LCD_COLUMNS: usize = 16;

// ============================================================================
// Default Timing
// ============================================================================

/// Consecutive failures that engage the lockout.
pub const DEFAULT_LOCKOUT_THRESHOLD: u32 = 3;

/// Lockout window in seconds.
pub const DEFAULT_LOCKOUT_WINDOW_SECS: u64 = 10;

/// Relay hold time in seconds.
pub const DEFAULT_UNLOCK_HOLD_SECS: u64 = 5;

/// Admin fingerprint presentation timeout in seconds.
pub const DEFAULT_ADMIN_CHALLENGE_SECS: u64 = 10;

/// Idle timeout for keypad prompts inside admin sub-flows.
pub const DEFAULT_PROMPT_TIMEOUT_SECS: u64 = 30;

/// How long transient messages stay on screen.
pub const DEFAULT_MESSAGE_SECS: u64 = 2;

/// Busy-poll delay between loop iterations.
pub const DEFAULT_POLL_INTERVAL_MS: u64 = 50;

/// Buzzer frequency for feedback tones.
pub const DEFAULT_FEEDBACK_TONE_HZ: u32 = 2000;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_log_footprint() {
        assert_eq!(LOG_FOOTPRINT, 281);
        assert_eq!(LOG_BASE_ADDRESS, 1);
    }

    #[test]
    fn test_timestamp_format_width() {
        let formatted = chrono::NaiveDate::from_ymd_opt(2024, 1, 2)
            .and_then(|d| d.and_hms_opt(3, 4, 5))
            .map(|dt| dt.format(TIMESTAMP_FORMAT).to_string())
            .unwrap();
        assert_eq!(formatted.len(), TIMESTAMP_WIDTH);
    }
}
