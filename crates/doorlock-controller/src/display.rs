//! Screens shown on the 16x2 character display.
//!
//! Every screen the controller can show is a [`Screen`] value. Rendering
//! blanks the display and writes both rows padded to the full width, so no
//! characters of the previous screen survive.
//!
//! # Character Set
//!
//! The display module has an ASCII character ROM. Screen text is ASCII by
//! construction; user-supplied text (labels, typed digits) is stripped of
//! control characters and anything outside ASCII before it reaches the
//! display.
//!
//! # Examples
//!
//! ```
//! use doorlock_controller::display::Screen;
//!
//! let [top, bottom] = Screen::Locked { remaining_secs: 7 }.lines();
//! assert_eq!(top.trim(), "SYSTEM LOCKED");
//! assert_eq!(bottom.trim(), "WAIT 7s");
//! ```

use doorlock_core::{Timestamp, User, constants::LCD_COLUMNS};
use doorlock_hardware::{DisplaySurface, Result};
use doorlock_storage::LogRecord;

/// Text alignment within a display row.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Alignment {
    /// Text starts at column 0, padded with spaces on the right.
    Left,
    /// Text centered, extra space on the right if odd.
    Center,
    /// Text ends at the last column, padded with spaces on the left.
    Right,
}

/// Everything the controller puts on the display.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Screen<'a> {
    /// Main menu.
    Selection,
    FingerprintWait,
    /// Password entry with `typed` characters so far.
    PasswordEntry { typed: usize },
    AdminChallenge,
    AdminMenu,
    FingerprintMenu,
    PasswordMenu,
    Locked { remaining_secs: u64 },
    Granted(User),
    AdminWelcome,
    Denied,
    NotAdmin,
    TimedOut,
    SensorFault { code: u8 },
    Clock(Timestamp),
    /// One audit record; `position` counts from 1 for the newest.
    LogEntry { position: usize, record: &'a LogRecord },
    LogEmpty,
    ConfirmClear,
    LogCleared,
    /// Keypad prompt: a title and what has been typed (masked or not).
    Prompt { title: &'a str, input: &'a str },
    /// Free-form two-line notice.
    Notice(&'a str, &'a str),
}

impl Screen<'_> {
    /// Both rows, each exactly [`LCD_COLUMNS`] characters wide.
    pub fn lines(&self) -> [String; 2] {
        let left = |text: &str| align_text(&sanitize_text(text), LCD_COLUMNS, Alignment::Left);
        let center = |text: &str| align_text(&sanitize_text(text), LCD_COLUMNS, Alignment::Center);

        match self {
            Self::Selection => [left("1:Finger 2:Code"), left("A:Admin  B:Time")],
            Self::FingerprintWait => [center("PLACE FINGER"), center("*:Cancel")],
            Self::PasswordEntry { typed } => [
                center("ENTER PASSWORD"),
                left(&mask(*typed)),
            ],
            Self::AdminChallenge => [center("ADMIN CHECK"), center("PLACE FINGER")],
            Self::AdminMenu => [left("1:Finger 2:Pass"), left("3:Log 4:Clr *:X")],
            Self::FingerprintMenu => [left("1:Enroll 2:Del"), left("*:Back")],
            Self::PasswordMenu => [left("1:Change 2:Del"), left("*:Back")],
            Self::Locked { remaining_secs } => [
                center("SYSTEM LOCKED"),
                center(&format!("WAIT {remaining_secs}s")),
            ],
            Self::Granted(user) => [center("ACCESS GRANTED"), center(user.label())],
            Self::AdminWelcome => [center("ADMIN MODE"), String::from(BLANK_ROW)],
            Self::Denied => [center("ACCESS DENIED"), String::from(BLANK_ROW)],
            Self::NotAdmin => [center("NOT ADMIN"), String::from(BLANK_ROW)],
            Self::TimedOut => [center("TIME OUT"), String::from(BLANK_ROW)],
            Self::SensorFault { code } => [
                center("SENSOR ERROR"),
                center(&format!("ERR 0x{code:02X}")),
            ],
            Self::Clock(now) => {
                let dt = now.inner();
                [
                    center(&dt.format("%Y/%m/%d").to_string()),
                    center(&dt.format("%H:%M:%S").to_string()),
                ]
            }
            Self::LogEntry { position, record } => {
                let dt = record.timestamp();
                let top = format!(
                    "{position:>2} {:<8} {}",
                    record.label(),
                    dt.inner().format("%Y")
                );
                // Labels are printable already; keep the leading pad
                [
                    align_text(&top, LCD_COLUMNS, Alignment::Left),
                    left(&dt.inner().format("%m/%d %H:%M:%S").to_string()),
                ]
            }
            Self::LogEmpty => [center("LOG EMPTY"), String::from(BLANK_ROW)],
            Self::ConfirmClear => [center("CLEAR LOG?"), center("#:Yes *:No")],
            Self::LogCleared => [center("LOG CLEARED"), String::from(BLANK_ROW)],
            Self::Prompt { title, input } => [left(title), left(input)],
            Self::Notice(top, bottom) => [center(top), center(bottom)],
        }
    }

    /// Put this screen on `display`.
    ///
    /// # Errors
    ///
    /// Returns an error if the display rejects a write.
    pub fn render<D: DisplaySurface>(&self, display: &mut D) -> Result<()> {
        let [top, bottom] = self.lines();
        display.clear()?;
        display.write_at(0, 0, &top)?;
        display.write_at(1, 0, &bottom)
    }
}

const BLANK_ROW: &str = "                ";

/// One `*` per typed character, capped at the display width.
///
/// # Examples
///
/// ```
/// use doorlock_controller::display::mask;
///
/// assert_eq!(mask(4), "****");
/// assert_eq!(mask(40).len(), 16);
/// ```
pub fn mask(typed: usize) -> String {
    "*".repeat(typed.min(LCD_COLUMNS))
}

/// Truncate text to at most `max_chars` characters.
///
/// # Examples
///
/// ```
/// use doorlock_controller::display::truncate_text;
///
/// assert_eq!(truncate_text("Daughter", 5), "Daugh");
/// assert_eq!(truncate_text("Son", 10), "Son");
/// ```
pub fn truncate_text(text: &str, max_chars: usize) -> String {
    text.chars().take(max_chars).collect()
}

/// Align text within a fixed width, padding with spaces.
///
/// Returns a string exactly `width` characters long; longer text is
/// truncated.
///
/// # Examples
///
/// ```
/// use doorlock_controller::display::{align_text, Alignment};
///
/// assert_eq!(align_text("HELLO", 10, Alignment::Left), "HELLO     ");
/// assert_eq!(align_text("HELLO", 10, Alignment::Center), "  HELLO   ");
/// assert_eq!(align_text("HELLO", 10, Alignment::Right), "     HELLO");
/// ```
pub fn align_text(text: &str, width: usize, alignment: Alignment) -> String {
    let char_count = text.chars().count();

    if char_count >= width {
        return truncate_text(text, width);
    }

    let padding = width - char_count;

    match alignment {
        Alignment::Left => format!("{}{}", text, " ".repeat(padding)),
        Alignment::Right => format!("{}{}", " ".repeat(padding), text),
        Alignment::Center => {
            let left_pad = padding / 2;
            let right_pad = padding - left_pad;
            format!("{}{}{}", " ".repeat(left_pad), text, " ".repeat(right_pad))
        }
    }
}

/// Drop control characters, replace anything outside printable ASCII with
/// `?`, and trim.
fn sanitize_text(text: &str) -> String {
    text.chars()
        .filter(|c| !c.is_control())
        .map(|c| if c.is_ascii() { c } else { '?' })
        .collect::<String>()
        .trim()
        .to_string()
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::NaiveDate;
    use doorlock_hardware::mock::VirtualLcd;
    use rstest::rstest;

    fn ts(y: i32, mo: u32, d: u32, h: u32, mi: u32, s: u32) -> Timestamp {
        Timestamp::from_datetime(
            NaiveDate::from_ymd_opt(y, mo, d)
                .unwrap()
                .and_hms_opt(h, mi, s)
                .unwrap(),
        )
    }

    #[rstest]
    #[case(Screen::Selection)]
    #[case(Screen::AdminMenu)]
    #[case(Screen::PasswordEntry { typed: 99 })]
    #[case(Screen::Locked { remaining_secs: 10 })]
    #[case(Screen::Granted(User::Daughter))]
    #[case(Screen::SensorFault { code: 0x18 })]
    #[case(Screen::Prompt { title: "A very long prompt title", input: "" })]
    fn test_rows_are_full_width(#[case] screen: Screen<'_>) {
        for row in screen.lines() {
            assert_eq!(row.chars().count(), LCD_COLUMNS);
        }
    }

    #[test]
    fn test_selection_menu_text() {
        let [top, bottom] = Screen::Selection.lines();
        assert_eq!(top.trim_end(), "1:Finger 2:Code");
        assert_eq!(bottom.trim_end(), "A:Admin  B:Time");
    }

    #[test]
    fn test_password_entry_is_masked() {
        let [_, bottom] = Screen::PasswordEntry { typed: 4 }.lines();
        assert_eq!(bottom.trim_end(), "****");
    }

    #[test]
    fn test_sensor_fault_code() {
        let [_, bottom] = Screen::SensorFault { code: 0x0A }.lines();
        assert_eq!(bottom.trim(), "ERR 0x0A");
    }

    #[test]
    fn test_clock_screen() {
        let [top, bottom] = Screen::Clock(ts(2024, 3, 9, 7, 5, 1)).lines();
        assert_eq!(top.trim(), "2024/03/09");
        assert_eq!(bottom.trim(), "07:05:01");
    }

    #[test]
    fn test_log_entry_layout() {
        let record = LogRecord::new("Mother", ts(2024, 12, 31, 23, 59, 58));
        let [top, bottom] = Screen::LogEntry {
            position: 3,
            record: &record,
        }
        .lines();

        assert_eq!(top, " 3 Mother   2024");
        assert_eq!(bottom.trim_end(), "12/31 23:59:58");
    }

    #[test]
    fn test_render_replaces_previous_screen() {
        let (mut lcd, handle) = VirtualLcd::new();

        Screen::Selection.render(&mut lcd).unwrap();
        Screen::Denied.render(&mut lcd).unwrap();

        assert_eq!(handle.line(0).trim(), "ACCESS DENIED");
        assert_eq!(handle.line(1).trim(), "");
    }

    #[test]
    fn test_sanitize_text() {
        assert_eq!(sanitize_text("  caf\u{e9}\n "), "caf?");
        assert_eq!(sanitize_text("ENROLLED"), "ENROLLED");
    }

    #[test]
    fn test_align_truncates_long_text() {
        assert_eq!(align_text("ABCDEFGHIJ", 4, Alignment::Center), "ABCD");
    }
}
