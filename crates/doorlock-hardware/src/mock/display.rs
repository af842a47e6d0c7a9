//! Virtual character LCD for testing and host emulation.
//!
//! The display keeps a fixed grid of ASCII cells (2x16 by default) and a
//! transcript of the text written to it, so tests can assert on messages
//! that were shown and then replaced within a single step. The transcript
//! holds the last [`TRANSCRIPT_LIMIT`] writes.
//!
//! # Examples
//!
//! ```
//! use doorlock_hardware::mock::VirtualLcd;
//! use doorlock_hardware::traits::DisplaySurface;
//!
//! let (mut lcd, handle) = VirtualLcd::new();
//! lcd.write_at(0, 0, "ENTER PASSWORD").unwrap();
//! lcd.write_at(1, 0, "****").unwrap();
//!
//! assert_eq!(handle.line(0).trim_end(), "ENTER PASSWORD");
//! assert_eq!(handle.line(1).trim_end(), "****");
//! assert!(handle.has_shown("ENTER PASSWORD"));
//! ```

use std::collections::VecDeque;
use std::sync::{Arc, Mutex, MutexGuard, PoisonError};

use doorlock_core::constants::{LCD_COLUMNS, LCD_ROWS};

use crate::{HardwareError, Result, traits::DisplaySurface};

/// Writes kept in the transcript; older ones are dropped first.
pub const TRANSCRIPT_LIMIT: usize = 256;

/// Character shown for bytes the controller cannot render.
const UNPRINTABLE: char = '?';

#[derive(Debug)]
struct LcdState {
    rows: usize,
    columns: usize,
    /// One fixed-width line per row.
    buffer: Vec<Vec<char>>,
    backlight: bool,
    /// Recent non-blank texts written, oldest first.
    transcript: VecDeque<String>,
}

impl LcdState {
    fn blank(&mut self) {
        for line in &mut self.buffer {
            line.fill(' ');
        }
    }
}

/// Virtual character LCD.
///
/// Not a drawing surface for anything but ASCII: control characters are
/// dropped and other non-printable characters are shown as `?`, as the
/// character ROM of the real module would.
#[derive(Debug)]
pub struct VirtualLcd {
    state: Arc<Mutex<LcdState>>,
}

impl VirtualLcd {
    /// Create a 2x16 display with the backlight off.
    pub fn new() -> (Self, VirtualLcdHandle) {
        Self::with_size(LCD_ROWS, LCD_COLUMNS)
    }

    /// Create a display with custom dimensions.
    pub fn with_size(rows: usize, columns: usize) -> (Self, VirtualLcdHandle) {
        let state = Arc::new(Mutex::new(LcdState {
            rows,
            columns,
            buffer: vec![vec![' '; columns]; rows],
            backlight: false,
            transcript: VecDeque::with_capacity(TRANSCRIPT_LIMIT),
        }));

        (
            Self {
                state: Arc::clone(&state),
            },
            VirtualLcdHandle { state },
        )
    }

    fn state(&self) -> MutexGuard<'_, LcdState> {
        self.state.lock().unwrap_or_else(PoisonError::into_inner)
    }
}

impl DisplaySurface for VirtualLcd {
    fn clear(&mut self) -> Result<()> {
        self.state().blank();
        Ok(())
    }

    fn write_at(&mut self, row: usize, col: usize, text: &str) -> Result<()> {
        let mut state = self.state();

        if row >= state.rows || col >= state.columns {
            return Err(HardwareError::invalid_data(format!(
                "Cursor ({row}, {col}) outside {}x{} display",
                state.rows, state.columns
            )));
        }

        let rendered: Vec<char> = render(text).collect();
        let line = &mut state.buffer[row];
        for (cell, c) in line[col..].iter_mut().zip(rendered.iter()) {
            *cell = *c;
        }

        let written: String = rendered.into_iter().collect();
        if !written.trim().is_empty() {
            if state.transcript.len() == TRANSCRIPT_LIMIT {
                state.transcript.pop_front();
            }
            state.transcript.push_back(written.trim().to_string());
        }
        Ok(())
    }

    fn set_backlight(&mut self, on: bool) -> Result<()> {
        self.state().backlight = on;
        Ok(())
    }
}

/// Read-only view of a [`VirtualLcd`] for tests and the host emulator.
#[derive(Debug, Clone)]
pub struct VirtualLcdHandle {
    state: Arc<Mutex<LcdState>>,
}

impl VirtualLcdHandle {
    fn state(&self) -> MutexGuard<'_, LcdState> {
        self.state.lock().unwrap_or_else(PoisonError::into_inner)
    }

    /// Current content of `row`, padded to the display width.
    ///
    /// Returns an empty string for rows outside the display.
    pub fn line(&self, row: usize) -> String {
        self.state()
            .buffer
            .get(row)
            .map(|cells| cells.iter().collect())
            .unwrap_or_default()
    }

    /// All rows, padded to the display width.
    pub fn lines(&self) -> Vec<String> {
        self.state()
            .buffer
            .iter()
            .map(|cells| cells.iter().collect())
            .collect()
    }

    /// Whether the backlight is on.
    pub fn backlight(&self) -> bool {
        self.state().backlight
    }

    /// Recent non-blank texts written, trimmed, oldest first.
    pub fn transcript(&self) -> Vec<String> {
        self.state().transcript.iter().cloned().collect()
    }

    /// Whether any write still in the transcript contained `needle`.
    pub fn has_shown(&self, needle: &str) -> bool {
        self.state().transcript.iter().any(|t| t.contains(needle))
    }

    /// Forget the transcript, keeping the screen.
    pub fn clear_transcript(&self) {
        self.state().transcript.clear();
    }
}

/// Map text onto the display's character set.
fn render(text: &str) -> impl Iterator<Item = char> + '_ {
    text.chars().filter(|c| !c.is_control()).map(|c| {
        if c.is_ascii_graphic() || c == ' ' {
            c
        } else {
            UNPRINTABLE
        }
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_new_display_is_blank() {
        let (_lcd, handle) = VirtualLcd::new();

        assert_eq!(handle.lines(), vec![" ".repeat(16), " ".repeat(16)]);
        assert!(!handle.backlight());
        assert!(handle.transcript().is_empty());
    }

    #[test]
    fn test_write_overwrites_cells_in_place() {
        let (mut lcd, handle) = VirtualLcd::new();
        lcd.write_at(0, 0, "LOCKED 10").unwrap();
        lcd.write_at(0, 7, " 9").unwrap();

        assert_eq!(handle.line(0).trim_end(), "LOCKED  9");
    }

    #[test]
    fn test_text_past_last_column_is_dropped() {
        let (mut lcd, handle) = VirtualLcd::new();
        lcd.write_at(1, 10, "ABCDEFGHIJ").unwrap();

        assert_eq!(handle.line(1), format!("{}ABCDEF", " ".repeat(10)));
    }

    #[test]
    fn test_cursor_outside_display() {
        let (mut lcd, _handle) = VirtualLcd::new();

        assert!(lcd.write_at(2, 0, "X").is_err());
        assert!(lcd.write_at(0, 16, "X").is_err());
    }

    #[test]
    fn test_clear_keeps_transcript() {
        let (mut lcd, handle) = VirtualLcd::new();
        lcd.write_at(0, 0, "ACCESS GRANTED").unwrap();
        lcd.clear().unwrap();

        assert_eq!(handle.line(0).trim(), "");
        assert!(handle.has_shown("GRANTED"));

        handle.clear_transcript();
        assert!(!handle.has_shown("GRANTED"));
    }

    #[test]
    fn test_transcript_keeps_most_recent_writes() {
        let (mut lcd, handle) = VirtualLcd::new();
        for n in 0..TRANSCRIPT_LIMIT + 10 {
            lcd.write_at(0, 0, &format!("MSG {n}")).unwrap();
        }

        let transcript = handle.transcript();
        assert_eq!(transcript.len(), TRANSCRIPT_LIMIT);
        assert_eq!(transcript[0], "MSG 10");
        assert_eq!(
            transcript.last().map(String::as_str),
            Some(format!("MSG {}", TRANSCRIPT_LIMIT + 9).as_str())
        );
        assert!(!transcript.contains(&"MSG 9".to_string()));
    }

    #[test]
    fn test_non_ascii_rendered_as_placeholder() {
        let (mut lcd, handle) = VirtualLcd::new();
        lcd.write_at(0, 0, "Caf\u{e9}\n!").unwrap();

        assert_eq!(handle.line(0).trim_end(), "Caf?!");
    }

    #[test]
    fn test_backlight_toggle() {
        let (mut lcd, handle) = VirtualLcd::with_size(4, 20);
        lcd.set_backlight(true).unwrap();

        assert!(handle.backlight());
        assert_eq!(handle.lines().len(), 4);
        assert_eq!(handle.line(3).len(), 20);
    }
}
