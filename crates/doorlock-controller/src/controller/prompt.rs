//! Blocking keypad prompts used by the admin sub-flows.
//!
//! A prompt owns the loop until it is answered, cancelled with `*`, or left
//! idle for the configured prompt timeout.

use doorlock_core::{User, constants::MAX_PASSWORD_LEN};
use doorlock_hardware::{Board, Clock, Key, KeyInput};
use tracing::debug;

use super::Controller;
use crate::display::{Screen, mask};
use crate::error::Result;

/// How a text prompt ended.
#[derive(Debug, Clone, PartialEq, Eq)]
pub(super) enum Answer {
    /// `#` pressed; what was typed.
    Entered(String),
    /// `*` pressed on an empty line.
    Cancelled,
    TimedOut,
}

impl Answer {
    pub(super) fn entered(self) -> Option<String> {
        match self {
            Self::Entered(text) => Some(text),
            Self::Cancelled | Self::TimedOut => None,
        }
    }
}

/// Whether typed text is echoed or masked.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub(super) enum Echo {
    Plain,
    Masked,
}

impl<B: Board> Controller<B> {
    /// Wait for the next key, giving up after the prompt timeout.
    pub(super) fn wait_key(&mut self) -> Result<Option<Key>> {
        let started = self.hw.clock.uptime();
        let timeout = self.config.prompt_timeout();

        loop {
            if let Some(key) = self.hw.keypad.poll_key()? {
                return Ok(Some(key));
            }
            if self.hw.clock.uptime().saturating_sub(started) >= timeout {
                debug!("Prompt timed out");
                return Ok(None);
            }
            self.hw.clock.delay(self.config.poll_interval());
        }
    }

    /// Read up to `max_len` keypad characters under `title`.
    ///
    /// `*` clears the line, or cancels when the line is already empty;
    /// `#` submits. The timeout restarts with every key.
    pub(super) fn read_text(&mut self, title: &str, echo: Echo, max_len: usize) -> Result<Answer> {
        let max_len = max_len.min(MAX_PASSWORD_LEN);
        let mut text = String::new();

        loop {
            let shown = match echo {
                Echo::Plain => text.clone(),
                Echo::Masked => mask(text.len()),
            };
            Screen::Prompt {
                title,
                input: &shown,
            }
            .render(&mut self.hw.display)?;

            let Some(key) = self.wait_key()? else {
                return Ok(Answer::TimedOut);
            };
            match key {
                Key::Hash => return Ok(Answer::Entered(text)),
                Key::Star if text.is_empty() => return Ok(Answer::Cancelled),
                Key::Star => text.clear(),
                key if key.is_password_char() && text.len() < max_len => text.push(key.as_char()),
                _ => {}
            }
        }
    }

    /// Ask for a household member by roster digit (1 = Admin .. 5 = Daughter).
    ///
    /// Returns `None` on `*` or timeout. Other keys are ignored.
    pub(super) fn select_user(&mut self) -> Result<Option<User>> {
        Screen::Prompt {
            title: "SELECT USER 1-5",
            input: "*:Cancel",
        }
        .render(&mut self.hw.display)?;

        loop {
            match self.wait_key()? {
                None | Some(Key::Star) => return Ok(None),
                Some(Key::Digit(d)) => {
                    if let Ok(user) = User::from_selection(d) {
                        return Ok(Some(user));
                    }
                }
                Some(_) => {}
            }
        }
    }

    /// Ask a yes/no question: `#` confirms, `*` or timeout declines.
    pub(super) fn confirm(&mut self, question: &str) -> Result<bool> {
        Screen::Prompt {
            title: question,
            input: "#:Yes *:No",
        }
        .render(&mut self.hw.display)?;

        loop {
            match self.wait_key()? {
                Some(Key::Hash) => return Ok(true),
                None | Some(Key::Star) => return Ok(false),
                Some(_) => {}
            }
        }
    }
}
