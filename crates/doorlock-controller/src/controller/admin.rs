//! Admin sub-menus and their flows.

use doorlock_core::{FingerprintId, Password, User};
use doorlock_hardware::{
    Board, Clock, FingerprintSensor, HardwareError, Key, KeyInput, TemplateSlot,
};
use doorlock_storage::LogRecord;
use tracing::{info, warn};

use super::Controller;
use super::prompt::Echo;
use crate::display::Screen;
use crate::error::Result;
use crate::session::SessionState;

/// Digits typed for a template identifier (1-127).
const ID_DIGITS: usize = 3;

impl<B: Board> Controller<B> {
    pub(super) fn on_manage_fingerprints(&mut self) -> Result<()> {
        match self.hw.keypad.poll_key()? {
            Some(Key::Digit(1)) => {
                self.enroll_fingerprint()?;
                self.redraw = true;
                Ok(())
            }
            Some(Key::Digit(2)) => {
                self.delete_fingerprint()?;
                self.redraw = true;
                Ok(())
            }
            Some(Key::Star) => self.enter(SessionState::AdminMenu),
            _ => Ok(()),
        }
    }

    pub(super) fn on_manage_passwords(&mut self) -> Result<()> {
        match self.hw.keypad.poll_key()? {
            Some(Key::Digit(1)) => {
                self.change_password(true)?;
                self.redraw = true;
                Ok(())
            }
            Some(Key::Digit(2)) => {
                self.delete_password()?;
                self.redraw = true;
                Ok(())
            }
            Some(Key::Star) => self.enter(SessionState::AdminMenu),
            _ => Ok(()),
        }
    }

    pub(super) fn on_clear_confirm(&mut self) -> Result<()> {
        match self.hw.keypad.poll_key()? {
            Some(Key::Hash) => {
                if let Err(error) = self.log.clear_all() {
                    warn!(%error, "Audit log not cleared");
                    self.feedback(false)?;
                    self.show_for(Screen::Notice("CLEAR FAILED", ""))?;
                } else {
                    self.feedback(true)?;
                    self.show_for(Screen::LogCleared)?;
                }
                self.enter(SessionState::AdminMenu)
            }
            Some(Key::Star) => self.enter(SessionState::AdminMenu),
            _ => Ok(()),
        }
    }

    /// Show the log newest first, one record per message time.
    pub(super) fn view_log(&mut self) -> Result<()> {
        self.enter(SessionState::AdminViewLog)?;

        let records: Vec<LogRecord> = self.log.list_recent().cloned().collect();
        if records.is_empty() {
            self.show_for(Screen::LogEmpty)?;
        }
        for (index, record) in records.iter().enumerate() {
            self.show_for(Screen::LogEntry {
                position: index + 1,
                record,
            })?;
        }

        self.enter(SessionState::AdminMenu)
    }

    /// Enroll a new template under an identifier typed by the admin.
    ///
    /// The identifier is range-checked before the sensor is touched. Once
    /// the first capture starts the flow cannot be cancelled.
    fn enroll_fingerprint(&mut self) -> Result<()> {
        let Some(id) = self.read_fingerprint_id("ENROLL ID 1-127")? else {
            return Ok(());
        };

        match self.run_enrollment(id) {
            Ok(true) => {
                self.auth.credentials_mut().enroll(id);
                info!(id = id.as_u16(), "Fingerprint enrolled");
                self.feedback(true)?;
                self.show_for(Screen::Notice("ENROLLED", &format!("ID {id}")))
            }
            Ok(false) => {
                warn!(id = id.as_u16(), "Sensor refused to store template");
                self.feedback(false)?;
                self.show_for(Screen::Notice("ENROLL FAILED", ""))
            }
            Err(error) => self.report_sensor_error(error),
        }
    }

    fn run_enrollment(&mut self, id: FingerprintId) -> std::result::Result<bool, HardwareError> {
        self.hw.sensor.begin_enroll(id)?;

        Screen::Notice("PLACE FINGER", "").render(&mut self.hw.display)?;
        self.hw.sensor.capture_template(TemplateSlot::First)?;

        Screen::Notice("REMOVE FINGER", "").render(&mut self.hw.display)?;
        while self.hw.sensor.is_finger_present()? {
            self.hw.clock.delay(self.config.poll_interval());
        }

        Screen::Notice("PLACE AGAIN", "").render(&mut self.hw.display)?;
        self.hw.sensor.capture_template(TemplateSlot::Second)?;

        self.hw.sensor.commit()
    }

    /// Delete a template. Deleting the admin's template asks for the admin
    /// password first.
    fn delete_fingerprint(&mut self) -> Result<()> {
        let Some(id) = self.read_fingerprint_id("DELETE ID 1-127")? else {
            return Ok(());
        };

        if id == User::Admin.fingerprint_id() {
            let answer = self.read_text("ADMIN PASSWORD", Echo::Masked, usize::MAX)?;
            let Some(typed) = answer.entered() else {
                return Ok(());
            };
            if !self.auth.credentials().password(User::Admin).matches(&typed) {
                warn!("Admin template deletion refused: wrong password");
                self.feedback(false)?;
                return self.show_for(Screen::Notice("WRONG PASSWORD", ""));
            }
        }

        match self.hw.sensor.delete(id) {
            Ok(found) => {
                // Keep the store in step with the sensor either way
                self.auth.credentials_mut().remove(id);
                info!(id = id.as_u16(), found, "Fingerprint deleted");
                self.feedback(found)?;
                let screen = if found {
                    Screen::Notice("DELETED", "")
                } else {
                    Screen::Notice("NOT FOUND", "")
                };
                self.show_for(screen)
            }
            Err(error) => self.report_sensor_error(error),
        }
    }

    /// Change a user's password.
    ///
    /// Outside an admin session (the password-entry `A` shortcut) a user
    /// with no password cannot be given one here, and the old password is
    /// always required. Wrong old passwords are not counted by the lockout.
    pub(super) fn change_password(&mut self, admin_session: bool) -> Result<()> {
        let Some(user) = self.select_user()? else {
            return Ok(());
        };

        let current = self.auth.credentials().password(user).clone();
        if current.is_disabled() {
            if !admin_session {
                self.feedback(false)?;
                return self.show_for(Screen::Notice("NO PASSWORD SET", user.label()));
            }
        } else {
            let Some(old) = self.read_text("OLD PASSWORD", Echo::Masked, usize::MAX)?.entered()
            else {
                return Ok(());
            };
            if !current.matches(&old) {
                warn!(user = user.label(), "Password change refused: wrong old password");
                self.feedback(false)?;
                return self.show_for(Screen::Notice("WRONG PASSWORD", ""));
            }
        }

        let answer = self.read_text("NEW PASSWORD", Echo::Masked, usize::MAX)?;
        let Some(new) = answer.entered() else {
            return Ok(());
        };
        if new.is_empty() {
            self.feedback(false)?;
            return self.show_for(Screen::Notice("EMPTY PASSWORD", ""));
        }

        self.auth
            .credentials_mut()
            .set_password(user, Password::new(new)?);
        self.feedback(true)?;
        self.show_for(Screen::Notice("PASSWORD SET", user.label()))
    }

    fn delete_password(&mut self) -> Result<()> {
        let Some(user) = self.select_user()? else {
            return Ok(());
        };

        let question = format!("DELETE {}?", user.label());
        if self.confirm(&question)? {
            self.auth.credentials_mut().clear_password(user);
            self.feedback(true)?;
            self.show_for(Screen::Notice("PASS DELETED", user.label()))?;
        }
        Ok(())
    }

    /// Prompt for a template identifier and range-check it.
    fn read_fingerprint_id(&mut self, title: &str) -> Result<Option<FingerprintId>> {
        let Some(typed) = self.read_text(title, Echo::Plain, ID_DIGITS)?.entered() else {
            return Ok(None);
        };

        match typed.parse::<FingerprintId>() {
            Ok(id) => Ok(Some(id)),
            Err(error) => {
                warn!(%error, typed = %typed, "Fingerprint identifier rejected");
                self.feedback(false)?;
                self.show_for(Screen::Notice("INVALID ID", "1-127"))?;
                Ok(None)
            }
        }
    }
}
