//! The polling controller.
//!
//! [`Controller`] owns the peripherals, the audit log, the authentication
//! engine and the session, and advances all of them one step per
//! [`Controller::tick`]. There is no other thread and no timer: every wait
//! is a busy-poll through [`Clock::delay`], and all timing is measured on
//! the board's monotonic [`Clock::uptime`].
//!
//! # Loop iteration
//!
//! ```text
//! tick()
//!  ├─ lockout.tick(now) ── locked ──► countdown overlay, discard keys, return
//!  │        └─ just lifted ──► session.reset() (back to Selection)
//!  ├─ redraw the current mode's screen if needed
//!  ├─ dispatch on session mode (at most one attempt, at most one log append)
//!  └─ delay(poll_interval)
//! ```
//!
//! The door hold, admin challenge, enrollment captures and admin prompts
//! run to completion inside a single tick. `*` is not polled during the
//! door hold or while the sensor captures an enrollment image.
//!
//! # Examples
//!
//! ```
//! use doorlock_controller::Controller;
//! use doorlock_core::ControllerConfig;
//! use doorlock_hardware::mock::MockBoard;
//!
//! let rig = MockBoard::builder().build();
//! let mut controller =
//!     Controller::new(ControllerConfig::default(), rig.peripherals, rig.storage).unwrap();
//!
//! rig.handles.keypad.type_keys("2 1111 #").unwrap();
//! for _ in 0..6 {
//!     controller.tick().unwrap();
//! }
//!
//! assert_eq!(controller.audit_log().len(), 1);
//! assert_eq!(rig.handles.actuators.unlock_periods().len(), 1);
//! ```

mod admin;
mod prompt;

use std::time::Duration;

use doorlock_core::{ControllerConfig, User};
use doorlock_hardware::{
    Actuators, Board, Clock, DisplaySurface, FingerScan, FingerprintSensor, HardwareError, Key,
    KeyInput, Peripherals,
};
use doorlock_storage::AuditLog;
use tracing::{debug, info, warn};

use crate::auth::{AdminChallengeOutcome, Authenticator, FingerprintOutcome, PasswordOutcome};
use crate::display::Screen;
use crate::error::Result;
use crate::lockout::LockStatus;
use crate::session::{Session, SessionMode, SessionState};

/// Length of the success beep.
const SUCCESS_TONE: Duration = Duration::from_millis(100);

/// Length of the error buzz.
const ERROR_TONE: Duration = Duration::from_millis(500);

/// Door-lock access controller for one board.
pub struct Controller<B: Board> {
    config: ControllerConfig,
    hw: Peripherals<B>,
    log: AuditLog<B::Storage>,
    auth: Authenticator,
    session: Session,
    /// Seconds currently shown by the lockout countdown, while it is up.
    overlay: Option<u64>,
    /// Whether the current mode's screen must be drawn again.
    redraw: bool,
}

impl<B: Board> Controller<B> {
    /// Create a controller and rehydrate the audit log from `storage`.
    ///
    /// The boot self-check is not part of this; run
    /// [`crate::boot::self_check`] first.
    ///
    /// # Errors
    ///
    /// Returns an error if `storage` is too small for the log, a read
    /// fails, or the backlight cannot be switched on.
    pub fn new(
        config: ControllerConfig,
        mut hw: Peripherals<B>,
        storage: B::Storage,
    ) -> Result<Self> {
        let log = AuditLog::load(storage)?;
        hw.display.set_backlight(true)?;

        info!(
            entries = log.len(),
            lockout_threshold = config.lockout_threshold,
            "Controller ready"
        );

        Ok(Self {
            auth: Authenticator::from_config(&config),
            config,
            hw,
            log,
            session: Session::new(),
            overlay: None,
            redraw: true,
        })
    }

    /// Run the loop until a device fails.
    ///
    /// # Errors
    ///
    /// Returns the first error [`Controller::tick`] reports.
    pub fn run(&mut self) -> Result<()> {
        loop {
            self.tick()?;
        }
    }

    /// One iteration of the control loop.
    ///
    /// # Errors
    ///
    /// Returns an error if a peripheral fails in a way the session cannot
    /// absorb (disconnects, display write failures). Sensor capture faults
    /// and audit log write failures are handled and never returned.
    pub fn tick(&mut self) -> Result<()> {
        let now = self.hw.clock.uptime();

        // The window can run out inside a blocking step, before the
        // countdown was ever drawn
        let was_locked = self.auth.lockout().is_locked();
        match self.auth.lockout_mut().tick(now) {
            LockStatus::LockedWithRemaining(remaining) => {
                self.show_countdown(remaining)?;
                self.hw.clock.delay(self.config.poll_interval());
                return Ok(());
            }
            LockStatus::Unlocked => {
                let overlay_shown = self.overlay.take().is_some();
                if was_locked || overlay_shown {
                    info!("Lockout expired");
                    self.session.reset(now);
                    self.redraw = true;
                }
            }
        }

        if self.redraw {
            self.redraw = false;
            self.render_mode()?;
        }

        match self.session.mode() {
            SessionMode::Selection => self.on_selection()?,
            SessionMode::FingerprintWait => self.on_fingerprint_wait()?,
            SessionMode::PasswordEntry => self.on_password_entry()?,
            SessionMode::AdminMenu => self.on_admin_menu()?,
            SessionMode::AdminManageFingerprints => self.on_manage_fingerprints()?,
            SessionMode::AdminManagePasswords => self.on_manage_passwords()?,
            SessionMode::AdminClearConfirm => self.on_clear_confirm()?,
            // Entered and left within one tick
            SessionMode::AdminViewLog => self.enter(SessionState::AdminMenu)?,
        }

        self.hw.clock.delay(self.config.poll_interval());
        Ok(())
    }

    pub fn config(&self) -> &ControllerConfig {
        &self.config
    }

    pub fn session(&self) -> &Session {
        &self.session
    }

    pub fn authenticator(&self) -> &Authenticator {
        &self.auth
    }

    pub fn audit_log(&self) -> &AuditLog<B::Storage> {
        &self.log
    }

    /// Whether the lockout countdown is on the display.
    pub fn is_locked_out(&self) -> bool {
        self.overlay.is_some()
    }

    /// Give back the peripherals and the audit log.
    pub fn into_parts(self) -> (Peripherals<B>, AuditLog<B::Storage>) {
        (self.hw, self.log)
    }

    fn show_countdown(&mut self, remaining: Duration) -> Result<()> {
        // Keys typed while locked are discarded, not queued
        while self.hw.keypad.poll_key()?.is_some() {}

        let secs = remaining.as_secs();
        if self.overlay != Some(secs) {
            Screen::Locked {
                remaining_secs: secs,
            }
            .render(&mut self.hw.display)?;
            self.overlay = Some(secs);
        }
        Ok(())
    }

    fn render_mode(&mut self) -> Result<()> {
        let screen = match self.session.state() {
            SessionState::Selection => Screen::Selection,
            SessionState::FingerprintWait => Screen::FingerprintWait,
            SessionState::PasswordEntry(buffer) => Screen::PasswordEntry {
                typed: buffer.len(),
            },
            SessionState::AdminMenu | SessionState::AdminViewLog => Screen::AdminMenu,
            SessionState::AdminManageFingerprints => Screen::FingerprintMenu,
            SessionState::AdminManagePasswords => Screen::PasswordMenu,
            SessionState::AdminClearConfirm => Screen::ConfirmClear,
        };
        screen.render(&mut self.hw.display)?;
        Ok(())
    }

    fn on_selection(&mut self) -> Result<()> {
        match self.hw.keypad.poll_key()? {
            Some(Key::Digit(1)) => self.enter(SessionState::FingerprintWait),
            Some(Key::Digit(2)) => self.enter(SessionState::password_entry()),
            Some(Key::Letter('A')) => self.admin_challenge(),
            Some(Key::Letter('B')) => {
                let now = self.hw.clock.now();
                self.show_for(Screen::Clock(now))?;
                self.redraw = true;
                Ok(())
            }
            _ => Ok(()),
        }
    }

    fn on_fingerprint_wait(&mut self) -> Result<()> {
        if self.hw.keypad.poll_key()? == Some(Key::Star) {
            return self.enter(SessionState::Selection);
        }

        let scan = self.poll_sensor()?;
        let now = self.hw.clock.uptime();
        match self.auth.try_fingerprint(scan, now) {
            FingerprintOutcome::Granted(user) => self.on_granted(user),
            FingerprintOutcome::UnknownFinger => self.on_denied(Screen::Denied),
            FingerprintOutcome::NoFingerPresent => Ok(()),
        }
    }

    fn on_password_entry(&mut self) -> Result<()> {
        let Some(key) = self.hw.keypad.poll_key()? else {
            return Ok(());
        };
        let Some(buffer) = self.session.password_buffer() else {
            return Ok(());
        };

        match key {
            Key::Star if buffer.is_empty() => self.enter(SessionState::Selection),
            Key::Star => {
                buffer.clear();
                self.redraw = true;
                Ok(())
            }
            Key::Hash => {
                let input = buffer.take();
                let now = self.hw.clock.uptime();
                match self.auth.try_password(&input, now) {
                    PasswordOutcome::Granted(user) => self.on_granted(user),
                    PasswordOutcome::Denied => self.on_denied(Screen::Denied),
                }
            }
            Key::Letter('A') if buffer.is_empty() => {
                self.change_password(false)?;
                self.enter(SessionState::Selection)
            }
            key if key.is_password_char() => {
                if buffer.push(key.as_char()) {
                    self.redraw = true;
                }
                Ok(())
            }
            _ => Ok(()),
        }
    }

    fn on_admin_menu(&mut self) -> Result<()> {
        match self.hw.keypad.poll_key()? {
            Some(Key::Digit(1)) => self.enter(SessionState::AdminManageFingerprints),
            Some(Key::Digit(2)) => self.enter(SessionState::AdminManagePasswords),
            Some(Key::Digit(3)) => self.view_log(),
            Some(Key::Digit(4)) => self.enter(SessionState::AdminClearConfirm),
            Some(Key::Star) => {
                info!("Admin session closed");
                self.enter(SessionState::Selection)
            }
            _ => Ok(()),
        }
    }

    /// Timed admin fingerprint challenge, started from the main menu.
    ///
    /// Blocks until a finger is presented or the challenge times out.
    fn admin_challenge(&mut self) -> Result<()> {
        Screen::AdminChallenge.render(&mut self.hw.display)?;
        let started = self.hw.clock.uptime();
        let timeout = self.config.admin_challenge_timeout();

        let outcome = loop {
            let scan = self.poll_sensor()?;
            let now = self.hw.clock.uptime();
            if let Some(outcome) = self.auth.try_admin_finger(scan, started, timeout, now) {
                break outcome;
            }
            self.hw.clock.delay(self.config.poll_interval());
        };

        match outcome {
            AdminChallengeOutcome::Granted => self.on_granted(User::Admin),
            AdminChallengeOutcome::WrongFinger => self.on_denied(Screen::NotAdmin),
            AdminChallengeOutcome::UnknownFinger => self.on_denied(Screen::Denied),
            AdminChallengeOutcome::TimedOut => {
                self.show_for(Screen::TimedOut)?;
                self.redraw = true;
                Ok(())
            }
        }
    }

    /// Success flow: feedback, then either open the admin session or log
    /// the access and cycle the door.
    fn on_granted(&mut self, user: User) -> Result<()> {
        self.feedback(true)?;

        if user.is_admin() {
            self.session.grant_admin();
            info!("Admin session opened");
            self.show_for(Screen::AdminWelcome)?;
            return self.enter(SessionState::AdminMenu);
        }

        let stamp = self.hw.clock.now();
        if let Err(error) = self.log.append(user.label(), stamp) {
            warn!(%error, user = user.label(), "Audit record not written");
        }

        Screen::Granted(user).render(&mut self.hw.display)?;
        self.cycle_door()?;
        self.enter(SessionState::Selection)
    }

    /// Failure flow. The session stays where it is; if this failure
    /// engaged the lockout the next tick raises the countdown.
    fn on_denied(&mut self, screen: Screen<'_>) -> Result<()> {
        self.feedback(false)?;
        self.show_for(screen)?;
        self.redraw = true;
        Ok(())
    }

    /// Energize the strike for the hold time, then release it.
    ///
    /// Blocking: no input is read while the door is open.
    fn cycle_door(&mut self) -> Result<()> {
        self.hw.actuators.set_unlock(true)?;
        self.hw.actuators.set_status_led(true)?;
        info!(hold_secs = self.config.unlock_hold_secs, "Door unlocked");

        self.hw.clock.delay(self.config.unlock_hold());

        self.hw.actuators.set_unlock(false)?;
        self.hw.actuators.set_status_led(false)?;
        debug!("Door released");
        Ok(())
    }

    fn feedback(&mut self, success: bool) -> Result<()> {
        let hz = self.config.feedback_tone_hz;
        if success {
            self.hw.actuators.play_tone(hz, SUCCESS_TONE)?;
        } else {
            self.hw.actuators.play_tone(hz / 2, ERROR_TONE)?;
        }
        Ok(())
    }

    /// Show `screen` for the configured message time.
    fn show_for(&mut self, screen: Screen<'_>) -> Result<()> {
        screen.render(&mut self.hw.display)?;
        self.hw.clock.delay(self.config.message_duration());
        Ok(())
    }

    /// Poll the sensor once. A capture fault is shown with its code and
    /// reads as "no finger"; any other sensor error is returned.
    fn poll_sensor(&mut self) -> Result<Option<FingerScan>> {
        match self.hw.sensor.capture_and_identify() {
            Ok(scan) => Ok(scan),
            Err(error) => {
                self.report_sensor_error(error)?;
                Ok(None)
            }
        }
    }

    /// Show a sensor capture fault, or pass on any other hardware error.
    fn report_sensor_error(&mut self, error: HardwareError) -> Result<()> {
        let Some(fault) = error.sensor_fault() else {
            return Err(error.into());
        };

        warn!(%fault, code = fault.code(), "Fingerprint sensor fault");
        self.feedback(false)?;
        self.show_for(Screen::SensorFault { code: fault.code() })?;
        self.redraw = true;
        Ok(())
    }

    /// Move the session to `next` and schedule a redraw.
    fn enter(&mut self, next: SessionState) -> Result<()> {
        let now = self.hw.clock.uptime();
        self.session.transition_to(next, now)?;
        self.redraw = true;
        Ok(())
    }
}
