//! Shared harness for controller scenario tests.
//!
//! A [`Bench`] is a controller on a mock board plus the handles that drive
//! it. Keys are queued up front with [`Bench::keys`]; each tick consumes at
//! most one of them, except inside blocking prompts which read as many as
//! they need.

#![allow(dead_code)]

use doorlock_controller::{Controller, SessionMode};
use doorlock_core::{ControllerConfig, User};
use doorlock_hardware::mock::{MockBoard, MockBoardBuilder, MockHandles};

pub struct Bench {
    pub controller: Controller<MockBoard>,
    pub handles: MockHandles,
}

impl Bench {
    /// Factory board: templates 1-5 enrolled, erased EEPROM.
    pub fn new() -> Self {
        Self::from_builder(MockBoard::builder())
    }

    pub fn from_builder(builder: MockBoardBuilder) -> Self {
        Self::with_config(ControllerConfig::default(), builder)
    }

    /// Factory board run with `config` as given, unvalidated.
    pub fn with_config(config: ControllerConfig, builder: MockBoardBuilder) -> Self {
        let rig = builder.build();
        let controller = Controller::new(config, rig.peripherals, rig.storage)
            .expect("controller starts on a mock board");
        Self {
            controller,
            handles: rig.handles,
        }
    }

    /// Queue keypad input; whitespace is ignored.
    pub fn keys(&self, keys: &str) {
        self.handles.keypad.type_keys(keys).expect("valid keys");
    }

    pub fn tick(&mut self) {
        self.controller.tick().expect("tick succeeds");
    }

    pub fn ticks(&mut self, n: usize) {
        for _ in 0..n {
            self.tick();
        }
    }

    /// Tick until `done` holds, failing after `max` ticks.
    pub fn tick_until(&mut self, max: usize, done: impl Fn(&Controller<MockBoard>) -> bool) {
        for _ in 0..max {
            if done(&self.controller) {
                return;
            }
            self.tick();
        }
        assert!(done(&self.controller), "condition not reached in {max} ticks");
    }

    /// Log in with the admin password; leaves the admin menu on screen.
    pub fn login_admin(&mut self) {
        self.keys("2 9999 #");
        self.ticks(7);
        assert_eq!(self.mode(), SessionMode::AdminMenu);
    }

    /// Type `password` from the main menu and submit it.
    pub fn submit_password(&mut self, password: &str) {
        self.keys("2");
        self.keys(password);
        self.keys("#");
        self.ticks(password.chars().count() + 2);
    }

    pub fn mode(&self) -> SessionMode {
        self.controller.session().mode()
    }

    pub fn logged_labels(&self) -> Vec<String> {
        self.controller
            .audit_log()
            .list_recent()
            .map(|r| r.label().to_string())
            .collect()
    }

    pub fn screen(&self) -> (String, String) {
        (
            self.handles.lcd.line(0).trim().to_string(),
            self.handles.lcd.line(1).trim().to_string(),
        )
    }

    pub fn has_password(&self, user: User) -> bool {
        !self
            .controller
            .authenticator()
            .credentials()
            .password(user)
            .is_disabled()
    }
}
