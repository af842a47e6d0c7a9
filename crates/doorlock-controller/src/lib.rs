//! Door-lock access controller.
//!
//! This crate holds the decision-making part of the lock: who may open the
//! door, when the keypad is locked out, what the session is doing, and what
//! the display shows. It drives the peripherals of any [`Board`] through
//! the capability traits of `doorlock-hardware` and persists access events
//! through `doorlock-storage`.
//!
//! ```text
//! Controller::tick
//!   ├── LockoutPolicy      consecutive-failure lockout, countdown overlay
//!   ├── Session            Selection / credential entry / admin sub-menus
//!   ├── Authenticator      password, fingerprint and admin challenge
//!   │     └── CredentialStore
//!   └── AuditLog           last ten granted accesses, in EEPROM
//! ```
//!
//! Credentials are kept in memory only and revert to the configured table
//! on power-up.
//!
//! [`Board`]: doorlock_hardware::Board

pub mod auth;
pub mod boot;
pub mod controller;
pub mod credentials;
pub mod display;
pub mod error;
pub mod lockout;
pub mod session;

pub use auth::{AdminChallengeOutcome, Authenticator, FingerprintOutcome, PasswordOutcome};
pub use boot::{BootFault, FaultIndicator, self_check};
pub use controller::Controller;
pub use credentials::CredentialStore;
pub use display::{Alignment, Screen, align_text, mask, truncate_text};
pub use error::{ControllerError, Result};
pub use lockout::{LockStatus, LockoutPolicy};
pub use session::{PasswordBuffer, Session, SessionMode, SessionState, StateTransition};
