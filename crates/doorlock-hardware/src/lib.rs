//! Peripheral abstraction layer for the doorlock access controller.
//!
//! This crate defines the synchronous capability traits the controller is
//! written against (display, keypad, fingerprint sensor, clock, actuators and
//! byte storage) together with the value types exchanged over them.
//!
//! # Boards
//!
//! A platform provides one implementation of each trait and ties them
//! together with a [`Board`]. The `mock` feature (enabled by default)
//! supplies [`mock::MockBoard`], built entirely from programmable devices
//! that tests and the host emulator drive through cloneable handles:
//!
//! ```
//! use doorlock_hardware::mock::MockBoard;
//! use doorlock_hardware::traits::KeyInput;
//! use doorlock_hardware::Key;
//!
//! let mut rig = MockBoard::builder().build();
//! rig.handles.keypad.type_keys("2").unwrap();
//!
//! assert_eq!(rig.peripherals.keypad.poll_key().unwrap(), Some(Key::Digit(2)));
//! ```
//!
//! # Error Handling
//!
//! All fallible operations return [`Result<T>`][error::Result] with a
//! [`HardwareError`]. Fingerprint sensor failures carry a [`SensorFault`]
//! whose numeric code is what the controller shows to the user.

pub mod error;
#[cfg(feature = "mock")]
pub mod mock;
pub mod traits;
pub mod types;

// Re-export commonly used types for convenience
pub use error::{HardwareError, Result};
pub use traits::{
    Actuators, Board, ByteStorage, Clock, DisplaySurface, FingerprintSensor, KeyInput, Peripherals,
};
pub use types::{FingerScan, Key, SensorFault, TemplateSlot};
