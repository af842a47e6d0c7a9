//! Peripheral capability traits.
//!
//! This module defines the contract between the controller core and the
//! physical peripherals of the door: character display, matrix keypad,
//! fingerprint sensor, real-time clock, relay/LED/buzzer outputs and the
//! EEPROM holding the audit log. Each trait has one implementation per
//! platform plus a programmable mock in [`crate::mock`].
//!
//! All methods are synchronous. The controller runs a single cooperative
//! polling loop, so "waiting" is a busy-poll with [`Clock::delay`] between
//! polls rather than a suspend point.

use std::time::Duration;

use doorlock_core::{FingerprintId, Timestamp};

use crate::error::Result;
use crate::types::{FingerScan, Key, TemplateSlot};

/// Character display (16x2 LCD on the reference board).
///
/// # Examples
///
/// ```
/// use doorlock_hardware::traits::DisplaySurface;
/// use doorlock_hardware::Result;
///
/// fn show_ready<D: DisplaySurface>(lcd: &mut D) -> Result<()> {
///     lcd.clear()?;
///     lcd.write_at(0, 0, "1:Finger 2:Code")?;
///     lcd.write_at(1, 0, "A:Admin  B:Time")
/// }
/// ```
pub trait DisplaySurface {
    /// Blank every cell.
    fn clear(&mut self) -> Result<()>;

    /// Write `text` starting at `row`, `col`. Text running past the last
    /// column is dropped.
    ///
    /// # Errors
    ///
    /// Returns an error if `row` or `col` is outside the display.
    fn write_at(&mut self, row: usize, col: usize, text: &str) -> Result<()>;

    /// Switch the backlight.
    fn set_backlight(&mut self, on: bool) -> Result<()>;
}

/// Matrix keypad.
pub trait KeyInput {
    /// Return the next pressed key, or `None` when nothing was pressed.
    ///
    /// Never blocks.
    ///
    /// # Errors
    ///
    /// Returns an error if the keypad is disconnected.
    fn poll_key(&mut self) -> Result<Option<Key>>;
}

/// Optical fingerprint sensor with an on-board template library.
///
/// # Examples
///
/// ```
/// use doorlock_hardware::traits::FingerprintSensor;
/// use doorlock_hardware::{FingerScan, Result};
///
/// fn matched_id<F: FingerprintSensor>(sensor: &mut F) -> Result<Option<u16>> {
///     Ok(match sensor.capture_and_identify()? {
///         Some(FingerScan::Matched { id, .. }) => Some(id),
///         _ => None,
///     })
/// }
/// ```
pub trait FingerprintSensor {
    /// Start-up handshake (password/handshake packet on real hardware).
    ///
    /// # Errors
    ///
    /// Returns an error if the sensor does not answer.
    fn verify(&mut self) -> Result<()>;

    /// Image whatever is on the sensor and search the template library.
    ///
    /// Returns `Ok(None)` when no finger is present.
    ///
    /// # Errors
    ///
    /// Returns a sensor fault if imaging or searching fails.
    fn capture_and_identify(&mut self) -> Result<Option<FingerScan>>;

    /// Whether a finger currently rests on the sensor.
    fn is_finger_present(&mut self) -> Result<bool>;

    /// Begin enrolling a template into slot `id`.
    fn begin_enroll(&mut self, id: FingerprintId) -> Result<()>;

    /// Capture one enrollment image into `slot`.
    ///
    /// Blocks inside the driver until a finger has been imaged or the
    /// sensor reports a fault.
    fn capture_template(&mut self, slot: TemplateSlot) -> Result<()>;

    /// Combine both captures and store the template.
    ///
    /// Returns `false` if the sensor refused to store it.
    fn commit(&mut self) -> Result<bool>;

    /// Delete the template in slot `id`.
    ///
    /// Returns `false` if the slot was empty.
    fn delete(&mut self, id: FingerprintId) -> Result<bool>;
}

/// Battery-backed real-time clock plus the board's busy-wait delay.
pub trait Clock {
    /// Start-up check that the oscillator is running.
    ///
    /// # Errors
    ///
    /// Returns an error if the clock is missing or stopped.
    fn verify(&mut self) -> Result<()>;

    /// Current wall-clock time. Only meaningful after [`Clock::verify`].
    fn now(&self) -> Timestamp;

    /// Monotonic time since power-on. Used for timeouts and the lockout
    /// window so that setting the wall clock never shortens either.
    fn uptime(&self) -> Duration;

    /// Busy-wait for `duration`.
    fn delay(&mut self, duration: Duration);
}

/// Relay, status LED and buzzer.
pub trait Actuators {
    /// Energize (`true`) or release the door strike relay.
    fn set_unlock(&mut self, on: bool) -> Result<()>;

    /// Switch the status LED.
    fn set_status_led(&mut self, on: bool) -> Result<()>;

    /// Start a tone. Does not block.
    fn play_tone(&mut self, frequency_hz: u32, duration: Duration) -> Result<()>;
}

/// Byte-addressable non-volatile storage (EEPROM).
///
/// Writes are durable once `write` returns. There are no transactions:
/// a power cut between two writes leaves the first one in place.
pub trait ByteStorage {
    /// Size of the device in bytes.
    fn capacity(&self) -> usize;

    /// Read one byte.
    ///
    /// # Errors
    ///
    /// Returns `AddressOutOfRange` past the end of the device.
    fn read(&self, address: usize) -> Result<u8>;

    /// Write one byte.
    ///
    /// # Errors
    ///
    /// Returns `AddressOutOfRange` past the end of the device.
    fn write(&mut self, address: usize, byte: u8) -> Result<()>;
}

/// Bundle of peripheral types making up one physical board.
///
/// The controller is generic over a `Board` rather than over each
/// peripheral, so a platform is chosen with a single type parameter.
pub trait Board {
    type Display: DisplaySurface;
    type Keypad: KeyInput;
    type Sensor: FingerprintSensor;
    type Clock: Clock;
    type Actuators: Actuators;
    type Storage: ByteStorage;
}

/// Owned peripherals of a [`Board`], except storage (owned by the audit log).
pub struct Peripherals<B: Board> {
    pub display: B::Display,
    pub keypad: B::Keypad,
    pub sensor: B::Sensor,
    pub clock: B::Clock,
    pub actuators: B::Actuators,
}

impl<B: Board> Peripherals<B> {
    pub fn new(
        display: B::Display,
        keypad: B::Keypad,
        sensor: B::Sensor,
        clock: B::Clock,
        actuators: B::Actuators,
    ) -> Self {
        Self {
            display,
            keypad,
            sensor,
            clock,
            actuators,
        }
    }
}
