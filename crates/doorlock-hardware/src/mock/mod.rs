//! Mock device implementations for testing and development.
//!
//! This module provides simulated device implementations that can be controlled
//! programmatically without requiring physical hardware. [`MockBoard`] bundles
//! one of each into a complete board.

pub mod actuators;
pub mod biometric;
pub mod clock;
pub mod display;
pub mod eeprom;
pub mod keypad;

// Re-export commonly used types
pub use actuators::{ActuatorEvent, MockActuators, MockActuatorsHandle};
pub use biometric::{MockBiometric, MockBiometricHandle, ScanEvent};
pub use clock::{MockClock, MockClockHandle};
pub use display::{VirtualLcd, VirtualLcdHandle};
pub use eeprom::MemoryStorage;
pub use keypad::{MockKeypad, MockKeypadHandle};

use chrono::NaiveDateTime;
use doorlock_core::{User, constants::LOG_FOOTPRINT};

use crate::traits::{Board, Peripherals};

/// Board made entirely of mock devices.
#[derive(Debug, Clone, Copy, Default)]
pub struct MockBoard;

impl Board for MockBoard {
    type Display = VirtualLcd;
    type Keypad = MockKeypad;
    type Sensor = MockBiometric;
    type Clock = MockClock;
    type Actuators = MockActuators;
    type Storage = MemoryStorage;
}

impl MockBoard {
    /// Create a builder for a mock board.
    ///
    /// # Examples
    ///
    /// ```
    /// use doorlock_hardware::mock::MockBoard;
    ///
    /// let rig = MockBoard::builder().with_enrolled(&[1, 2]).build();
    /// assert_eq!(rig.handles.sensor.enrolled(), vec![1, 2]);
    /// assert_eq!(rig.storage.as_bytes().len(), 281);
    /// ```
    pub fn builder() -> MockBoardBuilder {
        MockBoardBuilder::default()
    }
}

/// Control handles for every device of a [`MockRig`].
#[derive(Debug, Clone)]
pub struct MockHandles {
    pub keypad: MockKeypadHandle,
    pub sensor: MockBiometricHandle,
    pub lcd: VirtualLcdHandle,
    pub clock: MockClockHandle,
    pub actuators: MockActuatorsHandle,
}

/// A built mock board: peripherals, EEPROM and the handles driving them.
pub struct MockRig {
    pub peripherals: Peripherals<MockBoard>,
    pub storage: MemoryStorage,
    pub handles: MockHandles,
}

/// Builder for [`MockRig`].
#[derive(Debug)]
pub struct MockBoardBuilder {
    enrolled: Vec<u16>,
    eeprom: Option<Vec<u8>>,
    eeprom_capacity: usize,
    start: Option<NaiveDateTime>,
}

impl Default for MockBoardBuilder {
    fn default() -> Self {
        Self {
            // Factory state: one template per household member
            enrolled: User::ALL
                .iter()
                .map(|u| u.fingerprint_id().as_u16())
                .collect(),
            eeprom: None,
            eeprom_capacity: LOG_FOOTPRINT,
            start: None,
        }
    }
}

impl MockBoardBuilder {
    /// Replace the sensor's initial template library.
    pub fn with_enrolled(mut self, ids: &[u16]) -> Self {
        self.enrolled = ids.to_vec();
        self
    }

    /// Start from an existing EEPROM image, e.g. one taken before a reboot.
    pub fn with_eeprom(mut self, image: Vec<u8>) -> Self {
        self.eeprom = Some(image);
        self
    }

    /// Size of a fresh (erased) EEPROM. Ignored with [`Self::with_eeprom`].
    pub fn with_eeprom_capacity(mut self, capacity: usize) -> Self {
        self.eeprom_capacity = capacity;
        self
    }

    /// Initial wall-clock time.
    pub fn starting_at(mut self, start: NaiveDateTime) -> Self {
        self.start = Some(start);
        self
    }

    /// Build the devices and their handles.
    pub fn build(self) -> MockRig {
        let (display, lcd) = VirtualLcd::new();
        let (keypad, keypad_handle) = MockKeypad::new();
        let (sensor, sensor_handle) = MockBiometric::with_enrolled(&self.enrolled);
        let (clock, clock_handle) = match self.start {
            Some(start) => MockClock::starting_at(start),
            None => MockClock::new(),
        };
        let (actuators, actuators_handle) = MockActuators::new(clock_handle.clone());
        let storage = match self.eeprom {
            Some(image) => MemoryStorage::from_bytes(image),
            None => MemoryStorage::new(self.eeprom_capacity),
        };

        MockRig {
            peripherals: Peripherals::new(display, keypad, sensor, clock, actuators),
            storage,
            handles: MockHandles {
                keypad: keypad_handle,
                sensor: sensor_handle,
                lcd,
                clock: clock_handle,
                actuators: actuators_handle,
            },
        }
    }
}
