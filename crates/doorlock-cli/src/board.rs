//! The emulated board: mock keypad, sensor and display driven from the
//! console, a wall clock, logging outputs and a file-backed EEPROM.

use std::time::{Duration, Instant};

use chrono::{Local, Timelike};
use doorlock_core::{Timestamp, User, constants::LOG_FOOTPRINT};
use doorlock_hardware::mock::{
    MockBiometric, MockBiometricHandle, MockKeypad, MockKeypadHandle, VirtualLcd,
    VirtualLcdHandle,
};
use doorlock_hardware::{Actuators, Board, Clock, HardwareError, Peripherals, Result};
use tracing::{debug, info};

use crate::eeprom::FileEeprom;

/// Board type of the host emulator.
#[derive(Debug, Clone, Copy, Default)]
pub struct HostBoard;

impl Board for HostBoard {
    type Display = VirtualLcd;
    type Keypad = MockKeypad;
    type Sensor = MockBiometric;
    type Clock = HostClock;
    type Actuators = HostActuators;
    type Storage = FileEeprom;
}

/// Handles the console uses to drive the emulated devices.
#[derive(Debug, Clone)]
pub struct HostHandles {
    pub keypad: MockKeypadHandle,
    pub sensor: MockBiometricHandle,
    pub lcd: VirtualLcdHandle,
}

/// Build the emulated board around the image at `eeprom`.
///
/// # Errors
///
/// Returns an error if the EEPROM image cannot be opened.
pub fn build(
    eeprom: &std::path::Path,
    clock: HostClock,
) -> Result<(Peripherals<HostBoard>, FileEeprom, HostHandles)> {
    let storage = FileEeprom::open(eeprom, LOG_FOOTPRINT)?;
    let (display, lcd) = VirtualLcd::new();
    let (keypad, keypad_handle) = MockKeypad::new();
    // Factory state: one template per household member
    let factory: Vec<u16> = User::ALL
        .iter()
        .map(|u| u.fingerprint_id().as_u16())
        .collect();
    let (sensor, sensor_handle) = MockBiometric::with_enrolled(&factory);

    let peripherals = Peripherals::new(display, keypad, sensor, clock, HostActuators::default());
    let handles = HostHandles {
        keypad: keypad_handle,
        sensor: sensor_handle,
        lcd,
    };
    Ok((peripherals, storage, handles))
}

/// Host wall clock. Uptime counts from construction.
#[derive(Debug)]
pub struct HostClock {
    boot: Instant,
    stopped: bool,
}

impl HostClock {
    pub fn new() -> Self {
        Self {
            boot: Instant::now(),
            stopped: false,
        }
    }

    /// A clock whose oscillator never started, to exercise the boot fault.
    pub fn stopped() -> Self {
        Self {
            stopped: true,
            ..Self::new()
        }
    }
}

impl Default for HostClock {
    fn default() -> Self {
        Self::new()
    }
}

impl Clock for HostClock {
    fn verify(&mut self) -> Result<()> {
        if self.stopped {
            return Err(HardwareError::initialization_failed(
                "Real-time clock not running",
            ));
        }
        Ok(())
    }

    fn now(&self) -> Timestamp {
        let now = Local::now().naive_local();
        // The log stores whole seconds
        Timestamp::from_datetime(now.with_nanosecond(0).unwrap_or(now))
    }

    fn uptime(&self) -> Duration {
        self.boot.elapsed()
    }

    fn delay(&mut self, duration: Duration) {
        std::thread::sleep(duration);
    }
}

/// Relay, LED and buzzer reported through `tracing`.
#[derive(Debug, Default)]
pub struct HostActuators {
    unlocked: bool,
    led: bool,
}

impl Actuators for HostActuators {
    fn set_unlock(&mut self, on: bool) -> Result<()> {
        if on != self.unlocked {
            info!(unlocked = on, "Door strike {}", if on { "released" } else { "engaged" });
        }
        self.unlocked = on;
        Ok(())
    }

    fn set_status_led(&mut self, on: bool) -> Result<()> {
        self.led = on;
        debug!(on, "Status LED");
        Ok(())
    }

    fn play_tone(&mut self, frequency_hz: u32, duration: Duration) -> Result<()> {
        debug!(frequency_hz, duration_ms = duration.as_millis() as u64, "Tone");
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use doorlock_hardware::ByteStorage;
    use tempfile::tempdir;

    #[test]
    fn test_stopped_clock_fails_verify() {
        assert!(HostClock::new().verify().is_ok());
        assert!(matches!(
            HostClock::stopped().verify(),
            Err(HardwareError::InitializationFailed { .. })
        ));
    }

    #[test]
    fn test_clock_drops_subseconds() {
        let clock = HostClock::new();
        assert_eq!(clock.now().inner().nanosecond(), 0);
    }

    #[test]
    fn test_actuators_track_outputs() {
        let mut outputs = HostActuators::default();
        outputs.set_unlock(true).unwrap();
        outputs.set_status_led(true).unwrap();
        assert!(outputs.unlocked);
        assert!(outputs.led);

        outputs.set_unlock(false).unwrap();
        assert!(!outputs.unlocked);
    }

    #[test]
    fn test_build_sizes_eeprom_for_the_log() {
        let dir = tempdir().unwrap();
        let (_, storage, handles) =
            build(&dir.path().join("lock.eeprom"), HostClock::new()).unwrap();

        assert_eq!(storage.capacity(), LOG_FOOTPRINT);
        assert_eq!(handles.sensor.enrolled(), [1, 2, 3, 4, 5]);
    }
}
