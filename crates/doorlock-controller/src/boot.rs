//! Boot-time self-check and the terminal fault state.
//!
//! The controller only starts once the real-time clock and the fingerprint
//! sensor have both answered. If either fails the board shows which one,
//! then blinks the backlight and status LED until it is power-cycled.
//!
//! # Examples
//!
//! ```
//! use doorlock_controller::boot::{self_check, BootFault};
//! use doorlock_hardware::mock::MockBoard;
//!
//! let mut rig = MockBoard::builder().build();
//! assert!(self_check(&mut rig.peripherals).is_ok());
//!
//! rig.handles.clock.set_stopped(true);
//! assert!(matches!(self_check(&mut rig.peripherals), Err(BootFault::Clock(_))));
//! ```

use std::time::Duration;

use doorlock_hardware::{
    Actuators, Board, Clock, DisplaySurface, FingerprintSensor, HardwareError, Peripherals,
};
use thiserror::Error;
use tracing::{debug, error, info};

use crate::display::Screen;

/// Half-period of the fault blink.
pub const BLINK_INTERVAL: Duration = Duration::from_millis(500);

/// A peripheral that failed its start-up check.
#[derive(Debug, Error)]
pub enum BootFault {
    #[error("Real-time clock failed self-check: {0}")]
    Clock(#[source] HardwareError),

    #[error("Fingerprint sensor failed self-check: {0}")]
    Sensor(#[source] HardwareError),
}

impl BootFault {
    /// Short name shown on the display.
    pub fn device(&self) -> &'static str {
        match self {
            Self::Clock(_) => "CLOCK",
            Self::Sensor(_) => "SENSOR",
        }
    }
}

/// Verify the clock, then the fingerprint sensor.
///
/// # Errors
///
/// Returns the first device that fails its check.
pub fn self_check<B: Board>(hw: &mut Peripherals<B>) -> Result<(), BootFault> {
    hw.clock.verify().map_err(BootFault::Clock)?;
    hw.sensor.verify().map_err(BootFault::Sensor)?;
    info!("Self-check passed");
    Ok(())
}

/// Terminal error state: fault message plus a blinking indicator.
pub struct FaultIndicator<B: Board> {
    hw: Peripherals<B>,
    fault: BootFault,
    lit: bool,
}

impl<B: Board> FaultIndicator<B> {
    /// Take over the peripherals and show which device failed.
    pub fn new(mut hw: Peripherals<B>, fault: BootFault) -> Self {
        error!(%fault, "Boot halted");

        // The display may be what is broken
        if let Err(error) = Screen::Notice(fault.device(), "FAULT").render(&mut hw.display) {
            debug!(%error, "Fault notice not shown");
        }

        Self {
            hw,
            fault,
            lit: false,
        }
    }

    pub fn fault(&self) -> &BootFault {
        &self.fault
    }

    /// Whether the indicator is currently on.
    pub fn is_lit(&self) -> bool {
        self.lit
    }

    /// Toggle backlight and status LED, then wait one blink interval.
    pub fn blink_once(&mut self) {
        self.lit = !self.lit;
        if let Err(error) = self.hw.display.set_backlight(self.lit) {
            debug!(%error, "Fault blink: backlight not toggled");
        }
        if let Err(error) = self.hw.actuators.set_status_led(self.lit) {
            debug!(%error, "Fault blink: status LED not toggled");
        }
        self.hw.clock.delay(BLINK_INTERVAL);
    }

    /// Blink forever. Only a physical reset leaves this state.
    pub fn halt(mut self) -> ! {
        loop {
            self.blink_once();
        }
    }
}
