//! Mock real-time clock with simulated time.
//!
//! Delays do not sleep: they advance both the wall clock and the uptime
//! counter, so a five second unlock hold completes instantly in tests while
//! timestamps still move forward as they would on the device.

use std::sync::{Arc, Mutex, MutexGuard, PoisonError};
use std::time::Duration;

use chrono::{NaiveDate, NaiveDateTime, TimeDelta};
use doorlock_core::Timestamp;

use crate::{HardwareError, Result, traits::Clock};

#[derive(Debug)]
struct ClockState {
    wall: NaiveDateTime,
    uptime: Duration,
    stopped: bool,
}

impl ClockState {
    fn advance(&mut self, by: Duration) {
        self.uptime += by;
        if let Ok(delta) = TimeDelta::from_std(by) {
            self.wall += delta;
        }
    }
}

/// Simulated clock.
///
/// # Examples
///
/// ```
/// use std::time::Duration;
/// use doorlock_hardware::mock::MockClock;
/// use doorlock_hardware::traits::Clock;
///
/// let (mut clock, handle) = MockClock::new();
/// let before = clock.now();
///
/// clock.delay(Duration::from_secs(5));
///
/// assert_eq!(clock.uptime(), Duration::from_secs(5));
/// assert_eq!((*clock.now().inner() - *before.inner()).num_seconds(), 5);
/// assert_eq!(handle.now(), clock.now());
/// ```
#[derive(Debug)]
pub struct MockClock {
    state: Arc<Mutex<ClockState>>,
}

impl MockClock {
    /// Clock starting at 2024/01/01 00:00:00.
    pub fn new() -> (Self, MockClockHandle) {
        Self::starting_at(default_epoch())
    }

    /// Clock starting at `wall`.
    pub fn starting_at(wall: NaiveDateTime) -> (Self, MockClockHandle) {
        let state = Arc::new(Mutex::new(ClockState {
            wall,
            uptime: Duration::ZERO,
            stopped: false,
        }));
        (
            Self {
                state: Arc::clone(&state),
            },
            MockClockHandle { state },
        )
    }

    fn state(&self) -> MutexGuard<'_, ClockState> {
        self.state.lock().unwrap_or_else(PoisonError::into_inner)
    }
}

impl Clock for MockClock {
    fn verify(&mut self) -> Result<()> {
        if self.state().stopped {
            return Err(HardwareError::initialization_failed(
                "Real-time clock not running",
            ));
        }
        Ok(())
    }

    fn now(&self) -> Timestamp {
        Timestamp::from_datetime(self.state().wall)
    }

    fn uptime(&self) -> Duration {
        self.state().uptime
    }

    fn delay(&mut self, duration: Duration) {
        self.state().advance(duration);
    }
}

/// Handle for steering a [`MockClock`] from tests.
#[derive(Debug, Clone)]
pub struct MockClockHandle {
    state: Arc<Mutex<ClockState>>,
}

impl MockClockHandle {
    fn state(&self) -> MutexGuard<'_, ClockState> {
        self.state.lock().unwrap_or_else(PoisonError::into_inner)
    }

    /// Move simulated time forward.
    pub fn advance(&self, by: Duration) {
        self.state().advance(by);
    }

    /// Set the wall clock, leaving uptime untouched.
    pub fn set_wall(&self, wall: NaiveDateTime) {
        self.state().wall = wall;
    }

    /// Current simulated wall time.
    pub fn now(&self) -> Timestamp {
        Timestamp::from_datetime(self.state().wall)
    }

    /// Current simulated uptime.
    pub fn uptime(&self) -> Duration {
        self.state().uptime
    }

    /// Make start-up verification fail, as with a missing RTC module.
    pub fn set_stopped(&self, stopped: bool) {
        self.state().stopped = stopped;
    }
}

fn default_epoch() -> NaiveDateTime {
    NaiveDate::from_ymd_opt(2024, 1, 1)
        .and_then(|d| d.and_hms_opt(0, 0, 0))
        .unwrap_or_default()
}
