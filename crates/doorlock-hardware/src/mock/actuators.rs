//! Mock relay, LED and buzzer.
//!
//! Every output change is recorded together with the simulated uptime at
//! which it happened, so tests can check both what the controller did and
//! for how long (e.g. that the strike stayed energized for the full hold).

use std::sync::{Arc, Mutex, MutexGuard, PoisonError};
use std::time::Duration;

use crate::Result;
use crate::mock::MockClockHandle;
use crate::traits::Actuators;

/// One output change.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ActuatorEvent {
    Unlock(bool),
    StatusLed(bool),
    Tone { frequency_hz: u32, duration: Duration },
}

#[derive(Debug, Default)]
struct OutputState {
    unlocked: bool,
    led: bool,
    events: Vec<(Duration, ActuatorEvent)>,
}

/// Recording actuator outputs.
#[derive(Debug)]
pub struct MockActuators {
    clock: MockClockHandle,
    state: Arc<Mutex<OutputState>>,
}

impl MockActuators {
    /// Create outputs that timestamp events with `clock`.
    pub fn new(clock: MockClockHandle) -> (Self, MockActuatorsHandle) {
        let state = Arc::new(Mutex::new(OutputState::default()));
        (
            Self {
                clock,
                state: Arc::clone(&state),
            },
            MockActuatorsHandle { state },
        )
    }

    fn record(&mut self, event: ActuatorEvent) {
        let at = self.clock.uptime();
        let mut state = self.state.lock().unwrap_or_else(PoisonError::into_inner);
        match event {
            ActuatorEvent::Unlock(on) => state.unlocked = on,
            ActuatorEvent::StatusLed(on) => state.led = on,
            ActuatorEvent::Tone { .. } => {}
        }
        state.events.push((at, event));
    }
}

impl Actuators for MockActuators {
    fn set_unlock(&mut self, on: bool) -> Result<()> {
        self.record(ActuatorEvent::Unlock(on));
        Ok(())
    }

    fn set_status_led(&mut self, on: bool) -> Result<()> {
        self.record(ActuatorEvent::StatusLed(on));
        Ok(())
    }

    fn play_tone(&mut self, frequency_hz: u32, duration: Duration) -> Result<()> {
        self.record(ActuatorEvent::Tone {
            frequency_hz,
            duration,
        });
        Ok(())
    }
}

/// Read-only view of [`MockActuators`].
#[derive(Debug, Clone)]
pub struct MockActuatorsHandle {
    state: Arc<Mutex<OutputState>>,
}

impl MockActuatorsHandle {
    fn state(&self) -> MutexGuard<'_, OutputState> {
        self.state.lock().unwrap_or_else(PoisonError::into_inner)
    }

    /// Whether the strike relay is energized right now.
    pub fn is_unlocked(&self) -> bool {
        self.state().unlocked
    }

    /// Whether the status LED is lit right now.
    pub fn led_on(&self) -> bool {
        self.state().led
    }

    /// Every recorded event with its uptime.
    pub fn events(&self) -> Vec<(Duration, ActuatorEvent)> {
        self.state().events.clone()
    }

    /// Completed unlock periods as (energized, released) uptimes.
    ///
    /// ```
    /// use std::time::Duration;
    /// use doorlock_hardware::mock::{MockActuators, MockClock};
    /// use doorlock_hardware::traits::Actuators;
    ///
    /// let (_clock, clock_handle) = MockClock::new();
    /// let (mut outputs, handle) = MockActuators::new(clock_handle.clone());
    ///
    /// outputs.set_unlock(true).unwrap();
    /// clock_handle.advance(Duration::from_secs(5));
    /// outputs.set_unlock(false).unwrap();
    ///
    /// let periods = handle.unlock_periods();
    /// assert_eq!(periods.len(), 1);
    /// assert_eq!(periods[0].1 - periods[0].0, Duration::from_secs(5));
    /// ```
    pub fn unlock_periods(&self) -> Vec<(Duration, Duration)> {
        let mut periods = Vec::new();
        let mut opened = None;
        for (at, event) in &self.state().events {
            match event {
                ActuatorEvent::Unlock(true) if opened.is_none() => opened = Some(*at),
                ActuatorEvent::Unlock(false) => {
                    if let Some(start) = opened.take() {
                        periods.push((start, *at));
                    }
                }
                _ => {}
            }
        }
        periods
    }

    /// Number of tones played.
    pub fn tone_count(&self) -> usize {
        self.state()
            .events
            .iter()
            .filter(|(_, e)| matches!(e, ActuatorEvent::Tone { .. }))
            .count()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::mock::MockClock;

    #[test]
    fn test_outputs_track_current_state() {
        let (_clock, clock_handle) = MockClock::new();
        let (mut outputs, handle) = MockActuators::new(clock_handle);

        outputs.set_unlock(true).unwrap();
        outputs.set_status_led(true).unwrap();
        assert!(handle.is_unlocked());
        assert!(handle.led_on());

        outputs.set_unlock(false).unwrap();
        assert!(!handle.is_unlocked());
        assert!(handle.unlock_periods().len() == 1);
    }

    #[test]
    fn test_tones_are_counted() {
        let (_clock, clock_handle) = MockClock::new();
        let (mut outputs, handle) = MockActuators::new(clock_handle);

        outputs
            .play_tone(2000, Duration::from_millis(100))
            .unwrap();
        outputs
            .play_tone(2000, Duration::from_millis(100))
            .unwrap();

        assert_eq!(handle.tone_count(), 2);
        assert!(!handle.is_unlocked());
    }

    #[test]
    fn test_unterminated_unlock_is_not_a_period() {
        let (_clock, clock_handle) = MockClock::new();
        let (mut outputs, handle) = MockActuators::new(clock_handle);

        outputs.set_unlock(true).unwrap();
        assert!(handle.unlock_periods().is_empty());
    }
}
