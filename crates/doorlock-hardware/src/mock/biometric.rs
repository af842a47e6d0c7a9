//! Mock fingerprint sensor implementation for testing and development.
//!
//! This module provides a simulated optical sensor with an on-board template
//! library that can be controlled programmatically without physical hardware.

use crate::{
    FingerScan, HardwareError, Result, SensorFault, TemplateSlot, traits::FingerprintSensor,
};
use doorlock_core::FingerprintId;
use std::collections::{BTreeSet, VecDeque};
use std::sync::{Arc, Mutex, MutexGuard, PoisonError};
use tokio::sync::mpsc::{self, error::TryRecvError};

/// Queue depth of simulated finger presentations.
const SCAN_BUFFER: usize = 64;

/// Confidence reported for every simulated match.
const MOCK_CONFIDENCE: u16 = 120;

/// Something placed on the simulated sensor.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ScanEvent {
    /// A finger whose template (if enrolled) lives in slot `id`.
    Finger(u16),
    /// A finger that could not be imaged.
    Unreadable(SensorFault),
}

#[derive(Debug, Default)]
struct SensorState {
    /// Template slots holding a stored fingerprint.
    enrolled: BTreeSet<u16>,
    /// Outcomes for upcoming enrollment captures; empty means success.
    capture_script: VecDeque<SensorFault>,
    /// Enrollment in progress: slot id and captures taken.
    pending: Option<(u16, u8)>,
    finger_present: bool,
    refuse_commit: bool,
    offline: bool,
}

/// Mock fingerprint sensor for testing and development.
///
/// Identification matches a presented finger against the simulated template
/// library, so presenting a finger whose slot is not enrolled yields
/// [`FingerScan::NoMatch`], exactly as a real sensor would.
///
/// # Examples
///
/// ```
/// use doorlock_hardware::mock::MockBiometric;
/// use doorlock_hardware::traits::FingerprintSensor;
/// use doorlock_hardware::FingerScan;
///
/// let (mut sensor, handle) = MockBiometric::with_enrolled(&[1, 2]);
///
/// assert_eq!(sensor.capture_and_identify().unwrap(), None);
///
/// handle.present_finger(2).unwrap();
/// assert!(matches!(
///     sensor.capture_and_identify().unwrap(),
///     Some(FingerScan::Matched { id: 2, .. })
/// ));
///
/// handle.present_finger(7).unwrap();
/// assert_eq!(sensor.capture_and_identify().unwrap(), Some(FingerScan::NoMatch));
/// ```
#[derive(Debug)]
pub struct MockBiometric {
    /// Channel receiver for finger presentations
    scan_rx: mpsc::Receiver<ScanEvent>,

    /// Template library shared with the handle
    state: Arc<Mutex<SensorState>>,
}

impl MockBiometric {
    /// Create a new mock sensor with an empty template library.
    pub fn new() -> (Self, MockBiometricHandle) {
        Self::with_enrolled(&[])
    }

    /// Create a new mock sensor with templates already stored in `ids`.
    pub fn with_enrolled(ids: &[u16]) -> (Self, MockBiometricHandle) {
        let (scan_tx, scan_rx) = mpsc::channel(SCAN_BUFFER);
        let state = Arc::new(Mutex::new(SensorState {
            enrolled: ids.iter().copied().collect(),
            ..SensorState::default()
        }));

        let sensor = Self {
            scan_rx,
            state: Arc::clone(&state),
        };
        let handle = MockBiometricHandle { scan_tx, state };

        (sensor, handle)
    }

    fn state(&self) -> MutexGuard<'_, SensorState> {
        self.state.lock().unwrap_or_else(PoisonError::into_inner)
    }

    fn ensure_online(&self) -> Result<()> {
        if self.state().offline {
            return Err(HardwareError::disconnected("Mock fingerprint sensor"));
        }
        Ok(())
    }
}

impl FingerprintSensor for MockBiometric {
    fn verify(&mut self) -> Result<()> {
        if self.state().offline {
            return Err(HardwareError::initialization_failed(
                "Fingerprint sensor did not answer handshake",
            ));
        }
        Ok(())
    }

    fn capture_and_identify(&mut self) -> Result<Option<FingerScan>> {
        self.ensure_online()?;

        let event = match self.scan_rx.try_recv() {
            Ok(event) => event,
            Err(TryRecvError::Empty) => return Ok(None),
            Err(TryRecvError::Disconnected) => {
                return Err(HardwareError::disconnected("Biometric event channel closed"));
            }
        };

        match event {
            ScanEvent::Finger(id) if self.state().enrolled.contains(&id) => {
                Ok(Some(FingerScan::Matched {
                    id,
                    confidence: Some(MOCK_CONFIDENCE),
                }))
            }
            ScanEvent::Finger(_) => Ok(Some(FingerScan::NoMatch)),
            ScanEvent::Unreadable(fault) => Err(HardwareError::sensor(fault)),
        }
    }

    fn is_finger_present(&mut self) -> Result<bool> {
        self.ensure_online()?;
        Ok(self.state().finger_present)
    }

    fn begin_enroll(&mut self, id: FingerprintId) -> Result<()> {
        self.ensure_online()?;
        self.state().pending = Some((id.as_u16(), 0));
        Ok(())
    }

    fn capture_template(&mut self, _slot: TemplateSlot) -> Result<()> {
        self.ensure_online()?;

        let mut state = self.state();
        if let Some(fault) = state.capture_script.pop_front() {
            return Err(HardwareError::sensor(fault));
        }
        match state.pending.as_mut() {
            Some((_, captures)) => {
                *captures += 1;
                Ok(())
            }
            None => Err(HardwareError::sensor(SensorFault::PacketError)),
        }
    }

    fn commit(&mut self) -> Result<bool> {
        self.ensure_online()?;

        let mut state = self.state();
        match state.pending.take() {
            Some((id, captures)) if captures >= 2 && !state.refuse_commit => {
                state.enrolled.insert(id);
                Ok(true)
            }
            _ => Ok(false),
        }
    }

    fn delete(&mut self, id: FingerprintId) -> Result<bool> {
        self.ensure_online()?;
        Ok(self.state().enrolled.remove(&id.as_u16()))
    }
}

/// Handle for controlling a mock fingerprint sensor.
///
/// This handle allows programmatic control of the mock sensor: presenting
/// fingers, scripting enrollment faults and inspecting the template library.
#[derive(Debug, Clone)]
pub struct MockBiometricHandle {
    /// Channel sender for finger presentations
    scan_tx: mpsc::Sender<ScanEvent>,

    /// Template library shared with the sensor
    state: Arc<Mutex<SensorState>>,
}

impl MockBiometricHandle {
    fn state(&self) -> MutexGuard<'_, SensorState> {
        self.state.lock().unwrap_or_else(PoisonError::into_inner)
    }

    /// Queue a presentation, waiting for queue space.
    ///
    /// # Errors
    ///
    /// Returns an error if the sensor has been dropped.
    pub async fn queue_scan(&self, event: ScanEvent) -> Result<()> {
        self.scan_tx
            .send(event)
            .await
            .map_err(|_| HardwareError::disconnected("Biometric event channel closed"))
    }

    /// Queue a presentation from synchronous code.
    ///
    /// # Errors
    ///
    /// Returns an error if the sensor was dropped or the queue is full.
    pub fn queue_scan_now(&self, event: ScanEvent) -> Result<()> {
        self.scan_tx
            .try_send(event)
            .map_err(|_| HardwareError::other("Biometric event queue unavailable"))
    }

    /// Place the finger belonging to template slot `id` on the sensor.
    pub fn present_finger(&self, id: u16) -> Result<()> {
        self.queue_scan_now(ScanEvent::Finger(id))
    }

    /// Place a finger that fails to image with `fault`.
    pub fn present_unreadable(&self, fault: SensorFault) -> Result<()> {
        self.queue_scan_now(ScanEvent::Unreadable(fault))
    }

    /// Make the next enrollment capture fail with `fault`.
    pub fn script_capture_fault(&self, fault: SensorFault) {
        self.state().capture_script.push_back(fault);
    }

    /// Make the sensor refuse (or accept again) template storage.
    pub fn refuse_commit(&self, refuse: bool) {
        self.state().refuse_commit = refuse;
    }

    /// Simulate a finger resting on (or lifted from) the sensor.
    pub fn set_finger_present(&self, present: bool) {
        self.state().finger_present = present;
    }

    /// Simulate an unplugged sensor.
    pub fn set_offline(&self, offline: bool) {
        self.state().offline = offline;
    }

    /// Store a template directly, bypassing enrollment.
    pub fn enroll_directly(&self, id: u16) {
        self.state().enrolled.insert(id);
    }

    /// Slots currently holding a template.
    pub fn enrolled(&self) -> Vec<u16> {
        self.state().enrolled.iter().copied().collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn id(raw: u16) -> FingerprintId {
        FingerprintId::new(raw).unwrap()
    }

    #[test]
    fn test_no_finger_is_none() {
        let (mut sensor, _handle) = MockBiometric::with_enrolled(&[1]);
        assert_eq!(sensor.capture_and_identify().unwrap(), None);
    }

    #[tokio::test]
    async fn test_async_queue_scan() {
        let (mut sensor, handle) = MockBiometric::with_enrolled(&[3]);

        handle.queue_scan(ScanEvent::Finger(3)).await.unwrap();

        assert_eq!(
            sensor.capture_and_identify().unwrap(),
            Some(FingerScan::Matched {
                id: 3,
                confidence: Some(MOCK_CONFIDENCE)
            })
        );
    }

    #[test]
    fn test_unreadable_finger_reports_fault() {
        let (mut sensor, handle) = MockBiometric::new();
        handle.present_unreadable(SensorFault::ImageTooMessy).unwrap();

        let err = sensor.capture_and_identify().unwrap_err();
        assert_eq!(err.sensor_fault(), Some(SensorFault::ImageTooMessy));
    }

    #[test]
    fn test_enrollment_stores_template() {
        let (mut sensor, handle) = MockBiometric::new();

        sensor.begin_enroll(id(42)).unwrap();
        sensor.capture_template(TemplateSlot::First).unwrap();
        sensor.capture_template(TemplateSlot::Second).unwrap();
        assert!(sensor.commit().unwrap());

        assert_eq!(handle.enrolled(), vec![42]);
    }

    #[test]
    fn test_commit_without_two_captures_fails() {
        let (mut sensor, handle) = MockBiometric::new();

        sensor.begin_enroll(id(9)).unwrap();
        sensor.capture_template(TemplateSlot::First).unwrap();
        assert!(!sensor.commit().unwrap());
        assert!(handle.enrolled().is_empty());
    }

    #[test]
    fn test_scripted_capture_fault() {
        let (mut sensor, handle) = MockBiometric::new();
        handle.script_capture_fault(SensorFault::EnrollMismatch);

        sensor.begin_enroll(id(9)).unwrap();
        let err = sensor.capture_template(TemplateSlot::First).unwrap_err();
        assert_eq!(err.sensor_fault(), Some(SensorFault::EnrollMismatch));

        // Script is consumed
        sensor.capture_template(TemplateSlot::First).unwrap();
    }

    #[test]
    fn test_delete_reports_presence() {
        let (mut sensor, handle) = MockBiometric::with_enrolled(&[4]);

        assert!(sensor.delete(id(4)).unwrap());
        assert!(!sensor.delete(id(4)).unwrap());
        assert!(handle.enrolled().is_empty());
    }

    #[test]
    fn test_offline_sensor_fails_verify() {
        let (mut sensor, handle) = MockBiometric::new();
        assert!(sensor.verify().is_ok());

        handle.set_offline(true);
        assert!(matches!(
            sensor.verify(),
            Err(HardwareError::InitializationFailed { .. })
        ));
        assert!(sensor.capture_and_identify().is_err());
    }

    #[test]
    fn test_finger_presence_flag() {
        let (mut sensor, handle) = MockBiometric::new();
        assert!(!sensor.is_finger_present().unwrap());

        handle.set_finger_present(true);
        assert!(sensor.is_finger_present().unwrap());
    }
}
