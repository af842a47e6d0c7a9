//! Mock keypad implementation for testing and development.
//!
//! This module provides a simulated keypad device that can be controlled
//! programmatically for testing without requiring physical hardware.

use crate::{Key, Result, traits::KeyInput};
use tokio::sync::mpsc::{self, error::TryRecvError};

/// Queue depth of the simulated keypad.
const KEY_BUFFER: usize = 256;

/// Mock keypad device for testing and development.
///
/// This device simulates a matrix keypad by receiving key presses through
/// an internal channel. Tests and the host emulator push keys with a
/// `MockKeypadHandle`; the controller polls them without blocking.
///
/// # Examples
///
/// ```
/// use doorlock_hardware::mock::MockKeypad;
/// use doorlock_hardware::traits::KeyInput;
/// use doorlock_hardware::Key;
///
/// let (mut keypad, handle) = MockKeypad::new();
/// handle.type_keys("12#").unwrap();
///
/// assert_eq!(keypad.poll_key().unwrap(), Some(Key::Digit(1)));
/// assert_eq!(keypad.poll_key().unwrap(), Some(Key::Digit(2)));
/// assert_eq!(keypad.poll_key().unwrap(), Some(Key::Hash));
/// assert_eq!(keypad.poll_key().unwrap(), None);
/// ```
#[derive(Debug)]
pub struct MockKeypad {
    /// Channel receiver for simulated key presses
    key_rx: mpsc::Receiver<Key>,
}

impl MockKeypad {
    /// Create a new mock keypad.
    ///
    /// Returns a tuple of (MockKeypad, MockKeypadHandle) where the handle
    /// can be used to simulate key presses.
    pub fn new() -> (Self, MockKeypadHandle) {
        let (key_tx, key_rx) = mpsc::channel(KEY_BUFFER);
        (Self { key_rx }, MockKeypadHandle { key_tx })
    }
}

impl KeyInput for MockKeypad {
    fn poll_key(&mut self) -> Result<Option<Key>> {
        match self.key_rx.try_recv() {
            Ok(key) => Ok(Some(key)),
            Err(TryRecvError::Empty) => Ok(None),
            Err(TryRecvError::Disconnected) => Err(crate::HardwareError::disconnected(
                "Keypad input channel closed",
            )),
        }
    }
}

/// Handle for controlling a mock keypad.
///
/// This handle allows programmatic control of the mock keypad by sending
/// key presses. It can be cloned and shared across tasks.
#[derive(Debug, Clone)]
pub struct MockKeypadHandle {
    /// Channel sender for simulated key presses
    key_tx: mpsc::Sender<Key>,
}

impl MockKeypadHandle {
    /// Send a key press, waiting for queue space.
    ///
    /// # Errors
    ///
    /// Returns an error if the keypad has been dropped and the channel is closed.
    pub async fn send_key(&self, key: Key) -> Result<()> {
        self.key_tx
            .send(key)
            .await
            .map_err(|_| crate::HardwareError::disconnected("Keypad input channel closed"))
    }

    /// Queue a key press from synchronous code.
    ///
    /// # Errors
    ///
    /// Returns an error if the keypad was dropped or the queue is full.
    pub fn press(&self, key: Key) -> Result<()> {
        self.key_tx.try_send(key).map_err(|e| match e {
            mpsc::error::TrySendError::Full(_) => {
                crate::HardwareError::other("Keypad input queue full")
            }
            mpsc::error::TrySendError::Closed(_) => {
                crate::HardwareError::disconnected("Keypad input channel closed")
            }
        })
    }

    /// Queue every character of `keys` as a key press.
    ///
    /// # Errors
    ///
    /// Returns an error if any character is not on the keypad (nothing
    /// after it is queued) or the keypad was dropped.
    ///
    /// # Examples
    ///
    /// ```
    /// use doorlock_hardware::mock::MockKeypad;
    ///
    /// let (_keypad, handle) = MockKeypad::new();
    /// handle.type_keys("2 1111 #").unwrap();
    /// assert!(handle.type_keys("2x").is_err());
    /// ```
    pub fn type_keys(&self, keys: &str) -> Result<()> {
        for c in keys.chars().filter(|c| !c.is_whitespace()) {
            self.press(Key::from_char(c)?)?;
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_mock_keypad_empty_poll() {
        let (mut keypad, _handle) = MockKeypad::new();
        assert_eq!(keypad.poll_key().unwrap(), None);
    }

    #[tokio::test]
    async fn test_mock_keypad_async_send() {
        let (mut keypad, handle) = MockKeypad::new();

        tokio::spawn(async move {
            handle.send_key(Key::Digit(5)).await.unwrap();
            handle.send_key(Key::Hash).await.unwrap();
        })
        .await
        .unwrap();

        assert_eq!(keypad.poll_key().unwrap(), Some(Key::Digit(5)));
        assert_eq!(keypad.poll_key().unwrap(), Some(Key::Hash));
    }

    #[test]
    fn test_mock_keypad_type_keys_preserves_order() {
        let (mut keypad, handle) = MockKeypad::new();
        handle.type_keys("A1*#").unwrap();

        let keys: Vec<Key> = std::iter::from_fn(|| keypad.poll_key().unwrap()).collect();
        assert_eq!(
            keys,
            vec![Key::Letter('A'), Key::Digit(1), Key::Star, Key::Hash]
        );
    }

    #[test]
    fn test_mock_keypad_handle_clone() {
        let (mut keypad, handle) = MockKeypad::new();
        let handle_clone = handle.clone();

        handle.press(Key::Digit(1)).unwrap();
        handle_clone.press(Key::Digit(2)).unwrap();

        assert_eq!(keypad.poll_key().unwrap(), Some(Key::Digit(1)));
        assert_eq!(keypad.poll_key().unwrap(), Some(Key::Digit(2)));
    }

    #[test]
    fn test_mock_keypad_closed_channel() {
        let (mut keypad, handle) = MockKeypad::new();
        drop(handle);

        assert!(keypad.poll_key().is_err());
    }

    #[test]
    fn test_press_after_keypad_dropped() {
        let (keypad, handle) = MockKeypad::new();
        drop(keypad);

        assert!(handle.press(Key::Star).is_err());
    }
}
