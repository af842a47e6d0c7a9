//! Error types for hardware operations.
//!
//! This module defines error types specific to peripheral operations,
//! covering device disconnection, timeouts, fingerprint sensor faults and
//! durable storage addressing.

use crate::types::SensorFault;

/// Result type alias for hardware operations.
pub type Result<T> = std::result::Result<T, HardwareError>;

/// Errors that can occur during hardware device operations.
#[derive(Debug, thiserror::Error)]
pub enum HardwareError {
    /// Device is not connected or has been disconnected.
    #[error("Device disconnected: {device}")]
    Disconnected { device: String },

    /// Fingerprint sensor reported a capture or match fault.
    #[error("Sensor fault {code:#04x}: {fault}", code = .fault.code())]
    Sensor { fault: SensorFault },

    /// Invalid data received from or sent to a device.
    #[error("Invalid data: {message}")]
    InvalidData { message: String },

    /// Device failed its start-up verification.
    #[error("Initialization failed: {message}")]
    InitializationFailed { message: String },

    /// Durable storage access outside the device.
    #[error("Address {address} out of range (capacity {capacity})")]
    AddressOutOfRange { address: usize, capacity: usize },

    /// Generic I/O error.
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    /// Generic error with custom message.
    #[error("{0}")]
    Other(String),
}

impl HardwareError {
    /// Create a new disconnected error.
    pub fn disconnected(device: impl Into<String>) -> Self {
        Self::Disconnected {
            device: device.into(),
        }
    }

    /// Create a new sensor fault error.
    pub fn sensor(fault: SensorFault) -> Self {
        Self::Sensor { fault }
    }

    /// Create a new invalid data error.
    pub fn invalid_data(message: impl Into<String>) -> Self {
        Self::InvalidData {
            message: message.into(),
        }
    }

    /// Create a new initialization failed error.
    pub fn initialization_failed(message: impl Into<String>) -> Self {
        Self::InitializationFailed {
            message: message.into(),
        }
    }

    /// Create a new address out of range error.
    pub fn address_out_of_range(address: usize, capacity: usize) -> Self {
        Self::AddressOutOfRange { address, capacity }
    }

    /// Create a generic error with custom message.
    pub fn other(message: impl Into<String>) -> Self {
        Self::Other(message.into())
    }

    /// Sensor fault carried by this error, if any.
    pub fn sensor_fault(&self) -> Option<SensorFault> {
        match self {
            Self::Sensor { fault } => Some(*fault),
            _ => None,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_disconnected_error() {
        let error = HardwareError::disconnected("keypad");
        assert!(matches!(error, HardwareError::Disconnected { .. }));
        assert_eq!(error.to_string(), "Device disconnected: keypad");
    }

    #[test]
    fn test_sensor_error_shows_code() {
        let error = HardwareError::sensor(SensorFault::ImagingFailed);
        assert_eq!(error.sensor_fault(), Some(SensorFault::ImagingFailed));
        assert!(error.to_string().starts_with("Sensor fault 0x03"));
    }

    #[test]
    fn test_address_out_of_range_error() {
        let error = HardwareError::address_out_of_range(512, 281);
        assert_eq!(error.to_string(), "Address 512 out of range (capacity 281)");
        assert_eq!(error.sensor_fault(), None);
    }
}
