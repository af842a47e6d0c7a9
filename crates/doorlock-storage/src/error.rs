use doorlock_hardware::HardwareError;
use thiserror::Error;

/// Storage-specific error types for the durable audit log.
///
/// Only device-level failures are errors. Corrupted content found while
/// loading (a cursor out of range, a malformed slot) is recovered in place
/// and never reported through this type.
#[derive(Debug, Error)]
pub enum StorageError {
    /// The underlying byte device failed
    #[error("Storage device error: {0}")]
    Device(#[from] HardwareError),

    /// The device is too small to hold the log region
    #[error("Storage too small: log needs {required} bytes, device has {available}")]
    InsufficientCapacity { required: usize, available: usize },
}

/// Specialized result type for storage operations
pub type StorageResult<T> = Result<T, StorageError>;
