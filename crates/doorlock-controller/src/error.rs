//! Error type of the controller crate.

use doorlock_hardware::HardwareError;
use doorlock_storage::StorageError;
use thiserror::Error;

/// Errors that stop the controller loop.
///
/// Authentication failures, sensor capture faults and storage anomalies are
/// outcomes handled inside the session and never appear here. What remains
/// are device failures the loop cannot recover from on its own.
#[derive(Debug, Error)]
pub enum ControllerError {
    #[error(transparent)]
    Core(#[from] doorlock_core::Error),

    #[error(transparent)]
    Hardware(#[from] HardwareError),

    #[error(transparent)]
    Storage(#[from] StorageError),
}

/// Result type alias for controller operations.
pub type Result<T> = std::result::Result<T, ControllerError>;
