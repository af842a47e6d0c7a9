//! Durable audit log for the doorlock access controller.
//!
//! The controller keeps the last ten access events in a small EEPROM region
//! so they survive power cycles. This crate provides:
//!
//! - [`LogRecord`] - one event and its fixed-width 28-byte encoding
//! - [`AuditLog`] - the circular store over any [`ByteStorage`] device
//!
//! The loader is corruption-tolerant: whatever bytes it finds on the device,
//! it produces a usable log. A factory-fresh (all `0xFF`) EEPROM loads as
//! an empty log.
//!
//! [`ByteStorage`]: doorlock_hardware::ByteStorage

pub mod audit_log;
pub mod codec;
pub mod error;

pub use audit_log::{AuditLog, RecentEntries};
pub use codec::LogRecord;
pub use error::{StorageError, StorageResult};
