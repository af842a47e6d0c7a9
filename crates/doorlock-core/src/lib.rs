//! Core domain types for the doorlock access controller.
//!
//! Shared by every other crate in the workspace: the household [`User`]
//! roster, fingerprint identifiers, the on-device [`Timestamp`] format,
//! controller configuration and the common error type.

pub mod config;
pub mod constants;
pub mod error;
pub mod types;

pub use config::ControllerConfig;
pub use error::{Error, Result};
pub use types::*;

/// Version info
pub const VERSION: &str = env!("CARGO_PKG_VERSION");
