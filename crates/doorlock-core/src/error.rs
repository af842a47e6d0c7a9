use thiserror::Error;

#[derive(Error, Debug)]
pub enum Error {
    // Session errors
    #[error("Invalid state transition from {from} to {to}")]
    InvalidStateTransition { from: String, to: String },

    #[error("Admin session required to enter {state}")]
    AdminRequired { state: String },

    // Credential errors
    #[error("Fingerprint identifier out of range: {0} (valid 1-127)")]
    InvalidFingerprintId(u16),

    #[error("Unknown user selection: {0}")]
    UnknownUser(String),

    #[error("Password too long: {len} characters (max {max})")]
    PasswordTooLong { len: usize, max: usize },

    #[error("Invalid timestamp '{value}': {reason}")]
    InvalidTimestamp { value: String, reason: String },

    // IO errors
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    // Configuration errors
    #[error("Configuration error: {0}")]
    Config(String),
}

pub type Result<T> = std::result::Result<T, Error>;
