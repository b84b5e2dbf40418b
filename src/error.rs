//! # Error Types
//!
//! Custom error types for PID Scope using `thiserror`.

use thiserror::Error;

/// Main error type for PID Scope
#[derive(Debug, Error)]
pub enum PidScopeError {
    /// A line carried the telemetry marker but its fields failed to decode
    #[error("Malformed telemetry frame: {0}")]
    MalformedFrame(String),

    /// Configuration errors
    #[error("Configuration error: {0}")]
    Config(#[from] toml::de::Error),

    /// Serial transport errors
    #[error("Serial error: {0}")]
    Serial(String),

    /// I/O errors
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),
}

/// Result type alias for PID Scope
pub type Result<T> = std::result::Result<T, PidScopeError>;
