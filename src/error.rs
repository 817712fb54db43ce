//! Error types for construction-time APIs
//!
//! The per-tick path never fails; these only surface while building a
//! lookup table or loading configuration.

use thiserror::Error;

/// Lookup-table construction failures
#[derive(Debug, Error)]
pub enum FieldError {
    #[error("lookup table has zero-sized dimensions ({width}x{height})")]
    EmptyTable { width: usize, height: usize },
    #[error("lookup table expects {expected} bytes for {width}x{height}, got {actual}")]
    SizeMismatch {
        width: usize,
        height: usize,
        expected: usize,
        actual: usize,
    },
}

/// Configuration loading/validation failures
#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("failed to read config: {0}")]
    Io(#[from] std::io::Error),
    #[error("failed to parse config: {0}")]
    Parse(#[from] serde_json::Error),
    #[error("invalid tuning: {0}")]
    InvalidTuning(String),
    #[error("invalid settings: {0}")]
    InvalidSettings(String),
}
