use std::path::PathBuf;

use thiserror::Error;

/// Startup-time configuration problems. Always fatal.
#[derive(Error, Debug)]
pub enum ConfigError {
    #[error("invalid value for {key}: {value:?}")]
    InvalidEnv { key: &'static str, value: String },

    #[error("failed to read config file {path}: {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("malformed market config: {0}")]
    Parse(#[from] serde_json::Error),

    #[error("no instruments configured")]
    EmptyInstruments,

    #[error("duplicate instrument name: {0}")]
    DuplicateInstrument(String),

    #[error("spread name collides with another subject: {0}")]
    DuplicateSubject(String),

    #[error("threshold for {subject} must satisfy min < max (min={min}, max={max})")]
    InvalidThreshold { subject: String, min: f64, max: f64 },

    #[error("threshold refers to unknown subject: {0}")]
    UnknownSubject(String),

    #[error("spread {spread} refers to unknown instrument {leg}")]
    UnknownSpreadLeg { spread: String, leg: String },

    #[error("history capacity must be at least 1")]
    ZeroCapacity,

    #[error("poll interval must be non-zero")]
    ZeroInterval,
}

/// Failure of a whole poll cycle. The loop logs it and waits for the next tick.
#[derive(Error, Debug)]
pub enum CycleError {
    #[error("poll cycle panicked: {0}")]
    Panicked(String),
}
