//! Error types for YoddhaNav
//!
//! Only startup can fail. Sensor and transform problems inside the control
//! loop degrade to "enemy absent" and never surface here.

use thiserror::Error;

/// YoddhaNav error type
#[derive(Error, Debug)]
pub enum YoddhaError {
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    #[error("Configuration error: {0}")]
    Config(String),

    #[error("Waypoint error: {0}")]
    Waypoint(String),
}

impl From<toml::de::Error> for YoddhaError {
    fn from(e: toml::de::Error) -> Self {
        YoddhaError::Config(e.to_string())
    }
}

pub type Result<T> = std::result::Result<T, YoddhaError>;
