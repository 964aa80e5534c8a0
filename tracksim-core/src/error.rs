//! Error types shared across the workspace

use thiserror::Error;

/// Errors raised while assembling simulation inputs
#[derive(Debug, Error)]
pub enum SimError {
    /// No vehicle preset registered under this name
    #[error("unknown vehicle preset '{0}'")]
    UnknownPreset(String),

    /// Track geometry failed validation
    #[error("invalid track: {0}")]
    InvalidTrack(String),

    /// Run configuration failed validation
    #[error("invalid configuration: {0}")]
    InvalidConfig(String),
}
