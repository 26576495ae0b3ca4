//! Error types for media playback and configuration
//!
//! Neither kind is fatal: media errors degrade to silence or a force-play
//! button, configuration errors fall back to defaults.

use thiserror::Error;

/// Media collaborator failures
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum MediaError {
    /// Browser refused to start playback (autoplay policy)
    #[error("playback rejected: {0}")]
    PlaybackRejected(String),

    /// Expected media element is not in the document
    #[error("media element not found: #{0}")]
    ElementMissing(String),

    /// Media element reported an error while loading or decoding
    #[error("media error: {0}")]
    Decode(String),

    /// Audio output could not be created
    #[error("audio unavailable: {0}")]
    AudioUnavailable(String),
}

/// Configuration loading failures
#[derive(Error, Debug)]
pub enum ConfigError {
    /// Config file could not be read
    #[error("failed to read config: {0}")]
    Io(#[from] std::io::Error),

    /// Config document is not valid JSON for `Settings`
    #[error("failed to parse config: {0}")]
    Parse(#[from] serde_json::Error),

    /// A field is outside its allowed range
    #[error("invalid value for {field}: {reason}")]
    InvalidValue { field: &'static str, reason: String },
}
