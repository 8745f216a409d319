//! Error types for the tracking engine.

use html::DomError;
use thiserror::Error;

#[derive(Debug, Error)]
pub enum TrackError {
    /// Invalid constructor options
    #[error("Invalid configuration: {message}")]
    Config { message: String },

    /// A configured plugin name has no registered factory
    #[error("Plugin '{name}' is not registered")]
    UnknownPlugin { name: String },

    /// A plugin rejected its settings
    #[error("Invalid settings for plugin '{name}': {message}")]
    PluginSettings { name: String, message: String },

    /// A node or range lies outside the editable root
    #[error("Position is outside the editable root")]
    OutsideRoot,

    #[error("DOM error: {0}")]
    Dom(#[from] DomError),

    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),
}

impl TrackError {
    pub fn config(message: impl Into<String>) -> Self {
        TrackError::Config {
            message: message.into(),
        }
    }
}

pub type TrackResult<T> = Result<T, TrackError>;
