//! Error types for the MoodNest client.

use moodnest_scene::SceneError;

/// Top-level error type for voice sessions, polling and scene wiring.
#[derive(Debug, thiserror::Error)]
pub enum MoodError {
    /// Microphone access was refused or the input device could not start.
    #[error("microphone unavailable: {0}")]
    PermissionDenied(String),

    /// The analysis service could not be reached (transport error or timeout).
    #[error("network unavailable: {0}")]
    NetworkUnavailable(String),

    /// The service answered but could not produce a mood.
    #[error("analysis failed: {}", .0.as_deref().unwrap_or("no reason given"))]
    AnalysisFailed(Option<String>),

    /// A synthesised reply could not be decoded.
    #[error("decode failed: {0}")]
    DecodeFailed(String),

    /// Another voice session is already recording or processing.
    #[error("another voice session is in progress")]
    SessionBusy,

    /// Audio device or stream error outside microphone acquisition.
    #[error("audio error: {0}")]
    Audio(String),

    /// Configuration error.
    #[error("config error: {0}")]
    Config(String),

    /// Scene import or instrumentation error.
    #[error("scene error: {0}")]
    Scene(#[from] SceneError),

    /// I/O error.
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),
}

impl MoodError {
    /// Whether the failure should be shown to the user rather than only logged.
    pub fn is_user_visible(&self) -> bool {
        matches!(
            self,
            Self::PermissionDenied(_) | Self::AnalysisFailed(_) | Self::SessionBusy
        )
    }
}

/// Convenience result type.
pub type Result<T> = std::result::Result<T, MoodError>;
