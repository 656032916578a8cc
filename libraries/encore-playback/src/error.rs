//! Error types for playback session control

use encore_core::TrackId;
use thiserror::Error;

/// Playback errors
///
/// Every variant is recoverable: the session stays usable and the queue
/// position is never lost because of one of these.
#[derive(Debug, Clone, PartialEq, Error)]
pub enum PlaybackError {
    /// Attempted to start playback from zero tracks
    #[error("Queue is empty")]
    EmptyQueue,

    /// Requested start track is not in the supplied list
    #[error("Track {track_id} is not in the supplied queue")]
    InvalidQueueState {
        /// The missing start track
        track_id: TrackId,
    },

    /// A backend read was issued before the current load became ready
    #[error("Media backend is not ready")]
    BackendNotReady,

    /// Seek requested with no track loaded
    #[error("No track loaded to seek in")]
    SeekOutOfLoadedTrack,

    /// The backend could not initialize the requested track
    #[error("Failed to load track {track_id}: {reason}")]
    BackendLoadFailure {
        /// Track that failed to load
        track_id: TrackId,
        /// Backend-supplied reason
        reason: String,
    },

    /// Queue index out of bounds
    #[error("Index out of bounds: {0}")]
    IndexOutOfBounds(usize),

    /// The session runner has stopped
    #[error("Playback session is closed")]
    SessionClosed,

    /// Configuration could not be loaded or is invalid
    #[error("Configuration error: {0}")]
    Config(String),
}

impl PlaybackError {
    /// Create a backend load failure
    pub fn load_failure(track_id: &TrackId, reason: impl Into<String>) -> Self {
        Self::BackendLoadFailure {
            track_id: track_id.clone(),
            reason: reason.into(),
        }
    }
}

impl From<config::ConfigError> for PlaybackError {
    fn from(err: config::ConfigError) -> Self {
        Self::Config(err.to_string())
    }
}

/// Result type for playback operations
pub type Result<T> = std::result::Result<T, PlaybackError>;
