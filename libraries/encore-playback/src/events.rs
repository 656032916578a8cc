//! Playback events
//!
//! Event-based communication for UI synchronization. The session queues an
//! event for every observable change; the host drains them after each call
//! (or receives them from the runner's event channel).

use crate::types::{LoadGeneration, PlaybackStatus, RepeatMode};
use encore_core::TrackId;
use serde::{Deserialize, Serialize};

/// Events emitted by the playback session
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "camelCase")]
pub enum PlaybackEvent {
    /// Playback status changed
    StateChanged {
        /// The new status
        status: PlaybackStatus,
    },

    /// A different track (or the same slot again) was loaded
    #[serde(rename_all = "camelCase")]
    TrackChanged {
        /// ID of the new (current) track
        track_id: TrackId,
        /// ID of the previous track (if any)
        previous_track_id: Option<TrackId>,
        /// Load generation of the new track
        generation: LoadGeneration,
    },

    /// Track finished playing naturally (reached end)
    #[serde(rename_all = "camelCase")]
    TrackFinished {
        /// ID of the finished track
        track_id: TrackId,
    },

    /// Position update (periodic poll or seek)
    #[serde(rename_all = "camelCase")]
    PositionUpdate {
        /// Current position in seconds
        position_secs: f64,
        /// Track duration in seconds
        duration_secs: f64,
    },

    /// Volume changed
    #[serde(rename_all = "camelCase")]
    VolumeChanged {
        /// Stored volume level (0-100)
        level: u8,
        /// Whether audio is muted
        is_muted: bool,
    },

    /// Queue replaced, cleared or repositioned
    #[serde(rename_all = "camelCase")]
    QueueChanged {
        /// New queue length
        length: usize,
        /// New position
        current_index: Option<usize>,
    },

    /// Shuffle toggled
    ShuffleChanged {
        /// Whether shuffle is now on
        enabled: bool,
    },

    /// Repeat mode changed
    RepeatModeChanged {
        /// The new mode
        mode: RepeatMode,
    },

    /// A track was liked or unliked
    #[serde(rename_all = "camelCase")]
    LikeChanged {
        /// Affected track
        track_id: TrackId,
        /// New like state
        liked: bool,
    },

    /// Recoverable error to surface as a transient notice
    Error {
        /// Error message
        message: String,
    },
}
