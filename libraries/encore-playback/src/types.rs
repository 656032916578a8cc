//! Core types for playback session control

use crate::progress::{format_time, progress_percent};
use encore_core::{Track, TrackId};
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

/// Playback status of the currently loaded track
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum PlaybackStatus {
    /// Nothing loaded
    #[default]
    Idle,

    /// Load requested, backend not ready yet
    Loading,

    /// Currently playing
    Playing,

    /// Paused mid-track
    Paused,

    /// Backend reported end of track and nothing followed it
    Ended,
}

impl PlaybackStatus {
    /// Whether a track is loaded and user transport controls apply
    pub fn has_loaded_track(self) -> bool {
        matches!(self, Self::Loading | Self::Playing | Self::Paused)
    }

    /// Lowercase name used on the wire and in the UI
    pub fn as_str(self) -> &'static str {
        match self {
            Self::Idle => "idle",
            Self::Loading => "loading",
            Self::Playing => "playing",
            Self::Paused => "paused",
            Self::Ended => "ended",
        }
    }
}

impl fmt::Display for PlaybackStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Repeat mode
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum RepeatMode {
    /// Stop when queue ends
    #[default]
    Off,

    /// Loop entire queue
    All,

    /// Loop current track only
    One,
}

impl RepeatMode {
    /// Next mode in the `off -> all -> one -> off` cycle
    pub fn cycle(self) -> Self {
        match self {
            Self::Off => Self::All,
            Self::All => Self::One,
            Self::One => Self::Off,
        }
    }

    /// Lowercase name used on the wire and in the UI
    pub fn as_str(self) -> &'static str {
        match self {
            Self::Off => "off",
            Self::All => "all",
            Self::One => "one",
        }
    }
}

impl fmt::Display for RepeatMode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for RepeatMode {
    type Err = String;

    fn from_str(s: &str) -> std::result::Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "off" => Ok(Self::Off),
            "all" => Ok(Self::All),
            "one" => Ok(Self::One),
            other => Err(format!(
                "Invalid repeat mode '{other}'. Use 'off', 'all', or 'one'"
            )),
        }
    }
}

/// Load generation
///
/// Monotonically increasing tag that distinguishes successive loads.
/// Generation 0 never refers to a load.
#[derive(
    Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Default, Serialize, Deserialize,
)]
#[serde(transparent)]
pub struct LoadGeneration(u64);

impl LoadGeneration {
    /// Wrap a raw generation value
    pub const fn new(value: u64) -> Self {
        Self(value)
    }

    /// Raw generation value
    pub const fn value(self) -> u64 {
        self.0
    }

    /// The generation following this one
    #[must_use]
    pub const fn next(self) -> Self {
        Self(self.0 + 1)
    }
}

impl fmt::Display for LoadGeneration {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "#{}", self.0)
    }
}

/// Seek request
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum SeekTarget {
    /// Absolute position in seconds
    Seconds(f64),

    /// Fraction of the track duration (0.0 - 1.0)
    Fraction(f64),
}

impl SeekTarget {
    /// Seek target from a 0-100 progress slider value
    pub fn from_percent(percent: f64) -> Self {
        Self::Fraction(percent / 100.0)
    }

    /// Resolve to an absolute position clamped to `[0, duration]`
    pub fn resolve(self, duration_secs: f64) -> f64 {
        let duration = if duration_secs.is_finite() {
            duration_secs.max(0.0)
        } else {
            0.0
        };

        let position = match self {
            Self::Seconds(secs) => secs,
            Self::Fraction(fraction) => fraction.clamp(0.0, 1.0) * duration,
        };

        if position.is_nan() {
            0.0
        } else {
            position.clamp(0.0, duration)
        }
    }
}

/// Read-only projection of the session's playback state
///
/// Produced by `PlaybackSession::snapshot()`; rendering code reads this and
/// routes every change through the session's control surface.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct PlaybackState {
    /// Current status
    pub status: PlaybackStatus,

    /// Current position in seconds
    pub current_time_secs: f64,

    /// Track duration in seconds (0 until known)
    pub duration_secs: f64,

    /// Stored volume (0-100), preserved while muted
    pub volume: u8,

    /// Whether output is muted
    pub muted: bool,

    /// Whether shuffle traversal is enabled
    pub shuffle_enabled: bool,

    /// Repeat mode
    pub repeat_mode: RepeatMode,

    /// Liked track ids, sorted
    pub liked_track_ids: Vec<TrackId>,

    /// Track at the queue position
    pub current_track: Option<Track>,

    /// Queue position
    pub current_index: Option<usize>,

    /// Queue length
    pub queue_length: usize,

    /// Whether the skip-forward affordance is enabled
    pub can_skip_next: bool,

    /// Whether the skip-back affordance is enabled
    pub can_skip_previous: bool,
}

impl PlaybackState {
    /// Progress through the track (0-100)
    pub fn progress_percent(&self) -> f64 {
        progress_percent(self.current_time_secs, self.duration_secs)
    }

    /// Elapsed time as `m:ss`
    pub fn elapsed_label(&self) -> String {
        format_time(self.current_time_secs)
    }

    /// Duration as `m:ss`
    pub fn duration_label(&self) -> String {
        format_time(self.duration_secs)
    }

    /// Whether the current track is liked
    pub fn current_track_liked(&self) -> bool {
        self.current_track
            .as_ref()
            .is_some_and(|track| self.liked_track_ids.contains(&track.id))
    }
}
