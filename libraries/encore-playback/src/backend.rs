//! Platform-agnostic media backend
//!
//! Abstracts the thing that actually renders audio: an embedded web player
//! in the browser, a simulated clock in the CLI, a recording mock in tests.

use crate::error::Result;
use crate::types::LoadGeneration;
use encore_core::TrackId;
use serde::{Deserialize, Serialize};
use tokio::sync::mpsc;

/// Platform-agnostic media backend
///
/// Commands are fire-and-forget. Asynchronous outcomes (ready, ended, load
/// failure) come back as [`BackendNotification`]s tagged with the generation
/// passed to [`MediaBackend::load`].
pub trait MediaBackend {
    /// Start loading a track
    ///
    /// # Returns
    /// * `Ok(())` - Load started; readiness is reported later
    /// * `Err(_)` - Backend rejected the load synchronously
    fn load(&mut self, track_id: &TrackId, autoplay: bool, generation: LoadGeneration)
        -> Result<()>;

    /// Resume output
    fn play(&mut self);

    /// Pause output
    fn pause(&mut self);

    /// Move the playhead (already clamped to the track)
    fn seek_to(&mut self, secs: f64);

    /// Playhead position in seconds
    fn current_time(&self) -> f64;

    /// Track duration in seconds as reported by the backend
    fn duration(&self) -> f64;

    /// Output level (0-100, 0 while muted)
    fn set_volume(&mut self, level: u8);

    /// Release the loaded track
    fn teardown(&mut self);
}

/// What a backend reported
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum NotificationKind {
    /// Track loaded; duration now known
    Ready {
        /// Duration in seconds
        duration_secs: f64,
    },

    /// Track played to the end
    Ended,

    /// Track could not be loaded
    LoadFailed {
        /// Backend-supplied reason
        reason: String,
    },
}

/// Backend report tagged with the load it belongs to
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct BackendNotification {
    /// Load generation the report belongs to
    pub generation: LoadGeneration,

    /// What happened
    pub kind: NotificationKind,
}

impl BackendNotification {
    /// Track is ready
    pub fn ready(generation: LoadGeneration, duration_secs: f64) -> Self {
        Self {
            generation,
            kind: NotificationKind::Ready { duration_secs },
        }
    }

    /// Track ended
    pub fn ended(generation: LoadGeneration) -> Self {
        Self {
            generation,
            kind: NotificationKind::Ended,
        }
    }

    /// Track failed to load
    pub fn load_failed(generation: LoadGeneration, reason: impl Into<String>) -> Self {
        Self {
            generation,
            kind: NotificationKind::LoadFailed {
                reason: reason.into(),
            },
        }
    }
}

/// Cloneable handle backends use to report back to the session
#[derive(Debug, Clone)]
pub struct NotificationSender(mpsc::UnboundedSender<BackendNotification>);

/// Receiving end consumed by the session runner
pub type NotificationReceiver = mpsc::UnboundedReceiver<BackendNotification>;

/// Create a notification channel
pub fn notification_channel() -> (NotificationSender, NotificationReceiver) {
    let (tx, rx) = mpsc::unbounded_channel();
    (NotificationSender(tx), rx)
}

impl NotificationSender {
    /// Send a notification
    ///
    /// Returns `false` if the session is gone.
    pub fn notify(&self, notification: BackendNotification) -> bool {
        self.0.send(notification).is_ok()
    }

    /// Report ready
    pub fn ready(&self, generation: LoadGeneration, duration_secs: f64) -> bool {
        self.notify(BackendNotification::ready(generation, duration_secs))
    }

    /// Report end of track
    pub fn ended(&self, generation: LoadGeneration) -> bool {
        self.notify(BackendNotification::ended(generation))
    }

    /// Report load failure
    pub fn load_failed(&self, generation: LoadGeneration, reason: impl Into<String>) -> bool {
        self.notify(BackendNotification::load_failed(generation, reason))
    }
}

/// Call recorded by [`RecordingBackend`]
#[cfg(test)]
#[derive(Debug, Clone, PartialEq)]
pub enum BackendCall {
    Load {
        track_id: TrackId,
        autoplay: bool,
        generation: LoadGeneration,
    },
    Play,
    Pause,
    SeekTo(f64),
    SetVolume(u8),
    Teardown,
}

/// Backend that records every call, for testing
#[cfg(test)]
#[derive(Debug, Default)]
pub struct RecordingBackend {
    pub calls: Vec<BackendCall>,
    pub position: f64,
    pub reported_duration: f64,
    pub reject_loads: bool,
}

#[cfg(test)]
impl RecordingBackend {
    pub fn take_calls(&mut self) -> Vec<BackendCall> {
        std::mem::take(&mut self.calls)
    }
}

#[cfg(test)]
impl MediaBackend for RecordingBackend {
    fn load(
        &mut self,
        track_id: &TrackId,
        autoplay: bool,
        generation: LoadGeneration,
    ) -> Result<()> {
        if self.reject_loads {
            return Err(crate::error::PlaybackError::load_failure(
                track_id,
                "rejected",
            ));
        }
        self.calls.push(BackendCall::Load {
            track_id: track_id.clone(),
            autoplay,
            generation,
        });
        Ok(())
    }

    fn play(&mut self) {
        self.calls.push(BackendCall::Play);
    }

    fn pause(&mut self) {
        self.calls.push(BackendCall::Pause);
    }

    fn seek_to(&mut self, secs: f64) {
        self.position = secs;
        self.calls.push(BackendCall::SeekTo(secs));
    }

    fn current_time(&self) -> f64 {
        self.position
    }

    fn duration(&self) -> f64 {
        self.reported_duration
    }

    fn set_volume(&mut self, level: u8) {
        self.calls.push(BackendCall::SetVolume(level));
    }

    fn teardown(&mut self) {
        self.calls.push(BackendCall::Teardown);
    }
}
