//! Playback status transitions
//!
//! ```text
//! idle ──load──▶ loading ──ready──▶ playing ◀──toggle──▶ paused
//!                   ▲                  │
//!                   └──────load────── ended
//! ```
//!
//! Any state may start a new load. A load failure drops back to idle.
//! Transition methods return the new status when it changed.

use crate::types::PlaybackStatus;
use tracing::debug;

/// Status plus the timing fields written by backend notifications and polls
#[derive(Debug, Clone, PartialEq)]
pub struct PlaybackStateMachine {
    status: PlaybackStatus,
    autoplay: bool,
    current_time: f64,
    duration: f64,
}

impl PlaybackStateMachine {
    /// Start idle
    pub fn new() -> Self {
        Self {
            status: PlaybackStatus::Idle,
            autoplay: false,
            current_time: 0.0,
            duration: 0.0,
        }
    }

    /// Current status
    pub fn status(&self) -> PlaybackStatus {
        self.status
    }

    /// Whether the pending (or last) load should start playing when ready
    pub fn autoplay(&self) -> bool {
        self.autoplay
    }

    /// Position in seconds
    pub fn current_time(&self) -> f64 {
        self.current_time
    }

    /// Duration in seconds (0 until ready)
    pub fn duration(&self) -> f64 {
        self.duration
    }

    /// A new track load was issued
    pub fn load_track(&mut self, autoplay: bool) -> Option<PlaybackStatus> {
        self.autoplay = autoplay;
        self.current_time = 0.0;
        self.duration = 0.0;
        self.transition(PlaybackStatus::Loading)
    }

    /// Backend reported the current load is ready
    ///
    /// Ignored unless loading.
    pub fn backend_ready(&mut self, duration_secs: f64) -> Option<PlaybackStatus> {
        if self.status != PlaybackStatus::Loading {
            debug!(status = %self.status, "Ready outside of loading ignored");
            return None;
        }

        self.duration = sanitize(duration_secs);
        let next = if self.autoplay {
            PlaybackStatus::Playing
        } else {
            PlaybackStatus::Paused
        };
        self.transition(next)
    }

    /// User play/pause toggle
    ///
    /// While loading this flips the autoplay intent instead.
    pub fn toggle(&mut self) -> Option<PlaybackStatus> {
        match self.status {
            PlaybackStatus::Loading => {
                self.autoplay = !self.autoplay;
                None
            }
            PlaybackStatus::Playing => self.transition(PlaybackStatus::Paused),
            PlaybackStatus::Paused => self.transition(PlaybackStatus::Playing),
            PlaybackStatus::Idle | PlaybackStatus::Ended => None,
        }
    }

    /// Idempotent play
    pub fn play(&mut self) -> Option<PlaybackStatus> {
        match self.status {
            PlaybackStatus::Loading => {
                self.autoplay = true;
                None
            }
            PlaybackStatus::Paused => self.transition(PlaybackStatus::Playing),
            _ => None,
        }
    }

    /// Idempotent pause
    pub fn pause(&mut self) -> Option<PlaybackStatus> {
        match self.status {
            PlaybackStatus::Loading => {
                self.autoplay = false;
                None
            }
            PlaybackStatus::Playing => self.transition(PlaybackStatus::Paused),
            _ => None,
        }
    }

    /// Backend reported end of track
    pub fn backend_ended(&mut self) -> Option<PlaybackStatus> {
        match self.status {
            PlaybackStatus::Playing | PlaybackStatus::Paused => {
                self.current_time = self.duration;
                self.transition(PlaybackStatus::Ended)
            }
            _ => None,
        }
    }

    /// Play the loaded track again from the start (repeat-one)
    pub fn restart(&mut self) -> Option<PlaybackStatus> {
        match self.status {
            PlaybackStatus::Ended | PlaybackStatus::Playing | PlaybackStatus::Paused => {
                self.current_time = 0.0;
                self.transition(PlaybackStatus::Playing)
            }
            _ => None,
        }
    }

    /// Backend could not load the track
    pub fn load_failed(&mut self) -> Option<PlaybackStatus> {
        self.reset()
    }

    /// Back to idle with cleared timing
    pub fn reset(&mut self) -> Option<PlaybackStatus> {
        self.autoplay = false;
        self.current_time = 0.0;
        self.duration = 0.0;
        self.transition(PlaybackStatus::Idle)
    }

    /// Record a polled position
    pub fn update_time(&mut self, secs: f64) {
        self.current_time = self.clamp_to_duration(secs);
    }

    /// Record the backend's duration once known
    pub fn update_duration(&mut self, secs: f64) {
        self.duration = sanitize(secs);
    }

    /// A seek was applied
    ///
    /// Seeking an ended track parks it paused at the new position.
    pub fn seeked(&mut self, secs: f64) -> Option<PlaybackStatus> {
        self.current_time = self.clamp_to_duration(secs);
        if self.status == PlaybackStatus::Ended {
            self.transition(PlaybackStatus::Paused)
        } else {
            None
        }
    }

    fn clamp_to_duration(&self, secs: f64) -> f64 {
        let secs = sanitize(secs);
        if self.duration > 0.0 {
            secs.min(self.duration)
        } else {
            secs
        }
    }

    fn transition(&mut self, next: PlaybackStatus) -> Option<PlaybackStatus> {
        if self.status == next {
            return None;
        }
        debug!(from = %self.status, to = %next, "Playback status changed");
        self.status = next;
        Some(next)
    }
}

impl Default for PlaybackStateMachine {
    fn default() -> Self {
        Self::new()
    }
}

fn sanitize(secs: f64) -> f64 {
    if secs.is_finite() {
        secs.max(0.0)
    } else {
        0.0
    }
}
