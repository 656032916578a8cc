//! Playback session
//!
//! The single owner of queue and playback state. Every user control and
//! every backend notification funnels through here; rendering code reads
//! [`PlaybackSession::snapshot`] and never mutates state directly.

use crate::adapter::MediaBackendAdapter;
use crate::backend::{BackendNotification, MediaBackend, NotificationKind};
use crate::config::PlaybackConfig;
use crate::error::{PlaybackError, Result};
use crate::events::PlaybackEvent;
use crate::queue::{EndOfTrack, QueueManager};
use crate::state_machine::PlaybackStateMachine;
use crate::types::{LoadGeneration, PlaybackState, PlaybackStatus, RepeatMode, SeekTarget};
use crate::volume::Volume;
use encore_core::{LikeStore, LikedTracks, Track, TrackId};
use tracing::{debug, info, warn};

/// Playback session controller
pub struct PlaybackSession<B> {
    queue: QueueManager,
    machine: PlaybackStateMachine,
    adapter: MediaBackendAdapter<B>,
    volume: Volume,
    likes: LikedTracks,

    // Event queue for UI synchronization
    pending_events: Vec<PlaybackEvent>,
}

impl<B: MediaBackend> PlaybackSession<B> {
    /// Create a session driving `backend`
    pub fn new(backend: B, config: &PlaybackConfig) -> Self {
        Self::with_queue_manager(backend, config, QueueManager::new())
    }

    /// Create a session with a preconfigured queue manager
    ///
    /// Useful for a deterministic shuffle order (`QueueManager::with_seed`).
    pub fn with_queue_manager(backend: B, config: &PlaybackConfig, mut queue: QueueManager) -> Self {
        let volume = Volume::new(config.initial_volume);
        queue.set_repeat(config.repeat);
        queue.set_shuffle(config.shuffle);

        Self {
            queue,
            machine: PlaybackStateMachine::new(),
            adapter: MediaBackendAdapter::new(backend, volume.effective_level()),
            volume,
            likes: LikedTracks::new(),
            pending_events: Vec::new(),
        }
    }

    // ===== Playback Control =====

    /// Start playing `track`
    ///
    /// With a context list the queue becomes that list positioned on
    /// `track`; otherwise the queue is just `track`. Always autoplays.
    pub fn play_track(&mut self, track: Track, context: Option<Vec<Track>>) -> Result<()> {
        let start = track.id.clone();
        let tracks = context.unwrap_or_else(|| vec![track]);

        let current = self.queue.set_queue(tracks, &start)?.clone();
        info!(track_id = %current.id, queue_length = self.queue.len(), "Playing track");
        self.emit_queue_changed();

        self.load_current(&current, true)
    }

    /// Toggle between playing and paused
    ///
    /// While loading this flips whether the track starts once ready. No-op
    /// when idle or ended.
    pub fn toggle_play_pause(&mut self) -> Result<()> {
        if !self.machine.status().has_loaded_track() {
            debug!(status = %self.machine.status(), "Toggle ignored");
            return Ok(());
        }

        let changed = self.machine.toggle();
        self.sync_transport()?;
        if let Some(status) = changed {
            self.emit_state_changed(status);
        }
        Ok(())
    }

    /// Start or resume playback (idempotent)
    pub fn play(&mut self) -> Result<()> {
        if !self.machine.status().has_loaded_track() {
            return Ok(());
        }

        let changed = self.machine.play();
        self.sync_transport()?;
        if let Some(status) = changed {
            self.emit_state_changed(status);
        }
        Ok(())
    }

    /// Pause playback (idempotent)
    pub fn pause(&mut self) -> Result<()> {
        if !self.machine.status().has_loaded_track() {
            return Ok(());
        }

        let changed = self.machine.pause();
        self.sync_transport()?;
        if let Some(status) = changed {
            self.emit_state_changed(status);
        }
        Ok(())
    }

    /// Skip to the next track
    ///
    /// No-op when nothing follows.
    pub fn skip_next(&mut self) -> Result<()> {
        let Some(track) = self.queue.next().cloned() else {
            debug!("No next track");
            return Ok(());
        };

        self.emit_queue_changed();
        self.load_current(&track, true)
    }

    /// Go back one track
    ///
    /// No-op at the start of the queue.
    pub fn skip_previous(&mut self) -> Result<()> {
        if !self.queue.can_retreat() {
            debug!("No previous track");
            return Ok(());
        }

        let Some(track) = self.queue.previous().cloned() else {
            return Ok(());
        };

        self.emit_queue_changed();
        self.load_current(&track, true)
    }

    /// Jump to a queue slot and play it
    pub fn jump_to(&mut self, index: usize) -> Result<()> {
        let track = self.queue.navigate_to(index)?.clone();
        self.emit_queue_changed();
        self.load_current(&track, true)
    }

    /// Seek within the loaded track
    ///
    /// Before the backend is ready the seek is held and applied on ready.
    pub fn seek(&mut self, target: SeekTarget) -> Result<()> {
        let Some(secs) = self.adapter.seek_to(target)? else {
            return Ok(());
        };

        if let Some(status) = self.machine.seeked(secs) {
            self.emit_state_changed(status);
        }
        self.emit_position_update();
        Ok(())
    }

    // ===== Volume =====

    /// Set volume (0-100, clamped)
    ///
    /// Zero mutes; any audible level while muted unmutes.
    pub fn set_volume(&mut self, level: u8) {
        self.volume.set_level(level);
        self.adapter.set_volume(self.volume.effective_level());
        self.emit_volume_changed();
    }

    /// Toggle mute, keeping the stored level
    pub fn toggle_mute(&mut self) {
        self.volume.toggle_mute();
        self.adapter.set_volume(self.volume.effective_level());
        self.emit_volume_changed();
    }

    /// Mute or unmute (idempotent), keeping the stored level
    pub fn set_muted(&mut self, muted: bool) {
        if self.volume.is_muted() == muted {
            return;
        }

        if muted {
            self.volume.mute();
        } else {
            self.volume.unmute();
        }
        self.adapter.set_volume(self.volume.effective_level());
        self.emit_volume_changed();
    }

    // ===== Shuffle & Repeat =====

    /// Toggle shuffle traversal
    pub fn toggle_shuffle(&mut self) -> bool {
        let enabled = !self.queue.shuffle_enabled();
        self.queue.set_shuffle(enabled);
        self.pending_events
            .push(PlaybackEvent::ShuffleChanged { enabled });
        enabled
    }

    /// Advance repeat mode `off -> all -> one -> off`
    pub fn cycle_repeat_mode(&mut self) -> RepeatMode {
        let mode = self.queue.repeat().cycle();
        self.set_repeat_mode(mode);
        mode
    }

    /// Set repeat mode directly
    pub fn set_repeat_mode(&mut self, mode: RepeatMode) {
        self.queue.set_repeat(mode);
        self.pending_events
            .push(PlaybackEvent::RepeatModeChanged { mode });
    }

    // ===== Likes =====

    /// Mark or unmark a track as liked
    pub fn set_liked(&mut self, track_id: TrackId, liked: bool) {
        self.likes.set_liked(track_id.clone(), liked);
        self.pending_events
            .push(PlaybackEvent::LikeChanged { track_id, liked });
    }

    /// Flip a track's like state, returning the new value
    pub fn toggle_liked(&mut self, track_id: TrackId) -> bool {
        let liked = !self.likes.is_liked(&track_id);
        self.set_liked(track_id, liked);
        liked
    }

    /// Flip the current track's like state
    pub fn toggle_current_liked(&mut self) -> Option<bool> {
        let track_id = self.queue.current()?.id.clone();
        Some(self.toggle_liked(track_id))
    }

    /// Whether a track is liked
    pub fn is_liked(&self, track_id: &TrackId) -> bool {
        self.likes.is_liked(track_id)
    }

    /// Liked tracks
    pub fn likes(&self) -> &LikedTracks {
        &self.likes
    }

    // ===== Lifecycle =====

    /// Close the playback surface
    ///
    /// Tears the backend down, clears the queue and returns to idle.
    pub fn dismiss(&mut self) {
        info!("Dismissing playback session");
        self.adapter.teardown();
        if let Some(status) = self.machine.reset() {
            self.emit_state_changed(status);
        }
        if !self.queue.is_empty() {
            self.queue.clear();
            self.emit_queue_changed();
        }
    }

    // ===== Backend Input =====

    /// Apply a backend notification
    ///
    /// Stale notifications are dropped. A load failure returns the session
    /// to idle on the same queue slot and is returned as an error after the
    /// error event is queued.
    pub fn handle_notification(&mut self, notification: BackendNotification) -> Result<()> {
        let loaded = self.adapter.loaded_track_id().cloned();
        let Some(kind) = self.adapter.accept(notification) else {
            return Ok(());
        };

        match kind {
            NotificationKind::Ready { duration_secs } => {
                if let Some(status) = self.machine.backend_ready(duration_secs) {
                    self.emit_state_changed(status);
                }
                // Picks up a seek flushed on ready
                if let Ok(secs) = self.adapter.current_time() {
                    self.machine.update_time(secs);
                }
                self.emit_position_update();
                Ok(())
            }
            NotificationKind::Ended => self.on_track_ended(),
            NotificationKind::LoadFailed { reason } => {
                // Accepted notifications always belong to a loaded track
                let err = match loaded {
                    Some(track_id) => PlaybackError::load_failure(&track_id, reason),
                    None => PlaybackError::BackendNotReady,
                };
                self.fail_load(&err);
                Err(err)
            }
        }
    }

    /// Record the backend position for a poll tick
    ///
    /// Returns `false` if the tick belongs to an earlier load or nothing is
    /// playing.
    pub fn poll_progress(&mut self, generation: LoadGeneration) -> bool {
        if generation != self.adapter.generation() {
            debug!(%generation, current = %self.adapter.generation(), "Stale poll tick dropped");
            return false;
        }

        if self.machine.status() != PlaybackStatus::Playing {
            return false;
        }

        match self.adapter.current_time() {
            Ok(secs) => {
                self.machine.update_time(secs);
                self.emit_position_update();
                true
            }
            Err(_) => false,
        }
    }

    // ===== State Queries =====

    /// Read-only projection for rendering
    pub fn snapshot(&self) -> PlaybackState {
        PlaybackState {
            status: self.machine.status(),
            current_time_secs: self.machine.current_time(),
            duration_secs: self.machine.duration(),
            volume: self.volume.level(),
            muted: self.volume.is_muted(),
            shuffle_enabled: self.queue.shuffle_enabled(),
            repeat_mode: self.queue.repeat(),
            liked_track_ids: self.likes.sorted_ids(),
            current_track: self.queue.current().cloned(),
            current_index: self.queue.current_index(),
            queue_length: self.queue.len(),
            can_skip_next: self.can_skip_next(),
            can_skip_previous: self.can_skip_previous(),
        }
    }

    /// Current status
    pub fn status(&self) -> PlaybackStatus {
        self.machine.status()
    }

    /// Track at the queue position
    pub fn current_track(&self) -> Option<&Track> {
        self.queue.current()
    }

    /// Queue position
    pub fn current_index(&self) -> Option<usize> {
        self.queue.current_index()
    }

    /// The queue
    pub fn queue(&self) -> &QueueManager {
        &self.queue
    }

    /// Whether skip-forward is enabled
    pub fn can_skip_next(&self) -> bool {
        self.queue.can_advance()
    }

    /// Whether skip-back is enabled
    pub fn can_skip_previous(&self) -> bool {
        self.queue.can_retreat()
    }

    /// Stored volume (0-100)
    pub fn volume(&self) -> u8 {
        self.volume.level()
    }

    /// Whether output is muted
    pub fn is_muted(&self) -> bool {
        self.volume.is_muted()
    }

    /// Whether shuffle is enabled
    pub fn shuffle_enabled(&self) -> bool {
        self.queue.shuffle_enabled()
    }

    /// Repeat mode
    pub fn repeat_mode(&self) -> RepeatMode {
        self.queue.repeat()
    }

    /// Current load generation
    pub fn generation(&self) -> LoadGeneration {
        self.adapter.generation()
    }

    /// Position in seconds
    pub fn current_time(&self) -> f64 {
        self.machine.current_time()
    }

    /// Duration in seconds (0 until ready)
    pub fn duration(&self) -> f64 {
        self.machine.duration()
    }

    /// The media backend
    pub fn backend(&self) -> &B {
        self.adapter.backend()
    }

    /// The media backend, mutably
    pub fn backend_mut(&mut self) -> &mut B {
        self.adapter.backend_mut()
    }

    // ===== Events =====

    /// Drain all pending events
    ///
    /// Returns all events emitted since the last drain.
    pub fn drain_events(&mut self) -> Vec<PlaybackEvent> {
        std::mem::take(&mut self.pending_events)
    }

    /// Check if there are pending events
    pub fn has_pending_events(&self) -> bool {
        !self.pending_events.is_empty()
    }

    // ===== Internals =====

    fn load_current(&mut self, track: &Track, autoplay: bool) -> Result<()> {
        let previous_track_id = self.adapter.loaded_track_id().cloned();

        if let Some(status) = self.machine.load_track(autoplay) {
            self.emit_state_changed(status);
        }

        match self.adapter.load(track, autoplay) {
            Ok(generation) => {
                self.pending_events.push(PlaybackEvent::TrackChanged {
                    track_id: track.id.clone(),
                    previous_track_id,
                    generation,
                });
                Ok(())
            }
            Err(err) => {
                self.fail_load(&err);
                Err(err)
            }
        }
    }

    fn on_track_ended(&mut self) -> Result<()> {
        if let Some(status) = self.machine.backend_ended() {
            self.emit_state_changed(status);
        }
        if let Some(track) = self.queue.current() {
            let track_id = track.id.clone();
            self.pending_events
                .push(PlaybackEvent::TrackFinished { track_id });
        }

        match self.queue.advance_on_end() {
            EndOfTrack::Restart => {
                self.adapter.restart()?;
                if let Some(status) = self.machine.restart() {
                    self.emit_state_changed(status);
                }
                self.emit_position_update();
                Ok(())
            }
            EndOfTrack::Advanced(index) => {
                debug!(index, "Advancing to next track");
                self.emit_queue_changed();
                match self.queue.current().cloned() {
                    Some(track) => self.load_current(&track, true),
                    None => Ok(()),
                }
            }
            EndOfTrack::Finished => {
                info!("Reached end of queue");
                Ok(())
            }
        }
    }

    fn fail_load(&mut self, err: &PlaybackError) {
        warn!(error = %err, index = ?self.queue.current_index(), "Track load failed");
        if let Some(status) = self.machine.load_failed() {
            self.emit_state_changed(status);
        }
        self.emit_error(err.to_string());
    }

    /// Push the machine's transport intent to the backend
    fn sync_transport(&mut self) -> Result<()> {
        let play = match self.machine.status() {
            PlaybackStatus::Loading => self.machine.autoplay(),
            PlaybackStatus::Playing => true,
            PlaybackStatus::Paused => false,
            PlaybackStatus::Idle | PlaybackStatus::Ended => return Ok(()),
        };

        if play {
            self.adapter.play()?;
        } else {
            self.adapter.pause()?;
        }
        Ok(())
    }

    /// Emit a state changed event
    fn emit_state_changed(&mut self, status: PlaybackStatus) {
        self.pending_events
            .push(PlaybackEvent::StateChanged { status });
    }

    /// Emit a position update event
    fn emit_position_update(&mut self) {
        self.pending_events.push(PlaybackEvent::PositionUpdate {
            position_secs: self.machine.current_time(),
            duration_secs: self.machine.duration(),
        });
    }

    /// Emit a volume changed event
    fn emit_volume_changed(&mut self) {
        self.pending_events.push(PlaybackEvent::VolumeChanged {
            level: self.volume.level(),
            is_muted: self.volume.is_muted(),
        });
    }

    /// Emit a queue changed event
    fn emit_queue_changed(&mut self) {
        self.pending_events.push(PlaybackEvent::QueueChanged {
            length: self.queue.len(),
            current_index: self.queue.current_index(),
        });
    }

    /// Emit an error event
    fn emit_error(&mut self, message: String) {
        self.pending_events.push(PlaybackEvent::Error { message });
    }
}
