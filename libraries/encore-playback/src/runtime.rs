//! Async session runner
//!
//! Drives a [`PlaybackSession`] from a single tokio task: user commands,
//! backend notifications and the progress poll are serialized through one
//! `select!` loop, so the session itself never needs to be `Send` or locked.

use crate::backend::{MediaBackend, NotificationReceiver};
use crate::config::PlaybackConfig;
use crate::error::{PlaybackError, Result};
use crate::events::PlaybackEvent;
use crate::session::PlaybackSession;
use crate::types::{LoadGeneration, PlaybackState, RepeatMode, SeekTarget};
use encore_core::{Track, TrackId};
use std::time::Duration;
use tokio::sync::{mpsc, oneshot};
use tokio::time::{self, Instant, Interval, MissedTickBehavior};
use tracing::{debug, info, warn};

/// Control sent to a running session
#[derive(Debug)]
pub enum SessionCommand {
    /// Play a track, optionally within a context list
    PlayTrack {
        /// Track to start
        track: Track,
        /// Full list the track was picked from
        context: Option<Vec<Track>>,
    },
    /// Toggle play/pause
    TogglePlayPause,
    /// Resume
    Play,
    /// Pause
    Pause,
    /// Skip forward
    SkipNext,
    /// Skip back
    SkipPrevious,
    /// Jump to a queue slot
    JumpTo(usize),
    /// Seek within the loaded track
    Seek(SeekTarget),
    /// Set volume (0-100)
    SetVolume(u8),
    /// Toggle mute
    ToggleMute,
    /// Mute or unmute
    SetMuted(bool),
    /// Toggle shuffle
    ToggleShuffle,
    /// Cycle repeat mode
    CycleRepeatMode,
    /// Set repeat mode
    SetRepeatMode(RepeatMode),
    /// Flip a track's like state
    ToggleLiked(TrackId),
    /// Close the playback surface
    Dismiss,
    /// Reply with a state snapshot
    Snapshot(oneshot::Sender<PlaybackState>),
    /// Stop the runner
    Shutdown,
}

/// Cloneable handle to a running session
#[derive(Debug, Clone)]
pub struct SessionHandle {
    commands: mpsc::UnboundedSender<SessionCommand>,
}

impl SessionHandle {
    /// Send a command
    pub fn send(&self, command: SessionCommand) -> Result<()> {
        self.commands
            .send(command)
            .map_err(|_| PlaybackError::SessionClosed)
    }

    /// Play a track, optionally within a context list
    pub fn play_track(&self, track: Track, context: Option<Vec<Track>>) -> Result<()> {
        self.send(SessionCommand::PlayTrack { track, context })
    }

    /// Toggle play/pause
    pub fn toggle_play_pause(&self) -> Result<()> {
        self.send(SessionCommand::TogglePlayPause)
    }

    /// Skip forward
    pub fn skip_next(&self) -> Result<()> {
        self.send(SessionCommand::SkipNext)
    }

    /// Skip back
    pub fn skip_previous(&self) -> Result<()> {
        self.send(SessionCommand::SkipPrevious)
    }

    /// Seek within the loaded track
    pub fn seek(&self, target: SeekTarget) -> Result<()> {
        self.send(SessionCommand::Seek(target))
    }

    /// Set volume (0-100)
    pub fn set_volume(&self, level: u8) -> Result<()> {
        self.send(SessionCommand::SetVolume(level))
    }

    /// Current state
    pub async fn snapshot(&self) -> Result<PlaybackState> {
        let (reply, response) = oneshot::channel();
        self.send(SessionCommand::Snapshot(reply))?;
        response.await.map_err(|_| PlaybackError::SessionClosed)
    }

    /// Stop the runner
    pub fn shutdown(&self) -> Result<()> {
        self.send(SessionCommand::Shutdown)
    }
}

/// Owns a session and runs its event loop
pub struct SessionRunner<B> {
    session: PlaybackSession<B>,
    commands: mpsc::UnboundedReceiver<SessionCommand>,
    notifications: NotificationReceiver,
    events: mpsc::UnboundedSender<PlaybackEvent>,
    poll_interval: Duration,
}

impl<B: MediaBackend> SessionRunner<B> {
    /// Wrap a session
    ///
    /// Returns the runner, a handle for sending commands, and the stream of
    /// session events.
    pub fn new(
        session: PlaybackSession<B>,
        notifications: NotificationReceiver,
        config: &PlaybackConfig,
    ) -> (Self, SessionHandle, mpsc::UnboundedReceiver<PlaybackEvent>) {
        let (command_tx, command_rx) = mpsc::unbounded_channel();
        let (event_tx, event_rx) = mpsc::unbounded_channel();

        let runner = Self {
            session,
            commands: command_rx,
            notifications,
            events: event_tx,
            poll_interval: config.poll_interval(),
        };

        (runner, SessionHandle { commands: command_tx }, event_rx)
    }

    /// Run until shutdown or until every handle is dropped
    ///
    /// The session is dismissed on exit and handed back.
    pub async fn run(mut self) -> PlaybackSession<B> {
        info!(poll_interval_ms = self.poll_interval.as_millis() as u64, "Session runner started");

        let mut armed = self.session.generation();
        let mut ticker = self.ticker();

        loop {
            // Notifications first: a command sent after a callback fired sees
            // its effect
            tokio::select! {
                biased;

                Some(notification) = self.notifications.recv() => {
                    if let Err(err) = self.session.handle_notification(notification) {
                        debug!(error = %err, "Backend notification produced an error");
                    }
                }
                command = self.commands.recv() => match command {
                    Some(SessionCommand::Shutdown) | None => break,
                    Some(command) => self.execute(command),
                },
                _ = ticker.tick() => {
                    self.session.poll_progress(armed);
                }
            }

            self.forward_events();

            let generation = self.session.generation();
            if generation != armed {
                debug!(from = %armed, to = %generation, "Re-arming progress poll");
                armed = generation;
                ticker = self.ticker();
            }
        }

        self.session.dismiss();
        self.forward_events();
        info!("Session runner stopped");
        self.session
    }

    /// Generation the runner's poll is currently armed for
    pub fn generation(&self) -> LoadGeneration {
        self.session.generation()
    }

    fn ticker(&self) -> Interval {
        let mut ticker = time::interval_at(Instant::now() + self.poll_interval, self.poll_interval);
        ticker.set_missed_tick_behavior(MissedTickBehavior::Delay);
        ticker
    }

    fn execute(&mut self, command: SessionCommand) {
        let session = &mut self.session;
        let result = match command {
            SessionCommand::PlayTrack { track, context } => session.play_track(track, context),
            SessionCommand::TogglePlayPause => session.toggle_play_pause(),
            SessionCommand::Play => session.play(),
            SessionCommand::Pause => session.pause(),
            SessionCommand::SkipNext => session.skip_next(),
            SessionCommand::SkipPrevious => session.skip_previous(),
            SessionCommand::JumpTo(index) => session.jump_to(index),
            SessionCommand::Seek(target) => session.seek(target),
            SessionCommand::SetVolume(level) => {
                session.set_volume(level);
                Ok(())
            }
            SessionCommand::ToggleMute => {
                session.toggle_mute();
                Ok(())
            }
            SessionCommand::SetMuted(muted) => {
                session.set_muted(muted);
                Ok(())
            }
            SessionCommand::ToggleShuffle => {
                session.toggle_shuffle();
                Ok(())
            }
            SessionCommand::CycleRepeatMode => {
                session.cycle_repeat_mode();
                Ok(())
            }
            SessionCommand::SetRepeatMode(mode) => {
                session.set_repeat_mode(mode);
                Ok(())
            }
            SessionCommand::ToggleLiked(track_id) => {
                session.toggle_liked(track_id);
                Ok(())
            }
            SessionCommand::Dismiss => {
                session.dismiss();
                Ok(())
            }
            SessionCommand::Snapshot(reply) => {
                // Requester may have given up waiting
                let _ = reply.send(session.snapshot());
                Ok(())
            }
            SessionCommand::Shutdown => Ok(()),
        };

        match result {
            Ok(()) => {}
            // Already surfaced as an error event by the session
            Err(err @ PlaybackError::BackendLoadFailure { .. }) => {
                debug!(error = %err, "Load failure reported");
            }
            Err(err) => {
                warn!(error = %err, "Session command failed");
                let _ = self.events.send(PlaybackEvent::Error {
                    message: err.to_string(),
                });
            }
        }
    }

    fn forward_events(&mut self) {
        // Drained even with nobody listening so the session's queue stays bounded
        for event in self.session.drain_events() {
            let _ = self.events.send(event);
        }
    }
}
