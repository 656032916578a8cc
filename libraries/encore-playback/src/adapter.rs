//! Media backend adapter
//!
//! Owns the one live backend instance and shields the session from its
//! asynchrony:
//! - every load gets a fresh [`LoadGeneration`]; notifications carrying any
//!   other generation are dropped
//! - controls issued before the backend reports ready are buffered (latest
//!   transport intent, latest seek, volume) and flushed on ready
//! - reads before ready fail with [`PlaybackError::BackendNotReady`]

use crate::backend::{BackendNotification, MediaBackend, NotificationKind};
use crate::error::{PlaybackError, Result};
use crate::types::{LoadGeneration, SeekTarget};
use encore_core::{Track, TrackId};
use tracing::{debug, info, warn};

/// Whether a control reached the backend or is waiting for ready
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Dispatch {
    /// Sent to the backend
    Applied,

    /// Held until the current load is ready
    Buffered,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Transport {
    Play,
    Pause,
}

#[derive(Debug, Default)]
struct PendingControls {
    transport: Option<Transport>,
    seek: Option<SeekTarget>,
}

/// Adapter between the session and a [`MediaBackend`]
#[derive(Debug)]
pub struct MediaBackendAdapter<B> {
    backend: B,
    generation: LoadGeneration,
    loaded: Option<TrackId>,
    ready: bool,
    finished: bool,
    duration: f64,
    volume: u8,
    pending: PendingControls,
}

impl<B: MediaBackend> MediaBackendAdapter<B> {
    /// Wrap a backend
    ///
    /// `volume` is the output level applied once a track is ready.
    pub fn new(backend: B, volume: u8) -> Self {
        Self {
            backend,
            generation: LoadGeneration::default(),
            loaded: None,
            ready: false,
            finished: false,
            duration: 0.0,
            volume,
            pending: PendingControls::default(),
        }
    }

    /// Load a track, superseding whatever was loaded
    ///
    /// Tears the previous load down first. The track's known duration, if
    /// any, bounds seeks until the backend reports its own.
    pub fn load(&mut self, track: &Track, autoplay: bool) -> Result<LoadGeneration> {
        if self.loaded.is_some() {
            self.backend.teardown();
        }

        self.generation = self.generation.next();
        self.loaded = Some(track.id.clone());
        self.ready = false;
        self.finished = false;
        self.duration = track.duration_secs.unwrap_or(0.0);
        self.pending = PendingControls::default();

        info!(track_id = %track.id, generation = %self.generation, autoplay, "Loading track");

        if let Err(err) = self.backend.load(&track.id, autoplay, self.generation) {
            warn!(track_id = %track.id, error = %err, "Backend rejected load");
            self.loaded = None;
            return Err(match err {
                PlaybackError::BackendLoadFailure { .. } => err,
                other => PlaybackError::load_failure(&track.id, other.to_string()),
            });
        }

        Ok(self.generation)
    }

    /// Filter a backend notification
    ///
    /// Returns the notification's kind if it applies to the current load,
    /// `None` if it is stale or a duplicate. Accepting `Ready` flushes the
    /// buffered controls.
    pub fn accept(&mut self, notification: BackendNotification) -> Option<NotificationKind> {
        if notification.generation != self.generation || self.loaded.is_none() {
            debug!(
                generation = %notification.generation,
                current = %self.generation,
                kind = ?notification.kind,
                "Dropping stale backend notification"
            );
            return None;
        }

        match notification.kind {
            NotificationKind::Ready { duration_secs } => {
                if self.ready {
                    debug!(generation = %self.generation, "Duplicate ready ignored");
                    return None;
                }
                self.ready = true;
                if duration_secs.is_finite() && duration_secs > 0.0 {
                    self.duration = duration_secs;
                }
                self.flush_pending();
                Some(NotificationKind::Ready {
                    duration_secs: self.duration,
                })
            }
            NotificationKind::Ended => {
                if !self.ready || self.finished {
                    debug!(generation = %self.generation, "Unexpected end of track ignored");
                    return None;
                }
                self.finished = true;
                Some(NotificationKind::Ended)
            }
            NotificationKind::LoadFailed { reason } => {
                warn!(generation = %self.generation, %reason, "Backend failed to load track");
                self.loaded = None;
                self.ready = false;
                self.pending = PendingControls::default();
                Some(NotificationKind::LoadFailed { reason })
            }
        }
    }

    /// Resume output, or buffer the intent until ready
    pub fn play(&mut self) -> Result<Dispatch> {
        self.transport(Transport::Play)
    }

    /// Pause output, or buffer the intent until ready
    pub fn pause(&mut self) -> Result<Dispatch> {
        self.transport(Transport::Pause)
    }

    /// Seek within the loaded track
    ///
    /// Returns the clamped position when applied, `None` when buffered.
    pub fn seek_to(&mut self, target: SeekTarget) -> Result<Option<f64>> {
        if self.loaded.is_none() {
            return Err(PlaybackError::SeekOutOfLoadedTrack);
        }

        if !self.ready {
            debug!(?target, "Buffering seek until ready");
            self.pending.seek = Some(target);
            return Ok(None);
        }

        let secs = target.resolve(self.duration);
        self.backend.seek_to(secs);
        self.finished = false;
        Ok(Some(secs))
    }

    /// Seek to the start and resume (repeat-one)
    pub fn restart(&mut self) -> Result<()> {
        self.seek_to(SeekTarget::Seconds(0.0))?;
        self.play()?;
        Ok(())
    }

    /// Set the output level (0 while muted)
    pub fn set_volume(&mut self, level: u8) -> Dispatch {
        self.volume = level;
        if self.ready {
            self.backend.set_volume(level);
            Dispatch::Applied
        } else {
            Dispatch::Buffered
        }
    }

    /// Backend playhead position
    pub fn current_time(&self) -> Result<f64> {
        if !self.ready {
            return Err(PlaybackError::BackendNotReady);
        }
        Ok(self.backend.current_time())
    }

    /// Duration of the loaded track
    pub fn duration(&self) -> Result<f64> {
        if !self.ready {
            return Err(PlaybackError::BackendNotReady);
        }
        Ok(self.duration)
    }

    /// Release the loaded track
    ///
    /// Bumps the generation so late callbacks from the released load are
    /// stale.
    pub fn teardown(&mut self) {
        if self.loaded.take().is_some() {
            self.backend.teardown();
        }
        self.generation = self.generation.next();
        self.ready = false;
        self.finished = false;
        self.duration = 0.0;
        self.pending = PendingControls::default();
        debug!(generation = %self.generation, "Backend torn down");
    }

    /// Current load generation
    pub fn generation(&self) -> LoadGeneration {
        self.generation
    }

    /// Whether the current load is ready
    pub fn is_ready(&self) -> bool {
        self.ready
    }

    /// Id of the loaded track
    pub fn loaded_track_id(&self) -> Option<&TrackId> {
        self.loaded.as_ref()
    }

    /// The wrapped backend
    pub fn backend(&self) -> &B {
        &self.backend
    }

    /// The wrapped backend, mutably
    pub fn backend_mut(&mut self) -> &mut B {
        &mut self.backend
    }

    fn transport(&mut self, transport: Transport) -> Result<Dispatch> {
        if self.loaded.is_none() {
            return Err(PlaybackError::BackendNotReady);
        }

        if !self.ready {
            self.pending.transport = Some(transport);
            return Ok(Dispatch::Buffered);
        }

        match transport {
            Transport::Play => {
                self.finished = false;
                self.backend.play();
            }
            Transport::Pause => self.backend.pause(),
        }
        Ok(Dispatch::Applied)
    }

    fn flush_pending(&mut self) {
        let pending = std::mem::take(&mut self.pending);

        self.backend.set_volume(self.volume);

        if let Some(target) = pending.seek {
            self.backend.seek_to(target.resolve(self.duration));
        }

        match pending.transport {
            Some(Transport::Play) => self.backend.play(),
            Some(Transport::Pause) => self.backend.pause(),
            None => {}
        }
    }
}
