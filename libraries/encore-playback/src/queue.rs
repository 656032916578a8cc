//! Play queue
//!
//! Ordered track list plus a current position. The stored order is what the
//! user picked from (search results, library); shuffle and repeat only decide
//! how the position moves through it.

use crate::error::{PlaybackError, Result};
use crate::shuffle::ShufflePass;
use crate::types::RepeatMode;
use encore_core::{Track, TrackId};
use rand::rngs::StdRng;
use rand::SeedableRng;

/// What the queue did when the backend reported end of track
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum EndOfTrack {
    /// Repeat-one: same slot, play it again from the start
    Restart,

    /// Moved to another slot
    Advanced(usize),

    /// Nothing follows; position unchanged
    Finished,
}

/// Queue manager
///
/// Invariant: `current` is `None` iff `tracks` is empty, otherwise it is a
/// valid index.
#[derive(Debug, Clone)]
pub struct QueueManager {
    tracks: Vec<Track>,
    current: Option<usize>,
    repeat: RepeatMode,
    shuffle: bool,
    pass: ShufflePass,
    rng: StdRng,
}

impl QueueManager {
    /// Create an empty queue
    pub fn new() -> Self {
        Self::with_rng(StdRng::from_entropy())
    }

    /// Create an empty queue with a deterministic shuffle order
    pub fn with_seed(seed: u64) -> Self {
        Self::with_rng(StdRng::seed_from_u64(seed))
    }

    fn with_rng(rng: StdRng) -> Self {
        Self {
            tracks: Vec::new(),
            current: None,
            repeat: RepeatMode::Off,
            shuffle: false,
            pass: ShufflePass::default(),
            rng,
        }
    }

    /// Replace the queue and position it on `start`
    ///
    /// Uses the first occurrence of `start` if the id appears more than once.
    /// On error the previous queue is left untouched.
    pub fn set_queue(&mut self, tracks: Vec<Track>, start: &TrackId) -> Result<&Track> {
        if tracks.is_empty() {
            return Err(PlaybackError::EmptyQueue);
        }

        let index = tracks
            .iter()
            .position(|track| &track.id == start)
            .ok_or_else(|| PlaybackError::InvalidQueueState {
                track_id: start.clone(),
            })?;

        self.tracks = tracks;
        self.current = Some(index);
        self.rebuild_pass();

        Ok(&self.tracks[index])
    }

    /// Drop every track
    pub fn clear(&mut self) {
        self.tracks.clear();
        self.current = None;
        self.pass = ShufflePass::default();
    }

    /// User skip forward
    ///
    /// Wraps only under `RepeatMode::All`. Returns `None` when nothing
    /// follows; the position is unchanged in that case.
    pub fn next(&mut self) -> Option<&Track> {
        let index = self.following_index()?;
        self.move_to(index);
        self.current()
    }

    /// User skip back
    ///
    /// Sequential by stored order, never wraps. At the first slot this is a
    /// no-op returning the current track.
    pub fn previous(&mut self) -> Option<&Track> {
        let index = self.current?;
        if index > 0 {
            self.move_to(index - 1);
        }
        self.current()
    }

    /// Jump directly to a queue slot
    pub fn navigate_to(&mut self, index: usize) -> Result<&Track> {
        if index >= self.tracks.len() {
            return Err(PlaybackError::IndexOutOfBounds(index));
        }
        self.move_to(index);
        Ok(&self.tracks[index])
    }

    /// Apply the end-of-track policy
    pub fn advance_on_end(&mut self) -> EndOfTrack {
        if self.current.is_none() {
            return EndOfTrack::Finished;
        }

        if self.repeat == RepeatMode::One {
            return EndOfTrack::Restart;
        }

        match self.following_index() {
            Some(index) => {
                self.move_to(index);
                EndOfTrack::Advanced(index)
            }
            None => EndOfTrack::Finished,
        }
    }

    /// Whether a forward skip would move somewhere
    pub fn can_advance(&self) -> bool {
        let Some(index) = self.current else {
            return false;
        };

        if self.repeat == RepeatMode::All {
            return true;
        }

        if self.shuffle {
            self.pass.has_remaining()
        } else {
            index + 1 < self.tracks.len()
        }
    }

    /// Whether a backward skip would move somewhere
    pub fn can_retreat(&self) -> bool {
        self.current.is_some_and(|index| index > 0)
    }

    /// Track at the current position
    pub fn current(&self) -> Option<&Track> {
        self.current.and_then(|index| self.tracks.get(index))
    }

    /// Current position
    pub fn current_index(&self) -> Option<usize> {
        self.current
    }

    /// All tracks in stored order
    pub fn tracks(&self) -> &[Track] {
        &self.tracks
    }

    /// Number of tracks
    pub fn len(&self) -> usize {
        self.tracks.len()
    }

    /// Whether the queue is empty
    pub fn is_empty(&self) -> bool {
        self.tracks.is_empty()
    }

    /// Set repeat mode
    pub fn set_repeat(&mut self, mode: RepeatMode) {
        self.repeat = mode;
    }

    /// Current repeat mode
    pub fn repeat(&self) -> RepeatMode {
        self.repeat
    }

    /// Enable or disable shuffle traversal
    ///
    /// Enabling starts a fresh pass from the current slot.
    pub fn set_shuffle(&mut self, enabled: bool) {
        if self.shuffle == enabled {
            return;
        }
        self.shuffle = enabled;
        self.rebuild_pass();
    }

    /// Whether shuffle traversal is enabled
    pub fn shuffle_enabled(&self) -> bool {
        self.shuffle
    }

    fn following_index(&mut self) -> Option<usize> {
        let index = self.current?;

        if self.shuffle {
            if let Some(next) = self.pass.draw() {
                return Some(next);
            }
            if self.repeat != RepeatMode::All {
                return None;
            }
            // New pass; a single-track queue wraps onto itself
            self.pass = ShufflePass::new(self.tracks.len(), Some(index), &mut self.rng);
            return Some(self.pass.draw().unwrap_or(index));
        }

        if index + 1 < self.tracks.len() {
            Some(index + 1)
        } else if self.repeat == RepeatMode::All {
            Some(0)
        } else {
            None
        }
    }

    fn move_to(&mut self, index: usize) {
        self.current = Some(index);
        self.pass.mark_visited(index);
    }

    fn rebuild_pass(&mut self) {
        self.pass = if self.shuffle {
            ShufflePass::new(self.tracks.len(), self.current, &mut self.rng)
        } else {
            ShufflePass::default()
        };
    }
}

impl Default for QueueManager {
    fn default() -> Self {
        Self::new()
    }
}
