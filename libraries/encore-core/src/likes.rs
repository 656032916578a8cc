//! Like/favorite store
//!
//! The player only needs a boolean per track to render the heart button.
//! Persistence belongs to whoever implements `LikeStore` on top of the API.

use crate::types::TrackId;
use serde::{Deserialize, Serialize};
use std::collections::HashSet;

/// Read/write like surface consulted during rendering
///
/// Advisory only: nothing in playback behavior depends on it.
pub trait LikeStore {
    /// Whether the track is liked
    fn is_liked(&self, track_id: &TrackId) -> bool;

    /// Mark or unmark a track as liked
    fn set_liked(&mut self, track_id: TrackId, liked: bool);

    /// Flip the like state, returning the new value
    fn toggle_liked(&mut self, track_id: TrackId) -> bool {
        let liked = !self.is_liked(&track_id);
        self.set_liked(track_id, liked);
        liked
    }
}

/// In-memory set of liked track ids
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct LikedTracks(HashSet<TrackId>);

impl LikedTracks {
    /// Create an empty set
    pub fn new() -> Self {
        Self::default()
    }

    /// Number of liked tracks
    pub fn len(&self) -> usize {
        self.0.len()
    }

    /// Whether nothing is liked
    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    /// Iterate liked ids (unordered)
    pub fn iter(&self) -> impl Iterator<Item = &TrackId> {
        self.0.iter()
    }

    /// Liked ids in sorted order, for stable display
    pub fn sorted_ids(&self) -> Vec<TrackId> {
        let mut ids: Vec<TrackId> = self.0.iter().cloned().collect();
        ids.sort();
        ids
    }
}

impl LikeStore for LikedTracks {
    fn is_liked(&self, track_id: &TrackId) -> bool {
        self.0.contains(track_id)
    }

    fn set_liked(&mut self, track_id: TrackId, liked: bool) {
        if liked {
            self.0.insert(track_id);
        } else {
            self.0.remove(&track_id);
        }
    }
}

impl FromIterator<TrackId> for LikedTracks {
    fn from_iter<I: IntoIterator<Item = TrackId>>(iter: I) -> Self {
        Self(iter.into_iter().collect())
    }
}
