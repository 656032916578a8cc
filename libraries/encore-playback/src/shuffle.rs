//! Shuffle traversal
//!
//! Shuffle never reorders the queue. It picks which unvisited slot plays
//! next, so switching shuffle off resumes sequential order from wherever
//! playback currently is.

use rand::seq::SliceRandom;
use rand::Rng;

/// One pass of shuffled traversal over queue indices
///
/// Holds the indices not yet visited in the current pass, pre-shuffled with
/// Fisher-Yates. Drawing pops from the end.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ShufflePass {
    remaining: Vec<usize>,
}

impl ShufflePass {
    /// Start a pass over `0..len`, treating `current` as already visited
    pub fn new<R: Rng + ?Sized>(len: usize, current: Option<usize>, rng: &mut R) -> Self {
        let mut remaining: Vec<usize> = (0..len).filter(|&i| Some(i) != current).collect();
        remaining.shuffle(rng);
        Self { remaining }
    }

    /// Take the next unvisited index, if any
    pub fn draw(&mut self) -> Option<usize> {
        self.remaining.pop()
    }

    /// Record that `index` was visited outside of `draw` (jump or skip back)
    pub fn mark_visited(&mut self, index: usize) {
        self.remaining.retain(|&i| i != index);
    }

    /// Whether any index is left in this pass
    pub fn has_remaining(&self) -> bool {
        !self.remaining.is_empty()
    }

    /// Number of indices left in this pass
    pub fn remaining(&self) -> usize {
        self.remaining.len()
    }
}
