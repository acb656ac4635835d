//! Play queue
//!
//! Ordered tracks plus a pointer to the current entry. Owns next/previous
//! resolution and, when shuffle is on, the randomized traversal order.
//!
//! ```text
//! tracks (insertion order):  [A, B, C, D]
//! order  (shuffle on):       [2, 0, 3, 1]   -> C, A, D, B
//! cursor:                    At(1)          -> current = A
//! ```
//!
//! The cursor is a position in traversal order, not a track index, so the same
//! resolution code serves both shuffled and unshuffled playback.

use crate::shuffle::shuffled_order;
use crate::types::{ShuffleStrategy, Track};

/// Position of the current entry in traversal order
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Cursor {
    /// Nothing selected
    None,

    /// Entry at this traversal position is current
    At(usize),

    /// The current entry was removed; the entry now occupying this traversal
    /// position is the one that followed it
    Detached(usize),
}

/// Result of removing a track from the queue
#[derive(Debug, Clone, PartialEq)]
pub struct RemovedTrack {
    /// The removed track
    pub track: Track,

    /// Whether the removed entry was the current one
    pub was_current: bool,
}

/// Play queue
#[derive(Debug, Clone)]
pub struct Queue {
    /// Tracks in insertion order
    tracks: Vec<Track>,

    /// Shuffled traversal order (indices into `tracks`), `None` when shuffle is off
    order: Option<Vec<usize>>,

    cursor: Cursor,

    strategy: ShuffleStrategy,
}

impl Queue {
    /// Create new empty queue
    pub fn new() -> Self {
        Self::with_strategy(ShuffleStrategy::Random)
    }

    /// Create new empty queue using `strategy` whenever shuffle is enabled
    pub fn with_strategy(strategy: ShuffleStrategy) -> Self {
        Self {
            tracks: Vec::new(),
            order: None,
            cursor: Cursor::None,
            strategy,
        }
    }

    // ===== Mutation =====

    /// Append a track unless one with the same id is already queued
    ///
    /// Returns `true` if the track was added. Never changes the current entry.
    pub fn enqueue(&mut self, track: Track) -> bool {
        if self.contains(&track.id) {
            return false;
        }

        self.tracks.push(track);
        if let Some(order) = self.order.as_mut() {
            order.push(self.tracks.len() - 1);
        }
        true
    }

    /// Replace the whole queue and select `start_index`
    ///
    /// No-op returning `None` if `tracks` is empty. Duplicate ids are kept
    /// as given. An out-of-range `start_index` selects the last entry.
    /// Returns the index of the new current entry.
    pub fn replace(&mut self, tracks: Vec<Track>, start_index: usize) -> Option<usize> {
        if tracks.is_empty() {
            return None;
        }

        let start = start_index.min(tracks.len() - 1);
        self.tracks = tracks;

        if self.order.is_some() {
            self.order = Some(shuffled_order(&self.tracks, Some(start), self.strategy));
            self.cursor = Cursor::At(0);
        } else {
            self.cursor = Cursor::At(start);
        }

        Some(start)
    }

    /// Remove the first entry whose id matches
    ///
    /// At most one entry is removed even if ids are duplicated. Removing the
    /// current entry does not advance; the cursor is detached so the next
    /// resolution continues with the entry that followed it.
    pub fn remove_by_id(&mut self, id: &str) -> Option<RemovedTrack> {
        let index = self.tracks.iter().position(|t| t.id == id)?;
        let position = self.position_of_index(index)?;
        let track = self.tracks.remove(index);

        if let Some(order) = self.order.as_mut() {
            order.remove(position);
            for entry in order.iter_mut() {
                if *entry > index {
                    *entry -= 1;
                }
            }
        }

        let was_current = self.cursor == Cursor::At(position);
        self.cursor = match self.cursor {
            _ if self.tracks.is_empty() => Cursor::None,
            Cursor::At(p) if p == position => Cursor::Detached(p),
            Cursor::At(p) if position < p => Cursor::At(p - 1),
            Cursor::Detached(p) if position < p => Cursor::Detached(p - 1),
            other => other,
        };

        Some(RemovedTrack { track, was_current })
    }

    /// Clear entire queue
    pub fn clear(&mut self) {
        self.tracks.clear();
        if let Some(order) = self.order.as_mut() {
            order.clear();
        }
        self.cursor = Cursor::None;
    }

    /// Make the track at `index` (insertion order) current
    pub fn set_current(&mut self, index: usize) -> Option<&Track> {
        let position = self.position_of_index(index)?;
        self.cursor = Cursor::At(position);
        self.tracks.get(index)
    }

    /// Turn shuffled traversal on or off
    ///
    /// Turning it on pins the current entry first and shuffles the rest.
    /// Turning it off resumes insertion order from the current entry.
    pub fn set_shuffle(&mut self, enabled: bool) {
        match (enabled, self.order.take()) {
            (true, None) => {
                let order = shuffled_order(&self.tracks, self.current_index(), self.strategy);
                self.cursor = match self.cursor {
                    Cursor::At(_) => Cursor::At(0),
                    Cursor::Detached(_) => Cursor::Detached(0),
                    Cursor::None => Cursor::None,
                };
                self.order = Some(order);
            }
            (false, Some(order)) => {
                self.cursor = match self.cursor {
                    Cursor::At(p) => Cursor::At(order[p]),
                    Cursor::Detached(p) => Cursor::Detached(order.get(p).copied().unwrap_or(order.len())),
                    Cursor::None => Cursor::None,
                };
            }
            (_, order) => self.order = order,
        }
    }

    /// Change the algorithm used the next time shuffle is enabled
    pub fn set_strategy(&mut self, strategy: ShuffleStrategy) {
        self.strategy = strategy;
    }

    // ===== Resolution =====

    /// Index of the track that follows the current one
    ///
    /// At the last entry, wraps to the first when `repeat` is set, otherwise
    /// returns `None` (playback should stop). With no current entry, the first
    /// entry is next.
    pub fn resolve_next(&self, repeat: bool) -> Option<usize> {
        if self.tracks.is_empty() {
            return None;
        }

        let candidate = match self.cursor {
            Cursor::At(p) => p + 1,
            Cursor::Detached(p) => p,
            Cursor::None => 0,
        };

        if candidate < self.tracks.len() {
            Some(self.index_at(candidate))
        } else if repeat {
            Some(self.index_at(0))
        } else {
            None
        }
    }

    /// Index of the track before the current one
    ///
    /// Clamps at the first entry: never wraps and never returns `None` for a
    /// non-empty queue.
    pub fn resolve_previous(&self) -> Option<usize> {
        if self.tracks.is_empty() {
            return None;
        }

        let position = match self.cursor {
            Cursor::At(p) | Cursor::Detached(p) => p.saturating_sub(1),
            Cursor::None => 0,
        };

        Some(self.index_at(position.min(self.tracks.len() - 1)))
    }

    // ===== Queries =====

    /// Index (insertion order) of the current entry
    pub fn current_index(&self) -> Option<usize> {
        match self.cursor {
            Cursor::At(p) => Some(self.index_at(p)),
            Cursor::Detached(_) | Cursor::None => None,
        }
    }

    /// Current entry
    pub fn current(&self) -> Option<&Track> {
        self.current_index().and_then(|i| self.tracks.get(i))
    }

    /// Index of the first entry with this id
    pub fn position_of(&self, id: &str) -> Option<usize> {
        self.tracks.iter().position(|t| t.id == id)
    }

    /// Whether any entry has this id
    pub fn contains(&self, id: &str) -> bool {
        self.position_of(id).is_some()
    }

    /// Track at index (insertion order)
    pub fn get(&self, index: usize) -> Option<&Track> {
        self.tracks.get(index)
    }

    /// All tracks in insertion order
    pub fn tracks(&self) -> &[Track] {
        &self.tracks
    }

    /// Tracks that will play after the current one, in traversal order
    pub fn upcoming(&self) -> Vec<&Track> {
        let from = match self.cursor {
            Cursor::At(p) => p + 1,
            Cursor::Detached(p) => p,
            Cursor::None => 0,
        };

        (from..self.tracks.len())
            .map(|p| &self.tracks[self.index_at(p)])
            .collect()
    }

    /// Total number of tracks in queue
    pub fn len(&self) -> usize {
        self.tracks.len()
    }

    /// Check if queue is empty
    pub fn is_empty(&self) -> bool {
        self.tracks.is_empty()
    }

    /// Check if traversal is shuffled
    pub fn is_shuffled(&self) -> bool {
        self.order.is_some()
    }

    fn index_at(&self, position: usize) -> usize {
        match &self.order {
            Some(order) => order[position],
            None => position,
        }
    }

    fn position_of_index(&self, index: usize) -> Option<usize> {
        if index >= self.tracks.len() {
            return None;
        }
        match &self.order {
            Some(order) => order.iter().position(|&i| i == index),
            None => Some(index),
        }
    }
}

impl Default for Queue {
    fn default() -> Self {
        Self::new()
    }
}
