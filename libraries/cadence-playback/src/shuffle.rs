//! Shuffle algorithms for queue traversal
//!
//! Shuffling never reorders the queue itself. It produces a permutation of
//! queue indices that next/previous walk instead of insertion order.

use crate::types::{ShuffleStrategy, Track};
use rand::seq::SliceRandom;
use rand::thread_rng;
use std::collections::HashMap;

/// Build a traversal order over `tracks`
///
/// `first` (if given and in range) is pinned to the front so the current
/// track stays current; the remaining indices are shuffled with `strategy`.
pub fn shuffled_order(
    tracks: &[Track],
    first: Option<usize>,
    strategy: ShuffleStrategy,
) -> Vec<usize> {
    let first = first.filter(|&i| i < tracks.len());
    let mut rest: Vec<usize> = (0..tracks.len()).filter(|&i| Some(i) != first).collect();

    match strategy {
        ShuffleStrategy::Random => shuffle_random(&mut rest),
        ShuffleStrategy::Smart => shuffle_smart(tracks, &mut rest),
    }

    first.into_iter().chain(rest).collect()
}

/// Pure random shuffle using Fisher-Yates algorithm
fn shuffle_random(indices: &mut [usize]) {
    let mut rng = thread_rng();
    indices.shuffle(&mut rng);
}

/// Smart shuffle algorithm
///
/// Groups tracks by artist, randomizes within each group and across group
/// order, then deals round-robin so the same artist rarely plays twice in a
/// row.
fn shuffle_smart(tracks: &[Track], indices: &mut [usize]) {
    if indices.len() <= 2 {
        shuffle_random(indices);
        return;
    }

    let mut rng = thread_rng();

    let mut by_artist: HashMap<&str, Vec<usize>> = HashMap::new();
    for &index in indices.iter() {
        by_artist
            .entry(tracks[index].artist_name.as_str())
            .or_default()
            .push(index);
    }

    let mut groups: Vec<Vec<usize>> = by_artist.into_values().collect();
    for group in &mut groups {
        group.shuffle(&mut rng);
    }
    groups.shuffle(&mut rng);

    let mut result = Vec::with_capacity(indices.len());
    let mut round = 0;
    while result.len() < indices.len() {
        for group in &groups {
            if let Some(&index) = group.get(round) {
                result.push(index);
            }
        }
        round += 1;
    }

    indices.copy_from_slice(&result);
}
