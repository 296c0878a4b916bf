//! Values handed back to the caller: per-round stats and the final report.

use serde::Serialize;

/// What happened in one round, passed to the observer after the round's join.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct RoundStats {
    /// Depth of the frontier that was expanded.
    pub depth: usize,
    /// Number of states expanded this round.
    pub frontier_size: usize,
    /// Number of new states discovered (the next frontier's size).
    pub discovered: usize,
    /// Number of workers that had a non-empty range.
    pub workers: usize,
}

/// Summary of a finished search.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct SearchReport {
    /// Sum of all frontier sizes: every distinct reachable state, counted once.
    pub total_visited: usize,
    /// Number of non-empty frontiers (the eccentricity of the initial state plus one).
    pub depth: usize,
    /// `layer_sizes[d]` is the number of states at distance `d`.
    pub layer_sizes: Vec<usize>,
    /// Workers per round.
    pub worker_count: usize,
    /// Buckets in the dedupe set.
    pub bucket_count: usize,
}
