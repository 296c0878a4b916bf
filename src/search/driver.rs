//! The level-synchronous driver.
//!
//! One round expands a whole frontier:
//! 1. split `0..q` into `worker_count` contiguous ranges
//! 2. worker `k` expands its range of the (read-only) frontier and appends every
//!    successor that `check_and_insert` accepts to segment `k` of the next frontier
//! 3. join all workers, then move on to the next frontier
//!
//! The join is the only global synchronization point. It is also what makes a
//! state's frontier index equal to its distance from the initial state: nothing
//! from round `d + 1` starts before all of round `d` has been recorded.

use core::convert::Infallible;
use core::sync::atomic::{AtomicBool, Ordering};
use std::collections::hash_map::RandomState;
use std::hash::{BuildHasher, Hash};

use tracing::{debug, info, info_span, trace, warn};

use super::config::BfsConfig;
use super::partition::partition;
use super::report::{RoundStats, SearchReport};
use crate::collections::{LogicalIter, PartitionedSequence};
use crate::concurrency::dedupe::{random_seed, AtomicDedupeSet, ConcurrentDedupeSet, DedupeStrategy, StripedDedupeSet};
use crate::concurrency::WorkerPool;
use crate::error::BfsError;

/// A configured level-synchronous search.
///
/// `H` builds the hasher applied to states before the dedupe set's seeded mix.
///
/// ```
/// use parbfs::search::{BfsConfig, LevelSearch};
///
/// // Numbers 0..100 reachable from 0 by +1 and +7.
/// let search = LevelSearch::new(BfsConfig::new(4, 8));
/// let report = search
///     .run(0u32, |&n| [n + 1, n + 7].into_iter().filter(|&m| m < 100))
///     .unwrap();
/// assert_eq!(report.total_visited, 100);
/// ```
#[derive(Debug, Clone)]
pub struct LevelSearch<H = RandomState> {
    config: BfsConfig,
    hasher: H,
}

impl LevelSearch<RandomState> {
    /// Creates a search using `RandomState` hashing.
    pub fn new(config: BfsConfig) -> Self {
        Self::with_hasher(config, RandomState::new())
    }
}

impl<H> LevelSearch<H>
where
    H: BuildHasher + Clone + Send + Sync,
{
    /// Creates a search using `hasher` for state hashing.
    pub fn with_hasher(config: BfsConfig, hasher: H) -> Self {
        Self { config, hasher }
    }

    /// Returns the configuration.
    pub fn config(&self) -> &BfsConfig {
        &self.config
    }

    /// Explores everything reachable from `initial` with an infallible
    /// neighbor function.
    pub fn run<S, I, F>(&self, initial: S, neighbors: F) -> Result<SearchReport, BfsError<Infallible>>
    where
        S: Clone + Eq + Hash + Send + Sync,
        I: IntoIterator<Item = S>,
        F: Fn(&S) -> I + Sync,
    {
        self.try_run(initial, |state: &S| Ok::<I, Infallible>(neighbors(state)))
    }

    /// Explores everything reachable from `initial`; the first neighbor error
    /// aborts the search.
    pub fn try_run<S, I, E, F>(&self, initial: S, neighbors: F) -> Result<SearchReport, BfsError<E>>
    where
        S: Clone + Eq + Hash + Send + Sync,
        I: IntoIterator<Item = S>,
        E: Send,
        F: Fn(&S) -> Result<I, E> + Sync,
    {
        self.try_run_observed(initial, neighbors, |_: &RoundStats| {})
    }

    /// Like [`try_run`](Self::try_run), calling `observer` on this thread after
    /// every round.
    pub fn try_run_observed<S, I, E, F, O>(
        &self,
        initial: S,
        neighbors: F,
        mut observer: O,
    ) -> Result<SearchReport, BfsError<E>>
    where
        S: Clone + Eq + Hash + Send + Sync,
        I: IntoIterator<Item = S>,
        E: Send,
        F: Fn(&S) -> Result<I, E> + Sync,
        O: FnMut(&RoundStats),
    {
        self.with_configured_set(initial, &neighbors, &mut observer, false)
            .map(|(report, _)| report)
    }

    /// Explores everything reachable from `initial` and also returns every
    /// frontier: `layers[d]` holds exactly the states at distance `d`.
    pub fn try_explore_layers<S, I, E, F>(
        &self,
        initial: S,
        neighbors: F,
    ) -> Result<(SearchReport, Vec<PartitionedSequence<S>>), BfsError<E>>
    where
        S: Clone + Eq + Hash + Send + Sync,
        I: IntoIterator<Item = S>,
        E: Send,
        F: Fn(&S) -> Result<I, E> + Sync,
    {
        self.with_configured_set(initial, &neighbors, &mut |_: &RoundStats| {}, true)
    }

    /// Runs the search against a caller-provided set instead of building one
    /// from the config's `bucket_bits`, `seed` and `strategy`.
    pub fn try_run_in<S, I, E, F, O, D>(
        &self,
        seen: &D,
        initial: S,
        neighbors: F,
        mut observer: O,
    ) -> Result<SearchReport, BfsError<E>>
    where
        S: Clone + Send + Sync,
        I: IntoIterator<Item = S>,
        E: Send,
        F: Fn(&S) -> Result<I, E> + Sync,
        O: FnMut(&RoundStats),
        D: ConcurrentDedupeSet<S>,
    {
        self.config.validate()?;
        drive(&self.config, seen, initial, &neighbors, &mut observer, false).map(|(report, _)| report)
    }

    fn with_configured_set<S, I, E, F, O>(
        &self,
        initial: S,
        neighbors: &F,
        observer: &mut O,
        retain_layers: bool,
    ) -> Result<(SearchReport, Vec<PartitionedSequence<S>>), BfsError<E>>
    where
        S: Clone + Eq + Hash + Send + Sync,
        I: IntoIterator<Item = S>,
        E: Send,
        F: Fn(&S) -> Result<I, E> + Sync,
        O: FnMut(&RoundStats),
    {
        self.config.validate()?;
        let bits = self.config.bucket_bits;
        let seed = self.config.seed.unwrap_or_else(random_seed);
        match self.config.strategy {
            DedupeStrategy::Striped => {
                let seen = StripedDedupeSet::with_hasher(bits, seed, self.hasher.clone())?;
                drive(&self.config, &seen, initial, neighbors, observer, retain_layers)
            }
            DedupeStrategy::LockFree => {
                let seen = AtomicDedupeSet::with_hasher(bits, seed, self.hasher.clone())?;
                drive(&self.config, &seen, initial, neighbors, observer, retain_layers)
            }
        }
    }
}

/// Explores everything reachable from `initial` and returns the number of
/// distinct states visited.
///
/// ```
/// // Bit-strings of length 0..=3: 1 + 2 + 4 + 8.
/// let visited = parbfs::run_bfs(
///     Vec::<u8>::new(),
///     |s| {
///         let mut out = Vec::new();
///         if s.len() < 3 {
///             for bit in [0, 1] {
///                 let mut t = s.clone();
///                 t.push(bit);
///                 out.push(t);
///             }
///         }
///         if !s.is_empty() {
///             out.push(s[..s.len() - 1].to_vec());
///         }
///         out
///     },
///     4,
///     6,
/// )
/// .unwrap();
/// assert_eq!(visited, 15);
/// ```
pub fn run_bfs<S, I, F>(
    initial: S,
    neighbors: F,
    worker_count: usize,
    bucket_bits: u32,
) -> Result<usize, BfsError<Infallible>>
where
    S: Clone + Eq + Hash + Send + Sync,
    I: IntoIterator<Item = S>,
    F: Fn(&S) -> I + Sync,
{
    LevelSearch::new(BfsConfig::new(worker_count, bucket_bits))
        .run(initial, neighbors)
        .map(|report| report.total_visited)
}

/// Fallible-neighbor form of [`run_bfs`].
pub fn try_run_bfs<S, I, E, F>(
    initial: S,
    neighbors: F,
    worker_count: usize,
    bucket_bits: u32,
) -> Result<usize, BfsError<E>>
where
    S: Clone + Eq + Hash + Send + Sync,
    I: IntoIterator<Item = S>,
    E: Send,
    F: Fn(&S) -> Result<I, E> + Sync,
{
    LevelSearch::new(BfsConfig::new(worker_count, bucket_bits))
        .try_run(initial, neighbors)
        .map(|report| report.total_visited)
}

/// Why a worker stopped before finishing its range.
enum StepFailure<E> {
    Neighbor(E),
    Exhausted,
    /// Another worker failed first.
    Aborted,
}

/// The per-round work shared (by reference) between all workers.
struct Expander<'a, F, D> {
    neighbors: &'a F,
    seen: &'a D,
    abort: &'a AtomicBool,
    state_limit: Option<usize>,
}

impl<F, D> Expander<'_, F, D> {
    /// Expands `states`, pushing newly discovered successors onto `out`.
    fn expand<S, I, E>(&self, worker: usize, states: LogicalIter<'_, S>, out: &mut Vec<S>) -> Result<(), StepFailure<E>>
    where
        F: Fn(&S) -> Result<I, E>,
        I: IntoIterator<Item = S>,
        D: ConcurrentDedupeSet<S>,
    {
        let assigned = states.len();
        for state in states {
            if self.abort.load(Ordering::Relaxed) {
                return Err(StepFailure::Aborted);
            }
            let successors = match (self.neighbors)(state) {
                Ok(successors) => successors,
                Err(err) => {
                    self.abort.store(true, Ordering::Relaxed);
                    return Err(StepFailure::Neighbor(err));
                }
            };
            for next in successors {
                if self.seen.check_and_insert(&next) {
                    continue;
                }
                out.push(next);
                if self.state_limit.is_some_and(|limit| self.seen.len() > limit) {
                    self.abort.store(true, Ordering::Relaxed);
                    return Err(StepFailure::Exhausted);
                }
            }
        }
        trace!(worker, states = assigned, discovered = out.len(), "worker finished");
        Ok(())
    }
}

fn drive<S, I, E, F, O, D>(
    config: &BfsConfig,
    seen: &D,
    initial: S,
    neighbors: &F,
    observer: &mut O,
    retain_layers: bool,
) -> Result<(SearchReport, Vec<PartitionedSequence<S>>), BfsError<E>>
where
    S: Clone + Send + Sync,
    I: IntoIterator<Item = S>,
    E: Send,
    F: Fn(&S) -> Result<I, E> + Sync,
    O: FnMut(&RoundStats),
    D: ConcurrentDedupeSet<S>,
{
    let workers = config.worker_count;
    let pool = WorkerPool::build(config.executor, workers)?;

    let span = info_span!("level_search", workers, bucket_count = seen.bucket_count());
    let _enter = span.enter();

    seen.check_and_insert(&initial);
    let mut frontier = PartitionedSequence::new(workers);
    frontier.push(0, initial);

    let mut layers = Vec::new();
    let mut layer_sizes = Vec::new();
    let mut total_visited = 0usize;

    for depth in 0.. {
        let q = frontier.len();
        if q == 0 {
            break;
        }
        total_visited += q;
        layer_sizes.push(q);
        debug!(depth, frontier = q, "expanding round");

        let mut next = PartitionedSequence::new(workers);
        let abort = AtomicBool::new(false);
        let expander = Expander {
            neighbors,
            seen,
            abort: &abort,
            state_limit: config.state_limit,
        };

        let tasks: Vec<_> = partition(q, workers)
            .zip(next.segments_mut())
            .enumerate()
            .filter(|(_, (range, _))| !range.is_empty())
            .map(|(worker, (range, out))| {
                let states = frontier.range(range);
                let expander = &expander;
                move || expander.expand::<S, I, E>(worker, states, out)
            })
            .collect();
        let spawned = tasks.len();

        let mut failure = None;
        let mut panicked = None;
        for outcome in pool.fork_join(tasks) {
            match outcome {
                Ok(Ok(())) | Ok(Err(StepFailure::Aborted)) => {}
                Ok(Err(StepFailure::Neighbor(err))) => {
                    // The first worker's error wins over later ones and over exhaustion.
                    if !matches!(failure, Some(StepFailure::Neighbor(_))) {
                        failure = Some(StepFailure::Neighbor(err));
                    }
                }
                Ok(Err(StepFailure::Exhausted)) => {
                    failure.get_or_insert(StepFailure::Exhausted);
                }
                Err(payload) => {
                    panicked.get_or_insert(payload);
                }
            }
        }
        if let Some(payload) = panicked {
            warn!(depth, "worker panicked");
            std::panic::resume_unwind(payload);
        }
        match failure {
            Some(StepFailure::Neighbor(source)) => {
                warn!(depth, "neighbor function failed; abandoning search");
                return Err(BfsError::Neighbor { depth, source });
            }
            Some(StepFailure::Exhausted) => {
                let visited = seen.len();
                let limit = config.state_limit.unwrap_or(visited);
                warn!(depth, limit, visited, "state limit exceeded");
                return Err(BfsError::Exhausted { limit, depth, visited });
            }
            Some(StepFailure::Aborted) | None => {}
        }

        let stats = RoundStats {
            depth,
            frontier_size: q,
            discovered: next.len(),
            workers: spawned,
        };
        debug!(depth, discovered = stats.discovered, "round complete");
        observer(&stats);

        let done = std::mem::replace(&mut frontier, next);
        if retain_layers {
            layers.push(done);
        }
    }

    let report = SearchReport {
        total_visited,
        depth: layer_sizes.len(),
        layer_sizes,
        worker_count: workers,
        bucket_count: seen.bucket_count(),
    };
    info!(visited = report.total_visited, depth = report.depth, "search complete");
    Ok((report, layers))
}
