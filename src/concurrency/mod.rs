//! Concurrency building blocks for the level-synchronous search.
//!
//! The search mutates exactly one shared structure concurrently, the dedupe
//! set. Everything else is either read-only for the round or split into
//! per-worker pieces, so the only synchronization points are the bucket
//! guards in [`dedupe`] and the round join in [`scoped`].

pub mod dedupe;
pub mod scoped;

pub use dedupe::{AtomicDedupeSet, ConcurrentDedupeSet, DedupeStrategy, StripedDedupeSet};
pub use scoped::{ExecutorKind, WorkerPool};
