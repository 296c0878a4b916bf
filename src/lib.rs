//! # `parbfs` - Level-Synchronous Parallel State-Space Search
//!
//! Exhaustive breadth-first exploration of an implicitly defined state graph
//! (an initial state plus a neighbor function) on a fixed number of worker
//! threads, with every distinct state expanded exactly once.
//!
//! ## Guarantees
//!
//! - **At-most-once expansion**: a concurrent dedupe set decides, with a single
//!   fused `check_and_insert`, which worker owns a newly discovered state.
//! - **Exact layering**: rounds are joined before the next begins, so the frontier
//!   a state lands in is its hop distance from the initial state.
//! - **Count invariance**: the number of visited states does not depend on the
//!   worker count, bucket count or scheduling.
//!
//! ## Architecture
//!
//! 1. **Frontiers** ([`PartitionedSequence<T>`]):
//!    - one segment per worker, written without locks during a round
//!    - read back as one logical sequence to split the next round
//!
//! 2. **Dedupe sets** ([`StripedDedupeSet`], [`AtomicDedupeSet`]):
//!    - `2^bits` buckets chosen by a seeded splitmix64 post-hash
//!    - per-bucket mutex, or per-bucket CAS-linked chain
//!    - append-only membership
//!
//! 3. **Driver** ([`LevelSearch`], [`run_bfs`]):
//!    - partition, fork, expand, join, repeat until a frontier is empty
//!    - neighbor errors and panics surface on the calling thread after the join
//!
//! ## Example
//!
//! ```rust
//! use parbfs::search::{BfsConfig, LevelSearch};
//! use parbfs::concurrency::DedupeStrategy;
//!
//! // All residues mod 97 reachable from 1 by doubling or adding 3.
//! let config = BfsConfig::new(4, 10).with_strategy(DedupeStrategy::LockFree);
//! let report = LevelSearch::new(config)
//!     .run(1u32, |&x| [(x * 2) % 97, (x + 3) % 97])
//!     .unwrap();
//! assert_eq!(report.total_visited, 97);
//! assert_eq!(report.layer_sizes[0], 1);
//! ```

#![warn(missing_docs, clippy::all, clippy::pedantic)]
#![allow(clippy::module_name_repetitions)]
#![allow(clippy::must_use_candidate)]

pub mod collections;
pub mod concurrency;
pub mod error;
pub mod search;

pub use collections::PartitionedSequence;
pub use concurrency::{AtomicDedupeSet, ConcurrentDedupeSet, DedupeStrategy, StripedDedupeSet};
pub use error::{BfsError, ConfigError};
pub use search::{run_bfs, try_run_bfs, BfsConfig, LevelSearch, RoundStats, SearchReport};
