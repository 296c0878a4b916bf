//! Level-synchronous breadth-first search over implicitly defined graphs.
//!
//! The graph is given by an initial state and a neighbor function. Each round
//! expands one whole frontier in parallel; rounds are separated by a join, so
//! the round in which a state is discovered is exactly its distance from the
//! initial state, and the dedupe set guarantees it is expanded once.

pub mod config;
pub mod driver;
pub mod partition;
pub mod report;

pub use config::{BfsConfig, DEFAULT_BUCKET_BITS};
pub use driver::{run_bfs, try_run_bfs, LevelSearch};
pub use partition::{partition, Partition};
pub use report::{RoundStats, SearchReport};
