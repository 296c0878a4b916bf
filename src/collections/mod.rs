//! Containers used to hold BFS frontiers.

pub mod partitioned_seq;

pub use partitioned_seq::{LogicalIter, PartitionedSequence};
