//! Error types for set construction and search execution.

use thiserror::Error;

/// Rejected search or set parameters. Always reported before any round runs.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ConfigError {
    /// `worker_count` was zero.
    #[error("worker_count must be at least 1")]
    ZeroWorkers,
    /// `bucket_bits` was zero.
    #[error("bucket_bits must be at least 1")]
    ZeroBucketBits,
    /// `bucket_bits` would allocate more buckets than the documented ceiling.
    #[error("bucket_bits {requested} exceeds the ceiling of {max} (2^{max} buckets)")]
    BucketBitsTooLarge {
        /// Bits the caller asked for.
        requested: u32,
        /// Largest accepted value.
        max: u32,
    },
    /// `state_limit` was `Some(0)`; the initial state alone would exceed it.
    #[error("state_limit must be at least 1")]
    ZeroStateLimit,
    /// The worker pool could not be started.
    #[error("failed to build worker pool: {0}")]
    Pool(String),
}

/// Failure of a search started through [`LevelSearch`](crate::search::LevelSearch).
///
/// `E` is the error type of the caller's neighbor function
/// ([`Infallible`](core::convert::Infallible) for infallible searches).
#[derive(Debug, Error)]
pub enum BfsError<E> {
    /// Invalid configuration; no round was started.
    #[error(transparent)]
    Config(#[from] ConfigError),

    /// The neighbor function failed while expanding frontier `depth`.
    ///
    /// Every worker of that round has been joined; no partial result is kept.
    #[error("neighbor function failed while expanding depth {depth}")]
    Neighbor {
        /// Depth of the frontier being expanded.
        depth: usize,
        /// The neighbor function's error.
        #[source]
        source: E,
    },

    /// The dedupe set grew past the configured `state_limit`.
    #[error("state limit of {limit} exceeded while expanding depth {depth} ({visited} states seen)")]
    Exhausted {
        /// The configured limit.
        limit: usize,
        /// Depth of the frontier being expanded.
        depth: usize,
        /// States recorded in the dedupe set when the search stopped.
        visited: usize,
    },
}

impl<E> BfsError<E> {
    /// Returns `true` for [`BfsError::Exhausted`].
    pub fn is_exhausted(&self) -> bool {
        matches!(self, Self::Exhausted { .. })
    }

    /// Returns the configuration error, if that is what this is.
    pub fn as_config(&self) -> Option<&ConfigError> {
        match self {
            Self::Config(err) => Some(err),
            _ => None,
        }
    }
}
