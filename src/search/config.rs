//! Search parameters.

use core::num::NonZeroUsize;

use serde::{Deserialize, Serialize};

use crate::concurrency::dedupe::{validate_bucket_bits, DedupeStrategy, MAX_BUCKET_BITS};
use crate::concurrency::ExecutorKind;
use crate::error::ConfigError;

/// Bucket bits used when none are given (`2^20` buckets).
pub const DEFAULT_BUCKET_BITS: u32 = 20;

/// Parameters of one level-synchronous search.
///
/// Deserializes from partial documents: missing fields take their
/// [`Default`] values.
///
/// ```
/// use parbfs::search::BfsConfig;
///
/// let config: BfsConfig = serde_json::from_str(r#"{ "worker_count": 4 }"#).unwrap();
/// assert_eq!(config.worker_count, 4);
/// assert_eq!(config.bucket_bits, parbfs::search::DEFAULT_BUCKET_BITS);
/// ```
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct BfsConfig {
    /// Number of workers (and frontier segments) per round.
    pub worker_count: usize,
    /// The dedupe set has `2^bucket_bits` buckets.
    pub bucket_bits: u32,
    /// Bucket-selection seed; `None` draws a random one per search.
    pub seed: Option<u64>,
    /// Which dedupe set implementation to build.
    pub strategy: DedupeStrategy,
    /// How workers are run.
    pub executor: ExecutorKind,
    /// Upper bound on distinct states; exceeding it fails with `Exhausted`.
    pub state_limit: Option<usize>,
}

impl Default for BfsConfig {
    fn default() -> Self {
        Self {
            worker_count: std::thread::available_parallelism().map_or(1, NonZeroUsize::get),
            bucket_bits: DEFAULT_BUCKET_BITS,
            seed: None,
            strategy: DedupeStrategy::default(),
            executor: ExecutorKind::default(),
            state_limit: None,
        }
    }
}

impl BfsConfig {
    /// Creates a config with the given workers and bucket bits, defaults elsewhere.
    pub fn new(worker_count: usize, bucket_bits: u32) -> Self {
        Self {
            worker_count,
            bucket_bits,
            ..Self::default()
        }
    }

    /// Fixes the bucket-selection seed.
    #[must_use]
    pub fn with_seed(mut self, seed: u64) -> Self {
        self.seed = Some(seed);
        self
    }

    /// Selects the dedupe set implementation.
    #[must_use]
    pub fn with_strategy(mut self, strategy: DedupeStrategy) -> Self {
        self.strategy = strategy;
        self
    }

    /// Selects the executor.
    #[must_use]
    pub fn with_executor(mut self, executor: ExecutorKind) -> Self {
        self.executor = executor;
        self
    }

    /// Caps the number of distinct states.
    #[must_use]
    pub fn with_state_limit(mut self, limit: usize) -> Self {
        self.state_limit = Some(limit);
        self
    }

    /// Checks every parameter without allocating anything.
    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.worker_count == 0 {
            return Err(ConfigError::ZeroWorkers);
        }
        validate_bucket_bits(self.bucket_bits)?;
        if self.state_limit == Some(0) {
            return Err(ConfigError::ZeroStateLimit);
        }
        Ok(())
    }

    /// Smallest `bits` with `2^bits >= expected_states`, clamped to
    /// `1..=MAX_BUCKET_BITS`.
    ///
    /// With about one bucket per state, chains stay O(1) long and the whole
    /// search runs in \(O(V + E)\) time and \(O(V)\) memory.
    pub fn bucket_bits_for(expected_states: usize) -> u32 {
        let bits = usize::BITS - expected_states.saturating_sub(1).leading_zeros();
        bits.clamp(1, MAX_BUCKET_BITS)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn validate_rejects_each_bad_field() {
        assert_eq!(BfsConfig::new(0, 4).validate(), Err(ConfigError::ZeroWorkers));
        assert_eq!(BfsConfig::new(2, 0).validate(), Err(ConfigError::ZeroBucketBits));
        assert!(matches!(
            BfsConfig::new(2, MAX_BUCKET_BITS + 1).validate(),
            Err(ConfigError::BucketBitsTooLarge { .. })
        ));
        assert_eq!(
            BfsConfig::new(2, 4).with_state_limit(0).validate(),
            Err(ConfigError::ZeroStateLimit)
        );
        assert!(BfsConfig::new(2, 4).validate().is_ok());
    }

    #[test]
    fn bucket_bits_for_rounds_up() {
        assert_eq!(BfsConfig::bucket_bits_for(0), 1);
        assert_eq!(BfsConfig::bucket_bits_for(2), 1);
        assert_eq!(BfsConfig::bucket_bits_for(3), 2);
        assert_eq!(BfsConfig::bucket_bits_for(1024), 10);
        assert_eq!(BfsConfig::bucket_bits_for(1025), 11);
        assert_eq!(BfsConfig::bucket_bits_for(usize::MAX), MAX_BUCKET_BITS);
    }

    #[test]
    fn strategy_names_are_snake_case() {
        let config = BfsConfig::new(1, 3).with_strategy(DedupeStrategy::LockFree);
        let json = serde_json::to_value(&config).unwrap();
        assert_eq!(json["strategy"], "lock_free");
        assert_eq!(json["executor"], "scoped");
    }
}
