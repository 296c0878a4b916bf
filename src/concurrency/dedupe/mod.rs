//! Concurrent insert-if-absent sets used to deduplicate discovered states.
//!
//! Both implementations share the same layout: a fixed table of `2^bits`
//! buckets chosen by a seeded post-hash of the caller's hash. They differ only
//! in how a bucket is guarded:
//! - [`StripedDedupeSet`]: one `parking_lot::Mutex` per bucket
//! - [`AtomicDedupeSet`]: one atomic head pointer per bucket, CAS-prepended nodes
//!
//! Membership is append-only. Nothing is ever removed, so the lock-free variant
//! has no reclamation problem: nodes live until the set is dropped.

mod lock_free;
mod striped;

pub use lock_free::AtomicDedupeSet;
pub use striped::StripedDedupeSet;

use std::collections::hash_map::RandomState;
use std::hash::{BuildHasher, Hash, Hasher};

use serde::{Deserialize, Serialize};

use crate::error::ConfigError;

/// Largest accepted `bucket_bits`. `2^26` buckets is 512 MiB of heads for the
/// lock-free set and about 2 GiB of mutex-guarded vectors for the striped one.
pub const MAX_BUCKET_BITS: u32 = 26;

/// A set supporting the fused "is it present; if not, add it" operation.
///
/// Implementations must make [`check_and_insert`](Self::check_and_insert)
/// linearizable: for any value, across all threads, exactly one call that
/// races on an absent value returns `false`.
pub trait ConcurrentDedupeSet<T>: Sync {
    /// Inserts a clone of `value` if it is absent.
    ///
    /// Returns `true` if the value was already present (discard it), `false`
    /// if this call inserted it (keep it).
    fn check_and_insert(&self, value: &T) -> bool;

    /// Returns `true` if `value` has been inserted.
    fn contains(&self, value: &T) -> bool;

    /// Number of distinct values inserted so far.
    fn len(&self) -> usize;

    /// Returns `true` if nothing has been inserted.
    fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Number of buckets (`2^bucket_bits`).
    fn bucket_count(&self) -> usize;
}

/// Which [`ConcurrentDedupeSet`] a search builds.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum DedupeStrategy {
    /// [`StripedDedupeSet`].
    #[default]
    Striped,
    /// [`AtomicDedupeSet`].
    LockFree,
}

/// splitmix64 finalizer (<http://xorshift.di.unimi.it/splitmix64.c>).
///
/// Applied after the caller's hash so that weak low bits still spread across
/// buckets.
#[inline]
pub fn splitmix64(mut x: u64) -> u64 {
    x = x.wrapping_add(0x9e37_79b9_7f4a_7c15);
    x = (x ^ (x >> 30)).wrapping_mul(0xbf58_476d_1ce4_e5b9);
    x = (x ^ (x >> 27)).wrapping_mul(0x94d0_49bb_1331_11eb);
    x ^ (x >> 31)
}

/// Returns a fresh per-process random seed.
pub fn random_seed() -> u64 {
    let mut hasher = RandomState::new().build_hasher();
    hasher.write_u64(0x5eed);
    hasher.finish()
}

/// Checks `bits` against `1..=MAX_BUCKET_BITS`.
pub fn validate_bucket_bits(bits: u32) -> Result<(), ConfigError> {
    if bits == 0 {
        return Err(ConfigError::ZeroBucketBits);
    }
    if bits > MAX_BUCKET_BITS {
        return Err(ConfigError::BucketBitsTooLarge {
            requested: bits,
            max: MAX_BUCKET_BITS,
        });
    }
    Ok(())
}

/// Maps values to bucket indices: `splitmix64(hash(value) + seed) & mask`.
#[derive(Debug, Clone)]
pub(crate) struct BucketIndexer<S> {
    hasher: S,
    seed: u64,
    bits: u32,
    mask: u64,
}

impl<S: BuildHasher> BucketIndexer<S> {
    pub(crate) fn new(bits: u32, seed: u64, hasher: S) -> Result<Self, ConfigError> {
        validate_bucket_bits(bits)?;
        Ok(Self {
            hasher,
            seed,
            bits,
            mask: (1u64 << bits) - 1,
        })
    }

    #[inline(always)]
    pub(crate) fn index<T: Hash>(&self, value: &T) -> usize {
        let hash = self.hasher.hash_one(value);
        // mask < 2^MAX_BUCKET_BITS, so the cast never truncates.
        (splitmix64(hash.wrapping_add(self.seed)) & self.mask) as usize
    }

    #[inline]
    pub(crate) fn bucket_count(&self) -> usize {
        1usize << self.bits
    }

    #[inline]
    pub(crate) fn bits(&self) -> u32 {
        self.bits
    }

    #[inline]
    pub(crate) fn seed(&self) -> u64 {
        self.seed
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn splitmix_spreads_sequential_inputs() {
        let mask = (1u64 << 4) - 1;
        let mut hit = [false; 16];
        for x in 0..64u64 {
            hit[(splitmix64(x) & mask) as usize] = true;
        }
        assert!(hit.iter().all(|&h| h));
    }

    #[test]
    fn bucket_bits_bounds() {
        assert_eq!(validate_bucket_bits(0), Err(ConfigError::ZeroBucketBits));
        assert!(validate_bucket_bits(1).is_ok());
        assert!(validate_bucket_bits(MAX_BUCKET_BITS).is_ok());
        assert_eq!(
            validate_bucket_bits(MAX_BUCKET_BITS + 1),
            Err(ConfigError::BucketBitsTooLarge {
                requested: MAX_BUCKET_BITS + 1,
                max: MAX_BUCKET_BITS,
            })
        );
    }

    #[test]
    fn indexer_stays_in_range() {
        let indexer = BucketIndexer::new(3, 42, RandomState::new()).unwrap();
        assert_eq!(indexer.bucket_count(), 8);
        for v in 0..1000u32 {
            assert!(indexer.index(&v) < 8);
        }
    }
}
