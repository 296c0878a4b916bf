//! Lock-striped dedupe set: one mutex per bucket.

use core::sync::atomic::{AtomicUsize, Ordering};
use std::collections::hash_map::RandomState;
use std::hash::{BuildHasher, Hash};

use crossbeam_utils::CachePadded;
use parking_lot::Mutex;

use super::{random_seed, BucketIndexer, ConcurrentDedupeSet};
use crate::error::ConfigError;

/// A fixed-bucket hash set where each bucket is a `Vec<T>` behind its own lock.
///
/// `check_and_insert` holds only its bucket's lock for the scan and the push,
/// so threads touching different buckets never contend.
pub struct StripedDedupeSet<T, S = RandomState> {
    indexer: BucketIndexer<S>,
    buckets: Box<[Mutex<Vec<T>>]>,
    len: CachePadded<AtomicUsize>,
}

impl<T> StripedDedupeSet<T, RandomState>
where
    T: Eq + Hash + Clone,
{
    /// Creates a set with `2^bits` buckets, a random seed and `RandomState` hashing.
    pub fn new(bits: u32) -> Result<Self, ConfigError> {
        Self::with_seed(bits, random_seed())
    }

    /// Creates a set with `2^bits` buckets and a fixed seed.
    pub fn with_seed(bits: u32, seed: u64) -> Result<Self, ConfigError> {
        Self::with_hasher(bits, seed, RandomState::new())
    }
}

impl<T, S> StripedDedupeSet<T, S>
where
    T: Eq + Hash + Clone,
    S: BuildHasher,
{
    /// Creates a set with `2^bits` buckets using `hasher` for the pre-hash.
    pub fn with_hasher(bits: u32, seed: u64, hasher: S) -> Result<Self, ConfigError> {
        let indexer = BucketIndexer::new(bits, seed, hasher)?;
        let buckets = (0..indexer.bucket_count())
            .map(|_| Mutex::new(Vec::new()))
            .collect();
        Ok(Self {
            indexer,
            buckets,
            len: CachePadded::new(AtomicUsize::new(0)),
        })
    }

    /// Returns the configured `bits`.
    pub fn bucket_bits(&self) -> u32 {
        self.indexer.bits()
    }

    /// Returns the bucket-selection seed.
    pub fn seed(&self) -> u64 {
        self.indexer.seed()
    }

    #[inline]
    fn bucket(&self, value: &T) -> &Mutex<Vec<T>> {
        &self.buckets[self.indexer.index(value)]
    }
}

impl<T, S> ConcurrentDedupeSet<T> for StripedDedupeSet<T, S>
where
    T: Eq + Hash + Clone + Send,
    S: BuildHasher + Sync,
{
    fn check_and_insert(&self, value: &T) -> bool {
        let mut bucket = self.bucket(value).lock();
        if bucket.iter().any(|present| present == value) {
            return true;
        }
        bucket.push(value.clone());
        drop(bucket);
        self.len.fetch_add(1, Ordering::Relaxed);
        false
    }

    fn contains(&self, value: &T) -> bool {
        self.bucket(value).lock().iter().any(|present| present == value)
    }

    fn len(&self) -> usize {
        self.len.load(Ordering::Relaxed)
    }

    fn bucket_count(&self) -> usize {
        self.buckets.len()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn second_insert_reports_present() {
        let set = StripedDedupeSet::with_seed(4, 7).unwrap();
        assert!(!set.check_and_insert(&"a"));
        assert!(set.check_and_insert(&"a"));
        assert!(!set.check_and_insert(&"b"));
        assert_eq!(set.len(), 2);
        assert!(set.contains(&"b"));
        assert!(!set.contains(&"c"));
    }

    #[test]
    fn table_is_sized_from_bits() {
        let set: StripedDedupeSet<u8> = StripedDedupeSet::new(5).unwrap();
        assert_eq!(set.bucket_count(), 32);
        assert_eq!(set.bucket_bits(), 5);
        assert!(set.is_empty());
    }
}
