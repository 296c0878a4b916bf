//! Lock-free dedupe set: one atomic chain head per bucket.
//!
//! Each bucket is a singly linked list that only ever grows at the front:
//! - `heads[b]` is the atomic head pointer (or null)
//! - a node's `next` is written before the node is published and never again
//!
//! Safety model:
//! - Nodes are never unlinked while the set is alive, so any pointer loaded from
//!   a head stays valid until `Drop`, which has exclusive access.
//! - Because insertion is front-only, the suffix of a chain below a previously
//!   observed head never changes. A failed CAS therefore only requires scanning
//!   the nodes that were prepended since the last look.

use core::marker::PhantomData;
use core::ptr;
use core::sync::atomic::{AtomicPtr, AtomicUsize, Ordering};
use std::collections::hash_map::RandomState;
use std::hash::{BuildHasher, Hash};

use crossbeam_utils::{Backoff, CachePadded};

use super::{random_seed, BucketIndexer, ConcurrentDedupeSet};
use crate::error::ConfigError;

struct Node<T> {
    value: T,
    next: *mut Node<T>,
}

/// A fixed-bucket hash set with CAS-linked, never-removed bucket chains.
pub struct AtomicDedupeSet<T, S = RandomState> {
    indexer: BucketIndexer<S>,
    heads: Box<[AtomicPtr<Node<T>>]>,
    len: CachePadded<AtomicUsize>,
    _owns: PhantomData<Box<Node<T>>>,
}

// SAFETY: the set owns its nodes (like `Box<Node<T>>`); sending the set sends the `T`s.
unsafe impl<T: Send, S: Send> Send for AtomicDedupeSet<T, S> {}
// SAFETY: shared access hands out `&T` to other threads (needs `Sync`) and moves
// clones in from any thread (needs `Send`). Heads are atomics.
unsafe impl<T: Send + Sync, S: Sync> Sync for AtomicDedupeSet<T, S> {}

impl<T> AtomicDedupeSet<T, RandomState>
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

impl<T, S> AtomicDedupeSet<T, S>
where
    T: Eq + Hash + Clone,
    S: BuildHasher,
{
    /// Creates a set with `2^bits` buckets using `hasher` for the pre-hash.
    pub fn with_hasher(bits: u32, seed: u64, hasher: S) -> Result<Self, ConfigError> {
        let indexer = BucketIndexer::new(bits, seed, hasher)?;
        let heads = (0..indexer.bucket_count())
            .map(|_| AtomicPtr::new(ptr::null_mut()))
            .collect();
        Ok(Self {
            indexer,
            heads,
            len: CachePadded::new(AtomicUsize::new(0)),
            _owns: PhantomData,
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
    fn head(&self, value: &T) -> &AtomicPtr<Node<T>> {
        &self.heads[self.indexer.index(value)]
    }
}

/// Walks the chain from `from` until `until`, looking for `value`.
///
/// # Safety
/// `from` must be null or a node published in this set, and `until` must be
/// null or reachable from `from`.
unsafe fn scan<T: Eq>(from: *mut Node<T>, until: *mut Node<T>, value: &T) -> bool {
    let mut cur = from;
    while cur != until {
        // SAFETY: published nodes are never freed while the set is borrowed.
        let node = unsafe { &*cur };
        if node.value == *value {
            return true;
        }
        cur = node.next;
    }
    false
}

impl<T, S> ConcurrentDedupeSet<T> for AtomicDedupeSet<T, S>
where
    T: Eq + Hash + Clone + Send + Sync,
    S: BuildHasher + Sync,
{
    fn check_and_insert(&self, value: &T) -> bool {
        let head = self.head(value);
        let mut seen = head.load(Ordering::Acquire);
        // SAFETY: `seen` came from this bucket's head.
        if unsafe { scan(seen, ptr::null_mut(), value) } {
            return true;
        }

        let node = Box::into_raw(Box::new(Node {
            value: value.clone(),
            next: seen,
        }));
        let backoff = Backoff::new();
        loop {
            match head.compare_exchange_weak(seen, node, Ordering::AcqRel, Ordering::Acquire) {
                Ok(_) => {
                    self.len.fetch_add(1, Ordering::Relaxed);
                    return false;
                }
                Err(actual) => {
                    // SAFETY: `seen` was a head of this chain, so it is reachable from `actual`.
                    if unsafe { scan(actual, seen, value) } {
                        // SAFETY: `node` was never published.
                        drop(unsafe { Box::from_raw(node) });
                        return true;
                    }
                    // SAFETY: `node` is still private to this thread.
                    unsafe { (*node).next = actual };
                    seen = actual;
                    backoff.spin();
                }
            }
        }
    }

    fn contains(&self, value: &T) -> bool {
        let head = self.head(value).load(Ordering::Acquire);
        // SAFETY: `head` came from this bucket's head.
        unsafe { scan(head, ptr::null_mut(), value) }
    }

    fn len(&self) -> usize {
        self.len.load(Ordering::Relaxed)
    }

    fn bucket_count(&self) -> usize {
        self.heads.len()
    }
}

impl<T, S> Drop for AtomicDedupeSet<T, S> {
    fn drop(&mut self) {
        for head in self.heads.iter_mut() {
            let mut cur = *head.get_mut();
            while !cur.is_null() {
                // SAFETY: `&mut self` means no other thread can observe the chain;
                // every node was created by `Box::into_raw` and is freed exactly once.
                let node = unsafe { Box::from_raw(cur) };
                cur = node.next;
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::Arc;

    #[test]
    fn second_insert_reports_present() {
        let set = AtomicDedupeSet::with_seed(4, 7).unwrap();
        assert!(!set.check_and_insert(&10u64));
        assert!(set.check_and_insert(&10u64));
        assert!(!set.check_and_insert(&11u64));
        assert_eq!(set.len(), 2);
        assert!(set.contains(&11));
        assert!(!set.contains(&12));
    }

    #[test]
    fn single_bucket_chain_holds_everything() {
        let set = AtomicDedupeSet::with_seed(1, 0).unwrap();
        for v in 0..500u32 {
            assert!(!set.check_and_insert(&v));
        }
        for v in 0..500u32 {
            assert!(set.check_and_insert(&v));
        }
        assert_eq!(set.len(), 500);
    }

    #[test]
    fn drop_releases_owned_values() {
        let marker = Arc::new(());
        {
            let set = AtomicDedupeSet::with_seed(2, 3).unwrap();
            for i in 0..8u32 {
                assert!(!set.check_and_insert(&(i, Arc::clone(&marker))));
            }
            assert_eq!(Arc::strong_count(&marker), 9);
        }
        assert_eq!(Arc::strong_count(&marker), 1);
    }
}
