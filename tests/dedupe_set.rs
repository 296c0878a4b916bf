use std::hash::{BuildHasher, Hasher};
use std::sync::Barrier;

use parbfs::concurrency::dedupe::MAX_BUCKET_BITS;
use parbfs::concurrency::{AtomicDedupeSet, ConcurrentDedupeSet, StripedDedupeSet};
use parbfs::ConfigError;

/// A hasher that maps everything to the same value.
#[derive(Clone, Default)]
struct ConstantState;

struct ConstantHasher;

impl Hasher for ConstantHasher {
    fn finish(&self) -> u64 {
        42
    }

    fn write(&mut self, _bytes: &[u8]) {}
}

impl BuildHasher for ConstantState {
    type Hasher = ConstantHasher;

    fn build_hasher(&self) -> ConstantHasher {
        ConstantHasher
    }
}

/// `threads` threads insert the same value at once; returns how many saw it absent.
fn race_same_value<D: ConcurrentDedupeSet<u64>>(set: &D, threads: usize, value: u64) -> usize {
    let barrier = Barrier::new(threads);
    std::thread::scope(|scope| {
        let handles: Vec<_> = (0..threads)
            .map(|_| {
                let barrier = &barrier;
                scope.spawn(move || {
                    barrier.wait();
                    set.check_and_insert(&value)
                })
            })
            .collect();
        handles
            .into_iter()
            .map(|h| h.join().unwrap())
            .filter(|already_present| !already_present)
            .count()
    })
}

#[test]
fn striped_exactly_one_winner_under_contention() {
    for threads in [2, 16, 128] {
        for trial in 0..50u64 {
            let set = StripedDedupeSet::with_seed(4, trial).unwrap();
            assert_eq!(race_same_value(&set, threads, trial), 1, "threads={threads} trial={trial}");
            assert_eq!(set.len(), 1);
        }
    }
}

#[test]
fn lock_free_exactly_one_winner_under_contention() {
    for threads in [2, 16, 128] {
        for trial in 0..50u64 {
            let set = AtomicDedupeSet::with_seed(4, trial).unwrap();
            assert_eq!(race_same_value(&set, threads, trial), 1, "threads={threads} trial={trial}");
            assert_eq!(set.len(), 1);
        }
    }
}

/// Many threads insert overlapping key ranges into a tiny table so every
/// bucket sees contention; each key must be won exactly once.
fn overlapping_ranges<D: ConcurrentDedupeSet<u64>>(set: &D) {
    const THREADS: u64 = 8;
    const KEYS: u64 = 2_000;
    let barrier = Barrier::new(THREADS as usize);
    let won: usize = std::thread::scope(|scope| {
        let handles: Vec<_> = (0..THREADS)
            .map(|t| {
                let barrier = &barrier;
                scope.spawn(move || {
                    barrier.wait();
                    // Every thread walks all keys, starting at a different offset.
                    (0..KEYS)
                        .map(|i| (i + t * KEYS / THREADS) % KEYS)
                        .filter(|k| !set.check_and_insert(k))
                        .count()
                })
            })
            .collect();
        handles.into_iter().map(|h| h.join().unwrap()).sum()
    });
    assert_eq!(won, KEYS as usize);
    assert_eq!(set.len(), KEYS as usize);
    for k in 0..KEYS {
        assert!(set.contains(&k));
    }
    assert!(!set.contains(&KEYS));
}

#[test]
fn striped_overlapping_ranges() {
    overlapping_ranges(&StripedDedupeSet::with_seed(2, 9).unwrap());
}

#[test]
fn lock_free_overlapping_ranges() {
    overlapping_ranges(&AtomicDedupeSet::with_seed(2, 9).unwrap());
}

#[test]
fn constant_hash_still_answers_membership() {
    let striped = StripedDedupeSet::with_hasher(8, 123, ConstantState).unwrap();
    let lock_free = AtomicDedupeSet::with_hasher(8, 123, ConstantState).unwrap();
    for v in 0..300u64 {
        assert!(!striped.check_and_insert(&v));
        assert!(!lock_free.check_and_insert(&v));
    }
    for v in 0..300u64 {
        assert!(striped.check_and_insert(&v));
        assert!(lock_free.check_and_insert(&v));
    }
    assert!(!striped.contains(&300));
    assert!(!lock_free.contains(&300));
    assert_eq!(striped.len(), 300);
    assert_eq!(lock_free.len(), 300);
}

#[test]
fn constant_hash_under_contention() {
    let set = AtomicDedupeSet::with_hasher(6, 5, ConstantState).unwrap();
    overlapping_ranges(&set);
}

#[test]
fn bucket_bits_are_validated_before_allocating() {
    assert_eq!(
        StripedDedupeSet::<u64>::new(0).err(),
        Some(ConfigError::ZeroBucketBits)
    );
    assert_eq!(
        AtomicDedupeSet::<u64>::new(MAX_BUCKET_BITS + 10).err(),
        Some(ConfigError::BucketBitsTooLarge {
            requested: MAX_BUCKET_BITS + 10,
            max: MAX_BUCKET_BITS,
        })
    );
    // An absurd request must fail fast instead of trying to allocate.
    assert!(StripedDedupeSet::<u64>::new(60).is_err());
}

#[test]
fn seed_is_recorded() {
    let set: StripedDedupeSet<u64> = StripedDedupeSet::with_seed(3, 0xfeed).unwrap();
    assert_eq!(set.seed(), 0xfeed);
    assert_eq!(set.bucket_count(), 8);
}
