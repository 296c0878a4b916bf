use parbfs::collections::PartitionedSequence;
use parbfs::search::partition;
use proptest::prelude::*;

fn build(segment_lens: &[usize]) -> PartitionedSequence<usize> {
    let mut seq = PartitionedSequence::new(segment_lens.len());
    let mut next = 0;
    for (segment, &len) in segment_lens.iter().enumerate() {
        for _ in 0..len {
            seq.push(segment, next);
            next += 1;
        }
    }
    seq
}

#[test]
fn disjoint_segments_fill_from_threads() {
    let mut seq: PartitionedSequence<(usize, usize)> = PartitionedSequence::new(4);
    std::thread::scope(|scope| {
        for (k, segment) in seq.segments_mut().enumerate() {
            scope.spawn(move || {
                for i in 0..100 {
                    segment.push((k, i));
                }
            });
        }
    });

    assert_eq!(seq.len(), 400);
    // Logical order is segment 0 first, then 1, ...
    let flat: Vec<_> = seq.iter().copied().collect();
    for (pos, &(k, i)) in flat.iter().enumerate() {
        assert_eq!((k, i), (pos / 100, pos % 100));
    }
}

#[test]
fn ranges_from_partition_cover_the_sequence() {
    let seq = build(&[5, 0, 3, 0, 0, 9]);
    let mut rebuilt = Vec::new();
    for range in partition(seq.len(), 4) {
        rebuilt.extend(seq.range(range).copied());
    }
    assert_eq!(rebuilt, (0..17).collect::<Vec<_>>());
}

#[test]
fn into_vec_matches_iter() {
    let seq = build(&[2, 2, 0, 1]);
    let by_iter: Vec<usize> = seq.iter().copied().collect();
    assert_eq!(seq.into_vec(), by_iter);
}

proptest! {
    #[test]
    fn logical_index_matches_flattened(lens in proptest::collection::vec(0usize..6, 1..8)) {
        let seq = build(&lens);
        let total: usize = lens.iter().sum();
        prop_assert_eq!(seq.len(), total);
        for i in 0..total {
            prop_assert_eq!(seq.get(i), Some(&i));
            let (segment, offset) = seq.locate(i).unwrap();
            prop_assert_eq!(seq.segment(segment)[offset], i);
        }
        prop_assert_eq!(seq.get(total), None);
    }

    #[test]
    fn any_subrange_reads_in_order(
        lens in proptest::collection::vec(0usize..6, 1..8),
        a in 0usize..40,
        b in 0usize..40,
    ) {
        let seq = build(&lens);
        let total = seq.len();
        let (lo, hi) = (a.min(b).min(total), a.max(b).min(total));
        let iter = seq.range(lo..hi);
        prop_assert_eq!(iter.len(), hi - lo);
        let got: Vec<usize> = iter.copied().collect();
        prop_assert_eq!(got, (lo..hi).collect::<Vec<_>>());
    }

    #[test]
    fn partition_is_exact_cover(len in 0usize..500, parts in 1usize..70) {
        let ranges: Vec<_> = partition(len, parts).collect();
        prop_assert_eq!(ranges.len(), parts);

        let per = len.div_ceil(parts);
        let mut expected_start = 0;
        for range in &ranges {
            // contiguous and disjoint
            prop_assert_eq!(range.start, expected_start);
            prop_assert!(range.end >= range.start);
            prop_assert!(range.len() <= per);
            expected_start = range.end;
        }
        prop_assert_eq!(expected_start, len);

        // Every range before the last non-empty one is full.
        if let Some(last) = ranges.iter().rposition(|r| !r.is_empty()) {
            for range in &ranges[..last] {
                prop_assert_eq!(range.len(), per);
            }
        }
    }
}

#[test]
fn partition_edge_cases() {
    assert!(partition(0, 4).all(|r| r.is_empty()));

    let ranges: Vec<_> = partition(3, 8).collect();
    assert_eq!(ranges.iter().filter(|r| !r.is_empty()).count(), 3);
    assert!(ranges.iter().all(|r| r.len() <= 1));
}
