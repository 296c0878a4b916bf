//! `PartitionedSequence` — one logical vector made of per-writer segments.
//!
//! Goals:
//! - many threads append concurrently without sharing a lock (each owns a segment)
//! - the whole thing still reads as a single 0-indexed sequence, segment 0 first
//! - no copying into a contiguous buffer to hand out sub-ranges
//!
//! This is the frontier layout used by the level-synchronous search: workers fill
//! disjoint segments during a round, and the next round splits the merged logical
//! sequence by index.

use core::ops::Range;

/// A sequence stored as `segment_count` independently growable segments.
///
/// Mutation is only available per segment ([`segment_mut`](Self::segment_mut),
/// [`segments_mut`](Self::segments_mut)); the logical view is read-only.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PartitionedSequence<T> {
    segments: Vec<Vec<T>>,
}

impl<T> PartitionedSequence<T> {
    /// Creates an empty sequence with `segment_count` empty segments.
    pub fn new(segment_count: usize) -> Self {
        let segments = (0..segment_count).map(|_| Vec::new()).collect();
        Self { segments }
    }

    /// Returns the number of segments.
    pub fn segment_count(&self) -> usize {
        self.segments.len()
    }

    /// Returns the total number of elements across all segments.
    ///
    /// **Time complexity**: \(O(segments)\)
    pub fn len(&self) -> usize {
        self.segments.iter().map(Vec::len).sum()
    }

    /// Returns `true` if every segment is empty.
    pub fn is_empty(&self) -> bool {
        self.segments.iter().all(Vec::is_empty)
    }

    /// Returns segment `index` as a slice.
    ///
    /// # Panics
    /// Panics if `index >= segment_count()`.
    pub fn segment(&self, index: usize) -> &[T] {
        &self.segments[index]
    }

    /// Returns a mutable handle to segment `index`.
    ///
    /// # Panics
    /// Panics if `index >= segment_count()`.
    pub fn segment_mut(&mut self, index: usize) -> &mut Vec<T> {
        &mut self.segments[index]
    }

    /// Returns disjoint mutable handles to every segment, in segment order.
    ///
    /// Each handle can be moved to a different thread; no two threads can ever
    /// observe the same segment mutably.
    pub fn segments_mut(&mut self) -> core::slice::IterMut<'_, Vec<T>> {
        self.segments.iter_mut()
    }

    /// Appends `value` to segment `index`.
    pub fn push(&mut self, index: usize, value: T) {
        self.segments[index].push(value);
    }

    /// Translates a logical index into `(segment, offset)`.
    ///
    /// Returns `None` if `index >= len()`.
    ///
    /// **Time complexity**: \(O(segments)\)
    pub fn locate(&self, index: usize) -> Option<(usize, usize)> {
        let mut offset = index;
        for (segment, items) in self.segments.iter().enumerate() {
            if offset < items.len() {
                return Some((segment, offset));
            }
            offset -= items.len();
        }
        None
    }

    /// Returns the element at logical position `index`.
    pub fn get(&self, index: usize) -> Option<&T> {
        let (segment, offset) = self.locate(index)?;
        self.segments[segment].get(offset)
    }

    /// Returns an iterator over the whole logical sequence.
    pub fn iter(&self) -> LogicalIter<'_, T> {
        LogicalIter {
            segments: &self.segments,
            segment: 0,
            offset: 0,
            remaining: self.len(),
        }
    }

    /// Returns an iterator over the logical slice `range`.
    ///
    /// The iterator is lazy and borrows the segments in place. It can be
    /// recreated at will (`range` is cheap) and is `Send` when `T: Sync`.
    ///
    /// # Panics
    /// Panics if `range` is decreasing or extends past `len()`.
    pub fn range(&self, range: Range<usize>) -> LogicalIter<'_, T> {
        let len = self.len();
        assert!(
            range.start <= range.end && range.end <= len,
            "range {range:?} out of bounds for length {len}"
        );

        let (segment, offset) = self
            .locate(range.start)
            .unwrap_or((self.segments.len(), 0));
        LogicalIter {
            segments: &self.segments,
            segment,
            offset,
            remaining: range.end - range.start,
        }
    }

    /// Empties every segment, keeping the segment count.
    pub fn clear(&mut self) {
        for segment in &mut self.segments {
            segment.clear();
        }
    }

    /// Consumes the sequence and returns its elements in logical order.
    pub fn into_vec(self) -> Vec<T> {
        let mut out = Vec::with_capacity(self.len());
        for segment in self.segments {
            out.extend(segment);
        }
        out
    }
}

impl<T> Default for PartitionedSequence<T> {
    fn default() -> Self {
        Self::new(1)
    }
}

impl<'a, T> IntoIterator for &'a PartitionedSequence<T> {
    type Item = &'a T;
    type IntoIter = LogicalIter<'a, T>;

    fn into_iter(self) -> Self::IntoIter {
        self.iter()
    }
}

/// Iterator over `&T` across segment boundaries.
#[derive(Debug, Clone)]
pub struct LogicalIter<'a, T> {
    segments: &'a [Vec<T>],
    segment: usize,
    offset: usize,
    remaining: usize,
}

impl<'a, T> LogicalIter<'a, T> {
    /// Returns how many items remain.
    pub fn remaining(&self) -> usize {
        self.remaining
    }
}

impl<'a, T> Iterator for LogicalIter<'a, T> {
    type Item = &'a T;

    fn next(&mut self) -> Option<Self::Item> {
        if self.remaining == 0 {
            return None;
        }
        // Skip exhausted (or empty) segments.
        while self.offset >= self.segments.get(self.segment)?.len() {
            self.segment += 1;
            self.offset = 0;
        }
        let item = &self.segments[self.segment][self.offset];
        self.offset += 1;
        self.remaining -= 1;
        Some(item)
    }

    fn size_hint(&self) -> (usize, Option<usize>) {
        (self.remaining, Some(self.remaining))
    }
}

impl<'a, T> ExactSizeIterator for LogicalIter<'a, T> {}

impl<'a, T> core::iter::FusedIterator for LogicalIter<'a, T> {}

#[cfg(test)]
mod tests {
    use super::*;

    fn sample() -> PartitionedSequence<u32> {
        // [0, 1, 2] [] [3] [4, 5]
        let mut seq = PartitionedSequence::new(4);
        seq.segment_mut(0).extend([0, 1, 2]);
        seq.push(2, 3);
        seq.segment_mut(3).extend([4, 5]);
        seq
    }

    #[test]
    fn locate_skips_empty_segments() {
        let seq = sample();
        assert_eq!(seq.locate(2), Some((0, 2)));
        assert_eq!(seq.locate(3), Some((2, 0)));
        assert_eq!(seq.locate(5), Some((3, 1)));
        assert_eq!(seq.locate(6), None);
    }

    #[test]
    fn range_crosses_segments() {
        let seq = sample();
        let got: Vec<u32> = seq.range(2..5).copied().collect();
        assert_eq!(got, vec![2, 3, 4]);
        assert_eq!(seq.range(6..6).count(), 0);
        assert_eq!(seq.range(1..4).remaining(), 3);
    }

    #[test]
    #[should_panic(expected = "out of bounds")]
    fn range_past_end_panics() {
        let seq = sample();
        let _ = seq.range(4..7);
    }

    #[test]
    fn clear_keeps_segments() {
        let mut seq = sample();
        seq.clear();
        assert!(seq.is_empty());
        assert_eq!(seq.segment_count(), 4);
        assert_eq!(seq.iter().next(), None);
    }
}
