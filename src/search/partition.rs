//! Splitting a frontier's index space among workers.

use core::ops::Range;

/// Splits `0..len` into `parts` contiguous ranges of `ceil(len / parts)`.
///
/// Ranges are yielded in order and cover `0..len` exactly. Once `len` runs out
/// the remaining ranges are short, then empty (`len..len`); with `len < parts`
/// several trailing ranges are empty.
///
/// # Panics
/// Panics if `parts == 0`.
pub fn partition(len: usize, parts: usize) -> Partition {
    assert!(parts != 0, "parts must be > 0");
    Partition {
        len,
        per_part: len.div_ceil(parts),
        parts,
        next: 0,
    }
}

/// Iterator returned by [`partition`].
#[derive(Debug, Clone)]
pub struct Partition {
    len: usize,
    per_part: usize,
    parts: usize,
    next: usize,
}

impl Partition {
    /// Size of every full range.
    pub fn per_part(&self) -> usize {
        self.per_part
    }
}

impl Iterator for Partition {
    type Item = Range<usize>;

    fn next(&mut self) -> Option<Range<usize>> {
        if self.next == self.parts {
            return None;
        }
        let k = self.next;
        self.next += 1;
        let begin = self.per_part.saturating_mul(k).min(self.len);
        let end = self.per_part.saturating_mul(k + 1).min(self.len);
        Some(begin..end)
    }

    fn size_hint(&self) -> (usize, Option<usize>) {
        let rem = self.parts - self.next;
        (rem, Some(rem))
    }
}

impl ExactSizeIterator for Partition {}
