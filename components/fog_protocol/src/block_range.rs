//! Block index ranges and the range sets used to track which blocks still need to be
//! scanned.

use std::fmt;
use std::ops::Range;

/// A half-open range of block indices.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct BlockRange {
    block_range: Range<u64>,
}

impl fmt::Display for BlockRange {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}..{}", self.block_range.start, self.block_range.end)
    }
}

impl BlockRange {
    /// Constructs a block range from its bounds.
    ///
    /// Panics: if `block_range.end < block_range.start`.
    pub fn from_parts(block_range: Range<u64>) -> Self {
        assert!(
            block_range.end >= block_range.start,
            "{:?} is invalid for BlockRange",
            block_range,
        );
        BlockRange { block_range }
    }

    /// Returns the range of block indices.
    pub fn block_range(&self) -> &Range<u64> {
        &self.block_range
    }

    pub fn start(&self) -> u64 {
        self.block_range.start
    }

    pub fn end(&self) -> u64 {
        self.block_range.end
    }

    /// Returns whether or not the range is empty.
    pub fn is_empty(&self) -> bool {
        self.block_range.is_empty()
    }

    /// Returns the number of blocks in the range.
    pub fn len(&self) -> u64 {
        self.block_range.end - self.block_range.start
    }

    pub fn contains(&self, block_index: u64) -> bool {
        self.block_range.contains(&block_index)
    }
}

/// A set of block indices stored as sorted, disjoint, non-adjacent [`BlockRange`]s.
///
/// Inserting a range that overlaps or touches existing ranges coalesces them; removing
/// a range trims or splits whatever it overlaps. Empty ranges are never stored.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct BlockRanges {
    ranges: Vec<BlockRange>,
}

impl BlockRanges {
    /// Constructs an empty range set.
    pub fn new() -> Self {
        Self::default()
    }

    pub fn is_empty(&self) -> bool {
        self.ranges.is_empty()
    }

    /// Returns the ranges of the set in ascending order.
    pub fn ranges(&self) -> &[BlockRange] {
        &self.ranges
    }

    /// Returns the total number of blocks covered by the set.
    pub fn block_count(&self) -> u64 {
        self.ranges.iter().map(BlockRange::len).sum()
    }

    pub fn contains(&self, block_index: u64) -> bool {
        self.ranges.iter().any(|r| r.contains(block_index))
    }

    /// Adds every block of `range` to the set.
    pub fn insert(&mut self, range: BlockRange) {
        if range.is_empty() {
            return;
        }

        self.ranges.push(range);
        self.ranges.sort_by_key(BlockRange::start);

        let mut coalesced: Vec<BlockRange> = Vec::with_capacity(self.ranges.len());
        for range in self.ranges.drain(..) {
            match coalesced.last_mut() {
                Some(last) if range.start() <= last.end() => {
                    let end = last.end().max(range.end());
                    last.block_range.end = end;
                }
                _ => coalesced.push(range),
            }
        }
        self.ranges = coalesced;
    }

    /// Removes every block of `range` from the set.
    pub fn remove(&mut self, range: &BlockRange) {
        if range.is_empty() {
            return;
        }

        self.ranges = self
            .ranges
            .drain(..)
            .flat_map(|r| {
                let below = BlockRange {
                    block_range: r.start()..r.end().min(range.start()),
                };
                let above = BlockRange {
                    block_range: r.start().max(range.end())..r.end(),
                };
                [below, above]
            })
            .filter(|r| r.start() < r.end())
            .collect();
    }
}

impl FromIterator<BlockRange> for BlockRanges {
    fn from_iter<I: IntoIterator<Item = BlockRange>>(iter: I) -> Self {
        let mut ranges = BlockRanges::new();
        for range in iter {
            ranges.insert(range);
        }
        ranges
    }
}

impl Extend<BlockRange> for BlockRanges {
    fn extend<I: IntoIterator<Item = BlockRange>>(&mut self, iter: I) {
        for range in iter {
            self.insert(range);
        }
    }
}

#[cfg(any(test, feature = "test-dependencies"))]
pub mod testing {
    use proptest::prelude::*;

    use super::BlockRange;

    /// Generates non-empty block ranges starting below `max_start`.
    pub fn arb_block_range(max_start: u64, max_len: u64) -> impl Strategy<Value = BlockRange> {
        (0..max_start, 1..=max_len).prop_map(|(start, len)| BlockRange::from_parts(start..start + len))
    }
}

#[cfg(test)]
mod tests {
    use std::collections::BTreeSet;

    use proptest::prelude::*;

    use super::{testing::arb_block_range, BlockRange, BlockRanges};

    fn block_range(start: u64, end: u64) -> BlockRange {
        BlockRange::from_parts(start..end)
    }

    #[test]
    fn insert_coalesces_adjacent_and_overlapping() {
        let mut ranges = BlockRanges::new();
        ranges.insert(block_range(10, 20));
        ranges.insert(block_range(30, 40));
        ranges.insert(block_range(20, 25));
        assert_eq!(ranges.ranges(), &[block_range(10, 25), block_range(30, 40)]);

        ranges.insert(block_range(24, 31));
        assert_eq!(ranges.ranges(), &[block_range(10, 40)]);

        ranges.insert(block_range(50, 50));
        assert_eq!(ranges.ranges(), &[block_range(10, 40)]);
        assert_eq!(ranges.block_count(), 30);
    }

    #[test]
    fn remove_trims_and_splits() {
        let mut ranges: BlockRanges = [block_range(10, 40)].into_iter().collect();

        ranges.remove(&block_range(15, 20));
        assert_eq!(ranges.ranges(), &[block_range(10, 15), block_range(20, 40)]);

        ranges.remove(&block_range(0, 12));
        assert_eq!(ranges.ranges(), &[block_range(12, 15), block_range(20, 40)]);

        ranges.remove(&block_range(30, 30));
        assert_eq!(ranges.ranges(), &[block_range(12, 15), block_range(20, 40)]);

        ranges.remove(&block_range(0, 100));
        assert!(ranges.is_empty());
    }

    proptest! {
        #[test]
        fn range_set_matches_block_set(
            inserted in prop::collection::vec(arb_block_range(64, 16), 0..8),
            removed in prop::collection::vec(arb_block_range(64, 16), 0..8),
        ) {
            let mut ranges = BlockRanges::new();
            let mut model = BTreeSet::new();
            for r in &inserted {
                ranges.insert(r.clone());
                model.extend(r.block_range().clone());
            }
            for r in &removed {
                ranges.remove(r);
                for i in r.block_range().clone() {
                    model.remove(&i);
                }
            }

            for i in 0..96 {
                prop_assert_eq!(ranges.contains(i), model.contains(&i));
            }
            prop_assert_eq!(ranges.block_count(), model.len() as u64);
            for pair in ranges.ranges().windows(2) {
                prop_assert!(pair[0].end() < pair[1].start());
            }
            prop_assert!(ranges.ranges().iter().all(|r| !r.is_empty()));
        }
    }
}
