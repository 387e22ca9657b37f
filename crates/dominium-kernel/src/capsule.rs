// SPDX-License-Identifier: Apache-2.0
//! Shared capsule machinery: fixed-capacity per-region capsule tables and
//! the 4-bin histogram used by both domains (spec.md §4.7).

use dominium_fixed::Q16_16;
use dominium_hash::RngCursor;

use crate::ids::RegionId;

/// Number of histogram bins a collapsed region's characteristic ratio is
/// bucketed into.
pub const HISTOGRAM_BINS: usize = 4;

/// A 4-bin histogram over a Q16.16 ratio, with a per-bin deterministic RNG
/// cursor so capsule sampling stays reproducible.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Histogram4 {
    /// `bin_count / total_seen`, one ratio per bin.
    pub bin_ratio: [Q16_16; HISTOGRAM_BINS],
    /// Per-bin RNG cursor, initialized to `0` at collapse time.
    pub bin_cursor: [RngCursor; HISTOGRAM_BINS],
}

impl Default for Histogram4 {
    fn default() -> Self {
        Self {
            bin_ratio: [Q16_16::ZERO; HISTOGRAM_BINS],
            bin_cursor: [RngCursor::from_raw_seed(0); HISTOGRAM_BINS],
        }
    }
}

impl Histogram4 {
    /// Maps a clamped Q16.16 ratio in `[0, 1]` to one of the four bins,
    /// using its top two significant bits (spec.md §4.7 step 3).
    #[must_use]
    pub fn bin_index(ratio: Q16_16) -> usize {
        let clamped = ratio.clamp_unit().raw();
        let shifted = (clamped >> 14) as usize;
        shifted.min(HISTOGRAM_BINS - 1)
    }

    /// Accumulates one observation of `ratio` into the running per-bin
    /// counts (caller divides by the total seen count once accumulation is
    /// complete; see [`Histogram4::finish`]).
    pub fn accumulate(counts: &mut [u32; HISTOGRAM_BINS], ratio: Q16_16) {
        counts[Self::bin_index(ratio)] += 1;
    }

    /// Reduces raw per-bin counts into a finished histogram of ratios,
    /// zero-initializing the per-bin RNG cursors.
    #[must_use]
    pub fn finish(counts: [u32; HISTOGRAM_BINS], total_seen: u32) -> Self {
        let mut bin_ratio = [Q16_16::ZERO; HISTOGRAM_BINS];
        for (bin, &count) in bin_ratio.iter_mut().zip(counts.iter()) {
            *bin = dominium_fixed::Q48_16::from_int(i64::from(count))
                .div_count(total_seen)
                .narrow_unit();
        }
        Self {
            bin_ratio,
            bin_cursor: [RngCursor::from_raw_seed(0); HISTOGRAM_BINS],
        }
    }
}

/// A fixed-capacity table mapping `region_id -> C`, used to store at most
/// one capsule per region per domain (spec.md §3.3 invariant).
#[derive(Debug, Clone)]
pub struct CapsuleTable<C> {
    capacity: usize,
    entries: Vec<(RegionId, C)>,
}

impl<C> CapsuleTable<C> {
    /// Creates an empty table with room for at most `capacity` capsules.
    #[must_use]
    pub fn with_capacity(capacity: usize) -> Self {
        Self {
            capacity,
            entries: Vec::with_capacity(capacity),
        }
    }

    /// Looks up the capsule stored for `region_id`, if any.
    #[must_use]
    pub fn get(&self, region_id: RegionId) -> Option<&C> {
        self.entries
            .iter()
            .find(|(r, _)| *r == region_id)
            .map(|(_, c)| c)
    }

    /// Mutable lookup, see [`CapsuleTable::get`].
    pub fn get_mut(&mut self, region_id: RegionId) -> Option<&mut C> {
        self.entries
            .iter_mut()
            .find(|(r, _)| *r == region_id)
            .map(|(_, c)| c)
    }

    /// `true` iff a capsule is already stored for `region_id`.
    #[must_use]
    pub fn contains(&self, region_id: RegionId) -> bool {
        self.entries.iter().any(|(r, _)| *r == region_id)
    }

    /// Inserts a capsule for `region_id`. Returns `false` if the table is
    /// already at capacity and `region_id` was not already present.
    pub fn insert(&mut self, region_id: RegionId, capsule: C) -> bool {
        if self.contains(region_id) {
            return true;
        }
        if self.entries.len() >= self.capacity {
            return false;
        }
        self.entries.push((region_id, capsule));
        true
    }

    /// Removes the capsule stored for `region_id` via swap-remove, matching
    /// `expand_region`'s "swap with the last, decrement the count" (spec.md
    /// §4.7). Returns the removed capsule, if any.
    pub fn remove(&mut self, region_id: RegionId) -> Option<C> {
        let index = self.entries.iter().position(|(r, _)| *r == region_id)?;
        Some(self.entries.swap_remove(index).1)
    }

    /// Number of capsules currently stored.
    #[must_use]
    pub fn count(&self) -> usize {
        self.entries.len()
    }

    /// Iterates the stored `(region_id, capsule)` pairs in insertion order,
    /// for save/restore.
    pub fn iter(&self) -> impl Iterator<Item = &(RegionId, C)> {
        self.entries.iter()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn bin_index_covers_full_unit_range() {
        assert_eq!(Histogram4::bin_index(Q16_16::ZERO), 0);
        assert_eq!(Histogram4::bin_index(Q16_16::ONE), HISTOGRAM_BINS - 1);
        assert_eq!(
            Histogram4::bin_index(Q16_16::from_raw(0x4000)),
            1,
            "quarter-turn boundary lands in bin 1"
        );
    }

    #[test]
    fn table_insert_is_idempotent() {
        let mut table: CapsuleTable<u32> = CapsuleTable::with_capacity(1);
        assert!(table.insert(7, 100));
        assert!(table.insert(7, 999));
        assert_eq!(table.get(7), Some(&100));
        assert_eq!(table.count(), 1);
    }

    #[test]
    fn table_insert_fails_when_full() {
        let mut table: CapsuleTable<u32> = CapsuleTable::with_capacity(1);
        assert!(table.insert(1, 10));
        assert!(!table.insert(2, 20));
    }

    #[test]
    fn remove_then_reinsert_round_trips() {
        let mut table: CapsuleTable<u32> = CapsuleTable::with_capacity(2);
        table.insert(1, 10);
        table.insert(2, 20);
        assert_eq!(table.remove(1), Some(10));
        assert_eq!(table.count(), 1);
        assert!(table.insert(3, 30));
    }
}
