// SPDX-License-Identifier: Apache-2.0
//! `RngCursor`: a deterministic per-entity pseudo-random cursor.

use crate::h32::h32;

/// A deterministic xorshift32 cursor.
///
/// Seeded once at `init_entry` time from `h32(domain_seed_label) ^ id`, and
/// advanced by one step each time a capsule histogram bin is sampled. Never
/// reseeded from wall-clock time or any other non-deterministic source.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct RngCursor {
    state: u32,
}

impl RngCursor {
    /// Constructs a cursor seeded from a domain label and an entity id.
    ///
    /// The seed is never zero: xorshift32 is fixed at zero forever if seeded
    /// with zero, so a zero seed is remapped to a nonzero constant.
    #[must_use]
    pub fn seeded(domain_seed_label: &str, id: u32) -> Self {
        let seed = h32(domain_seed_label) ^ id;
        Self::from_raw_seed(seed)
    }

    /// Constructs a cursor directly from a raw 32-bit seed.
    #[must_use]
    pub fn from_raw_seed(seed: u32) -> Self {
        Self {
            state: if seed == 0 { 0x9e37_79b9 } else { seed },
        }
    }

    /// Advances the cursor and returns the next pseudo-random 32-bit word.
    pub fn next_u32(&mut self) -> u32 {
        let mut x = self.state;
        x ^= x << 13;
        x ^= x >> 17;
        x ^= x << 5;
        self.state = x;
        x
    }

    /// Draws a value in `0..bound` (bound must be nonzero; returns `0` if
    /// `bound` is zero rather than dividing by zero).
    pub fn next_below(&mut self, bound: u32) -> u32 {
        if bound == 0 {
            0
        } else {
            self.next_u32() % bound
        }
    }

    /// Returns the raw internal state (used to persist a cursor inside a
    /// capsule across save/restore).
    #[must_use]
    pub const fn raw(self) -> u32 {
        self.state
    }

    /// Restores a cursor from a previously persisted raw state.
    #[must_use]
    pub const fn from_persisted(raw: u32) -> Self {
        Self { state: raw }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn deterministic_sequence() {
        let mut a = RngCursor::seeded("conflict", 7);
        let mut b = RngCursor::seeded("conflict", 7);
        for _ in 0..16 {
            assert_eq!(a.next_u32(), b.next_u32());
        }
    }

    #[test]
    fn different_ids_usually_diverge() {
        let mut a = RngCursor::seeded("conflict", 7);
        let mut b = RngCursor::seeded("conflict", 8);
        assert_ne!(a.next_u32(), b.next_u32());
    }

    #[test]
    fn zero_seed_is_remapped() {
        let cursor = RngCursor::from_raw_seed(0);
        assert_ne!(cursor.raw(), 0);
    }

    #[test]
    fn next_below_zero_bound_is_zero() {
        let mut cursor = RngCursor::seeded("economy", 1);
        assert_eq!(cursor.next_below(0), 0);
    }

    #[test]
    fn persist_and_restore_round_trips() {
        let mut cursor = RngCursor::seeded("conflict", 99);
        cursor.next_u32();
        let raw = cursor.raw();
        let mut restored = RngCursor::from_persisted(raw);
        let mut original = cursor;
        assert_eq!(restored.next_u32(), original.next_u32());
    }
}
