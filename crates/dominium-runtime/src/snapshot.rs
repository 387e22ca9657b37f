// SPDX-License-Identifier: Apache-2.0
//! Read-only runtime snapshots (spec.md §4.8 "Snapshot isolation").

use dominium_kernel::Tick;

use crate::world::{world_hash, Runtime};

/// A deep copy of a runtime's observable counters and world hash at one
/// instant. Building one never mutates any arena; building it twice in a
/// row between ticks produces the same `world_hash` (spec.md §8
/// "Snapshot building is a pure read").
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Snapshot {
    /// The tick this snapshot was taken at.
    pub tick: Tick,
    /// The canonical world hash at this instant.
    pub world_hash: u64,
    /// Conflict domain arena counts, in declared order.
    pub conflict_counts: ConflictCounts,
    /// Economy domain arena counts, in declared order.
    pub economy_counts: EconomyCounts,
}

/// Per-arena entity counts for the conflict domain, in declared order.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct ConflictCounts {
    /// Count of `ConflictRecord`s.
    pub records: usize,
    /// Count of `Side`s.
    pub sides: usize,
    /// Count of `Event`s.
    pub events: usize,
    /// Count of `Force`s.
    pub forces: usize,
    /// Count of `Engagement`s.
    pub engagements: usize,
    /// Count of `Outcome`s.
    pub outcomes: usize,
    /// Count of `Occupation`s.
    pub occupations: usize,
    /// Count of `Resistance`s.
    pub resistances: usize,
    /// Count of `MoraleField`s.
    pub morale_fields: usize,
    /// Count of `Weapon`s.
    pub weapons: usize,
}

/// Per-arena entity counts for the economy domain, in declared order.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct EconomyCounts {
    /// Count of `Container`s.
    pub containers: usize,
    /// Count of `Storage`s.
    pub storages: usize,
    /// Count of `Transport`s.
    pub transports: usize,
    /// Count of `Job`s.
    pub jobs: usize,
    /// Count of `Market`s.
    pub markets: usize,
    /// Count of `Offer`s.
    pub offers: usize,
    /// Count of `Bid`s.
    pub bids: usize,
    /// Count of `Transaction`s.
    pub transactions: usize,
}

/// Builds a point-in-time snapshot of `runtime`. Takes `&Runtime`, not
/// `&mut`: the borrow checker enforces the non-mutating contract at
/// compile time.
#[must_use]
pub fn build_snapshot(runtime: &Runtime) -> Snapshot {
    let conflict = runtime.conflict();
    let economy = runtime.economy();
    Snapshot {
        tick: runtime.current_tick(),
        world_hash: world_hash(conflict, economy),
        conflict_counts: ConflictCounts {
            records: conflict.records().count(),
            sides: conflict.sides().count(),
            events: conflict.events().count(),
            forces: conflict.forces().count(),
            engagements: conflict.engagements().count(),
            outcomes: conflict.outcomes().count(),
            occupations: conflict.occupations().count(),
            resistances: conflict.resistances().count(),
            morale_fields: conflict.morale_fields().count(),
            weapons: conflict.weapons().count(),
        },
        economy_counts: EconomyCounts {
            containers: economy.containers().count(),
            storages: economy.storages().count(),
            transports: economy.transports().count(),
            jobs: economy.jobs().count(),
            markets: economy.markets().count(),
            offers: economy.offers().count(),
            bids: economy.bids().count(),
            transactions: economy.transactions().count(),
        },
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::command::AuthorityMode;
    use dominium_kernel::conflict::{ConflictCapacities, ConflictDomain, Side};
    use dominium_kernel::economy::{EconomyCapacities, EconomyDomain};

    fn runtime_with_one_side() -> Runtime {
        let mut conflict = ConflictDomain::with_capacities(ConflictCapacities {
            records: 2,
            sides: 2,
            events: 2,
            forces: 2,
            engagements: 2,
            outcomes: 2,
            occupations: 2,
            resistances: 2,
            morale_fields: 2,
            weapons: 2,
            capsules: 1,
        });
        conflict.init();
        conflict.sides_mut().init_entry(Side {
            id: 1,
            region_id: 1,
            ..Default::default()
        });
        let mut economy = EconomyDomain::with_capacities(EconomyCapacities {
            containers: 2,
            storages: 2,
            transports: 2,
            jobs: 2,
            markets: 2,
            offers: 2,
            bids: 2,
            transactions: 2,
            capsules: 1,
        });
        economy.init();
        Runtime::new(conflict, economy, AuthorityMode::Single)
    }

    #[test]
    fn repeated_snapshots_between_ticks_do_not_change_the_hash() {
        let runtime = runtime_with_one_side();
        let first = build_snapshot(&runtime);
        let second = build_snapshot(&runtime);
        assert_eq!(first.world_hash, second.world_hash);
        assert_eq!(first, second);
    }

    #[test]
    fn snapshot_counts_match_arena_state() {
        let runtime = runtime_with_one_side();
        let snapshot = build_snapshot(&runtime);
        assert_eq!(snapshot.conflict_counts.sides, 1);
        assert_eq!(snapshot.economy_counts.containers, 0);
    }
}
