// SPDX-License-Identifier: Apache-2.0
//! Whole-crate round-trip tests for `save_state`/`load_state`: a runtime
//! ticked forward several times, saved, and restored into a fresh
//! `Runtime` must resolve identically to the original from that point on.

use dominium_fixed::Q16_16;
use dominium_kernel::conflict::{ConflictCapacities, ConflictDomain, Side};
use dominium_kernel::economy::{EconomyCapacities, EconomyDomain};
use dominium_runtime::{load_state, save_state, AuthorityMode, Runtime, RestoreCapacities};

fn capacities() -> RestoreCapacities {
    RestoreCapacities {
        conflict: ConflictCapacities {
            records: 4,
            sides: 4,
            events: 4,
            forces: 4,
            engagements: 4,
            outcomes: 4,
            occupations: 4,
            resistances: 4,
            morale_fields: 4,
            weapons: 4,
            capsules: 2,
        },
        economy: EconomyCapacities {
            containers: 4,
            storages: 4,
            transports: 4,
            jobs: 4,
            markets: 4,
            offers: 4,
            bids: 4,
            transactions: 4,
            capsules: 2,
        },
    }
}

fn seeded_runtime() -> Runtime {
    let caps = capacities();
    let mut conflict = ConflictDomain::with_capacities(caps.conflict);
    conflict.init();
    conflict.sides_mut().init_entry(Side {
        id: 1,
        region_id: 1,
        readiness: Q16_16::from_raw(0x1234),
        ..Default::default()
    });
    conflict.sides_mut().init_entry(Side {
        id: 2,
        region_id: 2,
        readiness: Q16_16::from_raw(-0x4321),
        ..Default::default()
    });
    let mut economy = EconomyDomain::with_capacities(caps.economy);
    economy.init();
    Runtime::new(conflict, economy, AuthorityMode::Single)
}

#[test]
fn restored_runtime_keeps_ticking_in_lockstep_with_the_original() {
    let mut original = seeded_runtime();
    for _ in 0..7 {
        original.tick(1000);
    }

    let bytes = save_state(&original, 42, 7);
    let (mut restored, run_id, instance_id) =
        load_state(&bytes, capacities(), AuthorityMode::Single).expect("load succeeds");
    assert_eq!(run_id, 42);
    assert_eq!(instance_id, 7);
    assert_eq!(restored.current_tick(), original.current_tick());

    for _ in 0..5 {
        let original_report = original.tick(1000);
        let restored_report = restored.tick(1000);
        assert_eq!(original_report.world_hash, restored_report.world_hash);
        assert_eq!(original_report.tick, restored_report.tick);
    }
}

#[test]
fn save_is_idempotent_under_repeated_round_trips() {
    let runtime = seeded_runtime();
    let first_bytes = save_state(&runtime, 1, 1);
    let (restored, ..) =
        load_state(&first_bytes, capacities(), AuthorityMode::Single).expect("first load");
    let second_bytes = save_state(&restored, 1, 1);
    assert_eq!(first_bytes, second_bytes);
}

#[test]
fn arena_counts_survive_the_round_trip() {
    let runtime = seeded_runtime();
    let bytes = save_state(&runtime, 0, 0);
    let (restored, ..) =
        load_state(&bytes, capacities(), AuthorityMode::Single).expect("load succeeds");
    assert_eq!(restored.conflict().sides().count(), 2);
    assert_eq!(restored.conflict().records().count(), 0);
    assert_eq!(restored.economy().containers().count(), 0);
}
