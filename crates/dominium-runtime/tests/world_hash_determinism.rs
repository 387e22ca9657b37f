// SPDX-License-Identifier: Apache-2.0
//! The universal invariant (spec.md §8): two independently constructed
//! runtimes fed the same command stream and ticked the same number of
//! times must produce identical world hashes at every tick, including
//! when commands are rejected or regions collapse along the way.

use dominium_fixed::Q16_16;
use dominium_kernel::conflict::{ConflictCapacities, ConflictDomain, Side};
use dominium_kernel::economy::{EconomyCapacities, EconomyDomain};
use dominium_runtime::{AuthorityMode, Command, Runtime};

fn fresh_conflict() -> ConflictDomain {
    let mut domain = ConflictDomain::with_capacities(ConflictCapacities {
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
    });
    domain.init();
    domain.sides_mut().init_entry(Side {
        id: 1,
        region_id: 1,
        readiness: Q16_16::from_raw(0x8000),
        ..Default::default()
    });
    domain.sides_mut().init_entry(Side {
        id: 2,
        region_id: 2,
        readiness: Q16_16::from_raw(-0x8000),
        ..Default::default()
    });
    domain
}

fn fresh_economy() -> EconomyDomain {
    let mut domain = EconomyDomain::with_capacities(EconomyCapacities {
        containers: 4,
        storages: 4,
        transports: 4,
        jobs: 4,
        markets: 4,
        offers: 4,
        bids: 4,
        transactions: 4,
        capsules: 2,
    });
    domain.init();
    domain
}

fn submit_sample_commands(runtime: &mut Runtime) {
    runtime.register_schema(7, 1);
    for tick in 0..6 {
        runtime.submit(Command {
            scheduled_tick: tick,
            schema_id: 7,
            schema_version: 1,
            payload: vec![tick as u8],
            source_peer: 0,
            sequence: 0,
        });
    }
    // an always-unknown schema id, to exercise the rejection path identically
    // on both runtimes
    runtime.submit(Command {
        scheduled_tick: 2,
        schema_id: 999,
        schema_version: 1,
        payload: Vec::new(),
        source_peer: 0,
        sequence: 0,
    });
}

#[test]
fn two_independent_runtimes_over_the_same_command_stream_hash_identically() {
    let mut a = Runtime::new(fresh_conflict(), fresh_economy(), AuthorityMode::Single);
    let mut b = Runtime::new(fresh_conflict(), fresh_economy(), AuthorityMode::Single);
    submit_sample_commands(&mut a);
    submit_sample_commands(&mut b);

    for _ in 0..10 {
        let report_a = a.tick(500);
        let report_b = b.tick(500);
        assert_eq!(report_a.tick, report_b.tick);
        assert_eq!(report_a.world_hash, report_b.world_hash);
        assert_eq!(report_a.commands_dispatched, report_b.commands_dispatched);
        assert_eq!(report_a.commands_rejected, report_b.commands_rejected);
    }
    assert_eq!(a.total_commands_rejected(), b.total_commands_rejected());
    assert_eq!(a.total_commands_rejected(), 1);
}

#[test]
fn collapsing_a_region_on_both_runtimes_keeps_the_hashes_identical() {
    let mut a = Runtime::new(fresh_conflict(), fresh_economy(), AuthorityMode::Single);
    let mut b = Runtime::new(fresh_conflict(), fresh_economy(), AuthorityMode::Single);

    a.conflict_mut().collapse_region(2).expect("collapse a");
    b.conflict_mut().collapse_region(2).expect("collapse b");

    for _ in 0..4 {
        let report_a = a.tick(500);
        let report_b = b.tick(500);
        assert_eq!(report_a.world_hash, report_b.world_hash);
    }
}
