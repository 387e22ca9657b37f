// SPDX-License-Identifier: Apache-2.0
//! `dominium conflict {validate,inspect,resolve,collapse}`.

use dominium_fixture::parse_ref;
use dominium_kernel::budget::Budget;
use dominium_kernel::conflict::{ConflictCapacities, ConflictDomain};

use crate::cli::{FixtureArgs, InspectArgs, RegionArgs, ResolveArgs};
use crate::error::CliError;
use crate::fixture_io::read_to_string;
use crate::output::{print_query_meta, print_resolve_meta};

/// Arena capacities used for every CLI invocation. The fixture text format
/// carries no capacity declaration of its own, so this binary picks one
/// generous enough that no realistic hand-written fixture overflows it.
pub const CAPACITIES: ConflictCapacities = ConflictCapacities {
    records: 1024,
    sides: 1024,
    events: 1024,
    forces: 1024,
    engagements: 1024,
    outcomes: 1024,
    occupations: 1024,
    resistances: 1024,
    morale_fields: 1024,
    weapons: 1024,
    capsules: 256,
};

fn load(fixture: &std::path::Path) -> Result<ConflictDomain, CliError> {
    let text = read_to_string(fixture)?;
    Ok(dominium_fixture::parse_conflict_fixture(&text, CAPACITIES)?)
}

/// `conflict validate`: parse the fixture and report per-kind counts.
pub fn run_validate(args: &FixtureArgs) -> Result<bool, CliError> {
    let domain = load(&args.fixture)?;
    println!("DOMINIUM_CONFLICT_VALIDATE_V1");
    println!("regions={}", domain.region_ids().len());
    println!("records={}", domain.records().count());
    println!("sides={}", domain.sides().count());
    println!("events={}", domain.events().count());
    println!("forces={}", domain.forces().count());
    println!("engagements={}", domain.engagements().count());
    println!("outcomes={}", domain.outcomes().count());
    println!("occupations={}", domain.occupations().count());
    println!("resistances={}", domain.resistances().count());
    println!("morale_fields={}", domain.morale_fields().count());
    println!("weapons={}", domain.weapons().count());
    Ok(true)
}

/// `conflict inspect`: query one entity by kind and id.
pub fn run_inspect(args: &InspectArgs) -> Result<bool, CliError> {
    let domain = load(&args.fixture)?;
    let id = parse_ref(&args.id);
    let mut budget = Budget::new(args.budget);

    println!("DOMINIUM_CONFLICT_INSPECT_V1");
    println!("kind={}", args.kind);
    println!("queried_id={id}");

    match args.kind.as_str() {
        "record" => {
            let sample = domain.query_record(id, &mut budget);
            print_query_meta(&sample.meta, sample.id, sample.region_id, sample.flags);
            println!("status={:?}", sample.entity.status);
        }
        "side" => {
            let sample = domain.query_side(id, &mut budget);
            print_query_meta(&sample.meta, sample.id, sample.region_id, sample.flags);
            println!("conflict_id={}", sample.entity.conflict_id);
            println!("logistics_dependency_id={}", sample.entity.logistics_dependency_id);
            println!("readiness_q16={}", sample.entity.readiness.raw());
        }
        "event" => {
            let sample = domain.query_event(id, &mut budget);
            print_query_meta(&sample.meta, sample.id, sample.region_id, sample.flags);
            println!("conflict_id={}", sample.entity.conflict_id);
            println!("scheduled_tick={}", sample.entity.scheduled_tick);
            println!("order_key={}", sample.entity.order_key);
            println!("event_type={:?}", sample.entity.event_type);
        }
        "force" => {
            let sample = domain.query_force(id, &mut budget);
            print_query_meta(&sample.meta, sample.id, sample.region_id, sample.flags);
            println!("side_id={}", sample.entity.side_id);
            println!("logistics_dependency_id={}", sample.entity.logistics_dependency_id);
            println!("morale_q16={}", sample.entity.morale.raw());
            println!("readiness_q16={}", sample.entity.readiness.raw());
        }
        "engagement" => {
            let sample = domain.query_engagement(id, &mut budget);
            print_query_meta(&sample.meta, sample.id, sample.region_id, sample.flags);
            println!("force_a_id={}", sample.entity.force_a_id);
            println!("force_b_id={}", sample.entity.force_b_id);
            println!("intensity_q16={}", sample.entity.intensity.raw());
        }
        "outcome" => {
            let sample = domain.query_outcome(id, &mut budget);
            print_query_meta(&sample.meta, sample.id, sample.region_id, sample.flags);
            println!("resolution_tick={}", sample.entity.resolution_tick);
        }
        "occupation" => {
            let sample = domain.query_occupation(id, &mut budget);
            print_query_meta(&sample.meta, sample.id, sample.region_id, sample.flags);
            println!("legitimacy_support_q16={}", sample.entity.legitimacy_support.raw());
            println!("status={:?}", sample.entity.status);
        }
        "resistance" => {
            let sample = domain.query_resistance(id, &mut budget);
            print_query_meta(&sample.meta, sample.id, sample.region_id, sample.flags);
            println!("resolution_tick={}", sample.entity.resolution_tick);
        }
        "morale" => {
            let sample = domain.query_morale_field(id, &mut budget);
            print_query_meta(&sample.meta, sample.id, sample.region_id, sample.flags);
            println!("decay_rate_q16={}", sample.entity.decay_rate.raw());
            println!("morale_level_q16={}", sample.entity.morale_level.raw());
        }
        "weapon" => {
            let sample = domain.query_weapon(id, &mut budget);
            print_query_meta(&sample.meta, sample.id, sample.region_id, sample.flags);
            println!("integrity_q16={}", sample.entity.integrity.raw());
        }
        other => return Err(CliError::UnknownKind(other.to_string())),
    }

    Ok(true)
}

/// `conflict resolve`: run one resolve pass over `--region` (`0` = every
/// region).
pub fn run_resolve(args: &ResolveArgs) -> Result<bool, CliError> {
    let mut domain = load(&args.fixture)?;
    let mut budget = Budget::new(args.budget);

    println!("DOMINIUM_CONFLICT_RESOLVE_V1");
    if args.region == 0 {
        let mut ok = true;
        for region_id in domain.region_ids() {
            let result = domain.resolve(region_id, args.tick, args.delta, &mut budget);
            ok &= result.ok;
            print_resolve_meta_conflict(&result);
        }
        Ok(ok)
    } else {
        let result = domain.resolve(args.region, args.tick, args.delta, &mut budget);
        let ok = result.ok;
        print_resolve_meta_conflict(&result);
        Ok(ok)
    }
}

fn print_resolve_meta_conflict(result: &dominium_kernel::conflict::ConflictResolveResult) {
    println!("region_id={}", result.region_id);
    println!("ok={}", result.ok);
    print_resolve_meta(result.refusal_reason, result.budget_used, result.budget_max);
    println!("records_seen={}", result.records_seen);
    println!("sides_seen={}", result.sides_seen);
    println!("events_seen={}", result.events_seen);
    println!("forces_seen={}", result.forces_seen);
    println!("engagements_seen={}", result.engagements_seen);
    println!("outcomes_seen={}", result.outcomes_seen);
    println!("occupations_seen={}", result.occupations_seen);
    println!("resistances_seen={}", result.resistances_seen);
    println!("morale_fields_seen={}", result.morale_fields_seen);
    println!("weapons_seen={}", result.weapons_seen);
    println!("event_applied_count={}", result.event_applied_count);
    println!("avg_readiness_q16={}", result.avg_readiness.raw());
    println!("avg_morale_q16={}", result.avg_morale.raw());
    println!("avg_legitimacy_q16={}", result.avg_legitimacy.raw());
}

/// `conflict collapse`: collapse `--region` into its capsule.
pub fn run_collapse(args: &RegionArgs) -> Result<bool, CliError> {
    let mut domain = load(&args.fixture)?;
    domain.collapse_region(args.region)?;
    println!("DOMINIUM_CONFLICT_COLLAPSE_V1");
    println!("region_id={}", args.region);
    println!("collapsed=true");
    Ok(true)
}
