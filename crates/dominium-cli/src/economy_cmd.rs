// SPDX-License-Identifier: Apache-2.0
//! `dominium economy {validate,inspect,resolve,collapse}`.

use dominium_fixture::parse_ref;
use dominium_kernel::budget::Budget;
use dominium_kernel::economy::{EconomyCapacities, EconomyDomain};

use crate::cli::{FixtureArgs, InspectArgs, RegionArgs, ResolveArgs};
use crate::error::CliError;
use crate::fixture_io::read_to_string;
use crate::output::{print_query_meta, print_resolve_meta};

/// See [`crate::conflict_cmd::CAPACITIES`].
pub const CAPACITIES: EconomyCapacities = EconomyCapacities {
    containers: 1024,
    storages: 1024,
    transports: 1024,
    jobs: 1024,
    markets: 1024,
    offers: 1024,
    bids: 1024,
    transactions: 1024,
    capsules: 256,
};

fn load(fixture: &std::path::Path) -> Result<EconomyDomain, CliError> {
    let text = read_to_string(fixture)?;
    Ok(dominium_fixture::parse_economy_fixture(&text, CAPACITIES)?)
}

/// `economy validate`: parse the fixture and report per-kind counts.
pub fn run_validate(args: &FixtureArgs) -> Result<bool, CliError> {
    let domain = load(&args.fixture)?;
    println!("DOMINIUM_ECONOMY_VALIDATE_V1");
    println!("regions={}", domain.region_ids().len());
    println!("containers={}", domain.containers().count());
    println!("storages={}", domain.storages().count());
    println!("transports={}", domain.transports().count());
    println!("jobs={}", domain.jobs().count());
    println!("markets={}", domain.markets().count());
    println!("offers={}", domain.offers().count());
    println!("bids={}", domain.bids().count());
    println!("transactions={}", domain.transactions().count());
    Ok(true)
}

/// `economy inspect`: query one entity by kind and id.
pub fn run_inspect(args: &InspectArgs) -> Result<bool, CliError> {
    let domain = load(&args.fixture)?;
    let id = parse_ref(&args.id);
    let mut budget = Budget::new(args.budget);

    println!("DOMINIUM_ECONOMY_INSPECT_V1");
    println!("kind={}", args.kind);
    println!("queried_id={id}");

    match args.kind.as_str() {
        "container" => {
            let sample = domain.query_container(id, &mut budget);
            print_query_meta(&sample.meta, sample.id, sample.region_id, sample.flags);
            println!("capacity_q48={}", sample.entity.capacity.raw());
        }
        "storage" => {
            let sample = domain.query_storage(id, &mut budget);
            print_query_meta(&sample.meta, sample.id, sample.region_id, sample.flags);
            println!("container_id={}", sample.entity.container_id);
            println!("capacity_q48={}", sample.entity.capacity.raw());
            println!("stored_q48={}", sample.entity.stored.raw());
        }
        "transport" => {
            let sample = domain.query_transport(id, &mut budget);
            print_query_meta(&sample.meta, sample.id, sample.region_id, sample.flags);
            println!("cargo_container_id={}", sample.entity.cargo_container_id);
            println!("arrival_tick={}", sample.entity.arrival_tick);
        }
        "job" => {
            let sample = domain.query_job(id, &mut budget);
            print_query_meta(&sample.meta, sample.id, sample.region_id, sample.flags);
            println!("completion_tick={}", sample.entity.completion_tick);
        }
        "market" => {
            let sample = domain.query_market(id, &mut budget);
            print_query_meta(&sample.meta, sample.id, sample.region_id, sample.flags);
            println!("price_average_q16={}", sample.entity.price_average.raw());
            println!("risk_profile_id={}", sample.entity.risk_profile_id);
            println!("risk_modifier_q16={}", sample.entity.risk_modifier.raw());
        }
        "offer" => {
            let sample = domain.query_offer(id, &mut budget);
            print_query_meta(&sample.meta, sample.id, sample.region_id, sample.flags);
            println!("market_id={}", sample.entity.market_id);
            println!("price_q16={}", sample.entity.price.raw());
            println!("expiry_tick={}", sample.entity.expiry_tick);
        }
        "bid" => {
            let sample = domain.query_bid(id, &mut budget);
            print_query_meta(&sample.meta, sample.id, sample.region_id, sample.flags);
            println!("market_id={}", sample.entity.market_id);
            println!("price_q16={}", sample.entity.price.raw());
            println!("expiry_tick={}", sample.entity.expiry_tick);
        }
        "transaction" => {
            let sample = domain.query_transaction(id, &mut budget);
            print_query_meta(&sample.meta, sample.id, sample.region_id, sample.flags);
            println!("market_id={}", sample.entity.market_id);
            println!("amount_q48={}", sample.entity.amount.raw());
        }
        other => return Err(CliError::UnknownKind(other.to_string())),
    }

    Ok(true)
}

/// `economy resolve`: run one resolve pass over `--region` (`0` = every
/// region).
pub fn run_resolve(args: &ResolveArgs) -> Result<bool, CliError> {
    let mut domain = load(&args.fixture)?;
    let mut budget = Budget::new(args.budget);

    println!("DOMINIUM_ECONOMY_RESOLVE_V1");
    if args.region == 0 {
        let mut ok = true;
        for region_id in domain.region_ids() {
            let result = domain.resolve(region_id, args.tick, args.delta, &mut budget);
            ok &= result.ok;
            print_resolve_meta_economy(&result);
        }
        Ok(ok)
    } else {
        let result = domain.resolve(args.region, args.tick, args.delta, &mut budget);
        let ok = result.ok;
        print_resolve_meta_economy(&result);
        Ok(ok)
    }
}

fn print_resolve_meta_economy(result: &dominium_kernel::economy::EconomyResolveResult) {
    println!("region_id={}", result.region_id);
    println!("ok={}", result.ok);
    print_resolve_meta(result.refusal_reason, result.budget_used, result.budget_max);
    println!("containers_seen={}", result.containers_seen);
    println!("storages_seen={}", result.storages_seen);
    println!("transports_seen={}", result.transports_seen);
    println!("jobs_seen={}", result.jobs_seen);
    println!("markets_seen={}", result.markets_seen);
    println!("offers_seen={}", result.offers_seen);
    println!("bids_seen={}", result.bids_seen);
    println!("transactions_seen={}", result.transactions_seen);
    println!("arrived_count={}", result.arrived_count);
    println!("jobs_completed_count={}", result.jobs_completed_count);
    println!("avg_goods_q16={}", result.avg_goods.raw());
    println!("avg_price_q16={}", result.avg_price.raw());
    println!("avg_transaction_volume_q16={}", result.avg_transaction_volume.raw());
}

/// `economy collapse`: collapse `--region` into its capsule.
pub fn run_collapse(args: &RegionArgs) -> Result<bool, CliError> {
    let mut domain = load(&args.fixture)?;
    domain.collapse_region(args.region)?;
    println!("DOMINIUM_ECONOMY_COLLAPSE_V1");
    println!("region_id={}", args.region);
    println!("collapsed=true");
    Ok(true)
}
