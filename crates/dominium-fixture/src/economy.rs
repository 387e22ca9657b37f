// SPDX-License-Identifier: Apache-2.0
//! Economy domain fixture parser/emitter (spec.md §6; fixture kind header
//! `DOMINIUM_ECONOMY_FIXTURE_V1`, adapted from
//! `tools/economy/economy_cli.c`'s `key=value` field table).

use std::collections::BTreeMap;

use dominium_kernel::economy::{
    Bid, Container, EconomyCapacities, EconomyDomain, Job, Market, Offer, Storage, Transaction,
    Transport,
};
use dominium_kernel::Policy;

use crate::error::FixtureError;
use crate::line::{body_lines, parse_indexed_key, split_kv};
use crate::value::{
    check_schema_version, format_q16_16, format_q48_16, parse_q16_16, parse_q48_16, parse_ref,
    parse_u16, parse_u32, parse_u64,
};

/// The mandatory first line of every economy fixture.
pub const FIXTURE_HEADER: &str = "DOMINIUM_ECONOMY_FIXTURE_V1";

fn apply_common_field(
    id: &mut u32,
    region_id: &mut u32,
    flags: &mut u32,
    provenance_id: &mut u32,
    schema_version: &mut u16,
    field: &str,
    key: &str,
    value: &str,
    line: usize,
) -> Result<bool, FixtureError> {
    match field {
        "id" => *id = parse_ref(value),
        "region_id" => *region_id = parse_ref(value),
        "flags" => *flags = parse_u32(key, value, line)?,
        "provenance_id" => *provenance_id = parse_u32(key, value, line)?,
        "schema_version" => {
            let parsed = parse_u16(key, value, line)?;
            check_schema_version(parsed, line)?;
            *schema_version = parsed;
        }
        _ => return Ok(false),
    }
    Ok(true)
}

fn unknown_key(key: &str, line: usize) -> FixtureError {
    FixtureError::UnknownKey {
        line,
        key: key.to_string(),
    }
}

/// Applies a top-level policy key (`cost_full`/`cost_medium`/`cost_coarse`/
/// `cost_analytic`, unprefixed — mirrors `economy_cli.c`'s flat
/// `fixture->policy.cost_*` fields). Returns `false` if `key` is not one of
/// these, so the caller can fall through to indexed-key dispatch.
fn apply_policy_field(policy: &mut Policy, key: &str, value: &str, line: usize) -> Result<bool, FixtureError> {
    match key {
        "cost_full" => policy.cost_full = parse_u32(key, value, line)?,
        "cost_medium" => policy.cost_medium = parse_u32(key, value, line)?,
        "cost_coarse" => policy.cost_coarse = parse_u32(key, value, line)?,
        "cost_analytic" => policy.cost_analytic = parse_u32(key, value, line)?,
        _ => return Ok(false),
    }
    Ok(true)
}

macro_rules! apply_kind_field {
    ($entry:expr, $field:expr, $key:expr, $value:expr, $line:expr, |$e:ident, $f:ident| $body:block) => {{
        let applied = apply_common_field(
            &mut $entry.id,
            &mut $entry.region_id,
            &mut $entry.flags,
            &mut $entry.provenance_id,
            &mut $entry.schema_version,
            $field,
            $key,
            $value,
            $line,
        )?;
        if !applied {
            let $e = &mut *$entry;
            let $f = $field;
            $body
        }
    }};
}

/// Parses an economy fixture's text into a domain built at `capacities`.
/// Entities that overflow their arena are silently dropped, matching
/// `dominium_kernel::Arena`'s own tail-truncation policy (spec.md §4.4).
pub fn parse_fixture(text: &str, capacities: EconomyCapacities) -> Result<EconomyDomain, FixtureError> {
    let mut lines = body_lines(text);
    let (_, header) = lines.next().ok_or(FixtureError::MissingHeader {
        expected: FIXTURE_HEADER,
    })?;
    if header != FIXTURE_HEADER {
        return Err(FixtureError::MissingHeader {
            expected: FIXTURE_HEADER,
        });
    }

    let mut containers: BTreeMap<u32, Container> = BTreeMap::new();
    let mut storages: BTreeMap<u32, Storage> = BTreeMap::new();
    let mut transports: BTreeMap<u32, Transport> = BTreeMap::new();
    let mut jobs: BTreeMap<u32, Job> = BTreeMap::new();
    let mut markets: BTreeMap<u32, Market> = BTreeMap::new();
    let mut offers: BTreeMap<u32, Offer> = BTreeMap::new();
    let mut bids: BTreeMap<u32, Bid> = BTreeMap::new();
    let mut transactions: BTreeMap<u32, Transaction> = BTreeMap::new();
    let mut policy = Policy::default();
    let mut seen_keys = std::collections::HashSet::new();

    for (line, text) in lines {
        let Some((key, value)) = split_kv(text) else {
            return Err(unknown_key(text, line));
        };
        if !seen_keys.insert(key.to_string()) {
            return Err(FixtureError::DuplicateIndex {
                line,
                key: key.to_string(),
            });
        }

        if apply_policy_field(&mut policy, key, value, line)? {
            continue;
        }

        let Some((kind, index, field)) = parse_indexed_key(key) else {
            return Err(unknown_key(key, line));
        };

        match kind {
            "container" => {
                let entry = containers.entry(index).or_default();
                apply_kind_field!(entry, field, key, value, line, |e, f| {
                    match f {
                        "capacity" => e.capacity = parse_q48_16(key, value, line)?,
                        _ => return Err(unknown_key(key, line)),
                    }
                });
            }
            "storage" => {
                let entry = storages.entry(index).or_default();
                apply_kind_field!(entry, field, key, value, line, |e, f| {
                    match f {
                        "container_id" => e.container_id = parse_ref(value),
                        "capacity" => e.capacity = parse_q48_16(key, value, line)?,
                        "stored" => e.stored = parse_q48_16(key, value, line)?,
                        _ => return Err(unknown_key(key, line)),
                    }
                });
            }
            "transport" => {
                let entry = transports.entry(index).or_default();
                apply_kind_field!(entry, field, key, value, line, |e, f| {
                    match f {
                        "cargo_container_id" => e.cargo_container_id = parse_ref(value),
                        "arrival_tick" => e.arrival_tick = parse_u64(key, value, line)?,
                        _ => return Err(unknown_key(key, line)),
                    }
                });
            }
            "job" => {
                let entry = jobs.entry(index).or_default();
                apply_kind_field!(entry, field, key, value, line, |e, f| {
                    match f {
                        "completion_tick" => e.completion_tick = parse_u64(key, value, line)?,
                        _ => return Err(unknown_key(key, line)),
                    }
                });
            }
            "market" => {
                let entry = markets.entry(index).or_default();
                apply_kind_field!(entry, field, key, value, line, |e, f| {
                    match f {
                        "price_average" => e.price_average = parse_q16_16(key, value, line)?,
                        "risk_profile_id" => e.risk_profile_id = parse_ref(value),
                        "risk_modifier" => e.risk_modifier = parse_q16_16(key, value, line)?,
                        _ => return Err(unknown_key(key, line)),
                    }
                });
            }
            "offer" => {
                let entry = offers.entry(index).or_default();
                apply_kind_field!(entry, field, key, value, line, |e, f| {
                    match f {
                        "market_id" => e.market_id = parse_ref(value),
                        "price" => e.price = parse_q16_16(key, value, line)?,
                        "expiry_tick" => e.expiry_tick = parse_u64(key, value, line)?,
                        _ => return Err(unknown_key(key, line)),
                    }
                });
            }
            "bid" => {
                let entry = bids.entry(index).or_default();
                apply_kind_field!(entry, field, key, value, line, |e, f| {
                    match f {
                        "market_id" => e.market_id = parse_ref(value),
                        "price" => e.price = parse_q16_16(key, value, line)?,
                        "expiry_tick" => e.expiry_tick = parse_u64(key, value, line)?,
                        _ => return Err(unknown_key(key, line)),
                    }
                });
            }
            "transaction" => {
                let entry = transactions.entry(index).or_default();
                apply_kind_field!(entry, field, key, value, line, |e, f| {
                    match f {
                        "market_id" => e.market_id = parse_ref(value),
                        "amount" => e.amount = parse_q48_16(key, value, line)?,
                        _ => return Err(unknown_key(key, line)),
                    }
                });
            }
            _ => return Err(unknown_key(key, line)),
        }
    }

    let mut domain = EconomyDomain::with_capacities(capacities);
    domain.init();
    domain.set_policy(policy);
    for container in containers.into_values() {
        domain.containers_mut().init_entry(container);
    }
    for storage in storages.into_values() {
        domain.storages_mut().init_entry(storage);
    }
    for transport in transports.into_values() {
        domain.transports_mut().init_entry(transport);
    }
    for job in jobs.into_values() {
        domain.jobs_mut().init_entry(job);
    }
    for market in markets.into_values() {
        domain.markets_mut().init_entry(market);
    }
    for offer in offers.into_values() {
        domain.offers_mut().init_entry(offer);
    }
    for bid in bids.into_values() {
        domain.bids_mut().init_entry(bid);
    }
    for transaction in transactions.into_values() {
        domain.transactions_mut().init_entry(transaction);
    }
    Ok(domain)
}

/// Re-emits `domain` in canonical fixture form: header, then each kind in
/// declared arena order, each entity renumbered from `0` in arena-index
/// order (the fixture's own `kind<N>` numbering is positional syntax, not
/// semantic — only each entity's own `id` field is its real identity).
#[must_use]
pub fn emit_fixture(domain: &EconomyDomain) -> String {
    let mut out = String::new();
    out.push_str(FIXTURE_HEADER);
    out.push('\n');

    let policy = domain.policy();
    out.push_str(&format!("cost_full={}\n", policy.cost_full));
    out.push_str(&format!("cost_medium={}\n", policy.cost_medium));
    out.push_str(&format!("cost_coarse={}\n", policy.cost_coarse));
    out.push_str(&format!("cost_analytic={}\n", policy.cost_analytic));

    for (i, c) in domain.containers().iter().enumerate() {
        out.push_str(&format!("container{i}_id={}\n", c.id));
        out.push_str(&format!("container{i}_region_id={}\n", c.region_id));
        out.push_str(&format!("container{i}_flags={}\n", c.flags));
        out.push_str(&format!("container{i}_provenance_id={}\n", c.provenance_id));
        out.push_str(&format!("container{i}_capacity={}\n", format_q48_16(c.capacity)));
        out.push_str(&format!("container{i}_schema_version={}\n", c.schema_version));
    }
    for (i, s) in domain.storages().iter().enumerate() {
        out.push_str(&format!("storage{i}_id={}\n", s.id));
        out.push_str(&format!("storage{i}_region_id={}\n", s.region_id));
        out.push_str(&format!("storage{i}_flags={}\n", s.flags));
        out.push_str(&format!("storage{i}_provenance_id={}\n", s.provenance_id));
        out.push_str(&format!("storage{i}_container_id={}\n", s.container_id));
        out.push_str(&format!("storage{i}_capacity={}\n", format_q48_16(s.capacity)));
        out.push_str(&format!("storage{i}_stored={}\n", format_q48_16(s.stored)));
        out.push_str(&format!("storage{i}_schema_version={}\n", s.schema_version));
    }
    for (i, t) in domain.transports().iter().enumerate() {
        out.push_str(&format!("transport{i}_id={}\n", t.id));
        out.push_str(&format!("transport{i}_region_id={}\n", t.region_id));
        out.push_str(&format!("transport{i}_flags={}\n", t.flags));
        out.push_str(&format!("transport{i}_provenance_id={}\n", t.provenance_id));
        out.push_str(&format!("transport{i}_cargo_container_id={}\n", t.cargo_container_id));
        out.push_str(&format!("transport{i}_arrival_tick={}\n", t.arrival_tick));
        out.push_str(&format!("transport{i}_schema_version={}\n", t.schema_version));
    }
    for (i, j) in domain.jobs().iter().enumerate() {
        out.push_str(&format!("job{i}_id={}\n", j.id));
        out.push_str(&format!("job{i}_region_id={}\n", j.region_id));
        out.push_str(&format!("job{i}_flags={}\n", j.flags));
        out.push_str(&format!("job{i}_provenance_id={}\n", j.provenance_id));
        out.push_str(&format!("job{i}_completion_tick={}\n", j.completion_tick));
        out.push_str(&format!("job{i}_schema_version={}\n", j.schema_version));
    }
    for (i, m) in domain.markets().iter().enumerate() {
        out.push_str(&format!("market{i}_id={}\n", m.id));
        out.push_str(&format!("market{i}_region_id={}\n", m.region_id));
        out.push_str(&format!("market{i}_flags={}\n", m.flags));
        out.push_str(&format!("market{i}_provenance_id={}\n", m.provenance_id));
        out.push_str(&format!("market{i}_price_average={}\n", format_q16_16(m.price_average)));
        out.push_str(&format!("market{i}_risk_profile_id={}\n", m.risk_profile_id));
        out.push_str(&format!("market{i}_risk_modifier={}\n", format_q16_16(m.risk_modifier)));
        out.push_str(&format!("market{i}_schema_version={}\n", m.schema_version));
    }
    for (i, o) in domain.offers().iter().enumerate() {
        out.push_str(&format!("offer{i}_id={}\n", o.id));
        out.push_str(&format!("offer{i}_region_id={}\n", o.region_id));
        out.push_str(&format!("offer{i}_flags={}\n", o.flags));
        out.push_str(&format!("offer{i}_provenance_id={}\n", o.provenance_id));
        out.push_str(&format!("offer{i}_market_id={}\n", o.market_id));
        out.push_str(&format!("offer{i}_price={}\n", format_q16_16(o.price)));
        out.push_str(&format!("offer{i}_expiry_tick={}\n", o.expiry_tick));
        out.push_str(&format!("offer{i}_schema_version={}\n", o.schema_version));
    }
    for (i, b) in domain.bids().iter().enumerate() {
        out.push_str(&format!("bid{i}_id={}\n", b.id));
        out.push_str(&format!("bid{i}_region_id={}\n", b.region_id));
        out.push_str(&format!("bid{i}_flags={}\n", b.flags));
        out.push_str(&format!("bid{i}_provenance_id={}\n", b.provenance_id));
        out.push_str(&format!("bid{i}_market_id={}\n", b.market_id));
        out.push_str(&format!("bid{i}_price={}\n", format_q16_16(b.price)));
        out.push_str(&format!("bid{i}_expiry_tick={}\n", b.expiry_tick));
        out.push_str(&format!("bid{i}_schema_version={}\n", b.schema_version));
    }
    for (i, t) in domain.transactions().iter().enumerate() {
        out.push_str(&format!("transaction{i}_id={}\n", t.id));
        out.push_str(&format!("transaction{i}_region_id={}\n", t.region_id));
        out.push_str(&format!("transaction{i}_flags={}\n", t.flags));
        out.push_str(&format!("transaction{i}_provenance_id={}\n", t.provenance_id));
        out.push_str(&format!("transaction{i}_market_id={}\n", t.market_id));
        out.push_str(&format!("transaction{i}_amount={}\n", format_q48_16(t.amount)));
        out.push_str(&format!("transaction{i}_schema_version={}\n", t.schema_version));
    }
    out
}

#[cfg(test)]
mod tests {
    use super::*;

    fn capacities() -> EconomyCapacities {
        EconomyCapacities {
            containers: 4,
            storages: 4,
            transports: 4,
            jobs: 4,
            markets: 4,
            offers: 4,
            bids: 4,
            transactions: 4,
            capsules: 2,
        }
    }

    #[test]
    fn missing_header_is_rejected() {
        let result = parse_fixture("container0_id=alpha\n", capacities());
        assert_eq!(
            result.unwrap_err(),
            FixtureError::MissingHeader {
                expected: FIXTURE_HEADER
            }
        );
    }

    #[test]
    fn unknown_key_is_rejected() {
        let text = format!("{FIXTURE_HEADER}\ncontainer0_nonexistent_field=1\n");
        assert!(matches!(
            parse_fixture(&text, capacities()),
            Err(FixtureError::UnknownKey { .. })
        ));
    }

    #[test]
    fn incompatible_schema_version_is_rejected() {
        let text = format!("{FIXTURE_HEADER}\ncontainer0_id=grain_silo\ncontainer0_schema_version=2\n");
        assert!(matches!(
            parse_fixture(&text, capacities()),
            Err(FixtureError::IncompatibleSchemaVersion { expected: 1, got: 2, .. })
        ));
    }

    #[test]
    fn parses_a_container_with_a_symbolic_name_and_decimal_capacity() {
        let text = format!(
            "{FIXTURE_HEADER}\ncontainer0_id=grain_silo\ncontainer0_region_id=1\ncontainer0_capacity=100.5\n"
        );
        let domain = parse_fixture(&text, capacities()).unwrap();
        assert_eq!(domain.containers().count(), 1);
        let container = domain.containers().iter().next().unwrap();
        assert_eq!(container.id, dominium_hash::h32("grain_silo"));
        assert_eq!(container.region_id, 1);
    }

    #[test]
    fn a_market_carries_its_risk_fields() {
        let text = format!(
            "{FIXTURE_HEADER}\nmarket0_id=grain_market\nmarket0_risk_modifier=0.75\nmarket0_risk_profile_id=high_risk\n"
        );
        let domain = parse_fixture(&text, capacities()).unwrap();
        let market = domain.markets().iter().next().unwrap();
        assert_eq!(market.risk_profile_id, dominium_hash::h32("high_risk"));
    }

    #[test]
    fn parse_emit_parse_round_trip_is_structurally_identical() {
        let text = format!(
            "{FIXTURE_HEADER}\noffer0_id=alpha_offer\noffer0_price=1.25\noffer0_expiry_tick=10\n"
        );
        let first = parse_fixture(&text, capacities()).unwrap();
        let emitted = emit_fixture(&first);
        let second = parse_fixture(&emitted, capacities()).unwrap();
        assert_eq!(second.offers().count(), first.offers().count());
        for (a, b) in first.offers().iter().zip(second.offers().iter()) {
            assert_eq!(a.id, b.id);
            assert_eq!(a.price.raw(), b.price.raw());
            assert_eq!(a.expiry_tick, b.expiry_tick);
        }
    }

    #[test]
    fn policy_fields_are_applied() {
        let text = format!("{FIXTURE_HEADER}\ncost_medium=3\n");
        let domain = parse_fixture(&text, capacities()).unwrap();
        assert_eq!(domain.policy().cost_medium, 3);
    }

    #[test]
    fn emitted_fixture_preserves_a_non_default_policy() {
        let text = format!("{FIXTURE_HEADER}\ncost_full=7\ncost_coarse=9\n");
        let domain = parse_fixture(&text, capacities()).unwrap();
        let emitted = emit_fixture(&domain);
        let reparsed = parse_fixture(&emitted, capacities()).unwrap();
        assert_eq!(reparsed.policy().cost_full, 7);
        assert_eq!(reparsed.policy().cost_coarse, 9);
    }
}
