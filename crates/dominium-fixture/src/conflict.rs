// SPDX-License-Identifier: Apache-2.0
//! Conflict domain fixture parser/emitter (spec.md §6; fixture kind
//! header `DOMINIUM_CONFLICT_FIXTURE_V1`, adapted from
//! `tools/conflict/conflict_cli.c`'s `key=value` field table).

use std::collections::BTreeMap;

use dominium_kernel::conflict::{
    ConflictCapacities, ConflictDomain, ConflictRecord, ConflictStatus, Engagement, Event,
    EventType, Force, MoraleField, Occupation, OccupationStatus, Outcome, Resistance, Side,
    Weapon,
};
use dominium_kernel::Policy;

use crate::error::FixtureError;
use crate::line::{body_lines, parse_indexed_key, split_kv};
use crate::value::{
    check_schema_version, format_q16_16, parse_q16_16, parse_ref, parse_u16, parse_u32, parse_u64,
};

/// The mandatory first line of every conflict fixture.
pub const FIXTURE_HEADER: &str = "DOMINIUM_CONFLICT_FIXTURE_V1";

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

fn conflict_status_from_text(text: &str) -> Option<ConflictStatus> {
    match text {
        "active" => Some(ConflictStatus::Active),
        "degrading" => Some(ConflictStatus::Degrading),
        "resolved" => Some(ConflictStatus::Resolved),
        _ => None,
    }
}

fn parse_conflict_status(key: &str, value: &str, line: usize) -> Result<ConflictStatus, FixtureError> {
    if let Some(status) = conflict_status_from_text(value) {
        return Ok(status);
    }
    match parse_u32(key, value, line)? {
        0 => Ok(ConflictStatus::Active),
        1 => Ok(ConflictStatus::Degrading),
        2 => Ok(ConflictStatus::Resolved),
        _ => Err(FixtureError::MalformedValue {
            line,
            key: key.to_string(),
            value: value.to_string(),
        }),
    }
}

fn event_type_from_text(text: &str) -> Option<EventType> {
    match text {
        "escalation" => Some(EventType::Escalation),
        "resistance" => Some(EventType::Resistance),
        "de_escalation" => Some(EventType::DeEscalation),
        "ceasefire" => Some(EventType::Ceasefire),
        _ => None,
    }
}

fn parse_event_type(key: &str, value: &str, line: usize) -> Result<EventType, FixtureError> {
    if let Some(event_type) = event_type_from_text(value) {
        return Ok(event_type);
    }
    match parse_u32(key, value, line)? {
        0 => Ok(EventType::Escalation),
        1 => Ok(EventType::Resistance),
        2 => Ok(EventType::DeEscalation),
        3 => Ok(EventType::Ceasefire),
        _ => Err(FixtureError::MalformedValue {
            line,
            key: key.to_string(),
            value: value.to_string(),
        }),
    }
}

fn occupation_status_from_text(text: &str) -> Option<OccupationStatus> {
    match text {
        "stable" => Some(OccupationStatus::Stable),
        "degrading" => Some(OccupationStatus::Degrading),
        _ => None,
    }
}

fn parse_occupation_status(key: &str, value: &str, line: usize) -> Result<OccupationStatus, FixtureError> {
    if let Some(status) = occupation_status_from_text(value) {
        return Ok(status);
    }
    match parse_u32(key, value, line)? {
        0 => Ok(OccupationStatus::Stable),
        1 => Ok(OccupationStatus::Degrading),
        _ => Err(FixtureError::MalformedValue {
            line,
            key: key.to_string(),
            value: value.to_string(),
        }),
    }
}

fn unknown_key(key: &str, line: usize) -> FixtureError {
    FixtureError::UnknownKey {
        line,
        key: key.to_string(),
    }
}

/// Applies a top-level policy key (`cost_full`/`cost_medium`/`cost_coarse`/
/// `cost_analytic`, unprefixed — mirrors `conflict_cli.c`'s flat
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

/// Parses a conflict fixture's text into a domain built at `capacities`.
/// Entities that overflow their arena are silently dropped, matching
/// `dominium_kernel::Arena`'s own tail-truncation policy (spec.md §4.4).
pub fn parse_fixture(text: &str, capacities: ConflictCapacities) -> Result<ConflictDomain, FixtureError> {
    let mut lines = body_lines(text);
    let (_, header) = lines.next().ok_or(FixtureError::MissingHeader {
        expected: FIXTURE_HEADER,
    })?;
    if header != FIXTURE_HEADER {
        return Err(FixtureError::MissingHeader {
            expected: FIXTURE_HEADER,
        });
    }

    let mut records: BTreeMap<u32, ConflictRecord> = BTreeMap::new();
    let mut sides: BTreeMap<u32, Side> = BTreeMap::new();
    let mut events: BTreeMap<u32, Event> = BTreeMap::new();
    let mut forces: BTreeMap<u32, Force> = BTreeMap::new();
    let mut engagements: BTreeMap<u32, Engagement> = BTreeMap::new();
    let mut outcomes: BTreeMap<u32, Outcome> = BTreeMap::new();
    let mut occupations: BTreeMap<u32, Occupation> = BTreeMap::new();
    let mut resistances: BTreeMap<u32, Resistance> = BTreeMap::new();
    let mut morale_fields: BTreeMap<u32, MoraleField> = BTreeMap::new();
    let mut weapons: BTreeMap<u32, Weapon> = BTreeMap::new();
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
            "record" => {
                let entry = records.entry(index).or_default();
                apply_kind_field!(entry, field, key, value, line, |e, f| {
                    match f {
                        "status" => e.status = parse_conflict_status(key, value, line)?,
                        _ => return Err(unknown_key(key, line)),
                    }
                });
            }
            "side" => {
                let entry = sides.entry(index).or_default();
                apply_kind_field!(entry, field, key, value, line, |e, f| {
                    match f {
                        "conflict_id" => e.conflict_id = parse_ref(value),
                        "logistics_dependency_id" => e.logistics_dependency_id = parse_ref(value),
                        "readiness" => e.readiness = parse_q16_16(key, value, line)?,
                        _ => return Err(unknown_key(key, line)),
                    }
                });
            }
            "event" => {
                let entry = events.entry(index).or_default();
                apply_kind_field!(entry, field, key, value, line, |e, f| {
                    match f {
                        "conflict_id" => e.conflict_id = parse_ref(value),
                        "scheduled_tick" => e.scheduled_tick = parse_u64(key, value, line)?,
                        "order_key" => e.order_key = parse_u32(key, value, line)?,
                        "event_type" => e.event_type = parse_event_type(key, value, line)?,
                        _ => return Err(unknown_key(key, line)),
                    }
                });
            }
            "force" => {
                let entry = forces.entry(index).or_default();
                apply_kind_field!(entry, field, key, value, line, |e, f| {
                    match f {
                        "side_id" => e.side_id = parse_ref(value),
                        "logistics_dependency_id" => e.logistics_dependency_id = parse_ref(value),
                        "morale" => e.morale = parse_q16_16(key, value, line)?,
                        "readiness" => e.readiness = parse_q16_16(key, value, line)?,
                        _ => return Err(unknown_key(key, line)),
                    }
                });
            }
            "engagement" => {
                let entry = engagements.entry(index).or_default();
                apply_kind_field!(entry, field, key, value, line, |e, f| {
                    match f {
                        "force_a_id" => e.force_a_id = parse_ref(value),
                        "force_b_id" => e.force_b_id = parse_ref(value),
                        "intensity" => e.intensity = parse_q16_16(key, value, line)?,
                        _ => return Err(unknown_key(key, line)),
                    }
                });
            }
            "outcome" => {
                let entry = outcomes.entry(index).or_default();
                apply_kind_field!(entry, field, key, value, line, |e, f| {
                    match f {
                        "resolution_tick" => e.resolution_tick = parse_u64(key, value, line)?,
                        _ => return Err(unknown_key(key, line)),
                    }
                });
            }
            "occupation" => {
                let entry = occupations.entry(index).or_default();
                apply_kind_field!(entry, field, key, value, line, |e, f| {
                    match f {
                        "legitimacy_support" => e.legitimacy_support = parse_q16_16(key, value, line)?,
                        "status" => e.status = parse_occupation_status(key, value, line)?,
                        _ => return Err(unknown_key(key, line)),
                    }
                });
            }
            "resistance" => {
                let entry = resistances.entry(index).or_default();
                apply_kind_field!(entry, field, key, value, line, |e, f| {
                    match f {
                        "resolution_tick" => e.resolution_tick = parse_u64(key, value, line)?,
                        _ => return Err(unknown_key(key, line)),
                    }
                });
            }
            "morale" => {
                let entry = morale_fields.entry(index).or_default();
                apply_kind_field!(entry, field, key, value, line, |e, f| {
                    match f {
                        "decay_rate" => e.decay_rate = parse_q16_16(key, value, line)?,
                        "morale_level" => e.morale_level = parse_q16_16(key, value, line)?,
                        _ => return Err(unknown_key(key, line)),
                    }
                });
            }
            "weapon" => {
                let entry = weapons.entry(index).or_default();
                apply_kind_field!(entry, field, key, value, line, |e, f| {
                    match f {
                        "integrity" => e.integrity = parse_q16_16(key, value, line)?,
                        _ => return Err(unknown_key(key, line)),
                    }
                });
            }
            _ => return Err(unknown_key(key, line)),
        }
    }

    let mut domain = ConflictDomain::with_capacities(capacities);
    domain.init();
    domain.set_policy(policy);
    for record in records.into_values() {
        domain.records_mut().init_entry(record);
    }
    for side in sides.into_values() {
        domain.sides_mut().init_entry(side);
    }
    for event in events.into_values() {
        domain.events_mut().init_entry(event);
    }
    for force in forces.into_values() {
        domain.forces_mut().init_entry(force);
    }
    for engagement in engagements.into_values() {
        domain.engagements_mut().init_entry(engagement);
    }
    for outcome in outcomes.into_values() {
        domain.outcomes_mut().init_entry(outcome);
    }
    for occupation in occupations.into_values() {
        domain.occupations_mut().init_entry(occupation);
    }
    for resistance in resistances.into_values() {
        domain.resistances_mut().init_entry(resistance);
    }
    for morale_field in morale_fields.into_values() {
        domain.morale_fields_mut().init_entry(morale_field);
    }
    for weapon in weapons.into_values() {
        domain.weapons_mut().init_entry(weapon);
    }
    Ok(domain)
}

fn conflict_status_text(status: ConflictStatus) -> &'static str {
    match status {
        ConflictStatus::Active => "active",
        ConflictStatus::Degrading => "degrading",
        ConflictStatus::Resolved => "resolved",
    }
}

fn event_type_text(event_type: EventType) -> &'static str {
    match event_type {
        EventType::Escalation => "escalation",
        EventType::Resistance => "resistance",
        EventType::DeEscalation => "de_escalation",
        EventType::Ceasefire => "ceasefire",
    }
}

fn occupation_status_text(status: OccupationStatus) -> &'static str {
    match status {
        OccupationStatus::Stable => "stable",
        OccupationStatus::Degrading => "degrading",
    }
}

/// Re-emits `domain` in canonical fixture form: header, then each kind in
/// declared arena order, each entity renumbered from `0` in arena-index
/// order (the fixture's own `kind<N>` numbering is positional syntax, not
/// semantic — only each entity's own `id` field is its real identity).
#[must_use]
pub fn emit_fixture(domain: &ConflictDomain) -> String {
    let mut out = String::new();
    out.push_str(FIXTURE_HEADER);
    out.push('\n');

    let policy = domain.policy();
    out.push_str(&format!("cost_full={}\n", policy.cost_full));
    out.push_str(&format!("cost_medium={}\n", policy.cost_medium));
    out.push_str(&format!("cost_coarse={}\n", policy.cost_coarse));
    out.push_str(&format!("cost_analytic={}\n", policy.cost_analytic));

    for (i, r) in domain.records().iter().enumerate() {
        out.push_str(&format!("record{i}_id={}\n", r.id));
        out.push_str(&format!("record{i}_region_id={}\n", r.region_id));
        out.push_str(&format!("record{i}_flags={}\n", r.flags));
        out.push_str(&format!("record{i}_provenance_id={}\n", r.provenance_id));
        out.push_str(&format!("record{i}_status={}\n", conflict_status_text(r.status)));
        out.push_str(&format!("record{i}_schema_version={}\n", r.schema_version));
    }
    for (i, s) in domain.sides().iter().enumerate() {
        out.push_str(&format!("side{i}_id={}\n", s.id));
        out.push_str(&format!("side{i}_region_id={}\n", s.region_id));
        out.push_str(&format!("side{i}_flags={}\n", s.flags));
        out.push_str(&format!("side{i}_provenance_id={}\n", s.provenance_id));
        out.push_str(&format!("side{i}_conflict_id={}\n", s.conflict_id));
        out.push_str(&format!("side{i}_logistics_dependency_id={}\n", s.logistics_dependency_id));
        out.push_str(&format!("side{i}_readiness={}\n", format_q16_16(s.readiness)));
        out.push_str(&format!("side{i}_schema_version={}\n", s.schema_version));
    }
    for (i, e) in domain.events().iter().enumerate() {
        out.push_str(&format!("event{i}_id={}\n", e.id));
        out.push_str(&format!("event{i}_region_id={}\n", e.region_id));
        out.push_str(&format!("event{i}_flags={}\n", e.flags));
        out.push_str(&format!("event{i}_provenance_id={}\n", e.provenance_id));
        out.push_str(&format!("event{i}_conflict_id={}\n", e.conflict_id));
        out.push_str(&format!("event{i}_scheduled_tick={}\n", e.scheduled_tick));
        out.push_str(&format!("event{i}_order_key={}\n", e.order_key));
        out.push_str(&format!("event{i}_event_type={}\n", event_type_text(e.event_type)));
        out.push_str(&format!("event{i}_schema_version={}\n", e.schema_version));
    }
    for (i, f) in domain.forces().iter().enumerate() {
        out.push_str(&format!("force{i}_id={}\n", f.id));
        out.push_str(&format!("force{i}_region_id={}\n", f.region_id));
        out.push_str(&format!("force{i}_flags={}\n", f.flags));
        out.push_str(&format!("force{i}_provenance_id={}\n", f.provenance_id));
        out.push_str(&format!("force{i}_side_id={}\n", f.side_id));
        out.push_str(&format!("force{i}_logistics_dependency_id={}\n", f.logistics_dependency_id));
        out.push_str(&format!("force{i}_morale={}\n", format_q16_16(f.morale)));
        out.push_str(&format!("force{i}_readiness={}\n", format_q16_16(f.readiness)));
        out.push_str(&format!("force{i}_schema_version={}\n", f.schema_version));
    }
    for (i, g) in domain.engagements().iter().enumerate() {
        out.push_str(&format!("engagement{i}_id={}\n", g.id));
        out.push_str(&format!("engagement{i}_region_id={}\n", g.region_id));
        out.push_str(&format!("engagement{i}_flags={}\n", g.flags));
        out.push_str(&format!("engagement{i}_provenance_id={}\n", g.provenance_id));
        out.push_str(&format!("engagement{i}_force_a_id={}\n", g.force_a_id));
        out.push_str(&format!("engagement{i}_force_b_id={}\n", g.force_b_id));
        out.push_str(&format!("engagement{i}_intensity={}\n", format_q16_16(g.intensity)));
        out.push_str(&format!("engagement{i}_schema_version={}\n", g.schema_version));
    }
    for (i, o) in domain.outcomes().iter().enumerate() {
        out.push_str(&format!("outcome{i}_id={}\n", o.id));
        out.push_str(&format!("outcome{i}_region_id={}\n", o.region_id));
        out.push_str(&format!("outcome{i}_flags={}\n", o.flags));
        out.push_str(&format!("outcome{i}_provenance_id={}\n", o.provenance_id));
        out.push_str(&format!("outcome{i}_resolution_tick={}\n", o.resolution_tick));
        out.push_str(&format!("outcome{i}_schema_version={}\n", o.schema_version));
    }
    for (i, o) in domain.occupations().iter().enumerate() {
        out.push_str(&format!("occupation{i}_id={}\n", o.id));
        out.push_str(&format!("occupation{i}_region_id={}\n", o.region_id));
        out.push_str(&format!("occupation{i}_flags={}\n", o.flags));
        out.push_str(&format!("occupation{i}_provenance_id={}\n", o.provenance_id));
        out.push_str(&format!(
            "occupation{i}_legitimacy_support={}\n",
            format_q16_16(o.legitimacy_support)
        ));
        out.push_str(&format!("occupation{i}_status={}\n", occupation_status_text(o.status)));
        out.push_str(&format!("occupation{i}_schema_version={}\n", o.schema_version));
    }
    for (i, r) in domain.resistances().iter().enumerate() {
        out.push_str(&format!("resistance{i}_id={}\n", r.id));
        out.push_str(&format!("resistance{i}_region_id={}\n", r.region_id));
        out.push_str(&format!("resistance{i}_flags={}\n", r.flags));
        out.push_str(&format!("resistance{i}_provenance_id={}\n", r.provenance_id));
        out.push_str(&format!("resistance{i}_resolution_tick={}\n", r.resolution_tick));
        out.push_str(&format!("resistance{i}_schema_version={}\n", r.schema_version));
    }
    for (i, m) in domain.morale_fields().iter().enumerate() {
        out.push_str(&format!("morale{i}_id={}\n", m.id));
        out.push_str(&format!("morale{i}_region_id={}\n", m.region_id));
        out.push_str(&format!("morale{i}_flags={}\n", m.flags));
        out.push_str(&format!("morale{i}_provenance_id={}\n", m.provenance_id));
        out.push_str(&format!("morale{i}_decay_rate={}\n", format_q16_16(m.decay_rate)));
        out.push_str(&format!("morale{i}_morale_level={}\n", format_q16_16(m.morale_level)));
        out.push_str(&format!("morale{i}_schema_version={}\n", m.schema_version));
    }
    for (i, w) in domain.weapons().iter().enumerate() {
        out.push_str(&format!("weapon{i}_id={}\n", w.id));
        out.push_str(&format!("weapon{i}_region_id={}\n", w.region_id));
        out.push_str(&format!("weapon{i}_flags={}\n", w.flags));
        out.push_str(&format!("weapon{i}_provenance_id={}\n", w.provenance_id));
        out.push_str(&format!("weapon{i}_integrity={}\n", format_q16_16(w.integrity)));
        out.push_str(&format!("weapon{i}_schema_version={}\n", w.schema_version));
    }
    out
}

#[cfg(test)]
mod tests {
    use super::*;

    fn capacities() -> ConflictCapacities {
        ConflictCapacities {
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
        }
    }

    #[test]
    fn missing_header_is_rejected() {
        let result = parse_fixture("side0_id=alpha\n", capacities());
        assert_eq!(
            result.unwrap_err(),
            FixtureError::MissingHeader {
                expected: FIXTURE_HEADER
            }
        );
    }

    #[test]
    fn unknown_key_is_rejected() {
        let text = format!("{FIXTURE_HEADER}\nside0_nonexistent_field=1\n");
        assert!(matches!(
            parse_fixture(&text, capacities()),
            Err(FixtureError::UnknownKey { .. })
        ));
    }

    #[test]
    fn duplicate_key_is_rejected() {
        let text = format!("{FIXTURE_HEADER}\nside0_id=alpha\nside0_id=beta\n");
        assert!(matches!(
            parse_fixture(&text, capacities()),
            Err(FixtureError::DuplicateIndex { .. })
        ));
    }

    #[test]
    fn incompatible_schema_version_is_rejected() {
        let text = format!("{FIXTURE_HEADER}\nside0_id=alpha\nside0_schema_version=2\n");
        assert!(matches!(
            parse_fixture(&text, capacities()),
            Err(FixtureError::IncompatibleSchemaVersion { expected: 1, got: 2, .. })
        ));
    }

    #[test]
    fn unset_schema_version_is_accepted() {
        let text = format!("{FIXTURE_HEADER}\nside0_id=alpha\n");
        assert!(parse_fixture(&text, capacities()).is_ok());
    }

    #[test]
    fn current_schema_version_is_accepted() {
        let text = format!("{FIXTURE_HEADER}\nside0_id=alpha\nside0_schema_version=1\n");
        assert!(parse_fixture(&text, capacities()).is_ok());
    }

    #[test]
    fn parses_a_side_with_symbolic_names_and_a_decimal_readiness() {
        let text = format!(
            "{FIXTURE_HEADER}\nside0_id=alpha_side\nside0_region_id=1\nside0_readiness=0.5\n"
        );
        let domain = parse_fixture(&text, capacities()).unwrap();
        assert_eq!(domain.sides().count(), 1);
        let side = domain.sides().iter().next().unwrap();
        assert_eq!(side.id, dominium_hash::h32("alpha_side"));
        assert_eq!(side.region_id, 1);
        assert_eq!(side.readiness.raw(), 1 << 15);
    }

    #[test]
    fn overflowing_capacity_silently_drops_the_tail() {
        let mut text = String::from(FIXTURE_HEADER);
        text.push('\n');
        for i in 0..6 {
            text.push_str(&format!("weapon{i}_id={i}\n"));
        }
        let domain = parse_fixture(&text, capacities()).unwrap();
        assert_eq!(domain.weapons().count(), 4);
    }

    #[test]
    fn parse_emit_parse_round_trip_is_structurally_identical() {
        let text = format!(
            "{FIXTURE_HEADER}\nside0_id=alpha_side\nside0_readiness=0.25\nside1_id=beta_side\n"
        );
        let first = parse_fixture(&text, capacities()).unwrap();
        let emitted = emit_fixture(&first);
        let second = parse_fixture(&emitted, capacities()).unwrap();
        assert_eq!(second.sides().count(), first.sides().count());
        for (a, b) in first.sides().iter().zip(second.sides().iter()) {
            assert_eq!(a.id, b.id);
            assert_eq!(a.readiness.raw(), b.readiness.raw());
        }
    }

    #[test]
    fn policy_fields_are_applied() {
        let text = format!("{FIXTURE_HEADER}\ncost_full=7\n");
        let domain = parse_fixture(&text, capacities()).unwrap();
        assert_eq!(domain.policy().cost_full, 7);
    }

    #[test]
    fn emitted_fixture_preserves_a_non_default_policy() {
        let text = format!("{FIXTURE_HEADER}\ncost_full=7\ncost_medium=3\n");
        let domain = parse_fixture(&text, capacities()).unwrap();
        let emitted = emit_fixture(&domain);
        let reparsed = parse_fixture(&emitted, capacities()).unwrap();
        assert_eq!(reparsed.policy().cost_full, 7);
        assert_eq!(reparsed.policy().cost_medium, 3);
    }
}
