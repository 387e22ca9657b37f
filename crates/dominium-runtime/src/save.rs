// SPDX-License-Identifier: Apache-2.0
//! Canonical save/restore (`SPEC_FULL.md` §4.8B, grounding spec.md §8's
//! round-trip law: "Save the runtime state, reload it into a fresh
//! runtime → identical world hash and identical per-entity arena
//! contents").
//!
//! The encoding is big-endian and length-prefixed throughout, matching
//! spec.md §4.2's wire convention. Every entity's *full* field set is
//! written, not just the subset the world hash observes, and the capsule
//! table for each domain is written alongside its arenas.

use dominium_fixed::{Q16_16, Q48_16};
use dominium_hash::RngCursor;
use dominium_kernel::capsule::{CapsuleTable, Histogram4, HISTOGRAM_BINS};
use dominium_kernel::conflict::{
    ConflictCapacities, ConflictCapsule, ConflictDomain, ConflictRecord, ConflictStatus, Engagement,
    Event, EventType, Force, MoraleField, Occupation, OccupationStatus, Outcome, Resistance, Side,
    Weapon,
};
use dominium_kernel::economy::{
    Bid, Container, EconomyCapacities, EconomyCapsule, EconomyDomain, Job, Market, Offer, Storage,
    Transaction, Transport,
};
use dominium_kernel::{ArchivalState, ExistenceState, Policy};
use thiserror::Error;

use crate::codec::{CodecError, Reader, Writer};
use crate::world::Runtime;
use crate::AuthorityMode;

const MAGIC: u32 = 0x444F_4D52; // "DOMR"
const FORMAT_VERSION: u16 = 1;

/// Errors produced while loading a saved byte stream.
#[derive(Debug, Error, Clone, Copy, PartialEq, Eq)]
pub enum SaveError {
    /// The stream's magic number did not match `"DOMR"`.
    #[error("bad magic number")]
    BadMagic,
    /// The stream's format version is not one this build understands.
    #[error("unsupported save format version {0}")]
    UnsupportedVersion(u16),
    /// A saved arena held more entities than its declared capacity — the
    /// save was produced by a build with different capacities.
    #[error("arena has {count} entities but capacity {capacity}")]
    CapacityMismatch {
        /// Entities recorded in the stream.
        count: u32,
        /// The capacity supplied by the caller restoring the save.
        capacity: u32,
    },
    /// An entity was dropped by `Arena::init_entry`'s silent tail
    /// truncation during restore — should never happen once
    /// `CapacityMismatch` is checked first, kept as a belt-and-braces
    /// invariant check.
    #[error("entity silently dropped on restore")]
    EntityDropped,
    /// The capsule table could not hold every saved capsule.
    #[error("capsule table full on restore")]
    CapsuleTableFull,
    /// The byte stream ended before decoding finished.
    #[error(transparent)]
    Truncated(#[from] CodecError),
}

/// The conflict/economy domain capacities a save was produced with, and
/// that `load_state` rebuilds fresh domains at.
#[derive(Debug, Clone, Copy)]
pub struct RestoreCapacities {
    /// Capacities for the rebuilt conflict domain.
    pub conflict: ConflictCapacities,
    /// Capacities for the rebuilt economy domain.
    pub economy: EconomyCapacities,
}

/// Serializes `runtime`'s full state: header, tick counter, then the
/// conflict domain, then the economy domain (`SPEC_FULL.md` §4.8B).
#[must_use]
pub fn save_state(runtime: &Runtime, run_id: u64, instance_id: u64) -> Vec<u8> {
    let mut w = Writer::new();
    w.write_u32(MAGIC);
    w.write_u16(FORMAT_VERSION);
    w.write_u64(run_id);
    w.write_u64(instance_id);
    w.write_u64(runtime.current_tick());
    write_conflict(&mut w, runtime.conflict());
    write_economy(&mut w, runtime.economy());
    w.into_bytes()
}

/// Deserializes a byte stream produced by [`save_state`] into a fresh
/// [`Runtime`], rebuilding domains at `capacities`. Returns the restored
/// runtime plus the `(run_id, instance_id)` header fields.
pub fn load_state(
    bytes: &[u8],
    capacities: RestoreCapacities,
    authority_mode: AuthorityMode,
) -> Result<(Runtime, u64, u64), SaveError> {
    let mut r = Reader::new(bytes);
    if r.read_u32()? != MAGIC {
        return Err(SaveError::BadMagic);
    }
    let version = r.read_u16()?;
    if version != FORMAT_VERSION {
        return Err(SaveError::UnsupportedVersion(version));
    }
    let run_id = r.read_u64()?;
    let instance_id = r.read_u64()?;
    let tick = r.read_u64()?;

    let conflict = read_conflict(&mut r, capacities.conflict)?;
    let economy = read_economy(&mut r, capacities.economy)?;

    let runtime = Runtime::restore(conflict, economy, authority_mode, tick);
    Ok((runtime, run_id, instance_id))
}

fn write_policy(w: &mut Writer, policy: Policy) {
    w.write_u32(policy.cost_full);
    w.write_u32(policy.cost_medium);
    w.write_u32(policy.cost_coarse);
    w.write_u32(policy.cost_analytic);
}

fn read_policy(r: &mut Reader<'_>) -> Result<Policy, SaveError> {
    Ok(Policy {
        cost_full: r.read_u32()?,
        cost_medium: r.read_u32()?,
        cost_coarse: r.read_u32()?,
        cost_analytic: r.read_u32()?,
    })
}

fn write_existence(w: &mut Writer, existence: ExistenceState) {
    w.write_u8(match existence {
        ExistenceState::Nonexistent => 0,
        ExistenceState::Declared => 1,
        ExistenceState::Realized => 2,
    });
}

fn read_existence(r: &mut Reader<'_>) -> Result<ExistenceState, SaveError> {
    Ok(match r.read_u8()? {
        1 => ExistenceState::Declared,
        2 => ExistenceState::Realized,
        _ => ExistenceState::Nonexistent,
    })
}

fn write_archival(w: &mut Writer, archival: ArchivalState) {
    w.write_u8(match archival {
        ArchivalState::Live => 0,
        ArchivalState::Archived => 1,
    });
}

fn read_archival(r: &mut Reader<'_>) -> Result<ArchivalState, SaveError> {
    Ok(match r.read_u8()? {
        1 => ArchivalState::Archived,
        _ => ArchivalState::Live,
    })
}

fn write_histogram(w: &mut Writer, histogram: &Histogram4) {
    for bin in 0..HISTOGRAM_BINS {
        w.write_i32(histogram.bin_ratio[bin].raw());
        w.write_u32(histogram.bin_cursor[bin].raw());
    }
}

fn read_histogram(r: &mut Reader<'_>) -> Result<Histogram4, SaveError> {
    let mut ratio = [Q16_16::ZERO; HISTOGRAM_BINS];
    let mut cursor = [RngCursor::from_raw_seed(1); HISTOGRAM_BINS];
    for bin in 0..HISTOGRAM_BINS {
        ratio[bin] = Q16_16::from_raw(r.read_i32()?);
        cursor[bin] = RngCursor::from_persisted(r.read_u32()?);
    }
    Ok(Histogram4 {
        bin_ratio: ratio,
        bin_cursor: cursor,
    })
}

// Only the entity count is written; the restoring side's capacity comes
// from the `RestoreCapacities` the caller supplies (the saved arena's own
// capacity at write time is not authoritative for a later restore, which
// may rebuild the domain at different capacities).
macro_rules! write_arena {
    ($w:expr, $arena:expr, |$w_name:ident, $entity:ident| $body:block) => {{
        $w.write_u32(u32::try_from($arena.count()).unwrap_or(u32::MAX));
        for $entity in $arena.iter() {
            let $w_name = &mut *$w;
            $body
        }
    }};
}

macro_rules! read_arena {
    ($r:expr, $capacity:expr, $make_entity:expr) => {{
        let capacity: usize = $capacity;
        let count = $r.read_u32()?;
        if count as usize > capacity {
            return Err(SaveError::CapacityMismatch {
                count,
                capacity: u32::try_from(capacity).unwrap_or(u32::MAX),
            });
        }
        let mut arena = dominium_kernel::Arena::with_capacity(capacity);
        for _ in 0..count {
            let entity = $make_entity($r)?;
            if !arena.init_entry(entity) {
                return Err(SaveError::EntityDropped);
            }
        }
        arena
    }};
}

fn write_conflict(w: &mut Writer, domain: &ConflictDomain) {
    write_existence(w, domain.existence_state());
    write_archival(w, domain.archival_state());
    write_policy(w, domain.policy());

    write_arena!(w, domain.records(), |w, e| {
        w.write_u32(e.id);
        w.write_u32(e.region_id);
        w.write_u32(e.flags);
        w.write_u32(e.provenance_id);
        w.write_u8(e.status as u8);
        w.write_u16(e.schema_version);
    });
    write_arena!(w, domain.sides(), |w, e| {
        w.write_u32(e.id);
        w.write_u32(e.region_id);
        w.write_u32(e.flags);
        w.write_u32(e.provenance_id);
        w.write_u32(e.conflict_id);
        w.write_u32(e.logistics_dependency_id);
        w.write_i32(e.readiness.raw());
        w.write_u16(e.schema_version);
    });
    write_arena!(w, domain.events(), |w, e| {
        w.write_u32(e.id);
        w.write_u32(e.region_id);
        w.write_u32(e.flags);
        w.write_u32(e.provenance_id);
        w.write_u32(e.conflict_id);
        w.write_u64(e.scheduled_tick);
        w.write_u32(e.order_key);
        w.write_u8(e.event_type as u8);
        w.write_u16(e.schema_version);
    });
    write_arena!(w, domain.forces(), |w, e| {
        w.write_u32(e.id);
        w.write_u32(e.region_id);
        w.write_u32(e.flags);
        w.write_u32(e.provenance_id);
        w.write_u32(e.side_id);
        w.write_u32(e.logistics_dependency_id);
        w.write_i32(e.morale.raw());
        w.write_i32(e.readiness.raw());
        w.write_u16(e.schema_version);
    });
    write_arena!(w, domain.engagements(), |w, e| {
        w.write_u32(e.id);
        w.write_u32(e.region_id);
        w.write_u32(e.flags);
        w.write_u32(e.provenance_id);
        w.write_u32(e.force_a_id);
        w.write_u32(e.force_b_id);
        w.write_i32(e.intensity.raw());
        w.write_u16(e.schema_version);
    });
    write_arena!(w, domain.outcomes(), |w, e| {
        w.write_u32(e.id);
        w.write_u32(e.region_id);
        w.write_u32(e.flags);
        w.write_u32(e.provenance_id);
        w.write_u64(e.resolution_tick);
        w.write_u16(e.schema_version);
    });
    write_arena!(w, domain.occupations(), |w, e| {
        w.write_u32(e.id);
        w.write_u32(e.region_id);
        w.write_u32(e.flags);
        w.write_u32(e.provenance_id);
        w.write_i32(e.legitimacy_support.raw());
        w.write_u8(e.status as u8);
        w.write_u16(e.schema_version);
    });
    write_arena!(w, domain.resistances(), |w, e| {
        w.write_u32(e.id);
        w.write_u32(e.region_id);
        w.write_u32(e.flags);
        w.write_u32(e.provenance_id);
        w.write_u64(e.resolution_tick);
        w.write_u16(e.schema_version);
    });
    write_arena!(w, domain.morale_fields(), |w, e| {
        w.write_u32(e.id);
        w.write_u32(e.region_id);
        w.write_u32(e.flags);
        w.write_u32(e.provenance_id);
        w.write_i32(e.decay_rate.raw());
        w.write_i32(e.morale_level.raw());
        w.write_u16(e.schema_version);
    });
    write_arena!(w, domain.weapons(), |w, e| {
        w.write_u32(e.id);
        w.write_u32(e.region_id);
        w.write_u32(e.flags);
        w.write_u32(e.provenance_id);
        w.write_i32(e.integrity.raw());
        w.write_u16(e.schema_version);
    });

    let capsules = domain.capsules();
    w.write_u32(u32::try_from(capsules.count()).unwrap_or(u32::MAX));
    for (region_id, capsule) in capsules.iter() {
        w.write_u32(*region_id);
        w.write_u32(capsule.records_count);
        w.write_u32(capsule.sides_count);
        w.write_u32(capsule.events_count);
        w.write_u32(capsule.forces_count);
        w.write_u32(capsule.engagements_count);
        w.write_u32(capsule.outcomes_count);
        w.write_u32(capsule.occupations_count);
        w.write_u32(capsule.resistances_count);
        w.write_u32(capsule.morale_fields_count);
        w.write_u32(capsule.weapons_count);
        w.write_i32(capsule.avg_readiness.raw());
        w.write_i32(capsule.avg_morale.raw());
        w.write_i32(capsule.avg_legitimacy.raw());
        write_histogram(w, &capsule.readiness_histogram);
        write_histogram(w, &capsule.morale_histogram);
        write_histogram(w, &capsule.legitimacy_histogram);
    }
}

fn read_conflict(r: &mut Reader<'_>, capacities: ConflictCapacities) -> Result<ConflictDomain, SaveError> {
    let existence = read_existence(r)?;
    let archival = read_archival(r)?;
    let policy = read_policy(r)?;

    let mut domain = ConflictDomain::with_capacities(capacities);
    domain.set_state(existence, archival);
    domain.set_policy(policy);

    *domain.records_mut() = read_arena!(r, capacities.records, |r: &mut Reader<'_>| -> Result<ConflictRecord, SaveError> {
        Ok(ConflictRecord {
            id: r.read_u32()?,
            region_id: r.read_u32()?,
            flags: r.read_u32()?,
            provenance_id: r.read_u32()?,
            status: conflict_status_from_u8(r.read_u8()?),
            schema_version: r.read_u16()?,
        })
    });
    *domain.sides_mut() = read_arena!(r, capacities.sides, |r: &mut Reader<'_>| -> Result<Side, SaveError> {
        Ok(Side {
            id: r.read_u32()?,
            region_id: r.read_u32()?,
            flags: r.read_u32()?,
            provenance_id: r.read_u32()?,
            conflict_id: r.read_u32()?,
            logistics_dependency_id: r.read_u32()?,
            readiness: Q16_16::from_raw(r.read_i32()?),
            schema_version: r.read_u16()?,
        })
    });
    *domain.events_mut() = read_arena!(r, capacities.events, |r: &mut Reader<'_>| -> Result<Event, SaveError> {
        Ok(Event {
            id: r.read_u32()?,
            region_id: r.read_u32()?,
            flags: r.read_u32()?,
            provenance_id: r.read_u32()?,
            conflict_id: r.read_u32()?,
            scheduled_tick: r.read_u64()?,
            order_key: r.read_u32()?,
            event_type: event_type_from_u8(r.read_u8()?),
            schema_version: r.read_u16()?,
        })
    });
    *domain.forces_mut() = read_arena!(r, capacities.forces, |r: &mut Reader<'_>| -> Result<Force, SaveError> {
        Ok(Force {
            id: r.read_u32()?,
            region_id: r.read_u32()?,
            flags: r.read_u32()?,
            provenance_id: r.read_u32()?,
            side_id: r.read_u32()?,
            logistics_dependency_id: r.read_u32()?,
            morale: Q16_16::from_raw(r.read_i32()?),
            readiness: Q16_16::from_raw(r.read_i32()?),
            schema_version: r.read_u16()?,
        })
    });
    *domain.engagements_mut() = read_arena!(r, capacities.engagements, |r: &mut Reader<'_>| -> Result<Engagement, SaveError> {
        Ok(Engagement {
            id: r.read_u32()?,
            region_id: r.read_u32()?,
            flags: r.read_u32()?,
            provenance_id: r.read_u32()?,
            force_a_id: r.read_u32()?,
            force_b_id: r.read_u32()?,
            intensity: Q16_16::from_raw(r.read_i32()?),
            schema_version: r.read_u16()?,
        })
    });
    *domain.outcomes_mut() = read_arena!(r, capacities.outcomes, |r: &mut Reader<'_>| -> Result<Outcome, SaveError> {
        Ok(Outcome {
            id: r.read_u32()?,
            region_id: r.read_u32()?,
            flags: r.read_u32()?,
            provenance_id: r.read_u32()?,
            resolution_tick: r.read_u64()?,
            schema_version: r.read_u16()?,
        })
    });
    *domain.occupations_mut() = read_arena!(r, capacities.occupations, |r: &mut Reader<'_>| -> Result<Occupation, SaveError> {
        Ok(Occupation {
            id: r.read_u32()?,
            region_id: r.read_u32()?,
            flags: r.read_u32()?,
            provenance_id: r.read_u32()?,
            legitimacy_support: Q16_16::from_raw(r.read_i32()?),
            status: occupation_status_from_u8(r.read_u8()?),
            schema_version: r.read_u16()?,
        })
    });
    *domain.resistances_mut() = read_arena!(r, capacities.resistances, |r: &mut Reader<'_>| -> Result<Resistance, SaveError> {
        Ok(Resistance {
            id: r.read_u32()?,
            region_id: r.read_u32()?,
            flags: r.read_u32()?,
            provenance_id: r.read_u32()?,
            resolution_tick: r.read_u64()?,
            schema_version: r.read_u16()?,
        })
    });
    *domain.morale_fields_mut() = read_arena!(r, capacities.morale_fields, |r: &mut Reader<'_>| -> Result<MoraleField, SaveError> {
        Ok(MoraleField {
            id: r.read_u32()?,
            region_id: r.read_u32()?,
            flags: r.read_u32()?,
            provenance_id: r.read_u32()?,
            decay_rate: Q16_16::from_raw(r.read_i32()?),
            morale_level: Q16_16::from_raw(r.read_i32()?),
            schema_version: r.read_u16()?,
        })
    });
    *domain.weapons_mut() = read_arena!(r, capacities.weapons, |r: &mut Reader<'_>| -> Result<Weapon, SaveError> {
        Ok(Weapon {
            id: r.read_u32()?,
            region_id: r.read_u32()?,
            flags: r.read_u32()?,
            provenance_id: r.read_u32()?,
            integrity: Q16_16::from_raw(r.read_i32()?),
            schema_version: r.read_u16()?,
        })
    });

    let capsule_count = r.read_u32()?;
    for _ in 0..capsule_count {
        let region_id = r.read_u32()?;
        let capsule = ConflictCapsule {
            records_count: r.read_u32()?,
            sides_count: r.read_u32()?,
            events_count: r.read_u32()?,
            forces_count: r.read_u32()?,
            engagements_count: r.read_u32()?,
            outcomes_count: r.read_u32()?,
            occupations_count: r.read_u32()?,
            resistances_count: r.read_u32()?,
            morale_fields_count: r.read_u32()?,
            weapons_count: r.read_u32()?,
            avg_readiness: Q16_16::from_raw(r.read_i32()?),
            avg_morale: Q16_16::from_raw(r.read_i32()?),
            avg_legitimacy: Q16_16::from_raw(r.read_i32()?),
            readiness_histogram: read_histogram(r)?,
            morale_histogram: read_histogram(r)?,
            legitimacy_histogram: read_histogram(r)?,
        };
        if !domain.capsules_mut().insert(region_id, capsule) {
            return Err(SaveError::CapsuleTableFull);
        }
    }

    Ok(domain)
}

fn write_economy(w: &mut Writer, domain: &EconomyDomain) {
    write_existence(w, domain.existence_state());
    write_archival(w, domain.archival_state());
    write_policy(w, domain.policy());

    write_arena!(w, domain.containers(), |w, e| {
        w.write_u32(e.id);
        w.write_u32(e.region_id);
        w.write_u32(e.flags);
        w.write_u32(e.provenance_id);
        w.write_i64(e.capacity.raw());
        w.write_u16(e.schema_version);
    });
    write_arena!(w, domain.storages(), |w, e| {
        w.write_u32(e.id);
        w.write_u32(e.region_id);
        w.write_u32(e.flags);
        w.write_u32(e.provenance_id);
        w.write_u32(e.container_id);
        w.write_i64(e.capacity.raw());
        w.write_i64(e.stored.raw());
        w.write_u16(e.schema_version);
    });
    write_arena!(w, domain.transports(), |w, e| {
        w.write_u32(e.id);
        w.write_u32(e.region_id);
        w.write_u32(e.flags);
        w.write_u32(e.provenance_id);
        w.write_u32(e.cargo_container_id);
        w.write_u64(e.arrival_tick);
        w.write_u16(e.schema_version);
    });
    write_arena!(w, domain.jobs(), |w, e| {
        w.write_u32(e.id);
        w.write_u32(e.region_id);
        w.write_u32(e.flags);
        w.write_u32(e.provenance_id);
        w.write_u64(e.completion_tick);
        w.write_u16(e.schema_version);
    });
    write_arena!(w, domain.markets(), |w, e| {
        w.write_u32(e.id);
        w.write_u32(e.region_id);
        w.write_u32(e.flags);
        w.write_u32(e.provenance_id);
        w.write_i32(e.price_average.raw());
        w.write_u32(e.risk_profile_id);
        w.write_i32(e.risk_modifier.raw());
        w.write_u16(e.schema_version);
    });
    write_arena!(w, domain.offers(), |w, e| {
        w.write_u32(e.id);
        w.write_u32(e.region_id);
        w.write_u32(e.flags);
        w.write_u32(e.provenance_id);
        w.write_u32(e.market_id);
        w.write_i32(e.price.raw());
        w.write_u64(e.expiry_tick);
        w.write_u16(e.schema_version);
    });
    write_arena!(w, domain.bids(), |w, e| {
        w.write_u32(e.id);
        w.write_u32(e.region_id);
        w.write_u32(e.flags);
        w.write_u32(e.provenance_id);
        w.write_u32(e.market_id);
        w.write_i32(e.price.raw());
        w.write_u64(e.expiry_tick);
        w.write_u16(e.schema_version);
    });
    write_arena!(w, domain.transactions(), |w, e| {
        w.write_u32(e.id);
        w.write_u32(e.region_id);
        w.write_u32(e.flags);
        w.write_u32(e.provenance_id);
        w.write_u32(e.market_id);
        w.write_i64(e.amount.raw());
        w.write_u16(e.schema_version);
    });

    let capsules = domain.capsules();
    w.write_u32(u32::try_from(capsules.count()).unwrap_or(u32::MAX));
    for (region_id, capsule) in capsules.iter() {
        w.write_u32(*region_id);
        w.write_u32(capsule.containers_count);
        w.write_u32(capsule.storages_count);
        w.write_u32(capsule.transports_count);
        w.write_u32(capsule.jobs_count);
        w.write_u32(capsule.markets_count);
        w.write_u32(capsule.offers_count);
        w.write_u32(capsule.bids_count);
        w.write_u32(capsule.transactions_count);
        w.write_i32(capsule.avg_goods.raw());
        w.write_i32(capsule.avg_price.raw());
        w.write_i32(capsule.avg_transaction_volume.raw());
        write_histogram(w, &capsule.goods_histogram);
        write_histogram(w, &capsule.price_histogram);
        write_histogram(w, &capsule.volume_histogram);
    }
}

fn read_economy(r: &mut Reader<'_>, capacities: EconomyCapacities) -> Result<EconomyDomain, SaveError> {
    let existence = read_existence(r)?;
    let archival = read_archival(r)?;
    let policy = read_policy(r)?;

    let mut domain = EconomyDomain::with_capacities(capacities);
    domain.set_state(existence, archival);
    domain.set_policy(policy);

    *domain.containers_mut() = read_arena!(r, capacities.containers, |r: &mut Reader<'_>| -> Result<Container, SaveError> {
        Ok(Container {
            id: r.read_u32()?,
            region_id: r.read_u32()?,
            flags: r.read_u32()?,
            provenance_id: r.read_u32()?,
            capacity: Q48_16::from_raw(r.read_i64()?),
            schema_version: r.read_u16()?,
        })
    });
    *domain.storages_mut() = read_arena!(r, capacities.storages, |r: &mut Reader<'_>| -> Result<Storage, SaveError> {
        Ok(Storage {
            id: r.read_u32()?,
            region_id: r.read_u32()?,
            flags: r.read_u32()?,
            provenance_id: r.read_u32()?,
            container_id: r.read_u32()?,
            capacity: Q48_16::from_raw(r.read_i64()?),
            stored: Q48_16::from_raw(r.read_i64()?),
            schema_version: r.read_u16()?,
        })
    });
    *domain.transports_mut() = read_arena!(r, capacities.transports, |r: &mut Reader<'_>| -> Result<Transport, SaveError> {
        Ok(Transport {
            id: r.read_u32()?,
            region_id: r.read_u32()?,
            flags: r.read_u32()?,
            provenance_id: r.read_u32()?,
            cargo_container_id: r.read_u32()?,
            arrival_tick: r.read_u64()?,
            schema_version: r.read_u16()?,
        })
    });
    *domain.jobs_mut() = read_arena!(r, capacities.jobs, |r: &mut Reader<'_>| -> Result<Job, SaveError> {
        Ok(Job {
            id: r.read_u32()?,
            region_id: r.read_u32()?,
            flags: r.read_u32()?,
            provenance_id: r.read_u32()?,
            completion_tick: r.read_u64()?,
            schema_version: r.read_u16()?,
        })
    });
    *domain.markets_mut() = read_arena!(r, capacities.markets, |r: &mut Reader<'_>| -> Result<Market, SaveError> {
        Ok(Market {
            id: r.read_u32()?,
            region_id: r.read_u32()?,
            flags: r.read_u32()?,
            provenance_id: r.read_u32()?,
            price_average: Q16_16::from_raw(r.read_i32()?),
            risk_profile_id: r.read_u32()?,
            risk_modifier: Q16_16::from_raw(r.read_i32()?),
            schema_version: r.read_u16()?,
        })
    });
    *domain.offers_mut() = read_arena!(r, capacities.offers, |r: &mut Reader<'_>| -> Result<Offer, SaveError> {
        Ok(Offer {
            id: r.read_u32()?,
            region_id: r.read_u32()?,
            flags: r.read_u32()?,
            provenance_id: r.read_u32()?,
            market_id: r.read_u32()?,
            price: Q16_16::from_raw(r.read_i32()?),
            expiry_tick: r.read_u64()?,
            schema_version: r.read_u16()?,
        })
    });
    *domain.bids_mut() = read_arena!(r, capacities.bids, |r: &mut Reader<'_>| -> Result<Bid, SaveError> {
        Ok(Bid {
            id: r.read_u32()?,
            region_id: r.read_u32()?,
            flags: r.read_u32()?,
            provenance_id: r.read_u32()?,
            market_id: r.read_u32()?,
            price: Q16_16::from_raw(r.read_i32()?),
            expiry_tick: r.read_u64()?,
            schema_version: r.read_u16()?,
        })
    });
    *domain.transactions_mut() = read_arena!(r, capacities.transactions, |r: &mut Reader<'_>| -> Result<Transaction, SaveError> {
        Ok(Transaction {
            id: r.read_u32()?,
            region_id: r.read_u32()?,
            flags: r.read_u32()?,
            provenance_id: r.read_u32()?,
            market_id: r.read_u32()?,
            amount: Q48_16::from_raw(r.read_i64()?),
            schema_version: r.read_u16()?,
        })
    });

    let capsule_count = r.read_u32()?;
    for _ in 0..capsule_count {
        let region_id = r.read_u32()?;
        let capsule = EconomyCapsule {
            containers_count: r.read_u32()?,
            storages_count: r.read_u32()?,
            transports_count: r.read_u32()?,
            jobs_count: r.read_u32()?,
            markets_count: r.read_u32()?,
            offers_count: r.read_u32()?,
            bids_count: r.read_u32()?,
            transactions_count: r.read_u32()?,
            avg_goods: Q16_16::from_raw(r.read_i32()?),
            avg_price: Q16_16::from_raw(r.read_i32()?),
            avg_transaction_volume: Q16_16::from_raw(r.read_i32()?),
            goods_histogram: read_histogram(r)?,
            price_histogram: read_histogram(r)?,
            volume_histogram: read_histogram(r)?,
        };
        if !domain.capsules_mut().insert(region_id, capsule) {
            return Err(SaveError::CapsuleTableFull);
        }
    }

    Ok(domain)
}

fn conflict_status_from_u8(raw: u8) -> ConflictStatus {
    match raw {
        1 => ConflictStatus::Degrading,
        2 => ConflictStatus::Resolved,
        _ => ConflictStatus::Active,
    }
}

fn event_type_from_u8(raw: u8) -> EventType {
    match raw {
        1 => EventType::Resistance,
        2 => EventType::DeEscalation,
        3 => EventType::Ceasefire,
        _ => EventType::Escalation,
    }
}

fn occupation_status_from_u8(raw: u8) -> OccupationStatus {
    match raw {
        1 => OccupationStatus::Degrading,
        _ => OccupationStatus::Stable,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

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

    fn sample_runtime() -> Runtime {
        let caps = capacities();
        let mut conflict = ConflictDomain::with_capacities(caps.conflict);
        conflict.init();
        conflict.sides_mut().init_entry(Side {
            id: 5,
            region_id: 2,
            readiness: Q16_16::from_raw(0x2345),
            ..Default::default()
        });
        let mut economy = EconomyDomain::with_capacities(caps.economy);
        economy.init();
        Runtime::new(conflict, economy, AuthorityMode::Single)
    }

    #[test]
    fn round_trip_preserves_world_hash_and_tick() {
        let mut runtime = sample_runtime();
        let report = runtime.tick(1000);
        let expected_hash = report.world_hash;

        let bytes = save_state(&runtime, 1, 1);
        let (restored, run_id, instance_id) =
            load_state(&bytes, capacities(), AuthorityMode::Single).expect("load succeeds");

        assert_eq!(run_id, 1);
        assert_eq!(instance_id, 1);
        assert_eq!(restored.current_tick(), runtime.current_tick());
        assert_eq!(
            crate::world::world_hash(restored.conflict(), restored.economy()),
            expected_hash
        );
        assert_eq!(restored.conflict().sides().count(), 1);
    }

    #[test]
    fn bad_magic_is_rejected() {
        let bytes = vec![0_u8; 32];
        let error = load_state(&bytes, capacities(), AuthorityMode::Single)
            .err()
            .expect("bad magic is rejected");
        assert_eq!(error, SaveError::BadMagic);
    }

    #[test]
    fn capacity_mismatch_is_reported_not_silently_truncated() {
        let runtime = sample_runtime();
        let bytes = save_state(&runtime, 0, 0);
        let mut tiny = capacities();
        tiny.conflict.sides = 0;
        let error = load_state(&bytes, tiny, AuthorityMode::Single)
            .err()
            .expect("undersized capacity is rejected");
        assert_eq!(error, SaveError::CapacityMismatch { count: 1, capacity: 0 });
    }
}
