// SPDX-License-Identifier: Apache-2.0
//! The conflict domain: sides, forces, engagements, occupations, and the
//! event-driven status machine that ties a `ConflictRecord` together
//! (spec.md §4.6, conflict exemplar).

use dominium_fixed::{Q16_16, Q48_16};
use dominium_hash::RngCursor;

use crate::arena::{Arena, Entity};
use crate::budget::{Budget, CostTier, MissingKind, Policy, RefusalReason};
use crate::capsule::{CapsuleTable, Histogram4};
use crate::error::KernelError;
use crate::existence::{ArchivalState, ExistenceState};
use crate::flags;
use crate::ids::{EntityId, RegionId, Tick};
use crate::sample::{query_single, Sample};

/// Quarter-turn threshold (`0x4000`, `¼`) used by the low-morale and
/// illegitimacy bands (spec.md §4.6.1).
const QUARTER_TURN: i32 = 0x4000;

/// Per-kind fixed arena capacities for a conflict domain instance.
#[derive(Debug, Clone, Copy)]
pub struct ConflictCapacities {
    /// Maximum `ConflictRecord` count.
    pub records: usize,
    /// Maximum `Side` count.
    pub sides: usize,
    /// Maximum `Event` count.
    pub events: usize,
    /// Maximum `Force` count.
    pub forces: usize,
    /// Maximum `Engagement` count.
    pub engagements: usize,
    /// Maximum `Outcome` count.
    pub outcomes: usize,
    /// Maximum `Occupation` count.
    pub occupations: usize,
    /// Maximum `Resistance` count.
    pub resistances: usize,
    /// Maximum `MoraleField` count.
    pub morale_fields: usize,
    /// Maximum `Weapon` count.
    pub weapons: usize,
    /// Maximum number of simultaneously collapsed regions.
    pub capsules: usize,
}

/// A conflict record's macro status: drives the small event-type → status
/// table applied during event dispatch.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum ConflictStatus {
    /// The conflict is ongoing.
    #[default]
    Active,
    /// The conflict is winding down.
    Degrading,
    /// The conflict has concluded.
    Resolved,
}

/// An occupation's own lifecycle status (distinct from `ConflictStatus`).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum OccupationStatus {
    /// The occupation holds.
    #[default]
    Stable,
    /// The occupation is losing ground; combined with low legitimacy this
    /// sets `RESISTANCE` on the resolve result.
    Degrading,
}

/// The closed set of conflict event kinds.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum EventType {
    /// Escalates the owning conflict.
    #[default]
    Escalation,
    /// Local resistance activity; the owning conflict's status is
    /// unaffected (stays `Active`), but `RESISTANCE` is set on the result.
    Resistance,
    /// De-escalates the owning conflict towards `Degrading`.
    DeEscalation,
    /// Concludes the owning conflict.
    Ceasefire,
}

impl EventType {
    /// The event-type → conflict-status table (spec.md §4.6 step 5).
    #[must_use]
    pub const fn resulting_status(self) -> ConflictStatus {
        match self {
            Self::Escalation | Self::Resistance => ConflictStatus::Active,
            Self::DeEscalation => ConflictStatus::Degrading,
            Self::Ceasefire => ConflictStatus::Resolved,
        }
    }
}

/// A top-level conflict: the unit `status` lives on, updated by dispatched
/// events owning it.
#[derive(Debug, Clone, Copy, Default)]
pub struct ConflictRecord {
    /// Stable id.
    pub id: EntityId,
    /// Owning region.
    pub region_id: RegionId,
    /// Flags bitset.
    pub flags: u32,
    /// Authoring-layer provenance id.
    pub provenance_id: u32,
    /// The conflict's current status.
    pub status: ConflictStatus,
    /// Fixture schema revision this record was authored against.
    pub schema_version: u16,
}

impl Entity for ConflictRecord {
    fn id(&self) -> u32 {
        self.id
    }
    fn region_id(&self) -> u32 {
        self.region_id
    }
    fn flags(&self) -> u32 {
        self.flags
    }
    fn flags_mut(&mut self) -> &mut u32 {
        &mut self.flags
    }
}

/// A side participating in a conflict.
#[derive(Debug, Clone, Copy, Default)]
pub struct Side {
    /// Stable id.
    pub id: EntityId,
    /// Owning region.
    pub region_id: RegionId,
    /// Flags bitset.
    pub flags: u32,
    /// Authoring-layer provenance id.
    pub provenance_id: u32,
    /// The conflict this side belongs to.
    pub conflict_id: EntityId,
    /// A logistics dependency; `0` means none, which signals `SHORTAGE`.
    pub logistics_dependency_id: EntityId,
    /// Readiness ratio in `[0, 1]`.
    pub readiness: Q16_16,
    /// Fixture schema revision.
    pub schema_version: u16,
}

impl Entity for Side {
    fn id(&self) -> u32 {
        self.id
    }
    fn region_id(&self) -> u32 {
        self.region_id
    }
    fn flags(&self) -> u32 {
        self.flags
    }
    fn flags_mut(&mut self) -> &mut u32 {
        &mut self.flags
    }
}

/// A scheduled conflict event.
#[derive(Debug, Clone, Copy, Default)]
pub struct Event {
    /// Stable id.
    pub id: EntityId,
    /// Owning region.
    pub region_id: RegionId,
    /// Flags bitset; `APPLIED` is set on dispatch.
    pub flags: u32,
    /// Authoring-layer provenance id.
    pub provenance_id: u32,
    /// The conflict this event applies to.
    pub conflict_id: EntityId,
    /// The tick at or after which this event becomes eligible.
    pub scheduled_tick: Tick,
    /// Secondary deterministic ordering key for same-tick events.
    pub order_key: u32,
    /// What kind of event this is.
    pub event_type: EventType,
    /// Fixture schema revision.
    pub schema_version: u16,
}

impl Entity for Event {
    fn id(&self) -> u32 {
        self.id
    }
    fn region_id(&self) -> u32 {
        self.region_id
    }
    fn flags(&self) -> u32 {
        self.flags
    }
    fn flags_mut(&mut self) -> &mut u32 {
        &mut self.flags
    }
}

/// A military force belonging to a side.
#[derive(Debug, Clone, Copy, Default)]
pub struct Force {
    /// Stable id.
    pub id: EntityId,
    /// Owning region.
    pub region_id: RegionId,
    /// Flags bitset.
    pub flags: u32,
    /// Authoring-layer provenance id.
    pub provenance_id: u32,
    /// The side this force belongs to.
    pub side_id: EntityId,
    /// A logistics dependency; `0` means none, which signals `SHORTAGE`.
    pub logistics_dependency_id: EntityId,
    /// Morale ratio in `[0, 1]`.
    pub morale: Q16_16,
    /// Readiness ratio in `[0, 1]`.
    pub readiness: Q16_16,
    /// Fixture schema revision.
    pub schema_version: u16,
}

impl Entity for Force {
    fn id(&self) -> u32 {
        self.id
    }
    fn region_id(&self) -> u32 {
        self.region_id
    }
    fn flags(&self) -> u32 {
        self.flags
    }
    fn flags_mut(&mut self) -> &mut u32 {
        &mut self.flags
    }
}

/// An engagement between two forces.
#[derive(Debug, Clone, Copy, Default)]
pub struct Engagement {
    /// Stable id.
    pub id: EntityId,
    /// Owning region.
    pub region_id: RegionId,
    /// Flags bitset.
    pub flags: u32,
    /// Authoring-layer provenance id.
    pub provenance_id: u32,
    /// The first participating force.
    pub force_a_id: EntityId,
    /// The second participating force.
    pub force_b_id: EntityId,
    /// Engagement intensity ratio in `[0, 1]`.
    pub intensity: Q16_16,
    /// Fixture schema revision.
    pub schema_version: u16,
}

impl Entity for Engagement {
    fn id(&self) -> u32 {
        self.id
    }
    fn region_id(&self) -> u32 {
        self.region_id
    }
    fn flags(&self) -> u32 {
        self.flags
    }
    fn flags_mut(&mut self) -> &mut u32 {
        &mut self.flags
    }
}

/// An engagement outcome, applied once its resolution tick is reached.
#[derive(Debug, Clone, Copy, Default)]
pub struct Outcome {
    /// Stable id.
    pub id: EntityId,
    /// Owning region.
    pub region_id: RegionId,
    /// Flags bitset; `APPLIED` is set once resolved.
    pub flags: u32,
    /// Authoring-layer provenance id.
    pub provenance_id: u32,
    /// The tick at which this outcome becomes final.
    pub resolution_tick: Tick,
    /// Fixture schema revision.
    pub schema_version: u16,
}

impl Entity for Outcome {
    fn id(&self) -> u32 {
        self.id
    }
    fn region_id(&self) -> u32 {
        self.region_id
    }
    fn flags(&self) -> u32 {
        self.flags
    }
    fn flags_mut(&mut self) -> &mut u32 {
        &mut self.flags
    }
}

/// An occupation of a region by one side.
#[derive(Debug, Clone, Copy, Default)]
pub struct Occupation {
    /// Stable id.
    pub id: EntityId,
    /// Owning region.
    pub region_id: RegionId,
    /// Flags bitset.
    pub flags: u32,
    /// Authoring-layer provenance id.
    pub provenance_id: u32,
    /// Legitimacy-support ratio in `[0, 1]`.
    pub legitimacy_support: Q16_16,
    /// The occupation's own status.
    pub status: OccupationStatus,
    /// Fixture schema revision.
    pub schema_version: u16,
}

impl Entity for Occupation {
    fn id(&self) -> u32 {
        self.id
    }
    fn region_id(&self) -> u32 {
        self.region_id
    }
    fn flags(&self) -> u32 {
        self.flags
    }
    fn flags_mut(&mut self) -> &mut u32 {
        &mut self.flags
    }
}

/// Active resistance to an occupation, applied once its resolution tick is
/// reached.
#[derive(Debug, Clone, Copy, Default)]
pub struct Resistance {
    /// Stable id.
    pub id: EntityId,
    /// Owning region.
    pub region_id: RegionId,
    /// Flags bitset; `APPLIED` is set once resolved.
    pub flags: u32,
    /// Authoring-layer provenance id.
    pub provenance_id: u32,
    /// The tick at which this resistance event becomes final.
    pub resolution_tick: Tick,
    /// Fixture schema revision.
    pub schema_version: u16,
}

impl Entity for Resistance {
    fn id(&self) -> u32 {
        self.id
    }
    fn region_id(&self) -> u32 {
        self.region_id
    }
    fn flags(&self) -> u32 {
        self.flags
    }
    fn flags_mut(&mut self) -> &mut u32 {
        &mut self.flags
    }
}

/// A morale field decaying over time.
#[derive(Debug, Clone, Copy, Default)]
pub struct MoraleField {
    /// Stable id.
    pub id: EntityId,
    /// Owning region.
    pub region_id: RegionId,
    /// Flags bitset.
    pub flags: u32,
    /// Authoring-layer provenance id.
    pub provenance_id: u32,
    /// Decay applied per tick, in Q16.16.
    pub decay_rate: Q16_16,
    /// Current morale level in `[0, 1]`.
    pub morale_level: Q16_16,
    /// Fixture schema revision.
    pub schema_version: u16,
}

impl Entity for MoraleField {
    fn id(&self) -> u32 {
        self.id
    }
    fn region_id(&self) -> u32 {
        self.region_id
    }
    fn flags(&self) -> u32 {
        self.flags
    }
    fn flags_mut(&mut self) -> &mut u32 {
        &mut self.flags
    }
}

/// A weapon system assigned to a force.
#[derive(Debug, Clone, Copy, Default)]
pub struct Weapon {
    /// Stable id.
    pub id: EntityId,
    /// Owning region.
    pub region_id: RegionId,
    /// Flags bitset.
    pub flags: u32,
    /// Authoring-layer provenance id.
    pub provenance_id: u32,
    /// Structural integrity ratio in `[0, 1]`.
    pub integrity: Q16_16,
    /// Fixture schema revision.
    pub schema_version: u16,
}

impl Entity for Weapon {
    fn id(&self) -> u32 {
        self.id
    }
    fn region_id(&self) -> u32 {
        self.region_id
    }
    fn flags(&self) -> u32 {
        self.flags
    }
    fn flags_mut(&mut self) -> &mut u32 {
        &mut self.flags
    }
}

/// A collapsed region's statistical summary for the conflict domain
/// (spec.md §3.3/§4.7).
#[derive(Debug, Clone)]
pub struct ConflictCapsule {
    /// Counts observed at collapse time, one per arena.
    pub records_count: u32,
    /// See [`ConflictCapsule::records_count`].
    pub sides_count: u32,
    /// See [`ConflictCapsule::records_count`].
    pub events_count: u32,
    /// See [`ConflictCapsule::records_count`].
    pub forces_count: u32,
    /// See [`ConflictCapsule::records_count`].
    pub engagements_count: u32,
    /// See [`ConflictCapsule::records_count`].
    pub outcomes_count: u32,
    /// See [`ConflictCapsule::records_count`].
    pub occupations_count: u32,
    /// See [`ConflictCapsule::records_count`].
    pub resistances_count: u32,
    /// See [`ConflictCapsule::records_count`].
    pub morale_fields_count: u32,
    /// See [`ConflictCapsule::records_count`].
    pub weapons_count: u32,
    /// Average readiness across sides and forces.
    pub avg_readiness: Q16_16,
    /// Average morale across morale fields.
    pub avg_morale: Q16_16,
    /// Average legitimacy support across occupations.
    pub avg_legitimacy: Q16_16,
    /// Readiness histogram.
    pub readiness_histogram: Histogram4,
    /// Morale histogram.
    pub morale_histogram: Histogram4,
    /// Legitimacy histogram.
    pub legitimacy_histogram: Histogram4,
}

/// The outcome of `resolve` for one region (or `region_id == 0`, all
/// regions) of a conflict domain.
#[derive(Debug, Clone, Copy)]
pub struct ConflictResolveResult {
    /// `true` unless the call was refused outright (`DOMAIN_INACTIVE` or
    /// base-tier budget exhaustion).
    pub ok: bool,
    /// The region this result covers.
    pub region_id: RegionId,
    /// The tick this resolve was run at.
    pub tick: Tick,
    /// Result-level flags observed this call.
    pub flags: u32,
    /// The first refusal reason encountered, or `None`.
    pub refusal_reason: RefusalReason,
    /// Number of records counted.
    pub records_seen: u32,
    /// Number of sides counted.
    pub sides_seen: u32,
    /// Number of events counted.
    pub events_seen: u32,
    /// Number of forces counted.
    pub forces_seen: u32,
    /// Number of engagements counted.
    pub engagements_seen: u32,
    /// Number of outcomes counted.
    pub outcomes_seen: u32,
    /// Number of occupations counted.
    pub occupations_seen: u32,
    /// Number of resistance entries counted.
    pub resistances_seen: u32,
    /// Number of morale fields counted.
    pub morale_fields_seen: u32,
    /// Number of weapons counted.
    pub weapons_seen: u32,
    /// Number of events dispatched this call.
    pub event_applied_count: u32,
    /// Average readiness across sides and forces seen, clamped to `[0, 1]`.
    pub avg_readiness: Q16_16,
    /// Average morale across morale fields seen, clamped to `[0, 1]`.
    pub avg_morale: Q16_16,
    /// Average legitimacy support across occupations seen, clamped to
    /// `[0, 1]`.
    pub avg_legitimacy: Q16_16,
    /// Budget units used as of the end of this call.
    pub budget_used: u32,
    /// Total budget units available.
    pub budget_max: u32,
}

impl ConflictResolveResult {
    fn refused(region_id: RegionId, tick: Tick, reason: RefusalReason, budget: Budget) -> Self {
        Self {
            ok: false,
            region_id,
            tick,
            flags: 0,
            refusal_reason: reason,
            records_seen: 0,
            sides_seen: 0,
            events_seen: 0,
            forces_seen: 0,
            engagements_seen: 0,
            outcomes_seen: 0,
            occupations_seen: 0,
            resistances_seen: 0,
            morale_fields_seen: 0,
            weapons_seen: 0,
            event_applied_count: 0,
            avg_readiness: Q16_16::ZERO,
            avg_morale: Q16_16::ZERO,
            avg_legitimacy: Q16_16::ZERO,
            budget_used: budget.used(),
            budget_max: budget.max(),
        }
    }

    fn from_capsule(
        region_id: RegionId,
        tick: Tick,
        capsule: &ConflictCapsule,
        budget: Budget,
    ) -> Self {
        Self {
            ok: true,
            region_id,
            tick,
            flags: flags::PARTIAL,
            refusal_reason: RefusalReason::None,
            records_seen: capsule.records_count,
            sides_seen: capsule.sides_count,
            events_seen: capsule.events_count,
            forces_seen: capsule.forces_count,
            engagements_seen: capsule.engagements_count,
            outcomes_seen: capsule.outcomes_count,
            occupations_seen: capsule.occupations_count,
            resistances_seen: capsule.resistances_count,
            morale_fields_seen: capsule.morale_fields_count,
            weapons_seen: capsule.weapons_count,
            event_applied_count: 0,
            avg_readiness: capsule.avg_readiness,
            avg_morale: capsule.avg_morale,
            avg_legitimacy: capsule.avg_legitimacy,
            budget_used: budget.used(),
            budget_max: budget.max(),
        }
    }
}

/// Attempts to charge `cost`. On refusal, sets `*partial` and records the
/// first `BUDGET` refusal seen (spec.md §4.6, "first one wins").
fn try_charge(
    budget: &mut Budget,
    cost: u32,
    partial: &mut bool,
    first_refusal: &mut RefusalReason,
) -> bool {
    if budget.consume(cost) {
        true
    } else {
        *partial = true;
        if matches!(*first_refusal, RefusalReason::None) {
            *first_refusal = RefusalReason::Budget;
        }
        false
    }
}

/// A conflict domain: ten entity arenas plus a capsule table, behind the
/// uniform `init -> set_policy -> (query|resolve|collapse|expand)* -> free`
/// lifecycle (spec.md §3.4).
#[derive(Debug)]
pub struct ConflictDomain {
    existence_state: ExistenceState,
    archival_state: ArchivalState,
    policy: Policy,
    records: Arena<ConflictRecord>,
    sides: Arena<Side>,
    events: Arena<Event>,
    forces: Arena<Force>,
    engagements: Arena<Engagement>,
    outcomes: Arena<Outcome>,
    occupations: Arena<Occupation>,
    resistances: Arena<Resistance>,
    morale_fields: Arena<MoraleField>,
    weapons: Arena<Weapon>,
    capsules: CapsuleTable<ConflictCapsule>,
}

impl ConflictDomain {
    /// Constructs a domain with empty, fixed-capacity arenas. The domain
    /// starts `Nonexistent`; call [`ConflictDomain::init`] to realize it.
    #[must_use]
    pub fn with_capacities(capacities: ConflictCapacities) -> Self {
        Self {
            existence_state: ExistenceState::Nonexistent,
            archival_state: ArchivalState::Live,
            policy: Policy::default(),
            records: Arena::with_capacity(capacities.records),
            sides: Arena::with_capacity(capacities.sides),
            events: Arena::with_capacity(capacities.events),
            forces: Arena::with_capacity(capacities.forces),
            engagements: Arena::with_capacity(capacities.engagements),
            outcomes: Arena::with_capacity(capacities.outcomes),
            occupations: Arena::with_capacity(capacities.occupations),
            resistances: Arena::with_capacity(capacities.resistances),
            morale_fields: Arena::with_capacity(capacities.morale_fields),
            weapons: Arena::with_capacity(capacities.weapons),
            capsules: CapsuleTable::with_capacity(capacities.capsules),
        }
    }

    /// Realizes the domain (spec.md §3.4 lifecycle: `init(surface) ->
    /// REALIZED`).
    pub fn init(&mut self) {
        self.existence_state = ExistenceState::Realized;
        tracing::debug!(domain = "conflict", "initialized");
    }

    /// Reconfigures the per-tier cost policy.
    pub fn set_policy(&mut self, policy: Policy) {
        self.policy = policy;
        tracing::debug!(domain = "conflict", "policy updated");
    }

    /// Reconfigures existence/archival state directly.
    pub fn set_state(&mut self, existence: ExistenceState, archival: ArchivalState) {
        self.existence_state = existence;
        self.archival_state = archival;
        tracing::debug!(domain = "conflict", ?existence, ?archival, "state set");
    }

    /// `true` iff the domain is active and may serve queries/resolve.
    #[must_use]
    pub const fn is_active(&self) -> bool {
        self.existence_state.is_active()
    }

    /// Zeroes every arena's count without destroying the surface
    /// description (spec.md §3.4: `free` zeroes counts).
    pub fn free(&mut self) {
        self.records.clear();
        self.sides.clear();
        self.events.clear();
        self.forces.clear();
        self.engagements.clear();
        self.outcomes.clear();
        self.occupations.clear();
        self.resistances.clear();
        self.morale_fields.clear();
        self.weapons.clear();
        tracing::debug!(domain = "conflict", "freed");
    }

    /// Direct mutable access to the records arena, for fixture loading.
    pub fn records_mut(&mut self) -> &mut Arena<ConflictRecord> {
        &mut self.records
    }
    /// Direct mutable access to the sides arena, for fixture loading.
    pub fn sides_mut(&mut self) -> &mut Arena<Side> {
        &mut self.sides
    }
    /// Direct mutable access to the events arena, for fixture loading.
    pub fn events_mut(&mut self) -> &mut Arena<Event> {
        &mut self.events
    }
    /// Direct mutable access to the forces arena, for fixture loading.
    pub fn forces_mut(&mut self) -> &mut Arena<Force> {
        &mut self.forces
    }
    /// Direct mutable access to the engagements arena, for fixture loading.
    pub fn engagements_mut(&mut self) -> &mut Arena<Engagement> {
        &mut self.engagements
    }
    /// Direct mutable access to the outcomes arena, for fixture loading.
    pub fn outcomes_mut(&mut self) -> &mut Arena<Outcome> {
        &mut self.outcomes
    }
    /// Direct mutable access to the occupations arena, for fixture loading.
    pub fn occupations_mut(&mut self) -> &mut Arena<Occupation> {
        &mut self.occupations
    }
    /// Direct mutable access to the resistance arena, for fixture loading.
    pub fn resistances_mut(&mut self) -> &mut Arena<Resistance> {
        &mut self.resistances
    }
    /// Direct mutable access to the morale field arena, for fixture
    /// loading.
    pub fn morale_fields_mut(&mut self) -> &mut Arena<MoraleField> {
        &mut self.morale_fields
    }
    /// Direct mutable access to the weapons arena, for fixture loading.
    pub fn weapons_mut(&mut self) -> &mut Arena<Weapon> {
        &mut self.weapons
    }

    /// Read-only access to the records arena, in declared order (world
    /// hash streaming, save/restore).
    pub const fn records(&self) -> &Arena<ConflictRecord> {
        &self.records
    }
    /// See [`ConflictDomain::records`].
    pub const fn sides(&self) -> &Arena<Side> {
        &self.sides
    }
    /// See [`ConflictDomain::records`].
    pub const fn events(&self) -> &Arena<Event> {
        &self.events
    }
    /// See [`ConflictDomain::records`].
    pub const fn forces(&self) -> &Arena<Force> {
        &self.forces
    }
    /// See [`ConflictDomain::records`].
    pub const fn engagements(&self) -> &Arena<Engagement> {
        &self.engagements
    }
    /// See [`ConflictDomain::records`].
    pub const fn outcomes(&self) -> &Arena<Outcome> {
        &self.outcomes
    }
    /// See [`ConflictDomain::records`].
    pub const fn occupations(&self) -> &Arena<Occupation> {
        &self.occupations
    }
    /// See [`ConflictDomain::records`].
    pub const fn resistances(&self) -> &Arena<Resistance> {
        &self.resistances
    }
    /// See [`ConflictDomain::records`].
    pub const fn morale_fields(&self) -> &Arena<MoraleField> {
        &self.morale_fields
    }
    /// See [`ConflictDomain::records`].
    pub const fn weapons(&self) -> &Arena<Weapon> {
        &self.weapons
    }
    /// Read-only access to the capsule table, for save/restore.
    pub const fn capsules(&self) -> &CapsuleTable<ConflictCapsule> {
        &self.capsules
    }
    /// Direct mutable access to the capsule table, for restore.
    pub fn capsules_mut(&mut self) -> &mut CapsuleTable<ConflictCapsule> {
        &mut self.capsules
    }
    /// The domain's current existence state.
    #[must_use]
    pub const fn existence_state(&self) -> ExistenceState {
        self.existence_state
    }
    /// The domain's current archival state.
    #[must_use]
    pub const fn archival_state(&self) -> ArchivalState {
        self.archival_state
    }
    /// The domain's current policy.
    #[must_use]
    pub const fn policy(&self) -> Policy {
        self.policy
    }

    /// Every distinct non-zero `region_id` referenced by any entity in any
    /// arena, in ascending order. Used by the runtime to drive `resolve`
    /// one non-collapsed region at a time (spec.md §4.8 step 2).
    #[must_use]
    pub fn region_ids(&self) -> std::collections::BTreeSet<RegionId> {
        let mut set = std::collections::BTreeSet::new();
        for r in self.records.iter() {
            set.insert(r.region_id());
        }
        for r in self.sides.iter() {
            set.insert(r.region_id());
        }
        for r in self.events.iter() {
            set.insert(r.region_id());
        }
        for r in self.forces.iter() {
            set.insert(r.region_id());
        }
        for r in self.engagements.iter() {
            set.insert(r.region_id());
        }
        for r in self.outcomes.iter() {
            set.insert(r.region_id());
        }
        for r in self.occupations.iter() {
            set.insert(r.region_id());
        }
        for r in self.resistances.iter() {
            set.insert(r.region_id());
        }
        for r in self.morale_fields.iter() {
            set.insert(r.region_id());
        }
        for r in self.weapons.iter() {
            set.insert(r.region_id());
        }
        set
    }

    fn region_is_collapsed(&self, region_id: RegionId) -> bool {
        self.capsules.contains(region_id)
    }

    /// Queries a single `ConflictRecord` by id.
    pub fn query_record(&self, id: EntityId, budget: &mut Budget) -> Sample<ConflictRecord> {
        query_single(
            self.is_active(),
            &self.records,
            |r| self.region_is_collapsed(r),
            id,
            &self.policy,
            CostTier::Full,
            budget,
            MissingKind::Record,
        )
    }

    /// Queries a single `Side` by id.
    pub fn query_side(&self, id: EntityId, budget: &mut Budget) -> Sample<Side> {
        query_single(
            self.is_active(),
            &self.sides,
            |r| self.region_is_collapsed(r),
            id,
            &self.policy,
            CostTier::Full,
            budget,
            MissingKind::Side,
        )
    }

    /// Queries a single `Event` by id.
    pub fn query_event(&self, id: EntityId, budget: &mut Budget) -> Sample<Event> {
        query_single(
            self.is_active(),
            &self.events,
            |r| self.region_is_collapsed(r),
            id,
            &self.policy,
            CostTier::Medium,
            budget,
            MissingKind::Event,
        )
    }

    /// Queries a single `Force` by id.
    pub fn query_force(&self, id: EntityId, budget: &mut Budget) -> Sample<Force> {
        query_single(
            self.is_active(),
            &self.forces,
            |r| self.region_is_collapsed(r),
            id,
            &self.policy,
            CostTier::Full,
            budget,
            MissingKind::Force,
        )
    }

    /// Queries a single `Engagement` by id.
    pub fn query_engagement(&self, id: EntityId, budget: &mut Budget) -> Sample<Engagement> {
        query_single(
            self.is_active(),
            &self.engagements,
            |r| self.region_is_collapsed(r),
            id,
            &self.policy,
            CostTier::Coarse,
            budget,
            MissingKind::Engagement,
        )
    }

    /// Queries a single `Outcome` by id.
    pub fn query_outcome(&self, id: EntityId, budget: &mut Budget) -> Sample<Outcome> {
        query_single(
            self.is_active(),
            &self.outcomes,
            |r| self.region_is_collapsed(r),
            id,
            &self.policy,
            CostTier::Coarse,
            budget,
            MissingKind::Outcome,
        )
    }

    /// Queries a single `Occupation` by id.
    pub fn query_occupation(&self, id: EntityId, budget: &mut Budget) -> Sample<Occupation> {
        query_single(
            self.is_active(),
            &self.occupations,
            |r| self.region_is_collapsed(r),
            id,
            &self.policy,
            CostTier::Full,
            budget,
            MissingKind::Occupation,
        )
    }

    /// Queries a single `Resistance` by id.
    pub fn query_resistance(&self, id: EntityId, budget: &mut Budget) -> Sample<Resistance> {
        query_single(
            self.is_active(),
            &self.resistances,
            |r| self.region_is_collapsed(r),
            id,
            &self.policy,
            CostTier::Coarse,
            budget,
            MissingKind::Resistance,
        )
    }

    /// Queries a single `MoraleField` by id.
    pub fn query_morale_field(&self, id: EntityId, budget: &mut Budget) -> Sample<MoraleField> {
        query_single(
            self.is_active(),
            &self.morale_fields,
            |r| self.region_is_collapsed(r),
            id,
            &self.policy,
            CostTier::Full,
            budget,
            MissingKind::MoraleField,
        )
    }

    /// Queries a single `Weapon` by id.
    pub fn query_weapon(&self, id: EntityId, budget: &mut Budget) -> Sample<Weapon> {
        query_single(
            self.is_active(),
            &self.weapons,
            |r| self.region_is_collapsed(r),
            id,
            &self.policy,
            CostTier::Coarse,
            budget,
            MissingKind::Weapon,
        )
    }

    /// Runs the deterministic per-tick resolve pass over `region_id` (or
    /// every region if `region_id == 0`), per spec.md §4.6.
    #[allow(clippy::too_many_lines)]
    pub fn resolve(
        &mut self,
        region_id: RegionId,
        tick: Tick,
        tick_delta: u64,
        budget: &mut Budget,
    ) -> ConflictResolveResult {
        if !self.is_active() {
            return ConflictResolveResult::refused(
                region_id,
                tick,
                RefusalReason::DomainInactive,
                *budget,
            );
        }

        let base_cost = self.policy.tier_cost(CostTier::Analytic);
        if !budget.consume(base_cost) {
            return ConflictResolveResult::refused(
                region_id,
                tick,
                RefusalReason::Budget,
                *budget,
            );
        }

        if region_id != 0 {
            if let Some(capsule) = self.capsules.get(region_id) {
                return ConflictResolveResult::from_capsule(region_id, tick, capsule, *budget);
            }
        }

        let tick_delta = tick_delta.max(1);

        let mut flags_out = 0_u32;
        let mut partial = false;
        let mut first_refusal = RefusalReason::None;

        let mut records_seen = 0_u32;
        let cost_records = self.policy.tier_cost(CostTier::Medium);
        'records: for (_, record) in self.records.iter_region(region_id) {
            if !try_charge(budget, cost_records, &mut partial, &mut first_refusal) {
                break 'records;
            }
            let _ = record;
            records_seen += 1;
        }

        let mut sides_seen = 0_u32;
        let mut readiness_sum = Q48_16::ZERO;
        let mut readiness_seen = 0_u32;
        let mut readiness_bins = [0_u32; crate::capsule::HISTOGRAM_BINS];
        let cost_sides = self.policy.tier_cost(CostTier::Full);
        'sides: for (_, side) in self.sides.iter_region(region_id) {
            if !try_charge(budget, cost_sides, &mut partial, &mut first_refusal) {
                break 'sides;
            }
            sides_seen += 1;
            if side.logistics_dependency_id == 0 {
                flags_out |= flags::SHORTAGE;
            }
            readiness_sum = readiness_sum.saturating_add(side.readiness.widen());
            readiness_seen += 1;
            Histogram4::accumulate(&mut readiness_bins, side.readiness);
        }

        let mut events_seen = 0_u32;
        let mut charged_event_indices: Vec<usize> = Vec::new();
        let cost_events = self.policy.tier_cost(CostTier::Medium);
        'events: for (index, event) in self.events.iter_region(region_id) {
            if !try_charge(budget, cost_events, &mut partial, &mut first_refusal) {
                break 'events;
            }
            let _ = event;
            events_seen += 1;
            charged_event_indices.push(index);
        }

        let mut forces_seen = 0_u32;
        let cost_forces = self.policy.tier_cost(CostTier::Full);
        'forces: for (_, force) in self.forces.iter_region(region_id) {
            if !try_charge(budget, cost_forces, &mut partial, &mut first_refusal) {
                break 'forces;
            }
            forces_seen += 1;
            if force.logistics_dependency_id == 0 {
                flags_out |= flags::SHORTAGE;
            }
            if force.morale.raw() > 0 && force.morale.raw() < QUARTER_TURN {
                flags_out |= flags::LOW_MORALE;
            }
            readiness_sum = readiness_sum.saturating_add(force.readiness.widen());
            readiness_seen += 1;
            Histogram4::accumulate(&mut readiness_bins, force.readiness);
        }

        let mut engagements_seen = 0_u32;
        let cost_engagements = self.policy.tier_cost(CostTier::Coarse);
        'engagements: for (_, engagement) in self.engagements.iter_region(region_id) {
            if !try_charge(budget, cost_engagements, &mut partial, &mut first_refusal) {
                break 'engagements;
            }
            let _ = engagement;
            engagements_seen += 1;
        }

        let mut outcomes_seen = 0_u32;
        let cost_outcomes = self.policy.tier_cost(CostTier::Coarse);
        let outcomes_region = region_id;
        'outcomes: for index in 0..self.outcomes.count() {
            let Some(outcome) = self.outcomes.get(index) else {
                break 'outcomes;
            };
            if outcomes_region != 0 && outcome.region_id != outcomes_region {
                continue;
            }
            if !try_charge(budget, cost_outcomes, &mut partial, &mut first_refusal) {
                break 'outcomes;
            }
            outcomes_seen += 1;
        }

        let mut occupations_seen = 0_u32;
        let mut legitimacy_sum = Q48_16::ZERO;
        let mut legitimacy_seen = 0_u32;
        let mut legitimacy_bins = [0_u32; crate::capsule::HISTOGRAM_BINS];
        let cost_occupations = self.policy.tier_cost(CostTier::Full);
        'occupations: for (_, occupation) in self.occupations.iter_region(region_id) {
            if !try_charge(budget, cost_occupations, &mut partial, &mut first_refusal) {
                break 'occupations;
            }
            occupations_seen += 1;
            if occupation.legitimacy_support.raw() > 0
                && occupation.legitimacy_support.raw() < QUARTER_TURN
            {
                flags_out |= flags::ILLEGITIMATE;
            }
            if occupation.status == OccupationStatus::Degrading {
                flags_out |= flags::RESISTANCE;
            }
            legitimacy_sum = legitimacy_sum.saturating_add(occupation.legitimacy_support.widen());
            legitimacy_seen += 1;
            Histogram4::accumulate(&mut legitimacy_bins, occupation.legitimacy_support);
        }

        let mut resistances_seen = 0_u32;
        let cost_resistances = self.policy.tier_cost(CostTier::Coarse);
        let resistances_region = region_id;
        'resistances: for index in 0..self.resistances.count() {
            let Some(resistance) = self.resistances.get(index) else {
                break 'resistances;
            };
            if resistances_region != 0 && resistance.region_id != resistances_region {
                continue;
            }
            if !try_charge(budget, cost_resistances, &mut partial, &mut first_refusal) {
                break 'resistances;
            }
            resistances_seen += 1;
        }

        let mut morale_fields_seen = 0_u32;
        let mut morale_sum = Q48_16::ZERO;
        let mut morale_seen = 0_u32;
        let mut morale_bins = [0_u32; crate::capsule::HISTOGRAM_BINS];
        let cost_morale = self.policy.tier_cost(CostTier::Full);
        'morale: for (_, morale_field) in self.morale_fields.iter_region(region_id) {
            if !try_charge(budget, cost_morale, &mut partial, &mut first_refusal) {
                break 'morale;
            }
            morale_fields_seen += 1;
            morale_sum = morale_sum.saturating_add(morale_field.morale_level.widen());
            morale_seen += 1;
            Histogram4::accumulate(&mut morale_bins, morale_field.morale_level);
        }

        let mut weapons_seen = 0_u32;
        let cost_weapons = self.policy.tier_cost(CostTier::Coarse);
        'weapons: for (_, weapon) in self.weapons.iter_region(region_id) {
            if !try_charge(budget, cost_weapons, &mut partial, &mut first_refusal) {
                break 'weapons;
            }
            let _ = weapon;
            weapons_seen += 1;
        }

        // Step 5: event dispatch, insertion-sorted by (order_key, id).
        // Restricted to `charged_event_indices`: an event only dispatches if
        // the counting pass above already charged its budget tier, so a
        // budget-exhausted tail of events is neither counted nor dispatched.
        let mut due: Vec<usize> = charged_event_indices
            .into_iter()
            .filter(|&i| {
                let Some(event) = self.events.get(i) else {
                    return false;
                };
                (region_id == 0 || event.region_id == region_id)
                    && event.scheduled_tick <= tick
                    && event.flags & flags::APPLIED == 0
            })
            .collect();
        insertion_sort_by_order_key(&mut due, &self.events);

        let mut event_applied_count = 0_u32;
        for index in due {
            let Some(event) = self.events.get_mut(index) else {
                continue;
            };
            *event.flags_mut() |= flags::APPLIED;
            let conflict_id = event.conflict_id;
            let event_type = event.event_type;
            event_applied_count += 1;
            if matches!(event_type, EventType::Resistance) {
                flags_out |= flags::RESISTANCE;
            }
            if let Some(record_index) = self.records.find_index_by_id(conflict_id) {
                if let Some(record) = self.records.get_mut(record_index) {
                    record.status = event_type.resulting_status();
                }
            }
        }

        // Step 6: morale decay.
        let mut decayed = false;
        for field in self.morale_fields.iter_mut() {
            if region_id != 0 && field.region_id != region_id {
                continue;
            }
            if field.decay_rate.raw() > 0 && field.morale_level.raw() > 0 {
                let decay = field.morale_level.saturating_mul(field.decay_rate);
                #[allow(clippy::cast_possible_truncation)]
                let scaled = decay.saturating_scale(tick_delta.min(u64::from(u32::MAX)) as u32);
                field.morale_level = field.morale_level.saturating_sub_to_zero(scaled);
                decayed = true;
            }
        }
        if decayed {
            flags_out |= flags::DECAYING;
        }

        // Step 7: outcomes/resistance become APPLIED at their resolution tick.
        for outcome in self.outcomes.iter_mut() {
            if region_id != 0 && outcome.region_id != region_id {
                continue;
            }
            if outcome.resolution_tick <= tick && outcome.flags & flags::APPLIED == 0 {
                outcome.flags |= flags::APPLIED;
            }
        }
        for resistance in self.resistances.iter_mut() {
            if region_id != 0 && resistance.region_id != region_id {
                continue;
            }
            if resistance.resolution_tick <= tick && resistance.flags & flags::APPLIED == 0 {
                resistance.flags |= flags::APPLIED;
            }
        }

        let avg_readiness = readiness_sum.div_count(readiness_seen).narrow_unit();
        let avg_morale = morale_sum.div_count(morale_seen).narrow_unit();
        let avg_legitimacy = legitimacy_sum.div_count(legitimacy_seen).narrow_unit();

        if partial {
            flags_out |= flags::PARTIAL;
        }

        ConflictResolveResult {
            ok: true,
            region_id,
            tick,
            flags: flags_out,
            refusal_reason: first_refusal,
            records_seen,
            sides_seen,
            events_seen,
            forces_seen,
            engagements_seen,
            outcomes_seen,
            occupations_seen,
            resistances_seen,
            morale_fields_seen,
            weapons_seen,
            event_applied_count,
            avg_readiness,
            avg_morale,
            avg_legitimacy,
            budget_used: budget.used(),
            budget_max: budget.max(),
        }
    }

    /// Collapses `region_id` into a capsule (spec.md §4.7).
    pub fn collapse_region(&mut self, region_id: RegionId) -> Result<(), KernelError> {
        if region_id == 0 {
            return Err(KernelError::ZeroRegionCollapse);
        }
        if self.capsules.contains(region_id) {
            return Ok(());
        }

        let mut records_count = 0_u32;
        let mut sides_count = 0_u32;
        let mut events_count = 0_u32;
        let mut forces_count = 0_u32;
        let mut engagements_count = 0_u32;
        let mut outcomes_count = 0_u32;
        let mut occupations_count = 0_u32;
        let mut resistances_count = 0_u32;
        let mut morale_fields_count = 0_u32;
        let mut weapons_count = 0_u32;

        let mut readiness_sum = Q48_16::ZERO;
        let mut readiness_seen = 0_u32;
        let mut readiness_bins = [0_u32; crate::capsule::HISTOGRAM_BINS];
        let mut morale_sum = Q48_16::ZERO;
        let mut morale_seen = 0_u32;
        let mut morale_bins = [0_u32; crate::capsule::HISTOGRAM_BINS];
        let mut legitimacy_sum = Q48_16::ZERO;
        let mut legitimacy_seen = 0_u32;
        let mut legitimacy_bins = [0_u32; crate::capsule::HISTOGRAM_BINS];

        for (_, _) in self.records.iter_region(region_id) {
            records_count += 1;
        }
        for (_, side) in self.sides.iter_region(region_id) {
            sides_count += 1;
            readiness_sum = readiness_sum.saturating_add(side.readiness.widen());
            readiness_seen += 1;
            Histogram4::accumulate(&mut readiness_bins, side.readiness);
        }
        for (_, _) in self.events.iter_region(region_id) {
            events_count += 1;
        }
        for (_, force) in self.forces.iter_region(region_id) {
            forces_count += 1;
            readiness_sum = readiness_sum.saturating_add(force.readiness.widen());
            readiness_seen += 1;
            Histogram4::accumulate(&mut readiness_bins, force.readiness);
        }
        for (_, _) in self.engagements.iter_region(region_id) {
            engagements_count += 1;
        }
        for (_, _) in self.outcomes.iter_region(region_id) {
            outcomes_count += 1;
        }
        for (_, occupation) in self.occupations.iter_region(region_id) {
            occupations_count += 1;
            legitimacy_sum = legitimacy_sum.saturating_add(occupation.legitimacy_support.widen());
            legitimacy_seen += 1;
            Histogram4::accumulate(&mut legitimacy_bins, occupation.legitimacy_support);
        }
        for (_, _) in self.resistances.iter_region(region_id) {
            resistances_count += 1;
        }
        for (_, morale_field) in self.morale_fields.iter_region(region_id) {
            morale_fields_count += 1;
            morale_sum = morale_sum.saturating_add(morale_field.morale_level.widen());
            morale_seen += 1;
            Histogram4::accumulate(&mut morale_bins, morale_field.morale_level);
        }
        for (_, _) in self.weapons.iter_region(region_id) {
            weapons_count += 1;
        }

        let capsule = ConflictCapsule {
            records_count,
            sides_count,
            events_count,
            forces_count,
            engagements_count,
            outcomes_count,
            occupations_count,
            resistances_count,
            morale_fields_count,
            weapons_count,
            avg_readiness: readiness_sum.div_count(readiness_seen).narrow_unit(),
            avg_morale: morale_sum.div_count(morale_seen).narrow_unit(),
            avg_legitimacy: legitimacy_sum.div_count(legitimacy_seen).narrow_unit(),
            readiness_histogram: Histogram4::finish(readiness_bins, readiness_seen),
            morale_histogram: Histogram4::finish(morale_bins, morale_seen),
            legitimacy_histogram: Histogram4::finish(legitimacy_bins, legitimacy_seen),
        };

        if !self.capsules.insert(region_id, capsule) {
            return Err(KernelError::CapsuleTableFull(region_id));
        }
        tracing::debug!(domain = "conflict", region_id, "region collapsed");
        Ok(())
    }

    /// Expands a previously collapsed region, restoring full-fidelity
    /// queries against its original entities (spec.md §4.7).
    pub fn expand_region(&mut self, region_id: RegionId) -> Result<(), KernelError> {
        if self.capsules.remove(region_id).is_none() {
            return Err(KernelError::NoCapsuleForRegion(region_id));
        }
        tracing::debug!(domain = "conflict", region_id, "region expanded");
        Ok(())
    }

    /// `true` iff `region_id` is currently collapsed.
    #[must_use]
    pub fn is_region_collapsed(&self, region_id: RegionId) -> bool {
        self.capsules.contains(region_id)
    }

    /// Seeds an `RngCursor` for a newly-inited entity of a given kind
    /// (spec.md §4.2: `H32(domain_seed_label) ^ id`).
    #[must_use]
    pub fn seed_cursor(id: EntityId) -> RngCursor {
        RngCursor::seeded("dominium.conflict", id)
    }
}

/// Sorts event indices by `(order_key ASC, id ASC)` using an explicit
/// insertion sort: small, bounded arrays, deterministic and in-place
/// (spec.md §4.6 step 5).
fn insertion_sort_by_order_key(indices: &mut [usize], events: &Arena<Event>) {
    for i in 1..indices.len() {
        let mut j = i;
        while j > 0 && order_key_of(events, indices[j - 1]) > order_key_of(events, indices[j]) {
            indices.swap(j - 1, j);
            j -= 1;
        }
    }
}

fn order_key_of(events: &Arena<Event>, index: usize) -> (u32, u32) {
    events
        .get(index)
        .map_or((u32::MAX, u32::MAX), |e| (e.order_key, e.id))
}

#[cfg(test)]
mod tests {
    use super::*;

    fn capacities() -> ConflictCapacities {
        ConflictCapacities {
            records: 8,
            sides: 8,
            events: 8,
            forces: 8,
            engagements: 8,
            outcomes: 8,
            occupations: 8,
            resistances: 8,
            morale_fields: 8,
            weapons: 8,
            capsules: 4,
        }
    }

    fn active_domain() -> ConflictDomain {
        let mut domain = ConflictDomain::with_capacities(capacities());
        domain.init();
        domain.set_policy(Policy {
            cost_full: 1,
            cost_medium: 1,
            cost_coarse: 1,
            cost_analytic: 1,
        });
        domain
    }

    #[test]
    fn inactive_domain_refuses_resolve() {
        let mut domain = ConflictDomain::with_capacities(capacities());
        let mut budget = Budget::new(100);
        let result = domain.resolve(0, 1, 1, &mut budget);
        assert!(!result.ok);
        assert_eq!(result.refusal_reason, RefusalReason::DomainInactive);
        assert_eq!(budget.used(), 0);
    }

    #[test]
    fn shortage_flag_set_when_logistics_dependency_absent() {
        let mut domain = active_domain();
        domain.sides_mut().init_entry(Side {
            id: 1,
            region_id: 5,
            flags: flags::UNRESOLVED,
            logistics_dependency_id: 0,
            readiness: Q16_16::from_int(1),
            ..Default::default()
        });
        let mut budget = Budget::new(1000);
        let result = domain.resolve(5, 1, 1, &mut budget);
        assert!(result.ok);
        assert_eq!(result.flags & flags::SHORTAGE, flags::SHORTAGE);
    }

    #[test]
    fn identical_domains_resolve_to_identical_results() {
        let mut a = active_domain();
        let mut b = active_domain();
        for domain in [&mut a, &mut b] {
            domain.sides_mut().init_entry(Side {
                id: 1,
                region_id: 1,
                readiness: Q16_16::from_raw(0x8000),
                ..Default::default()
            });
            domain.forces_mut().init_entry(Force {
                id: 2,
                region_id: 1,
                morale: Q16_16::from_raw(0x2000),
                readiness: Q16_16::from_raw(0x4000),
                ..Default::default()
            });
        }
        let mut budget_a = Budget::new(1000);
        let mut budget_b = Budget::new(1000);
        let result_a = a.resolve(1, 10, 1, &mut budget_a);
        let result_b = b.resolve(1, 10, 1, &mut budget_b);
        assert_eq!(result_a.avg_readiness, result_b.avg_readiness);
        assert_eq!(result_a.flags, result_b.flags);
        assert_eq!(result_a.sides_seen, result_b.sides_seen);
    }

    #[test]
    fn events_apply_in_order_key_then_id_order() {
        let mut domain = active_domain();
        domain.records_mut().init_entry(ConflictRecord {
            id: 100,
            region_id: 1,
            ..Default::default()
        });
        domain.events_mut().init_entry(Event {
            id: 17,
            region_id: 1,
            conflict_id: 100,
            scheduled_tick: 3,
            order_key: 7,
            event_type: EventType::Resistance,
            ..Default::default()
        });
        domain.events_mut().init_entry(Event {
            id: 4,
            region_id: 1,
            conflict_id: 100,
            scheduled_tick: 3,
            order_key: 7,
            event_type: EventType::Escalation,
            ..Default::default()
        });
        let mut budget = Budget::new(1000);

        let before = domain.resolve(1, 2, 1, &mut budget);
        assert_eq!(before.event_applied_count, 0);

        let after = domain.resolve(1, 3, 1, &mut budget);
        assert_eq!(after.event_applied_count, 2);
        assert_eq!(after.flags & flags::RESISTANCE, flags::RESISTANCE);
        let record = domain.query_record(100, &mut budget);
        assert_eq!(record.entity.status, ConflictStatus::Active);
    }

    #[test]
    fn budget_exhausted_before_an_event_is_counted_also_skips_its_dispatch() {
        let mut domain = active_domain();
        domain.records_mut().init_entry(ConflictRecord {
            id: 100,
            region_id: 1,
            ..Default::default()
        });
        domain.events_mut().init_entry(Event {
            id: 1,
            region_id: 1,
            conflict_id: 100,
            scheduled_tick: 0,
            order_key: 0,
            event_type: EventType::Resistance,
            ..Default::default()
        });
        domain.events_mut().init_entry(Event {
            id: 2,
            region_id: 1,
            conflict_id: 100,
            scheduled_tick: 0,
            order_key: 0,
            event_type: EventType::Resistance,
            ..Default::default()
        });
        // Base analytic charge (1), one medium-tier record charge (1),
        // and exactly one medium-tier event charge (1): the first event
        // is counted and dispatched, the second is neither.
        let mut budget = Budget::new(3);

        let result = domain.resolve(1, 0, 1, &mut budget);
        assert_eq!(result.events_seen, 1);
        assert_eq!(result.event_applied_count, 1);
        let second_event = domain.events().iter().find(|e| e.id == 2).unwrap();
        assert_eq!(second_event.flags & flags::APPLIED, 0);
    }

    #[test]
    fn collapse_then_resolve_returns_partial_capsule_stats() {
        let mut domain = active_domain();
        domain.sides_mut().init_entry(Side {
            id: 1,
            region_id: 9,
            readiness: Q16_16::from_raw(0x8000),
            ..Default::default()
        });
        domain.collapse_region(9).expect("collapse succeeds");

        let mut budget = Budget::new(1000);
        let collapsed = domain.resolve(9, 1, 1, &mut budget);
        assert!(collapsed.ok);
        assert_eq!(collapsed.flags & flags::PARTIAL, flags::PARTIAL);
        assert_eq!(collapsed.sides_seen, 1);

        domain.expand_region(9).expect("expand succeeds");
        let expanded = domain.resolve(9, 2, 1, &mut budget);
        assert_eq!(expanded.flags & flags::PARTIAL, 0);
        assert_eq!(expanded.sides_seen, 1);
    }

    #[test]
    fn zero_region_cannot_be_collapsed() {
        let mut domain = active_domain();
        assert_eq!(
            domain.collapse_region(0),
            Err(KernelError::ZeroRegionCollapse)
        );
    }

    #[test]
    fn collapsing_twice_is_idempotent() {
        let mut domain = active_domain();
        domain.sides_mut().init_entry(Side {
            id: 1,
            region_id: 3,
            readiness: Q16_16::from_raw(0x8000),
            ..Default::default()
        });
        domain.collapse_region(3).expect("first collapse");
        domain.collapse_region(3).expect("second collapse is a no-op");
        assert_eq!(domain.capsules.count(), 1);
    }

    #[test]
    fn domain_inactive_refusal_leaves_budget_untouched() {
        let mut domain = ConflictDomain::with_capacities(capacities());
        domain.set_state(ExistenceState::Declared, ArchivalState::Live);
        let mut budget = Budget::new(50);
        let sample = domain.query_side(1, &mut budget);
        assert_eq!(sample.meta.refusal_reason, RefusalReason::DomainInactive);
        assert_eq!(budget.used(), 0);
    }
}
