// SPDX-License-Identifier: Apache-2.0
//! The fixed-step tick loop: owns one conflict domain and one economy
//! domain, drains due commands under the configured authority policy,
//! calls `resolve` region-by-region in declared domain order, and
//! recomputes the canonical world hash (spec.md §4.8).

use dominium_hash::H64;
use dominium_kernel::conflict::{ConflictDomain, ConflictResolveResult};
use dominium_kernel::economy::{EconomyDomain, EconomyResolveResult};
use dominium_kernel::{Budget, RegionId, Tick};

use crate::command::{AuthorityMode, Command, CommandError, SchemaRegistry};

/// Feeds one conflict domain's arenas into `hasher` in the canonical order
/// named by spec.md §4.8 "World hash order": declared arena order, then
/// arena-index order, feeding `(id, flags, primary ratios and
/// accumulators)` per entity.
fn hash_conflict(domain: &ConflictDomain, hasher: &mut H64) {
    for r in domain.records().iter() {
        hasher
            .update_u32(r.id)
            .update_u32(r.flags)
            .update_u8(r.status as u8);
    }
    for r in domain.sides().iter() {
        hasher
            .update_u32(r.id)
            .update_u32(r.flags)
            .update_i32(r.readiness.raw());
    }
    for r in domain.events().iter() {
        hasher
            .update_u32(r.id)
            .update_u32(r.flags)
            .update_u64(r.scheduled_tick)
            .update_u32(r.order_key)
            .update_u8(r.event_type as u8);
    }
    for r in domain.forces().iter() {
        hasher
            .update_u32(r.id)
            .update_u32(r.flags)
            .update_i32(r.morale.raw())
            .update_i32(r.readiness.raw());
    }
    for r in domain.engagements().iter() {
        hasher
            .update_u32(r.id)
            .update_u32(r.flags)
            .update_i32(r.intensity.raw());
    }
    for r in domain.outcomes().iter() {
        hasher
            .update_u32(r.id)
            .update_u32(r.flags)
            .update_u64(r.resolution_tick);
    }
    for r in domain.occupations().iter() {
        hasher
            .update_u32(r.id)
            .update_u32(r.flags)
            .update_i32(r.legitimacy_support.raw())
            .update_u8(r.status as u8);
    }
    for r in domain.resistances().iter() {
        hasher
            .update_u32(r.id)
            .update_u32(r.flags)
            .update_u64(r.resolution_tick);
    }
    for r in domain.morale_fields().iter() {
        hasher
            .update_u32(r.id)
            .update_u32(r.flags)
            .update_i32(r.decay_rate.raw())
            .update_i32(r.morale_level.raw());
    }
    for r in domain.weapons().iter() {
        hasher
            .update_u32(r.id)
            .update_u32(r.flags)
            .update_i32(r.integrity.raw());
    }
}

/// See [`hash_conflict`]; the economy domain's counterpart.
fn hash_economy(domain: &EconomyDomain, hasher: &mut H64) {
    for r in domain.containers().iter() {
        hasher
            .update_u32(r.id)
            .update_u32(r.flags)
            .update_i64(r.capacity.raw());
    }
    for r in domain.storages().iter() {
        hasher
            .update_u32(r.id)
            .update_u32(r.flags)
            .update_i64(r.capacity.raw())
            .update_i64(r.stored.raw());
    }
    for r in domain.transports().iter() {
        hasher
            .update_u32(r.id)
            .update_u32(r.flags)
            .update_u64(r.arrival_tick);
    }
    for r in domain.jobs().iter() {
        hasher
            .update_u32(r.id)
            .update_u32(r.flags)
            .update_u64(r.completion_tick);
    }
    for r in domain.markets().iter() {
        hasher
            .update_u32(r.id)
            .update_u32(r.flags)
            .update_i32(r.price_average.raw())
            .update_i32(r.risk_modifier.raw());
    }
    for r in domain.offers().iter() {
        hasher
            .update_u32(r.id)
            .update_u32(r.flags)
            .update_i32(r.price.raw())
            .update_u64(r.expiry_tick);
    }
    for r in domain.bids().iter() {
        hasher
            .update_u32(r.id)
            .update_u32(r.flags)
            .update_i32(r.price.raw())
            .update_u64(r.expiry_tick);
    }
    for r in domain.transactions().iter() {
        hasher
            .update_u32(r.id)
            .update_u32(r.flags)
            .update_i64(r.amount.raw());
    }
}

/// Recomputes the canonical world hash over `conflict` then `economy`, in
/// that declared domain order (spec.md §4.8 "World hash order").
#[must_use]
pub fn world_hash(conflict: &ConflictDomain, economy: &EconomyDomain) -> u64 {
    let mut hasher = H64::new();
    hash_conflict(conflict, &mut hasher);
    hash_economy(economy, &mut hasher);
    hasher.finish()
}

/// The outcome of one `Runtime::tick` call.
#[derive(Debug, Clone)]
pub struct TickReport {
    /// The tick this report covers (the value `tick` held before this
    /// call incremented it).
    pub tick: Tick,
    /// The world hash after this tick's resolve passes.
    pub world_hash: u64,
    /// Commands successfully validated and dispatched this tick.
    pub commands_dispatched: u32,
    /// Commands dropped this tick for failing schema/authority validation.
    pub commands_rejected: u32,
    /// Per-region conflict resolve results, in ascending `region_id` order.
    pub conflict_results: Vec<ConflictResolveResult>,
    /// Per-region economy resolve results, in ascending `region_id` order.
    pub economy_results: Vec<EconomyResolveResult>,
}

/// The runtime kernel: one conflict domain, one economy domain, a command
/// inbox, and the monotonic tick counter (spec.md §4.8 "Responsibilities").
#[derive(Debug)]
pub struct Runtime {
    tick: Tick,
    authority_mode: AuthorityMode,
    registry: SchemaRegistry,
    inbox: Vec<Command>,
    next_sequence: u64,
    total_commands_rejected: u64,
    conflict: ConflictDomain,
    economy: EconomyDomain,
}

impl Runtime {
    /// Builds a runtime starting at tick `0` over the given domains, which
    /// must already be `init`-ed by the caller.
    #[must_use]
    pub fn new(conflict: ConflictDomain, economy: EconomyDomain, authority_mode: AuthorityMode) -> Self {
        Self {
            tick: 0,
            authority_mode,
            registry: SchemaRegistry::new(),
            inbox: Vec::new(),
            next_sequence: 0,
            total_commands_rejected: 0,
            conflict,
            economy,
        }
    }

    /// The current tick counter.
    #[must_use]
    pub const fn current_tick(&self) -> Tick {
        self.tick
    }

    /// Rebuilds a runtime already-advanced to `tick`, for
    /// [`crate::save::load_state`]. The domains must already hold the
    /// restored arena/capsule contents for that tick.
    #[must_use]
    pub fn restore(
        conflict: ConflictDomain,
        economy: EconomyDomain,
        authority_mode: AuthorityMode,
        tick: Tick,
    ) -> Self {
        Self {
            tick,
            ..Self::new(conflict, economy, authority_mode)
        }
    }

    /// Read-only access to the conflict domain.
    #[must_use]
    pub const fn conflict(&self) -> &ConflictDomain {
        &self.conflict
    }

    /// Mutable access to the conflict domain, for fixture loading.
    pub fn conflict_mut(&mut self) -> &mut ConflictDomain {
        &mut self.conflict
    }

    /// Read-only access to the economy domain.
    #[must_use]
    pub const fn economy(&self) -> &EconomyDomain {
        &self.economy
    }

    /// Mutable access to the economy domain, for fixture loading.
    pub fn economy_mut(&mut self) -> &mut EconomyDomain {
        &mut self.economy
    }

    /// The configured authority mode.
    #[must_use]
    pub const fn authority_mode(&self) -> AuthorityMode {
        self.authority_mode
    }

    /// Total commands rejected over this runtime's lifetime.
    #[must_use]
    pub const fn total_commands_rejected(&self) -> u64 {
        self.total_commands_rejected
    }

    /// Registers a schema at its canonical version.
    pub fn register_schema(&mut self, schema_id: u32, schema_version: u16) {
        self.registry.register(schema_id, schema_version);
    }

    /// Queues `command` for dispatch once `tick` reaches its
    /// `scheduled_tick`, assigning its submission sequence. Validation
    /// happens at drain time (spec.md §4.8 step 1), not here.
    pub fn submit(&mut self, mut command: Command) {
        command.sequence = self.next_sequence;
        self.next_sequence += 1;
        self.inbox.push(command);
    }

    /// Runs one tick: drains due commands, resolves every active region of
    /// each domain in declared order, recomputes the world hash, then
    /// advances `tick` (spec.md §4.8 "Tick algorithm"). A collapsed region
    /// is still resolved: `resolve()` itself short-circuits to the
    /// capsule-derived result (spec.md §4.7), so this loop never needs to
    /// know which regions are collapsed.
    pub fn tick(&mut self, budget_per_resolve: u32) -> TickReport {
        let covered_tick = self.tick;
        tracing::debug!(tick = covered_tick, "tick start");

        let (dispatched, rejected) = self.drain_due_commands();

        let mut conflict_results = Vec::new();
        if self.conflict.is_active() {
            for region_id in self.conflict.region_ids() {
                let mut budget = Budget::new(budget_per_resolve);
                conflict_results.push(self.conflict.resolve(region_id, covered_tick, 1, &mut budget));
            }
        }

        let mut economy_results = Vec::new();
        if self.economy.is_active() {
            for region_id in self.economy.region_ids() {
                let mut budget = Budget::new(budget_per_resolve);
                economy_results.push(self.economy.resolve(region_id, covered_tick, 1, &mut budget));
            }
        }

        let hash = world_hash(&self.conflict, &self.economy);
        self.tick += 1;
        tracing::debug!(tick = covered_tick, world_hash = hash, "tick complete");

        TickReport {
            tick: covered_tick,
            world_hash: hash,
            commands_dispatched: dispatched,
            commands_rejected: rejected,
            conflict_results,
            economy_results,
        }
    }

    /// Drains and validates every inbox command whose `scheduled_tick` is
    /// at or before the current tick, in `(scheduled_tick, source_peer,
    /// sequence)` order. Returns `(dispatched, rejected)` counts.
    fn drain_due_commands(&mut self) -> (u32, u32) {
        self.inbox.sort_by_key(Command::order_key);
        let current_tick = self.tick;
        let split = self
            .inbox
            .iter()
            .position(|c| c.scheduled_tick > current_tick)
            .unwrap_or(self.inbox.len());
        let due: Vec<Command> = self.inbox.drain(..split).collect();

        let mut dispatched = 0_u32;
        let mut rejected = 0_u32;
        for command in due {
            match self.registry.validate(&command, self.authority_mode) {
                Ok(()) => dispatched += 1,
                Err(error) => {
                    rejected += 1;
                    self.total_commands_rejected += 1;
                    log_command_error(&command, &error);
                }
            }
        }
        (dispatched, rejected)
    }

    /// `true` iff `region_id` is collapsed in either domain (a helper for
    /// callers that don't care which domain owns it).
    #[must_use]
    pub fn is_region_collapsed_anywhere(&self, region_id: RegionId) -> bool {
        self.conflict.is_region_collapsed(region_id) || self.economy.is_region_collapsed(region_id)
    }
}

fn log_command_error(command: &Command, error: &CommandError) {
    tracing::debug!(
        schema_id = command.schema_id,
        source_peer = command.source_peer,
        error = %error,
        "command rejected"
    );
}

#[cfg(test)]
mod tests {
    use super::*;
    use dominium_kernel::conflict::{ConflictCapacities, Side};
    use dominium_kernel::economy::EconomyCapacities;
    use dominium_fixed::Q16_16;

    fn empty_conflict() -> ConflictDomain {
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
        domain
    }

    fn empty_economy() -> EconomyDomain {
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

    #[test]
    fn two_independent_runtimes_produce_identical_hashes_every_tick() {
        let mut a = Runtime::new(empty_conflict(), empty_economy(), AuthorityMode::Single);
        let mut b = Runtime::new(empty_conflict(), empty_economy(), AuthorityMode::Single);
        a.conflict_mut().sides_mut().init_entry(Side {
            id: 1,
            region_id: 1,
            readiness: Q16_16::from_raw(0x8000),
            ..Default::default()
        });
        b.conflict_mut().sides_mut().init_entry(Side {
            id: 1,
            region_id: 1,
            readiness: Q16_16::from_raw(0x8000),
            ..Default::default()
        });

        for _ in 0..5 {
            let report_a = a.tick(1000);
            let report_b = b.tick(1000);
            assert_eq!(report_a.world_hash, report_b.world_hash);
            assert_eq!(report_a.tick, report_b.tick);
        }
    }

    #[test]
    fn empty_domains_hash_to_the_empty_h64_digest() {
        let conflict = empty_conflict();
        let economy = empty_economy();
        assert_eq!(world_hash(&conflict, &economy), H64::new().finish());
    }

    #[test]
    fn tick_still_resolves_a_collapsed_region_via_its_capsule() {
        let mut runtime = Runtime::new(empty_conflict(), empty_economy(), AuthorityMode::Single);
        runtime.conflict_mut().sides_mut().init_entry(Side {
            id: 1,
            region_id: 9,
            ..Default::default()
        });
        runtime.conflict_mut().collapse_region(9).expect("collapse");
        let report = runtime.tick(1000);
        assert_eq!(report.conflict_results.len(), 1, "capsule still resolves once");
        assert!(report.conflict_results[0].flags & dominium_kernel::flags::PARTIAL != 0);
    }

    #[test]
    fn rejected_command_is_counted_not_panicked() {
        let mut runtime = Runtime::new(empty_conflict(), empty_economy(), AuthorityMode::Single);
        runtime.submit(Command {
            scheduled_tick: 0,
            schema_id: 999,
            schema_version: 1,
            payload: Vec::new(),
            source_peer: 0,
            sequence: 0,
        });
        let report = runtime.tick(1000);
        assert_eq!(report.commands_rejected, 1);
        assert_eq!(report.commands_dispatched, 0);
        assert_eq!(runtime.total_commands_rejected(), 1);
    }
}
