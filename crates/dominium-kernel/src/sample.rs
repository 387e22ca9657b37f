// SPDX-License-Identifier: Apache-2.0
//! The generic single-entity query sample (spec.md §4.5).

use crate::arena::{Arena, Entity};
use crate::budget::{Budget, CostTier, MissingKind, Policy, RefusalReason};
use crate::meta::QueryMeta;

/// The result of a single-entity read: identifying fields, the (possibly
/// zeroed) entity payload, and the `meta` block.
///
/// This models query outputs as a tagged result carrying the sample and
/// meta together (spec.md §9, "coroutine/control-flow rewrite"), rather
/// than zeroing an out-parameter on refusal: `query` never returns `Err`
/// for an expected refusal, only `Ok(Sample { meta: .. refused .., .. })`.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Sample<T> {
    /// The id that was queried (preserved even on refusal).
    pub id: u32,
    /// The entity's region, or `0` if the entity could not be identified.
    pub region_id: u32,
    /// Flags observed on the entity (or just [`crate::flags::COLLAPSED`] /
    /// nothing on a refused or collapsed-region read).
    pub flags: u32,
    /// The entity's observable fields, or `T::default()` when refused or
    /// when the region is collapsed.
    pub entity: T,
    /// The metadata block (spec.md §3.5).
    pub meta: QueryMeta,
}

/// Runs the uniform single-entity read skeleton (spec.md §4.5, steps 1-6).
#[allow(clippy::too_many_arguments)]
pub fn query_single<T>(
    is_active: bool,
    arena: &Arena<T>,
    region_is_collapsed: impl Fn(u32) -> bool,
    id: u32,
    policy: &Policy,
    tier: CostTier,
    budget: &mut Budget,
    missing: MissingKind,
) -> Sample<T>
where
    T: Entity + Clone + Default,
{
    // Step 1: zero the sample, identifying field is the queried id.
    if !is_active {
        // Step 2: domain inactive.
        return Sample {
            id,
            region_id: 0,
            flags: crate::flags::UNRESOLVED,
            entity: T::default(),
            meta: QueryMeta::refused(RefusalReason::DomainInactive, *budget),
        };
    }

    // Step 3: choose and consume the cost tier.
    let cost = policy.tier_cost(tier);
    if !budget.consume(cost) {
        return Sample {
            id,
            region_id: 0,
            flags: crate::flags::UNRESOLVED,
            entity: T::default(),
            meta: QueryMeta::refused(RefusalReason::Budget, *budget),
        };
    }

    // Step 4: find the entity.
    let Some(index) = arena.find_index_by_id(id) else {
        return Sample {
            id,
            region_id: 0,
            flags: crate::flags::UNRESOLVED,
            entity: T::default(),
            meta: QueryMeta::refused(RefusalReason::Missing(missing), *budget),
        };
    };
    let Some(found) = arena.get(index) else {
        return Sample {
            id,
            region_id: 0,
            flags: crate::flags::UNRESOLVED,
            entity: T::default(),
            meta: QueryMeta::refused(RefusalReason::Internal, *budget),
        };
    };

    // Step 5: collapsed-region read returns identifying fields only.
    if region_is_collapsed(found.region_id()) {
        return Sample {
            id: found.id(),
            region_id: found.region_id(),
            flags: found.flags() | crate::flags::COLLAPSED,
            entity: T::default(),
            meta: QueryMeta::ok_unknown(cost, *budget),
        };
    }

    // Step 6: fully-resolved read copies every observable field.
    Sample {
        id: found.id(),
        region_id: found.region_id(),
        flags: found.flags(),
        entity: found.clone(),
        meta: QueryMeta::ok_exact(cost, *budget),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
    struct Dummy {
        id: u32,
        region_id: u32,
        flags: u32,
        value: i32,
    }

    impl Entity for Dummy {
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

    fn policy() -> Policy {
        Policy {
            cost_full: 1,
            cost_medium: 1,
            cost_coarse: 1,
            cost_analytic: 1,
        }
    }

    #[test]
    fn refused_when_inactive_and_budget_untouched() {
        let arena: Arena<Dummy> = Arena::with_capacity(4);
        let mut budget = Budget::new(10);
        let sample = query_single(
            false,
            &arena,
            |_| false,
            1,
            &policy(),
            CostTier::Full,
            &mut budget,
            MissingKind::Record,
        );
        assert_eq!(sample.meta.refusal_reason, RefusalReason::DomainInactive);
        assert_eq!(budget.used(), 0);
    }

    #[test]
    fn missing_entity_is_refused() {
        let arena: Arena<Dummy> = Arena::with_capacity(4);
        let mut budget = Budget::new(10);
        let sample = query_single(
            true,
            &arena,
            |_| false,
            7,
            &policy(),
            CostTier::Full,
            &mut budget,
            MissingKind::Record,
        );
        assert_eq!(
            sample.meta.refusal_reason,
            RefusalReason::Missing(MissingKind::Record)
        );
        assert_eq!(sample.id, 7);
    }

    #[test]
    fn collapsed_region_returns_identifying_fields_only() {
        let mut arena: Arena<Dummy> = Arena::with_capacity(4);
        arena.init_entry(Dummy {
            id: 1,
            region_id: 9,
            flags: 0,
            value: 123,
        });
        let mut budget = Budget::new(10);
        let sample = query_single(
            true,
            &arena,
            |r| r == 9,
            1,
            &policy(),
            CostTier::Full,
            &mut budget,
            MissingKind::Record,
        );
        assert!(sample.meta.refusal_reason.is_none());
        assert_eq!(sample.flags & crate::flags::COLLAPSED, crate::flags::COLLAPSED);
        assert_eq!(sample.entity, Dummy::default());
    }

    #[test]
    fn fully_resolved_read_copies_fields() {
        let mut arena: Arena<Dummy> = Arena::with_capacity(4);
        arena.init_entry(Dummy {
            id: 1,
            region_id: 9,
            flags: 0,
            value: 123,
        });
        let mut budget = Budget::new(10);
        let sample = query_single(
            true,
            &arena,
            |_| false,
            1,
            &policy(),
            CostTier::Full,
            &mut budget,
            MissingKind::Record,
        );
        assert!(sample.meta.refusal_reason.is_none());
        assert_eq!(sample.entity.value, 123);
    }

    #[test]
    fn exactly_one_of_refused_or_ok_matching_holds() {
        let mut arena: Arena<Dummy> = Arena::with_capacity(4);
        arena.init_entry(Dummy {
            id: 1,
            region_id: 9,
            flags: 0,
            value: 1,
        });
        let mut budget = Budget::new(10);
        for id in [1_u32, 2_u32] {
            let sample = query_single(
                true,
                &arena,
                |_| false,
                id,
                &policy(),
                CostTier::Full,
                &mut budget,
                MissingKind::Record,
            );
            let refused = sample.meta.status == crate::meta::Status::Refused;
            let ok_matches = sample.meta.status == crate::meta::Status::Ok && sample.id == id;
            assert!(refused ^ ok_matches);
        }
    }
}
