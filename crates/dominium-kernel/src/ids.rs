// SPDX-License-Identifier: Apache-2.0
//! Stable identifiers used throughout the domain field kernel.
//!
//! Entities never reference each other by index or pointer; every
//! cross-reference is a plain stable 32-bit id, resolved through a linear
//! scan at the point of use (see [`crate::arena::Arena::find_index_by_id`]).

/// Stable 32-bit entity identifier. Identity is the id, never the arena
/// index: indices shift when entities truncate or swap-remove, ids do not.
pub type EntityId = u32;

/// Logical partition identifier. `0` is reserved to mean "no region" /
/// "all regions" depending on context (see the resolve engine's `region_id
/// == 0` convention).
pub type RegionId = u32;

/// Simulated-time tick counter. Monotonically increasing.
pub type Tick = u64;
