// SPDX-License-Identifier: Apache-2.0
//! Shared `key=value` printing helpers for `inspect`/`resolve` output.
//!
//! Fixed-point fields print as their raw Q-format integer with a
//! `_q16`/`_q48` suffix rather than a decimal rendering: unlike fixture
//! text, this is a machine-readable trace of the exact value a caller's
//! own Q16.16/Q48.16 type would hold, not an authoring convenience.

use dominium_kernel::budget::RefusalReason;
use dominium_kernel::meta::QueryMeta;

/// Prints the common identifying + meta fields shared by every `inspect`
/// query, regardless of entity kind.
pub fn print_query_meta(meta: &QueryMeta, id: u32, region_id: u32, flags: u32) {
    println!("id={id}");
    println!("region_id={region_id}");
    println!("flags={flags:#x}");
    println!("status={:?}", meta.status);
    println!("resolution={:?}", meta.resolution);
    println!("confidence={:?}", meta.confidence);
    println!("refusal_reason={:?}", meta.refusal_reason);
    println!("cost_units={}", meta.cost_units);
    println!("budget_used={}", meta.budget_used);
    println!("budget_max={}", meta.budget_max);
}

/// Prints the common meta fields shared by every `resolve` result.
pub fn print_resolve_meta(refusal_reason: RefusalReason, budget_used: u32, budget_max: u32) {
    println!("refusal_reason={refusal_reason:?}");
    println!("budget_used={budget_used}");
    println!("budget_max={budget_max}");
}
