// SPDX-License-Identifier: Apache-2.0
//! Internal errors for the domain field kernel.
//!
//! These are distinct from the refusal taxonomy ([`crate::budget::RefusalReason`]):
//! a refusal is an expected, non-mutating outcome reported through a
//! sample's `meta`, whereas a [`KernelError`] signals an invariant
//! violation that the test suite must never trigger in practice.

use thiserror::Error;

use crate::ids::RegionId;

/// Invariant violations surfaced by domain lifecycle operations.
#[derive(Debug, Error, Clone, Copy, PartialEq, Eq)]
pub enum KernelError {
    /// `collapse_region` was called with `region_id == 0`, which is
    /// reserved to mean "all regions" and can never itself be collapsed.
    #[error("region_id 0 cannot be collapsed")]
    ZeroRegionCollapse,
    /// The capsule table has no free slot for a new region capsule.
    #[error("capsule table full, cannot collapse region {0}")]
    CapsuleTableFull(RegionId),
    /// `expand_region` was called for a region with no stored capsule.
    #[error("no capsule stored for region {0}")]
    NoCapsuleForRegion(RegionId),
}
