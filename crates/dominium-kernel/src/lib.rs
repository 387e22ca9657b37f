// SPDX-License-Identifier: Apache-2.0
#![forbid(unsafe_code)]
#![deny(
    missing_docs,
    clippy::all,
    clippy::pedantic,
    clippy::nursery,
    clippy::cargo,
    clippy::unwrap_used,
    clippy::expect_used,
    clippy::panic,
    clippy::todo,
    clippy::unimplemented,
    clippy::dbg_macro,
    clippy::print_stdout,
    clippy::print_stderr
)]
#![allow(
    clippy::must_use_candidate,
    clippy::return_self_not_must_use,
    clippy::unreadable_literal,
    clippy::missing_const_for_fn,
    clippy::redundant_pub_crate,
    clippy::many_single_char_names,
    clippy::module_name_repetitions,
    clippy::use_self,
    clippy::doc_markdown,
    clippy::too_many_lines,
    clippy::missing_errors_doc,
    clippy::missing_panics_doc,
    clippy::similar_names,
    clippy::multiple_crate_versions
)]
//! The domain field kernel: bounded-cost queries, deterministic per-tick
//! resolve, and collapse/expand capsules for the conflict and economy
//! domains (spec.md §3–§4.7).
//!
//! This crate never allocates on `resolve`'s per-element fast path beyond
//! the fixed-capacity arenas themselves, never touches the wall clock, and
//! never performs floating-point arithmetic — determinism is the entire
//! point. The one API surface that is expected to be `Err` under normal
//! operation is [`error::KernelError`]; everything else expected under
//! normal operation (budget exhaustion, missing entities, inactive
//! domains) is a tagged, non-`Err` refusal carried in a sample's `meta`
//! block.

pub mod arena;
pub mod budget;
pub mod capsule;
pub mod conflict;
pub mod economy;
pub mod error;
pub mod existence;
pub mod flags;
pub mod ids;
pub mod meta;
pub mod sample;

pub use arena::{Arena, Entity};
pub use budget::{Budget, CostTier, MissingKind, Policy, RefusalReason};
pub use capsule::{CapsuleTable, Histogram4, HISTOGRAM_BINS};
pub use error::KernelError;
pub use existence::{ArchivalState, DomainKind, ExistenceState};
pub use ids::{EntityId, RegionId, Tick};
pub use meta::{Confidence, QueryMeta, Resolution, Status};
pub use sample::Sample;
