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
//! The runtime kernel: a fixed-step tick loop that owns a conflict domain
//! and an economy domain, drives command ingestion under an authority
//! policy, recomputes the canonical world hash every tick, and exposes
//! save/restore and desync-detection as ambient, non-authoritative
//! concerns (spec.md §4.8, expanded in `SPEC_FULL.md` §4.8A-C).
//!
//! Nothing in this crate runs on a hot per-element loop the way
//! `dominium_kernel::conflict`/`economy`'s `resolve` do; it is the layer
//! that calls `resolve` in a stable order and is allowed to allocate,
//! touch the filesystem (save/restore), and log at `info!`/`debug!` on
//! lifecycle boundaries.

pub mod codec;
pub mod command;
pub mod desync;
pub mod paths;
pub mod save;
pub mod snapshot;
pub mod world;

pub use command::{AuthorityMode, Command, CommandError, SchemaRegistry};
pub use desync::{DesyncBundle, DesyncDetector};
pub use paths::{PathsError, RunPaths};
pub use save::{load_state, save_state, RestoreCapacities, SaveError};
pub use snapshot::Snapshot;
pub use world::{world_hash, Runtime, TickReport};
