// SPDX-License-Identifier: Apache-2.0
//! Deterministic hashing and RNG cursors for the Dominium simulation kernel.
//!
//! - [`h32`] — word-stable 32-bit FNV-style hash of symbolic names, used to
//!   turn fixture-authored strings into stable 32-bit entity/region ids.
//! - [`H64`] — a 64-bit rolling FNV-1a hash over a canonical byte stream,
//!   used to compute the world hash.
//! - [`RngCursor`] — a per-entity deterministic pseudo-random cursor used to
//!   draw reproducible samples from a collapsed region's capsule
//!   histograms.
#![forbid(unsafe_code)]
#![deny(missing_docs, rust_2018_idioms, unused_must_use)]
#![deny(
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
    clippy::module_name_repetitions
)]

mod h32;
mod h64;
mod rng;

pub use h32::h32;
pub use h64::H64;
pub use rng::RngCursor;
