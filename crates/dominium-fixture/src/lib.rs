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
//! Line-based `key=value` fixture text for both domains (spec.md §6):
//! parsing a fixture builds a ready-to-resolve domain directly, and
//! emitting one back out is the canonical form a parse-emit-parse cycle
//! converges to.
//!
//! Unknown keys are a hard parse error, never a silent skip — a typo in a
//! fixture must fail loudly rather than quietly resolve against defaults.

mod conflict;
mod economy;
mod error;
mod line;
mod value;

pub use conflict::{emit_fixture as emit_conflict_fixture, parse_fixture as parse_conflict_fixture, FIXTURE_HEADER as CONFLICT_FIXTURE_HEADER};
pub use economy::{emit_fixture as emit_economy_fixture, parse_fixture as parse_economy_fixture, FIXTURE_HEADER as ECONOMY_FIXTURE_HEADER};
pub use error::FixtureError;
pub use value::parse_ref;
