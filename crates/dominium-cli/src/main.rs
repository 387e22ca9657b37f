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
    clippy::dbg_macro
)]
#![allow(
    clippy::must_use_candidate,
    clippy::return_self_not_must_use,
    clippy::unreadable_literal,
    clippy::missing_const_for_fn,
    clippy::redundant_pub_crate,
    clippy::module_name_repetitions,
    clippy::use_self,
    clippy::doc_markdown,
    clippy::too_many_lines,
    clippy::missing_errors_doc,
    clippy::missing_panics_doc,
    clippy::similar_names,
    clippy::multiple_crate_versions
)]
// The CLI is expected to print to stdout/stderr.
#![allow(clippy::print_stdout, clippy::print_stderr)]
//! `dominium`: validate, inspect, resolve, and collapse conflict/economy
//! fixtures, and replay a recorded command stream against a fresh runtime
//! (spec.md §6 "External interfaces", expanded in `SPEC_FULL.md` §6).
//!
//! Exit codes: `0` success, `1` a resolve pass or replay reported a
//! semantic failure (`ok == false`, or a desync was detected), `2` a
//! usage error (bad fixture, bad argument, or a kernel invariant
//! violation).

mod cli;
mod conflict_cmd;
mod economy_cmd;
mod error;
mod fixture_io;
mod output;
mod replay;

use std::process::ExitCode;

use clap::Parser;

use cli::{Action, Cli, DomainArgs, TopCommand};
use error::{CliError, USAGE_ERROR_EXIT_CODE};

fn main() -> ExitCode {
    tracing_subscriber::fmt().with_target(false).without_time().init();

    let cli = Cli::parse();
    match dispatch(&cli) {
        Ok(true) => ExitCode::SUCCESS,
        Ok(false) => ExitCode::from(1),
        Err(error) => {
            eprintln!("error: {error}");
            ExitCode::from(USAGE_ERROR_EXIT_CODE)
        }
    }
}

fn dispatch(cli: &Cli) -> Result<bool, CliError> {
    match &cli.command {
        TopCommand::Conflict(domain) => dispatch_conflict(domain),
        TopCommand::Economy(domain) => dispatch_economy(domain),
        TopCommand::Replay(args) => replay::run_replay(args),
    }
}

fn dispatch_conflict(domain: &DomainArgs) -> Result<bool, CliError> {
    match &domain.action {
        Action::Validate(args) => conflict_cmd::run_validate(args),
        Action::Inspect(args) => conflict_cmd::run_inspect(args),
        Action::Resolve(args) => conflict_cmd::run_resolve(args),
        Action::Collapse(args) => conflict_cmd::run_collapse(args),
    }
}

fn dispatch_economy(domain: &DomainArgs) -> Result<bool, CliError> {
    match &domain.action {
        Action::Validate(args) => economy_cmd::run_validate(args),
        Action::Inspect(args) => economy_cmd::run_inspect(args),
        Action::Resolve(args) => economy_cmd::run_resolve(args),
        Action::Collapse(args) => economy_cmd::run_collapse(args),
    }
}
