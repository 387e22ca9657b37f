// SPDX-License-Identifier: Apache-2.0
//! Argument grammar (spec.md §6 "CLI surface": `validate | inspect |
//! resolve | collapse` subcommands, one binary per invocation, plus the
//! `replay` subcommand `SPEC_FULL.md` §6 adds to ground the tick/command
//! replay contract in an invokable surface).

use std::path::PathBuf;

use clap::{Args, Parser, Subcommand};

#[derive(Parser, Debug)]
#[command(name = "dominium", author, version, about, long_about = None)]
pub struct Cli {
    /// Which domain (or the cross-domain replay driver) to operate on.
    #[command(subcommand)]
    pub command: TopCommand,
}

#[derive(Subcommand, Debug)]
pub enum TopCommand {
    /// Operate on a conflict-domain fixture.
    Conflict(DomainArgs),
    /// Operate on an economy-domain fixture.
    Economy(DomainArgs),
    /// Drive a recorded command stream against a fresh runtime.
    Replay(ReplayArgs),
}

#[derive(Args, Debug)]
pub struct DomainArgs {
    #[command(subcommand)]
    pub action: Action,
}

#[derive(Subcommand, Debug)]
pub enum Action {
    /// Parse a fixture and report per-kind entity counts.
    Validate(FixtureArgs),
    /// Query a single entity by kind and id.
    Inspect(InspectArgs),
    /// Run one resolve pass over a region (or every region, with `--region 0`).
    Resolve(ResolveArgs),
    /// Collapse a region into its capsule.
    Collapse(RegionArgs),
}

#[derive(Args, Debug)]
pub struct FixtureArgs {
    /// Path to the fixture text file.
    #[arg(long)]
    pub fixture: PathBuf,
}

#[derive(Args, Debug)]
pub struct InspectArgs {
    /// Path to the fixture text file.
    #[arg(long)]
    pub fixture: PathBuf,
    /// Entity kind to query (e.g. `side`, `force`, `market`).
    #[arg(long)]
    pub kind: String,
    /// Entity id: a literal integer, or a symbolic name hashed the same
    /// way the fixture format hashes `id=`/`*_id=` values.
    #[arg(long)]
    pub id: String,
    /// Total budget units available for this one query.
    #[arg(long, default_value_t = DEFAULT_BUDGET)]
    pub budget: u32,
}

#[derive(Args, Debug)]
pub struct ResolveArgs {
    /// Path to the fixture text file.
    #[arg(long)]
    pub fixture: PathBuf,
    /// Region to resolve, or `0` for every region.
    #[arg(long)]
    pub region: u32,
    /// The tick this resolve pass covers.
    #[arg(long, default_value_t = 0)]
    pub tick: u64,
    /// Ticks elapsed since the previous resolve pass.
    #[arg(long, default_value_t = 1)]
    pub delta: u64,
    /// Total budget units available for this resolve pass.
    #[arg(long, default_value_t = DEFAULT_BUDGET)]
    pub budget: u32,
}

#[derive(Args, Debug)]
pub struct RegionArgs {
    /// Path to the fixture text file.
    #[arg(long)]
    pub fixture: PathBuf,
    /// The region to collapse. Must be nonzero.
    #[arg(long)]
    pub region: u32,
}

#[derive(Args, Debug)]
pub struct ReplayArgs {
    /// Path to the conflict-domain fixture the replay starts from.
    #[arg(long)]
    pub conflict_fixture: PathBuf,
    /// Path to the economy-domain fixture the replay starts from.
    #[arg(long)]
    pub economy_fixture: PathBuf,
    /// Path to the replay file (spec.md §6 "Tick/command replay file").
    #[arg(long)]
    pub replay_file: PathBuf,
    /// Total budget units available per region per resolve pass.
    #[arg(long, default_value_t = DEFAULT_BUDGET)]
    pub budget: u32,
    /// Write a `desync_bundle_<tick>.tlv` to this directory on the first
    /// tick whose recomputed hash disagrees with the replay file's
    /// recorded hash for that tick, if the replay file carries one.
    #[arg(long)]
    pub desync_out: Option<PathBuf>,
}

/// Generous enough that no realistic fixture exhausts it by accident; a
/// caller exploring budget refusals passes a smaller `--budget` explicitly.
const DEFAULT_BUDGET: u32 = 1_000_000;
