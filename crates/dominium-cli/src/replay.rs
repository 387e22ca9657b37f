// SPDX-License-Identifier: Apache-2.0
//! The replay-file format and the `replay` subcommand's drive loop.
//!
//! Replay-file framing is explicitly left to a concrete consumer (spec.md
//! §1: "replay file format details beyond the tick/command contract" are
//! out of the kernel/runtime's scope), so it's designed here, reusing
//! `codec::{Writer, Reader}` and `save.rs`'s magic-plus-version convention
//! rather than inventing a new one.

use std::collections::HashMap;
use std::path::Path;

use dominium_runtime::codec::{Reader, Writer};
use dominium_runtime::command::{AuthorityMode, Command};
use dominium_runtime::desync::{DesyncBundle, DesyncDetector};
use dominium_runtime::world::Runtime;

use crate::cli::ReplayArgs;
use crate::conflict_cmd::CAPACITIES as CONFLICT_CAPACITIES;
use crate::economy_cmd::CAPACITIES as ECONOMY_CAPACITIES;
use crate::error::{CliError, ReplayError};
use crate::fixture_io::{read_to_string, read_to_vec};

const REPLAY_MAGIC: u32 = 0x444F_4D50; // "DOMP"
const REPLAY_FORMAT_VERSION: u16 = 1;
const DESYNC_MAGIC: u32 = 0x4453_594E; // "DSYN"
const DESYNC_FORMAT_VERSION: u16 = 1;

/// The window of recently-submitted commands a [`DesyncDetector`] keeps
/// for inclusion in a bundle.
const DESYNC_WINDOW: usize = 32;

/// One scheduled command, plus the peer-reported world hash for its tick
/// if the file carries one (this is what lets a single-process replay
/// driver still exercise the desync path).
struct ReplayRecord {
    command: Command,
    peer_hash: Option<u64>,
}

struct ReplayHeader {
    #[allow(dead_code)]
    ups: u32,
    run_id: u64,
    instance_id: u64,
}

fn parse_replay_file(bytes: &[u8]) -> Result<(ReplayHeader, Vec<ReplayRecord>), ReplayError> {
    let mut r = Reader::new(bytes);
    let magic = r.read_u32()?;
    if magic != REPLAY_MAGIC {
        return Err(ReplayError::BadMagic {
            expected_magic: REPLAY_MAGIC,
            got_magic: magic,
        });
    }
    let version = r.read_u16()?;
    if version != REPLAY_FORMAT_VERSION {
        return Err(ReplayError::UnsupportedVersion(version));
    }
    let ups = r.read_u32()?;
    let run_id = r.read_u64()?;
    let instance_id = r.read_u64()?;
    let record_count = r.read_u32()?;

    let mut records = Vec::with_capacity(record_count as usize);
    for _ in 0..record_count {
        let scheduled_tick = r.read_u64()?;
        let schema_id = r.read_u32()?;
        let schema_version = r.read_u16()?;
        let source_peer = r.read_u32()?;
        let payload = r.read_bytes()?.to_vec();
        let has_peer_hash = r.read_u8()? != 0;
        let peer_hash = if has_peer_hash { Some(r.read_u64()?) } else { None };
        records.push(ReplayRecord {
            command: Command {
                scheduled_tick,
                schema_id,
                schema_version,
                payload,
                source_peer,
                sequence: 0,
            },
            peer_hash,
        });
    }

    Ok((ReplayHeader { ups, run_id, instance_id }, records))
}

fn write_desync_bundle(bundle: &DesyncBundle) -> Vec<u8> {
    let mut w = Writer::new();
    w.write_u32(DESYNC_MAGIC);
    w.write_u16(DESYNC_FORMAT_VERSION);
    w.write_u64(bundle.tick);
    w.write_u64(bundle.local_hash);
    w.write_u64(bundle.peer_hash);
    w.write_u32(u32::try_from(bundle.recent_commands.len()).unwrap_or(u32::MAX));
    for command in &bundle.recent_commands {
        w.write_u64(command.scheduled_tick);
        w.write_u32(command.schema_id);
        w.write_u16(command.schema_version);
        w.write_u32(command.source_peer);
        w.write_u64(command.sequence);
        w.write_bytes(&command.payload);
    }
    w.into_bytes()
}

/// Drives a fresh [`Runtime`] built from the two fixtures over the
/// commands named by `args.replay_file`, printing one `key=value` block
/// per tick plus a final summary. Returns `true` unless a peer-reported
/// hash in the replay file ever diverged from the locally recomputed one.
pub fn run_replay(args: &ReplayArgs) -> Result<bool, CliError> {
    let conflict_text = read_to_string(&args.conflict_fixture)?;
    let conflict = dominium_fixture::parse_conflict_fixture(&conflict_text, CONFLICT_CAPACITIES)?;
    let economy_text = read_to_string(&args.economy_fixture)?;
    let economy = dominium_fixture::parse_economy_fixture(&economy_text, ECONOMY_CAPACITIES)?;

    let replay_bytes = read_to_vec(&args.replay_file)?;
    let (header, records) = parse_replay_file(&replay_bytes).map_err(CliError::from)?;

    let mut runtime = Runtime::new(conflict, economy, AuthorityMode::Single);

    let mut canonical_versions: HashMap<u32, u16> = HashMap::new();
    for record in &records {
        canonical_versions
            .entry(record.command.schema_id)
            .and_modify(|v| *v = (*v).max(record.command.schema_version))
            .or_insert(record.command.schema_version);
    }
    for (schema_id, schema_version) in canonical_versions {
        runtime.register_schema(schema_id, schema_version);
    }

    let mut peer_hashes_by_tick: HashMap<u64, u64> = HashMap::new();
    let total_ticks = records.iter().map(|r| r.command.scheduled_tick).max().map_or(0, |t| t + 1);

    let mut detector = DesyncDetector::new(DESYNC_WINDOW);
    for record in records {
        if let Some(peer_hash) = record.peer_hash {
            peer_hashes_by_tick.insert(record.command.scheduled_tick, peer_hash);
        }
        detector.record_dispatched(record.command.clone());
        runtime.submit(record.command);
    }

    println!("DOMINIUM_REPLAY_V1");
    println!("run_id={}", header.run_id);
    println!("instance_id={}", header.instance_id);

    let mut diverged = false;
    for _ in 0..total_ticks {
        let report = runtime.tick(args.budget);
        println!(
            "tick={} world_hash={:#018x} dispatched={} rejected={}",
            report.tick, report.world_hash, report.commands_dispatched, report.commands_rejected
        );

        if let Some(&peer_hash) = peer_hashes_by_tick.get(&report.tick) {
            if let Some(bundle) = detector.observe(report.tick, report.world_hash, peer_hash) {
                diverged = true;
                println!(
                    "desync_tick={} local_hash={:#018x} peer_hash={:#018x}",
                    bundle.tick, bundle.local_hash, bundle.peer_hash
                );
                if let Some(dir) = &args.desync_out {
                    write_bundle_to_disk(dir, &bundle)?;
                }
            }
        }
    }

    println!("final_tick={}", runtime.current_tick());
    println!("total_commands_rejected={}", runtime.total_commands_rejected());
    println!("diverged={diverged}");

    Ok(!diverged)
}

fn write_bundle_to_disk(dir: &Path, bundle: &DesyncBundle) -> Result<(), CliError> {
    let path = dir.join(format!("desync_bundle_{}.tlv", bundle.tick));
    std::fs::write(&path, write_desync_bundle(bundle)).map_err(|source| CliError::io(path, source))
}
