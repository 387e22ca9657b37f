// SPDX-License-Identifier: Apache-2.0
//! Command ingestion: the `(scheduled_tick, schema_id, schema_version,
//! payload_bytes, source_peer)` contract, the schema registry, and
//! authority-mode gating (spec.md §4.8, `SPEC_FULL.md` §4.8A).

use std::collections::HashMap;

use dominium_kernel::Tick;
use thiserror::Error;

/// One queued command, ordered by `(scheduled_tick ASC, source_peer ASC,
/// sequence ASC)` once in the runtime's inbox (spec.md §4.8 "Command
/// contract").
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Command {
    /// The tick at or after which this command becomes eligible for
    /// dispatch.
    pub scheduled_tick: Tick,
    /// Which schema this command's payload conforms to.
    pub schema_id: u32,
    /// The schema version the sender authored this payload against.
    pub schema_version: u16,
    /// Opaque payload bytes; interpreting them is a game-logic concern
    /// outside this crate's scope.
    pub payload: Vec<u8>,
    /// `0` is the designated single-authority peer; nonzero values are
    /// remote peers under `ServerAuthoritative`/`Lockstep`.
    pub source_peer: u32,
    /// Assigned by the runtime at submission time; breaks ties between
    /// same-tick, same-peer commands in submission order.
    pub sequence: u64,
}

impl Command {
    /// The `(scheduled_tick, source_peer, sequence)` sort key used to
    /// order the inbox.
    #[must_use]
    pub const fn order_key(&self) -> (Tick, u32, u64) {
        (self.scheduled_tick, self.source_peer, self.sequence)
    }
}

/// Which session roles the runtime accepts commands under
/// (`SPEC_FULL.md` §4.8A).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum AuthorityMode {
    /// One process owns the whole simulation; every command is accepted
    /// regardless of `source_peer`.
    #[default]
    Single,
    /// Only `source_peer == 0` (the designated server peer) may submit
    /// commands; all others are rejected.
    ServerAuthoritative,
    /// Every peer may submit, but `schema_id`/`schema_version` must match
    /// the registry exactly — no server-side coercion, since every peer
    /// must compute the same world hash from the same bytes.
    Lockstep,
}

/// Recoverable command-ingestion errors (spec.md §7 "Recoverable command
/// errors"): the runtime drops the command, counts it, and keeps ticking.
#[derive(Debug, Error, Clone, Copy, PartialEq, Eq)]
pub enum CommandError {
    /// `schema_id` has no entry in the registry.
    #[error("unknown schema id {0}")]
    UnknownSchema(u32),
    /// `source_peer` is denied by the configured `AuthorityMode`.
    #[error("source peer {0} denied by authority policy")]
    AuthorityDenied(u32),
    /// Under `Lockstep`, the command's `schema_version` did not exactly
    /// match the registry's canonical version for `schema_id`.
    #[error("schema {schema_id} version mismatch under lockstep: expected {expected}, got {got}")]
    SchemaVersionMismatch {
        /// The schema in question.
        schema_id: u32,
        /// The registry's canonical version.
        expected: u16,
        /// The version the command actually carried.
        got: u16,
    },
}

/// Maps `schema_id -> canonical schema_version`. An unregistered schema id
/// is always an ingestion error, under any authority mode.
#[derive(Debug, Clone, Default)]
pub struct SchemaRegistry {
    versions: HashMap<u32, u16>,
}

impl SchemaRegistry {
    /// An empty registry.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Registers `schema_id` at `schema_version`. A later call for the
    /// same `schema_id` replaces the canonical version (schema upgrade).
    pub fn register(&mut self, schema_id: u32, schema_version: u16) {
        self.versions.insert(schema_id, schema_version);
    }

    /// The canonical version for `schema_id`, if registered.
    #[must_use]
    pub fn canonical_version(&self, schema_id: u32) -> Option<u16> {
        self.versions.get(&schema_id).copied()
    }

    /// Validates `command` against `mode` and this registry
    /// (`SPEC_FULL.md` §4.8A's three gating rules).
    pub fn validate(&self, command: &Command, mode: AuthorityMode) -> Result<(), CommandError> {
        let canonical = self
            .canonical_version(command.schema_id)
            .ok_or(CommandError::UnknownSchema(command.schema_id))?;

        match mode {
            AuthorityMode::Single => Ok(()),
            AuthorityMode::ServerAuthoritative => {
                if command.source_peer == 0 {
                    Ok(())
                } else {
                    Err(CommandError::AuthorityDenied(command.source_peer))
                }
            }
            AuthorityMode::Lockstep => {
                if command.schema_version == canonical {
                    Ok(())
                } else {
                    Err(CommandError::SchemaVersionMismatch {
                        schema_id: command.schema_id,
                        expected: canonical,
                        got: command.schema_version,
                    })
                }
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn sample_command(source_peer: u32, schema_version: u16) -> Command {
        Command {
            scheduled_tick: 3,
            schema_id: 7,
            schema_version,
            payload: Vec::new(),
            source_peer,
            sequence: 0,
        }
    }

    #[test]
    fn unknown_schema_is_always_rejected() {
        let registry = SchemaRegistry::new();
        let command = sample_command(0, 1);
        assert_eq!(
            registry.validate(&command, AuthorityMode::Single),
            Err(CommandError::UnknownSchema(7))
        );
    }

    #[test]
    fn single_accepts_any_peer() {
        let mut registry = SchemaRegistry::new();
        registry.register(7, 1);
        let command = sample_command(99, 1);
        assert_eq!(registry.validate(&command, AuthorityMode::Single), Ok(()));
    }

    #[test]
    fn server_authoritative_denies_nonzero_peer() {
        let mut registry = SchemaRegistry::new();
        registry.register(7, 1);
        let command = sample_command(1, 1);
        assert_eq!(
            registry.validate(&command, AuthorityMode::ServerAuthoritative),
            Err(CommandError::AuthorityDenied(1))
        );
    }

    #[test]
    fn lockstep_requires_exact_schema_version() {
        let mut registry = SchemaRegistry::new();
        registry.register(7, 2);
        let stale = sample_command(1, 1);
        assert_eq!(
            registry.validate(&stale, AuthorityMode::Lockstep),
            Err(CommandError::SchemaVersionMismatch {
                schema_id: 7,
                expected: 2,
                got: 1,
            })
        );
        let current = sample_command(1, 2);
        assert_eq!(registry.validate(&current, AuthorityMode::Lockstep), Ok(()));
    }

    #[test]
    fn order_key_sorts_tick_then_peer_then_sequence() {
        let mut commands = vec![
            Command {
                sequence: 1,
                ..sample_command(2, 1)
            },
            Command {
                sequence: 0,
                ..sample_command(1, 1)
            },
            Command {
                scheduled_tick: 1,
                sequence: 0,
                ..sample_command(1, 1)
            },
        ];
        commands.sort_by_key(Command::order_key);
        assert_eq!(commands[0].scheduled_tick, 1);
        assert_eq!(commands[1].scheduled_tick, 3);
        assert_eq!(commands[1].source_peer, 1);
        assert_eq!(commands[2].source_peer, 2);
    }
}
