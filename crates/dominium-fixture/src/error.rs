// SPDX-License-Identifier: Apache-2.0
//! Fixture parse refusals (spec.md §6 "Unknown keys are a hard error").

use thiserror::Error;

/// Everything that can go wrong reading a fixture's `key=value` body.
/// None of these are panics: the CLI translates every variant to exit
/// code 2, usage error (`SPEC_FULL.md` §6).
#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum FixtureError {
    /// The first non-blank, non-comment line was missing or did not equal
    /// the fixture kind's expected header.
    #[error("missing or wrong fixture header: expected {expected}")]
    MissingHeader {
        /// The header this fixture kind requires.
        expected: &'static str,
    },
    /// `key` does not name any known entity kind, policy field, or
    /// attribute on the kind it does name.
    #[error("line {line}: unknown key {key}")]
    UnknownKey {
        /// The offending line number (1-based).
        line: usize,
        /// The raw key text.
        key: String,
    },
    /// `value` could not be parsed as the type `key` requires.
    #[error("line {line}: malformed value {value:?} for {key}")]
    MalformedValue {
        /// The offending line number (1-based).
        line: usize,
        /// The key whose value failed to parse.
        key: String,
        /// The raw value text.
        value: String,
    },
    /// The same `key` appeared more than once in one fixture.
    #[error("line {line}: duplicate key {key} (first set earlier in this fixture)")]
    DuplicateIndex {
        /// The offending (second) line number (1-based).
        line: usize,
        /// The repeated key.
        key: String,
    },
    /// An entity's `schema_version` is neither `0` (unset) nor the schema
    /// revision this parser accepts (`SPEC_FULL.md` §3.2: entities carry a
    /// `schema_version` "used only by the fixture parser/CLI to reject
    /// fixtures from incompatible schema revisions").
    #[error("line {line}: schema_version {got} is not {expected} (and fixtures from incompatible revisions are rejected)")]
    IncompatibleSchemaVersion {
        /// The offending line number (1-based).
        line: usize,
        /// The schema version this parser accepts.
        expected: u16,
        /// The schema version the fixture declared.
        got: u16,
    },
}
