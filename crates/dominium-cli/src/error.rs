// SPDX-License-Identifier: Apache-2.0
//! Every error this binary can produce, and the exit code it maps to
//! (`SPEC_FULL.md` §6: `0` success, `1` semantic failure, `2` usage error).

use std::path::PathBuf;

use dominium_fixture::FixtureError;
use dominium_kernel::error::KernelError;
use dominium_runtime::codec::CodecError;
use thiserror::Error;

/// Top-level CLI failure.
#[derive(Debug, Error)]
pub enum CliError {
    /// A fixture, replay, or desync-output path could not be read or
    /// written.
    #[error("{path}: {source}")]
    Io {
        /// The offending path.
        path: PathBuf,
        /// The underlying I/O failure.
        #[source]
        source: std::io::Error,
    },
    /// A fixture file failed to parse.
    #[error(transparent)]
    Fixture(#[from] FixtureError),
    /// `--kind` named a string no entity kind in this domain answers to.
    #[error("unknown entity kind {0:?} for this domain")]
    UnknownKind(String),
    /// A domain lifecycle call (collapse or expand) violated an invariant.
    #[error(transparent)]
    Kernel(#[from] KernelError),
    /// A replay file was malformed.
    #[error(transparent)]
    Replay(#[from] ReplayError),
}

/// Every `CliError` variant is a usage error (`SPEC_FULL.md` §6 exit code
/// `2`): a bad fixture, a bad `--kind`/`--id`, a missing file, or a kernel
/// lifecycle invariant violation (`region 0` collapse, full capsule
/// table) are all caller mistakes, never a semantic resolve failure.
pub const USAGE_ERROR_EXIT_CODE: u8 = 2;

impl CliError {
    /// Wraps a path-scoped I/O failure.
    #[must_use]
    pub fn io(path: PathBuf, source: std::io::Error) -> Self {
        Self::Io { path, source }
    }
}

/// Failures specific to parsing or driving a replay file.
#[derive(Debug, Error)]
pub enum ReplayError {
    /// The file did not open with the expected magic/version prefix.
    #[error("bad replay file header: expected magic {expected_magic:#010x}, got {got_magic:#010x}")]
    BadMagic {
        /// The magic this CLI's replay format requires.
        expected_magic: u32,
        /// The magic actually read.
        got_magic: u32,
    },
    /// The file's format version is newer (or otherwise unrecognized) than
    /// this binary supports.
    #[error("unsupported replay format version {0}")]
    UnsupportedVersion(u16),
    /// A primitive read past the declared record boundary ran out of
    /// bytes.
    #[error(transparent)]
    Codec(#[from] CodecError),
}
