// SPDX-License-Identifier: Apache-2.0
//! Reading fixture and replay files off disk, with the path folded into
//! every I/O error.

use std::path::Path;

use crate::error::CliError;

/// Reads `path` whole into a `String`, tagging any failure with `path`.
pub fn read_to_string(path: &Path) -> Result<String, CliError> {
    std::fs::read_to_string(path).map_err(|source| CliError::io(path.to_path_buf(), source))
}

/// Reads `path` whole into a byte buffer, tagging any failure with `path`.
pub fn read_to_vec(path: &Path) -> Result<Vec<u8>, CliError> {
    std::fs::read(path).map_err(|source| CliError::io(path.to_path_buf(), source))
}
