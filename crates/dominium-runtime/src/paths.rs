// SPDX-License-Identifier: Apache-2.0
//! `DOMINIUM_RUN_ROOT` / `DOMINIUM_HOME` resolution (spec.md §6
//! "Environment variables (runtime boundary only; not part of the
//! core)").

use std::path::{Path, PathBuf};

use thiserror::Error;

/// The two environment variables this module resolves.
const RUN_ROOT_VAR: &str = "DOMINIUM_RUN_ROOT";
const HOME_VAR: &str = "DOMINIUM_HOME";

/// Refusals produced while resolving or using a run path. None of these
/// are fatal: the caller (CLI, runtime bootstrap) reports them and exits
/// non-zero, per spec.md §6/§7.
#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum PathsError {
    /// The named environment variable was not set.
    #[error("{0} is not set")]
    MissingEnvVar(&'static str),
    /// The path contains a `..` component, a non-canonical separator, or
    /// otherwise does not resolve to a canonical absolute path.
    #[error("{path} is not a canonical absolute path")]
    NonCanonical {
        /// The offending path.
        path: PathBuf,
    },
    /// A path derived from `run_root` escaped it once canonicalized.
    #[error("{path} resolves outside the run root")]
    OutsideRoot {
        /// The offending path.
        path: PathBuf,
    },
}

/// The runtime boundary's two resolved directories.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RunPaths {
    /// Canonical, absolute value of `DOMINIUM_RUN_ROOT`.
    pub run_root: PathBuf,
    /// Canonical, absolute value of `DOMINIUM_HOME`.
    pub home: PathBuf,
}

impl RunPaths {
    /// Reads and validates both environment variables.
    pub fn resolve() -> Result<Self, PathsError> {
        Ok(Self {
            run_root: canonical_env_path(RUN_ROOT_VAR)?,
            home: canonical_env_path(HOME_VAR)?,
        })
    }

    /// Resolves `relative` against `run_root`, rejecting any result that
    /// escapes it (directory traversal guard).
    pub fn resolve_under_root(&self, relative: &Path) -> Result<PathBuf, PathsError> {
        if relative.is_absolute() || has_parent_component(relative) {
            return Err(PathsError::OutsideRoot {
                path: self.run_root.join(relative),
            });
        }
        let candidate = self.run_root.join(relative);
        if !candidate.starts_with(&self.run_root) {
            return Err(PathsError::OutsideRoot { path: candidate });
        }
        Ok(candidate)
    }
}

fn has_parent_component(path: &Path) -> bool {
    path.components()
        .any(|c| matches!(c, std::path::Component::ParentDir))
}

/// Validates and canonicalizes one already-read environment value. Split
/// out from [`canonical_env_path`] so the path logic can be tested without
/// touching the process environment (`std::env::set_var` requires
/// `unsafe` and this crate forbids it).
fn validate_path(raw: &str) -> Result<PathBuf, PathsError> {
    let path = PathBuf::from(raw);
    if !path.is_absolute() || has_parent_component(&path) {
        return Err(PathsError::NonCanonical { path });
    }
    path.canonicalize()
        .map_err(|_| PathsError::NonCanonical { path: path.clone() })
}

fn canonical_env_path(var: &'static str) -> Result<PathBuf, PathsError> {
    let raw = std::env::var(var).map_err(|_| PathsError::MissingEnvVar(var))?;
    validate_path(&raw)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn missing_var_is_a_refusal() {
        assert_eq!(
            canonical_env_path("DOMINIUM_DEFINITELY_UNSET_VAR"),
            Err(PathsError::MissingEnvVar("DOMINIUM_DEFINITELY_UNSET_VAR"))
        );
    }

    #[test]
    fn relative_value_is_non_canonical() {
        let result = validate_path("relative/path");
        assert!(matches!(result, Err(PathsError::NonCanonical { .. })));
    }

    #[test]
    fn parent_traversal_is_non_canonical() {
        let result = validate_path("/tmp/../etc");
        assert!(matches!(result, Err(PathsError::NonCanonical { .. })));
    }

    #[test]
    fn traversal_outside_root_is_rejected() {
        let dir = tempfile::tempdir().unwrap();
        let run_paths = RunPaths {
            run_root: dir.path().to_path_buf(),
            home: dir.path().to_path_buf(),
        };
        let result = run_paths.resolve_under_root(Path::new("../escape.bin"));
        assert!(matches!(result, Err(PathsError::OutsideRoot { .. })));
    }

    #[test]
    fn plain_relative_path_resolves_under_root() {
        let dir = tempfile::tempdir().unwrap();
        let run_paths = RunPaths {
            run_root: dir.path().to_path_buf(),
            home: dir.path().to_path_buf(),
        };
        let resolved = run_paths
            .resolve_under_root(Path::new("saves/slot1.bin"))
            .unwrap();
        assert!(resolved.starts_with(dir.path()));
    }
}
