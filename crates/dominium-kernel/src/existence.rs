// SPDX-License-Identifier: Apache-2.0
//! Domain existence/archival state (spec.md §3.4).

/// The domain's lifecycle existence state.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum ExistenceState {
    /// The domain has never been initialized.
    #[default]
    Nonexistent,
    /// The domain has been declared but not yet realized (inactive).
    Declared,
    /// The domain is realized and active.
    Realized,
}

impl ExistenceState {
    /// A domain is active iff its existence state is neither
    /// `Nonexistent` nor `Declared`.
    #[must_use]
    pub const fn is_active(self) -> bool {
        !matches!(self, Self::Nonexistent | Self::Declared)
    }
}

/// Archival state, orthogonal to existence: whether the domain's history
/// is still mutable or has been sealed for long-term storage.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum ArchivalState {
    /// The domain is live and mutable.
    #[default]
    Live,
    /// The domain has been archived; it remains queryable but `resolve`
    /// calls against it are a policy matter for the caller, not something
    /// this kernel enforces directly.
    Archived,
}

/// Which concrete domain kind a handle refers to (closed set, no virtual
/// dispatch — spec.md §9 "Dynamic dispatch").
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum DomainKind {
    /// The conflict domain.
    Conflict,
    /// The economy domain.
    Economy,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn nonexistent_and_declared_are_inactive() {
        assert!(!ExistenceState::Nonexistent.is_active());
        assert!(!ExistenceState::Declared.is_active());
        assert!(ExistenceState::Realized.is_active());
    }
}
