use std::path::Path;

use indexmap::IndexSet;
use serde::Deserialize;

use crate::pattern::ProtectPattern;

/// Raw config file content.
///
/// The level-one keys are application names; other applications may add their
/// own entries, so unknown top-level keys are ignored.
#[derive(Debug, Deserialize)]
pub(crate) struct RawConfig {
    pub file_groups: Option<RawFileGroups>,
}

#[derive(Debug, Deserialize)]
pub(crate) struct RawFileGroups {
    pub protect: Option<RawProtect>,
}

/// The `[file_groups.protect]` table. `global` is only valid in
/// config-directory files; the resolver rejects it elsewhere.
#[derive(Debug, Deserialize)]
#[serde(deny_unknown_fields)]
pub(crate) struct RawProtect {
    #[serde(default)]
    pub local: Vec<String>,

    #[serde(default)]
    pub recursive: Vec<String>,

    #[serde(default)]
    pub global: Option<Vec<String>>,
}

/// Effective protection rules for one directory.
///
/// `recursive` is closed under descent: a child directory's `recursive` set is
/// a superset of its parent's. `local` applies only where it was declared.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct DirConfig {
    pub local: IndexSet<ProtectPattern>,
    pub recursive: IndexSet<ProtectPattern>,
}

impl DirConfig {
    /// Child config for a directory without its own config file.
    #[must_use]
    pub(crate) fn inherited(parent: &Self) -> Self {
        Self {
            local: IndexSet::new(),
            recursive: parent.recursive.clone(),
        }
    }

    /// If `path` is protected by one of this directory's patterns, return the
    /// matching pattern.
    #[must_use]
    pub fn is_protected(&self, path: &Path) -> Option<&ProtectPattern> {
        self.local
            .iter()
            .chain(&self.recursive)
            .find(|pattern| pattern.matches(path))
    }
}

#[cfg(test)]
#[path = "model_tests.rs"]
mod tests;
