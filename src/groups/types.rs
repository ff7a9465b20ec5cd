use std::collections::HashMap;
use std::fmt;
use std::fs::Metadata;
use std::path::PathBuf;

use indexmap::IndexMap;
use regex::Regex;

/// Which of the two collection roles a directory tree (or entry) has.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum GroupKind {
    /// Regular files here must never be deleted, renamed or overwritten.
    MustProtect,
    /// Regular files here may be deleted, renamed or moved.
    MayWorkOn,
}

impl GroupKind {
    #[must_use]
    pub const fn name(self) -> &'static str {
        match self {
            Self::MustProtect => "MUST_PROTECT",
            Self::MayWorkOn => "MAY_WORK_ON",
        }
    }

    #[must_use]
    pub const fn other(self) -> Self {
        match self {
            Self::MustProtect => Self::MayWorkOn,
            Self::MayWorkOn => Self::MustProtect,
        }
    }
}

impl fmt::Display for GroupKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

/// Basename filter applied to regular files when they enter a group.
///
/// The two group roles filter in opposite directions; the tag keeps that in
/// one place instead of two near-identical group types. Symlinks are never
/// filtered.
#[derive(Debug, Clone)]
pub enum GroupFilter {
    /// Drop entries whose basename matches (protect group).
    Exclude(Option<Regex>),
    /// Keep only entries whose basename matches (work group).
    Include(Option<Regex>),
}

impl GroupFilter {
    fn admits(&self, name: &str) -> bool {
        match self {
            Self::Exclude(None) | Self::Include(None) => true,
            Self::Exclude(Some(regex)) => !regex.is_match(name),
            Self::Include(Some(regex)) => regex.is_match(name),
        }
    }
}

/// One collected group of regular files and symlinks.
pub struct Group {
    pub kind: GroupKind,

    /// Canonicalized root path -> path as supplied by the caller.
    pub roots: IndexMap<PathBuf, PathBuf>,

    /// Absolute path -> metadata, regular files only.
    pub files: IndexMap<PathBuf, Metadata>,

    /// Absolute path -> (link) metadata, symlinks whose final target is not a
    /// directory.
    pub symlinks: IndexMap<PathBuf, Metadata>,

    /// Lexical target -> symlinks pointing at it, in collection order.
    ///
    /// The key is one readlink hop joined onto the link's directory and
    /// normalized, NOT the fully resolved target; each link in a chain
    /// contributes its own entry, so a rename of any node on the chain finds
    /// exactly the links whose next hop was that node.
    pub symlinks_by_target: HashMap<PathBuf, Vec<PathBuf>>,

    pub num_directories: usize,
    pub num_directory_symlinks: usize,

    filter: GroupFilter,
}

impl Group {
    #[must_use]
    pub(crate) fn new(kind: GroupKind, roots: IndexMap<PathBuf, PathBuf>, filter: GroupFilter) -> Self {
        Self {
            kind,
            roots,
            files: IndexMap::new(),
            symlinks: IndexMap::new(),
            symlinks_by_target: HashMap::new(),
            num_directories: 0,
            num_directory_symlinks: 0,
            filter,
        }
    }

    /// Add a regular file, subject to the group's basename filter.
    /// Returns whether the file was admitted.
    pub(crate) fn add_file(&mut self, path: PathBuf, metadata: Metadata) -> bool {
        let admitted = path
            .file_name()
            .is_some_and(|name| self.filter.admits(&name.to_string_lossy()));
        if admitted {
            self.files.insert(path, metadata);
        }
        admitted
    }

    /// Add a symlink and index it under its lexical target.
    pub(crate) fn add_symlink(&mut self, path: PathBuf, metadata: Metadata, lexical_target: PathBuf) {
        self.symlinks_by_target
            .entry(lexical_target)
            .or_default()
            .push(path.clone());
        self.symlinks.insert(path, metadata);
    }
}

impl fmt::Debug for Group {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Group")
            .field("kind", &self.kind)
            .field("roots", &self.roots)
            .field("files", &self.files.keys())
            .field("symlinks", &self.symlinks.keys())
            .field("num_directories", &self.num_directories)
            .field("num_directory_symlinks", &self.num_directory_symlinks)
            .finish_non_exhaustive()
    }
}

#[cfg(test)]
#[path = "types_tests.rs"]
mod tests;
