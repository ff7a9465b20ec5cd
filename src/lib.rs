//! Safely reorganize files across a filesystem subtree partitioned into a
//! "protect" region (never delete, rename or overwrite) and a "work" region
//! (deletes, renames and moves allowed).
//!
//! The collection walk splits everything found under the supplied roots into
//! the two groups, honoring hierarchical protection-pattern config files, and
//! builds a reverse symlink index. The file handler then executes (or
//! dry-runs) deletes, renames and moves, rewriting every symlink whose
//! resolution depended on the affected path.

pub mod compare;
pub mod config;
pub mod error;
pub mod groups;
pub mod handler;
pub mod output;
pub mod path_utils;
pub mod pattern;

pub use compare::{FileCompare, SizeThenContent};
pub use config::{ConfigResolver, DirConfig, FileSystem, RealFileSystem, ResolverOptions};
pub use error::{FileGroupsError, Result};
pub use groups::{FileGroups, Group, GroupFilter, GroupKind, GroupsOptions};
pub use handler::{FileHandler, HandlerOptions, OpCounters, StatsScope};
pub use output::{InfoSink, StdoutSink};
pub use pattern::ProtectPattern;

#[cfg(test)]
#[path = "lib_tests.rs"]
mod tests;
