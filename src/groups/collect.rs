use std::collections::{HashMap, HashSet};
use std::path::{Path, PathBuf};
use std::sync::Arc;

use indexmap::IndexMap;
use regex::Regex;
use walkdir::WalkDir;

use crate::config::{CONF_FILE_NAMES, ConfigResolver, DirConfig, FileSystem, RealFileSystem};
use crate::error::{FileGroupsError, Result};
use crate::output::{InfoSink, default_sink};
use crate::path_utils::lexical_target;

use super::types::{Group, GroupFilter, GroupKind};

/// Construction options for [`FileGroups`].
pub struct GroupsOptions {
    /// Exclude files matching this basename regex from the protected files
    /// (does not apply to symlinks). Default: include all.
    pub protect_exclude: Option<Regex>,
    /// Only include files matching this basename regex in the work-on files
    /// (does not apply to symlinks). Default: include all.
    pub work_include: Option<Regex>,
    /// Be extremely verbose.
    pub debug: bool,
    /// Informational channel.
    pub sink: Arc<dyn InfoSink>,
}

impl Default for GroupsOptions {
    fn default() -> Self {
        Self {
            protect_exclude: None,
            work_include: None,
            debug: false,
            sink: default_sink(),
        }
    }
}

/// The two collected groups of regular files and symlinks.
///
/// Directories are walked shortest-path-first so that a parent directory's
/// effective config is always resolved before its children's. A directory
/// that is a declared root of the *other* kind switches the active group for
/// its subtree. Symlinks are followed for the supplied root arguments, never
/// for subdirectories.
#[derive(Debug)]
pub struct FileGroups<F: FileSystem = RealFileSystem> {
    pub must_protect: Group,
    pub may_work_on: Group,
    pub config_files: ConfigResolver<F>,
    sink: Arc<dyn InfoSink>,
    debug: bool,
}

struct WalkState {
    visited: HashSet<PathBuf>,
    dir_configs: HashMap<PathBuf, Arc<DirConfig>>,
}

impl<F: FileSystem> FileGroups<F> {
    /// Walk the root directories and split everything found into the two
    /// groups.
    ///
    /// Root paths are canonicalized at ingress; a work root whose canonical
    /// path is also a protect root is dropped with a diagnostic.
    pub fn collect(
        protect_dirs_seq: &[PathBuf],
        work_dirs_seq: &[PathBuf],
        config_files: ConfigResolver<F>,
        options: GroupsOptions,
    ) -> Result<Self> {
        let protect_roots = canonicalize_roots(protect_dirs_seq)?;

        let mut work_roots = IndexMap::new();
        for dp in work_dirs_seq {
            let real = canonicalize_root(dp)?;
            if let Some(specified) = protect_roots.get(&real) {
                if specified == dp {
                    options.sink.line(&format!(
                        "Ignoring 'work' dir '{}' which is also a 'protect' dir.",
                        dp.display()
                    ));
                } else {
                    options.sink.line(&format!(
                        "Ignoring 'work' dir '{}' (from argument '{}') which is also a 'protect' dir (from argument '{}').",
                        real.display(),
                        dp.display(),
                        specified.display()
                    ));
                }
                continue;
            }
            work_roots.insert(real, dp.clone());
        }

        let mut groups = Self {
            must_protect: Group::new(
                GroupKind::MustProtect,
                protect_roots,
                GroupFilter::Exclude(options.protect_exclude),
            ),
            may_work_on: Group::new(
                GroupKind::MayWorkOn,
                work_roots,
                GroupFilter::Include(options.work_include),
            ),
            config_files,
            sink: options.sink,
            debug: options.debug,
        };

        groups.walk()?;
        Ok(groups)
    }

    #[must_use]
    pub const fn group(&self, kind: GroupKind) -> &Group {
        match kind {
            GroupKind::MustProtect => &self.must_protect,
            GroupKind::MayWorkOn => &self.may_work_on,
        }
    }

    const fn group_mut(&mut self, kind: GroupKind) -> &mut Group {
        match kind {
            GroupKind::MustProtect => &mut self.must_protect,
            GroupKind::MayWorkOn => &mut self.may_work_on,
        }
    }

    fn walk(&mut self) -> Result<()> {
        // Shortest-path-first; the sort is stable, keeping protect roots
        // ahead of work roots at equal depth.
        let mut roots: Vec<PathBuf> = self
            .must_protect
            .roots
            .keys()
            .chain(self.may_work_on.roots.keys())
            .cloned()
            .collect();
        roots.sort_by_key(|p| p.components().count());

        let mut state = WalkState {
            visited: HashSet::new(),
            dir_configs: HashMap::new(),
        };

        for root in roots {
            self.walk_root(&root, &mut state)?;
        }
        Ok(())
    }

    fn walk_root(&mut self, root: &Path, state: &mut WalkState) -> Result<()> {
        let mut iter = WalkDir::new(root)
            .follow_links(false)
            .sort_by_file_name()
            .into_iter();

        while let Some(entry) = iter.next() {
            let entry = entry.map_err(scan_error)?;
            let file_type = entry.file_type();

            if file_type.is_dir() {
                if state.visited.insert(entry.path().to_path_buf()) {
                    self.enter_directory(entry.path(), state)?;
                } else {
                    self.trace(&format!("directory already checked: {}", entry.path().display()));
                    iter.skip_current_dir();
                }
            } else if file_type.is_symlink() {
                self.collect_symlink(&entry)?;
            } else if file_type.is_file() {
                self.collect_file(&entry, state)?;
            }
        }
        Ok(())
    }

    fn enter_directory(&mut self, dir: &Path, state: &mut WalkState) -> Result<()> {
        let kind = self.active_kind(dir);
        self.trace(&format!("find {kind}: {}", dir.display()));

        let parent = dir
            .parent()
            .and_then(|p| state.dir_configs.get(p))
            .cloned()
            .unwrap_or_else(|| Arc::new(self.config_files.global_config().clone()));
        let config = self.config_files.dir_config(dir, &parent)?;
        state.dir_configs.insert(dir.to_path_buf(), config);

        self.group_mut(kind).num_directories += 1;
        Ok(())
    }

    fn collect_symlink(&mut self, entry: &walkdir::DirEntry) -> Result<()> {
        let path = entry.path();
        let Some(dir) = path.parent() else {
            return Ok(());
        };
        let kind = self.active_kind(dir);

        let points_to = std::fs::read_link(path)
            .map_err(|e| FileGroupsError::io_with_context(e, path.to_path_buf(), "readlink"))?;

        // Never follow symlinks into directories; a dangling link counts as a
        // file symlink.
        if std::fs::metadata(path).is_ok_and(|m| m.is_dir()) {
            self.trace(&format!(
                "find {kind} - '{}' -> '{}' is a symlink to a directory - ignoring",
                path.display(),
                points_to.display()
            ));
            self.group_mut(kind).num_directory_symlinks += 1;
            return Ok(());
        }

        let metadata = entry.metadata().map_err(scan_error)?;
        let target = lexical_target(dir, &points_to);
        self.group_mut(kind).add_symlink(path.to_path_buf(), metadata, target);
        Ok(())
    }

    fn collect_file(&mut self, entry: &walkdir::DirEntry, state: &WalkState) -> Result<()> {
        let name = entry.file_name().to_string_lossy();
        if CONF_FILE_NAMES.iter().any(|c| *c == name) {
            return Ok(());
        }

        let path = entry.path();
        let Some(dir) = path.parent() else {
            return Ok(());
        };
        let kind = self.active_kind(dir);
        let metadata = entry.metadata().map_err(scan_error)?;

        if kind == GroupKind::MayWorkOn
            && let Some(config) = state.dir_configs.get(dir)
            && let Some(pattern) = config.is_protected(path)
        {
            self.trace(&format!(
                "find {kind} - '{}' is protected by regex {pattern}, assigning to group {} instead.",
                path.display(),
                GroupKind::MustProtect
            ));
            self.must_protect.add_file(path.to_path_buf(), metadata);
            return Ok(());
        }

        let admitted = self.group_mut(kind).add_file(path.to_path_buf(), metadata);
        if !admitted {
            self.trace(&format!("find {kind} - filtered out: {}", path.display()));
        }
        Ok(())
    }

    /// The group a directory belongs to: the kind of the deepest declared
    /// root containing it. Falls back to protect (the safe side) for paths
    /// outside every root, which a walk never yields.
    fn active_kind(&self, dir: &Path) -> GroupKind {
        let mut current = Some(dir);
        while let Some(p) = current {
            if self.may_work_on.roots.contains_key(p) {
                return GroupKind::MayWorkOn;
            }
            if self.must_protect.roots.contains_key(p) {
                return GroupKind::MustProtect;
            }
            current = p.parent();
        }
        GroupKind::MustProtect
    }

    /// Print collected counters.
    pub fn stats(&self) {
        let mp = &self.must_protect;
        let wo = &self.may_work_on;
        self.sink
            .line(&format!("collected protect_directories: {}", mp.num_directories));
        self.sink.line(&format!(
            "collected protect_directory_symlinks: {}",
            mp.num_directory_symlinks
        ));
        self.sink
            .line(&format!("collected work_on_directories: {}", wo.num_directories));
        self.sink.line(&format!(
            "collected work_on_directory_symlinks: {}",
            wo.num_directory_symlinks
        ));
        self.sink
            .line(&format!("collected must_protect_files: {}", mp.files.len()));
        self.sink
            .line(&format!("collected must_protect_symlinks: {}", mp.symlinks.len()));
        self.sink
            .line(&format!("collected may_work_on_files: {}", wo.files.len()));
        self.sink
            .line(&format!("collected may_work_on_symlinks: {}", wo.symlinks.len()));
    }

    /// Print every collected entry. This may be A LOT of output for large
    /// directories.
    pub fn dump(&self) {
        for group in [&self.must_protect, &self.may_work_on] {
            self.sink.line(&format!("{} files:", group.kind));
            for path in group.files.keys() {
                self.sink.line(&path.display().to_string());
            }

            self.sink.line(&format!("{} symlinks:", group.kind));
            for path in group.symlinks.keys() {
                match std::fs::read_link(path) {
                    Ok(target) => self
                        .sink
                        .line(&format!("{} -> {}", path.display(), target.display())),
                    Err(_) => self.sink.line(&path.display().to_string()),
                }
            }

            self.sink.line(&format!("{} symlinks by points to:", group.kind));
            for (target, links) in &group.symlinks_by_target {
                self.sink
                    .line(&format!("{links:?} -> {}", target.display()));
            }
        }
    }

    fn trace(&self, text: &str) {
        if self.debug {
            self.sink.line(text);
        }
    }
}

fn canonicalize_root(path: &Path) -> Result<PathBuf> {
    dunce::canonicalize(path)
        .map_err(|e| FileGroupsError::io_with_context(e, path.to_path_buf(), "canonicalize"))
}

fn canonicalize_roots(paths: &[PathBuf]) -> Result<IndexMap<PathBuf, PathBuf>> {
    let mut roots = IndexMap::new();
    for path in paths {
        roots.insert(canonicalize_root(path)?, path.clone());
    }
    Ok(roots)
}

fn scan_error(err: walkdir::Error) -> FileGroupsError {
    let path = err
        .path()
        .map_or_else(PathBuf::new, Path::to_path_buf);
    let source = err
        .into_io_error()
        .unwrap_or_else(|| std::io::Error::other("filesystem loop detected"));
    FileGroupsError::Scan { path, source }
}

#[cfg(test)]
#[path = "collect_tests.rs"]
mod tests;
