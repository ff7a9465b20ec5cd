//! Deletes, renames and moves with symlink rewrite and protection checks.
//!
//! Every mutation consults the reverse symlink index built during collection
//! so that links whose resolution depended on the affected path are rewritten
//! (or deleted) together with the primary operation. Under dry-run no
//! syscall is issued; the moved-from index and the deleted set make later
//! operations and queries in the same plan observe the planned state.

use std::collections::{HashMap, HashSet};
use std::io::ErrorKind;
use std::path::{Path, PathBuf};
use std::sync::Arc;

use indexmap::IndexMap;
use regex::Regex;

use crate::compare::FileCompare;
use crate::config::{FileSystem, RealFileSystem};
use crate::error::{FileGroupsError, Result};
use crate::groups::FileGroups;
use crate::output::{InfoSink, default_sink};
use crate::path_utils::absolutize;

/// Construction options for [`FileHandler`].
pub struct HandlerOptions {
    /// Plan only; no filesystem mutation.
    pub dry_run: bool,
    /// Mutation-time safety net: operations whose source (or existing
    /// destination) matches any of these fail with `ProtectViolation`.
    pub protected_regexes: Vec<Regex>,
    /// Delete dependent symlinks instead of rewriting them.
    pub delete_symlinks_instead_of_relinking: bool,
    /// Be extremely verbose.
    pub debug: bool,
    /// Informational channel.
    pub sink: Arc<dyn InfoSink>,
}

impl Default for HandlerOptions {
    fn default() -> Self {
        Self {
            dry_run: true,
            protected_regexes: Vec::new(),
            delete_symlinks_instead_of_relinking: false,
            debug: false,
            sink: default_sink(),
        }
    }
}

/// Operation counters. Identical under dry-run and real execution of the
/// same plan.
#[derive(Debug, Default, Clone, Copy, PartialEq, Eq)]
pub struct OpCounters {
    pub num_deleted: usize,
    pub num_renamed: usize,
    pub num_moved: usize,
    pub num_symlinks_relinked: usize,
    pub num_symlinks_deleted: usize,
    pub num_symlinks_dangling: usize,
}

#[derive(Debug, Clone, Copy)]
enum MoveOp {
    Rename,
    Move,
}

impl MoveOp {
    const fn verb(self) -> &'static str {
        match self {
            Self::Rename => "rename",
            Self::Move => "move",
        }
    }

    const fn gerund(self) -> &'static str {
        match self {
            Self::Rename => "renaming",
            Self::Move => "moving",
        }
    }
}

/// Performs deletes, renames and moves over the collected groups.
pub struct FileHandler<F: FileSystem = RealFileSystem> {
    pub groups: FileGroups<F>,
    pub counters: OpCounters,
    dry_run: bool,
    protected_regexes: Vec<Regex>,
    delete_symlinks_instead_of_relinking: bool,
    debug: bool,
    sink: Arc<dyn InfoSink>,

    /// Working reverse symlink index (lexical target -> links), merged from
    /// both groups; mutated as operations re-target links.
    link_index: HashMap<PathBuf, Vec<PathBuf>>,

    /// Post-operation path -> original on-disk path, for dry-run plans.
    moved_from: IndexMap<PathBuf, PathBuf>,

    /// Paths deleted (or vacated by a rename/move) in the current plan.
    deleted: HashSet<PathBuf>,
}

impl<F: FileSystem> FileHandler<F> {
    #[must_use]
    pub fn new(groups: FileGroups<F>, options: HandlerOptions) -> Self {
        let link_index = merged_link_index(&groups);
        Self {
            groups,
            counters: OpCounters::default(),
            dry_run: options.dry_run,
            protected_regexes: options.protected_regexes,
            delete_symlinks_instead_of_relinking: options.delete_symlinks_instead_of_relinking,
            debug: options.debug,
            sink: options.sink,
            link_index,
            moved_from: IndexMap::new(),
            deleted: HashSet::new(),
        }
    }

    #[must_use]
    pub const fn dry_run(&self) -> bool {
        self.dry_run
    }

    /// Switch between planning and execution. Call [`Self::reset`] when
    /// re-running a plan for real.
    pub const fn set_dry_run(&mut self, dry_run: bool) {
        self.dry_run = dry_run;
    }

    /// Clear the moved-from index, the deleted set and the counters, and
    /// restore the working symlink index from the collected groups.
    pub fn reset(&mut self) {
        self.moved_from.clear();
        self.deleted.clear();
        self.counters = OpCounters::default();
        self.link_index = merged_link_index(&self.groups);
    }

    /// Post-operation path -> original on-disk path for the current dry-run
    /// plan.
    #[must_use]
    pub const fn moved_from(&self) -> &IndexMap<PathBuf, PathBuf> {
        &self.moved_from
    }

    /// Plan-aware existence: a path deleted or vacated earlier in the plan is
    /// absent, a path created by an earlier rename/move is present.
    #[must_use]
    pub fn path_exists(&self, path: &Path) -> bool {
        absolutize(path).is_ok_and(|abs| self.exists_now(&abs))
    }

    /// Where the content of `path` currently lives on disk. Differs from
    /// `path` only under dry-run, after a plan operation moved it.
    #[must_use]
    pub fn content_location(&self, path: &Path) -> PathBuf {
        let abs = absolutize(path).unwrap_or_else(|_| path.to_path_buf());
        self.moved_from.get(&abs).cloned().unwrap_or(abs)
    }

    /// Delete `victim`.
    ///
    /// With a `corresponding` peer (the surviving copy), symlinks that
    /// depended on `victim` are redirected to it; without one they are left
    /// dangling, counted, and reported.
    pub fn registered_delete(
        &mut self,
        victim: &Path,
        corresponding: Option<&Path>,
    ) -> Result<bool> {
        let victim_abs = absolutize(victim)?;
        let corresponding_abs = match corresponding {
            Some(c) => Some(absolutize(c)?),
            None => None,
        };

        // A symlink victim deletes the link, not its target; the protection
        // regexes guard file content only.
        let victim_is_link = victim_abs
            .symlink_metadata()
            .map(|m| m.file_type().is_symlink())
            .unwrap_or(false);
        if !victim_is_link {
            self.check_protected(&victim_abs, "delete", "deleting")?;
        }
        self.require_exists(&victim_abs, "unlink")?;

        let dependents = self.take_dependents(&victim_abs);

        self.info(&format!("deleting: {}", victim_abs.display()));
        if self.dry_run {
            self.moved_from.shift_remove(&victim_abs);
        } else {
            std::fs::remove_file(&victim_abs)
                .map_err(|e| FileGroupsError::io_with_context(e, victim_abs.clone(), "unlink"))?;
        }
        self.deleted.insert(victim_abs.clone());
        self.counters.num_deleted += 1;

        if let Some(corr) = corresponding_abs {
            self.retarget_dependents(&dependents, &corr)?;
        } else {
            for link in &dependents {
                if self.deleted.contains(link) {
                    continue;
                }
                self.info(&format!(
                    "leaving dangling symlink '{}' pointing at deleted '{}'",
                    link.display(),
                    victim_abs.display()
                ));
                self.counters.num_symlinks_dangling += 1;
            }
        }

        Ok(true)
    }

    /// Rename `src` to `dst` within the same directory.
    pub fn registered_rename(&mut self, src: &Path, dst: &Path) -> Result<bool> {
        self.rename_or_move(src, dst, MoveOp::Rename)
    }

    /// Move `src` to `dst` across directories.
    pub fn registered_move(&mut self, src: &Path, dst: &Path) -> Result<bool> {
        self.rename_or_move(src, dst, MoveOp::Move)
    }

    fn rename_or_move(&mut self, src: &Path, dst: &Path, op: MoveOp) -> Result<bool> {
        let src_abs = absolutize(src)?;
        let dst_abs = absolutize(dst)?;

        self.check_protected(&src_abs, op.verb(), op.gerund())?;
        self.require_exists(&src_abs, op.verb())?;

        if self.exists_now(&dst_abs) {
            if let Some(pattern) = self.protected_match(&dst_abs) {
                self.info(&format!(
                    "NOT overwriting '{}' protected by regex '{pattern}'",
                    dst_abs.display()
                ));
                return Err(FileGroupsError::ProtectViolation {
                    path: dst_abs,
                    pattern,
                    operation: "overwrite",
                });
            }
            return Err(FileGroupsError::Overwrite {
                src: src_abs,
                dst: dst_abs,
            });
        }

        let dependents = self.take_dependents(&src_abs);

        self.info(&format!(
            "{}: {} -> {}",
            op.gerund(),
            src_abs.display(),
            dst_abs.display()
        ));
        if self.dry_run {
            let origin = self
                .moved_from
                .shift_remove(&src_abs)
                .unwrap_or_else(|| src_abs.clone());
            self.moved_from.insert(dst_abs.clone(), origin);
        } else {
            std::fs::rename(&src_abs, &dst_abs)
                .map_err(|e| FileGroupsError::io_with_context(e, src_abs.clone(), op.verb()))?;
        }
        self.deleted.insert(src_abs.clone());
        self.deleted.remove(&dst_abs);
        match op {
            MoveOp::Rename => self.counters.num_renamed += 1,
            MoveOp::Move => self.counters.num_moved += 1,
        }

        self.retarget_dependents(&dependents, &dst_abs)?;

        Ok(true)
    }

    /// Compare two files, dry-run aware: operands renamed or moved earlier in
    /// the plan are read from where their content actually lives.
    pub fn compare(&self, fcmp: &impl FileCompare, f1: &Path, f2: &Path) -> Result<bool> {
        let (loc1, loc2) = if self.dry_run {
            (self.content_location(f1), self.content_location(f2))
        } else {
            (f1.to_path_buf(), f2.to_path_buf())
        };

        if fcmp.compare(&loc1, &loc2)? {
            self.info(&format!("Duplicates: '{}' '{}'", f1.display(), f2.display()));
            return Ok(true);
        }
        Ok(false)
    }

    /// Scope a reporting block; counters are printed when the guard drops,
    /// labeled as projected under dry-run.
    #[must_use]
    pub const fn stats(&self) -> StatsScope<'_, F> {
        StatsScope { handler: self }
    }

    fn exists_now(&self, abs: &Path) -> bool {
        if self.deleted.contains(abs) {
            return false;
        }
        self.moved_from.contains_key(abs) || abs.symlink_metadata().is_ok()
    }

    fn require_exists(&self, abs: &Path, operation: &'static str) -> Result<()> {
        if self.exists_now(abs) {
            return Ok(());
        }
        Err(FileGroupsError::io_with_context(
            std::io::Error::new(ErrorKind::NotFound, "no such file"),
            abs.to_path_buf(),
            operation,
        ))
    }

    fn protected_match(&self, abs: &Path) -> Option<String> {
        let text = abs.to_string_lossy();
        self.protected_regexes
            .iter()
            .find(|regex| regex.is_match(&text))
            .map(|regex| regex.as_str().to_string())
    }

    fn check_protected(&self, abs: &Path, verb: &'static str, gerund: &str) -> Result<()> {
        if let Some(pattern) = self.protected_match(abs) {
            self.info(&format!(
                "NOT {gerund} '{}' protected by regex '{pattern}'",
                abs.display()
            ));
            return Err(FileGroupsError::ProtectViolation {
                path: abs.to_path_buf(),
                pattern,
                operation: verb,
            });
        }
        Ok(())
    }

    /// Remove and return the links whose lexical target is `abs`.
    fn take_dependents(&mut self, abs: &Path) -> Vec<PathBuf> {
        self.link_index.remove(abs).unwrap_or_default()
    }

    /// Point every live dependent link at `new_target`, or delete it under
    /// the `delete_symlinks_instead_of_relinking` policy.
    ///
    /// The policy never deletes links in the protect group (protected
    /// entries are not deletable); those are rewritten regardless.
    fn retarget_dependents(&mut self, dependents: &[PathBuf], new_target: &Path) -> Result<()> {
        for link in dependents {
            if self.deleted.contains(link) {
                continue;
            }
            if self.delete_symlinks_instead_of_relinking
                && !self.groups.must_protect.symlinks.contains_key(link)
            {
                self.delete_link(link)?;
            } else {
                self.relink_one(link, new_target)?;
            }
        }
        Ok(())
    }

    /// Point `link` at `new_target` and re-index it under it. The link text
    /// stays relative when the link lives in the target's own directory.
    fn relink_one(&mut self, link: &Path, new_target: &Path) -> Result<()> {
        let text = link_text_for(link, new_target);
        self.trace(&format!(
            "relinking: {} -> {}",
            link.display(),
            text.display()
        ));
        if !self.dry_run {
            std::fs::remove_file(link)
                .map_err(|e| FileGroupsError::io_with_context(e, link.to_path_buf(), "unlink"))?;
            make_symlink(&text, link)
                .map_err(|e| FileGroupsError::io_with_context(e, link.to_path_buf(), "symlink"))?;
        }

        self.link_index
            .entry(new_target.to_path_buf())
            .or_default()
            .push(link.to_path_buf());
        self.counters.num_symlinks_relinked += 1;
        Ok(())
    }

    fn delete_link(&mut self, link: &Path) -> Result<()> {
        self.info(&format!("deleting symlink: {}", link.display()));
        if !self.dry_run {
            std::fs::remove_file(link)
                .map_err(|e| FileGroupsError::io_with_context(e, link.to_path_buf(), "unlink"))?;
        }
        self.deleted.insert(link.to_path_buf());
        self.counters.num_symlinks_deleted += 1;
        Ok(())
    }

    fn info(&self, text: &str) {
        if self.dry_run {
            self.sink.line(&format!("DRY: {text}"));
        } else {
            self.sink.line(text);
        }
    }

    fn trace(&self, text: &str) {
        if self.debug {
            self.sink.line(text);
        }
    }
}

/// Prints the handler counters when dropped.
pub struct StatsScope<'a, F: FileSystem> {
    handler: &'a FileHandler<F>,
}

impl<F: FileSystem> Drop for StatsScope<'_, F> {
    fn drop(&mut self) {
        let handler = self.handler;
        let c = &handler.counters;
        if handler.dry_run {
            handler.sink.line("DRY RUN statistics (projected):");
        } else {
            handler.sink.line("statistics:");
        }
        handler.sink.line(&format!("  deleted: {}", c.num_deleted));
        handler.sink.line(&format!("  renamed: {}", c.num_renamed));
        handler.sink.line(&format!("  moved: {}", c.num_moved));
        handler
            .sink
            .line(&format!("  symlinks relinked: {}", c.num_symlinks_relinked));
        handler
            .sink
            .line(&format!("  symlinks deleted: {}", c.num_symlinks_deleted));
        handler.sink.line(&format!(
            "  symlinks left dangling: {}",
            c.num_symlinks_dangling
        ));
    }
}

fn merged_link_index(groups: &FileGroups<impl FileSystem>) -> HashMap<PathBuf, Vec<PathBuf>> {
    let mut index: HashMap<PathBuf, Vec<PathBuf>> = HashMap::new();
    for group in [&groups.must_protect, &groups.may_work_on] {
        for (target, links) in &group.symlinks_by_target {
            index
                .entry(target.clone())
                .or_default()
                .extend(links.iter().cloned());
        }
    }
    index
}

/// New link text for `link` pointing at `target`: the bare basename when the
/// link lives in the target's directory, the absolute path otherwise.
fn link_text_for(link: &Path, target: &Path) -> PathBuf {
    if link.parent() == target.parent()
        && let Some(name) = target.file_name()
    {
        return PathBuf::from(name);
    }
    target.to_path_buf()
}

#[cfg(unix)]
fn make_symlink(text: &Path, link: &Path) -> std::io::Result<()> {
    std::os::unix::fs::symlink(text, link)
}

#[cfg(windows)]
fn make_symlink(text: &Path, link: &Path) -> std::io::Result<()> {
    std::os::windows::fs::symlink_file(text, link)
}

#[cfg(test)]
mod test_support;
