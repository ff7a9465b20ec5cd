//! Shared helpers for the integration tests: temp trees and a capturing
//! informational sink, driven through the public API only.

#![allow(dead_code)]

use std::path::{Path, PathBuf};
use std::sync::{Arc, Mutex};

use tempfile::TempDir;

use file_groups::{
    ConfigResolver, FileGroups, FileHandler, FileSystem, GroupsOptions, HandlerOptions, InfoSink,
    ResolverOptions,
};

#[derive(Debug, Default)]
pub struct CaptureSink {
    lines: Mutex<Vec<String>>,
}

impl CaptureSink {
    pub fn new() -> Arc<Self> {
        Arc::new(Self::default())
    }

    pub fn lines(&self) -> Vec<String> {
        self.lines.lock().unwrap().clone()
    }

    pub fn contains(&self, needle: &str) -> bool {
        self.lines().iter().any(|l| l.contains(needle))
    }
}

impl InfoSink for CaptureSink {
    fn line(&self, text: &str) {
        self.lines.lock().unwrap().push(text.to_string());
    }
}

/// Resolver filesystem reading the real disk with the config directories
/// pinned (empty by default), so host configuration never leaks into tests.
pub struct PinnedFs {
    pub config_dirs: Vec<PathBuf>,
}

impl PinnedFs {
    pub const fn none() -> Self {
        Self {
            config_dirs: Vec::new(),
        }
    }
}

impl FileSystem for PinnedFs {
    fn read_to_string(&self, path: &Path) -> std::io::Result<String> {
        std::fs::read_to_string(path)
    }

    fn is_file(&self, path: &Path) -> bool {
        path.is_file()
    }

    fn is_dir(&self, path: &Path) -> bool {
        path.is_dir()
    }

    fn config_dirs(&self) -> Vec<PathBuf> {
        self.config_dirs.clone()
    }
}

pub struct Tree {
    _dir: TempDir,
    pub top: PathBuf,
    pub sink: Arc<CaptureSink>,
}

impl Tree {
    /// Create a temp tree with `files` (content "Hi") and `links`, given as
    /// (readlink text, link path) pairs.
    pub fn new(files: &[&str], links: &[(&str, &str)]) -> Self {
        let dir = TempDir::new().unwrap();
        let top = dunce::canonicalize(dir.path()).unwrap();

        for file in files {
            let path = top.join(file);
            std::fs::create_dir_all(path.parent().unwrap()).unwrap();
            std::fs::write(path, "Hi").unwrap();
        }
        for (target, link) in links {
            let link_path = top.join(link);
            std::fs::create_dir_all(link_path.parent().unwrap()).unwrap();
            std::os::unix::fs::symlink(target, link_path).unwrap();
        }

        Self {
            _dir: dir,
            top,
            sink: CaptureSink::new(),
        }
    }

    pub fn write_file(&self, rel: &str, content: &str) {
        let path = self.top.join(rel);
        std::fs::create_dir_all(path.parent().unwrap()).unwrap();
        std::fs::write(path, content).unwrap();
    }

    pub fn path(&self, rel: &str) -> PathBuf {
        self.top.join(rel)
    }

    pub fn exists(&self, rel: &str) -> bool {
        self.path(rel).symlink_metadata().is_ok()
    }

    pub fn readlink(&self, rel: &str) -> String {
        std::fs::read_link(self.path(rel))
            .unwrap()
            .to_string_lossy()
            .into_owned()
    }

    /// Collect groups over `protect`/`work` subdirectories of the tree.
    pub fn collect(
        &self,
        protect: &[&str],
        work: &[&str],
        resolver_options: ResolverOptions,
        groups_options: GroupsOptions,
        config_dirs: Vec<PathBuf>,
    ) -> FileGroups<PinnedFs> {
        let resolver = ConfigResolver::with_fs(PinnedFs { config_dirs }, resolver_options).unwrap();
        let protect: Vec<PathBuf> = protect.iter().map(|p| self.top.join(p)).collect();
        let work: Vec<PathBuf> = work.iter().map(|p| self.top.join(p)).collect();
        FileGroups::collect(&protect, &work, resolver, groups_options).unwrap()
    }

    /// Collect with defaults and wrap in a handler wired to the capture sink.
    pub fn handler(
        &self,
        protect: &[&str],
        work: &[&str],
        mut options: HandlerOptions,
    ) -> FileHandler<PinnedFs> {
        options.sink = self.sink.clone();
        let groups = self.collect(
            protect,
            work,
            ResolverOptions {
                sink: self.sink.clone(),
                ..Default::default()
            },
            GroupsOptions {
                sink: self.sink.clone(),
                ..Default::default()
            },
            Vec::new(),
        );
        FileHandler::new(groups, options)
    }

    /// Relative, sorted paths of a group's collected files.
    pub fn rel_files(&self, files: impl Iterator<Item = PathBuf>) -> Vec<String> {
        let mut rel: Vec<String> = files
            .map(|p| {
                p.strip_prefix(&self.top)
                    .unwrap()
                    .to_string_lossy()
                    .into_owned()
            })
            .collect();
        rel.sort();
        rel
    }
}
