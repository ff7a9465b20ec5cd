//! Shared fixtures for the handler tests: real temp trees with files and
//! symlinks, collected into groups with host configuration pinned out.

use std::path::{Path, PathBuf};
use std::sync::Arc;

use tempfile::TempDir;

use crate::config::{ConfigResolver, FileSystem, ResolverOptions};
use crate::groups::{FileGroups, GroupsOptions};
use crate::output::capture::CaptureSink;

use super::{FileHandler, HandlerOptions};

/// Resolver filesystem reading the real disk but with no config dirs, so the
/// host's configuration never leaks into tests.
pub struct NoConfigFs;

impl FileSystem for NoConfigFs {
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
        Vec::new()
    }
}

pub struct Fixture {
    _dir: TempDir,
    pub top: PathBuf,
    pub sink: Arc<CaptureSink>,
}

impl Fixture {
    /// Create a temp tree with `files` (content "Hi") and `links`, given as
    /// (readlink text, link path) pairs like the scenarios in the docs.
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

    /// Collect groups over `protect`/`work` subdirectories and wrap them in a
    /// handler. The fixture's capture sink is wired into everything.
    pub fn handler(
        &self,
        protect: &[&str],
        work: &[&str],
        mut options: HandlerOptions,
    ) -> FileHandler<NoConfigFs> {
        options.sink = self.sink.clone();

        let resolver = ConfigResolver::with_fs(
            NoConfigFs,
            ResolverOptions {
                sink: self.sink.clone(),
                ..Default::default()
            },
        )
        .unwrap();

        let protect: Vec<PathBuf> = protect.iter().map(|p| self.top.join(p)).collect();
        let work: Vec<PathBuf> = work.iter().map(|p| self.top.join(p)).collect();
        let groups = FileGroups::collect(
            &protect,
            &work,
            resolver,
            GroupsOptions {
                sink: self.sink.clone(),
                ..Default::default()
            },
        )
        .unwrap();

        FileHandler::new(groups, options)
    }

    pub fn path(&self, rel: &str) -> PathBuf {
        self.top.join(rel)
    }

    pub fn exists(&self, rel: &str) -> bool {
        self.path(rel).symlink_metadata().is_ok()
    }

    /// Whether `rel` fully resolves (a dangling symlink does not).
    pub fn resolves(&self, rel: &str) -> bool {
        std::fs::metadata(self.path(rel)).is_ok()
    }

    pub fn readlink(&self, rel: &str) -> String {
        std::fs::read_link(self.path(rel))
            .unwrap()
            .to_string_lossy()
            .into_owned()
    }

    /// Number of entries directly in `rel` that resolve to a regular file
    /// (symlinks followed, so dangling links do not count).
    pub fn count_resolving(&self, rel: &str) -> usize {
        std::fs::read_dir(self.path(rel))
            .unwrap()
            .filter_map(std::result::Result::ok)
            .filter(|e| std::fs::metadata(e.path()).is_ok_and(|m| m.is_file()))
            .count()
    }
}
