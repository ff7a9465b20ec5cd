//! Filesystem abstraction for testability.
//!
//! Config-directory discovery is process-wide input; routing it through a
//! trait keeps it injectable instead of hard-coded.

use std::path::{Path, PathBuf};

/// Trait for the filesystem operations the config resolver needs.
pub trait FileSystem {
    /// Read file contents as a string.
    ///
    /// # Errors
    /// Returns an error if the file cannot be read.
    fn read_to_string(&self, path: &Path) -> std::io::Result<String>;

    /// Check if a path exists and is a regular file.
    fn is_file(&self, path: &Path) -> bool;

    /// Check if a path exists and is a directory.
    fn is_dir(&self, path: &Path) -> bool;

    /// Platform configuration directories to search for `file_groups.conf`,
    /// site directories first, the per-user directory last.
    ///
    /// - Site: each entry of `XDG_CONFIG_DIRS` (colon-separated, default
    ///   `/etc/xdg`) joined with `file_groups`.
    /// - User: the platform config dir, e.g. `~/.config/file_groups` on Linux.
    fn config_dirs(&self) -> Vec<PathBuf>;
}

/// Real filesystem implementation.
#[derive(Debug, Default, Clone, Copy)]
pub struct RealFileSystem;

impl FileSystem for RealFileSystem {
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
        let mut dirs = Vec::new();

        let site = std::env::var("XDG_CONFIG_DIRS").unwrap_or_else(|_| "/etc/xdg".to_string());
        for entry in site.split(':').filter(|s| !s.is_empty()) {
            dirs.push(Path::new(entry).join("file_groups"));
        }

        if let Some(proj) = directories::ProjectDirs::from("", "", "file_groups") {
            dirs.push(proj.config_dir().to_path_buf());
        }

        dirs
    }
}
