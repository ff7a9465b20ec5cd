//! Hierarchical resolution of protection-pattern config files.
//!
//! Config files are searched for in the platform config directories AND in
//! every collected directory. Per-directory configs merge with their parent
//! directory's effective config; `global` patterns from config-directory
//! files are promoted into every directory's `recursive` set.

use std::path::{Path, PathBuf};
use std::sync::Arc;

use indexmap::{IndexMap, IndexSet};
use regex::Regex;

use crate::error::{FileGroupsError, Result};
use crate::output::{InfoSink, default_sink};
use crate::pattern::ProtectPattern;

use super::filesystem::{FileSystem, RealFileSystem};
use super::model::{DirConfig, RawConfig, RawProtect};

/// Recognized config file names. At most one may exist per directory.
pub const CONF_FILE_NAMES: [&str; 2] = [".file_groups.conf", "file_groups.conf"];

/// Construction options for [`ConfigResolver`].
pub struct ResolverOptions {
    /// Patterns added to every directory's `recursive` set.
    pub protect: Vec<Regex>,
    /// Ignore config files in the platform config directories.
    pub ignore_config_dirs_config_files: bool,
    /// Ignore config files in collected directories.
    pub ignore_per_directory_config_files: bool,
    /// Retain every produced [`DirConfig`] for post-hoc inspection.
    pub remember_configs: bool,
    /// Be extremely verbose.
    pub debug: bool,
    /// Informational channel.
    pub sink: Arc<dyn InfoSink>,
}

impl Default for ResolverOptions {
    fn default() -> Self {
        Self {
            protect: Vec::new(),
            ignore_config_dirs_config_files: false,
            ignore_per_directory_config_files: false,
            remember_configs: false,
            debug: false,
            sink: default_sink(),
        }
    }
}

/// Produces the effective [`DirConfig`] for every directory encountered
/// during a walk.
#[derive(Debug)]
pub struct ConfigResolver<F: FileSystem = RealFileSystem> {
    fs: F,
    ignore_per_directory_config_files: bool,
    remember_configs: bool,
    debug: bool,
    sink: Arc<dyn InfoSink>,
    global_config: DirConfig,
    per_dir_configs: IndexMap<PathBuf, Arc<DirConfig>>,
}

impl ConfigResolver<RealFileSystem> {
    /// Create a resolver against the real filesystem, reading the platform
    /// config directories unless disabled.
    pub fn new(options: ResolverOptions) -> Result<Self> {
        Self::with_fs(RealFileSystem, options)
    }
}

impl<F: FileSystem> ConfigResolver<F> {
    /// Create a resolver against an injected filesystem.
    pub fn with_fs(fs: F, options: ResolverOptions) -> Result<Self> {
        let mut resolver = Self {
            fs,
            ignore_per_directory_config_files: options.ignore_per_directory_config_files,
            remember_configs: options.remember_configs,
            debug: options.debug,
            sink: options.sink,
            global_config: DirConfig {
                local: IndexSet::new(),
                recursive: options.protect.into_iter().map(ProtectPattern::from).collect(),
            },
            per_dir_configs: IndexMap::new(),
        };

        if !options.ignore_config_dirs_config_files {
            resolver.load_config_dirs()?;
        }

        Ok(resolver)
    }

    /// The config every directory inherits when it has no parent inside the
    /// collected roots: caller-supplied patterns plus promoted `global` ones.
    #[must_use]
    pub const fn global_config(&self) -> &DirConfig {
        &self.global_config
    }

    /// Remembered per-directory configs, in resolution order.
    /// Populated only when `remember_configs` is set.
    #[must_use]
    pub const fn per_dir_configs(&self) -> &IndexMap<PathBuf, Arc<DirConfig>> {
        &self.per_dir_configs
    }

    /// Read and merge the config file (if any) of `dir` with the effective
    /// config of its parent directory.
    ///
    /// For a directory with no parent among the collected roots, pass
    /// [`Self::global_config`] as `parent`.
    pub fn dir_config(&mut self, dir: &Path, parent: &DirConfig) -> Result<Arc<DirConfig>> {
        let config = match self.single_conf_file(dir, self.ignore_per_directory_config_files)? {
            None => DirConfig::inherited(parent),
            Some((content, file)) => {
                let table = self.parse_protect_table(&content, &file, false)?;
                let mut recursive = compile_patterns(table.recursive)?;
                recursive.extend(parent.recursive.iter().cloned());
                DirConfig {
                    local: compile_patterns(table.local)?,
                    recursive,
                }
            }
        };

        let config = Arc::new(config);
        if self.remember_configs {
            self.per_dir_configs.insert(dir.to_path_buf(), Arc::clone(&config));
        }
        Ok(config)
    }

    /// Load the platform config-directory files, promoting their `global`
    /// patterns into [`Self::global_config`].
    fn load_config_dirs(&mut self) -> Result<()> {
        let config_dirs = self.fs.config_dirs();
        self.trace(&format!("config_dirs: {config_dirs:?}"));

        for conf_dir in config_dirs {
            if !self.fs.is_dir(&conf_dir) {
                continue;
            }

            let Some((content, file)) = self.single_conf_file(&conf_dir, false)? else {
                continue;
            };

            let table = self.parse_protect_table(&content, &file, true)?;
            let mut recursive = compile_patterns(table.recursive)?;
            recursive.extend(self.global_config.recursive.iter().cloned());

            if self.remember_configs {
                let stored = DirConfig {
                    local: compile_patterns(table.local)?,
                    recursive,
                };
                self.per_dir_configs.insert(conf_dir, Arc::new(stored));
            }

            if let Some(global) = table.global {
                self.global_config.recursive.extend(compile_patterns(global)?);
            }
        }

        Ok(())
    }

    /// Return the config file content and path if any config file is found in
    /// `dir`. Error if two are found.
    fn single_conf_file(&self, dir: &Path, ignore: bool) -> Result<Option<(String, PathBuf)>> {
        let present: Vec<PathBuf> = CONF_FILE_NAMES
            .iter()
            .map(|name| dir.join(name))
            .filter(|path| self.fs.is_file(path))
            .collect();

        match present.as_slice() {
            [] => Ok(None),
            [file] => {
                if ignore {
                    self.trace(&format!("Ignoring config file: {}", file.display()));
                    return Ok(None);
                }
                let content = self
                    .fs
                    .read_to_string(file)
                    .map_err(|e| FileGroupsError::io_with_path(e, file.clone()))?;
                self.trace(&format!("Read config file: {}", file.display()));
                Ok(Some((content, file.clone())))
            }
            _ => Err(FileGroupsError::Config(format!(
                "More than one config file in '{}': {CONF_FILE_NAMES:?}.",
                dir.display()
            ))),
        }
    }

    /// Parse and schema-check the `[file_groups.protect]` table.
    fn parse_protect_table(
        &self,
        content: &str,
        file: &Path,
        allow_global: bool,
    ) -> Result<RawProtect> {
        let raw: RawConfig = toml::from_str(content).map_err(|e| {
            FileGroupsError::Config(format!("Config file '{}': {e}", file.display()))
        })?;

        let protect = raw
            .file_groups
            .and_then(|fg| fg.protect)
            .ok_or_else(|| {
                FileGroupsError::Config(format!(
                    "Config file '{}' is missing mandatory 'file_groups.protect' table.",
                    file.display()
                ))
            })?;

        if !allow_global && protect.global.is_some() {
            return Err(FileGroupsError::Config(format!(
                "'global' protect patterns are only allowed in config-directory files. Got 'global' in '{}'.",
                file.display()
            )));
        }

        self.trace(&format!("Validated config file: {}", file.display()));
        Ok(protect)
    }

    fn trace(&self, text: &str) {
        if self.debug {
            self.sink.line(text);
        }
    }
}

fn compile_patterns(patterns: Vec<String>) -> Result<IndexSet<ProtectPattern>> {
    patterns.iter().map(|p| ProtectPattern::new(p)).collect()
}

#[cfg(test)]
#[path = "resolver_tests.rs"]
mod tests;
