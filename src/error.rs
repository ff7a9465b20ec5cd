use std::path::PathBuf;

use thiserror::Error;

#[derive(Error, Debug)]
pub enum FileGroupsError {
    #[error("Configuration error: {0}")]
    Config(String),

    #[error("Invalid protect pattern: {pattern}")]
    InvalidPattern {
        pattern: String,
        #[source]
        source: regex::Error,
    },

    #[error("Scan failed under '{}'", path.display())]
    Scan {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("Refusing to {operation} protected file '{}': matches regex '{pattern}'", path.display())]
    ProtectViolation {
        path: PathBuf,
        pattern: String,
        operation: &'static str,
    },

    #[error("Refusing to overwrite existing file '{}' with '{}'", dst.display(), src.display())]
    Overwrite { src: PathBuf, dst: PathBuf },

    #[error("{}", format_io_error(source, path, operation))]
    Io {
        #[source]
        source: std::io::Error,
        path: Option<PathBuf>,
        operation: Option<&'static str>,
    },
}

/// Formats IO error with optional context for display.
/// Uses references to Options as required by thiserror's `#[error(...)]` macro expansion.
#[allow(clippy::ref_option, clippy::ref_option_ref)]
fn format_io_error(
    source: &std::io::Error,
    path: &Option<PathBuf>,
    operation: &Option<&'static str>,
) -> String {
    match (path.as_ref(), *operation) {
        (Some(p), Some(op)) => format!("IO error ({op} '{}'): {source}", p.display()),
        (Some(p), None) => format!("IO error ('{}'): {source}", p.display()),
        (None, Some(op)) => format!("IO error ({op}): {source}"),
        (None, None) => format!("IO error: {source}"),
    }
}

impl From<std::io::Error> for FileGroupsError {
    fn from(e: std::io::Error) -> Self {
        Self::Io {
            source: e,
            path: None,
            operation: None,
        }
    }
}

impl FileGroupsError {
    /// Creates an IO error with path context.
    #[must_use]
    pub const fn io_with_path(source: std::io::Error, path: PathBuf) -> Self {
        Self::Io {
            source,
            path: Some(path),
            operation: None,
        }
    }

    /// Creates an IO error with path and operation context.
    #[must_use]
    pub const fn io_with_context(
        source: std::io::Error,
        path: PathBuf,
        operation: &'static str,
    ) -> Self {
        Self::Io {
            source,
            path: Some(path),
            operation: Some(operation),
        }
    }

    /// Returns the error type as a short string identifier.
    #[must_use]
    pub const fn error_type(&self) -> &'static str {
        match self {
            Self::Config(_) => "Config",
            Self::InvalidPattern { .. } => "InvalidPattern",
            Self::Scan { .. } => "Scan",
            Self::ProtectViolation { .. } => "ProtectViolation",
            Self::Overwrite { .. } => "Overwrite",
            Self::Io { .. } => "IO",
        }
    }
}

pub type Result<T> = std::result::Result<T, FileGroupsError>;

#[cfg(test)]
#[path = "error_tests.rs"]
mod tests;
