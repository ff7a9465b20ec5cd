use std::fmt;
use std::hash::{Hash, Hasher};
use std::path::{MAIN_SEPARATOR, Path};

use regex::Regex;

use crate::error::{FileGroupsError, Result};

/// A compiled protection pattern.
///
/// If the pattern's textual form contains a path separator it is matched
/// against an entry's full absolute path, otherwise against the basename.
/// Matching is a regex search (unanchored) — better to protect too much than
/// too little; anchor the pattern explicitly when a full match is intended.
///
/// Equality and hashing use the pattern source text, so identical patterns
/// from different configuration layers deduplicate under set semantics.
#[derive(Debug, Clone)]
pub struct ProtectPattern {
    regex: Regex,
    matches_full_path: bool,
}

impl ProtectPattern {
    /// Compile a pattern.
    pub fn new(pattern: &str) -> Result<Self> {
        let regex = Regex::new(pattern).map_err(|source| FileGroupsError::InvalidPattern {
            pattern: pattern.to_string(),
            source,
        })?;
        Ok(Self::from(regex))
    }

    /// The pattern source text.
    #[must_use]
    pub fn as_str(&self) -> &str {
        self.regex.as_str()
    }

    /// Test an absolute path against this pattern.
    #[must_use]
    pub fn matches(&self, path: &Path) -> bool {
        debug_assert!(path.is_absolute(), "expected absolute path, got '{}'", path.display());

        if self.matches_full_path {
            return self.regex.is_match(&path.to_string_lossy());
        }

        path.file_name()
            .is_some_and(|name| self.regex.is_match(&name.to_string_lossy()))
    }
}

impl From<Regex> for ProtectPattern {
    fn from(regex: Regex) -> Self {
        let matches_full_path = regex.as_str().contains(MAIN_SEPARATOR);
        Self {
            regex,
            matches_full_path,
        }
    }
}

impl fmt::Display for ProtectPattern {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.regex.as_str())
    }
}

impl PartialEq for ProtectPattern {
    fn eq(&self, other: &Self) -> bool {
        self.regex.as_str() == other.regex.as_str()
    }
}

impl Eq for ProtectPattern {}

impl Hash for ProtectPattern {
    fn hash<H: Hasher>(&self, state: &mut H) {
        self.regex.as_str().hash(state);
    }
}

#[cfg(test)]
#[path = "pattern_tests.rs"]
mod tests;
