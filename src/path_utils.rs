use std::path::{Component, Path, PathBuf};

/// Resolve `.` and `..` components lexically, without touching the filesystem.
///
/// Symlinks are deliberately NOT resolved: a symlink must be addressable as an
/// operand without collapsing to its target, and link targets are indexed by
/// their lexical (one readlink hop) form.
#[must_use]
pub fn normalize_lexical(path: &Path) -> PathBuf {
    let mut out = PathBuf::new();
    for component in path.components() {
        match component {
            Component::CurDir => {}
            Component::ParentDir => {
                if !out.pop() {
                    out.push(Component::ParentDir);
                }
            }
            other => out.push(other),
        }
    }
    out
}

/// Make `path` absolute against the current working directory and normalize it
/// lexically. Does not require the path to exist.
///
/// # Errors
/// Returns an error if the current working directory cannot be determined.
pub fn absolutize(path: &Path) -> std::io::Result<PathBuf> {
    if path.is_absolute() {
        return Ok(normalize_lexical(path));
    }
    Ok(normalize_lexical(&std::env::current_dir()?.join(path)))
}

/// Lexical target of a symlink: the link's readlink text joined onto the
/// link's own directory and normalized. One hop only; chained symlinks each
/// contribute their own lexical target.
#[must_use]
pub fn lexical_target(link_dir: &Path, readlink: &Path) -> PathBuf {
    normalize_lexical(&link_dir.join(readlink))
}
