//! crates/linktree/src/detect.rs
//! Read-only hardlink detection.

use std::path::{MAIN_SEPARATOR, Path, PathBuf};

/// Returns true if any listed path is a regular file with more than one hard
/// link.
///
/// Paths may use either `/` or `\` as separator and may be relative to
/// `base`. Symlinks are not followed. Entries that cannot be inspected, and
/// entries that are not regular files, are skipped. The scan stops at the
/// first match.
///
/// # Examples
///
/// ```
/// use linktree::is_any_hardlinked;
///
/// let temp = tempfile::tempdir()?;
/// std::fs::write(temp.path().join("a.mkv"), b"data")?;
/// assert!(!is_any_hardlinked(temp.path(), &["a.mkv"]));
///
/// std::fs::hard_link(temp.path().join("a.mkv"), temp.path().join("b.mkv"))?;
/// assert!(is_any_hardlinked(temp.path(), &["a.mkv"]));
/// # Ok::<(), std::io::Error>(())
/// ```
pub fn is_any_hardlinked<P: AsRef<str>>(base: &Path, paths: &[P]) -> bool {
    paths.iter().any(|path| {
        let resolved = resolve(base, path.as_ref());
        let Ok(metadata) = std::fs::symlink_metadata(&resolved) else {
            return false;
        };
        metadata.is_file() && platform::link_count(&metadata) > 1
    })
}

fn resolve(base: &Path, raw: &str) -> PathBuf {
    let normalized: String = raw
        .chars()
        .map(|c| if c == '/' || c == '\\' { MAIN_SEPARATOR } else { c })
        .collect();
    let path = Path::new(&normalized);
    if path.is_absolute() {
        path.to_path_buf()
    } else {
        base.join(path)
    }
}
