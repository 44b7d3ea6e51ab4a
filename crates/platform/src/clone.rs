//! Copy-on-write file cloning.
//!
//! On Linux the clone is an `FICLONE` ioctl from a freshly created
//! destination onto the source descriptor; on macOS it is `clonefile(2)`.
//! Both require source and destination on the same filesystem and a
//! filesystem that shares extents (Btrfs, XFS with reflink, APFS, ...).
//! Filesystems without extent sharing report `EOPNOTSUPP`/`ENOTSUP`, which
//! surfaces as [`io::ErrorKind::Unsupported`] just like a missing primitive.

use std::io;
use std::path::Path;

/// Whether this build carries a copy-on-write clone primitive at all.
pub const CLONE_AVAILABLE: bool = cfg!(any(target_os = "linux", target_os = "macos"));

/// Reason reported when [`CLONE_AVAILABLE`] is false.
pub const CLONE_UNSUPPORTED_REASON: &str =
    "copy-on-write cloning is not available on this platform";

/// Clones `src` into a new file at `dst` sharing its data blocks.
///
/// `dst` must not exist. A partially created destination is removed before
/// the error is returned.
///
/// # Errors
///
/// - [`io::ErrorKind::Unsupported`] when the platform or the filesystem has
///   no clone support.
/// - [`io::ErrorKind::AlreadyExists`] when `dst` exists.
/// - Any other error from opening the source or creating the destination,
///   including `EXDEV` for cross-filesystem pairs.
pub fn clone_file(src: &Path, dst: &Path) -> io::Result<()> {
    clone_file_impl(src, dst)
}

#[cfg(target_os = "linux")]
fn clone_file_impl(src: &Path, dst: &Path) -> io::Result<()> {
    use std::fs::{File, OpenOptions};

    let source = File::open(src)?;
    let destination = OpenOptions::new().write(true).create_new(true).open(dst)?;

    match rustix::fs::ioctl_ficlone(&destination, &source) {
        Ok(()) => Ok(()),
        Err(errno) => {
            drop(destination);
            let _ = std::fs::remove_file(dst);
            Err(io::Error::from(errno))
        }
    }
}

#[cfg(target_os = "macos")]
#[allow(unsafe_code)]
fn clone_file_impl(src: &Path, dst: &Path) -> io::Result<()> {
    use std::ffi::CString;
    use std::os::unix::ffi::OsStrExt;

    let src_c = CString::new(src.as_os_str().as_bytes()).map_err(|_| {
        io::Error::new(
            io::ErrorKind::InvalidInput,
            "source path contains null byte",
        )
    })?;
    let dst_c = CString::new(dst.as_os_str().as_bytes())
        .map_err(|_| io::Error::new(io::ErrorKind::InvalidInput, "dest path contains null byte"))?;

    // SAFETY: both pointers come from live CStrings; clonefile reports failure
    // through errno and never retains the pointers.
    let ret = unsafe { libc::clonefile(src_c.as_ptr(), dst_c.as_ptr(), 0) };

    if ret == 0 {
        Ok(())
    } else {
        Err(io::Error::last_os_error())
    }
}

#[cfg(not(any(target_os = "linux", target_os = "macos")))]
fn clone_file_impl(_src: &Path, _dst: &Path) -> io::Result<()> {
    Err(io::Error::new(
        io::ErrorKind::Unsupported,
        CLONE_UNSUPPORTED_REASON,
    ))
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    #[test]
    fn clone_missing_source_fails_without_creating_destination() {
        let temp = TempDir::new().expect("create temp dir");
        let src = temp.path().join("missing.txt");
        let dst = temp.path().join("dst.txt");

        assert!(clone_file(&src, &dst).is_err());
        assert!(!dst.exists(), "no destination should be left behind");
    }

    #[test]
    fn clone_refuses_existing_destination() {
        let temp = TempDir::new().expect("create temp dir");
        let src = temp.path().join("src.txt");
        let dst = temp.path().join("dst.txt");
        std::fs::write(&src, b"source").expect("write source");
        std::fs::write(&dst, b"occupied").expect("write destination");

        assert!(clone_file(&src, &dst).is_err());
        assert_eq!(std::fs::read(&dst).expect("read destination"), b"occupied");
    }

    #[test]
    fn clone_either_succeeds_with_identical_content_or_cleans_up() {
        let temp = TempDir::new().expect("create temp dir");
        let src = temp.path().join("src.bin");
        let dst = temp.path().join("dst.bin");
        std::fs::write(&src, vec![0xAB_u8; 64 * 1024]).expect("write source");

        match clone_file(&src, &dst) {
            Ok(()) => {
                let content = std::fs::read(&dst).expect("read clone");
                assert_eq!(content, std::fs::read(&src).expect("read source"));
            }
            Err(_) => assert!(!dst.exists(), "failed clone must not leave a file"),
        }
    }

    #[cfg(not(any(target_os = "linux", target_os = "macos")))]
    #[test]
    fn clone_reports_unsupported_without_primitive() {
        let temp = TempDir::new().expect("create temp dir");
        let src = temp.path().join("src.txt");
        std::fs::write(&src, b"data").expect("write source");

        let err = clone_file(&src, &temp.path().join("dst.txt")).unwrap_err();
        assert_eq!(err.kind(), io::ErrorKind::Unsupported);
        assert!(!CLONE_AVAILABLE);
    }
}
