//! Link count and file identity lookups.

use std::fs::Metadata;

/// Device and inode pair identifying a unique file.
///
/// Two directory entries with equal identities are hard links to the same
/// underlying file. Entries on different devices are always distinct even
/// when their inode numbers match.
#[derive(Debug, Clone, Copy, Hash, Eq, PartialEq)]
pub struct FileIdentity {
    /// Device number (`st_dev`).
    pub dev: u64,
    /// Inode number (`st_ino`).
    pub ino: u64,
}

impl FileIdentity {
    /// Creates an identity from device and inode numbers.
    #[must_use]
    pub const fn new(dev: u64, ino: u64) -> Self {
        Self { dev, ino }
    }
}

/// Returns the number of hard links recorded for `metadata`.
#[cfg(unix)]
#[must_use]
pub fn link_count(metadata: &Metadata) -> u64 {
    use std::os::unix::fs::MetadataExt;
    metadata.nlink()
}

/// Returns the number of hard links recorded for `metadata`.
///
/// The link count is not exposed by the standard library on this platform,
/// so every file reports a single link.
#[cfg(not(unix))]
#[must_use]
pub fn link_count(_metadata: &Metadata) -> u64 {
    1
}

/// Returns the `(device, inode)` identity of `metadata`.
#[cfg(unix)]
#[must_use]
pub fn file_identity(metadata: &Metadata) -> Option<FileIdentity> {
    use std::os::unix::fs::MetadataExt;
    Some(FileIdentity::new(metadata.dev(), metadata.ino()))
}

/// Returns the `(device, inode)` identity of `metadata`.
///
/// Always `None` where the standard library does not expose inode numbers.
#[cfg(not(unix))]
#[must_use]
pub fn file_identity(_metadata: &Metadata) -> Option<FileIdentity> {
    None
}
