#![deny(unsafe_code)]
#![deny(missing_docs)]
#![deny(rustdoc::broken_intra_doc_links)]

//! crates/platform/src/lib.rs
//!
//! # Overview
//!
//! `platform` isolates the operating-system specific filesystem primitives
//! used by the rest of the workspace so the portable crates never embed a
//! syscall directly:
//!
//! - [`link_count`] reads the hard link count of a file.
//! - [`file_identity`] returns the `(device, inode)` pair that decides
//!   whether two directory entries name the same file.
//! - [`clone_file`] performs a copy-on-write clone where the platform has one.
//!
//! # Platform Support
//!
//! - **Linux**: `FICLONE` ioctl via `rustix` (Btrfs, XFS, bcachefs, ...).
//! - **macOS**: `clonefile(2)` (APFS).
//! - **Other platforms**: cloning always fails with
//!   [`std::io::ErrorKind::Unsupported`]; link counts fall back to `1` and
//!   file identity is unavailable outside Unix.

mod clone;
mod links;

pub use clone::{CLONE_AVAILABLE, CLONE_UNSUPPORTED_REASON, clone_file};
pub use links::{FileIdentity, file_identity, link_count};
