//! crates/linktree/src/reflink.rs
//!
//! Copy-on-write (reflink) trees.
//!
//! Each target is an independent file whose data blocks are shared with the
//! source until either side is modified. Unlike a hardlink, editing the
//! target never alters the source, which makes reflinks the safer choice
//! when a downstream tool may rewrite files in place.
//!
//! # Platform Support
//!
//! - **Linux**: `FICLONE` on Btrfs, XFS (reflink=1), bcachefs and others
//! - **macOS**: `clonefile()` on APFS
//! - **Other platforms**: never supported; [`supports_reflink`] says so
//!   without probing and [`clone_file`] fails with
//!   [`LinkTreeError::ReflinkUnsupported`]
//!
//! Support is a property of the filesystem as much as of the platform, so
//! callers should run [`supports_reflink`] against the intended root before
//! choosing [`LinkMode::Reflink`](crate::LinkMode::Reflink).

use std::fmt;
use std::io;
use std::path::Path;

use crate::error::{LinkTreeError, LinkTreeResult};
use crate::linker::ReflinkLinker;
use crate::materialize;
use crate::plan::TreePlan;

const PROBE_PREFIX: &str = ".reflink-probe-";
const PROBE_PAYLOAD: &[u8] = b"reflink capability probe\n";

/// Outcome of [`supports_reflink`].
#[derive(Clone, Debug, Eq, PartialEq)]
pub struct ReflinkSupport {
    /// Whether a clone succeeded inside the probed directory.
    pub supported: bool,
    /// Human-readable explanation, never empty.
    pub reason: String,
}

impl ReflinkSupport {
    fn supported(dir: &Path) -> Self {
        Self {
            supported: true,
            reason: format!("copy-on-write clone succeeded in {}", dir.display()),
        }
    }

    fn unsupported(reason: impl Into<String>) -> Self {
        Self {
            supported: false,
            reason: reason.into(),
        }
    }
}

impl fmt::Display for ReflinkSupport {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let verdict = if self.supported {
            "supported"
        } else {
            "unsupported"
        };
        write!(f, "reflink {verdict}: {}", self.reason)
    }
}

/// Clones `src` to the new file `dst` with copy-on-write.
///
/// # Errors
///
/// [`LinkTreeError::ReflinkUnsupported`] when the platform or filesystem
/// cannot clone; [`LinkTreeError::Link`] for every other failure (missing
/// source, existing destination, cross-device pair, ...).
pub fn clone_file(src: &Path, dst: &Path) -> LinkTreeResult<()> {
    platform::clone_file(src, dst).map_err(|err| {
        if err.kind() == io::ErrorKind::Unsupported {
            LinkTreeError::ReflinkUnsupported
        } else {
            LinkTreeError::Link {
                origin: src.to_path_buf(),
                target: dst.to_path_buf(),
                source: err,
            }
        }
    })
}

/// Checks whether files in `dir` can be cloned by cloning a throwaway pair.
///
/// The probe runs in a temporary directory created inside `dir` and removed
/// afterwards. The filesystem type is not consulted; only a real clone is
/// conclusive.
pub fn supports_reflink(dir: &Path) -> ReflinkSupport {
    if !platform::CLONE_AVAILABLE {
        return ReflinkSupport::unsupported(platform::CLONE_UNSUPPORTED_REASON);
    }

    let outcome = probe(dir);
    tracing::info!(
        dir = %dir.display(),
        supported = outcome.supported,
        reason = %outcome.reason,
        "reflink probe finished"
    );
    outcome
}

fn probe(dir: &Path) -> ReflinkSupport {
    let scratch = match tempfile::Builder::new().prefix(PROBE_PREFIX).tempdir_in(dir) {
        Ok(scratch) => scratch,
        Err(err) => {
            return ReflinkSupport::unsupported(format!(
                "cannot create probe directory in {}: {err}",
                dir.display()
            ));
        }
    };

    let src = scratch.path().join("src");
    let dst = scratch.path().join("dst");
    if let Err(err) = std::fs::write(&src, PROBE_PAYLOAD) {
        return ReflinkSupport::unsupported(format!("cannot write probe file: {err}"));
    }

    let outcome = match platform::clone_file(&src, &dst) {
        Ok(()) => ReflinkSupport::supported(dir),
        Err(err) if err.kind() == io::ErrorKind::Unsupported => ReflinkSupport::unsupported(
            format!("filesystem at {} does not support cloning: {err}", dir.display()),
        ),
        Err(err) => ReflinkSupport::unsupported(format!("probe clone failed: {err}")),
    };

    if let Err(err) = scratch.close() {
        tracing::warn!(dir = %dir.display(), error = %err, "could not remove reflink probe directory");
    }
    outcome
}

/// Creates `plan` with copy-on-write clones; see
/// [`create_with`](crate::create_with).
///
/// A target already present as a separate clone is a distinct inode and is
/// therefore reported as [`LinkTreeError::TargetExists`]; only a target that
/// is literally the source file counts as done.
pub fn create(plan: &TreePlan) -> LinkTreeResult<()> {
    materialize::create_with(plan, &ReflinkLinker)
}

/// Removes a reflink tree; see [`rollback`](crate::rollback).
pub fn rollback(plan: &TreePlan) -> LinkTreeResult<()> {
    materialize::rollback(plan)
}
