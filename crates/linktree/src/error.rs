//! crates/linktree/src/error.rs
//!
//! Error types for tree materialization.

use std::fmt;
use std::io;
use std::path::PathBuf;

use thiserror::Error;

/// Result type for link tree operations.
pub type LinkTreeResult<T> = Result<T, LinkTreeError>;

/// Errors produced while validating, materializing or rolling back a
/// [`TreePlan`](crate::TreePlan).
#[derive(Debug, Error)]
pub enum LinkTreeError {
    /// The plan has an empty root directory.
    #[error("tree plan has no root directory")]
    EmptyRoot,
    /// The plan lists no files.
    #[error("tree plan contains no files")]
    NoFiles,
    /// A target escapes the plan's root directory.
    #[error("target {} lies outside root {}", target.display(), root.display())]
    OutsideRoot {
        /// Offending target path.
        target: PathBuf,
        /// Root directory of the plan.
        root: PathBuf,
    },
    /// A directory could not be created.
    #[error("failed to create directory {}: {source}", path.display())]
    CreateDir {
        /// Directory being created.
        path: PathBuf,
        /// Underlying error.
        source: io::Error,
    },
    /// A path could not be inspected.
    #[error("failed to stat {}: {source}", path.display())]
    Stat {
        /// Path being inspected.
        path: PathBuf,
        /// Underlying error.
        source: io::Error,
    },
    /// A different file already occupies the target path.
    #[error("target {} already exists and is not linked to {}", target.display(), origin.display())]
    TargetExists {
        /// Occupied target path.
        target: PathBuf,
        /// Source the target should have linked to.
        origin: PathBuf,
    },
    /// Creating the link failed.
    #[error("failed to link {} to {}: {source}", origin.display(), target.display())]
    Link {
        /// Source file.
        origin: PathBuf,
        /// Target path.
        target: PathBuf,
        /// Underlying error.
        source: io::Error,
    },
    /// Copy-on-write cloning is unavailable on this platform or filesystem.
    #[error("reflink is not supported on this platform or filesystem")]
    ReflinkUnsupported,
    /// A standalone rollback left paths behind.
    #[error(transparent)]
    Rollback(#[from] RollbackError),
    /// Materialization failed and the rollback that followed failed too.
    #[error("{cause}; rollback also failed: {rollback}")]
    RollbackFailed {
        /// The failure that triggered the rollback.
        #[source]
        cause: Box<LinkTreeError>,
        /// What the rollback could not remove.
        rollback: RollbackError,
    },
}

impl LinkTreeError {
    /// True for validation failures raised before any filesystem mutation.
    pub const fn is_invalid_plan(&self) -> bool {
        matches!(
            self,
            Self::EmptyRoot | Self::NoFiles | Self::OutsideRoot { .. }
        )
    }

    /// The failure that triggered a rollback, or `self` when no rollback
    /// failure is attached.
    pub fn root_cause(&self) -> &Self {
        match self {
            Self::RollbackFailed { cause, .. } => cause.root_cause(),
            other => other,
        }
    }

    /// The attached rollback failure, if any.
    pub const fn rollback_error(&self) -> Option<&RollbackError> {
        match self {
            Self::Rollback(rollback) | Self::RollbackFailed { rollback, .. } => Some(rollback),
            _ => None,
        }
    }
}

/// A path rollback could not remove.
#[derive(Debug)]
pub struct RemovalFailure {
    /// The file or directory left behind.
    pub path: PathBuf,
    /// Why removal failed.
    pub error: io::Error,
}

/// Every removal failure from one best-effort rollback.
#[derive(Debug, Default)]
pub struct RollbackError {
    failures: Vec<RemovalFailure>,
}

impl RollbackError {
    pub(crate) fn push(&mut self, path: PathBuf, error: io::Error) {
        self.failures.push(RemovalFailure { path, error });
    }

    pub(crate) fn into_result(self) -> Result<(), Self> {
        if self.failures.is_empty() {
            Ok(())
        } else {
            Err(self)
        }
    }

    /// The individual failures, in removal order.
    pub fn failures(&self) -> &[RemovalFailure] {
        &self.failures
    }
}

impl fmt::Display for RollbackError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "failed to remove {} path(s)", self.failures.len())?;
        for (index, failure) in self.failures.iter().enumerate() {
            let sep = if index == 0 { ": " } else { "; " };
            write!(f, "{sep}{}: {}", failure.path.display(), failure.error)?;
        }
        Ok(())
    }
}

impl std::error::Error for RollbackError {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        self.failures
            .first()
            .map(|failure| &failure.error as &(dyn std::error::Error + 'static))
    }
}
