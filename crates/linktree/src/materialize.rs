//! crates/linktree/src/materialize.rs
//!
//! All-or-nothing tree creation with best-effort rollback.
//!
//! # Algorithm
//!
//! 1. Validate the plan; nothing touches the disk if this fails.
//! 2. Create the root and, per file, its parent directory. Directories that
//!    did not exist before are journaled once.
//! 3. Inspect the target without following symlinks:
//!    - a regular file with the source's `(device, inode)` is already done;
//!    - any other existing entry is a conflict;
//!    - a stat failure other than "not found" is fatal;
//!    - otherwise the [`Linker`] creates it and the target is journaled.
//! 4. On failure, remove journaled files, then journaled directories deepest
//!    first. Missing paths and non-empty directories are skipped silently;
//!    anything else is collected into a [`RollbackError`] attached to the
//!    original failure.

use std::cmp::Reverse;
use std::fs::{self, Metadata};
use std::io;
use std::path::{Path, PathBuf};

use rustc_hash::FxHashSet;

use crate::error::{LinkTreeError, LinkTreeResult, RollbackError};
use crate::linker::{LinkMode, Linker};
use crate::plan::TreePlan;

/// Paths created by one materialization attempt.
#[derive(Debug, Default)]
struct Journal {
    files: Vec<PathBuf>,
    dirs: Vec<PathBuf>,
    known_dirs: FxHashSet<PathBuf>,
}

impl Journal {
    fn ensure_dir(&mut self, dir: &Path) -> LinkTreeResult<()> {
        if self.known_dirs.contains(dir) {
            return Ok(());
        }

        let mut missing = Vec::new();
        for ancestor in dir.ancestors() {
            if ancestor.as_os_str().is_empty() || self.known_dirs.contains(ancestor) {
                break;
            }
            match fs::symlink_metadata(ancestor) {
                Ok(_) => break,
                Err(err) if err.kind() == io::ErrorKind::NotFound => {
                    missing.push(ancestor.to_path_buf());
                }
                Err(err) => {
                    return Err(LinkTreeError::Stat {
                        path: ancestor.to_path_buf(),
                        source: err,
                    });
                }
            }
        }

        let created = fs::create_dir_all(dir);
        // Parents first, so the journal order mirrors creation order.
        for path in missing.into_iter().rev() {
            if created.is_ok() || path.is_dir() {
                tracing::debug!(dir = %path.display(), "created directory");
                self.known_dirs.insert(path.clone());
                self.dirs.push(path);
            }
        }
        created.map_err(|source| LinkTreeError::CreateDir {
            path: dir.to_path_buf(),
            source,
        })?;

        self.known_dirs.insert(dir.to_path_buf());
        Ok(())
    }
}

fn already_linked(source: &Path, existing: &Metadata) -> LinkTreeResult<bool> {
    let source_meta = fs::metadata(source).map_err(|err| LinkTreeError::Stat {
        path: source.to_path_buf(),
        source: err,
    })?;
    Ok(
        match (
            platform::file_identity(&source_meta),
            platform::file_identity(existing),
        ) {
            (Some(src), Some(dst)) => src == dst,
            _ => false,
        },
    )
}

fn populate(plan: &TreePlan, linker: &dyn Linker, journal: &mut Journal) -> LinkTreeResult<()> {
    journal.ensure_dir(&plan.root_dir)?;

    for file in &plan.files {
        let target = &file.target_path;
        if let Some(parent) = target.parent() {
            journal.ensure_dir(parent)?;
        }

        match fs::symlink_metadata(target) {
            Ok(existing) => {
                if existing.is_file() && already_linked(&file.source_path, &existing)? {
                    tracing::debug!(target = %target.display(), "target already linked");
                    continue;
                }
                return Err(LinkTreeError::TargetExists {
                    target: target.clone(),
                    origin: file.source_path.clone(),
                });
            }
            Err(err) if err.kind() == io::ErrorKind::NotFound => {}
            Err(err) => {
                return Err(LinkTreeError::Stat {
                    path: target.clone(),
                    source: err,
                });
            }
        }

        linker.link(&file.source_path, target)?;
        tracing::debug!(
            linker = linker.name(),
            source = %file.source_path.display(),
            target = %target.display(),
            "linked file"
        );
        journal.files.push(target.clone());
    }

    Ok(())
}

fn remove_paths(files: &[PathBuf], dirs: &[PathBuf]) -> Result<(), RollbackError> {
    let mut rollback = RollbackError::default();

    for file in files {
        match fs::remove_file(file) {
            Ok(()) => tracing::debug!(path = %file.display(), "removed file"),
            Err(err) if err.kind() == io::ErrorKind::NotFound => {}
            Err(err) => {
                tracing::warn!(path = %file.display(), error = %err, "rollback could not remove file");
                rollback.push(file.clone(), err);
            }
        }
    }

    let mut ordered: Vec<&PathBuf> = dirs.iter().collect();
    ordered.sort_by_key(|dir| Reverse(dir.components().count()));
    for dir in ordered {
        match fs::remove_dir(dir) {
            Ok(()) => tracing::debug!(path = %dir.display(), "removed directory"),
            Err(err)
                if matches!(
                    err.kind(),
                    io::ErrorKind::NotFound | io::ErrorKind::DirectoryNotEmpty
                ) => {}
            Err(err) => {
                tracing::warn!(path = %dir.display(), error = %err, "rollback could not remove directory");
                rollback.push(dir.clone(), err);
            }
        }
    }

    rollback.into_result()
}

/// Materializes `plan` with `linker`, rolling back everything it created if
/// any step fails.
///
/// Targets that already exist as the very same file as their source are left
/// alone, so running the same plan twice succeeds.
///
/// # Errors
///
/// Validation errors are returned before any mutation. Other failures are
/// returned after rollback; if rollback also failed the error is
/// [`LinkTreeError::RollbackFailed`] carrying both.
pub fn create_with(plan: &TreePlan, linker: &dyn Linker) -> LinkTreeResult<()> {
    plan.validate()?;

    let mut journal = Journal::default();
    let Err(cause) = populate(plan, linker, &mut journal) else {
        tracing::info!(
            root = %plan.root_dir.display(),
            files = plan.files.len(),
            linker = linker.name(),
            "materialized link tree"
        );
        return Ok(());
    };

    tracing::warn!(
        root = %plan.root_dir.display(),
        linker = linker.name(),
        error = %cause,
        created_files = journal.files.len(),
        created_dirs = journal.dirs.len(),
        "materialization failed; rolling back"
    );
    match remove_paths(&journal.files, &journal.dirs) {
        Ok(()) => Err(cause),
        Err(rollback) => Err(LinkTreeError::RollbackFailed {
            cause: Box::new(cause),
            rollback,
        }),
    }
}

/// Materializes `plan` using the linker selected by `mode`.
pub fn materialize(plan: &TreePlan, mode: LinkMode) -> LinkTreeResult<()> {
    create_with(plan, mode.linker())
}

/// Removes every target of `plan` and every directory between the targets
/// and the root, best effort.
///
/// The root itself is kept, as are directories that still hold other
/// entries. Works on plans that were never (or only partly) created. Plans
/// with no root or no files are a no-op.
///
/// # Errors
///
/// [`LinkTreeError::OutsideRoot`] before removing anything if a target
/// escapes the root; [`LinkTreeError::Rollback`] listing the paths that could
/// not be removed.
pub fn rollback(plan: &TreePlan) -> LinkTreeResult<()> {
    if plan.root_dir.as_os_str().is_empty() || plan.files.is_empty() {
        return Ok(());
    }
    plan.check_targets()?;

    let files: Vec<PathBuf> = plan
        .files
        .iter()
        .map(|file| file.target_path.clone())
        .collect();
    remove_paths(&files, &plan.target_dirs())?;
    Ok(())
}
