//! crates/linktree/src/plan.rs
//!
//! Tree plans: the caller's manifest of files to link under a root.

use std::path::{Component, Path, PathBuf};

use rustc_hash::FxHashSet;

use crate::error::{LinkTreeError, LinkTreeResult};

/// One file to materialize: link `source_path` at `target_path`.
#[derive(Clone, Debug, Default, Eq, PartialEq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct FilePlan {
    /// Existing regular file to link from.
    pub source_path: PathBuf,
    /// Path to create, under the plan's root directory.
    pub target_path: PathBuf,
}

impl FilePlan {
    /// Creates a file mapping.
    pub fn new(source_path: impl Into<PathBuf>, target_path: impl Into<PathBuf>) -> Self {
        Self {
            source_path: source_path.into(),
            target_path: target_path.into(),
        }
    }
}

/// A directory tree to build by linking existing files.
///
/// Plans are read-only to the materializer; the same value can be passed to
/// [`create`](crate::hardlink::create) and later to
/// [`rollback`](crate::hardlink::rollback).
#[derive(Clone, Debug, Default, Eq, PartialEq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct TreePlan {
    /// Base directory of the tree.
    pub root_dir: PathBuf,
    /// Files in creation order.
    pub files: Vec<FilePlan>,
}

impl TreePlan {
    /// Creates an empty plan rooted at `root_dir`.
    pub fn new(root_dir: impl Into<PathBuf>) -> Self {
        Self {
            root_dir: root_dir.into(),
            files: Vec::new(),
        }
    }

    /// Appends a file. A relative `target` is taken relative to the root.
    pub fn push(&mut self, source: impl Into<PathBuf>, target: impl AsRef<Path>) {
        let target = target.as_ref();
        let target_path = if target.is_absolute() {
            target.to_path_buf()
        } else {
            self.root_dir.join(target)
        };
        self.files.push(FilePlan::new(source, target_path));
    }

    /// Builder form of [`push`](Self::push).
    pub fn with_file(mut self, source: impl Into<PathBuf>, target: impl AsRef<Path>) -> Self {
        self.push(source, target);
        self
    }

    /// Checks the plan before anything touches the disk.
    ///
    /// Rejects an empty root, an empty file list, and targets that are not
    /// strictly below the root or that contain `..`.
    pub fn validate(&self) -> LinkTreeResult<()> {
        if self.root_dir.as_os_str().is_empty() {
            return Err(LinkTreeError::EmptyRoot);
        }
        if self.files.is_empty() {
            return Err(LinkTreeError::NoFiles);
        }
        self.check_targets()
    }

    pub(crate) fn check_targets(&self) -> LinkTreeResult<()> {
        for file in &self.files {
            if !is_strictly_under(&file.target_path, &self.root_dir) {
                return Err(LinkTreeError::OutsideRoot {
                    target: file.target_path.clone(),
                    root: self.root_dir.clone(),
                });
            }
        }
        Ok(())
    }

    /// Every ancestor directory of every target strictly below the root,
    /// without duplicates.
    pub(crate) fn target_dirs(&self) -> Vec<PathBuf> {
        let mut seen = FxHashSet::default();
        let mut dirs = Vec::new();
        for file in &self.files {
            for dir in file.target_path.ancestors().skip(1) {
                if !is_strictly_under(dir, &self.root_dir) {
                    break;
                }
                if seen.insert(dir.to_path_buf()) {
                    dirs.push(dir.to_path_buf());
                }
            }
        }
        dirs
    }
}

fn is_strictly_under(path: &Path, root: &Path) -> bool {
    match path.strip_prefix(root) {
        Ok(rest) => {
            rest.components().next().is_some()
                && rest
                    .components()
                    .all(|component| matches!(component, Component::Normal(_) | Component::CurDir))
        }
        Err(_) => false,
    }
}
