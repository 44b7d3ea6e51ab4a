//! crates/linktree/src/linker.rs
//!
//! The link step of materialization, abstracted so the same plan and
//! rollback logic drives both hardlinks and copy-on-write clones.

use std::path::Path;

use crate::error::{LinkTreeError, LinkTreeResult};

/// Creates `target` as a link of `source`.
///
/// Implementations must not overwrite an existing `target`; the
/// materializer only calls them for paths that do not exist.
pub trait Linker {
    /// Short name used in diagnostics.
    fn name(&self) -> &'static str;

    /// Creates the link.
    fn link(&self, source: &Path, target: &Path) -> LinkTreeResult<()>;
}

/// Links with `link(2)`: the target becomes another name for the source.
#[derive(Clone, Copy, Debug, Default)]
pub struct HardLinker;

impl Linker for HardLinker {
    fn name(&self) -> &'static str {
        "hardlink"
    }

    fn link(&self, source: &Path, target: &Path) -> LinkTreeResult<()> {
        std::fs::hard_link(source, target).map_err(|source_err| LinkTreeError::Link {
            origin: source.to_path_buf(),
            target: target.to_path_buf(),
            source: source_err,
        })
    }
}

/// Links with a copy-on-write clone: a separate file sharing data blocks.
#[derive(Clone, Copy, Debug, Default)]
pub struct ReflinkLinker;

impl Linker for ReflinkLinker {
    fn name(&self) -> &'static str {
        "reflink"
    }

    fn link(&self, source: &Path, target: &Path) -> LinkTreeResult<()> {
        crate::reflink::clone_file(source, target)
    }
}

/// How a plan's files are linked.
#[derive(Clone, Copy, Debug, Default, Eq, PartialEq, Hash)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
#[cfg_attr(feature = "serde", serde(rename_all = "lowercase"))]
pub enum LinkMode {
    /// Hard links (same inode).
    #[default]
    Hardlink,
    /// Copy-on-write clones (distinct inode, shared extents).
    Reflink,
}

impl LinkMode {
    /// The linker implementing this mode.
    pub fn linker(self) -> &'static dyn Linker {
        match self {
            Self::Hardlink => &HardLinker,
            Self::Reflink => &ReflinkLinker,
        }
    }
}
