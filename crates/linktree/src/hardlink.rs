//! crates/linktree/src/hardlink.rs
//! Hardlink trees.
//!
//! Every target becomes another directory entry for its source inode, so the
//! tree costs no extra space and stays in sync with the source data. Source
//! and root must share a filesystem.

use crate::error::LinkTreeResult;
use crate::linker::HardLinker;
use crate::materialize;
use crate::plan::TreePlan;

/// Creates `plan` with hard links; see [`create_with`](crate::create_with).
pub fn create(plan: &TreePlan) -> LinkTreeResult<()> {
    materialize::create_with(plan, &HardLinker)
}

/// Removes a hardlink tree; see [`rollback`](crate::rollback).
pub fn rollback(plan: &TreePlan) -> LinkTreeResult<()> {
    materialize::rollback(plan)
}
