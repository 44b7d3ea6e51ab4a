#![deny(unsafe_code)]
#![deny(missing_docs)]
#![deny(rustdoc::broken_intra_doc_links)]

//! crates/linktree/src/lib.rs
//!
//! # Overview
//!
//! `linktree` builds directory trees whose files are links to existing
//! sources, and tells whether files are already hardlinked elsewhere.
//!
//! A [`TreePlan`] names a root directory and a list of `(source, target)`
//! pairs. [`hardlink::create`] and [`reflink::create`] materialize it
//! all-or-nothing: if any step fails, every file and directory the attempt
//! created is removed again before the error is returned. The matching
//! `rollback` functions tear down a tree later, whether or not it was ever
//! fully created.
//!
//! # Design
//!
//! - Materialization and rollback are shared; only the [`Linker`] differs.
//! - Targets must lie strictly under the plan root. Plans violating this are
//!   rejected before any filesystem mutation.
//! - Rollback never touches sources, the root itself, or directories that
//!   still hold entries the plan did not create.
//!
//! # Examples
//!
//! ```
//! use linktree::{TreePlan, hardlink};
//!
//! let temp = tempfile::tempdir()?;
//! let source = temp.path().join("movie.mkv");
//! std::fs::write(&source, b"frames")?;
//!
//! let plan = TreePlan::new(temp.path().join("library")).with_file(&source, "Movie (2020)/movie.mkv");
//! hardlink::create(&plan)?;
//! assert!(temp.path().join("library/Movie (2020)/movie.mkv").is_file());
//!
//! hardlink::rollback(&plan)?;
//! assert!(!temp.path().join("library/Movie (2020)").exists());
//! # Ok::<(), Box<dyn std::error::Error>>(())
//! ```

mod detect;
mod error;
mod linker;
mod materialize;
mod plan;

pub mod hardlink;
pub mod reflink;

pub use detect::is_any_hardlinked;
pub use error::{LinkTreeError, LinkTreeResult, RemovalFailure, RollbackError};
pub use linker::{HardLinker, LinkMode, Linker, ReflinkLinker};
pub use materialize::{create_with, materialize, rollback};
pub use plan::{FilePlan, TreePlan};
pub use reflink::{ReflinkSupport, clone_file, supports_reflink};
