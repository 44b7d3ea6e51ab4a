#![deny(unsafe_code)]
#![deny(missing_docs)]
#![deny(rustdoc::broken_intra_doc_links)]

//! src/lib.rs
//!
//! # Overview
//!
//! `linkstream` bundles the two halves of a media-server helper:
//!
//! - [`logstream`]: an in-memory log ring with live fan-out to subscribers,
//!   fed by a line-capturing writer whose destination can be swapped at
//!   runtime.
//! - [`linktree`]: transactional hardlink and reflink tree materialization,
//!   plus detection of files that are already hardlinked.
//!
//! Both crates are usable on their own; this facade re-exports them under
//! one dependency.

pub use linktree;
pub use logstream;
