#![deny(unsafe_code)]
#![deny(missing_docs)]
#![deny(rustdoc::broken_intra_doc_links)]

//! crates/logstream/src/lib.rs
//!
//! # Overview
//!
//! `logstream` keeps recent log output in memory and streams it live to any
//! number of readers, such as a server-sent-events handler tailing the
//! process log.
//!
//! # Design
//!
//! - [`LogHub`] is a ring buffer of lines plus a set of subscribers, each fed
//!   through its own bounded channel. Writes never block: a subscriber that
//!   falls behind loses lines, nobody else notices.
//! - [`LineCapturingSink`] stands in for the process's log destination. It
//!   forwards bytes to a hot-swappable [`SinkTarget`] and reassembles them
//!   into lines for the hub.
//! - With the `tracing` feature, `init_tracing` and `capture_layer` wire
//!   the sink into `tracing-subscriber`.
//!
//! # Invariants
//!
//! - [`LogHub::history`] always returns lines oldest-first and never more
//!   than the configured capacity.
//! - A closed subscriber channel is never sent to: delivery and closing share
//!   the hub's exclusive lock.
//! - Only complete, non-empty lines reach the hub.
//!
//! # Errors
//!
//! Hub operations are infallible. Sink writes surface the target's
//! [`std::io::Error`] unchanged.

mod config;
mod hub;
mod sink;
#[cfg(feature = "tracing")]
mod tracing_bridge;

pub use config::{DEFAULT_CAPACITY, DEFAULT_SUBSCRIBER_BUFFER, HubConfig};
pub use hub::{LogHub, Subscriber, SubscriberId};
pub use sink::{Closer, LineCapturingSink, MAX_PARTIAL_LINE, RetiredTarget, SinkTarget};
#[cfg(feature = "tracing")]
pub use tracing_bridge::{SinkWriter, capture_layer, init_tracing};
