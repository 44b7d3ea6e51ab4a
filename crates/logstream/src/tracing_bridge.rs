//! crates/logstream/src/tracing_bridge.rs
//! Render `tracing` events through a [`LineCapturingSink`].
//!
//! The fmt layer formats each event into one buffer and hands it to the
//! writer in a single call, so every event becomes exactly one hub line
//! (multi-line messages become several).
//!
//! # Usage
//!
//! ```rust,ignore
//! use std::sync::Arc;
//! use logstream::{LineCapturingSink, LogHub, SinkTarget, init_tracing};
//!
//! let hub = Arc::new(LogHub::new());
//! let sink = Arc::new(LineCapturingSink::with_target(
//!     Some(Arc::clone(&hub)),
//!     SinkTarget::new(std::io::stderr()),
//! ));
//! init_tracing(Arc::clone(&sink), "info,linktree=debug")?;
//!
//! tracing::info!("service started");
//! assert_eq!(hub.count(), 1);
//! ```

use std::sync::Arc;

use tracing::Subscriber;
use tracing_subscriber::EnvFilter;
use tracing_subscriber::Layer;
use tracing_subscriber::filter::LevelFilter;
use tracing_subscriber::fmt::MakeWriter;
use tracing_subscriber::layer::SubscriberExt;
use tracing_subscriber::registry::LookupSpan;
use tracing_subscriber::util::{SubscriberInitExt, TryInitError};

use crate::sink::LineCapturingSink;

/// [`MakeWriter`] handing out borrowed writers onto a shared sink.
#[derive(Clone, Debug)]
pub struct SinkWriter {
    sink: Arc<LineCapturingSink>,
}

impl SinkWriter {
    /// Wraps a shared sink.
    pub const fn new(sink: Arc<LineCapturingSink>) -> Self {
        Self { sink }
    }

    /// The wrapped sink.
    pub fn sink(&self) -> &Arc<LineCapturingSink> {
        &self.sink
    }
}

impl<'a> MakeWriter<'a> for SinkWriter {
    type Writer = &'a LineCapturingSink;

    fn make_writer(&'a self) -> Self::Writer {
        &self.sink
    }
}

/// A fmt layer without ANSI colouring that writes through `sink`.
pub fn capture_layer<S>(sink: Arc<LineCapturingSink>) -> impl Layer<S> + Send + Sync
where
    S: Subscriber + for<'a> LookupSpan<'a> + 'static,
{
    tracing_subscriber::fmt::layer()
        .with_writer(SinkWriter::new(sink))
        .with_ansi(false)
}

/// Installs a global subscriber that renders events through `sink`.
///
/// `directives` uses [`EnvFilter`] syntax; unparsable directives are skipped
/// and the default level is `INFO`.
///
/// # Errors
///
/// Fails when a global subscriber is already installed.
pub fn init_tracing(sink: Arc<LineCapturingSink>, directives: &str) -> Result<(), TryInitError> {
    let filter = EnvFilter::builder()
        .with_default_directive(LevelFilter::INFO.into())
        .parse_lossy(directives);

    tracing_subscriber::registry()
        .with(filter)
        .with(capture_layer(sink))
        .try_init()
}
