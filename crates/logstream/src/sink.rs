//! crates/logstream/src/sink.rs
//!
//! Line-capturing output sink with a hot-swappable target.
//!
//! [`LineCapturingSink`] sits where a process would normally write its log
//! bytes. Each write goes to the current [`SinkTarget`] (a file, stderr, an
//! in-memory buffer) and, once accepted there, is reassembled into lines that
//! are forwarded to a [`LogHub`].
//!
//! # Design
//!
//! The target lives in an [`ArcSwapOption`], so [`LineCapturingSink::swap`]
//! never waits for writers and writers never wait for a swap: a write that
//! loaded the old target finishes against it. Swapping hands back a
//! [`RetiredTarget`]; the caller decides when to [`close`](RetiredTarget::close)
//! it, which waits for such in-flight writes before releasing the writer.
//!
//! Partial lines are buffered behind their own mutex, independent of the
//! target pointer. Once an unterminated line reaches [`MAX_PARTIAL_LINE`]
//! bytes it is forwarded as a line of its own and buffering starts over.
//!
//! # Examples
//!
//! ```
//! use std::io::Write;
//! use std::sync::Arc;
//! use logstream::{LineCapturingSink, LogHub, SinkTarget};
//!
//! let hub = Arc::new(LogHub::new());
//! let sink = LineCapturingSink::with_target(Some(Arc::clone(&hub)), SinkTarget::new(std::io::sink()));
//!
//! (&sink).write_all(b"first\nsec")?;
//! (&sink).write_all(b"ond\n")?;
//!
//! let lines: Vec<String> = hub.history(0).iter().map(|l| l.to_string()).collect();
//! assert_eq!(lines, ["first", "second"]);
//! # Ok::<(), std::io::Error>(())
//! ```

use std::fmt;
use std::io::{self, Write};
use std::sync::{Arc, Mutex, MutexGuard, PoisonError};

use arc_swap::ArcSwapOption;

use crate::hub::LogHub;

/// Longest unterminated line buffered before it is forwarded anyway.
pub const MAX_PARTIAL_LINE: usize = 64 * 1024;

/// Callback run when a retired target is closed.
pub type Closer = Box<dyn FnOnce() -> io::Result<()> + Send>;

fn lock<T: ?Sized>(mutex: &Mutex<T>) -> MutexGuard<'_, T> {
    mutex.lock().unwrap_or_else(PoisonError::into_inner)
}

/// A writer installed in a [`LineCapturingSink`], with an optional closer.
pub struct SinkTarget {
    writer: Mutex<Box<dyn Write + Send>>,
    closer: Mutex<Option<Closer>>,
}

impl SinkTarget {
    /// Wraps `writer` with no closer.
    pub fn new<W>(writer: W) -> Self
    where
        W: Write + Send + 'static,
    {
        Self {
            writer: Mutex::new(Box::new(writer)),
            closer: Mutex::new(None),
        }
    }

    /// Wraps `writer` and registers `closer` to run when the target is retired
    /// and closed.
    pub fn with_closer<W, F>(writer: W, closer: F) -> Self
    where
        W: Write + Send + 'static,
        F: FnOnce() -> io::Result<()> + Send + 'static,
    {
        Self {
            writer: Mutex::new(Box::new(writer)),
            closer: Mutex::new(Some(Box::new(closer))),
        }
    }

    fn write(&self, buf: &[u8]) -> io::Result<usize> {
        lock(&self.writer).write(buf)
    }

    fn flush(&self) -> io::Result<()> {
        lock(&self.writer).flush()
    }

    fn close(&self) -> io::Result<()> {
        let flushed = {
            let mut writer = lock(&self.writer);
            let flushed = writer.flush();
            // Stragglers still holding this target now write into the void.
            *writer = Box::new(io::sink());
            flushed
        };
        let closer = lock(&self.closer).take();
        let closed = closer.map_or(Ok(()), |close| close());
        flushed.and(closed)
    }
}

impl fmt::Debug for SinkTarget {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("SinkTarget")
            .field("has_closer", &lock(&self.closer).is_some())
            .finish_non_exhaustive()
    }
}

/// The target displaced by [`LineCapturingSink::swap`].
///
/// Dropping it without calling [`close`](Self::close) drops the writer once
/// the last in-flight write releases it, but skips the closer.
#[derive(Debug)]
#[must_use = "close the retired target to flush it and run its closer"]
pub struct RetiredTarget(Option<Arc<SinkTarget>>);

impl RetiredTarget {
    /// True when the sink had no target before the swap.
    pub const fn is_empty(&self) -> bool {
        self.0.is_none()
    }

    /// Waits for in-flight writes, flushes and releases the writer, then runs
    /// the closer. A no-op when there was no previous target.
    ///
    /// The flush error, if any, takes precedence over the closer's error; the
    /// closer runs either way.
    pub fn close(self) -> io::Result<()> {
        self.0.map_or(Ok(()), |target| target.close())
    }
}

/// Output sink that forwards complete lines to a [`LogHub`].
pub struct LineCapturingSink {
    target: ArcSwapOption<SinkTarget>,
    partial: Mutex<Vec<u8>>,
    hub: Option<Arc<LogHub>>,
}

impl LineCapturingSink {
    /// Creates a sink with no target; writes are accepted and discarded until
    /// one is installed with [`swap`](Self::swap).
    pub fn new(hub: Option<Arc<LogHub>>) -> Self {
        Self {
            target: ArcSwapOption::empty(),
            partial: Mutex::new(Vec::new()),
            hub,
        }
    }

    /// Creates a sink writing to `target`.
    pub fn with_target(hub: Option<Arc<LogHub>>, target: SinkTarget) -> Self {
        let sink = Self::new(hub);
        sink.target.store(Some(Arc::new(target)));
        sink
    }

    /// The hub receiving captured lines, if any.
    pub fn hub(&self) -> Option<&Arc<LogHub>> {
        self.hub.as_ref()
    }

    /// True while a target is installed.
    pub fn has_target(&self) -> bool {
        self.target.load().is_some()
    }

    /// Writes `buf` to the current target and captures the accepted bytes.
    ///
    /// Without a target the call is a no-op that reports the whole buffer as
    /// written. Errors from the target are returned unchanged and nothing is
    /// captured.
    pub fn write(&self, buf: &[u8]) -> io::Result<usize> {
        let Some(target) = self.target.load_full() else {
            return Ok(buf.len());
        };
        let written = target.write(buf)?;
        self.capture(&buf[..written]);
        Ok(written)
    }

    /// Flushes the current target, if any.
    pub fn flush(&self) -> io::Result<()> {
        self.target
            .load_full()
            .map_or(Ok(()), |target| target.flush())
    }

    /// Installs `target` (or removes the current one with `None`) and returns
    /// the displaced target for the caller to close.
    pub fn swap(&self, target: Option<SinkTarget>) -> RetiredTarget {
        RetiredTarget(self.target.swap(target.map(Arc::new)))
    }

    fn capture(&self, bytes: &[u8]) {
        let Some(hub) = self.hub.as_deref() else {
            return;
        };

        let mut partial = lock(&self.partial);
        partial.extend_from_slice(bytes);

        let mut consumed = 0;
        while let Some(offset) = partial[consumed..].iter().position(|&b| b == b'\n') {
            let end = consumed + offset;
            let mut line = &partial[consumed..end];
            if let [head @ .., b'\r'] = line {
                line = head;
            }
            if !line.is_empty() {
                hub.write(&String::from_utf8_lossy(line));
            }
            consumed = end + 1;
        }
        partial.drain(..consumed);

        if partial.len() >= MAX_PARTIAL_LINE {
            hub.write(&String::from_utf8_lossy(&partial));
            partial.clear();
        }
    }
}

impl Write for &LineCapturingSink {
    fn write(&mut self, buf: &[u8]) -> io::Result<usize> {
        LineCapturingSink::write(self, buf)
    }

    fn flush(&mut self) -> io::Result<()> {
        LineCapturingSink::flush(self)
    }
}

impl Write for LineCapturingSink {
    fn write(&mut self, buf: &[u8]) -> io::Result<usize> {
        Self::write(self, buf)
    }

    fn flush(&mut self) -> io::Result<()> {
        Self::flush(self)
    }
}

impl fmt::Debug for LineCapturingSink {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("LineCapturingSink")
            .field("has_target", &self.has_target())
            .field("pending_bytes", &lock(&self.partial).len())
            .field("hub", &self.hub)
            .finish()
    }
}
