//! Integration tests for routing `tracing` events into the log hub.

#![cfg(feature = "tracing")]

use std::io;
use std::sync::{Arc, Mutex};

use logstream::{LineCapturingSink, LogHub, SinkTarget, SinkWriter, capture_layer};
use tracing_subscriber::layer::SubscriberExt;

#[derive(Clone, Default)]
struct SharedBuffer(Arc<Mutex<Vec<u8>>>);

impl io::Write for SharedBuffer {
    fn write(&mut self, buf: &[u8]) -> io::Result<usize> {
        self.0.lock().expect("buffer lock").extend_from_slice(buf);
        Ok(buf.len())
    }

    fn flush(&mut self) -> io::Result<()> {
        Ok(())
    }
}

fn capturing_sink() -> (Arc<LogHub>, SharedBuffer, Arc<LineCapturingSink>) {
    let hub = Arc::new(LogHub::new());
    let buffer = SharedBuffer::default();
    let sink = Arc::new(LineCapturingSink::with_target(
        Some(Arc::clone(&hub)),
        SinkTarget::new(buffer.clone()),
    ));
    (hub, buffer, sink)
}

#[test]
fn each_event_becomes_one_hub_line() {
    let (hub, buffer, sink) = capturing_sink();
    let subscriber = tracing_subscriber::registry().with(capture_layer(sink));

    tracing::subscriber::with_default(subscriber, || {
        tracing::info!(port = 6878, "engine started");
        tracing::warn!("vpn unhealthy");
    });

    let lines: Vec<String> = hub.history(0).iter().map(ToString::to_string).collect();
    assert_eq!(lines.len(), 2);
    assert!(lines[0].contains("INFO"));
    assert!(lines[0].contains("engine started"));
    assert!(lines[0].contains("port=6878"));
    assert!(lines[1].contains("WARN"));
    assert!(lines[1].contains("vpn unhealthy"));

    let raw = String::from_utf8(buffer.0.lock().expect("buffer lock").clone()).expect("utf-8");
    assert_eq!(raw.lines().count(), 2);
    assert!(!raw.contains('\u{1b}'), "ANSI colouring must be disabled");
}

#[test]
fn swapping_target_mid_stream_keeps_capturing() {
    let (hub, first, sink) = capturing_sink();
    let subscriber = tracing_subscriber::registry().with(capture_layer(Arc::clone(&sink)));
    let second = SharedBuffer::default();

    tracing::subscriber::with_default(subscriber, || {
        tracing::info!("before rotation");
        sink.swap(Some(SinkTarget::new(second.clone())))
            .close()
            .expect("close rotated target");
        tracing::info!("after rotation");
    });

    assert_eq!(hub.count(), 2);
    let first = String::from_utf8(first.0.lock().expect("lock").clone()).expect("utf-8");
    let second = String::from_utf8(second.0.lock().expect("lock").clone()).expect("utf-8");
    assert!(first.contains("before rotation") && !first.contains("after rotation"));
    assert!(second.contains("after rotation") && !second.contains("before rotation"));
}

#[test]
fn sink_writer_exposes_shared_sink() {
    let (_, _, sink) = capturing_sink();
    let writer = SinkWriter::new(Arc::clone(&sink));
    assert!(Arc::ptr_eq(writer.sink(), &sink));
}
