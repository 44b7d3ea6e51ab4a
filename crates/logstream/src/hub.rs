//! crates/logstream/src/hub.rs
//!
//! Ring-buffered log history with live fan-out to subscribers.
//!
//! A [`LogHub`] keeps the most recent lines in a fixed-size ring and pushes
//! every new line to each registered [`Subscriber`] through a bounded
//! channel. Delivery uses `try_send`, so a subscriber that stops reading only
//! loses its own lines; neither the writer nor other subscribers are held up.
//!
//! # Locking
//!
//! One [`RwLock`] guards the ring and the subscriber map together. The
//! broadcast loop in [`LogHub::write`] and the channel close in
//! [`LogHub::unsubscribe`] both run under the exclusive guard, so a sender is
//! never used while it is being dropped. Introspection takes the shared guard.
//!
//! Nothing in this module logs while the guard is held: the hub is commonly
//! the destination of those very log events.
//!
//! # Example
//!
//! ```
//! use std::sync::Arc;
//! use logstream::LogHub;
//! use tokio_util::sync::CancellationToken;
//!
//! # #[tokio::main(flavor = "current_thread")]
//! # async fn main() {
//! let hub = Arc::new(LogHub::new());
//! hub.write("booting");
//!
//! let shutdown = CancellationToken::new();
//! let (backlog, mut live) = hub.subscribe_with_history(0, &shutdown);
//! assert_eq!(backlog.len(), 1);
//!
//! hub.write("ready");
//! assert_eq!(live.recv().await.as_deref(), Some("ready"));
//! # }
//! ```

use std::fmt;
use std::sync::{Arc, PoisonError, RwLock, RwLockReadGuard, RwLockWriteGuard, Weak};

use rustc_hash::FxHashMap;
use tokio::sync::mpsc;
use tokio_util::sync::CancellationToken;

use crate::config::HubConfig;

/// Hub-local identifier of a subscriber.
///
/// Identifiers are allocated from a counter owned by the hub and are never
/// reused during its lifetime.
#[derive(Clone, Copy, Debug, Hash, Eq, PartialEq, Ord, PartialOrd)]
pub struct SubscriberId(u64);

impl fmt::Display for SubscriberId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "sub-{}", self.0)
    }
}

/// Fixed-capacity circular store of lines, oldest overwritten first.
struct Ring {
    slots: Box<[Option<Arc<str>>]>,
    write_pos: usize,
    count: usize,
}

impl Ring {
    fn new(capacity: usize) -> Self {
        Self {
            slots: vec![None; capacity].into_boxed_slice(),
            write_pos: 0,
            count: 0,
        }
    }

    fn capacity(&self) -> usize {
        self.slots.len()
    }

    fn push(&mut self, line: Arc<str>) {
        let capacity = self.capacity();
        self.slots[self.write_pos] = Some(line);
        self.write_pos = (self.write_pos + 1) % capacity;
        if self.count < capacity {
            self.count += 1;
        }
    }

    /// Last `n` lines oldest-first; `0` or an oversized `n` means all of them.
    fn tail(&self, n: usize) -> Vec<Arc<str>> {
        let take = if n == 0 || n > self.count { self.count } else { n };
        let capacity = self.capacity();
        let start = (self.write_pos + capacity - take) % capacity;
        (0..take)
            .filter_map(|offset| self.slots[(start + offset) % capacity].clone())
            .collect()
    }
}

struct Slot {
    sender: mpsc::Sender<Arc<str>>,
    token: CancellationToken,
}

struct HubState {
    ring: Ring,
    subscribers: FxHashMap<SubscriberId, Slot>,
    next_id: u64,
}

impl HubState {
    fn allocate_id(&mut self) -> SubscriberId {
        let id = SubscriberId(self.next_id);
        self.next_id += 1;
        id
    }
}

/// Thread-safe log history with live broadcast to subscribers.
///
/// The ring and the subscriber map share one `RwLock`; delivery and
/// channel closing both happen under its exclusive guard.
pub struct LogHub {
    state: RwLock<HubState>,
    subscriber_buffer: usize,
}

impl LogHub {
    /// Creates a hub with [`HubConfig::default`] sizes.
    #[must_use]
    pub fn new() -> Self {
        Self::with_config(HubConfig::default())
    }

    /// Creates a hub with explicit ring and channel sizes.
    #[must_use]
    pub fn with_config(config: HubConfig) -> Self {
        Self {
            state: RwLock::new(HubState {
                ring: Ring::new(config.effective_capacity()),
                subscribers: FxHashMap::default(),
                next_id: 0,
            }),
            subscriber_buffer: config.effective_subscriber_buffer(),
        }
    }

    fn read_state(&self) -> RwLockReadGuard<'_, HubState> {
        self.state.read().unwrap_or_else(PoisonError::into_inner)
    }

    fn write_state(&self) -> RwLockWriteGuard<'_, HubState> {
        self.state.write().unwrap_or_else(PoisonError::into_inner)
    }

    /// Appends `line` to the history and offers it to every subscriber.
    ///
    /// Never blocks on a subscriber: a full channel drops this line for that
    /// subscriber only.
    pub fn write(&self, line: &str) {
        let line: Arc<str> = Arc::from(line);
        let mut state = self.write_state();
        state.ring.push(Arc::clone(&line));
        for slot in state.subscribers.values() {
            // Full: the subscriber is behind and loses this line.
            // Closed: its receiver is gone and unsubscribe is on the way.
            let _ = slot.sender.try_send(Arc::clone(&line));
        }
    }

    /// Returns the last `n` lines, oldest first.
    ///
    /// `n == 0`, or `n` larger than the number of stored lines, returns every
    /// stored line.
    pub fn history(&self, n: usize) -> Vec<Arc<str>> {
        self.read_state().ring.tail(n)
    }

    /// Registers a subscriber whose lifetime is bounded by `parent`.
    ///
    /// The subscriber's token is a child of `parent`. A watcher waits for it
    /// and unsubscribes, so cancelling `parent` (for example on client
    /// disconnect) ends the stream. Inside a Tokio runtime the watcher is a
    /// task; outside one it is a dedicated thread that lives until the
    /// subscription ends.
    pub fn subscribe(self: &Arc<Self>, parent: &CancellationToken) -> Subscriber {
        self.register(None, parent).1
    }

    /// Atomically snapshots the last `n` lines and registers a subscriber.
    ///
    /// Every line written after the snapshot is delivered to the subscriber,
    /// and no line appears in both. `n` follows the rules of
    /// [`history`](Self::history).
    pub fn subscribe_with_history(
        self: &Arc<Self>,
        n: usize,
        parent: &CancellationToken,
    ) -> (Vec<Arc<str>>, Subscriber) {
        self.register(Some(n), parent)
    }

    fn register(
        self: &Arc<Self>,
        backlog: Option<usize>,
        parent: &CancellationToken,
    ) -> (Vec<Arc<str>>, Subscriber) {
        let token = parent.child_token();
        let (sender, receiver) = mpsc::channel(self.subscriber_buffer);

        let (id, history) = {
            let mut state = self.write_state();
            let id = state.allocate_id();
            let history = backlog.map_or_else(Vec::new, |n| state.ring.tail(n));
            state.subscribers.insert(
                id,
                Slot {
                    sender,
                    token: token.clone(),
                },
            );
            (id, history)
        };

        tracing::debug!(subscriber = %id, backlog = history.len(), "log subscriber attached");
        self.spawn_watcher(id, token.clone());

        let subscriber = Subscriber {
            id,
            receiver,
            token,
            hub: Arc::downgrade(self),
        };
        (history, subscriber)
    }

    fn spawn_watcher(self: &Arc<Self>, id: SubscriberId, token: CancellationToken) {
        let hub = Arc::downgrade(self);
        let detach = async move {
            token.cancelled().await;
            if let Some(hub) = hub.upgrade() {
                hub.unsubscribe(id);
            }
        };

        if let Ok(handle) = tokio::runtime::Handle::try_current() {
            handle.spawn(detach);
            return;
        }

        let spawned = std::thread::Builder::new()
            .name(format!("logstream-{id}"))
            .spawn(move || {
                match tokio::runtime::Builder::new_current_thread().build() {
                    Ok(runtime) => runtime.block_on(detach),
                    Err(err) => tracing::warn!(
                        subscriber = %id,
                        error = %err,
                        "could not start watcher runtime; cancellation will not detach this subscriber"
                    ),
                }
            });
        if let Err(err) = spawned {
            tracing::warn!(
                subscriber = %id,
                error = %err,
                "could not spawn watcher thread; cancellation will not detach this subscriber"
            );
        }
    }

    /// Removes a subscriber, cancels its token and closes its channel.
    ///
    /// Returns `false` when the subscriber was already gone, which makes
    /// repeated or concurrent calls harmless. Lines already queued stay
    /// readable; after them the subscriber observes end of stream.
    pub fn unsubscribe(&self, id: SubscriberId) -> bool {
        let removed = {
            let mut state = self.write_state();
            match state.subscribers.remove(&id) {
                Some(slot) => {
                    slot.token.cancel();
                    drop(slot);
                    true
                }
                None => false,
            }
        };

        if removed {
            tracing::debug!(subscriber = %id, "log subscriber detached");
        }
        removed
    }

    /// Number of live subscribers.
    pub fn subscriber_count(&self) -> usize {
        self.read_state().subscribers.len()
    }

    /// Number of lines currently stored.
    pub fn count(&self) -> usize {
        self.read_state().ring.count
    }

    /// Maximum number of lines the hub retains.
    pub fn capacity(&self) -> usize {
        self.read_state().ring.capacity()
    }
}

impl Default for LogHub {
    fn default() -> Self {
        Self::new()
    }
}

impl fmt::Debug for LogHub {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let state = self.read_state();
        f.debug_struct("LogHub")
            .field("capacity", &state.ring.capacity())
            .field("count", &state.ring.count)
            .field("subscribers", &state.subscribers.len())
            .field("subscriber_buffer", &self.subscriber_buffer)
            .finish()
    }
}

impl Drop for LogHub {
    fn drop(&mut self) {
        let state = self.state.get_mut().unwrap_or_else(PoisonError::into_inner);
        for slot in state.subscribers.values() {
            slot.token.cancel();
        }
    }
}

/// Live tail of a [`LogHub`].
///
/// Dropping the subscriber unsubscribes it.
#[derive(Debug)]
pub struct Subscriber {
    id: SubscriberId,
    receiver: mpsc::Receiver<Arc<str>>,
    token: CancellationToken,
    hub: Weak<LogHub>,
}

impl Subscriber {
    /// Identifier to pass to [`LogHub::unsubscribe`].
    pub const fn id(&self) -> SubscriberId {
        self.id
    }

    /// Token cancelled when the subscription ends.
    pub const fn token(&self) -> &CancellationToken {
        &self.token
    }

    /// Waits for the next line; `None` once unsubscribed and drained.
    pub async fn recv(&mut self) -> Option<Arc<str>> {
        self.receiver.recv().await
    }

    /// Returns a queued line without waiting.
    pub fn try_recv(&mut self) -> Option<Arc<str>> {
        self.receiver.try_recv().ok()
    }

    /// True once unsubscribed and every queued line has been read.
    pub fn is_finished(&self) -> bool {
        self.receiver.is_closed() && self.receiver.is_empty()
    }
}

impl Drop for Subscriber {
    fn drop(&mut self) {
        if let Some(hub) = self.hub.upgrade() {
            hub.unsubscribe(self.id);
        }
    }
}
