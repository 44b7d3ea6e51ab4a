//! crates/logstream/src/config.rs
//! Sizing configuration for [`LogHub`](crate::LogHub).

/// Number of lines retained for history replay by default.
pub const DEFAULT_CAPACITY: usize = 1000;

/// Per-subscriber channel depth by default.
pub const DEFAULT_SUBSCRIBER_BUFFER: usize = 100;

/// Ring buffer and subscriber channel sizes for a [`LogHub`](crate::LogHub).
///
/// Zero values are clamped to one when the hub is built.
#[derive(Clone, Copy, Debug, Eq, PartialEq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
#[cfg_attr(feature = "serde", serde(default))]
pub struct HubConfig {
    /// Maximum number of lines kept for [`history`](crate::LogHub::history).
    pub capacity: usize,
    /// Lines a subscriber may fall behind before further lines are dropped for it.
    pub subscriber_buffer: usize,
}

impl HubConfig {
    /// Overrides the ring buffer capacity.
    pub const fn with_capacity(mut self, capacity: usize) -> Self {
        self.capacity = capacity;
        self
    }

    /// Overrides the per-subscriber channel depth.
    pub const fn with_subscriber_buffer(mut self, depth: usize) -> Self {
        self.subscriber_buffer = depth;
        self
    }

    pub(crate) fn effective_capacity(&self) -> usize {
        self.capacity.max(1)
    }

    pub(crate) fn effective_subscriber_buffer(&self) -> usize {
        self.subscriber_buffer.max(1)
    }
}

impl Default for HubConfig {
    fn default() -> Self {
        Self {
            capacity: DEFAULT_CAPACITY,
            subscriber_buffer: DEFAULT_SUBSCRIBER_BUFFER,
        }
    }
}
