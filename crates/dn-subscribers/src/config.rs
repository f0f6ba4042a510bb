//! Subscriber configuration.

use crate::error::{SubscriberError, SubscriberResult};
use shared_bus::DEFAULT_CHANNEL_CAPACITY;

/// Smallest accepted channel buffer.
pub const MIN_BUFFER_SIZE: usize = 1;

/// Largest accepted channel buffer.
pub const MAX_BUFFER_SIZE: usize = 10;

/// Per-subscriber construction options.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct SubscriberConfig {
    /// Event channel buffer (batches, not events).
    pub buffer_size: usize,
    /// Ack mode: no loop task, the broker pushes synchronously.
    pub ack: bool,
}

impl Default for SubscriberConfig {
    fn default() -> Self {
        Self {
            buffer_size: DEFAULT_CHANNEL_CAPACITY,
            ack: false,
        }
    }
}

impl SubscriberConfig {
    /// Default buffer in ack mode.
    #[must_use]
    pub fn ack() -> Self {
        Self {
            ack: true,
            ..Self::default()
        }
    }

    #[must_use]
    pub fn with_buffer_size(mut self, buffer_size: usize) -> Self {
        self.buffer_size = buffer_size;
        self
    }

    /// Check the buffer size is within range.
    pub fn validate(&self) -> SubscriberResult<()> {
        if !(MIN_BUFFER_SIZE..=MAX_BUFFER_SIZE).contains(&self.buffer_size) {
            return Err(SubscriberError::InvalidBufferSize {
                size: self.buffer_size,
                min: MIN_BUFFER_SIZE,
                max: MAX_BUFFER_SIZE,
            });
        }
        Ok(())
    }
}
