//! Registry configuration

use std::time::Duration;

/// Tunables consumed by the topic registry and connection drivers
///
/// All values are fixed at construction time; nothing here is
/// runtime-mutable.
#[derive(Debug, Clone)]
pub struct RegistryConfig {
    /// Number of updates retained per topic for replay to new viewers
    pub history_limit: usize,

    /// Capacity of each subscriber's delivery queue
    pub buffer_size: usize,

    /// Maximum accepted message length in bytes (pre-escape)
    pub max_msg_len: usize,

    /// Interval between keepalive bytes on an otherwise quiet connection
    pub ping_rate: Duration,
}

impl Default for RegistryConfig {
    fn default() -> Self {
        Self {
            history_limit: 20,
            buffer_size: 5,
            max_msg_len: 1024,
            ping_rate: Duration::from_secs(1),
        }
    }
}

impl RegistryConfig {
    /// Set the per-topic history limit
    pub fn history_limit(mut self, limit: usize) -> Self {
        self.history_limit = limit;
        self
    }

    /// Set the per-subscriber queue capacity
    pub fn buffer_size(mut self, size: usize) -> Self {
        self.buffer_size = size.max(1);
        self
    }

    /// Set the maximum accepted message length
    pub fn max_msg_len(mut self, len: usize) -> Self {
        self.max_msg_len = len;
        self
    }

    /// Set the keepalive interval
    pub fn ping_rate(mut self, rate: Duration) -> Self {
        self.ping_rate = rate;
        self
    }
}
