//! Protocol configuration constants.

use std::time::Duration;

use crate::frame::HEADER_LEN;

/// Tunable protocol parameters, fixed for the lifetime of a session.
#[derive(Debug, Clone)]
pub struct Config {
    /// Fixed frame capacity on the link, in bytes (header + payload).
    pub packet_size: usize,
    /// Maximum number of unacknowledged frames in flight (N).
    pub window_size: u32,
    /// Retransmission timeout, in simulated time.
    pub timeout: Duration,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            packet_size: 64,
            window_size: 10,
            timeout: Duration::from_millis(300),
        }
    }
}

impl Config {
    /// Largest payload that fits one frame: capacity minus the header.
    pub fn max_payload(&self) -> usize {
        self.packet_size - HEADER_LEN
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn default_leaves_room_for_payload() {
        let config = Config::default();
        assert_eq!(config.max_payload(), 64 - HEADER_LEN);
        assert!(config.window_size >= 1);
    }
}
