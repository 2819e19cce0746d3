//! Go-Back-N receive-side sequencer.
//!
//! [`Receiver`] implements the receiver half of go-back-n:
//!
//! - Only frames that validate **and** carry the next expected sequence
//!   number are accepted; their payload is delivered upward immediately and
//!   an acknowledgment naming that sequence number is emitted.
//! - Corrupt frames are silently discarded; the sender's timer forces the
//!   retransmission.
//! - Out-of-order and duplicate frames are silently discarded **without** an
//!   acknowledgment; the receiver never buffers ahead and never acks
//!   selectively, which is what pushes the sender into timeout-driven
//!   go-back-n recovery.
//!
//! There is no receiver-side timer and no retry logic; all retry pressure is
//! sender-driven.

use crate::env::ReceiverEnv;
use crate::frame::Frame;

/// Go-Back-N receive-side state for one session.
#[derive(Debug)]
pub struct Receiver {
    /// Next expected sequence number; advances by exactly one per accepted
    /// frame and never decreases.
    expected_seq: u32,
}

impl Receiver {
    /// Create a new [`Receiver`] expecting sequence number zero.
    pub fn new() -> Self {
        log::debug!("[recv] initialized");
        Self { expected_seq: 0 }
    }

    /// Next sequence number this receiver will accept.
    pub fn expected_seq(&self) -> u32 {
        self.expected_seq
    }

    /// Process one frame arriving from the link.
    ///
    /// Accepted payloads are handed to [`ReceiverEnv::deliver`] as one
    /// fragment each; the matching acknowledgment goes out through
    /// [`ReceiverEnv::send_to_link`].
    pub fn on_frame(&mut self, raw: &[u8], env: &mut impl ReceiverEnv) {
        let frame = match Frame::decode(raw) {
            Ok(frame) => frame,
            Err(err) => {
                log::trace!("[recv] dropping corrupt frame: {err}");
                return;
            }
        };

        if frame.seq != self.expected_seq {
            log::trace!(
                "[recv] dropping seq={} (expected {})",
                frame.seq,
                self.expected_seq
            );
            return;
        }

        env.deliver(&frame.payload);
        env.send_to_link(&Frame::ack(frame.seq).encode());
        self.expected_seq += 1;
        log::debug!(
            "[recv] accepted seq={} len={}, acked",
            frame.seq,
            frame.payload.len()
        );
    }
}

impl Default for Receiver {
    fn default() -> Self {
        Self::new()
    }
}

// ---------------------------------------------------------------------------
// Unit tests
// ---------------------------------------------------------------------------
