//! Environment capabilities consumed by the protocol core.
//!
//! The sender and receiver are pure, single-threaded state machines; every
//! external effect (putting a frame on the link, arming the retransmission
//! timer, handing a fragment to the application) goes through one of these
//! traits, passed by reference into each callback.  Production code wires
//! them to a real link and clock; tests substitute mocks and drive timeouts
//! deterministically.

use std::time::Duration;

/// Services the sender window manager requires from its host.
pub trait SenderEnv {
    /// Hand an encoded frame to the lower layer for (unreliable) transport.
    fn send_to_link(&mut self, frame: &[u8]);

    /// Arm the single retransmission timer to fire after `after`.
    ///
    /// Starting an already-running timer cancels the previous instance;
    /// there is never more than one pending expiry.
    fn start_timer(&mut self, after: Duration);

    /// Cancel the retransmission timer.  Stopping a stopped timer is a no-op.
    fn stop_timer(&mut self);
}

/// Services the receiver sequencer requires from its host.
pub trait ReceiverEnv {
    /// Hand an encoded acknowledgment frame to the lower layer.
    fn send_to_link(&mut self, frame: &[u8]);

    /// Deliver an accepted payload upward as one message fragment.
    fn deliver(&mut self, fragment: &[u8]);
}
