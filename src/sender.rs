//! Go-Back-N send-side window manager.
//!
//! [`Sender`] buffers outgoing frames, keeps a sliding window of up to
//! `window_size` in-flight segments, and drives the single retransmission
//! timer through the injected [`SenderEnv`].
//!
//! # Protocol contract
//!
//! - At most `window_size` frames may be unacknowledged at once; frames
//!   beyond the window stay buffered until acknowledgments slide it.
//! - ACKs are **cumulative**: an ack naming sequence number `s` confirms
//!   every frame with sequence number ≤ `s`.
//! - On timeout, **all** unacked frames from `base` onward are resent in
//!   ascending order (go back to N).
//! - Frames are encoded once at submission and the stored bytes are resent
//!   verbatim; a retransmission is bit-identical to the original.
//!
//! # Sequence-number layout
//!
//! ```text
//!      base            next_seq        outstanding.len()
//!       │                  │                  │
//!  ─────┼──────────────────┼──────────────────┼───▶ seq space
//!       │ <── in flight ──▶│ <── backlog ────▶│
//! ```
//!
//! Invariants: `base ≤ next_seq ≤ outstanding.len()` and
//! `next_seq − base ≤ window_size`.

use crate::config::Config;
use crate::env::SenderEnv;
use crate::frame::{Frame, HEADER_LEN};

/// Go-Back-N send-side state for one session.
#[derive(Debug)]
pub struct Sender {
    /// Sequence number of the oldest unacknowledged frame (left window edge).
    base: u32,

    /// Sequence number of the next frame to transmit.
    next_seq: u32,

    /// Every frame ever constructed for this session, encoded, indexed by
    /// sequence number.  Entries are never mutated after construction.
    outstanding: Vec<Vec<u8>>,

    /// Fixed session parameters.
    config: Config,

    /// Set by [`Sender::close`]; further submissions are ignored.
    closed: bool,
}

impl Sender {
    /// Create a new [`Sender`].
    ///
    /// # Panics
    ///
    /// Panics if the window is empty or the packet capacity cannot hold at
    /// least one payload byte expressible in the one-byte length field.
    pub fn new(config: Config) -> Self {
        assert!(config.window_size >= 1, "window_size must be at least 1");
        assert!(
            config.packet_size > HEADER_LEN,
            "packet_size {} cannot hold the {HEADER_LEN}-byte header",
            config.packet_size
        );
        assert!(
            config.max_payload() <= u8::MAX as usize,
            "packet_size {} overflows the one-byte length field",
            config.packet_size
        );
        log::debug!("[sender] initialized, window={}", config.window_size);
        Self {
            base: 0,
            next_seq: 0,
            outstanding: Vec::new(),
            config,
            closed: false,
        }
    }

    /// Left edge of the window: oldest unacknowledged sequence number.
    pub fn base(&self) -> u32 {
        self.base
    }

    /// Sequence number the next transmission will carry.
    pub fn next_seq(&self) -> u32 {
        self.next_seq
    }

    /// Number of frames currently awaiting acknowledgment.
    pub fn in_flight(&self) -> u32 {
        self.next_seq - self.base
    }

    /// Number of buffered frames not yet transmitted.
    pub fn backlog(&self) -> usize {
        self.outstanding.len() - self.next_seq as usize
    }

    /// `true` when every submitted frame has been acknowledged.
    pub fn is_drained(&self) -> bool {
        self.base == self.next_seq && self.backlog() == 0
    }

    /// Accept one upper-layer message.
    ///
    /// The message is segmented into maximal frames of `max_payload` bytes
    /// (the last segment may be shorter; a zero-length message produces no
    /// frames), each frame is assigned the next sequence number and encoded
    /// once, and as many as the window admits are transmitted immediately.
    /// If the window was empty, the first transmission arms the timer.
    pub fn submit(&mut self, message: &[u8], env: &mut impl SenderEnv) {
        if self.closed {
            log::warn!("[sender] submit after close ignored ({} bytes)", message.len());
            return;
        }

        for segment in message.chunks(self.config.max_payload()) {
            let seq = self.outstanding.len() as u32;
            self.outstanding.push(Frame::data(seq, segment).encode());
        }

        let was_empty = self.base == self.next_seq;
        let sent = self.pump(env);
        if was_empty && sent > 0 {
            env.start_timer(self.config.timeout);
        }
        log::debug!(
            "[sender] submit {} bytes: sent {}, in_flight={}, backlog={}",
            message.len(),
            sent,
            self.in_flight(),
            self.backlog()
        );
    }

    /// Process a frame arriving from the link (an acknowledgment).
    ///
    /// Corrupt frames are ignored without touching any state.  A valid ack
    /// for `s` is cumulative: `base` advances to `s + 1`, clamped so that it
    /// never regresses and never passes `next_seq`.  Sliding the window may
    /// admit deferred backlog frames, which are transmitted here.  The timer
    /// stops when the window drains and restarts otherwise.
    pub fn on_frame(&mut self, raw: &[u8], env: &mut impl SenderEnv) {
        let ack = match Frame::decode(raw) {
            Ok(frame) => frame,
            Err(err) => {
                log::trace!("[sender] dropping corrupt ack: {err}");
                return;
            }
        };

        self.base = (ack.seq + 1).clamp(self.base, self.next_seq);
        let sent = self.pump(env);

        if self.base == self.next_seq {
            env.stop_timer();
        } else {
            env.start_timer(self.config.timeout);
        }
        log::debug!(
            "[sender] ack seq={}: base={}, sent {} deferred, in_flight={}",
            ack.seq,
            self.base,
            sent,
            self.in_flight()
        );
    }

    /// Handle expiry of the retransmission timer.
    ///
    /// Re-arms the timer, then resends every in-flight frame in ascending
    /// sequence order: the defining go-back-n step.  A stale expiry arriving
    /// after the window drained is a no-op.
    pub fn on_timeout(&mut self, env: &mut impl SenderEnv) {
        if self.base == self.next_seq {
            log::trace!("[sender] stale timeout with empty window");
            return;
        }

        env.start_timer(self.config.timeout);
        for seq in self.base..self.next_seq {
            env.send_to_link(&self.outstanding[seq as usize]);
        }
        log::debug!(
            "[sender] timeout: resent seq {}..{}",
            self.base,
            self.next_seq
        );
    }

    /// Stop accepting submissions.  In-flight frames continue to drain
    /// through acknowledgments and timeouts.
    pub fn close(&mut self) {
        self.closed = true;
        log::debug!("[sender] finalized at base={}", self.base);
    }

    /// Transmit buffered frames while the window has room.
    ///
    /// Returns the number of frames handed to the link.
    fn pump(&mut self, env: &mut impl SenderEnv) -> u32 {
        let mut sent = 0;
        while self.next_seq < self.base + self.config.window_size
            && (self.next_seq as usize) < self.outstanding.len()
        {
            env.send_to_link(&self.outstanding[self.next_seq as usize]);
            self.next_seq += 1;
            sent += 1;
        }
        sent
    }
}

// ---------------------------------------------------------------------------
// Unit tests
// ---------------------------------------------------------------------------

#[cfg(test)]
mod tests {
    use std::time::Duration;

    use super::*;
    use crate::frame::{Frame, HEADER_LEN};

    /// What the sender asked its environment to do, in order.
    #[derive(Debug, PartialEq)]
    enum TimerOp {
        Start(Duration),
        Stop,
    }

    /// Recording mock of [`SenderEnv`].
    #[derive(Default)]
    struct MockEnv {
        sent: Vec<Vec<u8>>,
        timer: Vec<TimerOp>,
    }

    impl SenderEnv for MockEnv {
        fn send_to_link(&mut self, frame: &[u8]) {
            self.sent.push(frame.to_vec());
        }
        fn start_timer(&mut self, after: Duration) {
            self.timer.push(TimerOp::Start(after));
        }
        fn stop_timer(&mut self) {
            self.timer.push(TimerOp::Stop);
        }
    }

    impl MockEnv {
        /// Sequence numbers of every frame sent so far.
        fn sent_seqs(&self) -> Vec<u32> {
            self.sent
                .iter()
                .map(|raw| Frame::decode(raw).unwrap().seq)
                .collect()
        }
    }

    /// Window of 3 frames, 10-byte payloads, for readable arithmetic.
    fn small_config() -> Config {
        Config {
            packet_size: 10 + HEADER_LEN,
            window_size: 3,
            timeout: Duration::from_millis(300),
        }
    }

    fn ack_bytes(seq: u32) -> Vec<u8> {
        Frame::ack(seq).encode()
    }

    #[test]
    fn initial_state() {
        let sender = Sender::new(small_config());
        assert_eq!(sender.base(), 0);
        assert_eq!(sender.next_seq(), 0);
        assert_eq!(sender.in_flight(), 0);
        assert!(sender.is_drained());
    }

    #[test]
    fn submit_segments_message_into_maximal_frames() {
        let mut sender = Sender::new(small_config());
        let mut env = MockEnv::default();

        // 11 bytes with a 10-byte max payload: two frames, 10 + 1.
        sender.submit(b"HELLOWORLD!", &mut env);

        assert_eq!(env.sent.len(), 2);
        let first = Frame::decode(&env.sent[0]).unwrap();
        let second = Frame::decode(&env.sent[1]).unwrap();
        assert_eq!((first.seq, first.payload.as_slice()), (0, &b"HELLOWORLD"[..]));
        assert_eq!((second.seq, second.payload.as_slice()), (1, &b"!"[..]));
    }

    #[test]
    fn exact_multiple_produces_no_trailing_empty_frame() {
        let mut sender = Sender::new(small_config());
        let mut env = MockEnv::default();

        sender.submit(&[7u8; 20], &mut env);

        assert_eq!(env.sent.len(), 2);
        assert_eq!(sender.next_seq(), 2);
        assert_eq!(sender.backlog(), 0);
    }

    #[test]
    fn zero_length_message_produces_no_frames() {
        let mut sender = Sender::new(small_config());
        let mut env = MockEnv::default();

        sender.submit(b"", &mut env);

        assert!(env.sent.is_empty());
        assert!(env.timer.is_empty(), "timer must stay untouched");
        assert!(sender.is_drained());
    }

    #[test]
    fn window_bound_defers_excess_frames() {
        let mut sender = Sender::new(small_config());
        let mut env = MockEnv::default();

        // Five single-frame messages, window of three.
        for byte in 0u8..5 {
            sender.submit(&[byte], &mut env);
        }

        assert_eq!(env.sent_seqs(), vec![0, 1, 2]);
        assert_eq!(sender.in_flight(), 3);
        assert_eq!(sender.backlog(), 2);
    }

    #[test]
    fn timer_starts_only_on_empty_to_nonempty_transition() {
        let mut sender = Sender::new(small_config());
        let mut env = MockEnv::default();

        sender.submit(b"a", &mut env);
        assert_eq!(env.timer, vec![TimerOp::Start(Duration::from_millis(300))]);

        // Window already non-empty: no second start.
        sender.submit(b"b", &mut env);
        assert_eq!(env.timer.len(), 1);
    }

    #[test]
    fn cumulative_ack_slides_past_unseen_acks() {
        let mut sender = Sender::new(small_config());
        let mut env = MockEnv::default();
        sender.submit(&[1u8; 30], &mut env); // frames 0, 1, 2

        // Only the ack for seq 1 arrives; 0 is covered cumulatively.
        sender.on_frame(&ack_bytes(1), &mut env);

        assert_eq!(sender.base(), 2);
        assert_eq!(sender.in_flight(), 1);
    }

    #[test]
    fn ack_slides_window_and_pumps_backlog() {
        let mut sender = Sender::new(small_config());
        let mut env = MockEnv::default();
        for byte in 0u8..5 {
            sender.submit(&[byte], &mut env);
        }
        env.sent.clear();

        sender.on_frame(&ack_bytes(0), &mut env);

        // base slid to 1; one backlog frame (seq 3) entered the window.
        assert_eq!(sender.base(), 1);
        assert_eq!(env.sent_seqs(), vec![3]);
        assert_eq!(sender.in_flight(), 3);
        assert_eq!(sender.backlog(), 1);
    }

    #[test]
    fn full_ack_stops_timer_partial_ack_restarts_it() {
        let mut sender = Sender::new(small_config());
        let mut env = MockEnv::default();
        sender.submit(&[1u8; 20], &mut env); // frames 0, 1
        env.timer.clear();

        sender.on_frame(&ack_bytes(0), &mut env);
        assert_eq!(env.timer, vec![TimerOp::Start(Duration::from_millis(300))]);

        sender.on_frame(&ack_bytes(1), &mut env);
        assert_eq!(env.timer.last(), Some(&TimerOp::Stop));
        assert!(sender.is_drained());
    }

    #[test]
    fn corrupt_ack_is_ignored_entirely() {
        let mut sender = Sender::new(small_config());
        let mut env = MockEnv::default();
        sender.submit(b"a", &mut env);
        env.sent.clear();
        env.timer.clear();

        let mut bad = ack_bytes(0);
        bad[HEADER_LEN - 1] ^= 0x01; // break the checksum
        sender.on_frame(&bad, &mut env);

        assert_eq!(sender.base(), 0);
        assert!(env.sent.is_empty());
        assert!(env.timer.is_empty(), "corrupt ack must not touch the timer");
    }

    #[test]
    fn stale_duplicate_ack_keeps_base_monotonic() {
        let mut sender = Sender::new(small_config());
        let mut env = MockEnv::default();
        sender.submit(&[1u8; 30], &mut env); // frames 0, 1, 2

        sender.on_frame(&ack_bytes(1), &mut env);
        assert_eq!(sender.base(), 2);

        // Late duplicate of an earlier ack: base must not move backwards.
        sender.on_frame(&ack_bytes(0), &mut env);
        assert_eq!(sender.base(), 2);
    }

    #[test]
    fn ack_beyond_next_seq_is_clamped_to_the_window_edge() {
        let mut sender = Sender::new(small_config());
        let mut env = MockEnv::default();
        sender.submit(b"a", &mut env); // frame 0 only

        sender.on_frame(&ack_bytes(500), &mut env);

        // base may never pass next_seq.
        assert_eq!(sender.base(), sender.next_seq());
        assert!(sender.is_drained());
    }

    #[test]
    fn timeout_resends_exactly_the_window_in_ascending_order() {
        let mut sender = Sender::new(small_config());
        let mut env = MockEnv::default();
        for byte in 0u8..5 {
            sender.submit(&[byte], &mut env);
        }
        sender.on_frame(&ack_bytes(0), &mut env); // base=1, window 1..4
        env.sent.clear();
        env.timer.clear();

        sender.on_timeout(&mut env);

        assert_eq!(env.sent_seqs(), vec![1, 2, 3]);
        assert_eq!(env.timer, vec![TimerOp::Start(Duration::from_millis(300))]);
    }

    #[test]
    fn retransmission_is_bit_identical() {
        let mut sender = Sender::new(small_config());
        let mut env = MockEnv::default();
        sender.submit(b"stable bytes", &mut env);
        let originals = env.sent.clone();
        env.sent.clear();

        sender.on_timeout(&mut env);

        assert_eq!(env.sent, originals);
    }

    #[test]
    fn stale_timeout_with_empty_window_is_a_noop() {
        let mut sender = Sender::new(small_config());
        let mut env = MockEnv::default();

        sender.on_timeout(&mut env);

        assert!(env.sent.is_empty());
        assert!(env.timer.is_empty(), "a drained sender must not re-arm");
    }

    #[test]
    fn window_invariant_holds_through_a_burst() {
        let mut sender = Sender::new(small_config());
        let mut env = MockEnv::default();

        for _ in 0..10 {
            sender.submit(&[0u8; 25], &mut env);
            assert!(sender.in_flight() <= 3);
        }
        for seq in 0..30 {
            sender.on_frame(&ack_bytes(seq), &mut env);
            assert!(sender.in_flight() <= 3);
            assert!(sender.base() <= sender.next_seq());
        }
        assert!(sender.is_drained());
    }

    #[test]
    fn submit_after_close_is_ignored() {
        let mut sender = Sender::new(small_config());
        let mut env = MockEnv::default();

        sender.close();
        sender.submit(b"too late", &mut env);

        assert!(env.sent.is_empty());
        assert!(sender.is_drained());
    }
}
