//! `gbn-arq`: Go-Back-N ARQ reliable delivery over a lossy packet link.
//!
//! # Architecture
//!
//! ```text
//!  upper layer                                 upper layer
//!      │ submit(message)                           ▲ deliver(fragment)
//!      ▼                                           │
//!  ┌──────────┐   data frames   ┌───────────────────┐
//!  │  Sender  │────────────────▶│     Receiver      │
//!  │ (window, │                 │ (in-order cursor) │
//!  │  timer)  │◀────────────────│                   │
//!  └────┬─────┘      ACKs       └───────────────────┘
//!       │
//!       │ start/stop timer, frames out
//!  ┌────▼───────────────────────────────┐
//!  │  environment (SenderEnv/ReceiverEnv)│
//!  │  lossy link · timer · upper layer   │
//!  └────────────────────────────────────┘
//! ```
//!
//! The link may drop, corrupt, duplicate, or reorder frames; the sender's
//! sliding window and retransmission timer together with the receiver's
//! strictly in-order acceptance recover from all of it.
//!
//! Each module has a single responsibility:
//! - [`frame`]    — wire format (serialise / deserialise / checksum)
//! - [`config`]   — session parameters (capacity, window, timeout)
//! - [`env`]      — capability traits towards link, timer, upper layer
//! - [`sender`]   — outbound sliding-window state machine
//! - [`receiver`] — inbound in-order acceptance and acknowledgment
//! - [`sim`]      — discrete-event lossy-link harness for testing

pub mod config;
pub mod env;
pub mod frame;
pub mod receiver;
pub mod sender;
pub mod sim;
