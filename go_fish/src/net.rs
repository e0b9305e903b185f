//! Networking layer for host-peer communication.
//!
//! A custom binary protocol over TCP: bincode-encoded messages with a
//! u32 length prefix. The host runs a single-threaded `mio` poll loop;
//! peers use a plain blocking client.

/// Blocking TCP client and the peer-side state mirror.
pub mod client;

/// The host-peer message catalogue.
pub mod messages;

/// The host: accepts peers, feeds the session, pushes state.
pub mod server;

/// Length-prefixed binary message framing.
pub mod utils;
