//! # Go Fish
//!
//! A networked Go Fish implementation with an authoritative host.
//!
//! This library provides the complete game engine: a generic card and
//! stack model, the session state machine that resolves asks and
//! rotates turns, and the TCP host and client that carry the game
//! between machines.
//!
//! ## Architecture
//!
//! One process hosts the game and owns all state. Peers connect over
//! TCP, receive their hand and the public stats at game start, and are
//! prompted one at a time to ask another player for a rank. Every
//! resolved ask pushes a fresh state snapshot to all peers, so a peer
//! never computes game outcomes locally.
//!
//! The session moves through three phases:
//!
//! - **Lobby**: Waiting for the configured number of players
//! - **Playing**: Dealing, asks, trick extraction, and turn rotation
//! - **GameOver**: Every rank has been claimed as a trick
//!
//! ## Core Modules
//!
//! - [`game`]: Cards, stacks, and the session state machine
//! - [`net`]: Networking components (server, client, message protocol)
//!
//! ## Example
//!
//! ```
//! use go_fish::{GameConfig, GameSession};
//!
//! // Prepare a session for three players.
//! let config = GameConfig::new(3);
//! let session = GameSession::new(config).unwrap();
//! ```

/// Networking components for client-server communication.
pub mod net;
pub use net::{
    client::{Client, ClientMirror, MirrorPhase},
    messages, server, utils,
};

/// Core game logic, entities, and the session state machine.
pub mod game;
pub use game::{
    ConfigError, GameConfig, GamePhase, GameSession, SessionUpdate, SlotIndex, UserError,
    constants::{self, DEFAULT_HOST, DEFAULT_PORT, MAX_PLAYERS, MIN_PLAYERS},
    entities,
};
