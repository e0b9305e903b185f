//! Core game logic: the card/stack model and the session state
//! machine.

/// Card alphabets, player limits, and house rules.
pub mod constants;

/// Cards, stacks, order tables, and per-player summaries.
pub mod entities;

/// The authoritative game session and ask-resolution algorithm.
pub mod state_machine;

pub use state_machine::{
    ConfigError, Delivery, GameConfig, GamePhase, GameSession, PlayerSlot, SessionUpdate,
    SlotIndex, UserError,
};
