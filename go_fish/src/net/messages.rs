use serde::{Deserialize, Serialize};
use std::fmt;

use super::super::game::{
    SessionUpdate, SlotIndex,
    entities::{PlayerSummary, Stack},
};

/// A message from a peer to the host. The only intent a peer can
/// express is one turn action.
#[derive(Clone, Debug, Deserialize, Eq, PartialEq, Serialize)]
pub enum ClientMessage {
    /// Ask `target` for every card of `rank`.
    Ask { target: SlotIndex, rank: char },
}

impl fmt::Display for ClientMessage {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Ask { target, rank } => write!(f, "asked slot {target} for a {rank}"),
        }
    }
}

/// A message from the host to a peer.
#[derive(Clone, Debug, Deserialize, Eq, PartialEq, Serialize)]
pub enum ServerMessage {
    /// Handshake accepted; the peer is not yet slotted. Carries the
    /// peer's externally observed address.
    ConfirmConnect { address: String },
    /// Handshake rejected; the peer should disconnect.
    ServerFull,
    /// The game has begun: assigned slot, initial hand, and stats.
    StartGame {
        slot: SlotIndex,
        hand: Stack,
        stats: Vec<PlayerSummary>,
        draw_pile_size: usize,
    },
    /// The recipient may submit one ask.
    Turn,
    /// Full-state refresh after any resolved ask.
    HandAndStats {
        hand: Stack,
        stats: Vec<PlayerSummary>,
        draw_pile_size: usize,
    },
    /// Terminal; no further asks are accepted.
    GameOver,
    /// The connection is ending; `shutdown` distinguishes a
    /// deliberate host shutdown from a peer-initiated close.
    Disconnected { shutdown: bool },
}

impl From<SessionUpdate> for ServerMessage {
    fn from(update: SessionUpdate) -> Self {
        match update {
            SessionUpdate::StartGame {
                slot,
                hand,
                stats,
                draw_pile_size,
            } => Self::StartGame {
                slot,
                hand,
                stats,
                draw_pile_size,
            },
            SessionUpdate::Turn => Self::Turn,
            SessionUpdate::HandAndStats {
                hand,
                stats,
                draw_pile_size,
            } => Self::HandAndStats {
                hand,
                stats,
                draw_pile_size,
            },
            SessionUpdate::GameOver => Self::GameOver,
        }
    }
}

impl fmt::Display for ServerMessage {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let repr = match self {
            Self::ConfirmConnect { address } => &format!("connection confirmed as {address}"),
            Self::ServerFull => "server full",
            Self::StartGame { slot, .. } => &format!("game started, playing as slot {slot}"),
            Self::Turn => "your turn",
            Self::HandAndStats { .. } => "hand and stats",
            Self::GameOver => "game over",
            Self::Disconnected { shutdown: true } => "host shut down",
            Self::Disconnected { shutdown: false } => "disconnected",
        };
        write!(f, "{repr}")
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::game::entities::Card;

    #[test]
    fn client_message_display() {
        let msg = ClientMessage::Ask {
            target: 2,
            rank: 'Q',
        };
        assert_eq!(msg.to_string(), "asked slot 2 for a Q");
    }

    #[test]
    fn client_message_round_trip() {
        let msg = ClientMessage::Ask {
            target: 1,
            rank: 'A',
        };
        let serialized = bincode::serialize(&msg).unwrap();
        let deserialized: ClientMessage = bincode::deserialize(&serialized).unwrap();
        assert_eq!(deserialized, msg);
    }

    #[test]
    fn server_message_display() {
        assert_eq!(ServerMessage::ServerFull.to_string(), "server full");
        assert_eq!(ServerMessage::Turn.to_string(), "your turn");
        assert_eq!(
            ServerMessage::Disconnected { shutdown: true }.to_string(),
            "host shut down"
        );
    }

    #[test]
    fn start_game_round_trip_keeps_card_codes() {
        let hand: Stack = ["Ah", "Ts"]
            .iter()
            .map(|code| Card::parse(code).unwrap())
            .collect();
        let msg = ServerMessage::StartGame {
            slot: 0,
            hand: hand.clone(),
            stats: vec![PlayerSummary {
                hand_size: 2,
                tricks: vec!['K'],
                live: true,
            }],
            draw_pile_size: 40,
        };
        let serialized = bincode::serialize(&msg).unwrap();
        let deserialized: ServerMessage = bincode::deserialize(&serialized).unwrap();
        assert_eq!(deserialized, msg);
    }

    #[test]
    fn session_updates_map_onto_the_wire() {
        assert_eq!(
            ServerMessage::from(SessionUpdate::Turn),
            ServerMessage::Turn
        );
        assert_eq!(
            ServerMessage::from(SessionUpdate::GameOver),
            ServerMessage::GameOver
        );
        let update = SessionUpdate::HandAndStats {
            hand: Stack::new(),
            stats: Vec::new(),
            draw_pile_size: 7,
        };
        assert_eq!(
            ServerMessage::from(update),
            ServerMessage::HandAndStats {
                hand: Stack::new(),
                stats: Vec::new(),
                draw_pile_size: 7,
            }
        );
    }
}
