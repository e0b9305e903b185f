//! The peer side: a blocking TCP client plus the state mirror it
//! feeds.
//!
//! The mirror never computes game outcomes. Every host push replaces
//! the mirrored hand and stats wholesale, so the peer's view can't
//! drift from the authoritative session.

use anyhow::{Error, bail};
use std::{
    net::{SocketAddr, TcpStream},
    thread,
    time::Duration,
};

use super::{
    messages::{ClientMessage, ServerMessage},
    utils,
};
use crate::game::{
    SlotIndex,
    entities::{PlayerSummary, Stack},
};

/// Default timeout for reading from the host.
pub const READ_TIMEOUT: Duration = Duration::from_secs(10);

/// Default timeout for writing to the host.
pub const WRITE_TIMEOUT: Duration = Duration::from_secs(1);

/// A blocking TCP client for connecting to a game host.
pub struct Client {
    /// The underlying TCP stream.
    pub stream: TcpStream,
}

impl Client {
    /// Connects to a host, retrying with backoff, and waits for the
    /// handshake verdict.
    ///
    /// # Returns
    ///
    /// The connected client and the peer's externally observed
    /// address as reported by the host.
    ///
    /// # Errors
    ///
    /// Returns an error if the host is unreachable, full, or answers
    /// with something other than a handshake verdict.
    pub fn connect(addr: &SocketAddr) -> Result<(Self, String), Error> {
        let mut connect_timeouts = vec![
            Duration::from_secs(1),
            Duration::from_millis(500),
            Duration::from_millis(100),
        ];
        while let Some(connect_timeout) = connect_timeouts.pop() {
            match TcpStream::connect_timeout(addr, connect_timeout) {
                Ok(mut stream) => {
                    stream.set_read_timeout(Some(READ_TIMEOUT))?;
                    stream.set_write_timeout(Some(WRITE_TIMEOUT))?;
                    return match utils::read_prefixed::<ServerMessage, TcpStream>(&mut stream)? {
                        ServerMessage::ConfirmConnect { address } => {
                            Ok((Self { stream }, address))
                        }
                        ServerMessage::ServerFull => bail!("server full"),
                        response => bail!("invalid handshake response: {response}"),
                    };
                }
                _ => thread::sleep(connect_timeout),
            }
        }
        bail!("couldn't connect to {addr}")
    }

    /// Submits one turn action.
    ///
    /// # Errors
    ///
    /// Returns an error if the message cannot be sent to the host.
    pub fn ask(&mut self, target: SlotIndex, rank: char) -> Result<(), Error> {
        let msg = ClientMessage::Ask { target, rank };
        utils::write_prefixed(&mut self.stream, &msg)?;
        Ok(())
    }

    /// Receives the next pushed message.
    ///
    /// # Errors
    ///
    /// Returns an error on read timeout or a closed connection.
    pub fn recv(&mut self) -> Result<ServerMessage, Error> {
        match utils::read_prefixed::<ServerMessage, TcpStream>(&mut self.stream) {
            Ok(msg) => Ok(msg),
            Err(error) => bail!(error),
        }
    }
}

/// Where the mirrored connection currently stands.
#[derive(Clone, Copy, Debug, Eq, PartialEq)]
pub enum MirrorPhase {
    /// No handshake verdict yet.
    Connecting,
    /// Confirmed, waiting for the game to start.
    Lobby,
    Playing,
    GameOver,
    /// The host was full; this peer never got a slot.
    Rejected,
    Disconnected { shutdown: bool },
}

/// The peer-side mirror of host-pushed state.
#[derive(Clone, Debug)]
pub struct ClientMirror {
    phase: MirrorPhase,
    slot: Option<SlotIndex>,
    hand: Stack,
    stats: Vec<PlayerSummary>,
    draw_pile_size: usize,
    my_turn: bool,
}

impl ClientMirror {
    pub fn new() -> Self {
        Self {
            phase: MirrorPhase::Connecting,
            slot: None,
            hand: Stack::new(),
            stats: Vec::new(),
            draw_pile_size: 0,
            my_turn: false,
        }
    }

    pub fn phase(&self) -> MirrorPhase {
        self.phase
    }

    /// The slot assigned at game start, once known.
    pub fn slot(&self) -> Option<SlotIndex> {
        self.slot
    }

    pub fn hand(&self) -> &Stack {
        &self.hand
    }

    pub fn stats(&self) -> &[PlayerSummary] {
        &self.stats
    }

    pub fn draw_pile_size(&self) -> usize {
        self.draw_pile_size
    }

    /// Whether this peer may submit an ask right now.
    pub fn can_ask(&self) -> bool {
        self.my_turn && self.phase == MirrorPhase::Playing
    }

    /// Applies one host push. Hand and stats updates are verbatim
    /// replacements.
    pub fn apply(&mut self, msg: &ServerMessage) {
        match msg {
            ServerMessage::ConfirmConnect { .. } => {
                self.phase = MirrorPhase::Lobby;
            }
            ServerMessage::ServerFull => {
                self.phase = MirrorPhase::Rejected;
            }
            ServerMessage::StartGame {
                slot,
                hand,
                stats,
                draw_pile_size,
            } => {
                self.phase = MirrorPhase::Playing;
                self.slot = Some(*slot);
                self.hand = hand.clone();
                self.stats = stats.clone();
                self.draw_pile_size = *draw_pile_size;
                self.my_turn = false;
            }
            ServerMessage::Turn => {
                self.my_turn = true;
            }
            ServerMessage::HandAndStats {
                hand,
                stats,
                draw_pile_size,
            } => {
                self.hand = hand.clone();
                self.stats = stats.clone();
                self.draw_pile_size = *draw_pile_size;
                // A fresh snapshot precedes any turn notice on this
                // connection; the notice re-arms the flag.
                self.my_turn = false;
            }
            ServerMessage::GameOver => {
                self.phase = MirrorPhase::GameOver;
                self.my_turn = false;
            }
            ServerMessage::Disconnected { shutdown } => {
                self.phase = MirrorPhase::Disconnected {
                    shutdown: *shutdown,
                };
                self.my_turn = false;
            }
        }
    }
}

impl Default for ClientMirror {
    fn default() -> Self {
        Self::new()
    }
}
