//! The authoritative game host.
//!
//! A single-threaded `mio` poll loop: one inbound message is
//! processed at a time, so the session, the draw pile, and every hand
//! are mutated without any locking. Each poll tick also checks the
//! shutdown flag so a deliberate shutdown can notify peers before the
//! sockets close.

use log::{info, warn};
use mio::{
    Events, Interest, Poll, Token,
    net::{TcpListener, TcpStream},
};
use std::{
    collections::HashMap,
    io,
    net::SocketAddr,
    sync::{
        Arc,
        atomic::{AtomicBool, Ordering},
    },
    time::Duration,
};
use thiserror::Error;

use super::{
    messages::{ClientMessage, ServerMessage},
    utils,
};
use crate::game::{ConfigError, Delivery, GameConfig, GameSession, SlotIndex};

const LISTENER: Token = Token(0);

/// One scheduling pass per poll timeout at most; this is the tick at
/// which the shutdown flag is observed.
const POLL_TIMEOUT: Duration = Duration::from_millis(100);

/// Errors that can take down the host itself. Peer misbehavior never
/// surfaces here.
#[derive(Debug, Error)]
pub enum ServerError {
    #[error(transparent)]
    Config(#[from] ConfigError),
    #[error(transparent)]
    Io(#[from] io::Error),
}

/// One connected peer: its stream, observed address, and the slot it
/// was promoted to, if any.
struct Connection {
    stream: TcpStream,
    addr: SocketAddr,
    slot: Option<SlotIndex>,
}

/// The game host: owns the session, the listener, and every peer
/// connection.
pub struct GameServer {
    session: GameSession,
    listener: TcpListener,
    poll: Poll,
    connections: HashMap<Token, Connection>,
    /// Maps playing slots back to their connection tokens.
    slots: HashMap<SlotIndex, Token>,
    next_token: usize,
}

impl GameServer {
    /// Binds the host and prepares a session for
    /// `config.player_count` peers.
    ///
    /// # Errors
    ///
    /// Returns an error if the configuration is invalid or the
    /// address can't be bound.
    pub fn bind(addr: SocketAddr, config: GameConfig) -> Result<Self, ServerError> {
        let session = GameSession::new(config)?;
        let mut listener = TcpListener::bind(addr)?;
        let poll = Poll::new()?;
        poll.registry()
            .register(&mut listener, LISTENER, Interest::READABLE)?;
        info!("host started on {}", listener.local_addr()?);
        Ok(Self {
            session,
            listener,
            poll,
            connections: HashMap::new(),
            slots: HashMap::new(),
            next_token: 1,
        })
    }

    /// The bound address, useful when binding to port 0.
    ///
    /// # Errors
    ///
    /// Returns an error if the local address can't be read back.
    pub fn local_addr(&self) -> io::Result<SocketAddr> {
        self.listener.local_addr()
    }

    /// Runs the host until `running` is cleared, then notifies every
    /// peer of the shutdown.
    ///
    /// # Errors
    ///
    /// Returns an error only for poll failures; peer-level I/O errors
    /// disconnect that peer and the game continues.
    pub fn run(&mut self, running: Arc<AtomicBool>) -> Result<(), ServerError> {
        let mut events = Events::with_capacity(128);
        while running.load(Ordering::SeqCst) {
            if let Err(error) = self.poll.poll(&mut events, Some(POLL_TIMEOUT)) {
                if error.kind() == io::ErrorKind::Interrupted {
                    continue;
                }
                return Err(error.into());
            }
            for event in events.iter() {
                match event.token() {
                    LISTENER => self.accept_connections()?,
                    token => {
                        if event.is_readable() || event.is_read_closed() {
                            self.drain_messages(token);
                        }
                    }
                }
            }
        }
        self.shutdown();
        Ok(())
    }

    /// Accepts every pending connection. Peers beyond the configured
    /// player count get a server-full notice and are dropped without
    /// a slot.
    fn accept_connections(&mut self) -> Result<(), ServerError> {
        loop {
            let (mut stream, addr) = match self.listener.accept() {
                Ok(accepted) => accepted,
                Err(error) if error.kind() == io::ErrorKind::WouldBlock => return Ok(()),
                Err(error) => return Err(error.into()),
            };
            if !self.session.can_accept() {
                info!("rejecting {addr}, server is full");
                let _ = utils::write_prefixed(&mut stream, &ServerMessage::ServerFull);
                continue;
            }
            let confirm = ServerMessage::ConfirmConnect {
                address: addr.to_string(),
            };
            if let Err(error) = utils::write_prefixed(&mut stream, &confirm) {
                warn!("couldn't confirm {addr}: {error}");
                continue;
            }
            let token = Token(self.next_token);
            self.next_token += 1;
            if let Err(error) =
                self.poll
                    .registry()
                    .register(&mut stream, token, Interest::READABLE)
            {
                warn!("couldn't register {addr}: {error}");
                continue;
            }
            // can_accept held, so promotion cannot fail.
            let (slot, deliveries) = match self.session.add_player() {
                Ok(promoted) => promoted,
                Err(error) => {
                    warn!("couldn't slot {addr}: {error}");
                    let _ = utils::write_prefixed(&mut stream, &ServerMessage::ServerFull);
                    continue;
                }
            };
            info!("new connection from {addr} playing as slot {slot}");
            self.connections.insert(
                token,
                Connection {
                    stream,
                    addr,
                    slot: Some(slot),
                },
            );
            self.slots.insert(slot, token);
            self.dispatch(deliveries);
        }
    }

    /// Drains every complete inbound message from one peer, feeding
    /// each through the session. Protocol violations are logged and
    /// ignored; I/O failures disconnect the peer.
    fn drain_messages(&mut self, token: Token) {
        loop {
            let Some(connection) = self.connections.get_mut(&token) else {
                return;
            };
            match utils::read_prefixed::<ClientMessage, TcpStream>(&mut connection.stream) {
                Ok(msg) => {
                    let Some(slot) = connection.slot else {
                        warn!("ignoring message from unslotted {}", connection.addr);
                        continue;
                    };
                    let ClientMessage::Ask { target, rank } = msg;
                    match self.session.resolve_ask(slot, target, rank) {
                        Ok(deliveries) => self.dispatch(deliveries),
                        Err(error) => warn!("rejected ask from slot {slot}: {error}"),
                    }
                }
                Err(error) if error.kind() == io::ErrorKind::WouldBlock => return,
                Err(_) => {
                    self.disconnect(token);
                    return;
                }
            }
        }
    }

    /// Pushes session deliveries out to the mapped peers, in slot
    /// order. A peer that can't be written to is disconnected.
    fn dispatch(&mut self, deliveries: Vec<Delivery>) {
        let mut failed = Vec::new();
        for delivery in deliveries {
            let Some(&token) = self.slots.get(&delivery.slot) else {
                continue;
            };
            let Some(connection) = self.connections.get_mut(&token) else {
                continue;
            };
            let msg = ServerMessage::from(delivery.update);
            if let Err(error) = utils::write_prefixed(&mut connection.stream, &msg) {
                warn!("couldn't push to {}: {error}", connection.addr);
                failed.push(token);
            }
        }
        for token in failed {
            self.disconnect(token);
        }
    }

    /// Tears down one connection. A slotted peer's state stays in
    /// the session with its liveness flag cleared; a pending peer is
    /// simply dropped.
    fn disconnect(&mut self, token: Token) {
        let Some(mut connection) = self.connections.remove(&token) else {
            return;
        };
        let _ = self.poll.registry().deregister(&mut connection.stream);
        info!("client disconnected {}", connection.addr);
        if let Some(slot) = connection.slot {
            self.slots.remove(&slot);
            let deliveries = self.session.mark_disconnected(slot);
            self.dispatch(deliveries);
        }
    }

    /// Tells every peer the host is going away, then drops the
    /// sockets.
    fn shutdown(&mut self) {
        info!("host shutting down");
        let notice = ServerMessage::Disconnected { shutdown: true };
        for connection in self.connections.values_mut() {
            let _ = utils::write_prefixed(&mut connection.stream, &notice);
        }
        self.connections.clear();
        self.slots.clear();
    }
}
