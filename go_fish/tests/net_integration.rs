//! Host-peer integration tests over real TCP sockets.
//!
//! Runs the host's poll loop on a background thread with an
//! unshuffled deck, so every snapshot a peer receives is predictable.

use go_fish::{
    Client, GameConfig,
    messages::ServerMessage,
    server::GameServer,
};
use std::{
    net::SocketAddr,
    sync::{
        Arc,
        atomic::{AtomicBool, Ordering},
    },
    thread,
};

fn spawn_host(player_count: usize) -> (SocketAddr, Arc<AtomicBool>, thread::JoinHandle<()>) {
    let mut config = GameConfig::new(player_count);
    config.shuffle = false;
    let bind_addr = "127.0.0.1:0".parse().unwrap();
    let mut server = GameServer::bind(bind_addr, config).unwrap();
    let addr = server.local_addr().unwrap();
    let running = Arc::new(AtomicBool::new(true));
    let flag = running.clone();
    let handle = thread::spawn(move || {
        server.run(flag).unwrap();
    });
    (addr, running, handle)
}

fn hand_codes(msg: &ServerMessage) -> Vec<String> {
    match msg {
        ServerMessage::StartGame { hand, .. } | ServerMessage::HandAndStats { hand, .. } => {
            hand.codes()
        }
        msg => panic!("expected a hand-carrying message, got {msg}"),
    }
}

#[test]
fn two_peers_play_a_turn_end_to_end() {
    let (addr, running, handle) = spawn_host(2);

    let (mut peer_a, address_a) = Client::connect(&addr).unwrap();
    assert!(address_a.starts_with("127.0.0.1:"));
    let (mut peer_b, _) = Client::connect(&addr).unwrap();

    // The second join starts the game: snapshots for both, then the
    // turn notice for slot 0.
    let start_a = peer_a.recv().unwrap();
    match &start_a {
        ServerMessage::StartGame {
            slot,
            stats,
            draw_pile_size,
            ..
        } => {
            assert_eq!(*slot, 0);
            assert_eq!(stats.len(), 2);
            assert_eq!(*draw_pile_size, 40);
        }
        msg => panic!("expected the start snapshot, got {msg}"),
    }
    assert_eq!(hand_codes(&start_a), ["2c", "2d"]);
    assert_eq!(hand_codes(&peer_b.recv().unwrap()), ["2h", "2s"]);
    assert_eq!(peer_a.recv().unwrap(), ServerMessage::Turn);

    // Slot 0 asks slot 1 for twos; the transfer, trick, and redeals
    // land as fresh snapshots on both peers, then slot 0 keeps the
    // turn.
    peer_a.ask(1, '2').unwrap();
    let refresh_a = peer_a.recv().unwrap();
    match &refresh_a {
        ServerMessage::HandAndStats {
            stats,
            draw_pile_size,
            ..
        } => {
            assert_eq!(*draw_pile_size, 28);
            assert_eq!(stats[0].tricks, ['A', '2', '6']);
            assert_eq!(stats[1].tricks, ['3', '4']);
        }
        msg => panic!("expected a state refresh, got {msg}"),
    }
    assert_eq!(hand_codes(&refresh_a), ["5h", "5s"]);
    assert_eq!(hand_codes(&peer_b.recv().unwrap()), ["5c", "5d"]);
    assert_eq!(peer_a.recv().unwrap(), ServerMessage::Turn);

    // An orderly shutdown tells both peers it was deliberate.
    running.store(false, Ordering::SeqCst);
    handle.join().unwrap();
    assert_eq!(
        peer_a.recv().unwrap(),
        ServerMessage::Disconnected { shutdown: true }
    );
    assert_eq!(
        peer_b.recv().unwrap(),
        ServerMessage::Disconnected { shutdown: true }
    );
}

#[test]
fn late_peers_are_turned_away() {
    let (addr, running, handle) = spawn_host(2);

    let (_peer_a, _) = Client::connect(&addr).unwrap();
    let (_peer_b, _) = Client::connect(&addr).unwrap();

    // The table is full, so the handshake is refused.
    let result = Client::connect(&addr);
    assert!(result.is_err());

    running.store(false, Ordering::SeqCst);
    handle.join().unwrap();
}
