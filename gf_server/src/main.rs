//! Go Fish game host.
//!
//! Binds a TCP listener, waits for the configured number of players,
//! and runs the authoritative game loop until the game ends or the
//! process is told to stop.

mod config;

use std::{
    net::SocketAddr,
    path::PathBuf,
    sync::{
        Arc,
        atomic::{AtomicBool, Ordering},
    },
};

use anyhow::Error;
use ctrlc::set_handler;
use go_fish::{GameConfig, server::GameServer};
use log::info;
use pico_args::Arguments;

use config::FileConfig;

const HELP: &str = "\
Host a Go Fish game

USAGE:
  gf_server [OPTIONS]

OPTIONS:
  --bind       IP:PORT     Server socket bind address  [default: from config file or 127.0.0.1:5071]
  --players    N           Number of players to wait for (2-9)  [default: from config file or 2]
  --hand-size  N           Cards dealt per hand  [default: 6, or 5 for 5+ players]
  --config     PATH        JSON configuration file  [default: go_fish.json]

FLAGS:
  -h, --help               Print help information
";

struct Args {
    bind: SocketAddr,
    players: usize,
    hand_size: Option<usize>,
}

fn main() -> Result<(), Error> {
    let mut pargs = Arguments::from_env();

    // Help has a higher priority and should be handled separately.
    if pargs.contains(["-h", "--help"]) {
        print!("{HELP}");
        std::process::exit(0);
    }

    let config_path: PathBuf = pargs
        .opt_value_from_str("--config")?
        .unwrap_or_else(|| PathBuf::from("go_fish.json"));
    let file_config = FileConfig::load(&config_path)?;

    let args = Args {
        bind: match pargs.opt_value_from_str("--bind")? {
            Some(bind) => bind,
            None => format!("{}:{}", file_config.default_host, file_config.default_port)
                .parse()?,
        },
        players: pargs
            .opt_value_from_str("--players")?
            .unwrap_or(file_config.players),
        hand_size: pargs.opt_value_from_str("--hand-size")?,
    };

    env_logger::builder().format_target(false).init();

    // Catching signals for a graceful exit; the host notifies peers
    // before the sockets close.
    let running = Arc::new(AtomicBool::new(true));
    let flag = running.clone();
    set_handler(move || flag.store(false, Ordering::SeqCst))?;

    let mut game_config = GameConfig::new(args.players);
    game_config.hand_size = args.hand_size;

    info!(
        "hosting a {}-player game at {}",
        args.players, args.bind
    );
    let mut server = GameServer::bind(args.bind, game_config)?;
    server.run(running)?;

    Ok(())
}
