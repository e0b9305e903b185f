//! A Go Fish client for connecting to a game host.
//!
//! A reader thread mirrors every host push and prints the table
//! state; the main thread reads commands from stdin and forwards
//! asks.

use std::{
    io::{self, BufRead, Write},
    net::SocketAddr,
    sync::{Arc, Mutex},
    thread,
};

use anyhow::{Context, Result, bail};
use go_fish::{
    Client, ClientMirror, MirrorPhase,
    messages::ServerMessage,
    utils,
};
use log::warn;
use pico_args::Arguments;

const HELP: &str = "\
Connect to a Go Fish game host

USAGE:
  gf_client [OPTIONS]

OPTIONS:
  --connect  IP:PORT       Host address  [default: 127.0.0.1:5071]

FLAGS:
  -h, --help               Print help information

COMMANDS (at the prompt):
  ask <slot> <rank>        Ask the player in <slot> for every <rank>
  quit                     Leave the game
";

struct Args {
    connect: SocketAddr,
}

fn print_table(mirror: &ClientMirror) {
    println!("draw pile: {} card(s)", mirror.draw_pile_size());
    for (slot, summary) in mirror.stats().iter().enumerate() {
        let marker = if mirror.slot() == Some(slot) { " (you)" } else { "" };
        println!("  slot {slot}{marker}: {summary}");
    }
    println!("your hand: {}", mirror.hand());
}

fn watch(mut client: Client, mirror: Arc<Mutex<ClientMirror>>) {
    loop {
        let msg = match client.recv() {
            Ok(msg) => msg,
            Err(error) => {
                match error.downcast_ref::<io::Error>().map(io::Error::kind) {
                    Some(io::ErrorKind::WouldBlock) | Some(io::ErrorKind::TimedOut) => continue,
                    _ => {
                        println!("lost the connection: {error}");
                        std::process::exit(1);
                    }
                }
            }
        };
        let mut mirror = mirror.lock().unwrap();
        mirror.apply(&msg);
        match &msg {
            ServerMessage::StartGame { slot, .. } => {
                println!("game started, you are slot {slot}");
                print_table(&mirror);
            }
            ServerMessage::HandAndStats { .. } => {
                print_table(&mirror);
            }
            ServerMessage::Turn => {
                println!("your turn: ask <slot> <rank>");
            }
            ServerMessage::GameOver => {
                println!("game over");
                print_table(&mirror);
                std::process::exit(0);
            }
            ServerMessage::Disconnected { shutdown: true } => {
                println!("the host shut down");
                std::process::exit(0);
            }
            msg => println!("{msg}"),
        }
    }
}

fn run(args: Args) -> Result<()> {
    let (client, address) = Client::connect(&args.connect)?;
    println!("connected to {} as {address}, waiting for players", args.connect);

    let mut commands = client.stream.try_clone()?;
    let mirror = Arc::new(Mutex::new(ClientMirror::new()));
    let watcher = mirror.clone();
    thread::spawn(move || watch(client, watcher));

    let stdin = io::stdin();
    for line in stdin.lock().lines() {
        let line = line?;
        let mut words = line.split_whitespace();
        match words.next() {
            Some("ask") => {
                if !mirror.lock().unwrap().can_ask() {
                    println!("it's not your turn");
                    continue;
                }
                let parsed = (|| -> Result<(usize, char)> {
                    let slot = words
                        .next()
                        .context("usage: ask <slot> <rank>")?
                        .parse()
                        .context("slot must be a number")?;
                    let rank = words.next().context("usage: ask <slot> <rank>")?;
                    let mut chars = rank.chars();
                    match (chars.next(), chars.next()) {
                        (Some(rank), None) => Ok((slot, rank)),
                        _ => bail!("rank must be a single character"),
                    }
                })();
                match parsed {
                    Ok((slot, rank)) => {
                        let msg = go_fish::messages::ClientMessage::Ask { target: slot, rank };
                        utils::write_prefixed(&mut commands, &msg)?;
                    }
                    Err(error) => println!("{error}"),
                }
            }
            Some("quit") => break,
            Some(command) => println!("unknown command {command}, try ask or quit"),
            None => {}
        }
        io::stdout().flush()?;
    }

    if mirror.lock().unwrap().phase() == MirrorPhase::Playing {
        warn!("leaving a game in progress");
    }
    Ok(())
}

fn main() -> Result<()> {
    let mut pargs = Arguments::from_env();

    if pargs.contains(["-h", "--help"]) {
        print!("{HELP}");
        std::process::exit(0);
    }

    let args = Args {
        connect: match pargs.opt_value_from_str("--connect")? {
            Some(connect) => connect,
            None => format!("{}:{}", go_fish::DEFAULT_HOST, go_fish::DEFAULT_PORT).parse()?,
        },
    };

    env_logger::builder().format_target(false).init();
    run(args)
}
