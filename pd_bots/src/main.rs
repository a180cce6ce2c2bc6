//! Bot players for a running tournament dealer.
//!
//! Each bot gets its own thread and blocking connection, registers, and
//! plays until the dealer announces the end of the tournament.

use anyhow::{Error, bail};
use ctrlc::set_handler;
use log::{error, info};
use pico_args::Arguments;
use poker_dealer::{
    Client,
    bot::{BotDecisionMaker, BotStyle},
    entities::Username,
};
use rand::seq::IndexedRandom;
use std::{net::SocketAddr, thread};

const HELP: &str = "\
Connect poker bots to a tournament dealer

USAGE:
  pd_bots [OPTIONS]

OPTIONS:
  --connect  IP:PORT  Dealer socket address          [default: 127.0.0.1:6969]
  --bots     N        Number of bots to connect      [default: 4]
  --style    STYLE    passive, balanced, aggressive  [default: a random mix]
  --prefix   NAME     Name prefix for the bots       [default: Bot]

FLAGS:
  -h, --help          Print help information
";

const STYLES: [BotStyle; 3] = [BotStyle::Passive, BotStyle::Balanced, BotStyle::Aggressive];

struct Args {
    addr: SocketAddr,
    num_bots: usize,
    style: Option<BotStyle>,
    prefix: String,
}

fn play(addr: SocketAddr, name: String, style: BotStyle) -> Result<Option<Username>, Error> {
    let mut client = Client::connect(&addr, Some(&name))?;
    info!("{} seated with {} chips, playing {style}", client.name, client.chips);
    let mut bot = BotDecisionMaker::new(style);
    client.play(&mut bot)
}

fn main() -> Result<(), Error> {
    let mut pargs = Arguments::from_env();

    // Help has a higher priority and should be handled separately.
    if pargs.contains(["-h", "--help"]) {
        print!("{HELP}");
        std::process::exit(0);
    }

    let args = Args {
        addr: pargs
            .opt_value_from_str("--connect")?
            .unwrap_or_else(|| SocketAddr::from(([127, 0, 0, 1], 6969))),
        num_bots: pargs.opt_value_from_str("--bots")?.unwrap_or(4),
        style: pargs.opt_value_from_str("--style")?,
        prefix: pargs
            .opt_value_from_str("--prefix")?
            .unwrap_or_else(|| "Bot".to_string()),
    };
    if args.num_bots == 0 {
        bail!("--bots must be at least 1");
    }

    // Catching signals for exit.
    set_handler(|| std::process::exit(0))?;

    env_logger::builder().format_target(false).init();
    info!("Connecting {} bots to {}", args.num_bots, args.addr);

    let mut rng = rand::rng();
    let handles: Vec<_> = (1..=args.num_bots)
        .map(|i| {
            let name = format!("{}{i}", args.prefix);
            let style = args
                .style
                .or_else(|| STYLES.choose(&mut rng).copied())
                .unwrap_or_default();
            let addr = args.addr;
            thread::spawn(move || play(addr, name, style))
        })
        .collect();

    let mut failures = 0;
    for handle in handles {
        match handle.join() {
            Ok(Ok(Some(winner))) => info!("tournament over, {winner} won"),
            Ok(Ok(None)) => info!("tournament over without a winner"),
            Ok(Err(error)) => {
                error!("bot failed: {error}");
                failures += 1;
            }
            Err(_) => {
                error!("bot thread panicked");
                failures += 1;
            }
        }
    }
    if failures > 0 {
        bail!("{failures} of {} bots failed", args.num_bots);
    }
    Ok(())
}
