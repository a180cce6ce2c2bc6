//! Tournament dealer server.
//!
//! Seats players as they register over TCP, then deals hands until one of
//! them holds every chip.

mod config;

use anyhow::{Error, bail};
use ctrlc::set_handler;
use log::{info, warn};
use pico_args::Arguments;
use poker_dealer::{
    LocalTransport, TcpTransport, Tournament, TournamentResult,
    bot::{BotDecisionMaker, BotStyle},
};
use std::time::Duration;

use config::{Overrides, ServerConfig};

const HELP: &str = "\
Run a poker tournament dealer

USAGE:
  pd_server [OPTIONS]

OPTIONS:
  --bind          IP:PORT  Server socket bind address     [default: env SERVER_BIND or 127.0.0.1:6969]
  --players       N        Players to seat before dealing [default: env NUM_PLAYERS or 4]
  --chips         N        Starting chips per player      [default: env STARTING_CHIPS or 1000]
  --min-raise     N        Opening minimum raise          [default: env MIN_RAISE or 100]
  --move-timeout  SECS     Seconds to answer a move, 0 waits forever [default: env MOVE_TIMEOUT_SECS or 0]
  --hand-limit    N        Stop after N hands, 0 for no limit        [default: env HAND_LIMIT or 0]

FLAGS:
  --local-bots             Fill every seat with in-process bots instead of listening
  -h, --help               Print help information

ENVIRONMENT:
  RUST_LOG                 Log filter (e.g., info, poker_dealer=debug)
  (See .env.example for all configuration options)
";

/// How long to keep pushing out the final broadcasts before exiting.
const FLUSH_TIMEOUT: Duration = Duration::from_secs(2);

fn parse_overrides(pargs: &mut Arguments) -> Result<Overrides, Error> {
    Ok(Overrides {
        bind: pargs.opt_value_from_str("--bind")?,
        num_players: pargs.opt_value_from_str("--players")?,
        starting_chips: pargs.opt_value_from_str("--chips")?,
        min_raise: pargs.opt_value_from_str("--min-raise")?,
        move_timeout_secs: pargs.opt_value_from_str("--move-timeout")?,
        hand_limit: pargs.opt_value_from_str("--hand-limit")?,
    })
}

fn run_local(config: ServerConfig) -> Result<TournamentResult, Error> {
    let styles = [BotStyle::Balanced, BotStyle::Aggressive, BotStyle::Passive];
    let mut transport = LocalTransport::new();
    for (i, style) in styles
        .iter()
        .cycle()
        .take(config.tournament.num_players)
        .enumerate()
    {
        let name = format!("{style}Bot{}", i + 1);
        transport.join(Some(&name), BotDecisionMaker::new(*style));
    }
    Ok(Tournament::new(config.tournament).run(&mut transport)?)
}

fn run_tcp(config: ServerConfig) -> Result<TournamentResult, Error> {
    let mut transport = TcpTransport::bind(config.bind)?;
    let result = Tournament::new(config.tournament).run(&mut transport);
    if let Err(error) = transport.flush(FLUSH_TIMEOUT) {
        warn!("couldn't flush final messages: {error}");
    }
    Ok(result?)
}

fn main() -> Result<(), Error> {
    // Load .env file if it exists
    let _ = dotenvy::dotenv();

    let mut pargs = Arguments::from_env();

    // Help has a higher priority and should be handled separately.
    if pargs.contains(["-h", "--help"]) {
        print!("{HELP}");
        std::process::exit(0);
    }

    let local_bots = pargs.contains("--local-bots");
    let overrides = parse_overrides(&mut pargs)?;
    let remaining = pargs.finish();
    if !remaining.is_empty() {
        bail!("unexpected arguments: {remaining:?}");
    }

    let config = ServerConfig::from_env(overrides)?;
    config.validate()?;

    // Catching signals for exit.
    set_handler(|| std::process::exit(0))?;

    env_logger::builder().format_target(false).init();

    let result = if local_bots {
        info!(
            "Starting a local tournament with {} bots",
            config.tournament.num_players
        );
        run_local(config)?
    } else {
        info!(
            "Starting tournament dealer at {} for {} players",
            config.bind, config.tournament.num_players
        );
        run_tcp(config)?
    };

    match result.winner {
        Some(winner) => info!(
            "{winner} won after {} hands ({} knocked out)",
            result.hands_played,
            result.eliminated.len()
        ),
        None => warn!("no winner after {} hands", result.hands_played),
    }
    Ok(())
}
