//! # Poker Dealer
//!
//! The dealer for a multiplayer Texas Hold'em tournament. It seats
//! players, asks each one for a move in turn, enforces betting rules,
//! pays out pots and rotates the button until a single player holds
//! every chip.
//!
//! ## Core Modules
//!
//! - [`game`]: roster, turn order, move processing, betting rounds, hand
//!   orchestration and the tournament loop
//! - [`net`]: the wire protocol, the [`Transport`](net::transport::Transport)
//!   seam and its TCP and in-process implementations
//! - [`bot`]: automatic players
//!
//! ## Example
//!
//! ```
//! use poker_dealer::{Tournament, TournamentSettings, bot::Scripted, net::local::LocalTransport};
//!
//! let mut transport = LocalTransport::new();
//! transport
//!     .join(Some("alice"), Scripted::calling())
//!     .join(Some("bob"), Scripted::calling());
//!
//! let settings = TournamentSettings::new(2, 100, 10).with_hand_limit(3);
//! let result = Tournament::new(settings).run(&mut transport).unwrap();
//! assert!(result.hands_played <= 3);
//! ```

/// Automatic players.
pub mod bot;

/// Networking components for dealer-player communication.
pub mod net;
pub use net::{client::Client, local::LocalTransport, messages, server::TcpTransport, utils};

/// Core game logic and the tournament loop.
pub mod game;
pub use game::{
    GameError, Tournament, TournamentResult, TournamentSettings,
    constants::{self, MAX_PLAYERS},
    engine::{CardEngine, HoldemEngine},
    entities::{self, Move},
    functional,
};
