//! Tournament dealer: the player registry, turn order, betting rounds,
//! hand orchestration and the tournament loop built on top of them.
//!
//! Everything here runs on a single thread and talks to players only
//! through a [`Transport`](crate::net::transport::Transport).

pub mod betting;
pub mod constants;
pub mod engine;
pub mod entities;
pub mod errors;
pub mod functional;
pub mod hand;
pub mod moves;
pub mod pot;
pub mod roster;
pub mod tournament;
pub mod turn_order;

pub use errors::{GameError, Result};
pub use tournament::{Tournament, TournamentResult, TournamentSettings};
