//! Errors raised by the dealer while registering players and running hands.

use thiserror::Error;

use super::entities::SeatIndex;
use crate::net::errors::TransportError;

#[derive(Debug, Error)]
pub enum GameError {
    #[error("registration is closed once the tournament has started")]
    RegistrationClosed,
    #[error("table is full ({0} seats)")]
    TableFull(usize),
    #[error("tournament already started")]
    AlreadyStarted,
    #[error("need 2+ players, have {0}")]
    NotEnoughPlayers(usize),
    #[error("invalid settings: {0}")]
    InvalidSettings(String),
    #[error("registration aborted: {0}")]
    RegistrationAborted(String),
    #[error("invalid game state: no dealer")]
    NoDealer,
    #[error("invalid game state: {0} players hold the dealer button")]
    MultipleDealers(usize),
    #[error("invalid game state: seat {0} out of bounds")]
    InvalidSeat(SeatIndex),
    #[error("invalid game state: no player left to act")]
    NoEligibleSeat,
    #[error("card engine dealt {dealt} hands for {expected} players")]
    MisdealtHands { dealt: usize, expected: usize },
    #[error(transparent)]
    Transport(#[from] TransportError),
}

/// Result type for dealer operations
pub type Result<T> = std::result::Result<T, GameError>;
