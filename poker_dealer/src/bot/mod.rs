//! Automatic players.
//!
//! A [`Strategy`] sees every broadcast its seat receives and answers the
//! move requests addressed to it. Two are provided:
//!
//! - [`BotDecisionMaker`] plays from a rough hand-strength estimate in one
//!   of three [`BotStyle`]s.
//! - [`Scripted`] replays a fixed list of moves, which keeps tests and
//!   benchmarks deterministic.

use crate::game::entities::Move;
use crate::net::messages::{MoveRequest, ServerMessage};

pub mod decision;
pub mod scripted;

pub use decision::{BotDecisionMaker, BotStyle};
pub use scripted::Scripted;

pub trait Strategy {
    /// Called with every message the seat receives, including its own
    /// `REGISTERED` reply.
    fn observe(&mut self, _msg: &ServerMessage) {}

    /// Answer a move request addressed to this seat. `None` stays silent
    /// and leaves the dealer waiting.
    fn decide(&mut self, request: &MoveRequest) -> Option<Move>;
}

impl<S: Strategy + ?Sized> Strategy for Box<S> {
    fn observe(&mut self, msg: &ServerMessage) {
        (**self).observe(msg);
    }

    fn decide(&mut self, request: &MoveRequest) -> Option<Move> {
        (**self).decide(request)
    }
}
