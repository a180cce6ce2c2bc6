use std::collections::VecDeque;

use super::Strategy;
use crate::game::entities::Move;
use crate::net::messages::MoveRequest;

/// Plays a fixed sequence of moves, then falls back to a default.
#[derive(Clone, Debug)]
pub struct Scripted {
    moves: VecDeque<Option<Move>>,
    fallback: Option<Move>,
}

impl Scripted {
    /// Play `moves` in order, then call for the rest of the game.
    pub fn new(moves: impl IntoIterator<Item = Move>) -> Self {
        Self {
            moves: moves.into_iter().map(Some).collect(),
            fallback: Some(Move::Call),
        }
    }

    /// Call every request.
    #[must_use]
    pub fn calling() -> Self {
        Self::new([])
    }

    /// Never answer.
    #[must_use]
    pub fn silent() -> Self {
        Self {
            moves: VecDeque::new(),
            fallback: None,
        }
    }

    /// What to play once the script runs out. `None` goes silent.
    #[must_use]
    pub fn then(mut self, fallback: Option<Move>) -> Self {
        self.fallback = fallback;
        self
    }

}

impl Strategy for Scripted {
    fn decide(&mut self, _request: &MoveRequest) -> Option<Move> {
        self.moves.pop_front().unwrap_or(self.fallback)
    }
}
