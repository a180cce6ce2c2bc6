//! Move legality. Resolves a requested move against the open betting
//! round and applies it to the acting player.

use serde::{Deserialize, Serialize};
use std::fmt;

use super::entities::{Chips, Move, Player};

/// What a requested move actually became. Callers must branch on this and
/// never assume it matches the request.
#[derive(Clone, Copy, Debug, Deserialize, Eq, PartialEq, Serialize)]
pub enum Outcome {
    AllIn,
    Call,
    Fold,
    Raise,
}

impl fmt::Display for Outcome {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        let repr = match self {
            Self::AllIn => "all-in",
            Self::Call => "call",
            Self::Fold => "fold",
            Self::Raise => "raise",
        };
        write!(f, "{repr}")
    }
}

/// The betting round's running prices.
#[derive(Clone, Copy, Debug, Eq, PartialEq)]
pub struct Stakes {
    /// Smallest increment over `last_bet` that counts as a raise.
    pub min_raise: Chips,
    /// Highest total round commitment so far.
    pub last_bet: Chips,
}

impl Stakes {
    #[must_use]
    pub fn new(min_raise: Chips) -> Self {
        Self {
            min_raise,
            last_bet: 0,
        }
    }
}

/// Chips the move asks to put in, before legality is applied.
fn proposed_amount(requested: Move, player: &Player) -> Chips {
    match requested {
        Move::Raise(amount) => amount,
        Move::AllIn => player.chips,
        Move::Call | Move::Fold => 0,
    }
}

/// Set the player's round commitment, keeping the hand total in step.
fn commit(player: &mut Player, amount: Chips) {
    let previous = player.chips_this_round;
    player.chips_this_round = amount;
    player.chips_this_game = player.chips_this_game + amount - previous;
}

fn fold(player: &mut Player) -> Outcome {
    player.active_this_round = false;
    Outcome::Fold
}

/// Resolve `requested` for `player`, updating their round and hand
/// commitments and, on a real raise, the round's stakes.
///
/// In order:
/// 1. A move that would commit the whole stack is an all-in, whatever was
///    requested.
/// 2. A raise at or below `last_bet` is a fold, even when `min_raise` is
///    zero. One at least `min_raise` over `last_bet` is a raise and a
///    smaller positive increment is downgraded to a call.
/// 3. A call that the stack can't cover becomes an all-in.
/// 4. Everything else folds.
///
/// The player's stack is left alone. Chips only leave it when the round
/// is settled into the pot.
pub fn process_move(requested: Move, player: &mut Player, stakes: &mut Stakes) -> Outcome {
    let proposed = proposed_amount(requested, player);
    if proposed.saturating_add(player.chips_this_round) >= player.chips {
        commit(player, player.chips);
        return Outcome::AllIn;
    }

    match requested {
        Move::Raise(total) => {
            let increment = i64::from(total) - i64::from(stakes.last_bet);
            if increment <= 0 {
                fold(player)
            } else if increment >= i64::from(stakes.min_raise) {
                stakes.min_raise = total - stakes.last_bet;
                stakes.last_bet = total;
                commit(player, total);
                Outcome::Raise
            } else {
                commit(player, stakes.last_bet);
                Outcome::Call
            }
        }
        Move::Call if stakes.last_bet > player.chips => {
            commit(player, player.chips);
            Outcome::AllIn
        }
        Move::Call => {
            commit(player, stakes.last_bet);
            Outcome::Call
        }
        Move::AllIn | Move::Fold => fold(player),
    }
}
