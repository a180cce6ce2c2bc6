//! One betting round (street): ask each player in turn for a move until
//! action comes back around to the last aggressor, then sweep the round's
//! commitments into the pot.

use log::{debug, info, warn};
use std::time::Duration;

use super::{
    entities::{Chips, Move, SeatIndex, Username},
    errors::Result,
    moves::{Outcome, Stakes, process_move},
    roster::Roster,
};
use crate::net::{
    messages::{MoveKind, MoveNotice, MoveRequest, ServerMessage},
    transport::{Transport, await_reply},
};

/// How a round is opened and paced.
#[derive(Clone, Copy, Debug, Eq, PartialEq)]
pub struct RoundRules {
    /// Seats past the dealer that act first.
    pub first_to_act_offset: usize,
    /// Raise increment floor at the start of the round.
    pub min_raise: Chips,
    /// How long to wait on a reply before folding the player. `None` waits
    /// forever.
    pub move_timeout: Option<Duration>,
}

/// State of a betting round, and once it has closed, how it went.
#[derive(Clone, Debug, Eq, PartialEq)]
pub struct BettingRound {
    pub stakes: Stakes,
    /// Action ends when it comes back to this seat.
    pub closing_seat: SeatIndex,
    /// Players that went all-in this round, in the order they did.
    pub side_pots: Vec<Username>,
    /// Moves resolved, not counting players skipped for having nothing
    /// behind.
    pub resolved_moves: usize,
    /// Chips swept into the pot at settlement.
    pub collected: Chips,
}

impl BettingRound {
    /// Run a full betting round.
    ///
    /// The round is skipped when fewer than two contenders have chips left
    /// to bet, and ends early once everyone but one player has folded.
    ///
    /// # Errors
    ///
    /// Fails on a turn-order invariant violation or a transport failure.
    pub fn run<T: Transport + ?Sized>(
        roster: &mut Roster,
        pot: &mut Chips,
        transport: &mut T,
        rules: &RoundRules,
    ) -> Result<Self> {
        for player in &mut roster.players {
            player.all_in_this_round = false;
        }

        let opener = roster.advance(roster.dealer_seat()?, rules.first_to_act_offset)?;
        let mut round = Self {
            stakes: Stakes::new(rules.min_raise),
            closing_seat: opener,
            side_pots: Vec::new(),
            resolved_moves: 0,
            collected: 0,
        };

        if roster.num_contenders_with_chips() < 2 {
            debug!("skipping betting round, nobody left to bet against");
        } else {
            round.take_turns(roster, *pot, transport, rules, opener)?;
        }

        round.collected = settle(roster, pot);
        Ok(round)
    }

    fn take_turns<T: Transport + ?Sized>(
        &mut self,
        roster: &mut Roster,
        pot: Chips,
        transport: &mut T,
        rules: &RoundRules,
        opener: SeatIndex,
    ) -> Result<()> {
        let mut seat = opener;
        let mut opening = true;
        loop {
            if !opening && seat == self.closing_seat {
                break;
            }
            opening = false;
            if roster.num_contenders() < 2 {
                debug!("betting round over, one contender left");
                break;
            }

            // All-in players stay in the hand but have nothing to decide.
            if roster.players[seat].chips_behind() == 0 {
                seat = roster.next_to_act(seat)?;
                continue;
            }

            let requested = self.request_move(roster, pot, transport, rules, seat)?;
            let outcome = process_move(requested, &mut roster.players[seat], &mut self.stakes);
            self.resolved_moves += 1;

            let player = &mut roster.players[seat];
            match outcome {
                Outcome::AllIn => {
                    player.all_in_this_round = true;
                    self.side_pots.push(player.name.clone());
                    if player.chips_this_round > self.stakes.last_bet + self.stakes.min_raise {
                        self.stakes.last_bet = player.chips_this_round;
                        self.closing_seat = seat;
                    }
                }
                Outcome::Raise => self.closing_seat = seat,
                // A call for exactly the whole stack stays a call and isn't
                // listed as an all-in. The player is still skipped from here
                // on, and settlement caps their winnings by hand total.
                Outcome::Call | Outcome::Fold => {}
            }
            debug!("{} {outcome}, {} committed", player.name, player.chips_this_round);

            let notice = MoveNotice {
                name: player.name.clone(),
                action: MoveKind::from(outcome),
                bet: player.chips_this_round,
                chips: player.chips_behind(),
            };
            transport.broadcast(&ServerMessage::Move(notice))?;

            let next = roster.next_to_act(seat)?;
            // A folded closer can never be reached again. Only the opener
            // can fold while closing, so the next seat opens in their place.
            if outcome == Outcome::Fold && seat == self.closing_seat {
                self.closing_seat = next;
                opening = true;
            }
            seat = next;
        }
        Ok(())
    }

    /// Broadcast a move request for `seat` and wait for its owner to
    /// answer. A wait that runs out is a fold.
    fn request_move<T: Transport + ?Sized>(
        &self,
        roster: &Roster,
        pot: Chips,
        transport: &mut T,
        rules: &RoundRules,
        seat: SeatIndex,
    ) -> Result<Move> {
        let player = &roster.players[seat];
        let committed: Chips = roster.players.iter().map(|p| p.chips_this_round).sum();
        let request = MoveRequest {
            name: player.name.clone(),
            pot: pot + committed,
            to_call: self.stakes.last_bet.saturating_sub(player.chips_this_round),
            last_bet: self.stakes.last_bet,
            min_raise: self.stakes.min_raise,
            chips: player.chips_behind(),
        };
        transport.broadcast(&ServerMessage::MoveRequest(request))?;

        let reply = await_reply(transport, rules.move_timeout, |reply| {
            if reply.name != player.name {
                return false;
            }
            let authenticated = player.is_authenticated_by(&reply.key);
            if !authenticated {
                warn!("discarding move for {} with a bad key", player.name);
            }
            authenticated
        })?;

        match reply {
            Some(reply) => Ok(reply.to_move()),
            None => {
                info!("{} ran out of time and folds", player.name);
                Ok(Move::Fold)
            }
        }
    }
}

/// Move every round commitment out of the players' stacks into the pot.
/// Returns how much was collected.
fn settle(roster: &mut Roster, pot: &mut Chips) -> Chips {
    let mut collected = 0;
    for player in &mut roster.players {
        player.chips -= player.chips_this_round;
        collected += player.chips_this_round;
        player.chips_this_round = 0;
    }
    *pot += collected;
    collected
}
