//! One hand from deal to dealer rotation.

use log::{debug, info};
use std::fmt;

use super::{
    betting::BettingRound,
    constants::{POSTFLOP_FIRST_TO_ACT_OFFSET, PREFLOP_FIRST_TO_ACT_OFFSET},
    engine::CardEngine,
    entities::{Card, Chips, SeatIndex, Username},
    errors::{GameError, Result},
    pot,
    roster::Roster,
    tournament::TournamentSettings,
};
use crate::net::{
    messages::{DealtHand, Payout, ServerMessage},
    transport::Transport,
};

#[derive(Clone, Copy, Debug, Eq, PartialEq)]
pub enum Street {
    PreFlop,
    Flop,
    Turn,
    River,
}

impl fmt::Display for Street {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        let repr = match self {
            Self::PreFlop => "pre-flop",
            Self::Flop => "flop",
            Self::Turn => "turn",
            Self::River => "river",
        };
        write!(f, "{repr}")
    }
}

/// Board streets in the order they're revealed. The river comes out
/// before the turn at this table.
pub const REVEAL_ORDER: [Street; 3] = [Street::Flop, Street::River, Street::Turn];

/// What happened in a hand.
#[derive(Clone, Debug, Eq, PartialEq)]
pub struct HandSummary {
    pub dealer: SeatIndex,
    /// Every street that was bet, in order.
    pub streets: Vec<(Street, BettingRound)>,
    /// Total pot before it was paid out.
    pub pot: Chips,
    pub payouts: Vec<Payout>,
    /// Whether the pot went to a showdown rather than the last player
    /// standing.
    pub showdown: bool,
    pub eliminated: Vec<Username>,
    pub next_dealer: SeatIndex,
}

/// Give every player still in the tournament a hand slot, counting from
/// the seat left of the dealer. Returns the seats in deal order.
fn assign_deal_positions(roster: &mut Roster, dealer: SeatIndex) -> Vec<SeatIndex> {
    let num_seats = roster.len();
    let mut dealt = Vec::with_capacity(num_seats);
    for step in 1..=num_seats {
        let seat = (dealer + step) % num_seats;
        let player = &mut roster.players[seat];
        player.chips_this_round = 0;
        player.chips_this_game = 0;
        if player.active {
            player.deal_position = Some(dealt.len());
            dealt.push(seat);
        } else {
            player.deal_position = None;
        }
    }
    dealt
}

fn deal_street<E: CardEngine + ?Sized>(engine: &mut E, street: Street) -> Vec<Card> {
    match street {
        Street::PreFlop => Vec::new(),
        Street::Flop => engine.deal_flop(),
        Street::Turn => engine.deal_turn(),
        Street::River => engine.deal_river(),
    }
}

/// Play one hand: deal, bet each street, pay out the pot, knock out
/// broke players and pass the button.
///
/// Streets stop being dealt once a single player is left in the hand;
/// they take the pot without a showdown.
///
/// # Errors
///
/// Fails on a turn-order invariant violation, a misdeal or a transport
/// failure.
pub fn play_hand<E, T>(
    roster: &mut Roster,
    engine: &mut E,
    transport: &mut T,
    settings: &TournamentSettings,
) -> Result<HandSummary>
where
    E: CardEngine + ?Sized,
    T: Transport + ?Sized,
{
    let dealer = roster.dealer_seat()?;
    let dealt = assign_deal_positions(roster, dealer);
    info!(
        "dealing {} hands, {} has the button",
        dealt.len(),
        roster.players[dealer].name
    );

    let hands = engine.deal_hands(dealt.len());
    if hands.len() != dealt.len() {
        return Err(GameError::MisdealtHands {
            dealt: hands.len(),
            expected: dealt.len(),
        });
    }
    let players = dealt
        .iter()
        .zip(hands)
        .map(|(&seat, hand)| DealtHand {
            name: roster.players[seat].name.clone(),
            chips: roster.players[seat].chips,
            hand,
        })
        .collect();
    transport.broadcast(&ServerMessage::DealtHands { pot: 0, players })?;

    let mut pot: Chips = 0;
    let mut streets = Vec::with_capacity(4);
    let preflop = BettingRound::run(
        roster,
        &mut pot,
        transport,
        &settings.round_rules(PREFLOP_FIRST_TO_ACT_OFFSET),
    )?;
    streets.push((Street::PreFlop, preflop));

    for street in REVEAL_ORDER {
        if roster.num_contenders() < 2 {
            break;
        }
        let revealed = deal_street(engine, street);
        debug!("{street}: {revealed:?}");
        transport.broadcast(&ServerMessage::TableCards {
            pot,
            cards: engine.table().to_vec(),
        })?;
        let round = BettingRound::run(
            roster,
            &mut pot,
            transport,
            &settings.round_rules(POSTFLOP_FIRST_TO_ACT_OFFSET),
        )?;
        streets.push((street, round));
    }

    let total = pot;
    let showdown = roster.num_contenders() > 1;
    let slots: Vec<(SeatIndex, usize)> = roster
        .players
        .iter()
        .filter_map(|p| p.deal_position.map(|slot| (p.seat, slot)))
        .collect();
    let payouts = pot::distribute(roster, &mut pot, |contenders| {
        let contending: Vec<usize> = slots
            .iter()
            .filter(|(seat, _)| contenders.contains(seat))
            .map(|&(_, slot)| slot)
            .collect();
        let winning = engine.winning_hands(&contending);
        slots
            .iter()
            .filter(|(_, slot)| winning.contains(slot))
            .map(|&(seat, _)| seat)
            .collect()
    });
    transport.broadcast(&ServerMessage::Showdown {
        pot: total,
        payouts: payouts.clone(),
    })?;

    let eliminated = roster.mark_eliminated_if_broke();
    for name in &eliminated {
        info!("{name} is out of chips");
    }
    let next_dealer = roster.reset_and_move_dealer_to_next_player()?;

    Ok(HandSummary {
        dealer,
        streets,
        pot: total,
        payouts,
        showdown,
        eliminated,
        next_dealer,
    })
}
