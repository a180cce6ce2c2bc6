//! Bot decision-making logic with style-based behavior.

use rand::Rng;
use std::{fmt, str::FromStr};

use super::Strategy;
use crate::game::{
    entities::{Card, Chips, Move, Rank, Username},
    functional::eval,
};
use crate::net::messages::{MoveRequest, ServerMessage};

// === Hand Strength Base Values ===
// Baseline strength for each hand rank, before the kicker bonus.

const STRENGTH_HIGH_CARD: f32 = 0.1;
const STRENGTH_ONE_PAIR: f32 = 0.25;
const STRENGTH_TWO_PAIR: f32 = 0.40;
const STRENGTH_THREE_OF_A_KIND: f32 = 0.55;
const STRENGTH_STRAIGHT: f32 = 0.70;
const STRENGTH_FLUSH: f32 = 0.75;
const STRENGTH_FULL_HOUSE: f32 = 0.85;
const STRENGTH_FOUR_OF_A_KIND: f32 = 0.95;
const STRENGTH_STRAIGHT_FLUSH: f32 = 0.99;

/// Raise size varies by up to this fraction either way.
const RAISE_VARIANCE: f32 = 0.2;

/// How a bot plays.
#[derive(Clone, Copy, Debug, Default, Eq, PartialEq)]
pub enum BotStyle {
    /// Loose-passive: sees lots of cards, rarely raises, never bluffs.
    Passive,
    #[default]
    Balanced,
    /// Tight-aggressive: folds junk, raises big with anything decent.
    Aggressive,
}

/// Thresholds and tendencies behind a [`BotStyle`].
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct StyleParams {
    /// Hand strength below this folds unless checking is free.
    pub fold_threshold: f32,
    /// Hand strength at or above this considers raising.
    pub raise_threshold: f32,
    /// Chance of calling a bet with a middling hand.
    pub call_probability: f32,
    /// Chance of raising with a strong hand.
    pub raise_probability: f32,
    /// Raise size as a multiple of the pot.
    pub raise_multiplier: f32,
    /// Chance of raising with a hand that should fold.
    pub bluff_frequency: f32,
}

impl BotStyle {
    #[must_use]
    pub fn params(self) -> StyleParams {
        match self {
            Self::Passive => StyleParams {
                fold_threshold: 0.08,
                raise_threshold: 0.40,
                call_probability: 0.75,
                raise_probability: 0.3,
                raise_multiplier: 0.5,
                bluff_frequency: 0.0,
            },
            Self::Balanced => StyleParams {
                fold_threshold: 0.12,
                raise_threshold: 0.28,
                call_probability: 0.6,
                raise_probability: 0.6,
                raise_multiplier: 0.75,
                bluff_frequency: 0.05,
            },
            Self::Aggressive => StyleParams {
                fold_threshold: 0.18,
                raise_threshold: 0.26,
                call_probability: 0.5,
                raise_probability: 0.9,
                raise_multiplier: 1.0,
                bluff_frequency: 0.1,
            },
        }
    }
}

impl fmt::Display for BotStyle {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        let repr = match self {
            Self::Passive => "Passive",
            Self::Balanced => "Balanced",
            Self::Aggressive => "Aggressive",
        };
        write!(f, "{repr}")
    }
}

impl FromStr for BotStyle {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_lowercase().as_str() {
            "passive" => Ok(Self::Passive),
            "balanced" => Ok(Self::Balanced),
            "aggressive" => Ok(Self::Aggressive),
            other => Err(format!("unknown bot style {other:?}")),
        }
    }
}

/// Bot that remembers its own cards and the board from the broadcasts it
/// sees and answers move requests from a rough hand-strength estimate.
pub struct BotDecisionMaker {
    rng: rand::rngs::ThreadRng,
    style: BotStyle,
    name: Option<Username>,
    hole_cards: Vec<Card>,
    board_cards: Vec<Card>,
}

impl BotDecisionMaker {
    #[must_use]
    pub fn new(style: BotStyle) -> Self {
        Self {
            rng: rand::rng(),
            style,
            name: None,
            hole_cards: Vec::new(),
            board_cards: Vec::new(),
        }
    }

    #[must_use]
    pub fn style(&self) -> BotStyle {
        self.style
    }

    /// Pick a move for a request given the bot's cards.
    pub fn decide_action(
        &mut self,
        request: &MoveRequest,
        hole_cards: &[Card],
        board_cards: &[Card],
    ) -> Move {
        let params = self.style.params();
        let hand_strength = estimate_hand_strength(hole_cards, board_cards);
        let can_check = request.to_call == 0;

        // Critically short-stacked.
        if request.chips <= request.to_call {
            return Move::AllIn;
        }

        if hand_strength < params.fold_threshold {
            if can_check {
                return Move::Call;
            }
            if self.rng.random_bool(f64::from(params.bluff_frequency)) {
                return self.raise(request, params.raise_multiplier);
            }
            return Move::Fold;
        }

        if hand_strength < params.raise_threshold {
            if can_check || self.rng.random_bool(f64::from(params.call_probability)) {
                return Move::Call;
            }
            return Move::Fold;
        }

        if self.rng.random_bool(f64::from(params.raise_probability)) {
            self.raise(request, params.raise_multiplier)
        } else {
            Move::Call
        }
    }

    /// A raise sized off the pot, or an all-in when that's most of the
    /// stack anyway.
    fn raise(&mut self, request: &MoveRequest, multiplier: f32) -> Move {
        let variance = self.rng.random_range(-RAISE_VARIANCE..=RAISE_VARIANCE);
        let sized = (request.pot as f32 * multiplier * (1.0 + variance)) as Chips;
        let raise_to = request.last_bet + sized.max(request.min_raise);

        // Everything the bot could put in this round.
        let committed = request.last_bet.saturating_sub(request.to_call);
        if raise_to >= request.chips + committed {
            Move::AllIn
        } else {
            Move::Raise(raise_to)
        }
    }
}

impl Default for BotDecisionMaker {
    fn default() -> Self {
        Self::new(BotStyle::default())
    }
}

impl Strategy for BotDecisionMaker {
    fn observe(&mut self, msg: &ServerMessage) {
        match msg {
            ServerMessage::Registered { name, .. } => self.name = Some(name.clone()),
            ServerMessage::DealtHands { players, .. } => {
                self.board_cards.clear();
                self.hole_cards = players
                    .iter()
                    .find(|dealt| Some(&dealt.name) == self.name.as_ref())
                    .map(|dealt| dealt.hand.clone())
                    .unwrap_or_default();
            }
            ServerMessage::TableCards { cards, .. } => self.board_cards.clone_from(cards),
            _ => {}
        }
    }

    fn decide(&mut self, request: &MoveRequest) -> Option<Move> {
        let hole_cards = std::mem::take(&mut self.hole_cards);
        let board_cards = std::mem::take(&mut self.board_cards);
        let decision = self.decide_action(request, &hole_cards, &board_cards);
        self.hole_cards = hole_cards;
        self.board_cards = board_cards;
        Some(decision)
    }
}

/// Estimate hand strength in `[0, 1]` from the rank of the best hand so
/// far, with a small bonus for high cards.
#[must_use]
pub fn estimate_hand_strength(hole_cards: &[Card], board_cards: &[Card]) -> f32 {
    let mut all_cards = Vec::with_capacity(hole_cards.len() + board_cards.len());
    all_cards.extend_from_slice(hole_cards);
    all_cards.extend_from_slice(board_cards);
    if all_cards.len() < 2 {
        return 0.0;
    }

    let hand = eval(&all_cards);
    let base_strength = match hand.rank {
        Rank::HighCard => STRENGTH_HIGH_CARD,
        Rank::OnePair => STRENGTH_ONE_PAIR,
        Rank::TwoPair => STRENGTH_TWO_PAIR,
        Rank::ThreeOfAKind => STRENGTH_THREE_OF_A_KIND,
        Rank::Straight => STRENGTH_STRAIGHT,
        Rank::Flush => STRENGTH_FLUSH,
        Rank::FullHouse => STRENGTH_FULL_HOUSE,
        Rank::FourOfAKind => STRENGTH_FOUR_OF_A_KIND,
        Rank::StraightFlush => STRENGTH_STRAIGHT_FLUSH,
    };

    // Normalize the top value (2-14) into a 0.0-0.1 kicker bonus.
    let top_value = hand.values.iter().copied().max().unwrap_or(0);
    let kicker_bonus = (f32::from(top_value) / 14.0) * 0.1;
    (base_strength + kicker_bonus).min(1.0)
}
