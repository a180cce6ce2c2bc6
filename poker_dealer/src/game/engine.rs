//! Cards: dealing hole cards and the board, and deciding who holds the
//! best hand.

use super::{
    entities::{Card, Deck, SubHand},
    functional::{argmax, eval},
};

/// Deals one hand at a time. Hands are addressed by slot, the order they
/// were dealt in.
pub trait CardEngine {
    /// Shuffle, clear the board and deal `n` two-card hands.
    fn deal_hands(&mut self, n: usize) -> Vec<Vec<Card>>;

    /// Deal three board cards. Returns the cards just dealt.
    fn deal_flop(&mut self) -> Vec<Card>;

    fn deal_turn(&mut self) -> Vec<Card>;

    fn deal_river(&mut self) -> Vec<Card>;

    /// The whole board so far.
    fn table(&self) -> &[Card];

    /// Slots among `contenders` holding the best hand. Ties return every
    /// tied slot.
    fn winning_hands(&self, contenders: &[usize]) -> Vec<usize>;
}

/// Texas hold'em on a single 52-card deck.
#[derive(Debug, Default)]
pub struct HoldemEngine {
    deck: Deck,
    hands: Vec<Vec<Card>>,
    board: Vec<Card>,
}

impl HoldemEngine {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    fn deal_board(&mut self, n: usize) -> Vec<Card> {
        let cards: Vec<Card> = std::iter::from_fn(|| self.deck.deal_card())
            .take(n)
            .collect();
        self.board.extend_from_slice(&cards);
        cards
    }

    /// Best hand for a slot using the board so far.
    #[must_use]
    pub fn best_hand(&self, slot: usize) -> Option<SubHand> {
        let hand = self.hands.get(slot)?;
        let mut cards = Vec::with_capacity(hand.len() + self.board.len());
        cards.extend_from_slice(hand);
        cards.extend_from_slice(&self.board);
        Some(eval(&cards))
    }
}

impl CardEngine for HoldemEngine {
    fn deal_hands(&mut self, n: usize) -> Vec<Vec<Card>> {
        self.deck.shuffle();
        self.board.clear();
        self.hands = (0..n)
            .map(|_| {
                std::iter::from_fn(|| self.deck.deal_card())
                    .take(2)
                    .collect()
            })
            .collect();
        self.hands.clone()
    }

    fn deal_flop(&mut self) -> Vec<Card> {
        self.deal_board(3)
    }

    fn deal_turn(&mut self) -> Vec<Card> {
        self.deal_board(1)
    }

    fn deal_river(&mut self) -> Vec<Card> {
        self.deal_board(1)
    }

    fn table(&self) -> &[Card] {
        &self.board
    }

    fn winning_hands(&self, contenders: &[usize]) -> Vec<usize> {
        let ranked: Vec<(usize, SubHand)> = contenders
            .iter()
            .filter_map(|&slot| self.best_hand(slot).map(|hand| (slot, hand)))
            .collect();
        let hands: Vec<SubHand> = ranked.iter().map(|(_, hand)| hand.clone()).collect();
        argmax(&hands).into_iter().map(|i| ranked[i].0).collect()
    }
}
