use rand::{Rng, distr::Alphanumeric, seq::SliceRandom};
use serde::{Deserialize, Deserializer, Serialize};
use std::fmt;
use subtle::ConstantTimeEq;

use super::constants;

#[derive(Clone, Copy, Debug, Deserialize, Eq, Hash, Ord, PartialEq, PartialOrd, Serialize)]
pub enum Suit {
    Club,
    Spade,
    Diamond,
    Heart,
    // Wild is used to initialize a deck of cards.
    Wild,
}

impl fmt::Display for Suit {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        let repr = match self {
            Self::Club => "♣",
            Self::Spade => "♠",
            Self::Diamond => "♦",
            Self::Heart => "♥",
            Self::Wild => "w",
        };
        write!(f, "{repr}")
    }
}

/// Placeholder for card values.
pub type Value = u8;

/// A card is a tuple of a uInt8 value (ace=1u8 ... king=13u8)
/// and a suit. Hand evaluation promotes aces to 14.
#[derive(Clone, Copy, Debug, Deserialize, Eq, Hash, Ord, PartialEq, PartialOrd, Serialize)]
pub struct Card(pub Value, pub Suit);

impl fmt::Display for Card {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        let value = match self.0 {
            1 | 14 => "A",
            11 => "J",
            12 => "Q",
            13 => "K",
            v => &v.to_string(),
        };
        write!(f, "{value}/{}", self.1)
    }
}

#[derive(Clone, Copy, Debug, Deserialize, Eq, Hash, Ord, PartialEq, PartialOrd, Serialize)]
pub enum Rank {
    HighCard,
    OnePair,
    TwoPair,
    ThreeOfAKind,
    Straight,
    Flush,
    FullHouse,
    FourOfAKind,
    StraightFlush,
}

impl fmt::Display for Rank {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let repr = match self {
            Self::HighCard => "high card",
            Self::OnePair => "one pair",
            Self::TwoPair => "two pair",
            Self::ThreeOfAKind => "three of a kind",
            Self::Straight => "straight",
            Self::Flush => "flush",
            Self::FullHouse => "full house",
            Self::FourOfAKind => "four of a kind",
            Self::StraightFlush => "straight flush",
        };
        write!(f, "{repr}")
    }
}

/// A ranked five-card hand. Ordering compares the rank first and then the
/// tie-breaking values from most to least significant.
#[derive(Clone, Debug, Eq, Hash, Ord, PartialEq, PartialOrd)]
pub struct SubHand {
    pub rank: Rank,
    pub values: Vec<Value>,
}

#[derive(Debug)]
pub struct Deck {
    cards: [Card; 52],
    pub deck_idx: usize,
}

impl Deck {
    /// Deal the next card, or `None` once the deck is exhausted.
    pub fn deal_card(&mut self) -> Option<Card> {
        let card = self.cards.get(self.deck_idx).copied()?;
        self.deck_idx += 1;
        Some(card)
    }

    pub fn shuffle(&mut self) {
        self.cards.shuffle(&mut rand::rng());
        self.deck_idx = 0;
    }
}

impl Default for Deck {
    fn default() -> Self {
        let mut cards: [Card; 52] = [Card(0, Suit::Wild); 52];
        for (i, value) in (1u8..14u8).enumerate() {
            for (j, suit) in [Suit::Club, Suit::Spade, Suit::Diamond, Suit::Heart]
                .into_iter()
                .enumerate()
            {
                cards[4 * i + j] = Card(value, suit);
            }
        }
        Self { cards, deck_idx: 0 }
    }
}

/// Tournament chips. Stacks and bets are whole chips and can never go
/// negative.
pub type Chips = u32;

/// Registration-order index into the player table.
pub type SeatIndex = usize;

#[derive(Clone, Debug, Eq, Hash, Ord, PartialEq, PartialOrd, Serialize)]
pub struct Username(String);

impl Username {
    /// Sanitize a requested name. Whitespace becomes `_` and anything past
    /// [`constants::MAX_USER_INPUT_LENGTH`] characters is cut off.
    pub fn new(s: &str) -> Self {
        let username = s
            .trim()
            .chars()
            .take(constants::MAX_USER_INPUT_LENGTH)
            .map(|c| if c.is_whitespace() { '_' } else { c })
            .collect();
        Self(username)
    }

    /// This name with `suffix` on the end. The name is shortened as needed
    /// so the suffix always survives.
    #[must_use]
    pub fn with_suffix(&self, suffix: &str) -> Self {
        let keep = constants::MAX_USER_INPUT_LENGTH.saturating_sub(suffix.chars().count());
        let mut username: String = self.0.chars().take(keep).collect();
        username.push_str(suffix);
        Self::new(&username)
    }

    #[must_use]
    pub fn as_str(&self) -> &str {
        &self.0
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }
}

impl fmt::Display for Username {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        self.0.fmt(f)
    }
}

impl<'de> Deserialize<'de> for Username {
    fn deserialize<D>(deserializer: D) -> Result<Self, D::Error>
    where
        D: Deserializer<'de>,
    {
        let s = String::deserialize(deserializer)?;
        Ok(Self::new(&s))
    }
}

impl From<String> for Username {
    fn from(value: String) -> Self {
        Self::new(&value)
    }
}

impl From<&str> for Username {
    fn from(value: &str) -> Self {
        Self::new(value)
    }
}

/// Opaque per-player secret. Replies must echo it back to be accepted.
///
/// Comparison is constant time and `Debug` never prints the secret.
#[derive(Clone, Deserialize, Eq, Serialize)]
#[serde(transparent)]
pub struct AuthToken(String);

impl AuthToken {
    /// Fresh random alphanumeric token from the thread-local CSPRNG.
    #[must_use]
    pub fn generate() -> Self {
        let token = rand::rng()
            .sample_iter(&Alphanumeric)
            .take(constants::AUTH_TOKEN_LENGTH)
            .map(char::from)
            .collect();
        Self(token)
    }

    #[must_use]
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl PartialEq for AuthToken {
    fn eq(&self, other: &Self) -> bool {
        self.0.as_bytes().ct_eq(other.0.as_bytes()).into()
    }
}

impl fmt::Debug for AuthToken {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "AuthToken(..)")
    }
}

impl From<&str> for AuthToken {
    fn from(value: &str) -> Self {
        Self(value.to_string())
    }
}

/// A move after it crossed the wire boundary. Unknown or malformed
/// requests have already been normalized to `Fold`.
#[derive(Clone, Copy, Debug, Deserialize, Eq, PartialEq, Serialize)]
pub enum Move {
    AllIn,
    Call,
    Fold,
    /// Raise to a total round commitment.
    Raise(Chips),
}

impl fmt::Display for Move {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        let repr = match self {
            Self::AllIn => "all-ins",
            Self::Call => "calls",
            Self::Fold => "folds",
            Self::Raise(amount) => &format!("raises to {amount}"),
        };
        write!(f, "{repr}")
    }
}

#[derive(Clone, Debug)]
pub struct Player {
    pub name: Username,
    pub(crate) token: AuthToken,
    /// Stable registration-order seat.
    pub seat: SeatIndex,
    /// Hand slot for the current hand, counted from the left of the
    /// dealer. `None` when the player wasn't dealt in.
    pub deal_position: Option<usize>,
    pub chips: Chips,
    pub chips_this_round: Chips,
    pub chips_this_game: Chips,
    /// Still has chips and hasn't been eliminated from the tournament.
    pub active: bool,
    /// Hasn't folded this hand.
    pub active_this_round: bool,
    pub is_dealer: bool,
    pub all_in_this_round: bool,
}

impl Player {
    #[must_use]
    pub fn new(name: Username, token: AuthToken, seat: SeatIndex, chips: Chips) -> Self {
        Self {
            name,
            token,
            seat,
            deal_position: None,
            chips,
            chips_this_round: 0,
            chips_this_game: 0,
            active: true,
            active_this_round: true,
            is_dealer: false,
            all_in_this_round: false,
        }
    }

    /// Chips not yet committed to the current betting round.
    #[must_use]
    pub fn chips_behind(&self) -> Chips {
        self.chips - self.chips_this_round
    }

    /// Eligible to be asked for a move.
    #[must_use]
    pub fn can_act(&self) -> bool {
        self.active && self.active_this_round
    }

    #[must_use]
    pub fn is_authenticated_by(&self, token: &AuthToken) -> bool {
        self.token == *token
    }

    #[must_use]
    pub fn token(&self) -> &AuthToken {
        &self.token
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashSet;

    #[test]
    fn test_deck_has_52_unique_cards() {
        let mut deck = Deck::default();
        deck.shuffle();
        let mut seen = HashSet::new();
        while let Some(card) = deck.deal_card() {
            assert_ne!(card.1, Suit::Wild);
            assert!(seen.insert(card));
        }
        assert_eq!(seen.len(), 52);
        assert_eq!(deck.deal_card(), None);
    }

    #[test]
    fn test_deck_shuffle_resets_index() {
        let mut deck = Deck::default();
        deck.deal_card();
        deck.deal_card();
        assert_eq!(deck.deck_idx, 2);
        deck.shuffle();
        assert_eq!(deck.deck_idx, 0);
        assert_eq!(std::iter::from_fn(|| deck.deal_card()).count(), 52);
    }

    #[test]
    fn test_username_sanitizes_whitespace() {
        let username = Username::new("big slick");
        assert_eq!(username.as_str(), "big_slick");
    }

    #[test]
    fn test_username_truncates() {
        let username = Username::new(&"x".repeat(200));
        assert_eq!(username.as_str().len(), constants::MAX_USER_INPUT_LENGTH);
    }

    #[test]
    fn test_username_truncates_on_char_boundary() {
        let username = Username::new(&format!("{}é", "a".repeat(31)));
        assert_eq!(username.as_str(), format!("{}é", "a".repeat(31)));

        let username = Username::new(&"é".repeat(40));
        assert_eq!(
            username.as_str().chars().count(),
            constants::MAX_USER_INPUT_LENGTH
        );
        assert!(username.as_str().chars().all(|c| c == 'é'));
    }

    #[test]
    fn test_username_suffix_always_fits() {
        let long = Username::new(&"x".repeat(32));
        let suffixed = long.with_suffix("_12");
        assert_eq!(suffixed.as_str(), format!("{}_12", "x".repeat(29)));
        assert_eq!(Username::new("bo").with_suffix("_2").as_str(), "bo_2");
        assert_eq!(Username::new("ünï").with_suffix("_3").as_str(), "ünï_3");
    }

    #[test]
    fn test_auth_tokens_are_unique_and_alphanumeric() {
        let a = AuthToken::generate();
        let b = AuthToken::generate();
        assert_ne!(a, b);
        assert_eq!(a.as_str().len(), constants::AUTH_TOKEN_LENGTH);
        assert!(a.as_str().chars().all(|c| c.is_ascii_alphanumeric()));
    }

    #[test]
    fn test_auth_token_debug_is_redacted() {
        let token = AuthToken::from("hunter2");
        assert!(!format!("{token:?}").contains("hunter2"));
    }

    #[test]
    fn test_player_starts_in_play() {
        let player = Player::new(Username::new("alice"), AuthToken::generate(), 0, 500);
        assert!(player.can_act());
        assert!(!player.is_dealer);
        assert_eq!(player.chips_behind(), 500);
        assert_eq!(player.deal_position, None);
    }

    #[test]
    fn test_player_authentication() {
        let token = AuthToken::from("secret");
        let player = Player::new(Username::new("bob"), token.clone(), 1, 100);
        assert!(player.is_authenticated_by(&token));
        assert!(!player.is_authenticated_by(&AuthToken::from("guess")));
    }

    #[test]
    fn test_card_display() {
        assert_eq!(Card(1, Suit::Spade).to_string(), "A/♠");
        assert_eq!(Card(10, Suit::Heart).to_string(), "10/♥");
    }

    #[test]
    fn test_rank_ordering() {
        assert!(Rank::HighCard < Rank::OnePair);
        assert!(Rank::Flush < Rank::FullHouse);
        assert!(Rank::FourOfAKind < Rank::StraightFlush);
    }
}
