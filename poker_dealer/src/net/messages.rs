use serde::{Deserialize, Deserializer, Serialize};
use serde_json::Value;
use std::fmt;

use crate::game::{
    entities::{AuthToken, Card, Chips, Move, Username},
    moves::Outcome,
};

/// Move tag as it appears on the wire. Tags this dealer doesn't know
/// decode as `Unknown` and are played as a fold.
#[derive(Clone, Copy, Debug, Default, Deserialize, Eq, PartialEq, Serialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum MoveKind {
    RaiseTo,
    Call,
    Fold,
    AllIn,
    #[default]
    #[serde(other)]
    Unknown,
}

impl fmt::Display for MoveKind {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        let repr = match self {
            Self::RaiseTo => "RAISE_TO",
            Self::Call => "CALL",
            Self::Fold => "FOLD",
            Self::AllIn => "ALL_IN",
            Self::Unknown => "UNKNOWN",
        };
        write!(f, "{repr}")
    }
}

impl From<Outcome> for MoveKind {
    fn from(value: Outcome) -> Self {
        match value {
            Outcome::AllIn => Self::AllIn,
            Outcome::Call => Self::Call,
            Outcome::Fold => Self::Fold,
            Outcome::Raise => Self::RaiseTo,
        }
    }
}

/// A move tag that's missing or isn't a string is as good as unknown.
fn lenient_kind<'de, D: Deserializer<'de>>(deserializer: D) -> Result<MoveKind, D::Error> {
    let value = Option::<Value>::deserialize(deserializer)?;
    Ok(value
        .and_then(|value| MoveKind::deserialize(value).ok())
        .unwrap_or_default())
}

/// Anything but a non-negative whole number is 0 chips, which can only
/// ever fold as a raise. Amounts past [`Chips::MAX`] are capped.
fn lenient_chips<'de, D: Deserializer<'de>>(deserializer: D) -> Result<Chips, D::Error> {
    let chips = match Option::<Value>::deserialize(deserializer)? {
        Some(Value::Number(n)) => n
            .as_u64()
            .map_or(0, |chips| Chips::try_from(chips).unwrap_or(Chips::MAX)),
        _ => 0,
    };
    Ok(chips)
}

/// A player's answer to a move request.
///
/// Only `name` and `key` have to be well formed. A reply that can be
/// attributed to a player always decodes, and a garbled move plays as a
/// fold.
#[derive(Clone, Debug, Deserialize, Eq, PartialEq, Serialize)]
pub struct MoveReply {
    pub name: Username,
    pub key: AuthToken,
    #[serde(rename = "move", default, deserialize_with = "lenient_kind")]
    pub action: MoveKind,
    /// Target round total for `RAISE_TO`. Ignored by other moves.
    #[serde(default, deserialize_with = "lenient_chips")]
    pub chips: Chips,
}

impl MoveReply {
    #[must_use]
    pub fn new(name: Username, key: AuthToken, requested: Move) -> Self {
        let (action, chips) = match requested {
            Move::Raise(total) => (MoveKind::RaiseTo, total),
            Move::Call => (MoveKind::Call, 0),
            Move::Fold => (MoveKind::Fold, 0),
            Move::AllIn => (MoveKind::AllIn, 0),
        };
        Self {
            name,
            key,
            action,
            chips,
        }
    }

    /// Normalize the wire move into the closed set the dealer plays.
    #[must_use]
    pub fn to_move(&self) -> Move {
        match self.action {
            MoveKind::RaiseTo => Move::Raise(self.chips),
            MoveKind::Call => Move::Call,
            MoveKind::AllIn => Move::AllIn,
            MoveKind::Fold | MoveKind::Unknown => Move::Fold,
        }
    }
}

impl fmt::Display for MoveReply {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        write!(f, "{} {}", self.name, self.to_move())
    }
}

/// A message from a player to the dealer.
#[derive(Clone, Debug, Deserialize, Eq, PartialEq, Serialize)]
#[serde(tag = "type", rename_all = "SCREAMING_SNAKE_CASE")]
pub enum ClientMessage {
    /// Ask for a seat, optionally with a display name.
    Register {
        #[serde(default)]
        name: Option<String>,
    },
    Move(MoveReply),
}

impl fmt::Display for ClientMessage {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        match self {
            Self::Register { name: Some(name) } => write!(f, "{name} wants to register"),
            Self::Register { name: None } => write!(f, "anonymous registration"),
            Self::Move(reply) => reply.fmt(f),
        }
    }
}

#[derive(Clone, Debug, Deserialize, Eq, PartialEq, Serialize)]
pub struct DealtHand {
    pub name: Username,
    pub chips: Chips,
    pub hand: Vec<Card>,
}

#[derive(Clone, Debug, Deserialize, Eq, PartialEq, Serialize)]
pub struct MoveRequest {
    pub name: Username,
    pub pot: Chips,
    /// Chips still needed to match `last_bet`.
    pub to_call: Chips,
    pub last_bet: Chips,
    pub min_raise: Chips,
    /// Stack not yet committed this round.
    pub chips: Chips,
}

impl MoveRequest {
    /// Smallest `RAISE_TO` total that counts as a raise.
    #[must_use]
    pub fn min_raise_to(&self) -> Chips {
        self.last_bet.saturating_add(self.min_raise)
    }
}

/// The move a player's request resolved to, as told to everyone.
#[derive(Clone, Debug, Deserialize, Eq, PartialEq, Serialize)]
pub struct MoveNotice {
    pub name: Username,
    #[serde(rename = "move")]
    pub action: MoveKind,
    /// The player's round commitment after the move.
    pub bet: Chips,
    /// Stack left behind the round commitment.
    pub chips: Chips,
}

#[derive(Clone, Debug, Deserialize, Eq, PartialEq, Serialize)]
pub struct Payout {
    pub name: Username,
    pub amount: Chips,
}

/// A message from the dealer. Everything except registration replies is
/// broadcast to every player.
#[derive(Clone, Debug, Deserialize, Eq, PartialEq, Serialize)]
#[serde(tag = "type", rename_all = "SCREAMING_SNAKE_CASE")]
pub enum ServerMessage {
    Registered {
        name: Username,
        chips: Chips,
        key: AuthToken,
    },
    Rejected {
        reason: String,
    },
    DealtHands {
        pot: Chips,
        players: Vec<DealtHand>,
    },
    TableCards {
        pot: Chips,
        cards: Vec<Card>,
    },
    MoveRequest(MoveRequest),
    Move(MoveNotice),
    Showdown {
        pot: Chips,
        payouts: Vec<Payout>,
    },
    Eliminated {
        name: Username,
    },
    TournamentOver {
        winner: Option<Username>,
    },
}

impl fmt::Display for ServerMessage {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        let repr = match self {
            Self::Registered { name, chips, .. } => format!("{name} seated with {chips}"),
            Self::Rejected { reason } => format!("rejected: {reason}"),
            Self::DealtHands { players, .. } => format!("dealt {} hands", players.len()),
            Self::TableCards { pot, cards } => {
                let cards = cards
                    .iter()
                    .map(Card::to_string)
                    .collect::<Vec<_>>()
                    .join(" ");
                format!("board {cards} (pot {pot})")
            }
            Self::MoveRequest(request) => format!(
                "{} to act: {} to call, pot {}",
                request.name, request.to_call, request.pot
            ),
            Self::Move(notice) => format!(
                "{} {} (bet {}, {} behind)",
                notice.name, notice.action, notice.bet, notice.chips
            ),
            Self::Showdown { pot, payouts } => {
                let payouts = payouts
                    .iter()
                    .map(|p| format!("{} +{}", p.name, p.amount))
                    .collect::<Vec<_>>()
                    .join(", ");
                format!("showdown for {pot}: {payouts}")
            }
            Self::Eliminated { name } => format!("{name} eliminated"),
            Self::TournamentOver { winner: Some(winner) } => format!("{winner} wins"),
            Self::TournamentOver { winner: None } => "tournament over".to_string(),
        };
        write!(f, "{repr}")
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_move_reply_from_wire() {
        let value = json!({
            "type": "MOVE",
            "name": "alice",
            "key": "abc",
            "move": "RAISE_TO",
            "chips": 40
        });
        let msg: ClientMessage = serde_json::from_value(value).unwrap();
        let ClientMessage::Move(reply) = msg else {
            panic!("expected a move");
        };
        assert_eq!(reply.name, Username::new("alice"));
        assert_eq!(reply.key, AuthToken::from("abc"));
        assert_eq!(reply.to_move(), Move::Raise(40));
    }

    #[test]
    fn test_unknown_move_tag_is_fold() {
        let value = json!({"type": "MOVE", "name": "bob", "key": "k", "move": "CHECK"});
        let msg: ClientMessage = serde_json::from_value(value).unwrap();
        let ClientMessage::Move(reply) = msg else {
            panic!("expected a move");
        };
        assert_eq!(reply.action, MoveKind::Unknown);
        assert_eq!(reply.chips, 0);
        assert_eq!(reply.to_move(), Move::Fold);
    }

    #[test]
    fn test_garbled_move_still_decodes_as_fold() {
        for value in [
            json!({"type": "MOVE", "name": "bob", "key": "k"}),
            json!({"type": "MOVE", "name": "bob", "key": "k", "move": 7}),
            json!({"type": "MOVE", "name": "bob", "key": "k", "move": null}),
        ] {
            let msg: ClientMessage = serde_json::from_value(value).unwrap();
            let ClientMessage::Move(reply) = msg else {
                panic!("expected a move");
            };
            assert_eq!(reply.name, Username::new("bob"));
            assert_eq!(reply.to_move(), Move::Fold);
        }
    }

    #[test]
    fn test_odd_raise_amounts_are_clamped() {
        let decode = |chips: serde_json::Value| {
            let value = json!({
                "type": "MOVE",
                "name": "bob",
                "key": "k",
                "move": "RAISE_TO",
                "chips": chips
            });
            match serde_json::from_value::<ClientMessage>(value).unwrap() {
                ClientMessage::Move(reply) => reply.to_move(),
                other => panic!("expected a move, got {other:?}"),
            }
        };
        assert_eq!(decode(json!(-50)), Move::Raise(0));
        assert_eq!(decode(json!(12.5)), Move::Raise(0));
        assert_eq!(decode(json!("40")), Move::Raise(0));
        assert_eq!(decode(json!(10_000_000_000u64)), Move::Raise(Chips::MAX));
    }

    #[test]
    fn test_move_without_name_is_rejected() {
        let value = json!({"type": "MOVE", "key": "k", "move": "CALL"});
        assert!(serde_json::from_value::<ClientMessage>(value).is_err());
    }

    #[test]
    fn test_register_without_name() {
        let msg: ClientMessage = serde_json::from_value(json!({"type": "REGISTER"})).unwrap();
        assert_eq!(msg, ClientMessage::Register { name: None });
    }

    #[test]
    fn test_move_without_type_is_rejected() {
        let value = json!({"name": "bob", "key": "k", "move": "CALL"});
        assert!(serde_json::from_value::<ClientMessage>(value).is_err());
    }

    #[test]
    fn test_server_message_type_tags() {
        let request = ServerMessage::MoveRequest(MoveRequest {
            name: Username::new("carol"),
            pot: 60,
            to_call: 20,
            last_bet: 20,
            min_raise: 20,
            chips: 100,
        });
        let value = serde_json::to_value(&request).unwrap();
        assert_eq!(value["type"], "MOVE_REQUEST");
        assert_eq!(value["name"], "carol");
        assert_eq!(value["to_call"], 20);

        let notice = ServerMessage::Move(MoveNotice {
            name: Username::new("carol"),
            action: MoveKind::from(Outcome::Raise),
            bet: 40,
            chips: 60,
        });
        let value = serde_json::to_value(&notice).unwrap();
        assert_eq!(value["type"], "MOVE");
        assert_eq!(value["move"], "RAISE_TO");

        let dealt = ServerMessage::DealtHands {
            pot: 0,
            players: vec![],
        };
        assert_eq!(serde_json::to_value(&dealt).unwrap()["type"], "DEALT_HANDS");
        let cards = ServerMessage::TableCards {
            pot: 0,
            cards: vec![],
        };
        assert_eq!(serde_json::to_value(&cards).unwrap()["type"], "TABLE_CARDS");
    }

    #[test]
    fn test_outcome_to_move_kind() {
        assert_eq!(MoveKind::from(Outcome::AllIn), MoveKind::AllIn);
        assert_eq!(MoveKind::from(Outcome::Call), MoveKind::Call);
        assert_eq!(MoveKind::from(Outcome::Fold), MoveKind::Fold);
        assert_eq!(MoveKind::from(Outcome::Raise), MoveKind::RaiseTo);
    }

    #[test]
    fn test_min_raise_to() {
        let request = MoveRequest {
            name: Username::new("dave"),
            pot: 0,
            to_call: 0,
            last_bet: 30,
            min_raise: 20,
            chips: 100,
        };
        assert_eq!(request.min_raise_to(), 50);
    }

    #[test]
    fn test_server_message_display() {
        let msg = ServerMessage::Eliminated {
            name: Username::new("erin"),
        };
        assert_eq!(msg.to_string(), "erin eliminated");
    }
}
