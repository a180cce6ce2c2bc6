//! The tournament: registration, then hands until one stack is left.

use log::{info, warn};
use serde::{Deserialize, Serialize};
use std::time::Duration;

use super::{
    betting::RoundRules,
    constants::{DEFAULT_MIN_RAISE, DEFAULT_NUM_PLAYERS, DEFAULT_STARTING_CHIPS, MAX_PLAYERS},
    engine::{CardEngine, HoldemEngine},
    entities::{Chips, Username},
    errors::{GameError, Result},
    hand::{HandSummary, play_hand},
    roster::Roster,
};
use crate::net::{
    messages::ServerMessage,
    transport::{Inbound, Transport},
};

/// Tournament configuration settings
#[derive(Clone, Debug, Deserialize, PartialEq, Eq, Serialize)]
pub struct TournamentSettings {
    /// Registration closes once this many players have joined.
    pub num_players: usize,
    pub starting_chips: Chips,
    /// Opening minimum raise for every betting round.
    pub min_raise: Chips,
    /// How long a player gets to answer a move request. `None` waits
    /// forever.
    pub move_timeout: Option<Duration>,
    /// Stop after this many hands even if several players still have
    /// chips.
    pub hand_limit: Option<u32>,
}

impl Default for TournamentSettings {
    fn default() -> Self {
        Self::new(DEFAULT_NUM_PLAYERS, DEFAULT_STARTING_CHIPS, DEFAULT_MIN_RAISE)
    }
}

impl TournamentSettings {
    #[must_use]
    pub const fn new(num_players: usize, starting_chips: Chips, min_raise: Chips) -> Self {
        Self {
            num_players,
            starting_chips,
            min_raise,
            move_timeout: None,
            hand_limit: None,
        }
    }

    #[must_use]
    pub const fn with_move_timeout(mut self, timeout: Duration) -> Self {
        self.move_timeout = Some(timeout);
        self
    }

    #[must_use]
    pub const fn with_hand_limit(mut self, hands: u32) -> Self {
        self.hand_limit = Some(hands);
        self
    }

    /// Rules for one betting round starting `first_to_act_offset` seats
    /// after the dealer.
    #[must_use]
    pub const fn round_rules(&self, first_to_act_offset: usize) -> RoundRules {
        RoundRules {
            first_to_act_offset,
            min_raise: self.min_raise,
            move_timeout: self.move_timeout,
        }
    }

    /// Every chip in play, or `None` if that doesn't fit in [`Chips`].
    #[must_use]
    pub fn total_chips(&self) -> Option<Chips> {
        Chips::try_from(self.num_players)
            .ok()?
            .checked_mul(self.starting_chips)
    }

    /// # Errors
    ///
    /// Fails when the settings can't produce a playable tournament.
    pub fn validate(&self) -> Result<()> {
        if self.num_players < 2 {
            return Err(GameError::NotEnoughPlayers(self.num_players));
        }
        if self.num_players > MAX_PLAYERS {
            return Err(GameError::TableFull(MAX_PLAYERS));
        }
        if self.starting_chips == 0 {
            return Err(GameError::InvalidSettings(
                "starting chips must be greater than 0".to_string(),
            ));
        }
        if self.min_raise == 0 {
            return Err(GameError::InvalidSettings(
                "minimum raise must be greater than 0".to_string(),
            ));
        }
        if self.total_chips().is_none() {
            return Err(GameError::InvalidSettings(format!(
                "{} players with {} chips each overflow the chip count",
                self.num_players, self.starting_chips
            )));
        }
        Ok(())
    }
}

/// How a tournament ended.
#[derive(Clone, Debug, Eq, PartialEq)]
pub struct TournamentResult {
    /// Last player with chips, or the chip leader if the hand limit ran
    /// out first.
    pub winner: Option<Username>,
    pub hands_played: u32,
    /// Knocked out players, first out first.
    pub eliminated: Vec<Username>,
}

/// Owns every piece of mutable tournament state.
pub struct Tournament<E: CardEngine = HoldemEngine> {
    pub roster: Roster,
    pub settings: TournamentSettings,
    engine: E,
    hands_played: u32,
    eliminated: Vec<Username>,
}

impl Tournament<HoldemEngine> {
    #[must_use]
    pub fn new(settings: TournamentSettings) -> Self {
        Self::with_engine(settings, HoldemEngine::new())
    }
}

impl<E: CardEngine> Tournament<E> {
    #[must_use]
    pub fn with_engine(settings: TournamentSettings, engine: E) -> Self {
        Self {
            roster: Roster::new(),
            settings,
            engine,
            hands_played: 0,
            eliminated: Vec::new(),
        }
    }

    #[must_use]
    pub fn hands_played(&self) -> u32 {
        self.hands_played
    }

    /// Seat players in arrival order until the table holds
    /// `num_players`.
    ///
    /// Anything other than a well-formed registration stops the whole
    /// phase. Disconnects before registering are ignored.
    ///
    /// # Errors
    ///
    /// Fails on the first malformed registration or if the transport
    /// closes before the table fills.
    pub fn register_players<T: Transport + ?Sized>(&mut self, transport: &mut T) -> Result<()> {
        info!("waiting for {} players", self.settings.num_players);
        while self.roster.len() < self.settings.num_players {
            match transport.accept_registration()? {
                Inbound::Register { name } => {
                    match self
                        .roster
                        .register(name.as_deref(), self.settings.starting_chips)
                    {
                        Ok(player) => transport.confirm_registration(player)?,
                        Err(
                            error @ (GameError::RegistrationClosed | GameError::TableFull(_)),
                        ) => {
                            warn!("turning away {name:?}: {error}");
                            transport.reject_registration(&error.to_string())?;
                        }
                        Err(error) => return Err(error),
                    }
                }
                Inbound::Malformed(reason) => {
                    warn!("malformed registration: {reason}");
                    transport.reject_registration(&reason)?;
                    return Err(GameError::RegistrationAborted(reason));
                }
                Inbound::Move(reply) => {
                    let reason = format!("expected REGISTER, got a move from {}", reply.name);
                    warn!("{reason}");
                    transport.reject_registration(&reason)?;
                    return Err(GameError::RegistrationAborted(reason));
                }
                Inbound::Disconnected(peer) => info!("{peer} left before registering"),
            }
        }
        Ok(())
    }

    /// Play a single hand with the current dealer.
    ///
    /// # Errors
    ///
    /// Propagates invariant violations and transport failures.
    pub fn play_hand<T: Transport + ?Sized>(&mut self, transport: &mut T) -> Result<HandSummary> {
        let summary = play_hand(&mut self.roster, &mut self.engine, transport, &self.settings)?;
        self.hands_played += 1;
        for name in &summary.eliminated {
            transport.broadcast(&ServerMessage::Eliminated { name: name.clone() })?;
        }
        self.eliminated.extend(summary.eliminated.iter().cloned());
        Ok(summary)
    }

    fn is_over(&self) -> bool {
        self.roster.num_with_chips() <= 1
            || self
                .settings
                .hand_limit
                .is_some_and(|limit| self.hands_played >= limit)
    }

    /// Give the button to the first player and play hands until one
    /// player holds every chip or the hand limit is reached.
    ///
    /// # Errors
    ///
    /// Fails if fewer than two players registered, or on any hand error.
    pub fn play<T: Transport + ?Sized>(&mut self, transport: &mut T) -> Result<TournamentResult> {
        self.roster.first_dealer()?;
        info!(
            "tournament starting with {} players and {} chips in play",
            self.roster.len(),
            self.roster.total_chips()
        );

        while !self.is_over() {
            let summary = self.play_hand(transport)?;
            info!(
                "hand {} done: pot {}, {} players left",
                self.hands_played,
                summary.pot,
                self.roster.num_with_chips()
            );
        }

        let winner = self.roster.chip_leader().map(|p| p.name.clone());
        match &winner {
            Some(name) => info!("{name} wins after {} hands", self.hands_played),
            None => warn!("tournament ended without a winner"),
        }
        transport.broadcast(&ServerMessage::TournamentOver {
            winner: winner.clone(),
        })?;
        Ok(TournamentResult {
            winner,
            hands_played: self.hands_played,
            eliminated: self.eliminated.clone(),
        })
    }

    /// Registration followed by the tournament itself.
    ///
    /// # Errors
    ///
    /// See [`Self::register_players`] and [`Self::play`].
    pub fn run<T: Transport + ?Sized>(&mut self, transport: &mut T) -> Result<TournamentResult> {
        self.settings.validate()?;
        self.register_players(transport)?;
        self.play(transport)
    }
}
