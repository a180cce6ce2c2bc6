//! Player registry: the seated players and their chip state.

use log::info;

use super::{
    constants::MAX_PLAYERS,
    entities::{AuthToken, Chips, Player, SeatIndex, Username},
    errors::{GameError, Result},
};

/// Players in registration order. A player's index in `players` is their
/// seat and never changes for the life of the tournament.
#[derive(Debug, Default)]
pub struct Roster {
    pub players: Vec<Player>,
    started: bool,
}

impl Roster {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Seat a new player with a fresh authentication token.
    ///
    /// The requested name is sanitized. Without a usable name the player is
    /// called `Player{n}` after their 1-based seat, and a name that's
    /// already taken gets the seat number appended so every player can be
    /// told apart by name alone.
    ///
    /// # Errors
    ///
    /// Fails once the tournament has started or the table is full.
    pub fn register(&mut self, name_hint: Option<&str>, starting_chips: Chips) -> Result<&Player> {
        if self.started {
            return Err(GameError::RegistrationClosed);
        }
        if self.players.len() >= MAX_PLAYERS {
            return Err(GameError::TableFull(MAX_PLAYERS));
        }

        let seat = self.players.len();
        let mut name = Username::new(name_hint.unwrap_or_default());
        if name.is_empty() {
            name = Username::new(&format!("Player{}", seat + 1));
        }
        let name = self.unique_name(name, seat);

        info!("{name} registered at seat {seat} with {starting_chips} chips");
        self.players
            .push(Player::new(name, AuthToken::generate(), seat, starting_chips));
        Ok(&self.players[seat])
    }

    /// `name` if nobody has it yet, otherwise the first of `name_{seat+1}`,
    /// `name_{seat+2}`, ... that's free.
    fn unique_name(&self, name: Username, seat: SeatIndex) -> Username {
        if self.find_by_name(&name).is_none() {
            return name;
        }
        let mut n = seat + 1;
        loop {
            let candidate = name.with_suffix(&format!("_{n}"));
            if self.find_by_name(&candidate).is_none() {
                return candidate;
            }
            n += 1;
        }
    }

    /// Hand the dealer button to the first registered player and close
    /// registration. Happens exactly once per tournament.
    ///
    /// # Errors
    ///
    /// Fails if it already happened or fewer than two players registered.
    pub fn first_dealer(&mut self) -> Result<()> {
        if self.started {
            return Err(GameError::AlreadyStarted);
        }
        if self.players.len() < 2 {
            return Err(GameError::NotEnoughPlayers(self.players.len()));
        }
        for player in &mut self.players {
            player.is_dealer = false;
        }
        self.players[0].is_dealer = true;
        self.started = true;
        Ok(())
    }

    /// Knock out every player without chips. Returns who was newly
    /// eliminated, in seat order.
    pub fn mark_eliminated_if_broke(&mut self) -> Vec<Username> {
        let mut eliminated = Vec::new();
        for player in &mut self.players {
            if player.active && player.chips == 0 {
                player.active = false;
                eliminated.push(player.name.clone());
            }
        }
        eliminated
    }

    #[must_use]
    pub fn len(&self) -> usize {
        self.players.len()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.players.is_empty()
    }

    #[must_use]
    pub fn find_by_name(&self, name: &Username) -> Option<&Player> {
        self.players.iter().find(|p| &p.name == name)
    }

    /// Players still holding chips. The tournament runs while this is
    /// above one.
    #[must_use]
    pub fn num_with_chips(&self) -> usize {
        self.players.iter().filter(|p| p.chips > 0).count()
    }

    /// Players still contesting the current hand.
    #[must_use]
    pub fn num_contenders(&self) -> usize {
        self.players.iter().filter(|p| p.can_act()).count()
    }

    /// Contenders that can still put chips in this round.
    #[must_use]
    pub fn num_contenders_with_chips(&self) -> usize {
        self.players
            .iter()
            .filter(|p| p.can_act() && p.chips_behind() > 0)
            .count()
    }

    #[must_use]
    pub fn total_chips(&self) -> Chips {
        self.players.iter().map(|p| p.chips).sum()
    }

    /// Everything committed this hand, including the open betting round.
    #[must_use]
    pub fn pot_value_for_game(&self) -> Chips {
        self.players.iter().map(|p| p.chips_this_game).sum()
    }

    /// The player with the most chips, first seat on ties.
    #[must_use]
    pub fn chip_leader(&self) -> Option<&Player> {
        self.players
            .iter()
            .filter(|p| p.chips > 0)
            .rev()
            .max_by_key(|p| p.chips)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn roster_with(n: usize, chips: Chips) -> Roster {
        let mut roster = Roster::new();
        for i in 0..n {
            roster.register(Some(&format!("p{i}")), chips).unwrap();
        }
        roster
    }

    #[test]
    fn test_register_assigns_seats_in_order() {
        let roster = roster_with(3, 100);
        for (i, player) in roster.players.iter().enumerate() {
            assert_eq!(player.seat, i);
            assert_eq!(player.chips, 100);
            assert!(player.active);
        }
    }

    #[test]
    fn test_register_default_name() {
        let mut roster = Roster::new();
        roster.register(None, 100).unwrap();
        roster.register(Some("   "), 100).unwrap();
        assert_eq!(roster.players[0].name.as_str(), "Player1");
        assert_eq!(roster.players[1].name.as_str(), "Player2");
    }

    #[test]
    fn test_register_duplicate_name_is_suffixed() {
        let mut roster = Roster::new();
        roster.register(Some("alice"), 100).unwrap();
        let second = roster.register(Some("alice"), 100).unwrap();
        assert_eq!(second.name.as_str(), "alice_2");
    }

    #[test]
    fn test_register_suffix_never_collides() {
        let long = "x".repeat(32);
        let mut roster = Roster::new();
        for name in ["a", "a_3", "a", "a_3", &long, &long] {
            roster.register(Some(name), 100).unwrap();
        }
        let names: Vec<_> = roster.players.iter().map(|p| p.name.as_str()).collect();
        assert_eq!(names[..4], ["a", "a_3", "a_4", "a_3_4"]);
        assert_eq!(names[4], long);
        assert_eq!(names[5], format!("{}_6", "x".repeat(30)));

        let mut unique = names.clone();
        unique.sort_unstable();
        unique.dedup();
        assert_eq!(unique.len(), names.len());
    }

    #[test]
    fn test_register_tokens_differ() {
        let roster = roster_with(2, 100);
        assert_ne!(roster.players[0].token(), roster.players[1].token());
    }

    #[test]
    fn test_register_after_start_fails() {
        let mut roster = roster_with(2, 100);
        roster.first_dealer().unwrap();
        assert!(matches!(
            roster.register(Some("late"), 100),
            Err(GameError::RegistrationClosed)
        ));
    }

    #[test]
    fn test_register_table_full() {
        let mut roster = roster_with(MAX_PLAYERS, 100);
        assert!(matches!(
            roster.register(None, 100),
            Err(GameError::TableFull(_))
        ));
    }

    #[test]
    fn test_first_dealer_only_once() {
        let mut roster = roster_with(3, 100);
        roster.first_dealer().unwrap();
        assert!(roster.players[0].is_dealer);
        assert_eq!(roster.players.iter().filter(|p| p.is_dealer).count(), 1);
        assert!(matches!(
            roster.first_dealer(),
            Err(GameError::AlreadyStarted)
        ));
    }

    #[test]
    fn test_first_dealer_needs_two_players() {
        let mut roster = roster_with(1, 100);
        assert!(matches!(
            roster.first_dealer(),
            Err(GameError::NotEnoughPlayers(1))
        ));
        assert!(!roster.players[0].is_dealer);
        assert!(roster.register(Some("late"), 100).is_ok());
    }

    #[test]
    fn test_mark_eliminated_if_broke() {
        let mut roster = roster_with(3, 100);
        roster.players[1].chips = 0;
        let eliminated = roster.mark_eliminated_if_broke();
        assert_eq!(eliminated, vec![Username::new("p1")]);
        assert!(!roster.players[1].active);
        assert!(roster.players[0].active);
        // Already eliminated players aren't reported twice.
        assert!(roster.mark_eliminated_if_broke().is_empty());
    }

    #[test]
    fn test_chip_leader_prefers_first_seat_on_ties() {
        let mut roster = roster_with(3, 100);
        roster.players[0].chips = 50;
        assert_eq!(roster.chip_leader().unwrap().seat, 1);
    }
}
