//! Turn order: who holds the button and who acts next.

use log::info;

use super::{
    entities::SeatIndex,
    errors::{GameError, Result},
    roster::Roster,
};

impl Roster {
    /// Seat of the player holding the dealer button.
    ///
    /// # Errors
    ///
    /// Exactly one player must be the dealer. Anything else is an
    /// invariant violation.
    pub fn dealer_seat(&self) -> Result<SeatIndex> {
        let mut dealers = self.players.iter().filter(|p| p.is_dealer);
        match (dealers.next(), dealers.count()) {
            (Some(dealer), 0) => Ok(dealer.seat),
            (None, _) => Err(GameError::NoDealer),
            (Some(_), others) => Err(GameError::MultipleDealers(others + 1)),
        }
    }

    /// The next seat after `seat` whose player is in the tournament and
    /// hasn't folded this hand, wrapping around the table. Returns `seat`
    /// itself if it's the only eligible one.
    ///
    /// # Errors
    ///
    /// Fails if `seat` isn't at the table or nobody is eligible.
    pub fn next_to_act(&self, seat: SeatIndex) -> Result<SeatIndex> {
        let num_seats = self.players.len();
        if seat >= num_seats {
            return Err(GameError::InvalidSeat(seat));
        }
        (1..=num_seats)
            .map(|step| (seat + step) % num_seats)
            .find(|&next| self.players[next].can_act())
            .ok_or(GameError::NoEligibleSeat)
    }

    /// Apply [`Roster::next_to_act`] `n` times starting from `seat`.
    ///
    /// # Errors
    ///
    /// Same as [`Roster::next_to_act`].
    pub fn advance(&self, seat: SeatIndex, n: usize) -> Result<SeatIndex> {
        (0..n).try_fold(seat, |seat, _| self.next_to_act(seat))
    }

    /// Bring every player back into play for the next hand and pass the
    /// button to the next active seat. Returns the new dealer's seat.
    ///
    /// # Errors
    ///
    /// Fails on a missing or duplicated dealer, or with no active player.
    pub fn reset_and_move_dealer_to_next_player(&mut self) -> Result<SeatIndex> {
        let dealer = self.dealer_seat()?;
        for player in &mut self.players {
            player.active_this_round = true;
        }
        let next_dealer = self.next_to_act(dealer)?;

        info!(
            "dealer button moves from {} to {}",
            self.players[dealer].name, self.players[next_dealer].name
        );
        self.players[dealer].is_dealer = false;
        self.players[next_dealer].is_dealer = true;
        Ok(next_dealer)
    }
}
