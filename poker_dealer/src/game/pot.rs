//! Splitting the grand pot at the end of a hand.
//!
//! Pots are rebuilt from each player's hand-total commitment, one level
//! per distinct commitment. Folded players' chips still count toward a
//! level's size, but only players still in the hand who reached the level
//! can win it.

use log::{error, info};

use super::{
    entities::{Chips, Player, SeatIndex},
    roster::Roster,
};
use crate::net::messages::Payout;

#[derive(Clone, Debug, Eq, PartialEq)]
pub struct SidePot {
    pub amount: Chips,
    /// Who paid into this level and how much.
    pub contributions: Vec<(SeatIndex, Chips)>,
    /// Who can win it, in deal order.
    pub contenders: Vec<SeatIndex>,
}

fn deal_order(player: &Player) -> (usize, SeatIndex) {
    (player.deal_position.unwrap_or(usize::MAX), player.seat)
}

/// Build the main pot and side pots from hand-total commitments, smallest
/// level first. Adjacent levels with the same contenders are merged.
#[must_use]
pub fn side_pots(players: &[Player]) -> Vec<SidePot> {
    let mut levels: Vec<Chips> = players
        .iter()
        .map(|p| p.chips_this_game)
        .filter(|&c| c > 0)
        .collect();
    levels.sort_unstable();
    levels.dedup();

    let mut in_deal_order: Vec<&Player> = players.iter().collect();
    in_deal_order.sort_by_key(|p| deal_order(p));

    let mut pots: Vec<SidePot> = Vec::new();
    let mut prev_level = 0;
    for level in levels {
        let contributions: Vec<(SeatIndex, Chips)> = in_deal_order
            .iter()
            .map(|p| (p.seat, p.chips_this_game.min(level).saturating_sub(prev_level)))
            .filter(|&(_, c)| c > 0)
            .collect();
        let contenders: Vec<SeatIndex> = in_deal_order
            .iter()
            .filter(|p| p.can_act() && p.chips_this_game >= level)
            .map(|p| p.seat)
            .collect();
        let amount = contributions.iter().map(|&(_, c)| c).sum();
        prev_level = level;

        match pots.last_mut() {
            Some(last) if last.contenders == contenders => {
                last.amount += amount;
                for (seat, chips) in contributions {
                    match last.contributions.iter_mut().find(|(s, _)| *s == seat) {
                        Some((_, total)) => *total += chips,
                        None => last.contributions.push((seat, chips)),
                    }
                }
            }
            _ => pots.push(SidePot {
                amount,
                contributions,
                contenders,
            }),
        }
    }
    pots
}

/// Even split with the odd chips going one at a time to winners in the
/// order given.
#[must_use]
pub fn split(amount: Chips, winners: &[SeatIndex]) -> Vec<(SeatIndex, Chips)> {
    let Ok(n) = Chips::try_from(winners.len()) else {
        return Vec::new();
    };
    if n == 0 {
        return Vec::new();
    }
    let share = amount / n;
    let remainder = (amount % n) as usize;
    winners
        .iter()
        .enumerate()
        .map(|(i, &seat)| (seat, share + Chips::from(i < remainder)))
        .collect()
}

/// Pay out every pot and clear the hand's commitments.
///
/// `winners_of` picks the winning seats among a pot's contenders. It's
/// only consulted when a pot is actually contested. A pot nobody can win
/// goes back to whoever paid into it.
pub fn distribute<F>(roster: &mut Roster, pot: &mut Chips, mut winners_of: F) -> Vec<Payout>
where
    F: FnMut(&[SeatIndex]) -> Vec<SeatIndex>,
{
    let mut won: Vec<(SeatIndex, Chips)> = Vec::new();
    let mut paid = 0;
    for side_pot in side_pots(&roster.players) {
        let shares = match side_pot.contenders.as_slice() {
            [] => side_pot.contributions.clone(),
            [only] => vec![(*only, side_pot.amount)],
            contenders => {
                let picked = winners_of(contenders);
                let mut winners: Vec<SeatIndex> = contenders
                    .iter()
                    .copied()
                    .filter(|seat| picked.contains(seat))
                    .collect();
                if winners.is_empty() {
                    error!("no winner picked among {contenders:?}, splitting between them");
                    winners = contenders.to_vec();
                }
                split(side_pot.amount, &winners)
            }
        };

        for (seat, amount) in shares {
            paid += amount;
            match won.iter_mut().find(|(s, _)| *s == seat) {
                Some((_, total)) => *total += amount,
                None => won.push((seat, amount)),
            }
        }
    }

    if paid != *pot {
        error!("paid out {paid} from a pot of {pot}");
    }
    *pot = pot.saturating_sub(paid);
    for player in &mut roster.players {
        player.chips_this_game = 0;
    }

    won.into_iter()
        .map(|(seat, amount)| {
            let player = &mut roster.players[seat];
            player.chips += amount;
            info!("{} collects {amount}", player.name);
            Payout {
                name: player.name.clone(),
                amount,
            }
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    /// Roster where player `i` committed `commitments[i]` this hand and
    /// has `remaining` chips left behind it.
    fn roster(commitments: &[Chips], remaining: Chips) -> (Roster, Chips) {
        let mut roster = Roster::new();
        for (i, &committed) in commitments.iter().enumerate() {
            roster.register(Some(&format!("p{i}")), remaining).unwrap();
            roster.players[i].chips_this_game = committed;
            roster.players[i].deal_position = Some(i);
        }
        (roster, commitments.iter().sum())
    }

    #[test]
    fn test_single_pot() {
        let (roster, _) = roster(&[100, 100, 100], 0);
        let pots = side_pots(&roster.players);
        assert_eq!(pots.len(), 1);
        assert_eq!(pots[0].amount, 300);
        assert_eq!(pots[0].contenders, vec![0, 1, 2]);
    }

    #[test]
    fn test_short_all_in_makes_side_pot() {
        let (roster, _) = roster(&[50, 100, 100], 0);
        let pots = side_pots(&roster.players);
        assert_eq!(pots.len(), 2);
        assert_eq!(pots[0].amount, 150);
        assert_eq!(pots[0].contenders, vec![0, 1, 2]);
        assert_eq!(pots[1].amount, 100);
        assert_eq!(pots[1].contenders, vec![1, 2]);
    }

    #[test]
    fn test_folded_chips_count_but_cannot_win() {
        let (mut roster, _) = roster(&[30, 100, 100], 0);
        roster.players[0].active_this_round = false;
        let pots = side_pots(&roster.players);
        assert_eq!(pots.len(), 1);
        assert_eq!(pots[0].amount, 230);
        assert_eq!(pots[0].contenders, vec![1, 2]);
        assert_eq!(pots[0].contributions, vec![(0, 30), (1, 100), (2, 100)]);
    }

    #[test]
    fn test_split_gives_odd_chips_in_order() {
        assert_eq!(split(100, &[2, 0, 1]), vec![(2, 34), (0, 33), (1, 33)]);
        assert_eq!(split(10, &[1, 0]), vec![(1, 5), (0, 5)]);
        assert!(split(10, &[]).is_empty());
    }

    #[test]
    fn test_short_stack_wins_main_pot_only() {
        let (mut roster, mut pot) = roster(&[50, 100, 100], 0);
        let payouts = distribute(&mut roster, &mut pot, |contenders| {
            if contenders.contains(&0) { vec![0] } else { vec![2] }
        });
        assert_eq!(pot, 0);
        assert_eq!(roster.players[0].chips, 150);
        assert_eq!(roster.players[1].chips, 0);
        assert_eq!(roster.players[2].chips, 100);
        assert_eq!(payouts.len(), 2);
        assert!(roster.players.iter().all(|p| p.chips_this_game == 0));
    }

    #[test]
    fn test_uncontested_pot_skips_showdown() {
        let (mut roster, mut pot) = roster(&[20, 60, 20], 40);
        roster.players[0].active_this_round = false;
        roster.players[2].active_this_round = false;
        let payouts = distribute(&mut roster, &mut pot, |_| panic!("no showdown needed"));
        assert_eq!(pot, 0);
        assert_eq!(roster.players[1].chips, 140);
        assert_eq!(payouts[0].amount, 100);
    }

    #[test]
    fn test_level_nobody_can_win_is_refunded() {
        let (mut roster, mut pot) = roster(&[40, 100], 0);
        // The bigger stack folded after out-betting the only contender.
        roster.players[1].active_this_round = false;
        distribute(&mut roster, &mut pot, |_| panic!("no showdown needed"));
        assert_eq!(roster.players[0].chips, 80);
        assert_eq!(roster.players[1].chips, 60);
        assert_eq!(pot, 0);
    }

    #[test]
    fn test_chop_conserves_chips() {
        let (mut roster, mut pot) = roster(&[35, 35, 35], 0);
        distribute(&mut roster, &mut pot, |contenders| contenders.to_vec());
        assert_eq!(roster.total_chips(), 105);
        assert_eq!(roster.players[0].chips, 35);
    }

    #[test]
    fn test_bogus_winners_fall_back_to_a_chop() {
        let (mut roster, mut pot) = roster(&[10, 10], 0);
        distribute(&mut roster, &mut pot, |_| vec![7]);
        assert_eq!(roster.players[0].chips, 10);
        assert_eq!(roster.players[1].chips, 10);
    }
}
