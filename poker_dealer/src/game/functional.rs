//! Hand ranking helpers used by the default card engine.

use super::entities::{Card, Rank, SubHand, Value};

const ACE_LOW: Value = 1;
const ACE_HIGH: Value = 14;

/// Highest card of a five-card straight, if the values make one. The
/// wheel (A-2-3-4-5) counts as five high.
fn straight_high(sorted_desc: &[Value]) -> Option<Value> {
    if sorted_desc.len() != 5 || sorted_desc.windows(2).any(|w| w[0] == w[1]) {
        return None;
    }
    if sorted_desc[0] - sorted_desc[4] == 4 {
        Some(sorted_desc[0])
    } else if sorted_desc == [ACE_HIGH, 5, 4, 3, 2] {
        Some(5)
    } else {
        None
    }
}

/// Rank a hand of at most five cards.
fn eval_five(cards: &[Card]) -> SubHand {
    let mut values: Vec<Value> = cards
        .iter()
        .map(|c| if c.0 == ACE_LOW { ACE_HIGH } else { c.0 })
        .collect();
    values.sort_unstable_by(|a, b| b.cmp(a));

    let is_flush = cards.len() == 5 && cards.iter().all(|c| c.1 == cards[0].1);
    let straight = straight_high(&values);

    // (count, value), biggest group first and higher value breaking ties.
    let mut groups: Vec<(usize, Value)> = Vec::with_capacity(5);
    for &value in &values {
        match groups.iter_mut().find(|(_, v)| *v == value) {
            Some((count, _)) => *count += 1,
            None => groups.push((1, value)),
        }
    }
    groups.sort_unstable_by(|a, b| b.cmp(a));
    let grouped: Vec<Value> = groups.iter().map(|&(_, v)| v).collect();
    let pattern: Vec<usize> = groups.iter().map(|&(c, _)| c).collect();

    let (rank, values) = match (straight, is_flush, pattern.as_slice()) {
        (Some(high), true, _) => (Rank::StraightFlush, vec![high]),
        (_, _, [4, ..]) => (Rank::FourOfAKind, grouped),
        (_, _, [3, 2]) => (Rank::FullHouse, grouped),
        (_, true, _) => (Rank::Flush, values),
        (Some(high), false, _) => (Rank::Straight, vec![high]),
        (_, _, [3, ..]) => (Rank::ThreeOfAKind, grouped),
        (_, _, [2, 2, ..]) => (Rank::TwoPair, grouped),
        (_, _, [2, ..]) => (Rank::OnePair, grouped),
        _ => (Rank::HighCard, values),
    };
    SubHand { rank, values }
}

/// Best five-card hand that can be made from `cards`. Hands of five or
/// fewer cards are ranked as they are.
#[must_use]
pub fn eval(cards: &[Card]) -> SubHand {
    let n = cards.len();
    if n <= 5 {
        return eval_five(cards);
    }

    let mut best: Option<SubHand> = None;
    let mut idx = [0, 1, 2, 3, 4];
    loop {
        let five = idx.map(|i| cards[i]);
        let candidate = eval_five(&five);
        if best.as_ref().is_none_or(|b| candidate > *b) {
            best = Some(candidate);
        }

        // Next combination in lexicographic order.
        let Some(pos) = (0..5).rev().find(|&i| idx[i] < n - 5 + i) else {
            break;
        };
        idx[pos] += 1;
        for i in pos + 1..5 {
            idx[i] = idx[i - 1] + 1;
        }
    }
    best.unwrap_or_else(|| eval_five(&cards[..5]))
}

/// Indices of every hand tied for best.
#[must_use]
pub fn argmax(hands: &[SubHand]) -> Vec<usize> {
    let Some(best) = hands.iter().max() else {
        return Vec::new();
    };
    hands
        .iter()
        .enumerate()
        .filter(|(_, hand)| *hand == best)
        .map(|(i, _)| i)
        .collect()
}
