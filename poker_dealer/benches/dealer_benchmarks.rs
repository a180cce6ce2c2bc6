use criterion::{BenchmarkId, Criterion, criterion_group, criterion_main};
use poker_dealer::{
    LocalTransport, Tournament, TournamentSettings,
    bot::Scripted,
    entities::{AuthToken, Card, Move, Player, Suit, Username},
    functional::{argmax, eval},
    game::moves::{Stakes, process_move},
};
use std::hint::black_box;

/// Registered tournament with `n_players` bots that play `script` and
/// then call, ready for its first hand.
fn setup_tournament(n_players: usize, script: &[Move]) -> (Tournament, LocalTransport) {
    let mut transport = LocalTransport::new();
    for _ in 0..n_players {
        transport.join(None, Scripted::new(script.to_vec()));
    }
    let settings = TournamentSettings::new(n_players, 10_000, 20);
    let mut tournament = Tournament::new(settings);
    tournament.register_players(&mut transport).unwrap();
    tournament.roster.first_dealer().unwrap();
    (tournament, transport)
}

/// Benchmark hand evaluation with 7 cards (hole cards + board)
fn bench_hand_eval_7_cards(c: &mut Criterion) {
    let cards = vec![
        Card(1, Suit::Spade),   // Hole: Ace of Spades
        Card(13, Suit::Spade),  // Hole: King of Spades
        Card(12, Suit::Spade),  // Board: Queen of Spades
        Card(11, Suit::Spade),  // Board: Jack of Spades
        Card(10, Suit::Spade),  // Board: 10 of Spades (royal flush)
        Card(2, Suit::Heart),   // Board: 2 of Hearts
        Card(3, Suit::Diamond), // Board: 3 of Diamonds
    ];

    c.bench_function("hand_eval_7_cards", |b| {
        b.iter(|| eval(black_box(&cards)));
    });
}

/// Benchmark picking winners among several hands
fn bench_argmax(c: &mut Criterion) {
    let mut group = c.benchmark_group("argmax");

    for n_hands in [2, 4, 8] {
        let hands: Vec<_> = (0..n_hands)
            .map(|i| {
                let base = (i % 9) as u8 + 2;
                eval(&[
                    Card(base, Suit::Club),
                    Card(base + 1, Suit::Heart),
                    Card(base + 3, Suit::Diamond),
                    Card(13, Suit::Spade),
                    Card(7, Suit::Heart),
                    Card(4, Suit::Club),
                    Card(1, Suit::Diamond),
                ])
            })
            .collect();

        group.bench_with_input(BenchmarkId::from_parameter(n_hands), &hands, |b, hands| {
            b.iter(|| argmax(black_box(hands)));
        });
    }

    group.finish();
}

/// Benchmark resolving a single move
fn bench_process_move(c: &mut Criterion) {
    let template = Player::new(Username::new("bench"), AuthToken::generate(), 0, 1_000);

    c.bench_function("process_move_raise", |b| {
        b.iter(|| {
            let mut player = template.clone();
            let mut stakes = Stakes {
                min_raise: 20,
                last_bet: 40,
            };
            process_move(black_box(Move::Raise(100)), &mut player, &mut stakes)
        });
    });
}

/// Benchmark a whole hand with different numbers of players
fn bench_full_hand(c: &mut Criterion) {
    let mut group = c.benchmark_group("full_hand");
    let script = [Move::Raise(40), Move::Call, Move::Call, Move::Call];

    for n_players in [2, 4, 6, 9] {
        group.bench_with_input(
            BenchmarkId::from_parameter(n_players),
            &n_players,
            |b, &n| {
                b.iter_batched(
                    || setup_tournament(n, &script),
                    |(mut tournament, mut transport)| {
                        tournament.play_hand(&mut transport).unwrap();
                    },
                    criterion::BatchSize::SmallInput,
                );
            },
        );
    }

    group.finish();
}

criterion_group!(
    benches,
    bench_hand_eval_7_cards,
    bench_argmax,
    bench_process_move,
    bench_full_hand,
);
criterion_main!(benches);
