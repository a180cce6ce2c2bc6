use super::entities::Chips;

/// Most players a single 52-card deck can deal hole cards and a full
/// board to.
pub const MAX_PLAYERS: usize = 23;

pub const MAX_USER_INPUT_LENGTH: usize = 32;

/// Length of the alphanumeric authentication token handed out at
/// registration.
pub const AUTH_TOKEN_LENGTH: usize = 64;

pub const DEFAULT_NUM_PLAYERS: usize = 4;
pub const DEFAULT_STARTING_CHIPS: Chips = 1000;
pub const DEFAULT_MIN_RAISE: Chips = 100;

/// Seats advanced from the dealer before the first pre-flop action.
/// Skips the blind positions.
pub const PREFLOP_FIRST_TO_ACT_OFFSET: usize = 3;

/// Seats advanced from the dealer before the first action on the flop,
/// turn, and river.
pub const POSTFLOP_FIRST_TO_ACT_OFFSET: usize = 1;
