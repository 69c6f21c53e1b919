/// Highest number on a single-zero wheel.
pub const MAX_NUMBER: u8 = 36;

/// Number of pockets on the wheel (0-36).
pub const POCKET_COUNT: usize = 37;

/// Red numbers on a roulette wheel.
pub const RED_NUMBERS: [u8; 18] = [1, 3, 5, 7, 9, 12, 14, 16, 18, 19, 21, 23, 25, 27, 30, 32, 34, 36];

/// Pocket order on a European wheel, clockwise from zero.
pub const WHEEL_ORDER: [u8; POCKET_COUNT] = [
    0, 32, 15, 19, 4, 21, 2, 25, 17, 34, 6, 27, 13, 36, 11, 30, 8, 23, 10, 5, 24, 16, 33, 1, 20,
    14, 31, 9, 22, 18, 29, 7, 28, 12, 35, 3, 26,
];

/// Rows on the betting layout (three numbers each).
pub const LAYOUT_ROWS: u8 = 12;

/// Default phase dwell times, in seconds.
pub const BETTING_SECS: u64 = 30;
pub const NO_MORE_BETS_SECS: u64 = 5;
pub const SPINNING_SECS: u64 = 12;
pub const PAYOUT_SECS: u64 = 5;

/// Starting cash for a fresh account.
pub const STARTING_CASH: u64 = 1_000;

/// Rounds kept in the recent-numbers view.
pub const HISTORY_LEN: usize = 100;

/// Cap on pocket collisions while the ball drops.
pub const MAX_BOUNCES: u8 = 5;

/// Check if a number is red.
pub fn is_red(number: u8) -> bool {
    RED_NUMBERS.contains(&number)
}

/// Check if a number is black (zero is neither).
pub fn is_black(number: u8) -> bool {
    (1..=MAX_NUMBER).contains(&number) && !is_red(number)
}

/// Index of a number's pocket in [`WHEEL_ORDER`].
pub fn pocket_index(number: u8) -> Option<usize> {
    WHEEL_ORDER.iter().position(|pocket| *pocket == number)
}
