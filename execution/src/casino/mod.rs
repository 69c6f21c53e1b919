//! Game rules. The table only deals roulette.

pub mod roulette;

pub use roulette::{covered_numbers, is_winner, payout_multiplier, total_winnings, winnings, NumberSet};
