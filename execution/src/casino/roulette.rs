//! Roulette payout rules.
//!
//! Every bet geometry maps to the set of numbers it covers and a fixed net-odds
//! multiplier. A winning bet returns its stake plus `stake * multiplier`.
//!
//! | type     | covers                                   | pays |
//! |----------|------------------------------------------|------|
//! | Straight | the number                               | 35   |
//! | Split    | the two numbers                          | 17   |
//! | Street   | row `r`: `(r-1)*3+1 ..= (r-1)*3+3`       | 11   |
//! | Corner   | the four numbers                         | 8    |
//! | Line     | rows `r` and `r+1`                       | 5    |
//! | Dozen    | `(d-1)*12+1 ..= d*12`                    | 2    |
//! | Column   | `c, c+3, .., c+33`                       | 2    |
//! | Red/Black/Even/Odd/Low/High | 18 numbers, never zero | 1    |

use croupier_types::casino::{is_black, is_red, Bet, BetSpec, BetType, MAX_NUMBER};

/// A set of wheel numbers (0-36) packed into a bitmask.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Hash)]
pub struct NumberSet(u64);

impl NumberSet {
    pub const fn empty() -> Self {
        Self(0)
    }

    pub fn insert(&mut self, number: u8) {
        if number <= MAX_NUMBER {
            self.0 |= 1u64 << number;
        }
    }

    pub fn contains(&self, number: u8) -> bool {
        number <= MAX_NUMBER && self.0 & (1u64 << number) != 0
    }

    pub fn len(&self) -> usize {
        self.0.count_ones() as usize
    }

    pub fn is_empty(&self) -> bool {
        self.0 == 0
    }

    pub fn iter(&self) -> impl Iterator<Item = u8> + '_ {
        (0..=MAX_NUMBER).filter(move |n| self.contains(*n))
    }
}

impl FromIterator<u8> for NumberSet {
    fn from_iter<I: IntoIterator<Item = u8>>(iter: I) -> Self {
        let mut set = NumberSet::empty();
        for number in iter {
            set.insert(number);
        }
        set
    }
}

/// Numbers a bet pays out on.
///
/// Malformed geometry (which [`BetSpec::validate`] rejects) yields whatever subset
/// of the wheel it names; out-of-range numbers are dropped.
pub fn covered_numbers(spec: &BetSpec) -> NumberSet {
    match *spec {
        BetSpec::Straight(number) => [number].into_iter().collect(),
        BetSpec::Split(numbers) => numbers.into_iter().collect(),
        BetSpec::Street(row) => rows(row, 1),
        BetSpec::Corner(numbers) => numbers.into_iter().collect(),
        BetSpec::Line(row) => rows(row, 2),
        BetSpec::Dozen(index) => {
            if !(1..=3).contains(&index) {
                return NumberSet::empty();
            }
            let start = (index - 1) * 12 + 1;
            (start..start + 12).collect()
        }
        BetSpec::Column(index) => {
            if !(1..=3).contains(&index) {
                return NumberSet::empty();
            }
            (0..12).map(|row| index + row * 3).collect()
        }
        BetSpec::Red => (1..=MAX_NUMBER).filter(|n| is_red(*n)).collect(),
        BetSpec::Black => (1..=MAX_NUMBER).filter(|n| is_black(*n)).collect(),
        BetSpec::Even => (1..=MAX_NUMBER).filter(|n| n % 2 == 0).collect(),
        BetSpec::Odd => (1..=MAX_NUMBER).filter(|n| n % 2 == 1).collect(),
        BetSpec::Low => (1..=18).collect(),
        BetSpec::High => (19..=MAX_NUMBER).collect(),
    }
}

/// `count` consecutive layout rows starting at 1-based `row`.
fn rows(row: u8, count: u8) -> NumberSet {
    if row == 0 {
        return NumberSet::empty();
    }
    let start = (row - 1).saturating_mul(3).saturating_add(1);
    let end = start.saturating_add(count * 3);
    (start..end).filter(|n| *n <= MAX_NUMBER).collect()
}

/// Get the payout multiplier for a bet type (excludes original bet).
pub fn payout_multiplier(bet_type: BetType) -> u64 {
    match bet_type {
        BetType::Straight => 35,
        BetType::Split => 17,
        BetType::Street => 11,
        BetType::Corner => 8,
        BetType::Line => 5,
        BetType::Dozen | BetType::Column => 2,
        BetType::Red
        | BetType::Black
        | BetType::Even
        | BetType::Odd
        | BetType::Low
        | BetType::High => 1,
    }
}

/// Check if a bet wins for a given result.
pub fn is_winner(bet: &Bet, result: u8) -> bool {
    covered_numbers(&bet.spec).contains(result)
}

/// Amount returned to the player for a bet: stake plus profit on a win, zero otherwise.
pub fn winnings(bet: &Bet, result: u8) -> u64 {
    if !is_winner(bet, result) {
        return 0;
    }
    bet.amount
        .saturating_mul(payout_multiplier(bet.bet_type()).saturating_add(1))
}

/// Sum of [`winnings`] over a set of bets.
pub fn total_winnings(bets: &[Bet], result: u8) -> u64 {
    bets.iter()
        .fold(0u64, |acc, bet| acc.saturating_add(winnings(bet, result)))
}
