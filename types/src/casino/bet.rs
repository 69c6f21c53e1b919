use std::fmt;

use serde::{Deserialize, Serialize};
use thiserror::Error as ThisError;

use super::{LAYOUT_ROWS, MAX_NUMBER};

/// Roulette bet types.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum BetType {
    Straight, // Single number (35:1)
    Split,    // Two adjacent numbers (17:1)
    Street,   // Row of three (11:1)
    Corner,   // 2x2 block (8:1)
    Line,     // Two adjacent rows (5:1)
    Dozen,    // 1-12, 13-24, 25-36 (2:1)
    Column,   // First, second, third column (2:1)
    Red,      // Red (1:1)
    Black,    // Black (1:1)
    Even,     // Even (1:1)
    Odd,      // Odd (1:1)
    Low,      // 1-18 (1:1)
    High,     // 19-36 (1:1)
}

impl BetType {
    pub const ALL: [Self; 13] = [
        Self::Straight,
        Self::Split,
        Self::Street,
        Self::Corner,
        Self::Line,
        Self::Dozen,
        Self::Column,
        Self::Red,
        Self::Black,
        Self::Even,
        Self::Odd,
        Self::Low,
        Self::High,
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Straight => "STRAIGHT",
            Self::Split => "SPLIT",
            Self::Street => "STREET",
            Self::Corner => "CORNER",
            Self::Line => "LINE",
            Self::Dozen => "DOZEN",
            Self::Column => "COLUMN",
            Self::Red => "RED",
            Self::Black => "BLACK",
            Self::Even => "EVEN",
            Self::Odd => "ODD",
            Self::Low => "LOW",
            Self::High => "HIGH",
        }
    }

    /// Even-money bets carry no value.
    pub const fn requires_value(&self) -> bool {
        matches!(
            self,
            Self::Straight
                | Self::Split
                | Self::Street
                | Self::Corner
                | Self::Line
                | Self::Dozen
                | Self::Column
        )
    }
}

impl fmt::Display for BetType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Malformed bet geometry.
#[derive(Debug, ThisError, Clone, PartialEq, Eq)]
pub enum BetError {
    #[error("number {0} is not on the wheel")]
    NumberOutOfRange(u8),
    #[error("split {0}-{1} is not two adjacent numbers")]
    NotAdjacent(u8, u8),
    #[error("corner {0:?} is not a 2x2 block")]
    InvalidCorner([u8; 4]),
    #[error("row {row} out of range (1..={max})")]
    RowOutOfRange { row: u8, max: u8 },
    #[error("{bet_type} index {index} out of range (1..=3)")]
    IndexOutOfRange { bet_type: BetType, index: u8 },
    #[error("{0} bet has a missing or malformed value")]
    MalformedValue(BetType),
}

/// The value half of a bet as peers send it: a single number (straight, row or
/// index) or a list of numbers (split, corner).
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum BetValue {
    Number(u8),
    Numbers(Vec<u8>),
}

/// A bet's geometry: the bet type together with whatever value that type needs.
///
/// Rows, dozens and columns are 1-based. A street on row `r` covers
/// `(r-1)*3+1 ..= (r-1)*3+3`; a line starting on row `r` covers rows `r` and `r+1`.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(tag = "type", content = "value", rename_all = "SCREAMING_SNAKE_CASE")]
pub enum BetSpec {
    Straight(u8),
    Split([u8; 2]),
    Street(u8),
    Corner([u8; 4]),
    Line(u8),
    Dozen(u8),
    Column(u8),
    Red,
    Black,
    Even,
    Odd,
    Low,
    High,
}

impl BetSpec {
    pub fn bet_type(&self) -> BetType {
        match self {
            Self::Straight(_) => BetType::Straight,
            Self::Split(_) => BetType::Split,
            Self::Street(_) => BetType::Street,
            Self::Corner(_) => BetType::Corner,
            Self::Line(_) => BetType::Line,
            Self::Dozen(_) => BetType::Dozen,
            Self::Column(_) => BetType::Column,
            Self::Red => BetType::Red,
            Self::Black => BetType::Black,
            Self::Even => BetType::Even,
            Self::Odd => BetType::Odd,
            Self::Low => BetType::Low,
            Self::High => BetType::High,
        }
    }

    pub fn value(&self) -> Option<BetValue> {
        match *self {
            Self::Straight(n) | Self::Street(n) | Self::Line(n) | Self::Dozen(n) | Self::Column(n) => {
                Some(BetValue::Number(n))
            }
            Self::Split(numbers) => Some(BetValue::Numbers(numbers.to_vec())),
            Self::Corner(numbers) => Some(BetValue::Numbers(numbers.to_vec())),
            Self::Red | Self::Black | Self::Even | Self::Odd | Self::Low | Self::High => None,
        }
    }

    /// Rebuild a spec from a bet type and its value. Only the shape is checked
    /// here; use [`BetSpec::validate`] for layout rules.
    pub fn from_parts(bet_type: BetType, value: Option<BetValue>) -> Result<Self, BetError> {
        if bet_type.requires_value() != value.is_some() {
            return Err(BetError::MalformedValue(bet_type));
        }
        let malformed = || BetError::MalformedValue(bet_type);
        let spec = match (bet_type, value) {
            (BetType::Straight, Some(BetValue::Number(n))) => Self::Straight(n),
            (BetType::Street, Some(BetValue::Number(n))) => Self::Street(n),
            (BetType::Line, Some(BetValue::Number(n))) => Self::Line(n),
            (BetType::Dozen, Some(BetValue::Number(n))) => Self::Dozen(n),
            (BetType::Column, Some(BetValue::Number(n))) => Self::Column(n),
            (BetType::Split, Some(BetValue::Numbers(numbers))) => {
                Self::Split(numbers.try_into().map_err(|_| malformed())?)
            }
            (BetType::Corner, Some(BetValue::Numbers(numbers))) => {
                Self::Corner(numbers.try_into().map_err(|_| malformed())?)
            }
            (BetType::Red, None) => Self::Red,
            (BetType::Black, None) => Self::Black,
            (BetType::Even, None) => Self::Even,
            (BetType::Odd, None) => Self::Odd,
            (BetType::Low, None) => Self::Low,
            (BetType::High, None) => Self::High,
            _ => return Err(malformed()),
        };
        Ok(spec)
    }

    /// Check that the value describes a real spot on the layout.
    pub fn validate(&self) -> Result<(), BetError> {
        match *self {
            Self::Straight(number) => check_number(number),
            Self::Split([a, b]) => {
                check_number(a)?;
                check_number(b)?;
                if is_adjacent(a, b) {
                    Ok(())
                } else {
                    Err(BetError::NotAdjacent(a, b))
                }
            }
            Self::Street(row) => check_row(row, LAYOUT_ROWS),
            Self::Corner(numbers) => {
                for number in numbers {
                    check_number(number)?;
                }
                if is_corner(numbers) {
                    Ok(())
                } else {
                    Err(BetError::InvalidCorner(numbers))
                }
            }
            Self::Line(row) => check_row(row, LAYOUT_ROWS - 1),
            Self::Dozen(index) => check_index(BetType::Dozen, index),
            Self::Column(index) => check_index(BetType::Column, index),
            Self::Red | Self::Black | Self::Even | Self::Odd | Self::Low | Self::High => Ok(()),
        }
    }
}

fn check_number(number: u8) -> Result<(), BetError> {
    if number > MAX_NUMBER {
        return Err(BetError::NumberOutOfRange(number));
    }
    Ok(())
}

fn check_row(row: u8, max: u8) -> Result<(), BetError> {
    if row == 0 || row > max {
        return Err(BetError::RowOutOfRange { row, max });
    }
    Ok(())
}

fn check_index(bet_type: BetType, index: u8) -> Result<(), BetError> {
    if !(1..=3).contains(&index) {
        return Err(BetError::IndexOutOfRange { bet_type, index });
    }
    Ok(())
}

/// Layout cell (row, column) of a non-zero number, both 0-based.
fn cell(number: u8) -> (u8, u8) {
    ((number - 1) / 3, (number - 1) % 3)
}

/// Two numbers share an edge on the layout. Zero touches 1, 2 and 3.
pub fn is_adjacent(a: u8, b: u8) -> bool {
    let (low, high) = if a < b { (a, b) } else { (b, a) };
    if low == high {
        return false;
    }
    if low == 0 {
        return (1..=3).contains(&high);
    }
    let (low_row, low_col) = cell(low);
    let (high_row, high_col) = cell(high);
    (low_row == high_row && high_col == low_col + 1) || (low_col == high_col && high_row == low_row + 1)
}

fn is_corner(numbers: [u8; 4]) -> bool {
    let mut sorted = numbers;
    sorted.sort_unstable();
    let top_left = sorted[0];
    if top_left == 0 || cell(top_left).1 == 2 {
        return false;
    }
    sorted == [top_left, top_left + 1, top_left + 3, top_left + 4]
}

/// Opaque table position a chip was dropped on.
#[derive(Clone, Debug, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct SpotKey(pub String);

impl SpotKey {
    pub fn new(position: impl Into<String>) -> Self {
        Self(position.into())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for SpotKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

/// Key used to aggregate stakes from every player on one spot.
pub fn aggregate_key(bet_type: BetType, position: &SpotKey) -> String {
    format!("{}-{}", bet_type.as_str(), position)
}

/// A pending wager for the current round.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Bet {
    pub id: u64,
    pub spec: BetSpec,
    pub amount: u64,
    pub position: SpotKey,
    pub owner_id: String,
}

impl Bet {
    pub fn bet_type(&self) -> BetType {
        self.spec.bet_type()
    }

    pub fn aggregate_key(&self) -> String {
        aggregate_key(self.bet_type(), &self.position)
    }
}
