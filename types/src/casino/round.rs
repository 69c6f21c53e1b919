use std::fmt;

use serde::{Deserialize, Serialize};

/// Phase of the round timer.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum RoundPhase {
    Betting,
    NoMoreBets,
    Spinning,
    Payout,
}

impl RoundPhase {
    pub fn as_str(&self) -> &'static str {
        match self {
            RoundPhase::Betting => "betting",
            RoundPhase::NoMoreBets => "no_more_bets",
            RoundPhase::Spinning => "spinning",
            RoundPhase::Payout => "payout",
        }
    }

    /// The phase that follows this one. The cycle wraps from payout back to betting.
    pub fn next(&self) -> RoundPhase {
        match self {
            RoundPhase::Betting => RoundPhase::NoMoreBets,
            RoundPhase::NoMoreBets => RoundPhase::Spinning,
            RoundPhase::Spinning => RoundPhase::Payout,
            RoundPhase::Payout => RoundPhase::Betting,
        }
    }
}

impl fmt::Display for RoundPhase {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Authoritative state of the round in progress.
///
/// `winning_number` is assigned once, on the `no_more_bets -> spinning` edge, and is
/// only cleared when the whole state is replaced for the next round.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RoundState {
    pub round_id: u64,
    pub phase: RoundPhase,
    pub time_left: u64,
    pub winning_number: Option<u8>,
    #[serde(default)]
    pub voided: bool,
}

impl RoundState {
    /// A fresh round opening for bets.
    pub fn new(round_id: u64, betting_secs: u64) -> Self {
        Self {
            round_id,
            phase: RoundPhase::Betting,
            time_left: betting_secs,
            winning_number: None,
            voided: false,
        }
    }
}
