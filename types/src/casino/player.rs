use serde::{Deserialize, Serialize};

use super::STARTING_CASH;

/// The player's persisted balance.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct PlayerAccount {
    pub cash: u64,
}

impl Default for PlayerAccount {
    fn default() -> Self {
        Self {
            cash: STARTING_CASH,
        }
    }
}

/// Running totals for the current session.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SessionStats {
    pub total_bet: u64,
    pub total_won: u64,
    pub rounds_played: u64,
    pub biggest_win: u64,
}

impl SessionStats {
    /// Net result of the session so far.
    pub fn net(&self) -> i128 {
        self.total_won as i128 - self.total_bet as i128
    }
}
