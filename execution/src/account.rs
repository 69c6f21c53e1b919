//! Player balance and session statistics.
//!
//! [`SessionAccount::settle`] is the only path that changes the balance. It runs
//! once per round, after the result is known, and applies
//! `cash += total_winnings - total_bet`.

use croupier_types::casino::{Bet, PlayerAccount, SessionStats};
use thiserror::Error;
use tracing::info;

use crate::casino::roulette;

#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum AccountError {
    #[error("round {0} already settled")]
    AlreadySettled(u64),
    #[error("stake {total_bet} exceeds cash {cash}")]
    Overdrawn { cash: u64, total_bet: u64 },
    #[error("balance overflow")]
    Overflow,
}

/// Result of one bet in a settled round.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct BetOutcome {
    pub bet: Bet,
    pub won: bool,
    pub winnings: u64,
}

/// Everything settlement changed for one round.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct Settlement {
    pub round_id: u64,
    pub winning_number: u8,
    pub total_bet: u64,
    pub total_winnings: u64,
    pub net: i64,
    pub cash: u64,
    pub outcomes: Vec<BetOutcome>,
}

#[derive(Clone, Debug, Default)]
pub struct SessionAccount {
    account: PlayerAccount,
    stats: SessionStats,
    last_settled: Option<u64>,
}

impl SessionAccount {
    pub fn new(account: PlayerAccount) -> Self {
        Self {
            account,
            stats: SessionStats::default(),
            last_settled: None,
        }
    }

    pub fn cash(&self) -> u64 {
        self.account.cash
    }

    pub fn account(&self) -> &PlayerAccount {
        &self.account
    }

    pub fn stats(&self) -> &SessionStats {
        &self.stats
    }

    pub fn last_settled_round(&self) -> Option<u64> {
        self.last_settled
    }

    /// Apply a round's result to the balance and stats.
    ///
    /// Rounds without bets are recorded as settled but leave cash and stats alone.
    pub fn settle(
        &mut self,
        round_id: u64,
        bets: &[Bet],
        winning_number: u8,
    ) -> Result<Settlement, AccountError> {
        if self.last_settled == Some(round_id) {
            return Err(AccountError::AlreadySettled(round_id));
        }

        let outcomes: Vec<BetOutcome> = bets
            .iter()
            .map(|bet| {
                let winnings = roulette::winnings(bet, winning_number);
                BetOutcome {
                    bet: bet.clone(),
                    won: winnings > 0,
                    winnings,
                }
            })
            .collect();
        let total_bet = bets
            .iter()
            .try_fold(0u64, |acc, bet| acc.checked_add(bet.amount))
            .ok_or(AccountError::Overflow)?;
        let total_winnings = outcomes
            .iter()
            .try_fold(0u64, |acc, outcome| acc.checked_add(outcome.winnings))
            .ok_or(AccountError::Overflow)?;

        let cash = self
            .account
            .cash
            .checked_sub(total_bet)
            .ok_or(AccountError::Overdrawn {
                cash: self.account.cash,
                total_bet,
            })?
            .checked_add(total_winnings)
            .ok_or(AccountError::Overflow)?;
        let net = i64::try_from(total_winnings as i128 - total_bet as i128)
            .map_err(|_| AccountError::Overflow)?;

        self.account.cash = cash;
        self.last_settled = Some(round_id);
        if !bets.is_empty() {
            self.stats.rounds_played = self.stats.rounds_played.saturating_add(1);
            self.stats.total_bet = self.stats.total_bet.saturating_add(total_bet);
            self.stats.total_won = self.stats.total_won.saturating_add(total_winnings);
            self.stats.biggest_win = self.stats.biggest_win.max(total_winnings);
            info!(round_id, winning_number, total_bet, total_winnings, net, cash, "round settled");
        }

        Ok(Settlement {
            round_id,
            winning_number,
            total_bet,
            total_winnings,
            net,
            cash,
            outcomes,
        })
    }
}
