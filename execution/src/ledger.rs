//! Pending bets for the round in progress.
//!
//! The ledger holds the local player's bets and a display-only aggregate of the
//! stakes other players have announced. Placement is only possible while the
//! ledger is open; the round scheduler closes it when betting ends and reopens it
//! for the next round.
//!
//! Affordability is always checked against `cash - total_bet_amount()`, where the
//! total is recomputed from the bets themselves. Remote stakes never count.

use std::collections::BTreeMap;

use croupier_types::casino::{Bet, BetError, BetSpec, SpotKey};
use croupier_types::RemoteBet;
use thiserror::Error;
use tracing::debug;

#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum LedgerError {
    #[error("insufficient funds: requested {requested}, available {available}")]
    InsufficientFunds { requested: u64, available: u64 },
    #[error("betting closed")]
    InvalidPhase,
    #[error("bet amount must be positive")]
    InvalidAmount,
    #[error("invalid bet: {0}")]
    InvalidBet(#[from] BetError),
    #[error("stake overflow")]
    Overflow,
}

#[derive(Clone, Debug)]
pub struct BetLedger {
    owner_id: String,
    open: bool,
    next_id: u64,
    my_bets: Vec<Bet>,
    last_bets: Vec<Bet>,
    remote: BTreeMap<String, u64>,
}

impl BetLedger {
    pub fn new(owner_id: impl Into<String>) -> Self {
        Self {
            owner_id: owner_id.into(),
            open: true,
            next_id: 1,
            my_bets: Vec::new(),
            last_bets: Vec::new(),
            remote: BTreeMap::new(),
        }
    }

    pub fn owner_id(&self) -> &str {
        &self.owner_id
    }

    pub fn is_open(&self) -> bool {
        self.open
    }

    pub fn bets(&self) -> &[Bet] {
        &self.my_bets
    }

    /// Bets carried over from the most recent round that had any.
    pub fn last_bets(&self) -> &[Bet] {
        &self.last_bets
    }

    /// Sum of the pending stakes, always recomputed from the bets.
    pub fn total_bet_amount(&self) -> u64 {
        sum_amounts(&self.my_bets)
    }

    /// Stake other players have put on each `TYPE-position` key.
    pub fn remote_aggregates(&self) -> &BTreeMap<String, u64> {
        &self.remote
    }

    fn ensure_open(&self) -> Result<(), LedgerError> {
        if !self.open {
            return Err(LedgerError::InvalidPhase);
        }
        Ok(())
    }

    /// Cash not yet committed to pending bets.
    pub fn available(&self, cash: u64) -> u64 {
        cash.saturating_sub(self.total_bet_amount())
    }

    fn ensure_affordable(&self, cash: u64, requested: u64) -> Result<(), LedgerError> {
        let available = self.available(cash);
        if requested > available {
            return Err(LedgerError::InsufficientFunds {
                requested,
                available,
            });
        }
        Ok(())
    }

    fn issue(&mut self, spec: BetSpec, position: SpotKey, amount: u64) -> Bet {
        let bet = Bet {
            id: self.next_id,
            spec,
            amount,
            position,
            owner_id: self.owner_id.clone(),
        };
        self.next_id = self.next_id.saturating_add(1);
        bet
    }

    /// Place a bet. Nothing changes if the bet is rejected.
    pub fn place(
        &mut self,
        cash: u64,
        spec: BetSpec,
        position: SpotKey,
        amount: u64,
    ) -> Result<Bet, LedgerError> {
        self.ensure_open()?;
        if amount == 0 {
            return Err(LedgerError::InvalidAmount);
        }
        spec.validate()?;
        self.ensure_affordable(cash, amount)?;

        let bet = self.issue(spec, position, amount);
        debug!(id = bet.id, bet_type = %bet.bet_type(), amount, "bet placed");
        self.my_bets.push(bet.clone());
        Ok(bet)
    }

    /// Remove the most recent bet, if any.
    pub fn undo_last(&mut self) -> Result<Option<Bet>, LedgerError> {
        self.ensure_open()?;
        let removed = self.my_bets.pop();
        if let Some(bet) = &removed {
            debug!(id = bet.id, "bet undone");
        }
        Ok(removed)
    }

    /// Remove every pending bet.
    pub fn clear(&mut self) -> Result<Vec<Bet>, LedgerError> {
        self.ensure_open()?;
        Ok(std::mem::take(&mut self.my_bets))
    }

    /// Place the previous round's bets again, all or nothing.
    pub fn repeat_last(&mut self, cash: u64) -> Result<Vec<Bet>, LedgerError> {
        self.ensure_open()?;
        let requested = sum_amounts(&self.last_bets);
        self.ensure_affordable(cash, requested)?;

        let previous = self.last_bets.clone();
        let mut placed = Vec::with_capacity(previous.len());
        for bet in previous {
            let bet = self.issue(bet.spec, bet.position, bet.amount);
            self.my_bets.push(bet.clone());
            placed.push(bet);
        }
        debug!(count = placed.len(), requested, "bets repeated");
        Ok(placed)
    }

    /// Double every pending bet, all or nothing.
    ///
    /// Returns the added stake per bet, in placement order.
    pub fn double(&mut self, cash: u64) -> Result<Vec<Bet>, LedgerError> {
        self.ensure_open()?;
        let requested = self.total_bet_amount();
        self.ensure_affordable(cash, requested)?;

        let mut doubled = Vec::with_capacity(self.my_bets.len());
        for bet in &self.my_bets {
            let amount = bet.amount.checked_mul(2).ok_or(LedgerError::Overflow)?;
            doubled.push(amount);
        }
        let mut added = Vec::with_capacity(self.my_bets.len());
        for (bet, amount) in self.my_bets.iter_mut().zip(doubled) {
            added.push(Bet {
                amount: amount - bet.amount,
                ..bet.clone()
            });
            bet.amount = amount;
        }
        debug!(count = added.len(), requested, "bets doubled");
        Ok(added)
    }

    /// Merge a bet announced by another player into the display aggregate.
    ///
    /// Returns false for echoes of our own bets, which are ignored.
    pub fn merge_remote(&mut self, bet: &RemoteBet) -> bool {
        if bet.owner_id == self.owner_id || bet.amount == 0 {
            return false;
        }
        let key = croupier_types::casino::aggregate_key(bet.bet_type(), &bet.position);
        let entry = self.remote.entry(key).or_insert(0);
        *entry = entry.saturating_add(bet.amount);
        true
    }

    /// Stop accepting changes until the next round opens.
    pub fn close(&mut self) {
        self.open = false;
    }

    /// Start a fresh round: pending bets become the repeat set (if any), remote
    /// aggregates are dropped and placement reopens.
    pub fn open_round(&mut self) {
        let finished = std::mem::take(&mut self.my_bets);
        if !finished.is_empty() {
            self.last_bets = finished;
        }
        self.remote.clear();
        self.open = true;
    }
}

fn sum_amounts(bets: &[Bet]) -> u64 {
    bets.iter()
        .fold(0u64, |acc, bet| acc.saturating_add(bet.amount))
}

#[cfg(test)]
mod tests {
    use super::*;
    use croupier_types::casino::BetType;
    use proptest::prelude::*;

    fn spot(name: &str) -> SpotKey {
        SpotKey::new(name)
    }

    fn remote(owner: &str, spec: BetSpec, position: &str, amount: u64) -> RemoteBet {
        RemoteBet {
            round_id: 1,
            owner_id: owner.to_string(),
            owner_name: owner.to_string(),
            bet: spec,
            amount,
            position: spot(position),
        }
    }

    #[test]
    fn test_place_and_total() {
        let mut ledger = BetLedger::new("me");
        ledger.place(100, BetSpec::Red, spot("red"), 10).unwrap();
        ledger.place(100, BetSpec::Straight(7), spot("7"), 20).unwrap();
        assert_eq!(ledger.total_bet_amount(), 30);
        assert_eq!(ledger.bets().len(), 2);
        assert_eq!(ledger.bets()[1].owner_id, "me");
        assert_ne!(ledger.bets()[0].id, ledger.bets()[1].id);
    }

    #[test]
    fn test_place_beyond_available_is_rejected() {
        let mut ledger = BetLedger::new("me");
        ledger.place(50, BetSpec::Red, spot("red"), 40).unwrap();
        let before = ledger.bets().to_vec();
        let err = ledger.place(50, BetSpec::Black, spot("black"), 11).unwrap_err();
        assert_eq!(
            err,
            LedgerError::InsufficientFunds {
                requested: 11,
                available: 10
            }
        );
        assert_eq!(ledger.bets(), before.as_slice());
        assert_eq!(ledger.total_bet_amount(), 40);
        ledger.place(50, BetSpec::Black, spot("black"), 10).unwrap();
    }

    #[test]
    fn test_place_rejects_zero_and_bad_geometry() {
        let mut ledger = BetLedger::new("me");
        assert_eq!(
            ledger.place(50, BetSpec::Red, spot("red"), 0),
            Err(LedgerError::InvalidAmount)
        );
        assert_eq!(
            ledger.place(50, BetSpec::Split([3, 4]), spot("3-4"), 5),
            Err(LedgerError::InvalidBet(BetError::NotAdjacent(3, 4)))
        );
        assert!(ledger.bets().is_empty());
    }

    #[test]
    fn test_undo_last() {
        let mut ledger = BetLedger::new("me");
        assert_eq!(ledger.undo_last(), Ok(None));
        ledger.place(100, BetSpec::Red, spot("red"), 10).unwrap();
        ledger.place(100, BetSpec::Odd, spot("odd"), 20).unwrap();
        let undone = ledger.undo_last().unwrap().unwrap();
        assert_eq!(undone.amount, 20);
        assert_eq!(ledger.total_bet_amount(), 10);
    }

    #[test]
    fn test_clear() {
        let mut ledger = BetLedger::new("me");
        ledger.place(100, BetSpec::Red, spot("red"), 10).unwrap();
        ledger.place(100, BetSpec::Low, spot("low"), 5).unwrap();
        assert_eq!(ledger.clear().unwrap().len(), 2);
        assert_eq!(ledger.total_bet_amount(), 0);
    }

    #[test]
    fn test_closed_ledger_rejects_everything() {
        let mut ledger = BetLedger::new("me");
        ledger.place(100, BetSpec::Red, spot("red"), 10).unwrap();
        ledger.close();
        assert_eq!(
            ledger.place(100, BetSpec::Red, spot("red"), 10),
            Err(LedgerError::InvalidPhase)
        );
        assert_eq!(ledger.undo_last(), Err(LedgerError::InvalidPhase));
        assert_eq!(ledger.clear(), Err(LedgerError::InvalidPhase));
        assert_eq!(ledger.repeat_last(100), Err(LedgerError::InvalidPhase));
        assert_eq!(ledger.double(100), Err(LedgerError::InvalidPhase));
        assert_eq!(ledger.total_bet_amount(), 10);
    }

    #[test]
    fn test_double_is_all_or_nothing() {
        let mut ledger = BetLedger::new("me");
        ledger.place(100, BetSpec::Red, spot("red"), 30).unwrap();
        ledger.place(100, BetSpec::Dozen(1), spot("d1"), 20).unwrap();

        // 50 pending, 50 available: doubling needs exactly 50.
        let added = ledger.double(100).unwrap();
        assert_eq!(added.iter().map(|b| b.amount).collect::<Vec<_>>(), vec![30, 20]);
        assert_eq!(ledger.total_bet_amount(), 100);

        // 100 pending, 20 available: doubling needs 100.
        let err = ledger.double(120).unwrap_err();
        assert_eq!(
            err,
            LedgerError::InsufficientFunds {
                requested: 100,
                available: 20
            }
        );
        let amounts: Vec<u64> = ledger.bets().iter().map(|b| b.amount).collect();
        assert_eq!(amounts, vec![60, 40]);
    }

    #[test]
    fn test_double_with_no_bets_is_a_no_op() {
        let mut ledger = BetLedger::new("me");
        assert_eq!(ledger.double(0), Ok(vec![]));
    }

    #[test]
    fn test_repeat_last_round() {
        let mut ledger = BetLedger::new("me");
        ledger.place(100, BetSpec::Red, spot("red"), 10).unwrap();
        ledger.place(100, BetSpec::Straight(7), spot("7"), 5).unwrap();
        ledger.close();
        ledger.open_round();
        assert!(ledger.bets().is_empty());
        assert_eq!(ledger.last_bets().len(), 2);

        // Not enough for the full set: nothing is placed.
        let err = ledger.repeat_last(14).unwrap_err();
        assert_eq!(
            err,
            LedgerError::InsufficientFunds {
                requested: 15,
                available: 14
            }
        );
        assert!(ledger.bets().is_empty());

        let placed = ledger.repeat_last(15).unwrap();
        assert_eq!(placed.len(), 2);
        assert_eq!(ledger.total_bet_amount(), 15);
        assert_eq!(ledger.bets()[0].spec, BetSpec::Red);
        assert!(ledger.bets()[0].id > 2);
    }

    #[test]
    fn test_empty_round_keeps_previous_repeat_set() {
        let mut ledger = BetLedger::new("me");
        ledger.place(100, BetSpec::Even, spot("even"), 10).unwrap();
        ledger.open_round();
        ledger.open_round();
        assert_eq!(ledger.last_bets().len(), 1);
    }

    #[test]
    fn test_remote_bets_only_touch_aggregates() {
        let mut ledger = BetLedger::new("me");
        ledger.place(50, BetSpec::Red, spot("red"), 50).unwrap();

        assert!(ledger.merge_remote(&remote("bob", BetSpec::Red, "red", 25)));
        assert!(ledger.merge_remote(&remote("eve", BetSpec::Red, "red", 5)));
        assert!(ledger.merge_remote(&remote("eve", BetSpec::Straight(3), "3", 1)));
        assert!(!ledger.merge_remote(&remote("me", BetSpec::Red, "red", 50)));

        assert_eq!(ledger.remote_aggregates().get("RED-red"), Some(&30));
        assert_eq!(ledger.remote_aggregates().get("STRAIGHT-3"), Some(&1));
        assert_eq!(ledger.total_bet_amount(), 50);
        assert_eq!(ledger.available(50), 0);

        ledger.open_round();
        assert!(ledger.remote_aggregates().is_empty());
    }

    #[derive(Clone, Debug)]
    enum Op {
        Place(u64),
        Undo,
        Clear,
        Double,
        Repeat,
        NewRound,
    }

    fn op() -> impl Strategy<Value = Op> {
        prop_oneof![
            4 => (1u64..200).prop_map(Op::Place),
            1 => Just(Op::Undo),
            1 => Just(Op::Clear),
            1 => Just(Op::Double),
            1 => Just(Op::Repeat),
            1 => Just(Op::NewRound),
        ]
    }

    proptest! {
        #[test]
        fn test_prop_total_matches_bets_and_never_exceeds_cash(
            cash in 0u64..2_000,
            ops in proptest::collection::vec(op(), 0..64),
        ) {
            let mut ledger = BetLedger::new("me");
            for op in ops {
                let before: Vec<Bet> = ledger.bets().to_vec();
                let result = match op {
                    Op::Place(amount) => ledger.place(cash, BetSpec::Column(2), spot("c2"), amount).map(|_| ()),
                    Op::Undo => ledger.undo_last().map(|_| ()),
                    Op::Clear => ledger.clear().map(|_| ()),
                    Op::Double => ledger.double(cash).map(|_| ()),
                    Op::Repeat => ledger.repeat_last(cash).map(|_| ()),
                    Op::NewRound => {
                        ledger.open_round();
                        Ok(())
                    }
                };
                if result.is_err() {
                    prop_assert_eq!(ledger.bets(), before.as_slice());
                }
                let sum: u64 = ledger.bets().iter().map(|b| b.amount).sum();
                prop_assert_eq!(ledger.total_bet_amount(), sum);
                prop_assert!(ledger.total_bet_amount() <= cash);
                prop_assert!(ledger.bets().iter().all(|b| b.bet_type() == BetType::Column));
            }
        }
    }
}
