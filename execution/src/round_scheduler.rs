//! Round scheduler state machine for the roulette table.
//!
//! The scheduler owns the round in progress and moves it through four timed
//! phases, one second per [`RoundScheduler::tick`]:
//!
//! 1. **Betting** (30s) - bets may be placed, undone, repeated or doubled
//! 2. **NoMoreBets** (5s) - the ledger is closed
//! 3. **Spinning** (12s) - the winning number is drawn on entry and handed to the
//!    wheel animation through [`RoundEvent::SpinStarted`]
//! 4. **Payout** (5s) - every pending bet is settled against the winning number
//!
//! After payout a new round starts with a fresh id and an empty ledger.
//!
//! Settlement is driven by this clock alone. The wheel animation runs on its own
//! clock and is never waited on; it is guaranteed to land on the same number.
//!
//! If the result source fails the round is voided: nothing is settled (pending
//! stakes were never debited) and the clock carries on to the next round.
//!
//! ## Usage
//!
//! ```rust,ignore
//! let mut scheduler = RoundScheduler::new(
//!     PhaseConfig::default(),
//!     "player-1",
//!     "alice",
//!     PlayerAccount { cash: 1_000 },
//!     collaborators,
//! )?;
//! scheduler.place_bet(BetSpec::Red, SpotKey::new("red"), 10)?;
//! loop {
//!     for event in scheduler.tick() {
//!         // forward SpinStarted to the wheel, Settled to the player, ...
//!     }
//! }
//! ```

use croupier_types::casino::{
    Bet, BetSpec, PlayerAccount, RoundPhase, RoundState, SpotKey, BETTING_SECS, HISTORY_LEN,
    MAX_NUMBER, NO_MORE_BETS_SECS, PAYOUT_SECS, SPINNING_SECS,
};
use croupier_types::{BetBroadcast, RemoteBet, RoundRecord};
use thiserror::Error;
use tracing::{debug, error, info, warn};

use crate::account::{SessionAccount, Settlement};
use crate::external::{Collaborators, ResultError};
use crate::history::RoundHistory;
use crate::ledger::{BetLedger, LedgerError};

/// Phase configuration with durations in seconds.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct PhaseConfig {
    /// Duration of the betting phase in seconds.
    pub betting_secs: u64,
    /// Duration of the no-more-bets phase in seconds.
    pub no_more_bets_secs: u64,
    /// Duration of the spinning phase in seconds.
    pub spinning_secs: u64,
    /// Duration of the payout phase in seconds.
    pub payout_secs: u64,
}

impl Default for PhaseConfig {
    fn default() -> Self {
        Self {
            betting_secs: BETTING_SECS,
            no_more_bets_secs: NO_MORE_BETS_SECS,
            spinning_secs: SPINNING_SECS,
            payout_secs: PAYOUT_SECS,
        }
    }
}

impl PhaseConfig {
    /// Create a new phase configuration with the given durations.
    pub fn new(
        betting_secs: u64,
        no_more_bets_secs: u64,
        spinning_secs: u64,
        payout_secs: u64,
    ) -> Self {
        Self {
            betting_secs,
            no_more_bets_secs,
            spinning_secs,
            payout_secs,
        }
    }

    /// Validate the configuration (all durations must be > 0).
    pub fn validate(&self) -> Result<(), &'static str> {
        if self.betting_secs == 0 {
            return Err("betting_secs must be greater than zero");
        }
        if self.no_more_bets_secs == 0 {
            return Err("no_more_bets_secs must be greater than zero");
        }
        if self.spinning_secs == 0 {
            return Err("spinning_secs must be greater than zero");
        }
        if self.payout_secs == 0 {
            return Err("payout_secs must be greater than zero");
        }
        Ok(())
    }

    /// Get the duration for a specific phase.
    pub fn duration_for_phase(&self, phase: RoundPhase) -> u64 {
        match phase {
            RoundPhase::Betting => self.betting_secs,
            RoundPhase::NoMoreBets => self.no_more_bets_secs,
            RoundPhase::Spinning => self.spinning_secs,
            RoundPhase::Payout => self.payout_secs,
        }
    }

    /// Calculate total round duration in seconds.
    pub fn total_round_duration_secs(&self) -> u64 {
        self.betting_secs
            .saturating_add(self.no_more_bets_secs)
            .saturating_add(self.spinning_secs)
            .saturating_add(self.payout_secs)
    }
}

#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum SchedulerError {
    #[error("invalid phase config: {0}")]
    InvalidConfig(&'static str),
}

/// Something the rest of the table needs to react to.
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum RoundEvent {
    /// The round entered a new phase.
    PhaseChanged {
        round_id: u64,
        phase: RoundPhase,
        time_left: u64,
    },
    /// The winning number is known; start the wheel on it.
    SpinStarted { round_id: u64, winning_number: u8 },
    /// No result could be drawn; the round will not be settled.
    RoundVoided { round_id: u64, reason: String },
    /// Bets were settled and the balance updated.
    Settled(Settlement),
    /// A new round opened for bets; reset the wheel.
    RoundStarted { round_id: u64 },
}

pub struct RoundScheduler {
    config: PhaseConfig,
    round: RoundState,
    ledger: BetLedger,
    account: SessionAccount,
    history: RoundHistory,
    owner_name: String,
    collaborators: Collaborators,
}

impl RoundScheduler {
    /// Create a scheduler with round 1 open for bets.
    pub fn new(
        config: PhaseConfig,
        owner_id: impl Into<String>,
        owner_name: impl Into<String>,
        account: PlayerAccount,
        collaborators: Collaborators,
    ) -> Result<Self, SchedulerError> {
        config.validate().map_err(SchedulerError::InvalidConfig)?;
        let history = match collaborators.history.recent(HISTORY_LEN) {
            Ok(records) => RoundHistory::from_records(HISTORY_LEN, records),
            Err(err) => {
                warn!(?err, "round history unavailable, starting empty");
                RoundHistory::default()
            }
        };
        let round_id = history
            .last()
            .map(|r| r.round_id.saturating_add(1))
            .unwrap_or(1);
        Ok(Self {
            config,
            round: RoundState::new(round_id, config.betting_secs),
            ledger: BetLedger::new(owner_id),
            account: SessionAccount::new(account),
            history,
            owner_name: owner_name.into(),
            collaborators,
        })
    }

    pub fn config(&self) -> &PhaseConfig {
        &self.config
    }

    pub fn round(&self) -> &RoundState {
        &self.round
    }

    pub fn ledger(&self) -> &BetLedger {
        &self.ledger
    }

    pub fn account(&self) -> &SessionAccount {
        &self.account
    }

    pub fn history(&self) -> &RoundHistory {
        &self.history
    }

    pub fn owner_name(&self) -> &str {
        &self.owner_name
    }

    /// Advance the clock by one second, running any transition that falls due.
    pub fn tick(&mut self) -> Vec<RoundEvent> {
        let mut events = Vec::new();
        self.round.time_left = self.round.time_left.saturating_sub(1);
        if self.round.time_left == 0 {
            let next = self.round.phase.next();
            self.enter(next, &mut events);
        }
        events
    }

    fn enter(&mut self, phase: RoundPhase, events: &mut Vec<RoundEvent>) {
        match phase {
            RoundPhase::Betting => self.start_next_round(events),
            RoundPhase::NoMoreBets => {
                self.ledger.close();
                self.set_phase(phase);
            }
            RoundPhase::Spinning => {
                self.set_phase(phase);
                self.draw_result(events);
            }
            RoundPhase::Payout => {
                self.set_phase(phase);
                self.settle(events);
            }
        }
        info!(
            round_id = self.round.round_id,
            phase = %self.round.phase,
            time_left = self.round.time_left,
            "phase changed"
        );
        // A new round reports its own start before the phase change.
        events.push(RoundEvent::PhaseChanged {
            round_id: self.round.round_id,
            phase: self.round.phase,
            time_left: self.round.time_left,
        });
    }

    fn set_phase(&mut self, phase: RoundPhase) {
        self.round.phase = phase;
        self.round.time_left = self.config.duration_for_phase(phase);
    }

    fn draw_result(&mut self, events: &mut Vec<RoundEvent>) {
        let round_id = self.round.round_id;
        if self.round.winning_number.is_some() || self.round.voided {
            return;
        }
        let drawn = self
            .collaborators
            .results
            .draw_result()
            .and_then(|number| {
                if number > MAX_NUMBER {
                    Err(ResultError::OutOfRange(number))
                } else {
                    Ok(number)
                }
            });
        match drawn {
            Ok(winning_number) => {
                self.round.winning_number = Some(winning_number);
                info!(round_id, winning_number, "result drawn");
                events.push(RoundEvent::SpinStarted {
                    round_id,
                    winning_number,
                });
            }
            Err(err) => self.void(round_id, err.to_string(), events),
        }
    }

    fn void(&mut self, round_id: u64, reason: String, events: &mut Vec<RoundEvent>) {
        warn!(round_id, %reason, "round voided");
        self.round.voided = true;
        events.push(RoundEvent::RoundVoided { round_id, reason });
    }

    fn settle(&mut self, events: &mut Vec<RoundEvent>) {
        let round_id = self.round.round_id;
        let Some(winning_number) = self.round.winning_number else {
            debug!(round_id, "voided round, nothing to settle");
            return;
        };

        match self
            .account
            .settle(round_id, self.ledger.bets(), winning_number)
        {
            Ok(settlement) => {
                if !settlement.outcomes.is_empty() {
                    if let Err(err) = self.collaborators.accounts.save(self.account.account()) {
                        warn!(?err, round_id, "failed to persist balance");
                    }
                }
                events.push(RoundEvent::Settled(settlement));
            }
            Err(err) => {
                error!(?err, round_id, "settlement rejected");
                self.void(round_id, err.to_string(), events);
                return;
            }
        }

        let record = RoundRecord {
            round_id,
            winning_number,
        };
        self.history.push(record);
        if let Err(err) = self.collaborators.history.record(&record) {
            warn!(?err, round_id, "failed to record round history");
        }
    }

    fn start_next_round(&mut self, events: &mut Vec<RoundEvent>) {
        let round_id = self.round.round_id.saturating_add(1);
        self.round = RoundState::new(round_id, self.config.betting_secs);
        self.ledger.open_round();
        events.push(RoundEvent::RoundStarted { round_id });
    }

    fn announce(&mut self, bet: &Bet) {
        let record = BetBroadcast::from_bet(self.round.round_id, &self.owner_name, bet);
        if let Err(err) = self.collaborators.broadcast.broadcast(&record) {
            warn!(?err, bet_id = bet.id, "failed to broadcast bet");
        }
    }

    pub fn place_bet(
        &mut self,
        spec: BetSpec,
        position: SpotKey,
        amount: u64,
    ) -> Result<Bet, LedgerError> {
        let bet = self
            .ledger
            .place(self.account.cash(), spec, position, amount)?;
        self.announce(&bet);
        Ok(bet)
    }

    pub fn undo_last(&mut self) -> Result<Option<Bet>, LedgerError> {
        self.ledger.undo_last()
    }

    pub fn clear_bets(&mut self) -> Result<Vec<Bet>, LedgerError> {
        self.ledger.clear()
    }

    pub fn repeat_last(&mut self) -> Result<Vec<Bet>, LedgerError> {
        let placed = self.ledger.repeat_last(self.account.cash())?;
        for bet in &placed {
            self.announce(bet);
        }
        Ok(placed)
    }

    pub fn double_bets(&mut self) -> Result<Vec<Bet>, LedgerError> {
        let added = self.ledger.double(self.account.cash())?;
        for bet in &added {
            self.announce(bet);
        }
        Ok(added)
    }

    /// Merge a bet from another player into the display aggregates.
    pub fn ingest_remote(&mut self, bet: &RemoteBet) -> bool {
        self.ledger.merge_remote(bet)
    }
}
