//! Croupier execution layer.
//!
//! This crate contains the round engine for a shared roulette table: the bet
//! ledger, payout rules, settlement and the two clocks that drive a round.
//!
//! ## Two clocks
//! - [`RoundScheduler`] runs on a one-second tick and owns the round lifecycle
//!   (betting, no more bets, spinning, payout). It is the only thing that settles.
//! - [`WheelAnimator`] runs per frame and only animates. It receives the winning
//!   number once, when spinning starts, and always comes to rest on it.
//!
//! Neither clock reads the other's state; the only coupling is the
//! [`RoundEvent::SpinStarted`] handoff.
//!
//! ## Randomness
//! Results come from a [`ResultSource`] and the wheel takes its own `Rng`, so
//! both can be seeded for tests and replays.
//!
//! ## Minimal table loop (example)
//! ```rust,ignore
//! use croupier_execution::{PhaseConfig, RoundEvent, RoundScheduler, WheelAnimator};
//!
//! let mut scheduler = RoundScheduler::new(PhaseConfig::default(), "p1", "alice", account, collaborators)?;
//! let mut wheel = WheelAnimator::from_entropy();
//! for event in scheduler.tick() {
//!     match event {
//!         RoundEvent::SpinStarted { winning_number, .. } => wheel.start(winning_number)?,
//!         RoundEvent::RoundStarted { .. } => wheel.reset(),
//!         _ => {}
//!     }
//! }
//! // Meanwhile, every frame:
//! if let Some(landed) = wheel.advance(1.0 / 60.0) {
//!     println!("ball settled on {landed}");
//! }
//! ```

pub mod account;
pub mod casino;
pub mod external;
pub mod history;
pub mod ledger;
pub mod round_scheduler;
pub mod wheel;

#[cfg(any(test, feature = "mocks"))]
pub mod mocks;


pub use account::{AccountError, BetOutcome, SessionAccount, Settlement};
pub use external::{
    AccountStore, BetBroadcastSink, Collaborators, RandomResultSource, ResultError, ResultSource,
    RoundHistorySink, SinkError,
};
pub use history::{ColorCounts, RoundHistory};
pub use ledger::{BetLedger, LedgerError};
pub use round_scheduler::{PhaseConfig, RoundEvent, RoundScheduler, SchedulerError};
pub use wheel::{WheelAnimator, WheelError};
