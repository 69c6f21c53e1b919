//! Collaborators the round engine talks to.
//!
//! The engine only needs a source of winning numbers and a few fire-and-forget
//! sinks. Sink failures never affect the local round; they are logged and dropped
//! by the caller.

use croupier_types::casino::{PlayerAccount, MAX_NUMBER};
use croupier_types::{BetBroadcast, RoundRecord};
use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};
use thiserror::Error;

#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum ResultError {
    #[error("result source unavailable: {0}")]
    Unavailable(String),
    #[error("result {0} is not on the wheel")]
    OutOfRange(u8),
}

#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum SinkError {
    #[error("sink unavailable: {0}")]
    Unavailable(String),
}

/// Produces the winning number for a round.
pub trait ResultSource: Send {
    /// Draw a uniformly random number in `0..=36`.
    fn draw_result(&mut self) -> Result<u8, ResultError>;
}

/// Announces local bets to the other players at the table.
pub trait BetBroadcastSink: Send {
    fn broadcast(&mut self, bet: &BetBroadcast) -> Result<(), SinkError>;
}

/// Keeps completed round results.
pub trait RoundHistorySink: Send {
    fn record(&mut self, record: &RoundRecord) -> Result<(), SinkError>;

    /// Most recent records, oldest first.
    fn recent(&self, limit: usize) -> Result<Vec<RoundRecord>, SinkError>;
}

/// Persists the player's balance.
pub trait AccountStore: Send {
    fn save(&mut self, account: &PlayerAccount) -> Result<(), SinkError>;
}

/// Draws results from a random number generator.
#[derive(Debug)]
pub struct RandomResultSource<R: Rng + Send = StdRng> {
    rng: R,
}

impl RandomResultSource<StdRng> {
    pub fn from_entropy() -> Self {
        Self::new(StdRng::from_entropy())
    }
}

impl<R: Rng + Send> RandomResultSource<R> {
    pub fn new(rng: R) -> Self {
        Self { rng }
    }
}

impl<R: Rng + Send> ResultSource for RandomResultSource<R> {
    fn draw_result(&mut self) -> Result<u8, ResultError> {
        Ok(self.rng.gen_range(0..=MAX_NUMBER))
    }
}

/// The collaborators a [`crate::RoundScheduler`] is wired to.
pub struct Collaborators {
    pub results: Box<dyn ResultSource>,
    pub broadcast: Box<dyn BetBroadcastSink>,
    pub history: Box<dyn RoundHistorySink>,
    pub accounts: Box<dyn AccountStore>,
}
