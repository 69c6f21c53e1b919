//! In-memory collaborators for tests.
//!
//! Every sink shares its storage through [`MockHandles`] so a test can hand the
//! boxed collaborators to a [`crate::RoundScheduler`] and still inspect what was
//! written.

use std::collections::VecDeque;
use std::sync::{Arc, Mutex, MutexGuard};

use croupier_types::casino::PlayerAccount;
use croupier_types::{BetBroadcast, RoundRecord};

use crate::external::{
    AccountStore, BetBroadcastSink, Collaborators, ResultError, ResultSource, RoundHistorySink,
    SinkError,
};

fn lock<T>(mutex: &Mutex<T>) -> MutexGuard<'_, T> {
    mutex.lock().unwrap_or_else(|poisoned| poisoned.into_inner())
}

/// Plays back a queue of results, then repeats `fallback` forever.
#[derive(Clone, Debug)]
pub struct ScriptedResults {
    queue: Arc<Mutex<VecDeque<Result<u8, ResultError>>>>,
    fallback: u8,
    draws: Arc<Mutex<usize>>,
}

impl ScriptedResults {
    pub fn new(script: Vec<Result<u8, ResultError>>, fallback: u8) -> Self {
        Self {
            queue: Arc::new(Mutex::new(script.into())),
            fallback,
            draws: Arc::new(Mutex::new(0)),
        }
    }

    /// Always draws `number`.
    pub fn fixed(number: u8) -> Self {
        Self::new(Vec::new(), number)
    }

    /// Numbers to draw in order before falling back to the last one.
    pub fn sequence(numbers: &[u8]) -> Self {
        let fallback = numbers.last().copied().unwrap_or(0);
        Self::new(numbers.iter().copied().map(Ok).collect(), fallback)
    }

    /// How many times the source has been asked for a result.
    pub fn draws(&self) -> usize {
        *lock(&self.draws)
    }
}

impl ResultSource for ScriptedResults {
    fn draw_result(&mut self) -> Result<u8, ResultError> {
        *lock(&self.draws) += 1;
        lock(&self.queue).pop_front().unwrap_or(Ok(self.fallback))
    }
}

/// Records broadcasts, or rejects them all when switched to failing.
#[derive(Clone, Debug, Default)]
pub struct RecordingBroadcast {
    sent: Arc<Mutex<Vec<BetBroadcast>>>,
    failing: Arc<Mutex<bool>>,
}

impl BetBroadcastSink for RecordingBroadcast {
    fn broadcast(&mut self, bet: &BetBroadcast) -> Result<(), SinkError> {
        if *lock(&self.failing) {
            return Err(SinkError::Unavailable("broadcast offline".to_string()));
        }
        lock(&self.sent).push(bet.clone());
        Ok(())
    }
}

#[derive(Clone, Debug, Default)]
pub struct MemoryHistory {
    records: Arc<Mutex<Vec<RoundRecord>>>,
}

impl RoundHistorySink for MemoryHistory {
    fn record(&mut self, record: &RoundRecord) -> Result<(), SinkError> {
        lock(&self.records).push(*record);
        Ok(())
    }

    fn recent(&self, limit: usize) -> Result<Vec<RoundRecord>, SinkError> {
        let records = lock(&self.records);
        let skip = records.len().saturating_sub(limit);
        Ok(records[skip..].to_vec())
    }
}

#[derive(Clone, Debug, Default)]
pub struct MemoryAccounts {
    saved: Arc<Mutex<Vec<PlayerAccount>>>,
}

impl AccountStore for MemoryAccounts {
    fn save(&mut self, account: &PlayerAccount) -> Result<(), SinkError> {
        lock(&self.saved).push(*account);
        Ok(())
    }
}

/// Shared views into the mock collaborators.
#[derive(Clone, Debug)]
pub struct MockHandles {
    pub results: ScriptedResults,
    pub broadcast: RecordingBroadcast,
    pub history: MemoryHistory,
    pub accounts: MemoryAccounts,
}

impl MockHandles {
    pub fn broadcasts(&self) -> Vec<BetBroadcast> {
        lock(&self.broadcast.sent).clone()
    }

    pub fn fail_broadcasts(&self, failing: bool) {
        *lock(&self.broadcast.failing) = failing;
    }

    pub fn history_records(&self) -> Vec<RoundRecord> {
        lock(&self.history.records).clone()
    }

    pub fn seed_history(&self, records: Vec<RoundRecord>) {
        lock(&self.history.records).extend(records);
    }

    pub fn saved_accounts(&self) -> Vec<PlayerAccount> {
        lock(&self.accounts.saved).clone()
    }
}

/// Build boxed collaborators around `results` plus handles to inspect them.
pub fn mock_collaborators(results: ScriptedResults) -> (Collaborators, MockHandles) {
    let handles = MockHandles {
        results,
        broadcast: RecordingBroadcast::default(),
        history: MemoryHistory::default(),
        accounts: MemoryAccounts::default(),
    };
    let collaborators = Collaborators {
        results: Box::new(handles.results.clone()),
        broadcast: Box::new(handles.broadcast.clone()),
        history: Box::new(handles.history.clone()),
        accounts: Box::new(handles.accounts.clone()),
    };
    (collaborators, handles)
}
