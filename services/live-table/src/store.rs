//! Collaborator implementations backing the live table.

use std::collections::VecDeque;
use std::fs;
use std::path::{Path, PathBuf};

use anyhow::Context;
use croupier_execution::{AccountStore, BetBroadcastSink, RoundHistorySink, SinkError};
use croupier_types::casino::{PlayerAccount, HISTORY_LEN};
use croupier_types::{BetBroadcast, RoundRecord};
use tokio::sync::{broadcast, mpsc};
use tokio::task::JoinHandle;
use tracing::{debug, warn};

use crate::messages::OutboundEvent;

/// Keeps the balance in a small JSON file.
#[derive(Clone, Debug)]
pub struct JsonAccountStore {
    path: PathBuf,
}

impl JsonAccountStore {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Read the saved account, or `None` if nothing has been saved yet.
    pub fn load(&self) -> anyhow::Result<Option<PlayerAccount>> {
        if !self.path.exists() {
            return Ok(None);
        }
        let raw = fs::read_to_string(&self.path)
            .with_context(|| format!("failed to read {}", self.path.display()))?;
        let account = serde_json::from_str(&raw)
            .with_context(|| format!("failed to parse {}", self.path.display()))?;
        Ok(Some(account))
    }

    /// Blocking write of the balance.
    pub fn save(&self, account: &PlayerAccount) -> anyhow::Result<()> {
        let raw = serde_json::to_string_pretty(account)?;
        // Write then rename so a crash never leaves a truncated file.
        let tmp = self.path.with_extension("json.tmp");
        fs::write(&tmp, raw).with_context(|| format!("failed to write {}", tmp.display()))?;
        fs::rename(&tmp, &self.path)
            .with_context(|| format!("failed to replace {}", self.path.display()))?;
        Ok(())
    }
}

/// Queues balance writes for a blocking writer task, so settlement never
/// waits on the disk while the table is locked.
#[derive(Clone, Debug)]
pub struct BackgroundAccountStore {
    tx: mpsc::UnboundedSender<PlayerAccount>,
}

impl BackgroundAccountStore {
    /// Start the writer. It exits once every handle to the store is dropped.
    pub fn spawn(store: JsonAccountStore) -> (Self, JoinHandle<()>) {
        let (tx, mut rx) = mpsc::unbounded_channel::<PlayerAccount>();
        let writer = tokio::task::spawn_blocking(move || {
            while let Some(mut account) = rx.blocking_recv() {
                // Only the newest balance matters.
                while let Ok(newer) = rx.try_recv() {
                    account = newer;
                }
                match store.save(&account) {
                    Ok(()) => debug!(cash = account.cash, "account saved"),
                    Err(err) => warn!(?err, "failed to save account"),
                }
            }
        });
        (Self { tx }, writer)
    }
}

impl AccountStore for BackgroundAccountStore {
    fn save(&mut self, account: &PlayerAccount) -> Result<(), SinkError> {
        self.tx
            .send(*account)
            .map_err(|_| SinkError::Unavailable("account writer stopped".to_string()))
    }
}

/// Used when no account file is configured.
#[derive(Clone, Copy, Debug, Default)]
pub struct DiscardAccountStore;

impl AccountStore for DiscardAccountStore {
    fn save(&mut self, _account: &PlayerAccount) -> Result<(), SinkError> {
        Ok(())
    }
}

/// Process-local round history.
#[derive(Clone, Debug)]
pub struct MemoryRoundHistory {
    records: VecDeque<RoundRecord>,
    capacity: usize,
}

impl Default for MemoryRoundHistory {
    fn default() -> Self {
        Self {
            records: VecDeque::with_capacity(HISTORY_LEN),
            capacity: HISTORY_LEN,
        }
    }
}

impl RoundHistorySink for MemoryRoundHistory {
    fn record(&mut self, record: &RoundRecord) -> Result<(), SinkError> {
        if self.records.len() == self.capacity {
            self.records.pop_front();
        }
        self.records.push_back(*record);
        Ok(())
    }

    fn recent(&self, limit: usize) -> Result<Vec<RoundRecord>, SinkError> {
        let skip = self.records.len().saturating_sub(limit);
        Ok(self.records.iter().skip(skip).copied().collect())
    }
}

/// Fans local bets out to every connected socket.
#[derive(Clone, Debug)]
pub struct ChannelBroadcast {
    tx: broadcast::Sender<OutboundEvent>,
}

impl ChannelBroadcast {
    pub fn new(tx: broadcast::Sender<OutboundEvent>) -> Self {
        Self { tx }
    }
}

impl BetBroadcastSink for ChannelBroadcast {
    fn broadcast(&mut self, bet: &BetBroadcast) -> Result<(), SinkError> {
        let event = OutboundEvent::Bet {
            payload: bet.clone(),
        };
        if self.tx.send(event).is_err() {
            debug!("no subscribers for bet broadcast");
        }
        Ok(())
    }
}
