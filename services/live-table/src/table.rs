use croupier_execution::{Collaborators, RoundEvent, RoundScheduler, SchedulerError};
use croupier_types::casino::{PlayerAccount, RoundPhase};
use croupier_types::RemoteBet;
use tracing::debug;

use crate::bots::BotPlayers;
use crate::config::LiveTableConfig;
use crate::messages::TableStateMessage;

const RECENT_SHOWN: usize = 20;
const HOT_COLD_SHOWN: usize = 5;

/// The local player's table: the round scheduler plus the simulated players.
pub struct LiveTable {
    scheduler: RoundScheduler,
    bots: BotPlayers,
}

impl LiveTable {
    pub fn new(
        config: &LiveTableConfig,
        player_id: &str,
        player_name: &str,
        account: PlayerAccount,
        collaborators: Collaborators,
    ) -> Result<Self, SchedulerError> {
        let scheduler =
            RoundScheduler::new(config.phases, player_id, player_name, account, collaborators)?;
        let mut table = Self {
            scheduler,
            bots: BotPlayers::new(config),
        };
        table.seed_bot_bets();
        Ok(table)
    }

    pub fn scheduler(&self) -> &RoundScheduler {
        &self.scheduler
    }

    pub fn scheduler_mut(&mut self) -> &mut RoundScheduler {
        &mut self.scheduler
    }

    /// Advance the round clock; bots bet as soon as a new round opens.
    pub fn tick(&mut self) -> Vec<RoundEvent> {
        let events = self.scheduler.tick();
        if events
            .iter()
            .any(|event| matches!(event, RoundEvent::RoundStarted { .. }))
        {
            self.seed_bot_bets();
        }
        events
    }

    fn seed_bot_bets(&mut self) {
        if self.bots.is_empty() || self.scheduler.round().phase != RoundPhase::Betting {
            return;
        }
        let round_id = self.scheduler.round().round_id;
        let bets = self.bots.seed_bets(round_id);
        let count = bets.len();
        for bet in &bets {
            self.scheduler.ingest_remote(bet);
        }
        debug!(round_id, count, "bot bets seeded");
    }

    /// Merge a bet announced by another player. Bets for other rounds are dropped.
    pub fn ingest_remote(&mut self, bet: &RemoteBet) -> bool {
        if bet.round_id != self.scheduler.round().round_id {
            debug!(
                round_id = bet.round_id,
                current = self.scheduler.round().round_id,
                "stale remote bet"
            );
            return false;
        }
        self.scheduler.ingest_remote(bet)
    }

    pub fn snapshot(&self) -> TableStateMessage {
        let scheduler = self.scheduler();
        let round = scheduler.round();
        let ledger = scheduler.ledger();
        let account = scheduler.account();
        let history = scheduler.history();
        TableStateMessage {
            round_id: round.round_id,
            phase: round.phase,
            time_left: round.time_left,
            winning_number: round.winning_number,
            voided: round.voided,
            cash: account.cash(),
            available: ledger.available(account.cash()),
            total_bet: ledger.total_bet_amount(),
            my_bets: ledger.bets().to_vec(),
            table_totals: ledger.remote_aggregates().clone(),
            recent_numbers: history.recent_numbers(RECENT_SHOWN),
            hot_numbers: history
                .hot_numbers(HOT_COLD_SHOWN)
                .into_iter()
                .map(|(number, _)| number)
                .collect(),
            cold_numbers: history
                .cold_numbers(HOT_COLD_SHOWN)
                .into_iter()
                .map(|(number, _)| number)
                .collect(),
            color_counts: history.color_counts().into(),
            stats: *account.stats(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::messages::ColorCountsMessage;
    use croupier_execution::mocks::{mock_collaborators, ScriptedResults};
    use croupier_execution::PhaseConfig;
    use croupier_types::casino::{BetSpec, SpotKey};

    fn table(bot_count: usize) -> LiveTable {
        let config = LiveTableConfig {
            phases: PhaseConfig::new(2, 1, 1, 1),
            bot_count,
            ..LiveTableConfig::default()
        };
        let (collaborators, _) = mock_collaborators(ScriptedResults::fixed(14));
        LiveTable::new(&config, "me", "Me", PlayerAccount { cash: 100 }, collaborators).unwrap()
    }

    #[test]
    fn test_bots_bet_every_round() {
        let mut table = table(4);
        assert!(!table.snapshot().table_totals.is_empty());
        for _ in 0..5 {
            table.tick();
        }
        let snapshot = table.snapshot();
        assert_eq!(snapshot.round_id, 2);
        assert!(!snapshot.table_totals.is_empty());
        // Bot stakes never reduce what the player can afford.
        assert_eq!(snapshot.available, 100);
    }

    #[test]
    fn test_stale_remote_bets_are_dropped() {
        let mut table = table(0);
        let mut bet = RemoteBet {
            round_id: 9,
            owner_id: "other".to_string(),
            owner_name: "Other".to_string(),
            bet: BetSpec::Low,
            amount: 5,
            position: SpotKey::new("low"),
        };
        assert!(!table.ingest_remote(&bet));
        bet.round_id = 1;
        assert!(table.ingest_remote(&bet));
        bet.owner_id = "me".to_string();
        assert!(!table.ingest_remote(&bet));
        assert_eq!(table.snapshot().table_totals.get("LOW-low"), Some(&5));
    }

    #[test]
    fn test_snapshot_reflects_ledger_and_settlement() {
        let mut table = table(0);
        table
            .scheduler_mut()
            .place_bet(BetSpec::Street(5), SpotKey::new("street-5"), 10)
            .unwrap();
        let snapshot = table.snapshot();
        assert_eq!(snapshot.total_bet, 10);
        assert_eq!(snapshot.available, 90);
        assert_eq!(snapshot.my_bets.len(), 1);

        for _ in 0..4 {
            table.tick();
        }
        let snapshot = table.snapshot();
        assert_eq!(snapshot.phase, RoundPhase::Payout);
        assert_eq!(snapshot.winning_number, Some(14));
        // Street 5 covers 13..=15 and pays 11:1.
        assert_eq!(snapshot.cash, 210);
        assert_eq!(snapshot.recent_numbers, vec![14]);
        assert_eq!(snapshot.hot_numbers, vec![14]);
        assert_eq!(
            snapshot.color_counts,
            ColorCountsMessage {
                red: 1,
                black: 0,
                green: 0
            }
        );
        assert_eq!(snapshot.stats.rounds_played, 1);
    }
}
