//! Simulated remote players.
//!
//! Bots never touch the local ledger directly; their bets arrive through the
//! same remote-bet path a real player's broadcast would.

use croupier_types::casino::{BetSpec, BetType, SpotKey, LAYOUT_ROWS, MAX_NUMBER};
use croupier_types::RemoteBet;
use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};

use crate::config::LiveTableConfig;

#[derive(Debug)]
pub struct BotPlayers {
    ids: Vec<String>,
    rng: StdRng,
    bet_min: u64,
    bet_max: u64,
    bets_per_round: (u8, u8),
}

impl BotPlayers {
    pub fn new(config: &LiveTableConfig) -> Self {
        Self {
            ids: (0..config.bot_count).map(|idx| format!("bot-{idx:03}")).collect(),
            rng: StdRng::seed_from_u64(config.bot_seed),
            bet_min: config.bot_bet_min,
            bet_max: config.bot_bet_max,
            bets_per_round: (config.bot_bets_per_round_min, config.bot_bets_per_round_max),
        }
    }

    pub fn is_empty(&self) -> bool {
        self.ids.is_empty()
    }

    /// Bets every bot places at the start of a betting phase.
    pub fn seed_bets(&mut self, round_id: u64) -> Vec<RemoteBet> {
        let (min, max) = self.bets_per_round;
        let ids = self.ids.clone();
        let mut bets = Vec::new();
        for bot_id in ids {
            let count = if min >= max {
                min
            } else {
                self.rng.gen_range(min..=max)
            };
            for _ in 0..count {
                let bet = self.random_spec();
                let amount = if self.bet_min >= self.bet_max {
                    self.bet_min
                } else {
                    self.rng.gen_range(self.bet_min..=self.bet_max)
                };
                bets.push(RemoteBet {
                    round_id,
                    owner_id: bot_id.clone(),
                    owner_name: bot_id.clone(),
                    bet,
                    amount,
                    position: position_for(&bet),
                });
            }
        }
        bets
    }

    fn random_spec(&mut self) -> BetSpec {
        let bet_type = BetType::ALL[self.rng.gen_range(0..BetType::ALL.len())];
        match bet_type {
            BetType::Straight => BetSpec::Straight(self.rng.gen_range(0..=MAX_NUMBER)),
            // Vertical neighbours are always adjacent.
            BetType::Split => {
                let top = self.rng.gen_range(1..=MAX_NUMBER - 3);
                BetSpec::Split([top, top + 3])
            }
            BetType::Street => BetSpec::Street(self.rng.gen_range(1..=LAYOUT_ROWS)),
            BetType::Corner => {
                let mut top_left = self.rng.gen_range(1..=MAX_NUMBER - 4);
                if top_left % 3 == 0 {
                    top_left -= 1;
                }
                BetSpec::Corner([top_left, top_left + 1, top_left + 3, top_left + 4])
            }
            BetType::Line => BetSpec::Line(self.rng.gen_range(1..LAYOUT_ROWS)),
            BetType::Dozen => BetSpec::Dozen(self.rng.gen_range(1..=3)),
            BetType::Column => BetSpec::Column(self.rng.gen_range(1..=3)),
            BetType::Red => BetSpec::Red,
            BetType::Black => BetSpec::Black,
            BetType::Even => BetSpec::Even,
            BetType::Odd => BetSpec::Odd,
            BetType::Low => BetSpec::Low,
            BetType::High => BetSpec::High,
        }
    }
}

/// Canonical table position for a bet geometry.
pub fn position_for(spec: &BetSpec) -> SpotKey {
    let join = |numbers: &[u8]| {
        numbers
            .iter()
            .map(u8::to_string)
            .collect::<Vec<_>>()
            .join("-")
    };
    let key = match spec {
        BetSpec::Straight(number) => number.to_string(),
        BetSpec::Split(numbers) => join(numbers),
        BetSpec::Corner(numbers) => join(numbers),
        BetSpec::Street(row) => format!("street-{row}"),
        BetSpec::Line(row) => format!("line-{row}"),
        BetSpec::Dozen(index) => format!("dozen-{index}"),
        BetSpec::Column(index) => format!("column-{index}"),
        other => other.bet_type().as_str().to_ascii_lowercase(),
    };
    SpotKey::new(key)
}
