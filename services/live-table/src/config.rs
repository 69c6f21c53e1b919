use std::path::PathBuf;
use std::str::FromStr;
use std::time::Duration;

use clap::Parser;
use croupier_execution::PhaseConfig;
use croupier_types::casino::{
    BETTING_SECS, NO_MORE_BETS_SECS, PAYOUT_SECS, SPINNING_SECS, STARTING_CASH,
};

#[derive(Parser, Debug, Clone)]
#[command(name = "croupier-live-table")]
#[command(about = "Run a shared roulette table over websockets")]
pub struct Args {
    /// Address to listen on
    #[arg(long, env = "LIVE_TABLE_HOST", default_value = "0.0.0.0")]
    pub host: String,

    /// Port to listen on
    #[arg(long, env = "LIVE_TABLE_PORT", default_value_t = 9123)]
    pub port: u16,

    /// Id of the local player (remote echoes with this id are ignored)
    #[arg(long, env = "LIVE_TABLE_PLAYER_ID", default_value = "player-1")]
    pub player_id: String,

    /// Display name attached to broadcast bets
    #[arg(long, env = "LIVE_TABLE_PLAYER_NAME", default_value = "Player")]
    pub player_name: String,

    /// Balance used when no saved account exists
    #[arg(long, default_value_t = STARTING_CASH)]
    pub starting_cash: u64,

    /// JSON file the balance is persisted to
    #[arg(long, env = "LIVE_TABLE_ACCOUNT_FILE")]
    pub account_file: Option<PathBuf>,
}

/// Timing and bot settings read from the environment.
#[derive(Clone, Debug, PartialEq)]
pub struct LiveTableConfig {
    pub phases: PhaseConfig,
    pub tick_ms: u64,
    pub frame_ms: u64,
    pub bot_count: usize,
    pub bot_seed: u64,
    pub bot_bet_min: u64,
    pub bot_bet_max: u64,
    pub bot_bets_per_round_min: u8,
    pub bot_bets_per_round_max: u8,
}

impl Default for LiveTableConfig {
    fn default() -> Self {
        Self::from_lookup(|_| None)
    }
}

impl LiveTableConfig {
    pub fn from_env() -> Self {
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    /// Build from any key lookup; missing or unparsable values fall back to defaults.
    pub fn from_lookup(lookup: impl Fn(&str) -> Option<String>) -> Self {
        let read = |key: &str, fallback: u64| read_value(&lookup, key, fallback);
        Self {
            phases: PhaseConfig::new(
                read("LIVE_TABLE_BETTING_SECS", BETTING_SECS),
                read("LIVE_TABLE_NO_MORE_BETS_SECS", NO_MORE_BETS_SECS),
                read("LIVE_TABLE_SPINNING_SECS", SPINNING_SECS),
                read("LIVE_TABLE_PAYOUT_SECS", PAYOUT_SECS),
            ),
            tick_ms: read("LIVE_TABLE_TICK_MS", 1_000),
            frame_ms: read("LIVE_TABLE_FRAME_MS", 16),
            bot_count: read_value(&lookup, "LIVE_TABLE_BOT_COUNT", 0),
            bot_seed: read("LIVE_TABLE_BOT_SEED", 42),
            bot_bet_min: read("LIVE_TABLE_BOT_BET_MIN", 5),
            bot_bet_max: read("LIVE_TABLE_BOT_BET_MAX", 100),
            bot_bets_per_round_min: read_value(&lookup, "LIVE_TABLE_BOT_BETS_MIN", 1),
            bot_bets_per_round_max: read_value(&lookup, "LIVE_TABLE_BOT_BETS_MAX", 3),
        }
    }

    pub fn validate(&self) -> Result<(), &'static str> {
        self.phases.validate()?;
        if self.tick_ms == 0 {
            return Err("tick_ms must be greater than zero");
        }
        if self.frame_ms == 0 {
            return Err("frame_ms must be greater than zero");
        }
        if self.bot_bet_min == 0 || self.bot_bet_min > self.bot_bet_max {
            return Err("bot bet range must be non-empty and positive");
        }
        Ok(())
    }

    pub fn tick_interval(&self) -> Duration {
        Duration::from_millis(self.tick_ms)
    }

    pub fn frame_interval(&self) -> Duration {
        Duration::from_millis(self.frame_ms)
    }
}

fn read_value<T: FromStr>(lookup: &impl Fn(&str) -> Option<String>, key: &str, fallback: T) -> T {
    lookup(key)
        .and_then(|raw| raw.trim().parse::<T>().ok())
        .unwrap_or(fallback)
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashMap;

    fn lookup(pairs: &[(&str, &str)]) -> impl Fn(&str) -> Option<String> {
        let map: HashMap<String, String> = pairs
            .iter()
            .map(|(k, v)| (k.to_string(), v.to_string()))
            .collect();
        move |key| map.get(key).cloned()
    }

    #[test]
    fn test_defaults_match_round_timings() {
        let config = LiveTableConfig::default();
        assert_eq!(config.phases, PhaseConfig::default());
        assert_eq!(config.tick_interval(), Duration::from_secs(1));
        assert_eq!(config.bot_count, 0);
        assert!(config.validate().is_ok());
    }

    #[test]
    fn test_env_overrides_and_fallbacks() {
        let config = LiveTableConfig::from_lookup(lookup(&[
            ("LIVE_TABLE_BETTING_SECS", "10"),
            ("LIVE_TABLE_SPINNING_SECS", "not-a-number"),
            ("LIVE_TABLE_TICK_MS", " 250 "),
            ("LIVE_TABLE_BOT_COUNT", "3"),
        ]));
        assert_eq!(config.phases.betting_secs, 10);
        assert_eq!(config.phases.spinning_secs, SPINNING_SECS);
        assert_eq!(config.tick_ms, 250);
        assert_eq!(config.bot_count, 3);
    }

    #[test]
    fn test_zero_durations_are_rejected() {
        let config = LiveTableConfig::from_lookup(lookup(&[("LIVE_TABLE_PAYOUT_SECS", "0")]));
        assert!(config.validate().is_err());
        let config = LiveTableConfig::from_lookup(lookup(&[("LIVE_TABLE_FRAME_MS", "0")]));
        assert!(config.validate().is_err());
    }

    #[test]
    fn test_args_parse_with_defaults() {
        let args = Args::try_parse_from(["croupier-live-table", "--player-name", "alice"]).unwrap();
        assert_eq!(args.player_name, "alice");
        assert_eq!(args.starting_cash, STARTING_CASH);
    }
}
