use std::collections::BTreeMap;

use croupier_execution::{ColorCounts, LedgerError, RoundEvent, Settlement};
use croupier_types::casino::{Bet, BetSpec, RoundPhase, SessionStats, SpotKey, WheelSimState};
use croupier_types::{BetBroadcast, RemoteBet};
use serde::{Deserialize, Serialize};

#[derive(Debug, Deserialize)]
#[serde(tag = "type")]
pub enum InboundMessage {
    #[serde(rename = "place")]
    Place {
        #[serde(rename = "requestId")]
        request_id: String,
        bet: BetSpec,
        position: SpotKey,
        amount: u64,
    },
    #[serde(rename = "undo")]
    Undo {
        #[serde(rename = "requestId")]
        request_id: String,
    },
    #[serde(rename = "clear")]
    Clear {
        #[serde(rename = "requestId")]
        request_id: String,
    },
    #[serde(rename = "repeat")]
    Repeat {
        #[serde(rename = "requestId")]
        request_id: String,
    },
    #[serde(rename = "double")]
    Double {
        #[serde(rename = "requestId")]
        request_id: String,
    },
    #[serde(rename = "remoteBet")]
    RemoteBet {
        #[serde(rename = "requestId")]
        request_id: Option<String>,
        bet: RemoteBet,
    },
}

#[derive(Debug, Serialize, PartialEq, Eq)]
#[serde(tag = "type")]
pub enum OutboundResponse {
    #[serde(rename = "ack")]
    Ack {
        #[serde(rename = "requestId")]
        request_id: String,
    },
    #[serde(rename = "error")]
    Error {
        #[serde(rename = "requestId")]
        request_id: String,
        code: String,
        message: String,
    },
}

impl OutboundResponse {
    pub fn error(request_id: String, err: &LedgerError) -> Self {
        let code = match err {
            LedgerError::InsufficientFunds { .. } => "INSUFFICIENT_FUNDS",
            LedgerError::InvalidPhase => "BETTING_CLOSED",
            LedgerError::InvalidAmount => "INVALID_AMOUNT",
            LedgerError::InvalidBet(_) => "INVALID_BET",
            LedgerError::Overflow => "OVERFLOW",
        };
        OutboundResponse::Error {
            request_id,
            code: code.to_string(),
            message: err.to_string(),
        }
    }
}

#[derive(Clone, Debug, Serialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct TableStateMessage {
    pub round_id: u64,
    pub phase: RoundPhase,
    pub time_left: u64,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub winning_number: Option<u8>,
    pub voided: bool,
    pub cash: u64,
    pub available: u64,
    pub total_bet: u64,
    pub my_bets: Vec<Bet>,
    pub table_totals: BTreeMap<String, u64>,
    pub recent_numbers: Vec<u8>,
    pub hot_numbers: Vec<u8>,
    pub cold_numbers: Vec<u8>,
    pub color_counts: ColorCountsMessage,
    pub stats: SessionStats,
}

#[derive(Clone, Copy, Debug, Default, Serialize, PartialEq, Eq)]
pub struct ColorCountsMessage {
    pub red: usize,
    pub black: usize,
    pub green: usize,
}

impl From<ColorCounts> for ColorCountsMessage {
    fn from(counts: ColorCounts) -> Self {
        Self {
            red: counts.red,
            black: counts.black,
            green: counts.green,
        }
    }
}

#[derive(Clone, Debug, Serialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct SettlementMessage {
    pub round_id: u64,
    pub winning_number: u8,
    pub total_bet: u64,
    pub total_winnings: u64,
    pub net: i64,
    pub cash: u64,
    pub winning_bets: Vec<u64>,
}

impl From<&Settlement> for SettlementMessage {
    fn from(settlement: &Settlement) -> Self {
        Self {
            round_id: settlement.round_id,
            winning_number: settlement.winning_number,
            total_bet: settlement.total_bet,
            total_winnings: settlement.total_winnings,
            net: settlement.net,
            cash: settlement.cash,
            winning_bets: settlement
                .outcomes
                .iter()
                .filter(|outcome| outcome.won)
                .map(|outcome| outcome.bet.id)
                .collect(),
        }
    }
}

/// Everything pushed to connected clients.
#[derive(Clone, Debug, Serialize, PartialEq)]
#[serde(tag = "type", rename_all = "camelCase")]
pub enum OutboundEvent {
    State {
        payload: TableStateMessage,
    },
    Phase {
        #[serde(rename = "roundId")]
        round_id: u64,
        phase: RoundPhase,
        #[serde(rename = "timeLeft")]
        time_left: u64,
    },
    Voided {
        #[serde(rename = "roundId")]
        round_id: u64,
        reason: String,
    },
    Settled {
        payload: SettlementMessage,
    },
    Bet {
        payload: BetBroadcast,
    },
    Frame {
        pocket: u8,
        state: WheelSimState,
    },
    WheelSettled {
        #[serde(rename = "roundId")]
        round_id: u64,
        number: u8,
    },
}

impl OutboundEvent {
    /// Client-facing view of a scheduler event. Spin handoffs stay internal.
    pub fn from_round_event(event: &RoundEvent) -> Option<Self> {
        match event {
            RoundEvent::PhaseChanged {
                round_id,
                phase,
                time_left,
            } => Some(OutboundEvent::Phase {
                round_id: *round_id,
                phase: *phase,
                time_left: *time_left,
            }),
            RoundEvent::RoundVoided { round_id, reason } => Some(OutboundEvent::Voided {
                round_id: *round_id,
                reason: reason.clone(),
            }),
            RoundEvent::Settled(settlement) => Some(OutboundEvent::Settled {
                payload: settlement.into(),
            }),
            RoundEvent::SpinStarted { .. } | RoundEvent::RoundStarted { .. } => None,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_place_message_parses() {
        let raw = r#"{"type":"place","requestId":"r1","bet":{"type":"SPLIT","value":[0,2]},"position":"0-2","amount":25}"#;
        match serde_json::from_str::<InboundMessage>(raw).unwrap() {
            InboundMessage::Place {
                request_id,
                bet,
                position,
                amount,
            } => {
                assert_eq!(request_id, "r1");
                assert_eq!(bet, BetSpec::Split([0, 2]));
                assert_eq!(position, SpotKey::new("0-2"));
                assert_eq!(amount, 25);
            }
            other => panic!("unexpected message {other:?}"),
        }
    }

    #[test]
    fn test_remote_bet_message_parses() {
        let raw = r#"{"type":"remoteBet","bet":{"roundId":3,"ownerId":"p2","ownerName":"bob","betType":"ODD","betValue":null,"amount":5,"position":"odd"}}"#;
        match serde_json::from_str::<InboundMessage>(raw).unwrap() {
            InboundMessage::RemoteBet { request_id, bet } => {
                assert!(request_id.is_none());
                assert_eq!(bet.owner_id, "p2");
                assert_eq!(bet.bet, BetSpec::Odd);
            }
            other => panic!("unexpected message {other:?}"),
        }
    }

    #[test]
    fn test_ledger_errors_map_to_codes() {
        let response = OutboundResponse::error(
            "r9".to_string(),
            &LedgerError::InsufficientFunds {
                requested: 50,
                available: 10,
            },
        );
        let json = serde_json::to_value(&response).unwrap();
        assert_eq!(json["type"], "error");
        assert_eq!(json["requestId"], "r9");
        assert_eq!(json["code"], "INSUFFICIENT_FUNDS");

        let response = OutboundResponse::error("r10".to_string(), &LedgerError::InvalidPhase);
        let json = serde_json::to_value(&response).unwrap();
        assert_eq!(json["code"], "BETTING_CLOSED");
    }

    #[test]
    fn test_phase_event_is_tagged() {
        let event = OutboundEvent::from_round_event(&RoundEvent::PhaseChanged {
            round_id: 7,
            phase: RoundPhase::NoMoreBets,
            time_left: 5,
        })
        .unwrap();
        let json = serde_json::to_value(&event).unwrap();
        assert_eq!(json["type"], "phase");
        assert_eq!(json["roundId"], 7);
        assert_eq!(json["phase"], "no_more_bets");
        assert_eq!(json["timeLeft"], 5);

        assert!(OutboundEvent::from_round_event(&RoundEvent::SpinStarted {
            round_id: 7,
            winning_number: 3
        })
        .is_none());
    }
}
