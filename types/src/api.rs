//! Records exchanged with the table's external collaborators.

use serde::{Deserialize, Serialize};

use crate::casino::{Bet, BetError, BetSpec, BetType, BetValue, SpotKey};

/// A bet announced to (or received from) the other players at the table.
///
/// On the wire the geometry is flattened into `betType` and `betValue`
/// (`null` for even-money bets).
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(into = "BetBroadcastWire", try_from = "BetBroadcastWire")]
pub struct BetBroadcast {
    pub round_id: u64,
    pub owner_id: String,
    pub owner_name: String,
    pub bet: BetSpec,
    pub amount: u64,
    pub position: SpotKey,
}

impl BetBroadcast {
    pub fn from_bet(round_id: u64, owner_name: &str, bet: &Bet) -> Self {
        Self {
            round_id,
            owner_id: bet.owner_id.clone(),
            owner_name: owner_name.to_string(),
            bet: bet.spec,
            amount: bet.amount,
            position: bet.position.clone(),
        }
    }

    pub fn bet_type(&self) -> BetType {
        self.bet.bet_type()
    }
}

/// Serialized form of [`BetBroadcast`].
#[derive(Debug, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct BetBroadcastWire {
    round_id: u64,
    owner_id: String,
    owner_name: String,
    bet_type: BetType,
    #[serde(default)]
    bet_value: Option<BetValue>,
    amount: u64,
    position: SpotKey,
}

impl From<BetBroadcast> for BetBroadcastWire {
    fn from(record: BetBroadcast) -> Self {
        Self {
            round_id: record.round_id,
            owner_id: record.owner_id,
            owner_name: record.owner_name,
            bet_type: record.bet.bet_type(),
            bet_value: record.bet.value(),
            amount: record.amount,
            position: record.position,
        }
    }
}

impl TryFrom<BetBroadcastWire> for BetBroadcast {
    type Error = BetError;

    fn try_from(wire: BetBroadcastWire) -> Result<Self, Self::Error> {
        Ok(Self {
            round_id: wire.round_id,
            owner_id: wire.owner_id,
            owner_name: wire.owner_name,
            bet: BetSpec::from_parts(wire.bet_type, wire.bet_value)?,
            amount: wire.amount,
            position: wire.position,
        })
    }
}

/// Remote bets arrive in the same shape they are broadcast in.
pub type RemoteBet = BetBroadcast;

/// Outcome of one completed round, as kept by the history sink.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RoundRecord {
    pub round_id: u64,
    pub winning_number: u8,
}
