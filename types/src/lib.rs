pub mod api;
pub mod casino;

pub use api::{BetBroadcast, RemoteBet, RoundRecord};
