use axum::extract::ws::{Message, WebSocket, WebSocketUpgrade};
use axum::extract::State as AxumState;
use axum::response::IntoResponse;
use axum::routing::get;
use axum::Router;
use futures_util::{SinkExt, StreamExt};
use tokio::sync::broadcast::error::RecvError;
use tokio::sync::{broadcast, mpsc};
use tracing::{debug, warn};

use crate::loops::{lock_table, SharedTable};
use crate::messages::{InboundMessage, OutboundEvent, OutboundResponse, TableStateMessage};

#[derive(Clone)]
pub struct AppState {
    pub table: SharedTable,
    pub events: broadcast::Sender<OutboundEvent>,
}

pub fn router(state: AppState) -> Router {
    Router::new()
        .route("/ws", get(ws_handler))
        .route("/healthz", get(healthz))
        .with_state(state)
}

async fn healthz() -> &'static str {
    "ok"
}

async fn ws_handler(
    ws: WebSocketUpgrade,
    AxumState(state): AxumState<AppState>,
) -> impl IntoResponse {
    ws.on_upgrade(|socket| handle_socket(socket, state))
}

async fn handle_socket(socket: WebSocket, state: AppState) {
    let (mut sender, mut receiver) = socket.split();
    let (tx, mut rx) = mpsc::unbounded_channel::<Message>();
    let mut broadcast_rx = state.events.subscribe();

    let write_task = tokio::spawn(async move {
        while let Some(message) = rx.recv().await {
            if sender.send(message).await.is_err() {
                break;
            }
        }
    });

    let broadcast_task = {
        let tx = tx.clone();
        tokio::spawn(async move {
            loop {
                match broadcast_rx.recv().await {
                    Ok(event) => send_json(&tx, &event),
                    Err(RecvError::Lagged(skipped)) => {
                        debug!(skipped, "client lagging, frames dropped");
                    }
                    Err(RecvError::Closed) => break,
                }
            }
        })
    };

    let snapshot = lock_table(&state.table).snapshot();
    send_json(&tx, &OutboundEvent::State { payload: snapshot });

    while let Some(Ok(message)) = receiver.next().await {
        match message {
            Message::Text(text) => match serde_json::from_str::<InboundMessage>(&text) {
                Ok(inbound) => {
                    let outcome = dispatch(&state.table, inbound);
                    if let Some(response) = outcome.response {
                        send_json(&tx, &response);
                    }
                    if let Some(payload) = outcome.state {
                        let _ = state.events.send(OutboundEvent::State { payload });
                    }
                }
                Err(err) => {
                    warn!(?err, "invalid inbound message");
                }
            },
            Message::Close(_) => break,
            _ => {}
        }
    }

    write_task.abort();
    broadcast_task.abort();
}

/// What a command produced: a reply for the sender and, if the table changed, a
/// fresh snapshot for everyone.
#[derive(Debug, Default, PartialEq)]
pub struct Dispatch {
    pub response: Option<OutboundResponse>,
    pub state: Option<TableStateMessage>,
}

pub fn dispatch(table: &SharedTable, inbound: InboundMessage) -> Dispatch {
    let mut table = lock_table(table);
    let (request_id, result) = match inbound {
        InboundMessage::Place {
            request_id,
            bet,
            position,
            amount,
        } => (
            request_id,
            table
                .scheduler_mut()
                .place_bet(bet, position, amount)
                .map(|_| ()),
        ),
        InboundMessage::Undo { request_id } => {
            (request_id, table.scheduler_mut().undo_last().map(|_| ()))
        }
        InboundMessage::Clear { request_id } => {
            (request_id, table.scheduler_mut().clear_bets().map(|_| ()))
        }
        InboundMessage::Repeat { request_id } => {
            (request_id, table.scheduler_mut().repeat_last().map(|_| ()))
        }
        InboundMessage::Double { request_id } => {
            (request_id, table.scheduler_mut().double_bets().map(|_| ()))
        }
        InboundMessage::RemoteBet { request_id, bet } => {
            let merged = table.ingest_remote(&bet);
            return Dispatch {
                response: request_id.map(|request_id| OutboundResponse::Ack { request_id }),
                state: merged.then(|| table.snapshot()),
            };
        }
    };
    match result {
        Ok(()) => Dispatch {
            response: Some(OutboundResponse::Ack { request_id }),
            state: Some(table.snapshot()),
        },
        Err(err) => {
            debug!(%err, "command rejected");
            Dispatch {
                response: Some(OutboundResponse::error(request_id, &err)),
                state: None,
            }
        }
    }
}

fn send_json<T: serde::Serialize>(tx: &mpsc::UnboundedSender<Message>, value: &T) {
    if let Ok(payload) = serde_json::to_string(value) {
        let _ = tx.send(Message::Text(payload));
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::LiveTableConfig;
    use crate::table::LiveTable;
    use croupier_execution::mocks::{mock_collaborators, ScriptedResults};
    use croupier_execution::PhaseConfig;
    use croupier_types::casino::{BetSpec, PlayerAccount, SpotKey};
    use croupier_types::RemoteBet;
    use std::sync::{Arc, Mutex};

    fn shared_table() -> SharedTable {
        let config = LiveTableConfig {
            phases: PhaseConfig::new(1, 1, 1, 1),
            ..LiveTableConfig::default()
        };
        let (collaborators, _) = mock_collaborators(ScriptedResults::fixed(0));
        let table =
            LiveTable::new(&config, "me", "Me", PlayerAccount { cash: 50 }, collaborators).unwrap();
        Arc::new(Mutex::new(table))
    }

    fn parse(raw: &str) -> InboundMessage {
        serde_json::from_str(raw).unwrap()
    }

    #[test]
    fn test_place_then_undo() {
        let table = shared_table();
        let outcome = dispatch(
            &table,
            parse(r#"{"type":"place","requestId":"1","bet":{"type":"STRAIGHT","value":0},"position":"0","amount":20}"#),
        );
        assert_eq!(
            outcome.response,
            Some(OutboundResponse::Ack {
                request_id: "1".to_string()
            })
        );
        assert_eq!(outcome.state.unwrap().total_bet, 20);

        let outcome = dispatch(&table, parse(r#"{"type":"undo","requestId":"2"}"#));
        assert_eq!(outcome.state.unwrap().total_bet, 0);
    }

    #[test]
    fn test_rejected_commands_do_not_publish_state() {
        let table = shared_table();
        let outcome = dispatch(
            &table,
            parse(r#"{"type":"place","requestId":"1","bet":{"type":"RED"},"position":"red","amount":60}"#),
        );
        assert!(outcome.state.is_none());
        match outcome.response {
            Some(OutboundResponse::Error { code, .. }) => assert_eq!(code, "INSUFFICIENT_FUNDS"),
            other => panic!("unexpected response {other:?}"),
        }

        let outcome = dispatch(
            &table,
            parse(r#"{"type":"place","requestId":"2","bet":{"type":"SPLIT","value":[1,5]},"position":"1-5","amount":5}"#),
        );
        match outcome.response {
            Some(OutboundResponse::Error { code, .. }) => assert_eq!(code, "INVALID_BET"),
            other => panic!("unexpected response {other:?}"),
        }
    }

    #[test]
    fn test_double_and_repeat_need_funds() {
        let table = shared_table();
        lock_table(&table)
            .scheduler_mut()
            .place_bet(BetSpec::Odd, SpotKey::new("odd"), 30)
            .unwrap();
        let outcome = dispatch(&table, parse(r#"{"type":"double","requestId":"d"}"#));
        assert!(matches!(
            outcome.response,
            Some(OutboundResponse::Error { .. })
        ));
        assert_eq!(lock_table(&table).scheduler().ledger().total_bet_amount(), 30);

        let outcome = dispatch(&table, parse(r#"{"type":"clear","requestId":"c"}"#));
        assert_eq!(outcome.state.unwrap().total_bet, 0);
    }

    #[test]
    fn test_remote_bets_update_totals_without_ack_by_default() {
        let table = shared_table();
        let bet = RemoteBet {
            round_id: 1,
            owner_id: "p2".to_string(),
            owner_name: "bob".to_string(),
            bet: BetSpec::Column(3),
            amount: 15,
            position: SpotKey::new("column-3"),
        };
        let outcome = dispatch(
            &table,
            InboundMessage::RemoteBet {
                request_id: None,
                bet,
            },
        );
        assert!(outcome.response.is_none());
        assert_eq!(
            outcome.state.unwrap().table_totals.get("COLUMN-column-3"),
            Some(&15)
        );
    }
}
