use std::net::SocketAddr;
use std::sync::{Arc, Mutex};
use std::time::Duration;

use anyhow::Context;
use clap::Parser;
use croupier_execution::{AccountStore, Collaborators, RandomResultSource, WheelAnimator};
use croupier_types::casino::PlayerAccount;
use tokio::sync::{broadcast, mpsc, watch};
use tracing::{info, warn};
use tracing_subscriber::EnvFilter;

mod bots;
mod config;
mod loops;
mod messages;
mod store;
mod table;
mod ws;

use config::{Args, LiveTableConfig};
use messages::OutboundEvent;
use store::{
    BackgroundAccountStore, ChannelBroadcast, DiscardAccountStore, JsonAccountStore,
    MemoryRoundHistory,
};
use table::LiveTable;

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")))
        .init();

    let args = Args::parse();
    let config = LiveTableConfig::from_env();
    config
        .validate()
        .map_err(anyhow::Error::msg)
        .context("invalid live table config")?;

    let (account, accounts, account_writer): (PlayerAccount, Box<dyn AccountStore>, _) =
        match &args.account_file {
            Some(path) => {
                let store = JsonAccountStore::new(path);
                let account = store
                    .load()
                    .context("failed to load account")?
                    .unwrap_or(PlayerAccount {
                        cash: args.starting_cash,
                    });
                info!(path = %store.path().display(), cash = account.cash, "account loaded");
                let (store, writer) = BackgroundAccountStore::spawn(store);
                (account, Box::new(store), Some(writer))
            }
            None => (
                PlayerAccount {
                    cash: args.starting_cash,
                },
                Box::new(DiscardAccountStore),
                None,
            ),
        };

    let (events, _) = broadcast::channel::<OutboundEvent>(1024);
    let collaborators = Collaborators {
        results: Box::new(RandomResultSource::from_entropy()),
        broadcast: Box::new(ChannelBroadcast::new(events.clone())),
        history: Box::new(MemoryRoundHistory::default()),
        accounts,
    };
    let table = LiveTable::new(
        &config,
        &args.player_id,
        &args.player_name,
        account,
        collaborators,
    )
    .context("failed to create table")?;
    let table = Arc::new(Mutex::new(table));

    let (shutdown_tx, shutdown_rx) = watch::channel(false);
    let (wheel_tx, wheel_rx) = mpsc::unbounded_channel();

    // Tick loop
    let tick_handle = tokio::spawn(loops::run_tick_loop(
        table.clone(),
        config.tick_interval(),
        events.clone(),
        wheel_tx,
        shutdown_rx.clone(),
    ));

    // Frame loop
    let frame_handle = tokio::spawn(loops::run_frame_loop(
        WheelAnimator::from_entropy(),
        config.frame_interval(),
        config.frame_interval().as_secs_f64(),
        events.clone(),
        wheel_rx,
        shutdown_rx,
    ));

    let app = ws::router(ws::AppState { table, events });

    let addr: SocketAddr = format!("{}:{}", args.host, args.port)
        .parse()
        .context("invalid listen addr")?;
    let listener = tokio::net::TcpListener::bind(addr)
        .await
        .with_context(|| format!("failed to bind {addr}"))?;
    info!(%addr, player_id = %args.player_id, "live table service listening");

    axum::serve(listener, app)
        .with_graceful_shutdown(shutdown_signal())
        .await
        .context("server error")?;

    let _ = shutdown_tx.send(true);
    tick_handle.await.context("tick loop panicked")?;
    frame_handle.await.context("frame loop panicked")?;
    if let Some(writer) = account_writer {
        // Open sockets can keep the writer alive.
        match tokio::time::timeout(Duration::from_secs(2), writer).await {
            Ok(result) => result.context("account writer panicked")?,
            Err(_) => warn!("account writer still open at shutdown"),
        }
    }
    info!("live table stopped");
    Ok(())
}

async fn shutdown_signal() {
    if let Err(err) = tokio::signal::ctrl_c().await {
        warn!(?err, "failed to listen for ctrl-c");
        std::future::pending::<()>().await;
    }
    info!("shutdown requested");
}
