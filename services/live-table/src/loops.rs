//! The two clocks of the table.
//!
//! The tick loop drives the round scheduler once per `tick` and publishes what it
//! emits. The frame loop steps the wheel animation. The only thing passed from
//! one to the other is a [`WheelCommand`]: the winning number when spinning
//! starts, and a reset when the next round opens.

use std::sync::{Arc, Mutex, MutexGuard};
use std::time::Duration;

use croupier_execution::wheel::MAX_STEP_SECS;
use croupier_execution::{RoundEvent, WheelAnimator};
use rand::Rng;
use tokio::sync::{broadcast, mpsc, watch};
use tokio::time::{self, MissedTickBehavior};
use tracing::{info, warn};

use crate::messages::OutboundEvent;
use crate::table::LiveTable;

pub type SharedTable = Arc<Mutex<LiveTable>>;

pub fn lock_table(table: &SharedTable) -> MutexGuard<'_, LiveTable> {
    table.lock().unwrap_or_else(|poisoned| poisoned.into_inner())
}

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum WheelCommand {
    Start { round_id: u64, target: u8 },
    Reset,
}

pub async fn run_tick_loop(
    table: SharedTable,
    period: Duration,
    events: broadcast::Sender<OutboundEvent>,
    wheel: mpsc::UnboundedSender<WheelCommand>,
    mut shutdown: watch::Receiver<bool>,
) {
    let mut interval = time::interval(period);
    // The first tick completes immediately; the first second starts now.
    interval.tick().await;
    loop {
        tokio::select! {
            biased;
            _ = shutdown.changed() => break,
            _ = interval.tick() => {}
        }

        let (round_events, snapshot) = {
            let mut table = lock_table(&table);
            let round_events = table.tick();
            (round_events, table.snapshot())
        };

        for event in &round_events {
            let command = match event {
                RoundEvent::SpinStarted {
                    round_id,
                    winning_number,
                } => Some(WheelCommand::Start {
                    round_id: *round_id,
                    target: *winning_number,
                }),
                RoundEvent::RoundStarted { .. } => Some(WheelCommand::Reset),
                _ => None,
            };
            if let Some(command) = command {
                if wheel.send(command).is_err() {
                    warn!(?command, "frame loop is gone");
                }
            }
            if let Some(outbound) = OutboundEvent::from_round_event(event) {
                let _ = events.send(outbound);
            }
        }
        let _ = events.send(OutboundEvent::State { payload: snapshot });
    }
    info!("tick loop stopped");
}

/// Simulated seconds owed for `elapsed` wall time, where each `period` is worth
/// `dt`. Skipped frames are made up instead of slowing the wheel down.
pub fn frame_step(elapsed: Duration, period: Duration, dt: f64) -> f64 {
    if period.is_zero() {
        return 0.0;
    }
    dt * elapsed.as_secs_f64() / period.as_secs_f64()
}

/// Steps the wheel once per `period`, advancing it `dt` simulated seconds for
/// every period of wall time that has passed.
pub async fn run_frame_loop<R: Rng + Send>(
    mut wheel: WheelAnimator<R>,
    period: Duration,
    dt: f64,
    events: broadcast::Sender<OutboundEvent>,
    mut commands: mpsc::UnboundedReceiver<WheelCommand>,
    mut shutdown: watch::Receiver<bool>,
) {
    let mut interval = time::interval(period);
    interval.set_missed_tick_behavior(MissedTickBehavior::Skip);
    let mut round_id = 0;
    let mut last = interval.tick().await;
    loop {
        let now = tokio::select! {
            biased;
            _ = shutdown.changed() => break,
            now = interval.tick() => now,
        };
        let mut owed = frame_step(now.saturating_duration_since(last), period, dt);
        last = now;

        while let Ok(command) = commands.try_recv() {
            match command {
                WheelCommand::Start { round_id: id, target } => {
                    round_id = id;
                    if let Err(err) = wheel.start(target) {
                        warn!(?err, round_id, "wheel did not start");
                    }
                }
                WheelCommand::Reset => wheel.reset(),
            }
        }

        let moving = wheel.phase().is_moving();
        while owed > 0.0 {
            let slice = owed.min(MAX_STEP_SECS);
            owed -= slice;
            if let Some(number) = wheel.advance(slice) {
                info!(round_id, number, "ball settled");
                let _ = events.send(OutboundEvent::WheelSettled { round_id, number });
            }
        }
        if moving {
            let _ = events.send(OutboundEvent::Frame {
                pocket: wheel.pocket_under_ball(),
                state: *wheel.state(),
            });
        }
    }
    info!("frame loop stopped");
}
