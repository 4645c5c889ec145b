//! Periodic drift loop
//!
//! Ticks every `check_interval`, runs one cycle per tick and never overlaps
//! cycles. The first cycle runs immediately. The period is measured from tick
//! to tick, not from the end of a cycle: a cycle shorter than the interval
//! leaves `check_interval - cycle time` of sleep, and a cycle that overruns
//! pushes the next tick back by a full interval from when it was noticed
//! (`MissedTickBehavior::Delay`), so missed ticks never burst.
//!
//! Shutdown is observed both while waiting for a tick and while a cycle is in
//! flight. An aborted cycle leaves the gate untouched, since it only advances
//! after a completed trigger.

use std::sync::Arc;
use std::time::Duration;

use chrono::Utc;
use tokio::sync::watch;
use tokio::time::MissedTickBehavior;

use super::cooldown::CooldownGate;
use super::monitor::DriftMonitor;
use super::SharedStatus;

pub async fn run(
    monitor: Arc<DriftMonitor>,
    mut gate: CooldownGate,
    check_interval: Duration,
    status: SharedStatus,
    mut shutdown: watch::Receiver<bool>,
) -> CooldownGate {
    tracing::info!("Drift monitor loop started (interval {:?})", check_interval);

    let mut ticker = tokio::time::interval(check_interval);
    ticker.set_missed_tick_behavior(MissedTickBehavior::Delay);

    loop {
        tokio::select! {
            _ = ticker.tick() => {}
            _ = shutdown.changed() => break,
        }
        if *shutdown.borrow() {
            break;
        }

        let now = Utc::now();
        tracing::debug!("Running drift detection check...");

        let report = tokio::select! {
            report = monitor.run_cycle(now, &mut gate) => Some(report),
            _ = shutdown.changed() => None,
        };

        match report {
            Some(report) => status.write().record(&report, &gate, now),
            None => {
                tracing::warn!("Shutdown requested, in-flight drift cycle aborted");
                break;
            }
        }

        tracing::debug!("Sleeping for {:?}...", check_interval);
    }

    tracing::info!("Drift monitor loop stopped");
    gate
}
