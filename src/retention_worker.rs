// Background worker: prune data points past their retention every interval_secs.
// VACUUM runs on a configurable schedule (cron expression or fixed interval).

use std::str::FromStr;
use std::sync::Arc;
use std::time::Duration;

use tokio::sync::oneshot;
use tracing::{info, instrument, warn};

use crate::dispatch::now_ms;
use crate::store::MetricsStore;

#[derive(Debug, Clone)]
pub struct RetentionWorkerConfig {
    pub interval_secs: u64,
    pub default_retention_days: u32,
    /// Optional cron expression for VACUUM. Uses local time.
    pub vacuum_schedule: Option<String>,
    /// Run VACUUM every N seconds when vacuum_schedule is not set.
    pub vacuum_interval_secs: u64,
}

/// Spawns the retention worker. It exits when `shutdown_rx` fires or its sender is dropped.
pub fn spawn(
    store: Arc<dyn MetricsStore>,
    config: RetentionWorkerConfig,
    shutdown_rx: oneshot::Receiver<()>,
) -> tokio::task::JoinHandle<()> {
    tokio::spawn(async move {
        run(store, config, shutdown_rx).await;
    })
}

#[instrument(skip(store, shutdown_rx), fields(interval_secs = config.interval_secs))]
async fn run(
    store: Arc<dyn MetricsStore>,
    config: RetentionWorkerConfig,
    mut shutdown_rx: oneshot::Receiver<()>,
) {
    let mut prune_interval = tokio::time::interval(Duration::from_secs(config.interval_secs));
    prune_interval.set_missed_tick_behavior(tokio::time::MissedTickBehavior::Skip);

    let (vacuum_tx, mut vacuum_rx) = tokio::sync::mpsc::channel::<()>(1);
    let scheduler = tokio::spawn(vacuum_scheduler(config.clone(), vacuum_tx));

    loop {
        tokio::select! {
            _ = prune_interval.tick() => {
                if let Err(e) = run_one_tick(store.as_ref(), &config).await {
                    warn!(error = %e, "retention tick failed");
                }
            }
            Some(()) = vacuum_rx.recv() => {
                if let Err(e) = store.vacuum().await {
                    warn!(error = %e, "vacuum failed");
                } else {
                    info!("vacuum complete");
                }
            }
            _ = &mut shutdown_rx => {
                info!("retention worker shutting down");
                break;
            }
        }
    }
    scheduler.abort();
}

/// Sends a message on `tx` at each VACUUM time (cron or fixed interval).
async fn vacuum_scheduler(config: RetentionWorkerConfig, tx: tokio::sync::mpsc::Sender<()>) {
    if let Some(ref cron_str) = config.vacuum_schedule {
        let Ok(schedule) = cron::Schedule::from_str(cron_str) else {
            warn!(cron = %cron_str, "invalid vacuum_schedule; VACUUM will not run");
            return;
        };
        loop {
            let now = chrono::Local::now();
            let next = schedule.after(&now).next();
            if let Some(next) = next {
                let delay = (next - now).to_std().unwrap_or(Duration::from_secs(1));
                tokio::time::sleep(delay).await;
                if tx.send(()).await.is_err() {
                    break;
                }
            } else {
                tokio::time::sleep(Duration::from_secs(3600)).await;
            }
        }
    } else {
        let interval = Duration::from_secs(config.vacuum_interval_secs);
        loop {
            tokio::time::sleep(interval).await;
            if tx.send(()).await.is_err() {
                break;
            }
        }
    }
}

/// Runs one pruning pass. Returns the number of data points removed.
pub async fn run_one_tick(
    store: &dyn MetricsStore,
    config: &RetentionWorkerConfig,
) -> anyhow::Result<u64> {
    let removed = store
        .prune_expired(now_ms(), config.default_retention_days)
        .await?;
    if removed > 0 {
        info!(removed_points = removed, "pruned expired data points");
    }
    Ok(removed)
}
