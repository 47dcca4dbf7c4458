use anyhow::Result;
use metrics_api::*;
use std::sync::Arc;
use tracing_subscriber::EnvFilter;
use tracing_subscriber::fmt::time::FormatTime;

#[global_allocator]
static GLOBAL: tikv_jemallocator::Jemalloc = tikv_jemallocator::Jemalloc;

struct LocalTimer;

impl FormatTime for LocalTimer {
    fn format_time(&self, w: &mut tracing_subscriber::fmt::format::Writer<'_>) -> std::fmt::Result {
        write!(
            w,
            "{}",
            chrono::Local::now().format("%Y-%m-%dT%H:%M:%S%.3f%:z")
        )
    }
}

#[tokio::main]
async fn main() -> Result<()> {
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info"));
    tracing_subscriber::fmt()
        .with_timer(LocalTimer)
        .with_env_filter(filter)
        .init();

    let app_config = config::AppConfig::load()?;

    let sqlite = store::SqliteStore::connect(
        &app_config.database.path,
        app_config.database.max_pool_size,
    )
    .await?;
    sqlite.init().await?;
    let store: Arc<dyn store::MetricsStore> = Arc::new(sqlite);

    let (shutdown_tx, shutdown_rx) = tokio::sync::oneshot::channel();
    let retention_handle = retention_worker::spawn(
        store.clone(),
        retention_worker::RetentionWorkerConfig {
            interval_secs: app_config.retention.interval_secs,
            default_retention_days: app_config.database.retention_days,
            vacuum_schedule: app_config.retention.vacuum_schedule.clone(),
            vacuum_interval_secs: app_config.retention.vacuum_interval_secs,
        },
        shutdown_rx,
    );

    let app = routes::app(store, &app_config);
    let addr = format!("{}:{}", app_config.server.host, app_config.server.port);
    let listener = tokio::net::TcpListener::bind(&addr).await?;
    tracing::info!(version = VERSION, "Listening on http://{}", addr);

    axum::serve(listener, app)
        .with_graceful_shutdown(shutdown_signal())
        .await?;

    tracing::info!("Received shutdown signal");
    let _ = shutdown_tx.send(());
    let _ = retention_handle.await;
    Ok(())
}

async fn shutdown_signal() {
    #[cfg(unix)]
    {
        let mut sigterm = match tokio::signal::unix::signal(
            tokio::signal::unix::SignalKind::terminate(),
        ) {
            Ok(s) => s,
            Err(_) => {
                let _ = tokio::signal::ctrl_c().await;
                return;
            }
        };
        tokio::select! {
            _ = tokio::signal::ctrl_c() => {}
            _ = sigterm.recv() => {}
        }
    }
    #[cfg(not(unix))]
    {
        let _ = tokio::signal::ctrl_c().await;
    }
}
