//! Packaging worker entry point.

use std::sync::Arc;

use event_store::{EventStore, InMemoryEventStore, PostgresEventStore};
use packaging::{ChannelDispatcher, Config, PackagingWorker, TotalSweep, telemetry};
use tokio::signal;
use tokio::sync::watch;

/// Waits for a shutdown signal (SIGINT or SIGTERM).
async fn shutdown_signal() {
    let ctrl_c = async {
        signal::ctrl_c()
            .await
            .expect("failed to install SIGINT handler");
    };

    #[cfg(unix)]
    let terminate = async {
        signal::unix::signal(signal::unix::SignalKind::terminate())
            .expect("failed to install SIGTERM handler")
            .recv()
            .await;
    };

    #[cfg(not(unix))]
    let terminate = std::future::pending::<()>();

    tokio::select! {
        () = ctrl_c => {
            tracing::info!("received SIGINT, starting graceful shutdown");
        }
        () = terminate => {
            tracing::info!("received SIGTERM, starting graceful shutdown");
        }
    }
}

async fn run<S>(store: S, config: Config)
where
    S: EventStore + Clone + 'static,
{
    let (dispatcher, receiver) = ChannelDispatcher::channel();
    let dispatcher = Arc::new(dispatcher);
    let worker = PackagingWorker::new(store.clone(), dispatcher.clone(), &config);
    let sweep = TotalSweep::new(store, dispatcher, &config);

    let (stop, mut stopped) = watch::channel(());
    let period = config.sweep_interval;
    let sweeper = tokio::spawn(async move {
        sweep
            .run_every(period, async move {
                let _ = stopped.changed().await;
            })
            .await;
    });

    worker.run(receiver, shutdown_signal()).await;

    let _ = stop.send(());
    if let Err(err) = sweeper.await {
        tracing::error!(error = %err, "total sweep task failed");
    }
    tracing::info!("worker shut down gracefully");
}

#[tokio::main]
async fn main() {
    // 1. Load configuration and initialize tracing
    let config = Config::from_env();
    telemetry::init(&config);
    tracing::info!(
        transport = %config.package_transport,
        delivery_type = %config.delivery_type,
        sweep_interval_secs = config.sweep_interval.as_secs(),
        "configuration loaded"
    );

    // 2. Install Prometheus metrics exporter
    metrics_exporter_prometheus::PrometheusBuilder::new()
        .with_http_listener(config.metrics_addr)
        .install()
        .expect("failed to install Prometheus exporter");
    tracing::info!(addr = %config.metrics_addr, "metrics listener started");

    // 3. Select the event store and run
    match config.database_url.clone() {
        Some(url) => {
            let store = PostgresEventStore::connect(&url)
                .await
                .expect("failed to connect to database or run migrations");
            tracing::info!("using PostgreSQL event store");
            run(store, config).await;
        }
        None => {
            tracing::warn!("DATABASE_URL not set, using in-memory event store");
            run(InMemoryEventStore::new(), config).await;
        }
    }
}
