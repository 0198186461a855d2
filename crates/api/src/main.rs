//! API server entry point.

use tokio::signal;
use tokio::sync::watch;
use tracing_subscriber::EnvFilter;
use tracing_subscriber::layer::SubscriberExt;
use tracing_subscriber::util::SubscriberInitExt;

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

#[tokio::main]
async fn main() {
    // 1. Initialize tracing
    tracing_subscriber::registry()
        .with(EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")))
        .with(tracing_subscriber::fmt::layer())
        .init();

    // 2. Install Prometheus metrics recorder
    let prometheus_builder = metrics_exporter_prometheus::PrometheusBuilder::new();
    let metrics_handle = prometheus_builder
        .install_recorder()
        .expect("failed to install Prometheus recorder");

    let config = api::config::Config::from_env();

    // 3. Create application state and the projection consumer
    let (state, bus, consumer) = api::create_default_state();

    // 4. Spawn the consumer as its own long-running task
    let (shutdown_tx, shutdown_rx) = watch::channel(false);
    let consumer_group = config.consumer_group.clone();
    let consumer_handle = tokio::spawn(async move {
        consumer.run(&bus, &consumer_group, shutdown_rx).await
    });

    // 5. Build the application
    let app = api::create_app(state, metrics_handle);

    // 6. Start server
    let addr = config.addr();
    tracing::info!(%addr, "starting API server");

    let listener = tokio::net::TcpListener::bind(&addr)
        .await
        .expect("failed to bind address");
    axum::serve(listener, app)
        .with_graceful_shutdown(shutdown_signal())
        .await
        .expect("server error");

    // 7. Stop the consumer and wait for it to drain
    shutdown_tx.send(true).ok();
    match consumer_handle.await {
        Ok(Ok(())) => tracing::info!("projection consumer stopped cleanly"),
        Ok(Err(e)) => tracing::error!(error = %e, "projection consumer terminated with error"),
        Err(e) => tracing::error!(error = %e, "projection consumer task panicked"),
    }

    tracing::info!("server shut down gracefully");
}
