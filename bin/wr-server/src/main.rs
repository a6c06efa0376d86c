//! WaRelay Gateway Server
//!
//! Wires the bridge transport, connection manager, dispatch service, and
//! HTTP API into one process. Configuration comes from a TOML file plus
//! `WARELAY_*` environment overrides; see `wr-config`.

use std::sync::Arc;
use std::time::Duration;

use anyhow::Result;
use tokio::{net::TcpListener, signal};
use tower_http::cors::{Any, CorsLayer};
use tower_http::trace::TraceLayer;
use tracing::info;

use wr_config::ConfigLoader;
use wr_gateway::{create_router, AppState, ContactStore, DispatchService, DispatchServiceConfig};
use wr_transport::{BridgeClientConfig, BridgeTransport, ConnectionManager, ConnectionManagerConfig};

#[tokio::main]
async fn main() -> Result<()> {
    // Load .env file if present (for local development)
    let _ = dotenvy::dotenv();

    wr_common::logging::init_logging("wr-server");

    info!("Starting WaRelay Gateway");

    // 1. Configuration
    let config = ConfigLoader::new().load()?;

    // 2. Bridge transport (the only component that talks to the backend)
    let transport = Arc::new(BridgeTransport::new(BridgeClientConfig {
        base_url: config.bridge.base_url.clone(),
        api_secret: (!config.bridge.api_secret.is_empty()).then(|| config.bridge.api_secret.clone()),
        timeout: Duration::from_secs(config.bridge.request_timeout_secs),
        connect_timeout: Duration::from_secs(config.bridge.connect_timeout_secs),
    }));

    // 3. Connection manager owns the session state machine
    let connection = Arc::new(ConnectionManager::new(
        transport.clone(),
        ConnectionManagerConfig {
            poll_interval: Duration::from_secs(config.connection.poll_interval_secs),
            max_backoff: Duration::from_secs(config.connection.max_backoff_secs),
        },
    ));
    let connection_task = connection.spawn();

    // 4. Dispatch service and contact bookkeeping
    let contacts = Arc::new(ContactStore::new());
    let dispatch = Arc::new(DispatchService::new(
        transport.clone(),
        transport.clone(),
        contacts.clone(),
        DispatchServiceConfig {
            country_prefix: config.dispatch.country_prefix.clone(),
            local_number_length: config.dispatch.local_number_length,
            default_interval: Duration::from_millis(config.dispatch.default_interval_ms),
            probe_interval: Duration::from_millis(config.dispatch.probe_interval_ms),
            rate_limit_per_minute: (config.dispatch.rate_limit_per_minute > 0)
                .then_some(config.dispatch.rate_limit_per_minute),
        },
    ));

    // 5. HTTP API
    let app = create_router(AppState {
        dispatch,
        connection: connection.clone(),
        contacts,
    })
    .layer(TraceLayer::new_for_http())
    .layer(
        CorsLayer::new()
            .allow_origin(Any)
            .allow_methods(Any)
            .allow_headers(Any),
    );

    let addr = format!("{}:{}", config.http.host, config.http.port);
    info!(
        addr = %addr,
        bridge = %config.bridge.base_url,
        "WaRelay Gateway listening"
    );

    let listener = TcpListener::bind(&addr).await?;
    axum::serve(listener, app)
        .with_graceful_shutdown(shutdown_signal())
        .await?;

    info!("Shutdown signal received, stopping connection manager");
    connection.shutdown();
    let _ = connection_task.await;

    info!("WaRelay Gateway shutdown complete");
    Ok(())
}

async fn shutdown_signal() {
    let ctrl_c = async {
        signal::ctrl_c()
            .await
            .expect("failed to install Ctrl+C handler");
    };

    #[cfg(unix)]
    let terminate = async {
        signal::unix::signal(signal::unix::SignalKind::terminate())
            .expect("failed to install signal handler")
            .recv()
            .await;
    };

    #[cfg(not(unix))]
    let terminate = std::future::pending::<()>();

    tokio::select! {
        _ = ctrl_c => {},
        _ = terminate => {},
    }
}
