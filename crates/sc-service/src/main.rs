//! Society management service.
//!
//! Entry point: loads configuration, connects to Postgres, runs migrations
//! and serves the HTTP API.

use sc_service::config::Config;
use sc_service::observability::metrics::init_metrics_recorder;
use sc_service::repositories::{
    PgActivityLog, PgBuildingDirectory, PgFundLedger, PgMeetingRepository, PgUserDirectory,
};
use sc_service::routes::{self, AppState};
use sc_service::session::MemorySessionStore;
use sc_service::tasks::{session_purge::DEFAULT_PURGE_INTERVAL_SECONDS, start_session_purge};
use std::net::SocketAddr;
use std::sync::Arc;
use std::time::Duration;
use tokio::signal;
use tokio_util::sync::CancellationToken;
use tracing::{error, info};
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    // Initialize tracing
    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "sc_service=debug,tower_http=debug".into()),
        )
        .with(tracing_subscriber::fmt::layer())
        .init();

    info!("Starting society service");

    // Load configuration
    let config = Config::from_env().map_err(|e| {
        error!("Failed to load configuration: {}", e);
        e
    })?;

    info!(
        bind_address = %config.bind_address,
        status_policy = ?config.status_policy,
        session_rotation_seconds = config.session_rotation.num_seconds(),
        "Configuration loaded successfully"
    );

    // Prometheus recorder must be installed before any metric is touched
    let metrics_handle = init_metrics_recorder().map_err(|e| {
        error!("Failed to initialize metrics recorder: {}", e);
        e
    })?;

    info!("Connecting to database...");
    let db_pool = sqlx::postgres::PgPoolOptions::new()
        .max_connections(10)
        .acquire_timeout(Duration::from_secs(5))
        .connect(&config.database_url)
        .await
        .map_err(|e| {
            error!("Failed to connect to database: {}", e);
            e
        })?;

    sqlx::migrate!("../../migrations")
        .run(&db_pool)
        .await
        .map_err(|e| {
            error!("Failed to run migrations: {}", e);
            e
        })?;

    info!("Database connection established");

    let sessions = Arc::new(MemorySessionStore::new(config.session_idle_timeout));
    let cancel_token = CancellationToken::new();
    let purge_task = tokio::spawn(start_session_purge(
        sessions.clone(),
        Duration::from_secs(DEFAULT_PURGE_INTERVAL_SECONDS),
        cancel_token.clone(),
    ));

    // Parse bind address before moving config
    let bind_address = config.bind_address.clone();

    let state = Arc::new(AppState {
        config,
        sessions,
        users: Arc::new(PgUserDirectory::new(db_pool.clone())),
        buildings: Arc::new(PgBuildingDirectory::new(db_pool.clone())),
        ledger: Arc::new(PgFundLedger::new(db_pool.clone())),
        meetings: Arc::new(PgMeetingRepository::new(db_pool.clone())),
        activity: Arc::new(PgActivityLog::new(db_pool)),
    });

    let app = routes::build_routes(state, metrics_handle);

    let addr: SocketAddr = bind_address.parse().map_err(|e| {
        error!("Invalid bind address: {}", e);
        e
    })?;

    info!("Society service listening on {}", addr);

    // ConnectInfo supplies the client IP recorded at login
    let listener = tokio::net::TcpListener::bind(addr).await?;
    axum::serve(
        listener,
        app.into_make_service_with_connect_info::<SocketAddr>(),
    )
    .with_graceful_shutdown(shutdown_signal())
    .await?;

    cancel_token.cancel();
    if let Err(e) = purge_task.await {
        error!("Session purge task failed: {}", e);
    }

    info!("Society service shutdown complete");

    Ok(())
}

/// Listens for shutdown signals (SIGTERM, SIGINT).
async fn shutdown_signal() {
    let ctrl_c = async {
        match signal::ctrl_c().await {
            Ok(()) => info!("Received SIGINT, starting graceful shutdown..."),
            Err(e) => error!("Failed to listen for SIGINT: {}", e),
        }
    };

    #[cfg(unix)]
    let terminate = async {
        match signal::unix::signal(signal::unix::SignalKind::terminate()) {
            Ok(mut stream) => {
                stream.recv().await;
                info!("Received SIGTERM, starting graceful shutdown...");
            }
            Err(e) => {
                error!("Failed to listen for SIGTERM: {}", e);
                std::future::pending::<()>().await;
            }
        }
    };

    #[cfg(not(unix))]
    let terminate = std::future::pending::<()>();

    tokio::select! {
        _ = ctrl_c => {}
        _ = terminate => {}
    }
}
