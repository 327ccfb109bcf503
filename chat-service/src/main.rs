use chat_service::{
    build_router,
    config::ChatConfig,
    db,
    services::{CapabilityService, Database, MemoryStore, Store},
    AppState,
};
use service_core::error::AppError;
use service_core::middleware::rate_limit::{create_ip_rate_limiter, spawn_pruning};
use service_core::observability::{init_metrics, init_tracing};
use std::net::SocketAddr;
use std::sync::Arc;
use std::time::Duration;
use tokio::signal;

#[tokio::main]
async fn main() -> Result<(), AppError> {
    // Load configuration - fail fast if invalid
    let config = ChatConfig::from_env()?;

    init_tracing(
        &config.service_name,
        &config.log_level,
        config.otlp_endpoint.as_deref(),
    )?;
    init_metrics()?;

    tracing::info!(
        service = %config.service_name,
        version = %config.service_version,
        environment = ?config.environment,
        "Starting chat service"
    );

    let store: Arc<dyn Store> = if config.database.is_memory() {
        tracing::warn!("Using in-memory store; data will not survive a restart");
        Arc::new(MemoryStore::new())
    } else {
        let pool = db::create_pool(&config.database).await?;
        db::run_migrations(&pool).await.map_err(|e| {
            AppError::DatabaseError(anyhow::anyhow!("Migration failed: {}", e))
        })?;
        Arc::new(Database::new(pool))
    };
    tracing::info!("Store initialized");

    let capabilities = CapabilityService::new(&config.capability).map_err(AppError::ConfigError)?;
    tracing::info!(
        default_ttl_seconds = config.capability.default_ttl_seconds,
        max_ttl_seconds = config.capability.max_ttl_seconds,
        "Capability token service initialized"
    );

    let share_rate_limiter = create_ip_rate_limiter(
        config.rate_limit.share_redeem_limit,
        config.rate_limit.share_redeem_window_seconds,
    );
    spawn_pruning(
        share_rate_limiter.clone(),
        Duration::from_secs(config.rate_limit.share_redeem_window_seconds.max(1)),
    );

    let state = AppState {
        config: config.clone(),
        store,
        capabilities,
        share_rate_limiter,
    };
    let app = build_router(state);

    let addr: SocketAddr = config.common.bind_address().parse().map_err(|e| {
        AppError::ConfigError(anyhow::anyhow!(
            "Invalid bind address {}: {}",
            config.common.bind_address(),
            e
        ))
    })?;

    tracing::info!(address = %addr, "Listening");

    let listener = tokio::net::TcpListener::bind(addr).await?;

    axum::serve(
        listener,
        app.into_make_service_with_connect_info::<SocketAddr>(),
    )
    .with_graceful_shutdown(shutdown_signal())
    .await?;

    tracing::info!("Service shutdown complete");
    Ok(())
}

async fn shutdown_signal() {
    let ctrl_c = async {
        if let Err(e) = signal::ctrl_c().await {
            tracing::error!(error = %e, "Failed to listen for Ctrl+C");
            std::future::pending::<()>().await;
        }
    };

    #[cfg(unix)]
    let terminate = async {
        match signal::unix::signal(signal::unix::SignalKind::terminate()) {
            Ok(mut sigterm) => {
                sigterm.recv().await;
            }
            Err(e) => {
                tracing::error!(error = %e, "Failed to install SIGTERM handler");
                std::future::pending::<()>().await;
            }
        }
    };

    #[cfg(not(unix))]
    let terminate = std::future::pending::<()>();

    tokio::select! {
        _ = ctrl_c => {
            tracing::info!("Received SIGINT, starting graceful shutdown");
        },
        _ = terminate => {
            tracing::info!("Received SIGTERM, starting graceful shutdown");
        },
    }
}
