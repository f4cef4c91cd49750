//! HRMS API Server
//!
//! Main entry point for the multi-tenant HR backend.

use std::sync::Arc;
use std::time::Duration;

use anyhow::Context;
use tokio::net::TcpListener;
use tracing::info;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

use hrms_api::commands::auth::AuthService;
use hrms_api::commands::{CommandDeps, EVENT_BUS, TRANSACTOR, build_mediator};
use hrms_api::{AppState, create_router};
use hrms_db::{AuditLogRepository, PermissionRepository, Transactor, connect, spawn_audit_writer};
use hrms_shared::config::LogConfig;
use hrms_shared::{AppConfig, EventBus, JwtConfig, JwtService, RegistryBuilder};

fn init_tracing(log: &LogConfig) {
    let filter = tracing_subscriber::EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| "hrms=debug,tower_http=debug".into());
    let registry = tracing_subscriber::registry().with(filter);

    if log.json {
        registry.with(tracing_subscriber::fmt::layer().json()).init();
    } else {
        registry.with(tracing_subscriber::fmt::layer()).init();
    }
}

async fn shutdown_signal() {
    let ctrl_c = async {
        if let Err(err) = tokio::signal::ctrl_c().await {
            tracing::error!(error = %err, "failed to listen for ctrl-c");
        }
    };

    #[cfg(unix)]
    let terminate = async {
        match tokio::signal::unix::signal(tokio::signal::unix::SignalKind::terminate()) {
            Ok(mut signal) => {
                signal.recv().await;
            }
            Err(err) => {
                tracing::error!(error = %err, "failed to listen for SIGTERM");
                std::future::pending::<()>().await;
            }
        }
    };

    #[cfg(not(unix))]
    let terminate = std::future::pending::<()>();

    tokio::select! {
        () = ctrl_c => {},
        () = terminate => {},
    }
    info!("shutdown signal received");
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    // Load environment variables from .env file
    dotenvy::dotenv().ok();

    // Load configuration
    let config = AppConfig::load().context("failed to load configuration")?;
    init_tracing(&config.log);

    // Connect to database
    let db = connect(&config.database)
        .await
        .context("failed to connect to database")?;
    info!("Connected to database");

    let transactor = Transactor::new(db.clone());
    let events = EventBus::new(config.events.subscriber_buffer);
    let audit_writer = spawn_audit_writer(&events, AuditLogRepository::new(db.clone()));

    // Wire collaborators
    let mut registry = RegistryBuilder::new();
    registry
        .provide(TRANSACTOR, Arc::new(transactor.clone()))
        .provide(EVENT_BUS, Arc::new(events.clone()));
    let registry = registry.build();

    let mediator = build_mediator(&registry)?;
    info!(handlers = mediator.len(), "Mediator ready");

    let jwt = Arc::new(JwtService::new(JwtConfig {
        access_secret: config.jwt.access_secret.clone(),
        refresh_secret: config.jwt.refresh_secret.clone(),
        access_token_expires_secs: i64::try_from(config.jwt.access_token_expiry_secs)?,
        refresh_token_expires_secs: i64::try_from(config.jwt.refresh_token_expiry_secs)?,
    }));
    let deps = CommandDeps::from_registry(&registry)?;

    let state = AppState {
        mediator,
        auth: Arc::new(AuthService::new(&deps, jwt.clone())),
        jwt,
        tenant_store: Arc::new(PermissionRepository::new(transactor)),
        cookie_secure: config.server.cookie_secure,
    };
    drop(deps);
    drop(registry);
    drop(events);

    let app = create_router(
        state,
        Duration::from_secs(config.server.request_timeout_secs),
    );

    // Start server
    let addr = format!("{}:{}", config.server.host, config.server.port);
    let listener = TcpListener::bind(&addr).await?;
    info!("Server listening on {}", addr);

    let shutdown_timeout = Duration::from_secs(config.server.shutdown_timeout_secs);
    let (draining_tx, draining_rx) = tokio::sync::oneshot::channel::<()>();
    let server = axum::serve(listener, app).with_graceful_shutdown(async move {
        shutdown_signal().await;
        let _ = draining_tx.send(());
    });

    let mut serving = tokio::spawn(async move { server.await });
    tokio::select! {
        result = &mut serving => result??,
        () = async {
            let _ = draining_rx.await;
            tokio::time::sleep(shutdown_timeout).await;
        } => {
            tracing::warn!(timeout_secs = shutdown_timeout.as_secs(), "shutdown timed out, aborting open connections");
            serving.abort();
        }
    }

    // Every bus handle is gone once the router is dropped, which ends the writer.
    if tokio::time::timeout(shutdown_timeout, audit_writer).await.is_err() {
        tracing::warn!("audit writer did not drain before the deadline");
    }

    db.close().await.context("failed to close database pool")?;
    info!("Server stopped");
    Ok(())
}
