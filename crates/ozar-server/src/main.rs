mod config;

use std::net::SocketAddr;
use std::sync::Arc;

use tower_http::cors::CorsLayer;
use tower_http::trace::TraceLayer;
use tracing::info;

use ozar_api::AppStateInner;
use ozar_gateway::{Backend, BackendConfig, Storage};

use crate::config::ServerConfig;

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    // Load .env if present
    let _ = dotenvy::dotenv();

    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "ozar=debug,ozar_api=debug,tower_http=debug".into()),
        )
        .init();

    let config = ServerConfig::from_env()?;

    let db = ozar_db::Database::open(&config.db_path)?;
    let storage = Storage::new(config.storage_dir.clone()).await?;
    let backend = Arc::new(Backend::new(
        db,
        storage,
        config.jwt_secret.clone(),
        BackendConfig {
            require_email_confirmation: config.require_email_confirmation,
            admin_emails: config.admin_emails.clone(),
            public_url: config.public_url.clone(),
        },
    ));

    let mut state = AppStateInner::new(backend);
    state.chat_delay = config.chat_delay;
    state.orphan_policy = config.orphan_policy;
    let state = Arc::new(state);

    let schedule = state.health.clone().spawn_schedule(config.health_interval);
    info!("Health check scheduled every {}s", config.health_interval.as_secs());

    let app = ozar_api::router(state)
        .layer(CorsLayer::permissive())
        .layer(TraceLayer::new_for_http());

    let addr: SocketAddr = format!("{}:{}", config.host, config.port).parse()?;
    info!("Ozar server listening on {}", addr);

    let listener = tokio::net::TcpListener::bind(addr).await?;
    axum::serve(listener, app)
        .with_graceful_shutdown(shutdown_signal())
        .await?;

    schedule.abort();
    Ok(())
}

async fn shutdown_signal() {
    let ctrl_c = tokio::signal::ctrl_c();
    #[cfg(unix)]
    {
        match tokio::signal::unix::signal(tokio::signal::unix::SignalKind::terminate()) {
            Ok(mut sigterm) => {
                tokio::select! {
                    _ = ctrl_c => info!("Received Ctrl+C, shutting down..."),
                    _ = sigterm.recv() => info!("Received SIGTERM, shutting down..."),
                }
            }
            Err(e) => {
                tracing::warn!("SIGTERM handler unavailable: {}", e);
                ctrl_c.await.ok();
                info!("Received Ctrl+C, shutting down...");
            }
        }
    }
    #[cfg(not(unix))]
    {
        ctrl_c.await.ok();
        info!("Received Ctrl+C, shutting down...");
    }
}
