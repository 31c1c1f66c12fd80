//! AppForge server binary — wires config, store, CI trigger, manifest
//! source, and the HTTP router, then serves until SIGINT/SIGTERM.

use std::net::SocketAddr;
use std::sync::Arc;

use clap::Parser;

use appforge_server::config::ForgeConfig;
use appforge_server::routes::{forge_router, ForgeState};
use appforge_server::services::ci_trigger::HttpCiTrigger;
use appforge_server::services::manifest::HttpManifestSource;
use appforge_server::services::sweeper;
use appforge_server::store::memory::MemStore;
use appforge_server::store::postgres::PgStore;
use appforge_server::store::Store;
use appforge_server::metrics;

#[derive(Parser)]
#[command(name = "appforge", about = "AppForge build pipeline orchestrator")]
struct Cli {
    /// Server port
    #[arg(short, long, env = "FORGE_PORT", default_value = "8080")]
    port: u16,

    /// PostgreSQL connection URL
    #[arg(long, env = "DATABASE_URL")]
    database_url: Option<String>,
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    // Initialize tracing
    let log_format = std::env::var("LOG_FORMAT").unwrap_or_default();
    if log_format == "json" {
        tracing_subscriber::fmt()
            .json()
            .with_env_filter(
                tracing_subscriber::EnvFilter::try_from_default_env()
                    .unwrap_or_else(|_| "info".into()),
            )
            .init();
    } else {
        tracing_subscriber::fmt()
            .with_env_filter(
                tracing_subscriber::EnvFilter::try_from_default_env()
                    .unwrap_or_else(|_| "info".into()),
            )
            .init();
    }

    let cli = Cli::parse();

    tracing::info!("Starting AppForge orchestrator...");

    let config = ForgeConfig::from_env();

    // Store selection: Postgres when DATABASE_URL is set, in-memory
    // otherwise (dev profile only).
    let store: Arc<dyn Store> = match &cli.database_url {
        Some(url) => {
            let pg = PgStore::connect(url)?;
            tracing::info!("Running database migration...");
            pg.run_migration().await?;
            tracing::info!("Database migration completed.");
            Arc::new(pg)
        }
        None => {
            tracing::warn!("DATABASE_URL not set -- using in-memory store (dev only)");
            Arc::new(MemStore::new())
        }
    };

    let trigger = Arc::new(HttpCiTrigger::new(config.ci_trigger_url.clone()));
    let manifest = Arc::new(HttpManifestSource::new(config.manifest_base_url.clone()));

    if config.stuck_job_ttl_min > 0 {
        tokio::spawn(sweeper::run_sweeper(
            store.clone(),
            config.stuck_job_ttl_min,
        ));
    }

    metrics::init_metrics();

    let state = ForgeState {
        store,
        trigger,
        manifest,
        config,
    };
    let app = forge_router(state);

    let addr = SocketAddr::from(([0, 0, 0, 0], cli.port));
    tracing::info!("AppForge orchestrator listening on {}", addr);

    let listener = tokio::net::TcpListener::bind(addr).await?;
    axum::serve(
        listener,
        app.into_make_service_with_connect_info::<SocketAddr>(),
    )
    .with_graceful_shutdown(shutdown_signal())
    .await?;

    tracing::info!("Shutdown complete");
    Ok(())
}

async fn shutdown_signal() {
    let ctrl_c = async {
        tokio::signal::ctrl_c()
            .await
            .expect("failed to install Ctrl+C handler");
    };

    #[cfg(unix)]
    let terminate = async {
        tokio::signal::unix::signal(tokio::signal::unix::SignalKind::terminate())
            .expect("failed to install SIGTERM handler")
            .recv()
            .await;
    };

    #[cfg(not(unix))]
    let terminate = std::future::pending::<()>();

    tokio::select! {
        _ = ctrl_c => tracing::info!("Received SIGINT, shutting down..."),
        _ = terminate => tracing::info!("Received SIGTERM, shutting down..."),
    }
}
