mod admins;
mod auth;
mod awards;
mod bot;
mod cards;
mod config;
mod db;
mod endorsements;
mod errors;
mod models;
mod nominations;
mod notifications;
mod reward_cycles;
mod routes;
mod scheduler;
mod search;
mod settings;
mod state;
mod storage;
mod strings;
mod teams;

use anyhow::Result;
use std::net::SocketAddr;
use std::sync::Arc;
use tokio::sync::watch;
use tracing::info;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt, EnvFilter};

use crate::bot::connector::ConnectorClient;
use crate::config::{Config, StorageBackend};
use crate::db::{create_pool, ensure_schema};
use crate::routes::build_router;
use crate::scheduler::{CycleStatusJob, PeriodicTask, ReminderJob};
use crate::search::{AzureSearchService, NominationSearch, TableScanSearch};
use crate::state::AppState;
use crate::storage::azure_table::{parse_connection_string, AzureTableStore};
use crate::storage::memory::MemoryTableStore;
use crate::storage::postgres::PgTableStore;
use crate::storage::{Repositories, TableStore};

#[tokio::main]
async fn main() -> Result<()> {
    let config = Config::from_env()?;

    // Initialize structured logging
    tracing_subscriber::registry()
        .with(EnvFilter::try_from_default_env().unwrap_or_else(|_| {
            EnvFilter::new(format!(
                "{}={}",
                env!("CARGO_PKG_NAME").replace('-', "_"),
                &config.rust_log
            ))
        }))
        .with(tracing_subscriber::fmt::layer())
        .init();

    info!("Starting Reward and Recognition API v{}", env!("CARGO_PKG_VERSION"));

    let store = open_store(&config.storage).await?;
    let repos = Repositories::new(store);

    let search: Arc<dyn NominationSearch> = match &config.search {
        Some(search_config) => {
            info!("Using search service {}", search_config.service_name);
            Arc::new(AzureSearchService::new(search_config.clone())?)
        }
        None => {
            info!("No search service configured, scanning the nomination table");
            Arc::new(TableScanSearch::new(repos.nominations.clone()))
        }
    };

    let connector = Arc::new(ConnectorClient::new(
        config.bot.app_id.clone(),
        config.bot.app_password.clone(),
    ));

    let state = AppState::new(config.clone(), repos.clone(), search, connector);

    // Background jobs
    let (shutdown_tx, shutdown_rx) = watch::channel(false);
    let cycle_status = Arc::new(PeriodicTask::new(
        Arc::new(CycleStatusJob::new(repos.reward_cycles.clone())),
        &config.cycle_status_schedule,
    )?);
    let reminders = Arc::new(PeriodicTask::new(
        Arc::new(ReminderJob::new(state.notifier.clone())),
        &config.reminder_schedule,
    )?);
    let jobs = [
        tokio::spawn(cycle_status.run(shutdown_rx.clone())),
        tokio::spawn(reminders.run(shutdown_rx)),
    ];

    let app = build_router(state);

    let addr: SocketAddr = format!("0.0.0.0:{}", config.port).parse()?;
    info!("Listening on {addr}");

    let listener = tokio::net::TcpListener::bind(addr).await?;
    axum::serve(listener, app)
        .with_graceful_shutdown(async {
            if let Err(e) = tokio::signal::ctrl_c().await {
                tracing::error!("Failed to listen for shutdown signal: {e}");
            }
            info!("Shutdown signal received");
        })
        .await?;

    shutdown_tx.send(true).ok();
    for job in jobs {
        job.await?;
    }

    Ok(())
}

async fn open_store(backend: &StorageBackend) -> Result<Arc<dyn TableStore>> {
    Ok(match backend {
        StorageBackend::Postgres { database_url } => {
            let pool = create_pool(database_url).await?;
            ensure_schema(&pool).await?;
            Arc::new(PgTableStore::new(pool))
        }
        StorageBackend::AzureTable { connection_string } => {
            let connection = parse_connection_string(connection_string)?;
            info!("Using table storage at {}", connection.endpoint);
            Arc::new(AzureTableStore::new(connection))
        }
        StorageBackend::Memory => {
            info!("Using the in-memory store; data is lost on restart");
            Arc::new(MemoryTableStore::new())
        }
    })
}
