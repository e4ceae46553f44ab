//! Voyage predictor service
//!
//! Opens the fleet history store, trains the fuel, route and maintenance
//! models, and serves predictions over HTTP. Readiness stays false until
//! the startup training pass has finished.

use anyhow::{Context, Result};
use chrono::Utc;
use predictor_lib::{
    health::{components, HealthRegistry},
    seed::{seed_fleet, SeedConfig},
    HistoryWriter, PredictionEngine, SqliteStore, StructuredLogger, SystemClock,
};
use std::sync::Arc;
use tracing::info;
use tracing_subscriber::{fmt, prelude::*, EnvFilter};
use voyage_predictor::{api, config::ServiceConfig};

const SERVICE_VERSION: &str = env!("CARGO_PKG_VERSION");

#[tokio::main]
async fn main() -> Result<()> {
    // Initialize tracing with JSON output and env filter
    tracing_subscriber::registry()
        .with(EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")))
        .with(fmt::layer().json())
        .init();

    info!("Starting voyage-predictor");

    let config = ServiceConfig::load()?;
    info!(
        instance = %config.instance_name,
        database = %config.database_path,
        "Service configured"
    );

    let health_registry = HealthRegistry::new();
    for component in [
        components::STORE,
        components::TRAINING,
        components::FUEL_MODEL,
        components::ROUTE_MODEL,
        components::MAINTENANCE_MODEL,
    ] {
        health_registry.register(component).await;
    }

    let store = Arc::new(
        SqliteStore::open(&config.database_path)
            .with_context(|| format!("failed to open store at {}", config.database_path))?,
    );

    if config.seed_demo_data && store.is_empty().context("failed to inspect store")? {
        let summary = seed_fleet(
            store.as_ref(),
            &SeedConfig::default(),
            Utc::now(),
            &mut rand::rng(),
        )
        .context("failed to seed demo data")?;
        info!(ships = summary.ships, voyages = summary.voyages, "Demo fleet seeded");
    }

    let engine = Arc::new(PredictionEngine::new(
        store,
        Arc::new(SystemClock),
        &config.instance_name,
    ));

    let logger = StructuredLogger::new(&config.instance_name);
    logger.log_startup(SERVICE_VERSION, config.api_port);

    let app_state = Arc::new(api::AppState::new(health_registry.clone(), engine.clone()));
    let api_handle = tokio::spawn(api::serve(config.api_port, app_state));

    if config.train_on_startup {
        let trainer = engine.clone();
        let report = tokio::task::spawn_blocking(move || trainer.train_all())
            .await
            .context("startup training task panicked")?;
        health_registry.apply_training_report(&report).await;
        info!(
            failed = report.failed_count(),
            tasks = report.outcomes.len(),
            "Startup training finished"
        );
    }

    health_registry.set_ready(true).await;

    tokio::select! {
        signal = tokio::signal::ctrl_c() => {
            signal.context("failed to listen for shutdown signal")?;
            logger.log_shutdown("SIGINT received");
        }
        served = api_handle => {
            let reason = match served {
                Ok(Ok(())) => "API server stopped".to_string(),
                Ok(Err(e)) => format!("API server failed: {}", e),
                Err(e) => format!("API server task aborted: {}", e),
            };
            logger.log_shutdown(&reason);
        }
    }
    info!("Shutting down");

    Ok(())
}
