//! shelfmark-api - book-review platform backend
//!
//! Serves the book and review API, and runs the event-driven book metadata
//! synchronization consumer against the Open Library catalog.

use anyhow::Result;
use shelfmark_api::config::ServiceConfig;
use shelfmark_api::services::sync_consumer::{SqliteBookStore, SyncConsumer};
use shelfmark_api::services::{OpenLibraryClient, ReviewVerifier};
use shelfmark_api::{build_router, db, AppState};
use shelfmark_common::events::EventBus;
use std::path::PathBuf;
use std::sync::Arc;
use tracing::info;

/// Event bus capacity; bounds buffered synchronization requests
const EVENT_BUS_CAPACITY: usize = 1000;

#[tokio::main]
async fn main() -> Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::from_default_env()
                .add_directive(tracing::Level::INFO.into()),
        )
        .init();

    // Log build identification immediately after tracing init, before any
    // database or network delays
    info!(
        "Starting Shelfmark API v{} [{}] built {} ({})",
        env!("CARGO_PKG_VERSION"),
        env!("GIT_HASH"),
        env!("BUILD_TIMESTAMP"),
        env!("BUILD_PROFILE")
    );

    let config_path = std::env::var("SHELFMARK_CONFIG")
        .map(PathBuf::from)
        .unwrap_or_else(|_| PathBuf::from("shelfmark.toml"));
    let config = ServiceConfig::resolve(&config_path)?;

    let pool = db::init_database(&config.database).await?;

    let verifier = Arc::new(match &config.denylist_file {
        Some(path) => ReviewVerifier::from_denylist_file(path),
        None => ReviewVerifier::new(),
    });

    let bus = EventBus::new(EVENT_BUS_CAPACITY);
    let state = AppState::new(pool.clone(), bus.clone(), verifier);

    // Synchronization consumer: subscribes before the server accepts traffic
    // so ingest events published by handlers always have a receiver
    let consumer = Arc::new(SyncConsumer::new(
        Arc::new(SqliteBookStore::new(pool)),
        Arc::new(OpenLibraryClient::new(&config.catalog_base_url)?),
    ));
    tokio::spawn(consumer.run(bus));

    let app = build_router(state);

    let listener = tokio::net::TcpListener::bind(&config.bind).await?;
    info!("shelfmark-api listening on http://{}", config.bind);
    info!("Health check: http://{}/health", config.bind);

    axum::serve(listener, app).await?;

    Ok(())
}
