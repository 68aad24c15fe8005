// SPDX-License-Identifier: MIT
// Copyright 2026 Roland Dreier <roland@rolandd.dev>

//! Playlist Tracker API Server
//!
//! Imports YouTube playlists, tracks which videos a user has completed,
//! and schedules study sessions on the user's Google Calendar.

use playlist_tracker::{
    config::{Config, StoreBackend},
    db::{FirestoreDb, MemoryDb, Store},
    services::{GoogleCalendarClient, GoogleOAuthClient, YouTubeClient},
    AppState,
};
use std::sync::Arc;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    // Initialize structured JSON logging for GCP
    init_logging()?;

    // Load configuration from environment
    let config = Config::from_env()?;
    tracing::info!(port = config.port, "Starting Playlist Tracker API");

    // Initialize storage
    let db: Arc<dyn Store> = match config.store_backend {
        StoreBackend::Firestore => Arc::new(FirestoreDb::new(&config.gcp_project_id).await?),
        StoreBackend::Memory => {
            tracing::warn!("Using in-memory store; data is lost on restart");
            Arc::new(MemoryDb::new())
        }
    };

    // Initialize provider clients
    let identity = Arc::new(GoogleOAuthClient::new(&config)?);
    let catalog = Arc::new(YouTubeClient::new(&config)?);
    let calendar = Arc::new(GoogleCalendarClient::new(&config)?);
    tracing::info!(
        timeout_secs = config.http_timeout.as_secs(),
        "Provider clients initialized"
    );

    // Build shared state
    let state = Arc::new(AppState::new(
        config.clone(),
        db,
        identity,
        catalog,
        calendar,
    ));

    // Build router
    let app = playlist_tracker::routes::create_router(state);

    // Start server
    let addr = format!("0.0.0.0:{}", config.port);
    let listener = tokio::net::TcpListener::bind(&addr).await?;
    tracing::info!(address = %addr, "Server listening");

    axum::serve(listener, app).await?;
    Ok(())
}

/// Initialize structured JSON logging (GCP-compliant).
fn init_logging() -> Result<(), Box<dyn std::error::Error>> {
    let format = tracing_subscriber::fmt::layer()
        .json()
        .with_target(false)
        .with_current_span(true)
        .flatten_event(true);

    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::from_default_env()
                .add_directive("playlist_tracker=debug".parse()?)
                .add_directive("info".parse()?),
        )
        .with(format)
        .init();
    Ok(())
}
