// SPDX-License-Identifier: MIT
// Copyright 2026 Roland Dreier <roland@rolandd.dev>

//! Workout Tracker API Server
//!
//! Serves workout routines and history, and runs execution sessions whose
//! rest timers alert the user through pushed events and notifications.

use std::sync::Arc;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};
use workout_tracker::{
    config::Config,
    db::FirestoreDb,
    notifications::NotificationCenter,
    services::SessionRegistry,
    storage::{FileStore, ProgressStore},
    timer::{BackgroundNotifier, NotifierSettings, SystemClock},
    AppState,
};

/// Capacity of the per-process push event channel.
const EVENT_CHANNEL_CAPACITY: usize = 256;

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    // Initialize structured JSON logging for GCP
    init_logging()?;

    let config = Config::from_env()?;
    tracing::info!(port = config.port, "Starting Workout Tracker API");

    let db = FirestoreDb::new(&config.gcp_project_id).await?;

    let store = FileStore::open(&config.local_store_dir)?;

    let clock = Arc::new(SystemClock);
    let notifications = NotificationCenter::new(EVENT_CHANNEL_CAPACITY);

    let settings = NotifierSettings {
        require_interaction: config.notification_require_interaction,
        ..NotifierSettings::default()
    };
    let (notifier, notifier_task) = BackgroundNotifier::spawn(
        notifications.clone(),
        clock.clone(),
        settings,
        config.notifier_queue_capacity,
    );

    let sessions = SessionRegistry::new(
        ProgressStore::new(Arc::new(store)),
        notifications.clone(),
        notifier,
        clock,
        config.rest_poll_interval,
    );

    let state = Arc::new(AppState {
        config: config.clone(),
        db,
        notifications,
        sessions,
    });

    let app = workout_tracker::routes::create_router(state);

    let addr = format!("0.0.0.0:{}", config.port);
    let listener = tokio::net::TcpListener::bind(&addr).await?;
    tracing::info!(address = %addr, "Server listening");

    axum::serve(listener, app)
        .with_graceful_shutdown(shutdown_signal())
        .await?;

    tracing::info!("Server stopped, flushing pending rest notifications");
    notifier_task.shutdown(config.shutdown_grace).await;
    Ok(())
}

async fn shutdown_signal() {
    if let Err(e) = tokio::signal::ctrl_c().await {
        tracing::error!(error = %e, "Failed to listen for shutdown signal");
        std::future::pending::<()>().await;
    }
    tracing::info!("Shutdown signal received");
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
                .add_directive("workout_tracker=debug".parse()?)
                .add_directive("info".parse()?),
        )
        .with(format)
        .init();
    Ok(())
}
