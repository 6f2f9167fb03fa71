// SPDX-License-Identifier: MIT
// Copyright 2026 Roland Dreier <roland@rolandd.dev>

use std::sync::Arc;
use std::time::Duration;
use workout_tracker::config::Config;
use workout_tracker::db::FirestoreDb;
use workout_tracker::middleware::create_jwt;
use workout_tracker::notifications::NotificationCenter;
use workout_tracker::routes::create_router;
use workout_tracker::services::SessionRegistry;
use workout_tracker::storage::{MemoryStore, ProgressStore};
use workout_tracker::timer::{Clock, NotifierHandle, SystemClock};
use workout_tracker::AppState;

/// Check if emulator is available via environment variable.
#[allow(dead_code)]
pub fn emulator_available() -> bool {
    std::env::var("FIRESTORE_EMULATOR_HOST").is_ok()
}

/// Skip test with message if emulator not available.
#[macro_export]
macro_rules! require_emulator {
    () => {
        if !crate::common::emulator_available() {
            eprintln!("⚠️  Skipping: FIRESTORE_EMULATOR_HOST not set");
            return;
        }
    };
}

/// Create a test database connection.
#[allow(dead_code)]
pub async fn test_db() -> FirestoreDb {
    FirestoreDb::new("test-project")
        .await
        .expect("Failed to connect to Firestore emulator")
}

/// Create a mock database connection (offline).
#[allow(dead_code)]
pub fn test_db_offline() -> FirestoreDb {
    FirestoreDb::new_mock()
}

/// Session registry backed by memory, with the given notifier and clock.
#[allow(dead_code)]
pub fn test_registry(
    center: Arc<NotificationCenter>,
    notifier: NotifierHandle,
    clock: Arc<dyn Clock>,
) -> SessionRegistry {
    SessionRegistry::new(
        ProgressStore::new(Arc::new(MemoryStore::new())),
        center,
        notifier,
        clock,
        Duration::from_millis(250),
    )
}

/// Create a test app with the given database and in-memory local storage.
/// Returns the router and the shared state.
#[allow(dead_code)]
pub fn create_test_app_with_db(db: FirestoreDb) -> (axum::Router, Arc<AppState>) {
    let config = Config::test_default();
    let notifications = NotificationCenter::new(64);
    let sessions = test_registry(
        notifications.clone(),
        NotifierHandle::disconnected(),
        Arc::new(SystemClock),
    );

    let state = Arc::new(AppState {
        config,
        db,
        notifications,
        sessions,
    });

    (create_router(state.clone()), state)
}

/// Create a test app with offline mock dependencies.
#[allow(dead_code)]
pub fn create_test_app() -> (axum::Router, Arc<AppState>) {
    create_test_app_with_db(test_db_offline())
}

/// Create a session token for `user_id` signed with the test key.
#[allow(dead_code)]
pub fn create_test_jwt(user_id: &str) -> String {
    create_jwt(user_id, &Config::test_default().jwt_signing_key).expect("Failed to create JWT")
}
