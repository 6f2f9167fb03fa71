// SPDX-License-Identifier: MIT
// Copyright 2026 Roland Dreier <roland@rolandd.dev>

//! Workout tracker: routines, execution sessions with rest timers, and history.
//!
//! This crate provides the backend API for building workout routines,
//! running them set by set with a rest timer that alerts the user when the
//! rest is over (in the foreground and through a background notifier), and
//! reviewing the resulting workout logs.

pub mod config;
pub mod db;
pub mod error;
pub mod middleware;
pub mod models;
pub mod notifications;
pub mod routes;
pub mod services;
pub mod storage;
pub mod time_utils;
pub mod timer;

use config::Config;
use db::FirestoreDb;
use notifications::NotificationCenter;
use services::SessionRegistry;
use std::sync::Arc;

/// Shared application state.
pub struct AppState {
    pub config: Config,
    pub db: FirestoreDb,
    pub notifications: Arc<NotificationCenter>,
    pub sessions: SessionRegistry,
}
