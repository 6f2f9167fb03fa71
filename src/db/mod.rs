// SPDX-License-Identifier: MIT
// Copyright 2026 Roland Dreier <roland@rolandd.dev>

//! Database layer (Firestore).

pub mod firestore;

pub use firestore::FirestoreDb;

/// Collection names as constants.
///
/// Workouts, logs and the diet are subcollections under `users/{uid}`.
pub mod collections {
    pub const USERS: &str = "users";
    pub const WORKOUTS: &str = "workouts";
    pub const LOGS: &str = "logs";
    pub const DIET: &str = "diet";
    /// The single meal plan document inside `DIET`
    pub const DIET_DOC: &str = "current";
}
