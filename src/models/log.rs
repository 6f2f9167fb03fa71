// SPDX-License-Identifier: MIT
// Copyright 2026 Roland Dreier <roland@rolandd.dev>

//! Workout log model (one entry per finished workout).

use serde::{Deserialize, Serialize};
use std::collections::HashMap;
#[cfg(feature = "binding-generation")]
use ts_rs::TS;

use super::coerce::{lenient_u32, lenient_weights};
use super::SCHEMA_VERSION;

fn default_schema_version() -> u32 {
    SCHEMA_VERSION
}
fn default_completion() -> u32 {
    100
}

/// Stored workout log.
///
/// Stored at: `users/{uid}/logs/{id}`
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[cfg_attr(feature = "binding-generation", derive(TS))]
#[cfg_attr(
    feature = "binding-generation",
    ts(export, export_to = "web/src/lib/generated/")
)]
pub struct WorkoutLog {
    #[serde(default = "default_schema_version")]
    pub schema_version: u32,
    /// Document ID
    #[serde(default)]
    pub id: String,
    #[serde(alias = "workoutId")]
    pub workout_id: String,
    #[serde(default, alias = "workoutName")]
    pub workout_name: String,
    /// RFC3339 timestamp, or a bare day for manual entries
    pub date: String,
    /// Wall-clock duration of the session, when known
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub duration_seconds: Option<u64>,
    /// Share of exercises fully completed (0-100)
    #[serde(
        default = "default_completion",
        alias = "progress",
        deserialize_with = "lenient_u32"
    )]
    pub completion_percentage: u32,
    /// Weight used per exercise id
    #[serde(default, alias = "weightsUsed", deserialize_with = "lenient_weights")]
    pub weights_used: HashMap<String, f64>,
}

impl WorkoutLog {
    /// Apply defaulting rules at the storage boundary.
    pub fn normalize(&mut self) {
        self.schema_version = SCHEMA_VERSION;
        self.completion_percentage = self.completion_percentage.min(100);
        self.weights_used
            .retain(|_, weight| weight.is_finite() && *weight >= 0.0);
    }

    /// Parsed log date, if the stored value is well-formed.
    pub fn parsed_date(&self) -> Option<chrono::DateTime<chrono::Utc>> {
        crate::time_utils::parse_log_date(&self.date)
    }
}
