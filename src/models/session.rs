// SPDX-License-Identifier: MIT
// Copyright 2026 Roland Dreier <roland@rolandd.dev>

//! Execution session state (kept on-device, never in the remote store).

use serde::{Deserialize, Serialize};
use std::collections::HashMap;
#[cfg(feature = "binding-generation")]
use ts_rs::TS;

/// Completed set count per exercise id.
pub type CompletedSets = HashMap<String, u32>;

/// Weight override per exercise id.
pub type CurrentWeights = HashMap<String, f64>;

/// The rest interval currently counting down.
///
/// Exercise and end timestamp travel together, so an active exercise
/// without an end time (or the reverse) cannot be represented.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[cfg_attr(feature = "binding-generation", derive(TS))]
#[cfg_attr(
    feature = "binding-generation",
    ts(export, export_to = "web/src/lib/generated/")
)]
pub struct ActiveRest {
    pub exercise_id: String,
    /// Absolute end time (Unix epoch milliseconds)
    #[cfg_attr(feature = "binding-generation", ts(type = "number"))]
    pub ends_at_ms: i64,
}

/// Session view returned to the client.
#[derive(Debug, Clone, Serialize)]
#[cfg_attr(feature = "binding-generation", derive(TS))]
#[cfg_attr(
    feature = "binding-generation",
    ts(export, export_to = "web/src/lib/generated/")
)]
pub struct SessionView {
    pub workout_id: String,
    pub workout_name: String,
    pub completed_sets: CompletedSets,
    pub current_weights: CurrentWeights,
    pub active_exercise_id: Option<String>,
    /// RFC3339 end of the running rest
    pub timer_ends_at: Option<String>,
    #[cfg_attr(feature = "binding-generation", ts(type = "number | null"))]
    pub remaining_seconds: Option<u64>,
    pub completion_percentage: u32,
    /// RFC3339 session start
    pub started_at: String,
}
