// SPDX-License-Identifier: MIT
// Copyright 2026 Roland Dreier <roland@rolandd.dev>

//! Read-side views computed from workout logs.

use serde::{Deserialize, Serialize};
#[cfg(feature = "binding-generation")]
use ts_rs::TS;

use super::WorkoutLog;

/// Dashboard summary for the current month.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[cfg_attr(feature = "binding-generation", derive(TS))]
#[cfg_attr(
    feature = "binding-generation",
    ts(export, export_to = "web/src/lib/generated/")
)]
pub struct MonthlyProgress {
    /// "YYYY-MM"
    pub month: String,
    pub done: u32,
    pub goal: u32,
    /// done / goal, capped at 100
    pub progress_percentage: u32,
    pub last_workout: Option<String>,
}

/// One point of the load evolution chart.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[cfg_attr(feature = "binding-generation", derive(TS))]
#[cfg_attr(
    feature = "binding-generation",
    ts(export, export_to = "web/src/lib/generated/")
)]
pub struct ChartPoint {
    pub label: String,
    pub value: f64,
}

/// Logs recorded on one calendar day.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[cfg_attr(feature = "binding-generation", derive(TS))]
#[cfg_attr(
    feature = "binding-generation",
    ts(export, export_to = "web/src/lib/generated/")
)]
pub struct DayLogs {
    /// "YYYY-MM-DD"
    pub date: String,
    pub logs: Vec<WorkoutLog>,
}
