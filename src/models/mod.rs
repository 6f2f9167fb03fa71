// SPDX-License-Identifier: MIT
// Copyright 2026 Roland Dreier <roland@kernel.org>

//! Data models for the application.

pub mod coerce;
pub mod diet;
pub mod log;
pub mod session;
pub mod stats;
pub mod workout;

/// Version written into every stored document.
pub const SCHEMA_VERSION: u32 = 1;

pub use diet::{DietPlan, Meal};
pub use log::WorkoutLog;
pub use session::{ActiveRest, CompletedSets, CurrentWeights, SessionView};
pub use stats::{ChartPoint, DayLogs, MonthlyProgress};
pub use workout::{Exercise, Workout, DEFAULT_REST_SECONDS};
