// SPDX-License-Identifier: MIT
// Copyright 2026 Roland Dreier <roland@rolandd.dev>

//! Workout routine model for storage and API.

use serde::{Deserialize, Serialize};
#[cfg(feature = "binding-generation")]
use ts_rs::TS;

use super::coerce::{lenient_f64, lenient_text, lenient_u32};
use super::SCHEMA_VERSION;

/// Rest between sets when the routine doesn't say otherwise.
pub const DEFAULT_REST_SECONDS: u32 = 60;
const DEFAULT_EXERCISE_NAME: &str = "Unnamed exercise";
const DEFAULT_REPS: &str = "0";

fn default_schema_version() -> u32 {
    SCHEMA_VERSION
}
fn default_series_count() -> u32 {
    1
}
fn default_rest_seconds() -> u32 {
    DEFAULT_REST_SECONDS
}
fn default_reps_spec() -> String {
    DEFAULT_REPS.to_string()
}

/// One exercise inside a workout, stored inline in the workout document.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[cfg_attr(feature = "binding-generation", derive(TS))]
#[cfg_attr(
    feature = "binding-generation",
    ts(export, export_to = "web/src/lib/generated/")
)]
pub struct Exercise {
    /// Unique within the workout (derived from the position when missing)
    #[serde(default)]
    pub id: String,
    #[serde(default)]
    pub name: String,
    /// Alternative exercise when the machine is busy
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub substitute: Option<String>,
    /// Number of sets (always positive after normalization)
    #[serde(
        default = "default_series_count",
        alias = "series",
        deserialize_with = "lenient_u32"
    )]
    pub series_count: u32,
    /// Repetitions as entered ("12", "8-10")
    #[serde(
        default = "default_reps_spec",
        alias = "reps",
        deserialize_with = "lenient_text"
    )]
    pub reps_spec: String,
    /// Default working weight (kg)
    #[serde(default, deserialize_with = "lenient_f64")]
    pub weight: f64,
    /// Rest after each completed set
    #[serde(
        default = "default_rest_seconds",
        alias = "rest",
        deserialize_with = "lenient_u32"
    )]
    pub rest_seconds: u32,
    #[serde(default, alias = "imageUrl", skip_serializing_if = "Option::is_none")]
    pub image_url: Option<String>,
    #[serde(default, alias = "muscleUrl", skip_serializing_if = "Option::is_none")]
    pub muscle_url: Option<String>,
    /// Execution notes
    #[serde(default, alias = "specs", skip_serializing_if = "Option::is_none")]
    pub notes: Option<String>,
}

impl Exercise {
    /// Apply defaulting rules to the exercise fields. Ids are assigned by
    /// [`Workout::normalize`].
    pub fn normalize(&mut self) {
        self.id = self.id.trim().to_string();
        self.name = self.name.trim().to_string();
        if self.name.is_empty() {
            self.name = DEFAULT_EXERCISE_NAME.to_string();
        }
        if self.series_count == 0 {
            self.series_count = default_series_count();
        }
        if self.reps_spec.is_empty() {
            self.reps_spec = default_reps_spec();
        }
        if !self.weight.is_finite() || self.weight < 0.0 {
            self.weight = 0.0;
        }
        for field in [
            &mut self.substitute,
            &mut self.image_url,
            &mut self.muscle_url,
            &mut self.notes,
        ] {
            if field.as_deref().is_some_and(|s| s.trim().is_empty()) {
                *field = None;
            }
        }
    }
}

/// A workout routine owned by one user.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[cfg_attr(feature = "binding-generation", derive(TS))]
#[cfg_attr(
    feature = "binding-generation",
    ts(export, export_to = "web/src/lib/generated/")
)]
pub struct Workout {
    #[serde(default = "default_schema_version")]
    pub schema_version: u32,
    /// Document ID
    #[serde(default)]
    pub id: String,
    #[serde(default)]
    pub name: String,
    /// Execution order is the vector order
    #[serde(default)]
    pub exercises: Vec<Exercise>,
    /// When the workout was created (ISO 8601)
    #[serde(default, alias = "createdAt")]
    pub created_at: String,
}

impl Workout {
    /// Apply defaulting rules to the workout and all its exercises.
    pub fn normalize(&mut self) {
        self.schema_version = SCHEMA_VERSION;
        if self.id.trim().is_empty() {
            self.id = uuid::Uuid::new_v4().to_string();
        }
        self.name = self.name.trim().to_string();
        for exercise in &mut self.exercises {
            exercise.normalize();
        }
        self.assign_missing_exercise_ids();
    }

    /// Give id-less exercises a stable id from their position, so the same
    /// stored document always reads back with the same ids.
    fn assign_missing_exercise_ids(&mut self) {
        for index in 0..self.exercises.len() {
            if !self.exercises[index].id.is_empty() {
                continue;
            }
            let mut n = index + 1;
            let id = loop {
                let candidate = format!("exercise-{}", n);
                if self.exercise(&candidate).is_none() {
                    break candidate;
                }
                n += self.exercises.len();
            };
            self.exercises[index].id = id;
        }
    }

    /// Look up an exercise by id.
    pub fn exercise(&self, exercise_id: &str) -> Option<&Exercise> {
        self.exercises.iter().find(|e| e.id == exercise_id)
    }

    /// Reorder exercises to match `order`, which must be a permutation of
    /// the current exercise ids.
    pub fn reorder(&mut self, order: &[String]) -> Result<(), String> {
        if order.len() != self.exercises.len() {
            return Err(format!(
                "expected {} exercise ids, got {}",
                self.exercises.len(),
                order.len()
            ));
        }

        let mut positions = Vec::with_capacity(order.len());
        for id in order {
            let pos = self
                .exercises
                .iter()
                .position(|e| &e.id == id)
                .filter(|pos| !positions.contains(pos))
                .ok_or_else(|| format!("unknown or duplicate exercise id: {}", id))?;
            positions.push(pos);
        }

        let mut slots: Vec<Option<Exercise>> =
            std::mem::take(&mut self.exercises).into_iter().map(Some).collect();
        self.exercises = positions
            .into_iter()
            .filter_map(|pos| slots[pos].take())
            .collect();
        Ok(())
    }
}
