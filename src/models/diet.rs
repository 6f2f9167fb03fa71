// SPDX-License-Identifier: MIT
// Copyright 2026 Roland Dreier <roland@rolandd.dev>

//! Meal plan model.

use serde::{Deserialize, Serialize};
#[cfg(feature = "binding-generation")]
use ts_rs::TS;

use super::coerce::lenient_text;
use super::SCHEMA_VERSION;
use crate::time_utils::normalize_meal_time;

/// Time given to a meal that has none.
pub const DEFAULT_MEAL_TIME: &str = "08:00";

fn default_schema_version() -> u32 {
    SCHEMA_VERSION
}
fn default_meal_time() -> String {
    DEFAULT_MEAL_TIME.to_string()
}

/// One meal of the day.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[cfg_attr(feature = "binding-generation", derive(TS))]
#[cfg_attr(
    feature = "binding-generation",
    ts(export, export_to = "web/src/lib/generated/")
)]
pub struct Meal {
    /// "HH:MM"
    #[serde(default = "default_meal_time", alias = "hora", deserialize_with = "lenient_text")]
    pub time: String,
    #[serde(default, alias = "nome", deserialize_with = "lenient_text")]
    pub name: String,
    /// Free-text food list ("4 eggs, 100g oats")
    #[serde(default, alias = "itens", deserialize_with = "lenient_text")]
    pub items: String,
}

impl Default for Meal {
    fn default() -> Self {
        Self {
            time: default_meal_time(),
            name: String::new(),
            items: String::new(),
        }
    }
}

impl Meal {
    /// Canonicalize the time ("8:00" → "08:00"). Returns false when the
    /// stored time is not a clock time.
    pub fn normalize(&mut self) -> bool {
        self.name = self.name.trim().to_string();
        self.items = self.items.trim().to_string();
        if self.time.trim().is_empty() {
            self.time = default_meal_time();
            return true;
        }
        match normalize_meal_time(&self.time) {
            Some(time) => {
                self.time = time;
                true
            }
            None => false,
        }
    }
}

/// A user's meal plan, kept in the order the user arranged it.
///
/// Stored at: `users/{uid}/diet/current`
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[cfg_attr(feature = "binding-generation", derive(TS))]
#[cfg_attr(
    feature = "binding-generation",
    ts(export, export_to = "web/src/lib/generated/")
)]
pub struct DietPlan {
    #[serde(default = "default_schema_version")]
    pub schema_version: u32,
    #[serde(default, alias = "refeicoes")]
    pub meals: Vec<Meal>,
    /// RFC3339 timestamp of the last save, empty for a plan never saved
    #[serde(default)]
    pub updated_at: String,
}

impl Default for DietPlan {
    fn default() -> Self {
        Self {
            schema_version: SCHEMA_VERSION,
            meals: Vec::new(),
            updated_at: String::new(),
        }
    }
}

impl DietPlan {
    /// Apply defaulting rules at the storage boundary.
    ///
    /// Meals with an unreadable time fall back to [`DEFAULT_MEAL_TIME`] so a
    /// damaged document still loads.
    pub fn normalize(&mut self) {
        self.schema_version = SCHEMA_VERSION;
        for meal in &mut self.meals {
            if !meal.normalize() {
                meal.time = default_meal_time();
            }
        }
    }

    /// Check meals coming from the editor and canonicalize their times.
    ///
    /// Returns the index of the first meal whose time is not "HH:MM".
    pub fn validate(&mut self) -> Result<(), usize> {
        for (index, meal) in self.meals.iter_mut().enumerate() {
            if !meal.normalize() {
                return Err(index);
            }
        }
        self.schema_version = SCHEMA_VERSION;
        Ok(())
    }
}
