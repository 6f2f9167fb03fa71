// SPDX-License-Identifier: MIT
// Copyright 2026 Roland Dreier <roland@rolandd.dev>

//! Typed access to the per-workout session snapshot.
//!
//! Keys are namespaced by user, category and workout id:
//! `{uid}/workout_progress_{id}`, `{uid}/workout_weights_{id}`,
//! `{uid}/workout_duration_{id}` and `{uid}/workout_timer_{id}`.

use serde::de::DeserializeOwned;
use serde::Serialize;
use std::sync::Arc;

use super::{LocalStore, StorageError};
use crate::models::{ActiveRest, CompletedSets, CurrentWeights};

const PROGRESS: &str = "workout_progress";
const WEIGHTS: &str = "workout_weights";
const DURATION: &str = "workout_duration";
const TIMER: &str = "workout_timer";

/// Everything needed to resume a session on this device.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct SessionSnapshot {
    pub completed_sets: CompletedSets,
    pub current_weights: CurrentWeights,
    pub active_rest: Option<ActiveRest>,
    /// Session start (Unix epoch milliseconds)
    pub started_at_ms: Option<i64>,
}

/// Session snapshot persistence on top of a [`LocalStore`].
#[derive(Clone)]
pub struct ProgressStore {
    store: Arc<dyn LocalStore>,
}

impl ProgressStore {
    pub fn new(store: Arc<dyn LocalStore>) -> Self {
        Self { store }
    }

    fn key(user_id: &str, category: &str, workout_id: &str) -> String {
        format!("{}/{}_{}", user_id, category, workout_id)
    }

    fn read<T: DeserializeOwned>(&self, key: &str) -> Result<Option<T>, StorageError> {
        match self.store.get(key)? {
            Some(raw) => serde_json::from_str(&raw)
                .map(Some)
                .map_err(|source| StorageError::Decode {
                    key: key.to_string(),
                    source,
                }),
            None => Ok(None),
        }
    }

    fn write<T: Serialize>(&self, key: &str, value: &T) -> Result<(), StorageError> {
        let raw = serde_json::to_string(value).map_err(|source| StorageError::Decode {
            key: key.to_string(),
            source,
        })?;
        self.store.set(key, &raw)
    }

    /// Load the snapshot for a workout. Returns `None` when nothing was saved.
    pub fn load(
        &self,
        user_id: &str,
        workout_id: &str,
    ) -> Result<Option<SessionSnapshot>, StorageError> {
        let completed_sets: Option<CompletedSets> =
            self.read(&Self::key(user_id, PROGRESS, workout_id))?;
        let current_weights: Option<CurrentWeights> =
            self.read(&Self::key(user_id, WEIGHTS, workout_id))?;
        let started_at_ms: Option<i64> = self.read(&Self::key(user_id, DURATION, workout_id))?;
        let active_rest: Option<ActiveRest> =
            self.read(&Self::key(user_id, TIMER, workout_id))?;

        if completed_sets.is_none()
            && current_weights.is_none()
            && started_at_ms.is_none()
            && active_rest.is_none()
        {
            return Ok(None);
        }

        Ok(Some(SessionSnapshot {
            completed_sets: completed_sets.unwrap_or_default(),
            current_weights: current_weights.unwrap_or_default(),
            active_rest,
            started_at_ms,
        }))
    }

    /// Persist the full snapshot for a workout.
    pub fn save(
        &self,
        user_id: &str,
        workout_id: &str,
        snapshot: &SessionSnapshot,
    ) -> Result<(), StorageError> {
        self.write(
            &Self::key(user_id, PROGRESS, workout_id),
            &snapshot.completed_sets,
        )?;
        self.write(
            &Self::key(user_id, WEIGHTS, workout_id),
            &snapshot.current_weights,
        )?;

        let duration_key = Self::key(user_id, DURATION, workout_id);
        match snapshot.started_at_ms {
            Some(started) => self.write(&duration_key, &started)?,
            None => self.store.remove(&duration_key)?,
        }

        let timer_key = Self::key(user_id, TIMER, workout_id);
        match &snapshot.active_rest {
            Some(rest) => self.write(&timer_key, rest),
            None => self.store.remove(&timer_key),
        }
    }

    /// Remove every key belonging to a workout session.
    pub fn clear(&self, user_id: &str, workout_id: &str) -> Result<(), StorageError> {
        for category in [PROGRESS, WEIGHTS, DURATION, TIMER] {
            self.store.remove(&Self::key(user_id, category, workout_id))?;
        }
        Ok(())
    }
}
