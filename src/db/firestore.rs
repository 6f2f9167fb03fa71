// SPDX-License-Identifier: MIT
// Copyright 2026 Roland Dreier <roland@rolandd.dev>

//! Firestore client wrapper with typed operations.
//!
//! Provides high-level operations for:
//! - Workouts (`users/{uid}/workouts/{id}`)
//! - Workout logs (`users/{uid}/logs/{id}`)
//! - The meal plan (`users/{uid}/diet/current`)
//!
//! Documents are normalized on read, so legacy records come back with
//! every field defaulted.

use crate::db::collections;
use crate::error::AppError;
use crate::models::{DietPlan, Workout, WorkoutLog, SCHEMA_VERSION};
use crate::time_utils::{format_utc_rfc3339, next_month_key};
use firestore::{FirestoreQueryDirection, ParentPathBuilder};

/// Firestore database client.
#[derive(Clone)]
pub struct FirestoreDb {
    client: Option<firestore::FirestoreDb>,
}

impl FirestoreDb {
    /// Create a new Firestore client.
    ///
    /// For local development with emulator, set FIRESTORE_EMULATOR_HOST.
    pub async fn new(project_id: &str) -> Result<Self, AppError> {
        if std::env::var("FIRESTORE_EMULATOR_HOST").is_ok() {
            return Self::create_emulator_client(project_id).await;
        }

        let client = firestore::FirestoreDb::new(project_id)
            .await
            .map_err(|e| AppError::Database(format!("Failed to connect to Firestore: {}", e)))?;

        tracing::info!(project = project_id, "Connected to Firestore");

        Ok(Self {
            client: Some(client),
        })
    }

    /// Create a Firestore client for the emulator with unauthenticated access.
    async fn create_emulator_client(project_id: &str) -> Result<Self, AppError> {
        tracing::info!("Using unauthenticated connection for Firestore Emulator");

        let token_source = gcloud_sdk::ExternalJwtFunctionSource::new(|| async {
            Ok(gcloud_sdk::Token {
                token_type: "Bearer".to_string(),
                token: gcloud_sdk::SecretValue::new(
                    "eyJhbGciOiJub25lIn0.eyJ1aWQiOiJ0ZXN0In0."
                        .to_string()
                        .into(),
                ),
                expiry: chrono::Utc::now() + chrono::Duration::hours(1),
            })
        });

        let options = firestore::FirestoreDbOptions::new(project_id.to_string());

        let client = firestore::FirestoreDb::with_options_token_source(
            options,
            gcloud_sdk::GCP_DEFAULT_SCOPES.clone(),
            gcloud_sdk::TokenSourceType::ExternalSource(Box::new(token_source)),
        )
        .await
        .map_err(|e| {
            AppError::Database(format!("Failed to connect to Firestore Emulator: {}", e))
        })?;

        tracing::info!(
            project = project_id,
            "Connected to Firestore (Emulator/Unauthenticated)"
        );

        Ok(Self {
            client: Some(client),
        })
    }

    /// Create a mock Firestore client for testing (offline mode).
    ///
    /// All database operations will return an error if called.
    pub fn new_mock() -> Self {
        Self { client: None }
    }

    /// Whether this is the offline mock.
    pub fn is_offline(&self) -> bool {
        self.client.is_none()
    }

    fn get_client(&self) -> Result<&firestore::FirestoreDb, AppError> {
        self.client
            .as_ref()
            .ok_or_else(|| AppError::Database("Database not connected (offline mode)".to_string()))
    }

    /// Path of the `users/{uid}` document that owns the subcollections.
    fn user_path(&self, user_id: &str) -> Result<ParentPathBuilder, AppError> {
        self.get_client()?
            .parent_path(collections::USERS, user_id)
            .map_err(|e| AppError::Database(e.to_string()))
    }

    // ─── Workout Operations ──────────────────────────────────────

    /// List a user's workouts ordered by name.
    pub async fn list_workouts(&self, user_id: &str) -> Result<Vec<Workout>, AppError> {
        let parent = self.user_path(user_id)?;
        let mut workouts: Vec<Workout> = self
            .get_client()?
            .fluent()
            .select()
            .from(collections::WORKOUTS)
            .parent(&parent)
            .order_by([("name", FirestoreQueryDirection::Ascending)])
            .obj()
            .query()
            .await
            .map_err(|e| AppError::Database(e.to_string()))?;

        workouts.iter_mut().for_each(Workout::normalize);
        Ok(workouts)
    }

    /// Get a workout by id.
    pub async fn get_workout(
        &self,
        user_id: &str,
        workout_id: &str,
    ) -> Result<Option<Workout>, AppError> {
        let parent = self.user_path(user_id)?;
        let workout: Option<Workout> = self
            .get_client()?
            .fluent()
            .select()
            .by_id_in(collections::WORKOUTS)
            .parent(&parent)
            .obj()
            .one(workout_id)
            .await
            .map_err(|e| AppError::Database(e.to_string()))?;

        Ok(workout.map(|mut w| {
            w.id = workout_id.to_string();
            w.normalize();
            w
        }))
    }

    /// Create or replace a workout. Assigns an id when the workout has none.
    pub async fn upsert_workout(
        &self,
        user_id: &str,
        workout: &Workout,
    ) -> Result<Workout, AppError> {
        let mut workout = workout.clone();
        if workout.id.is_empty() {
            workout.id = uuid::Uuid::new_v4().to_string();
        }
        workout.schema_version = SCHEMA_VERSION;
        workout.normalize();

        let parent = self.user_path(user_id)?;
        let _: () = self
            .get_client()?
            .fluent()
            .update()
            .in_col(collections::WORKOUTS)
            .document_id(&workout.id)
            .parent(&parent)
            .object(&workout)
            .execute()
            .await
            .map_err(|e| AppError::Database(e.to_string()))?;

        tracing::debug!(user_id, workout_id = %workout.id, "Workout saved");
        Ok(workout)
    }

    pub async fn delete_workout(&self, user_id: &str, workout_id: &str) -> Result<(), AppError> {
        let parent = self.user_path(user_id)?;
        self.get_client()?
            .fluent()
            .delete()
            .from(collections::WORKOUTS)
            .document_id(workout_id)
            .parent(&parent)
            .execute()
            .await
            .map_err(|e| AppError::Database(e.to_string()))?;

        tracing::info!(user_id, workout_id, "Workout deleted");
        Ok(())
    }

    // ─── Log Operations ──────────────────────────────────────────

    /// Append a new log and return its id.
    pub async fn append_log(&self, user_id: &str, log: &WorkoutLog) -> Result<String, AppError> {
        let mut log = log.clone();
        log.id = uuid::Uuid::new_v4().to_string();
        log.schema_version = SCHEMA_VERSION;
        log.normalize();

        let parent = self.user_path(user_id)?;
        let _: () = self
            .get_client()?
            .fluent()
            .update()
            .in_col(collections::LOGS)
            .document_id(&log.id)
            .parent(&parent)
            .object(&log)
            .execute()
            .await
            .map_err(|e| AppError::Database(e.to_string()))?;

        tracing::info!(
            user_id,
            log_id = %log.id,
            workout_id = %log.workout_id,
            completion = log.completion_percentage,
            "Workout log appended"
        );
        Ok(log.id)
    }

    pub async fn get_log(&self, user_id: &str, log_id: &str) -> Result<Option<WorkoutLog>, AppError> {
        let parent = self.user_path(user_id)?;
        let log: Option<WorkoutLog> = self
            .get_client()?
            .fluent()
            .select()
            .by_id_in(collections::LOGS)
            .parent(&parent)
            .obj()
            .one(log_id)
            .await
            .map_err(|e| AppError::Database(e.to_string()))?;

        Ok(log.map(|mut l| {
            l.id = log_id.to_string();
            l.normalize();
            l
        }))
    }

    /// Replace an existing log.
    pub async fn update_log(&self, user_id: &str, log: &WorkoutLog) -> Result<(), AppError> {
        let mut log = log.clone();
        log.schema_version = SCHEMA_VERSION;
        log.normalize();

        let parent = self.user_path(user_id)?;
        let _: () = self
            .get_client()?
            .fluent()
            .update()
            .in_col(collections::LOGS)
            .document_id(&log.id)
            .parent(&parent)
            .object(&log)
            .execute()
            .await
            .map_err(|e| AppError::Database(e.to_string()))?;
        Ok(())
    }

    pub async fn delete_log(&self, user_id: &str, log_id: &str) -> Result<(), AppError> {
        let parent = self.user_path(user_id)?;
        self.get_client()?
            .fluent()
            .delete()
            .from(collections::LOGS)
            .document_id(log_id)
            .parent(&parent)
            .execute()
            .await
            .map_err(|e| AppError::Database(e.to_string()))?;

        tracing::info!(user_id, log_id, "Workout log deleted");
        Ok(())
    }

    /// List logs, most recent first, optionally limited to one "YYYY-MM" month.
    ///
    /// Dates are stored as RFC3339 timestamps or bare days, both of which
    /// sort lexically, so the month filter is a half-open string range.
    pub async fn list_logs(
        &self,
        user_id: &str,
        month: Option<&str>,
    ) -> Result<Vec<WorkoutLog>, AppError> {
        let parent = self.user_path(user_id)?;
        let query = self
            .get_client()?
            .fluent()
            .select()
            .from(collections::LOGS)
            .parent(&parent);

        let query = match month {
            Some(month) => {
                let start = month.to_string();
                let end = next_month_key(month)
                    .ok_or_else(|| AppError::BadRequest(format!("Invalid month: {}", month)))?;
                query.filter(move |q| {
                    q.for_all([
                        q.field("date").greater_than_or_equal(start.clone()),
                        q.field("date").less_than(end.clone()),
                    ])
                })
            }
            None => query,
        };

        let mut logs: Vec<WorkoutLog> = query
            .order_by([("date", FirestoreQueryDirection::Descending)])
            .obj()
            .query()
            .await
            .map_err(|e| AppError::Database(e.to_string()))?;

        logs.iter_mut().for_each(WorkoutLog::normalize);
        Ok(logs)
    }

    // ─── Diet Operations ─────────────────────────────────────────

    /// The user's meal plan, `None` when nothing was saved yet.
    pub async fn get_diet(&self, user_id: &str) -> Result<Option<DietPlan>, AppError> {
        let parent = self.user_path(user_id)?;
        let plan: Option<DietPlan> = self
            .get_client()?
            .fluent()
            .select()
            .by_id_in(collections::DIET)
            .parent(&parent)
            .obj()
            .one(collections::DIET_DOC)
            .await
            .map_err(|e| AppError::Database(e.to_string()))?;

        Ok(plan.map(|mut p| {
            p.normalize();
            p
        }))
    }

    /// Replace the user's meal plan as a whole.
    pub async fn set_diet(&self, user_id: &str, plan: &DietPlan) -> Result<DietPlan, AppError> {
        let mut plan = plan.clone();
        plan.normalize();
        plan.updated_at = format_utc_rfc3339(chrono::Utc::now());

        let parent = self.user_path(user_id)?;
        let _: () = self
            .get_client()?
            .fluent()
            .update()
            .in_col(collections::DIET)
            .document_id(collections::DIET_DOC)
            .parent(&parent)
            .object(&plan)
            .execute()
            .await
            .map_err(|e| AppError::Database(e.to_string()))?;

        tracing::info!(user_id, meals = plan.meals.len(), "Diet saved");
        Ok(plan)
    }
}
