// SPDX-License-Identifier: MIT
// Copyright 2026 Roland Dreier <roland@rolandd.dev>

//! API routes for workouts, logs, statistics and the exercise catalog.

use crate::error::{AppError, Result};
use crate::middleware::auth::AuthUser;
use crate::models::{ChartPoint, DayLogs, Exercise, MonthlyProgress, Workout, WorkoutLog};
use crate::services::{catalog, history};
use crate::time_utils::{format_utc_rfc3339, is_valid_month_key, parse_log_date};
use crate::AppState;
use axum::{
    extract::{Path, Query, State},
    http::StatusCode,
    routing::{get, put},
    Extension, Json, Router,
};
use serde::Deserialize;
use std::sync::Arc;
#[cfg(feature = "binding-generation")]
use ts_rs::TS;

/// API routes (require authentication via JWT).
/// The auth middleware is applied in routes/mod.rs for these routes.
pub fn routes() -> Router<Arc<AppState>> {
    Router::new()
        .route("/api/workouts", get(list_workouts).post(create_workout))
        .route(
            "/api/workouts/{id}",
            get(get_workout).put(update_workout).delete(delete_workout),
        )
        .route("/api/logs", get(list_logs).post(add_log))
        .route("/api/logs/calendar", get(log_calendar))
        .route("/api/logs/{id}", put(update_log).delete(delete_log))
        .route("/api/stats/monthly", get(monthly_stats))
        .route("/api/stats/load", get(load_stats))
        .route("/api/catalog", get(search_catalog))
}

/// Read failures on list endpoints degrade to an empty list.
fn or_empty<T>(result: Result<Vec<T>>, user_id: &str, what: &str) -> Vec<T> {
    result.unwrap_or_else(|e| {
        tracing::warn!(user_id, error = %e, "Failed to load {}, returning empty list", what);
        Vec::new()
    })
}

// ─── Workouts ────────────────────────────────────────────────

/// New workout from the editor.
#[derive(Deserialize)]
#[cfg_attr(feature = "binding-generation", derive(TS))]
#[cfg_attr(
    feature = "binding-generation",
    ts(export, export_to = "web/src/lib/generated/")
)]
pub struct CreateWorkoutRequest {
    pub name: String,
    pub exercises: Vec<Exercise>,
}

/// Partial workout update.
#[derive(Deserialize, Default)]
#[cfg_attr(feature = "binding-generation", derive(TS))]
#[cfg_attr(
    feature = "binding-generation",
    ts(export, export_to = "web/src/lib/generated/")
)]
pub struct UpdateWorkoutRequest {
    pub name: Option<String>,
    pub exercises: Option<Vec<Exercise>>,
    /// New exercise order as a permutation of exercise ids
    pub order: Option<Vec<String>>,
}

async fn list_workouts(
    State(state): State<Arc<AppState>>,
    Extension(user): Extension<AuthUser>,
) -> Json<Vec<Workout>> {
    let workouts = state.db.list_workouts(&user.user_id).await;
    Json(or_empty(workouts, &user.user_id, "workouts"))
}

async fn create_workout(
    State(state): State<Arc<AppState>>,
    Extension(user): Extension<AuthUser>,
    Json(request): Json<CreateWorkoutRequest>,
) -> Result<(StatusCode, Json<Workout>)> {
    let name = request.name.trim();
    if name.is_empty() {
        return Err(AppError::BadRequest("Workout name is required".to_string()));
    }
    if request.exercises.is_empty() {
        return Err(AppError::BadRequest(
            "A workout needs at least one exercise".to_string(),
        ));
    }

    let mut workout = Workout {
        schema_version: crate::models::SCHEMA_VERSION,
        id: String::new(),
        name: name.to_string(),
        exercises: request.exercises,
        created_at: format_utc_rfc3339(chrono::Utc::now()),
    };
    workout.exercises.iter_mut().for_each(catalog::enrich);

    let workout = state.db.upsert_workout(&user.user_id, &workout).await?;
    tracing::info!(
        user_id = %user.user_id,
        workout_id = %workout.id,
        exercises = workout.exercises.len(),
        "Workout created"
    );
    Ok((StatusCode::CREATED, Json(workout)))
}

pub(crate) async fn fetch_workout(state: &AppState, user_id: &str, workout_id: &str) -> Result<Workout> {
    state
        .db
        .get_workout(user_id, workout_id)
        .await?
        .ok_or_else(|| AppError::NotFound(format!("Workout {}", workout_id)))
}

async fn get_workout(
    State(state): State<Arc<AppState>>,
    Extension(user): Extension<AuthUser>,
    Path(id): Path<String>,
) -> Result<Json<Workout>> {
    Ok(Json(fetch_workout(&state, &user.user_id, &id).await?))
}

async fn update_workout(
    State(state): State<Arc<AppState>>,
    Extension(user): Extension<AuthUser>,
    Path(id): Path<String>,
    Json(request): Json<UpdateWorkoutRequest>,
) -> Result<Json<Workout>> {
    let mut workout = fetch_workout(&state, &user.user_id, &id).await?;

    if let Some(name) = request.name {
        let name = name.trim();
        if name.is_empty() {
            return Err(AppError::BadRequest("Workout name is required".to_string()));
        }
        workout.name = name.to_string();
    }
    if let Some(mut exercises) = request.exercises {
        exercises.iter_mut().for_each(catalog::enrich);
        workout.exercises = exercises;
    }
    if let Some(order) = request.order {
        workout.reorder(&order).map_err(AppError::BadRequest)?;
    }

    let workout = state.db.upsert_workout(&user.user_id, &workout).await?;

    // Reopened with the new routine; saved progress carries over
    state.sessions.remove(&user.user_id, &id);

    Ok(Json(workout))
}

async fn delete_workout(
    State(state): State<Arc<AppState>>,
    Extension(user): Extension<AuthUser>,
    Path(id): Path<String>,
) -> Result<StatusCode> {
    state.db.delete_workout(&user.user_id, &id).await?;
    state.sessions.discard(&user.user_id, &id)?;
    Ok(StatusCode::NO_CONTENT)
}

// ─── Logs ────────────────────────────────────────────────────

/// Log added by hand from the history calendar.
#[derive(Deserialize)]
#[cfg_attr(feature = "binding-generation", derive(TS))]
#[cfg_attr(
    feature = "binding-generation",
    ts(export, export_to = "web/src/lib/generated/")
)]
pub struct AddLogRequest {
    pub workout_id: String,
    /// "YYYY-MM-DD" or RFC3339
    pub date: String,
}

#[derive(Deserialize, Default)]
#[cfg_attr(feature = "binding-generation", derive(TS))]
#[cfg_attr(
    feature = "binding-generation",
    ts(export, export_to = "web/src/lib/generated/")
)]
pub struct UpdateLogRequest {
    pub workout_id: Option<String>,
    pub date: Option<String>,
}

#[derive(Deserialize)]
struct CalendarQuery {
    month: String,
}

async fn list_logs(
    State(state): State<Arc<AppState>>,
    Extension(user): Extension<AuthUser>,
) -> Json<Vec<WorkoutLog>> {
    let mut logs = or_empty(
        state.db.list_logs(&user.user_id, None).await,
        &user.user_id,
        "logs",
    );
    history::sort_recent_first(&mut logs);
    Json(logs)
}

async fn add_log(
    State(state): State<Arc<AppState>>,
    Extension(user): Extension<AuthUser>,
    Json(request): Json<AddLogRequest>,
) -> Result<(StatusCode, Json<WorkoutLog>)> {
    let workout = fetch_workout(&state, &user.user_id, &request.workout_id).await?;
    let mut log = history::manual_log(&workout, request.date.trim())?;

    log.id = state.db.append_log(&user.user_id, &log).await?;
    Ok((StatusCode::CREATED, Json(log)))
}

async fn update_log(
    State(state): State<Arc<AppState>>,
    Extension(user): Extension<AuthUser>,
    Path(id): Path<String>,
    Json(request): Json<UpdateLogRequest>,
) -> Result<Json<WorkoutLog>> {
    let mut log = state
        .db
        .get_log(&user.user_id, &id)
        .await?
        .ok_or_else(|| AppError::NotFound(format!("Log {}", id)))?;

    if let Some(workout_id) = request.workout_id {
        let workout = fetch_workout(&state, &user.user_id, &workout_id).await?;
        log.workout_id = workout.id;
        log.workout_name = workout.name;
    }
    if let Some(date) = request.date {
        let date = date.trim();
        if parse_log_date(date).is_none() {
            return Err(AppError::BadRequest(format!("Invalid date: {}", date)));
        }
        log.date = date.to_string();
    }

    state.db.update_log(&user.user_id, &log).await?;
    Ok(Json(log))
}

async fn delete_log(
    State(state): State<Arc<AppState>>,
    Extension(user): Extension<AuthUser>,
    Path(id): Path<String>,
) -> Result<StatusCode> {
    state.db.delete_log(&user.user_id, &id).await?;
    Ok(StatusCode::NO_CONTENT)
}

async fn log_calendar(
    State(state): State<Arc<AppState>>,
    Extension(user): Extension<AuthUser>,
    Query(query): Query<CalendarQuery>,
) -> Result<Json<Vec<DayLogs>>> {
    if !is_valid_month_key(&query.month) {
        return Err(AppError::BadRequest(format!(
            "Invalid month: {} (expected YYYY-MM)",
            query.month
        )));
    }

    let logs = or_empty(
        state.db.list_logs(&user.user_id, Some(&query.month)).await,
        &user.user_id,
        "logs",
    );
    Ok(Json(history::group_by_day(&logs, Some(&query.month))))
}

// ─── Statistics ──────────────────────────────────────────────

#[derive(Deserialize)]
struct LoadQuery {
    exercise: Option<String>,
}

async fn monthly_stats(
    State(state): State<Arc<AppState>>,
    Extension(user): Extension<AuthUser>,
) -> Json<MonthlyProgress> {
    let logs = or_empty(
        state.db.list_logs(&user.user_id, None).await,
        &user.user_id,
        "logs",
    );
    Json(history::monthly_progress(
        &logs,
        chrono::Utc::now(),
        state.config.monthly_goal,
    ))
}

async fn load_stats(
    State(state): State<Arc<AppState>>,
    Extension(user): Extension<AuthUser>,
    Query(query): Query<LoadQuery>,
) -> Json<Vec<ChartPoint>> {
    let logs = or_empty(
        state.db.list_logs(&user.user_id, None).await,
        &user.user_id,
        "logs",
    );
    Json(history::load_chart(&logs, query.exercise.as_deref()))
}

// ─── Catalog ─────────────────────────────────────────────────

#[derive(Deserialize)]
struct CatalogQuery {
    q: Option<String>,
}

async fn search_catalog(Query(query): Query<CatalogQuery>) -> Json<Vec<catalog::Suggestion>> {
    Json(catalog::suggest(query.q.as_deref().unwrap_or_default()))
}
