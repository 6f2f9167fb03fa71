// SPDX-License-Identifier: MIT
// Copyright 2026 Roland Dreier <roland@rolandd.dev>

//! Workout execution endpoints.

use crate::error::Result;
use crate::middleware::auth::AuthUser;
use crate::models::coerce::{lenient_f64, lenient_u32};
use crate::models::{SessionView, WorkoutLog};
use crate::routes::api::fetch_workout;
use crate::services::{ExecutionSession, SetToggle};
use crate::AppState;
use axum::{
    extract::{Path, State},
    http::StatusCode,
    routing::{post, put},
    Extension, Json, Router,
};
use serde::{Deserialize, Serialize};
use std::sync::Arc;
#[cfg(feature = "binding-generation")]
use ts_rs::TS;

pub fn routes() -> Router<Arc<AppState>> {
    Router::new()
        .route(
            "/api/sessions/{workout_id}",
            post(open_session).get(get_session).delete(reset_session),
        )
        .route("/api/sessions/{workout_id}/sets", post(toggle_set))
        .route(
            "/api/sessions/{workout_id}/exercises/{exercise_id}/toggle",
            post(toggle_exercise),
        )
        .route("/api/sessions/{workout_id}/weights", put(set_weight))
        .route("/api/sessions/{workout_id}/finish", post(finish_session))
}

#[derive(Deserialize)]
#[cfg_attr(feature = "binding-generation", derive(TS))]
#[cfg_attr(
    feature = "binding-generation",
    ts(export, export_to = "web/src/lib/generated/")
)]
pub struct ToggleSetRequest {
    pub exercise_id: String,
    #[serde(deserialize_with = "lenient_u32")]
    pub set_index: u32,
}

#[derive(Serialize)]
#[cfg_attr(feature = "binding-generation", derive(TS))]
#[cfg_attr(
    feature = "binding-generation",
    ts(export, export_to = "web/src/lib/generated/")
)]
pub struct ToggleSetResponse {
    /// "completed", "uncompleted" or "ignored"
    pub outcome: String,
    pub session: SessionView,
}

#[derive(Deserialize)]
#[cfg_attr(feature = "binding-generation", derive(TS))]
#[cfg_attr(
    feature = "binding-generation",
    ts(export, export_to = "web/src/lib/generated/")
)]
pub struct SetWeightRequest {
    pub exercise_id: String,
    /// Accepts numbers or strings such as "42,5"
    #[serde(deserialize_with = "lenient_f64")]
    pub weight: f64,
}

/// The open session, opening it from the stored workout if needed.
async fn session_for(
    state: &AppState,
    user_id: &str,
    workout_id: &str,
) -> Result<Arc<ExecutionSession>> {
    if let Some(session) = state.sessions.get(user_id, workout_id) {
        return Ok(session);
    }
    let workout = fetch_workout(state, user_id, workout_id).await?;
    Ok(state.sessions.open(user_id, workout))
}

async fn open_session(
    State(state): State<Arc<AppState>>,
    Extension(user): Extension<AuthUser>,
    Path(workout_id): Path<String>,
) -> Result<Json<SessionView>> {
    let session = session_for(&state, &user.user_id, &workout_id).await?;
    Ok(Json(session.snapshot()))
}

async fn get_session(
    State(state): State<Arc<AppState>>,
    Extension(user): Extension<AuthUser>,
    Path(workout_id): Path<String>,
) -> Result<Json<SessionView>> {
    let session = session_for(&state, &user.user_id, &workout_id).await?;
    Ok(Json(session.snapshot()))
}

async fn reset_session(
    State(state): State<Arc<AppState>>,
    Extension(user): Extension<AuthUser>,
    Path(workout_id): Path<String>,
) -> Result<StatusCode> {
    let session = session_for(&state, &user.user_id, &workout_id).await?;
    session.reset()?;
    Ok(StatusCode::NO_CONTENT)
}

async fn toggle_set(
    State(state): State<Arc<AppState>>,
    Extension(user): Extension<AuthUser>,
    Path(workout_id): Path<String>,
    Json(request): Json<ToggleSetRequest>,
) -> Result<Json<ToggleSetResponse>> {
    let session = session_for(&state, &user.user_id, &workout_id).await?;
    let outcome = match session.toggle_set(&request.exercise_id, request.set_index)? {
        SetToggle::Completed => "completed",
        SetToggle::Uncompleted => "uncompleted",
        SetToggle::Ignored => "ignored",
    };

    Ok(Json(ToggleSetResponse {
        outcome: outcome.to_string(),
        session: session.snapshot(),
    }))
}

async fn toggle_exercise(
    State(state): State<Arc<AppState>>,
    Extension(user): Extension<AuthUser>,
    Path((workout_id, exercise_id)): Path<(String, String)>,
) -> Result<Json<SessionView>> {
    let session = session_for(&state, &user.user_id, &workout_id).await?;
    session.toggle_exercise_full(&exercise_id)?;
    Ok(Json(session.snapshot()))
}

async fn set_weight(
    State(state): State<Arc<AppState>>,
    Extension(user): Extension<AuthUser>,
    Path(workout_id): Path<String>,
    Json(request): Json<SetWeightRequest>,
) -> Result<Json<SessionView>> {
    let session = session_for(&state, &user.user_id, &workout_id).await?;
    session.set_weight(&request.exercise_id, request.weight)?;
    Ok(Json(session.snapshot()))
}

async fn finish_session(
    State(state): State<Arc<AppState>>,
    Extension(user): Extension<AuthUser>,
    Path(workout_id): Path<String>,
) -> Result<(StatusCode, Json<WorkoutLog>)> {
    let session = session_for(&state, &user.user_id, &workout_id).await?;
    let log = session.finish(&state.db).await?;
    state.sessions.remove(&user.user_id, &workout_id);
    Ok((StatusCode::CREATED, Json(log)))
}
