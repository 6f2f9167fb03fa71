// SPDX-License-Identifier: MIT
// Copyright 2026 Roland Dreier <roland@rolandd.dev>

//! Meal plan endpoints.

use crate::error::{AppError, Result};
use crate::middleware::auth::AuthUser;
use crate::models::{DietPlan, Meal};
use crate::services::diet;
use crate::AppState;
use axum::{
    extract::{Path, State},
    routing::{get, post},
    Extension, Json, Router,
};
use serde::Deserialize;
use std::sync::Arc;
#[cfg(feature = "binding-generation")]
use ts_rs::TS;

pub fn routes() -> Router<Arc<AppState>> {
    Router::new()
        .route("/api/diet", get(get_diet).put(save_diet))
        .route("/api/diet/templates", get(list_templates))
        .route("/api/diet/templates/{name}", post(apply_template))
}

/// Full meal list from the editor, in display order.
#[derive(Deserialize)]
#[cfg_attr(feature = "binding-generation", derive(TS))]
#[cfg_attr(
    feature = "binding-generation",
    ts(export, export_to = "web/src/lib/generated/")
)]
pub struct SaveDietRequest {
    pub meals: Vec<Meal>,
}

/// An unreadable plan degrades to an empty one.
async fn get_diet(
    State(state): State<Arc<AppState>>,
    Extension(user): Extension<AuthUser>,
) -> Json<DietPlan> {
    let plan = match state.db.get_diet(&user.user_id).await {
        Ok(plan) => plan.unwrap_or_default(),
        Err(e) => {
            tracing::warn!(user_id = %user.user_id, error = %e, "Failed to load diet, returning empty plan");
            DietPlan::default()
        }
    };
    Json(plan)
}

async fn save_diet(
    State(state): State<Arc<AppState>>,
    Extension(user): Extension<AuthUser>,
    Json(request): Json<SaveDietRequest>,
) -> Result<Json<DietPlan>> {
    let mut plan = DietPlan {
        meals: request.meals,
        ..DietPlan::default()
    };
    if let Err(index) = plan.validate() {
        return Err(AppError::BadRequest(format!(
            "Meal {} needs a time in HH:MM form",
            index + 1
        )));
    }

    let plan = state.db.set_diet(&user.user_id, &plan).await?;
    Ok(Json(plan))
}

async fn list_templates() -> Json<Vec<diet::TemplateView>> {
    Json(diet::templates())
}

/// Replace the user's plan with a copy of a template.
async fn apply_template(
    State(state): State<Arc<AppState>>,
    Extension(user): Extension<AuthUser>,
    Path(name): Path<String>,
) -> Result<Json<DietPlan>> {
    let template = diet::find_template(&name)
        .ok_or_else(|| AppError::NotFound(format!("Diet template {}", name)))?;

    let plan = state.db.set_diet(&user.user_id, &template.to_plan()).await?;
    tracing::info!(user_id = %user.user_id, template = template.name, "Diet template applied");
    Ok(Json(plan))
}
