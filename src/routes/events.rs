// SPDX-License-Identifier: MIT
// Copyright 2026 Roland Dreier <roland@rolandd.dev>

//! Push channel to open app windows, plus the client state they report back.

use crate::error::{AppError, Result};
use crate::middleware::auth::AuthUser;
use crate::notifications::{ClickAction, PushEnvelope, PushEvent};
use crate::timer::{Permission, REST_TIMER_TAG};
use crate::AppState;
use axum::{
    extract::State,
    http::StatusCode,
    response::sse::{Event, KeepAlive, Sse},
    routing::{get, post, put},
    Extension, Json, Router,
};
use serde::Deserialize;
use std::sync::Arc;
use tokio_stream::wrappers::errors::BroadcastStreamRecvError;
use tokio_stream::wrappers::BroadcastStream;
use tokio_stream::{Stream, StreamExt};

pub fn routes() -> Router<Arc<AppState>> {
    Router::new()
        .route("/api/events", get(event_stream))
        .route("/api/client/permission", put(report_permission))
        .route("/api/client/visibility", put(report_visibility))
        .route("/api/notifications/click", post(notification_click))
}

fn to_event(event: &PushEvent) -> std::result::Result<Event, axum::Error> {
    Event::default().json_data(event)
}

/// Server-sent events for one app window.
///
/// The window stays registered (and counts as a place to deliver audio
/// and focus) for as long as the stream is open.
async fn event_stream(
    State(state): State<Arc<AppState>>,
    Extension(user): Extension<AuthUser>,
) -> Sse<impl Stream<Item = std::result::Result<Event, axum::Error>>> {
    // Subscribe before registering so nothing sent in between is lost
    let rx = state.notifications.subscribe();
    let registration = state.notifications.register_window(&user.user_id);

    let hello = to_event(&PushEvent::Hello {
        window_id: registration.window_id().to_string(),
    });

    let user_id = user.user_id;
    let updates = BroadcastStream::new(rx).filter_map(move |message| {
        let _window = &registration;
        match message {
            Ok(PushEnvelope { user_id: to, event }) if to == user_id => Some(to_event(&event)),
            Ok(_) => None,
            Err(BroadcastStreamRecvError::Lagged(skipped)) => {
                tracing::warn!(user_id = %user_id, skipped, "Event stream lagged");
                None
            }
        }
    });

    Sse::new(tokio_stream::once(hello).chain(updates)).keep_alive(KeepAlive::default())
}

#[derive(Deserialize)]
struct PermissionRequest {
    permission: Permission,
}

async fn report_permission(
    State(state): State<Arc<AppState>>,
    Extension(user): Extension<AuthUser>,
    Json(request): Json<PermissionRequest>,
) -> StatusCode {
    state
        .notifications
        .set_permission(&user.user_id, request.permission);
    StatusCode::NO_CONTENT
}

#[derive(Deserialize)]
struct VisibilityRequest {
    window_id: String,
    visible: bool,
}

async fn report_visibility(
    State(state): State<Arc<AppState>>,
    Extension(user): Extension<AuthUser>,
    Json(request): Json<VisibilityRequest>,
) -> Result<StatusCode> {
    if !state
        .notifications
        .set_visibility(&user.user_id, &request.window_id, request.visible)
    {
        return Err(AppError::NotFound(format!("Window {}", request.window_id)));
    }
    Ok(StatusCode::NO_CONTENT)
}

#[derive(Deserialize, Default)]
struct ClickRequest {
    tag: Option<String>,
}

async fn notification_click(
    State(state): State<Arc<AppState>>,
    Extension(user): Extension<AuthUser>,
    body: Option<Json<ClickRequest>>,
) -> Json<ClickAction> {
    let Json(request) = body.unwrap_or_default();
    let tag = request.tag.as_deref().unwrap_or(REST_TIMER_TAG);
    Json(state.notifications.click(&user.user_id, tag))
}
