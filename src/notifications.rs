// SPDX-License-Identifier: MIT
// Copyright 2026 Roland Dreier <roland@rolandd.dev>

//! Delivery of timer signals to connected clients.
//!
//! Each open app window holds a server-sent event stream. The center keeps
//! track of those windows, the notification permission the client reported
//! and the notifications currently on screen, and fans [`PushEvent`]s out on
//! a broadcast channel.

use dashmap::DashMap;
use serde::Serialize;
use std::sync::Arc;
use tokio::sync::broadcast;
#[cfg(feature = "binding-generation")]
use ts_rs::TS;

use crate::models::ActiveRest;
use crate::timer::{AlertError, AlertSink, Notification, NotificationSink, Permission};

/// Event pushed to a user's windows.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(tag = "event", rename_all = "snake_case")]
#[cfg_attr(feature = "binding-generation", derive(TS))]
#[cfg_attr(
    feature = "binding-generation",
    ts(export, export_to = "web/src/lib/generated/")
)]
pub enum PushEvent {
    /// First event on a new stream
    Hello { window_id: String },
    RestStarted {
        exercise_id: String,
        #[cfg_attr(feature = "binding-generation", ts(type = "number"))]
        ends_at_ms: i64,
    },
    RestCancelled { exercise_id: String },
    RestOver { exercise_id: String },
    AudioCue,
    Vibrate { pattern: Vec<u32> },
    Notification(Notification),
    NotificationClosed { tag: String },
    PermissionRequested,
    Focus { window_id: String },
}

/// A [`PushEvent`] addressed to one user.
#[derive(Debug, Clone, Serialize)]
pub struct PushEnvelope {
    pub user_id: String,
    pub event: PushEvent,
}

/// What the client should do after a notification click.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(tag = "action", rename_all = "snake_case")]
pub enum ClickAction {
    Focus { window_id: String },
    OpenWindow { url: String },
}

#[derive(Debug, Clone)]
struct WindowClient {
    id: String,
    visible: bool,
}

pub struct NotificationCenter {
    tx: broadcast::Sender<PushEnvelope>,
    /// Connected windows per user, oldest first
    windows: DashMap<String, Vec<WindowClient>>,
    permissions: DashMap<String, Permission>,
    /// Notifications on screen, keyed by (user, tag)
    shown: DashMap<(String, String), Notification>,
}

impl NotificationCenter {
    pub fn new(capacity: usize) -> Arc<Self> {
        let (tx, _) = broadcast::channel(capacity.max(1));
        Arc::new(Self {
            tx,
            windows: DashMap::new(),
            permissions: DashMap::new(),
            shown: DashMap::new(),
        })
    }

    pub fn subscribe(&self) -> broadcast::Receiver<PushEnvelope> {
        self.tx.subscribe()
    }

    fn publish(&self, user_id: &str, event: PushEvent) {
        let envelope = PushEnvelope {
            user_id: user_id.to_string(),
            event,
        };
        if self.tx.send(envelope).is_err() {
            tracing::trace!(user_id, "No event subscribers");
        }
    }

    /// Register a new window for `user_id`. It is removed when the guard drops.
    pub fn register_window(self: &Arc<Self>, user_id: &str) -> WindowRegistration {
        let window_id = uuid::Uuid::new_v4().to_string();
        self.windows
            .entry(user_id.to_string())
            .or_default()
            .push(WindowClient {
                id: window_id.clone(),
                visible: true,
            });
        tracing::debug!(user_id, window_id = %window_id, "Window connected");

        WindowRegistration {
            center: self.clone(),
            user_id: user_id.to_string(),
            window_id,
        }
    }

    fn unregister_window(&self, user_id: &str, window_id: &str) {
        if let Some(mut windows) = self.windows.get_mut(user_id) {
            windows.retain(|w| w.id != window_id);
        }
        // Shard guard above is released before touching the map again
        self.windows.remove_if(user_id, |_, windows| windows.is_empty());
        tracing::debug!(user_id, window_id, "Window disconnected");
    }

    pub fn window_count(&self, user_id: &str) -> usize {
        self.windows.get(user_id).map(|w| w.len()).unwrap_or(0)
    }

    /// Record a window's visibility. Returns false for unknown windows.
    pub fn set_visibility(&self, user_id: &str, window_id: &str, visible: bool) -> bool {
        let Some(mut windows) = self.windows.get_mut(user_id) else {
            return false;
        };
        match windows.iter_mut().find(|w| w.id == window_id) {
            Some(window) => {
                window.visible = visible;
                true
            }
            None => false,
        }
    }

    pub fn is_visible(&self, user_id: &str) -> bool {
        self.windows
            .get(user_id)
            .is_some_and(|windows| windows.iter().any(|w| w.visible))
    }

    pub fn set_permission(&self, user_id: &str, permission: Permission) {
        tracing::info!(user_id, ?permission, "Notification permission reported");
        self.permissions.insert(user_id.to_string(), permission);
    }

    pub fn permission(&self, user_id: &str) -> Permission {
        self.permissions
            .get(user_id)
            .map(|p| *p)
            .unwrap_or_default()
    }

    /// The notification currently shown for `(user_id, tag)`.
    pub fn shown(&self, user_id: &str, tag: &str) -> Option<Notification> {
        self.shown
            .get(&(user_id.to_string(), tag.to_string()))
            .map(|n| n.clone())
    }

    /// Close the notification and bring an app window forward.
    pub fn click(&self, user_id: &str, tag: &str) -> ClickAction {
        if self
            .shown
            .remove(&(user_id.to_string(), tag.to_string()))
            .is_some()
        {
            self.publish(
                user_id,
                PushEvent::NotificationClosed {
                    tag: tag.to_string(),
                },
            );
        }

        let first_window = self
            .windows
            .get(user_id)
            .and_then(|windows| windows.first().map(|w| w.id.clone()));

        match first_window {
            Some(window_id) => {
                self.publish(
                    user_id,
                    PushEvent::Focus {
                        window_id: window_id.clone(),
                    },
                );
                ClickAction::Focus { window_id }
            }
            None => ClickAction::OpenWindow {
                url: "/".to_string(),
            },
        }
    }

    fn display(&self, user_id: &str, notification: Notification) {
        // Same tag replaces whatever is on screen
        self.shown.insert(
            (user_id.to_string(), notification.tag.clone()),
            notification.clone(),
        );
        self.publish(user_id, PushEvent::Notification(notification));
    }

    /// The alert sink for one user's rest timers.
    pub fn alerts_for(self: &Arc<Self>, user_id: &str) -> Arc<ClientAlerts> {
        Arc::new(ClientAlerts {
            center: self.clone(),
            user_id: user_id.to_string(),
        })
    }
}

impl NotificationSink for NotificationCenter {
    fn show(&self, user_id: &str, notification: Notification) {
        match self.permission(user_id) {
            Permission::Granted => self.display(user_id, notification),
            permission => {
                tracing::debug!(user_id, ?permission, "Background notification suppressed");
            }
        }
    }
}

/// Keeps a window registered while an event stream is open.
pub struct WindowRegistration {
    center: Arc<NotificationCenter>,
    user_id: String,
    window_id: String,
}

impl WindowRegistration {
    pub fn window_id(&self) -> &str {
        &self.window_id
    }
}

impl Drop for WindowRegistration {
    fn drop(&mut self) {
        self.center
            .unregister_window(&self.user_id, &self.window_id);
    }
}

/// [`AlertSink`] backed by a user's connected windows.
pub struct ClientAlerts {
    center: Arc<NotificationCenter>,
    user_id: String,
}

impl ClientAlerts {
    fn require_window(&self) -> Result<(), AlertError> {
        if self.center.window_count(&self.user_id) == 0 {
            return Err(AlertError::Unavailable(format!(
                "no window open for {}",
                self.user_id
            )));
        }
        Ok(())
    }
}

impl AlertSink for ClientAlerts {
    fn permission(&self) -> Permission {
        self.center.permission(&self.user_id)
    }

    fn request_permission(&self) {
        self.center
            .publish(&self.user_id, PushEvent::PermissionRequested);
    }

    fn is_visible(&self) -> bool {
        self.center.is_visible(&self.user_id)
    }

    fn play_audio_cue(&self) -> Result<(), AlertError> {
        self.require_window()?;
        self.center.publish(&self.user_id, PushEvent::AudioCue);
        Ok(())
    }

    fn vibrate(&self, pattern: &[u32]) -> Result<(), AlertError> {
        self.require_window()?;
        self.center.publish(
            &self.user_id,
            PushEvent::Vibrate {
                pattern: pattern.to_vec(),
            },
        );
        Ok(())
    }

    fn show_notification(&self, notification: Notification) -> Result<(), AlertError> {
        if self.permission() != Permission::Granted {
            return Err(AlertError::PermissionDenied);
        }
        self.center.display(&self.user_id, notification);
        Ok(())
    }

    fn on_rest_started(&self, rest: &ActiveRest) {
        self.center.publish(
            &self.user_id,
            PushEvent::RestStarted {
                exercise_id: rest.exercise_id.clone(),
                ends_at_ms: rest.ends_at_ms,
            },
        );
    }

    fn on_rest_cancelled(&self, rest: &ActiveRest) {
        self.center.publish(
            &self.user_id,
            PushEvent::RestCancelled {
                exercise_id: rest.exercise_id.clone(),
            },
        );
    }

    fn on_rest_finished(&self, rest: &ActiveRest) {
        self.center.publish(
            &self.user_id,
            PushEvent::RestOver {
                exercise_id: rest.exercise_id.clone(),
            },
        );
    }
}
