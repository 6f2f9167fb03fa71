// SPDX-License-Identifier: MIT
// Copyright 2026 Roland Dreier <roland@rolandd.dev>

//! Notification, vibration and audio alert primitives.

use serde::{Deserialize, Serialize};
#[cfg(feature = "binding-generation")]
use ts_rs::TS;

use crate::models::ActiveRest;

/// Shared tag so a newer rest notification replaces the previous one.
pub const REST_TIMER_TAG: &str = "rest-timer";

/// Short buzz for the in-app expiry signal.
pub const FOREGROUND_VIBRATION: &[u32] = &[200, 100, 200];

/// Strong pattern for the background notification (noticeable in a pocket).
pub const BACKGROUND_VIBRATION: &[u32] = &[
    500, 110, 500, 110, 450, 110, 200, 110, 170, 40, 450, 110, 200, 110, 170, 40,
];

/// Notification permission as reported by the client.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
#[cfg_attr(feature = "binding-generation", derive(TS))]
#[cfg_attr(
    feature = "binding-generation",
    ts(export, export_to = "web/src/lib/generated/")
)]
pub enum Permission {
    Granted,
    Denied,
    /// Not asked yet
    #[default]
    Default,
}

/// A system notification.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[cfg_attr(feature = "binding-generation", derive(TS))]
#[cfg_attr(
    feature = "binding-generation",
    ts(export, export_to = "web/src/lib/generated/")
)]
pub struct Notification {
    pub title: String,
    pub body: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub icon: Option<String>,
    pub tag: String,
    /// Alert again even if a notification with the same tag is showing
    pub renotify: bool,
    /// Stay visible until dismissed
    pub require_interaction: bool,
    pub silent: bool,
    pub vibrate: Vec<u32>,
    /// When the notification was raised (Unix epoch milliseconds)
    #[cfg_attr(feature = "binding-generation", ts(type = "number"))]
    pub timestamp_ms: i64,
}

impl Notification {
    /// The in-app "rest over" notification.
    pub fn rest_over(timestamp_ms: i64) -> Self {
        Self {
            title: "Rest over".to_string(),
            body: "Rest is over! Next set.".to_string(),
            icon: Some("/icon-192.png".to_string()),
            tag: REST_TIMER_TAG.to_string(),
            renotify: true,
            require_interaction: false,
            silent: false,
            vibrate: FOREGROUND_VIBRATION.to_vec(),
            timestamp_ms,
        }
    }
}

#[derive(Debug, thiserror::Error)]
pub enum AlertError {
    #[error("Notification permission not granted")]
    PermissionDenied,

    #[error("No client available: {0}")]
    Unavailable(String),
}

/// Where the foreground timer sends its signals.
///
/// Every method is a best-effort signal; failures are reported but the
/// timer never lets them escape.
pub trait AlertSink: Send + Sync {
    fn permission(&self) -> Permission;
    fn request_permission(&self);
    /// Whether an app window is currently in the foreground.
    fn is_visible(&self) -> bool;
    fn play_audio_cue(&self) -> Result<(), AlertError>;
    fn vibrate(&self, pattern: &[u32]) -> Result<(), AlertError>;
    fn show_notification(&self, notification: Notification) -> Result<(), AlertError>;

    fn on_rest_started(&self, _rest: &ActiveRest) {}
    fn on_rest_cancelled(&self, _rest: &ActiveRest) {}
    fn on_rest_finished(&self, _rest: &ActiveRest) {}
}

/// Receiver of background notifications.
pub trait NotificationSink: Send + Sync {
    fn show(&self, user_id: &str, notification: Notification);
}

#[cfg(test)]
pub(crate) mod testing {
    //! Recording sinks for unit tests.

    use super::*;
    use std::sync::Mutex;

    #[derive(Debug, Clone, PartialEq)]
    pub enum Alert {
        PermissionRequested,
        Audio,
        Vibrate(Vec<u32>),
        Notification(Notification),
        Started(ActiveRest),
        Cancelled(ActiveRest),
        Finished(ActiveRest),
    }

    pub struct RecordingAlerts {
        pub permission: Mutex<Permission>,
        pub visible: Mutex<bool>,
        pub alerts: Mutex<Vec<Alert>>,
    }

    impl RecordingAlerts {
        pub fn new(permission: Permission, visible: bool) -> Self {
            Self {
                permission: Mutex::new(permission),
                visible: Mutex::new(visible),
                alerts: Mutex::new(Vec::new()),
            }
        }

        pub fn take(&self) -> Vec<Alert> {
            std::mem::take(&mut *self.alerts.lock().unwrap())
        }

        pub fn finished_count(&self) -> usize {
            self.alerts
                .lock()
                .unwrap()
                .iter()
                .filter(|a| matches!(a, Alert::Finished(_)))
                .count()
        }

        fn push(&self, alert: Alert) {
            self.alerts.lock().unwrap().push(alert);
        }
    }

    impl AlertSink for RecordingAlerts {
        fn permission(&self) -> Permission {
            *self.permission.lock().unwrap()
        }
        fn request_permission(&self) {
            self.push(Alert::PermissionRequested);
        }
        fn is_visible(&self) -> bool {
            *self.visible.lock().unwrap()
        }
        fn play_audio_cue(&self) -> Result<(), AlertError> {
            self.push(Alert::Audio);
            Ok(())
        }
        fn vibrate(&self, pattern: &[u32]) -> Result<(), AlertError> {
            self.push(Alert::Vibrate(pattern.to_vec()));
            Ok(())
        }
        fn show_notification(&self, notification: Notification) -> Result<(), AlertError> {
            if self.permission() != Permission::Granted {
                return Err(AlertError::PermissionDenied);
            }
            self.push(Alert::Notification(notification));
            Ok(())
        }
        fn on_rest_started(&self, rest: &ActiveRest) {
            self.push(Alert::Started(rest.clone()));
        }
        fn on_rest_cancelled(&self, rest: &ActiveRest) {
            self.push(Alert::Cancelled(rest.clone()));
        }
        fn on_rest_finished(&self, rest: &ActiveRest) {
            self.push(Alert::Finished(rest.clone()));
        }
    }

    #[derive(Default)]
    pub struct RecordingSink {
        pub shown: Mutex<Vec<(String, Notification)>>,
    }

    impl RecordingSink {
        pub fn count(&self) -> usize {
            self.shown.lock().unwrap().len()
        }
    }

    impl NotificationSink for RecordingSink {
        fn show(&self, user_id: &str, notification: Notification) {
            self.shown
                .lock()
                .unwrap()
                .push((user_id.to_string(), notification));
        }
    }
}
