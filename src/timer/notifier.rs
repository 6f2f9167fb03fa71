// SPDX-License-Identifier: MIT
// Copyright 2026 Roland Dreier <roland@rolandd.dev>

//! Background notifier actor.
//!
//! Runs independently of any request or session. It receives one-way
//! messages from foreground rest timers, sleeps for the requested duration
//! and raises a system notification when the rest is over. Nothing is ever
//! sent back to the foreground.
//!
//! Every delayed notification runs on a [`TaskTracker`], which is the
//! explicit keep-alive for pending work: shutdown closes the tracker and
//! waits for outstanding sleeps instead of dropping them.

use dashmap::DashMap;
use serde::{Deserialize, Serialize};
use std::sync::Arc;
use std::time::Duration;
use tokio::sync::mpsc;
use tokio::task::JoinHandle;
use tokio_util::sync::CancellationToken;
use tokio_util::task::TaskTracker;

use super::alerts::{Notification, NotificationSink, BACKGROUND_VIBRATION, REST_TIMER_TAG};
use super::clock::Clock;

/// Message from a foreground timer to the background notifier.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "SCREAMING_SNAKE_CASE")]
pub enum NotifierMessage {
    /// Notify `user_id` after `seconds`, unless superseded or cancelled.
    StartTimer {
        user_id: String,
        seconds: u64,
        generation: u64,
    },
    /// Drop the pending notification started with `generation`.
    CancelTimer { user_id: String, generation: u64 },
}

/// Content and behaviour of the background notification.
#[derive(Debug, Clone)]
pub struct NotifierSettings {
    pub title: String,
    pub body: String,
    pub icon: Option<String>,
    pub require_interaction: bool,
}

impl Default for NotifierSettings {
    fn default() -> Self {
        Self {
            title: "Workout Tracker".to_string(),
            body: "Rest is over! Next set.".to_string(),
            icon: Some("/icon-192.png".to_string()),
            require_interaction: true,
        }
    }
}

impl NotifierSettings {
    fn notification(&self, timestamp_ms: i64) -> Notification {
        Notification {
            title: self.title.clone(),
            body: self.body.clone(),
            icon: self.icon.clone(),
            tag: REST_TIMER_TAG.to_string(),
            renotify: true,
            require_interaction: self.require_interaction,
            silent: false,
            vibrate: BACKGROUND_VIBRATION.to_vec(),
            timestamp_ms,
        }
    }
}

/// Sending side of the notifier channel.
///
/// Delivery is at-most-once: a full or closed channel drops the message.
#[derive(Debug, Clone)]
pub struct NotifierHandle {
    tx: mpsc::Sender<NotifierMessage>,
}

impl NotifierHandle {
    /// Post a message without waiting. Returns whether it was queued.
    pub fn post(&self, message: NotifierMessage) -> bool {
        match self.tx.try_send(message) {
            Ok(()) => true,
            Err(mpsc::error::TrySendError::Full(message)) => {
                tracing::warn!(?message, "Notifier queue full, message dropped");
                false
            }
            Err(mpsc::error::TrySendError::Closed(message)) => {
                tracing::warn!(?message, "Notifier stopped, message dropped");
                false
            }
        }
    }

    /// A handle whose receiver is already gone (every post is dropped).
    pub fn disconnected() -> Self {
        let (tx, _) = mpsc::channel(1);
        Self { tx }
    }
}

/// Running notifier; keep it around to shut down cleanly.
pub struct NotifierTask {
    join: JoinHandle<()>,
    tracker: TaskTracker,
    shutdown: CancellationToken,
}

impl NotifierTask {
    /// Stop receiving messages and wait up to `grace` for pending notifications.
    pub async fn shutdown(self, grace: Duration) {
        self.shutdown.cancel();
        if let Err(e) = self.join.await {
            tracing::warn!(error = %e, "Notifier loop ended abnormally");
        }

        self.tracker.close();
        let pending = self.tracker.len();
        if tokio::time::timeout(grace, self.tracker.wait()).await.is_err() {
            tracing::warn!(
                pending,
                grace_secs = grace.as_secs(),
                "Pending rest notifications abandoned at shutdown"
            );
        } else {
            tracing::info!("Background notifier stopped");
        }
    }
}

/// The background notifier actor.
pub struct BackgroundNotifier {
    rx: mpsc::Receiver<NotifierMessage>,
    sink: Arc<dyn NotificationSink>,
    clock: Arc<dyn Clock>,
    settings: Arc<NotifierSettings>,
    tracker: TaskTracker,
    /// Latest generation per user; only that one may fire.
    current: Arc<DashMap<String, u64>>,
}

impl BackgroundNotifier {
    /// Spawn the notifier loop on the current runtime.
    pub fn spawn(
        sink: Arc<dyn NotificationSink>,
        clock: Arc<dyn Clock>,
        settings: NotifierSettings,
        capacity: usize,
    ) -> (NotifierHandle, NotifierTask) {
        let (tx, rx) = mpsc::channel(capacity.max(1));
        let tracker = TaskTracker::new();
        let shutdown = CancellationToken::new();

        let notifier = Self {
            rx,
            sink,
            clock,
            settings: Arc::new(settings),
            tracker: tracker.clone(),
            current: Arc::new(DashMap::new()),
        };
        let join = tokio::spawn(notifier.run(shutdown.clone()));

        tracing::info!(capacity, "Background notifier started");

        (
            NotifierHandle { tx },
            NotifierTask {
                join,
                tracker,
                shutdown,
            },
        )
    }

    async fn run(mut self, shutdown: CancellationToken) {
        loop {
            tokio::select! {
                _ = shutdown.cancelled() => break,
                message = self.rx.recv() => match message {
                    Some(message) => self.handle(message),
                    None => break,
                },
            }
        }
        tracing::debug!("Notifier loop finished");
    }

    fn handle(&self, message: NotifierMessage) {
        match message {
            NotifierMessage::StartTimer {
                user_id,
                seconds,
                generation,
            } => {
                tracing::debug!(user_id = %user_id, seconds, generation, "Background rest timer armed");
                self.current.insert(user_id.clone(), generation);

                let current = self.current.clone();
                let sink = self.sink.clone();
                let clock = self.clock.clone();
                let settings = self.settings.clone();

                self.tracker.spawn(async move {
                    tokio::time::sleep(Duration::from_secs(seconds)).await;

                    // Fire only if nothing newer or a cancellation replaced us
                    if current
                        .remove_if(&user_id, |_, g| *g == generation)
                        .is_none()
                    {
                        tracing::debug!(user_id = %user_id, generation, "Background rest timer superseded");
                        return;
                    }

                    tracing::info!(user_id = %user_id, generation, "Rest over, showing notification");
                    sink.show(&user_id, settings.notification(clock.now_ms()));
                });
            }
            NotifierMessage::CancelTimer {
                user_id,
                generation,
            } => {
                if self
                    .current
                    .remove_if(&user_id, |_, g| *g == generation)
                    .is_some()
                {
                    tracing::debug!(user_id = %user_id, generation, "Background rest timer cancelled");
                }
            }
        }
    }
}
