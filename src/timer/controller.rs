// SPDX-License-Identifier: MIT
// Copyright 2026 Roland Dreier <roland@rolandd.dev>

//! Foreground rest timer.
//!
//! Tracks at most one rest interval. Remaining time is always derived from
//! the stored absolute end timestamp, so a delayed or throttled poll never
//! drifts. Each rest gets a fresh generation number which is forwarded to
//! the background notifier; cancelling or superseding a rest invalidates
//! that generation so the notifier stays quiet for it.

use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::{Arc, Mutex, MutexGuard, PoisonError, Weak};
use std::time::Duration;
use tokio::task::JoinHandle;
use tokio::time::MissedTickBehavior;

use super::alerts::{AlertSink, Notification, Permission, FOREGROUND_VIBRATION};
use super::clock::Clock;
use super::notifier::{NotifierHandle, NotifierMessage};
use crate::config::MAX_POLL_INTERVAL_MS;
use crate::models::ActiveRest;

/// Generations are unique process-wide so timers of the same user never collide.
static NEXT_GENERATION: AtomicU64 = AtomicU64::new(1);

/// Result of a single poll.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PollOutcome {
    /// No rest running.
    Idle,
    /// Rest running, not over yet.
    Resting,
    /// This poll ended the rest.
    Expired,
}

struct Running {
    rest: ActiveRest,
    generation: u64,
    poller: Option<JoinHandle<()>>,
}

impl Running {
    fn stop_polling(&mut self) {
        if let Some(poller) = self.poller.take() {
            poller.abort();
        }
    }
}

/// Rest timer for one execution session.
pub struct RestTimer {
    user_id: String,
    clock: Arc<dyn Clock>,
    alerts: Arc<dyn AlertSink>,
    notifier: NotifierHandle,
    poll_interval: Duration,
    running: Mutex<Option<Running>>,
}

impl RestTimer {
    pub fn new(
        user_id: impl Into<String>,
        clock: Arc<dyn Clock>,
        alerts: Arc<dyn AlertSink>,
        notifier: NotifierHandle,
        poll_interval: Duration,
    ) -> Arc<Self> {
        let max = Duration::from_millis(MAX_POLL_INTERVAL_MS);
        Arc::new(Self {
            user_id: user_id.into(),
            clock,
            alerts,
            notifier,
            poll_interval: poll_interval.clamp(Duration::from_millis(1), max),
            running: Mutex::new(None),
        })
    }

    fn lock(&self) -> MutexGuard<'_, Option<Running>> {
        self.running.lock().unwrap_or_else(PoisonError::into_inner)
    }

    /// Start a rest for `exercise_id`, superseding any running rest.
    pub fn start_rest(self: &Arc<Self>, exercise_id: &str, duration_seconds: u32) -> ActiveRest {
        let rest = ActiveRest {
            exercise_id: exercise_id.to_string(),
            ends_at_ms: self.clock.now_ms() + i64::from(duration_seconds) * 1000,
        };
        self.arm(rest.clone(), u64::from(duration_seconds));

        if self.alerts.permission() == Permission::Default {
            self.alerts.request_permission();
        }

        tracing::info!(
            user_id = %self.user_id,
            exercise_id,
            duration_seconds,
            "Rest started"
        );
        rest
    }

    /// Resume a rest saved before a restart.
    ///
    /// Returns `false` (and stays idle) when the rest already ended; an
    /// expiry that happened while nobody was watching is not replayed.
    pub fn restore(self: &Arc<Self>, rest: ActiveRest) -> bool {
        let remaining_ms = rest.ends_at_ms - self.clock.now_ms();
        if remaining_ms <= 0 {
            tracing::debug!(user_id = %self.user_id, exercise_id = %rest.exercise_id, "Saved rest already over");
            return false;
        }

        let seconds = (remaining_ms as u64).div_ceil(1000);
        tracing::info!(
            user_id = %self.user_id,
            exercise_id = %rest.exercise_id,
            remaining_seconds = seconds,
            "Rest resumed"
        );
        self.arm(rest, seconds);
        true
    }

    fn arm(self: &Arc<Self>, rest: ActiveRest, notify_after_secs: u64) {
        let generation = NEXT_GENERATION.fetch_add(1, Ordering::Relaxed);

        let previous = {
            let mut running = self.lock();
            let poller = self.spawn_poller(generation);
            running.replace(Running {
                rest: rest.clone(),
                generation,
                poller,
            })
        };

        if let Some(mut previous) = previous {
            // The newer START_TIMER makes the old generation stale on the
            // notifier side too, so no cancel message is needed.
            previous.stop_polling();
            tracing::debug!(
                user_id = %self.user_id,
                exercise_id = %previous.rest.exercise_id,
                "Rest superseded"
            );
        }

        self.notifier.post(NotifierMessage::StartTimer {
            user_id: self.user_id.clone(),
            seconds: notify_after_secs,
            generation,
        });
        self.alerts.on_rest_started(&rest);
    }

    fn spawn_poller(self: &Arc<Self>, generation: u64) -> Option<JoinHandle<()>> {
        let Ok(runtime) = tokio::runtime::Handle::try_current() else {
            tracing::warn!(user_id = %self.user_id, "No runtime, rest timer must be polled manually");
            return None;
        };

        let timer: Weak<Self> = Arc::downgrade(self);
        let interval = self.poll_interval;
        Some(runtime.spawn(async move {
            let mut ticker = tokio::time::interval(interval);
            ticker.set_missed_tick_behavior(MissedTickBehavior::Delay);
            loop {
                ticker.tick().await;
                let Some(timer) = timer.upgrade() else { break };
                if timer.poll_generation(Some(generation)) != PollOutcome::Resting {
                    break;
                }
            }
        }))
    }

    /// Stop the running rest. No expiry signal fires for it.
    pub fn cancel_rest(&self) -> Option<ActiveRest> {
        let cancelled = self.lock().take();
        cancelled.map(|running| self.finish_cancel(running))
    }

    /// Stop the running rest only if it belongs to `exercise_id`.
    pub fn cancel_rest_for(&self, exercise_id: &str) -> Option<ActiveRest> {
        let cancelled = {
            let mut running = self.lock();
            match running.as_ref() {
                Some(r) if r.rest.exercise_id == exercise_id => running.take(),
                _ => None,
            }
        };
        cancelled.map(|running| self.finish_cancel(running))
    }

    fn finish_cancel(&self, mut running: Running) -> ActiveRest {
        running.stop_polling();
        self.notifier.post(NotifierMessage::CancelTimer {
            user_id: self.user_id.clone(),
            generation: running.generation,
        });
        self.alerts.on_rest_cancelled(&running.rest);
        tracing::info!(
            user_id = %self.user_id,
            exercise_id = %running.rest.exercise_id,
            "Rest cancelled"
        );
        running.rest
    }

    /// The running rest, if any.
    pub fn active(&self) -> Option<ActiveRest> {
        self.lock().as_ref().map(|r| r.rest.clone())
    }

    /// Whole seconds left, rounded up. `None` when idle.
    pub fn remaining_seconds(&self) -> Option<u64> {
        let ends_at_ms = self.lock().as_ref()?.rest.ends_at_ms;
        let remaining_ms = (ends_at_ms - self.clock.now_ms()).max(0) as u64;
        Some(remaining_ms.div_ceil(1000))
    }

    /// Check the running rest against the clock, firing expiry at most once.
    pub fn poll(&self) -> PollOutcome {
        self.poll_generation(None)
    }

    fn poll_generation(&self, generation: Option<u64>) -> PollOutcome {
        let now = self.clock.now_ms();
        let expired = {
            let mut running = self.lock();
            match running.as_ref() {
                None => return PollOutcome::Idle,
                // A poller left over from a superseded rest
                Some(r) if generation.is_some_and(|g| g != r.generation) => {
                    return PollOutcome::Idle
                }
                Some(r) if now < r.rest.ends_at_ms => return PollOutcome::Resting,
                Some(_) => running.take(),
            }
        };

        if let Some(mut running) = expired {
            if generation.is_none() {
                running.stop_polling();
            }
            self.on_expire(&running.rest);
        }
        PollOutcome::Expired
    }

    fn on_expire(&self, rest: &ActiveRest) {
        tracing::info!(
            user_id = %self.user_id,
            exercise_id = %rest.exercise_id,
            "Rest over"
        );
        self.alerts.on_rest_finished(rest);

        if self.alerts.is_visible() {
            if let Err(e) = self.alerts.play_audio_cue() {
                tracing::debug!(error = %e, "Audio cue not played");
            }
        }

        if let Err(e) = self.alerts.vibrate(FOREGROUND_VIBRATION) {
            tracing::debug!(error = %e, "Vibration not delivered");
        }

        match self.alerts.permission() {
            Permission::Granted => {
                let notification = Notification::rest_over(self.clock.now_ms());
                if let Err(e) = self.alerts.show_notification(notification) {
                    tracing::warn!(user_id = %self.user_id, error = %e, "Rest notification failed");
                }
            }
            permission => {
                tracing::debug!(user_id = %self.user_id, ?permission, "Rest notification skipped");
            }
        }
    }
}

impl Drop for RestTimer {
    fn drop(&mut self) {
        if let Some(mut running) = self.lock().take() {
            running.stop_polling();
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::timer::alerts::testing::{Alert, RecordingAlerts};
    use crate::timer::clock::ManualClock;

    const T0: i64 = 1_767_225_600_000;

    struct Fixture {
        clock: Arc<ManualClock>,
        alerts: Arc<RecordingAlerts>,
        timer: Arc<RestTimer>,
    }

    fn fixture(permission: Permission, visible: bool) -> Fixture {
        let clock = Arc::new(ManualClock::new(T0));
        let alerts = Arc::new(RecordingAlerts::new(permission, visible));
        let timer = RestTimer::new(
            "user-1",
            clock.clone(),
            alerts.clone(),
            NotifierHandle::disconnected(),
            Duration::from_millis(500),
        );
        Fixture {
            clock,
            alerts,
            timer,
        }
    }

    #[test]
    fn test_expires_exactly_once() {
        for duration in [0u32, 1, 45, 300] {
            let f = fixture(Permission::Granted, true);
            f.timer.start_rest("bench", duration);

            if duration > 0 {
                f.clock.advance_secs(u64::from(duration) - 1);
                assert_eq!(f.timer.poll(), PollOutcome::Resting);
                f.clock.advance_secs(1);
            }

            assert_eq!(f.timer.poll(), PollOutcome::Expired);
            assert_eq!(f.timer.poll(), PollOutcome::Idle);
            f.clock.advance_secs(60);
            assert_eq!(f.timer.poll(), PollOutcome::Idle);
            assert_eq!(f.alerts.finished_count(), 1, "duration {}", duration);
        }
    }

    #[test]
    fn test_remaining_rounds_up() {
        let f = fixture(Permission::Granted, true);
        assert_eq!(f.timer.remaining_seconds(), None);

        f.timer.start_rest("bench", 45);
        assert_eq!(f.timer.remaining_seconds(), Some(45));

        f.clock.advance_ms(100);
        assert_eq!(f.timer.remaining_seconds(), Some(45));

        f.clock.advance_ms(44_000);
        assert_eq!(f.timer.remaining_seconds(), Some(1));

        f.clock.advance_ms(10_000);
        assert_eq!(f.timer.remaining_seconds(), Some(0));
    }

    #[test]
    fn test_new_rest_supersedes_previous() {
        let f = fixture(Permission::Granted, true);

        f.timer.start_rest("a", 30);
        f.timer.start_rest("b", 90);
        assert_eq!(f.timer.active().unwrap().exercise_id, "b");

        // Past A's end, before B's
        f.clock.advance_secs(31);
        assert_eq!(f.timer.poll(), PollOutcome::Resting);
        assert_eq!(f.alerts.finished_count(), 0);

        f.clock.advance_secs(60);
        assert_eq!(f.timer.poll(), PollOutcome::Expired);

        let finished: Vec<_> = f
            .alerts
            .take()
            .into_iter()
            .filter_map(|a| match a {
                Alert::Finished(rest) => Some(rest.exercise_id),
                _ => None,
            })
            .collect();
        assert_eq!(finished, ["b"]);
    }

    #[test]
    fn test_cancel_prevents_expiry() {
        let f = fixture(Permission::Granted, true);

        f.timer.start_rest("bench", 45);
        let cancelled = f.timer.cancel_rest().unwrap();
        assert_eq!(cancelled.exercise_id, "bench");
        assert_eq!(f.timer.active(), None);

        f.clock.advance_secs(60);
        assert_eq!(f.timer.poll(), PollOutcome::Idle);
        assert_eq!(f.alerts.finished_count(), 0);
        assert_eq!(f.timer.cancel_rest(), None);
    }

    #[test]
    fn test_cancel_for_other_exercise_is_noop() {
        let f = fixture(Permission::Granted, true);

        f.timer.start_rest("bench", 45);
        assert_eq!(f.timer.cancel_rest_for("squat"), None);
        assert!(f.timer.active().is_some());
        assert!(f.timer.cancel_rest_for("bench").is_some());
        assert!(f.timer.active().is_none());
    }

    #[test]
    fn test_expiry_signals_when_visible_and_granted() {
        let f = fixture(Permission::Granted, true);
        f.timer.start_rest("bench", 10);
        f.alerts.take();

        f.clock.advance_secs(10);
        f.timer.poll();

        let alerts = f.alerts.take();
        assert!(alerts.contains(&Alert::Audio));
        assert!(alerts.contains(&Alert::Vibrate(FOREGROUND_VIBRATION.to_vec())));
        let notification = alerts
            .iter()
            .find_map(|a| match a {
                Alert::Notification(n) => Some(n.clone()),
                _ => None,
            })
            .expect("notification shown");
        assert_eq!(notification.tag, crate::timer::alerts::REST_TIMER_TAG);
        assert!(notification.renotify);
    }

    #[test]
    fn test_hidden_window_gets_no_audio() {
        let f = fixture(Permission::Granted, false);
        f.timer.start_rest("bench", 1);
        f.clock.advance_secs(1);
        f.timer.poll();

        let alerts = f.alerts.take();
        assert!(!alerts.contains(&Alert::Audio));
        assert!(alerts.iter().any(|a| matches!(a, Alert::Vibrate(_))));
    }

    #[test]
    fn test_denied_permission_degrades_silently() {
        let f = fixture(Permission::Denied, true);
        f.timer.start_rest("bench", 5);
        f.clock.advance_secs(5);

        assert_eq!(f.timer.poll(), PollOutcome::Expired);
        let alerts = f.alerts.take();
        assert!(alerts.contains(&Alert::Audio));
        assert!(alerts.iter().any(|a| matches!(a, Alert::Vibrate(_))));
        assert!(!alerts.iter().any(|a| matches!(a, Alert::Notification(_))));
        assert!(!alerts.contains(&Alert::PermissionRequested));
    }

    #[test]
    fn test_default_permission_is_requested_on_start() {
        let f = fixture(Permission::Default, true);
        f.timer.start_rest("bench", 5);
        assert!(f.alerts.take().contains(&Alert::PermissionRequested));
    }

    #[test]
    fn test_restore_future_and_past_rests() {
        let f = fixture(Permission::Granted, true);

        let past = ActiveRest {
            exercise_id: "bench".to_string(),
            ends_at_ms: T0 - 1,
        };
        assert!(!f.timer.restore(past));
        assert_eq!(f.timer.active(), None);
        assert_eq!(f.alerts.finished_count(), 0);

        let future = ActiveRest {
            exercise_id: "bench".to_string(),
            ends_at_ms: T0 + 20_500,
        };
        assert!(f.timer.restore(future.clone()));
        assert_eq!(f.timer.active(), Some(future));
        assert_eq!(f.timer.remaining_seconds(), Some(21));
    }

    #[tokio::test(start_paused = true)]
    async fn test_poller_fires_expiry() {
        let clock = Arc::new(ManualClock::new(T0));
        let alerts = Arc::new(RecordingAlerts::new(Permission::Granted, true));
        let timer = RestTimer::new(
            "user-1",
            clock.clone(),
            alerts.clone(),
            NotifierHandle::disconnected(),
            Duration::from_millis(500),
        );

        timer.start_rest("bench", 2);
        tokio::time::sleep(Duration::from_secs(1)).await;
        assert_eq!(alerts.finished_count(), 0);

        clock.advance_secs(2);
        tokio::time::sleep(Duration::from_secs(1)).await;
        assert_eq!(alerts.finished_count(), 1);
        assert_eq!(timer.active(), None);
    }
}
