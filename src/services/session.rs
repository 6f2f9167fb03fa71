// SPDX-License-Identifier: MIT
// Copyright 2026 Roland Dreier <roland@rolandd.dev>

//! Workout execution sessions.
//!
//! A session tracks completed sets and weight overrides for one workout on
//! one device, drives the rest timer as sets are checked off and turns the
//! result into a [`WorkoutLog`] when the user finishes. Every mutation is
//! written through to local storage so the session survives a restart.

use chrono::{DateTime, Utc};
use dashmap::DashMap;
use std::sync::{Arc, Mutex, MutexGuard, PoisonError};
use std::time::Duration;

use crate::db::FirestoreDb;
use crate::error::AppError;
use crate::models::{
    CompletedSets, CurrentWeights, Exercise, SessionView, Workout, WorkoutLog,
    DEFAULT_REST_SECONDS, SCHEMA_VERSION,
};
use crate::notifications::NotificationCenter;
use crate::storage::{ProgressStore, SessionSnapshot};
use crate::time_utils::format_utc_rfc3339;
use crate::timer::{Clock, NotifierHandle, RestTimer};

/// What a set toggle did.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SetToggle {
    /// Next set checked off, rest started
    Completed,
    /// Last completed set unchecked
    Uncompleted,
    /// Index was neither the next nor the last completed set
    Ignored,
}

#[derive(Debug)]
struct SessionState {
    completed_sets: CompletedSets,
    current_weights: CurrentWeights,
    started_at_ms: i64,
}

/// One user executing one workout.
pub struct ExecutionSession {
    user_id: String,
    workout: Workout,
    timer: Arc<RestTimer>,
    progress: ProgressStore,
    clock: Arc<dyn Clock>,
    state: Mutex<SessionState>,
}

fn rest_seconds(exercise: &Exercise) -> u32 {
    if exercise.rest_seconds == 0 {
        DEFAULT_REST_SECONDS
    } else {
        exercise.rest_seconds
    }
}

fn to_datetime(ms: i64) -> DateTime<Utc> {
    DateTime::from_timestamp_millis(ms).unwrap_or_default()
}

impl ExecutionSession {
    /// Resume the saved session for this workout, or start a fresh one.
    pub fn open(
        user_id: &str,
        workout: Workout,
        timer: Arc<RestTimer>,
        progress: ProgressStore,
        clock: Arc<dyn Clock>,
    ) -> Arc<Self> {
        let saved = match progress.load(user_id, &workout.id) {
            Ok(saved) => saved,
            Err(e) => {
                tracing::warn!(user_id, workout_id = %workout.id, error = %e, "Discarding unreadable saved session");
                None
            }
        };

        let resumed = saved.is_some();
        let SessionSnapshot {
            mut completed_sets,
            current_weights,
            active_rest,
            started_at_ms,
        } = saved.unwrap_or_default();

        // The routine may have changed since the session was saved
        for exercise in &workout.exercises {
            if let Some(done) = completed_sets.get_mut(&exercise.id) {
                *done = (*done).min(exercise.series_count);
            }
        }

        if let Some(rest) = active_rest {
            if workout.exercise(&rest.exercise_id).is_some() {
                timer.restore(rest);
            }
        }

        let session = Arc::new(Self {
            user_id: user_id.to_string(),
            state: Mutex::new(SessionState {
                completed_sets,
                current_weights,
                started_at_ms: started_at_ms.unwrap_or_else(|| clock.now_ms()),
            }),
            workout,
            timer,
            progress,
            clock,
        });

        tracing::info!(
            user_id,
            workout_id = %session.workout.id,
            resumed,
            "Execution session opened"
        );

        session.persist(&session.lock());
        session
    }

    fn lock(&self) -> MutexGuard<'_, SessionState> {
        self.state.lock().unwrap_or_else(PoisonError::into_inner)
    }

    pub fn workout(&self) -> &Workout {
        &self.workout
    }

    pub fn timer(&self) -> &Arc<RestTimer> {
        &self.timer
    }

    fn exercise(&self, exercise_id: &str) -> Result<&Exercise, AppError> {
        self.workout
            .exercise(exercise_id)
            .ok_or_else(|| AppError::NotFound(format!("Exercise {}", exercise_id)))
    }

    /// Best-effort write-through to local storage.
    fn persist(&self, state: &SessionState) {
        let snapshot = SessionSnapshot {
            completed_sets: state.completed_sets.clone(),
            current_weights: state.current_weights.clone(),
            active_rest: self.timer.active(),
            started_at_ms: Some(state.started_at_ms),
        };
        if let Err(e) = self.progress.save(&self.user_id, &self.workout.id, &snapshot) {
            tracing::warn!(
                user_id = %self.user_id,
                workout_id = %self.workout.id,
                error = %e,
                "Failed to save session progress"
            );
        }
    }

    /// Check off or uncheck one set of an exercise.
    ///
    /// Only the next set (`set_index == completed`) or the last completed
    /// set (`set_index + 1 == completed`) can be toggled.
    pub fn toggle_set(&self, exercise_id: &str, set_index: u32) -> Result<SetToggle, AppError> {
        let exercise = self.exercise(exercise_id)?;
        let mut state = self.lock();
        let done = state.completed_sets.get(exercise_id).copied().unwrap_or(0);

        let outcome = if set_index.checked_add(1) == Some(done) {
            state.completed_sets.insert(exercise_id.to_string(), done - 1);
            self.timer.cancel_rest_for(exercise_id);
            SetToggle::Uncompleted
        } else if set_index == done && done < exercise.series_count {
            state.completed_sets.insert(exercise_id.to_string(), done + 1);
            self.timer.start_rest(exercise_id, rest_seconds(exercise));
            SetToggle::Completed
        } else {
            SetToggle::Ignored
        };

        if outcome != SetToggle::Ignored {
            tracing::debug!(
                user_id = %self.user_id,
                exercise_id,
                set_index,
                ?outcome,
                "Set toggled"
            );
            self.persist(&state);
        }
        Ok(outcome)
    }

    /// Mark every set of an exercise done, or none if it already was.
    ///
    /// Any rest tied to the exercise is cancelled either way. Returns the
    /// new completed count.
    pub fn toggle_exercise_full(&self, exercise_id: &str) -> Result<u32, AppError> {
        let exercise = self.exercise(exercise_id)?;
        let mut state = self.lock();
        let done = state.completed_sets.get(exercise_id).copied().unwrap_or(0);

        let now_done = if done >= exercise.series_count {
            0
        } else {
            exercise.series_count
        };
        state
            .completed_sets
            .insert(exercise_id.to_string(), now_done);
        self.timer.cancel_rest_for(exercise_id);

        self.persist(&state);
        Ok(now_done)
    }

    /// Override the weight for an exercise in this session.
    pub fn set_weight(&self, exercise_id: &str, weight: f64) -> Result<(), AppError> {
        self.exercise(exercise_id)?;
        let weight = if weight.is_finite() { weight.max(0.0) } else { 0.0 };

        let mut state = self.lock();
        state
            .current_weights
            .insert(exercise_id.to_string(), weight);
        self.persist(&state);
        Ok(())
    }

    fn completion_of(&self, state: &SessionState) -> u32 {
        let total = self.workout.exercises.len();
        if total == 0 {
            return 0;
        }
        let finished = self
            .workout
            .exercises
            .iter()
            .filter(|e| state.completed_sets.get(&e.id).copied().unwrap_or(0) >= e.series_count)
            .count();
        ((finished as f64 / total as f64) * 100.0).round() as u32
    }

    /// Share of exercises with every set done, 0-100.
    pub fn completion_percentage(&self) -> u32 {
        self.completion_of(&self.lock())
    }

    /// Current view of the session. Also fires a rest expiry that is due.
    pub fn snapshot(&self) -> SessionView {
        self.timer.poll();
        let state = self.lock();
        let rest = self.timer.active();

        SessionView {
            workout_id: self.workout.id.clone(),
            workout_name: self.workout.name.clone(),
            completed_sets: state.completed_sets.clone(),
            current_weights: state.current_weights.clone(),
            active_exercise_id: rest.as_ref().map(|r| r.exercise_id.clone()),
            timer_ends_at: rest
                .as_ref()
                .map(|r| format_utc_rfc3339(to_datetime(r.ends_at_ms))),
            remaining_seconds: self.timer.remaining_seconds(),
            completion_percentage: self.completion_of(&state),
            started_at: format_utc_rfc3339(to_datetime(state.started_at_ms)),
        }
    }

    fn build_log(&self, state: &SessionState) -> WorkoutLog {
        let now_ms = self.clock.now_ms();
        let elapsed_ms = (now_ms - state.started_at_ms).max(0) as u64;

        WorkoutLog {
            schema_version: SCHEMA_VERSION,
            id: String::new(),
            workout_id: self.workout.id.clone(),
            workout_name: self.workout.name.clone(),
            date: format_utc_rfc3339(to_datetime(now_ms)),
            duration_seconds: Some(elapsed_ms / 1000),
            completion_percentage: self.completion_of(state),
            weights_used: self
                .workout
                .exercises
                .iter()
                .map(|e| {
                    let weight = state.current_weights.get(&e.id).copied().unwrap_or(e.weight);
                    (e.id.clone(), weight)
                })
                .collect(),
        }
    }

    /// Record the workout and clear the session.
    ///
    /// Local state is only cleared once the log is stored; on failure the
    /// session is left untouched so the user can retry.
    pub async fn finish(&self, db: &FirestoreDb) -> Result<WorkoutLog, AppError> {
        let mut log = {
            let state = self.lock();
            self.build_log(&state)
        };

        log.id = db.append_log(&self.user_id, &log).await.map_err(|e| {
            tracing::error!(
                user_id = %self.user_id,
                workout_id = %self.workout.id,
                error = %e,
                "Failed to save workout log, keeping session"
            );
            e
        })?;

        self.complete(&log);
        Ok(log)
    }

    /// Start over after the log was stored. Nothing here may fail the
    /// finish, or a retry would record the workout twice.
    fn complete(&self, log: &WorkoutLog) {
        self.timer.cancel_rest();
        if let Err(e) = self.progress.clear(&self.user_id, &self.workout.id) {
            tracing::warn!(
                user_id = %self.user_id,
                workout_id = %self.workout.id,
                error = %e,
                "Failed to clear saved session progress"
            );
        }
        self.restart();

        tracing::info!(
            user_id = %self.user_id,
            workout_id = %self.workout.id,
            log_id = %log.id,
            completion = log.completion_percentage,
            "Workout finished"
        );
    }

    /// Drop all progress and any running rest.
    pub fn reset(&self) -> Result<(), AppError> {
        self.timer.cancel_rest();
        self.progress.clear(&self.user_id, &self.workout.id)?;
        self.restart();

        tracing::info!(user_id = %self.user_id, workout_id = %self.workout.id, "Session reset");
        Ok(())
    }

    fn restart(&self) {
        let mut state = self.lock();
        state.completed_sets.clear();
        state.current_weights.clear();
        state.started_at_ms = self.clock.now_ms();
    }
}

/// Open sessions keyed by (user, workout).
#[derive(Clone)]
pub struct SessionRegistry {
    sessions: Arc<DashMap<(String, String), Arc<ExecutionSession>>>,
    progress: ProgressStore,
    center: Arc<NotificationCenter>,
    notifier: NotifierHandle,
    clock: Arc<dyn Clock>,
    poll_interval: Duration,
}

impl SessionRegistry {
    pub fn new(
        progress: ProgressStore,
        center: Arc<NotificationCenter>,
        notifier: NotifierHandle,
        clock: Arc<dyn Clock>,
        poll_interval: Duration,
    ) -> Self {
        Self {
            sessions: Arc::new(DashMap::new()),
            progress,
            center,
            notifier,
            clock,
            poll_interval,
        }
    }

    /// Return the open session for this workout, opening it if needed.
    pub fn open(&self, user_id: &str, workout: Workout) -> Arc<ExecutionSession> {
        let key = (user_id.to_string(), workout.id.clone());
        self.sessions
            .entry(key)
            .or_insert_with(|| {
                let timer = RestTimer::new(
                    user_id,
                    self.clock.clone(),
                    self.center.alerts_for(user_id),
                    self.notifier.clone(),
                    self.poll_interval,
                );
                ExecutionSession::open(
                    user_id,
                    workout,
                    timer,
                    self.progress.clone(),
                    self.clock.clone(),
                )
            })
            .clone()
    }

    pub fn get(&self, user_id: &str, workout_id: &str) -> Option<Arc<ExecutionSession>> {
        self.sessions
            .get(&(user_id.to_string(), workout_id.to_string()))
            .map(|s| s.clone())
    }

    /// Forget an open session. Saved progress stays in local storage.
    pub fn remove(&self, user_id: &str, workout_id: &str) -> Option<Arc<ExecutionSession>> {
        self.sessions
            .remove(&(user_id.to_string(), workout_id.to_string()))
            .map(|(_, s)| s)
    }

    /// Drop everything kept for a workout on this device: the open
    /// session (and its rest) and any saved progress.
    pub fn discard(&self, user_id: &str, workout_id: &str) -> Result<(), AppError> {
        if let Some(session) = self.remove(user_id, workout_id) {
            session.timer.cancel_rest();
        }
        self.progress.clear(user_id, workout_id)?;
        tracing::debug!(user_id, workout_id, "Session state discarded");
        Ok(())
    }

    pub fn len(&self) -> usize {
        self.sessions.len()
    }

    pub fn is_empty(&self) -> bool {
        self.sessions.is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::ActiveRest;
    use crate::storage::{LocalStore, MemoryStore, StorageError};
    use crate::timer::alerts::testing::{Alert, RecordingAlerts};
    use crate::timer::{ManualClock, Permission, PollOutcome};
    use serde_json::json;

    const T0: i64 = 1_767_225_600_000;

    struct Fixture {
        clock: Arc<ManualClock>,
        alerts: Arc<RecordingAlerts>,
        store: Arc<MemoryStore>,
        session: Arc<ExecutionSession>,
    }

    fn workout() -> Workout {
        serde_json::from_value(json!({
            "id": "w1",
            "name": "Push",
            "exercises": [
                { "id": "bench", "name": "Bench", "series": 3, "rest": 45, "weight": 40 },
                { "id": "fly", "name": "Fly", "series": "2", "rest": 30 },
            ]
        }))
        .unwrap()
    }

    fn open_with(store: Arc<MemoryStore>, clock: Arc<ManualClock>) -> Fixture {
        let alerts = Arc::new(RecordingAlerts::new(Permission::Granted, true));
        let timer = RestTimer::new(
            "u1",
            clock.clone(),
            alerts.clone(),
            NotifierHandle::disconnected(),
            Duration::from_millis(250),
        );
        let session = ExecutionSession::open(
            "u1",
            workout(),
            timer,
            ProgressStore::new(store.clone()),
            clock.clone(),
        );
        Fixture {
            clock,
            alerts,
            store,
            session,
        }
    }

    fn fixture() -> Fixture {
        open_with(
            Arc::new(MemoryStore::new()),
            Arc::new(ManualClock::new(T0)),
        )
    }

    #[test]
    fn test_only_next_or_last_set_toggles() {
        let f = fixture();
        let s = &f.session;

        assert_eq!(s.toggle_set("bench", 1).unwrap(), SetToggle::Ignored);
        assert_eq!(s.toggle_set("bench", 0).unwrap(), SetToggle::Completed);
        assert_eq!(s.toggle_set("bench", 1).unwrap(), SetToggle::Completed);
        assert_eq!(s.toggle_set("bench", 0).unwrap(), SetToggle::Ignored);
        assert_eq!(s.toggle_set("bench", 1).unwrap(), SetToggle::Uncompleted);
        assert_eq!(s.snapshot().completed_sets.get("bench"), Some(&1));

        assert!(matches!(
            s.toggle_set("squat", 0),
            Err(AppError::NotFound(_))
        ));
    }

    #[test]
    fn test_cannot_complete_past_series_count() {
        let f = fixture();
        f.session.toggle_set("fly", 0).unwrap();
        f.session.toggle_set("fly", 1).unwrap();
        assert_eq!(f.session.toggle_set("fly", 2).unwrap(), SetToggle::Ignored);
        assert_eq!(f.session.snapshot().completed_sets.get("fly"), Some(&2));
    }

    #[test]
    fn test_uncheck_recheck_restarts_full_rest() {
        let f = fixture();
        let s = &f.session;

        s.toggle_set("bench", 0).unwrap();
        assert_eq!(s.timer().remaining_seconds(), Some(45));

        f.clock.advance_secs(10);
        s.toggle_set("bench", 0).unwrap();
        assert_eq!(s.timer().active(), None);

        f.clock.advance_secs(5);
        s.toggle_set("bench", 0).unwrap();
        assert_eq!(s.timer().remaining_seconds(), Some(45));

        // The first rest's end passes without a signal
        f.clock.advance_secs(35);
        assert_eq!(s.timer().poll(), PollOutcome::Resting);
        assert_eq!(f.alerts.finished_count(), 0);

        f.clock.advance_secs(10);
        assert_eq!(s.timer().poll(), PollOutcome::Expired);
        assert_eq!(f.alerts.finished_count(), 1);
    }

    #[test]
    fn test_rest_on_other_exercise_supersedes() {
        let f = fixture();
        let s = &f.session;

        s.toggle_set("bench", 0).unwrap();
        s.toggle_set("fly", 0).unwrap();

        let view = s.snapshot();
        assert_eq!(view.active_exercise_id.as_deref(), Some("fly"));
        assert_eq!(view.remaining_seconds, Some(30));

        // Unchecking bench leaves the fly rest alone
        s.toggle_set("bench", 0).unwrap();
        assert_eq!(s.snapshot().active_exercise_id.as_deref(), Some("fly"));
    }

    #[test]
    fn test_toggle_exercise_full_twice_restores_count() {
        let f = fixture();
        let s = &f.session;

        s.toggle_set("bench", 0).unwrap();
        assert!(s.timer().active().is_some());

        assert_eq!(s.toggle_exercise_full("bench").unwrap(), 3);
        assert!(s.timer().active().is_none());
        assert_eq!(s.toggle_exercise_full("bench").unwrap(), 0);
        assert_eq!(s.toggle_exercise_full("bench").unwrap(), 3);
        assert_eq!(s.completion_percentage(), 50);
    }

    #[test]
    fn test_completion_percentage_rounds() {
        let store = Arc::new(MemoryStore::new());
        let clock = Arc::new(ManualClock::new(T0));
        let alerts = Arc::new(RecordingAlerts::new(Permission::Granted, true));
        let mut w = workout();
        w.exercises.push(w.exercises[1].clone());
        w.exercises[2].id = "dip".to_string();

        let timer = RestTimer::new(
            "u1",
            clock.clone(),
            alerts,
            NotifierHandle::disconnected(),
            Duration::from_millis(250),
        );
        let s = ExecutionSession::open("u1", w, timer, ProgressStore::new(store), clock);

        assert_eq!(s.completion_percentage(), 0);
        s.toggle_exercise_full("bench").unwrap();
        assert_eq!(s.completion_percentage(), 33);
        s.toggle_exercise_full("fly").unwrap();
        assert_eq!(s.completion_percentage(), 67);
    }

    #[test]
    fn test_session_resumes_from_local_storage() {
        let store = Arc::new(MemoryStore::new());
        let clock = Arc::new(ManualClock::new(T0));

        let first = open_with(store.clone(), clock.clone());
        first.session.toggle_set("bench", 0).unwrap();
        first.session.set_weight("bench", 42.5).unwrap();
        drop(first);

        clock.advance_secs(20);
        let second = open_with(store, clock);
        let view = second.session.snapshot();
        assert_eq!(view.completed_sets.get("bench"), Some(&1));
        assert_eq!(view.current_weights.get("bench"), Some(&42.5));
        assert_eq!(view.active_exercise_id.as_deref(), Some("bench"));
        assert_eq!(view.remaining_seconds, Some(25));
        assert_eq!(view.started_at, "2026-01-01T00:00:00Z");
    }

    #[test]
    fn test_expired_rest_is_not_resumed() {
        let store = Arc::new(MemoryStore::new());
        let clock = Arc::new(ManualClock::new(T0));

        let first = open_with(store.clone(), clock.clone());
        first.session.toggle_set("bench", 0).unwrap();
        drop(first);

        clock.advance_secs(120);
        let second = open_with(store, clock);
        assert_eq!(second.session.snapshot().active_exercise_id, None);
        assert_eq!(second.alerts.finished_count(), 0);
    }

    #[test]
    fn test_reset_clears_storage_and_rest() {
        let f = fixture();
        f.session.toggle_set("bench", 0).unwrap();
        assert!(!f.store.is_empty());

        f.session.reset().unwrap();
        assert!(f.store.is_empty());
        assert!(f.session.timer().active().is_none());
        assert!(f.session.snapshot().completed_sets.is_empty());
        assert!(f
            .alerts
            .take()
            .iter()
            .any(|a| matches!(a, Alert::Cancelled(ActiveRest { exercise_id, .. }) if exercise_id == "bench")));
    }

    #[tokio::test]
    async fn test_failed_finish_keeps_session() {
        let f = fixture();
        f.session.toggle_set("bench", 0).unwrap();
        f.clock.advance_secs(90);

        let result = f.session.finish(&FirestoreDb::new_mock()).await;
        assert!(matches!(result, Err(AppError::Database(_))));

        assert_eq!(f.session.snapshot().completed_sets.get("bench"), Some(&1));
        assert!(!f.store.is_empty());
    }

    /// Memory store whose removals always fail.
    struct StickyStore(MemoryStore);

    impl LocalStore for StickyStore {
        fn get(&self, key: &str) -> Result<Option<String>, StorageError> {
            self.0.get(key)
        }
        fn set(&self, key: &str, value: &str) -> Result<(), StorageError> {
            self.0.set(key, value)
        }
        fn remove(&self, key: &str) -> Result<(), StorageError> {
            Err(StorageError::Io {
                key: key.to_string(),
                source: std::io::Error::other("read-only"),
            })
        }
    }

    #[test]
    fn test_stored_log_completes_even_if_local_clear_fails() {
        let clock = Arc::new(ManualClock::new(T0));
        let alerts = Arc::new(RecordingAlerts::new(Permission::Granted, true));
        let timer = RestTimer::new(
            "u1",
            clock.clone(),
            alerts,
            NotifierHandle::disconnected(),
            Duration::from_millis(250),
        );
        let session = ExecutionSession::open(
            "u1",
            workout(),
            timer,
            ProgressStore::new(Arc::new(StickyStore(MemoryStore::new()))),
            clock,
        );
        session.toggle_exercise_full("fly").unwrap();
        session.toggle_set("bench", 0).unwrap();

        let mut log = session.build_log(&session.lock());
        log.id = "log-1".to_string();
        session.complete(&log);

        assert_eq!(session.completion_percentage(), 0);
        assert!(session.timer().active().is_none());
        assert!(session.snapshot().completed_sets.is_empty());
    }

    #[test]
    fn test_discard_clears_progress_of_evicted_session() {
        let store = Arc::new(MemoryStore::new());
        let registry = SessionRegistry::new(
            ProgressStore::new(store.clone()),
            NotificationCenter::new(8),
            NotifierHandle::disconnected(),
            Arc::new(ManualClock::new(T0)),
            Duration::from_millis(250),
        );

        let session = registry.open("u1", workout());
        session.toggle_set("bench", 0).unwrap();
        // Evicted by an edit, progress still saved on the device
        registry.remove("u1", "w1");
        drop(session);
        assert!(!store.is_empty());

        registry.discard("u1", "w1").unwrap();
        assert!(store.is_empty());
        assert!(registry.is_empty());
    }

    #[test]
    fn test_log_uses_overrides_and_duration() {
        let f = fixture();
        f.session.toggle_exercise_full("fly").unwrap();
        f.session.set_weight("fly", f64::NAN).unwrap();
        f.clock.advance_secs(1800);

        let log = f.session.build_log(&f.session.lock());
        assert_eq!(log.duration_seconds, Some(1800));
        assert_eq!(log.completion_percentage, 50);
        assert_eq!(log.weights_used.get("bench"), Some(&40.0));
        assert_eq!(log.weights_used.get("fly"), Some(&0.0));
        assert_eq!(log.date, "2026-01-01T00:30:00Z");
    }
}
