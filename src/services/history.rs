// SPDX-License-Identifier: MIT
// Copyright 2026 Roland Dreier <roland@rolandd.dev>

//! Read-side computations over workout logs: calendar, dashboard and charts.

use chrono::{DateTime, Utc};
use std::collections::BTreeMap;

use crate::error::{AppError, Result};
use crate::models::{ChartPoint, DayLogs, MonthlyProgress, Workout, WorkoutLog};
use crate::time_utils::{chart_label, day_key, month_key, parse_log_date};

/// Sort logs newest first. Logs with unreadable dates go last.
pub fn sort_recent_first(logs: &mut [WorkoutLog]) {
    logs.sort_by_key(|log| std::cmp::Reverse(log.parsed_date()));
}

/// Group logs by calendar day, oldest day first.
///
/// When `month` ("YYYY-MM") is given, only that month's days are returned.
pub fn group_by_day(logs: &[WorkoutLog], month: Option<&str>) -> Vec<DayLogs> {
    let mut days: BTreeMap<String, Vec<WorkoutLog>> = BTreeMap::new();

    for log in logs {
        let Some(date) = log.parsed_date() else {
            tracing::warn!(log_id = %log.id, date = %log.date, "Skipping log with unreadable date");
            continue;
        };
        if month.is_some_and(|m| month_key(date) != m) {
            continue;
        }
        days.entry(day_key(date)).or_default().push(log.clone());
    }

    days.into_iter()
        .map(|(date, mut logs)| {
            sort_recent_first(&mut logs);
            DayLogs { date, logs }
        })
        .collect()
}

/// Dashboard summary for the month containing `now`.
pub fn monthly_progress(logs: &[WorkoutLog], now: DateTime<Utc>, goal: u32) -> MonthlyProgress {
    let month = month_key(now);

    let done = logs
        .iter()
        .filter_map(WorkoutLog::parsed_date)
        .filter(|date| month_key(*date) == month)
        .count() as u32;

    let progress_percentage = if goal == 0 {
        100
    } else {
        ((f64::from(done) / f64::from(goal)) * 100.0).round().min(100.0) as u32
    };

    let last_workout = logs
        .iter()
        .filter_map(|log| log.parsed_date().map(|date| (date, log)))
        .max_by_key(|(date, _)| *date)
        .map(|(_, log)| log.workout_name.clone());

    MonthlyProgress {
        month,
        done,
        goal,
        progress_percentage,
        last_workout,
    }
}

/// Load evolution points ordered by date.
///
/// With `exercise_id`, each point is that exercise's weight; otherwise the
/// heaviest weight of the session. Points without a positive weight are
/// dropped.
pub fn load_chart(logs: &[WorkoutLog], exercise_id: Option<&str>) -> Vec<ChartPoint> {
    let mut points: Vec<(DateTime<Utc>, f64)> = logs
        .iter()
        .filter_map(|log| {
            let date = log.parsed_date()?;
            let weight = match exercise_id {
                Some(id) => log.weights_used.get(id).copied().unwrap_or(0.0),
                None => log.weights_used.values().copied().fold(0.0, f64::max),
            };
            Some((date, weight))
        })
        .filter(|(_, weight)| *weight > 0.0)
        .collect();

    points.sort_by_key(|(date, _)| *date);

    points
        .into_iter()
        .map(|(date, value)| ChartPoint {
            label: chart_label(date),
            value,
        })
        .collect()
}

/// Build a log added by hand from the history calendar.
///
/// Manual logs count as fully completed and record the routine's planned
/// weights.
pub fn manual_log(workout: &Workout, date: &str) -> Result<WorkoutLog> {
    if parse_log_date(date).is_none() {
        return Err(AppError::BadRequest(format!("Invalid date: {}", date)));
    }

    Ok(WorkoutLog {
        schema_version: crate::models::SCHEMA_VERSION,
        id: String::new(),
        workout_id: workout.id.clone(),
        workout_name: workout.name.clone(),
        date: date.to_string(),
        duration_seconds: None,
        completion_percentage: 100,
        weights_used: workout
            .exercises
            .iter()
            .map(|e| (e.id.clone(), e.weight))
            .collect(),
    })
}
