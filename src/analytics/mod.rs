//! Aggregations over stored sessions. Everything here is pure and works on
//! whatever slice the store returned; empty input gives zero or empty maps.

mod dashboard;

pub use dashboard::{build_dashboard, DashboardSummary};

use std::collections::BTreeMap;

use chrono::{Duration, NaiveDate};
use serde::Serialize;

use crate::db::{DateRange, Session};

pub fn total_minutes(sessions: &[Session]) -> f64 {
    sessions.iter().map(|s| s.duration_minutes).sum()
}

pub fn totals_by_activity(sessions: &[Session]) -> BTreeMap<String, f64> {
    let mut totals = BTreeMap::new();
    for session in sessions {
        *totals.entry(session.activity.clone()).or_insert(0.0) += session.duration_minutes;
    }
    totals
}

/// Highest total first; equal totals keep alphabetical order.
pub fn rank_activities(totals: &BTreeMap<String, f64>) -> Vec<(String, f64)> {
    let mut ranked: Vec<_> = totals.iter().map(|(k, v)| (k.clone(), *v)).collect();
    ranked.sort_by(|a, b| b.1.total_cmp(&a.1).then_with(|| a.0.cmp(&b.0)));
    ranked
}

/// Minutes per start date, in chronological order.
pub fn daily_totals(sessions: &[Session]) -> BTreeMap<NaiveDate, f64> {
    let mut totals = BTreeMap::new();
    for session in sessions {
        *totals.entry(session.start_date()).or_insert(0.0) += session.duration_minutes;
    }
    totals
}

pub fn top_activity(sessions: &[Session]) -> Option<(String, f64)> {
    rank_activities(&totals_by_activity(sessions)).into_iter().next()
}

/// Consecutive active days ending today. If nothing is logged today yet the
/// run may end yesterday, so an unbroken streak does not drop to zero in
/// the morning.
pub fn study_streak(active_days: &[NaiveDate], today: NaiveDate) -> u32 {
    let mut days: Vec<NaiveDate> = active_days.iter().copied().filter(|d| *d <= today).collect();
    days.sort_unstable_by(|a, b| b.cmp(a));
    days.dedup();

    let mut expected = match days.first() {
        Some(first) if *first == today => today,
        Some(first) if *first == today - Duration::days(1) => *first,
        _ => return 0,
    };

    let mut streak = 0;
    for day in days {
        if day != expected {
            break;
        }
        streak += 1;
        expected = day - Duration::days(1);
    }
    streak
}

pub fn goal_progress_percent(minutes: f64, goal_minutes: u32) -> u32 {
    if goal_minutes == 0 {
        return 0;
    }
    let percent = (minutes / f64::from(goal_minutes) * 100.0).floor();
    percent.clamp(0.0, 100.0) as u32
}

pub fn days_until(target: Option<NaiveDate>, today: NaiveDate) -> i64 {
    target.map_or(0, |date| (date - today).num_days().max(0))
}

/// Everything the analytics view shows for one date range.
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct RangeReport {
    pub range: DateRange,
    pub sessions: Vec<Session>,
    pub total_minutes: f64,
    pub by_activity: Vec<(String, f64)>,
    pub daily: BTreeMap<NaiveDate, f64>,
}

impl RangeReport {
    pub fn new(range: DateRange, sessions: Vec<Session>) -> Self {
        Self {
            range,
            total_minutes: total_minutes(&sessions),
            by_activity: rank_activities(&totals_by_activity(&sessions)),
            daily: daily_totals(&sessions),
            sessions,
        }
    }

    pub fn total_hours(&self) -> f64 {
        self.total_minutes / 60.0
    }

    pub fn is_empty(&self) -> bool {
        self.sessions.is_empty()
    }
}
