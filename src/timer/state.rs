use chrono::{Duration, NaiveDateTime};
use serde::{Deserialize, Serialize};

use crate::{db::NewSession, error::ValidationError};

#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Default)]
#[serde(rename_all = "camelCase")]
pub enum TimerStatus {
    #[default]
    Idle,
    Running,
    Paused,
}

/// The pause/resume state machine. Every transition takes `now` explicitly so
/// the controller decides where time comes from.
#[derive(Debug, Clone, PartialEq)]
pub struct TimerState {
    status: TimerStatus,
    activity: Option<String>,
    start_time: Option<NaiveDateTime>,
    pause_started: Option<NaiveDateTime>,
    /// Pause time from windows that have already been resumed.
    accumulated_pause: Duration,
}

impl Default for TimerState {
    fn default() -> Self {
        Self {
            status: TimerStatus::Idle,
            activity: None,
            start_time: None,
            pause_started: None,
            accumulated_pause: Duration::zero(),
        }
    }
}

impl TimerState {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn status(&self) -> TimerStatus {
        self.status
    }

    pub fn activity(&self) -> Option<&str> {
        self.activity.as_deref()
    }

    pub fn start_time(&self) -> Option<NaiveDateTime> {
        self.start_time
    }

    pub fn is_active(&self) -> bool {
        self.status != TimerStatus::Idle
    }

    /// Starts a fresh run. Whatever was in progress is dropped without a record.
    pub fn select(&mut self, activity: &str, now: NaiveDateTime) -> Result<(), ValidationError> {
        let activity = activity.trim();
        if activity.is_empty() {
            return Err(ValidationError::EmptyActivity);
        }

        *self = Self {
            status: TimerStatus::Running,
            activity: Some(activity.to_string()),
            start_time: Some(now),
            pause_started: None,
            accumulated_pause: Duration::zero(),
        };
        Ok(())
    }

    pub fn pause(&mut self, now: NaiveDateTime) {
        if self.status != TimerStatus::Running {
            return;
        }
        self.status = TimerStatus::Paused;
        self.pause_started = Some(now);
    }

    pub fn resume(&mut self, now: NaiveDateTime) {
        if self.status != TimerStatus::Paused {
            return;
        }
        if let Some(paused_at) = self.pause_started.take() {
            self.accumulated_pause = self.accumulated_pause + (now - paused_at).max(Duration::zero());
        }
        self.status = TimerStatus::Running;
    }

    pub fn reset(&mut self) {
        *self = Self::default();
    }

    /// Total pause time, counting an open pause up to `now`.
    pub fn paused_total(&self, now: NaiveDateTime) -> Duration {
        let open = match (self.status, self.pause_started) {
            (TimerStatus::Paused, Some(paused_at)) => (now - paused_at).max(Duration::zero()),
            _ => Duration::zero(),
        };
        self.accumulated_pause + open
    }

    /// Time spent running. Frozen while paused, zero while idle.
    pub fn elapsed(&self, now: NaiveDateTime) -> Duration {
        let Some(start) = self.start_time else {
            return Duration::zero();
        };
        let until = match self.status {
            TimerStatus::Idle => return Duration::zero(),
            TimerStatus::Running => now,
            TimerStatus::Paused => self.pause_started.unwrap_or(now),
        };
        (until - start - self.accumulated_pause).max(Duration::zero())
    }

    /// Fraction of `target_minutes` covered by the elapsed time, capped at 1.
    pub fn progress(&self, now: NaiveDateTime, target_minutes: u32) -> f64 {
        if target_minutes == 0 {
            return 0.0;
        }
        let elapsed_secs = self.elapsed(now).num_seconds() as f64;
        (elapsed_secs / (f64::from(target_minutes) * 60.0)).clamp(0.0, 1.0)
    }

    /// The record `stop` would emit at `now`, without changing state.
    /// `None` while idle. A clock that went backwards gives a zero-length
    /// record ending at the start time.
    pub fn completed_session(&self, now: NaiveDateTime) -> Option<Result<NewSession, ValidationError>> {
        if !self.is_active() {
            return None;
        }
        let (activity, start) = (self.activity.as_deref()?, self.start_time?);
        let end = now.max(start);
        let paused_seconds = self.paused_total(end).num_seconds() as f64;
        Some(NewSession::new(activity, start, end).map(|s| s.with_paused_seconds(paused_seconds)))
    }

    /// Emits the finished session and returns to idle. The run is kept if
    /// no valid record could be built.
    pub fn stop(&mut self, now: NaiveDateTime) -> Option<Result<NewSession, ValidationError>> {
        let session = self.completed_session(now)?;
        if session.is_ok() {
            self.reset();
        }
        Some(session)
    }
}
