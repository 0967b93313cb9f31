//! Session-related data models.

use chrono::{NaiveDate, NaiveDateTime};
use serde::{Deserialize, Serialize};

use crate::{db::helpers::truncate_to_second, error::ValidationError};

/// A completed, stored study session. Immutable once written.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct Session {
    pub id: i64,
    pub activity: String,
    pub start_time: NaiveDateTime,
    pub end_time: NaiveDateTime,
    /// Wall-clock span `end_time - start_time`, pauses included.
    pub duration_minutes: f64,
    pub paused_seconds: f64,
}

impl Session {
    pub fn start_date(&self) -> NaiveDate {
        self.start_time.date()
    }

    /// Duration with the recorded pause time taken out.
    pub fn focused_minutes(&self) -> f64 {
        (self.duration_minutes - self.paused_seconds / 60.0).max(0.0)
    }
}

/// A session that has not been stored yet.
///
/// Only constructible through [`NewSession::new`], which guarantees a
/// non-empty activity and `end_time >= start_time`.
#[derive(Debug, Clone, PartialEq)]
pub struct NewSession {
    activity: String,
    start_time: NaiveDateTime,
    end_time: NaiveDateTime,
    paused_seconds: f64,
}

impl NewSession {
    pub fn new(
        activity: &str,
        start_time: NaiveDateTime,
        end_time: NaiveDateTime,
    ) -> Result<Self, ValidationError> {
        let activity = activity.trim();
        if activity.is_empty() {
            return Err(ValidationError::EmptyActivity);
        }

        let start_time = truncate_to_second(start_time);
        let end_time = truncate_to_second(end_time);
        if end_time < start_time {
            return Err(ValidationError::EndBeforeStart {
                start: start_time.to_string(),
                end: end_time.to_string(),
            });
        }

        Ok(Self {
            activity: activity.to_string(),
            start_time,
            end_time,
            paused_seconds: 0.0,
        })
    }

    pub fn with_paused_seconds(mut self, paused_seconds: f64) -> Self {
        self.paused_seconds = paused_seconds.max(0.0);
        self
    }

    pub fn activity(&self) -> &str {
        &self.activity
    }

    pub fn start_time(&self) -> NaiveDateTime {
        self.start_time
    }

    pub fn end_time(&self) -> NaiveDateTime {
        self.end_time
    }

    pub fn paused_seconds(&self) -> f64 {
        self.paused_seconds
    }

    pub fn duration_minutes(&self) -> f64 {
        (self.end_time - self.start_time).num_seconds() as f64 / 60.0
    }

    pub fn into_session(self, id: i64) -> Session {
        Session {
            id,
            duration_minutes: self.duration_minutes(),
            activity: self.activity,
            start_time: self.start_time,
            end_time: self.end_time,
            paused_seconds: self.paused_seconds,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::db::helpers::parse_timestamp;

    fn ts(raw: &str) -> NaiveDateTime {
        parse_timestamp(raw, "test").unwrap()
    }

    #[test]
    fn duration_is_the_wall_clock_span() {
        let session =
            NewSession::new("Study", ts("2024-01-01T09:00:00"), ts("2024-01-01T10:30:00")).unwrap();
        assert_eq!(session.duration_minutes(), 90.0);
    }

    #[test]
    fn rejects_blank_activity() {
        let err = NewSession::new("   ", ts("2024-01-01T09:00:00"), ts("2024-01-01T09:00:00"))
            .unwrap_err();
        assert_eq!(err, ValidationError::EmptyActivity);
    }

    #[test]
    fn rejects_end_before_start() {
        let err = NewSession::new("Ward", ts("2024-01-01T11:00:00"), ts("2024-01-01T10:59:59"))
            .unwrap_err();
        assert!(matches!(err, ValidationError::EndBeforeStart { .. }));
    }

    #[test]
    fn zero_length_session_is_allowed() {
        let at = ts("2024-01-01T11:00:00");
        let session = NewSession::new("Break", at, at).unwrap();
        assert_eq!(session.duration_minutes(), 0.0);
    }

    #[test]
    fn focused_minutes_subtracts_pauses() {
        let session = NewSession::new("Study", ts("2024-01-01T09:00:00"), ts("2024-01-01T09:20:00"))
            .unwrap()
            .with_paused_seconds(180.0)
            .into_session(1);

        assert_eq!(session.duration_minutes, 20.0);
        assert_eq!(session.focused_minutes(), 17.0);
    }
}
