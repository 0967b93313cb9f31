use std::sync::{
    atomic::{AtomicU32, Ordering},
    Arc,
};

use anyhow::Result;
use chrono::NaiveDateTime;
use tokio::sync::Mutex;

use crate::{
    db::{Database, Session},
    log_error, log_info,
    settings::validate_session_target,
};

use super::{Clock, TimerState, TimerStatus};

const ENABLE_LOGS: bool = true;

/// What the tracker screen draws on each tick.
#[derive(Debug, Clone, PartialEq)]
pub struct TimerSnapshot {
    pub status: TimerStatus,
    pub activity: Option<String>,
    pub start_time: Option<NaiveDateTime>,
    pub elapsed_secs: i64,
    pub paused_secs: i64,
    pub target_minutes: u32,
    pub progress: f64,
}

#[derive(Clone)]
pub struct TimerController {
    state: Arc<Mutex<TimerState>>,
    db: Database,
    clock: Arc<dyn Clock>,
    target_minutes: Arc<AtomicU32>,
}

impl TimerController {
    pub fn new(db: Database, clock: Arc<dyn Clock>, target_minutes: u32) -> Self {
        Self {
            state: Arc::new(Mutex::new(TimerState::new())),
            db,
            clock,
            target_minutes: Arc::new(AtomicU32::new(target_minutes)),
        }
    }

    pub async fn snapshot(&self) -> TimerSnapshot {
        let now = self.clock.now();
        let target_minutes = self.target_minutes();
        let state = self.state.lock().await;
        TimerSnapshot {
            status: state.status(),
            activity: state.activity().map(str::to_string),
            start_time: state.start_time(),
            elapsed_secs: state.elapsed(now).num_seconds(),
            paused_secs: state.paused_total(now).num_seconds(),
            target_minutes,
            progress: state.progress(now, target_minutes),
        }
    }

    pub fn target_minutes(&self) -> u32 {
        self.target_minutes.load(Ordering::Relaxed)
    }

    pub fn set_target_minutes(&self, minutes: u32) -> Result<()> {
        validate_session_target(minutes)?;
        self.target_minutes.store(minutes, Ordering::Relaxed);
        Ok(())
    }

    /// Starts timing `activity`, dropping any run in progress.
    pub async fn select(&self, activity: &str) -> Result<()> {
        let now = self.clock.now();
        let mut state = self.state.lock().await;
        if state.is_active() {
            log_info!(
                "Discarding {:?} run to start {:?}",
                state.activity().unwrap_or_default(),
                activity.trim()
            );
        }
        state.select(activity, now)?;
        Ok(())
    }

    pub async fn pause(&self) {
        let now = self.clock.now();
        self.state.lock().await.pause(now);
    }

    pub async fn resume(&self) {
        let now = self.clock.now();
        self.state.lock().await.resume(now);
    }

    /// Pauses a running timer, resumes a paused one, ignores an idle one.
    pub async fn toggle_pause(&self) {
        let now = self.clock.now();
        let mut state = self.state.lock().await;
        match state.status() {
            TimerStatus::Running => state.pause(now),
            TimerStatus::Paused => state.resume(now),
            TimerStatus::Idle => {}
        }
    }

    pub async fn reset(&self) {
        self.state.lock().await.reset();
    }

    /// Stores the current run and returns to idle. The timer is only reset
    /// once the row is written; a failed save leaves it as it was so the
    /// user can try again. `Ok(None)` when nothing was running.
    pub async fn stop_and_save(&self) -> Result<Option<Session>> {
        let now = self.clock.now();
        let mut state = self.state.lock().await;
        let Some(record) = state.completed_session(now) else {
            return Ok(None);
        };
        let record = record?;

        match self.db.save_session(&record).await {
            Ok(session) => {
                state.reset();
                log_info!(
                    "Saved {} session #{} ({:.1} min)",
                    session.activity,
                    session.id,
                    session.duration_minutes
                );
                Ok(Some(session))
            }
            Err(err) => {
                log_error!("Failed to save {} session: {:#}", record.activity(), err);
                Err(err)
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::{
        db::DateRange,
        error::{as_validation_error, is_storage_error, ValidationError},
        timer::ManualClock,
    };
    use chrono::{Duration, NaiveDate};
    use tempfile::tempdir;

    fn t0() -> NaiveDateTime {
        NaiveDate::from_ymd_opt(2024, 1, 1)
            .unwrap()
            .and_hms_opt(9, 0, 0)
            .unwrap()
    }

    #[tokio::test]
    async fn stop_and_save_persists_wall_clock_duration() -> Result<()> {
        let dir = tempdir()?;
        let db = Database::new(dir.path().join("study.sqlite3"))?;
        let clock = Arc::new(ManualClock::new(t0()));
        let timer = TimerController::new(db.clone(), clock.clone(), 25);

        timer.select("Study").await?;
        clock.advance(Duration::minutes(5));
        timer.pause().await;
        clock.advance(Duration::minutes(3));
        timer.resume().await;
        clock.advance(Duration::minutes(12));

        let snapshot = timer.snapshot().await;
        assert_eq!(snapshot.elapsed_secs, 17 * 60);
        assert_eq!(snapshot.paused_secs, 3 * 60);

        let saved = timer.stop_and_save().await?.expect("a session was running");
        assert_eq!(saved.duration_minutes, 20.0);
        assert_eq!(saved.paused_seconds, 180.0);
        assert_eq!(timer.snapshot().await.status, TimerStatus::Idle);

        let stored = db.sessions_between(&DateRange::single_day(t0().date())).await?;
        assert_eq!(stored, vec![saved]);
        Ok(())
    }

    #[tokio::test]
    async fn stop_while_idle_saves_nothing() -> Result<()> {
        let dir = tempdir()?;
        let db = Database::new(dir.path().join("study.sqlite3"))?;
        let timer = TimerController::new(db.clone(), Arc::new(ManualClock::new(t0())), 25);

        assert_eq!(timer.stop_and_save().await?, None);
        assert!(db.active_days().await?.is_empty());
        Ok(())
    }

    #[tokio::test]
    async fn failed_save_keeps_the_run() -> Result<()> {
        let dir = tempdir()?;
        let db = Database::new(dir.path().join("study.sqlite3"))?;
        let clock = Arc::new(ManualClock::new(t0()));
        let timer = TimerController::new(db.clone(), clock.clone(), 25);

        timer.select("Ward").await?;
        clock.advance(Duration::minutes(10));

        db.execute("break sessions table", |conn| {
            conn.execute("ALTER TABLE sessions RENAME TO sessions_gone", [])?;
            Ok(())
        })
        .await?;

        let err = timer.stop_and_save().await.unwrap_err();
        assert!(is_storage_error(&err));

        let snapshot = timer.snapshot().await;
        assert_eq!(snapshot.status, TimerStatus::Running);
        assert_eq!(snapshot.activity.as_deref(), Some("Ward"));
        assert_eq!(snapshot.start_time, Some(t0()));
        Ok(())
    }

    #[tokio::test]
    async fn clock_set_back_still_saves_and_goes_idle() -> Result<()> {
        let dir = tempdir()?;
        let db = Database::new(dir.path().join("study.sqlite3"))?;
        let start = NaiveDate::from_ymd_opt(2024, 11, 3)
            .unwrap()
            .and_hms_opt(1, 30, 0)
            .unwrap();
        let clock = Arc::new(ManualClock::new(start));
        let timer = TimerController::new(db.clone(), clock.clone(), 25);

        timer.select("Study").await?;
        clock.advance(Duration::minutes(40));
        clock.set(start - Duration::minutes(20));

        let saved = timer.stop_and_save().await?.expect("a session was running");
        assert_eq!(saved.start_time, start);
        assert_eq!(saved.end_time, start);
        assert_eq!(saved.duration_minutes, 0.0);
        assert_eq!(timer.snapshot().await.status, TimerStatus::Idle);

        let stored = db.sessions_between(&DateRange::single_day(start.date())).await?;
        assert_eq!(stored, vec![saved]);
        Ok(())
    }

    #[tokio::test]
    async fn toggle_pause_and_reset() -> Result<()> {
        let dir = tempdir()?;
        let db = Database::new(dir.path().join("study.sqlite3"))?;
        let clock = Arc::new(ManualClock::new(t0()));
        let timer = TimerController::new(db, clock.clone(), 25);

        timer.toggle_pause().await;
        assert_eq!(timer.snapshot().await.status, TimerStatus::Idle);

        timer.select("Lecture").await?;
        timer.toggle_pause().await;
        assert_eq!(timer.snapshot().await.status, TimerStatus::Paused);
        timer.toggle_pause().await;
        assert_eq!(timer.snapshot().await.status, TimerStatus::Running);

        timer.reset().await;
        assert_eq!(timer.stop_and_save().await?, None);
        Ok(())
    }

    #[tokio::test]
    async fn target_drives_progress() -> Result<()> {
        let dir = tempdir()?;
        let db = Database::new(dir.path().join("study.sqlite3"))?;
        let clock = Arc::new(ManualClock::new(t0()));
        let timer = TimerController::new(db, clock.clone(), 25);

        let err = timer.set_target_minutes(40).unwrap_err();
        assert_eq!(as_validation_error(&err), Some(&ValidationError::UnknownTarget(40)));
        timer.set_target_minutes(30)?;

        timer.select("Study").await?;
        clock.advance(Duration::minutes(15));
        let snapshot = timer.snapshot().await;
        assert_eq!(snapshot.target_minutes, 30);
        assert!((snapshot.progress - 0.5).abs() < 1e-9);
        Ok(())
    }

    #[tokio::test]
    async fn blank_activity_is_rejected() -> Result<()> {
        let dir = tempdir()?;
        let db = Database::new(dir.path().join("study.sqlite3"))?;
        let timer = TimerController::new(db, Arc::new(ManualClock::new(t0())), 25);

        let err = timer.select("   ").await.unwrap_err();
        assert_eq!(as_validation_error(&err), Some(&ValidationError::EmptyActivity));
        Ok(())
    }
}
