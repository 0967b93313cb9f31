use anyhow::Result;
use chrono::{Local, NaiveDate};
use rusqlite::{params, Row};

use crate::db::{
    connection::Database,
    helpers::{format_date, format_timestamp, parse_date, parse_timestamp},
    models::{DateRange, NewSession, Session},
};

const SESSION_COLUMNS: &str =
    "id, activity, start_time, end_time, duration_minutes, paused_seconds";

fn row_to_session(row: &Row) -> Result<Session> {
    let start_time: String = row.get("start_time")?;
    let end_time: String = row.get("end_time")?;

    Ok(Session {
        id: row.get("id")?,
        activity: row.get("activity")?,
        start_time: parse_timestamp(&start_time, "start_time")?,
        end_time: parse_timestamp(&end_time, "end_time")?,
        duration_minutes: row.get("duration_minutes")?,
        paused_seconds: row.get("paused_seconds")?,
    })
}

impl Database {
    /// Appends one completed session. There is no update path.
    pub async fn save_session(&self, session: &NewSession) -> Result<Session> {
        let record = session.clone();
        self.execute("save session", move |conn| {
            conn.execute(
                "INSERT INTO sessions (activity, start_time, end_time, duration_minutes, paused_seconds)
                 VALUES (?1, ?2, ?3, ?4, ?5)",
                params![
                    record.activity(),
                    format_timestamp(&record.start_time()),
                    format_timestamp(&record.end_time()),
                    record.duration_minutes(),
                    record.paused_seconds(),
                ],
            )?;
            let id = conn.last_insert_rowid();
            Ok(record.into_session(id))
        })
        .await
    }

    pub async fn sessions_today(&self) -> Result<Vec<Session>> {
        self.sessions_on(Local::now().date_naive()).await
    }

    /// Sessions that started on `day`, most recent first.
    pub async fn sessions_on(&self, day: NaiveDate) -> Result<Vec<Session>> {
        self.sessions_between(&DateRange::single_day(day)).await
    }

    /// Sessions whose start date lies in `range` (inclusive), most recent first.
    pub async fn sessions_between(&self, range: &DateRange) -> Result<Vec<Session>> {
        let start = format_date(&range.start());
        let end = format_date(&range.end());
        self.execute("load sessions in range", move |conn| {
            let mut stmt = conn.prepare(&format!(
                "SELECT {SESSION_COLUMNS}
                 FROM sessions
                 WHERE substr(start_time, 1, 10) BETWEEN ?1 AND ?2
                 ORDER BY start_time DESC, id DESC"
            ))?;

            let mut rows = stmt.query(params![start, end])?;
            let mut sessions = Vec::new();
            while let Some(row) = rows.next()? {
                sessions.push(row_to_session(row)?);
            }

            Ok(sessions)
        })
        .await
    }

    /// Distinct dates with at least one session, newest first.
    pub async fn active_days(&self) -> Result<Vec<NaiveDate>> {
        self.execute("load active days", |conn| {
            let mut stmt = conn.prepare(
                "SELECT DISTINCT substr(start_time, 1, 10) AS d
                 FROM sessions
                 ORDER BY d DESC",
            )?;

            let mut rows = stmt.query([])?;
            let mut days = Vec::new();
            while let Some(row) = rows.next()? {
                let raw: String = row.get(0)?;
                days.push(parse_date(&raw, "start_time")?);
            }

            Ok(days)
        })
        .await
    }

    pub async fn minutes_for_date(&self, day: NaiveDate) -> Result<f64> {
        let day = format_date(&day);
        self.execute("sum minutes for date", move |conn| {
            let minutes: f64 = conn.query_row(
                "SELECT COALESCE(SUM(duration_minutes), 0.0)
                 FROM sessions
                 WHERE substr(start_time, 1, 10) = ?1",
                params![day],
                |row| row.get(0),
            )?;
            Ok(minutes)
        })
        .await
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::{analytics::total_minutes, db::helpers::parse_timestamp};
    use chrono::NaiveDateTime;
    use tempfile::{tempdir, TempDir};

    fn ts(raw: &str) -> NaiveDateTime {
        parse_timestamp(raw, "test").unwrap()
    }

    fn day(raw: &str) -> NaiveDate {
        parse_date(raw, "test").unwrap()
    }

    fn open() -> (TempDir, Database) {
        let dir = tempdir().unwrap();
        let db = Database::new(dir.path().join("study.sqlite3")).unwrap();
        (dir, db)
    }

    async fn seed(db: &Database, activity: &str, start: &str, end: &str) -> Session {
        let session = NewSession::new(activity, ts(start), ts(end)).unwrap();
        db.save_session(&session).await.unwrap()
    }

    #[tokio::test]
    async fn save_then_range_query_round_trips() {
        let (_dir, db) = open();
        let new = NewSession::new("Study", ts("2024-01-01T09:00:00"), ts("2024-01-01T10:30:00"))
            .unwrap()
            .with_paused_seconds(120.0);
        let saved = db.save_session(&new).await.unwrap();

        let loaded = db
            .sessions_between(&DateRange::new(day("2023-12-31"), day("2024-01-02")).unwrap())
            .await
            .unwrap();

        assert_eq!(loaded.len(), 1);
        let got = &loaded[0];
        assert_eq!(got, &saved);
        assert_eq!(got.activity, "Study");
        assert_eq!(got.start_time, ts("2024-01-01T09:00:00"));
        assert_eq!(got.end_time, ts("2024-01-01T10:30:00"));
        assert!((got.duration_minutes - 90.0).abs() < 1e-9);
        assert_eq!(got.paused_seconds, 120.0);
    }

    #[tokio::test]
    async fn single_day_range_returns_exactly_that_day() {
        let (_dir, db) = open();
        seed(&db, "Study", "2024-01-01T23:30:00", "2024-01-02T00:15:00").await;
        seed(&db, "Ward", "2024-01-02T08:00:00", "2024-01-02T09:00:00").await;
        seed(&db, "Lecture", "2024-01-02T13:00:00", "2024-01-02T14:00:00").await;
        seed(&db, "Sleep", "2024-01-03T00:00:00", "2024-01-03T07:00:00").await;

        let sessions = db.sessions_on(day("2024-01-02")).await.unwrap();
        let activities: Vec<_> = sessions.iter().map(|s| s.activity.as_str()).collect();

        // A session crossing midnight belongs to the day it started.
        assert_eq!(activities, vec!["Lecture", "Ward"]);
        assert!(sessions.iter().all(|s| s.start_date() == day("2024-01-02")));
    }

    #[tokio::test]
    async fn sessions_are_most_recent_first() {
        let (_dir, db) = open();
        seed(&db, "Study", "2024-01-01T09:00:00", "2024-01-01T10:00:00").await;
        seed(&db, "Ward", "2024-01-01T11:00:00", "2024-01-01T11:20:00").await;
        seed(&db, "Break", "2024-01-01T10:15:00", "2024-01-01T10:30:00").await;

        let sessions = db.sessions_on(day("2024-01-01")).await.unwrap();
        let starts: Vec<_> = sessions.iter().map(|s| s.start_time).collect();
        let mut sorted = starts.clone();
        sorted.sort_by(|a, b| b.cmp(a));
        assert_eq!(starts, sorted);
    }

    #[tokio::test]
    async fn today_total_matches_seeded_rows() {
        let (_dir, db) = open();
        let today = Local::now().date_naive();
        let yesterday = today.pred_opt().unwrap();

        for (start_h, minutes) in [(6, 25), (8, 50), (13, 5)] {
            let start = today.and_hms_opt(start_h, 0, 0).unwrap();
            let end = start + chrono::Duration::minutes(minutes);
            db.save_session(&NewSession::new("Study", start, end).unwrap())
                .await
                .unwrap();
        }
        let old = yesterday.and_hms_opt(9, 0, 0).unwrap();
        db.save_session(
            &NewSession::new("Ward", old, old + chrono::Duration::minutes(45)).unwrap(),
        )
        .await
        .unwrap();

        let sessions = db.sessions_today().await.unwrap();
        assert_eq!(sessions.len(), 3);
        assert!((total_minutes(&sessions) - 80.0).abs() < 1e-9);
        assert!((db.minutes_for_date(today).await.unwrap() - 80.0).abs() < 1e-9);
    }

    #[tokio::test]
    async fn active_days_are_distinct_and_descending() {
        let (_dir, db) = open();
        seed(&db, "Study", "2024-01-01T09:00:00", "2024-01-01T10:00:00").await;
        seed(&db, "Ward", "2024-01-01T11:00:00", "2024-01-01T11:20:00").await;
        seed(&db, "Study", "2024-01-03T09:00:00", "2024-01-03T10:00:00").await;

        let days = db.active_days().await.unwrap();
        assert_eq!(days, vec![day("2024-01-03"), day("2024-01-01")]);
        assert_eq!(db.minutes_for_date(day("2024-01-02")).await.unwrap(), 0.0);
    }

    #[tokio::test]
    async fn empty_store_yields_empty_results() {
        let (_dir, db) = open();
        assert!(db.sessions_today().await.unwrap().is_empty());
        assert!(db.active_days().await.unwrap().is_empty());
    }
}
