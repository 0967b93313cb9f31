use anyhow::Result;
use chrono::NaiveDate;
use serde::Serialize;

use super::{days_until, goal_progress_percent, study_streak, top_activity, total_minutes};
use crate::{db::Database, settings::StudySettings};

/// Numbers behind the home view.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct DashboardSummary {
    pub display_name: String,
    pub today_minutes: f64,
    pub goal_minutes: u32,
    pub progress_percent: u32,
    pub streak_days: u32,
    pub days_to_exam: i64,
    pub question_count: u64,
    pub top_activity: Option<(String, f64)>,
}

pub async fn build_dashboard(
    db: &Database,
    settings: &StudySettings,
    today: NaiveDate,
) -> Result<DashboardSummary> {
    let sessions = db.sessions_on(today).await?;
    let active_days = db.active_days().await?;
    let profile = db.profile().await?;
    let question_count = db.question_count().await?;

    let today_minutes = total_minutes(&sessions);
    Ok(DashboardSummary {
        display_name: profile.display_name().to_string(),
        today_minutes,
        goal_minutes: settings.daily_goal_minutes,
        progress_percent: goal_progress_percent(today_minutes, settings.daily_goal_minutes),
        streak_days: study_streak(&active_days, today),
        days_to_exam: days_until(settings.exam_date, today),
        question_count,
        top_activity: top_activity(&sessions),
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::db::{models::DEFAULT_DISPLAY_NAME, NewSession, ProfileInput, QuestionType};
    use chrono::NaiveDateTime;
    use tempfile::tempdir;

    fn at(day: NaiveDate, h: u32, m: u32) -> NaiveDateTime {
        day.and_hms_opt(h, m, 0).unwrap()
    }

    #[tokio::test]
    async fn empty_store_gives_zeroed_summary() -> Result<()> {
        let dir = tempdir()?;
        let db = Database::new(dir.path().join("study.sqlite3"))?;
        let today = NaiveDate::from_ymd_opt(2024, 3, 10).unwrap();

        let summary = build_dashboard(&db, &StudySettings::default(), today).await?;
        assert_eq!(summary.display_name, DEFAULT_DISPLAY_NAME);
        assert_eq!(summary.today_minutes, 0.0);
        assert_eq!(summary.progress_percent, 0);
        assert_eq!(summary.streak_days, 0);
        assert_eq!(summary.days_to_exam, 0);
        assert_eq!(summary.question_count, 0);
        assert_eq!(summary.top_activity, None);
        Ok(())
    }

    #[tokio::test]
    async fn summary_reflects_logged_work() -> Result<()> {
        let dir = tempdir()?;
        let db = Database::new(dir.path().join("study.sqlite3"))?;
        let today = NaiveDate::from_ymd_opt(2024, 3, 10).unwrap();
        let yesterday = NaiveDate::from_ymd_opt(2024, 3, 9).unwrap();

        db.save_session(&NewSession::new("Study", at(yesterday, 9, 0), at(yesterday, 10, 0))?)
            .await?;
        db.save_session(&NewSession::new("Study", at(today, 8, 0), at(today, 8, 30))?)
            .await?;
        db.save_session(&NewSession::new("Ward", at(today, 9, 0), at(today, 9, 15))?)
            .await?;
        db.add_question("Renal", QuestionType::Mcq, "Q", "A").await?;
        db.update_profile(&ProfileInput {
            nickname: "Mars".into(),
            ..ProfileInput::default()
        })
        .await?;

        let settings = StudySettings {
            daily_goal_minutes: 90,
            exam_date: NaiveDate::from_ymd_opt(2024, 3, 31),
            ..StudySettings::default()
        };
        let summary = build_dashboard(&db, &settings, today).await?;

        assert_eq!(summary.display_name, "Mars");
        assert_eq!(summary.today_minutes, 45.0);
        assert_eq!(summary.goal_minutes, 90);
        assert_eq!(summary.progress_percent, 50);
        assert_eq!(summary.streak_days, 2);
        assert_eq!(summary.days_to_exam, 21);
        assert_eq!(summary.question_count, 1);
        assert_eq!(summary.top_activity, Some(("Study".to_string(), 30.0)));
        Ok(())
    }
}
