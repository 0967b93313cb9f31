use std::fmt::Write;

use anyhow::{Context, Result};
use chrono::{Local, NaiveDate};
use serde::Serialize;

use crate::{
    analytics::{build_dashboard, DashboardSummary, RangeReport},
    db::{DateRange, Session},
    utils::format::minutes_to_pretty,
};

use super::AppContext;

const DEFAULT_REPORT_DAYS: u32 = 7;

pub async fn show_today(ctx: &AppContext, json: bool) -> Result<()> {
    let today = Local::now().date_naive();
    let sessions = ctx.db.sessions_on(today).await?;
    let report = RangeReport::new(DateRange::single_day(today), sessions);
    print!("{}", output(&report, json, render_session_log)?);
    Ok(())
}

pub async fn show_report(
    ctx: &AppContext,
    from: Option<NaiveDate>,
    to: Option<NaiveDate>,
    json: bool,
) -> Result<()> {
    let range = report_range(from, to, Local::now().date_naive())?;
    let sessions = ctx.db.sessions_between(&range).await?;
    print!("{}", output(&RangeReport::new(range, sessions), json, render_report)?);
    Ok(())
}

pub async fn show_home(ctx: &AppContext, json: bool) -> Result<()> {
    let today = Local::now().date_naive();
    let summary = build_dashboard(&ctx.db, &ctx.settings.get(), today).await?;
    print!("{}", output(&summary, json, render_dashboard)?);
    Ok(())
}

/// Pretty JSON when `json` is set, the text rendering otherwise.
fn output<T: Serialize>(value: &T, json: bool, render: fn(&T) -> String) -> Result<String> {
    if !json {
        return Ok(render(value));
    }
    let mut out = serde_json::to_string_pretty(value).context("failed to encode JSON output")?;
    out.push('\n');
    Ok(out)
}

/// Missing ends default to the trailing week ending today.
pub(crate) fn report_range(
    from: Option<NaiveDate>,
    to: Option<NaiveDate>,
    today: NaiveDate,
) -> Result<DateRange> {
    let range = match (from, to) {
        (None, None) => DateRange::trailing_days(today, DEFAULT_REPORT_DAYS),
        (Some(from), None) => DateRange::new(from, today.max(from))?,
        (None, Some(to)) => DateRange::trailing_days(to, DEFAULT_REPORT_DAYS),
        (Some(from), Some(to)) => DateRange::new(from, to)?,
    };
    Ok(range)
}

fn session_line(session: &Session) -> String {
    let mut line = format!(
        "{}  {}-{}  {:<10} {}",
        session.start_time.format("%Y-%m-%d"),
        session.start_time.format("%H:%M"),
        session.end_time.format("%H:%M"),
        session.activity,
        minutes_to_pretty(session.duration_minutes),
    );
    if session.paused_seconds > 0.0 {
        let _ = write!(line, " (paused {})", minutes_to_pretty(session.paused_seconds / 60.0));
    }
    line
}

pub(crate) fn render_session_log(report: &RangeReport) -> String {
    let mut out = String::new();
    if report.is_empty() {
        out.push_str("No sessions logged yet today.\n");
        return out;
    }
    for session in &report.sessions {
        let _ = writeln!(out, "{}", session_line(session));
    }
    let _ = writeln!(out, "\nTotal: {}", minutes_to_pretty(report.total_minutes));
    for (activity, minutes) in &report.by_activity {
        let _ = writeln!(out, "  {activity:<10} {}", minutes_to_pretty(*minutes));
    }
    out
}

pub(crate) fn render_report(report: &RangeReport) -> String {
    let mut out = format!(
        "{} to {} ({} days)\n",
        report.range.start(),
        report.range.end(),
        report.range.num_days()
    );
    if report.is_empty() {
        out.push_str("No sessions in this range.\n");
        return out;
    }

    let _ = writeln!(out, "Total: {:.1} hrs", report.total_hours());
    out.push_str("\nBy activity\n");
    for (activity, minutes) in &report.by_activity {
        let _ = writeln!(out, "  {activity:<10} {:>7.1} min", minutes);
    }
    out.push_str("\nBy day\n");
    for (day, minutes) in &report.daily {
        let _ = writeln!(out, "  {day}  {:>7.1} min", minutes);
    }
    out
}

pub(crate) fn render_dashboard(summary: &DashboardSummary) -> String {
    let mut out = format!("Welcome back, {}.\n\n", summary.display_name);
    let _ = writeln!(
        out,
        "Today:     {} of {} min goal ({}%)",
        minutes_to_pretty(summary.today_minutes),
        summary.goal_minutes,
        summary.progress_percent
    );
    let _ = writeln!(out, "Streak:    {} day(s)", summary.streak_days);
    if summary.days_to_exam > 0 {
        let _ = writeln!(out, "Exam in:   {} day(s)", summary.days_to_exam);
    }
    let _ = writeln!(out, "Questions: {}", summary.question_count);
    if let Some((activity, minutes)) = &summary.top_activity {
        let _ = writeln!(out, "Top today: {activity} ({})", minutes_to_pretty(*minutes));
    }
    out
}
