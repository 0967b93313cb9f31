use std::fmt::Write;

use anyhow::Result;
use chrono::{Local, NaiveDate};
use clap::{Args, Subcommand};

use crate::{
    db::{DailyTask, Profile, ProfileInput},
    settings::StudySettings,
};

use super::AppContext;

#[derive(Subcommand, Debug, PartialEq)]
pub enum TasksCommand {
    #[command(about = "Tasks planned for a day")]
    List {
        #[arg(long, help = "Day (YYYY-MM-DD). Defaults to today")]
        date: Option<NaiveDate>,
    },
    #[command(about = "Plan a task")]
    Add {
        #[arg(required = true, num_args = 1.., help = "Task text")]
        text: Vec<String>,
        #[arg(long, help = "Day (YYYY-MM-DD). Defaults to today")]
        date: Option<NaiveDate>,
    },
    #[command(about = "Mark a task as done")]
    Done { id: i64 },
    #[command(about = "Mark a task as not done")]
    Undo { id: i64 },
    #[command(about = "Delete a task")]
    Remove { id: i64 },
    #[command(about = "Delete the finished tasks of a day")]
    ClearDone {
        #[arg(long, help = "Day (YYYY-MM-DD). Defaults to today")]
        date: Option<NaiveDate>,
    },
}

#[derive(Subcommand, Debug, PartialEq)]
pub enum ProfileCommand {
    #[command(about = "Print the profile")]
    Show,
    #[command(about = "Change profile fields; omitted fields keep their value")]
    Set(ProfileFields),
}

#[derive(Args, Debug, Default, PartialEq)]
pub struct ProfileFields {
    #[arg(long)]
    full_name: Option<String>,
    #[arg(long)]
    nickname: Option<String>,
    #[arg(long)]
    school: Option<String>,
    #[arg(long)]
    year: Option<String>,
    #[arg(long)]
    university: Option<String>,
    #[arg(long)]
    email: Option<String>,
    #[arg(long)]
    phone: Option<String>,
    #[arg(long)]
    bio: Option<String>,
    #[arg(long)]
    photo_path: Option<String>,
}

impl ProfileFields {
    fn apply(self, mut input: ProfileInput) -> ProfileInput {
        let fields = [
            (self.full_name, &mut input.full_name),
            (self.nickname, &mut input.nickname),
            (self.school, &mut input.school),
            (self.year, &mut input.year),
            (self.university, &mut input.university),
            (self.email, &mut input.email),
            (self.phone, &mut input.phone),
            (self.bio, &mut input.bio),
            (self.photo_path, &mut input.photo_path),
        ];
        for (value, slot) in fields {
            if let Some(value) = value {
                *slot = value;
            }
        }
        input
    }
}

#[derive(Subcommand, Debug, PartialEq)]
pub enum SettingsCommand {
    #[command(about = "Print the current settings")]
    Show,
    #[command(about = "Change settings")]
    Set {
        #[arg(long, help = "Daily study goal in minutes (10-1440)")]
        daily_goal: Option<u32>,
        #[arg(long, help = "Exam date (YYYY-MM-DD)", conflicts_with = "clear_exam_date")]
        exam_date: Option<NaiveDate>,
        #[arg(long, help = "Forget the exam date")]
        clear_exam_date: bool,
        #[arg(long, help = "Default session target: 15, 25, 30, 45, 60, 90 or 120 minutes")]
        target: Option<u32>,
        #[arg(long, value_delimiter = ',', help = "Tracker activities, comma separated")]
        activities: Option<Vec<String>>,
    },
}

pub async fn process_tasks_command(ctx: &AppContext, command: TasksCommand) -> Result<()> {
    let today = Local::now().date_naive();
    match command {
        TasksCommand::List { date } => {
            let day = date.unwrap_or(today);
            let tasks = ctx.db.tasks_for(day).await?;
            print!("{}", render_tasks(day, &tasks));
        }
        TasksCommand::Add { text, date } => {
            let task = ctx.db.add_task(date.unwrap_or(today), &text.join(" ")).await?;
            println!("Added #{}: {}", task.id, task.text);
        }
        TasksCommand::Done { id } => {
            ctx.db.set_task_done(id, true).await?;
            println!("Task #{id} done.");
        }
        TasksCommand::Undo { id } => {
            ctx.db.set_task_done(id, false).await?;
            println!("Task #{id} reopened.");
        }
        TasksCommand::Remove { id } => {
            ctx.db.delete_task(id).await?;
            println!("Task #{id} removed.");
        }
        TasksCommand::ClearDone { date } => {
            let removed = ctx.db.clear_completed_tasks(date.unwrap_or(today)).await?;
            println!("Cleared {removed} finished task(s).");
        }
    }
    Ok(())
}

pub async fn process_profile_command(ctx: &AppContext, command: ProfileCommand) -> Result<()> {
    let profile = match command {
        ProfileCommand::Show => ctx.db.profile().await?,
        ProfileCommand::Set(fields) => {
            let current = ctx.db.profile().await?;
            ctx.db.update_profile(&fields.apply(current.to_input())).await?
        }
    };
    print!("{}", render_profile(&profile));
    Ok(())
}

pub fn process_settings_command(ctx: &AppContext, command: SettingsCommand) -> Result<()> {
    let settings = match command {
        SettingsCommand::Show => ctx.settings.get(),
        SettingsCommand::Set {
            daily_goal,
            exam_date,
            clear_exam_date,
            target,
            activities,
        } => ctx.settings.update(|s| {
            if let Some(goal) = daily_goal {
                s.daily_goal_minutes = goal;
            }
            if clear_exam_date {
                s.exam_date = None;
            } else if exam_date.is_some() {
                s.exam_date = exam_date;
            }
            if let Some(target) = target {
                s.session_target_minutes = target;
            }
            if let Some(activities) = activities {
                s.activities = activities.into_iter().map(|a| a.trim().to_string()).collect();
            }
        })?,
    };
    print!("{}", render_settings(&settings));
    Ok(())
}

pub(crate) fn render_tasks(day: NaiveDate, tasks: &[DailyTask]) -> String {
    let mut out = format!("Tasks for {day}\n");
    if tasks.is_empty() {
        out.push_str("  nothing planned\n");
        return out;
    }
    for task in tasks {
        let mark = if task.done { "x" } else { " " };
        let _ = writeln!(out, "  [{mark}] #{} {}", task.id, task.text);
    }
    let done = tasks.iter().filter(|t| t.done).count();
    let _ = writeln!(out, "{done}/{} done", tasks.len());
    out
}

pub(crate) fn render_profile(profile: &Profile) -> String {
    let mut out = format!("{}\n", profile.display_name());
    for (label, value) in [
        ("Full name", &profile.full_name),
        ("Nickname", &profile.nickname),
        ("School", &profile.school),
        ("Year", &profile.year),
        ("University", &profile.university),
        ("Email", &profile.email),
        ("Phone", &profile.phone),
        ("Bio", &profile.bio),
        ("Photo", &profile.photo_path),
    ] {
        if !value.is_empty() {
            let _ = writeln!(out, "  {label:<11} {value}");
        }
    }
    if let Some(updated_at) = profile.updated_at {
        let _ = writeln!(out, "  Updated     {}", updated_at.format("%Y-%m-%d %H:%M"));
    }
    out
}

pub(crate) fn render_settings(settings: &StudySettings) -> String {
    let exam = settings
        .exam_date
        .map_or_else(|| "not set".to_string(), |d| d.to_string());
    format!(
        "Daily goal:     {} min\nExam date:      {exam}\nSession target: {} min\nActivities:     {}\n",
        settings.daily_goal_minutes,
        settings.session_target_minutes,
        settings.activities.join(", ")
    )
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::cli::Args as CliArgs;
    use clap::Parser;

    fn day() -> NaiveDate {
        NaiveDate::from_ymd_opt(2024, 5, 1).unwrap()
    }

    #[test]
    fn task_text_words_are_joined() {
        let args = CliArgs::try_parse_from(["lazy-genius", "tasks", "add", "Read", "renal", "notes"]).unwrap();
        let debug = format!("{args:?}");
        assert!(debug.contains(r#"text: ["Read", "renal", "notes"]"#));
        assert!(CliArgs::try_parse_from(["lazy-genius", "tasks", "add"]).is_err());
    }

    #[test]
    fn exam_date_flags_conflict() {
        assert!(CliArgs::try_parse_from([
            "lazy-genius",
            "settings",
            "set",
            "--exam-date",
            "2024-06-01",
            "--clear-exam-date",
        ])
        .is_err());
    }

    #[test]
    fn profile_fields_only_touch_given_values() {
        let current = ProfileInput {
            full_name: "Marcia Chiwalo".into(),
            school: "KUHES".into(),
            ..ProfileInput::default()
        };
        let fields = ProfileFields {
            school: Some(String::new()),
            nickname: Some("Mars".into()),
            ..ProfileFields::default()
        };
        let next = fields.apply(current);
        assert_eq!(next.full_name, "Marcia Chiwalo");
        assert_eq!(next.school, "");
        assert_eq!(next.nickname, "Mars");
    }

    #[test]
    fn task_list_marks_done_items() {
        let created_at = day().and_hms_opt(8, 0, 0).unwrap();
        let tasks = vec![
            DailyTask {
                id: 2,
                task_date: day(),
                text: "Ward round".into(),
                done: true,
                created_at,
            },
            DailyTask {
                id: 1,
                task_date: day(),
                text: "Flashcards".into(),
                done: false,
                created_at,
            },
        ];
        let text = render_tasks(day(), &tasks);
        assert!(text.contains("[x] #2 Ward round"));
        assert!(text.contains("[ ] #1 Flashcards"));
        assert!(text.ends_with("1/2 done\n"));
        assert!(render_tasks(day(), &[]).contains("nothing planned"));
    }

    #[test]
    fn settings_render_exam_placeholder() {
        let text = render_settings(&StudySettings::default());
        assert!(text.contains("Exam date:      not set"));
        assert!(text.contains("Study, Ward, Lecture, Break, Sleep"));
    }
}
