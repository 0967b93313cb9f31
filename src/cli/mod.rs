mod bank;
mod planner;
mod report;
mod track;

use std::{
    env,
    path::{Path, PathBuf},
};

use anyhow::{anyhow, Context, Result};
use chrono::NaiveDate;
use clap::{Parser, Subcommand};
use log::debug;

use crate::{db::Database, settings::SettingsStore, utils::logging::init_logging};

pub const DATA_DIR_ENV_VAR: &str = "LAZY_GENIUS_DATA_DIR";
const DB_FILE_NAME: &str = "lazy-genius.sqlite3";
const SETTINGS_FILE_NAME: &str = "settings.json";
const LOG_FILE_NAME: &str = "lazy-genius.log";

#[derive(Parser, Debug)]
#[command(name = "lazy-genius", version)]
#[command(about = "Track study sessions, review your progress and quiz yourself", long_about = None)]
pub struct Args {
    #[command(subcommand)]
    command: Option<Commands>,
    #[arg(
        long,
        global = true,
        help = "Data directory. Defaults to $LAZY_GENIUS_DATA_DIR, then the platform data dir"
    )]
    data_dir: Option<PathBuf>,
    #[arg(long, short, global = true, help = "Enable debug logging")]
    verbose: bool,
}

#[derive(Subcommand, Debug, PartialEq)]
enum Commands {
    #[command(about = "Live session tracker (default)")]
    Track,
    #[command(about = "Today's session log and totals")]
    Today {
        #[arg(long, help = "Print JSON instead of text")]
        json: bool,
    },
    #[command(about = "Totals per activity and per day for a date range")]
    Report {
        #[arg(long, help = "First day (YYYY-MM-DD). Defaults to six days before --to")]
        from: Option<NaiveDate>,
        #[arg(long, help = "Last day (YYYY-MM-DD). Defaults to today")]
        to: Option<NaiveDate>,
        #[arg(long, help = "Print JSON instead of text")]
        json: bool,
    },
    #[command(about = "Goal progress, streak and exam countdown")]
    Home {
        #[arg(long, help = "Print JSON instead of text")]
        json: bool,
    },
    #[command(about = "Question bank")]
    Questions {
        #[command(subcommand)]
        command: bank::QuestionsCommand,
    },
    #[command(about = "Daily task list")]
    Tasks {
        #[command(subcommand)]
        command: planner::TasksCommand,
    },
    #[command(about = "Student profile")]
    Profile {
        #[command(subcommand)]
        command: planner::ProfileCommand,
    },
    #[command(about = "Daily goal, exam date and tracker defaults")]
    Settings {
        #[command(subcommand)]
        command: planner::SettingsCommand,
    },
}

/// Everything a command needs, opened once per invocation.
pub struct AppContext {
    pub data_dir: PathBuf,
    pub db: Database,
    pub settings: SettingsStore,
}

impl AppContext {
    pub fn open(data_dir: PathBuf) -> Result<Self> {
        std::fs::create_dir_all(&data_dir)
            .with_context(|| format!("Failed to create data directory {}", data_dir.display()))?;
        let db = Database::new(data_dir.join(DB_FILE_NAME))?;
        let settings = SettingsStore::new(data_dir.join(SETTINGS_FILE_NAME))?;
        Ok(Self {
            data_dir,
            db,
            settings,
        })
    }

    pub fn log_path(&self) -> PathBuf {
        log_path_in(&self.data_dir)
    }
}

fn log_path_in(data_dir: &Path) -> PathBuf {
    data_dir.join(LOG_FILE_NAME)
}

/// `--data-dir`, then `$LAZY_GENIUS_DATA_DIR`, then `<platform data dir>/lazy-genius`.
pub fn resolve_data_dir(flag: Option<PathBuf>) -> Result<PathBuf> {
    if let Some(dir) = flag {
        return Ok(dir);
    }
    if let Some(dir) = env::var_os(DATA_DIR_ENV_VAR).filter(|v| !v.is_empty()) {
        return Ok(PathBuf::from(dir));
    }
    dirs::data_dir()
        .map(|dir| dir.join("lazy-genius"))
        .ok_or_else(|| anyhow!("Could not determine a data directory; pass --data-dir"))
}

pub async fn run_cli() -> Result<()> {
    let args = Args::parse();
    let command = args.command.unwrap_or(Commands::Track);
    let data_dir = resolve_data_dir(args.data_dir)?;

    // The tracker owns the terminal, so its logs go to a file.
    let log_file = matches!(command, Commands::Track).then(|| log_path_in(&data_dir));
    init_logging(args.verbose, log_file.as_deref())?;
    debug!("Using data directory {}", data_dir.display());

    let ctx = AppContext::open(data_dir)?;
    match command {
        Commands::Track => track::run_tracker(&ctx).await,
        Commands::Today { json } => report::show_today(&ctx, json).await,
        Commands::Report { from, to, json } => report::show_report(&ctx, from, to, json).await,
        Commands::Home { json } => report::show_home(&ctx, json).await,
        Commands::Questions { command } => bank::process_questions_command(&ctx, command).await,
        Commands::Tasks { command } => planner::process_tasks_command(&ctx, command).await,
        Commands::Profile { command } => planner::process_profile_command(&ctx, command).await,
        Commands::Settings { command } => planner::process_settings_command(&ctx, command),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::tempdir;

    #[test]
    fn no_subcommand_means_track() {
        let args = Args::try_parse_from(["lazy-genius"]).unwrap();
        assert_eq!(args.command, None);
        assert!(!args.verbose);
    }

    #[test]
    fn report_dates_are_parsed() {
        let args =
            Args::try_parse_from(["lazy-genius", "report", "--from", "2024-01-01", "--to", "2024-01-07"])
                .unwrap();
        assert_eq!(
            args.command,
            Some(Commands::Report {
                from: NaiveDate::from_ymd_opt(2024, 1, 1),
                to: NaiveDate::from_ymd_opt(2024, 1, 7),
                json: false,
            })
        );
        assert!(Args::try_parse_from(["lazy-genius", "report", "--from", "01/01/2024"]).is_err());
    }

    #[test]
    fn json_flag_on_read_only_views() {
        let args = Args::try_parse_from(["lazy-genius", "home", "--json"]).unwrap();
        assert_eq!(args.command, Some(Commands::Home { json: true }));
        let args = Args::try_parse_from(["lazy-genius", "today"]).unwrap();
        assert_eq!(args.command, Some(Commands::Today { json: false }));
    }

    #[test]
    fn global_flags_work_after_subcommand() {
        let args = Args::try_parse_from(["lazy-genius", "today", "--data-dir", "/tmp/lg", "-v"]).unwrap();
        assert_eq!(args.data_dir, Some(PathBuf::from("/tmp/lg")));
        assert!(args.verbose);
    }

    #[test]
    fn explicit_data_dir_wins() {
        let dir = resolve_data_dir(Some(PathBuf::from("/tmp/explicit"))).unwrap();
        assert_eq!(dir, PathBuf::from("/tmp/explicit"));
    }

    #[test]
    fn context_creates_store_files() -> Result<()> {
        let dir = tempdir()?;
        let data_dir = dir.path().join("nested").join("data");
        let ctx = AppContext::open(data_dir.clone())?;

        assert!(data_dir.join(DB_FILE_NAME).exists());
        assert_eq!(ctx.db.path(), data_dir.join(DB_FILE_NAME));
        assert_eq!(ctx.log_path(), data_dir.join(LOG_FILE_NAME));
        assert_eq!(ctx.settings.get().daily_goal_minutes, 60);
        Ok(())
    }
}
