//! Logger setup plus conditional logging macros that check a module-level
//! `ENABLE_LOGS` flag.
//!
//! Usage:
//! ```rust,ignore
//! const ENABLE_LOGS: bool = true;
//!
//! use crate::{log_info, log_warn, log_error};
//!
//! log_info!("This will log if ENABLE_LOGS is true");
//! ```

use std::{fs::OpenOptions, path::Path};

use anyhow::{Context, Result};
use env_logger::{Builder, Target};
use log::LevelFilter;

pub const LOG_ENV_VAR: &str = "LAZY_GENIUS_LOG";

/// Installs the global logger. `LAZY_GENIUS_LOG` wins over `RUST_LOG`;
/// `verbose` forces debug. With `log_file` set, output is appended there
/// instead of stderr so a full-screen terminal UI stays clean.
pub fn init_logging(verbose: bool, log_file: Option<&Path>) -> Result<()> {
    let filters = std::env::var(LOG_ENV_VAR)
        .or_else(|_| std::env::var("RUST_LOG"))
        .unwrap_or_else(|_| "info".to_string());
    let mut builder = Builder::new();
    builder.parse_filters(&filters);
    if verbose {
        builder.filter_level(LevelFilter::Debug);
    }

    if let Some(path) = log_file {
        if let Some(parent) = path.parent() {
            std::fs::create_dir_all(parent)
                .with_context(|| format!("Failed to create {}", parent.display()))?;
        }
        let file = OpenOptions::new()
            .create(true)
            .append(true)
            .open(path)
            .with_context(|| format!("Failed to open log file {}", path.display()))?;
        builder.target(Target::Pipe(Box::new(file)));
    }

    // A second call (tests, repeated commands) keeps the first logger.
    let _ = builder.try_init();
    Ok(())
}

/// Conditional info logging.
/// Each module that uses this macro must define `const ENABLE_LOGS: bool`.
#[macro_export]
macro_rules! log_info {
    ($($arg:tt)*) => {
        if ENABLE_LOGS {
            log::info!($($arg)*);
        }
    };
}

/// Conditional warn logging.
#[macro_export]
macro_rules! log_warn {
    ($($arg:tt)*) => {
        if ENABLE_LOGS {
            log::warn!($($arg)*);
        }
    };
}

/// Conditional error logging.
#[macro_export]
macro_rules! log_error {
    ($($arg:tt)*) => {
        if ENABLE_LOGS {
            log::error!($($arg)*);
        }
    };
}
