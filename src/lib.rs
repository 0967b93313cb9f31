//! Study tracker library: a pause-aware session timer, a SQLite session
//! store with range analytics, and a small question bank. The binary wraps
//! it in a command line and a live terminal tracker.

pub mod analytics;
mod cli;
pub mod db;
pub mod error;
pub mod questions;
pub mod settings;
pub mod timer;
pub mod utils;

pub async fn run() -> anyhow::Result<()> {
    cli::run_cli().await
}
