//! SQLite persistence: one long-lived connection on a worker thread, with
//! the table-specific operations split into repository `impl` blocks.

pub mod connection;
pub mod helpers;
mod migrations;
pub mod models;
mod repositories;

pub use connection::Database;
pub use models::{DailyTask, DateRange, NewSession, Profile, ProfileInput, Question, QuestionType, Session};
