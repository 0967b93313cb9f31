use chrono::{NaiveDate, NaiveDateTime};
use serde::{Deserialize, Serialize};

/// One entry of the per-day study checklist.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct DailyTask {
    pub id: i64,
    pub task_date: NaiveDate,
    pub text: String,
    pub done: bool,
    pub created_at: NaiveDateTime,
}
