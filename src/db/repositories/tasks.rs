use anyhow::Result;
use chrono::{Local, NaiveDate};
use rusqlite::{params, Row};

use crate::{
    db::{
        connection::Database,
        helpers::{format_date, format_timestamp, parse_date, parse_timestamp},
        models::DailyTask,
    },
    error::{NotFound, ValidationError},
};

fn row_to_task(row: &Row) -> Result<DailyTask> {
    let task_date: String = row.get("task_date")?;
    let created_at: String = row.get("created_at")?;
    let is_done: i64 = row.get("is_done")?;

    Ok(DailyTask {
        id: row.get("id")?,
        task_date: parse_date(&task_date, "task_date")?,
        text: row.get("task_text")?,
        done: is_done != 0,
        created_at: parse_timestamp(&created_at, "created_at")?,
    })
}

impl Database {
    pub async fn add_task(&self, task_date: NaiveDate, text: &str) -> Result<DailyTask> {
        let text = text.trim().to_string();
        if text.is_empty() {
            return Err(ValidationError::EmptyTask.into());
        }

        self.execute("add task", move |conn| {
            let created_at = Local::now().naive_local();
            conn.execute(
                "INSERT INTO daily_tasks (task_date, task_text, is_done, created_at)
                 VALUES (?1, ?2, 0, ?3)",
                params![format_date(&task_date), text, format_timestamp(&created_at)],
            )?;
            let id = conn.last_insert_rowid();

            let task = conn.query_row(
                "SELECT id, task_date, task_text, is_done, created_at
                 FROM daily_tasks WHERE id = ?1",
                params![id],
                |row| Ok(row_to_task(row)),
            )??;
            Ok(task)
        })
        .await
    }

    /// Tasks planned for `task_date`, most recently added first.
    pub async fn tasks_for(&self, task_date: NaiveDate) -> Result<Vec<DailyTask>> {
        let task_date = format_date(&task_date);
        self.execute("load tasks", move |conn| {
            let mut stmt = conn.prepare(
                "SELECT id, task_date, task_text, is_done, created_at
                 FROM daily_tasks
                 WHERE task_date = ?1
                 ORDER BY id DESC",
            )?;

            let mut rows = stmt.query(params![task_date])?;
            let mut tasks = Vec::new();
            while let Some(row) = rows.next()? {
                tasks.push(row_to_task(row)?);
            }
            Ok(tasks)
        })
        .await
    }

    pub async fn set_task_done(&self, id: i64, done: bool) -> Result<()> {
        let rows_affected = self
            .execute("update task", move |conn| {
                Ok(conn.execute(
                    "UPDATE daily_tasks SET is_done = ?1 WHERE id = ?2",
                    params![i64::from(done), id],
                )?)
            })
            .await?;
        if rows_affected == 0 {
            return Err(NotFound { kind: "Task", id }.into());
        }
        Ok(())
    }

    pub async fn delete_task(&self, id: i64) -> Result<()> {
        self.execute("delete task", move |conn| {
            conn.execute("DELETE FROM daily_tasks WHERE id = ?1", params![id])?;
            Ok(())
        })
        .await
    }

    /// Removes the finished tasks of `task_date`; returns how many went.
    pub async fn clear_completed_tasks(&self, task_date: NaiveDate) -> Result<usize> {
        let task_date = format_date(&task_date);
        self.execute("clear completed tasks", move |conn| {
            Ok(conn.execute(
                "DELETE FROM daily_tasks WHERE task_date = ?1 AND is_done = 1",
                params![task_date],
            )?)
        })
        .await
    }
}
