use anyhow::Result;
use chrono::Local;
use rusqlite::{params, Row};

use crate::{
    db::{
        connection::Database,
        helpers::{format_timestamp, parse_timestamp, to_u32},
        models::{Question, QuestionType},
    },
    error::NotFound,
};

const QUESTION_COLUMNS: &str =
    "id, topic, q_type, question, answer, created_at, correct_count, wrong_count";

fn row_to_question(row: &Row) -> Result<Question> {
    let q_type: String = row.get("q_type")?;
    let created_at: String = row.get("created_at")?;
    let correct_count: i64 = row.get("correct_count")?;
    let wrong_count: i64 = row.get("wrong_count")?;

    Ok(Question {
        id: row.get("id")?,
        topic: row.get("topic")?,
        q_type: QuestionType::from_label(&q_type),
        question: row.get("question")?,
        answer: row.get("answer")?,
        created_at: parse_timestamp(&created_at, "created_at")?,
        correct_count: to_u32(correct_count, "correct_count")?,
        wrong_count: to_u32(wrong_count, "wrong_count")?,
    })
}

/// `None` or a blank topic means "every topic".
fn topic_filter(topic: Option<&str>) -> Option<String> {
    topic
        .map(str::trim)
        .filter(|t| !t.is_empty())
        .map(str::to_string)
}

impl Database {
    pub async fn add_question(
        &self,
        topic: &str,
        q_type: QuestionType,
        question: &str,
        answer: &str,
    ) -> Result<Question> {
        let topic = topic.trim().to_string();
        let question = question.to_string();
        let answer = answer.to_string();
        self.execute("add question", move |conn| {
            let created_at = format_timestamp(&Local::now().naive_local());
            conn.execute(
                "INSERT INTO questions (topic, q_type, question, answer, created_at)
                 VALUES (?1, ?2, ?3, ?4, ?5)",
                params![topic, q_type.as_str(), question, answer, created_at],
            )?;
            let id = conn.last_insert_rowid();

            let question = conn.query_row(
                &format!("SELECT {QUESTION_COLUMNS} FROM questions WHERE id = ?1"),
                params![id],
                |row| Ok(row_to_question(row)),
            )??;
            Ok(question)
        })
        .await
    }

    /// Questions for `topic` (all topics when blank), newest first.
    pub async fn questions(&self, topic: Option<&str>) -> Result<Vec<Question>> {
        let topic = topic_filter(topic);
        self.execute("load questions", move |conn| {
            let mut questions = Vec::new();
            match topic {
                Some(topic) => {
                    let mut stmt = conn.prepare(&format!(
                        "SELECT {QUESTION_COLUMNS} FROM questions
                         WHERE topic = ?1
                         ORDER BY created_at DESC, id DESC"
                    ))?;
                    let mut rows = stmt.query(params![topic])?;
                    while let Some(row) = rows.next()? {
                        questions.push(row_to_question(row)?);
                    }
                }
                None => {
                    let mut stmt = conn.prepare(&format!(
                        "SELECT {QUESTION_COLUMNS} FROM questions
                         ORDER BY created_at DESC, id DESC"
                    ))?;
                    let mut rows = stmt.query([])?;
                    while let Some(row) = rows.next()? {
                        questions.push(row_to_question(row)?);
                    }
                }
            }
            Ok(questions)
        })
        .await
    }

    pub async fn question_count(&self) -> Result<u64> {
        self.execute("count questions", |conn| {
            let count: i64 = conn.query_row("SELECT COUNT(*) FROM questions", [], |row| row.get(0))?;
            Ok(count.max(0) as u64)
        })
        .await
    }

    /// Records one quiz attempt against question `id`.
    pub async fn mark_answer(&self, id: i64, is_correct: bool) -> Result<()> {
        let rows_affected = self
            .execute("mark answer", move |conn| {
                let sql = if is_correct {
                    "UPDATE questions SET correct_count = correct_count + 1 WHERE id = ?1"
                } else {
                    "UPDATE questions SET wrong_count = wrong_count + 1 WHERE id = ?1"
                };
                Ok(conn.execute(sql, params![id])?)
            })
            .await?;
        if rows_affected == 0 {
            return Err(NotFound { kind: "Question", id }.into());
        }
        Ok(())
    }

    /// Returns the number of deleted questions.
    pub async fn delete_all_questions(&self) -> Result<usize> {
        self.execute("delete questions", |conn| {
            Ok(conn.execute("DELETE FROM questions", [])?)
        })
        .await
    }
}
