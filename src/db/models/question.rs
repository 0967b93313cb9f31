use chrono::NaiveDateTime;
use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
pub enum QuestionType {
    #[serde(rename = "MCQ")]
    Mcq,
    #[serde(rename = "Short Answer")]
    ShortAnswer,
}

impl Default for QuestionType {
    fn default() -> Self {
        QuestionType::ShortAnswer
    }
}

impl QuestionType {
    pub fn as_str(&self) -> &'static str {
        match self {
            QuestionType::Mcq => "MCQ",
            QuestionType::ShortAnswer => "Short Answer",
        }
    }

    /// Unknown labels fall back to short answer, matching how generated
    /// questions without a type are stored.
    pub fn from_label(value: &str) -> Self {
        match value.trim() {
            "MCQ" | "mcq" => QuestionType::Mcq,
            _ => QuestionType::ShortAnswer,
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct Question {
    pub id: i64,
    pub topic: String,
    pub q_type: QuestionType,
    pub question: String,
    pub answer: String,
    pub created_at: NaiveDateTime,
    pub correct_count: u32,
    pub wrong_count: u32,
}

impl Question {
    pub fn attempts(&self) -> u32 {
        self.correct_count + self.wrong_count
    }
}
