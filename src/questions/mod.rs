//! Question generation seam and quiz helpers on top of the question bank.

use anyhow::{Context, Result};
use rand::seq::SliceRandom;
use rand::Rng;
use serde::{Deserialize, Serialize};

use crate::{
    db::{Database, Question, QuestionType},
    error::ValidationError,
    log_info,
};

const ENABLE_LOGS: bool = true;

pub const MAX_QUESTIONS_PER_KIND: u32 = 30;
const CHOICE_LETTERS: [char; 4] = ['A', 'B', 'C', 'D'];

/// Inputs for one generation run. Only constructible through [`GenerationRequest::new`].
#[derive(Debug, Clone, PartialEq)]
pub struct GenerationRequest {
    topic: String,
    notes: String,
    mcq_count: u32,
    short_answer_count: u32,
}

impl GenerationRequest {
    pub fn new(
        topic: &str,
        notes: &str,
        mcq_count: u32,
        short_answer_count: u32,
    ) -> Result<Self, ValidationError> {
        let notes = notes.trim();
        if notes.is_empty() {
            return Err(ValidationError::EmptyNotes);
        }
        for (field, value) in [
            ("MCQ count", mcq_count),
            ("short answer count", short_answer_count),
        ] {
            if value > MAX_QUESTIONS_PER_KIND {
                return Err(ValidationError::OutOfRange {
                    field,
                    min: 0,
                    max: MAX_QUESTIONS_PER_KIND,
                    value,
                });
            }
        }

        Ok(Self {
            topic: topic.trim().to_string(),
            notes: notes.to_string(),
            mcq_count,
            short_answer_count,
        })
    }

    pub fn topic(&self) -> &str {
        &self.topic
    }

    pub fn notes(&self) -> &str {
        &self.notes
    }

    pub fn mcq_count(&self) -> u32 {
        self.mcq_count
    }

    pub fn short_answer_count(&self) -> u32 {
        self.short_answer_count
    }
}

/// One entry of a question pack.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct GeneratedQuestion {
    #[serde(default)]
    pub q_type: QuestionType,
    pub question: String,
    pub answer: String,
    #[serde(default)]
    pub choices: Vec<String>,
    #[serde(default)]
    pub correct_choice_index: usize,
}

fn choice_label(idx: usize) -> String {
    CHOICE_LETTERS
        .get(idx)
        .map(char::to_string)
        .unwrap_or_else(|| (idx + 1).to_string())
}

impl GeneratedQuestion {
    /// Question text as stored in the bank, with lettered choices appended.
    pub fn prompt_text(&self) -> String {
        let mut text = self.question.clone();
        for (idx, choice) in self.choices.iter().enumerate() {
            text.push_str(&format!("\n{}) {choice}", choice_label(idx)));
        }
        text
    }

    /// Label and text of the right choice. `None` for questions without choices.
    pub fn correct_choice(&self) -> Option<(String, &str)> {
        let choice = self.choices.get(self.correct_choice_index)?;
        Some((choice_label(self.correct_choice_index), choice.as_str()))
    }

    /// Answer as stored in the bank. Choice questions lead with a
    /// `Correct: X) ...` line unless the generator already wrote one.
    pub fn answer_text(&self) -> String {
        match self.correct_choice() {
            Some((label, choice)) if !self.answer.trim_start().starts_with("Correct:") => {
                let explanation = self.answer.trim();
                if explanation.is_empty() {
                    format!("Correct: {label}) {choice}")
                } else {
                    format!("Correct: {label}) {choice}\n{explanation}")
                }
            }
            _ => self.answer.clone(),
        }
    }

    fn validate(&self) -> Result<(), ValidationError> {
        let choices = self.choices.len();
        if choices > 0 && self.correct_choice_index >= choices {
            return Err(ValidationError::ChoiceOutOfRange {
                index: self.correct_choice_index,
                choices,
            });
        }
        Ok(())
    }
}

#[derive(Debug, Deserialize)]
struct QuestionPack {
    questions: Vec<GeneratedQuestion>,
}

/// Parses `{"questions": [...]}` as produced by a generator. Every
/// correct choice index must point at one of its choices.
pub fn parse_question_pack(json: &str) -> Result<Vec<GeneratedQuestion>> {
    let pack: QuestionPack =
        serde_json::from_str(json).context("question pack is not valid JSON")?;
    for question in &pack.questions {
        question.validate()?;
    }
    Ok(pack.questions)
}

/// Anything that can turn notes into questions. The crate ships no network
/// client; packs come from `parse_question_pack` or a caller-provided impl.
pub trait QuestionGenerator {
    fn generate(&self, request: &GenerationRequest) -> Result<Vec<GeneratedQuestion>>;
}

/// Stores `questions` under the trimmed `topic`, in pack order.
pub async fn save_generated(
    db: &Database,
    topic: &str,
    questions: &[GeneratedQuestion],
) -> Result<Vec<Question>> {
    let mut saved = Vec::with_capacity(questions.len());
    for generated in questions {
        let question = db
            .add_question(topic, generated.q_type, &generated.prompt_text(), &generated.answer_text())
            .await?;
        saved.push(question);
    }
    log_info!("Saved {} questions under {:?}", saved.len(), topic.trim());
    Ok(saved)
}

/// Runs `generator` and stores its output. Nothing is written if generation fails.
pub async fn generate_and_save<G>(
    db: &Database,
    generator: &G,
    request: &GenerationRequest,
) -> Result<Vec<Question>>
where
    G: QuestionGenerator + ?Sized,
{
    let questions = generator
        .generate(request)
        .context("question generation failed")?;
    save_generated(db, request.topic(), &questions).await
}

/// A uniformly random question for quiz mode; `None` when the bank (or topic) is empty.
pub async fn random_question<R: Rng + ?Sized>(
    db: &Database,
    topic: Option<&str>,
    rng: &mut R,
) -> Result<Option<Question>> {
    let questions = db.questions(topic).await?;
    Ok(questions.choose(rng).cloned())
}
