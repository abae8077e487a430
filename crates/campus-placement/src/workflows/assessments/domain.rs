use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::workflows::error::PlacementError;
use crate::workflows::ids::{QuestionId, QuestionSetId, StudentId, TestSessionId, TpoId};

const DEFAULT_TIME_LIMIT_MINUTES: u32 = 60;
const MAX_QUESTION_MARKS: u32 = 100;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum Choice {
    A,
    B,
    C,
    D,
}

impl Choice {
    pub fn parse(value: &str) -> Option<Self> {
        match value.trim() {
            "A" | "a" => Some(Choice::A),
            "B" | "b" => Some(Choice::B),
            "C" | "c" => Some(Choice::C),
            "D" | "d" => Some(Choice::D),
            _ => None,
        }
    }
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Difficulty {
    Easy,
    #[default]
    Medium,
    Hard,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AnswerOptions {
    #[serde(rename = "A")]
    pub a: String,
    #[serde(rename = "B")]
    pub b: String,
    #[serde(rename = "C")]
    pub c: String,
    #[serde(rename = "D")]
    pub d: String,
}

impl AnswerOptions {
    fn is_complete(&self) -> bool {
        [&self.a, &self.b, &self.c, &self.d]
            .iter()
            .all(|option| !option.trim().is_empty())
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct QuestionSet {
    pub id: QuestionSetId,
    pub title: String,
    pub description: String,
    pub maximum_marks: u32,
    pub marks_per_question: u32,
    pub total_questions: u32,
    pub time_limit_minutes: u32,
    pub is_active: bool,
    pub created_by: TpoId,
    pub questions: Vec<QuestionId>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

#[derive(Debug, Clone, Default, Deserialize)]
pub struct QuestionSetDraft {
    pub title: Option<String>,
    pub description: Option<String>,
    pub maximum_marks: Option<u32>,
    pub marks_per_question: Option<u32>,
    pub total_questions: Option<u32>,
    #[serde(alias = "time_limit")]
    pub time_limit_minutes: Option<u32>,
}

fn required_text(value: Option<String>, field: &str) -> Result<String, PlacementError> {
    value
        .map(|raw| raw.trim().to_string())
        .filter(|trimmed| !trimmed.is_empty())
        .ok_or_else(|| PlacementError::validation(format!("{field} is required")))
}

fn positive(value: Option<u32>, field: &str) -> Result<u32, PlacementError> {
    value
        .filter(|value| *value >= 1)
        .ok_or_else(|| PlacementError::validation(format!("{field} must be at least 1")))
}

fn question_marks(marks: Option<u32>) -> Result<u32, PlacementError> {
    match marks {
        None => Ok(1),
        Some(marks) if (1..=MAX_QUESTION_MARKS).contains(&marks) => Ok(marks),
        Some(_) => Err(PlacementError::validation(format!(
            "marks must be between 1 and {MAX_QUESTION_MARKS}"
        ))),
    }
}

impl QuestionSet {
    pub fn from_draft(
        creator: TpoId,
        draft: QuestionSetDraft,
        now: DateTime<Utc>,
    ) -> Result<Self, PlacementError> {
        Ok(Self {
            id: QuestionSetId::generate(),
            title: required_text(draft.title, "title")?,
            description: required_text(draft.description, "description")?,
            maximum_marks: positive(draft.maximum_marks, "maximum_marks")?,
            marks_per_question: positive(draft.marks_per_question, "marks_per_question")?,
            total_questions: positive(draft.total_questions, "total_questions")?,
            time_limit_minutes: draft
                .time_limit_minutes
                .filter(|minutes| *minutes > 0)
                .unwrap_or(DEFAULT_TIME_LIMIT_MINUTES),
            is_active: true,
            created_by: creator,
            questions: Vec::new(),
            created_at: now,
            updated_at: now,
        })
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Question {
    pub id: QuestionId,
    pub question_text: String,
    pub options: AnswerOptions,
    pub correct_answer: Choice,
    pub marks: u32,
    pub explanation: Option<String>,
    pub difficulty: Difficulty,
    pub category: Option<String>,
    pub created_by: TpoId,
    pub question_set: Option<QuestionSetId>,
    pub created_at: DateTime<Utc>,
}

#[derive(Debug, Clone, Default, Deserialize)]
pub struct QuestionDraft {
    pub question_text: Option<String>,
    pub options: Option<AnswerOptions>,
    pub correct_answer: Option<String>,
    pub marks: Option<u32>,
    pub explanation: Option<String>,
    pub difficulty: Option<Difficulty>,
    pub category: Option<String>,
    pub question_set_id: Option<QuestionSetId>,
}

impl Question {
    pub fn from_draft(
        creator: TpoId,
        draft: QuestionDraft,
        now: DateTime<Utc>,
    ) -> Result<Self, PlacementError> {
        let options = draft
            .options
            .filter(AnswerOptions::is_complete)
            .ok_or_else(|| PlacementError::validation("options A to D are required"))?;
        let correct_answer = draft
            .correct_answer
            .as_deref()
            .and_then(Choice::parse)
            .ok_or_else(|| PlacementError::validation("correct_answer must be one of A, B, C, D"))?;
        Ok(Self {
            id: QuestionId::generate(),
            question_text: required_text(draft.question_text, "question_text")?,
            options,
            correct_answer,
            marks: question_marks(draft.marks)?,
            explanation: draft.explanation.filter(|text| !text.trim().is_empty()),
            difficulty: draft.difficulty.unwrap_or_default(),
            category: draft.category.filter(|text| !text.trim().is_empty()),
            created_by: creator,
            question_set: draft.question_set_id,
            created_at: now,
        })
    }

    pub fn category_label(&self) -> &str {
        self.category.as_deref().unwrap_or("General")
    }
}

/// Question as shown to a test taker: no correct answer, no explanation.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct QuestionView {
    pub id: QuestionId,
    pub question_text: String,
    pub options: AnswerOptions,
    pub marks: u32,
    pub difficulty: Difficulty,
    pub category: Option<String>,
}

impl From<&Question> for QuestionView {
    fn from(question: &Question) -> Self {
        Self {
            id: question.id.clone(),
            question_text: question.question_text.clone(),
            options: question.options.clone(),
            marks: question.marks,
            difficulty: question.difficulty,
            category: question.category.clone(),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AnswerRecord {
    pub question: QuestionId,
    pub selected_answer: Option<Choice>,
    pub is_correct: bool,
    pub marks_obtained: u32,
    /// Seconds since the session started when the answer was given.
    pub time_taken_secs: Option<i64>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct AnswerOutcome {
    pub is_correct: bool,
    pub marks_obtained: u32,
    pub correct_answer: Choice,
}

/// One student's attempt at a question set.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TestSession {
    pub id: TestSessionId,
    pub student: StudentId,
    pub question_set: QuestionSetId,
    pub answers: Vec<AnswerRecord>,
    pub total_marks_obtained: u32,
    pub total_marks_possible: u32,
    pub percentage: f64,
    pub start_time: DateTime<Utc>,
    pub end_time: Option<DateTime<Utc>>,
    pub duration_minutes: Option<f64>,
    pub is_completed: bool,
}

impl TestSession {
    pub fn start(student: StudentId, set: &QuestionSet, now: DateTime<Utc>) -> Self {
        Self {
            id: TestSessionId::generate(),
            student,
            question_set: set.id.clone(),
            answers: set
                .questions
                .iter()
                .map(|question| AnswerRecord {
                    question: question.clone(),
                    selected_answer: None,
                    is_correct: false,
                    marks_obtained: 0,
                    time_taken_secs: None,
                })
                .collect(),
            total_marks_obtained: 0,
            total_marks_possible: set.maximum_marks,
            percentage: 0.0,
            start_time: now,
            end_time: None,
            duration_minutes: None,
            is_completed: false,
        }
    }

    fn recompute(&mut self) {
        self.total_marks_obtained = self
            .answers
            .iter()
            .fold(0u32, |total, answer| total.saturating_add(answer.marks_obtained));
        self.percentage = if self.total_marks_possible == 0 {
            0.0
        } else {
            f64::from(self.total_marks_obtained) / f64::from(self.total_marks_possible) * 100.0
        };
    }

    /// Record (or overwrite) the answer to one question of this session.
    pub fn answer(
        &mut self,
        question: &Question,
        choice: Choice,
        now: DateTime<Utc>,
    ) -> Result<AnswerOutcome, PlacementError> {
        if self.is_completed {
            return Err(PlacementError::NotFound("test session"));
        }
        let elapsed = (now - self.start_time).num_seconds();
        let slot = self
            .answers
            .iter_mut()
            .find(|answer| answer.question == question.id)
            .ok_or(PlacementError::NotFound("question"))?;

        let is_correct = choice == question.correct_answer;
        let marks_obtained = if is_correct { question.marks } else { 0 };
        *slot = AnswerRecord {
            question: question.id.clone(),
            selected_answer: Some(choice),
            is_correct,
            marks_obtained,
            time_taken_secs: Some(elapsed),
        };
        self.recompute();

        Ok(AnswerOutcome {
            is_correct,
            marks_obtained,
            correct_answer: question.correct_answer,
        })
    }

    pub fn submit(&mut self, now: DateTime<Utc>) -> Result<(), PlacementError> {
        if self.is_completed {
            return Err(PlacementError::NotFound("test session"));
        }
        self.recompute();
        self.end_time = Some(now);
        self.duration_minutes = Some((now - self.start_time).num_milliseconds() as f64 / 60_000.0);
        self.is_completed = true;
        Ok(())
    }
}
