use std::collections::{BTreeMap, HashMap};

use chrono::{DateTime, Utc};
use serde::Serialize;

use crate::workflows::ids::{QuestionId, QuestionSetId, TestSessionId};

use super::domain::{Choice, Difficulty, Question, QuestionSet, TestSession};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum ScoreTier {
    Excellent,
    Good,
    NeedsImprovement,
}

impl ScoreTier {
    pub fn for_percentage(percentage: f64) -> Self {
        if percentage >= 80.0 {
            ScoreTier::Excellent
        } else if percentage >= 60.0 {
            ScoreTier::Good
        } else {
            ScoreTier::NeedsImprovement
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct CategoryPerformance {
    pub section: String,
    pub correct: usize,
    pub incorrect: usize,
    pub total: usize,
    pub score: u32,
    pub total_marks: u32,
    pub score_percentage: u32,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct QuestionAnalysis {
    pub question_id: QuestionId,
    pub question_text: String,
    pub selected_answer: Option<Choice>,
    pub correct_answer: Choice,
    pub is_correct: bool,
    pub marks_obtained: u32,
    pub total_marks: u32,
    pub category: String,
    pub difficulty: Difficulty,
    pub explanation: Option<String>,
    pub time_taken_secs: Option<i64>,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct TestStatistics {
    pub total_questions: usize,
    pub correct_answers: usize,
    pub wrong_answers: usize,
    pub total_score: u32,
    pub total_possible: u32,
    /// Rounded to one decimal place.
    pub percentage: f64,
    pub tier: ScoreTier,
    pub duration_minutes: Option<f64>,
    pub average_time_per_question: Option<f64>,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct TestDetails {
    pub session_id: TestSessionId,
    pub question_set_id: QuestionSetId,
    pub title: String,
    pub description: String,
    pub maximum_marks: u32,
    pub start_time: DateTime<Utc>,
    pub end_time: Option<DateTime<Utc>>,
}

/// Full result sheet for a submitted session.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct TestReport {
    pub statistics: TestStatistics,
    pub subject_wise_performance: Vec<CategoryPerformance>,
    pub question_analysis: Vec<QuestionAnalysis>,
    pub test_details: TestDetails,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ResultSummary {
    pub session_id: TestSessionId,
    pub question_set_id: QuestionSetId,
    pub title: Option<String>,
    pub total_marks_obtained: u32,
    pub total_marks_possible: u32,
    pub percentage: f64,
    pub end_time: Option<DateTime<Utc>>,
    pub duration_minutes: Option<f64>,
}

fn one_decimal(value: f64) -> f64 {
    (value * 10.0).round() / 10.0
}

/// Build the report. Answers whose question has since disappeared are skipped.
pub fn build_report(
    session: &TestSession,
    set: &QuestionSet,
    questions: &HashMap<QuestionId, Question>,
) -> TestReport {
    let mut categories: BTreeMap<String, CategoryPerformance> = BTreeMap::new();
    let mut analysis = Vec::with_capacity(session.answers.len());

    for answer in &session.answers {
        let Some(question) = questions.get(&answer.question) else {
            continue;
        };
        let section = question.category_label().to_string();
        let entry = categories
            .entry(section.clone())
            .or_insert_with(|| CategoryPerformance {
                section: section.clone(),
                correct: 0,
                incorrect: 0,
                total: 0,
                score: 0,
                total_marks: 0,
                score_percentage: 0,
            });
        entry.total += 1;
        entry.total_marks = entry.total_marks.saturating_add(question.marks);
        if answer.is_correct {
            entry.correct += 1;
            entry.score = entry.score.saturating_add(answer.marks_obtained);
        } else {
            entry.incorrect += 1;
        }

        analysis.push(QuestionAnalysis {
            question_id: question.id.clone(),
            question_text: question.question_text.clone(),
            selected_answer: answer.selected_answer,
            correct_answer: question.correct_answer,
            is_correct: answer.is_correct,
            marks_obtained: answer.marks_obtained,
            total_marks: question.marks,
            category: section,
            difficulty: question.difficulty,
            explanation: question.explanation.clone(),
            time_taken_secs: answer.time_taken_secs,
        });
    }

    let subject_wise_performance = categories
        .into_values()
        .map(|mut category| {
            category.score_percentage = if category.total_marks == 0 {
                0
            } else {
                (f64::from(category.score) / f64::from(category.total_marks) * 100.0).round() as u32
            };
            category
        })
        .collect();

    let total_questions = session.answers.len();
    let correct_answers = session.answers.iter().filter(|answer| answer.is_correct).count();
    let average_time_per_question = session
        .duration_minutes
        .filter(|_| total_questions > 0)
        .map(|minutes| minutes / total_questions as f64);

    TestReport {
        statistics: TestStatistics {
            total_questions,
            correct_answers,
            wrong_answers: total_questions - correct_answers,
            total_score: session.total_marks_obtained,
            total_possible: session.total_marks_possible,
            percentage: one_decimal(session.percentage),
            tier: ScoreTier::for_percentage(session.percentage),
            duration_minutes: session.duration_minutes,
            average_time_per_question,
        },
        subject_wise_performance,
        question_analysis: analysis,
        test_details: TestDetails {
            session_id: session.id.clone(),
            question_set_id: set.id.clone(),
            title: set.title.clone(),
            description: set.description.clone(),
            maximum_marks: set.maximum_marks,
            start_time: session.start_time,
            end_time: session.end_time,
        },
    }
}
