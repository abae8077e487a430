use std::cmp::Ordering;
use std::collections::BTreeSet;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::workflows::error::PlacementError;
use crate::workflows::ids::{QuestionSetId, StudentId};

const RISING_STAR_WINDOW: usize = 3;

/// One completed quiz as fed into the ranking aggregate.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct QuizScore {
    pub quiz: QuestionSetId,
    pub score: f64,
    pub percentage: f64,
    pub completed_at: DateTime<Utc>,
}

impl QuizScore {
    pub fn new(
        quiz: QuestionSetId,
        score: f64,
        percentage: f64,
        completed_at: DateTime<Utc>,
    ) -> Result<Self, PlacementError> {
        if !score.is_finite() || score < 0.0 {
            return Err(PlacementError::validation("score must be a non-negative number"));
        }
        if !percentage.is_finite() || !(0.0..=100.0).contains(&percentage) {
            return Err(PlacementError::validation(
                "percentage must be between 0 and 100",
            ));
        }
        Ok(Self {
            quiz,
            score,
            percentage,
            completed_at,
        })
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub enum Badge {
    #[serde(rename = "Perfect Score")]
    PerfectScore,
    #[serde(rename = "Top Scorer")]
    TopScorer,
    #[serde(rename = "First Place")]
    FirstPlace,
    #[serde(rename = "Top 10")]
    Top10,
    #[serde(rename = "Top 25")]
    Top25,
    #[serde(rename = "Consistent Performer")]
    ConsistentPerformer,
    #[serde(rename = "Quiz Master")]
    QuizMaster,
    #[serde(rename = "Knowledge Seeker")]
    KnowledgeSeeker,
    #[serde(rename = "Rising Star")]
    RisingStar,
}

impl Badge {
    pub const fn label(self) -> &'static str {
        match self {
            Badge::PerfectScore => "Perfect Score",
            Badge::TopScorer => "Top Scorer",
            Badge::FirstPlace => "First Place",
            Badge::Top10 => "Top 10",
            Badge::Top25 => "Top 25",
            Badge::ConsistentPerformer => "Consistent Performer",
            Badge::QuizMaster => "Quiz Master",
            Badge::KnowledgeSeeker => "Knowledge Seeker",
            Badge::RisingStar => "Rising Star",
        }
    }
}

/// Per-student quiz aggregate. Every derived field is recomputed from `quiz_scores`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RankingRecord {
    pub student: StudentId,
    pub quiz_scores: Vec<QuizScore>,
    pub total_score: f64,
    pub total_quizzes_taken: u32,
    pub average_score: f64,
    pub highest_score: f64,
    pub badges: BTreeSet<Badge>,
    /// Position in the global ordering; zero until the first re-rank.
    pub rank: u32,
    pub updated_at: DateTime<Utc>,
}

impl RankingRecord {
    pub fn new(student: StudentId, now: DateTime<Utc>) -> Self {
        Self {
            student,
            quiz_scores: Vec::new(),
            total_score: 0.0,
            total_quizzes_taken: 0,
            average_score: 0.0,
            highest_score: 0.0,
            badges: BTreeSet::new(),
            rank: 0,
            updated_at: now,
        }
    }

    pub fn record(&mut self, score: QuizScore, now: DateTime<Utc>) {
        self.quiz_scores.push(score);
        self.recompute();
        self.updated_at = now;
    }

    fn recompute(&mut self) {
        self.total_score = self.quiz_scores.iter().map(|quiz| quiz.score).sum();
        self.total_quizzes_taken = self.quiz_scores.len() as u32;
        self.average_score = if self.total_quizzes_taken == 0 {
            0.0
        } else {
            self.total_score / f64::from(self.total_quizzes_taken)
        };
        self.highest_score = self
            .quiz_scores
            .iter()
            .map(|quiz| quiz.score)
            .fold(0.0, f64::max);
    }

    /// Scores ordered newest first.
    pub fn recent(&self, limit: usize) -> Vec<QuizScore> {
        let mut scores = self.quiz_scores.clone();
        scores.sort_by(|left, right| right.completed_at.cmp(&left.completed_at));
        scores.truncate(limit);
        scores
    }

    /// The latest percentages, newest first, never decrease going back in time.
    fn rising(&self) -> bool {
        if self.quiz_scores.len() < RISING_STAR_WINDOW {
            return false;
        }
        self.recent(RISING_STAR_WINDOW)
            .windows(2)
            .all(|pair| pair[1].percentage >= pair[0].percentage)
    }

    /// Badges the current aggregates and rank qualify for.
    pub fn qualifying_badges(&self) -> BTreeSet<Badge> {
        let mut earned = BTreeSet::new();
        if self.highest_score >= 100.0 {
            earned.insert(Badge::PerfectScore);
        }
        if self.rank == 1 {
            earned.insert(Badge::TopScorer);
            earned.insert(Badge::FirstPlace);
        }
        if (1..=10).contains(&self.rank) {
            earned.insert(Badge::Top10);
        }
        if (1..=25).contains(&self.rank) {
            earned.insert(Badge::Top25);
        }
        if self.total_quizzes_taken > 0 && self.average_score >= 80.0 {
            earned.insert(Badge::ConsistentPerformer);
        }
        if self.total_quizzes_taken >= 10 {
            earned.insert(Badge::QuizMaster);
        }
        if self.total_quizzes_taken >= 5 {
            earned.insert(Badge::KnowledgeSeeker);
        }
        if self.rising() {
            earned.insert(Badge::RisingStar);
        }
        earned
    }

    /// Merge newly qualifying badges and return those not held before. Badges are never removed.
    pub fn award_badges(&mut self) -> Vec<Badge> {
        let fresh: Vec<Badge> = self
            .qualifying_badges()
            .into_iter()
            .filter(|badge| !self.badges.contains(badge))
            .collect();
        self.badges.extend(fresh.iter().copied());
        fresh
    }
}

/// Global ordering: total score desc, average desc, then student id for a total order.
pub fn standing_order(left: &RankingRecord, right: &RankingRecord) -> Ordering {
    right
        .total_score
        .total_cmp(&left.total_score)
        .then_with(|| right.average_score.total_cmp(&left.average_score))
        .then_with(|| left.student.as_str().cmp(right.student.as_str()))
}
