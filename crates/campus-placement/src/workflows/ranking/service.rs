use std::collections::{BTreeSet, HashMap};
use std::sync::{Arc, Mutex, PoisonError};

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use tracing::{debug, info};

use crate::workflows::error::PlacementError;
use crate::workflows::identity::ProfileDirectory;
use crate::workflows::ids::{QuestionSetId, StudentId};

use super::domain::{standing_order, Badge, QuizScore, RankingRecord};
use super::leaderboard::{
    build_leaderboard, order_standings, performance_trend, score_distribution, BucketCount,
    Leaderboard, PerformanceTrend, Standing,
};
use super::repository::RankingRepository;

const RECENT_QUIZ_LIMIT: usize = 5;
const DEFAULT_TOP_LIMIT: usize = 10;
const MAX_TOP_LIMIT: usize = 100;

/// Quiz outcome reported by the assessment engine or by a TPO.
#[derive(Debug, Clone, Deserialize)]
pub struct QuizCompletion {
    pub student_id: StudentId,
    pub quiz_id: QuestionSetId,
    pub score: f64,
    pub percentage: f64,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ScoreUpdate {
    pub student_id: StudentId,
    pub total_score: f64,
    pub average_score: f64,
    pub rank: u32,
    pub badges: BTreeSet<Badge>,
    pub new_badges: Vec<Badge>,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct RankingSummary {
    pub name: String,
    pub total_score: f64,
    pub rank: u32,
    pub total_students: usize,
    pub badges: BTreeSet<Badge>,
    pub total_quizzes_taken: u32,
    pub average_score: f64,
    pub highest_score: f64,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct MyRanking {
    pub student: RankingSummary,
    pub recent_quizzes: Vec<QuizScore>,
    pub performance_trend: PerformanceTrend,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct TopPerformer {
    pub rank: u32,
    pub student_id: StudentId,
    pub student_name: String,
    pub score: f64,
    pub badges: BTreeSet<Badge>,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct RankingStats {
    pub total_students: usize,
    pub active_students: usize,
    /// Mean total score of students with at least one quiz, rounded.
    pub average_score: f64,
    pub score_distribution: Vec<BucketCount>,
}

/// Quiz aggregates, badges and the global ordering of students.
///
/// Writes go through a single writer lock so concurrent completions re-rank
/// one after another and the stored ranks always describe one consistent ordering.
pub struct RankingService {
    rankings: Arc<dyn RankingRepository>,
    profiles: Arc<dyn ProfileDirectory>,
    writer: Mutex<()>,
}

impl RankingService {
    pub fn new(rankings: Arc<dyn RankingRepository>, profiles: Arc<dyn ProfileDirectory>) -> Self {
        Self {
            rankings,
            profiles,
            writer: Mutex::new(()),
        }
    }

    pub fn record_quiz_completion(
        &self,
        completion: QuizCompletion,
        now: DateTime<Utc>,
    ) -> Result<ScoreUpdate, PlacementError> {
        let score = QuizScore::new(
            completion.quiz_id,
            completion.score,
            completion.percentage,
            now,
        )?;
        let student = completion.student_id;

        let _writer = self.writer.lock().unwrap_or_else(PoisonError::into_inner);
        if self.profiles.student(&student)?.is_none() {
            return Err(PlacementError::NotFound("student"));
        }

        let mut record = self
            .rankings
            .fetch(&student)?
            .unwrap_or_else(|| RankingRecord::new(student.clone(), now));
        record.record(score, now);
        self.rankings.upsert(record)?;

        let ranked = self.rerank(now)?;
        let mut record = ranked
            .into_iter()
            .find(|candidate| candidate.student == student)
            .ok_or(PlacementError::NotFound("ranking"))?;
        let new_badges = record.award_badges();
        self.rankings.upsert(record.clone())?;

        info!(
            student_id = %student,
            total_score = record.total_score,
            rank = record.rank,
            new_badges = new_badges.len(),
            "quiz completion recorded"
        );
        Ok(ScoreUpdate {
            student_id: record.student,
            total_score: record.total_score,
            average_score: record.average_score,
            rank: record.rank,
            badges: record.badges,
            new_badges,
        })
    }

    /// Assign `rank = position + 1` to every student and persist. Caller holds the writer lock.
    fn rerank(&self, now: DateTime<Utc>) -> Result<Vec<RankingRecord>, PlacementError> {
        let mut stored: HashMap<StudentId, RankingRecord> = self
            .rankings
            .list()?
            .into_iter()
            .map(|record| (record.student.clone(), record))
            .collect();
        let mut records: Vec<RankingRecord> = self
            .profiles
            .students()?
            .into_iter()
            .map(|student| {
                stored
                    .remove(&student.id)
                    .unwrap_or_else(|| RankingRecord::new(student.id, now))
            })
            .collect();
        records.sort_by(standing_order);

        for (index, record) in records.iter_mut().enumerate() {
            record.rank = index as u32 + 1;
            self.rankings.upsert(record.clone())?;
        }
        debug!(students = records.len(), "global re-rank finished");
        Ok(records)
    }

    fn standings(&self, now: DateTime<Utc>) -> Result<Vec<Standing>, PlacementError> {
        let mut stored: HashMap<StudentId, RankingRecord> = self
            .rankings
            .list()?
            .into_iter()
            .map(|record| (record.student.clone(), record))
            .collect();
        let mut standings: Vec<Standing> = self
            .profiles
            .students()?
            .into_iter()
            .map(|student| Standing {
                record: stored
                    .remove(&student.id)
                    .unwrap_or_else(|| RankingRecord::new(student.id.clone(), now)),
                name: student.name,
            })
            .collect();
        order_standings(&mut standings);
        Ok(standings)
    }

    pub fn leaderboard(
        &self,
        current: Option<&StudentId>,
        now: DateTime<Utc>,
    ) -> Result<Leaderboard, PlacementError> {
        Ok(build_leaderboard(self.standings(now)?, current))
    }

    pub fn my_ranking(
        &self,
        student: &StudentId,
        now: DateTime<Utc>,
    ) -> Result<MyRanking, PlacementError> {
        let standings = self.standings(now)?;
        let total_students = standings.len();
        let (position, standing) = standings
            .into_iter()
            .enumerate()
            .find(|(_, standing)| &standing.record.student == student)
            .ok_or(PlacementError::NotFound("student"))?;
        let record = standing.record;

        Ok(MyRanking {
            recent_quizzes: record.recent(RECENT_QUIZ_LIMIT),
            performance_trend: performance_trend(&record),
            student: RankingSummary {
                name: standing.name,
                total_score: record.total_score,
                rank: position as u32 + 1,
                total_students,
                badges: record.badges,
                total_quizzes_taken: record.total_quizzes_taken,
                average_score: record.average_score,
                highest_score: record.highest_score,
            },
        })
    }

    pub fn top_performers(
        &self,
        limit: Option<usize>,
        now: DateTime<Utc>,
    ) -> Result<Vec<TopPerformer>, PlacementError> {
        let limit = limit.unwrap_or(DEFAULT_TOP_LIMIT).clamp(1, MAX_TOP_LIMIT);
        Ok(self
            .standings(now)?
            .into_iter()
            .take(limit)
            .enumerate()
            .map(|(index, standing)| TopPerformer {
                rank: index as u32 + 1,
                student_id: standing.record.student,
                student_name: standing.name,
                score: standing.record.total_score,
                badges: standing.record.badges,
            })
            .collect())
    }

    pub fn stats(&self, now: DateTime<Utc>) -> Result<RankingStats, PlacementError> {
        let standings = self.standings(now)?;
        let records: Vec<&RankingRecord> =
            standings.iter().map(|standing| &standing.record).collect();
        let active: Vec<&RankingRecord> = records
            .iter()
            .copied()
            .filter(|record| record.total_quizzes_taken > 0)
            .collect();
        let average_score = if active.is_empty() {
            0.0
        } else {
            let sum: f64 = active.iter().map(|record| record.total_score).sum();
            (sum / active.len() as f64).round()
        };

        Ok(RankingStats {
            total_students: records.len(),
            active_students: active.len(),
            average_score,
            score_distribution: score_distribution(records.iter().copied()),
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::store::MemoryStore;
    use crate::workflows::identity::StudentProfile;
    use chrono::TimeZone;

    fn now() -> DateTime<Utc> {
        Utc.with_ymd_and_hms(2025, 3, 12, 9, 0, 0).single().expect("valid")
    }

    fn student(store: &MemoryStore, id: &str, name: &str) -> StudentId {
        let profile = StudentProfile {
            id: StudentId::from(id),
            name: name.to_string(),
            email: format!("{id}@campus.test"),
            roll_number: id.to_uppercase(),
            branch: "CSE".to_string(),
            graduation_year: 2026,
            phone: None,
            cgpa: None,
            skills: Vec::new(),
            created_at: now(),
        };
        store.insert_student(profile).expect("student").id
    }

    fn completion(student: &StudentId, score: f64, percentage: f64) -> QuizCompletion {
        QuizCompletion {
            student_id: student.clone(),
            quiz_id: QuestionSetId::from("qset-1"),
            score,
            percentage,
        }
    }

    #[test]
    fn every_student_is_reranked_on_each_completion() {
        let store = Arc::new(MemoryStore::default());
        let service = RankingService::new(store.clone(), store.clone());
        let asha = student(&store, "stu-a", "Asha");
        let bilal = student(&store, "stu-b", "Bilal");
        let idle = student(&store, "stu-c", "Chen");

        service
            .record_quiz_completion(completion(&asha, 40.0, 40.0), now())
            .expect("asha");
        let update = service
            .record_quiz_completion(completion(&bilal, 90.0, 90.0), now())
            .expect("bilal");
        assert_eq!(update.rank, 1);
        assert!(update.new_badges.contains(&Badge::FirstPlace));

        let asha_record = RankingRepository::fetch(store.as_ref(), &asha)
            .expect("fetch")
            .expect("record");
        assert_eq!(asha_record.rank, 2);
        let idle_record = RankingRepository::fetch(store.as_ref(), &idle)
            .expect("fetch")
            .expect("record");
        assert_eq!(idle_record.rank, 3);
        assert_eq!(idle_record.total_quizzes_taken, 0);
    }

    #[test]
    fn unknown_student_is_not_found() {
        let store = Arc::new(MemoryStore::default());
        let service = RankingService::new(store.clone(), store.clone());
        let result =
            service.record_quiz_completion(completion(&StudentId::from("stu-x"), 1.0, 1.0), now());
        assert!(matches!(result, Err(PlacementError::NotFound("student"))));
    }

    #[test]
    fn stats_average_only_active_students() {
        let store = Arc::new(MemoryStore::default());
        let service = RankingService::new(store.clone(), store.clone());
        let asha = student(&store, "stu-a", "Asha");
        let bilal = student(&store, "stu-b", "Bilal");
        student(&store, "stu-c", "Chen");

        service
            .record_quiz_completion(completion(&asha, 150.0, 75.0), now())
            .expect("asha");
        service
            .record_quiz_completion(completion(&bilal, 51.0, 51.0), now())
            .expect("bilal");

        let stats = service.stats(now()).expect("stats");
        assert_eq!(stats.total_students, 3);
        assert_eq!(stats.active_students, 2);
        assert_eq!(stats.average_score, 101.0);

        let top = service.top_performers(Some(1), now()).expect("top");
        assert_eq!(top.len(), 1);
        assert_eq!(top[0].student_name, "Asha");

        let mine = service.my_ranking(&bilal, now()).expect("mine");
        assert_eq!(mine.student.rank, 2);
        assert_eq!(mine.student.total_students, 3);
        assert_eq!(mine.recent_quizzes.len(), 1);
    }
}
