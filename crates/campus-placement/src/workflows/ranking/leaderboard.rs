//! Read-side projections over ranking records. Nothing here touches storage.

use std::collections::BTreeSet;

use serde::Serialize;

use crate::workflows::ids::StudentId;

use super::domain::{standing_order, Badge, QuizScore, RankingRecord};

const TREND_WINDOW: usize = 5;

/// A ranking record joined with the student's display name.
#[derive(Debug, Clone, PartialEq)]
pub struct Standing {
    pub name: String,
    pub record: RankingRecord,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct LeaderboardEntry {
    pub rank: u32,
    pub student_id: StudentId,
    pub student_name: String,
    pub score: f64,
    pub badges: BTreeSet<Badge>,
    pub total_quizzes_taken: u32,
    pub average_score: f64,
    pub highest_score: f64,
    pub is_current_user: bool,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Leaderboard {
    pub total_students: usize,
    pub current_user_rank: Option<u32>,
    pub current_user_score: f64,
    pub leaderboard: Vec<LeaderboardEntry>,
}

/// Sort standings into the global order.
pub fn order_standings(standings: &mut [Standing]) {
    standings.sort_by(|left, right| standing_order(&left.record, &right.record));
}

/// Rank the standings and hoist the requesting student's entry to the front.
///
/// The remaining entries keep their ranked order; ranks themselves are unaffected.
pub fn build_leaderboard(mut standings: Vec<Standing>, current: Option<&StudentId>) -> Leaderboard {
    order_standings(&mut standings);
    let total_students = standings.len();

    let entries: Vec<LeaderboardEntry> = standings
        .into_iter()
        .enumerate()
        .map(|(index, standing)| LeaderboardEntry {
            rank: index as u32 + 1,
            is_current_user: current == Some(&standing.record.student),
            student_id: standing.record.student,
            student_name: standing.name,
            score: standing.record.total_score,
            badges: standing.record.badges,
            total_quizzes_taken: standing.record.total_quizzes_taken,
            average_score: standing.record.average_score,
            highest_score: standing.record.highest_score,
        })
        .collect();

    let current_entry = entries.iter().find(|entry| entry.is_current_user);
    let current_user_rank = current_entry.map(|entry| entry.rank);
    let current_user_score = current_entry.map_or(0.0, |entry| entry.score);

    let (mut leaderboard, rest): (Vec<_>, Vec<_>) =
        entries.into_iter().partition(|entry| entry.is_current_user);
    leaderboard.extend(rest);

    Leaderboard {
        total_students,
        current_user_rank,
        current_user_score,
        leaderboard,
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum Trend {
    Improving,
    Declining,
    Stable,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct PerformanceTrend {
    pub trend: Trend,
    pub message: &'static str,
}

/// Compare consecutive percentages of the latest five quizzes in chronological order.
pub fn performance_trend(record: &RankingRecord) -> PerformanceTrend {
    if record.quiz_scores.len() < 2 {
        return PerformanceTrend {
            trend: Trend::Stable,
            message: "Need more quizzes to determine trend",
        };
    }
    let mut window: Vec<QuizScore> = record.recent(TREND_WINDOW);
    window.reverse();

    let (mut rises, mut falls) = (0usize, 0usize);
    for pair in window.windows(2) {
        if pair[1].percentage > pair[0].percentage {
            rises += 1;
        } else if pair[1].percentage < pair[0].percentage {
            falls += 1;
        }
    }

    if rises > falls {
        PerformanceTrend {
            trend: Trend::Improving,
            message: "Your performance is improving!",
        }
    } else if falls > rises {
        PerformanceTrend {
            trend: Trend::Declining,
            message: "Consider reviewing your study strategy",
        }
    } else {
        PerformanceTrend {
            trend: Trend::Stable,
            message: "Your performance is consistent",
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct BucketCount {
    pub range: &'static str,
    pub count: usize,
}

fn bucket(total: f64) -> &'static str {
    match total {
        t if t < 100.0 => "0-100",
        t if t < 500.0 => "100-500",
        t if t < 1000.0 => "500-1000",
        t if t < 2000.0 => "1000-2000",
        _ => "2000+",
    }
}

const BUCKETS: [&str; 5] = ["0-100", "100-500", "500-1000", "1000-2000", "2000+"];

/// Histogram of total scores; students who have not scored yet are left out.
pub fn score_distribution<'a>(
    records: impl IntoIterator<Item = &'a RankingRecord>,
) -> Vec<BucketCount> {
    let mut counts = [0usize; BUCKETS.len()];
    for record in records {
        if record.total_score <= 0.0 {
            continue;
        }
        let label = bucket(record.total_score);
        if let Some(index) = BUCKETS.iter().position(|candidate| *candidate == label) {
            counts[index] += 1;
        }
    }
    BUCKETS
        .into_iter()
        .zip(counts)
        .map(|(range, count)| BucketCount { range, count })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::workflows::ids::QuestionSetId;
    use chrono::{DateTime, Duration, TimeZone, Utc};

    fn now() -> DateTime<Utc> {
        Utc.with_ymd_and_hms(2025, 3, 10, 12, 0, 0).single().expect("valid")
    }

    fn standing(id: &str, total: f64, average: f64) -> Standing {
        let mut record = RankingRecord::new(StudentId::from(id), now());
        record.total_score = total;
        record.average_score = average;
        Standing {
            name: format!("Student {id}"),
            record,
        }
    }

    #[test]
    fn current_user_is_hoisted_without_changing_ranks() {
        let standings = vec![
            standing("stu-c", 50.0, 50.0),
            standing("stu-a", 300.0, 75.0),
            standing("stu-b", 300.0, 60.0),
            standing("stu-d", 10.0, 10.0),
        ];
        let current = StudentId::from("stu-c");
        let board = build_leaderboard(standings, Some(&current));

        let order: Vec<&str> = board
            .leaderboard
            .iter()
            .map(|entry| entry.student_id.as_str())
            .collect();
        assert_eq!(order, vec!["stu-c", "stu-a", "stu-b", "stu-d"]);
        assert_eq!(board.leaderboard[0].rank, 3);
        assert!(board.leaderboard[0].is_current_user);
        assert_eq!(board.current_user_rank, Some(3));
        assert_eq!(board.current_user_score, 50.0);
        assert_eq!(board.total_students, 4);
    }

    #[test]
    fn absent_user_leaves_order_untouched() {
        let board = build_leaderboard(
            vec![standing("stu-a", 1.0, 1.0), standing("stu-b", 2.0, 2.0)],
            Some(&StudentId::from("stu-z")),
        );
        assert_eq!(board.current_user_rank, None);
        assert_eq!(board.leaderboard[0].student_id.as_str(), "stu-b");
    }

    #[test]
    fn trend_reads_quizzes_chronologically() {
        let mut record = RankingRecord::new(StudentId::from("stu-1"), now());
        for (minutes, percentage) in [(0, 40.0), (1, 55.0), (2, 70.0)] {
            record.record(
                QuizScore::new(
                    QuestionSetId::from("qset"),
                    percentage,
                    percentage,
                    now() + Duration::minutes(minutes),
                )
                .expect("score"),
                now(),
            );
        }
        assert_eq!(performance_trend(&record).trend, Trend::Improving);
    }

    #[test]
    fn distribution_skips_zero_totals() {
        let records = [
            standing("a", 0.0, 0.0).record,
            standing("b", 99.0, 0.0).record,
            standing("c", 100.0, 0.0).record,
            standing("d", 2500.0, 0.0).record,
        ];
        let distribution = score_distribution(records.iter());
        let counts: Vec<usize> = distribution.iter().map(|bucket| bucket.count).collect();
        assert_eq!(counts, vec![1, 1, 0, 0, 1]);
    }
}
