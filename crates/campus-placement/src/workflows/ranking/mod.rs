//! Quiz aggregates, additive badges and the campus leaderboard.

pub mod domain;
pub mod leaderboard;
pub mod repository;
pub mod router;
pub mod service;

pub use domain::{Badge, QuizScore, RankingRecord};
pub use leaderboard::{
    BucketCount, Leaderboard, LeaderboardEntry, PerformanceTrend, Standing, Trend,
};
pub use repository::RankingRepository;
pub use router::ranking_routes;
pub use service::{
    MyRanking, QuizCompletion, RankingService, RankingStats, RankingSummary, ScoreUpdate,
    TopPerformer,
};
