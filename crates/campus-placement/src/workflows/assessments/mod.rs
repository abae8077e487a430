//! TPO question bank and timed student tests that feed the ranking engine.

pub mod domain;
pub mod repository;
pub mod results;
pub mod router;
pub mod service;

pub use domain::{
    AnswerOptions, AnswerOutcome, AnswerRecord, Choice, Difficulty, Question, QuestionDraft,
    QuestionSet, QuestionSetDraft, QuestionView, TestSession,
};
pub use repository::{QuestionBank, TestSessionRepository};
pub use results::{
    build_report, CategoryPerformance, QuestionAnalysis, ResultSummary, ScoreTier, TestDetails,
    TestReport, TestStatistics,
};
pub use router::assessment_routes;
pub use service::{AnswerRequest, AssessmentService, QuestionSetDetails, SetOverview, StartedTest};
