use crate::workflows::error::RepositoryError;
use crate::workflows::ids::{QuestionId, QuestionSetId, StudentId, TestSessionId};

use super::domain::{Question, QuestionSet, TestSession};

/// Question sets and their questions.
pub trait QuestionBank: Send + Sync {
    fn insert_set(&self, set: QuestionSet) -> Result<QuestionSet, RepositoryError>;
    fn update_set(&self, set: QuestionSet) -> Result<(), RepositoryError>;
    fn fetch_set(&self, id: &QuestionSetId) -> Result<Option<QuestionSet>, RepositoryError>;
    fn list_sets(&self) -> Result<Vec<QuestionSet>, RepositoryError>;
    fn insert_question(&self, question: Question) -> Result<Question, RepositoryError>;
    fn fetch_question(&self, id: &QuestionId) -> Result<Option<Question>, RepositoryError>;
}

pub trait TestSessionRepository: Send + Sync {
    fn insert_session(&self, session: TestSession) -> Result<TestSession, RepositoryError>;
    fn update_session(&self, session: TestSession) -> Result<(), RepositoryError>;
    fn fetch_session(&self, id: &TestSessionId) -> Result<Option<TestSession>, RepositoryError>;
    fn sessions_for(&self, student: &StudentId) -> Result<Vec<TestSession>, RepositoryError>;
}
