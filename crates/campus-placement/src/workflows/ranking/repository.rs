use crate::workflows::error::RepositoryError;
use crate::workflows::ids::StudentId;

use super::domain::RankingRecord;

pub trait RankingRepository: Send + Sync {
    fn fetch(&self, student: &StudentId) -> Result<Option<RankingRecord>, RepositoryError>;
    /// Insert or replace the record keyed by its student.
    fn upsert(&self, record: RankingRecord) -> Result<(), RepositoryError>;
    fn list(&self) -> Result<Vec<RankingRecord>, RepositoryError>;
}
