use crate::workflows::error::RepositoryError;
use crate::workflows::ids::JobId;

use super::domain::Job;

/// Job storage. Listings return insertion order; services sort as needed.
pub trait JobRepository: Send + Sync {
    fn insert(&self, job: Job) -> Result<Job, RepositoryError>;
    fn update(&self, job: Job) -> Result<(), RepositoryError>;
    fn fetch(&self, id: &JobId) -> Result<Option<Job>, RepositoryError>;
    fn list(&self) -> Result<Vec<Job>, RepositoryError>;
    fn remove(&self, id: &JobId) -> Result<Option<Job>, RepositoryError>;
}
