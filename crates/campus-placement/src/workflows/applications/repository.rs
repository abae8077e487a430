use crate::workflows::error::RepositoryError;
use crate::workflows::ids::{ApplicationId, JobId, StudentId};

use super::domain::Application;

/// Storage abstraction so the service module can be exercised in isolation.
pub trait ApplicationRepository: Send + Sync {
    /// Fails with `Conflict` when the (student, job) pair already exists.
    fn insert(&self, application: Application) -> Result<Application, RepositoryError>;
    fn update(&self, application: Application) -> Result<(), RepositoryError>;
    fn fetch(&self, id: &ApplicationId) -> Result<Option<Application>, RepositoryError>;
    fn find(
        &self,
        student: &StudentId,
        job: &JobId,
    ) -> Result<Option<Application>, RepositoryError>;
    fn for_student(&self, student: &StudentId) -> Result<Vec<Application>, RepositoryError>;
    fn for_job(&self, job: &JobId) -> Result<Vec<Application>, RepositoryError>;
}
