use crate::workflows::error::RepositoryError;
use crate::workflows::ids::{CompanyId, StudentId, TpoId, UserId};

use super::domain::{CompanyProfile, Profile, ProfileRef, StudentProfile, TpoProfile, UserAccount};

/// Account storage keyed by id with a unique email index.
pub trait UserRepository: Send + Sync {
    fn insert(&self, account: UserAccount) -> Result<UserAccount, RepositoryError>;
    fn fetch(&self, id: &UserId) -> Result<Option<UserAccount>, RepositoryError>;
    fn find_by_email(&self, email: &str) -> Result<Option<UserAccount>, RepositoryError>;
}

/// Per-role profile collections.
pub trait ProfileDirectory: Send + Sync {
    fn insert_student(&self, profile: StudentProfile) -> Result<StudentProfile, RepositoryError>;
    fn student(&self, id: &StudentId) -> Result<Option<StudentProfile>, RepositoryError>;
    fn students(&self) -> Result<Vec<StudentProfile>, RepositoryError>;
    fn insert_company(&self, profile: CompanyProfile) -> Result<CompanyProfile, RepositoryError>;
    fn company(&self, id: &CompanyId) -> Result<Option<CompanyProfile>, RepositoryError>;
    fn insert_tpo(&self, profile: TpoProfile) -> Result<TpoProfile, RepositoryError>;
    fn tpo(&self, id: &TpoId) -> Result<Option<TpoProfile>, RepositoryError>;

    /// Dispatch a tagged reference to the collection owning that role.
    fn resolve(&self, reference: &ProfileRef) -> Result<Option<Profile>, RepositoryError> {
        let profile = match reference {
            ProfileRef::Student(id) => self.student(id)?.map(Profile::Student),
            ProfileRef::Company(id) => self.company(id)?.map(Profile::Company),
            ProfileRef::Tpo(id) => self.tpo(id)?.map(Profile::Tpo),
        };
        Ok(profile)
    }
}
