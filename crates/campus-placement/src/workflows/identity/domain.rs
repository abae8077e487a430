use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::workflows::error::PlacementError;
use crate::workflows::ids::{CompanyId, StudentId, TpoId, UserId};

/// Actor role carried by every account and token.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Role {
    Student,
    Company,
    Tpo,
}

impl Role {
    pub const fn label(self) -> &'static str {
        match self {
            Role::Student => "student",
            Role::Company => "company",
            Role::Tpo => "tpo",
        }
    }

    pub fn parse(value: &str) -> Option<Self> {
        match value.trim().to_ascii_lowercase().as_str() {
            "student" => Some(Role::Student),
            "company" => Some(Role::Company),
            "tpo" => Some(Role::Tpo),
            _ => None,
        }
    }
}

/// Tagged reference from an account to its role-specific profile.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(tag = "role", content = "id", rename_all = "snake_case")]
pub enum ProfileRef {
    Student(StudentId),
    Company(CompanyId),
    Tpo(TpoId),
}

impl ProfileRef {
    pub fn role(&self) -> Role {
        match self {
            ProfileRef::Student(_) => Role::Student,
            ProfileRef::Company(_) => Role::Company,
            ProfileRef::Tpo(_) => Role::Tpo,
        }
    }

    pub fn id(&self) -> &str {
        match self {
            ProfileRef::Student(id) => id.as_str(),
            ProfileRef::Company(id) => id.as_str(),
            ProfileRef::Tpo(id) => id.as_str(),
        }
    }

    pub fn from_parts(role: Role, id: &str) -> Self {
        match role {
            Role::Student => ProfileRef::Student(StudentId::from(id)),
            Role::Company => ProfileRef::Company(CompanyId::from(id)),
            Role::Tpo => ProfileRef::Tpo(TpoId::from(id)),
        }
    }
}

/// Login account; the password is only ever held as a salted digest.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct UserAccount {
    pub id: UserId,
    pub name: String,
    pub email: String,
    pub password_hash: String,
    pub profile: ProfileRef,
    pub created_at: DateTime<Utc>,
}

impl UserAccount {
    pub fn role(&self) -> Role {
        self.profile.role()
    }

    pub fn view(&self) -> UserView {
        UserView {
            id: self.id.clone(),
            name: self.name.clone(),
            email: self.email.clone(),
            role: self.role(),
            profile_id: self.profile.id().to_string(),
        }
    }
}

/// Account representation safe to return to clients.
#[derive(Debug, Clone, Serialize)]
pub struct UserView {
    pub id: UserId,
    pub name: String,
    pub email: String,
    pub role: Role,
    pub profile_id: String,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct StudentProfile {
    pub id: StudentId,
    pub name: String,
    pub email: String,
    pub roll_number: String,
    pub branch: String,
    pub graduation_year: u16,
    pub phone: Option<String>,
    pub cgpa: Option<f32>,
    pub skills: Vec<String>,
    pub created_at: DateTime<Utc>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CompanyProfile {
    pub id: CompanyId,
    pub name: String,
    pub email: String,
    pub hr_contact: String,
    pub contact_number: String,
    pub industry: Option<String>,
    pub website: Option<String>,
    pub created_at: DateTime<Utc>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TpoProfile {
    pub id: TpoId,
    pub name: String,
    pub email: String,
    pub institute_name: String,
    pub contact_number: String,
    pub created_at: DateTime<Utc>,
}

/// Resolved role profile.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(tag = "role", rename_all = "snake_case")]
pub enum Profile {
    Student(StudentProfile),
    Company(CompanyProfile),
    Tpo(TpoProfile),
}

/// Registration payload. Role specific fields are checked once the role is known.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct RegistrationRequest {
    pub name: Option<String>,
    pub email: Option<String>,
    pub password: Option<String>,
    pub role: Option<String>,
    pub phone: Option<String>,
    pub roll_number: Option<String>,
    pub branch: Option<String>,
    pub graduation_year: Option<u16>,
    pub hr_contact: Option<String>,
    pub contact_number: Option<String>,
    pub institute_name: Option<String>,
    pub industry: Option<String>,
    pub website: Option<String>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct LoginRequest {
    pub email: String,
    pub password: String,
}

/// Authenticated caller as decoded from a bearer token.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Principal {
    pub user_id: UserId,
    pub profile: ProfileRef,
}

impl Principal {
    pub fn role(&self) -> Role {
        self.profile.role()
    }

    pub fn student(&self) -> Result<&StudentId, PlacementError> {
        match &self.profile {
            ProfileRef::Student(id) => Ok(id),
            _ => Err(PlacementError::forbidden("student role required")),
        }
    }

    pub fn company(&self) -> Result<&CompanyId, PlacementError> {
        match &self.profile {
            ProfileRef::Company(id) => Ok(id),
            _ => Err(PlacementError::forbidden("company role required")),
        }
    }

    pub fn tpo(&self) -> Result<&TpoId, PlacementError> {
        match &self.profile {
            ProfileRef::Tpo(id) => Ok(id),
            _ => Err(PlacementError::forbidden("tpo role required")),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn profile_ref_round_trips_through_parts() {
        let reference = ProfileRef::from_parts(Role::Company, "cmp-1");
        assert_eq!(reference.role(), Role::Company);
        assert_eq!(reference.id(), "cmp-1");
        assert_eq!(
            serde_json::to_value(&reference).expect("serialize"),
            serde_json::json!({"role": "company", "id": "cmp-1"})
        );
    }

    #[test]
    fn role_gates_reject_other_roles() {
        let principal = Principal {
            user_id: UserId::from("usr-1"),
            profile: ProfileRef::Student(StudentId::from("stu-1")),
        };
        assert!(principal.student().is_ok());
        assert!(matches!(
            principal.tpo(),
            Err(PlacementError::Authorization(_))
        ));
        assert_eq!(Role::parse(" TPO "), Some(Role::Tpo));
        assert_eq!(Role::parse("admin"), None);
    }
}
