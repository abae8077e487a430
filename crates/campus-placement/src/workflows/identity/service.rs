use std::sync::Arc;

use chrono::{DateTime, Utc};
use serde::Serialize;
use tracing::{info, warn};

use crate::workflows::error::PlacementError;
use crate::workflows::ids::{CompanyId, StudentId, TpoId, UserId};

use super::domain::{
    CompanyProfile, LoginRequest, Principal, Profile, ProfileRef, RegistrationRequest, Role,
    StudentProfile, TpoProfile, UserAccount, UserView,
};
use super::password::{hash_password, verify_password};
use super::repository::{ProfileDirectory, UserRepository};
use super::token::{TokenCodec, TokenError};

/// Registration, login and bearer verification.
pub struct IdentityService {
    users: Arc<dyn UserRepository>,
    profiles: Arc<dyn ProfileDirectory>,
    tokens: Arc<TokenCodec>,
}

#[derive(Debug, Clone, Serialize)]
pub struct LoginOutcome {
    pub token: String,
    pub user: UserView,
}

fn required(value: Option<String>, message: &str) -> Result<String, PlacementError> {
    value
        .map(|raw| raw.trim().to_string())
        .filter(|trimmed| !trimmed.is_empty())
        .ok_or_else(|| PlacementError::validation(message))
}

impl IdentityService {
    pub fn new(
        users: Arc<dyn UserRepository>,
        profiles: Arc<dyn ProfileDirectory>,
        tokens: Arc<TokenCodec>,
    ) -> Self {
        Self {
            users,
            profiles,
            tokens,
        }
    }

    /// Create the role profile, then the account pointing at it.
    pub fn register(
        &self,
        request: RegistrationRequest,
        now: DateTime<Utc>,
    ) -> Result<UserView, PlacementError> {
        let name = required(request.name, "name is required")?;
        let email = required(request.email, "email and password are required")?
            .to_ascii_lowercase();
        let password = request
            .password
            .filter(|password| !password.is_empty())
            .ok_or_else(|| PlacementError::validation("email and password are required"))?;
        let password_hash = hash_password(&password).map_err(|error| {
            warn!(%error, "password hashing failed");
            PlacementError::Internal("password hashing failed".to_string())
        })?;
        let role = request
            .role
            .as_deref()
            .and_then(Role::parse)
            .ok_or_else(|| {
                PlacementError::validation("valid role is required (student, company, or tpo)")
            })?;

        if self.users.find_by_email(&email)?.is_some() {
            return Err(PlacementError::conflict(
                "user already exists with this email",
            ));
        }

        let profile = match role {
            Role::Student => {
                let message =
                    "roll_number, branch and graduation_year are required for student registration";
                let roll_number = required(request.roll_number, message)?;
                let branch = required(request.branch, message)?;
                let graduation_year = request
                    .graduation_year
                    .ok_or_else(|| PlacementError::validation(message))?;
                let stored = self.profiles.insert_student(StudentProfile {
                    id: StudentId::generate(),
                    name: name.clone(),
                    email: email.clone(),
                    roll_number,
                    branch,
                    graduation_year,
                    phone: request.phone,
                    cgpa: None,
                    skills: Vec::new(),
                    created_at: now,
                })?;
                ProfileRef::Student(stored.id)
            }
            Role::Company => {
                let message = "hr_contact and contact_number are required for company registration";
                let hr_contact = required(request.hr_contact, message)?;
                let contact_number = required(request.contact_number, message)?;
                let stored = self.profiles.insert_company(CompanyProfile {
                    id: CompanyId::generate(),
                    name: name.clone(),
                    email: email.clone(),
                    hr_contact,
                    contact_number,
                    industry: request.industry,
                    website: request.website,
                    created_at: now,
                })?;
                ProfileRef::Company(stored.id)
            }
            Role::Tpo => {
                let message =
                    "institute_name and contact_number are required for tpo registration";
                let institute_name = required(request.institute_name, message)?;
                let contact_number = required(request.contact_number, message)?;
                let stored = self.profiles.insert_tpo(TpoProfile {
                    id: TpoId::generate(),
                    name: name.clone(),
                    email: email.clone(),
                    institute_name,
                    contact_number,
                    created_at: now,
                })?;
                ProfileRef::Tpo(stored.id)
            }
        };

        let account = self.users.insert(UserAccount {
            id: UserId::generate(),
            name,
            email,
            password_hash,
            profile,
            created_at: now,
        })?;

        info!(
            user_id = %account.id,
            role = account.role().label(),
            "account registered"
        );
        Ok(account.view())
    }

    pub fn login(
        &self,
        request: LoginRequest,
        now: DateTime<Utc>,
    ) -> Result<LoginOutcome, PlacementError> {
        let email = request.email.trim().to_ascii_lowercase();
        let account = self
            .users
            .find_by_email(&email)?
            .filter(|account| verify_password(&request.password, &account.password_hash))
            .ok_or_else(|| PlacementError::unauthenticated("invalid email or password"))?;

        let token = self.tokens.issue(&account, now).map_err(|error| {
            warn!(%error, "token signing failed");
            PlacementError::unauthenticated("unable to issue token")
        })?;

        info!(user_id = %account.id, "login succeeded");
        Ok(LoginOutcome {
            token,
            user: account.view(),
        })
    }

    /// Verify a bearer token and confirm the account still exists.
    pub fn authenticate(
        &self,
        token: &str,
        now: DateTime<Utc>,
    ) -> Result<Principal, PlacementError> {
        let claims = self.tokens.verify(token, now).map_err(|error| match error {
            TokenError::Expired => PlacementError::unauthenticated("token expired"),
            _ => PlacementError::unauthenticated("invalid token"),
        })?;
        let principal = claims.principal();
        match self.users.fetch(&principal.user_id)? {
            Some(account) if account.profile == principal.profile => Ok(principal),
            _ => Err(PlacementError::unauthenticated("account no longer exists")),
        }
    }

    pub fn profile(&self, principal: &Principal) -> Result<Profile, PlacementError> {
        self.profiles
            .resolve(&principal.profile)?
            .ok_or(PlacementError::NotFound("profile"))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::store::MemoryStore;

    fn service() -> IdentityService {
        let store = Arc::new(MemoryStore::default());
        let tokens = Arc::new(TokenCodec::new("identity-tests", 24).expect("codec"));
        IdentityService::new(store.clone(), store, tokens)
    }

    fn student_request(email: &str) -> RegistrationRequest {
        RegistrationRequest {
            name: Some("Asha Rao".to_string()),
            email: Some(email.to_string()),
            password: Some("pass-123".to_string()),
            role: Some("student".to_string()),
            roll_number: Some("CS21-044".to_string()),
            branch: Some("CSE".to_string()),
            graduation_year: Some(2025),
            ..RegistrationRequest::default()
        }
    }

    #[test]
    fn register_then_login_yields_verifiable_token() {
        let service = service();
        let now = Utc::now();
        let user = service
            .register(student_request("Asha@Example.edu"), now)
            .expect("register");
        assert_eq!(user.role, Role::Student);
        assert_eq!(user.email, "asha@example.edu");

        let outcome = service
            .login(
                LoginRequest {
                    email: "asha@example.edu".to_string(),
                    password: "pass-123".to_string(),
                },
                now,
            )
            .expect("login");
        let principal = service
            .authenticate(&outcome.token, now)
            .expect("authenticate");
        assert_eq!(principal.user_id, user.id);
        assert!(matches!(
            service.profile(&principal).expect("profile"),
            Profile::Student(_)
        ));
    }

    #[test]
    fn stored_password_is_an_argon2_phc_string() {
        let store = Arc::new(MemoryStore::default());
        let tokens = Arc::new(TokenCodec::new("identity-tests", 24).expect("codec"));
        let service = IdentityService::new(store.clone(), store.clone(), tokens);
        service
            .register(student_request("phc@example.edu"), Utc::now())
            .expect("register");

        let account = store
            .find_by_email("phc@example.edu")
            .expect("lookup")
            .expect("account");
        assert!(account.password_hash.starts_with("$argon2id$"));
        assert!(!account.password_hash.contains("pass-123"));
    }

    #[test]
    fn duplicate_email_is_a_state_conflict() {
        let service = service();
        let now = Utc::now();
        service
            .register(student_request("dup@example.edu"), now)
            .expect("first");
        let error = service
            .register(student_request("dup@example.edu"), now)
            .expect_err("duplicate");
        assert!(matches!(error, PlacementError::StateConflict(_)));
    }

    #[test]
    fn role_specific_fields_are_required() {
        let service = service();
        let mut request = student_request("missing@example.edu");
        request.branch = None;
        assert!(matches!(
            service.register(request, Utc::now()),
            Err(PlacementError::Validation(_))
        ));

        let company = RegistrationRequest {
            name: Some("Acme".to_string()),
            email: Some("hr@acme.test".to_string()),
            password: Some("pw".to_string()),
            role: Some("company".to_string()),
            hr_contact: Some("Nina".to_string()),
            ..RegistrationRequest::default()
        };
        assert!(matches!(
            service.register(company, Utc::now()),
            Err(PlacementError::Validation(_))
        ));

        let unknown_role = RegistrationRequest {
            role: Some("admin".to_string()),
            ..student_request("role@example.edu")
        };
        assert!(matches!(
            service.register(unknown_role, Utc::now()),
            Err(PlacementError::Validation(_))
        ));
    }

    #[test]
    fn wrong_password_is_an_authentication_error() {
        let service = service();
        service
            .register(student_request("pw@example.edu"), Utc::now())
            .expect("register");
        let error = service
            .login(
                LoginRequest {
                    email: "pw@example.edu".to_string(),
                    password: "nope".to_string(),
                },
                Utc::now(),
            )
            .expect_err("bad password");
        assert!(matches!(error, PlacementError::Authentication(_)));
    }
}
