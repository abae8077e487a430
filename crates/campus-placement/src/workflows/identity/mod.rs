//! Accounts, role profiles and bearer tokens.

pub mod domain;
pub(crate) mod password;
pub mod repository;
pub mod router;
pub mod service;
pub mod token;

pub use domain::{
    CompanyProfile, LoginRequest, Principal, Profile, ProfileRef, RegistrationRequest, Role,
    StudentProfile, TpoProfile, UserAccount, UserView,
};
pub use repository::{ProfileDirectory, UserRepository};
pub use router::identity_routes;
pub use service::{IdentityService, LoginOutcome};
pub use token::{Claims, TokenCodec, TokenError};
