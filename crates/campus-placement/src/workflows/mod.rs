pub mod applications;
pub mod assessments;
pub mod error;
pub mod identity;
pub mod ids;
pub mod jobs;
pub mod notifications;
pub mod ranking;
