//! Job catalog and the TPO approval workflow.
//!
//! Jobs are created `pending`/`Closed`, opened by approval and closed again
//! once their online test date has passed.

pub mod domain;
pub mod repository;
pub mod router;
pub mod service;
pub mod urgency;

pub use domain::{ApprovalStatus, Compensation, Job, JobDraft, JobTimeline, OperationalStatus};
pub use repository::JobRepository;
pub use router::job_routes;
pub use service::{
    ApprovalStats, CompanyJobListing, CompanyJobView, CompanySummary, JobService, OpenJobView,
    ReviewJobView, ReviewQueue, StudentHome, StudentJobDetails,
};
pub use urgency::{Countdown, CountdownBasis, CountdownStatus, StatusInfo, StatusLabel, Tone};
