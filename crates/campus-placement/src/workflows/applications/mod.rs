//! Application engine: the staged lifecycle of a student's application,
//! its derived progress and the notifications emitted on every transition.

pub mod domain;
pub(crate) mod notices;
pub mod progress;
pub mod repository;
pub mod router;
pub mod service;

#[cfg(test)]
mod tests;

pub use domain::{
    Application, ApplicationTimeline, CompletionRequest, InterviewMode, PackageBreakdown, Stage,
    StageChange, StageChangeRequest, StageCompletion, StageDetails, StageUpdate,
};
pub use progress::{StepStatus, TimelineStep};
pub use repository::ApplicationRepository;
pub use router::application_routes;
pub use service::{
    ApplicantView, ApplicationService, ApplicationTimelineView, JobApplications, JobSummary,
    MyApplicationView, MyApplications, PlacementStatistics, PlacementTimeline, StageCount,
    StageTransition, StudentSummary, TimelineCard,
};
