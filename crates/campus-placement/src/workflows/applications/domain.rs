use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::workflows::error::PlacementError;
use crate::workflows::ids::{ApplicationId, JobId, StudentId};

/// Lifecycle stage of an application. `Rejected` is a terminal side branch.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub enum Stage {
    Applied,
    Test,
    Shortlisted,
    Interview,
    Offer,
    Placed,
    Rejected,
}

impl Stage {
    /// Canonical forward order used for progress and transition checks.
    pub const ORDERED: [Stage; 6] = [
        Stage::Applied,
        Stage::Test,
        Stage::Shortlisted,
        Stage::Interview,
        Stage::Offer,
        Stage::Placed,
    ];

    pub const ALL: [Stage; 7] = [
        Stage::Applied,
        Stage::Test,
        Stage::Shortlisted,
        Stage::Interview,
        Stage::Offer,
        Stage::Placed,
        Stage::Rejected,
    ];

    pub const fn label(self) -> &'static str {
        match self {
            Stage::Applied => "Applied",
            Stage::Test => "Test",
            Stage::Shortlisted => "Shortlisted",
            Stage::Interview => "Interview",
            Stage::Offer => "Offer",
            Stage::Placed => "Placed",
            Stage::Rejected => "Rejected",
        }
    }

    pub fn parse(value: &str) -> Option<Self> {
        let value = value.trim();
        Self::ALL
            .into_iter()
            .find(|stage| stage.label().eq_ignore_ascii_case(value))
    }

    pub fn position(self) -> Option<usize> {
        Self::ORDERED.iter().position(|stage| *stage == self)
    }

    pub const fn is_terminal(self) -> bool {
        matches!(self, Stage::Placed | Stage::Rejected)
    }

    /// `round((position + 1) / 6 * 100)`; zero for `Rejected`.
    pub fn progress(self) -> u8 {
        match self.position() {
            Some(index) => {
                let ratio = (index + 1) as f64 / Self::ORDERED.len() as f64;
                (ratio * 100.0).round() as u8
            }
            None => 0,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum InterviewMode {
    Online,
    Offline,
    Hybrid,
}

#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct PackageBreakdown {
    pub fixed: f64,
    pub variable: f64,
    pub total: f64,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AppliedRecord {
    pub date: DateTime<Utc>,
    pub completed: bool,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct TestRecord {
    pub date: Option<DateTime<Utc>>,
    pub completed: bool,
    pub score: Option<f64>,
    pub location: Option<String>,
    pub instructions: Option<String>,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct ShortlistedRecord {
    pub date: Option<DateTime<Utc>>,
    pub completed: bool,
    pub message: Option<String>,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct InterviewRecord {
    pub date: Option<DateTime<Utc>>,
    pub completed: bool,
    pub location: Option<String>,
    #[serde(rename = "type")]
    pub mode: Option<InterviewMode>,
    pub interviewer: Option<String>,
    pub duration: Option<String>,
    pub instructions: Option<String>,
    pub feedback: Option<String>,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct OfferRecord {
    pub date: Option<DateTime<Utc>>,
    pub completed: bool,
    pub package: Option<PackageBreakdown>,
    pub joining_date: Option<DateTime<Utc>>,
    pub offer_letter_url: Option<String>,
    pub acceptance_deadline: Option<DateTime<Utc>>,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct PlacedRecord {
    pub date: Option<DateTime<Utc>>,
    pub completed: bool,
    pub joining_date: Option<DateTime<Utc>>,
    pub company_location: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RejectionRecord {
    pub date: DateTime<Utc>,
    pub reason: Option<String>,
}

/// One sub-record per stage; `completed` flags only ever move from false to true.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ApplicationTimeline {
    pub applied: AppliedRecord,
    pub test: TestRecord,
    pub shortlisted: ShortlistedRecord,
    pub interview: InterviewRecord,
    pub offer: OfferRecord,
    pub placed: PlacedRecord,
    pub rejected: Option<RejectionRecord>,
}

/// Loose stage details as posted by a company or TPO.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct StageDetails {
    pub date: Option<DateTime<Utc>>,
    pub location: Option<String>,
    pub instructions: Option<String>,
    #[serde(rename = "type")]
    pub mode: Option<InterviewMode>,
    pub interviewer: Option<String>,
    pub duration: Option<String>,
    pub package: Option<PackageBreakdown>,
    pub joining_date: Option<DateTime<Utc>>,
    pub offer_letter_url: Option<String>,
    pub acceptance_deadline: Option<DateTime<Utc>>,
    pub company_location: Option<String>,
    pub reason: Option<String>,
    pub next_deadline: Option<DateTime<Utc>>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct StageChangeRequest {
    pub stage: String,
    #[serde(default)]
    pub details: StageDetails,
    pub message: Option<String>,
}

/// Validated target stage together with the details that stage requires.
#[derive(Debug, Clone, PartialEq)]
pub enum StageUpdate {
    Test {
        date: DateTime<Utc>,
        location: String,
        instructions: Option<String>,
    },
    Shortlisted {
        message: Option<String>,
    },
    Interview {
        date: DateTime<Utc>,
        location: String,
        mode: InterviewMode,
        interviewer: String,
        duration: Option<String>,
        instructions: Option<String>,
    },
    Offer {
        package: PackageBreakdown,
        joining_date: DateTime<Utc>,
        offer_letter_url: Option<String>,
        acceptance_deadline: Option<DateTime<Utc>>,
    },
    Placed {
        joining_date: DateTime<Utc>,
        company_location: String,
    },
    Rejected {
        reason: Option<String>,
    },
}

impl StageUpdate {
    pub fn stage(&self) -> Stage {
        match self {
            StageUpdate::Test { .. } => Stage::Test,
            StageUpdate::Shortlisted { .. } => Stage::Shortlisted,
            StageUpdate::Interview { .. } => Stage::Interview,
            StageUpdate::Offer { .. } => Stage::Offer,
            StageUpdate::Placed { .. } => Stage::Placed,
            StageUpdate::Rejected { .. } => Stage::Rejected,
        }
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct StageChange {
    pub update: StageUpdate,
    pub next_deadline: Option<DateTime<Utc>>,
}

fn text(value: Option<String>) -> Option<String> {
    value
        .map(|raw| raw.trim().to_string())
        .filter(|trimmed| !trimmed.is_empty())
}

fn require<T>(value: Option<T>, stage: Stage, field: &str) -> Result<T, PlacementError> {
    value.ok_or_else(|| {
        PlacementError::validation(format!("{} stage requires {field}", stage.label()))
    })
}

impl TryFrom<StageChangeRequest> for StageChange {
    type Error = PlacementError;

    fn try_from(request: StageChangeRequest) -> Result<Self, Self::Error> {
        let stage = Stage::parse(&request.stage).ok_or_else(|| {
            PlacementError::validation(format!("unrecognised stage: {}", request.stage))
        })?;
        let details = request.details;
        let next_deadline = details.next_deadline;

        let update = match stage {
            Stage::Applied => {
                return Err(PlacementError::validation(
                    "Applied is set when the student applies and cannot be targeted",
                ))
            }
            Stage::Test => StageUpdate::Test {
                date: require(details.date, stage, "date")?,
                location: require(text(details.location), stage, "location")?,
                instructions: text(details.instructions),
            },
            Stage::Shortlisted => StageUpdate::Shortlisted {
                message: text(request.message),
            },
            Stage::Interview => StageUpdate::Interview {
                date: require(details.date, stage, "date")?,
                location: require(text(details.location), stage, "location")?,
                mode: require(details.mode, stage, "type")?,
                interviewer: require(text(details.interviewer), stage, "interviewer")?,
                duration: text(details.duration),
                instructions: text(details.instructions),
            },
            Stage::Offer => {
                let package = require(details.package, stage, "package")?;
                if !(package.total.is_finite() && package.total > 0.0) {
                    return Err(PlacementError::validation(
                        "Offer package total must be positive",
                    ));
                }
                StageUpdate::Offer {
                    package,
                    joining_date: require(details.joining_date, stage, "joining_date")?,
                    offer_letter_url: text(details.offer_letter_url),
                    acceptance_deadline: details.acceptance_deadline,
                }
            }
            Stage::Placed => StageUpdate::Placed {
                joining_date: require(details.joining_date, stage, "joining_date")?,
                company_location: require(
                    text(details.company_location),
                    stage,
                    "company_location",
                )?,
            },
            Stage::Rejected => StageUpdate::Rejected {
                reason: text(details.reason).or_else(|| text(request.message)),
            },
        };

        Ok(StageChange {
            update,
            next_deadline,
        })
    }
}

#[derive(Debug, Clone, Deserialize)]
pub struct CompletionRequest {
    pub stage: String,
    pub score: Option<f64>,
    pub feedback: Option<String>,
}

/// Completion signal for the stages that are scheduled before they happen.
#[derive(Debug, Clone, PartialEq)]
pub enum StageCompletion {
    Test { score: f64 },
    Interview { feedback: Option<String> },
}

impl StageCompletion {
    pub fn stage(&self) -> Stage {
        match self {
            StageCompletion::Test { .. } => Stage::Test,
            StageCompletion::Interview { .. } => Stage::Interview,
        }
    }
}

impl TryFrom<CompletionRequest> for StageCompletion {
    type Error = PlacementError;

    fn try_from(request: CompletionRequest) -> Result<Self, Self::Error> {
        match Stage::parse(&request.stage) {
            Some(Stage::Test) => {
                let score = request
                    .score
                    .filter(|score| score.is_finite() && *score >= 0.0)
                    .ok_or_else(|| {
                        PlacementError::validation("Test completion requires a non-negative score")
                    })?;
                Ok(StageCompletion::Test { score })
            }
            Some(Stage::Interview) => Ok(StageCompletion::Interview {
                feedback: text(request.feedback),
            }),
            Some(other) => Err(PlacementError::validation(format!(
                "{} has no separate completion signal",
                other.label()
            ))),
            None => Err(PlacementError::validation(format!(
                "unrecognised stage: {}",
                request.stage
            ))),
        }
    }
}

/// A student's application to one job.
///
/// `status` and `current_stage` are both serialized from the single stage
/// field so they cannot diverge.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(into = "ApplicationDocument", try_from = "ApplicationDocument")]
pub struct Application {
    pub id: ApplicationId,
    pub student: StudentId,
    pub job: JobId,
    stage: Stage,
    pub applied_at: DateTime<Utc>,
    pub last_updated: DateTime<Utc>,
    pub next_deadline: Option<DateTime<Utc>>,
    pub timeline: ApplicationTimeline,
}

#[derive(Serialize, Deserialize)]
struct ApplicationDocument {
    id: ApplicationId,
    application_number: String,
    student: StudentId,
    job: JobId,
    status: Stage,
    current_stage: Stage,
    stage_progress: u8,
    applied_at: DateTime<Utc>,
    last_updated: DateTime<Utc>,
    next_deadline: Option<DateTime<Utc>>,
    timeline: ApplicationTimeline,
}

impl From<Application> for ApplicationDocument {
    fn from(application: Application) -> Self {
        Self {
            application_number: application.id.application_number(),
            stage_progress: application.stage.progress(),
            status: application.stage,
            current_stage: application.stage,
            id: application.id,
            student: application.student,
            job: application.job,
            applied_at: application.applied_at,
            last_updated: application.last_updated,
            next_deadline: application.next_deadline,
            timeline: application.timeline,
        }
    }
}

impl TryFrom<ApplicationDocument> for Application {
    type Error = String;

    fn try_from(document: ApplicationDocument) -> Result<Self, Self::Error> {
        if document.status != document.current_stage {
            return Err(format!(
                "status {} diverges from current_stage {}",
                document.status.label(),
                document.current_stage.label()
            ));
        }
        Ok(Self {
            id: document.id,
            student: document.student,
            job: document.job,
            stage: document.current_stage,
            applied_at: document.applied_at,
            last_updated: document.last_updated,
            next_deadline: document.next_deadline,
            timeline: document.timeline,
        })
    }
}

impl Application {
    pub fn new(student: StudentId, job: JobId, now: DateTime<Utc>) -> Self {
        Self {
            id: ApplicationId::generate(),
            student,
            job,
            stage: Stage::Applied,
            applied_at: now,
            last_updated: now,
            next_deadline: None,
            timeline: ApplicationTimeline {
                applied: AppliedRecord {
                    date: now,
                    completed: true,
                },
                test: TestRecord::default(),
                shortlisted: ShortlistedRecord::default(),
                interview: InterviewRecord::default(),
                offer: OfferRecord::default(),
                placed: PlacedRecord::default(),
                rejected: None,
            },
        }
    }

    /// Value reported as both `status` and `current_stage`.
    pub fn stage(&self) -> Stage {
        self.stage
    }

    pub fn stage_progress(&self) -> u8 {
        self.stage.progress()
    }

    pub fn application_number(&self) -> String {
        self.id.application_number()
    }

    pub fn is_active(&self) -> bool {
        !self.stage.is_terminal()
    }

    fn check_transition(&self, target: Stage) -> Result<(), PlacementError> {
        if self.stage.is_terminal() {
            return Err(PlacementError::conflict(format!(
                "application is already {} and cannot change stage",
                self.stage.label()
            )));
        }
        if target == Stage::Rejected {
            return Ok(());
        }
        match (self.stage.position(), target.position()) {
            (Some(current), Some(next)) if next > current => Ok(()),
            _ => Err(PlacementError::conflict(format!(
                "cannot move application from {} to {}",
                self.stage.label(),
                target.label()
            ))),
        }
    }

    /// Apply a validated stage change and return the previous stage.
    pub fn advance(
        &mut self,
        change: StageChange,
        now: DateTime<Utc>,
    ) -> Result<Stage, PlacementError> {
        let target = change.update.stage();
        self.check_transition(target)?;
        let timeline = &mut self.timeline;

        match change.update {
            StageUpdate::Test {
                date,
                location,
                instructions,
            } => {
                timeline.test.date = Some(date);
                timeline.test.completed = false;
                timeline.test.location = Some(location);
                timeline.test.instructions = instructions;
            }
            StageUpdate::Shortlisted { message } => {
                timeline.shortlisted.date = Some(now);
                timeline.shortlisted.completed = true;
                timeline.shortlisted.message = Some(message.unwrap_or_else(|| {
                    "Congratulations! You have been shortlisted.".to_string()
                }));
            }
            StageUpdate::Interview {
                date,
                location,
                mode,
                interviewer,
                duration,
                instructions,
            } => {
                timeline.interview.date = Some(date);
                timeline.interview.completed = false;
                timeline.interview.location = Some(location);
                timeline.interview.mode = Some(mode);
                timeline.interview.interviewer = Some(interviewer);
                timeline.interview.duration = duration;
                timeline.interview.instructions = instructions;
            }
            StageUpdate::Offer {
                package,
                joining_date,
                offer_letter_url,
                acceptance_deadline,
            } => {
                timeline.offer.date = Some(now);
                timeline.offer.completed = true;
                timeline.offer.package = Some(package);
                timeline.offer.joining_date = Some(joining_date);
                timeline.offer.offer_letter_url = offer_letter_url;
                timeline.offer.acceptance_deadline = acceptance_deadline;
            }
            StageUpdate::Placed {
                joining_date,
                company_location,
            } => {
                timeline.placed.date = Some(now);
                timeline.placed.completed = true;
                timeline.placed.joining_date = Some(joining_date);
                timeline.placed.company_location = Some(company_location);
            }
            StageUpdate::Rejected { reason } => {
                timeline.rejected = Some(RejectionRecord { date: now, reason });
            }
        }

        let previous = self.stage;
        self.stage = target;
        self.last_updated = now;
        if change.next_deadline.is_some() {
            self.next_deadline = change.next_deadline;
        }
        Ok(previous)
    }

    /// Record that a scheduled Test or Interview took place. The stage itself does not move.
    pub fn complete(
        &mut self,
        completion: StageCompletion,
        now: DateTime<Utc>,
    ) -> Result<(), PlacementError> {
        if self.stage == Stage::Rejected {
            return Err(PlacementError::conflict("application has been rejected"));
        }
        let stage = completion.stage();
        let (scheduled, completed) = match stage {
            Stage::Test => (
                self.timeline.test.date.is_some(),
                self.timeline.test.completed,
            ),
            _ => (
                self.timeline.interview.date.is_some(),
                self.timeline.interview.completed,
            ),
        };
        if !scheduled {
            return Err(PlacementError::conflict(format!(
                "{} has not been scheduled",
                stage.label()
            )));
        }
        if completed {
            return Err(PlacementError::conflict(format!(
                "{} is already completed",
                stage.label()
            )));
        }

        match completion {
            StageCompletion::Test { score } => {
                self.timeline.test.completed = true;
                self.timeline.test.score = Some(score);
            }
            StageCompletion::Interview { feedback } => {
                self.timeline.interview.completed = true;
                self.timeline.interview.feedback = feedback;
            }
        }
        self.last_updated = now;
        Ok(())
    }
}
