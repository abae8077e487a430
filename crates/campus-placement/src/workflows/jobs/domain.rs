use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::workflows::error::PlacementError;
use crate::workflows::ids::{CompanyId, JobId, TpoId};

/// Whether the posting currently accepts applications.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum OperationalStatus {
    Open,
    Closed,
    #[serde(rename = "On Hold")]
    OnHold,
}

impl OperationalStatus {
    pub const fn label(self) -> &'static str {
        match self {
            OperationalStatus::Open => "Open",
            OperationalStatus::Closed => "Closed",
            OperationalStatus::OnHold => "On Hold",
        }
    }
}

/// TPO review axis, independent of [`OperationalStatus`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ApprovalStatus {
    Pending,
    Approved,
    Rejected,
}

impl ApprovalStatus {
    pub const fn label(self) -> &'static str {
        match self {
            ApprovalStatus::Pending => "pending",
            ApprovalStatus::Approved => "approved",
            ApprovalStatus::Rejected => "rejected",
        }
    }
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Compensation {
    pub fixed: Option<f64>,
    pub variable: Option<f64>,
    #[serde(default)]
    pub other_benefits: Vec<String>,
}

/// Recruitment calendar announced with the posting.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct JobTimeline {
    pub online_test: Option<DateTime<Utc>>,
    pub interview: Option<DateTime<Utc>>,
    pub final_offer: Option<DateTime<Utc>>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Job {
    pub id: JobId,
    pub company: CompanyId,
    pub title: String,
    pub description: String,
    pub location: String,
    pub package: f64,
    pub eligibility_criteria: Vec<String>,
    pub deadline: DateTime<Utc>,
    pub status: OperationalStatus,
    pub approval_status: ApprovalStatus,
    /// Reviewer of the posting, recorded on approval and on rejection.
    pub approved_by: Option<TpoId>,
    pub approved_at: Option<DateTime<Utc>>,
    pub rejection_reason: Option<String>,
    pub compensation: Option<Compensation>,
    pub timeline: JobTimeline,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

/// Company supplied posting before validation.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct JobDraft {
    pub title: Option<String>,
    pub description: Option<String>,
    pub location: Option<String>,
    pub package: Option<f64>,
    #[serde(default)]
    pub eligibility_criteria: Vec<String>,
    pub deadline: Option<DateTime<Utc>>,
    pub compensation: Option<Compensation>,
    #[serde(default)]
    pub timeline: JobTimeline,
}

fn non_empty(value: Option<String>, field: &str) -> Result<String, PlacementError> {
    value
        .map(|raw| raw.trim().to_string())
        .filter(|trimmed| !trimmed.is_empty())
        .ok_or_else(|| PlacementError::validation(format!("{field} is required")))
}

impl Job {
    /// Build a new posting; every job starts pending and closed.
    pub fn from_draft(
        company: CompanyId,
        draft: JobDraft,
        now: DateTime<Utc>,
    ) -> Result<Self, PlacementError> {
        let title = non_empty(draft.title, "title")?;
        let description = non_empty(draft.description, "description")?;
        let location = non_empty(draft.location, "location")?;
        let package = draft
            .package
            .filter(|package| package.is_finite() && *package > 0.0)
            .ok_or_else(|| PlacementError::validation("package must be a positive number"))?;
        let deadline = draft
            .deadline
            .ok_or_else(|| PlacementError::validation("deadline is required"))?;

        Ok(Self {
            id: JobId::generate(),
            company,
            title,
            description,
            location,
            package,
            eligibility_criteria: draft
                .eligibility_criteria
                .into_iter()
                .map(|criterion| criterion.trim().to_string())
                .filter(|criterion| !criterion.is_empty())
                .collect(),
            deadline,
            status: OperationalStatus::Closed,
            approval_status: ApprovalStatus::Pending,
            approved_by: None,
            approved_at: None,
            rejection_reason: None,
            compensation: draft.compensation,
            timeline: draft.timeline,
            created_at: now,
            updated_at: now,
        })
    }

    pub fn is_visible_to_students(&self) -> bool {
        self.approval_status == ApprovalStatus::Approved && self.status == OperationalStatus::Open
    }

    pub fn online_test_elapsed(&self, now: DateTime<Utc>) -> bool {
        self.timeline
            .online_test
            .map(|online_test| online_test < now)
            .unwrap_or(false)
    }

    pub fn should_auto_close(&self, now: DateTime<Utc>) -> bool {
        self.status == OperationalStatus::Open && self.online_test_elapsed(now)
    }

    pub fn close(&mut self, now: DateTime<Utc>) {
        self.status = OperationalStatus::Closed;
        self.updated_at = now;
    }

    fn ensure_pending(&self) -> Result<(), PlacementError> {
        if self.approval_status != ApprovalStatus::Pending {
            return Err(PlacementError::conflict(format!(
                "job is not in pending status (currently {})",
                self.approval_status.label()
            )));
        }
        Ok(())
    }

    pub fn approve(&mut self, reviewer: TpoId, now: DateTime<Utc>) -> Result<(), PlacementError> {
        self.ensure_pending()?;
        self.approval_status = ApprovalStatus::Approved;
        self.approved_by = Some(reviewer);
        self.approved_at = Some(now);
        self.status = OperationalStatus::Open;
        self.updated_at = now;
        Ok(())
    }

    pub fn reject(
        &mut self,
        reviewer: TpoId,
        reason: &str,
        now: DateTime<Utc>,
    ) -> Result<(), PlacementError> {
        let reason = reason.trim();
        if reason.is_empty() {
            return Err(PlacementError::validation("rejection reason is required"));
        }
        self.ensure_pending()?;
        self.approval_status = ApprovalStatus::Rejected;
        self.approved_by = Some(reviewer);
        self.rejection_reason = Some(reason.to_string());
        self.status = OperationalStatus::Closed;
        self.updated_at = now;
        Ok(())
    }
}
