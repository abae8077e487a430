use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;

use axum::response::Response;
use chrono::{DateTime, Duration, Utc};
use serde_json::Value;

use crate::config::AuthConfig;
use crate::http::PlacementState;
use crate::store::MemoryStore;
use crate::workflows::applications::{
    ApplicationService, InterviewMode, PackageBreakdown, StageChangeRequest, StageDetails,
};
use crate::workflows::error::RepositoryError;
use crate::workflows::identity::{
    LoginRequest, Principal, ProfileRef, RegistrationRequest, UserView,
};
use crate::workflows::ids::{CompanyId, JobId, NotificationId, StudentId, TpoId};
use crate::workflows::jobs::{JobDraft, JobTimeline};
use crate::workflows::notifications::{Notification, NotificationFeed, NotificationRepository};

pub(super) const PASSWORD: &str = "campus-secret";

/// One registered account with its bearer token.
pub(super) struct Member {
    pub(super) principal: Principal,
    pub(super) token: String,
}

impl Member {
    pub(super) fn bearer(&self) -> String {
        format!("Bearer {}", self.token)
    }
}

/// A TPO, a company with one approved job and a student, wired to one store.
pub(super) struct Campus {
    pub(super) store: Arc<MemoryStore>,
    pub(super) state: PlacementState,
    pub(super) tpo: Member,
    pub(super) company: Member,
    pub(super) student: Member,
    pub(super) job: JobId,
}

impl Campus {
    pub(super) fn student_id(&self) -> &StudentId {
        match &self.student.principal.profile {
            ProfileRef::Student(id) => id,
            _ => unreachable!("student member carries a student profile"),
        }
    }

    pub(super) fn company_id(&self) -> &CompanyId {
        match &self.company.principal.profile {
            ProfileRef::Company(id) => id,
            _ => unreachable!("company member carries a company profile"),
        }
    }

    pub(super) fn tpo_id(&self) -> &TpoId {
        match &self.tpo.principal.profile {
            ProfileRef::Tpo(id) => id,
            _ => unreachable!("tpo member carries a tpo profile"),
        }
    }

    /// Register another member on the same campus.
    pub(super) fn enrol(&self, request: RegistrationRequest) -> Member {
        enrol(&self.state, request)
    }
}

pub(super) fn auth_config() -> AuthConfig {
    AuthConfig {
        token_secret: "placement-test-secret".to_string(),
        token_ttl_hours: 1,
    }
}

pub(super) fn student_registration(email: &str) -> RegistrationRequest {
    RegistrationRequest {
        name: Some("Asha Rao".to_string()),
        email: Some(email.to_string()),
        password: Some(PASSWORD.to_string()),
        role: Some("student".to_string()),
        roll_number: Some("CS21B001".to_string()),
        branch: Some("CSE".to_string()),
        graduation_year: Some(2026),
        ..RegistrationRequest::default()
    }
}

pub(super) fn company_registration(name: &str, email: &str) -> RegistrationRequest {
    RegistrationRequest {
        name: Some(name.to_string()),
        email: Some(email.to_string()),
        password: Some(PASSWORD.to_string()),
        role: Some("company".to_string()),
        hr_contact: Some("Meera".to_string()),
        contact_number: Some("+91-9000000000".to_string()),
        ..RegistrationRequest::default()
    }
}

fn tpo_registration() -> RegistrationRequest {
    RegistrationRequest {
        name: Some("Placement Officer".to_string()),
        email: Some("tpo@campus.test".to_string()),
        password: Some(PASSWORD.to_string()),
        role: Some("tpo".to_string()),
        institute_name: Some("Campus Institute".to_string()),
        contact_number: Some("+91-8000000000".to_string()),
        ..RegistrationRequest::default()
    }
}

fn principal_of(view: &UserView) -> Principal {
    Principal {
        user_id: view.id.clone(),
        profile: ProfileRef::from_parts(view.role, &view.profile_id),
    }
}

fn enrol(state: &PlacementState, request: RegistrationRequest) -> Member {
    let email = request.email.clone().expect("email");
    let view = state
        .identity
        .register(request, Utc::now())
        .expect("registration");
    let login = state
        .identity
        .login(
            LoginRequest {
                email,
                password: PASSWORD.to_string(),
            },
            Utc::now(),
        )
        .expect("login");
    Member {
        principal: principal_of(&view),
        token: login.token,
    }
}

pub(super) fn job_draft(title: &str) -> JobDraft {
    JobDraft {
        title: Some(title.to_string()),
        description: Some("Backend services for the campus portal".to_string()),
        location: Some("Bengaluru".to_string()),
        package: Some(12.0),
        deadline: Some(Utc::now() + Duration::days(30)),
        timeline: JobTimeline::default(),
        ..JobDraft::default()
    }
}

pub(super) fn campus() -> Campus {
    let store = Arc::new(MemoryStore::default());
    let state = PlacementState::from_store(store.clone(), &auth_config()).expect("state");
    let tpo = enrol(&state, tpo_registration());
    let company = enrol(&state, company_registration("Acme Systems", "hr@acme.test"));
    let student = enrol(&state, student_registration("asha@campus.test"));

    let company_id = company.principal.company().expect("company").clone();
    let tpo_id = tpo.principal.tpo().expect("tpo").clone();
    let job = state
        .jobs
        .create_job(&company_id, job_draft("Platform Engineer"), Utc::now())
        .expect("job");
    state
        .jobs
        .approve(&tpo_id, &job.id, Utc::now())
        .expect("approval");

    Campus {
        store,
        state,
        tpo,
        company,
        student,
        job: job.id,
    }
}

pub(super) fn interview_request(date: DateTime<Utc>) -> StageChangeRequest {
    StageChangeRequest {
        stage: "Interview".to_string(),
        details: StageDetails {
            date: Some(date),
            location: Some("Block C, Room 204".to_string()),
            mode: Some(InterviewMode::Offline),
            interviewer: Some("R. Iyer".to_string()),
            ..StageDetails::default()
        },
        message: None,
    }
}

pub(super) fn offer_request(joining: DateTime<Utc>) -> StageChangeRequest {
    StageChangeRequest {
        stage: "Offer".to_string(),
        details: StageDetails {
            package: Some(PackageBreakdown {
                fixed: 10.0,
                variable: 2.0,
                total: 12.0,
            }),
            joining_date: Some(joining),
            ..StageDetails::default()
        },
        message: None,
    }
}

pub(super) fn placed_request(joining: DateTime<Utc>) -> StageChangeRequest {
    StageChangeRequest {
        stage: "Placed".to_string(),
        details: StageDetails {
            joining_date: Some(joining),
            company_location: Some("Bengaluru".to_string()),
            ..StageDetails::default()
        },
        message: None,
    }
}

/// Notification storage that can be switched offline.
pub(super) struct FlakyNotifications {
    inner: Arc<MemoryStore>,
    offline: AtomicBool,
}

impl FlakyNotifications {
    pub(super) fn offline(inner: Arc<MemoryStore>) -> Self {
        Self {
            inner,
            offline: AtomicBool::new(true),
        }
    }

    pub(super) fn reconnect(&self) {
        self.offline.store(false, Ordering::SeqCst);
    }

    fn check(&self) -> Result<(), RepositoryError> {
        if self.offline.load(Ordering::SeqCst) {
            return Err(RepositoryError::Unavailable("notification store offline".to_string()));
        }
        Ok(())
    }
}

impl NotificationRepository for FlakyNotifications {
    fn insert(&self, notification: Notification) -> Result<Notification, RepositoryError> {
        self.check()?;
        NotificationRepository::insert(self.inner.as_ref(), notification)
    }

    fn update(&self, notification: Notification) -> Result<(), RepositoryError> {
        self.check()?;
        NotificationRepository::update(self.inner.as_ref(), notification)
    }

    fn fetch(&self, id: &NotificationId) -> Result<Option<Notification>, RepositoryError> {
        self.check()?;
        NotificationRepository::fetch(self.inner.as_ref(), id)
    }

    fn for_student(&self, student: &StudentId) -> Result<Vec<Notification>, RepositoryError> {
        self.check()?;
        NotificationRepository::for_student(self.inner.as_ref(), student)
    }
}

/// Application service sharing the campus store but delivering through `notifications`.
pub(super) fn service_with_feed(
    campus: &Campus,
    notifications: Arc<FlakyNotifications>,
) -> (ApplicationService, Arc<NotificationFeed>) {
    let store = campus.store.clone();
    let feed = Arc::new(NotificationFeed::new(
        notifications,
        store.clone(),
        store.clone(),
        store.clone(),
    ));
    let service = ApplicationService::new(store.clone(), store.clone(), store, feed.clone());
    (service, feed)
}

pub(super) async fn read_json_body(response: Response) -> Value {
    let body = axum::body::to_bytes(response.into_body(), 64 * 1024)
        .await
        .expect("read body");
    serde_json::from_slice(&body).expect("json payload")
}
