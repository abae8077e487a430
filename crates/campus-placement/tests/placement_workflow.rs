//! End-to-end placement scenarios driven through the public services and the HTTP router.

mod common {
    use std::sync::Arc;

    use chrono::{Duration, Utc};

    use campus_placement::config::AuthConfig;
    use campus_placement::workflows::identity::{LoginRequest, RegistrationRequest, UserView};
    use campus_placement::workflows::ids::{CompanyId, StudentId, TpoId};
    use campus_placement::workflows::jobs::JobDraft;
    use campus_placement::{MemoryStore, PlacementState};

    pub(super) const PASSWORD: &str = "placement-pass";

    pub(super) struct Actors {
        pub(super) state: PlacementState,
        pub(super) store: Arc<MemoryStore>,
        pub(super) company: CompanyId,
        pub(super) company_token: String,
        pub(super) tpo: TpoId,
        pub(super) student: StudentId,
        pub(super) student_token: String,
    }

    pub(super) fn register(
        state: &PlacementState,
        request: RegistrationRequest,
    ) -> (UserView, String) {
        let email = request.email.clone().expect("email");
        let view = state
            .identity
            .register(request, Utc::now())
            .expect("registration");
        let token = state
            .identity
            .login(
                LoginRequest {
                    email,
                    password: PASSWORD.to_string(),
                },
                Utc::now(),
            )
            .expect("login")
            .token;
        (view, token)
    }

    pub(super) fn student(state: &PlacementState, name: &str, email: &str) -> (StudentId, String) {
        let (view, token) = register(
            state,
            RegistrationRequest {
                name: Some(name.to_string()),
                email: Some(email.to_string()),
                password: Some(PASSWORD.to_string()),
                role: Some("student".to_string()),
                roll_number: Some(format!("R-{name}")),
                branch: Some("ECE".to_string()),
                graduation_year: Some(2026),
                ..RegistrationRequest::default()
            },
        );
        (StudentId::from(view.profile_id.as_str()), token)
    }

    pub(super) fn actors() -> Actors {
        let store = Arc::new(MemoryStore::default());
        let state = PlacementState::from_store(
            store.clone(),
            &AuthConfig {
                token_secret: "integration-secret".to_string(),
                token_ttl_hours: 2,
            },
        )
        .expect("state");

        let (company, company_token) = register(
            &state,
            RegistrationRequest {
                name: Some("Initech".to_string()),
                email: Some("talent@initech.test".to_string()),
                password: Some(PASSWORD.to_string()),
                role: Some("company".to_string()),
                hr_contact: Some("Joanna".to_string()),
                contact_number: Some("555-0100".to_string()),
                ..RegistrationRequest::default()
            },
        );
        let (tpo, _) = register(
            &state,
            RegistrationRequest {
                name: Some("Placement Office".to_string()),
                email: Some("office@campus.test".to_string()),
                password: Some(PASSWORD.to_string()),
                role: Some("tpo".to_string()),
                institute_name: Some("State Engineering College".to_string()),
                contact_number: Some("555-0199".to_string()),
                ..RegistrationRequest::default()
            },
        );
        let (student, student_token) = student(&state, "Divya", "divya@campus.test");

        Actors {
            state,
            store,
            company: CompanyId::from(company.profile_id.as_str()),
            company_token,
            tpo: TpoId::from(tpo.profile_id.as_str()),
            student,
            student_token,
        }
    }

    pub(super) fn draft(title: &str) -> JobDraft {
        JobDraft {
            title: Some(title.to_string()),
            description: Some("Graduate role".to_string()),
            location: Some("Pune".to_string()),
            package: Some(9.5),
            deadline: Some(Utc::now() + Duration::days(21)),
            ..JobDraft::default()
        }
    }
}

mod lifecycle {
    use super::common::*;

    use axum::body::Body;
    use axum::http::header::{AUTHORIZATION, CONTENT_TYPE};
    use axum::http::{Request, StatusCode};
    use chrono::{Duration, Utc};
    use serde_json::{json, Value};
    use tower::ServiceExt;

    use campus_placement::placement_router;
    use campus_placement::workflows::applications::Stage;
    use campus_placement::workflows::jobs::{ApprovalStatus, JobRepository, OperationalStatus};
    use campus_placement::PlacementError;

    async fn call(
        actors: &Actors,
        method: &str,
        uri: &str,
        token: &str,
        body: Option<Value>,
    ) -> (StatusCode, Value) {
        let mut builder = Request::builder()
            .method(method)
            .uri(uri)
            .header(AUTHORIZATION, format!("Bearer {token}"));
        let body = match body {
            Some(json) => {
                builder = builder.header(CONTENT_TYPE, "application/json");
                Body::from(serde_json::to_vec(&json).expect("body"))
            }
            None => Body::empty(),
        };
        let response = placement_router(actors.state.clone())
            .oneshot(builder.body(body).expect("request"))
            .await
            .expect("response");
        let status = response.status();
        let bytes = axum::body::to_bytes(response.into_body(), 256 * 1024)
            .await
            .expect("bytes");
        (status, serde_json::from_slice(&bytes).expect("json"))
    }

    #[test]
    fn stage_progress_follows_the_canonical_order() {
        let progress: Vec<u8> = Stage::ORDERED.iter().map(|stage| stage.progress()).collect();
        assert_eq!(progress, vec![17, 33, 50, 67, 83, 100]);
        assert_eq!(Stage::Rejected.progress(), 0);
    }

    #[test]
    fn unapproved_jobs_stay_hidden_from_students() {
        let actors = actors();
        let now = Utc::now();
        let pending = actors
            .state
            .jobs
            .create_job(&actors.company, draft("Pending role"), now)
            .expect("pending");
        let rejected = actors
            .state
            .jobs
            .create_job(&actors.company, draft("Rejected role"), now)
            .expect("rejected");
        actors
            .state
            .jobs
            .reject(&actors.tpo, &rejected.id, "Incomplete description", now)
            .expect("reject");

        // force an open operational status without approval
        let mut forced = JobRepository::fetch(actors.store.as_ref(), &pending.id)
            .expect("fetch")
            .expect("job");
        forced.status = OperationalStatus::Open;
        JobRepository::update(actors.store.as_ref(), forced).expect("update");

        let home = actors
            .state
            .jobs
            .student_home(&actors.student, now)
            .expect("home");
        assert_eq!(home.total_jobs, 0);
    }

    #[test]
    fn elapsed_online_tests_close_jobs_idempotently() {
        let actors = actors();
        let now = Utc::now();
        let mut job_draft = draft("Closing soon");
        job_draft.timeline.online_test = Some(now - Duration::hours(2));
        let job = actors
            .state
            .jobs
            .create_job(&actors.company, job_draft, now)
            .expect("job");
        actors
            .state
            .jobs
            .approve(&actors.tpo, &job.id, now)
            .expect("approve");

        for _ in 0..2 {
            let listing = actors
                .state
                .jobs
                .company_jobs(&actors.company, now)
                .expect("listing");
            assert_eq!(listing.jobs[0].job.status, OperationalStatus::Closed);
            assert_eq!(listing.closed_jobs, 1);
        }
        let stored = JobRepository::fetch(actors.store.as_ref(), &job.id)
            .expect("fetch")
            .expect("job");
        assert_eq!(stored.status, OperationalStatus::Closed);
        assert_eq!(stored.approval_status, ApprovalStatus::Approved);
    }

    #[test]
    fn approving_twice_keeps_the_first_approval() {
        let actors = actors();
        let now = Utc::now();
        let job = actors
            .state
            .jobs
            .create_job(&actors.company, draft("Analyst"), now)
            .expect("job");
        let approved = actors
            .state
            .jobs
            .approve(&actors.tpo, &job.id, now)
            .expect("first approval");

        let second = actors
            .state
            .jobs
            .approve(&actors.tpo, &job.id, now + Duration::minutes(5));
        assert!(matches!(second, Err(PlacementError::StateConflict(_))));

        let stored = JobRepository::fetch(actors.store.as_ref(), &job.id)
            .expect("fetch")
            .expect("job");
        assert_eq!(stored.approval_status, ApprovalStatus::Approved);
        assert_eq!(stored.approved_at, approved.approved_at);
    }

    #[tokio::test]
    async fn student_is_placed_end_to_end_over_http() {
        let actors = actors();
        let job = actors
            .state
            .jobs
            .create_job(&actors.company, draft("Graduate Engineer"), Utc::now())
            .expect("job");
        actors
            .state
            .jobs
            .approve(&actors.tpo, &job.id, Utc::now())
            .expect("approve");

        let (status, applied) = call(
            &actors,
            "POST",
            &format!("/student/apply/{}", job.id),
            &actors.student_token,
            None,
        )
        .await;
        assert_eq!(status, StatusCode::CREATED);
        assert_eq!(applied["data"]["current_stage"], json!("Applied"));
        assert_eq!(applied["data"]["stage_progress"], json!(17));
        let application = applied["data"]["id"].as_str().expect("id").to_string();

        let (status, _) = call(
            &actors,
            "POST",
            &format!("/student/apply/{}", job.id),
            &actors.student_token,
            None,
        )
        .await;
        assert_eq!(status, StatusCode::CONFLICT);

        let (status, interview) = call(
            &actors,
            "PUT",
            &format!("/timeline/applications/{application}/stage"),
            &actors.company_token,
            Some(json!({
                "stage": "Interview",
                "details": {
                    "date": (Utc::now() + Duration::days(2)).to_rfc3339(),
                    "location": "HQ",
                    "type": "Offline",
                    "interviewer": "Bill"
                }
            })),
        )
        .await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(interview["data"]["stage_progress"], json!(67));

        let (_, feed) = call(
            &actors,
            "GET",
            "/timeline/daily-updates",
            &actors.student_token,
            None,
        )
        .await;
        let notices = feed["data"]["notifications"].as_array().expect("notices");
        assert_eq!(notices.len(), 1);
        assert_eq!(notices[0]["type"], json!("application_update"));

        let (status, placed) = call(
            &actors,
            "PUT",
            &format!("/timeline/applications/{application}/stage"),
            &actors.company_token,
            Some(json!({
                "stage": "Placed",
                "details": {
                    "joining_date": (Utc::now() + Duration::days(90)).to_rfc3339(),
                    "company_location": "Pune"
                }
            })),
        )
        .await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(placed["data"]["new_stage"], json!("Placed"));
        assert_eq!(placed["data"]["stage_progress"], json!(100));

        let (_, timeline) = call(
            &actors,
            "GET",
            &format!("/timeline/application/{application}"),
            &actors.student_token,
            None,
        )
        .await;
        assert_eq!(timeline["data"]["application"]["current_stage"], json!("Placed"));
        let placed_notices = timeline["data"]["notifications"]
            .as_array()
            .expect("notifications")
            .iter()
            .filter(|notice| notice["title"] == json!("Placement Achieved!"))
            .count();
        assert_eq!(placed_notices, 1);
    }
}

mod ranking {
    use super::common::*;

    use std::collections::BTreeSet;

    use chrono::Utc;

    use campus_placement::workflows::ids::{QuestionSetId, StudentId};
    use campus_placement::workflows::ranking::{QuizCompletion, RankingRepository};

    fn completion(student: &StudentId, quiz: &str, score: f64) -> QuizCompletion {
        QuizCompletion {
            student_id: student.clone(),
            quiz_id: QuestionSetId::from(quiz),
            score,
            percentage: score.min(100.0),
        }
    }

    #[test]
    fn aggregates_hold_and_badges_only_accumulate() {
        let actors = actors();
        let scores = [95.0, 40.0, 72.5, 100.0, 10.0];
        let mut previous = BTreeSet::new();

        for (index, score) in scores.iter().enumerate() {
            let update = actors
                .state
                .ranking
                .record_quiz_completion(
                    completion(&actors.student, &format!("qset-{index}"), *score),
                    Utc::now(),
                )
                .expect("completion");
            assert!(update.badges.is_superset(&previous));
            previous = update.badges;
        }

        let record = RankingRepository::fetch(actors.store.as_ref(), &actors.student)
            .expect("fetch")
            .expect("record");
        let sum: f64 = record.quiz_scores.iter().map(|quiz| quiz.score).sum();
        assert_eq!(record.total_score, sum);
        assert_eq!(record.total_quizzes_taken, 5);
        assert_eq!(
            record.average_score,
            record.total_score / f64::from(record.total_quizzes_taken)
        );
        assert!(record
            .quiz_scores
            .iter()
            .all(|quiz| record.highest_score >= quiz.score));
    }

    #[test]
    fn leaderboard_puts_the_caller_first_and_keeps_the_order() {
        let actors = actors();
        let (kiran, _) = student(&actors.state, "Kiran", "kiran@campus.test");
        let (lena, _) = student(&actors.state, "Lena", "lena@campus.test");
        let ranking = &actors.state.ranking;

        ranking
            .record_quiz_completion(completion(&kiran, "qset-a", 80.0), Utc::now())
            .expect("kiran");
        ranking
            .record_quiz_completion(completion(&lena, "qset-a", 60.0), Utc::now())
            .expect("lena first");
        ranking
            .record_quiz_completion(completion(&lena, "qset-b", 20.0), Utc::now())
            .expect("lena second");
        ranking
            .record_quiz_completion(completion(&actors.student, "qset-a", 30.0), Utc::now())
            .expect("divya");

        let board = ranking
            .leaderboard(Some(&actors.student), Utc::now())
            .expect("leaderboard");
        assert_eq!(board.total_students, 3);
        assert_eq!(board.current_user_rank, Some(3));
        assert_eq!(board.current_user_score, 30.0);

        let order: Vec<_> = board
            .leaderboard
            .iter()
            .map(|entry| (entry.student_id.clone(), entry.rank, entry.is_current_user))
            .collect();
        assert_eq!(
            order,
            vec![
                (actors.student.clone(), 3, true),
                (kiran, 1, false),
                (lena, 2, false),
            ]
        );
    }
}
