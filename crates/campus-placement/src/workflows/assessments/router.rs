use axum::extract::rejection::JsonRejection;
use axum::extract::{Path, State};
use axum::routing::{get, post};
use axum::{Json, Router};
use chrono::Utc;
use serde::Serialize;

use crate::http::{ApiResponse, AuthUser, PlacementState};
use crate::workflows::error::PlacementError;
use crate::workflows::identity::Role;
use crate::workflows::ids::{QuestionId, QuestionSetId, TestSessionId};

use super::domain::{AnswerOutcome, Question, QuestionSet, QuestionSetDraft, QuestionDraft};
use super::results::{ResultSummary, TestReport};
use super::service::{AnswerRequest, QuestionSetDetails, StartedTest};

#[derive(Debug, Serialize)]
pub(crate) struct QuestionSets {
    question_sets: Vec<QuestionSet>,
}

#[derive(Debug, Serialize)]
pub(crate) struct TestResults {
    results: Vec<ResultSummary>,
}

pub fn assessment_routes() -> Router<PlacementState> {
    Router::new()
        .route(
            "/questions/question-sets",
            post(create_set_handler).get(list_sets_handler),
        )
        .route(
            "/questions/question-sets/:question_set_id",
            get(set_details_handler).delete(deactivate_set_handler),
        )
        .route("/questions/questions", post(create_question_handler))
        .route("/tests/start/:question_set_id", post(start_test_handler))
        .route(
            "/tests/:session_id/answer/:question_id",
            post(submit_answer_handler),
        )
        .route("/tests/:session_id/submit", post(submit_test_handler))
        .route("/tests/results", get(results_handler))
        .route("/tests/results/:session_id", get(result_handler))
}

pub(crate) async fn create_set_handler(
    State(state): State<PlacementState>,
    AuthUser(principal): AuthUser,
    payload: Result<Json<QuestionSetDraft>, JsonRejection>,
) -> Result<ApiResponse<QuestionSet>, PlacementError> {
    let tpo = principal.tpo()?;
    let Json(draft) = payload?;
    let set = state.assessments.create_set(tpo, draft, Utc::now())?;
    Ok(ApiResponse::created("question set created successfully", set))
}

pub(crate) async fn list_sets_handler(
    State(state): State<PlacementState>,
    AuthUser(_principal): AuthUser,
) -> Result<ApiResponse<QuestionSets>, PlacementError> {
    let question_sets = state.assessments.active_sets()?;
    Ok(ApiResponse::ok(
        "question sets retrieved successfully",
        QuestionSets { question_sets },
    ))
}

pub(crate) async fn set_details_handler(
    State(state): State<PlacementState>,
    AuthUser(principal): AuthUser,
    Path(set_id): Path<String>,
) -> Result<ApiResponse<QuestionSetDetails>, PlacementError> {
    let reveal_answers = principal.role() == Role::Tpo;
    let details = state
        .assessments
        .question_set(&QuestionSetId::from(set_id.as_str()), reveal_answers)?;
    Ok(ApiResponse::ok("question set retrieved successfully", details))
}

pub(crate) async fn deactivate_set_handler(
    State(state): State<PlacementState>,
    AuthUser(principal): AuthUser,
    Path(set_id): Path<String>,
) -> Result<ApiResponse<QuestionSet>, PlacementError> {
    principal.tpo()?;
    let set = state
        .assessments
        .deactivate_set(&QuestionSetId::from(set_id.as_str()), Utc::now())?;
    Ok(ApiResponse::ok("question set deactivated successfully", set))
}

pub(crate) async fn create_question_handler(
    State(state): State<PlacementState>,
    AuthUser(principal): AuthUser,
    payload: Result<Json<QuestionDraft>, JsonRejection>,
) -> Result<ApiResponse<Question>, PlacementError> {
    let tpo = principal.tpo()?;
    let Json(draft) = payload?;
    let question = state.assessments.add_question(tpo, draft, Utc::now())?;
    Ok(ApiResponse::created("question created successfully", question))
}

pub(crate) async fn start_test_handler(
    State(state): State<PlacementState>,
    AuthUser(principal): AuthUser,
    Path(set_id): Path<String>,
) -> Result<ApiResponse<StartedTest>, PlacementError> {
    let student = principal.student()?;
    let started = state.assessments.start_test(
        student,
        &QuestionSetId::from(set_id.as_str()),
        Utc::now(),
    )?;
    Ok(ApiResponse::created("test started successfully", started))
}

pub(crate) async fn submit_answer_handler(
    State(state): State<PlacementState>,
    AuthUser(principal): AuthUser,
    Path((session_id, question_id)): Path<(String, String)>,
    payload: Result<Json<AnswerRequest>, JsonRejection>,
) -> Result<ApiResponse<AnswerOutcome>, PlacementError> {
    let student = principal.student()?;
    let Json(request) = payload?;
    let outcome = state.assessments.submit_answer(
        student,
        &TestSessionId::from(session_id.as_str()),
        &QuestionId::from(question_id.as_str()),
        request,
        Utc::now(),
    )?;
    Ok(ApiResponse::ok("answer submitted successfully", outcome))
}

pub(crate) async fn submit_test_handler(
    State(state): State<PlacementState>,
    AuthUser(principal): AuthUser,
    Path(session_id): Path<String>,
) -> Result<ApiResponse<TestReport>, PlacementError> {
    let student = principal.student()?;
    let report = state.assessments.submit_test(
        student,
        &TestSessionId::from(session_id.as_str()),
        Utc::now(),
    )?;
    Ok(ApiResponse::ok("test submitted successfully", report))
}

pub(crate) async fn result_handler(
    State(state): State<PlacementState>,
    AuthUser(principal): AuthUser,
    Path(session_id): Path<String>,
) -> Result<ApiResponse<TestReport>, PlacementError> {
    let report = state.assessments.result(
        principal.student()?,
        &TestSessionId::from(session_id.as_str()),
    )?;
    Ok(ApiResponse::ok("test result retrieved successfully", report))
}

pub(crate) async fn results_handler(
    State(state): State<PlacementState>,
    AuthUser(principal): AuthUser,
) -> Result<ApiResponse<TestResults>, PlacementError> {
    let results = state.assessments.results(principal.student()?)?;
    Ok(ApiResponse::ok(
        "test results retrieved successfully",
        TestResults { results },
    ))
}
