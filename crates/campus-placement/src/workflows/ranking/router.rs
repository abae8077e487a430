use axum::extract::rejection::{JsonRejection, QueryRejection};
use axum::extract::{Query, State};
use axum::routing::{get, post};
use axum::{Json, Router};
use chrono::Utc;
use serde::{Deserialize, Serialize};

use crate::http::{ApiResponse, AuthUser, PlacementState};
use crate::workflows::error::PlacementError;
use crate::workflows::identity::ProfileRef;

use super::leaderboard::Leaderboard;
use super::service::{MyRanking, QuizCompletion, RankingStats, ScoreUpdate, TopPerformer};

#[derive(Debug, Default, Deserialize)]
pub(crate) struct TopPerformersQuery {
    limit: Option<usize>,
}

#[derive(Debug, Serialize)]
pub(crate) struct TopPerformers {
    top_performers: Vec<TopPerformer>,
}

pub fn ranking_routes() -> Router<PlacementState> {
    Router::new()
        .route("/ranking/leaderboard", get(leaderboard_handler))
        .route("/ranking/my-ranking", get(my_ranking_handler))
        .route("/ranking/top-performers", get(top_performers_handler))
        .route("/ranking/stats", get(stats_handler))
        .route("/ranking/update-score", post(update_score_handler))
}

pub(crate) async fn leaderboard_handler(
    State(state): State<PlacementState>,
    AuthUser(principal): AuthUser,
) -> Result<ApiResponse<Leaderboard>, PlacementError> {
    let current = match &principal.profile {
        ProfileRef::Student(id) => Some(id),
        _ => None,
    };
    let leaderboard = state.ranking.leaderboard(current, Utc::now())?;
    Ok(ApiResponse::ok(
        "campus leaderboard retrieved successfully",
        leaderboard,
    ))
}

pub(crate) async fn my_ranking_handler(
    State(state): State<PlacementState>,
    AuthUser(principal): AuthUser,
) -> Result<ApiResponse<MyRanking>, PlacementError> {
    let ranking = state.ranking.my_ranking(principal.student()?, Utc::now())?;
    Ok(ApiResponse::ok(
        "student ranking details retrieved successfully",
        ranking,
    ))
}

pub(crate) async fn top_performers_handler(
    State(state): State<PlacementState>,
    AuthUser(_principal): AuthUser,
    query: Result<Query<TopPerformersQuery>, QueryRejection>,
) -> Result<ApiResponse<TopPerformers>, PlacementError> {
    let Query(query) = query?;
    let top_performers = state.ranking.top_performers(query.limit, Utc::now())?;
    Ok(ApiResponse::ok(
        "top performers retrieved successfully",
        TopPerformers { top_performers },
    ))
}

pub(crate) async fn stats_handler(
    State(state): State<PlacementState>,
    AuthUser(_principal): AuthUser,
) -> Result<ApiResponse<RankingStats>, PlacementError> {
    let stats = state.ranking.stats(Utc::now())?;
    Ok(ApiResponse::ok("ranking statistics retrieved successfully", stats))
}

pub(crate) async fn update_score_handler(
    State(state): State<PlacementState>,
    AuthUser(principal): AuthUser,
    payload: Result<Json<QuizCompletion>, JsonRejection>,
) -> Result<ApiResponse<ScoreUpdate>, PlacementError> {
    principal.tpo()?;
    let Json(completion) = payload?;
    let update = state.ranking.record_quiz_completion(completion, Utc::now())?;
    Ok(ApiResponse::ok("student score updated successfully", update))
}
