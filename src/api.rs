use axum::{
    extract::{Json, Path, Query, State},
    http::StatusCode,
    response::{IntoResponse, Response},
    routing::{get, post},
    Router,
};
use chrono::{NaiveDate, Utc};
use serde::{Deserialize, Serialize};
use tower_http::cors::CorsLayer;
use log::{error, warn};

use crate::db::{ChildProgress, Db};
use crate::error::{EngineError, NotFound};
use crate::learners::{learner_profile, LearnerProfile};
use crate::missions::{daily_mission, Mission};
use crate::models::SkillMasteryState;
use crate::streak::XpStreakState;

#[derive(Clone)]
pub struct ApiState {
    pub db: Db,
}

pub fn app_router(state: ApiState) -> Router {
    Router::new()
        .route("/health", get(health))
        .route("/api/learners/:learner_id", get(get_learner))
        .route("/api/learners/:learner_id/domains/:domain/next", get(get_next_exercise))
        .route("/api/learners/:learner_id/domains/:domain/missions/:date", get(get_mission))
        .route("/api/learners/:learner_id/domains/:domain/progress", get(get_progress))
        .route("/api/learners/:learner_id/domains/:domain/progress/complete", post(complete_mission))
        .route("/api/learners/:learner_id/domains/:domain/commit", post(commit_challenge))
        .route("/api/answers", post(submit_answer))
        .route("/api/sessions", post(start_session))
        .route("/api/sessions/:session_id/end", post(end_session))
        .route("/api/parents/:parent_id/overview", get(parent_overview))
        .layer(CorsLayer::permissive())
        .with_state(state)
}

/// Error body returned by every handler.
#[derive(Debug, Serialize, Deserialize)]
pub struct ErrorBody {
    pub error: String,
}

pub struct ApiError {
    status: StatusCode,
    message: String,
}

impl ApiError {
    fn bad_request(message: impl Into<String>) -> Self {
        Self { status: StatusCode::BAD_REQUEST, message: message.into() }
    }
}

impl From<anyhow::Error> for ApiError {
    fn from(err: anyhow::Error) -> Self {
        if let Some(not_found) = err.downcast_ref::<NotFound>() {
            return Self { status: StatusCode::NOT_FOUND, message: not_found.to_string() };
        }
        if let Some(engine) = err.downcast_ref::<EngineError>() {
            warn!("rejected engine input: {}", engine);
            return Self { status: StatusCode::UNPROCESSABLE_ENTITY, message: engine.to_string() };
        }
        error!("request failed: {:#}", err);
        Self { status: StatusCode::INTERNAL_SERVER_ERROR, message: err.to_string() }
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        (self.status, Json(ErrorBody { error: self.message })).into_response()
    }
}

type ApiResult<T> = Result<Json<T>, ApiError>;

fn parse_date(raw: &str) -> Result<NaiveDate, ApiError> {
    NaiveDate::parse_from_str(raw, "%Y-%m-%d")
        .map_err(|_| ApiError::bad_request(format!("expected a YYYY-MM-DD date, got {raw}")))
}

async fn health() -> impl IntoResponse {
    Json(serde_json::json!({ "status": "ok" }))
}

async fn get_learner(Path(learner_id): Path<String>) -> Json<LearnerProfile> {
    Json(learner_profile(&learner_id))
}

#[derive(Deserialize)]
struct NextQuery {
    last: Option<String>,
}

#[derive(Debug, Serialize, Deserialize)]
pub struct NextExercise {
    pub id: String,
    pub prompt: String,
    pub skill_id: String,
}

async fn get_next_exercise(
    State(state): State<ApiState>,
    Path((learner_id, domain)): Path<(String, String)>,
    Query(query): Query<NextQuery>,
) -> ApiResult<Option<NextExercise>> {
    let next = state
        .db
        .next_exercise(&learner_id, &domain, query.last.as_deref(), Utc::now())
        .await?;
    Ok(Json(next.map(|ex| NextExercise { id: ex.id, prompt: ex.prompt, skill_id: ex.skill_id })))
}

#[derive(Deserialize)]
struct SubmitRequest {
    learner_id: String,
    exercise_id: String,
    correct: bool,
}

async fn submit_answer(
    State(state): State<ApiState>,
    Json(payload): Json<SubmitRequest>,
) -> ApiResult<SkillMasteryState> {
    let mastery = state
        .db
        .submit_answer(&payload.learner_id, &payload.exercise_id, payload.correct, Utc::now())
        .await?;
    Ok(Json(mastery))
}

async fn get_mission(Path((learner_id, domain, date)): Path<(String, String, String)>) -> ApiResult<Mission> {
    parse_date(&date)?;
    Ok(Json(daily_mission(&learner_id, &domain, &date)))
}

#[derive(Deserialize)]
struct ProgressQuery {
    today: Option<String>,
}

#[derive(Debug, Serialize, Deserialize)]
pub struct ProgressResponse {
    pub state: XpStreakState,
    pub reset: bool,
    pub message: Option<String>,
}

async fn get_progress(
    State(state): State<ApiState>,
    Path((learner_id, domain)): Path<(String, String)>,
    Query(query): Query<ProgressQuery>,
) -> ApiResult<ProgressResponse> {
    let today = match query.today {
        Some(raw) => parse_date(&raw)?,
        None => Utc::now().date_naive(),
    };
    let style = learner_profile(&learner_id).challenge_style;
    let (progress, reset) = state.db.progress_for_day(&learner_id, &domain, today, style, Utc::now()).await?;
    Ok(Json(ProgressResponse {
        state: progress,
        reset,
        message: reset.then(|| style.missed_day_message().to_string()),
    }))
}

#[derive(Deserialize)]
struct CompleteRequest {
    date: Option<String>,
}

async fn complete_mission(
    State(state): State<ApiState>,
    Path((learner_id, domain)): Path<(String, String)>,
    Json(payload): Json<CompleteRequest>,
) -> ApiResult<XpStreakState> {
    let today = match payload.date {
        Some(raw) => parse_date(&raw)?,
        None => Utc::now().date_naive(),
    };
    Ok(Json(state.db.complete_mission(&learner_id, &domain, today, Utc::now()).await?))
}

async fn commit_challenge(
    State(state): State<ApiState>,
    Path((learner_id, domain)): Path<(String, String)>,
) -> ApiResult<XpStreakState> {
    Ok(Json(state.db.commit_challenge(&learner_id, &domain, Utc::now()).await?))
}

#[derive(Deserialize)]
struct StartSessionRequest {
    learner_id: String,
    domain: String,
}

#[derive(Debug, Serialize, Deserialize)]
pub struct StartSessionResponse {
    pub session_id: String,
}

async fn start_session(
    State(state): State<ApiState>,
    Json(payload): Json<StartSessionRequest>,
) -> ApiResult<StartSessionResponse> {
    let session_id = state.db.start_session(&payload.learner_id, &payload.domain, Utc::now()).await?;
    Ok(Json(StartSessionResponse { session_id }))
}

#[derive(Deserialize)]
struct EndSessionRequest {
    learner_id: String,
}

async fn end_session(
    State(state): State<ApiState>,
    Path(session_id): Path<String>,
    Json(payload): Json<EndSessionRequest>,
) -> ApiResult<serde_json::Value> {
    state.db.end_session(&payload.learner_id, &session_id, Utc::now()).await?;
    Ok(Json(serde_json::json!({ "ok": true })))
}

async fn parent_overview(
    State(state): State<ApiState>,
    Path(parent_id): Path<String>,
) -> ApiResult<Vec<ChildProgress>> {
    Ok(Json(state.db.parent_overview(&parent_id).await?))
}
