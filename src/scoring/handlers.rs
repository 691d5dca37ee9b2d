use axum::{
    extract::{rejection::StringRejection, State},
    http::StatusCode,
    routing::{get, post, put},
    Json, Router,
};
use tracing::{info, instrument};
use uuid::Uuid;

use super::{
    dto::ModulePointRequest,
    repo_types::{ModulePoint, ScoreboardEntry, Submission},
    services,
};
use crate::{
    auth::extractors::{AdminUser, AuthUser},
    error::AppResult,
    flags::FlagHandler,
    state::AppState,
    web::{JsonBody, PathParam},
};

pub fn scoring_routes() -> Router<AppState> {
    Router::new()
        .route("/flag/submit/:name", post(submit_flag))
        .route("/scoreboard", get(get_scoreboard))
        .route("/scoreboard/:user_id", get(get_user_submissions))
        .route("/admin/module/:name/points", put(set_module_points))
}

/// The request body is the raw flag text.
#[instrument(skip(state, flags, flag))]
pub async fn submit_flag(
    State(state): State<AppState>,
    State(flags): State<FlagHandler>,
    AuthUser { user_id, .. }: AuthUser,
    PathParam(name): PathParam<String>,
    flag: Result<String, StringRejection>,
) -> AppResult<(StatusCode, Json<Submission>)> {
    let flag = flag?;
    let submission =
        services::submit(&flags, state.submissions.as_ref(), user_id, &name, &flag).await?;
    Ok((StatusCode::CREATED, Json(submission)))
}

#[instrument(skip(state))]
pub async fn get_scoreboard(
    State(state): State<AppState>,
    _user: AuthUser,
) -> AppResult<Json<Vec<ScoreboardEntry>>> {
    Ok(Json(services::scoreboard(&state.db).await?))
}

#[instrument(skip(state))]
pub async fn get_user_submissions(
    State(state): State<AppState>,
    _user: AuthUser,
    PathParam(user_id): PathParam<Uuid>,
) -> AppResult<Json<Vec<Submission>>> {
    Ok(Json(services::valid_submissions(&state.db, user_id).await?))
}

#[instrument(skip(state))]
pub async fn set_module_points(
    State(state): State<AppState>,
    AdminUser { user_id }: AdminUser,
    PathParam(name): PathParam<String>,
    JsonBody(body): JsonBody<ModulePointRequest>,
) -> AppResult<Json<ModulePoint>> {
    let point = services::set_module_point(&state.db, &name, body.rank, body.points).await?;
    info!(admin_id = %user_id, module = %name, rank = point.rank, points = point.points, "module points set");
    Ok(Json(point))
}
