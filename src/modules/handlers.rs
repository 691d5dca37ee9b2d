use axum::{
    extract::State,
    routing::{get, put},
    Json, Router,
};
use tracing::{info, instrument};

use super::{
    dto::{ModuleListItem, SetFlagRequest},
    repo_types::Module,
    services,
};
use crate::{
    auth::extractors::{AdminUser, AuthUser},
    error::AppResult,
    state::AppState,
    web::{JsonBody, PathParam},
};

pub fn module_routes() -> Router<AppState> {
    Router::new()
        .route("/modules", get(list_modules))
        .route("/module/by-name/:name", get(get_module_by_name))
        .route("/admin/module/:name/flag", put(set_module_flag))
}

#[instrument(skip(state))]
pub async fn list_modules(
    State(state): State<AppState>,
    AuthUser { user_id, .. }: AuthUser,
) -> AppResult<Json<Vec<ModuleListItem>>> {
    Ok(Json(services::list_open_with_status(&state.db, user_id).await?))
}

#[instrument(skip(state))]
pub async fn get_module_by_name(
    State(state): State<AppState>,
    AuthUser { user_id, .. }: AuthUser,
    PathParam(name): PathParam<String>,
) -> AppResult<Json<ModuleListItem>> {
    Ok(Json(services::find_open_with_status(&state.db, user_id, &name).await?))
}

#[instrument(skip(state, body))]
pub async fn set_module_flag(
    State(state): State<AppState>,
    AdminUser { user_id }: AdminUser,
    PathParam(name): PathParam<String>,
    JsonBody(body): JsonBody<SetFlagRequest>,
) -> AppResult<Json<Module>> {
    let module = match body.static_flag {
        Some(flag) => services::set_static_flag(&state.db, &name, &flag).await?,
        None => services::set_dynamic_flag(&state.db, &name).await?,
    };
    info!(admin_id = %user_id, module = %module.name, is_static = module.is_flag_static, "module flag updated");
    Ok(Json(module))
}
