use axum::{
    extract::{FromRef, State},
    routing::get,
    Json, Router,
};
use serde::Serialize;
use tracing::{info, instrument};
use uuid::Uuid;

use crate::{
    auth::extractors::AuthUser,
    error::AppResult,
    flags::FlagHandler,
    state::AppState,
};

pub const MODULE_NAME: &str = "Flag Tutorial";

/// The introductory module: its only task is fetching your own flag.
pub struct FlagTutorial {
    flags: FlagHandler,
}

#[derive(Debug, Serialize)]
pub struct FlagTutorialResult {
    pub flag: String,
}

impl FlagTutorial {
    pub fn new(flags: FlagHandler) -> Self {
        Self { flags }
    }

    /// The module row is created on first use.
    pub async fn get_flag(&self, user_id: Uuid) -> AppResult<String> {
        let module = self.flags.store().ensure_module(MODULE_NAME).await?;
        self.flags.get_flag_for(user_id, &module).await
    }
}

pub fn flag_tutorial_routes() -> Router<AppState> {
    Router::new().route("/module/flag-tutorial/", get(get_flag))
}

#[instrument(skip(state, user), fields(user_id = %user.user_id))]
pub async fn get_flag(
    State(state): State<AppState>,
    user: AuthUser,
) -> AppResult<Json<FlagTutorialResult>> {
    let tutorial = FlagTutorial::new(FlagHandler::from_ref(&state));
    let flag = tutorial.get_flag(user.user_id).await?;
    info!("flag tutorial flag issued");
    Ok(Json(FlagTutorialResult { flag }))
}

#[cfg(test)]
mod tests {
    use std::sync::Arc;

    use axum::{
        body::{to_bytes, Body},
        http::{header::AUTHORIZATION, Request, StatusCode},
    };
    use tower::ServiceExt;

    use super::*;
    use crate::{
        auth::{claims::Role, jwt::JwtKeys},
        flags::store::MemoryFlagStore,
    };

    const URI: &str = "/api/v1/module/flag-tutorial/";

    fn request(token: Option<String>) -> Request<Body> {
        let mut builder = Request::builder().uri(URI);
        if let Some(token) = token {
            builder = builder.header(AUTHORIZATION, format!("Bearer {token}"));
        }
        builder.body(Body::empty()).unwrap()
    }

    async fn body_json(res: axum::response::Response) -> serde_json::Value {
        let bytes = to_bytes(res.into_body(), usize::MAX).await.unwrap();
        serde_json::from_slice(&bytes).unwrap()
    }

    #[tokio::test]
    async fn user_gets_non_null_flag() {
        let store = Arc::new(MemoryFlagStore::new());
        let user_id = store.add_user();
        let state = AppState::fake_with(store.clone());
        let token = JwtKeys::from_ref(&state).sign_access(user_id, &[Role::User]).unwrap();

        let res = crate::app::build_app(state).oneshot(request(Some(token))).await.unwrap();

        assert_eq!(res.status(), StatusCode::OK);
        let body = body_json(res).await;
        let flag = body["flag"].as_str().expect("flag present");
        assert!(flag.starts_with("flag{"));
        assert_eq!(store.module_count(), 1);
    }

    #[tokio::test]
    async fn same_user_gets_same_flag_twice() {
        let store = Arc::new(MemoryFlagStore::new());
        let user_id = store.add_user();
        let tutorial = FlagTutorial::new(FlagHandler::new(store));

        let first = tutorial.get_flag(user_id).await.unwrap();
        let second = tutorial.get_flag(user_id).await.unwrap();
        assert_eq!(first, second);
    }

    #[tokio::test]
    async fn missing_token_is_rejected() {
        let res = crate::app::build_app(AppState::fake())
            .oneshot(request(None))
            .await
            .unwrap();
        assert_eq!(res.status(), StatusCode::UNAUTHORIZED);
    }

    #[tokio::test]
    async fn token_without_user_role_is_forbidden_before_handler() {
        let store = Arc::new(MemoryFlagStore::new());
        let user_id = store.add_user();
        let state = AppState::fake_with(store.clone());
        let token = JwtKeys::from_ref(&state).sign_access(user_id, &[]).unwrap();

        let res = crate::app::build_app(state).oneshot(request(Some(token))).await.unwrap();

        assert_eq!(res.status(), StatusCode::FORBIDDEN);
        // The handler never ran, so the tutorial module was not created.
        assert_eq!(store.module_count(), 0);
    }

    #[tokio::test]
    async fn unresolvable_user_is_a_failure_not_a_null_flag() {
        let state = AppState::fake();
        let token = JwtKeys::from_ref(&state)
            .sign_access(Uuid::new_v4(), &[Role::User])
            .unwrap();

        let res = crate::app::build_app(state).oneshot(request(Some(token))).await.unwrap();

        assert_eq!(res.status(), StatusCode::NOT_FOUND);
        let body = body_json(res).await;
        assert!(body.get("flag").is_none());
        assert_eq!(body["error"], "not_found");
    }
}
