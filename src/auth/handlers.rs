use axum::{
    extract::State,
    http::StatusCode,
    routing::{get, post},
    Json, Router,
};
use tracing::{info, instrument, warn};
use uuid::Uuid;

use super::{
    claims::Role,
    dto::{AuthResponse, LoginRequest, PublicUser, RefreshRequest, RegisterRequest, RegisterResponse},
    extractors::AuthUser,
    jwt::JwtKeys,
    password::hash_password,
};
use crate::{
    error::{AppError, AppResult},
    state::AppState,
    users,
    web::JsonBody,
};

pub fn auth_routes() -> Router<AppState> {
    Router::new()
        .route("/register", post(register))
        .route("/login", post(login))
        .route("/auth/refresh", post(refresh))
}

pub fn me_routes() -> Router<AppState> {
    Router::new().route("/me", get(get_me))
}

async fn public_user(state: &AppState, user_id: Uuid, roles: Vec<Role>) -> AppResult<PublicUser> {
    let user = users::services::find_by_id(&state.db, user_id).await?;
    let login_name = users::services::find_login_name(&state.db, user_id).await?;
    Ok(PublicUser {
        id: user.id,
        display_name: user.display_name,
        login_name,
        roles,
    })
}

/// Loads the current roles and signs a fresh token pair.
async fn issue_tokens(state: &AppState, keys: &JwtKeys, user_id: Uuid) -> AppResult<AuthResponse> {
    let user = users::services::find_by_id(&state.db, user_id).await?;
    let user_auth = users::services::find_user_auth(&state.db, user_id).await?;
    if let Err(e) = users::services::check_can_sign_in(&user, &user_auth) {
        warn!(%user_id, error = %e, "sign-in refused");
        return Err(e);
    }
    let roles = users::services::roles_for(&user_auth);
    let access_token = keys.sign_access(user_id, &roles)?;
    let refresh_token = keys.sign_refresh(user_id)?;
    let login_name = users::services::find_login_name(&state.db, user_id).await?;
    Ok(AuthResponse {
        access_token,
        refresh_token,
        user: PublicUser {
            id: user.id,
            display_name: user.display_name,
            login_name,
            roles,
        },
    })
}

#[instrument(skip(state, payload), fields(user_name = %payload.user_name))]
pub async fn register(
    State(state): State<AppState>,
    JsonBody(payload): JsonBody<RegisterRequest>,
) -> AppResult<(StatusCode, Json<RegisterResponse>)> {
    let errors = payload.validate();
    if !errors.is_empty() {
        warn!(count = errors.len(), "registration rejected");
        return Err(AppError::Validation(errors));
    }

    let hash = hash_password(&payload.password)?;
    let id = users::services::create_password_user(
        &state.db,
        payload.display_name.trim(),
        &payload.user_name,
        &hash,
    )
    .await?;

    info!(user_id = %id, "user registered");
    Ok((StatusCode::CREATED, Json(RegisterResponse { id })))
}

#[instrument(skip(state, keys, payload), fields(user_name = %payload.user_name))]
pub async fn login(
    State(state): State<AppState>,
    State(keys): State<JwtKeys>,
    JsonBody(payload): JsonBody<LoginRequest>,
) -> AppResult<Json<AuthResponse>> {
    let Some(user_id) =
        users::services::authenticate(&state.db, &payload.user_name, &payload.password).await?
    else {
        warn!("login with invalid credentials");
        return Err(AppError::Unauthorized("Invalid credentials".into()));
    };

    let response = issue_tokens(&state, &keys, user_id).await?;
    info!(%user_id, "user logged in");
    Ok(Json(response))
}

#[instrument(skip(state, keys, payload))]
pub async fn refresh(
    State(state): State<AppState>,
    State(keys): State<JwtKeys>,
    JsonBody(payload): JsonBody<RefreshRequest>,
) -> AppResult<Json<AuthResponse>> {
    let claims = keys.verify_refresh(&payload.refresh_token).map_err(|e| {
        warn!(error = %e, "refresh rejected");
        AppError::Unauthorized("Invalid or expired refresh token".into())
    })?;

    // A refresh token may outlive its user.
    let response = issue_tokens(&state, &keys, claims.sub)
        .await
        .map_err(|e| match e {
            AppError::NotFound(_) => AppError::Unauthorized("User not found".into()),
            other => other,
        })?;
    Ok(Json(response))
}

#[instrument(skip(state, user), fields(user_id = %user.user_id))]
pub async fn get_me(State(state): State<AppState>, user: AuthUser) -> AppResult<Json<PublicUser>> {
    Ok(Json(public_user(&state, user.user_id, user.roles).await?))
}

#[cfg(test)]
mod tests {
    use axum::{
        body::Body,
        http::{header::CONTENT_TYPE, Request},
    };
    use tower::ServiceExt;

    use crate::{app::build_app, state::AppState, web::GenericResponse};

    #[tokio::test]
    async fn invalid_registration_returns_validation_response() {
        let app = build_app(AppState::fake());
        let body = r#"{"displayName":"Alice","userName":"al","password":"correct-horse"}"#;
        let response = app
            .oneshot(
                Request::post("/api/v1/register")
                    .header(CONTENT_TYPE, "application/json")
                    .body(Body::from(body))
                    .unwrap(),
            )
            .await
            .unwrap();

        assert_eq!(response.status(), axum::http::StatusCode::BAD_REQUEST);
        let bytes = axum::body::to_bytes(response.into_body(), usize::MAX).await.unwrap();
        let json: serde_json::Value = serde_json::from_slice(&bytes).unwrap();
        assert_eq!(json["error"], "validation_failed");
        let message = json["message"].as_str().unwrap();
        assert!(message.starts_with("[{\"field\":\"userName\""), "{message}");
    }

    #[tokio::test]
    async fn registration_missing_fields_gets_a_generic_response() {
        let app = build_app(AppState::fake());
        let response = app
            .oneshot(
                Request::post("/api/v1/register")
                    .header(CONTENT_TYPE, "application/json")
                    .body(Body::from(r#"{"displayName":"A"}"#))
                    .unwrap(),
            )
            .await
            .unwrap();

        assert_eq!(response.status(), axum::http::StatusCode::BAD_REQUEST);
        assert!(response.headers()[CONTENT_TYPE]
            .to_str()
            .unwrap()
            .starts_with("application/json"));
        let bytes = axum::body::to_bytes(response.into_body(), usize::MAX).await.unwrap();
        let body: GenericResponse = serde_json::from_slice(&bytes).unwrap();
        assert_eq!(body.error.as_deref(), Some("invalid_input"));
        assert!(body.message.contains("userName"), "{}", body.message);
    }

    #[tokio::test]
    async fn refresh_with_garbage_token_is_unauthorized() {
        let app = build_app(AppState::fake());
        let response = app
            .oneshot(
                Request::post("/api/v1/auth/refresh")
                    .header(CONTENT_TYPE, "application/json")
                    .body(Body::from(r#"{"refreshToken":"nope"}"#))
                    .unwrap(),
            )
            .await
            .unwrap();
        assert_eq!(response.status(), axum::http::StatusCode::UNAUTHORIZED);
    }

    #[tokio::test]
    async fn me_requires_a_token() {
        let app = build_app(AppState::fake());
        let response = app
            .oneshot(Request::get("/api/v1/me").body(Body::empty()).unwrap())
            .await
            .unwrap();
        assert_eq!(response.status(), axum::http::StatusCode::UNAUTHORIZED);
    }
}
