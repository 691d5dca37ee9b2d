use axum::{
    async_trait,
    extract::{FromRef, FromRequestParts},
    http::request::Parts,
};
use tracing::warn;
use uuid::Uuid;

use super::{
    claims::{Claims, Role, TokenKind},
    jwt::JwtKeys,
};
use crate::error::AppError;

/// Authenticated caller holding `ROLE_USER`.
///
/// Rejects with 401 when the bearer token is missing or invalid and with 403
/// when the role is absent, so handlers never run for such callers.
#[derive(Debug, Clone)]
pub struct AuthUser {
    pub user_id: Uuid,
    pub roles: Vec<Role>,
}

/// Authenticated caller holding `ROLE_ADMIN`.
#[derive(Debug, Clone)]
pub struct AdminUser {
    pub user_id: Uuid,
}

fn access_claims(parts: &Parts, keys: &JwtKeys) -> Result<Claims, AppError> {
    let auth = parts
        .headers
        .get(axum::http::header::AUTHORIZATION)
        .and_then(|h| h.to_str().ok())
        .ok_or_else(|| AppError::Unauthorized("Missing Authorization header".into()))?;

    // Expect "Bearer <token>"
    let token = auth
        .strip_prefix("Bearer ")
        .or_else(|| auth.strip_prefix("bearer "))
        .ok_or_else(|| AppError::Unauthorized("Invalid Authorization header".into()))?;

    let claims = keys.verify(token).map_err(|_| {
        warn!("invalid or expired token");
        AppError::Unauthorized("Invalid or expired token".into())
    })?;

    if claims.kind != TokenKind::Access {
        return Err(AppError::Unauthorized("Access token required".into()));
    }
    Ok(claims)
}

fn require_role(claims: &Claims, role: Role) -> Result<(), AppError> {
    if claims.has_role(role) {
        Ok(())
    } else {
        warn!(user_id = %claims.sub, role = role.as_str(), "missing role");
        Err(AppError::Forbidden(format!("{} required", role.as_str())))
    }
}

#[async_trait]
impl<S> FromRequestParts<S> for AuthUser
where
    S: Send + Sync,
    JwtKeys: FromRef<S>,
{
    type Rejection = AppError;

    async fn from_request_parts(parts: &mut Parts, state: &S) -> Result<Self, Self::Rejection> {
        let keys = JwtKeys::from_ref(state);
        let claims = access_claims(parts, &keys)?;
        require_role(&claims, Role::User)?;
        Ok(AuthUser {
            user_id: claims.sub,
            roles: claims.roles,
        })
    }
}

#[async_trait]
impl<S> FromRequestParts<S> for AdminUser
where
    S: Send + Sync,
    JwtKeys: FromRef<S>,
{
    type Rejection = AppError;

    async fn from_request_parts(parts: &mut Parts, state: &S) -> Result<Self, Self::Rejection> {
        let keys = JwtKeys::from_ref(state);
        let claims = access_claims(parts, &keys)?;
        require_role(&claims, Role::Admin)?;
        Ok(AdminUser {
            user_id: claims.sub,
        })
    }
}
