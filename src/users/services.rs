use sqlx::PgPool;
use tracing::{info, instrument, warn};
use uuid::Uuid;

use super::repo::insert_password_user_tx;
use super::repo_types::{PasswordAuth, User, UserAuth};
use crate::{
    auth::{claims::Role, password::verify_password},
    crypto,
    error::{AppError, AppResult},
};

/// Every user holds `ROLE_USER`; admins additionally hold `ROLE_ADMIN`.
pub fn roles_for(user_auth: &UserAuth) -> Vec<Role> {
    let mut roles = vec![Role::User];
    if user_auth.is_admin {
        roles.push(Role::Admin);
    }
    roles
}

/// Banned or disabled accounts may not obtain tokens.
pub fn check_can_sign_in(user: &User, user_auth: &UserAuth) -> AppResult<()> {
    if !user.is_not_banned {
        return Err(AppError::Forbidden("Account is banned".into()));
    }
    if !user_auth.is_enabled {
        return Err(AppError::Forbidden("Account is disabled".into()));
    }
    Ok(())
}

fn require_non_blank(value: &str, what: &str) -> AppResult<()> {
    if value.trim().is_empty() {
        return Err(AppError::InvalidInput(format!("{what} cannot be empty")));
    }
    Ok(())
}

#[instrument(skip(db, hashed_password))]
pub async fn create_password_user(
    db: &PgPool,
    display_name: &str,
    login_name: &str,
    hashed_password: &str,
) -> AppResult<Uuid> {
    require_non_blank(display_name, "Display name")?;
    require_non_blank(login_name, "Login name")?;
    require_non_blank(hashed_password, "Password hash")?;

    if User::find_id_by_display_name(db, display_name).await?.is_some() {
        warn!(display_name, "display name already exists");
        return Err(AppError::Conflict(format!(
            "Display name {display_name} already exists"
        )));
    }
    if PasswordAuth::find_by_login_name(db, login_name).await?.is_some() {
        warn!(login_name, "login name already exists");
        return Err(AppError::Conflict(format!(
            "Login name {login_name} already exists"
        )));
    }

    let mut tx = db.begin().await?;
    let user_id = insert_password_user_tx(
        &mut tx,
        display_name,
        &crypto::random_key(),
        login_name,
        hashed_password,
    )
    .await?;
    tx.commit().await?;

    info!(%user_id, display_name, login_name, "password user created");
    Ok(user_id)
}

pub async fn find_id_by_login_name(db: &PgPool, login_name: &str) -> AppResult<Option<Uuid>> {
    Ok(PasswordAuth::find_by_login_name(db, login_name)
        .await?
        .map(|auth| auth.user_id))
}

pub async fn find_id_by_display_name(db: &PgPool, display_name: &str) -> AppResult<Option<Uuid>> {
    Ok(User::find_id_by_display_name(db, display_name).await?)
}

/// Returns the user id when the credentials match.
#[instrument(skip(db, password))]
pub async fn authenticate(db: &PgPool, login_name: &str, password: &str) -> AppResult<Option<Uuid>> {
    let Some(auth) = PasswordAuth::find_by_login_name(db, login_name).await? else {
        return Ok(None);
    };
    if verify_password(password, &auth.hashed_password)? {
        Ok(Some(auth.user_id))
    } else {
        Ok(None)
    }
}

pub async fn list_not_banned(db: &PgPool) -> AppResult<Vec<User>> {
    Ok(User::list_not_banned(db).await?)
}

pub async fn find_user_auth(db: &PgPool, user_id: Uuid) -> AppResult<UserAuth> {
    UserAuth::find_by_user_id(db, user_id)
        .await?
        .ok_or_else(|| AppError::NotFound(format!("User id {user_id} not found")))
}

pub async fn find_by_id(db: &PgPool, user_id: Uuid) -> AppResult<User> {
    User::find_by_id(db, user_id)
        .await?
        .ok_or_else(|| AppError::NotFound(format!("User id {user_id} not found")))
}

pub async fn find_key_by_id(db: &PgPool, user_id: Uuid) -> AppResult<Vec<u8>> {
    User::find_key_by_id(db, user_id)
        .await?
        .ok_or_else(|| AppError::NotFound(format!("User id {user_id} not found")))
}

pub async fn find_login_name(db: &PgPool, user_id: Uuid) -> AppResult<Option<String>> {
    Ok(PasswordAuth::find_by_user_id(db, user_id)
        .await?
        .map(|auth| auth.login_name))
}

pub async fn promote(db: &PgPool, user_id: Uuid) -> AppResult<()> {
    info!(%user_id, "promoting user to admin");
    if !UserAuth::set_admin(db, user_id, true).await? {
        return Err(AppError::NotFound(format!("User id {user_id} not found")));
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn plain_user_has_only_user_role() {
        let auth = UserAuth {
            user_id: Uuid::new_v4(),
            is_admin: false,
            is_enabled: true,
        };
        assert_eq!(roles_for(&auth), vec![Role::User]);
    }

    #[test]
    fn admin_has_user_and_admin_roles() {
        let auth = UserAuth {
            user_id: Uuid::new_v4(),
            is_admin: true,
            is_enabled: true,
        };
        assert_eq!(roles_for(&auth), vec![Role::User, Role::Admin]);
    }

    fn account(is_not_banned: bool, is_enabled: bool) -> (User, UserAuth) {
        let id = Uuid::new_v4();
        let user = User {
            id,
            display_name: "alice".into(),
            email: None,
            is_not_banned,
            account_created: time::OffsetDateTime::now_utc(),
            user_key: vec![0; 16],
        };
        let auth = UserAuth {
            user_id: id,
            is_admin: false,
            is_enabled,
        };
        (user, auth)
    }

    #[test]
    fn active_account_may_sign_in() {
        let (user, auth) = account(true, true);
        assert!(check_can_sign_in(&user, &auth).is_ok());
    }

    #[test]
    fn banned_account_is_refused() {
        let (user, auth) = account(false, true);
        let err = check_can_sign_in(&user, &auth).unwrap_err();
        assert!(matches!(err, AppError::Forbidden(msg) if msg.contains("banned")));
    }

    #[test]
    fn disabled_account_is_refused() {
        let (user, auth) = account(true, false);
        assert!(matches!(check_can_sign_in(&user, &auth), Err(AppError::Forbidden(_))));
    }

    #[test]
    fn blank_values_are_rejected() {
        assert!(require_non_blank("  ", "Display name").is_err());
        assert!(require_non_blank("Admin", "Display name").is_ok());
    }
}
