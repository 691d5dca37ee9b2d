use sqlx::{PgPool, Postgres, Transaction};
use uuid::Uuid;

use super::repo_types::{PasswordAuth, User, UserAuth};

impl User {
    pub async fn find_by_id(db: &PgPool, id: Uuid) -> sqlx::Result<Option<User>> {
        sqlx::query_as::<_, User>(
            r#"
            SELECT id, display_name, email, is_not_banned, account_created, user_key
            FROM users
            WHERE id = $1
            "#,
        )
        .bind(id)
        .fetch_optional(db)
        .await
    }

    pub async fn list_not_banned(db: &PgPool) -> sqlx::Result<Vec<User>> {
        sqlx::query_as::<_, User>(
            r#"
            SELECT id, display_name, email, is_not_banned, account_created, user_key
            FROM users
            WHERE is_not_banned
            "#,
        )
        .fetch_all(db)
        .await
    }

    pub async fn find_id_by_display_name(db: &PgPool, display_name: &str) -> sqlx::Result<Option<Uuid>> {
        let row: Option<(Uuid,)> = sqlx::query_as(r#"SELECT id FROM users WHERE display_name = $1"#)
            .bind(display_name)
            .fetch_optional(db)
            .await?;
        Ok(row.map(|(id,)| id))
    }

    pub async fn find_key_by_id(db: &PgPool, id: Uuid) -> sqlx::Result<Option<Vec<u8>>> {
        let row: Option<(Vec<u8>,)> = sqlx::query_as(r#"SELECT user_key FROM users WHERE id = $1"#)
            .bind(id)
            .fetch_optional(db)
            .await?;
        Ok(row.map(|(key,)| key))
    }
}

/// Insert a user together with its auth rows within a transaction.
pub async fn insert_password_user_tx(
    tx: &mut Transaction<'_, Postgres>,
    display_name: &str,
    user_key: &[u8],
    login_name: &str,
    hashed_password: &str,
) -> sqlx::Result<Uuid> {
    let (user_id,): (Uuid,) = sqlx::query_as(
        r#"
        INSERT INTO users (display_name, user_key)
        VALUES ($1, $2)
        RETURNING id
        "#,
    )
    .bind(display_name)
    .bind(user_key)
    .fetch_one(&mut **tx)
    .await?;

    sqlx::query(r#"INSERT INTO user_auth (user_id) VALUES ($1)"#)
        .bind(user_id)
        .execute(&mut **tx)
        .await?;

    sqlx::query(
        r#"
        INSERT INTO password_auth (user_id, login_name, hashed_password)
        VALUES ($1, $2, $3)
        "#,
    )
    .bind(user_id)
    .bind(login_name)
    .bind(hashed_password)
    .execute(&mut **tx)
    .await?;

    Ok(user_id)
}

impl PasswordAuth {
    pub async fn find_by_login_name(db: &PgPool, login_name: &str) -> sqlx::Result<Option<PasswordAuth>> {
        sqlx::query_as::<_, PasswordAuth>(
            r#"
            SELECT user_id, login_name, hashed_password, is_password_non_expired
            FROM password_auth
            WHERE login_name = $1
            "#,
        )
        .bind(login_name)
        .fetch_optional(db)
        .await
    }

    pub async fn find_by_user_id(db: &PgPool, user_id: Uuid) -> sqlx::Result<Option<PasswordAuth>> {
        sqlx::query_as::<_, PasswordAuth>(
            r#"
            SELECT user_id, login_name, hashed_password, is_password_non_expired
            FROM password_auth
            WHERE user_id = $1
            "#,
        )
        .bind(user_id)
        .fetch_optional(db)
        .await
    }
}

impl UserAuth {
    pub async fn find_by_user_id(db: &PgPool, user_id: Uuid) -> sqlx::Result<Option<UserAuth>> {
        sqlx::query_as::<_, UserAuth>(
            r#"SELECT user_id, is_admin, is_enabled FROM user_auth WHERE user_id = $1"#,
        )
        .bind(user_id)
        .fetch_optional(db)
        .await
    }

    /// Returns `false` when the user has no auth row.
    pub async fn set_admin(db: &PgPool, user_id: Uuid, is_admin: bool) -> sqlx::Result<bool> {
        let result = sqlx::query(r#"UPDATE user_auth SET is_admin = $2 WHERE user_id = $1"#)
            .bind(user_id)
            .bind(is_admin)
            .execute(db)
            .await?;
        Ok(result.rows_affected() > 0)
    }
}
