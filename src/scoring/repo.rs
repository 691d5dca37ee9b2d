use std::collections::HashSet;

use sqlx::PgPool;
use uuid::Uuid;

use super::repo_types::{ModulePoint, Submission};

pub async fn insert_submission(
    db: &PgPool,
    user_id: Uuid,
    module_id: Uuid,
    is_valid: bool,
    flag: &str,
) -> sqlx::Result<Submission> {
    sqlx::query_as::<_, Submission>(
        r#"
        INSERT INTO submissions (user_id, module_id, is_valid, flag)
        VALUES ($1, $2, $3, $4)
        RETURNING id, user_id, module_id, time, is_valid, flag
        "#,
    )
    .bind(user_id)
    .bind(module_id)
    .bind(is_valid)
    .bind(flag)
    .fetch_one(db)
    .await
}

pub async fn find_valid_by_user_and_module(
    db: &PgPool,
    user_id: Uuid,
    module_id: Uuid,
) -> sqlx::Result<Option<Submission>> {
    sqlx::query_as::<_, Submission>(
        r#"
        SELECT id, user_id, module_id, time, is_valid, flag
          FROM submissions
         WHERE user_id = $1 AND module_id = $2 AND is_valid
        "#,
    )
    .bind(user_id)
    .bind(module_id)
    .fetch_optional(db)
    .await
}

pub async fn list_valid_by_user(db: &PgPool, user_id: Uuid) -> sqlx::Result<Vec<Submission>> {
    sqlx::query_as::<_, Submission>(
        r#"
        SELECT id, user_id, module_id, time, is_valid, flag
          FROM submissions
         WHERE user_id = $1 AND is_valid
         ORDER BY time ASC
        "#,
    )
    .bind(user_id)
    .fetch_all(db)
    .await
}

pub async fn valid_module_ids_by_user(db: &PgPool, user_id: Uuid) -> sqlx::Result<HashSet<Uuid>> {
    let rows: Vec<(Uuid,)> =
        sqlx::query_as(r#"SELECT module_id FROM submissions WHERE user_id = $1 AND is_valid"#)
            .bind(user_id)
            .fetch_all(db)
            .await?;
    Ok(rows.into_iter().map(|(id,)| id).collect())
}

pub async fn upsert_module_point(
    db: &PgPool,
    module_id: Uuid,
    rank: i32,
    points: i32,
) -> sqlx::Result<ModulePoint> {
    sqlx::query_as::<_, ModulePoint>(
        r#"
        INSERT INTO module_points (module_id, rank, points)
        VALUES ($1, $2, $3)
        ON CONFLICT (module_id, rank) DO UPDATE SET points = EXCLUDED.points
        RETURNING module_id, rank, points
        "#,
    )
    .bind(module_id)
    .bind(rank)
    .bind(points)
    .fetch_one(db)
    .await
}

/// Returns `true` when a row was inserted.
pub async fn insert_module_point_if_absent(
    db: &PgPool,
    module_id: Uuid,
    rank: i32,
    points: i32,
) -> sqlx::Result<bool> {
    let result = sqlx::query(
        r#"
        INSERT INTO module_points (module_id, rank, points)
        VALUES ($1, $2, $3)
        ON CONFLICT (module_id, rank) DO NOTHING
        "#,
    )
    .bind(module_id)
    .bind(rank)
    .bind(points)
    .execute(db)
    .await?;
    Ok(result.rows_affected() > 0)
}

/// Every valid submission, oldest first.
pub async fn list_valid(db: &PgPool) -> sqlx::Result<Vec<Submission>> {
    sqlx::query_as::<_, Submission>(
        r#"
        SELECT id, user_id, module_id, time, is_valid, flag
          FROM submissions
         WHERE is_valid
         ORDER BY time ASC, id ASC
        "#,
    )
    .fetch_all(db)
    .await
}

pub async fn list_module_points(db: &PgPool) -> sqlx::Result<Vec<ModulePoint>> {
    sqlx::query_as::<_, ModulePoint>(r#"SELECT module_id, rank, points FROM module_points"#)
        .fetch_all(db)
        .await
}
