use sqlx::PgPool;
use uuid::Uuid;

use super::repo_types::Module;

const MODULE_COLUMNS: &str =
    "id, name, is_flag_static, static_flag, module_key, is_open, created_at";

pub async fn find_by_name(db: &PgPool, name: &str) -> sqlx::Result<Option<Module>> {
    sqlx::query_as::<_, Module>(&format!(
        "SELECT {MODULE_COLUMNS} FROM modules WHERE name = $1"
    ))
    .bind(name)
    .fetch_optional(db)
    .await
}

pub async fn list_open(db: &PgPool) -> sqlx::Result<Vec<Module>> {
    sqlx::query_as::<_, Module>(&format!(
        "SELECT {MODULE_COLUMNS} FROM modules WHERE is_open ORDER BY created_at ASC, name ASC"
    ))
    .fetch_all(db)
    .await
}

/// Inserts the module unless the name is taken. `None` means it already existed.
pub async fn insert_if_absent(db: &PgPool, name: &str, module_key: &[u8]) -> sqlx::Result<Option<Module>> {
    sqlx::query_as::<_, Module>(&format!(
        r#"
        INSERT INTO modules (name, module_key)
        VALUES ($1, $2)
        ON CONFLICT (name) DO NOTHING
        RETURNING {MODULE_COLUMNS}
        "#
    ))
    .bind(name)
    .bind(module_key)
    .fetch_optional(db)
    .await
}

pub async fn set_flag(
    db: &PgPool,
    id: Uuid,
    is_flag_static: bool,
    static_flag: Option<&str>,
) -> sqlx::Result<Module> {
    sqlx::query_as::<_, Module>(&format!(
        r#"
        UPDATE modules
           SET is_flag_static = $2, static_flag = $3
         WHERE id = $1
        RETURNING {MODULE_COLUMNS}
        "#
    ))
    .bind(id)
    .bind(is_flag_static)
    .bind(static_flag)
    .fetch_one(db)
    .await
}
