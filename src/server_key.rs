//! Server-wide secret mixed into every dynamic flag.
//!
//! Stored base64-encoded in the `configuration` table under [`SERVER_KEY`]
//! and generated on first use.

use anyhow::{anyhow, Context};
use base64ct::{Base64, Encoding};
use sqlx::PgPool;
use tracing::info;

use crate::crypto;

pub const SERVER_KEY: &str = "server_key";

async fn find_value(db: &PgPool, key: &str) -> sqlx::Result<Option<String>> {
    let row: Option<(String,)> =
        sqlx::query_as(r#"SELECT value FROM configuration WHERE key = $1"#)
            .bind(key)
            .fetch_optional(db)
            .await?;
    Ok(row.map(|(value,)| value))
}

pub fn decode(value: &str) -> anyhow::Result<Vec<u8>> {
    Base64::decode_vec(value).map_err(|e| anyhow!("decode server key: {e}"))
}

pub fn encode(key: &[u8]) -> String {
    Base64::encode_string(key)
}

/// Returns the server key, creating it when missing.
pub async fn get_or_create(db: &PgPool) -> anyhow::Result<Vec<u8>> {
    if let Some(value) = find_value(db, SERVER_KEY).await.context("load server key")? {
        return decode(&value);
    }

    info!("generating server key");
    sqlx::query(
        r#"
        INSERT INTO configuration (key, value)
        VALUES ($1, $2)
        ON CONFLICT (key) DO NOTHING
        "#,
    )
    .bind(SERVER_KEY)
    .bind(encode(&crypto::random_key()))
    .execute(db)
    .await
    .context("insert server key")?;

    // Re-read so concurrent creators agree on a single key.
    let value = find_value(db, SERVER_KEY)
        .await
        .context("reload server key")?
        .ok_or_else(|| anyhow!("server key missing after insert"))?;
    decode(&value)
}
