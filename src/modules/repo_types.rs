use serde::{Deserialize, Serialize};
use sqlx::FromRow;
use time::OffsetDateTime;
use uuid::Uuid;

/// A named training unit.
#[derive(Debug, Clone, Serialize, Deserialize, FromRow)]
#[serde(rename_all = "camelCase")]
pub struct Module {
    pub id: Uuid,
    pub name: String,
    #[serde(rename = "hasStaticFlag")]
    pub is_flag_static: bool,
    #[serde(skip_serializing)]
    pub static_flag: Option<String>,
    #[serde(skip)]
    pub module_key: Vec<u8>,
    pub is_open: bool,
    #[serde(with = "time::serde::rfc3339")]
    pub created_at: OffsetDateTime,
}

#[cfg(test)]
impl Module {
    pub fn dynamic(name: &str) -> Self {
        Self {
            id: Uuid::new_v4(),
            name: name.to_string(),
            is_flag_static: false,
            static_flag: None,
            module_key: crate::crypto::random_key(),
            is_open: true,
            created_at: OffsetDateTime::now_utc(),
        }
    }

    pub fn with_static_flag(mut self, flag: &str) -> Self {
        self.is_flag_static = true;
        self.static_flag = Some(flag.to_string());
        self
    }
}
