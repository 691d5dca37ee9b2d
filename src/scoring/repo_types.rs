use serde::{Deserialize, Serialize};
use sqlx::FromRow;
use time::OffsetDateTime;
use uuid::Uuid;

/// A flag submission. At most one valid submission exists per user and module.
#[derive(Debug, Clone, Serialize, Deserialize, FromRow)]
#[serde(rename_all = "camelCase")]
pub struct Submission {
    pub id: Uuid,
    pub user_id: Uuid,
    pub module_id: Uuid,
    #[serde(with = "time::serde::rfc3339")]
    pub time: OffsetDateTime,
    pub is_valid: bool,
    pub flag: Option<String>,
}

/// Points for solving a module. Rank 0 is the base score every solver gets,
/// rank n >= 1 is the bonus for the n-th solver.
#[derive(Debug, Clone, Serialize, Deserialize, FromRow)]
#[serde(rename_all = "camelCase")]
pub struct ModulePoint {
    pub module_id: Uuid,
    pub rank: i32,
    pub points: i32,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ScoreboardEntry {
    pub rank: i64,
    pub user_id: Uuid,
    pub display_name: String,
    pub score: i64,
    pub gold_medals: i64,
    pub silver_medals: i64,
    pub bronze_medals: i64,
}
