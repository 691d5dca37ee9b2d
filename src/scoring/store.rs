use async_trait::async_trait;
use sqlx::PgPool;
use uuid::Uuid;

use super::{repo, repo_types::Submission};
use crate::error::AppResult;

/// Persistence for flag submissions.
#[async_trait]
pub trait SubmissionStore: Send + Sync {
    async fn find_valid(&self, user_id: Uuid, module_id: Uuid) -> AppResult<Option<Submission>>;
    /// A second valid submission for the same user and module is a `Conflict`.
    async fn insert(&self, user_id: Uuid, module_id: Uuid, is_valid: bool, flag: &str) -> AppResult<Submission>;
}

#[derive(Clone)]
pub struct PgSubmissionStore {
    db: PgPool,
}

impl PgSubmissionStore {
    pub fn new(db: PgPool) -> Self {
        Self { db }
    }
}

#[async_trait]
impl SubmissionStore for PgSubmissionStore {
    async fn find_valid(&self, user_id: Uuid, module_id: Uuid) -> AppResult<Option<Submission>> {
        Ok(repo::find_valid_by_user_and_module(&self.db, user_id, module_id).await?)
    }

    // The partial unique index on valid submissions surfaces as 23505, i.e. Conflict.
    async fn insert(&self, user_id: Uuid, module_id: Uuid, is_valid: bool, flag: &str) -> AppResult<Submission> {
        Ok(repo::insert_submission(&self.db, user_id, module_id, is_valid, flag).await?)
    }
}

#[cfg(test)]
pub use memory::MemorySubmissionStore;
