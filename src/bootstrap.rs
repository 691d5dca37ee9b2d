//! First-start seeding: the administrator account and the initial modules.
//!
//! Every step looks up before it inserts, so restarting against an already
//! seeded database changes nothing.

use async_trait::async_trait;
use sqlx::PgPool;
use tracing::{info, instrument, warn};
use uuid::Uuid;

use crate::{
    auth::password::is_valid_hash,
    config::AdminConfig,
    error::{AppError, AppResult},
    modules, scoring, users,
};

pub const SEED_MODULES: [&str; 3] = ["Sql Injection", "XSS", "Poor Data Validation"];

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct BootstrapReport {
    pub admin_id: Uuid,
    pub admin_created: bool,
    pub modules_created: usize,
}

/// Persistence used while seeding.
#[async_trait]
pub trait SeedStore: Send + Sync {
    async fn find_user_by_login_name(&self, login_name: &str) -> AppResult<Option<Uuid>>;
    async fn find_user_by_display_name(&self, display_name: &str) -> AppResult<Option<Uuid>>;
    async fn create_password_user(
        &self,
        display_name: &str,
        login_name: &str,
        hashed_password: &str,
    ) -> AppResult<Uuid>;
    async fn promote(&self, user_id: Uuid) -> AppResult<()>;
    /// Returns the module id and whether the module was created.
    async fn ensure_module(&self, name: &str) -> AppResult<(Uuid, bool)>;
    async fn ensure_module_points(&self, module_id: Uuid, rank: i32, points: i32) -> AppResult<bool>;
}

pub struct PgSeedStore {
    db: PgPool,
}

impl PgSeedStore {
    pub fn new(db: PgPool) -> Self {
        Self { db }
    }
}

#[async_trait]
impl SeedStore for PgSeedStore {
    async fn find_user_by_login_name(&self, login_name: &str) -> AppResult<Option<Uuid>> {
        users::services::find_id_by_login_name(&self.db, login_name).await
    }

    async fn find_user_by_display_name(&self, display_name: &str) -> AppResult<Option<Uuid>> {
        users::services::find_id_by_display_name(&self.db, display_name).await
    }

    async fn create_password_user(
        &self,
        display_name: &str,
        login_name: &str,
        hashed_password: &str,
    ) -> AppResult<Uuid> {
        users::services::create_password_user(&self.db, display_name, login_name, hashed_password).await
    }

    async fn promote(&self, user_id: Uuid) -> AppResult<()> {
        users::services::promote(&self.db, user_id).await
    }

    async fn ensure_module(&self, name: &str) -> AppResult<(Uuid, bool)> {
        let (module, created) = modules::services::ensure_module(&self.db, name).await?;
        Ok((module.id, created))
    }

    async fn ensure_module_points(&self, module_id: Uuid, rank: i32, points: i32) -> AppResult<bool> {
        scoring::services::ensure_module_point(&self.db, module_id, rank, points).await
    }
}

/// The admin is matched by login name first, then by display name. A match on
/// display name alone keeps that account's existing login and password.
async fn ensure_admin(store: &dyn SeedStore, admin: &AdminConfig) -> AppResult<(Uuid, bool)> {
    if let Some(id) = store.find_user_by_login_name(&admin.login_name).await? {
        return Ok((id, false));
    }
    if let Some(id) = store.find_user_by_display_name(&admin.display_name).await? {
        warn!(
            admin_id = %id,
            display_name = %admin.display_name,
            login_name = %admin.login_name,
            "admin display name is held by an account with another login; keeping that account"
        );
        return Ok((id, false));
    }
    let id = store
        .create_password_user(&admin.display_name, &admin.login_name, &admin.password_hash)
        .await?;
    Ok((id, true))
}

#[instrument(skip(store, admin), fields(login_name = %admin.login_name))]
pub async fn run(store: &dyn SeedStore, admin: &AdminConfig) -> AppResult<BootstrapReport> {
    if !is_valid_hash(&admin.password_hash) {
        return Err(AppError::InvalidInput(
            "Admin password hash is not a valid PHC string".into(),
        ));
    }

    let (admin_id, admin_created) = ensure_admin(store, admin).await?;
    store.promote(admin_id).await?;
    if admin_created {
        info!(%admin_id, "admin user created");
    }

    let mut modules_created = 0;
    for name in SEED_MODULES {
        let (module_id, created) = store.ensure_module(name).await?;
        store
            .ensure_module_points(module_id, 0, scoring::services::DEFAULT_BASE_POINTS)
            .await?;
        if created {
            modules_created += 1;
        }
    }

    info!(%admin_id, admin_created, modules_created, "bootstrap complete");
    Ok(BootstrapReport {
        admin_id,
        admin_created,
        modules_created,
    })
}
