use std::collections::HashSet;

use sqlx::PgPool;
use tracing::{info, instrument};
use uuid::Uuid;

use super::{dto::ModuleListItem, repo, repo_types::Module};
use crate::{
    crypto,
    error::{AppError, AppResult},
    scoring,
};

pub async fn find_by_name(db: &PgPool, name: &str) -> AppResult<Option<Module>> {
    Ok(repo::find_by_name(db, name).await?)
}

pub async fn require_by_name(db: &PgPool, name: &str) -> AppResult<Module> {
    find_by_name(db, name)
        .await?
        .ok_or_else(|| AppError::NotFound(format!("Module {name} not found")))
}

/// Find the module by name, creating it with a fresh key iff absent.
/// Returns the module and whether it was created.
#[instrument(skip(db))]
pub async fn ensure_module(db: &PgPool, name: &str) -> AppResult<(Module, bool)> {
    if name.trim().is_empty() {
        return Err(AppError::InvalidInput("Module name cannot be empty".into()));
    }
    if let Some(existing) = repo::find_by_name(db, name).await? {
        return Ok((existing, false));
    }
    match repo::insert_if_absent(db, name, &crypto::random_key()).await? {
        Some(created) => {
            info!(module_id = %created.id, name, "module created");
            Ok((created, true))
        }
        // Lost a race with a concurrent creator.
        None => Ok((require_by_name(db, name).await?, false)),
    }
}

pub async fn set_static_flag(db: &PgPool, name: &str, static_flag: &str) -> AppResult<Module> {
    if static_flag.is_empty() {
        return Err(AppError::InvalidInput("Flag cannot be empty".into()));
    }
    let module = require_by_name(db, name).await?;
    info!(module_id = %module.id, "setting static flag");
    Ok(repo::set_flag(db, module.id, true, Some(static_flag)).await?)
}

pub async fn set_dynamic_flag(db: &PgPool, name: &str) -> AppResult<Module> {
    let module = require_by_name(db, name).await?;
    info!(module_id = %module.id, "setting dynamic flag");
    Ok(repo::set_flag(db, module.id, false, None).await?)
}

pub fn with_solution_status(modules: Vec<Module>, solved: &HashSet<Uuid>) -> Vec<ModuleListItem> {
    modules
        .into_iter()
        .map(|m| ModuleListItem {
            is_solved: solved.contains(&m.id),
            id: m.id,
            name: m.name,
        })
        .collect()
}

pub async fn list_open_with_status(db: &PgPool, user_id: Uuid) -> AppResult<Vec<ModuleListItem>> {
    let solved = scoring::repo::valid_module_ids_by_user(db, user_id).await?;
    let modules = repo::list_open(db).await?;
    Ok(with_solution_status(modules, &solved))
}

pub async fn find_open_with_status(db: &PgPool, user_id: Uuid, name: &str) -> AppResult<ModuleListItem> {
    let module = find_by_name(db, name)
        .await?
        .filter(|m| m.is_open)
        .ok_or_else(|| AppError::NotFound(format!("Module {name} not found")))?;
    let solved = scoring::repo::valid_module_ids_by_user(db, user_id).await?;
    Ok(ModuleListItem {
        is_solved: solved.contains(&module.id),
        id: module.id,
        name: module.name,
    })
}
