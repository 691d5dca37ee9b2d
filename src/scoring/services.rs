use sqlx::PgPool;
use tracing::{info, instrument, warn};
use uuid::Uuid;

use super::{
    board::{self, Competitor},
    repo,
    repo_types::{ModulePoint, ScoreboardEntry, Submission},
    store::SubmissionStore,
};
use crate::{
    error::{AppError, AppResult},
    flags::FlagHandler,
    modules, users,
};

/// Points for a rank-0 solve when nothing else is configured.
pub const DEFAULT_BASE_POINTS: i32 = 100;

pub fn validate_module_point(rank: i32, points: i32) -> AppResult<()> {
    if rank < 0 {
        return Err(AppError::InvalidInput(
            "Rank must be zero or a positive integer".into(),
        ));
    }
    if points < 0 {
        return Err(AppError::InvalidInput("Points cannot be negative".into()));
    }
    Ok(())
}

/// Records a submission, valid or not. Fails with `Conflict` once the user has
/// solved the module.
#[instrument(skip(flags, submissions, flag))]
pub async fn submit(
    flags: &FlagHandler,
    submissions: &dyn SubmissionStore,
    user_id: Uuid,
    module_name: &str,
    flag: &str,
) -> AppResult<Submission> {
    let module = flags
        .store()
        .find_module(module_name)
        .await?
        .ok_or_else(|| AppError::NotFound(format!("Module {module_name} not found")))?;

    if submissions.find_valid(user_id, module.id).await?.is_some() {
        warn!(%user_id, module = module_name, "module already solved");
        return Err(AppError::Conflict(format!(
            "User {user_id} has already finished module {module_name}"
        )));
    }

    let is_valid = flags.verify_flag_for(user_id, &module, flag).await?;
    let submission = submissions.insert(user_id, module.id, is_valid, flag).await?;
    info!(%user_id, module = module_name, is_valid, "submission recorded");
    Ok(submission)
}

pub async fn valid_submissions(db: &PgPool, user_id: Uuid) -> AppResult<Vec<Submission>> {
    Ok(repo::list_valid_by_user(db, user_id).await?)
}

pub async fn set_module_point(
    db: &PgPool,
    module_name: &str,
    rank: i32,
    points: i32,
) -> AppResult<ModulePoint> {
    validate_module_point(rank, points)?;
    let module = modules::services::require_by_name(db, module_name).await?;
    Ok(repo::upsert_module_point(db, module.id, rank, points).await?)
}

/// Leaves an existing score untouched. Returns `true` when a row was added.
pub async fn ensure_module_point(db: &PgPool, module_id: Uuid, rank: i32, points: i32) -> AppResult<bool> {
    validate_module_point(rank, points)?;
    Ok(repo::insert_module_point_if_absent(db, module_id, rank, points).await?)
}

/// Banned users are left off the board.
pub async fn scoreboard(db: &PgPool) -> AppResult<Vec<ScoreboardEntry>> {
    let competitors = users::services::list_not_banned(db)
        .await?
        .into_iter()
        .map(|user| Competitor {
            user_id: user.id,
            display_name: user.display_name,
        })
        .collect();
    let submissions = repo::list_valid(db).await?;
    let points = repo::list_module_points(db).await?;
    Ok(board::build_scoreboard(competitors, &submissions, &points))
}
