pub mod board;
pub mod dto;
pub mod handlers;
pub mod repo;
pub mod repo_types;
pub mod services;
pub mod store;

use crate::state::AppState;
use axum::Router;

pub use store::{PgSubmissionStore, SubmissionStore};

pub fn router() -> Router<AppState> {
    Router::new().merge(handlers::scoring_routes())
}
