pub mod dto;
pub mod handlers;
pub mod repo;
pub mod repo_types;
pub mod services;

use crate::state::AppState;
use axum::Router;

pub use repo_types::Module;

pub fn router() -> Router<AppState> {
    Router::new().merge(handlers::module_routes())
}
