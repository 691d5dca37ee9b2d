pub mod flag_tutorial;

use crate::state::AppState;
use axum::Router;

pub fn router() -> Router<AppState> {
    Router::new().merge(flag_tutorial::flag_tutorial_routes())
}
