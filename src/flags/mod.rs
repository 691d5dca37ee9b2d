pub mod handler;
pub mod store;

pub use handler::FlagHandler;
pub use store::{FlagStore, PgFlagStore};
