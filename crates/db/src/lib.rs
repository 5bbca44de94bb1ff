//! PostgreSQL persistence for the import pipeline.

pub mod config;
pub mod store;
pub mod users;

pub use config::{DbConfigError, DbEnv, DbProfile};
pub use store::PgStore;
