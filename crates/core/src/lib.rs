//! Pure import-pipeline logic: typed values, entity schemas, mapping,
//! validation, reference resolution, outcomes, and run statistics.
//!
//! Nothing in this crate performs I/O; persistence goes through the
//! [`store::ConfigStore`] trait.

pub mod credential;
pub mod error;
pub mod mapper;
pub mod outcome;
pub mod policy;
pub mod reference;
pub mod schema;
pub mod stats;
pub mod store;
pub mod types;
pub mod validation;
pub mod value;
