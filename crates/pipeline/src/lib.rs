//! Configuration import pipeline: record sources, the entity-kind catalog,
//! the upsert engine, and the step runner.
//!
//! Stages per step: load -> map -> validate -> resolve references ->
//! upsert -> report.

pub mod catalog;
pub mod engine;
pub mod error;
pub mod memory;
pub mod runner;
pub mod source;

pub use error::ImportError;
pub use memory::MemoryStore;
pub use runner::{Importer, Plan};
pub use source::{JsonSource, SourceError, Workbook};
