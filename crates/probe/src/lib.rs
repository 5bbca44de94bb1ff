//! HTTP probe harness for the game admin API.
//!
//! A [`Harness`] logs in, runs a fixed ordered list of endpoint suites one
//! request at a time, and produces a [`ProbeRun`] for the console and JSON
//! reports in [`report`].

pub mod client;
pub mod config;
pub mod error;
pub mod harness;
pub mod model;
pub mod report;

pub use config::ProbeConfig;
pub use error::ProbeError;
pub use harness::{Harness, HarnessState, ProbeRun};
pub use model::{ProbeCase, ProbeStatus, ProbeSuite};
