//! Errors of the probe harness outside individual probes.
//!
//! A failing probe is a [`ProbeStatus::Failed`](crate::model::ProbeStatus)
//! case, never an error; these cover setup and report output only.

#[derive(Debug, thiserror::Error)]
pub enum ProbeError {
    #[error("Invalid probe configuration: {0}")]
    InvalidConfig(#[from] validator::ValidationErrors),

    /// The HTTP client could not be constructed.
    #[error("HTTP client error: {0}")]
    Client(#[from] reqwest::Error),

    #[error("Report output failed: {0}")]
    Io(#[from] std::io::Error),

    #[error("Report serialization failed: {0}")]
    Json(#[from] serde_json::Error),
}
