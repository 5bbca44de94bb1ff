//! Probe harness configuration.

use std::path::PathBuf;

use validator::Validate;

use crate::error::ProbeError;

/// Default API address.
pub const DEFAULT_URL: &str = "http://localhost:80";
/// Default login identifier.
pub const DEFAULT_USERNAME: &str = "root";
/// Default login password.
pub const DEFAULT_PASSWORD: &str = "password";

#[derive(Debug, Clone, Validate)]
pub struct ProbeConfig {
    /// Server root, e.g. `http://localhost:80`; a trailing `/` is dropped.
    #[validate(url)]
    pub base_url: String,
    #[validate(length(min = 1))]
    pub username: String,
    pub password: String,
    /// Directory the timestamped report directory is created under.
    pub output_dir: PathBuf,
}

impl ProbeConfig {
    pub fn new(
        base_url: &str,
        username: impl Into<String>,
        password: impl Into<String>,
        output_dir: impl Into<PathBuf>,
    ) -> Result<Self, ProbeError> {
        let config = Self {
            base_url: base_url.trim_end_matches('/').to_string(),
            username: username.into(),
            password: password.into(),
            output_dir: output_dir.into(),
        };
        config.validate()?;
        Ok(config)
    }

    /// Absolute URL of an API path.
    pub fn url(&self, path: &str) -> String {
        format!("{}{}", self.base_url, path)
    }
}
