//! Connection profiles.
//!
//! `local` targets a developer database with fixed credentials; `prod` reads
//! every connection parameter from the environment.

use std::fmt;
use std::str::FromStr;

use sqlx::postgres::PgConnectOptions;

#[derive(Debug, thiserror::Error)]
pub enum DbConfigError {
    #[error("Unknown environment: {0} (expected `local` or `prod`)")]
    UnknownEnv(String),

    #[error("DB_PORT must be a valid port number, got `{0}`")]
    InvalidPort(String),
}

/// Which credential/host profile to connect with.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum DbEnv {
    #[default]
    Local,
    Prod,
}

impl DbEnv {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Local => "local",
            Self::Prod => "prod",
        }
    }
}

impl FromStr for DbEnv {
    type Err = DbConfigError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "local" => Ok(Self::Local),
            "prod" => Ok(Self::Prod),
            other => Err(DbConfigError::UnknownEnv(other.to_string())),
        }
    }
}

impl fmt::Display for DbEnv {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Resolved connection parameters.
#[derive(Clone, PartialEq, Eq)]
pub struct DbProfile {
    pub host: String,
    pub port: u16,
    pub database: String,
    pub user: String,
    pub password: String,
}

/// Default port for both profiles.
const DEFAULT_PORT: u16 = 5432;
/// Default database name for both profiles.
const DEFAULT_DATABASE: &str = "tsu_db";

impl DbProfile {
    /// Fixed developer profile.
    pub fn local() -> Self {
        Self {
            host: "localhost".to_string(),
            port: DEFAULT_PORT,
            database: DEFAULT_DATABASE.to_string(),
            user: "postgres".to_string(),
            password: "postgres".to_string(),
        }
    }

    /// Load the production profile from environment variables.
    ///
    /// | Env Var       | Default     |
    /// |---------------|-------------|
    /// | `DB_HOST`     | `localhost` |
    /// | `DB_PORT`     | `5432`      |
    /// | `DB_NAME`     | `tsu_db`    |
    /// | `DB_USER`     | `tsu_user`  |
    /// | `DB_PASSWORD` | (empty)     |
    pub fn from_env() -> Result<Self, DbConfigError> {
        Self::from_vars(|key| std::env::var(key).ok())
    }

    fn from_vars(get: impl Fn(&str) -> Option<String>) -> Result<Self, DbConfigError> {
        let port = match get("DB_PORT") {
            Some(raw) => raw
                .trim()
                .parse::<u16>()
                .map_err(|_| DbConfigError::InvalidPort(raw))?,
            None => DEFAULT_PORT,
        };
        Ok(Self {
            host: get("DB_HOST").unwrap_or_else(|| "localhost".to_string()),
            port,
            database: get("DB_NAME").unwrap_or_else(|| DEFAULT_DATABASE.to_string()),
            user: get("DB_USER").unwrap_or_else(|| "tsu_user".to_string()),
            password: get("DB_PASSWORD").unwrap_or_default(),
        })
    }

    pub fn for_env(env: DbEnv) -> Result<Self, DbConfigError> {
        match env {
            DbEnv::Local => Ok(Self::local()),
            DbEnv::Prod => Self::from_env(),
        }
    }

    pub fn connect_options(&self) -> PgConnectOptions {
        let options = PgConnectOptions::new()
            .host(&self.host)
            .port(self.port)
            .database(&self.database)
            .username(&self.user);
        if self.password.is_empty() {
            options
        } else {
            options.password(&self.password)
        }
    }
}

/// Never prints the password.
impl fmt::Display for DbProfile {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}@{}:{}/{}", self.user, self.host, self.port, self.database)
    }
}

impl fmt::Debug for DbProfile {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("DbProfile")
            .field("host", &self.host)
            .field("port", &self.port)
            .field("database", &self.database)
            .field("user", &self.user)
            .field("password", &"<redacted>")
            .finish()
    }
}
