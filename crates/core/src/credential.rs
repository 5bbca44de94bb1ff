//! Signed test credentials for the game API.
//!
//! Tokens are HMAC-signed JWTs carrying a [`TestClaims`] payload with a fixed
//! 30-minute lifetime.

use jsonwebtoken::{decode, encode, Algorithm, DecodingKey, EncodingKey, Header, Validation};
use serde::{Deserialize, Serialize};

use crate::error::CoreError;

/// Secret used by development environments when `JWT_SECRET` is unset.
pub const DEV_SECRET: &str = "your-super-secret-jwt-key-change-in-production";

/// Lifetime of every generated token in minutes.
pub const TOKEN_LIFETIME_MINS: i64 = 30;

/// Default display name embedded in generated tokens.
pub const DEFAULT_USERNAME: &str = "root";

/// Default email embedded in generated tokens.
pub const DEFAULT_EMAIL: &str = "root@tsu-game.com";

/// Claims embedded in a test token.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct TestClaims {
    /// Subject identifier as stored by the auth service.
    pub user_id: String,
    pub username: String,
    pub email: String,
    /// Expiration time (UTC Unix timestamp).
    pub exp: i64,
    /// Issued-at time (UTC Unix timestamp).
    pub iat: i64,
}

/// Signing configuration.
#[derive(Debug, Clone)]
pub struct CredentialConfig {
    pub secret: String,
    pub algorithm: Algorithm,
    /// `true` when the development secret is in use.
    pub dev_secret: bool,
}

impl CredentialConfig {
    pub fn new(secret: impl Into<String>, algorithm: Algorithm) -> Result<Self, CoreError> {
        if !matches!(algorithm, Algorithm::HS256 | Algorithm::HS384 | Algorithm::HS512) {
            return Err(CoreError::UnsupportedAlgorithm(format!("{algorithm:?}")));
        }
        let secret = secret.into();
        Ok(Self {
            dev_secret: secret == DEV_SECRET,
            secret,
            algorithm,
        })
    }

    /// Load the signing configuration from environment variables.
    ///
    /// | Env Var         | Required | Default        |
    /// |-----------------|----------|----------------|
    /// | `JWT_SECRET`    | no       | [`DEV_SECRET`] |
    /// | `JWT_ALGORITHM` | no       | `HS256`        |
    pub fn from_env() -> Result<Self, CoreError> {
        let secret = std::env::var("JWT_SECRET")
            .ok()
            .filter(|s| !s.is_empty())
            .unwrap_or_else(|| DEV_SECRET.to_string());
        let algorithm = match std::env::var("JWT_ALGORITHM") {
            Ok(name) if !name.is_empty() => name
                .parse::<Algorithm>()
                .map_err(|_| CoreError::UnsupportedAlgorithm(name))?,
            _ => Algorithm::HS256,
        };
        Self::new(secret, algorithm)
    }
}

/// Sign a token for `user_id` valid for [`TOKEN_LIFETIME_MINS`].
pub fn generate_token(
    user_id: &str,
    username: &str,
    email: &str,
    config: &CredentialConfig,
) -> Result<String, CoreError> {
    let now = chrono::Utc::now().timestamp();
    let claims = TestClaims {
        user_id: user_id.to_string(),
        username: username.to_string(),
        email: email.to_string(),
        exp: now + TOKEN_LIFETIME_MINS * 60,
        iat: now,
    };
    let token = encode(
        &Header::new(config.algorithm),
        &claims,
        &EncodingKey::from_secret(config.secret.as_bytes()),
    )?;
    Ok(token)
}

/// Verify signature and expiry, returning the embedded claims.
pub fn decode_token(token: &str, config: &CredentialConfig) -> Result<TestClaims, CoreError> {
    let data = decode::<TestClaims>(
        token,
        &DecodingKey::from_secret(config.secret.as_bytes()),
        &Validation::new(config.algorithm),
    )?;
    Ok(data.claims)
}
