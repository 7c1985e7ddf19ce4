//! Authentication for OKX.
//!
//! Private REST endpoints and private WebSocket sessions are authenticated
//! with an API key, secret and passphrase. Each request is signed with
//! HMAC-SHA256 over a prehash string and the digest is base64 encoded.
//!
//! # REST
//!
//! ```text
//! prehash   = timestamp + METHOD + requestPath[?query] + body
//! timestamp = 2020-12-08T09:08:57.715Z
//! ```
//!
//! # WebSocket login
//!
//! ```text
//! prehash   = timestamp + "GET" + "/users/self/verify"
//! timestamp = 1538054050   (Unix seconds)
//! ```

use std::fmt;

use base64::Engine;
use chrono::{DateTime, SecondsFormat, Utc};
use hmac::{Hmac, Mac};
use serde::Serialize;
use sha2::Sha256;
use thiserror::Error;

type HmacSha256 = Hmac<Sha256>;

/// Environment variable holding the API key.
pub const ENV_API_KEY: &str = "OKX_API_KEY";
/// Environment variable holding the API secret.
pub const ENV_API_SECRET: &str = "OKX_API_SECRET";
/// Environment variable holding the API passphrase.
pub const ENV_API_PASSPHRASE: &str = "OKX_API_PASSPHRASE";

/// Request path signed by the WebSocket login.
pub const WS_LOGIN_PATH: &str = "/users/self/verify";

/// Authentication-specific errors
#[derive(Debug, Clone, Error, PartialEq, Eq)]
pub enum AuthError {
    /// A credential environment variable is unset or empty
    #[error("Missing environment variable: {0}")]
    MissingEnv(&'static str),

    /// The secret could not be used as an HMAC key
    #[error("Invalid secret: {0}")]
    InvalidSecret(String),
}

/// Result type alias for authentication operations
pub type AuthResult<T> = Result<T, AuthError>;

/// API key credentials.
#[derive(Clone, PartialEq, Eq)]
pub struct Credentials {
    api_key: String,
    secret: String,
    passphrase: String,
}

impl fmt::Debug for Credentials {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Credentials")
            .field("api_key", &self.api_key)
            .field("secret", &"<redacted>")
            .field("passphrase", &"<redacted>")
            .finish()
    }
}

impl Credentials {
    pub fn new(
        api_key: impl Into<String>,
        secret: impl Into<String>,
        passphrase: impl Into<String>,
    ) -> Self {
        Self {
            api_key: api_key.into(),
            secret: secret.into(),
            passphrase: passphrase.into(),
        }
    }

    /// Read credentials from `OKX_API_KEY`, `OKX_API_SECRET` and
    /// `OKX_API_PASSPHRASE`.
    pub fn from_env() -> AuthResult<Self> {
        fn var(name: &'static str) -> AuthResult<String> {
            match std::env::var(name) {
                Ok(value) if !value.is_empty() => Ok(value),
                _ => Err(AuthError::MissingEnv(name)),
            }
        }

        Ok(Self::new(
            var(ENV_API_KEY)?,
            var(ENV_API_SECRET)?,
            var(ENV_API_PASSPHRASE)?,
        ))
    }

    pub fn api_key(&self) -> &str {
        &self.api_key
    }

    pub fn passphrase(&self) -> &str {
        &self.passphrase
    }

    /// Sign a request.
    ///
    /// `request_path` includes the query string for GET requests; `body` is
    /// empty for GET requests.
    pub fn sign(
        &self,
        timestamp: &str,
        method: &str,
        request_path: &str,
        body: &str,
    ) -> AuthResult<String> {
        let mut mac = HmacSha256::new_from_slice(self.secret.as_bytes())
            .map_err(|e| AuthError::InvalidSecret(e.to_string()))?;
        mac.update(timestamp.as_bytes());
        mac.update(method.as_bytes());
        mac.update(request_path.as_bytes());
        mac.update(body.as_bytes());
        Ok(base64::engine::general_purpose::STANDARD.encode(mac.finalize().into_bytes()))
    }

    /// Login arguments for a private WebSocket session at `now`.
    pub fn login_args_at(&self, now: DateTime<Utc>) -> AuthResult<LoginArgs> {
        let timestamp = now.timestamp().to_string();
        let sign = self.sign(&timestamp, "GET", WS_LOGIN_PATH, "")?;
        Ok(LoginArgs {
            api_key: self.api_key.clone(),
            passphrase: self.passphrase.clone(),
            timestamp,
            sign,
        })
    }

    /// Login arguments for a private WebSocket session.
    pub fn login_args(&self) -> AuthResult<LoginArgs> {
        self.login_args_at(Utc::now())
    }
}

/// The single `args` entry of a WebSocket `login` envelope.
#[derive(Debug, Clone, Serialize, PartialEq, Eq)]
#[serde(rename_all = "camelCase")]
pub struct LoginArgs {
    pub api_key: String,
    pub passphrase: String,
    pub timestamp: String,
    pub sign: String,
}

/// REST timestamp: ISO-8601 UTC with millisecond precision.
pub fn rest_timestamp(now: DateTime<Utc>) -> String {
    now.to_rfc3339_opts(SecondsFormat::Millis, true)
}
