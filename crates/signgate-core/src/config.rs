//! SignGate configuration.
//!
//! Provides [`SignGateConfig`], loaded once at start-up from environment
//! variables. Everything except the signing key has a default; a missing or
//! empty key is a fatal configuration error.

use std::path::PathBuf;

use typed_builder::TypedBuilder;

use crate::error::{ConfigError, ConfigResult};
use crate::key::SigningKey;

/// Environment variable holding the HMAC secret.
const SECRET_KEY_VAR: &str = "SIGNGATE_SECRET_KEY";

/// Bind address used when `GATEWAY_LISTEN` is unset.
pub const DEFAULT_GATEWAY_LISTEN: &str = "0.0.0.0:8080";

/// Origin sent by browsers for `file://` pages and sandboxed frames.
const NULL_ORIGIN: &str = "null";

/// Service configuration.
///
/// # Examples
///
/// ```
/// use signgate_core::{SignGateConfig, SigningKey};
///
/// let config = SignGateConfig::builder()
///     .signing_key(SigningKey::new("secret").unwrap())
///     .build();
/// assert_eq!(config.gateway_listen, "0.0.0.0:8080");
/// assert_eq!(config.route_prefix, "/storage");
/// ```
#[derive(Debug, Clone, TypedBuilder)]
pub struct SignGateConfig {
    /// Secret used to sign and verify presigned URLs.
    pub signing_key: SigningKey,

    /// Bind address (e.g. `"0.0.0.0:8080"`).
    #[builder(default = String::from(DEFAULT_GATEWAY_LISTEN))]
    pub gateway_listen: String,

    /// Directory objects are stored in.
    #[builder(default = PathBuf::from("./uploads"))]
    pub storage_dir: PathBuf,

    /// Path prefix of the gated object route, without a trailing slash.
    #[builder(default = String::from("/storage"))]
    pub route_prefix: String,

    /// Origins allowed to make cross-origin requests.
    #[builder(default = vec![String::from(NULL_ORIGIN)])]
    pub cors_allowed_origins: Vec<String>,

    /// Log level filter string (e.g. `"info"`, `"debug"`).
    #[builder(default = String::from("info"))]
    pub log_level: String,
}

impl SignGateConfig {
    /// Load configuration from the process environment.
    ///
    /// | Variable | Default |
    /// |----------|---------|
    /// | `SIGNGATE_SECRET_KEY` | *(required)* |
    /// | `GATEWAY_LISTEN` | `0.0.0.0:8080` |
    /// | `STORAGE_DIR` | `./uploads` |
    /// | `ROUTE_PREFIX` | `/storage` |
    /// | `FRONTEND_DOMAIN` | *(unset)* |
    /// | `LOG_LEVEL` | `info` |
    pub fn from_env() -> ConfigResult<Self> {
        Self::from_lookup(|name| std::env::var(name).ok())
    }

    /// Load configuration through an arbitrary variable lookup.
    pub fn from_lookup<F>(lookup: F) -> ConfigResult<Self>
    where
        F: Fn(&str) -> Option<String>,
    {
        let secret = lookup(SECRET_KEY_VAR).ok_or(ConfigError::Missing(SECRET_KEY_VAR))?;
        let signing_key = SigningKey::new(secret)?;

        let mut config = Self::builder().signing_key(signing_key).build();

        if let Some(v) = lookup("GATEWAY_LISTEN") {
            config.gateway_listen = v;
        }
        if let Some(v) = lookup("STORAGE_DIR") {
            config.storage_dir = PathBuf::from(v);
        }
        if let Some(v) = lookup("ROUTE_PREFIX") {
            config.route_prefix = normalize_prefix(&v)?;
        }
        if let Some(v) = lookup("FRONTEND_DOMAIN") {
            let v = v.trim();
            if !v.is_empty() {
                config.cors_allowed_origins.push(v.trim_end_matches('/').to_owned());
            }
        }
        if let Some(v) = lookup("LOG_LEVEL") {
            config.log_level = v;
        }

        Ok(config)
    }
}

fn normalize_prefix(raw: &str) -> ConfigResult<String> {
    let trimmed = raw.trim().trim_end_matches('/');
    if trimmed.is_empty() || !trimmed.starts_with('/') {
        return Err(ConfigError::Invalid {
            name: "ROUTE_PREFIX",
            reason: format!("{raw:?} must start with '/' and name at least one segment"),
        });
    }
    Ok(trimmed.to_owned())
}
