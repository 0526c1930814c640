//! Error types for the SignGate core.

/// Errors raised while loading configuration.
///
/// All of these are start-up failures: the process must refuse to run rather
/// than serve requests without a usable configuration.
#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    /// A required environment variable is absent.
    #[error("missing required configuration: {0}")]
    Missing(&'static str),

    /// The signing key was supplied but is empty.
    #[error("signing key must not be empty")]
    EmptySigningKey,

    /// A value is present but cannot be used.
    #[error("invalid value for {name}: {reason}")]
    Invalid {
        /// Variable name.
        name: &'static str,
        /// Why the value was rejected.
        reason: String,
    },
}

/// Convenience result type for configuration loading.
pub type ConfigResult<T> = Result<T, ConfigError>;
