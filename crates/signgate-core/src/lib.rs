//! Signing key and configuration shared across SignGate crates.
//!
//! This crate holds the process-wide pieces every other crate depends on: the
//! immutable [`SigningKey`] used for presigned URL signatures and the
//! [`SignGateConfig`] loaded once at start-up.

mod config;
mod error;
mod key;

pub use config::{DEFAULT_GATEWAY_LISTEN, SignGateConfig};
pub use error::{ConfigError, ConfigResult};
pub use key::SigningKey;
