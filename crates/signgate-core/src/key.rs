//! The process-wide HMAC signing key.

use std::fmt;
use std::sync::Arc;

use crate::error::{ConfigError, ConfigResult};

/// Secret key used to sign and verify presigned URLs.
///
/// The bytes are immutable once constructed and shared by reference count, so
/// cloning a `SigningKey` never copies the secret. `Debug` output is redacted.
///
/// # Examples
///
/// ```
/// use signgate_core::SigningKey;
///
/// let key = SigningKey::new("test-secret-key").unwrap();
/// assert_eq!(format!("{key:?}"), "SigningKey(<redacted>)");
/// assert!(SigningKey::new("").is_err());
/// ```
#[derive(Clone)]
pub struct SigningKey(Arc<[u8]>);

impl SigningKey {
    /// Create a key from raw bytes.
    ///
    /// # Errors
    ///
    /// Returns [`ConfigError::EmptySigningKey`] if `secret` is empty.
    pub fn new(secret: impl AsRef<[u8]>) -> ConfigResult<Self> {
        let secret = secret.as_ref();
        if secret.is_empty() {
            return Err(ConfigError::EmptySigningKey);
        }
        Ok(Self(Arc::from(secret)))
    }

    /// Borrow the raw key bytes. Only the HMAC routine should call this.
    #[must_use]
    pub fn expose_secret(&self) -> &[u8] {
        &self.0
    }
}

impl fmt::Debug for SigningKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str("SigningKey(<redacted>)")
    }
}

impl PartialEq for SigningKey {
    fn eq(&self, other: &Self) -> bool {
        self.0 == other.0
    }
}

impl Eq for SigningKey {}
