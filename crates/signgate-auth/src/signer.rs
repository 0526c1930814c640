//! HMAC-SHA256 signing.
//!
//! [`Signer`] is the single place the canonical message is hashed. The
//! [`Verifier`](crate::verifier::Verifier) owns a `Signer` and recomputes
//! expected signatures through it, so the two sides cannot drift apart.

use std::fmt;
use std::time::Duration;

use base64::Engine;
use base64::engine::general_purpose::URL_SAFE_NO_PAD;
use chrono::Utc;
use hmac::{Hmac, KeyInit, Mac};
use http::Method;
use sha2::Sha256;
use subtle::{Choice, ConstantTimeEq};
use signgate_core::SigningKey;

use crate::canonical::OperationDescriptor;
use crate::error::AuthError;
use crate::presigned::PresignedUrl;

type HmacSha256 = Hmac<Sha256>;

/// A raw HMAC-SHA256 output.
///
/// `Display` renders the URL-safe, unpadded base64 form used on the wire.
/// Equality runs in constant time.
#[derive(Clone)]
pub struct Signature(Vec<u8>);

impl Signature {
    /// Decode a signature from its URL-safe, unpadded base64 form.
    ///
    /// # Errors
    ///
    /// Returns the base64 error if `encoded` is not valid URL-safe unpadded base64.
    pub fn decode(encoded: &str) -> Result<Self, base64::DecodeError> {
        URL_SAFE_NO_PAD.decode(encoded).map(Self)
    }

    /// The raw MAC bytes.
    #[must_use]
    pub fn as_bytes(&self) -> &[u8] {
        &self.0
    }
}

impl ConstantTimeEq for Signature {
    fn ct_eq(&self, other: &Self) -> Choice {
        self.0.as_slice().ct_eq(other.0.as_slice())
    }
}

impl PartialEq for Signature {
    fn eq(&self, other: &Self) -> bool {
        self.ct_eq(other).into()
    }
}

impl Eq for Signature {}

impl fmt::Display for Signature {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&URL_SAFE_NO_PAD.encode(&self.0))
    }
}

// Signatures are bearer credentials; keep them out of debug logs.
impl fmt::Debug for Signature {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "Signature({} bytes)", self.0.len())
    }
}

/// Produces presigned URL signatures with the process signing key.
///
/// # Examples
///
/// ```
/// use http::Method;
/// use signgate_auth::Signer;
/// use signgate_core::SigningKey;
///
/// let signer = Signer::new(SigningKey::new("secret").unwrap());
/// let a = signer.sign(&Method::GET, "file", 1_700_000_000).unwrap();
/// let b = signer.sign(&Method::GET, "file", 1_700_000_000).unwrap();
/// assert_eq!(a, b);
/// assert_eq!(a.to_string().len(), 43);
/// ```
#[derive(Debug, Clone)]
pub struct Signer {
    key: SigningKey,
}

impl Signer {
    /// Create a signer bound to `key`.
    #[must_use]
    pub fn new(key: SigningKey) -> Self {
        Self { key }
    }

    /// Sign `(method, resource_id, expires_at)`.
    ///
    /// Expiry is not checked here; past expiries sign normally.
    ///
    /// # Errors
    ///
    /// Returns [`AuthError::Internal`] if the HMAC primitive rejects the key.
    pub fn sign(
        &self,
        method: &Method,
        resource_id: &str,
        expires_at: i64,
    ) -> Result<Signature, AuthError> {
        self.sign_descriptor(&OperationDescriptor::new(method, resource_id, expires_at))
    }

    /// Sign a prepared descriptor.
    ///
    /// # Errors
    ///
    /// Returns [`AuthError::Internal`] if the HMAC primitive rejects the key.
    pub fn sign_descriptor(&self, op: &OperationDescriptor<'_>) -> Result<Signature, AuthError> {
        let message = op.canonical_message();
        hmac_sha256(self.key.expose_secret(), message.as_bytes()).map(Signature)
    }

    /// Mint a presigned URL valid until `expires_at`.
    ///
    /// # Errors
    ///
    /// Returns [`AuthError::Internal`] if signing fails.
    pub fn presign(
        &self,
        method: &Method,
        resource_id: &str,
        expires_at: i64,
    ) -> Result<PresignedUrl, AuthError> {
        let signature = self.sign(method, resource_id, expires_at)?;
        Ok(PresignedUrl {
            method: method.clone(),
            resource_id: resource_id.to_owned(),
            expires_at,
            signature,
        })
    }

    /// Mint a presigned URL valid for `ttl` from now.
    ///
    /// # Errors
    ///
    /// Returns [`AuthError::Internal`] if signing fails.
    pub fn presign_for(
        &self,
        method: &Method,
        resource_id: &str,
        ttl: Duration,
    ) -> Result<PresignedUrl, AuthError> {
        let ttl = i64::try_from(ttl.as_secs()).unwrap_or(i64::MAX);
        let expires_at = Utc::now().timestamp().saturating_add(ttl);
        self.presign(method, resource_id, expires_at)
    }
}

/// Compute HMAC-SHA256 of `data` under `key`.
fn hmac_sha256(key: &[u8], data: &[u8]) -> Result<Vec<u8>, AuthError> {
    let mut mac = HmacSha256::new_from_slice(key)
        .map_err(|e| AuthError::Internal(format!("HMAC-SHA256 rejected key: {e}")))?;
    mac.update(data);
    Ok(mac.finalize().into_bytes().to_vec())
}
