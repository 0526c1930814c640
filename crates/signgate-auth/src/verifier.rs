//! Presigned URL verification.
//!
//! [`Verifier::verify`] runs four checks in a fixed order and stops at the first
//! failure:
//!
//! 1. Presence: `expires`, `signature` and the resource id must be non-empty.
//! 2. Format: `expires` must parse as a signed 64-bit decimal integer.
//! 3. Freshness: `expires` must not be earlier than the current Unix second.
//! 4. Authenticity: the decoded signature must equal the recomputed HMAC,
//!    compared in constant time.
//!
//! Freshness runs before any HMAC work, so an expired URL is rejected as
//! `Expired` even when its signature is genuine.

use chrono::Utc;
use http::Method;
use signgate_core::SigningKey;
use subtle::ConstantTimeEq;
use tracing::debug;

use crate::error::AuthError;
use crate::presigned::{EXPIRES_PARAM, SIGNATURE_PARAM};
use crate::signer::{Signature, Signer};

/// The operation a request was authorized to perform.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct VerifiedOperation {
    /// The method that was signed.
    pub method: Method,
    /// The resource that was signed.
    pub resource_id: String,
    /// The expiry that was signed.
    pub expires_at: i64,
}

/// Checks presigned URL claims against the process signing key.
///
/// Stateless: it remembers nothing between calls, so the same URL may be used
/// any number of times before it expires.
#[derive(Debug, Clone)]
pub struct Verifier {
    signer: Signer,
}

impl Verifier {
    /// Create a verifier that recomputes signatures through `signer`.
    #[must_use]
    pub fn new(signer: Signer) -> Self {
        Self { signer }
    }

    /// Create a verifier directly from a key.
    #[must_use]
    pub fn from_key(key: SigningKey) -> Self {
        Self::new(Signer::new(key))
    }

    /// The signer this verifier recomputes signatures with.
    #[must_use]
    pub fn signer(&self) -> &Signer {
        &self.signer
    }

    /// Verify claims against the current wall clock.
    pub fn verify(
        &self,
        method: &Method,
        resource_id: Option<&str>,
        expires: Option<&str>,
        signature: Option<&str>,
    ) -> Result<VerifiedOperation, AuthError> {
        self.verify_at(
            method,
            resource_id,
            expires,
            signature,
            Utc::now().timestamp(),
        )
    }

    /// Verify claims against an explicit clock reading `now` (Unix seconds).
    pub fn verify_at(
        &self,
        method: &Method,
        resource_id: Option<&str>,
        expires: Option<&str>,
        signature: Option<&str>,
        now: i64,
    ) -> Result<VerifiedOperation, AuthError> {
        let expires = non_empty(expires).ok_or(AuthError::MissingQueryParam(EXPIRES_PARAM))?;
        let provided =
            non_empty(signature).ok_or(AuthError::MissingQueryParam(SIGNATURE_PARAM))?;
        let resource_id = non_empty(resource_id).ok_or(AuthError::MissingResourceId)?;

        let expires_at: i64 = expires
            .parse()
            .map_err(|_| AuthError::InvalidExpires(expires.to_owned()))?;

        if expires_at < now {
            debug!(%method, resource_id, expires_at, now, "presigned URL expired");
            return Err(AuthError::RequestExpired { expires_at, now });
        }

        let expected = self.signer.sign(method, resource_id, expires_at)?;

        let matches = match Signature::decode(provided) {
            Ok(provided) => bool::from(expected.ct_eq(&provided)),
            Err(_) => false,
        };

        if matches {
            debug!(%method, resource_id, expires_at, "presigned URL verified");
            Ok(VerifiedOperation {
                method: method.clone(),
                resource_id: resource_id.to_owned(),
                expires_at,
            })
        } else {
            debug!(%method, resource_id, expires_at, "presigned URL signature mismatch");
            Err(AuthError::SignatureDoesNotMatch)
        }
    }
}

fn non_empty(value: Option<&str>) -> Option<&str> {
    value.filter(|v| !v.is_empty())
}
