//! Presigned URL query parameters.
//!
//! A presigned URL looks like:
//!
//! ```text
//! https://files.example.com/storage/<resource-id>?expires=1760003600&signature=<b64url>
//! ```
//!
//! - `expires` - Expiry as decimal Unix seconds
//! - `signature` - URL-safe, unpadded base64 HMAC-SHA256 of the canonical message
//!
//! The resource id is the single path segment after the route prefix. It is
//! percent-encoded when rendered and percent-decoded by the router, so the id
//! that gets verified is exactly the id that was signed.

use http::Method;
use percent_encoding::{AsciiSet, NON_ALPHANUMERIC, utf8_percent_encode};
use tracing::debug;

use crate::error::AuthError;
use crate::signer::Signature;
use crate::verifier::{VerifiedOperation, Verifier};

/// Query parameter carrying the expiry.
pub const EXPIRES_PARAM: &str = "expires";

/// Query parameter carrying the signature.
pub const SIGNATURE_PARAM: &str = "signature";

/// Characters left unescaped in a resource id path segment: RFC 3986
/// unreserved characters only.
const SEGMENT_ENCODE_SET: &AsciiSet = &NON_ALPHANUMERIC
    .remove(b'-')
    .remove(b'_')
    .remove(b'.')
    .remove(b'~');

/// A minted presigned URL.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PresignedUrl {
    /// The method the URL authorizes.
    pub method: Method,
    /// The resource the URL authorizes.
    pub resource_id: String,
    /// Expiry as Unix seconds.
    pub expires_at: i64,
    /// The signature over the three fields above.
    pub signature: Signature,
}

impl PresignedUrl {
    /// Render the query string carrying the expiry and signature.
    ///
    /// # Examples
    ///
    /// ```
    /// use http::Method;
    /// use signgate_auth::Signer;
    /// use signgate_core::SigningKey;
    ///
    /// let signer = Signer::new(SigningKey::new("secret").unwrap());
    /// let url = signer.presign(&Method::GET, "a b", 1_700_000_000).unwrap();
    /// assert!(url.query_string().starts_with("expires=1700000000&signature="));
    /// assert_eq!(url.path("/storage"), "/storage/a%20b");
    /// ```
    #[must_use]
    pub fn query_string(&self) -> String {
        form_urlencoded::Serializer::new(String::new())
            .append_pair(EXPIRES_PARAM, &self.expires_at.to_string())
            .append_pair(SIGNATURE_PARAM, &self.signature.to_string())
            .finish()
    }

    /// Render the request path under `route_prefix`.
    #[must_use]
    pub fn path(&self, route_prefix: &str) -> String {
        format!(
            "{}/{}",
            route_prefix.trim_end_matches('/'),
            utf8_percent_encode(&self.resource_id, SEGMENT_ENCODE_SET)
        )
    }

    /// Render the full URL against `base_url` (scheme and authority, e.g.
    /// `http://localhost:8080`).
    #[must_use]
    pub fn to_url(&self, base_url: &str, route_prefix: &str) -> String {
        format!(
            "{}{}?{}",
            base_url.trim_end_matches('/'),
            self.path(route_prefix),
            self.query_string()
        )
    }
}

/// The raw `expires` and `signature` values found in a query string.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct PresignedParams {
    /// The first `expires` value, if any.
    pub expires: Option<String>,
    /// The first `signature` value, if any.
    pub signature: Option<String>,
}

/// Extract presigned URL parameters from a raw query string.
///
/// Values are form-urlencoded decoded. When a parameter is repeated the first
/// occurrence wins. Unrelated parameters are ignored.
#[must_use]
pub fn parse_presigned_params(query: &str) -> PresignedParams {
    let mut params = PresignedParams::default();
    for (key, value) in form_urlencoded::parse(query.as_bytes()) {
        match key.as_ref() {
            EXPIRES_PARAM if params.expires.is_none() => {
                params.expires = Some(value.into_owned());
            }
            SIGNATURE_PARAM if params.signature.is_none() => {
                params.signature = Some(value.into_owned());
            }
            _ => {}
        }
    }
    params
}

/// Verify a presigned request.
///
/// The method comes from the request line, the claims from the query string,
/// and `resource_id` from the router (`None` when the path named no resource).
pub fn verify_presigned(
    parts: &http::request::Parts,
    resource_id: Option<&str>,
    verifier: &Verifier,
) -> Result<VerifiedOperation, AuthError> {
    let params = parse_presigned_params(parts.uri.query().unwrap_or(""));

    debug!(
        method = %parts.method,
        resource_id = ?resource_id,
        expires = ?params.expires,
        has_signature = params.signature.is_some(),
        "verifying presigned URL"
    );

    verifier.verify(
        &parts.method,
        resource_id,
        params.expires.as_deref(),
        params.signature.as_deref(),
    )
}
