//! Error types for presigned URL verification.
//!
//! Every failure is an [`AuthError`]. [`AuthError::kind`] folds the variants into
//! the four externally meaningful [`RejectionKind`]s, which in turn decide the
//! HTTP status. `Expired` and `InvalidSignature` share one status and one public
//! message so a client cannot tell which check failed.

use http::StatusCode;

/// Message returned to clients for both expired and forged URLs.
pub const ACCESS_DENIED_MESSAGE: &str = "Access denied";

/// Message returned to clients for internal faults.
pub const INTERNAL_FAULT_MESSAGE: &str = "Signature processing failed";

/// Errors that can occur while signing or verifying a presigned URL.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum AuthError {
    /// A required query parameter is absent or empty.
    #[error("Missing required query parameter: {0}")]
    MissingQueryParam(&'static str),

    /// The `expires` parameter is not a decimal integer.
    #[error("Query parameter 'expires' is not a valid integer: {0:?}")]
    InvalidExpires(String),

    /// The request path does not name a resource.
    #[error("Resource identifier could not be resolved from the request path")]
    MissingResourceId,

    /// The URL was valid in form but its window has closed.
    #[error("Request has expired (expires={expires_at}, now={now})")]
    RequestExpired {
        /// The claimed expiry.
        expires_at: i64,
        /// The clock reading the claim was checked against.
        now: i64,
    },

    /// The provided signature does not match the recomputed one.
    #[error("Signature does not match")]
    SignatureDoesNotMatch,

    /// The HMAC primitive could not be used. Indicates a broken deployment.
    #[error("Signature computation failed: {0}")]
    Internal(String),
}

/// The externally visible classification of an [`AuthError`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum RejectionKind {
    /// Missing or unparseable parameters, or an unresolved resource id.
    MalformedRequest,
    /// The expiry is in the past.
    Expired,
    /// Forged, corrupted or out-of-scope signature.
    InvalidSignature,
    /// The service itself failed.
    InternalFault,
}

impl RejectionKind {
    /// The HTTP status reported to the client.
    #[must_use]
    pub fn status_code(self) -> StatusCode {
        match self {
            Self::MalformedRequest => StatusCode::BAD_REQUEST,
            Self::Expired | Self::InvalidSignature => StatusCode::FORBIDDEN,
            Self::InternalFault => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }

    /// Stable name for logs.
    #[must_use]
    pub fn as_str(self) -> &'static str {
        match self {
            Self::MalformedRequest => "MalformedRequest",
            Self::Expired => "Expired",
            Self::InvalidSignature => "InvalidSignature",
            Self::InternalFault => "InternalFault",
        }
    }
}

impl std::fmt::Display for RejectionKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

impl AuthError {
    /// Classify this error.
    #[must_use]
    pub fn kind(&self) -> RejectionKind {
        match self {
            Self::MissingQueryParam(_) | Self::InvalidExpires(_) | Self::MissingResourceId => {
                RejectionKind::MalformedRequest
            }
            Self::RequestExpired { .. } => RejectionKind::Expired,
            Self::SignatureDoesNotMatch => RejectionKind::InvalidSignature,
            Self::Internal(_) => RejectionKind::InternalFault,
        }
    }

    /// The HTTP status reported to the client.
    #[must_use]
    pub fn status_code(&self) -> StatusCode {
        self.kind().status_code()
    }

    /// The message safe to show to the client.
    ///
    /// Malformed requests get a precise message. Expired and invalid signatures
    /// get the same generic one.
    #[must_use]
    pub fn public_message(&self) -> String {
        match self.kind() {
            RejectionKind::MalformedRequest => self.to_string(),
            RejectionKind::Expired | RejectionKind::InvalidSignature => {
                ACCESS_DENIED_MESSAGE.to_owned()
            }
            RejectionKind::InternalFault => INTERNAL_FAULT_MESSAGE.to_owned(),
        }
    }
}
