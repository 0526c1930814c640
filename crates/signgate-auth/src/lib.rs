//! HMAC-SHA256 presigned URL signing and verification for SignGate.
//!
//! A presigned URL carries two query parameters, `expires` (Unix seconds) and
//! `signature` (URL-safe unpadded base64). The signature binds the HTTP method,
//! the resource identifier and the expiry:
//!
//! ```text
//! signature = base64url(HMAC-SHA256(key, method + "\n" + resource_id + "\n" + expires))
//! ```
//!
//! Anyone holding the URL may perform exactly that method on exactly that
//! resource until the expiry passes.
//!
//! # Usage
//!
//! ```rust
//! use http::Method;
//! use signgate_auth::{Signer, Verifier};
//! use signgate_core::SigningKey;
//!
//! let key = SigningKey::new("test-secret-key").unwrap();
//! let signer = Signer::new(key);
//! let verifier = Verifier::new(signer.clone());
//!
//! let url = signer.presign(&Method::GET, "test-file-id", 4_102_444_800).unwrap();
//! let signature = url.signature.to_string();
//! let expires = url.expires_at.to_string();
//!
//! let verified = verifier
//!     .verify(&Method::GET, Some("test-file-id"), Some(&expires), Some(&signature))
//!     .unwrap();
//! assert_eq!(verified.resource_id, "test-file-id");
//! ```
//!
//! # Modules
//!
//! - [`canonical`] - Canonical message construction
//! - [`error`] - Rejection taxonomy and HTTP status mapping
//! - [`presigned`] - Query parameter parsing and URL rendering
//! - [`signer`] - HMAC computation and URL minting
//! - [`verifier`] - Presence, format, freshness and authenticity checks

pub mod canonical;
pub mod error;
pub mod presigned;
pub mod signer;
pub mod verifier;

pub use error::{AuthError, RejectionKind};
pub use presigned::{PresignedUrl, verify_presigned};
pub use signer::{Signature, Signer};
pub use verifier::{VerifiedOperation, Verifier};
