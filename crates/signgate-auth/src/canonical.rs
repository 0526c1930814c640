//! Canonical message construction.
//!
//! The signed bytes are the UTF-8 encoding of:
//!
//! ```text
//! HTTPMethod\n
//! ResourceId\n
//! ExpiresAtEpochSeconds
//! ```
//!
//! The method is an [`http::Method`], which can never contain a newline, and the
//! expiry is a plain decimal integer, so the first and last newline always
//! delimit the three fields. Two different descriptors therefore never share a
//! canonical message even when the resource id itself contains newlines.

use http::Method;

/// The three fields bound by a presigned URL signature.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct OperationDescriptor<'a> {
    /// The wire method, compared case-sensitively.
    pub method: &'a Method,
    /// The exact path-derived identifier of the target object.
    pub resource_id: &'a str,
    /// Expiry as Unix seconds.
    pub expires_at: i64,
}

impl<'a> OperationDescriptor<'a> {
    /// Create a descriptor.
    #[must_use]
    pub fn new(method: &'a Method, resource_id: &'a str, expires_at: i64) -> Self {
        Self {
            method,
            resource_id,
            expires_at,
        }
    }

    /// Serialize this descriptor into the exact string that gets signed.
    ///
    /// # Examples
    ///
    /// ```
    /// use http::Method;
    /// use signgate_auth::canonical::OperationDescriptor;
    ///
    /// let op = OperationDescriptor::new(&Method::PUT, "report.pdf", 1_700_000_000);
    /// assert_eq!(op.canonical_message(), "PUT\nreport.pdf\n1700000000");
    /// ```
    #[must_use]
    pub fn canonical_message(&self) -> String {
        format!(
            "{}\n{}\n{}",
            self.method.as_str(),
            self.resource_id,
            self.expires_at
        )
    }
}
