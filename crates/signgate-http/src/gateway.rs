//! The storage gateway boundary.
//!
//! Requests that pass the presigned URL gate are handed to a
//! [`StorageGateway`], which reads or writes the named object and knows nothing
//! about signatures or expiry. [`MemoryStorageGateway`] is an in-process
//! implementation for tests and development.

use std::future::Future;
use std::path::Path;
use std::pin::Pin;

use bytes::Bytes;
use dashmap::DashMap;
use http::StatusCode;

/// Boxed future returned by gateway operations.
pub type GatewayFuture<T> = Pin<Box<dyn Future<Output = Result<T, GatewayError>> + Send>>;

/// Errors reported by a storage gateway.
#[derive(Debug, thiserror::Error)]
pub enum GatewayError {
    /// No object is stored under the id.
    #[error("File not found: {0}")]
    NotFound(String),

    /// The id cannot name a stored object.
    #[error("Invalid resource id: {0:?}")]
    InvalidResourceId(String),

    /// The backing store failed.
    #[error("Storage I/O error: {0}")]
    Io(#[from] std::io::Error),
}

impl GatewayError {
    /// The HTTP status reported to the client.
    #[must_use]
    pub fn status_code(&self) -> StatusCode {
        match self {
            Self::NotFound(_) => StatusCode::NOT_FOUND,
            Self::InvalidResourceId(_) => StatusCode::BAD_REQUEST,
            Self::Io(_) => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }

    /// The message safe to show to the client.
    #[must_use]
    pub fn public_message(&self) -> String {
        match self {
            Self::Io(_) => "Failed to access storage".to_owned(),
            other => other.to_string(),
        }
    }
}

/// An object read back from storage.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct StoredObject {
    /// Content type to serve the object with.
    pub content_type: mime::Mime,
    /// Object bytes.
    pub data: Bytes,
}

/// Backend that stores and serves objects once a request has been authorized.
///
/// This trait uses boxed futures so it can be used behind `Arc<dyn StorageGateway>`.
pub trait StorageGateway: Send + Sync + 'static {
    /// Store `body` under `resource_id`, replacing any existing object.
    fn put_object(&self, resource_id: String, body: Bytes) -> GatewayFuture<()>;

    /// Load the object stored under `resource_id`.
    fn get_object(&self, resource_id: String) -> GatewayFuture<StoredObject>;
}

/// Reject ids that could escape a flat object namespace.
///
/// # Errors
///
/// Returns [`GatewayError::InvalidResourceId`] for empty ids, `.` and `..`, and
/// ids containing `/`, `\` or NUL.
pub fn validate_resource_id(resource_id: &str) -> Result<(), GatewayError> {
    let bad = resource_id.is_empty()
        || resource_id == "."
        || resource_id == ".."
        || resource_id.contains(['/', '\\', '\0']);
    if bad {
        return Err(GatewayError::InvalidResourceId(resource_id.to_owned()));
    }
    Ok(())
}

/// Guess a content type from the resource id's extension.
///
/// A bare `img` name is served as JPEG; unknown extensions fall back to
/// `application/octet-stream`.
#[must_use]
pub fn guess_content_type(resource_id: &str) -> mime::Mime {
    if resource_id == "img" {
        return mime::IMAGE_JPEG;
    }

    let ext = Path::new(resource_id)
        .extension()
        .and_then(|e| e.to_str())
        .map(str::to_ascii_lowercase);

    match ext.as_deref() {
        Some("jpg" | "jpeg") => mime::IMAGE_JPEG,
        Some("png") => mime::IMAGE_PNG,
        Some("gif") => mime::IMAGE_GIF,
        Some("bmp") => mime::IMAGE_BMP,
        Some("svg") => mime::IMAGE_SVG,
        Some("webp") => "image/webp".parse().unwrap_or(mime::APPLICATION_OCTET_STREAM),
        Some("pdf") => mime::APPLICATION_PDF,
        Some("json") => mime::APPLICATION_JSON,
        Some("txt") => mime::TEXT_PLAIN_UTF_8,
        Some("html" | "htm") => mime::TEXT_HTML_UTF_8,
        Some("css") => mime::TEXT_CSS_UTF_8,
        Some("csv") => mime::TEXT_CSV_UTF_8,
        Some("js") => mime::APPLICATION_JAVASCRIPT_UTF_8,
        _ => mime::APPLICATION_OCTET_STREAM,
    }
}

/// An in-memory storage gateway backed by a `DashMap`.
#[derive(Debug, Default)]
pub struct MemoryStorageGateway {
    objects: DashMap<String, Bytes>,
}

impl MemoryStorageGateway {
    /// Create an empty gateway.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Number of stored objects.
    #[must_use]
    pub fn len(&self) -> usize {
        self.objects.len()
    }

    /// Whether no object is stored.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.objects.is_empty()
    }
}

impl StorageGateway for MemoryStorageGateway {
    fn put_object(&self, resource_id: String, body: Bytes) -> GatewayFuture<()> {
        let result = validate_resource_id(&resource_id).map(|()| {
            self.objects.insert(resource_id, body);
        });
        Box::pin(async move { result })
    }

    fn get_object(&self, resource_id: String) -> GatewayFuture<StoredObject> {
        let result = validate_resource_id(&resource_id).and_then(|()| {
            self.objects
                .get(&resource_id)
                .map(|data| StoredObject {
                    content_type: guess_content_type(&resource_id),
                    data: data.value().clone(),
                })
                .ok_or_else(|| GatewayError::NotFound(resource_id.clone()))
        });
        Box::pin(async move { result })
    }
}
