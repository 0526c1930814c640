//! Filesystem storage gateway.
//!
//! Objects are stored as flat files named by their resource id under a single
//! root directory.

use std::io::ErrorKind;
use std::path::{Path, PathBuf};
use std::sync::Arc;

use bytes::Bytes;
use signgate_http::gateway::{
    GatewayError, GatewayFuture, StorageGateway, StoredObject, guess_content_type,
    validate_resource_id,
};
use tracing::debug;

/// Stores objects as files under a root directory.
#[derive(Debug, Clone)]
pub struct FsStorageGateway {
    root: Arc<PathBuf>,
}

impl FsStorageGateway {
    /// Create a gateway rooted at `root`. The directory must already exist.
    #[must_use]
    pub fn new(root: impl Into<PathBuf>) -> Self {
        Self {
            root: Arc::new(root.into()),
        }
    }

    /// The root directory.
    #[must_use]
    pub fn root(&self) -> &Path {
        &self.root
    }

    fn object_path(&self, resource_id: &str) -> Result<PathBuf, GatewayError> {
        validate_resource_id(resource_id)?;
        Ok(self.root.join(resource_id))
    }
}

impl StorageGateway for FsStorageGateway {
    fn put_object(&self, resource_id: String, body: Bytes) -> GatewayFuture<()> {
        let path = self.object_path(&resource_id);
        Box::pin(async move {
            let path = path?;
            debug!(path = %path.display(), size = body.len(), "writing object");
            tokio::fs::write(&path, &body).await?;
            Ok(())
        })
    }

    fn get_object(&self, resource_id: String) -> GatewayFuture<StoredObject> {
        let path = self.object_path(&resource_id);
        Box::pin(async move {
            let path = path?;
            debug!(path = %path.display(), "reading object");
            match tokio::fs::read(&path).await {
                Ok(data) => Ok(StoredObject {
                    content_type: guess_content_type(&resource_id),
                    data: Bytes::from(data),
                }),
                Err(e) if e.kind() == ErrorKind::NotFound => {
                    Err(GatewayError::NotFound(resource_id))
                }
                Err(e) => Err(GatewayError::Io(e)),
            }
        })
    }
}
