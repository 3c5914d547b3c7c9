//! Directory-backed `ObjectStore`: `<root>/<bucket>/<key>`.

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use std::path::{Component, Path, PathBuf};
use tokio::io::AsyncReadExt;

use crate::error::TransportError;
use crate::object::{ByteStream, ObjectDescriptor, ObjectHandle, ObjectMetadata, ObjectStore};

/// Serves objects from the local filesystem. Buckets are the immediate
/// sub-directories of `root`; keys may contain `/`.
#[derive(Debug, Clone)]
pub struct LocalObjectStore {
    root: PathBuf,
}

impl LocalObjectStore {
    pub fn new(root: impl Into<PathBuf>) -> Self {
        Self { root: root.into() }
    }

    pub fn root(&self) -> &Path {
        &self.root
    }

    fn path(&self, bucket: &str, key: &str) -> Result<PathBuf, TransportError> {
        let escapes = |s: &str| {
            Path::new(s)
                .components()
                .any(|c| !matches!(c, Component::Normal(_)))
        };
        if bucket.is_empty() || key.is_empty() || escapes(bucket) || escapes(key) {
            return Err(TransportError::AccessDenied(format!("{bucket}/{key}")));
        }
        Ok(self.root.join(bucket).join(key))
    }

    /// Build the descriptor of one object from its file metadata.
    pub async fn describe(&self, bucket: &str, key: &str) -> Result<ObjectDescriptor, TransportError> {
        let path = self.path(bucket, key)?;
        let meta = tokio::fs::metadata(&path)
            .await
            .map_err(|e| not_found_or_io(e, bucket, key))?;
        Ok(ObjectDescriptor {
            bucket: bucket.to_string(),
            key: key.to_string(),
            size: meta.len(),
            owner: None,
            last_modified: meta.modified().map(DateTime::<Utc>::from).unwrap_or_else(|_| Utc::now()),
        })
    }

    async fn open(
        &self,
        bucket: &str,
        key: &str,
        range: Option<u64>,
    ) -> Result<Box<dyn ObjectHandle>, TransportError> {
        let path = self.path(bucket, key)?;
        let file = tokio::fs::File::open(&path)
            .await
            .map_err(|e| not_found_or_io(e, bucket, key))?;
        let meta = file.metadata().await?;
        let size = meta.len();
        let modified = meta
            .modified()
            .map(DateTime::<Utc>::from)
            .unwrap_or_else(|_| Utc::now());
        let served = range.map_or(size, |len| len.min(size));
        let etag = format!("{:x}-{:x}", size, modified.timestamp_millis());

        let mut metadata = ObjectMetadata::new();
        metadata.insert("Content-Length".into(), served.into());
        metadata.insert("ETag".into(), etag.clone().into());
        metadata.insert("Last-Modified".into(), modified.to_rfc3339().into());

        Ok(Box::new(LocalHandle {
            key: key.to_string(),
            etag,
            metadata,
            content: Some(Box::pin(file.take(served))),
        }))
    }
}

fn not_found_or_io(err: std::io::Error, bucket: &str, key: &str) -> TransportError {
    if err.kind() == std::io::ErrorKind::NotFound {
        TransportError::NotFound {
            bucket: bucket.to_string(),
            key: key.to_string(),
        }
    } else {
        TransportError::Io(err)
    }
}

#[async_trait]
impl ObjectStore for LocalObjectStore {
    async fn get_object(
        &self,
        bucket: &str,
        key: &str,
    ) -> Result<Box<dyn ObjectHandle>, TransportError> {
        self.open(bucket, key, None).await
    }

    async fn get_object_range(
        &self,
        bucket: &str,
        key: &str,
        len: u64,
    ) -> Result<Box<dyn ObjectHandle>, TransportError> {
        self.open(bucket, key, Some(len)).await
    }
}

struct LocalHandle {
    key: String,
    etag: String,
    metadata: ObjectMetadata,
    content: Option<ByteStream>,
}

#[async_trait]
impl ObjectHandle for LocalHandle {
    fn key(&self) -> &str {
        &self.key
    }

    fn etag(&self) -> Option<&str> {
        Some(&self.etag)
    }

    fn metadata(&self) -> Result<ObjectMetadata, TransportError> {
        Ok(self.metadata.clone())
    }

    fn take_content(&mut self) -> Option<ByteStream> {
        self.content.take()
    }

    async fn close(&mut self) -> Result<(), TransportError> {
        self.content = None;
        Ok(())
    }
}
