//! Object-store capabilities consumed by the producer.
//!
//! The producer never talks to a concrete client. It opens objects through
//! [`ObjectStore`] and reads them through the [`ObjectHandle`] it gets back,
//! which owns the underlying connection until [`ObjectHandle::close`].

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::pin::Pin;
use tokio::io::AsyncRead;

use crate::error::TransportError;

/// Body of a remote object, read sequentially.
pub type ByteStream = Pin<Box<dyn AsyncRead + Send>>;

/// Object metadata: user-defined entries plus whatever system headers the
/// store exposes (`Content-Length`, `ETag`, ...).
pub type ObjectMetadata = BTreeMap<String, serde_json::Value>;

/// Identifies one remote object, as supplied by the external lister.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ObjectDescriptor {
    /// Bucket (container) name.
    pub bucket: String,
    /// Object key within the bucket.
    pub key: String,
    /// Size in bytes.
    pub size: u64,
    /// Owner display name, when the store reports one.
    pub owner: Option<String>,
    /// Last modification time.
    pub last_modified: DateTime<Utc>,
}

impl ObjectDescriptor {
    pub fn new(bucket: impl Into<String>, key: impl Into<String>, size: u64) -> Self {
        Self {
            bucket: bucket.into(),
            key: key.into(),
            size,
            owner: None,
            last_modified: Utc::now(),
        }
    }

    pub fn owner(mut self, owner: impl Into<String>) -> Self {
        self.owner = Some(owner.into());
        self
    }

    pub fn last_modified(mut self, at: DateTime<Utc>) -> Self {
        self.last_modified = at;
        self
    }
}

/// An open channel to one object.
#[async_trait]
pub trait ObjectHandle: Send {
    /// Key this handle is bound to.
    fn key(&self) -> &str;

    /// Entity tag reported by the store (hex MD5 for single-part uploads).
    fn etag(&self) -> Option<&str>;

    /// Metadata of the object. Callers treat this as best-effort.
    fn metadata(&self) -> Result<ObjectMetadata, TransportError>;

    /// Take the body out of the handle. Returns `None` once taken.
    fn take_content(&mut self) -> Option<ByteStream>;

    /// Release the underlying connection.
    async fn close(&mut self) -> Result<(), TransportError>;
}

/// A remote key-addressed byte store.
///
/// # Thread Safety
/// Implementations must be `Send + Sync` so one client can serve several
/// producers; the handles they return are used by one producer only.
#[async_trait]
pub trait ObjectStore: Send + Sync {
    /// Open the whole object.
    async fn get_object(
        &self,
        bucket: &str,
        key: &str,
    ) -> Result<Box<dyn ObjectHandle>, TransportError>;

    /// Open the first `len` bytes of the object.
    async fn get_object_range(
        &self,
        bucket: &str,
        key: &str,
        len: u64,
    ) -> Result<Box<dyn ObjectHandle>, TransportError>;
}

/// Hash algorithm of an expected checksum.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ChecksumAlgorithm {
    #[default]
    Md5,
    Sha256,
}

/// Expected checksum a downstream reader should verify the object against.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Checksum {
    pub algorithm: ChecksumAlgorithm,
    /// Hex-encoded digest.
    pub value: String,
}

/// Opaque reference to a whole remote object. The bytes are not
/// materialized; a downstream stage opens the object itself.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct FileRef {
    pub bucket: String,
    pub key: String,
    pub total_size: u64,
    /// Read buffer size a downstream reader should use.
    pub buffer_size: usize,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub checksum: Option<Checksum>,
}

impl FileRef {
    pub fn new(object: &ObjectDescriptor, buffer_size: usize) -> Self {
        Self {
            bucket: object.bucket.clone(),
            key: object.key.clone(),
            total_size: object.size,
            buffer_size,
            checksum: None,
        }
    }

    pub fn verify_checksum(mut self, algorithm: ChecksumAlgorithm, value: impl Into<String>) -> Self {
        self.checksum = Some(Checksum {
            algorithm,
            value: value.into(),
        });
        self
    }
}
