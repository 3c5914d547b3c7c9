//! In-memory `ObjectStore` implementation.
//!
//! Suitable for testing and ephemeral pipelines. Every request is logged and
//! open handles are counted so callers can assert that nothing leaks. Read
//! faults and metadata failures can be injected per object.

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use std::collections::hash_map::DefaultHasher;
use std::collections::HashMap;
use std::hash::{Hash, Hasher};
use std::io;
use std::pin::Pin;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::{Arc, Mutex};
use std::task::{Context, Poll};
use tokio::io::{AsyncRead, ReadBuf};

use crate::error::TransportError;
use crate::object::{ByteStream, ObjectDescriptor, ObjectHandle, ObjectMetadata, ObjectStore};

/// Failure injected into an object's byte stream.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ReadFault {
    /// The read is interrupted by a pipeline stop.
    Aborted,
    /// The connection drops.
    ConnectionReset,
}

impl ReadFault {
    fn into_io_error(self) -> io::Error {
        let cause = match self {
            Self::Aborted => TransportError::Aborted,
            Self::ConnectionReset => TransportError::Http("connection reset by peer".into()),
        };
        io::Error::new(io::ErrorKind::Other, cause)
    }
}

/// An object stored in a [`MemoryObjectStore`].
#[derive(Debug, Clone)]
pub struct MemoryObject {
    data: Vec<u8>,
    owner: Option<String>,
    user_metadata: ObjectMetadata,
    last_modified: DateTime<Utc>,
    read_fault: Option<(usize, ReadFault)>,
    metadata_fails: bool,
}

impl MemoryObject {
    pub fn new(data: impl Into<Vec<u8>>) -> Self {
        Self {
            data: data.into(),
            owner: None,
            user_metadata: ObjectMetadata::new(),
            last_modified: Utc::now(),
            read_fault: None,
            metadata_fails: false,
        }
    }

    pub fn owner(mut self, owner: impl Into<String>) -> Self {
        self.owner = Some(owner.into());
        self
    }

    pub fn metadata(mut self, name: impl Into<String>, value: impl Into<serde_json::Value>) -> Self {
        self.user_metadata.insert(name.into(), value.into());
        self
    }

    /// Serve `after` bytes, then fail the next read with `fault`. Only the
    /// first handle opened on the object carries the fault.
    pub fn read_fault(mut self, after: usize, fault: ReadFault) -> Self {
        self.read_fault = Some((after, fault));
        self
    }

    /// Make every metadata lookup on this object fail.
    pub fn failing_metadata(mut self) -> Self {
        self.metadata_fails = true;
        self
    }

    fn etag(&self) -> String {
        let mut hasher = DefaultHasher::new();
        self.data.hash(&mut hasher);
        format!("{:016x}", hasher.finish())
    }
}

/// One `get_object` / `get_object_range` call seen by the store.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct GetRequest {
    pub bucket: String,
    pub key: String,
    /// `Some(len)` for a prefix range request.
    pub range: Option<u64>,
}

#[derive(Default)]
struct Inner {
    objects: Mutex<HashMap<(String, String), MemoryObject>>,
    requests: Mutex<Vec<GetRequest>>,
    open: AtomicUsize,
}

/// Thread-safe in-memory object store. Clones share state.
#[derive(Clone, Default)]
pub struct MemoryObjectStore {
    inner: Arc<Inner>,
}

impl MemoryObjectStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Store an object and return its descriptor.
    pub fn put(&self, bucket: &str, key: &str, object: MemoryObject) -> ObjectDescriptor {
        let descriptor = ObjectDescriptor {
            bucket: bucket.to_string(),
            key: key.to_string(),
            size: object.data.len() as u64,
            owner: object.owner.clone(),
            last_modified: object.last_modified,
        };
        if let Ok(mut objects) = self.inner.objects.lock() {
            objects.insert((bucket.to_string(), key.to_string()), object);
        }
        descriptor
    }

    /// Every request served so far, in order.
    pub fn requests(&self) -> Vec<GetRequest> {
        self.inner
            .requests
            .lock()
            .map(|r| r.clone())
            .unwrap_or_default()
    }

    /// Number of handles opened and not yet closed.
    pub fn open_handles(&self) -> usize {
        self.inner.open.load(Ordering::SeqCst)
    }

    fn open(
        &self,
        bucket: &str,
        key: &str,
        range: Option<u64>,
    ) -> Result<Box<dyn ObjectHandle>, TransportError> {
        if let Ok(mut requests) = self.inner.requests.lock() {
            requests.push(GetRequest {
                bucket: bucket.to_string(),
                key: key.to_string(),
                range,
            });
        }

        let object = {
            let mut objects = self
                .inner
                .objects
                .lock()
                .map_err(|_| TransportError::Other("object map poisoned".into()))?;
            let stored = objects
                .get_mut(&(bucket.to_string(), key.to_string()))
                .ok_or_else(|| TransportError::NotFound {
                    bucket: bucket.to_string(),
                    key: key.to_string(),
                })?;
            let object = stored.clone();
            stored.read_fault = None;
            object
        };

        let served = match range {
            Some(len) => object.data.len().min(len as usize),
            None => object.data.len(),
        };
        let etag = object.etag();
        let metadata = if object.metadata_fails {
            None
        } else {
            let mut metadata = object.user_metadata.clone();
            metadata.insert("Content-Length".into(), served.into());
            metadata.insert("ETag".into(), etag.clone().into());
            metadata.insert("Last-Modified".into(), object.last_modified.to_rfc3339().into());
            Some(metadata)
        };

        let reader = MemoryReader {
            limit: object.read_fault.map_or(served, |(after, _)| after.min(served)),
            fault: object.read_fault.map(|(_, fault)| fault),
            data: object.data[..served].to_vec(),
            pos: 0,
        };

        self.inner.open.fetch_add(1, Ordering::SeqCst);
        Ok(Box::new(MemoryHandle {
            key: key.to_string(),
            etag,
            metadata,
            content: Some(Box::pin(reader)),
            inner: Arc::clone(&self.inner),
            closed: false,
        }))
    }
}

#[async_trait]
impl ObjectStore for MemoryObjectStore {
    async fn get_object(
        &self,
        bucket: &str,
        key: &str,
    ) -> Result<Box<dyn ObjectHandle>, TransportError> {
        self.open(bucket, key, None)
    }

    async fn get_object_range(
        &self,
        bucket: &str,
        key: &str,
        len: u64,
    ) -> Result<Box<dyn ObjectHandle>, TransportError> {
        self.open(bucket, key, Some(len))
    }
}

struct MemoryHandle {
    key: String,
    etag: String,
    metadata: Option<ObjectMetadata>,
    content: Option<ByteStream>,
    inner: Arc<Inner>,
    closed: bool,
}

#[async_trait]
impl ObjectHandle for MemoryHandle {
    fn key(&self) -> &str {
        &self.key
    }

    fn etag(&self) -> Option<&str> {
        Some(&self.etag)
    }

    fn metadata(&self) -> Result<ObjectMetadata, TransportError> {
        self.metadata
            .clone()
            .ok_or_else(|| TransportError::Http(format!("metadata request for '{}' failed", self.key)))
    }

    fn take_content(&mut self) -> Option<ByteStream> {
        self.content.take()
    }

    async fn close(&mut self) -> Result<(), TransportError> {
        if !self.closed {
            self.closed = true;
            self.content = None;
            self.inner.open.fetch_sub(1, Ordering::SeqCst);
        }
        Ok(())
    }
}

struct MemoryReader {
    data: Vec<u8>,
    pos: usize,
    /// Bytes served before `fault` fires.
    limit: usize,
    fault: Option<ReadFault>,
}

impl AsyncRead for MemoryReader {
    fn poll_read(
        self: Pin<&mut Self>,
        _cx: &mut Context<'_>,
        buf: &mut ReadBuf<'_>,
    ) -> Poll<io::Result<()>> {
        let this = self.get_mut();
        if this.pos >= this.limit {
            if let Some(fault) = this.fault.take() {
                return Poll::Ready(Err(fault.into_io_error()));
            }
            return Poll::Ready(Ok(()));
        }
        let n = buf.remaining().min(this.limit - this.pos);
        buf.put_slice(&this.data[this.pos..this.pos + n]);
        this.pos += n;
        Poll::Ready(Ok(()))
    }
}
