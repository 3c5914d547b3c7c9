//! Offset checkpoints — persists per-object resume offsets across restarts.
//!
//! The producer never persists anything itself; it returns the offset to
//! resume from. Schedulers store that offset here after each batch and
//! read it back on restart, so a crashed run resumes mid-object and never
//! re-reads an object it already finished.

use std::collections::BTreeMap;
use std::path::{Path, PathBuf};

use async_trait::async_trait;
use bucketspool_core::{ObjectDescriptor, ResumeOffset};
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use thiserror::Error;
use tracing::debug;

#[derive(Debug, Error)]
pub enum CheckpointError {
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("Serialization error: {0}")]
    Serialization(#[from] serde_json::Error),

    #[error("Checkpoint store unavailable: {0}")]
    Unavailable(String),
}

/// A persisted offset for one object.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct OffsetCheckpoint {
    pub bucket: String,
    pub key: String,
    pub offset: ResumeOffset,
    /// Modification time of the object the offset was taken from.
    pub last_modified: DateTime<Utc>,
    /// Unix timestamp of when this checkpoint was saved.
    pub updated_at: i64,
}

/// Storage for offset checkpoints.
#[async_trait]
pub trait OffsetStore: Send + Sync {
    async fn load(&self, bucket: &str, key: &str) -> Result<Option<OffsetCheckpoint>, CheckpointError>;

    /// Save (upsert) a checkpoint.
    async fn save(&self, checkpoint: OffsetCheckpoint) -> Result<(), CheckpointError>;

    async fn delete(&self, bucket: &str, key: &str) -> Result<(), CheckpointError>;
}

fn store_key(bucket: &str, key: &str) -> String {
    format!("{bucket}:{key}")
}

/// Reads and writes resume offsets for objects.
pub struct CheckpointManager {
    store: Box<dyn OffsetStore>,
}

impl CheckpointManager {
    pub fn new(store: Box<dyn OffsetStore>) -> Self {
        Self { store }
    }

    /// The offset to resume `object` from.
    ///
    /// Falls back to the start when there is no checkpoint or when the
    /// object was rewritten after the checkpoint was taken.
    pub async fn resume_offset(&self, object: &ObjectDescriptor) -> Result<ResumeOffset, CheckpointError> {
        match self.store.load(&object.bucket, &object.key).await? {
            Some(cp) if cp.last_modified == object.last_modified => Ok(cp.offset),
            Some(_) => {
                debug!(key = %object.key, "Object changed since its checkpoint; starting over");
                Ok(ResumeOffset::start())
            }
            None => Ok(ResumeOffset::start()),
        }
    }

    pub async fn commit(&self, object: &ObjectDescriptor, offset: &ResumeOffset) -> Result<(), CheckpointError> {
        self.store
            .save(OffsetCheckpoint {
                bucket: object.bucket.clone(),
                key: object.key.clone(),
                offset: offset.clone(),
                last_modified: object.last_modified,
                updated_at: Utc::now().timestamp(),
            })
            .await
    }

    pub async fn reset(&self, object: &ObjectDescriptor) -> Result<(), CheckpointError> {
        self.store.delete(&object.bucket, &object.key).await
    }
}

// ─── In-memory store (for testing) ────────────────────────────────────────────

use std::collections::HashMap;
use std::sync::Mutex;

/// In-memory offset store for tests and ephemeral runs.
#[derive(Default)]
pub struct MemoryOffsetStore {
    data: Mutex<HashMap<String, OffsetCheckpoint>>,
}

impl MemoryOffsetStore {
    pub fn new() -> Self {
        Self::default()
    }

    fn data(&self) -> Result<std::sync::MutexGuard<'_, HashMap<String, OffsetCheckpoint>>, CheckpointError> {
        self.data
            .lock()
            .map_err(|_| CheckpointError::Unavailable("lock poisoned".into()))
    }
}

#[async_trait]
impl OffsetStore for MemoryOffsetStore {
    async fn load(&self, bucket: &str, key: &str) -> Result<Option<OffsetCheckpoint>, CheckpointError> {
        Ok(self.data()?.get(&store_key(bucket, key)).cloned())
    }

    async fn save(&self, checkpoint: OffsetCheckpoint) -> Result<(), CheckpointError> {
        let key = store_key(&checkpoint.bucket, &checkpoint.key);
        self.data()?.insert(key, checkpoint);
        Ok(())
    }

    async fn delete(&self, bucket: &str, key: &str) -> Result<(), CheckpointError> {
        self.data()?.remove(&store_key(bucket, key));
        Ok(())
    }
}

// ─── JSON file store ──────────────────────────────────────────────────────────

/// Offset store backed by a single JSON document on disk.
///
/// The file is read on first access and rewritten in full on every change
/// through a sibling temp file and a rename.
pub struct JsonFileOffsetStore {
    path: PathBuf,
    cache: tokio::sync::Mutex<Option<BTreeMap<String, OffsetCheckpoint>>>,
}

impl JsonFileOffsetStore {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self {
            path: path.into(),
            cache: tokio::sync::Mutex::new(None),
        }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    async fn read_file(&self) -> Result<BTreeMap<String, OffsetCheckpoint>, CheckpointError> {
        match tokio::fs::read(&self.path).await {
            Ok(bytes) if bytes.is_empty() => Ok(BTreeMap::new()),
            Ok(bytes) => Ok(serde_json::from_slice(&bytes)?),
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => Ok(BTreeMap::new()),
            Err(e) => Err(e.into()),
        }
    }

    async fn write_file(&self, data: &BTreeMap<String, OffsetCheckpoint>) -> Result<(), CheckpointError> {
        let json = serde_json::to_vec_pretty(data)?;
        let tmp = self.path.with_extension("tmp");
        tokio::fs::write(&tmp, json).await?;
        tokio::fs::rename(&tmp, &self.path).await?;
        Ok(())
    }

    /// Apply `update` to the loaded document and persist the result.
    async fn modify<F>(&self, update: F) -> Result<(), CheckpointError>
    where
        F: FnOnce(&mut BTreeMap<String, OffsetCheckpoint>) + Send,
    {
        let mut cache = self.cache.lock().await;
        let mut data = match cache.take() {
            Some(data) => data,
            None => self.read_file().await?,
        };
        update(&mut data);
        let written = self.write_file(&data).await;
        *cache = Some(data);
        written
    }
}

#[async_trait]
impl OffsetStore for JsonFileOffsetStore {
    async fn load(&self, bucket: &str, key: &str) -> Result<Option<OffsetCheckpoint>, CheckpointError> {
        let mut cache = self.cache.lock().await;
        if cache.is_none() {
            *cache = Some(self.read_file().await?);
        }
        Ok(cache
            .as_ref()
            .and_then(|data| data.get(&store_key(bucket, key)).cloned()))
    }

    async fn save(&self, checkpoint: OffsetCheckpoint) -> Result<(), CheckpointError> {
        let key = store_key(&checkpoint.bucket, &checkpoint.key);
        self.modify(move |data| {
            data.insert(key, checkpoint);
        })
        .await
    }

    async fn delete(&self, bucket: &str, key: &str) -> Result<(), CheckpointError> {
        let key = store_key(bucket, key);
        self.modify(move |data| {
            data.remove(&key);
        })
        .await
    }
}
