//! # bucketspool-producer
//!
//! Resumable streaming batch producer.
//!
//! A scheduler calls [`BatchProducer::produce`] repeatedly with an object,
//! the last offset it persisted, and a batch bound. The producer opens the
//! object lazily, keeps the handle and decoder alive in a [`ReaderContext`]
//! across calls, and returns the offset to persist next.
//!
//! ```text
//! scheduler ──(object, offset, max)──▶ BatchProducer::produce
//!                                          │
//!              ReaderContext ◀─ session ───┤  (handle + decoder, lazily opened)
//!                                          │
//!              BatchMaker    ◀─ records ───┤
//!                                          │
//!              ErrorRecordHandler ◀ faults ┘
//! ```

pub mod batch;
pub mod checkpoint;
pub mod config;
mod metadata;
pub mod producer;
pub mod session;
mod whole_object;

pub use batch::BatchMaker;
pub use checkpoint::{CheckpointError, CheckpointManager, JsonFileOffsetStore, MemoryOffsetStore, OffsetCheckpoint, OffsetStore};
pub use config::{ProducerConfig, WholeObjectConfig, DEFAULT_FETCH_SIZE};
pub use producer::BatchProducer;
pub use session::{ReaderContext, ReaderSession};
