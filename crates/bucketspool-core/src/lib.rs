//! # bucketspool-core
//!
//! Core traits, types, and primitives shared across all BucketSpool crates.
//! The batch producer, the record decoders, and the object stores are all
//! built on the interfaces defined here.
//!
//! ## Architecture
//! ```text
//! ObjectStore ──get_object──▶ ObjectHandle ──take_content──▶ ByteStream
//!                                                              │
//!                                           DecoderFactory::create
//!                                                              ▼
//!                                RecordDecoder::next_record → DecodeStep
//!                                                              │
//!                                 Fault ──▶ ErrorRecordHandler (policy)
//! ```

pub mod decoder;
pub mod error;
pub mod handler;
pub mod local;
pub mod memory;
pub mod object;
pub mod offset;
pub mod record;

pub use decoder::{DecodeStep, DecoderFactory, RecordDecoder};
pub use error::{DecodeFault, ErrorCode, FaultKind, ProduceError, TransportError};
pub use handler::{DefaultErrorRecordHandler, ErrorRecordHandler, ErrorReport, OnRecordError, RecordError};
pub use local::LocalObjectStore;
pub use memory::{MemoryObject, MemoryObjectStore, ReadFault};
pub use object::{ByteStream, Checksum, ChecksumAlgorithm, FileRef, ObjectDescriptor, ObjectHandle, ObjectMetadata, ObjectStore};
pub use offset::ResumeOffset;
pub use record::{Header, Record, RecordBody};
