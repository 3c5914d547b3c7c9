//! The `RecordDecoder` capability and the factory that builds decoders.
//!
//! A decoder is a pull cursor over one object: each call to
//! [`RecordDecoder::next_record`] yields a tagged [`DecodeStep`], and
//! [`RecordDecoder::offset`] reports the resume position after the last
//! record that was successfully produced.

use async_trait::async_trait;

use crate::error::DecodeFault;
use crate::object::{ByteStream, FileRef, ObjectMetadata};
use crate::offset::ResumeOffset;
use crate::record::Record;

/// Outcome of one decode step.
#[derive(Debug)]
pub enum DecodeStep {
    Record(Record),
    /// Clean end of the object.
    EndOfStream,
    Fault(DecodeFault),
}

/// A stateful decoding cursor over one object.
///
/// Not safe for concurrent use; owned by a single reader session.
#[async_trait]
pub trait RecordDecoder: Send {
    /// Decode the next record.
    async fn next_record(&mut self) -> DecodeStep;

    /// Resume position after the last successfully decoded record. A decoder
    /// that knows the object is finished returns [`ResumeOffset::done`].
    fn offset(&self) -> Result<ResumeOffset, DecodeFault>;

    /// Release the byte stream.
    async fn close(&mut self) -> Result<(), DecodeFault>;
}

/// Builds decoders for a configured data format.
#[async_trait]
pub trait DecoderFactory: Send + Sync {
    /// Build a decoder over `content`, positioned at `offset`.
    async fn create(
        &self,
        record_id: &str,
        content: ByteStream,
        offset: &ResumeOffset,
    ) -> Result<Box<dyn RecordDecoder>, DecodeFault>;

    /// Build a decoder that yields exactly one record referencing the whole
    /// object.
    fn whole_object(
        &self,
        record_id: &str,
        metadata: ObjectMetadata,
        file_ref: FileRef,
    ) -> Result<Box<dyn RecordDecoder>, DecodeFault>;
}
