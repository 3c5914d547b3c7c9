//! Decoder that emits a single record referencing an entire object.

use async_trait::async_trait;
use bucketspool_core::{
    DecodeFault, DecodeStep, FileRef, ObjectMetadata, Record, RecordBody, RecordDecoder, ResumeOffset,
};

/// Yields one `RecordBody::WholeObject`, then end-of-stream. Once the record
/// is out the offset is `done`.
pub struct WholeObjectDecoder {
    record_id: String,
    pending: Option<(FileRef, ObjectMetadata)>,
}

impl WholeObjectDecoder {
    pub fn new(record_id: impl Into<String>, metadata: ObjectMetadata, file_ref: FileRef) -> Self {
        Self {
            record_id: record_id.into(),
            pending: Some((file_ref, metadata)),
        }
    }
}

#[async_trait]
impl RecordDecoder for WholeObjectDecoder {
    async fn next_record(&mut self) -> DecodeStep {
        match self.pending.take() {
            Some((file_ref, file_info)) => DecodeStep::Record(Record::new(
                format!("{}::0", self.record_id),
                RecordBody::WholeObject { file_ref, file_info },
            )),
            None => DecodeStep::EndOfStream,
        }
    }

    fn offset(&self) -> Result<ResumeOffset, DecodeFault> {
        Ok(if self.pending.is_some() {
            ResumeOffset::start()
        } else {
            ResumeOffset::done()
        })
    }

    async fn close(&mut self) -> Result<(), DecodeFault> {
        self.pending = None;
        Ok(())
    }
}
