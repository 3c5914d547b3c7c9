//! Newline-delimited JSON decoder.

use async_trait::async_trait;
use bucketspool_core::object::ByteStream;
use bucketspool_core::{DecodeFault, DecodeStep, FaultKind, Record, RecordBody, RecordDecoder, ResumeOffset};

use crate::lines::LineReader;

/// Decodes one JSON value per line. Blank lines are skipped.
pub struct JsonLinesDecoder {
    record_id: String,
    reader: Option<LineReader>,
    /// Byte position past the last produced record.
    offset: u64,
}

impl JsonLinesDecoder {
    pub async fn open(
        record_id: impl Into<String>,
        content: ByteStream,
        offset: &ResumeOffset,
        max_record_len: usize,
    ) -> Result<Self, DecodeFault> {
        let reader = LineReader::open(content, offset, max_record_len).await?;
        Ok(Self {
            record_id: record_id.into(),
            offset: reader.position(),
            reader: Some(reader),
        })
    }
}

#[async_trait]
impl RecordDecoder for JsonLinesDecoder {
    async fn next_record(&mut self) -> DecodeStep {
        let Some(reader) = self.reader.as_mut() else {
            return DecodeStep::Fault(DecodeFault::new(FaultKind::Io, "decoder is closed"));
        };
        loop {
            let line = match reader.next_line().await {
                Ok(Some(line)) => line,
                Ok(None) => return DecodeStep::EndOfStream,
                Err(fault) => return DecodeStep::Fault(fault),
            };
            if line.is_blank() {
                self.offset = line.end;
                continue;
            }
            return match serde_json::from_slice(&line.bytes) {
                Ok(value) => {
                    self.offset = line.end;
                    DecodeStep::Record(Record::new(
                        format!("{}::{}", self.record_id, line.start),
                        RecordBody::Json(value),
                    ))
                }
                Err(err) => DecodeStep::Fault(
                    DecodeFault::malformed(format!("invalid JSON at byte {}: {err}", line.start))
                        .with_source(err),
                ),
            };
        }
    }

    fn offset(&self) -> Result<ResumeOffset, DecodeFault> {
        Ok(ResumeOffset::from_position(self.offset))
    }

    async fn close(&mut self) -> Result<(), DecodeFault> {
        self.reader = None;
        Ok(())
    }
}
