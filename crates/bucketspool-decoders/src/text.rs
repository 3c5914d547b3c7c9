//! Plain-text decoder: one record per line.

use async_trait::async_trait;
use bucketspool_core::object::ByteStream;
use bucketspool_core::{DecodeFault, DecodeStep, FaultKind, Record, RecordBody, RecordDecoder, ResumeOffset};

use crate::lines::LineReader;

pub struct TextLinesDecoder {
    record_id: String,
    reader: Option<LineReader>,
    offset: u64,
}

impl TextLinesDecoder {
    pub async fn open(
        record_id: impl Into<String>,
        content: ByteStream,
        offset: &ResumeOffset,
        max_line_len: usize,
    ) -> Result<Self, DecodeFault> {
        let reader = LineReader::open(content, offset, max_line_len).await?;
        Ok(Self {
            record_id: record_id.into(),
            offset: reader.position(),
            reader: Some(reader),
        })
    }
}

#[async_trait]
impl RecordDecoder for TextLinesDecoder {
    async fn next_record(&mut self) -> DecodeStep {
        let Some(reader) = self.reader.as_mut() else {
            return DecodeStep::Fault(DecodeFault::new(FaultKind::Io, "decoder is closed"));
        };
        let line = match reader.next_line().await {
            Ok(Some(line)) => line,
            Ok(None) => return DecodeStep::EndOfStream,
            Err(fault) => return DecodeStep::Fault(fault),
        };
        match String::from_utf8(line.bytes) {
            Ok(text) => {
                self.offset = line.end;
                DecodeStep::Record(Record::new(
                    format!("{}::{}", self.record_id, line.start),
                    RecordBody::Text(text),
                ))
            }
            Err(err) => DecodeStep::Fault(
                DecodeFault::malformed(format!("invalid UTF-8 at byte {}", line.start))
                    .with_source(err),
            ),
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
