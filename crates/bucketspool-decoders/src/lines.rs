//! Bounded, position-tracking line reader shared by the line decoders.

use bucketspool_core::{DecodeFault, FaultKind, ResumeOffset};
use bucketspool_core::object::ByteStream;
use tokio::io::{AsyncBufReadExt, AsyncReadExt, BufReader};
use tracing::debug;

/// One line of input, terminator stripped.
pub(crate) struct Line {
    pub bytes: Vec<u8>,
    /// Byte position of the first byte of the line.
    pub start: u64,
    /// Byte position just past the terminator.
    pub end: u64,
}

impl Line {
    pub fn is_blank(&self) -> bool {
        self.bytes.iter().all(u8::is_ascii_whitespace)
    }
}

pub(crate) struct LineReader {
    inner: BufReader<ByteStream>,
    position: u64,
    max_len: usize,
}

impl LineReader {
    /// Wrap `content` and skip to the byte position named by `offset`.
    pub async fn open(
        content: ByteStream,
        offset: &ResumeOffset,
        max_len: usize,
    ) -> Result<Self, DecodeFault> {
        let start = offset
            .position()
            .ok_or_else(|| DecodeFault::malformed(format!("invalid resume offset '{offset}'")))?;
        let mut inner = BufReader::new(content);
        if start > 0 {
            let skipped = tokio::io::copy(&mut (&mut inner).take(start), &mut tokio::io::sink())
                .await
                .map_err(DecodeFault::io)?;
            if skipped < start {
                return Err(DecodeFault::new(
                    FaultKind::Truncated,
                    format!("object ends at byte {skipped}, before resume offset {start}"),
                )
                .at_stream_offset(skipped));
            }
            debug!(position = start, "Skipped to resume offset");
        }
        Ok(Self {
            inner,
            position: start,
            max_len,
        })
    }

    pub fn position(&self) -> u64 {
        self.position
    }

    /// Read the next line. `None` at a clean end of stream. A final line
    /// without a terminator is still returned.
    pub async fn next_line(&mut self) -> Result<Option<Line>, DecodeFault> {
        let start = self.position;
        let mut bytes = Vec::new();
        loop {
            let available = self.inner.fill_buf().await.map_err(DecodeFault::io)?;
            if available.is_empty() {
                if bytes.is_empty() {
                    return Ok(None);
                }
                break;
            }
            let (take, found) = match available.iter().position(|b| *b == b'\n') {
                Some(i) => (i + 1, true),
                None => (available.len(), false),
            };
            bytes.extend_from_slice(&available[..take]);
            self.inner.consume(take);
            self.position += take as u64;

            let content_len = if found { bytes.len() - 1 } else { bytes.len() };
            if content_len > self.max_len {
                return Err(DecodeFault::object_too_large(self.max_len, start));
            }
            if found {
                break;
            }
        }

        if bytes.last() == Some(&b'\n') {
            bytes.pop();
        }
        if bytes.last() == Some(&b'\r') {
            bytes.pop();
        }
        Ok(Some(Line {
            bytes,
            start,
            end: self.position,
        }))
    }
}
