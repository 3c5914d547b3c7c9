//! Error types for the BucketSpool produce pipeline.

use std::error::Error as StdError;
use std::fmt;
use thiserror::Error;

use crate::offset::ResumeOffset;

/// Boxed error used as the underlying cause of a decode fault.
pub type BoxError = Box<dyn StdError + Send + Sync + 'static>;

/// Errors raised by an object-store client.
#[derive(Debug, Error)]
pub enum TransportError {
    /// The in-flight request was interrupted because the pipeline is stopping.
    #[error("Request aborted")]
    Aborted,

    #[error("Object not found: {bucket}/{key}")]
    NotFound { bucket: String, key: String },

    #[error("Access denied: {0}")]
    AccessDenied(String),

    /// HTTP request failed (connection reset, 5xx, etc.).
    #[error("HTTP error: {0}")]
    Http(String),

    #[error("Request timed out after {ms}ms")]
    Timeout { ms: u64 },

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("{0}")]
    Other(String),
}

impl TransportError {
    /// Returns `true` if the request was cancelled rather than failed.
    pub fn is_aborted(&self) -> bool {
        matches!(self, Self::Aborted)
    }

    /// Returns `true` if the error is transient. Retrying is the client's job;
    /// the producer never retries.
    pub fn is_retryable(&self) -> bool {
        matches!(self, Self::Http(_) | Self::Timeout { .. } | Self::Io(_))
    }
}

/// Category of a per-record decode failure.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FaultKind {
    /// A single record exceeded the configured maximum length.
    ObjectTooLarge,
    /// The bytes do not form a valid record.
    Malformed,
    /// The stream ended in the middle of a record.
    Truncated,
    /// Generic read failure.
    Io,
    /// The decoder surfaced an object-store client failure directly.
    Transport,
}

impl fmt::Display for FaultKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::ObjectTooLarge => write!(f, "object-too-large"),
            Self::Malformed => write!(f, "malformed"),
            Self::Truncated => write!(f, "truncated"),
            Self::Io => write!(f, "io"),
            Self::Transport => write!(f, "transport"),
        }
    }
}

/// A failure reported by a [`RecordDecoder`](crate::decoder::RecordDecoder).
#[derive(Debug, Error)]
#[error("{kind} fault: {detail}")]
pub struct DecodeFault {
    pub kind: FaultKind,
    pub detail: String,
    /// Stream position at which the failure was detected, when the decoder
    /// knows it more precisely than its own offset.
    pub stream_offset: Option<u64>,
    #[source]
    source: Option<BoxError>,
}

impl DecodeFault {
    pub fn new(kind: FaultKind, detail: impl Into<String>) -> Self {
        Self {
            kind,
            detail: detail.into(),
            stream_offset: None,
            source: None,
        }
    }

    pub fn with_source(mut self, source: impl Into<BoxError>) -> Self {
        self.source = Some(source.into());
        self
    }

    pub fn at_stream_offset(mut self, position: u64) -> Self {
        self.stream_offset = Some(position);
        self
    }

    pub fn object_too_large(limit: usize, position: u64) -> Self {
        Self::new(
            FaultKind::ObjectTooLarge,
            format!("record starting at byte {position} exceeds max length {limit}"),
        )
        .at_stream_offset(position)
    }

    pub fn malformed(detail: impl Into<String>) -> Self {
        Self::new(FaultKind::Malformed, detail)
    }

    /// Classify a read error. `UnexpectedEof` means the stream was cut short.
    pub fn io(err: std::io::Error) -> Self {
        let kind = if err.kind() == std::io::ErrorKind::UnexpectedEof {
            FaultKind::Truncated
        } else {
            FaultKind::Io
        };
        Self::new(kind, err.to_string()).with_source(err)
    }

    pub fn transport(err: TransportError) -> Self {
        Self::new(FaultKind::Transport, err.to_string()).with_source(err)
    }

    pub fn is_object_too_large(&self) -> bool {
        self.kind == FaultKind::ObjectTooLarge
    }

    /// Walk the cause chain looking for an object-store client error,
    /// including one wrapped inside an `io::Error` by the byte stream.
    pub fn transport_cause(&self) -> Option<&TransportError> {
        let mut next: Option<&(dyn StdError + 'static)> =
            self.source.as_deref().map(|e| e as &(dyn StdError + 'static));
        while let Some(err) = next {
            if let Some(transport) = err.downcast_ref::<TransportError>() {
                return Some(transport);
            }
            if let Some(inner) = err
                .downcast_ref::<std::io::Error>()
                .and_then(|io| io.get_ref())
                .and_then(|inner| inner.downcast_ref::<TransportError>())
            {
                return Some(inner);
            }
            next = err.source();
        }
        None
    }

    /// The pipeline was stopped while a read was blocked.
    pub fn is_cancellation(&self) -> bool {
        self.transport_cause().is_some_and(TransportError::is_aborted)
    }

    /// A genuine client failure, as opposed to a cancellation or bad data.
    pub fn is_transport(&self) -> bool {
        if self.is_cancellation() {
            return false;
        }
        self.kind == FaultKind::Transport || self.transport_cause().is_some()
    }
}

/// Stable error codes attached to reported and stage-fatal errors.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ErrorCode {
    /// A record exceeded the maximum record length.
    RecordTooLarge,
    /// A record could not be decoded.
    DecodeFailed,
}

impl ErrorCode {
    pub fn code(&self) -> &'static str {
        match self {
            Self::RecordTooLarge => "SPOOL_02",
            Self::DecodeFailed => "SPOOL_03",
        }
    }
}

impl fmt::Display for ErrorCode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::RecordTooLarge => write!(f, "{} - Object too large", self.code()),
            Self::DecodeFailed => write!(f, "{} - Error decoding record", self.code()),
        }
    }
}

/// Stage-level errors returned by `produce`.
#[derive(Debug, Error)]
pub enum ProduceError {
    /// The object-store client failed. Fatal for the current call.
    #[error("Error processing object '{key}' at offset '{offset}': {reason}")]
    Transport {
        key: String,
        offset: ResumeOffset,
        reason: String,
    },

    /// The object cannot be processed past `offset`; the scheduler should
    /// report it and move on to the next object.
    #[error("Object '{key}' is unprocessable from offset '{offset}': {source}")]
    BadObject {
        key: String,
        offset: ResumeOffset,
        #[source]
        source: DecodeFault,
    },

    /// A record error was escalated; the pipeline must stop.
    #[error("{code}: object '{key}' at offset '{offset}': {source}")]
    Stopped {
        code: ErrorCode,
        key: String,
        offset: ResumeOffset,
        #[source]
        source: DecodeFault,
    },
}

impl ProduceError {
    pub fn key(&self) -> &str {
        match self {
            Self::Transport { key, .. } | Self::BadObject { key, .. } | Self::Stopped { key, .. } => key,
        }
    }

    pub fn offset(&self) -> &ResumeOffset {
        match self {
            Self::Transport { offset, .. }
            | Self::BadObject { offset, .. }
            | Self::Stopped { offset, .. } => offset,
        }
    }

    /// Returns `true` if the pipeline may continue with the next object.
    pub fn is_bad_object(&self) -> bool {
        matches!(self, Self::BadObject { .. })
    }
}
