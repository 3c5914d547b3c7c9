//! Error record handling — what happens to a record that failed to decode.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::str::FromStr;
use std::sync::{Arc, Mutex};
use tracing::warn;

use crate::error::{DecodeFault, ErrorCode, ProduceError};
use crate::offset::ResumeOffset;

/// Configured reaction to a recoverable per-record failure.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum OnRecordError {
    /// Drop the record silently.
    Discard,
    /// Report the record to the error sink and keep the pipeline running.
    #[default]
    ToError,
    /// Promote the failure to a stage-fatal error.
    StopPipeline,
}

impl FromStr for OnRecordError {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "discard" => Ok(Self::Discard),
            "to-error" => Ok(Self::ToError),
            "stop-pipeline" => Ok(Self::StopPipeline),
            other => Err(format!("Unknown on-record-error value '{other}'")),
        }
    }
}

/// A per-record failure handed to the [`ErrorRecordHandler`].
#[derive(Debug)]
pub struct RecordError {
    pub code: ErrorCode,
    pub key: String,
    pub offset: ResumeOffset,
    pub cause: DecodeFault,
}

impl RecordError {
    pub fn new(code: ErrorCode, key: impl Into<String>, offset: ResumeOffset, cause: DecodeFault) -> Self {
        Self {
            code,
            key: key.into(),
            offset,
            cause,
        }
    }

    pub fn report(&self) -> ErrorReport {
        ErrorReport {
            code: self.code,
            key: self.key.clone(),
            offset: self.offset.clone(),
            message: self.cause.to_string(),
            reported_at: Utc::now(),
        }
    }

    pub fn into_stopped(self) -> ProduceError {
        ProduceError::Stopped {
            code: self.code,
            key: self.key,
            offset: self.offset,
            source: self.cause,
        }
    }
}

/// Operator-visible record of a failure routed to the error sink.
#[derive(Debug, Clone, Serialize)]
pub struct ErrorReport {
    #[serde(serialize_with = "serialize_code")]
    pub code: ErrorCode,
    pub key: String,
    pub offset: ResumeOffset,
    pub message: String,
    pub reported_at: DateTime<Utc>,
}

fn serialize_code<S: serde::Serializer>(code: &ErrorCode, s: S) -> Result<S::Ok, S::Error> {
    s.serialize_str(code.code())
}

/// Decides the fate of recoverable per-record failures.
pub trait ErrorRecordHandler: Send + Sync {
    /// The configured policy.
    fn policy(&self) -> OnRecordError;

    /// Handle one failed record. Returns `Err` only when the failure is
    /// escalated and the pipeline must stop.
    fn on_error(&self, error: RecordError) -> Result<(), ProduceError>;

    /// Record a failure in the error sink without deciding anything.
    fn report(&self, report: ErrorReport);
}

/// Policy-driven handler backed by an in-memory error sink.
#[derive(Clone)]
pub struct DefaultErrorRecordHandler {
    policy: OnRecordError,
    sink: Arc<Mutex<Vec<ErrorReport>>>,
}

impl DefaultErrorRecordHandler {
    pub fn new(policy: OnRecordError) -> Self {
        Self {
            policy,
            sink: Arc::new(Mutex::new(Vec::new())),
        }
    }

    /// Snapshot of everything reported so far.
    pub fn reports(&self) -> Vec<ErrorReport> {
        self.sink.lock().map(|s| s.clone()).unwrap_or_default()
    }

    /// Take all reports, leaving the sink empty.
    pub fn drain(&self) -> Vec<ErrorReport> {
        self.sink
            .lock()
            .map(|mut s| std::mem::take(&mut *s))
            .unwrap_or_default()
    }
}

impl ErrorRecordHandler for DefaultErrorRecordHandler {
    fn policy(&self) -> OnRecordError {
        self.policy
    }

    fn on_error(&self, error: RecordError) -> Result<(), ProduceError> {
        match self.policy {
            OnRecordError::Discard => Ok(()),
            OnRecordError::ToError => {
                self.report(error.report());
                Ok(())
            }
            OnRecordError::StopPipeline => {
                self.report(error.report());
                Err(error.into_stopped())
            }
        }
    }

    fn report(&self, report: ErrorReport) {
        warn!(
            code = report.code.code(),
            key = %report.key,
            offset = %report.offset,
            "record error: {}",
            report.message
        );
        if let Ok(mut sink) = self.sink.lock() {
            sink.push(report);
        }
    }
}
