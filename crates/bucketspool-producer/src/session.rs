//! Reader sessions — the open handle and decoder for one in-progress object.

use bucketspool_core::{ObjectHandle, RecordDecoder, ResumeOffset};
use tracing::{debug, info};

/// Live state for one object: the decoder, the handle it reads from (absent
/// in whole-object mode), and the key both are bound to.
pub struct ReaderSession {
    key: String,
    /// Offset the decoder will continue from; the last one handed out.
    pub(crate) position: ResumeOffset,
    pub(crate) handle: Option<Box<dyn ObjectHandle>>,
    pub(crate) decoder: Box<dyn RecordDecoder>,
}

impl ReaderSession {
    pub(crate) fn new(
        key: impl Into<String>,
        position: ResumeOffset,
        handle: Option<Box<dyn ObjectHandle>>,
        decoder: Box<dyn RecordDecoder>,
    ) -> Self {
        Self {
            key: key.into(),
            position,
            handle,
            decoder,
        }
    }

    pub fn key(&self) -> &str {
        &self.key
    }

    pub fn position(&self) -> &ResumeOffset {
        &self.position
    }

    /// Close decoder then handle. Failures are logged and swallowed.
    pub(crate) async fn close(mut self) {
        if let Err(e) = self.decoder.close().await {
            debug!(key = %self.key, "Exception while closing decoder: {e}");
        }
        if let Some(mut handle) = self.handle.take() {
            close_handle(handle.as_mut()).await;
        }
    }
}

pub(crate) async fn close_handle(handle: &mut dyn ObjectHandle) {
    if let Err(e) = handle.close().await {
        debug!(key = %handle.key(), "Exception while closing object: {e}");
    }
}

/// Holds at most one [`ReaderSession`] between `produce` calls.
///
/// The scheduler owns the context and passes it into every call for the
/// same producer. Call [`ReaderContext::shutdown`] when the stage stops.
#[derive(Default)]
pub struct ReaderContext {
    session: Option<ReaderSession>,
}

impl ReaderContext {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn is_open(&self) -> bool {
        self.session.is_some()
    }

    /// Key of the object the open session reads, if any.
    pub fn bound_key(&self) -> Option<&str> {
        self.session.as_ref().map(ReaderSession::key)
    }

    pub(crate) fn bind(&mut self, session: ReaderSession) {
        self.session = Some(session);
    }

    pub fn session(&self) -> Option<&ReaderSession> {
        self.session.as_ref()
    }

    pub(crate) fn session_mut(&mut self) -> Option<&mut ReaderSession> {
        self.session.as_mut()
    }

    pub(crate) async fn teardown(&mut self) {
        if let Some(session) = self.session.take() {
            session.close().await;
        }
    }

    /// Release any open session. Never fails.
    pub async fn shutdown(&mut self) {
        if let Some(key) = self.bound_key() {
            info!(key = %key, "Closing reader session on shutdown");
        }
        self.teardown().await;
    }
}
