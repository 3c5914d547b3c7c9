//! The batch producer — one bounded decoding step per call.

use std::sync::Arc;

use bucketspool_core::{
    DecodeFault, DecodeStep, DecoderFactory, DefaultErrorRecordHandler, ErrorCode,
    ErrorRecordHandler, ObjectDescriptor, ObjectHandle, ObjectStore, OnRecordError, ProduceError,
    RecordDecoder, RecordError, ResumeOffset, TransportError,
};
use tracing::{debug, error, info, warn};

use crate::batch::BatchMaker;
use crate::config::{ProducerConfig, DEFAULT_FETCH_SIZE};
use crate::metadata::attach_metadata;
use crate::session::{close_handle, ReaderContext, ReaderSession};

/// Why opening or decoding an object stopped short.
pub(crate) enum Interrupt {
    Transport(TransportError),
    Fault(DecodeFault),
}

/// How a call that did not fail came to an end.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub(crate) enum Outcome {
    /// The batch filled up, or the object ended.
    Filled,
    /// A read was cancelled; the stream behind the session is unusable.
    Aborted,
}

/// Produces bounded batches of records from object-store objects.
///
/// The producer itself is stateless between calls; all per-object state
/// lives in the [`ReaderContext`] the caller passes in.
pub struct BatchProducer {
    pub(crate) config: ProducerConfig,
    pub(crate) store: Arc<dyn ObjectStore>,
    pub(crate) decoders: Arc<dyn DecoderFactory>,
    errors: Arc<dyn ErrorRecordHandler>,
}

impl BatchProducer {
    /// Create a producer whose record errors go to a
    /// [`DefaultErrorRecordHandler`] built from `config.on_record_error`.
    pub fn new(
        config: ProducerConfig,
        store: Arc<dyn ObjectStore>,
        decoders: Arc<dyn DecoderFactory>,
    ) -> Self {
        let errors = Arc::new(DefaultErrorRecordHandler::new(config.on_record_error));
        Self {
            config,
            store,
            decoders,
            errors,
        }
    }

    pub fn with_error_handler(mut self, errors: Arc<dyn ErrorRecordHandler>) -> Self {
        self.errors = errors;
        self
    }

    pub fn config(&self) -> &ProducerConfig {
        &self.config
    }

    /// `bucket + delimiter + key`; records are tagged `"{record_id}::{position}"`.
    pub fn record_id(&self, object: &ObjectDescriptor) -> String {
        format!("{}{}{}", object.bucket, self.config.delimiter, object.key)
    }

    /// Append up to `max_batch_size` records from `object`, starting at
    /// `offset`, and return the offset to resume from.
    ///
    /// Returns [`ResumeOffset::done`] once the object is exhausted or
    /// abandoned. On `Err` the records appended by this call are withdrawn
    /// from `batch` and the session is closed. A cancelled read also closes
    /// the session, so the returned offset is reopened on the next call.
    pub async fn produce(
        &self,
        ctx: &mut ReaderContext,
        object: &ObjectDescriptor,
        offset: ResumeOffset,
        max_batch_size: usize,
        batch: &mut BatchMaker,
    ) -> Result<ResumeOffset, ProduceError> {
        let mark = batch.len();
        let mut offset = offset;
        let result = self
            .fill_batch(ctx, object, &mut offset, max_batch_size, batch)
            .await;

        if !matches!(result, Ok(Outcome::Filled)) || offset.is_done() {
            ctx.teardown().await;
        }
        match result {
            Ok(_) => Ok(offset),
            Err(err) => {
                batch.truncate(mark);
                Err(err)
            }
        }
    }

    async fn fill_batch(
        &self,
        ctx: &mut ReaderContext,
        object: &ObjectDescriptor,
        offset: &mut ResumeOffset,
        max_batch_size: usize,
        batch: &mut BatchMaker,
    ) -> Result<Outcome, ProduceError> {
        if let Some(stale) = ctx
            .bound_key()
            .filter(|bound| *bound != object.key)
            .map(str::to_owned)
        {
            warn!(stale = %stale, key = %object.key, "Reader session bound to another object; closing it");
            ctx.teardown().await;
        }

        if offset.is_done() {
            debug!(key = %object.key, "Object already exhausted");
            return Ok(Outcome::Filled);
        }

        if let Some(moved) = ctx
            .session()
            .filter(|session| session.position() != &*offset)
            .map(|session| session.position().clone())
        {
            debug!(key = %object.key, from = %moved, to = %offset, "Resume offset moved; reopening object");
            ctx.teardown().await;
        }

        if !ctx.is_open() {
            match self.open_session(object, offset).await {
                Ok(session) => ctx.bind(session),
                Err(interrupt) => return self.interrupted(object, offset, None, interrupt),
            }
        }
        let Some(session) = ctx.session_mut() else {
            return Ok(Outcome::Filled);
        };

        for _ in 0..max_batch_size {
            match session.decoder.next_record().await {
                DecodeStep::Record(mut record) => {
                    if self.config.enable_metadata {
                        attach_metadata(&mut record, session.handle.as_deref(), &object.key);
                    }
                    batch.add_record(record);
                    match session.decoder.offset() {
                        Ok(next) => {
                            session.position = next.clone();
                            *offset = next;
                        }
                        Err(fault) => {
                            return self.interrupted(
                                object,
                                offset,
                                Some(session.decoder.as_ref()),
                                Interrupt::Fault(fault),
                            )
                        }
                    }
                    if offset.is_done() {
                        break;
                    }
                }
                DecodeStep::EndOfStream => {
                    *offset = ResumeOffset::done();
                    break;
                }
                DecodeStep::Fault(fault) if fault.is_object_too_large() => {
                    let at = std::mem::replace(offset, ResumeOffset::done());
                    warn!(key = %object.key, offset = %at, "Record too large, abandoning rest of object: {fault}");
                    self.errors.on_error(RecordError::new(
                        ErrorCode::RecordTooLarge,
                        object.key.clone(),
                        at,
                        fault,
                    ))?;
                    break;
                }
                DecodeStep::Fault(fault) => {
                    return self.interrupted(
                        object,
                        offset,
                        Some(session.decoder.as_ref()),
                        Interrupt::Fault(fault),
                    )
                }
            }
        }

        if offset.is_done() {
            info!(key = %object.key, "Finished processing object");
        }
        Ok(Outcome::Filled)
    }

    async fn open_session(
        &self,
        object: &ObjectDescriptor,
        offset: &ResumeOffset,
    ) -> Result<ReaderSession, Interrupt> {
        let record_id = self.record_id(object);

        if self.config.whole_object.enabled {
            let decoder = self.open_whole_object(object, &record_id).await?;
            info!(key = %object.key, "Opened object as a whole-object reference");
            return Ok(ReaderSession::new(object.key.clone(), offset.clone(), None, decoder));
        }

        let mut handle = self
            .open_content(object)
            .await
            .map_err(Interrupt::Transport)?;
        let Some(content) = handle.take_content() else {
            close_handle(handle.as_mut()).await;
            return Err(Interrupt::Transport(TransportError::Other(format!(
                "object '{}' returned no content",
                object.key
            ))));
        };

        match self.decoders.create(&record_id, content, offset).await {
            Ok(decoder) => {
                info!(key = %object.key, offset = %offset, "Opened object");
                Ok(ReaderSession::new(
                    object.key.clone(),
                    offset.clone(),
                    Some(handle),
                    decoder,
                ))
            }
            Err(fault) => {
                close_handle(handle.as_mut()).await;
                Err(Interrupt::Fault(fault))
            }
        }
    }

    async fn open_content(
        &self,
        object: &ObjectDescriptor,
    ) -> Result<Box<dyn ObjectHandle>, TransportError> {
        if self.config.preview {
            let fetch_size = object.size.min(DEFAULT_FETCH_SIZE);
            if fetch_size > 0 {
                return self
                    .store
                    .get_object_range(&object.bucket, &object.key, fetch_size)
                    .await;
            }
            warn!("Size of object with key '{}' is 0", object.key);
        }
        self.store.get_object(&object.bucket, &object.key).await
    }

    /// Classify a failed open or decode step.
    ///
    /// Aborted reads end the call gracefully with the partial batch and the
    /// last good offset; the caller closes the broken session. Other
    /// transport failures are fatal. Anything else abandons the object and
    /// is routed by the configured [`OnRecordError`] policy.
    fn interrupted(
        &self,
        object: &ObjectDescriptor,
        offset: &mut ResumeOffset,
        decoder: Option<&dyn RecordDecoder>,
        interrupt: Interrupt,
    ) -> Result<Outcome, ProduceError> {
        let fault = match interrupt {
            Interrupt::Transport(err) if err.is_aborted() => {
                info!(key = %object.key, offset = %offset, "Read of object aborted");
                return Ok(Outcome::Aborted);
            }
            Interrupt::Transport(err) => {
                error!(key = %object.key, offset = %offset, "Error processing object: {err}");
                return Err(ProduceError::Transport {
                    key: object.key.clone(),
                    offset: offset.clone(),
                    reason: err.to_string(),
                });
            }
            Interrupt::Fault(fault) => fault,
        };

        if fault.is_cancellation() {
            info!(key = %object.key, offset = %offset, "Read of object aborted");
            return Ok(Outcome::Aborted);
        }
        if fault.is_transport() {
            error!(key = %object.key, offset = %offset, "Error processing object: {fault}");
            let reason = match fault.transport_cause() {
                Some(cause) => cause.to_string(),
                None => fault.to_string(),
            };
            return Err(ProduceError::Transport {
                key: object.key.clone(),
                offset: offset.clone(),
                reason,
            });
        }

        *offset = ResumeOffset::done();
        let at = fault_offset(&fault, decoder);
        match self.errors.policy() {
            OnRecordError::Discard => {
                debug!(key = %object.key, offset = %at, "Discarding rest of object: {fault}");
                Ok(Outcome::Filled)
            }
            OnRecordError::ToError => Err(ProduceError::BadObject {
                key: object.key.clone(),
                offset: at,
                source: fault,
            }),
            OnRecordError::StopPipeline => {
                let err = RecordError::new(ErrorCode::DecodeFailed, object.key.clone(), at, fault);
                self.errors.report(err.report());
                Err(err.into_stopped())
            }
        }
    }
}

/// Best available position for a fault: the position the fault carries,
/// else the decoder's own offset, else done.
fn fault_offset(fault: &DecodeFault, decoder: Option<&dyn RecordDecoder>) -> ResumeOffset {
    if let Some(position) = fault.stream_offset {
        return ResumeOffset::from_position(position);
    }
    match decoder.map(|decoder| decoder.offset()) {
        Some(Ok(offset)) => offset,
        Some(Err(e)) => {
            warn!("Could not get the object offset to report with error: {e}");
            ResumeOffset::done()
        }
        None => ResumeOffset::done(),
    }
}
