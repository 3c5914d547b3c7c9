//! Whole-object mode: one file-reference record per object.

use bucketspool_core::{
    DecodeFault, FileRef, ObjectDescriptor, ObjectHandle, ObjectMetadata, RecordDecoder,
};
use tracing::warn;

use crate::producer::{BatchProducer, Interrupt};
use crate::session::close_handle;

/// Only the response headers are needed, so a single byte is requested.
const HEADER_FETCH_SIZE: u64 = 1;

pub(crate) const BUCKET: &str = "bucket";
pub(crate) const OBJECT_KEY: &str = "objectKey";
pub(crate) const OWNER: &str = "owner";
pub(crate) const SIZE: &str = "size";

impl BatchProducer {
    /// Fetch the object's headers and build a decoder that emits one
    /// reference record. The partial handle is always closed.
    pub(crate) async fn open_whole_object(
        &self,
        object: &ObjectDescriptor,
        record_id: &str,
    ) -> Result<Box<dyn RecordDecoder>, Interrupt> {
        let mut partial = self
            .store
            .get_object_range(&object.bucket, &object.key, HEADER_FETCH_SIZE)
            .await
            .map_err(Interrupt::Transport)?;
        let decoder = self.whole_object_decoder(object, record_id, partial.as_ref());
        close_handle(partial.as_mut()).await;
        decoder
    }

    fn whole_object_decoder(
        &self,
        object: &ObjectDescriptor,
        record_id: &str,
        partial: &dyn ObjectHandle,
    ) -> Result<Box<dyn RecordDecoder>, Interrupt> {
        let settings = &self.config.whole_object;
        let mut file_ref = FileRef::new(object, settings.max_buffer_size);
        if settings.verify_checksum {
            let etag = partial.etag().ok_or_else(|| {
                Interrupt::Fault(DecodeFault::malformed(format!(
                    "object '{}' has no ETag to verify against",
                    object.key
                )))
            })?;
            file_ref = file_ref.verify_checksum(settings.checksum_algorithm, etag);
        }

        let mut metadata = match partial.metadata() {
            Ok(metadata) => metadata,
            Err(err) => {
                warn!(key = %object.key, "Could not read metadata of object: {err}");
                ObjectMetadata::new()
            }
        };
        metadata.insert(BUCKET.into(), object.bucket.clone().into());
        metadata.insert(OBJECT_KEY.into(), object.key.clone().into());
        metadata.insert(OWNER.into(), object.owner.clone().into());
        metadata.insert(SIZE.into(), object.size.into());

        self.decoders
            .whole_object(record_id, metadata, file_ref)
            .map_err(Interrupt::Fault)
    }
}
