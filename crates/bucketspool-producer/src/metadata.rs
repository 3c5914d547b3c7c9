//! Best-effort header decoration with object metadata.

use bucketspool_core::record::attribute_value;
use bucketspool_core::{ObjectHandle, Record};
use tracing::warn;

/// Header attribute carrying the object key.
pub(crate) const NAME: &str = "Name";

/// Copy the handle's metadata into the record header and set `Name`.
/// A metadata failure is logged; the record is kept either way.
pub(crate) fn attach_metadata(record: &mut Record, handle: Option<&dyn ObjectHandle>, key: &str) {
    if let Some(handle) = handle {
        match handle.metadata() {
            Ok(metadata) => {
                for (name, value) in &metadata {
                    record.header.set_attribute(name.clone(), attribute_value(value));
                }
            }
            Err(err) => warn!(key, "Could not read metadata of object: {err}"),
        }
    }
    record.header.set_attribute(NAME, key);
}
