//! Producer configuration.

use bucketspool_core::{ChecksumAlgorithm, OnRecordError};
use serde::{Deserialize, Serialize};

/// Prefix fetched per object in preview mode.
pub const DEFAULT_FETCH_SIZE: u64 = 1024 * 1024;

/// Top-level producer configuration.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ProducerConfig {
    /// Separator between bucket and key in record ids.
    #[serde(default = "default_delimiter")]
    pub delimiter: String,
    /// Copy object metadata and the object name into every record header.
    #[serde(default)]
    pub enable_metadata: bool,
    /// Preview runs only read the first [`DEFAULT_FETCH_SIZE`] bytes.
    #[serde(default)]
    pub preview: bool,
    /// What to do with records that fail to decode.
    #[serde(default)]
    pub on_record_error: OnRecordError,
    #[serde(default)]
    pub whole_object: WholeObjectConfig,
}

fn default_delimiter() -> String { "/".into() }

impl Default for ProducerConfig {
    fn default() -> Self {
        Self {
            delimiter: default_delimiter(),
            enable_metadata: false,
            preview: false,
            on_record_error: OnRecordError::default(),
            whole_object: WholeObjectConfig::default(),
        }
    }
}

/// Settings for shipping each object as one file-reference record.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct WholeObjectConfig {
    #[serde(default)]
    pub enabled: bool,
    /// Read buffer size handed to downstream readers of the file reference.
    #[serde(default = "default_max_buffer_size")]
    pub max_buffer_size: usize,
    /// Attach the object's ETag as the expected checksum.
    #[serde(default)]
    pub verify_checksum: bool,
    #[serde(default)]
    pub checksum_algorithm: ChecksumAlgorithm,
}

fn default_max_buffer_size() -> usize { 8 * 1024 }

impl Default for WholeObjectConfig {
    fn default() -> Self {
        Self {
            enabled: false,
            max_buffer_size: default_max_buffer_size(),
            verify_checksum: false,
            checksum_algorithm: ChecksumAlgorithm::default(),
        }
    }
}
