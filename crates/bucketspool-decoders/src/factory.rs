//! Format-driven `DecoderFactory`.

use async_trait::async_trait;
use bucketspool_core::object::ByteStream;
use bucketspool_core::{DecodeFault, DecoderFactory, FileRef, ObjectMetadata, RecordDecoder, ResumeOffset};
use serde::{Deserialize, Serialize};
use std::str::FromStr;
use tracing::debug;

use crate::json::JsonLinesDecoder;
use crate::text::TextLinesDecoder;
use crate::whole_object::WholeObjectDecoder;

/// Data format of the objects being read.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum DataFormat {
    /// Newline-delimited JSON.
    #[default]
    Json,
    /// One text record per line.
    Text,
    /// Ship each object as a single file reference.
    WholeObject,
}

impl DataFormat {
    pub fn is_whole_object(&self) -> bool {
        matches!(self, Self::WholeObject)
    }
}

impl FromStr for DataFormat {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "json" => Ok(Self::Json),
            "text" => Ok(Self::Text),
            "whole-object" => Ok(Self::WholeObject),
            other => Err(format!("Unknown data format '{other}'")),
        }
    }
}

/// Decoder configuration.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct DecoderConfig {
    #[serde(default)]
    pub format: DataFormat,
    /// Longest record accepted, in bytes.
    #[serde(default = "default_max_record_len")]
    pub max_record_len: usize,
}

fn default_max_record_len() -> usize { 65_536 }

impl Default for DecoderConfig {
    fn default() -> Self {
        Self {
            format: DataFormat::default(),
            max_record_len: default_max_record_len(),
        }
    }
}

/// Builds the decoder matching [`DecoderConfig::format`].
#[derive(Debug, Clone, Default)]
pub struct FormatDecoderFactory {
    config: DecoderConfig,
}

impl FormatDecoderFactory {
    pub fn new(config: DecoderConfig) -> Self {
        Self { config }
    }

    pub fn config(&self) -> &DecoderConfig {
        &self.config
    }
}

#[async_trait]
impl DecoderFactory for FormatDecoderFactory {
    async fn create(
        &self,
        record_id: &str,
        content: ByteStream,
        offset: &ResumeOffset,
    ) -> Result<Box<dyn RecordDecoder>, DecodeFault> {
        let max = self.config.max_record_len;
        debug!(record_id, format = ?self.config.format, offset = %offset, "Building decoder");
        match self.config.format {
            DataFormat::Json => Ok(Box::new(
                JsonLinesDecoder::open(record_id, content, offset, max).await?,
            )),
            DataFormat::Text => Ok(Box::new(
                TextLinesDecoder::open(record_id, content, offset, max).await?,
            )),
            DataFormat::WholeObject => Err(DecodeFault::malformed(
                "whole-object format does not decode object contents",
            )),
        }
    }

    fn whole_object(
        &self,
        record_id: &str,
        metadata: ObjectMetadata,
        file_ref: FileRef,
    ) -> Result<Box<dyn RecordDecoder>, DecodeFault> {
        Ok(Box::new(WholeObjectDecoder::new(record_id, metadata, file_ref)))
    }
}
