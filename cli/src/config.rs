//! Run configuration, loaded from YAML and overridden by flags.
//!
//! ```yaml
//! root: ./data
//! bucket: logs
//! prefix: 2024/
//! order: timestamp
//! batch_size: 500
//! offsets_file: ./offsets.json
//! producer:
//!   enable_metadata: true
//!   on_record_error: to-error
//! decoder:
//!   format: json
//!   max_record_len: 1048576
//! log:
//!   level: info
//!   json: true
//! ```

use anyhow::{bail, Context, Result};
use bucketspool_decoders::DecoderConfig;
use bucketspool_observability::LogConfig;
use bucketspool_producer::ProducerConfig;
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};

/// Order in which objects of a bucket are spooled.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum ObjectOrder {
    /// By key.
    #[default]
    Lexicographic,
    /// Oldest first, ties broken by key.
    Timestamp,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SpoolConfig {
    /// Directory holding one sub-directory per bucket.
    #[serde(default = "default_root")]
    pub root: PathBuf,
    #[serde(default)]
    pub bucket: String,
    /// Only spool keys starting with this prefix.
    #[serde(default)]
    pub prefix: Option<String>,
    #[serde(default)]
    pub order: ObjectOrder,
    #[serde(default = "default_batch_size")]
    pub batch_size: usize,
    #[serde(default = "default_offsets_file")]
    pub offsets_file: PathBuf,
    #[serde(default)]
    pub producer: ProducerConfig,
    #[serde(default)]
    pub decoder: DecoderConfig,
    #[serde(default)]
    pub log: LogConfig,
}

fn default_root() -> PathBuf { PathBuf::from(".") }
fn default_batch_size() -> usize { 1000 }
fn default_offsets_file() -> PathBuf { PathBuf::from("bucketspool-offsets.json") }

impl Default for SpoolConfig {
    fn default() -> Self {
        Self {
            root: default_root(),
            bucket: String::new(),
            prefix: None,
            order: ObjectOrder::default(),
            batch_size: default_batch_size(),
            offsets_file: default_offsets_file(),
            producer: ProducerConfig::default(),
            decoder: DecoderConfig::default(),
            log: LogConfig::default(),
        }
    }
}

impl SpoolConfig {
    pub fn load(path: &Path) -> Result<Self> {
        let text = std::fs::read_to_string(path)
            .with_context(|| format!("reading config {}", path.display()))?;
        serde_yaml::from_str(&text).with_context(|| format!("parsing config {}", path.display()))
    }

    /// Check required settings and reconcile the decoder format with
    /// whole-object mode.
    pub fn finish(mut self) -> Result<Self> {
        if self.bucket.is_empty() {
            bail!("no bucket configured (set `bucket` or pass --bucket)");
        }
        if self.batch_size == 0 {
            bail!("batch_size must be at least 1");
        }
        if self.decoder.format.is_whole_object() {
            self.producer.whole_object.enabled = true;
        }
        Ok(self)
    }
}
