//! Decoded records and their header attributes.

use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

use crate::object::{FileRef, ObjectMetadata};

/// String-keyed attributes carried alongside a record body.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Header {
    /// Where the record came from: `<record id>::<offset>`.
    pub source_id: String,
    pub attributes: BTreeMap<String, String>,
}

impl Header {
    pub fn attribute(&self, name: &str) -> Option<&str> {
        self.attributes.get(name).map(String::as_str)
    }

    pub fn set_attribute(&mut self, name: impl Into<String>, value: impl Into<String>) {
        self.attributes.insert(name.into(), value.into());
    }
}

/// Payload of a record.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type", content = "value", rename_all = "snake_case")]
pub enum RecordBody {
    Json(serde_json::Value),
    Text(String),
    /// A reference to an entire object plus its metadata.
    WholeObject {
        file_ref: FileRef,
        file_info: ObjectMetadata,
    },
}

/// One decoded unit of data.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Record {
    pub header: Header,
    pub body: RecordBody,
}

impl Record {
    pub fn new(source_id: impl Into<String>, body: RecordBody) -> Self {
        Self {
            header: Header {
                source_id: source_id.into(),
                attributes: BTreeMap::new(),
            },
            body,
        }
    }
}

/// Render a metadata value as a header attribute. Null becomes empty.
pub fn attribute_value(value: &serde_json::Value) -> String {
    match value {
        serde_json::Value::Null => String::new(),
        serde_json::Value::String(s) => s.clone(),
        other => other.to_string(),
    }
}
