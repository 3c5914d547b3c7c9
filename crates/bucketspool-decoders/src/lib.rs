//! # bucketspool-decoders
//!
//! Record decoders for the formats BucketSpool reads out of the box.
//!
//! Line-oriented decoders report their offset as the byte position just past
//! the last record they produced, and resume by skipping that many bytes of
//! the object. A record longer than the configured limit is reported as an
//! `ObjectTooLarge` fault carrying the position where it starts.

pub mod factory;
pub mod json;
mod lines;
pub mod text;
pub mod whole_object;

pub use factory::{DataFormat, DecoderConfig, FormatDecoderFactory};
pub use json::JsonLinesDecoder;
pub use text::TextLinesDecoder;
pub use whole_object::WholeObjectDecoder;
