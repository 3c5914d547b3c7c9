//! Resume offsets — the opaque position token round-tripped by the scheduler.

use serde::{Deserialize, Serialize};
use std::fmt;

/// An opaque resume position within one object.
///
/// Two values are reserved: [`ResumeOffset::start`] (decoding has not begun)
/// and [`ResumeOffset::done`] (the object is fully consumed and must not be
/// reopened). Every other value is defined by the decoder that produced it.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct ResumeOffset(String);

impl ResumeOffset {
    pub const START_TOKEN: &'static str = "0";
    pub const DONE_TOKEN: &'static str = "-1";

    /// The object is exhausted.
    pub fn done() -> Self {
        Self(Self::DONE_TOKEN.to_string())
    }

    /// Decoding has not begun.
    pub fn start() -> Self {
        Self(Self::START_TOKEN.to_string())
    }

    pub fn new(token: impl Into<String>) -> Self {
        Self(token.into())
    }

    /// Byte positions are the most common decoder offset.
    pub fn from_position(position: u64) -> Self {
        Self(position.to_string())
    }

    /// Returns `true` for the start token (an empty token counts as start).
    pub fn is_start(&self) -> bool {
        self.0.is_empty() || self.0 == Self::START_TOKEN
    }

    pub fn is_done(&self) -> bool {
        self.0 == Self::DONE_TOKEN
    }

    pub fn as_str(&self) -> &str {
        if self.0.is_empty() {
            Self::START_TOKEN
        } else {
            &self.0
        }
    }

    /// Parse the token as a byte position. Start maps to `0`; done and
    /// non-numeric tokens yield `None`.
    pub fn position(&self) -> Option<u64> {
        if self.is_start() {
            return Some(0);
        }
        self.0.parse().ok()
    }
}

impl Default for ResumeOffset {
    fn default() -> Self {
        Self::start()
    }
}

impl fmt::Display for ResumeOffset {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl From<&str> for ResumeOffset {
    fn from(token: &str) -> Self {
        Self::new(token)
    }
}
