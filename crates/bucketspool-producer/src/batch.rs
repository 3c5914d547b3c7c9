//! The caller's batch sink.

use bucketspool_core::Record;

/// Ordered, append-only collection of records for one batch.
#[derive(Debug, Default)]
pub struct BatchMaker {
    records: Vec<Record>,
}

impl BatchMaker {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_capacity(capacity: usize) -> Self {
        Self {
            records: Vec::with_capacity(capacity),
        }
    }

    pub fn add_record(&mut self, record: Record) {
        self.records.push(record);
    }

    pub fn len(&self) -> usize {
        self.records.len()
    }

    pub fn is_empty(&self) -> bool {
        self.records.is_empty()
    }

    pub fn records(&self) -> &[Record] {
        &self.records
    }

    /// Take the records out, leaving the batch empty for reuse.
    pub fn drain(&mut self) -> Vec<Record> {
        std::mem::take(&mut self.records)
    }

    pub fn into_records(self) -> Vec<Record> {
        self.records
    }

    /// Withdraw records appended after `len`.
    pub(crate) fn truncate(&mut self, len: usize) {
        self.records.truncate(len);
    }
}
