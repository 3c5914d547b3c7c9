//! BucketSpool metrics definitions.
//!
//! All metrics use OpenTelemetry conventions. Without an installed meter
//! provider they are no-ops.

use bucketspool_core::{ErrorCode, ProduceError};
use opentelemetry::{
    metrics::{Counter, Histogram, Meter},
    KeyValue,
};

/// Central metrics handle for the producer.
#[derive(Clone)]
pub struct SpoolMetrics {
    pub records_produced: Counter<u64>,
    pub objects_completed: Counter<u64>,
    pub record_errors: Counter<u64>,
    pub transport_errors: Counter<u64>,
    pub produce_latency_ms: Histogram<f64>,
    pub batch_size: Histogram<u64>,
}

impl SpoolMetrics {
    pub fn new(meter: &Meter) -> Self {
        Self {
            records_produced: meter
                .u64_counter("bucketspool.records_produced")
                .with_description("Records appended to batches")
                .init(),
            objects_completed: meter
                .u64_counter("bucketspool.objects_completed")
                .with_description("Objects read to the end or abandoned")
                .init(),
            record_errors: meter
                .u64_counter("bucketspool.record_errors")
                .with_description("Objects abandoned because of a record error")
                .init(),
            transport_errors: meter
                .u64_counter("bucketspool.transport_errors")
                .with_description("Object-store client failures")
                .init(),
            produce_latency_ms: meter
                .f64_histogram("bucketspool.produce_latency_ms")
                .with_description("Time spent in a single produce call in milliseconds")
                .init(),
            batch_size: meter
                .u64_histogram("bucketspool.batch_size")
                .with_description("Number of records returned by a produce call")
                .init(),
        }
    }

    /// Metrics bound to the globally installed meter provider.
    pub fn global() -> Self {
        Self::new(&opentelemetry::global::meter("bucketspool"))
    }

    pub fn record_batch(&self, bucket: &str, records: usize, ms: f64) {
        let attrs = [KeyValue::new("bucket", bucket.to_string())];
        self.records_produced.add(records as u64, &attrs);
        self.batch_size.record(records as u64, &attrs);
        self.produce_latency_ms.record(ms, &attrs);
    }

    pub fn record_completed(&self, bucket: &str) {
        self.objects_completed
            .add(1, &[KeyValue::new("bucket", bucket.to_string())]);
    }

    pub fn record_failure(&self, bucket: &str, error: &ProduceError) {
        let bucket = KeyValue::new("bucket", bucket.to_string());
        match error {
            ProduceError::Transport { .. } => self.transport_errors.add(1, &[bucket]),
            ProduceError::BadObject { .. } => self.record_errors.add(
                1,
                &[bucket, KeyValue::new("code", ErrorCode::DecodeFailed.code())],
            ),
            ProduceError::Stopped { code, .. } => self
                .record_errors
                .add(1, &[bucket, KeyValue::new("code", code.code())]),
        }
    }
}
