//! # bucketspool-observability
//!
//! OpenTelemetry-based observability for BucketSpool.
//!
//! ## Built-in metrics
//! - `bucketspool.records_produced`   — counter, tagged with bucket
//! - `bucketspool.objects_completed`  — counter, tagged with bucket
//! - `bucketspool.record_errors`      — counter, tagged with bucket + code
//! - `bucketspool.transport_errors`   — counter, tagged with bucket
//! - `bucketspool.produce_latency_ms` — histogram
//! - `bucketspool.batch_size`         — histogram
//!
//! ## Structured logging
//! JSON-structured logs compatible with ELK, Loki, CloudWatch.
//! Log levels configurable per component.

pub mod metrics;
pub mod tracing_setup;

pub use metrics::SpoolMetrics;
pub use tracing_setup::{init_tracing, LogConfig};
