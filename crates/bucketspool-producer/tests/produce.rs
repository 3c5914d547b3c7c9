//! End-to-end tests for `BatchProducer::produce` against the in-memory store.

use std::sync::Arc;

use bucketspool_core::{
    ChecksumAlgorithm, DefaultErrorRecordHandler, ErrorCode, MemoryObject, MemoryObjectStore,
    ObjectDescriptor, OnRecordError, ProduceError, ReadFault, Record, RecordBody, ResumeOffset,
};
use bucketspool_decoders::{DataFormat, DecoderConfig, FormatDecoderFactory};
use bucketspool_producer::{
    BatchMaker, BatchProducer, CheckpointManager, MemoryOffsetStore, ProducerConfig,
    ReaderContext, WholeObjectConfig,
};
use serde_json::json;

const BUCKET: &str = "logs";
const THREE_RECORDS: &str = "{\"a\":1}\n{\"a\":2}\n{\"a\":3}\n";

struct Harness {
    store: MemoryObjectStore,
    errors: DefaultErrorRecordHandler,
    producer: BatchProducer,
}

fn harness(config: ProducerConfig) -> Harness {
    let store = MemoryObjectStore::new();
    let errors = DefaultErrorRecordHandler::new(config.on_record_error);
    let decoders = FormatDecoderFactory::new(DecoderConfig {
        format: DataFormat::Json,
        max_record_len: 16,
    });
    let producer = BatchProducer::new(config, Arc::new(store.clone()), Arc::new(decoders))
        .with_error_handler(Arc::new(errors.clone()));
    Harness {
        store,
        errors,
        producer,
    }
}

fn policy(on_record_error: OnRecordError) -> ProducerConfig {
    ProducerConfig {
        on_record_error,
        ..Default::default()
    }
}

fn values(records: &[Record]) -> Vec<serde_json::Value> {
    records
        .iter()
        .map(|r| match &r.body {
            RecordBody::Json(v) => v.clone(),
            other => panic!("unexpected body {other:?}"),
        })
        .collect()
}

/// Drive `produce` until done, returning every record and each returned offset.
async fn drain(
    h: &Harness,
    object: &ObjectDescriptor,
    start: ResumeOffset,
    max: usize,
) -> (Vec<Record>, Vec<String>) {
    let mut ctx = ReaderContext::new();
    let mut records = Vec::new();
    let mut offsets = Vec::new();
    let mut offset = start;
    for _ in 0..100 {
        let mut batch = BatchMaker::new();
        offset = h
            .producer
            .produce(&mut ctx, object, offset, max, &mut batch)
            .await
            .unwrap();
        records.extend(batch.into_records());
        offsets.push(offset.to_string());
        if offset.is_done() {
            break;
        }
    }
    assert!(!ctx.is_open());
    (records, offsets)
}

// ─── Normal flow ──────────────────────────────────────────────────────────────

#[tokio::test]
async fn produces_bounded_batches_until_done() {
    let h = harness(ProducerConfig::default());
    let object = h.store.put(BUCKET, "a.json", MemoryObject::new(THREE_RECORDS));
    let mut ctx = ReaderContext::new();

    let mut batch = BatchMaker::new();
    let offset = h
        .producer
        .produce(&mut ctx, &object, ResumeOffset::start(), 2, &mut batch)
        .await
        .unwrap();
    assert_eq!(values(batch.records()), vec![json!({"a": 1}), json!({"a": 2})]);
    assert_eq!(offset.as_str(), "16");
    assert!(ctx.is_open());

    let mut batch = BatchMaker::new();
    let offset = h
        .producer
        .produce(&mut ctx, &object, offset, 2, &mut batch)
        .await
        .unwrap();
    assert_eq!(values(batch.records()), vec![json!({"a": 3})]);
    assert!(offset.is_done());
    assert!(!ctx.is_open());
    assert_eq!(h.store.open_handles(), 0);
    assert_eq!(h.store.requests().len(), 1);
}

#[tokio::test]
async fn record_ids_carry_bucket_key_and_position() {
    let h = harness(ProducerConfig::default());
    let object = h.store.put(BUCKET, "a.json", MemoryObject::new(THREE_RECORDS));

    let (records, _) = drain(&h, &object, ResumeOffset::start(), 10).await;
    let ids: Vec<_> = records.iter().map(|r| r.header.source_id.as_str()).collect();
    assert_eq!(ids, vec!["logs/a.json::0", "logs/a.json::8", "logs/a.json::16"]);
}

#[tokio::test]
async fn output_is_independent_of_batch_size() {
    let h = harness(ProducerConfig::default());
    let data: String = (0..7).map(|i| format!("{{\"n\":{i}}}\n")).collect();
    let object = h.store.put(BUCKET, "seven.json", MemoryObject::new(data));

    let (all_at_once, _) = drain(&h, &object, ResumeOffset::start(), 100).await;
    for max in [1, 2, 3, 7] {
        let (records, offsets) = drain(&h, &object, ResumeOffset::start(), max).await;
        assert_eq!(values(&records), values(&all_at_once), "batch size {max}");
        assert_eq!(offsets.last().map(String::as_str), Some("-1"));
    }
    assert_eq!(h.store.open_handles(), 0);
}

#[tokio::test]
async fn restart_resumes_from_persisted_offset() {
    let h = harness(ProducerConfig::default());
    let object = h.store.put(BUCKET, "a.json", MemoryObject::new(THREE_RECORDS));

    let mut ctx = ReaderContext::new();
    let mut batch = BatchMaker::new();
    let offset = h
        .producer
        .produce(&mut ctx, &object, ResumeOffset::start(), 2, &mut batch)
        .await
        .unwrap();
    ctx.shutdown().await;

    // A fresh context models a process restart.
    let (records, _) = drain(&h, &object, offset, 10).await;
    assert_eq!(values(&records), vec![json!({"a": 3})]);
    assert_eq!(h.store.requests().len(), 2);
}

#[tokio::test]
async fn checkpointed_offsets_round_trip_through_manager() {
    let h = harness(ProducerConfig::default());
    let object = h.store.put(BUCKET, "a.json", MemoryObject::new(THREE_RECORDS));
    let checkpoints = CheckpointManager::new(Box::new(MemoryOffsetStore::new()));

    let mut ctx = ReaderContext::new();
    let mut batch = BatchMaker::new();
    let start = checkpoints.resume_offset(&object).await.unwrap();
    let offset = h
        .producer
        .produce(&mut ctx, &object, start, 1, &mut batch)
        .await
        .unwrap();
    checkpoints.commit(&object, &offset).await.unwrap();
    ctx.shutdown().await;

    let resumed = checkpoints.resume_offset(&object).await.unwrap();
    assert_eq!(resumed.as_str(), "8");
}

#[tokio::test]
async fn done_offset_does_not_reopen_object() {
    let h = harness(ProducerConfig::default());
    let object = h.store.put(BUCKET, "a.json", MemoryObject::new(THREE_RECORDS));
    let mut ctx = ReaderContext::new();

    let mut batch = BatchMaker::new();
    let offset = h
        .producer
        .produce(&mut ctx, &object, ResumeOffset::done(), 10, &mut batch)
        .await
        .unwrap();
    assert!(offset.is_done());
    assert!(batch.is_empty());
    assert!(h.store.requests().is_empty());
    assert_eq!(h.store.open_handles(), 0);
}

#[tokio::test]
async fn empty_object_is_done_immediately() {
    let h = harness(ProducerConfig::default());
    let object = h.store.put(BUCKET, "empty.json", MemoryObject::new(""));

    let (records, offsets) = drain(&h, &object, ResumeOffset::start(), 10).await;
    assert!(records.is_empty());
    assert_eq!(offsets, vec!["-1".to_string()]);
    assert_eq!(h.store.open_handles(), 0);
}

#[tokio::test]
async fn switching_objects_closes_previous_session() {
    let h = harness(ProducerConfig::default());
    let a = h.store.put(BUCKET, "a.json", MemoryObject::new(THREE_RECORDS));
    let b = h.store.put(BUCKET, "b.json", MemoryObject::new(THREE_RECORDS));
    let mut ctx = ReaderContext::new();

    let mut batch = BatchMaker::new();
    h.producer
        .produce(&mut ctx, &a, ResumeOffset::start(), 1, &mut batch)
        .await
        .unwrap();
    assert_eq!(ctx.bound_key(), Some("a.json"));

    h.producer
        .produce(&mut ctx, &b, ResumeOffset::start(), 1, &mut batch)
        .await
        .unwrap();
    assert_eq!(ctx.bound_key(), Some("b.json"));
    assert_eq!(h.store.open_handles(), 1);
    assert_eq!(batch.len(), 2);

    ctx.shutdown().await;
    assert!(!ctx.is_open());
    assert_eq!(h.store.open_handles(), 0);
}

#[tokio::test]
async fn forced_done_closes_open_session() {
    let h = harness(ProducerConfig::default());
    let object = h.store.put(BUCKET, "a.json", MemoryObject::new(THREE_RECORDS));
    let mut ctx = ReaderContext::new();

    let mut batch = BatchMaker::new();
    h.producer
        .produce(&mut ctx, &object, ResumeOffset::start(), 1, &mut batch)
        .await
        .unwrap();
    assert!(ctx.is_open());

    let mut batch = BatchMaker::new();
    let offset = h
        .producer
        .produce(&mut ctx, &object, ResumeOffset::done(), 10, &mut batch)
        .await
        .unwrap();
    assert!(offset.is_done());
    assert!(batch.is_empty());
    assert!(!ctx.is_open());
    assert_eq!(h.store.open_handles(), 0);
}

#[tokio::test]
async fn rewound_offset_reopens_object() {
    let h = harness(ProducerConfig::default());
    let object = h.store.put(BUCKET, "a.json", MemoryObject::new(THREE_RECORDS));
    let mut ctx = ReaderContext::new();

    let mut batch = BatchMaker::new();
    let offset = h
        .producer
        .produce(&mut ctx, &object, ResumeOffset::start(), 2, &mut batch)
        .await
        .unwrap();
    assert_eq!(ctx.session().map(|s| s.position().as_str()), Some(offset.as_str()));

    let mut batch = BatchMaker::new();
    let offset = h
        .producer
        .produce(&mut ctx, &object, ResumeOffset::from_position(8), 10, &mut batch)
        .await
        .unwrap();
    assert_eq!(values(batch.records()), vec![json!({"a": 2}), json!({"a": 3})]);
    assert!(offset.is_done());
    assert_eq!(h.store.requests().len(), 2);
    assert_eq!(h.store.open_handles(), 0);
}

#[tokio::test]
async fn shutdown_without_session_is_a_no_op() {
    let mut ctx = ReaderContext::new();
    ctx.shutdown().await;
    assert!(!ctx.is_open());
}

// ─── Record errors ────────────────────────────────────────────────────────────

fn oversized() -> String {
    format!("{{\"a\":1}}\n{{\"big\":\"{}\"}}\n{{\"a\":3}}\n", "x".repeat(40))
}

#[tokio::test]
async fn oversized_record_with_discard_finishes_object() {
    let h = harness(policy(OnRecordError::Discard));
    let object = h.store.put(BUCKET, "big.json", MemoryObject::new(oversized()));
    let mut ctx = ReaderContext::new();

    let mut batch = BatchMaker::new();
    let offset = h
        .producer
        .produce(&mut ctx, &object, ResumeOffset::start(), 10, &mut batch)
        .await
        .unwrap();
    assert_eq!(values(batch.records()), vec![json!({"a": 1})]);
    assert!(offset.is_done());
    assert!(h.errors.reports().is_empty());
    assert_eq!(h.store.open_handles(), 0);
}

#[tokio::test]
async fn oversized_record_is_reported_with_last_good_offset() {
    let h = harness(policy(OnRecordError::ToError));
    let object = h.store.put(BUCKET, "big.json", MemoryObject::new(oversized()));

    let (records, offsets) = drain(&h, &object, ResumeOffset::start(), 10).await;
    assert_eq!(records.len(), 1);
    assert_eq!(offsets, vec!["-1".to_string()]);

    let reports = h.errors.reports();
    assert_eq!(reports.len(), 1);
    assert_eq!(reports[0].code, ErrorCode::RecordTooLarge);
    assert_eq!(reports[0].key, "big.json");
    assert_eq!(reports[0].offset.as_str(), "8");
}

#[tokio::test]
async fn oversized_record_can_stop_the_pipeline() {
    let h = harness(policy(OnRecordError::StopPipeline));
    let object = h.store.put(BUCKET, "big.json", MemoryObject::new(oversized()));
    let mut ctx = ReaderContext::new();

    let mut batch = BatchMaker::new();
    let err = h
        .producer
        .produce(&mut ctx, &object, ResumeOffset::start(), 10, &mut batch)
        .await
        .unwrap_err();
    assert!(matches!(
        err,
        ProduceError::Stopped {
            code: ErrorCode::RecordTooLarge,
            ..
        }
    ));
    assert!(batch.is_empty());
    assert!(!ctx.is_open());
    assert_eq!(h.store.open_handles(), 0);
}

const MALFORMED: &str = "{\"a\":1}\n{nope\n{\"a\":3}\n";

#[tokio::test]
async fn malformed_data_with_discard_returns_done() {
    let h = harness(policy(OnRecordError::Discard));
    let object = h.store.put(BUCKET, "bad.json", MemoryObject::new(MALFORMED));

    let (records, offsets) = drain(&h, &object, ResumeOffset::start(), 10).await;
    assert_eq!(values(&records), vec![json!({"a": 1})]);
    assert_eq!(offsets, vec!["-1".to_string()]);
    assert_eq!(h.store.open_handles(), 0);
}

#[tokio::test]
async fn malformed_data_becomes_bad_object_error() {
    let h = harness(policy(OnRecordError::ToError));
    let object = h.store.put(BUCKET, "bad.json", MemoryObject::new(MALFORMED));
    let mut ctx = ReaderContext::new();

    let mut batch = BatchMaker::new();
    let err = h
        .producer
        .produce(&mut ctx, &object, ResumeOffset::start(), 10, &mut batch)
        .await
        .unwrap_err();
    assert!(err.is_bad_object());
    assert_eq!(err.key(), "bad.json");
    assert_eq!(err.offset().as_str(), "8");
    assert!(batch.is_empty());
    assert!(!ctx.is_open());
    assert_eq!(h.store.open_handles(), 0);
}

#[tokio::test]
async fn malformed_data_can_stop_the_pipeline() {
    let h = harness(policy(OnRecordError::StopPipeline));
    let object = h.store.put(BUCKET, "bad.json", MemoryObject::new(MALFORMED));
    let mut ctx = ReaderContext::new();

    let mut batch = BatchMaker::new();
    let err = h
        .producer
        .produce(&mut ctx, &object, ResumeOffset::start(), 10, &mut batch)
        .await
        .unwrap_err();
    assert!(matches!(
        err,
        ProduceError::Stopped {
            code: ErrorCode::DecodeFailed,
            ..
        }
    ));
    let reports = h.errors.reports();
    assert_eq!(reports.len(), 1);
    assert_eq!(reports[0].code, ErrorCode::DecodeFailed);
}

#[tokio::test]
async fn bad_object_does_not_affect_the_next_one() {
    let h = harness(policy(OnRecordError::ToError));
    let bad = h.store.put(BUCKET, "bad.json", MemoryObject::new(MALFORMED));
    let good = h.store.put(BUCKET, "good.json", MemoryObject::new(THREE_RECORDS));
    let mut ctx = ReaderContext::new();

    let mut batch = BatchMaker::new();
    let err = h
        .producer
        .produce(&mut ctx, &bad, ResumeOffset::start(), 10, &mut batch)
        .await
        .unwrap_err();
    assert!(err.is_bad_object());

    let offset = h
        .producer
        .produce(&mut ctx, &good, ResumeOffset::start(), 10, &mut batch)
        .await
        .unwrap();
    assert!(offset.is_done());
    assert_eq!(batch.len(), 3);
}

// ─── Transport failures ───────────────────────────────────────────────────────

#[tokio::test]
async fn open_failure_is_fatal_and_leaves_nothing_open() {
    let h = harness(ProducerConfig::default());
    let missing = ObjectDescriptor::new(BUCKET, "missing.json", 10);
    let mut ctx = ReaderContext::new();

    let mut batch = BatchMaker::new();
    let err = h
        .producer
        .produce(&mut ctx, &missing, ResumeOffset::start(), 10, &mut batch)
        .await
        .unwrap_err();
    match err {
        ProduceError::Transport { key, offset, .. } => {
            assert_eq!(key, "missing.json");
            assert!(offset.is_start());
        }
        other => panic!("expected transport error, got {other:?}"),
    }
    assert!(!ctx.is_open());
    assert_eq!(h.store.open_handles(), 0);
}

#[tokio::test]
async fn connection_reset_mid_object_is_fatal() {
    let h = harness(policy(OnRecordError::Discard));
    let object = h.store.put(
        BUCKET,
        "a.json",
        MemoryObject::new(THREE_RECORDS).read_fault(8, ReadFault::ConnectionReset),
    );
    let mut ctx = ReaderContext::new();

    let mut batch = BatchMaker::new();
    let err = h
        .producer
        .produce(&mut ctx, &object, ResumeOffset::start(), 10, &mut batch)
        .await
        .unwrap_err();
    assert!(matches!(err, ProduceError::Transport { .. }));
    assert_eq!(err.offset().as_str(), "8");
    assert!(batch.is_empty());
    assert!(!ctx.is_open());
    assert_eq!(h.store.open_handles(), 0);
}

#[tokio::test]
async fn aborted_read_returns_partial_batch() {
    let h = harness(ProducerConfig::default());
    let object = h.store.put(
        BUCKET,
        "a.json",
        MemoryObject::new(THREE_RECORDS).read_fault(16, ReadFault::Aborted),
    );
    let mut ctx = ReaderContext::new();

    let mut batch = BatchMaker::new();
    let offset = h
        .producer
        .produce(&mut ctx, &object, ResumeOffset::start(), 10, &mut batch)
        .await
        .unwrap();
    assert_eq!(batch.len(), 2);
    assert_eq!(offset.as_str(), "16");
    assert!(h.errors.reports().is_empty());
    assert!(!ctx.is_open());
    assert_eq!(h.store.open_handles(), 0);
}

#[tokio::test]
async fn aborted_read_mid_record_resumes_without_loss() {
    let h = harness(ProducerConfig::default());
    let object = h.store.put(
        BUCKET,
        "a.json",
        MemoryObject::new(THREE_RECORDS).read_fault(11, ReadFault::Aborted),
    );
    let mut ctx = ReaderContext::new();

    let mut batch = BatchMaker::new();
    let offset = h
        .producer
        .produce(&mut ctx, &object, ResumeOffset::start(), 10, &mut batch)
        .await
        .unwrap();
    assert_eq!(values(batch.records()), vec![json!({"a": 1})]);
    assert_eq!(offset.as_str(), "8");
    assert!(!ctx.is_open());
    assert_eq!(h.store.open_handles(), 0);

    // Same context, as the scheduler would retry after a cancelled batch.
    let mut batch = BatchMaker::new();
    let offset = h
        .producer
        .produce(&mut ctx, &object, offset, 10, &mut batch)
        .await
        .unwrap();
    assert_eq!(values(batch.records()), vec![json!({"a": 2}), json!({"a": 3})]);
    assert!(offset.is_done());
    assert_eq!(h.store.requests().len(), 2);
    assert_eq!(h.store.open_handles(), 0);
}

#[tokio::test]
async fn aborted_skip_to_resume_offset_keeps_offset() {
    let h = harness(ProducerConfig::default());
    let object = h.store.put(
        BUCKET,
        "a.json",
        MemoryObject::new(THREE_RECORDS).read_fault(4, ReadFault::Aborted),
    );
    let mut ctx = ReaderContext::new();

    let mut batch = BatchMaker::new();
    let offset = h
        .producer
        .produce(&mut ctx, &object, ResumeOffset::from_position(16), 10, &mut batch)
        .await
        .unwrap();
    assert!(batch.is_empty());
    assert_eq!(offset.as_str(), "16");
    assert!(!ctx.is_open());
    assert_eq!(h.store.open_handles(), 0);
    assert!(h.errors.reports().is_empty());

    let mut batch = BatchMaker::new();
    let offset = h
        .producer
        .produce(&mut ctx, &object, offset, 10, &mut batch)
        .await
        .unwrap();
    assert_eq!(values(batch.records()), vec![json!({"a": 3})]);
    assert!(offset.is_done());
}

// ─── Metadata, preview and whole-object mode ─────────────────────────────────

#[tokio::test]
async fn metadata_is_copied_into_headers() {
    let h = harness(ProducerConfig {
        enable_metadata: true,
        ..Default::default()
    });
    let object = h.store.put(
        BUCKET,
        "a.json",
        MemoryObject::new(THREE_RECORDS)
            .metadata("team", "ingest")
            .metadata("retention", json!(null)),
    );

    let (records, _) = drain(&h, &object, ResumeOffset::start(), 10).await;
    assert_eq!(records.len(), 3);
    for record in &records {
        assert_eq!(record.header.attribute("team"), Some("ingest"));
        assert_eq!(record.header.attribute("retention"), Some(""));
        assert_eq!(record.header.attribute("Name"), Some("a.json"));
        assert_eq!(record.header.attribute("Content-Length"), Some("24"));
    }
}

#[tokio::test]
async fn metadata_failure_keeps_records() {
    let h = harness(ProducerConfig {
        enable_metadata: true,
        ..Default::default()
    });
    let object = h.store.put(
        BUCKET,
        "a.json",
        MemoryObject::new(THREE_RECORDS).failing_metadata(),
    );

    let (records, _) = drain(&h, &object, ResumeOffset::start(), 10).await;
    assert_eq!(records.len(), 3);
    assert_eq!(records[0].header.attribute("Name"), Some("a.json"));
    assert_eq!(records[0].header.attribute("ETag"), None);
}

#[tokio::test]
async fn metadata_is_not_attached_when_disabled() {
    let h = harness(ProducerConfig::default());
    let object = h.store.put(BUCKET, "a.json", MemoryObject::new(THREE_RECORDS));

    let (records, _) = drain(&h, &object, ResumeOffset::start(), 10).await;
    assert!(records[0].header.attributes.is_empty());
}

#[tokio::test]
async fn preview_reads_a_bounded_prefix() {
    let h = harness(ProducerConfig {
        preview: true,
        ..Default::default()
    });
    let object = h.store.put(BUCKET, "a.json", MemoryObject::new(THREE_RECORDS));
    let empty = h.store.put(BUCKET, "empty.json", MemoryObject::new(""));

    drain(&h, &object, ResumeOffset::start(), 10).await;
    drain(&h, &empty, ResumeOffset::start(), 10).await;

    let requests = h.store.requests();
    assert_eq!(requests[0].range, Some(24));
    assert_eq!(requests[1].range, None);
}

fn whole_object(verify_checksum: bool) -> ProducerConfig {
    ProducerConfig {
        whole_object: WholeObjectConfig {
            enabled: true,
            max_buffer_size: 4096,
            verify_checksum,
            checksum_algorithm: ChecksumAlgorithm::Md5,
        },
        ..Default::default()
    }
}

#[tokio::test]
async fn whole_object_mode_emits_one_reference_record() {
    let h = harness(whole_object(true));
    let object = h.store.put(
        BUCKET,
        "big.bin",
        MemoryObject::new(vec![7u8; 5000]).owner("alice"),
    );

    let (records, offsets) = drain(&h, &object, ResumeOffset::start(), 10).await;
    assert_eq!(records.len(), 1);
    assert_eq!(offsets, vec!["-1".to_string()]);
    match &records[0].body {
        RecordBody::WholeObject { file_ref, file_info } => {
            assert_eq!(file_ref.total_size, 5000);
            assert_eq!(file_ref.buffer_size, 4096);
            let checksum = file_ref.checksum.as_ref().unwrap();
            assert_eq!(checksum.algorithm, ChecksumAlgorithm::Md5);
            assert_eq!(file_info["bucket"], "logs");
            assert_eq!(file_info["objectKey"], "big.bin");
            assert_eq!(file_info["owner"], "alice");
            assert_eq!(file_info["size"], 5000);
            assert_eq!(file_info["Content-Length"], 1);
        }
        other => panic!("unexpected body {other:?}"),
    }

    let requests = h.store.requests();
    assert_eq!(requests.len(), 1);
    assert_eq!(requests[0].range, Some(1));
    assert_eq!(h.store.open_handles(), 0);
}

#[tokio::test]
async fn whole_object_mode_survives_metadata_failure() {
    let h = harness(whole_object(false));
    let object = h.store.put(
        BUCKET,
        "big.bin",
        MemoryObject::new(vec![1u8; 10]).failing_metadata(),
    );

    let (records, _) = drain(&h, &object, ResumeOffset::start(), 10).await;
    assert_eq!(records.len(), 1);
    match &records[0].body {
        RecordBody::WholeObject { file_ref, file_info } => {
            assert!(file_ref.checksum.is_none());
            assert_eq!(file_info.len(), 4);
            assert!(file_info["owner"].is_null());
        }
        other => panic!("unexpected body {other:?}"),
    }
    assert_eq!(h.store.open_handles(), 0);
}
