//! `bucketspool run` — spool every object of a bucket to JSON lines.
//!
//! Offsets are checkpointed after every batch, so an interrupted run picks
//! up where it stopped and finished objects are never read twice.

use anyhow::{Context, Result};
use bucketspool_core::{DefaultErrorRecordHandler, LocalObjectStore, ObjectDescriptor, ResumeOffset};
use bucketspool_decoders::FormatDecoderFactory;
use bucketspool_observability::SpoolMetrics;
use bucketspool_producer::{
    BatchMaker, BatchProducer, CheckpointManager, JsonFileOffsetStore, ReaderContext,
};
use std::io::{BufWriter, Write};
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use std::time::Instant;
use tracing::{debug, info, warn};

use crate::config::SpoolConfig;
use crate::listing::list_objects;

/// Counters for one run.
#[derive(Debug, Default, Clone, PartialEq, Eq)]
pub struct RunSummary {
    pub objects: usize,
    pub skipped: usize,
    pub records: usize,
    pub bad_objects: usize,
    pub reported_errors: usize,
}

pub async fn run(config: SpoolConfig) -> Result<()> {
    let shutdown = Arc::new(AtomicBool::new(false));
    {
        let shutdown = Arc::clone(&shutdown);
        tokio::spawn(async move {
            if tokio::signal::ctrl_c().await.is_ok() {
                info!("Interrupted; stopping after the current batch");
                shutdown.store(true, Ordering::SeqCst);
            }
        });
    }

    let stdout = std::io::stdout();
    let mut out = BufWriter::new(stdout.lock());
    let summary = spool(&config, &mut out, &shutdown).await?;
    out.flush()?;

    eprintln!(
        "spooled {} records from {} objects ({} already done, {} bad, {} record errors)",
        summary.records, summary.objects, summary.skipped, summary.bad_objects, summary.reported_errors
    );
    Ok(())
}

/// Drive the producer over every listed object, writing records to `out`.
pub async fn spool<W: Write>(
    config: &SpoolConfig,
    out: &mut W,
    shutdown: &AtomicBool,
) -> Result<RunSummary> {
    let store = Arc::new(LocalObjectStore::new(&config.root));
    let objects = list_objects(&store, &config.bucket, config.prefix.as_deref(), config.order).await?;
    info!(bucket = %config.bucket, objects = objects.len(), "Listed bucket");

    let errors = DefaultErrorRecordHandler::new(config.producer.on_record_error);
    let producer = BatchProducer::new(
        config.producer.clone(),
        store,
        Arc::new(FormatDecoderFactory::new(config.decoder.clone())),
    )
    .with_error_handler(Arc::new(errors.clone()));
    let checkpoints = CheckpointManager::new(Box::new(JsonFileOffsetStore::new(&config.offsets_file)));
    let metrics = SpoolMetrics::global();

    let mut ctx = ReaderContext::new();
    let mut summary = RunSummary::default();
    let outcome = spool_objects(
        config,
        &producer,
        &checkpoints,
        &metrics,
        &objects,
        &mut ctx,
        out,
        shutdown,
        &mut summary,
    )
    .await;
    ctx.shutdown().await;
    summary.reported_errors = errors.drain().len();
    outcome.map(|()| summary)
}

#[allow(clippy::too_many_arguments)]
async fn spool_objects<W: Write>(
    config: &SpoolConfig,
    producer: &BatchProducer,
    checkpoints: &CheckpointManager,
    metrics: &SpoolMetrics,
    objects: &[ObjectDescriptor],
    ctx: &mut ReaderContext,
    out: &mut W,
    shutdown: &AtomicBool,
    summary: &mut RunSummary,
) -> Result<()> {
    for object in objects {
        let mut offset = checkpoints.resume_offset(object).await?;
        if offset.is_done() {
            debug!(key = %object.key, "Already spooled");
            summary.skipped += 1;
            continue;
        }
        summary.objects += 1;

        while !offset.is_done() {
            if shutdown.load(Ordering::SeqCst) {
                return Ok(());
            }
            let mut batch = BatchMaker::with_capacity(config.batch_size);
            let started = Instant::now();
            let result = producer
                .produce(ctx, object, offset.clone(), config.batch_size, &mut batch)
                .await;

            match result {
                Ok(next) => {
                    metrics.record_batch(
                        &object.bucket,
                        batch.len(),
                        started.elapsed().as_secs_f64() * 1000.0,
                    );
                    summary.records += batch.len();
                    for record in batch.records() {
                        serde_json::to_writer(&mut *out, record)?;
                        writeln!(out)?;
                    }
                    checkpoints
                        .commit(object, &next)
                        .await
                        .with_context(|| format!("saving offset for {}", object.key))?;
                    if next == offset && !next.is_done() {
                        // Aborted read; retry from the same place on the next run.
                        return Ok(());
                    }
                    offset = next;
                }
                Err(err) if err.is_bad_object() => {
                    metrics.record_failure(&object.bucket, &err);
                    warn!(key = %object.key, "Skipping object: {err}");
                    summary.bad_objects += 1;
                    checkpoints
                        .commit(object, &ResumeOffset::done())
                        .await?;
                    break;
                }
                Err(err) => {
                    metrics.record_failure(&object.bucket, &err);
                    return Err(err).with_context(|| format!("spooling {}/{}", object.bucket, object.key));
                }
            }
        }
        metrics.record_completed(&object.bucket);
    }
    Ok(())
}
