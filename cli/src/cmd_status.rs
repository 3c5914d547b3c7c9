//! `bucketspool status` — show each object and its checkpointed offset.

use anyhow::Result;
use bucketspool_core::LocalObjectStore;
use bucketspool_producer::{CheckpointManager, JsonFileOffsetStore};
use serde::Serialize;

use crate::config::SpoolConfig;
use crate::listing::list_objects;

#[derive(Debug, Serialize)]
struct ObjectStatus {
    key: String,
    size: u64,
    offset: String,
    state: &'static str,
}

pub async fn run(config: &SpoolConfig, json: bool) -> Result<()> {
    let store = LocalObjectStore::new(&config.root);
    let objects = list_objects(&store, &config.bucket, config.prefix.as_deref(), config.order).await?;
    let checkpoints = CheckpointManager::new(Box::new(JsonFileOffsetStore::new(&config.offsets_file)));

    let mut rows = Vec::with_capacity(objects.len());
    for object in &objects {
        let offset = checkpoints.resume_offset(object).await?;
        let state = if offset.is_done() {
            "done"
        } else if offset.is_start() {
            "pending"
        } else {
            "partial"
        };
        rows.push(ObjectStatus {
            key: object.key.clone(),
            size: object.size,
            offset: offset.to_string(),
            state,
        });
    }

    if json {
        println!("{}", serde_json::to_string_pretty(&rows)?);
        return Ok(());
    }

    println!("{:<48} {:>12} {:>12}  STATE", "KEY", "SIZE", "OFFSET");
    for row in &rows {
        println!("{:<48} {:>12} {:>12}  {}", row.key, row.size, row.offset, row.state);
    }
    let done = rows.iter().filter(|r| r.state == "done").count();
    println!("\n{done}/{} objects done", rows.len());
    Ok(())
}
