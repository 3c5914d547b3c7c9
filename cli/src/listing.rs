//! Lists the objects of a bucket directory.

use anyhow::{bail, Context, Result};
use bucketspool_core::{LocalObjectStore, ObjectDescriptor};
use walkdir::WalkDir;

use crate::config::ObjectOrder;

/// Every regular file under `<root>/<bucket>`, keyed by its `/`-joined
/// relative path. Hidden files and directories are skipped.
pub async fn list_objects(
    store: &LocalObjectStore,
    bucket: &str,
    prefix: Option<&str>,
    order: ObjectOrder,
) -> Result<Vec<ObjectDescriptor>> {
    let dir = store.root().join(bucket);
    if !dir.is_dir() {
        bail!("bucket directory {} does not exist", dir.display());
    }

    let mut keys = Vec::new();
    let walker = WalkDir::new(&dir)
        .sort_by_file_name()
        .into_iter()
        .filter_entry(|e| e.depth() == 0 || !e.file_name().to_string_lossy().starts_with('.'));
    for entry in walker {
        let entry = entry.with_context(|| format!("walking {}", dir.display()))?;
        if !entry.file_type().is_file() {
            continue;
        }
        let relative = entry.path().strip_prefix(&dir)?;
        let key = relative
            .components()
            .map(|c| c.as_os_str().to_string_lossy())
            .collect::<Vec<_>>()
            .join("/");
        if prefix.is_some_and(|p| !key.starts_with(p)) {
            continue;
        }
        keys.push(key);
    }

    let mut objects = Vec::with_capacity(keys.len());
    for key in keys {
        let object = store
            .describe(bucket, &key)
            .await
            .with_context(|| format!("describing {bucket}/{key}"))?;
        objects.push(object);
    }

    match order {
        ObjectOrder::Lexicographic => objects.sort_by(|a, b| a.key.cmp(&b.key)),
        ObjectOrder::Timestamp => {
            objects.sort_by(|a, b| (a.last_modified, &a.key).cmp(&(b.last_modified, &b.key)))
        }
    }
    Ok(objects)
}
