use anyhow::{Context, Result};
use std::path::PathBuf;

use miniGIF::{validate, StoreError};

pub fn exec(file: PathBuf) -> Result<()> {
    let bytes = std::fs::read(&file).with_context(|| format!("read {}", file.display()))?;
    let value: serde_json::Value = serde_json::from_slice(&bytes)
        .map_err(|e| StoreError::MalformedJson {
            what: file.display().to_string(),
            source: e,
        })?;
    validate(&value)?;

    let snap: miniGIF::Snapshot = serde_json::from_value(value)?;
    println!(
        "VALID {} (categories={}, items={}, gifs={})",
        file.display(),
        snap.categories.len(),
        snap.item_count(),
        snap.gifs.len()
    );
    Ok(())
}
