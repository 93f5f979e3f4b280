use anyhow::Result;
use serde_json::json;
use std::path::PathBuf;

use miniGIF::metrics;
use miniGIF::LoadOutcome;

use crate::util::open_ro;

pub fn exec(data_dir: Option<PathBuf>, json: bool) -> Result<()> {
    let lib = open_ro(data_dir)?;

    let (state, snap) = match lib.snapshots().load_checked() {
        Ok(LoadOutcome::Loaded(s)) => ("ok", s),
        Ok(LoadOutcome::Absent) => ("absent", Default::default()),
        Err(e) => {
            log::warn!("status: {}", e);
            ("corrupt", Default::default())
        }
    };
    let assets = lib.all_gifs()?;
    let orphans = lib.orphan_assets()?;
    let backups = lib.snapshots().list_backups()?;
    let latest = backups.last().map(|b| b.name.clone());
    let ms = metrics::snapshot();

    if json {
        let v = json!({
            "data_dir": lib.data_dir().display().to_string(),
            "snapshot": {
                "path": lib.snapshots().path().display().to_string(),
                "state": state,
                "categories": snap.categories.len(),
                "items": snap.item_count(),
                "gifs": snap.gifs.len(),
                "orphan_item_keys": snap.orphan_item_keys(),
            },
            "assets": {
                "dir": lib.assets().dir().display().to_string(),
                "files": assets.len(),
                "orphans": orphans.len(),
            },
            "backups": {
                "count": backups.len(),
                "latest": latest,
            },
            "hotkey": lib.settings().hotkey(),
            "metrics": {
                "snapshot_saves": ms.snapshot_saves,
                "snapshot_save_failures": ms.snapshot_save_failures,
                "snapshot_load_degraded": ms.snapshot_load_degraded,
                "backups_created": ms.backups_created,
                "backup_failures": ms.backup_failures,
                "assets_written": ms.assets_written,
                "asset_bytes_written": ms.asset_bytes_written,
                "assets_deleted": ms.assets_deleted,
                "assets_copied": ms.assets_copied,
                "asset_failures": ms.asset_failures,
                "fetch_failures": ms.fetch_failures,
                "exports_total": ms.exports_total,
                "imports_total": ms.imports_total,
                "imports_rejected": ms.imports_rejected,
            },
        });
        println!("{}", serde_json::to_string_pretty(&v)?);
        return Ok(());
    }

    println!("miniGIF status:");
    println!("  data_dir     = {}", lib.data_dir().display());
    println!("  config       = {}", lib.config());
    println!("  snapshot     = {} ({})", lib.snapshots().path().display(), state);
    println!("  categories   = {}", snap.categories.len());
    println!("  items        = {}", snap.item_count());
    println!("  gifs (meta)  = {}", snap.gifs.len());
    let orphan_keys = snap.orphan_item_keys();
    if !orphan_keys.is_empty() {
        println!("  orphan itemsData keys = {}", orphan_keys.join(", "));
    }
    println!("  asset files  = {} (orphans: {})", assets.len(), orphans.len());
    println!(
        "  backups      = {} (latest: {})",
        backups.len(),
        latest.unwrap_or_else(|| "-".to_string())
    );
    println!("  hotkey       = {}", lib.settings().hotkey());

    println!("Metrics (this process):");
    println!("  snapshot saves/failures = {}/{}", ms.snapshot_saves, ms.snapshot_save_failures);
    println!("  backups created/failed  = {}/{}", ms.backups_created, ms.backup_failures);
    println!(
        "  assets written/deleted/copied/failed = {}/{}/{}/{}",
        ms.assets_written, ms.assets_deleted, ms.assets_copied, ms.asset_failures
    );
    println!("  fetch failures          = {}", ms.fetch_failures);
    println!(
        "  exports/imports/rejected = {}/{}/{}",
        ms.exports_total, ms.imports_total, ms.imports_rejected
    );
    Ok(())
}
