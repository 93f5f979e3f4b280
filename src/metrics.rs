//! Lightweight global metrics for the miniGIF data core.
//!
//! Потокобезопасные атомарные счётчики для подсистем:
//! - Snapshot store (save / backup)
//! - Asset store (write / delete / copy / fetch)
//! - Archive (export / import)
//! - Merge (пропущенные категории/элементы)

use std::sync::atomic::{AtomicU64, Ordering};

// ----- Snapshot store -----
static SNAPSHOT_SAVES: AtomicU64 = AtomicU64::new(0);
static SNAPSHOT_SAVE_FAILURES: AtomicU64 = AtomicU64::new(0);
static SNAPSHOT_LOAD_DEGRADED: AtomicU64 = AtomicU64::new(0);
static BACKUPS_CREATED: AtomicU64 = AtomicU64::new(0);
static BACKUP_FAILURES: AtomicU64 = AtomicU64::new(0);

// ----- Asset store -----
static ASSETS_WRITTEN: AtomicU64 = AtomicU64::new(0);
static ASSET_BYTES_WRITTEN: AtomicU64 = AtomicU64::new(0);
static ASSETS_DELETED: AtomicU64 = AtomicU64::new(0);
static ASSETS_COPIED: AtomicU64 = AtomicU64::new(0);
static ASSET_FAILURES: AtomicU64 = AtomicU64::new(0);
static FETCH_FAILURES: AtomicU64 = AtomicU64::new(0);

// ----- Archive -----
static EXPORTS_TOTAL: AtomicU64 = AtomicU64::new(0);
static EXPORT_ASSETS_MISSING: AtomicU64 = AtomicU64::new(0);
static IMPORTS_TOTAL: AtomicU64 = AtomicU64::new(0);
static IMPORTS_REJECTED: AtomicU64 = AtomicU64::new(0);

// ----- Merge -----
static MERGE_CATEGORIES_SKIPPED: AtomicU64 = AtomicU64::new(0);
static MERGE_ITEMS_SKIPPED: AtomicU64 = AtomicU64::new(0);

#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct MetricsSnapshot {
    // Snapshot store
    pub snapshot_saves: u64,
    pub snapshot_save_failures: u64,
    pub snapshot_load_degraded: u64,
    pub backups_created: u64,
    pub backup_failures: u64,

    // Asset store
    pub assets_written: u64,
    pub asset_bytes_written: u64,
    pub assets_deleted: u64,
    pub assets_copied: u64,
    pub asset_failures: u64,
    pub fetch_failures: u64,

    // Archive
    pub exports_total: u64,
    pub export_assets_missing: u64,
    pub imports_total: u64,
    pub imports_rejected: u64,

    // Merge
    pub merge_categories_skipped: u64,
    pub merge_items_skipped: u64,
}

impl MetricsSnapshot {
    pub fn import_reject_ratio(&self) -> f64 {
        let total = self.imports_total + self.imports_rejected;
        if total == 0 {
            0.0
        } else {
            self.imports_rejected as f64 / total as f64
        }
    }
}

// ----- Recorders (Snapshot store) -----
pub fn record_snapshot_save(ok: bool) {
    if ok {
        SNAPSHOT_SAVES.fetch_add(1, Ordering::Relaxed);
    } else {
        SNAPSHOT_SAVE_FAILURES.fetch_add(1, Ordering::Relaxed);
    }
}

pub fn record_snapshot_load_degraded() {
    SNAPSHOT_LOAD_DEGRADED.fetch_add(1, Ordering::Relaxed);
}

pub fn record_backup(ok: bool) {
    if ok {
        BACKUPS_CREATED.fetch_add(1, Ordering::Relaxed);
    } else {
        BACKUP_FAILURES.fetch_add(1, Ordering::Relaxed);
    }
}

// ----- Recorders (Asset store) -----
pub fn record_asset_written(bytes: usize) {
    ASSETS_WRITTEN.fetch_add(1, Ordering::Relaxed);
    ASSET_BYTES_WRITTEN.fetch_add(bytes as u64, Ordering::Relaxed);
}

pub fn record_asset_deleted() {
    ASSETS_DELETED.fetch_add(1, Ordering::Relaxed);
}

pub fn record_asset_copied() {
    ASSETS_COPIED.fetch_add(1, Ordering::Relaxed);
}

pub fn record_asset_failure() {
    ASSET_FAILURES.fetch_add(1, Ordering::Relaxed);
}

pub fn record_fetch_failure() {
    FETCH_FAILURES.fetch_add(1, Ordering::Relaxed);
}

// ----- Recorders (Archive) -----
pub fn record_export(assets_missing: usize) {
    EXPORTS_TOTAL.fetch_add(1, Ordering::Relaxed);
    EXPORT_ASSETS_MISSING.fetch_add(assets_missing as u64, Ordering::Relaxed);
}

pub fn record_import(accepted: bool) {
    if accepted {
        IMPORTS_TOTAL.fetch_add(1, Ordering::Relaxed);
    } else {
        IMPORTS_REJECTED.fetch_add(1, Ordering::Relaxed);
    }
}

// ----- Recorders (Merge) -----
pub fn record_merge_skips(categories: usize, items: usize) {
    MERGE_CATEGORIES_SKIPPED.fetch_add(categories as u64, Ordering::Relaxed);
    MERGE_ITEMS_SKIPPED.fetch_add(items as u64, Ordering::Relaxed);
}

// ----- Snapshot / Reset -----
pub fn snapshot() -> MetricsSnapshot {
    MetricsSnapshot {
        snapshot_saves: SNAPSHOT_SAVES.load(Ordering::Relaxed),
        snapshot_save_failures: SNAPSHOT_SAVE_FAILURES.load(Ordering::Relaxed),
        snapshot_load_degraded: SNAPSHOT_LOAD_DEGRADED.load(Ordering::Relaxed),
        backups_created: BACKUPS_CREATED.load(Ordering::Relaxed),
        backup_failures: BACKUP_FAILURES.load(Ordering::Relaxed),

        assets_written: ASSETS_WRITTEN.load(Ordering::Relaxed),
        asset_bytes_written: ASSET_BYTES_WRITTEN.load(Ordering::Relaxed),
        assets_deleted: ASSETS_DELETED.load(Ordering::Relaxed),
        assets_copied: ASSETS_COPIED.load(Ordering::Relaxed),
        asset_failures: ASSET_FAILURES.load(Ordering::Relaxed),
        fetch_failures: FETCH_FAILURES.load(Ordering::Relaxed),

        exports_total: EXPORTS_TOTAL.load(Ordering::Relaxed),
        export_assets_missing: EXPORT_ASSETS_MISSING.load(Ordering::Relaxed),
        imports_total: IMPORTS_TOTAL.load(Ordering::Relaxed),
        imports_rejected: IMPORTS_REJECTED.load(Ordering::Relaxed),

        merge_categories_skipped: MERGE_CATEGORIES_SKIPPED.load(Ordering::Relaxed),
        merge_items_skipped: MERGE_ITEMS_SKIPPED.load(Ordering::Relaxed),
    }
}

pub fn reset() {
    SNAPSHOT_SAVES.store(0, Ordering::Relaxed);
    SNAPSHOT_SAVE_FAILURES.store(0, Ordering::Relaxed);
    SNAPSHOT_LOAD_DEGRADED.store(0, Ordering::Relaxed);
    BACKUPS_CREATED.store(0, Ordering::Relaxed);
    BACKUP_FAILURES.store(0, Ordering::Relaxed);

    ASSETS_WRITTEN.store(0, Ordering::Relaxed);
    ASSET_BYTES_WRITTEN.store(0, Ordering::Relaxed);
    ASSETS_DELETED.store(0, Ordering::Relaxed);
    ASSETS_COPIED.store(0, Ordering::Relaxed);
    ASSET_FAILURES.store(0, Ordering::Relaxed);
    FETCH_FAILURES.store(0, Ordering::Relaxed);

    EXPORTS_TOTAL.store(0, Ordering::Relaxed);
    EXPORT_ASSETS_MISSING.store(0, Ordering::Relaxed);
    IMPORTS_TOTAL.store(0, Ordering::Relaxed);
    IMPORTS_REJECTED.store(0, Ordering::Relaxed);

    MERGE_CATEGORIES_SKIPPED.store(0, Ordering::Relaxed);
    MERGE_ITEMS_SKIPPED.store(0, Ordering::Relaxed);
}
