//! library: фасад над хранилищами: снапшот, ассеты, бэкапы, пакеты, настройки.
//!
//! Library владеет каноническим gif_data.json (через SnapshotStore) и каталогом ассетов.
//! Writer-режим (open) держит эксклюзивный LOCK на <data_dir>/LOCK всё время жизни,
//! read-only режим (open_ro): разделяемый.
//!
//! Импорт:
//!   let staged = lib.stage_import(path)?;       // ничего не меняет
//!   lib.commit_import(staged, ImportStrategy::Merge)?;
//! или одной операцией: lib.import_from(path, strategy).

use anyhow::{anyhow, Context, Result};
use log::{info, warn};
use std::collections::BTreeSet;
use std::fmt;
use std::path::{Path, PathBuf};
use std::str::FromStr;

use crate::archive::{
    all_selection, import_package, ArchiveExporter, ArchiveImporter, ExportSummary, StagedImport,
};
use crate::assets::{AssetSource, AssetStore, FetchOptions};
use crate::config::{LibraryBuilder, MiniGifConfig};
use crate::error::StoreResult;
use crate::lock::LibraryLock;
use crate::merge::{merge_with_report, MergeReport};
use crate::metrics::{record_import, record_merge_skips};
use crate::model::{Category, Snapshot};
use crate::settings::{apply_order, Settings};
use crate::snapshot::SnapshotStore;

/// Выбор пользователя при импорте. "Отмена": это просто drop StagedImport.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ImportStrategy {
    Merge,
    Replace,
}

impl fmt::Display for ImportStrategy {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ImportStrategy::Merge => f.write_str("merge"),
            ImportStrategy::Replace => f.write_str("replace"),
        }
    }
}

impl FromStr for ImportStrategy {
    type Err = anyhow::Error;

    fn from_str(s: &str) -> Result<Self> {
        match s.trim().to_ascii_lowercase().as_str() {
            "merge" => Ok(ImportStrategy::Merge),
            "replace" => Ok(ImportStrategy::Replace),
            other => Err(anyhow!("unknown import strategy '{}' (merge|replace)", other)),
        }
    }
}

#[derive(Debug, Clone)]
pub struct ImportSummary {
    pub source: PathBuf,
    pub strategy: ImportStrategy,
    /// Итоговые размеры библиотеки после импорта.
    pub categories: usize,
    pub items: usize,
    pub assets_imported: usize,
    /// Только для Merge.
    pub report: Option<MergeReport>,
    pub backup: Option<PathBuf>,
    pub snapshot: Snapshot,
}

impl ImportSummary {
    pub fn notification(&self) -> String {
        let mut s = match self.strategy {
            ImportStrategy::Replace => format!(
                "Library replaced: {} categories, {} GIFs",
                self.categories, self.items
            ),
            ImportStrategy::Merge => format!(
                "Library merged: {} categories, {} GIFs",
                self.categories, self.items
            ),
        };
        if let Some(r) = &self.report {
            s.push_str(&format!(
                " (+{} categories, +{} GIFs",
                r.categories_added, r.items_added
            ));
            if !r.categories_skipped.is_empty() {
                s.push_str(&format!(
                    "; kept existing categories: {}",
                    r.categories_skipped.join(", ")
                ));
            }
            if r.items_skipped > 0 {
                s.push_str(&format!("; {} duplicate GIFs skipped", r.items_skipped));
            }
            s.push(')');
        }
        s
    }
}

pub struct Library {
    cfg: MiniGifConfig,
    snapshots: SnapshotStore,
    assets: AssetStore,
    settings: Settings,
    readonly: bool,
    _lock: Option<LibraryLock>,
}

impl Library {
    pub fn builder() -> LibraryBuilder {
        LibraryBuilder::new()
    }

    /// Открыть библиотеку на запись (эксклюзивный LOCK, если cfg.lock).
    pub fn open(cfg: MiniGifConfig) -> Result<Self> {
        Self::open_mode(cfg, false)
    }

    /// Открыть только на чтение: разделяемый LOCK (если cfg.lock и LOCK есть), диск не меняется.
    pub fn open_ro(cfg: MiniGifConfig) -> Result<Self> {
        Self::open_mode(cfg, true)
    }

    fn open_mode(cfg: MiniGifConfig, readonly: bool) -> Result<Self> {
        let root = cfg.data_dir.clone();
        let fetch = FetchOptions {
            timeout: cfg.fetch_timeout(),
            max_bytes: cfg.fetch_max_bytes,
        };

        // read-only: на диске ничего не создаётся (ни data_dir, ни gifs/, ни LOCK)
        let (lock, assets) = if readonly {
            let lock = if cfg.lock { LibraryLock::reader(&root)? } else { None };
            (lock, AssetStore::open_ro(&cfg.resolved_assets_dir(), fetch))
        } else {
            std::fs::create_dir_all(&root)
                .with_context(|| format!("create {}", root.display()))?;
            let lock = if cfg.lock { Some(LibraryLock::writer(&root)?) } else { None };
            (lock, AssetStore::open(&cfg.resolved_assets_dir(), fetch)?)
        };
        let snapshots = SnapshotStore::new(&cfg.snapshot_path(), &cfg.resolved_backups_dir());
        let settings = Settings::new(&root);

        info!(
            "library: opened {} ({})",
            root.display(),
            if readonly { "read-only" } else { "writer" }
        );

        Ok(Self {
            cfg,
            snapshots,
            assets,
            settings,
            readonly,
            _lock: lock,
        })
    }

    pub fn config(&self) -> &MiniGifConfig {
        &self.cfg
    }

    pub fn data_dir(&self) -> &Path {
        &self.cfg.data_dir
    }

    pub fn is_readonly(&self) -> bool {
        self.readonly
    }

    pub fn snapshots(&self) -> &SnapshotStore {
        &self.snapshots
    }

    pub fn assets(&self) -> &AssetStore {
        &self.assets
    }

    pub fn settings(&self) -> &Settings {
        &self.settings
    }

    fn ensure_writable(&self) -> Result<()> {
        if self.readonly {
            return Err(anyhow!("library {} is opened read-only", self.data_dir().display()));
        }
        Ok(())
    }

    fn writable_or_warn(&self, op: &str) -> bool {
        if self.readonly {
            warn!("library: {} refused, opened read-only", op);
            return false;
        }
        true
    }

    // ----- snapshot -----

    /// Текущий снапшот (битый/отсутствующий файл → пустой).
    pub fn snapshot(&self) -> Snapshot {
        self.snapshots.load()
    }

    pub fn save(&self, snapshot: &Snapshot) -> bool {
        self.writable_or_warn("save") && self.snapshots.save(snapshot)
    }

    pub fn backup(&self) -> bool {
        self.writable_or_warn("backup") && self.snapshots.backup()
    }

    /// Категории в порядке categories-order.json (если он сохранён).
    pub fn ordered_categories(&self) -> Vec<Category> {
        let snap = self.snapshot();
        match self.settings.categories_order() {
            Some(order) => apply_order(&snap.categories, &order),
            None => snap.categories,
        }
    }

    // ----- assets -----

    pub fn gif_path(&self, gif_id: &str) -> PathBuf {
        self.assets.resolve_path(gif_id)
    }

    pub fn all_gifs(&self) -> Result<Vec<String>> {
        self.assets.list_ids()
    }

    pub fn save_gif(&self, gif_id: &str, source: &AssetSource) -> bool {
        self.writable_or_warn("save_gif") && self.assets.save(gif_id, source)
    }

    pub fn delete_gif(&self, gif_id: &str) -> bool {
        self.writable_or_warn("delete_gif") && self.assets.delete(gif_id)
    }

    pub fn copy_gif(&self, from_id: &str, to_id: &str) -> bool {
        self.writable_or_warn("copy_gif") && self.assets.copy(from_id, to_id)
    }

    /// Файлы ассетов, на которые не ссылается ни один элемент. Ничего не удаляется.
    pub fn orphan_assets(&self) -> Result<Vec<String>> {
        let referenced = self.snapshot().referenced_gif_ids();
        Ok(self
            .assets
            .list_ids()?
            .into_iter()
            .filter(|id| !referenced.contains(id))
            .collect())
    }

    // ----- export -----

    /// Выгрузить категории ids в пакет out (*.zip → zip, иначе каталог).
    pub fn export_selection<S: AsRef<str>>(&self, out: &Path, ids: &[S]) -> Result<ExportSummary> {
        let selected: BTreeSet<String> = ids.iter().map(|s| s.as_ref().to_string()).collect();
        let current = self.snapshot();
        let exporter = ArchiveExporter::new(&self.assets, self.cfg.zip_level);
        let summary = exporter
            .export_selection(&current, &selected, out)
            .with_context(|| format!("export to {}", out.display()))?;
        Ok(summary)
    }

    /// Выгрузить всю библиотеку (все категории и сироты itemsData).
    pub fn export_all(&self, out: &Path) -> Result<ExportSummary> {
        let current = self.snapshot();
        let selected = all_selection(&current);
        let exporter = ArchiveExporter::new(&self.assets, self.cfg.zip_level);
        let summary = exporter
            .export_selection(&current, &selected, out)
            .with_context(|| format!("export to {}", out.display()))?;
        Ok(summary)
    }

    // ----- import -----

    pub fn stage_import(&self, path: &Path) -> StoreResult<StagedImport> {
        ArchiveImporter::stage(path)
    }

    pub fn import_from(&mut self, path: &Path, strategy: ImportStrategy) -> Result<ImportSummary> {
        self.ensure_writable()?;
        let staged = self
            .stage_import(path)
            .with_context(|| format!("import from {}", path.display()))?;
        self.commit_import(staged, strategy)
    }

    /// Применить подготовленный импорт.
    ///
    /// Порядок: проверка текущего снапшота → бэкап (опционально) → ассеты (перезапись,
    /// откат при сбое) → merge/replace → сохранение. При Merge битый текущий gif_data.json
    /// прерывает импорт до записи ассетов; сбой записи ассета прерывает его до сохранения.
    pub fn commit_import(&mut self, staged: StagedImport, strategy: ImportStrategy) -> Result<ImportSummary> {
        self.ensure_writable()?;

        let current = match self.snapshots.load_checked() {
            Ok(outcome) => Some(outcome.into_snapshot()),
            Err(e) if strategy == ImportStrategy::Merge => {
                record_import(false);
                return Err(anyhow::Error::new(e).context(
                    "current snapshot is unreadable; restore a backup or import with replace",
                ));
            }
            Err(e) => {
                warn!("import: replacing unreadable snapshot: {}", e);
                if self.snapshots.exists() {
                    if let Err(e) = self.snapshots.keep_corrupt() {
                        warn!("import: could not keep corrupt snapshot: {:#}", e);
                    }
                }
                None
            }
        };

        let mut backup = None;
        if self.cfg.backup_before_import && current.is_some() && self.snapshots.exists() {
            match self.snapshots.create_backup() {
                Ok(p) => backup = Some(p),
                Err(e) => warn!("import: pre-import backup failed: {:#}", e),
            }
        }

        let (incoming, assets_imported) = match import_package(
            Some(staged.manifest_bytes()),
            staged.asset_files(),
            &self.assets,
        ) {
            Ok(s) => s,
            Err(e) => {
                record_import(false);
                return Err(anyhow::Error::new(e)
                    .context(format!("import from {}", staged.source().display())));
            }
        };

        let (result, report) = match strategy {
            ImportStrategy::Merge => {
                let current = current.unwrap_or_default();
                let (merged, report) = merge_with_report(&current, &incoming);
                record_merge_skips(report.categories_skipped.len(), report.items_skipped);
                if !report.categories_skipped.is_empty() {
                    info!(
                        "import: kept existing categories on id collision: {}",
                        report.categories_skipped.join(", ")
                    );
                }
                (merged, Some(report))
            }
            ImportStrategy::Replace => (incoming, None),
        };

        self.snapshots
            .try_save(&result)
            .context("save snapshot after import")?;
        record_import(true);

        let summary = ImportSummary {
            source: staged.source().to_path_buf(),
            strategy,
            categories: result.categories.len(),
            items: result.item_count(),
            assets_imported,
            report,
            backup,
            snapshot: result,
        };
        info!("import: {}", summary.notification());
        Ok(summary)
    }
}
