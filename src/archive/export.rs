//! archive/export: выгрузка выбранных категорий в пакет.
//!
//! Политика реестра gifs одна для обоих режимов ("выбранные" и "всё"): в data.json
//! попадают только записи gifs, на которые ссылаются выгруженные элементы.
//! Файлы ассетов копируются только для ссылок, которые есть на диске; отсутствующие
//! пропускаются молча (в сводке они считаются в assets_missing).
//!
//! Пакет собирается во временном каталоге (удаляется на любом пути выхода),
//! затем упаковывается в zip или копируется в каталог назначения.

use log::{debug, info};
use std::collections::{BTreeMap, BTreeSet};
use std::fs;
use std::path::{Path, PathBuf};

use super::package::{write_dir, write_zip, PackageFormat};
use crate::assets::AssetStore;
use crate::consts::{ASSET_EXT, EXPORT_TMP_PREFIX, MANIFEST_FILE};
use crate::error::{StoreError, StoreResult};
use crate::metrics::record_export;
use crate::model::Snapshot;

/// Снапшот, суженный до выбранных категорий.
///
/// Порядок категорий: как в current; элементы копируются как есть; ключи itemsData
/// из выборки без категории (сироты) тоже переносятся.
pub fn filter_selection(current: &Snapshot, selected: &BTreeSet<String>) -> Snapshot {
    let categories = current
        .categories
        .iter()
        .filter(|c| selected.contains(&c.id))
        .cloned()
        .collect();
    let items_data: BTreeMap<_, _> = current
        .items_data
        .iter()
        .filter(|(k, _)| selected.contains(*k))
        .map(|(k, v)| (k.clone(), v.clone()))
        .collect();

    let mut out = Snapshot {
        categories,
        items_data,
        gifs: BTreeMap::new(),
    };
    let referenced = out.referenced_gif_ids();
    out.gifs = current
        .gifs
        .iter()
        .filter(|(k, _)| referenced.contains(*k))
        .map(|(k, v)| (k.clone(), v.clone()))
        .collect();
    out
}

/// Все id, которые выгружает "экспорт всего": категории плюс сироты itemsData.
pub fn all_selection(current: &Snapshot) -> BTreeSet<String> {
    current
        .categories
        .iter()
        .map(|c| c.id.clone())
        .chain(current.items_data.keys().cloned())
        .collect()
}

/// Содержимое пакета до записи на диск.
#[derive(Debug, Clone)]
pub struct PackageContents {
    pub manifest: Snapshot,
    /// gifId → файл ассета в хранилище.
    pub assets: BTreeMap<String, PathBuf>,
    /// Ссылки без файла на диске.
    pub missing: Vec<String>,
}

#[derive(Debug, Clone)]
pub struct ExportSummary {
    pub path: PathBuf,
    pub format: PackageFormat,
    pub categories: usize,
    pub items: usize,
    pub assets_written: usize,
    pub assets_missing: usize,
}

impl ExportSummary {
    pub fn notification(&self) -> String {
        let mut s = format!(
            "Exported {} categories, {} GIFs to {}",
            self.categories,
            self.items,
            self.path.display()
        );
        if self.assets_missing > 0 {
            s.push_str(&format!(" ({} GIF files were missing and skipped)", self.assets_missing));
        }
        s
    }
}

pub struct ArchiveExporter<'a> {
    assets: &'a AssetStore,
    zip_level: Option<i32>,
}

impl<'a> ArchiveExporter<'a> {
    pub fn new(assets: &'a AssetStore, zip_level: Option<i32>) -> Self {
        Self { assets, zip_level }
    }

    /// Собрать содержимое пакета (без записи).
    pub fn collect(&self, current: &Snapshot, selected: &BTreeSet<String>) -> PackageContents {
        let manifest = filter_selection(current, selected);
        let mut assets = BTreeMap::new();
        let mut missing = Vec::new();
        for id in manifest.referenced_gif_ids() {
            if self.assets.exists(&id) {
                let p = self.assets.resolve_path(&id);
                assets.insert(id, p);
            } else {
                debug!("export: asset '{}' not on disk, skipped", id);
                missing.push(id);
            }
        }
        PackageContents {
            manifest,
            assets,
            missing,
        }
    }

    /// Выгрузить выбранные категории в пакет out (*.zip → zip, иначе каталог).
    pub fn export_selection(
        &self,
        current: &Snapshot,
        selected: &BTreeSet<String>,
        out: &Path,
    ) -> StoreResult<ExportSummary> {
        let contents = self.collect(current, selected);
        self.write_package(&contents, out)
    }

    pub fn write_package(&self, contents: &PackageContents, out: &Path) -> StoreResult<ExportSummary> {
        let work = tempfile::Builder::new()
            .prefix(EXPORT_TMP_PREFIX)
            .tempdir()
            .map_err(|e| StoreError::io("create export work dir", e))?;

        let json = contents
            .manifest
            .to_pretty_json()
            .map_err(|e| StoreError::malformed("export manifest", e))?;
        let manifest_path = work.path().join(MANIFEST_FILE);
        fs::write(&manifest_path, json.as_bytes())
            .map_err(|e| StoreError::io(format!("write {}", manifest_path.display()), e))?;

        let mut written = 0usize;
        for (id, src) in &contents.assets {
            let dst = work.path().join(format!("{id}.{ASSET_EXT}"));
            fs::copy(src, &dst)
                .map_err(|e| StoreError::io(format!("copy {} -> {}", src.display(), dst.display()), e))?;
            written += 1;
        }

        let format = PackageFormat::for_output(out);
        match format {
            PackageFormat::Zip => write_zip(work.path(), out, self.zip_level)?,
            _ => write_dir(work.path(), out)?,
        };

        record_export(contents.missing.len());
        let summary = ExportSummary {
            path: out.to_path_buf(),
            format,
            categories: contents.manifest.categories.len(),
            items: contents.manifest.item_count(),
            assets_written: written,
            assets_missing: contents.missing.len(),
        };
        info!(
            "export: {} -> {} (categories={}, items={}, assets={}, missing={})",
            format,
            out.display(),
            summary.categories,
            summary.items,
            summary.assets_written,
            summary.assets_missing
        );
        Ok(summary)
    }
}
