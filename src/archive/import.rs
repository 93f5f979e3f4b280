//! archive/import: приём пакета: распаковка, разбор data.json, валидация, ассеты.
//!
//! Импорт двухфазный:
//! 1) ArchiveImporter::stage(path): распаковка во временный каталог, разбор и валидация.
//!    Библиотека (gif_data.json и каталог ассетов) не трогается. Любая ошибка здесь оставляет
//!    всё как было; временный каталог удаляется.
//! 2) StagedImport::commit(library, strategy): ассеты перезаписываются безусловно,
//!    снапшот заменяется или сливается и сохраняется.
//!
//! Drop у StagedImport без commit: это "отмена": временный каталог удаляется.
//!
//! Асимметрия: файлы ассетов всегда обновляются, а метаданные при merge дедуплицируются
//! (элемент с тем же gifId в категории остаётся прежним, но файл под этим gifId уже новый).

use anyhow::Result;
use log::{debug, info, warn};
use std::fs;
use std::path::{Path, PathBuf};
use tempfile::TempDir;

use super::package::{extract_zip, package_files, PackageFormat};
use crate::assets::AssetStore;
use crate::consts::{ASSET_EXT, IMPORT_TMP_PREFIX, MANIFEST_FILE};
use crate::error::{StoreError, StoreResult};
use crate::library::{ImportStrategy, ImportSummary, Library};
use crate::metrics::record_import;
use crate::model::Snapshot;
use crate::util::is_valid_gif_id;
use crate::validate::validate_into_snapshot;

/// Разобрать и проверить манифест пакета.
///
/// None → MissingManifest; не JSON → MalformedJson; не проходит валидатор → InvalidSchema.
pub fn parse_manifest(manifest: Option<&[u8]>) -> StoreResult<Snapshot> {
    let bytes = manifest.ok_or(StoreError::MissingManifest)?;
    let value: serde_json::Value =
        serde_json::from_slice(bytes).map_err(|e| StoreError::malformed(MANIFEST_FILE, e))?;
    validate_into_snapshot(value)
}

/// gifId из имени файла ассета (<gifId>.gif); None для чужих и непригодных имён.
pub fn asset_id_of(path: &Path) -> Option<String> {
    let ext_ok = path
        .extension()
        .and_then(|e| e.to_str())
        .map(|e| e.eq_ignore_ascii_case(ASSET_EXT))
        .unwrap_or(false);
    if !ext_ok {
        return None;
    }
    let stem = path.file_stem()?.to_str()?;
    if is_valid_gif_id(stem) {
        Some(stem.to_string())
    } else {
        None
    }
}

/// Принять пакет: проверить манифест, затем записать все ассеты с перезаписью.
///
/// Порядок: валидация → чтение всех файлов пакета → запись. Ошибка чтения не трогает
/// каталог ассетов; сбой записи откатывает уже записанные ассеты к прежнему содержимому
/// и возвращает IoFailure. Ok → (снапшот, число записанных ассетов).
pub fn import_package(
    manifest: Option<&[u8]>,
    asset_files: &[PathBuf],
    assets: &AssetStore,
) -> StoreResult<(Snapshot, usize)> {
    let snapshot = parse_manifest(manifest)?;

    let mut staged: Vec<(String, Vec<u8>)> = Vec::with_capacity(asset_files.len());
    for p in asset_files {
        let id = match asset_id_of(p) {
            Some(id) => id,
            None => {
                warn!("import: skip asset with unusable name {}", p.display());
                continue;
            }
        };
        let bytes = fs::read(p).map_err(|e| StoreError::io(format!("read {}", p.display()), e))?;
        staged.push((id, bytes));
    }

    // gifId → прежние байты (None: файла не было)
    let mut applied: Vec<(String, Option<Vec<u8>>)> = Vec::with_capacity(staged.len());
    for (id, bytes) in &staged {
        let previous = match assets.read(id) {
            Ok(prev) => prev,
            Err(e) => {
                rollback_assets(assets, applied);
                return Err(StoreError::archive(format!("read current asset '{id}'"), format!("{e:#}")));
            }
        };
        if !assets.write_bytes(id, bytes) {
            rollback_assets(assets, applied);
            return Err(StoreError::io(
                format!("write asset '{id}'"),
                std::io::Error::other("asset store refused the write"),
            ));
        }
        applied.push((id.clone(), previous));
    }
    debug!("import: {} of {} asset files written", applied.len(), asset_files.len());
    Ok((snapshot, applied.len()))
}

fn rollback_assets(assets: &AssetStore, applied: Vec<(String, Option<Vec<u8>>)>) {
    for (id, previous) in applied.into_iter().rev() {
        let ok = match &previous {
            Some(bytes) => assets.write_bytes(&id, bytes),
            None => assets.delete(&id),
        };
        if !ok {
            warn!("import: rollback of asset '{}' failed", id);
        }
    }
}

/// Распакованный и проверенный пакет, ожидающий решения (merge / replace / отмена).
#[derive(Debug)]
pub struct StagedImport {
    work: TempDir,
    source: PathBuf,
    format: PackageFormat,
    manifest: Vec<u8>,
    snapshot: Snapshot,
    asset_files: Vec<PathBuf>,
}

impl StagedImport {
    pub fn source(&self) -> &Path {
        &self.source
    }

    pub fn format(&self) -> PackageFormat {
        self.format
    }

    /// Проверенный входящий снапшот.
    pub fn snapshot(&self) -> &Snapshot {
        &self.snapshot
    }

    pub fn manifest_bytes(&self) -> &[u8] {
        &self.manifest
    }

    pub fn asset_files(&self) -> &[PathBuf] {
        &self.asset_files
    }

    pub fn asset_ids(&self) -> Vec<String> {
        self.asset_files.iter().filter_map(|p| asset_id_of(p)).collect()
    }

    pub fn work_dir(&self) -> &Path {
        self.work.path()
    }

    /// Применить импорт к библиотеке.
    pub fn commit(self, library: &mut Library, strategy: ImportStrategy) -> Result<ImportSummary> {
        library.commit_import(self, strategy)
    }

    /// Отказаться от импорта; временный каталог удаляется.
    pub fn cancel(self) {
        info!("import: cancelled {}", self.source.display());
    }
}

pub struct ArchiveImporter;

impl ArchiveImporter {
    /// Распаковать и проверить пакет (.zip, каталог или голый .json).
    pub fn stage(path: &Path) -> StoreResult<StagedImport> {
        let res = Self::stage_inner(path);
        if let Err(e) = &res {
            record_import(false);
            warn!("import: {} rejected: {} ({})", path.display(), e, e.kind());
        }
        res
    }

    fn stage_inner(path: &Path) -> StoreResult<StagedImport> {
        let format = PackageFormat::detect(path)?;
        let work = tempfile::Builder::new()
            .prefix(IMPORT_TMP_PREFIX)
            .tempdir()
            .map_err(|e| StoreError::io("create import work dir", e))?;

        match format {
            PackageFormat::Zip => {
                extract_zip(path, work.path())?;
            }
            PackageFormat::Directory => {
                for p in package_files(path)? {
                    if let Some(name) = p.file_name() {
                        let dst = work.path().join(name);
                        fs::copy(&p, &dst).map_err(|e| {
                            StoreError::io(format!("copy {} -> {}", p.display(), dst.display()), e)
                        })?;
                    }
                }
            }
            PackageFormat::Json => {
                let dst = work.path().join(MANIFEST_FILE);
                fs::copy(path, &dst).map_err(|e| {
                    StoreError::io(format!("copy {} -> {}", path.display(), dst.display()), e)
                })?;
            }
        }

        let manifest_path = work.path().join(MANIFEST_FILE);
        let manifest = match fs::read(&manifest_path) {
            Ok(b) => Some(b),
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => None,
            Err(e) => return Err(StoreError::io(format!("read {}", manifest_path.display()), e)),
        };
        let snapshot = parse_manifest(manifest.as_deref())?;
        let manifest = manifest.unwrap_or_default();

        let asset_files: Vec<PathBuf> = package_files(work.path())?
            .into_iter()
            .filter(|p| asset_id_of(p).is_some())
            .collect();

        info!(
            "import: staged {} ({}): categories={}, items={}, asset files={}",
            path.display(),
            format,
            snapshot.categories.len(),
            snapshot.item_count(),
            asset_files.len()
        );

        Ok(StagedImport {
            work,
            source: path.to_path_buf(),
            format,
            manifest,
            snapshot,
            asset_files,
        })
    }
}
