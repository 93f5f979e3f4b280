//! snapshot: хранилище канонического снапшота библиотеки (gif_data.json).
//!
//! Поверхность изменения: load/save. Глобального снапшота нет: вызывающий держит
//! SnapshotStore и сам сериализует запись (или берёт LOCK через Library).
//!
//! load():
//! - файла нет или он не парсится → пустой снапшот (совместимое поведение);
//! - для битого файла пишем warn! с именем последнего бэкапа.
//! load_checked():
//! - различает Absent (первый запуск) и битый файл (StoreError::MalformedJson).
//!
//! save(): pretty JSON, tmp + rename поверх старого файла; сбой → false + warn!.

use anyhow::Result;
use log::{debug, info, warn};
use std::fs;
use std::path::{Path, PathBuf};

use crate::error::{StoreError, StoreResult};
use crate::metrics::{record_snapshot_load_degraded, record_snapshot_save};
use crate::model::Snapshot;
use crate::util::write_atomic;

pub mod backup;

pub use backup::BackupInfo;

/// Результат проверенной загрузки.
#[derive(Debug, Clone, PartialEq)]
pub enum LoadOutcome {
    Loaded(Snapshot),
    /// Файла снапшота ещё нет.
    Absent,
}

impl LoadOutcome {
    /// Absent → пустой снапшот.
    pub fn into_snapshot(self) -> Snapshot {
        match self {
            LoadOutcome::Loaded(s) => s,
            LoadOutcome::Absent => Snapshot::empty(),
        }
    }
}

#[derive(Debug, Clone)]
pub struct SnapshotStore {
    path: PathBuf,
    backups_dir: PathBuf,
}

impl SnapshotStore {
    pub fn new(path: &Path, backups_dir: &Path) -> Self {
        Self {
            path: path.to_path_buf(),
            backups_dir: backups_dir.to_path_buf(),
        }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    pub fn backups_dir(&self) -> &Path {
        &self.backups_dir
    }

    pub fn exists(&self) -> bool {
        self.path.is_file()
    }

    /// Загрузить снапшот; отсутствие или порча файла деградируют к пустому снапшоту.
    pub fn load(&self) -> Snapshot {
        match self.load_checked() {
            Ok(outcome) => outcome.into_snapshot(),
            Err(e) => {
                record_snapshot_load_degraded();
                let hint = match self.latest_backup() {
                    Ok(Some(b)) => format!("latest backup: {}", b.path.display()),
                    _ => "no backups found".to_string(),
                };
                warn!(
                    "snapshot: {} is unreadable ({}), continuing with an empty library; {}",
                    self.path.display(),
                    e,
                    hint
                );
                Snapshot::empty()
            }
        }
    }

    /// Загрузить снапшот, отличая "файла нет" от "файл битый".
    pub fn load_checked(&self) -> StoreResult<LoadOutcome> {
        let bytes = match fs::read(&self.path) {
            Ok(b) => b,
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => {
                debug!("snapshot: {} absent", self.path.display());
                return Ok(LoadOutcome::Absent);
            }
            Err(e) => {
                return Err(StoreError::io(
                    format!("read {}", self.path.display()),
                    e,
                ))
            }
        };
        let snap: Snapshot = serde_json::from_slice(&bytes)
            .map_err(|e| StoreError::malformed(self.path.display().to_string(), e))?;
        Ok(LoadOutcome::Loaded(snap))
    }

    /// Сохранить снапшот (pretty JSON). Сбой не пробрасывается.
    pub fn save(&self, snapshot: &Snapshot) -> bool {
        match self.try_save(snapshot) {
            Ok(()) => true,
            Err(e) => {
                warn!("snapshot: save {} failed: {:#}", self.path.display(), e);
                false
            }
        }
    }

    /// То же, что save(), но с ошибкой для вызывающих, которым нужна причина.
    pub fn try_save(&self, snapshot: &Snapshot) -> Result<()> {
        let res = (|| -> Result<()> {
            let json = snapshot.to_pretty_json()?;
            write_atomic(&self.path, json.as_bytes())?;
            Ok(())
        })();
        record_snapshot_save(res.is_ok());
        if res.is_ok() {
            info!(
                "snapshot: saved {} (categories={}, items={}, gifs={})",
                self.path.display(),
                snapshot.categories.len(),
                snapshot.item_count(),
                snapshot.gifs.len()
            );
        }
        res
    }
}
