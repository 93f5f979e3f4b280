//! snapshot/backup: резервные копии gif_data.json.
//!
//! Имя: backups/data-YYYYMMDDTHHMMSS.mmmZ.json (UTC). Если имя уже занято, добавляется
//! суффикс -N, так что два бэкапа никогда не перетирают друг друга.
//! Ротации нет: старые бэкапы не удаляются.
//!
//! Порядок list_backups(): по (метка, N), т.е. от старых к новым.

use anyhow::{anyhow, Context, Result};
use chrono::Utc;
use log::{info, warn};
use std::fs;
use std::path::PathBuf;

use super::SnapshotStore;
use crate::consts::{BACKUP_EXT, BACKUP_PREFIX, CORRUPT_PREFIX};
use crate::error::{StoreError, StoreResult};
use crate::metrics::record_backup;
use crate::model::Snapshot;
use crate::util::{backup_stamp, write_atomic};

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct BackupInfo {
    pub name: String,
    pub path: PathBuf,
    pub bytes: u64,
}

/// (метка, N) из имени бэкапа; None для чужих файлов.
fn parse_backup_name(name: &str) -> Option<(String, u32)> {
    let rest = name.strip_prefix(BACKUP_PREFIX)?;
    let rest = rest.strip_suffix(&format!(".{BACKUP_EXT}"))?;
    match rest.split_once('-') {
        Some((stamp, n)) => Some((stamp.to_string(), n.parse().ok()?)),
        None => Some((rest.to_string(), 0)),
    }
}

impl SnapshotStore {
    /// Снять бэкап текущего снапшота. Сбой → false + warn!, сохранение не блокируется.
    pub fn backup(&self) -> bool {
        match self.create_backup() {
            Ok(_) => true,
            Err(e) => {
                warn!("snapshot: backup of {} failed: {:#}", self.path.display(), e);
                false
            }
        }
    }

    /// Снять бэкап и вернуть путь созданного файла.
    ///
    /// Нет gif_data.json → бэкап пустого снапшота. Битый gif_data.json → Err, data-* не создаётся.
    pub fn create_backup(&self) -> Result<PathBuf> {
        let res = (|| -> Result<PathBuf> {
            let snap = self
                .load_checked()
                .map_err(anyhow::Error::new)
                .with_context(|| {
                    format!(
                        "refusing to back up unreadable {}; use restore-backup",
                        self.path.display()
                    )
                })?
                .into_snapshot();
            let json = snap.to_pretty_json()?;
            let path = self.next_backup_path(BACKUP_PREFIX)?;
            write_atomic(&path, json.as_bytes())?;
            Ok(path)
        })();
        record_backup(res.is_ok());
        if let Ok(p) = &res {
            info!("snapshot: backup written to {}", p.display());
        }
        res
    }

    /// Бэкапы, отсортированные от старых к новым (файлы corrupt-* не входят).
    pub fn list_backups(&self) -> Result<Vec<BackupInfo>> {
        let mut out: Vec<((String, u32), BackupInfo)> = Vec::new();
        if !self.backups_dir.exists() {
            return Ok(Vec::new());
        }
        for e in fs::read_dir(&self.backups_dir)
            .with_context(|| format!("read_dir {}", self.backups_dir.display()))?
        {
            let e = e?;
            let path = e.path();
            if !path.is_file() {
                continue;
            }
            let name = match path.file_name().and_then(|s| s.to_str()) {
                Some(s) => s.to_string(),
                None => continue,
            };
            let key = match parse_backup_name(&name) {
                Some(k) => k,
                None => continue,
            };
            let bytes = e.metadata().map(|m| m.len()).unwrap_or(0);
            out.push((key, BackupInfo { name, path, bytes }));
        }
        out.sort_by(|a, b| a.0.cmp(&b.0));
        Ok(out.into_iter().map(|(_, b)| b).collect())
    }

    pub fn latest_backup(&self) -> Result<Option<BackupInfo>> {
        Ok(self.list_backups()?.pop())
    }

    /// Восстановить gif_data.json из самого свежего бэкапа.
    ///
    /// Текущий файл, если он битый, предварительно сохраняется как backups/corrupt-<метка>.json;
    /// исправный текущий файл сохраняется обычным бэкапом. Ok(None): бэкапов нет.
    pub fn restore_latest_backup(&self) -> StoreResult<Option<PathBuf>> {
        let latest = self
            .latest_backup()
            .map_err(|e| StoreError::archive("list backups", format!("{e:#}")))?;
        let latest = match latest {
            Some(b) => b,
            None => return Ok(None),
        };

        let bytes = fs::read(&latest.path)
            .map_err(|e| StoreError::io(format!("read {}", latest.path.display()), e))?;
        let snap: Snapshot = serde_json::from_slice(&bytes)
            .map_err(|e| StoreError::malformed(latest.name.clone(), e))?;

        if self.exists() {
            match self.load_checked() {
                Ok(_) => {
                    self.create_backup().map_err(|e| {
                        StoreError::archive("backup current snapshot", format!("{e:#}"))
                    })?;
                }
                Err(_) => {
                    self.keep_corrupt().map_err(|e| {
                        StoreError::archive("keep corrupt snapshot", format!("{e:#}"))
                    })?;
                }
            }
        }

        self.try_save(&snap)
            .map_err(|e| StoreError::archive("restore snapshot", format!("{e:#}")))?;
        info!(
            "snapshot: restored {} from {}",
            self.path.display(),
            latest.path.display()
        );
        Ok(Some(latest.path))
    }

    pub(crate) fn keep_corrupt(&self) -> Result<PathBuf> {
        let bytes = fs::read(&self.path).with_context(|| format!("read {}", self.path.display()))?;
        let path = self.next_backup_path(CORRUPT_PREFIX)?;
        write_atomic(&path, &bytes)?;
        warn!(
            "snapshot: corrupt {} kept as {}",
            self.path.display(),
            path.display()
        );
        Ok(path)
    }

    fn next_backup_path(&self, prefix: &str) -> Result<PathBuf> {
        fs::create_dir_all(&self.backups_dir)
            .with_context(|| format!("create {}", self.backups_dir.display()))?;
        let stamp = backup_stamp(Utc::now());
        let first = self
            .backups_dir
            .join(format!("{prefix}{stamp}.{BACKUP_EXT}"));
        if !first.exists() {
            return Ok(first);
        }
        for n in 1..10_000u32 {
            let p = self
                .backups_dir
                .join(format!("{prefix}{stamp}-{n}.{BACKUP_EXT}"));
            if !p.exists() {
                return Ok(p);
            }
        }
        Err(anyhow!(
            "no free backup name for stamp {} in {}",
            stamp,
            self.backups_dir.display()
        ))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn backup_names_parse() {
        assert_eq!(
            parse_backup_name("data-20261018T120000.123Z.json"),
            Some(("20261018T120000.123Z".to_string(), 0))
        );
        assert_eq!(
            parse_backup_name("data-20261018T120000.123Z-2.json"),
            Some(("20261018T120000.123Z".to_string(), 2))
        );
        assert_eq!(parse_backup_name("corrupt-20261018T120000.123Z.json"), None);
        assert_eq!(parse_backup_name("data.json"), None);
    }

    #[test]
    fn suffix_orders_after_plain_name() {
        let a = parse_backup_name("data-20261018T120000.123Z.json").unwrap();
        let b = parse_backup_name("data-20261018T120000.123Z-1.json").unwrap();
        let c = parse_backup_name("data-20261018T120001.000Z.json").unwrap();
        assert!(a < b);
        assert!(b < c);
    }
}
