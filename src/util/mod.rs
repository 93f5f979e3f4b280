//! util: общие утилиты (время, атомарная запись файла, проверка gifId).
//!
//! Содержит:
//! - now_unix_ms(): текущее Unix-время в миллисекундах.
//! - backup_stamp(): сортируемая метка времени для имён бэкапов.
//! - write_atomic(): запись через соседний tmp + rename (читатель не видит полузаписанный файл).
//! - is_valid_gif_id(): gifId пригоден как имя файла (без разделителей пути).

use anyhow::{Context, Result};
use chrono::{DateTime, Utc};
use std::fs::{self, OpenOptions};
use std::io::Write;
use std::path::{Path, PathBuf};

/// Текущее Unix-время в миллисекундах.
#[inline]
pub fn now_unix_ms() -> u64 {
    use std::time::{SystemTime, UNIX_EPOCH};
    SystemTime::now()
        .duration_since(UNIX_EPOCH)
        .unwrap_or_default()
        .as_millis() as u64
}

/// Метка вида 20261018T120000.123Z (UTC). Лексикографический порядок == хронологический.
pub fn backup_stamp(at: DateTime<Utc>) -> String {
    at.format("%Y%m%dT%H%M%S%.3fZ").to_string()
}

/// Путь временного соседа: <file>.tmp в том же каталоге (rename не пересекает ФС).
pub fn tmp_sibling(path: &Path) -> PathBuf {
    let mut name = path
        .file_name()
        .map(|s| s.to_os_string())
        .unwrap_or_default();
    name.push(".tmp");
    path.with_file_name(name)
}

/// Записать bytes в path атомарно: tmp-сосед, fsync, rename поверх старого файла.
/// Падение посреди записи оставляет либо старый, либо новый полный файл.
pub fn write_atomic(path: &Path, bytes: &[u8]) -> Result<()> {
    if let Some(parent) = path.parent() {
        if !parent.as_os_str().is_empty() && !parent.exists() {
            fs::create_dir_all(parent)
                .with_context(|| format!("create dir {}", parent.display()))?;
        }
    }
    let tmp = tmp_sibling(path);
    let res = (|| -> Result<()> {
        let mut f = OpenOptions::new()
            .create(true)
            .write(true)
            .truncate(true)
            .open(&tmp)
            .with_context(|| format!("open tmp {}", tmp.display()))?;
        f.write_all(bytes)
            .with_context(|| format!("write tmp {}", tmp.display()))?;
        let _ = f.sync_all();
        fs::rename(&tmp, path)
            .with_context(|| format!("rename {} -> {}", tmp.display(), path.display()))?;
        Ok(())
    })();
    if res.is_err() {
        let _ = fs::remove_file(&tmp);
    }
    res
}

/// gifId используется как имя файла: непустой, без разделителей пути и управляющих символов,
/// не начинается с точки.
pub fn is_valid_gif_id(id: &str) -> bool {
    !id.is_empty()
        && !id.starts_with('.')
        && !id
            .chars()
            .any(|c| c == '/' || c == '\\' || c == ':' || c.is_control())
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone;

    #[test]
    fn now_ms_monotonic_nonzero() {
        let a = now_unix_ms();
        let b = now_unix_ms();
        assert!(a > 0);
        assert!(b >= a);
    }

    #[test]
    fn stamp_is_sortable() {
        let a = Utc.with_ymd_and_hms(2026, 1, 2, 3, 4, 5).unwrap();
        let b = Utc.with_ymd_and_hms(2026, 10, 18, 12, 0, 0).unwrap();
        assert_eq!(backup_stamp(a), "20260102T030405.000Z");
        assert!(backup_stamp(a) < backup_stamp(b));
    }

    #[test]
    fn tmp_sibling_keeps_dir() {
        let p = Path::new("/x/y/g1.gif");
        assert_eq!(tmp_sibling(p), PathBuf::from("/x/y/g1.gif.tmp"));
    }

    #[test]
    fn gif_id_rules() {
        assert!(is_valid_gif_id("gif_1699999999999"));
        assert!(is_valid_gif_id("a-b.c"));
        assert!(!is_valid_gif_id(""));
        assert!(!is_valid_gif_id(".."));
        assert!(!is_valid_gif_id("../etc/passwd"));
        assert!(!is_valid_gif_id("a/b"));
        assert!(!is_valid_gif_id("a\\b"));
        assert!(!is_valid_gif_id("c:x"));
    }

    #[test]
    fn write_atomic_replaces_and_leaves_no_tmp() {
        let dir = std::env::temp_dir().join(format!(
            "mgtest-util-{}-{}",
            std::process::id(),
            now_unix_ms()
        ));
        let p = dir.join("f.bin");
        write_atomic(&p, b"one").unwrap();
        write_atomic(&p, b"two!").unwrap();
        assert_eq!(fs::read(&p).unwrap(), b"two!");
        assert!(!tmp_sibling(&p).exists());
        let _ = fs::remove_dir_all(&dir);
    }
}
