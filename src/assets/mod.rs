//! assets: хранилище GIF-файлов, адресуемых по gifId: <assets_dir>/<gifId>.gif.
//!
//! Контракт границы: операции возвращают bool (успех/неуспех) и логируют причину,
//! ошибки наружу не пробрасываются.
//!
//! Запись (save/write_bytes/copy) идёт через соседний tmp + rename: читатель никогда
//! не видит полузаписанный файл; падение оставляет либо старый, либо новый полный файл.
//! Параллельные записи в один gifId вызывающий сериализует сам (последний rename побеждает).

use anyhow::{anyhow, Context, Result};
use log::{debug, info, warn};
use std::fs;
use std::path::{Path, PathBuf};

use crate::consts::ASSET_EXT;
use crate::metrics::{
    record_asset_copied, record_asset_deleted, record_asset_failure, record_asset_written,
    record_fetch_failure,
};
use crate::util::{is_valid_gif_id, tmp_sibling, write_atomic};

pub mod fetch;

pub use fetch::{fetch_bytes, FetchOptions};

/// Откуда брать байты для save().
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum AssetSource {
    /// http(s) URL.
    Url(String),
    /// Локальный файл.
    File(PathBuf),
}

impl AssetSource {
    /// http:// и https:// → Url; file://<path> и всё остальное → File.
    pub fn parse(s: &str) -> Self {
        let t = s.trim();
        let lower = t.to_ascii_lowercase();
        if lower.starts_with("http://") || lower.starts_with("https://") {
            AssetSource::Url(t.to_string())
        } else if lower.starts_with("file://") {
            AssetSource::File(PathBuf::from(&t["file://".len()..]))
        } else {
            AssetSource::File(PathBuf::from(t))
        }
    }
}

pub struct AssetStore {
    dir: PathBuf,
    fetch: FetchOptions,
}

impl AssetStore {
    /// Открыть (создать каталог при необходимости).
    pub fn open(dir: &Path, fetch: FetchOptions) -> Result<Self> {
        if !dir.exists() {
            fs::create_dir_all(dir).with_context(|| format!("create {}", dir.display()))?;
        }
        Ok(Self {
            dir: dir.to_path_buf(),
            fetch,
        })
    }

    /// Открыть без обращения к диску (read-only библиотека): каталога может не быть.
    pub fn open_ro(dir: &Path, fetch: FetchOptions) -> Self {
        Self {
            dir: dir.to_path_buf(),
            fetch,
        }
    }

    pub fn dir(&self) -> &Path {
        &self.dir
    }

    /// Путь файла ассета. Чистая функция: существование не проверяется.
    pub fn resolve_path(&self, gif_id: &str) -> PathBuf {
        self.dir.join(format!("{gif_id}.{ASSET_EXT}"))
    }

    pub fn exists(&self, gif_id: &str) -> bool {
        is_valid_gif_id(gif_id) && self.resolve_path(gif_id).is_file()
    }

    /// Сохранить ассет из URL или локального файла (перезаписывает существующий).
    pub fn save(&self, gif_id: &str, source: &AssetSource) -> bool {
        let res = match source {
            AssetSource::Url(url) => self.try_save_url(gif_id, url),
            AssetSource::File(path) => self.try_save_file(gif_id, path),
        };
        self.outcome("save", gif_id, res)
    }

    /// Записать готовые байты под gifId (перезаписывает существующий).
    pub fn write_bytes(&self, gif_id: &str, bytes: &[u8]) -> bool {
        let res = self.try_write(gif_id, bytes);
        self.outcome("write", gif_id, res)
    }

    /// Идемпотентное удаление: отсутствие файла: успех.
    pub fn delete(&self, gif_id: &str) -> bool {
        let res = self.try_delete(gif_id);
        self.outcome("delete", gif_id, res)
    }

    /// Клонировать ассет под новым id. Нет источника: неуспех.
    pub fn copy(&self, from_id: &str, to_id: &str) -> bool {
        let res = self.try_copy(from_id, to_id);
        self.outcome("copy", &format!("{from_id}->{to_id}"), res)
    }

    /// Прочитать байты ассета; None, если файла нет.
    pub fn read(&self, gif_id: &str) -> Result<Option<Vec<u8>>> {
        check_id(gif_id)?;
        let path = self.resolve_path(gif_id);
        if !path.is_file() {
            return Ok(None);
        }
        let bytes = fs::read(&path).with_context(|| format!("read {}", path.display()))?;
        Ok(Some(bytes))
    }

    /// Все gifId, для которых есть файл (отсортированы).
    pub fn list_ids(&self) -> Result<Vec<String>> {
        let mut out = Vec::new();
        if !self.dir.exists() {
            return Ok(out);
        }
        for e in fs::read_dir(&self.dir).with_context(|| format!("read_dir {}", self.dir.display()))? {
            let p = e?.path();
            if !p.is_file() {
                continue;
            }
            if p.extension().map(|ext| ext == ASSET_EXT).unwrap_or(false) {
                if let Some(stem) = p.file_stem().and_then(|s| s.to_str()) {
                    out.push(stem.to_string());
                }
            }
        }
        out.sort();
        Ok(out)
    }

    // ----------------- внутренняя логика -----------------

    fn try_save_url(&self, gif_id: &str, url: &str) -> Result<()> {
        check_id(gif_id)?;
        let bytes = match fetch_bytes(url, &self.fetch) {
            Ok(b) => b,
            Err(e) => {
                record_fetch_failure();
                return Err(e.into());
            }
        };
        debug!("assets: fetched {} B for '{}' from {}", bytes.len(), gif_id, url);
        self.try_write(gif_id, &bytes)
    }

    fn try_save_file(&self, gif_id: &str, src: &Path) -> Result<()> {
        check_id(gif_id)?;
        if !src.is_file() {
            return Err(anyhow!("source file {} not found", src.display()));
        }
        let bytes = fs::read(src).with_context(|| format!("read {}", src.display()))?;
        self.try_write(gif_id, &bytes)
    }

    fn try_write(&self, gif_id: &str, bytes: &[u8]) -> Result<()> {
        check_id(gif_id)?;
        let path = self.resolve_path(gif_id);
        write_atomic(&path, bytes)?;
        record_asset_written(bytes.len());
        Ok(())
    }

    fn try_delete(&self, gif_id: &str) -> Result<()> {
        check_id(gif_id)?;
        let path = self.resolve_path(gif_id);
        match fs::remove_file(&path) {
            Ok(()) => {
                record_asset_deleted();
                Ok(())
            }
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => Ok(()),
            Err(e) => Err(e).with_context(|| format!("remove {}", path.display())),
        }
    }

    fn try_copy(&self, from_id: &str, to_id: &str) -> Result<()> {
        check_id(from_id)?;
        check_id(to_id)?;
        let src = self.resolve_path(from_id);
        if !src.is_file() {
            return Err(anyhow!("source asset '{}' not found", from_id));
        }
        let dst = self.resolve_path(to_id);
        let tmp = tmp_sibling(&dst);
        let res = fs::copy(&src, &tmp)
            .with_context(|| format!("copy {} -> {}", src.display(), tmp.display()))
            .and_then(|_| {
                fs::rename(&tmp, &dst)
                    .with_context(|| format!("rename {} -> {}", tmp.display(), dst.display()))
            });
        if res.is_err() {
            let _ = fs::remove_file(&tmp);
        }
        res?;
        record_asset_copied();
        Ok(())
    }

    fn outcome(&self, op: &str, what: &str, res: Result<()>) -> bool {
        match res {
            Ok(()) => {
                info!("assets: {} '{}' ok", op, what);
                true
            }
            Err(e) => {
                record_asset_failure();
                warn!("assets: {} '{}' failed: {:#}", op, what, e);
                false
            }
        }
    }
}

fn check_id(gif_id: &str) -> Result<()> {
    if is_valid_gif_id(gif_id) {
        Ok(())
    } else {
        Err(anyhow!("invalid gifId '{}'", gif_id))
    }
}
