//! lock: advisory-блокировка библиотеки (fs2) на <data_dir>/LOCK.
//!
//! - Писатель (Library::open): Exclusive на всё время жизни; каталог и LOCK создаются.
//! - Читатель (Library::open_ro): Shared, и только если LOCK уже есть. Read-only открытие
//!   ничего не создаёт на диске; библиотеку без LOCK писатель ещё не открывал.
//!
//! Снимается в Drop.

use anyhow::{anyhow, Context, Result};
use fs2::FileExt;
use std::fs::{self, File, OpenOptions};
use std::io::ErrorKind;
use std::path::{Path, PathBuf};

use crate::consts::LOCK_FILE;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LockMode {
    Shared,
    Exclusive,
}

#[derive(Debug)]
pub struct LibraryLock {
    file: File,
    path: PathBuf,
    mode: LockMode,
}

impl LibraryLock {
    /// Эксклюзивная блокировка писателя. Ждёт, пока другие держатели не отпустят LOCK.
    pub fn writer(data_dir: &Path) -> Result<Self> {
        let (file, path) = open_for_writer(data_dir)?;
        FileExt::lock_exclusive(&file)
            .with_context(|| format!("lock library {} for writing", data_dir.display()))?;
        Ok(Self {
            file,
            path,
            mode: LockMode::Exclusive,
        })
    }

    /// Разделяемая блокировка читателя. Ok(None): LOCK ещё нет, блокировать нечего.
    pub fn reader(data_dir: &Path) -> Result<Option<Self>> {
        let path = data_dir.join(LOCK_FILE);
        let file = match OpenOptions::new().read(true).open(&path) {
            Ok(f) => f,
            Err(e) if e.kind() == ErrorKind::NotFound => return Ok(None),
            Err(e) => return Err(e).with_context(|| format!("open {}", path.display())),
        };
        FileExt::lock_shared(&file)
            .with_context(|| format!("lock library {} for reading", data_dir.display()))?;
        Ok(Some(Self {
            file,
            path,
            mode: LockMode::Shared,
        }))
    }

    /// Без ожидания: Err, если библиотека занята в несовместимом режиме.
    pub fn try_lock(data_dir: &Path, mode: LockMode) -> Result<Self> {
        let (file, path) = open_for_writer(data_dir)?;
        let res = match mode {
            LockMode::Shared => FileExt::try_lock_shared(&file),
            LockMode::Exclusive => FileExt::try_lock_exclusive(&file),
        };
        res.map_err(|_| anyhow!("library {} is in use by another process", data_dir.display()))?;
        Ok(Self { file, path, mode })
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    pub fn mode(&self) -> LockMode {
        self.mode
    }
}

impl Drop for LibraryLock {
    fn drop(&mut self) {
        let _ = FileExt::unlock(&self.file);
    }
}

fn open_for_writer(data_dir: &Path) -> Result<(File, PathBuf)> {
    fs::create_dir_all(data_dir).with_context(|| format!("create {}", data_dir.display()))?;
    let path = data_dir.join(LOCK_FILE);
    let file = OpenOptions::new()
        .create(true)
        .read(true)
        .write(true)
        .open(&path)
        .with_context(|| format!("open {}", path.display()))?;
    Ok((file, path))
}
