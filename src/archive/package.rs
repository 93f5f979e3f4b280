//! archive/package: физический формат пакета обмена.
//!
//! Пакет = data.json + <gifId>.gif на верхнем уровне. Носители:
//! - .zip (deflate);
//! - каталог;
//! - голый .json (только при импорте: снапшот без ассетов).
//!
//! Zip и каталог собираются в <out>.tmp и переименовываются на место; при распаковке берутся только
//! записи верхнего уровня (data.json и *.gif), вложенные каталоги и прочие файлы игнорируются,
//! записи с выходом за пределы каталога (../, абсолютные пути) отвергаются.

use log::{debug, warn};
use std::fs::{self, File};
use std::io::{self, Write};
use std::path::{Component, Path, PathBuf};
use zip::write::FileOptions;
use zip::{CompressionMethod, ZipArchive, ZipWriter};

use crate::consts::{ASSET_EXT, MANIFEST_FILE, PACKAGE_ZIP_EXT};
use crate::error::{StoreError, StoreResult};
use crate::util::tmp_sibling;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PackageFormat {
    Zip,
    Directory,
    Json,
}

impl PackageFormat {
    /// Формат существующего пакета (для импорта).
    pub fn detect(path: &Path) -> StoreResult<Self> {
        if path.is_dir() {
            return Ok(PackageFormat::Directory);
        }
        if !path.is_file() {
            return Err(StoreError::FileNotFound(path.to_path_buf()));
        }
        if has_ext(path, "json") {
            Ok(PackageFormat::Json)
        } else {
            // .zip и всё остальное пробуем читать как zip
            Ok(PackageFormat::Zip)
        }
    }

    /// Формат для экспорта: *.zip → Zip, иначе каталог.
    pub fn for_output(path: &Path) -> Self {
        if has_ext(path, PACKAGE_ZIP_EXT) {
            PackageFormat::Zip
        } else {
            PackageFormat::Directory
        }
    }
}

impl std::fmt::Display for PackageFormat {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let s = match self {
            PackageFormat::Zip => "zip",
            PackageFormat::Directory => "dir",
            PackageFormat::Json => "json",
        };
        f.write_str(s)
    }
}

fn has_ext(path: &Path, ext: &str) -> bool {
    path.extension()
        .and_then(|e| e.to_str())
        .map(|e| e.eq_ignore_ascii_case(ext))
        .unwrap_or(false)
}

/// Имя верхнего уровня, которое входит в пакет: data.json или *.gif.
pub fn is_package_entry(name: &str) -> bool {
    name == MANIFEST_FILE || has_ext(Path::new(name), ASSET_EXT)
}

/// Файлы верхнего уровня каталога, входящие в пакет (отсортированы по имени).
pub fn package_files(dir: &Path) -> StoreResult<Vec<PathBuf>> {
    let mut out = Vec::new();
    let rd = fs::read_dir(dir).map_err(|e| StoreError::io(format!("read_dir {}", dir.display()), e))?;
    for e in rd {
        let e = e.map_err(|e| StoreError::io(format!("read_dir {}", dir.display()), e))?;
        let p = e.path();
        if !p.is_file() {
            continue;
        }
        match p.file_name().and_then(|s| s.to_str()) {
            Some(name) if is_package_entry(name) => out.push(p),
            _ => {}
        }
    }
    out.sort();
    Ok(out)
}

/// Упаковать файлы верхнего уровня src_dir в zip по пути out (через <out>.tmp + rename).
pub fn write_zip(src_dir: &Path, out: &Path, level: Option<i32>) -> StoreResult<u64> {
    let files = package_files(src_dir)?;
    if let Some(parent) = out.parent() {
        if !parent.as_os_str().is_empty() {
            fs::create_dir_all(parent)
                .map_err(|e| StoreError::io(format!("create {}", parent.display()), e))?;
        }
    }
    let tmp = tmp_sibling(out);
    let res = write_zip_inner(&files, &tmp, level);
    let res = res.and_then(|n| {
        fs::rename(&tmp, out)
            .map_err(|e| StoreError::io(format!("rename {} -> {}", tmp.display(), out.display()), e))?;
        Ok(n)
    });
    if res.is_err() {
        let _ = fs::remove_file(&tmp);
    }
    res
}

fn write_zip_inner(files: &[PathBuf], tmp: &Path, level: Option<i32>) -> StoreResult<u64> {
    let f = File::create(tmp).map_err(|e| StoreError::io(format!("create {}", tmp.display()), e))?;
    let mut zip = ZipWriter::new(f);
    let options = FileOptions::default()
        .compression_method(CompressionMethod::Deflated)
        .compression_level(level);

    let mut entries = 0u64;
    for p in files {
        let name = match p.file_name().and_then(|s| s.to_str()) {
            Some(s) => s.to_string(),
            None => continue,
        };
        let bytes = fs::read(p).map_err(|e| StoreError::io(format!("read {}", p.display()), e))?;
        zip.start_file(name.clone(), options)
            .map_err(|e| StoreError::archive(format!("add {name}"), e))?;
        zip.write_all(&bytes)
            .map_err(|e| StoreError::io(format!("write {name} into {}", tmp.display()), e))?;
        debug!("package: zipped {} ({} B)", name, bytes.len());
        entries += 1;
    }
    let mut f = zip
        .finish()
        .map_err(|e| StoreError::archive(format!("finish {}", tmp.display()), e))?;
    f.flush()
        .map_err(|e| StoreError::io(format!("flush {}", tmp.display()), e))?;
    let _ = f.sync_all();
    Ok(entries)
}

/// Записать каталог-пакет out: сборка в <out>.tmp, затем подмена out целиком.
///
/// Существующий out заменяется, только если в нём лежат одни файлы пакета (прошлый экспорт);
/// чужие файлы или подкаталоги → Archive-ошибка, out не трогается.
pub fn write_dir(src_dir: &Path, out: &Path) -> StoreResult<u64> {
    let files = package_files(src_dir)?;
    if out.exists() {
        ensure_replaceable(out)?;
    }
    if let Some(parent) = out.parent() {
        if !parent.as_os_str().is_empty() {
            fs::create_dir_all(parent)
                .map_err(|e| StoreError::io(format!("create {}", parent.display()), e))?;
        }
    }

    let tmp = tmp_sibling(out);
    remove_stale(&tmp);
    let res = copy_files(&files, &tmp).and_then(|n| {
        swap_dir_into_place(&tmp, out)?;
        Ok(n)
    });
    if res.is_err() {
        remove_stale(&tmp);
    }
    res
}

fn copy_files(files: &[PathBuf], dir: &Path) -> StoreResult<u64> {
    fs::create_dir_all(dir).map_err(|e| StoreError::io(format!("create {}", dir.display()), e))?;
    let mut n = 0u64;
    for p in files {
        let name = match p.file_name() {
            Some(s) => s,
            None => continue,
        };
        let dst = dir.join(name);
        fs::copy(p, &dst)
            .map_err(|e| StoreError::io(format!("copy {} -> {}", p.display(), dst.display()), e))?;
        n += 1;
    }
    Ok(n)
}

/// out можно заменить: это каталог, и в нём только data.json и *.gif.
fn ensure_replaceable(out: &Path) -> StoreResult<()> {
    if !out.is_dir() {
        return Err(StoreError::archive(
            format!("export to {}", out.display()),
            "target exists and is not a directory",
        ));
    }
    let rd = fs::read_dir(out).map_err(|e| StoreError::io(format!("read_dir {}", out.display()), e))?;
    for e in rd {
        let e = e.map_err(|e| StoreError::io(format!("read_dir {}", out.display()), e))?;
        let name = e.file_name();
        let ours = e.path().is_file() && name.to_str().map(is_package_entry).unwrap_or(false);
        if !ours {
            return Err(StoreError::archive(
                format!("export to {}", out.display()),
                format!("target holds a non-package entry '{}'", name.to_string_lossy()),
            ));
        }
    }
    Ok(())
}

/// tmp → out. Старый out отодвигается в <out>.old и удаляется после успешного rename.
fn swap_dir_into_place(tmp: &Path, out: &Path) -> StoreResult<()> {
    if !out.exists() {
        return fs::rename(tmp, out)
            .map_err(|e| StoreError::io(format!("rename {} -> {}", tmp.display(), out.display()), e));
    }
    let mut old_name = out.file_name().map(|s| s.to_os_string()).unwrap_or_default();
    old_name.push(".old");
    let old = out.with_file_name(old_name);
    remove_stale(&old);
    fs::rename(out, &old)
        .map_err(|e| StoreError::io(format!("rename {} -> {}", out.display(), old.display()), e))?;
    if let Err(e) = fs::rename(tmp, out) {
        let _ = fs::rename(&old, out);
        return Err(StoreError::io(
            format!("rename {} -> {}", tmp.display(), out.display()),
            e,
        ));
    }
    if let Err(e) = fs::remove_dir_all(&old) {
        warn!("package: could not remove previous package {}: {}", old.display(), e);
    }
    Ok(())
}

fn remove_stale(path: &Path) {
    if path.is_dir() {
        let _ = fs::remove_dir_all(path);
    } else if path.exists() {
        let _ = fs::remove_file(path);
    }
}

/// Распаковать записи верхнего уровня zip-пакета в dest. Возвращает записанные пути.
pub fn extract_zip(archive_path: &Path, dest: &Path) -> StoreResult<Vec<PathBuf>> {
    let f = File::open(archive_path)
        .map_err(|e| StoreError::io(format!("open {}", archive_path.display()), e))?;
    let mut archive = ZipArchive::new(f)
        .map_err(|e| StoreError::archive(format!("read {}", archive_path.display()), e))?;

    let mut written = Vec::new();
    for i in 0..archive.len() {
        let mut entry = archive
            .by_index(i)
            .map_err(|e| StoreError::archive(format!("entry #{i}"), e))?;
        if entry.is_dir() {
            continue;
        }
        let raw_name = entry.name().to_string();
        let rel = match entry.enclosed_name() {
            Some(p) => p.to_path_buf(),
            None => {
                return Err(StoreError::archive(
                    format!("entry '{raw_name}'"),
                    "path escapes the package",
                ))
            }
        };
        let mut comps = rel.components().filter(|c| !matches!(c, Component::CurDir));
        let name = match (comps.next(), comps.next()) {
            (Some(Component::Normal(n)), None) => n.to_string_lossy().to_string(),
            _ => {
                debug!("package: skip nested entry '{}'", raw_name);
                continue;
            }
        };
        if !is_package_entry(&name) {
            debug!("package: skip foreign entry '{}'", raw_name);
            continue;
        }
        let out = dest.join(&name);
        if out.exists() {
            warn!("package: duplicate entry '{}', later one wins", name);
        }
        let mut file =
            File::create(&out).map_err(|e| StoreError::io(format!("create {}", out.display()), e))?;
        io::copy(&mut entry, &mut file)
            .map_err(|e| StoreError::io(format!("extract {name}"), e))?;
        written.push(out);
    }
    Ok(written)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn formats_by_extension() {
        assert_eq!(PackageFormat::for_output(Path::new("/x/out.zip")), PackageFormat::Zip);
        assert_eq!(PackageFormat::for_output(Path::new("/x/out.ZIP")), PackageFormat::Zip);
        assert_eq!(PackageFormat::for_output(Path::new("/x/out")), PackageFormat::Directory);
    }

    #[test]
    fn package_entries() {
        assert!(is_package_entry("data.json"));
        assert!(is_package_entry("g1.gif"));
        assert!(!is_package_entry("notes.txt"));
        assert!(!is_package_entry("other.json"));
    }

    #[test]
    fn detect_missing_is_file_not_found() {
        let p = std::env::temp_dir().join("mgtest-definitely-missing-package.zip");
        let err = PackageFormat::detect(&p).unwrap_err();
        assert_eq!(err.kind(), crate::error::ErrorKind::FileNotFound);
    }
}
