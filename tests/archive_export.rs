use std::collections::BTreeSet;
use std::fs;
use std::path::PathBuf;
use std::sync::atomic::{AtomicU64, Ordering};
use std::time::{SystemTime, UNIX_EPOCH};

use anyhow::Result;
use serde_json::json;

use miniGIF::{Category, Item, Library, MiniGifConfig, PackageFormat, Snapshot};

static NEXT_ID: AtomicU64 = AtomicU64::new(1);

fn unique_root(prefix: &str) -> PathBuf {
    let pid = std::process::id();
    let t = SystemTime::now()
        .duration_since(UNIX_EPOCH)
        .unwrap_or_default()
        .as_nanos();
    let id = NEXT_ID.fetch_add(1, Ordering::Relaxed);
    let base = std::env::temp_dir();
    base.join(format!("mgtest-export-{prefix}-{pid}-{t}-{id}"))
}

/// c1: g1 (есть файл), g2 (файла нет); c2: g3 (есть файл).
fn seed(lib: &Library) -> Result<Snapshot> {
    let mut s = Snapshot::empty();
    s.categories.push(Category::new("c1", "Reactions", "1", "#f80"));
    s.categories.push(Category::new("c2", "Cats", "2", "#0a0"));
    s.items_data
        .insert("c1".into(), vec![Item::new("lol", "g1"), Item::new("wat", "g2")]);
    s.items_data.insert("c2".into(), vec![Item::new("meow", "g3")]);
    s.gifs.insert("g1".into(), json!({"w": 200}));
    s.gifs.insert("g3".into(), json!({"w": 300}));
    assert!(lib.save(&s));
    assert!(lib.assets().write_bytes("g1", b"GIF89a-g1"));
    assert!(lib.assets().write_bytes("g3", b"GIF89a-g3"));
    Ok(s)
}

fn zip_names(path: &PathBuf) -> Result<BTreeSet<String>> {
    let f = fs::File::open(path)?;
    let mut z = zip::ZipArchive::new(f)?;
    let mut out = BTreeSet::new();
    for i in 0..z.len() {
        out.insert(z.by_index(i)?.name().to_string());
    }
    Ok(out)
}

fn zip_manifest(path: &PathBuf) -> Result<Snapshot> {
    let f = fs::File::open(path)?;
    let mut z = zip::ZipArchive::new(f)?;
    let entry = z.by_name("data.json")?;
    Ok(serde_json::from_reader(entry)?)
}

#[test]
fn export_selected_category_to_zip() -> Result<()> {
    let root = unique_root("selected");
    let lib = Library::open(MiniGifConfig::for_dir(&root.join("lib")))?;
    seed(&lib)?;

    let out = root.join("out").join("reactions.zip");
    let summary = lib.export_selection(&out, &["c1"])?;
    assert_eq!(summary.format, PackageFormat::Zip);
    assert_eq!(summary.categories, 1);
    assert_eq!(summary.items, 2);
    assert_eq!(summary.assets_written, 1);
    assert_eq!(summary.assets_missing, 1);
    assert!(summary.notification().contains("1 categories"));

    // ровно data.json + файлы существующих ассетов c1
    let names = zip_names(&out)?;
    let expected: BTreeSet<String> = ["data.json", "g1.gif"].iter().map(|s| s.to_string()).collect();
    assert_eq!(names, expected);

    let manifest = zip_manifest(&out)?;
    assert_eq!(manifest.category_ids(), vec!["c1".to_string()]);
    assert_eq!(manifest.items("c1").len(), 2);
    assert!(manifest.items("c2").is_empty());
    // реестр gifs сужен до ссылок c1
    assert_eq!(manifest.gifs.keys().cloned().collect::<Vec<_>>(), vec!["g1".to_string()]);

    // tmp рядом с пакетом не остаётся
    assert!(!root.join("out").join("reactions.zip.tmp").exists());
    drop(lib);
    let _ = fs::remove_dir_all(&root);
    Ok(())
}

#[test]
fn export_all_to_directory() -> Result<()> {
    let root = unique_root("all-dir");
    let lib = Library::open(MiniGifConfig::for_dir(&root.join("lib")))?;
    let s = seed(&lib)?;

    let out = root.join("pkg");
    let summary = lib.export_all(&out)?;
    assert_eq!(summary.format, PackageFormat::Directory);
    assert_eq!(summary.categories, 2);
    assert_eq!(summary.items, 3);

    let mut names: Vec<String> = fs::read_dir(&out)?
        .map(|e| e.unwrap().file_name().to_string_lossy().to_string())
        .collect();
    names.sort();
    assert_eq!(names, vec!["data.json", "g1.gif", "g3.gif"]);
    assert_eq!(fs::read(out.join("g3.gif"))?, b"GIF89a-g3");

    let manifest: Snapshot = serde_json::from_slice(&fs::read(out.join("data.json"))?)?;
    assert_eq!(manifest, s);
    drop(lib);
    let _ = fs::remove_dir_all(&root);
    Ok(())
}

#[test]
fn export_does_not_touch_library() -> Result<()> {
    let root = unique_root("untouched");
    let lib = Library::open(MiniGifConfig::for_dir(&root.join("lib")))?;
    seed(&lib)?;
    let before = fs::read(lib.snapshots().path())?;
    lib.export_selection(&root.join("x.zip"), &["c2"])?;
    assert_eq!(fs::read(lib.snapshots().path())?, before);
    assert_eq!(lib.all_gifs()?, vec!["g1".to_string(), "g3".to_string()]);
    drop(lib);
    let _ = fs::remove_dir_all(&root);
    Ok(())
}

fn dir_names(dir: &PathBuf) -> Result<Vec<String>> {
    let mut names = Vec::new();
    for e in fs::read_dir(dir)? {
        names.push(e?.file_name().to_string_lossy().to_string());
    }
    names.sort();
    Ok(names)
}

#[test]
fn second_export_to_same_directory_replaces_package() -> Result<()> {
    let root = unique_root("re-export");
    let lib = Library::open(MiniGifConfig::for_dir(&root.join("lib")))?;
    seed(&lib)?;

    let out = root.join("pkg");
    lib.export_all(&out)?;
    assert_eq!(dir_names(&out)?, vec!["data.json", "g1.gif", "g3.gif"]);

    // второй экспорт в тот же каталог: от первого ничего не остаётся
    lib.export_selection(&out, &["c1"])?;
    assert_eq!(dir_names(&out)?, vec!["data.json", "g1.gif"]);
    let manifest: Snapshot = serde_json::from_slice(&fs::read(out.join("data.json"))?)?;
    assert_eq!(manifest.category_ids(), vec!["c1".to_string()]);
    assert!(!root.join("pkg.tmp").exists());
    assert!(!root.join("pkg.old").exists());
    drop(lib);
    let _ = fs::remove_dir_all(&root);
    Ok(())
}

#[test]
fn export_refuses_directory_with_foreign_files() -> Result<()> {
    let root = unique_root("foreign");
    let lib = Library::open(MiniGifConfig::for_dir(&root.join("lib")))?;
    seed(&lib)?;

    let out = root.join("docs");
    fs::create_dir_all(&out)?;
    fs::write(out.join("notes.txt"), b"keep me")?;

    let err = lib.export_selection(&out, &["c1"]).unwrap_err();
    let store_err = err.downcast_ref::<miniGIF::StoreError>().expect("StoreError in chain");
    assert_eq!(store_err.kind(), miniGIF::ErrorKind::IoFailure);
    assert_eq!(dir_names(&out)?, vec!["notes.txt"]);
    assert!(!root.join("docs.tmp").exists());
    drop(lib);
    let _ = fs::remove_dir_all(&root);
    Ok(())
}
