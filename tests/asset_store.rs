use std::fs;
use std::path::PathBuf;
use std::sync::atomic::{AtomicU64, Ordering};
use std::time::{SystemTime, UNIX_EPOCH};

use anyhow::Result;

use miniGIF::assets::{AssetSource, AssetStore, FetchOptions};

static NEXT_ID: AtomicU64 = AtomicU64::new(1);

fn unique_root(prefix: &str) -> PathBuf {
    let pid = std::process::id();
    let t = SystemTime::now()
        .duration_since(UNIX_EPOCH)
        .unwrap_or_default()
        .as_nanos();
    let id = NEXT_ID.fetch_add(1, Ordering::Relaxed);
    let base = std::env::temp_dir();
    base.join(format!("mgtest-assets-{prefix}-{pid}-{t}-{id}"))
}

#[test]
fn resolve_path_is_pure() -> Result<()> {
    let root = unique_root("resolve");
    let store = AssetStore::open(&root, FetchOptions::default())?;
    let p = store.resolve_path("gif_123");
    assert_eq!(p, root.join("gif_123.gif"));
    // существование не проверяется и файл не создаётся
    assert!(!p.exists());
    assert_eq!(store.resolve_path("gif_123"), p);
    let _ = fs::remove_dir_all(&root);
    Ok(())
}

#[test]
fn save_from_file_then_overwrite() -> Result<()> {
    let root = unique_root("save-file");
    let store = AssetStore::open(&root.join("gifs"), FetchOptions::default())?;
    let src = root.join("src.gif");
    fs::write(&src, b"GIF89a-one")?;

    assert!(store.save("g1", &AssetSource::File(src.clone())));
    assert_eq!(fs::read(store.resolve_path("g1"))?, b"GIF89a-one");

    fs::write(&src, b"GIF89a-two")?;
    assert!(store.save("g1", &AssetSource::parse(src.to_str().unwrap())));
    assert_eq!(store.read("g1")?, Some(b"GIF89a-two".to_vec()));

    // tmp-сосед не остаётся
    let names: Vec<String> = fs::read_dir(store.dir())?
        .map(|e| e.unwrap().file_name().to_string_lossy().to_string())
        .collect();
    assert_eq!(names, vec!["g1.gif".to_string()]);
    let _ = fs::remove_dir_all(&root);
    Ok(())
}

#[test]
fn save_from_missing_file_fails() -> Result<()> {
    let root = unique_root("save-missing");
    let store = AssetStore::open(&root, FetchOptions::default())?;
    assert!(!store.save("g1", &AssetSource::File(root.join("nope.gif"))));
    assert!(!store.exists("g1"));
    let _ = fs::remove_dir_all(&root);
    Ok(())
}

#[test]
fn delete_is_idempotent() -> Result<()> {
    let root = unique_root("delete");
    let store = AssetStore::open(&root, FetchOptions::default())?;
    // нет файла: успех
    assert!(store.delete("never-existed"));

    assert!(store.write_bytes("g1", b"x"));
    assert!(store.exists("g1"));
    assert!(store.delete("g1"));
    assert!(!store.exists("g1"));
    assert!(store.delete("g1"));
    let _ = fs::remove_dir_all(&root);
    Ok(())
}

#[test]
fn copy_requires_source() -> Result<()> {
    let root = unique_root("copy");
    let store = AssetStore::open(&root, FetchOptions::default())?;
    assert!(!store.copy("missing", "g2"));
    assert!(!store.exists("g2"));

    assert!(store.write_bytes("g1", b"payload"));
    assert!(store.copy("g1", "g2"));
    assert_eq!(store.read("g2")?, Some(b"payload".to_vec()));
    assert_eq!(store.list_ids()?, vec!["g1".to_string(), "g2".to_string()]);
    let _ = fs::remove_dir_all(&root);
    Ok(())
}

#[test]
fn invalid_ids_are_refused() -> Result<()> {
    let root = unique_root("invalid");
    let store = AssetStore::open(&root.join("gifs"), FetchOptions::default())?;
    assert!(!store.write_bytes("../escape", b"x"));
    assert!(!store.write_bytes("", b"x"));
    assert!(!root.join("escape.gif").exists());
    assert!(!store.delete("a/b"));
    assert!(store.read("a/b").is_err());
    let _ = fs::remove_dir_all(&root);
    Ok(())
}

#[test]
fn source_parsing() {
    assert_eq!(
        AssetSource::parse("https://media.example.org/x.gif"),
        AssetSource::Url("https://media.example.org/x.gif".to_string())
    );
    assert_eq!(
        AssetSource::parse("file:///tmp/a.gif"),
        AssetSource::File(PathBuf::from("/tmp/a.gif"))
    );
    assert_eq!(
        AssetSource::parse("/tmp/b.gif"),
        AssetSource::File(PathBuf::from("/tmp/b.gif"))
    );
}
