use std::fs;
use std::path::PathBuf;
use std::sync::atomic::{AtomicU64, Ordering};
use std::time::{SystemTime, UNIX_EPOCH};

use anyhow::Result;
use serde_json::json;

use miniGIF::snapshot::{LoadOutcome, SnapshotStore};
use miniGIF::{Category, ErrorKind, Item, Snapshot};

static NEXT_ID: AtomicU64 = AtomicU64::new(1);

fn unique_root(prefix: &str) -> PathBuf {
    let pid = std::process::id();
    let t = SystemTime::now()
        .duration_since(UNIX_EPOCH)
        .unwrap_or_default()
        .as_nanos();
    let id = NEXT_ID.fetch_add(1, Ordering::Relaxed);
    let base = std::env::temp_dir();
    base.join(format!("mgtest-snapshot-{prefix}-{pid}-{t}-{id}"))
}

fn store_at(root: &PathBuf) -> SnapshotStore {
    SnapshotStore::new(&root.join("data.json"), &root.join("backups"))
}

fn sample() -> Snapshot {
    let mut s = Snapshot::empty();
    s.categories.push(Category::new("c1", "Reactions", "1", "#ff8800"));
    s.categories.push(Category::new("c2", "Cats", "2", "#00aa00"));
    s.items_data.insert(
        "c1".into(),
        vec![Item::new("lol ", "gif_1"), Item::new("facepalm ", "gif_2")],
    );
    s.items_data.insert("c2".into(), vec![Item::new("meow ", "gif_3")]);
    s.gifs.insert("gif_1".into(), json!({"url": "https://example.org/1.gif"}));
    s
}

#[test]
fn save_then_load_roundtrips() -> Result<()> {
    let root = unique_root("roundtrip");
    let store = store_at(&root);
    let s = sample();
    assert!(store.save(&s));
    assert_eq!(store.load(), s);
    assert_eq!(store.load_checked()?, LoadOutcome::Loaded(s.clone()));

    // повторное сохранение перезаписывает целиком
    let mut s2 = s.clone();
    s2.categories.truncate(1);
    s2.items_data.remove("c2");
    assert!(store.save(&s2));
    assert_eq!(store.load(), s2);
    let _ = fs::remove_dir_all(&root);
    Ok(())
}

#[test]
fn absent_and_corrupt_are_distinguished() -> Result<()> {
    let root = unique_root("corrupt");
    fs::create_dir_all(&root)?;
    let store = store_at(&root);

    assert_eq!(store.load_checked()?, LoadOutcome::Absent);

    fs::write(store.path(), b"{\"categories\": [")?;
    let err = store.load_checked().unwrap_err();
    assert_eq!(err.kind(), ErrorKind::MalformedJson);

    // совместимый load() деградирует к пустому снапшоту и не трогает файл
    assert!(store.load().is_empty());
    assert_eq!(fs::read(store.path())?, b"{\"categories\": [");
    let _ = fs::remove_dir_all(&root);
    Ok(())
}

#[test]
fn backups_never_collide_and_are_ordered() -> Result<()> {
    let root = unique_root("backups");
    let store = store_at(&root);
    assert!(store.save(&sample()));

    let mut paths = Vec::new();
    for _ in 0..5 {
        paths.push(store.create_backup()?);
    }
    let mut uniq = paths.clone();
    uniq.sort();
    uniq.dedup();
    assert_eq!(uniq.len(), 5, "backup names collided: {:?}", paths);

    let listed = store.list_backups()?;
    assert_eq!(listed.len(), 5);
    let listed_paths: Vec<PathBuf> = listed.iter().map(|b| b.path.clone()).collect();
    assert_eq!(listed_paths, paths, "list must be oldest -> newest");
    for b in &listed {
        assert!(b.name.starts_with("data-"));
        assert!(b.name.ends_with(".json"));
        let s: Snapshot = serde_json::from_slice(&fs::read(&b.path)?)?;
        assert_eq!(s, sample());
    }
    assert_eq!(store.latest_backup()?.map(|b| b.path), paths.last().cloned());
    let _ = fs::remove_dir_all(&root);
    Ok(())
}

#[test]
fn backup_of_missing_snapshot_is_empty_snapshot() -> Result<()> {
    let root = unique_root("backup-empty");
    let store = store_at(&root);
    assert!(store.backup());
    let b = store.latest_backup()?.expect("one backup");
    let s: Snapshot = serde_json::from_slice(&fs::read(&b.path)?)?;
    assert!(s.is_empty());
    let _ = fs::remove_dir_all(&root);
    Ok(())
}

#[test]
fn restore_latest_backup_keeps_corrupt_copy() -> Result<()> {
    let root = unique_root("restore");
    let store = store_at(&root);

    // нет бэкапов: нечего восстанавливать
    assert_eq!(store.restore_latest_backup()?, None);

    assert!(store.save(&sample()));
    let b = store.create_backup()?;

    fs::write(store.path(), b"garbage")?;
    let restored_from = store.restore_latest_backup()?;
    assert_eq!(restored_from, Some(b));
    assert_eq!(store.load_checked()?, LoadOutcome::Loaded(sample()));

    let corrupt: Vec<_> = fs::read_dir(root.join("backups"))?
        .map(|e| e.unwrap().file_name().to_string_lossy().to_string())
        .filter(|n| n.starts_with("corrupt-"))
        .collect();
    assert_eq!(corrupt.len(), 1);
    assert_eq!(fs::read(root.join("backups").join(&corrupt[0]))?, b"garbage");
    // corrupt-* не считается бэкапом
    assert_eq!(store.list_backups()?.len(), 1);
    let _ = fs::remove_dir_all(&root);
    Ok(())
}

#[test]
fn backup_over_corrupt_file_is_refused() -> Result<()> {
    let root = unique_root("backup-corrupt");
    let store = store_at(&root);
    assert!(store.save(&sample()));
    let good = store.create_backup()?;

    fs::write(store.path(), b"garbage")?;
    assert!(!store.backup());
    assert!(store.create_backup().is_err());
    assert_eq!(store.list_backups()?.len(), 1);
    assert_eq!(store.latest_backup()?.map(|b| b.path), Some(good.clone()));

    // восстановление берёт исправный бэкап, а не пустой
    assert_eq!(store.restore_latest_backup()?, Some(good));
    assert_eq!(store.load(), sample());
    let _ = fs::remove_dir_all(&root);
    Ok(())
}
