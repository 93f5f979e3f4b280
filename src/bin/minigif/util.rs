use anyhow::Result;
use std::path::PathBuf;

use miniGIF::{Library, MiniGifConfig};

/// Конфиг из MG_* env, --data-dir перекрывает MG_DATA_DIR.
pub fn config(data_dir: Option<PathBuf>) -> MiniGifConfig {
    let cfg = MiniGifConfig::from_env();
    match data_dir {
        Some(d) => cfg.with_data_dir(d),
        None => cfg,
    }
}

pub fn open_rw(data_dir: Option<PathBuf>) -> Result<Library> {
    Library::open(config(data_dir))
}

pub fn open_ro(data_dir: Option<PathBuf>) -> Result<Library> {
    Library::open_ro(config(data_dir))
}
