//! Centralized configuration and builder for the miniGIF data core.
//!
//! Goals:
//! - Single place to collect tunables instead of scattering env lookups.
//! - MiniGifConfig::from_env() reads MG_* env vars; fluent setters override them.
//! - LibraryBuilder returns a ready Library (see library.rs).
//!
//! Layout under data_dir (defaults):
//! - gif_data.json            : current snapshot
//! - gifs/<gifId>.gif         : assets
//! - backups/data-<stamp>.json: backups
//! - hotkey.json, categories-order.json, gif-panel-bounds.json: sidecars
//! - LOCK                     : single-writer advisory lock

use std::fmt;
use std::path::{Path, PathBuf};
use std::time::Duration;

use crate::consts::{
    ASSETS_DIR, BACKUPS_DIR, DEFAULT_DATA_DIR_NAME, DEFAULT_FETCH_MAX_BYTES,
    DEFAULT_FETCH_TIMEOUT_MS,
};

#[derive(Clone, Debug)]
pub struct MiniGifConfig {
    /// Root of all persisted state.
    /// Env: MG_DATA_DIR (default $HOME/.minigif, or ./.minigif without HOME)
    pub data_dir: PathBuf,

    /// Assets directory; relative paths are resolved against data_dir.
    /// Env: MG_ASSETS_DIR (default "gifs")
    pub assets_dir: PathBuf,

    /// Backups directory; relative paths are resolved against data_dir.
    /// Env: MG_BACKUPS_DIR (default "backups")
    pub backups_dir: PathBuf,

    /// Global timeout for one asset download.
    /// Env: MG_FETCH_TIMEOUT_MS (default 30000)
    pub fetch_timeout_ms: u64,

    /// Upper bound for a downloaded asset body.
    /// Env: MG_FETCH_MAX_BYTES (default 32 MiB)
    pub fetch_max_bytes: u64,

    /// Take a backup of the current snapshot before applying an import.
    /// Env: MG_BACKUP_BEFORE_IMPORT = 0|1 (default 1)
    pub backup_before_import: bool,

    /// Hold an exclusive advisory lock on <data_dir>/LOCK while a Library is open.
    /// Env: MG_LOCK = 0|1 (default 1)
    pub lock: bool,

    /// Deflate level for .zip packages (None = zip crate default).
    /// Env: MG_ZIP_LEVEL = 0..9
    pub zip_level: Option<i32>,
}

impl Default for MiniGifConfig {
    fn default() -> Self {
        Self {
            data_dir: default_data_dir(),
            assets_dir: PathBuf::from(ASSETS_DIR),
            backups_dir: PathBuf::from(BACKUPS_DIR),
            fetch_timeout_ms: DEFAULT_FETCH_TIMEOUT_MS,
            fetch_max_bytes: DEFAULT_FETCH_MAX_BYTES,
            backup_before_import: true,
            lock: true,
            zip_level: None,
        }
    }
}

fn default_data_dir() -> PathBuf {
    match std::env::var_os("HOME").or_else(|| std::env::var_os("USERPROFILE")) {
        Some(home) if !home.is_empty() => PathBuf::from(home).join(DEFAULT_DATA_DIR_NAME),
        _ => PathBuf::from(DEFAULT_DATA_DIR_NAME),
    }
}

fn env_flag(s: &str) -> bool {
    let s = s.trim().to_ascii_lowercase();
    s == "1" || s == "true" || s == "on" || s == "yes"
}

impl MiniGifConfig {
    /// Load configuration from MG_* environment variables.
    pub fn from_env() -> Self {
        let mut cfg = Self::default();

        if let Ok(v) = std::env::var("MG_DATA_DIR") {
            let s = v.trim();
            if !s.is_empty() {
                cfg.data_dir = PathBuf::from(s);
            }
        }

        if let Ok(v) = std::env::var("MG_ASSETS_DIR") {
            let s = v.trim();
            if !s.is_empty() {
                cfg.assets_dir = PathBuf::from(s);
            }
        }

        if let Ok(v) = std::env::var("MG_BACKUPS_DIR") {
            let s = v.trim();
            if !s.is_empty() {
                cfg.backups_dir = PathBuf::from(s);
            }
        }

        if let Ok(v) = std::env::var("MG_FETCH_TIMEOUT_MS") {
            if let Ok(n) = v.trim().parse::<u64>() {
                cfg.fetch_timeout_ms = n;
            }
        }

        if let Ok(v) = std::env::var("MG_FETCH_MAX_BYTES") {
            if let Ok(n) = v.trim().parse::<u64>() {
                cfg.fetch_max_bytes = n;
            }
        }

        if let Ok(v) = std::env::var("MG_BACKUP_BEFORE_IMPORT") {
            cfg.backup_before_import = env_flag(&v);
        }

        if let Ok(v) = std::env::var("MG_LOCK") {
            cfg.lock = env_flag(&v);
        }

        if let Ok(v) = std::env::var("MG_ZIP_LEVEL") {
            if let Ok(n) = v.trim().parse::<i32>() {
                cfg.zip_level = Some(n.clamp(0, 9));
            }
        }

        cfg
    }

    /// Start from defaults, but rooted at `data_dir` (no env lookups).
    pub fn for_dir(data_dir: &Path) -> Self {
        Self {
            data_dir: data_dir.to_path_buf(),
            ..Self::default()
        }
    }

    // ----- fluent setters -----

    pub fn with_data_dir<P: Into<PathBuf>>(mut self, dir: P) -> Self {
        self.data_dir = dir.into();
        self
    }

    pub fn with_assets_dir<P: Into<PathBuf>>(mut self, dir: P) -> Self {
        self.assets_dir = dir.into();
        self
    }

    pub fn with_backups_dir<P: Into<PathBuf>>(mut self, dir: P) -> Self {
        self.backups_dir = dir.into();
        self
    }

    pub fn with_fetch_timeout_ms(mut self, ms: u64) -> Self {
        self.fetch_timeout_ms = ms;
        self
    }

    pub fn with_fetch_max_bytes(mut self, n: u64) -> Self {
        self.fetch_max_bytes = n;
        self
    }

    pub fn with_backup_before_import(mut self, on: bool) -> Self {
        self.backup_before_import = on;
        self
    }

    pub fn with_lock(mut self, on: bool) -> Self {
        self.lock = on;
        self
    }

    pub fn with_zip_level(mut self, level: Option<i32>) -> Self {
        self.zip_level = level.map(|l| l.clamp(0, 9));
        self
    }

    /// Finish the builder and obtain the configuration.
    pub fn build(self) -> Self {
        self
    }

    // ----- resolved paths -----

    pub fn snapshot_path(&self) -> PathBuf {
        self.data_dir.join(crate::consts::SNAPSHOT_FILE)
    }

    pub fn resolved_assets_dir(&self) -> PathBuf {
        resolve_under(&self.data_dir, &self.assets_dir)
    }

    pub fn resolved_backups_dir(&self) -> PathBuf {
        resolve_under(&self.data_dir, &self.backups_dir)
    }

    pub fn fetch_timeout(&self) -> Duration {
        Duration::from_millis(self.fetch_timeout_ms)
    }
}

fn resolve_under(root: &Path, p: &Path) -> PathBuf {
    if p.is_absolute() {
        p.to_path_buf()
    } else {
        root.join(p)
    }
}

impl fmt::Display for MiniGifConfig {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "MiniGifConfig {{ \
             data_dir: {}, \
             assets_dir: {}, \
             backups_dir: {}, \
             fetch_timeout_ms: {}, \
             fetch_max_bytes: {}, \
             backup_before_import: {}, \
             lock: {}, \
             zip_level: {} \
             }}",
            self.data_dir.display(),
            self.resolved_assets_dir().display(),
            self.resolved_backups_dir().display(),
            self.fetch_timeout_ms,
            self.fetch_max_bytes,
            self.backup_before_import,
            self.lock,
            self.zip_level
                .map(|v| v.to_string())
                .unwrap_or_else(|| "default".to_string()),
        )
    }
}

/// Lightweight builder that produces a Library.
/// `Library::builder()` returns this builder.
#[derive(Clone, Debug)]
pub struct LibraryBuilder {
    cfg: MiniGifConfig,
}

impl Default for LibraryBuilder {
    fn default() -> Self {
        // Start from env to preserve CLI behavior, then allow overrides.
        Self {
            cfg: MiniGifConfig::from_env(),
        }
    }
}

impl LibraryBuilder {
    pub fn new() -> Self {
        Self::default()
    }

    /// Start from a clean default (without reading env).
    pub fn from_default() -> Self {
        Self {
            cfg: MiniGifConfig::default(),
        }
    }

    pub fn data_dir<P: Into<PathBuf>>(mut self, dir: P) -> Self {
        self.cfg.data_dir = dir.into();
        self
    }

    pub fn assets_dir<P: Into<PathBuf>>(mut self, dir: P) -> Self {
        self.cfg.assets_dir = dir.into();
        self
    }

    pub fn backups_dir<P: Into<PathBuf>>(mut self, dir: P) -> Self {
        self.cfg.backups_dir = dir.into();
        self
    }

    pub fn fetch_timeout_ms(mut self, ms: u64) -> Self {
        self.cfg.fetch_timeout_ms = ms;
        self
    }

    pub fn backup_before_import(mut self, on: bool) -> Self {
        self.cfg.backup_before_import = on;
        self
    }

    pub fn lock(mut self, on: bool) -> Self {
        self.cfg.lock = on;
        self
    }

    pub fn config(&self) -> &MiniGifConfig {
        &self.cfg
    }

    /// Open the library with the collected configuration.
    pub fn open(self) -> anyhow::Result<crate::library::Library> {
        crate::library::Library::open(self.cfg)
    }
}
