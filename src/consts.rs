//! Общие константы форматов (snapshot, assets, backups, package, sidecars).

// -------- Snapshot --------
pub const SNAPSHOT_FILE: &str = "gif_data.json";

// -------- Assets --------
pub const ASSETS_DIR: &str = "gifs";
pub const ASSET_EXT: &str = "gif";

// -------- Backups --------
pub const BACKUPS_DIR: &str = "backups";
// data-20261018T120000.123Z.json (UTC, сортируется лексикографически)
pub const BACKUP_PREFIX: &str = "data-";
pub const BACKUP_EXT: &str = "json";
// Копия повреждённого gif_data.json перед восстановлением из бэкапа.
pub const CORRUPT_PREFIX: &str = "corrupt-";

// -------- Package (export/import) --------
// Манифест пакета; имя отличается от файла снапшота библиотеки (gif_data.json).
pub const MANIFEST_FILE: &str = "data.json";
pub const PACKAGE_ZIP_EXT: &str = "zip";
pub const EXPORT_TMP_PREFIX: &str = "gif_export_";
pub const IMPORT_TMP_PREFIX: &str = "gif_import_";

// -------- Sidecars --------
pub const HOTKEY_FILE: &str = "hotkey.json";
pub const CATEGORIES_ORDER_FILE: &str = "categories-order.json";
pub const PANEL_BOUNDS_FILE: &str = "gif-panel-bounds.json";
pub const DEFAULT_HOTKEY: &str = "CommandOrControl+Shift+G";
pub const DEFAULT_PANEL_WIDTH: u32 = 400;
pub const DEFAULT_PANEL_HEIGHT: u32 = 500;

// -------- Lock --------
pub const LOCK_FILE: &str = "LOCK";

// -------- Fetch --------
pub const DEFAULT_FETCH_TIMEOUT_MS: u64 = 30_000;
pub const DEFAULT_FETCH_MAX_BYTES: u64 = 32 * 1024 * 1024;

// -------- Data dir --------
pub const DEFAULT_DATA_DIR_NAME: &str = ".minigif";
