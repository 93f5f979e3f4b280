#![allow(non_snake_case)]

// Базовые модули
pub mod consts;
pub mod config;
pub mod error;
pub mod lock;
pub mod metrics;

// Утилиты (now_unix_ms, backup_stamp, write_atomic, is_valid_gif_id)
pub mod util; // src/util/mod.rs

// Модель и чистые функции над ней
pub mod model;
pub mod validate;
pub mod merge;

// Хранилища (папки с mod.rs)
pub mod assets;   // src/assets/{mod,fetch}.rs
pub mod snapshot; // src/snapshot/{mod,backup}.rs
pub mod archive;  // src/archive/{mod,package,export,import}.rs

pub mod settings;
pub mod library;

// Удобные реэкспорты
pub use library::{ImportStrategy, ImportSummary, Library};
pub use config::{LibraryBuilder, MiniGifConfig};
pub use error::{ErrorKind, StoreError, StoreResult};
pub use model::{Category, Item, Snapshot};
pub use merge::{merge, merge_with_report, MergeReport};
pub use validate::{is_valid, validate};
pub use assets::{AssetSource, AssetStore, FetchOptions};
pub use snapshot::{BackupInfo, LoadOutcome, SnapshotStore};
pub use archive::{
    filter_selection, import_package, ArchiveExporter, ArchiveImporter, ExportSummary,
    PackageFormat, StagedImport,
};
pub use settings::{PanelBounds, Settings};
