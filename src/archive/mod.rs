//! archive: пакеты обмена: экспорт выбранных категорий и импорт с merge/replace.

pub mod export;
pub mod import;
pub mod package;

pub use export::{all_selection, filter_selection, ArchiveExporter, ExportSummary, PackageContents};
pub use import::{import_package, parse_manifest, ArchiveImporter, StagedImport};
pub use package::PackageFormat;
