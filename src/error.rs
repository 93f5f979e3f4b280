//! Ошибки ядра.
//!
//! Компоненты, которые не имеют права "бросать" наружу (AssetStore, SnapshotStore::save/backup),
//! отдают bool и логируют причину. StoreError нужен там, где сбой обязан остановить конвейер:
//! импорт пакета и проверенная загрузка снапшота (load_checked).

use std::fmt;
use std::path::PathBuf;

/// Класс ошибки (стабильный, для вызывающего слоя и уведомлений).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ErrorKind {
    FileNotFound,
    MalformedJson,
    InvalidSchema,
    IoFailure,
    NetworkFailure,
    MissingManifest,
}

impl fmt::Display for ErrorKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let s = match self {
            ErrorKind::FileNotFound => "FileNotFound",
            ErrorKind::MalformedJson => "MalformedJson",
            ErrorKind::InvalidSchema => "InvalidSchema",
            ErrorKind::IoFailure => "IoFailure",
            ErrorKind::NetworkFailure => "NetworkFailure",
            ErrorKind::MissingManifest => "MissingManifest",
        };
        f.write_str(s)
    }
}

#[derive(Debug, thiserror::Error)]
pub enum StoreError {
    #[error("file not found: {}", .0.display())]
    FileNotFound(PathBuf),

    #[error("malformed JSON in {what}: {source}")]
    MalformedJson {
        what: String,
        #[source]
        source: serde_json::Error,
    },

    #[error("invalid schema: {0}")]
    InvalidSchema(String),

    #[error("{context}: {source}")]
    Io {
        context: String,
        #[source]
        source: std::io::Error,
    },

    #[error("archive {context}: {reason}")]
    Archive { context: String, reason: String },

    #[error("fetch {url}: {reason}")]
    Network { url: String, reason: String },

    #[error("package has no {}", crate::consts::MANIFEST_FILE)]
    MissingManifest,
}

impl StoreError {
    pub fn kind(&self) -> ErrorKind {
        match self {
            StoreError::FileNotFound(_) => ErrorKind::FileNotFound,
            StoreError::MalformedJson { .. } => ErrorKind::MalformedJson,
            StoreError::InvalidSchema(_) => ErrorKind::InvalidSchema,
            StoreError::Io { .. } | StoreError::Archive { .. } => ErrorKind::IoFailure,
            StoreError::Network { .. } => ErrorKind::NetworkFailure,
            StoreError::MissingManifest => ErrorKind::MissingManifest,
        }
    }

    pub(crate) fn io(context: impl Into<String>, source: std::io::Error) -> Self {
        StoreError::Io {
            context: context.into(),
            source,
        }
    }

    pub(crate) fn malformed(what: impl Into<String>, source: serde_json::Error) -> Self {
        StoreError::MalformedJson {
            what: what.into(),
            source,
        }
    }

    pub(crate) fn archive(context: impl Into<String>, reason: impl fmt::Display) -> Self {
        StoreError::Archive {
            context: context.into(),
            reason: reason.to_string(),
        }
    }
}

pub type StoreResult<T> = Result<T, StoreError>;
