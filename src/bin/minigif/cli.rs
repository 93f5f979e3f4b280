use clap::{Parser, Subcommand};
use std::path::PathBuf;

use miniGIF::ImportStrategy;

/// CLI для данных miniGIF: снапшот, бэкапы, ассеты, пакеты обмена.
#[derive(Parser, Debug)]
#[command(name = "minigif", version, about = "miniGIF library data CLI")]
pub struct Cli {
    /// Каталог данных (по умолчанию MG_DATA_DIR или ~/.minigif)
    #[arg(long, global = true)]
    pub data_dir: Option<PathBuf>,

    #[command(subcommand)]
    pub cmd: Cmd,
}

#[derive(Subcommand, Debug)]
pub enum Cmd {
    /// Library summary, backups and process metrics
    Status {
        #[arg(long, default_value_t = false)]
        json: bool,
    },
    /// Print categories (in saved display order) with their items
    Show {
        /// Print the raw snapshot as pretty JSON
        #[arg(long, default_value_t = false)]
        json: bool,
    },
    /// Write a timestamped backup of gif_data.json
    Backup,
    /// List backups, oldest first
    Backups,
    /// Restore gif_data.json from the newest backup (current file is backed up first)
    RestoreBackup,
    /// Validate a snapshot JSON file (exit code 1 if invalid)
    Validate {
        #[arg(long)]
        file: PathBuf,
    },
    /// Export categories into a package (*.zip or a directory)
    ///
    /// Без --category выгружается вся библиотека.
    Export {
        #[arg(long)]
        out: PathBuf,
        /// Category id to export (repeatable)
        #[arg(long)]
        category: Vec<String>,
    },
    /// Import a package (.zip, directory or bare .json)
    Import {
        #[arg(long)]
        from: PathBuf,
        /// merge | replace
        #[arg(long, default_value = "merge")]
        strategy: ImportStrategy,
    },
    /// Store a GIF under an id from a URL or a local file
    GifSave {
        #[arg(long)]
        id: String,
        #[arg(long, conflicts_with = "file")]
        url: Option<String>,
        #[arg(long)]
        file: Option<PathBuf>,
    },
    /// Delete a GIF file (missing file is not an error)
    GifDelete {
        #[arg(long)]
        id: String,
    },
    /// Copy a GIF file under a new id
    GifCopy {
        #[arg(long)]
        from: String,
        #[arg(long)]
        to: String,
    },
    /// Show or set the global hotkey
    Hotkey {
        #[arg(long)]
        set: Option<String>,
    },
    /// Show or set the category display order (comma-separated ids)
    Order {
        #[arg(long, value_delimiter = ',')]
        set: Option<Vec<String>>,
    },
    /// List GIF files that no item references (nothing is deleted)
    Orphans {
        #[arg(long, default_value_t = false)]
        json: bool,
    },
}
