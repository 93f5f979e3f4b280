use anyhow::Result;
use std::path::PathBuf;

use miniGIF::ImportStrategy;

use crate::util::open_rw;

pub fn exec(data_dir: Option<PathBuf>, from: PathBuf, strategy: ImportStrategy) -> Result<()> {
    let mut lib = open_rw(data_dir)?;
    let summary = lib.import_from(&from, strategy)?;
    if let Some(b) = &summary.backup {
        println!("backup: {}", b.display());
    }
    println!("{}", summary.notification());
    Ok(())
}
