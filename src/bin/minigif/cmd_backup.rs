use anyhow::{anyhow, Result};
use std::path::PathBuf;

use crate::util::{open_ro, open_rw};

pub fn exec_backup(data_dir: Option<PathBuf>) -> Result<()> {
    let lib = open_rw(data_dir)?;
    let path = lib.snapshots().create_backup()?;
    println!("BACKUP {}", path.display());
    Ok(())
}

pub fn exec_list(data_dir: Option<PathBuf>) -> Result<()> {
    let lib = open_ro(data_dir)?;
    let backups = lib.snapshots().list_backups()?;
    if backups.is_empty() {
        println!("(no backups in {})", lib.snapshots().backups_dir().display());
        return Ok(());
    }
    for b in backups {
        println!("{:>10} B  {}", b.bytes, b.name);
    }
    Ok(())
}

pub fn exec_restore(data_dir: Option<PathBuf>) -> Result<()> {
    let lib = open_rw(data_dir)?;
    match lib.snapshots().restore_latest_backup()? {
        Some(from) => {
            println!("RESTORED {} from {}", lib.snapshots().path().display(), from.display());
            Ok(())
        }
        None => Err(anyhow!(
            "no backups in {}",
            lib.snapshots().backups_dir().display()
        )),
    }
}
