use anyhow::{anyhow, Result};
use std::path::PathBuf;

use miniGIF::AssetSource;

use crate::util::open_rw;

pub fn exec_save(
    data_dir: Option<PathBuf>,
    id: String,
    url: Option<String>,
    file: Option<PathBuf>,
) -> Result<()> {
    let source = match (url, file) {
        (Some(u), None) => AssetSource::parse(&u),
        (None, Some(f)) => AssetSource::File(f),
        _ => return Err(anyhow!("exactly one of --url or --file is required")),
    };
    let lib = open_rw(data_dir)?;
    if !lib.save_gif(&id, &source) {
        return Err(anyhow!("could not save GIF '{}' (see log)", id));
    }
    println!("SAVED {} -> {}", id, lib.gif_path(&id).display());
    Ok(())
}

pub fn exec_delete(data_dir: Option<PathBuf>, id: String) -> Result<()> {
    let lib = open_rw(data_dir)?;
    if !lib.delete_gif(&id) {
        return Err(anyhow!("could not delete GIF '{}' (see log)", id));
    }
    println!("DELETED {}", id);
    Ok(())
}

pub fn exec_copy(data_dir: Option<PathBuf>, from: String, to: String) -> Result<()> {
    let lib = open_rw(data_dir)?;
    if !lib.copy_gif(&from, &to) {
        return Err(anyhow!("could not copy GIF '{}' to '{}' (see log)", from, to));
    }
    println!("COPIED {} -> {}", from, to);
    Ok(())
}
