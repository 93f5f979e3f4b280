use anyhow::Result;
use std::path::PathBuf;

use crate::util::open_ro;

pub fn exec(data_dir: Option<PathBuf>, json: bool) -> Result<()> {
    let lib = open_ro(data_dir)?;
    let ids = lib.orphan_assets()?;
    if json {
        println!("{}", serde_json::to_string(&ids)?);
        return Ok(());
    }
    if ids.is_empty() {
        println!("(no orphan GIF files)");
    }
    for id in ids {
        println!("{}", lib.gif_path(&id).display());
    }
    Ok(())
}
