use anyhow::Result;
use std::path::PathBuf;

use crate::util::{open_ro, open_rw};

pub fn exec_hotkey(data_dir: Option<PathBuf>, set: Option<String>) -> Result<()> {
    match set {
        Some(hk) => {
            let lib = open_rw(data_dir)?;
            lib.settings().save_hotkey(&hk)?;
            println!("HOTKEY {}", lib.settings().hotkey());
        }
        None => {
            let lib = open_ro(data_dir)?;
            println!("{}", lib.settings().hotkey());
        }
    }
    Ok(())
}

pub fn exec_order(data_dir: Option<PathBuf>, set: Option<Vec<String>>) -> Result<()> {
    let lib = match set {
        Some(ids) => {
            let lib = open_rw(data_dir)?;
            let ids: Vec<String> = ids
                .into_iter()
                .map(|s| s.trim().to_string())
                .filter(|s| !s.is_empty())
                .collect();
            lib.settings().save_categories_order(&ids)?;
            lib
        }
        None => open_ro(data_dir)?,
    };
    for c in lib.ordered_categories() {
        println!("{}\t{}", c.id, c.name);
    }
    Ok(())
}
