use anyhow::Result;
use std::path::PathBuf;

use crate::util::open_ro;

pub fn exec(data_dir: Option<PathBuf>, out: PathBuf, categories: Vec<String>) -> Result<()> {
    // экспорт только читает библиотеку
    let lib = open_ro(data_dir)?;
    let summary = if categories.is_empty() {
        lib.export_all(&out)?
    } else {
        lib.export_selection(&out, &categories)?
    };
    println!("{}", summary.notification());
    Ok(())
}
