use anyhow::Result;
use std::path::PathBuf;

use crate::util::open_ro;

pub fn exec(data_dir: Option<PathBuf>, json: bool) -> Result<()> {
    let lib = open_ro(data_dir)?;
    let snap = lib.snapshot();

    if json {
        println!("{}", snap.to_pretty_json()?);
        return Ok(());
    }

    if snap.categories.is_empty() {
        println!("(library is empty)");
        return Ok(());
    }
    for c in lib.ordered_categories() {
        let items = snap.items(&c.id);
        println!("[{}] {} key={} color={} ({} GIFs)", c.id, c.name, c.key, c.color, items.len());
        for it in items {
            let mark = if lib.assets().exists(&it.gif_id) { " " } else { "!" };
            println!("  {} {:<24} {}", mark, it.gif_id, it.code.trim_end());
        }
    }
    Ok(())
}
