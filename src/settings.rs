//! settings: мелкие JSON-файлы рядом с gif_data.json:
//! - hotkey.json               { "hotkey": "<accelerator>" }
//! - categories-order.json     [ "<categoryId>", ... ]
//! - gif-panel-bounds.json     { "x"?, "y"?, "width", "height" }
//!
//! Чтение прощающее: нет файла или он битый → значение по умолчанию (или None для порядка).
//! Запись: tmp + rename, сбой → Err с контекстом пути.

use anyhow::{anyhow, Context, Result};
use log::{debug, warn};
use serde::de::DeserializeOwned;
use serde::{Deserialize, Serialize};
use std::fs;
use std::path::{Path, PathBuf};

use crate::consts::{
    CATEGORIES_ORDER_FILE, DEFAULT_HOTKEY, DEFAULT_PANEL_HEIGHT, DEFAULT_PANEL_WIDTH,
    HOTKEY_FILE, PANEL_BOUNDS_FILE,
};
use crate::model::Category;
use crate::util::write_atomic;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct PanelBounds {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub x: Option<i32>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub y: Option<i32>,
    #[serde(default = "default_width")]
    pub width: u32,
    #[serde(default = "default_height")]
    pub height: u32,
}

fn default_width() -> u32 {
    DEFAULT_PANEL_WIDTH
}

fn default_height() -> u32 {
    DEFAULT_PANEL_HEIGHT
}

impl Default for PanelBounds {
    fn default() -> Self {
        Self {
            x: None,
            y: None,
            width: DEFAULT_PANEL_WIDTH,
            height: DEFAULT_PANEL_HEIGHT,
        }
    }
}

#[derive(Debug, Serialize, Deserialize)]
struct HotkeyFile {
    #[serde(default)]
    hotkey: String,
}

#[derive(Debug, Clone)]
pub struct Settings {
    dir: PathBuf,
}

impl Settings {
    pub fn new(dir: &Path) -> Self {
        Self {
            dir: dir.to_path_buf(),
        }
    }

    pub fn dir(&self) -> &Path {
        &self.dir
    }

    // ----- hotkey -----

    pub fn hotkey(&self) -> String {
        match read_json::<HotkeyFile>(&self.dir.join(HOTKEY_FILE)) {
            Some(f) if !f.hotkey.trim().is_empty() => f.hotkey,
            _ => DEFAULT_HOTKEY.to_string(),
        }
    }

    pub fn save_hotkey(&self, hotkey: &str) -> Result<()> {
        let hotkey = hotkey.trim();
        if hotkey.is_empty() {
            return Err(anyhow!("hotkey must not be empty"));
        }
        let body = serde_json::to_vec(&HotkeyFile {
            hotkey: hotkey.to_string(),
        })?;
        write_atomic(&self.dir.join(HOTKEY_FILE), &body)
    }

    // ----- categories order -----

    /// None: порядок ещё не сохранялся (или файл нечитаем).
    pub fn categories_order(&self) -> Option<Vec<String>> {
        read_json(&self.dir.join(CATEGORIES_ORDER_FILE))
    }

    pub fn save_categories_order(&self, order: &[String]) -> Result<()> {
        let body = serde_json::to_vec(order)?;
        write_atomic(&self.dir.join(CATEGORIES_ORDER_FILE), &body)
            .with_context(|| format!("save {}", CATEGORIES_ORDER_FILE))
    }

    // ----- panel bounds -----

    pub fn panel_bounds(&self) -> PanelBounds {
        read_json(&self.dir.join(PANEL_BOUNDS_FILE)).unwrap_or_default()
    }

    pub fn save_panel_bounds(&self, bounds: &PanelBounds) -> Result<()> {
        let body = serde_json::to_vec(bounds)?;
        write_atomic(&self.dir.join(PANEL_BOUNDS_FILE), &body)
    }
}

fn read_json<T: DeserializeOwned>(path: &Path) -> Option<T> {
    let bytes = match fs::read(path) {
        Ok(b) => b,
        Err(e) => {
            if e.kind() != std::io::ErrorKind::NotFound {
                warn!("settings: read {} failed: {}", path.display(), e);
            }
            return None;
        }
    };
    match serde_json::from_slice(&bytes) {
        Ok(v) => Some(v),
        Err(e) => {
            warn!("settings: {} is unreadable: {}", path.display(), e);
            None
        }
    }
}

/// Упорядочить категории: сначала id из order (неизвестные пропускаются, повторы тоже),
/// затем все не упомянутые: в исходном порядке.
pub fn apply_order(categories: &[Category], order: &[String]) -> Vec<Category> {
    let mut out: Vec<Category> = Vec::with_capacity(categories.len());
    let mut taken = vec![false; categories.len()];
    for id in order {
        if let Some(i) = categories.iter().position(|c| &c.id == id) {
            if !taken[i] {
                taken[i] = true;
                out.push(categories[i].clone());
            }
        } else {
            debug!("settings: order mentions unknown category '{}'", id);
        }
    }
    for (i, c) in categories.iter().enumerate() {
        if !taken[i] {
            out.push(c.clone());
        }
    }
    out
}

#[cfg(test)]
mod tests {
    use super::*;

    fn cats(ids: &[&str]) -> Vec<Category> {
        ids.iter().map(|id| Category::new(id, id, "k", "#000")).collect()
    }

    fn ids(v: &[Category]) -> Vec<&str> {
        v.iter().map(|c| c.id.as_str()).collect()
    }

    #[test]
    fn order_puts_listed_first_then_rest() {
        let order = vec!["c3".to_string(), "ghost".to_string(), "c1".to_string()];
        let out = apply_order(&cats(&["c1", "c2", "c3"]), &order);
        assert_eq!(ids(&out), vec!["c3", "c1", "c2"]);
    }

    #[test]
    fn repeated_ids_do_not_duplicate() {
        let order = vec!["c2".to_string(), "c2".to_string()];
        let out = apply_order(&cats(&["c1", "c2"]), &order);
        assert_eq!(ids(&out), vec!["c2", "c1"]);
    }

    #[test]
    fn bounds_fill_missing_size() {
        let b: PanelBounds = serde_json::from_str(r#"{"x":10,"y":20}"#).unwrap();
        assert_eq!(b.x, Some(10));
        assert_eq!(b.width, DEFAULT_PANEL_WIDTH);
        assert_eq!(b.height, DEFAULT_PANEL_HEIGHT);
    }
}
