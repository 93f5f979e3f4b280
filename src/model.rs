//! model: категории, элементы и снапшот библиотеки (формат gif_data.json и data.json пакета).
//!
//! Формат (JSON, верхний уровень):
//!   { "categories": [Category], "itemsData": { catId: [Item] }, "gifs": { gifId: {...} } }
//!
//! Неизвестные поля категорий/элементов сохраняются как есть (extra), чтобы
//! save() после load() не терял то, что записал UI.

use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};
use std::collections::{BTreeMap, BTreeSet};

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Category {
    #[serde(default)]
    pub id: String,
    #[serde(default)]
    pub name: String,
    #[serde(default)]
    pub key: String,
    #[serde(default)]
    pub color: String,
    #[serde(flatten)]
    pub extra: Map<String, Value>,
}

impl Category {
    pub fn new(id: &str, name: &str, key: &str, color: &str) -> Self {
        Self {
            id: id.to_string(),
            name: name.to_string(),
            key: key.to_string(),
            color: color.to_string(),
            extra: Map::new(),
        }
    }
}

/// Элемент категории: текст, который "печатает" хоткей, и ссылка на GIF.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Item {
    #[serde(default)]
    pub code: String,
    #[serde(default, rename = "gifId")]
    pub gif_id: String,
    #[serde(flatten)]
    pub extra: Map<String, Value>,
}

impl Item {
    pub fn new(code: &str, gif_id: &str) -> Self {
        Self {
            code: code.to_string(),
            gif_id: gif_id.to_string(),
            extra: Map::new(),
        }
    }
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Snapshot {
    #[serde(default)]
    pub categories: Vec<Category>,
    #[serde(default, rename = "itemsData")]
    pub items_data: BTreeMap<String, Vec<Item>>,
    #[serde(default, deserialize_with = "null_as_empty")]
    pub gifs: BTreeMap<String, Value>,
}

/// "gifs": null читается как пустой реестр.
fn null_as_empty<'de, D>(d: D) -> Result<BTreeMap<String, Value>, D::Error>
where
    D: serde::Deserializer<'de>,
{
    Ok(Option::<BTreeMap<String, Value>>::deserialize(d)?.unwrap_or_default())
}

impl Snapshot {
    /// Пустой снапшот: {categories: [], itemsData: {}, gifs: {}}.
    pub fn empty() -> Self {
        Self::default()
    }

    pub fn is_empty(&self) -> bool {
        self.categories.is_empty() && self.items_data.is_empty() && self.gifs.is_empty()
    }

    pub fn category(&self, id: &str) -> Option<&Category> {
        self.categories.iter().find(|c| c.id == id)
    }

    pub fn has_category(&self, id: &str) -> bool {
        self.category(id).is_some()
    }

    pub fn category_ids(&self) -> Vec<String> {
        self.categories.iter().map(|c| c.id.clone()).collect()
    }

    /// Элементы категории (пустой срез, если категории нет в itemsData).
    pub fn items(&self, category_id: &str) -> &[Item] {
        self.items_data
            .get(category_id)
            .map(|v| v.as_slice())
            .unwrap_or(&[])
    }

    pub fn item_count(&self) -> usize {
        self.items_data.values().map(|v| v.len()).sum()
    }

    /// Все gifId, на которые ссылаются элементы (по всем категориям).
    pub fn referenced_gif_ids(&self) -> BTreeSet<String> {
        self.items_data
            .values()
            .flatten()
            .filter(|it| !it.gif_id.is_empty())
            .map(|it| it.gif_id.clone())
            .collect()
    }

    /// Ключи itemsData, для которых нет категории в categories.
    pub fn orphan_item_keys(&self) -> Vec<String> {
        self.items_data
            .keys()
            .filter(|k| !self.has_category(k))
            .cloned()
            .collect()
    }

    pub fn to_pretty_json(&self) -> serde_json::Result<String> {
        serde_json::to_string_pretty(self)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn items_data_uses_camel_case_keys() {
        let mut s = Snapshot::empty();
        s.categories.push(Category::new("c1", "Fun", "1", "#ff0000"));
        s.items_data
            .insert("c1".into(), vec![Item::new("lol ", "g1")]);
        let json = s.to_pretty_json().unwrap();
        assert!(json.contains("\"itemsData\""));
        assert!(json.contains("\"gifId\": \"g1\""));
        assert!(!json.contains("gif_id"));
    }

    #[test]
    fn unknown_fields_survive_roundtrip() {
        let raw = r##"{
            "categories": [{"id":"c1","name":"n","key":"k","color":"#fff","pinned":true}],
            "itemsData": {"c1": [{"code":"x","gifId":"g","addedAt":42}]},
            "gifs": {"g": {"url":"https://example.org/g.gif"}}
        }"##;
        let s: Snapshot = serde_json::from_str(raw).unwrap();
        assert_eq!(s.categories[0].extra.get("pinned"), Some(&Value::Bool(true)));
        let back: Snapshot = serde_json::from_str(&s.to_pretty_json().unwrap()).unwrap();
        assert_eq!(back, s);
        assert_eq!(back.items("c1")[0].extra.get("addedAt"), Some(&Value::from(42)));
    }

    #[test]
    fn missing_sections_default_to_empty() {
        let s: Snapshot = serde_json::from_str("{}").unwrap();
        assert!(s.is_empty());
        assert_eq!(s.items("nope").len(), 0);
    }

    #[test]
    fn referenced_ids_and_orphans() {
        let mut s = Snapshot::empty();
        s.categories.push(Category::new("c1", "a", "1", "#000"));
        s.items_data.insert(
            "c1".into(),
            vec![Item::new("a", "g1"), Item::new("b", "g2"), Item::new("c", "g1")],
        );
        s.items_data.insert("ghost".into(), vec![Item::new("d", "g3")]);
        let ids: Vec<_> = s.referenced_gif_ids().into_iter().collect();
        assert_eq!(ids, vec!["g1", "g2", "g3"]);
        assert_eq!(s.orphan_item_keys(), vec!["ghost".to_string()]);
        assert_eq!(s.item_count(), 4);
    }
}
