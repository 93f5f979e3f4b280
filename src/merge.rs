//! merge: объединение текущего снапшота с импортируемым.
//!
//! Правила (чистая функция, без побочных эффектов; сохранение: забота вызывающего):
//! 1. categories: порядок текущих сохраняется; входящая категория добавляется в конец,
//!    только если её id ещё нет в результате. Коллизия id: побеждает текущая, событие
//!    попадает в MergeReport::categories_skipped.
//! 2. itemsData: для каждой входящей категории
//!    - нет в результате → последовательность берётся целиком;
//!    - есть → к текущей последовательности дописываются входящие элементы, чей gifId
//!      не встречается в ТЕКУЩЕЙ последовательности этой категории (порядок сохраняется).
//!    Дедуп в пределах категории: тот же gifId в другой категории не мешает.
//! 3. gifs: объединение ключей, при коллизии побеждает входящая запись (асимметрия
//!    относительно категорий/элементов).
//! 4. Бэкап не делается.

use std::collections::HashSet;

use crate::model::Snapshot;

/// Что произошло при слиянии (для логов и уведомления пользователю).
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct MergeReport {
    pub categories_added: usize,
    /// id входящих категорий, отброшенных из-за коллизии.
    pub categories_skipped: Vec<String>,
    pub items_added: usize,
    pub items_skipped: usize,
    pub gifs_added: usize,
    pub gifs_overwritten: usize,
}

impl MergeReport {
    pub fn is_noop(&self) -> bool {
        self.categories_added == 0 && self.items_added == 0 && self.gifs_added == 0
    }
}

pub fn merge(current: &Snapshot, incoming: &Snapshot) -> Snapshot {
    merge_with_report(current, incoming).0
}

pub fn merge_with_report(current: &Snapshot, incoming: &Snapshot) -> (Snapshot, MergeReport) {
    let mut out = current.clone();
    let mut report = MergeReport::default();

    // 1) categories
    let mut known: HashSet<String> = out.categories.iter().map(|c| c.id.clone()).collect();
    for cat in &incoming.categories {
        if known.insert(cat.id.clone()) {
            out.categories.push(cat.clone());
            report.categories_added += 1;
        } else {
            report.categories_skipped.push(cat.id.clone());
        }
    }

    // 2) itemsData
    for (cat_id, incoming_items) in &incoming.items_data {
        match out.items_data.get_mut(cat_id) {
            None => {
                report.items_added += incoming_items.len();
                out.items_data.insert(cat_id.clone(), incoming_items.clone());
            }
            Some(existing) => {
                let seen: HashSet<&str> = current
                    .items(cat_id)
                    .iter()
                    .map(|it| it.gif_id.as_str())
                    .collect();
                let (keep, drop): (Vec<_>, Vec<_>) = incoming_items
                    .iter()
                    .partition(|it| !seen.contains(it.gif_id.as_str()));
                report.items_added += keep.len();
                report.items_skipped += drop.len();
                existing.extend(keep.into_iter().cloned());
            }
        }
    }

    // 3) gifs (last-writer-wins)
    for (gif_id, meta) in &incoming.gifs {
        match out.gifs.insert(gif_id.clone(), meta.clone()) {
            None => report.gifs_added += 1,
            Some(_) => report.gifs_overwritten += 1,
        }
    }

    (out, report)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::model::{Category, Item};
    use serde_json::json;

    fn snap(cats: &[(&str, &str)], items: &[(&str, Vec<(&str, &str)>)]) -> Snapshot {
        let mut s = Snapshot::empty();
        for (id, name) in cats {
            s.categories.push(Category::new(id, name, "1", "#123456"));
        }
        for (cat, list) in items {
            s.items_data.insert(
                cat.to_string(),
                list.iter().map(|(code, gif)| Item::new(code, gif)).collect(),
            );
        }
        s
    }

    #[test]
    fn same_category_new_item_is_appended() {
        let current = snap(&[("c1", "Fun")], &[("c1", vec![("lol ", "g1")])]);
        let incoming = snap(&[("c1", "Other")], &[("c1", vec![("wow ", "g2")])]);
        let (out, report) = merge_with_report(&current, &incoming);

        assert_eq!(out.categories.len(), 1);
        assert_eq!(out.categories[0].name, "Fun");
        assert_eq!(
            out.items("c1"),
            &[Item::new("lol ", "g1"), Item::new("wow ", "g2")]
        );
        assert_eq!(report.categories_skipped, vec!["c1".to_string()]);
        assert_eq!(report.items_added, 1);
    }

    #[test]
    fn merge_with_itself_is_identity() {
        let mut s = snap(
            &[("c1", "a"), ("c2", "b")],
            &[("c1", vec![("x", "g1"), ("y", "g2")]), ("c2", vec![("z", "g3")])],
        );
        s.gifs.insert("g1".into(), json!({"w": 1}));
        let (out, report) = merge_with_report(&s, &s);
        assert_eq!(out, s);
        assert!(report.is_noop());
        assert_eq!(report.gifs_overwritten, 1);
    }

    #[test]
    fn category_collision_keeps_current_fields() {
        let current = snap(&[("c1", "Mine")], &[]);
        let mut incoming = snap(&[("c1", "Theirs"), ("c2", "New")], &[]);
        incoming.categories[0].color = "#000000".into();
        let out = merge(&current, &incoming);
        assert_eq!(out.categories.len(), 2);
        assert_eq!(out.categories[0], current.categories[0]);
        assert_eq!(out.categories[1].id, "c2");
    }

    #[test]
    fn item_collision_keeps_current_item() {
        let current = snap(&[("c1", "a")], &[("c1", vec![("mine", "g1")])]);
        let incoming = snap(&[], &[("c1", vec![("theirs", "g1"), ("new", "g9")])]);
        let (out, report) = merge_with_report(&current, &incoming);
        assert_eq!(out.items("c1"), &[Item::new("mine", "g1"), Item::new("new", "g9")]);
        assert_eq!(report.items_skipped, 1);
    }

    #[test]
    fn dedup_is_per_category() {
        let current = snap(&[("c1", "a"), ("c2", "b")], &[("c1", vec![("x", "g1")]), ("c2", vec![])]);
        let incoming = snap(&[], &[("c2", vec![("x", "g1")])]);
        let out = merge(&current, &incoming);
        assert_eq!(out.items("c2"), &[Item::new("x", "g1")]);
        assert_eq!(out.items("c1").len(), 1);
    }

    #[test]
    fn absent_category_adopted_wholesale() {
        let current = snap(&[("c1", "a")], &[("c1", vec![("x", "g1")])]);
        let incoming = snap(&[("c2", "b")], &[("c2", vec![("p", "g5"), ("q", "g5")])]);
        let out = merge(&current, &incoming);
        assert_eq!(out.items("c2"), &[Item::new("p", "g5"), Item::new("q", "g5")]);
        assert_eq!(out.category_ids(), vec!["c1", "c2"]);
    }

    #[test]
    fn gifs_collision_incoming_wins() {
        let mut current = Snapshot::empty();
        current.gifs.insert("g1".into(), json!({"src": "old"}));
        current.gifs.insert("g2".into(), json!({"src": "keep"}));
        let mut incoming = Snapshot::empty();
        incoming.gifs.insert("g1".into(), json!({"src": "new"}));
        incoming.gifs.insert("g3".into(), json!({}));
        let (out, report) = merge_with_report(&current, &incoming);
        assert_eq!(out.gifs["g1"], json!({"src": "new"}));
        assert_eq!(out.gifs["g2"], json!({"src": "keep"}));
        assert!(out.gifs.contains_key("g3"));
        assert_eq!((report.gifs_added, report.gifs_overwritten), (1, 1));
    }

    #[test]
    fn merge_is_monotone() {
        let current = snap(
            &[("c1", "a"), ("c2", "b")],
            &[("c1", vec![("x", "g1"), ("y", "g2")]), ("c2", vec![("z", "g3")])],
        );
        let incoming = snap(
            &[("c2", "b2"), ("c3", "c")],
            &[("c2", vec![("z", "g3"), ("w", "g4")]), ("c3", vec![("v", "g5")])],
        );
        let out = merge(&current, &incoming);
        assert!(out.categories.len() >= current.categories.len());
        for (cat, items) in &current.items_data {
            assert!(out.items(cat).len() >= items.len());
            assert_eq!(&out.items(cat)[..items.len()], items.as_slice());
        }
    }

    #[test]
    fn duplicate_incoming_category_ids_only_first_added() {
        let current = Snapshot::empty();
        let incoming = snap(&[("c1", "first"), ("c1", "second")], &[]);
        let (out, report) = merge_with_report(&current, &incoming);
        assert_eq!(out.categories.len(), 1);
        assert_eq!(out.categories[0].name, "first");
        assert_eq!(report.categories_skipped, vec!["c1".to_string()]);
    }
}
