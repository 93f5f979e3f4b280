//! validate: структурная проверка внешнего снапшота (импорт) до того, как ему доверять.
//!
//! Проверка идёт по сырому serde_json::Value, а не по Snapshot: десериализация в Snapshot
//! терпима к пропущенным полям (serde default), а здесь любое отклонение: отказ.
//!
//! Правила:
//! - верхний уровень: объект;
//! - categories: массив; у каждого элемента непустые строки id, name, key, color;
//! - itemsData: объект; каждое значение: массив; у каждого элемента непустые строки code, gifId;
//! - gifs: если присутствует и не null, объект (значения любые); null == отсутствует.
//!
//! Для доверенного пути загрузки (SnapshotStore::load) проверка не применяется.

use serde_json::Value;

use crate::error::{StoreError, StoreResult};
use crate::model::Snapshot;

const CATEGORY_FIELDS: [&str; 4] = ["id", "name", "key", "color"];
const ITEM_FIELDS: [&str; 2] = ["code", "gifId"];

/// Проверить кандидата. Err(InvalidSchema) содержит путь к первому нарушению.
pub fn validate(candidate: &Value) -> StoreResult<()> {
    let root = candidate
        .as_object()
        .ok_or_else(|| invalid("$", "top level must be an object"))?;

    let categories = root
        .get("categories")
        .ok_or_else(|| invalid("categories", "missing"))?
        .as_array()
        .ok_or_else(|| invalid("categories", "must be an array"))?;
    for (i, cat) in categories.iter().enumerate() {
        let path = format!("categories[{i}]");
        check_fields(cat, &path, &CATEGORY_FIELDS)?;
    }

    let items_data = root
        .get("itemsData")
        .ok_or_else(|| invalid("itemsData", "missing"))?
        .as_object()
        .ok_or_else(|| invalid("itemsData", "must be an object"))?;
    for (cat_id, items) in items_data {
        let path = format!("itemsData.{cat_id}");
        let items = items
            .as_array()
            .ok_or_else(|| invalid(&path, "must be an array"))?;
        for (i, item) in items.iter().enumerate() {
            check_fields(item, &format!("{path}[{i}]"), &ITEM_FIELDS)?;
        }
    }

    if let Some(gifs) = root.get("gifs") {
        if !gifs.is_null() && !gifs.is_object() {
            return Err(invalid("gifs", "must be an object"));
        }
    }

    Ok(())
}

pub fn is_valid(candidate: &Value) -> bool {
    validate(candidate).is_ok()
}

/// Проверить и сразу привести к Snapshot.
pub fn validate_into_snapshot(candidate: Value) -> StoreResult<Snapshot> {
    validate(&candidate)?;
    serde_json::from_value(candidate).map_err(|e| invalid("$", &e.to_string()))
}

fn check_fields(v: &Value, path: &str, fields: &[&str]) -> StoreResult<()> {
    let obj = v
        .as_object()
        .ok_or_else(|| invalid(path, "must be an object"))?;
    for f in fields {
        match obj.get(*f) {
            Some(Value::String(s)) if !s.is_empty() => {}
            Some(Value::String(_)) => return Err(invalid(&format!("{path}.{f}"), "empty")),
            Some(_) => return Err(invalid(&format!("{path}.{f}"), "must be a string")),
            None => return Err(invalid(&format!("{path}.{f}"), "missing")),
        }
    }
    Ok(())
}

fn invalid(path: &str, what: &str) -> StoreError {
    StoreError::InvalidSchema(format!("{path}: {what}"))
}
