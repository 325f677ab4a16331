//! Record normalizer: shapes store records into the external mapping.
//!
//! CHANGELOG:
//! - 10/12/2026 - Initial implementation

use serde::Serialize;
use serde_json::{Map, Value};

use crate::store::Chat;

/// External representation of a record.
pub type Record = Map<String, Value>;

/// Generic projection: every visible field of the record, unchanged.
pub fn serialize_raw<T: Serialize>(record: &T) -> Record {
    match serde_json::to_value(record) {
        Ok(Value::Object(map)) => map,
        _ => Map::new(),
    }
}

/// Chat projection with resolved `name`, `id` and `isGroup`.
///
/// `name` is null when none of the name fields are present.
pub fn serialize_chat(chat: &Chat) -> Record {
    let mut record = serialize_raw(chat);

    let name = chat
        .display_name()
        .map_or(Value::Null, |n| Value::String(n.to_string()));

    record.insert("name".to_string(), name);
    record.insert("id".to_string(), Value::String(chat.id.clone()));
    record.insert("isGroup".to_string(), Value::Bool(chat.is_group));
    record
}
