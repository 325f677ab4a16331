//! Output formatting and control utilities.
//!
//! CHANGELOG:
//! - 10/16/2026 - Truncate on char boundaries; minimal preset caps text length
//! - 10/12/2026 - Initial implementation

use serde::Serialize;
use serde_json::{json, Value};

/// Text cap applied by the minimal preset when no explicit limit is given.
const MINIMAL_TEXT_CHARS: usize = 120;

/// Output control settings from CLI flags.
#[derive(Debug, Clone, Default)]
pub struct OutputControls {
    pub json: bool,
    pub compact: bool,
    pub minimal: bool,
    pub fields: Option<String>,
    pub max_text_chars: Option<u32>,
}

impl OutputControls {
    /// Render data according to output controls.
    pub fn emit<T: Serialize>(&self, data: &T) -> String {
        let value = serde_json::to_value(data).unwrap_or(Value::Null);

        let filtered = match self.fields {
            Some(ref fields) => filter_fields(&value, fields),
            None => value,
        };

        let limit = self
            .max_text_chars
            .map(|n| n as usize)
            .or(self.minimal.then_some(MINIMAL_TEXT_CHARS));
        let truncated = match limit {
            Some(max_chars) => truncate_text_fields(&filtered, max_chars),
            None => filtered,
        };

        if self.compact || self.minimal {
            serde_json::to_string(&truncated).unwrap_or_else(|_| "{}".to_string())
        } else {
            serde_json::to_string_pretty(&truncated).unwrap_or_else(|_| "{}".to_string())
        }
    }

    /// Print data to stdout according to output controls.
    pub fn print<T: Serialize>(&self, data: &T) {
        println!("{}", self.emit(data));
    }
}

/// Keep only the listed keys of each object (recursing into arrays).
fn filter_fields(value: &Value, fields: &str) -> Value {
    let wanted: Vec<&str> = fields.split(',').map(|s| s.trim()).collect();

    match value {
        Value::Array(arr) => Value::Array(arr.iter().map(|v| filter_fields(v, fields)).collect()),
        Value::Object(map) => Value::Object(
            wanted
                .iter()
                .filter_map(|f| map.get(*f).map(|v| (f.to_string(), v.clone())))
                .collect(),
        ),
        _ => value.clone(),
    }
}

/// Truncate string fields to `max_chars` characters.
fn truncate_text_fields(value: &Value, max_chars: usize) -> Value {
    match value {
        Value::String(s) if s.chars().count() > max_chars => {
            let head: String = s.chars().take(max_chars).collect();
            Value::String(format!("{}...", head))
        }
        Value::Array(arr) => {
            Value::Array(arr.iter().map(|v| truncate_text_fields(v, max_chars)).collect())
        }
        Value::Object(map) => Value::Object(
            map.iter()
                .map(|(k, v)| (k.clone(), truncate_text_fields(v, max_chars)))
                .collect(),
        ),
        _ => value.clone(),
    }
}

/// Format error as JSON.
pub fn format_error(error: &str) -> String {
    json!({
        "error": error,
        "success": false
    })
    .to_string()
}
