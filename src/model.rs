use serde::{Deserialize, Serialize};
use serde_json::Value as JsonValue;

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Snippet {
    pub id: String,
    #[serde(default)]
    pub text: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub created_at: Option<String>,
}

impl Snippet {
    pub fn new(id: String, text: String, created_at: String) -> Self {
        Snippet {
            id,
            text,
            created_at: Some(created_at),
        }
    }

    /// Reads a stored record without requiring it to match the current shape.
    ///
    /// Older collections used sequential integer ids; those read as their decimal
    /// form. Records without a string or integer id have no view and yield `None`.
    pub fn from_record(record: &JsonValue) -> Option<Self> {
        let fields = record.as_object()?;
        let id = match fields.get("id")? {
            JsonValue::String(s) => s.clone(),
            JsonValue::Number(n) if n.is_i64() || n.is_u64() => n.to_string(),
            _ => return None,
        };
        let text = match fields.get("text") {
            Some(JsonValue::String(s)) => s.clone(),
            Some(JsonValue::Null) | None => String::new(),
            Some(other) => other.to_string(),
        };
        let created_at = fields
            .get("created_at")
            .and_then(JsonValue::as_str)
            .map(str::to_string);

        Some(Snippet { id, text, created_at })
    }
}
