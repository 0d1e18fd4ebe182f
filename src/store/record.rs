use chrono::NaiveDateTime;
use serde::{Deserialize, Serialize};
use serde_json::Value;

/// A single activity row: one page visit, search, or video view.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Record {
    /// Stable positive id, unique per table, assigned at insertion and
    /// never reused.
    pub id: u64,

    /// When the activity happened (local wall-clock time).
    pub date: NaiveDateTime,

    /// The remaining fields (url, title, domain, word list, ...).
    #[serde(flatten)]
    pub data: Value,
}

impl Record {
    /// A field as a plain string, if present and a string.
    pub fn field_str(&self, field: &str) -> Option<&str> {
        self.data.get(field).and_then(Value::as_str)
    }

    /// All string occurrences of a field. A plain string yields one entry;
    /// an array-of-strings yields one entry per element, so multi-valued
    /// fields count once per element.
    pub fn field_values<'a>(&'a self, field: &str) -> Vec<&'a str> {
        match self.data.get(field) {
            Some(Value::String(s)) => vec![s.as_str()],
            Some(Value::Array(items)) => {
                items.iter().filter_map(Value::as_str).collect()
            }
            _ => Vec::new(),
        }
    }
}
