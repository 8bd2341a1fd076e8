//! Task records as the dashboard backend ships them.
//!
//! Records are kept as raw JSON objects so a store can write them back
//! without dropping fields the engine never looks at (notes, timestamps, ...).

use matrix_core::PriorityCode;
use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};

/// Keys the backend has used for a task's display name, in lookup order.
const NAME_KEYS: [&str; 3] = ["name", "title", "taskName"];

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct RawTask(pub Map<String, Value>);

impl RawTask {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with(mut self, key: &str, value: impl Into<Value>) -> Self {
        self.0.insert(key.to_string(), value.into());
        self
    }

    /// `_id` wins over `id`; numeric ids are stringified.
    pub fn id(&self) -> Option<String> {
        ["_id", "id"].iter().find_map(|k| match self.0.get(*k)? {
            Value::String(s) if !s.trim().is_empty() => Some(s.trim().to_string()),
            Value::Number(n) => Some(n.to_string()),
            _ => None,
        })
    }

    pub fn name(&self) -> Option<&str> {
        NAME_KEYS.iter().find_map(|k| self.str_field(k).filter(|s| !s.is_empty()))
    }

    pub fn timeframe(&self) -> Option<&str> {
        self.str_field("timeframe")
    }

    pub fn end_date(&self) -> Option<&str> {
        self.str_field("endDate").filter(|s| !s.trim().is_empty())
    }

    /// Explicit quadrant label, when the record carries one.
    pub fn quadrant_label(&self) -> Option<&str> {
        self.str_field("quadrant")
    }

    pub fn total_units(&self) -> i64 {
        self.int_field("numberOfUnits").unwrap_or(0)
    }

    pub fn completed_units(&self) -> i64 {
        self.int_field("completedUnits").unwrap_or(0)
    }

    /// Stored priority code. Zero, negative and non-numeric values mean "none".
    pub fn stored_code(&self) -> Option<PriorityCode> {
        self.int_field("priority")
            .filter(|v| *v > 0)
            .and_then(|v| u32::try_from(v).ok())
            .map(PriorityCode::from_raw)
    }

    pub fn set_priority(&mut self, code: PriorityCode) {
        self.0.insert("priority".to_string(), Value::from(code.get()));
    }

    fn str_field(&self, key: &str) -> Option<&str> {
        self.0.get(key).and_then(Value::as_str)
    }

    // Accepts JSON integers, floats (truncated) and numeric strings.
    fn int_field(&self, key: &str) -> Option<i64> {
        match self.0.get(key)? {
            Value::Number(n) => n.as_i64().or_else(|| n.as_f64().map(|f| f as i64)),
            Value::String(s) => s.trim().parse::<f64>().ok().map(|f| f as i64),
            _ => None,
        }
    }
}

/// Response envelope used by the backend: `{"success": true, "tasks": [...]}`.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct TaskEnvelope {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub success: Option<bool>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
    #[serde(default)]
    pub tasks: Vec<RawTask>,
}

impl TaskEnvelope {
    pub fn is_failure(&self) -> bool {
        self.success == Some(false)
    }
}

/// Write acknowledgement: `{"success": false, "error": "..."}` on failure.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct StatusEnvelope {
    #[serde(default)]
    pub success: Option<bool>,
    #[serde(default)]
    pub error: Option<String>,
    #[serde(default)]
    pub message: Option<String>,
}

impl StatusEnvelope {
    pub fn failure_reason(&self) -> Option<String> {
        if self.success != Some(false) {
            return None;
        }
        Some(
            self.error
                .clone()
                .or_else(|| self.message.clone())
                .unwrap_or_else(|| "request failed".to_string()),
        )
    }
}
