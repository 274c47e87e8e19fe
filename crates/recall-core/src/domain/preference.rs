//! Learned preference snapshots.

use chrono::{DateTime, Utc};
use recall_state::parse_timestamp;
use serde::{Deserialize, Serialize};
use serde_json::Value;

/// One entry of a user's append-only preference history.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PreferenceSnapshot {
    pub preferences: Value,
    pub learned_at: Option<DateTime<Utc>>,
}

impl PreferenceSnapshot {
    /// Decode one element of the `learnedPreferences` array.
    pub fn from_value(raw: &Value) -> Self {
        Self {
            preferences: raw.get("preferences").cloned().unwrap_or(Value::Null),
            learned_at: raw
                .get("learnedAt")
                .and_then(Value::as_str)
                .and_then(parse_timestamp),
        }
    }
}
