//! Key facts: one named value per fact type and user.

use chrono::{DateTime, Utc};
use recall_state::Document;
use serde::{Deserialize, Serialize};
use serde_json::Value;

/// A stored key fact.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct KeyFact {
    pub fact_type: String,
    pub value: Value,
    /// Store time of the last write.
    pub updated_at: Option<DateTime<Utc>>,
}

impl KeyFact {
    /// The document id is the fact type; the stored copy is informational.
    pub fn from_document(doc: &Document) -> Self {
        Self {
            fact_type: doc.id().to_string(),
            value: doc.get("value").cloned().unwrap_or(Value::Null),
            updated_at: doc.get_timestamp("updatedAt"),
        }
    }
}
