//! Memory entries: one conversational turn each.

use chrono::{DateTime, Utc};
use recall_state::Document;
use serde::{Deserialize, Serialize};

use super::error::{RecallError, Result};

/// Input for a new memory entry.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct NewMemory {
    pub user_message: String,
    pub ai_response: String,
    #[serde(default)]
    pub key_facts: Vec<String>,
}

impl NewMemory {
    pub fn new(user_message: impl Into<String>, ai_response: impl Into<String>) -> Self {
        Self {
            user_message: user_message.into(),
            ai_response: ai_response.into(),
            key_facts: Vec::new(),
        }
    }

    pub fn with_key_facts<I, S>(mut self, facts: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.key_facts = facts.into_iter().map(Into::into).collect();
        self
    }

    /// Both sides of the exchange must be present.
    pub fn validate(&self) -> Result<()> {
        if self.user_message.is_empty() || self.ai_response.is_empty() {
            return Err(RecallError::invalid("Message and response are required"));
        }
        Ok(())
    }
}

/// A stored conversational turn.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct MemoryEntry {
    /// Store-generated identifier.
    pub id: String,

    pub user_message: String,

    pub ai_response: String,

    /// Free-form topic tags attached by the caller.
    pub key_facts: Vec<String>,

    /// Store time at creation. `None` if missing or unparseable.
    pub timestamp: Option<DateTime<Utc>>,

    /// `YYYY-MM-DD` projection of `timestamp`.
    pub conversation_date: Option<String>,
}

impl MemoryEntry {
    /// Decode a `memory_entries` document, tolerating missing fields.
    pub fn from_document(doc: &Document) -> Self {
        let key_facts = doc
            .get("keyFacts")
            .and_then(|v| v.as_array())
            .map(|items| {
                items
                    .iter()
                    .filter_map(|v| v.as_str().map(str::to_string))
                    .collect()
            })
            .unwrap_or_default();

        Self {
            id: doc.id().to_string(),
            user_message: doc.get_str("userMessage").unwrap_or_default().to_string(),
            ai_response: doc.get_str("aiResponse").unwrap_or_default().to_string(),
            key_facts,
            timestamp: doc.get_timestamp("timestamp"),
            conversation_date: doc.get_str("conversationDate").map(str::to_string),
        }
    }
}
