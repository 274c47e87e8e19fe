//! Read-side digests over a user's memory log.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// Time-windowed digest of recent conversations.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Summary {
    pub total_conversations: usize,
    /// De-duplicated union of the window's key-fact tags.
    pub topics_mentioned: Vec<String>,
    /// Always empty; mood extraction is not performed.
    pub mood_trend: Vec<String>,
    pub last_conversation: Option<DateTime<Utc>>,
}

/// Full-history aggregates for one user.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Analytics {
    pub total_memories_stored: usize,
    pub total_key_facts: usize,
    /// Mean `aiResponse` length in characters, rounded.
    pub average_response_length: u64,
    pub most_recent_update: Option<DateTime<Utc>>,
}
