//! Full-history aggregates.
//!
//! Scans the whole log on every call, which stays cheap only because the
//! retention cap bounds it.

use std::sync::Arc;

use recall_state::DocumentStore;
use tracing::instrument;

use super::key_facts::KeyFactTable;
use super::log::MemoryLog;
use crate::domain::{Analytics, MemoryEntry, Result};
use crate::identity::UserId;

#[derive(Clone)]
pub struct AnalyticsEngine {
    log: MemoryLog,
    facts: KeyFactTable,
}

/// Mean response length in chars, rounded half away from zero.
fn average_response_length(entries: &[MemoryEntry]) -> u64 {
    if entries.is_empty() {
        return 0;
    }
    let total: u64 = entries
        .iter()
        .map(|e| e.ai_response.chars().count() as u64)
        .sum();
    let n = entries.len() as u64;
    (2 * total + n) / (2 * n)
}

impl AnalyticsEngine {
    pub fn new(store: Arc<dyn DocumentStore>) -> Self {
        Self {
            log: MemoryLog::new(store.clone()),
            facts: KeyFactTable::new(store),
        }
    }

    #[instrument(skip(self), fields(user_id = %user))]
    pub async fn analyze(&self, user: &UserId) -> Result<Analytics> {
        let entries = self.log.all(user).await?;
        let facts = self.facts.get_all(user).await?;

        Ok(Analytics {
            total_memories_stored: entries.len(),
            total_key_facts: facts.len(),
            average_response_length: average_response_length(&entries),
            most_recent_update: entries.iter().filter_map(|e| e.timestamp).max(),
        })
    }
}
