//! Time-windowed conversation summaries.

use std::collections::HashSet;
use std::sync::Arc;

use chrono::{DateTime, Duration, Utc};
use recall_state::DocumentStore;
use tracing::instrument;

use super::log::MemoryLog;
use crate::domain::{Result, Summary};
use crate::identity::UserId;

/// Window used when the caller does not name one.
pub const DEFAULT_SUMMARY_DAYS: u32 = 7;

#[derive(Clone)]
pub struct SummaryEngine {
    store: Arc<dyn DocumentStore>,
    log: MemoryLog,
}

impl SummaryEngine {
    pub fn new(store: Arc<dyn DocumentStore>) -> Self {
        Self {
            log: MemoryLog::new(store.clone()),
            store,
        }
    }

    /// Digest of entries stamped within the last `days` days of store time.
    ///
    /// The cutoff is `now - days` to the microsecond; no day truncation.
    #[instrument(skip(self), fields(user_id = %user))]
    pub async fn summarize(&self, user: &UserId, days: Option<u32>) -> Result<Summary> {
        let days = days.unwrap_or(DEFAULT_SUMMARY_DAYS);
        let now = self.store.now();
        let cutoff = now
            .checked_sub_signed(Duration::days(i64::from(days)))
            .unwrap_or(DateTime::<Utc>::MIN_UTC);

        let entries = self.log.since(user, cutoff).await?;

        let mut seen = HashSet::new();
        let mut topics = Vec::new();
        for entry in &entries {
            for topic in &entry.key_facts {
                if seen.insert(topic.as_str()) {
                    topics.push(topic.clone());
                }
            }
        }

        Ok(Summary {
            total_conversations: entries.len(),
            topics_mentioned: topics,
            mood_trend: Vec::new(),
            last_conversation: entries.first().and_then(|e| e.timestamp),
        })
    }
}
