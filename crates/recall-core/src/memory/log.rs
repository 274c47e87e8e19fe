//! Bounded per-user memory log.
//!
//! The cap is enforced by evict-after-append: an append persists first and
//! then trims everything beyond the newest [`MAX_MEMORY_ENTRIES`]. The count
//! may briefly exceed the cap between the two steps and always converges.

use std::sync::Arc;

use chrono::{DateTime, Utc};
use recall_state::{format_timestamp, DocPath, DocWrite, DocumentStore, Filter, OrderBy, Query};
use serde_json::Value;
use tracing::{debug, instrument};

use crate::domain::{MemoryEntry, NewMemory, Result};
use crate::identity::UserId;
use crate::metrics::METRICS;
use crate::obs;

/// Retention cap per user.
pub const MAX_MEMORY_ENTRIES: usize = 50;

/// Entries returned by [`MemoryLog::recent`] when no limit is given.
pub const DEFAULT_RECENT_LIMIT: usize = 10;

/// Result of one eviction pass. Failures are logged and counted, never raised.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum EvictionOutcome {
    Evicted(usize),
    Failed,
}

impl EvictionOutcome {
    pub fn removed(&self) -> usize {
        match self {
            EvictionOutcome::Evicted(n) => *n,
            EvictionOutcome::Failed => 0,
        }
    }

    pub fn is_failed(&self) -> bool {
        matches!(self, EvictionOutcome::Failed)
    }
}

/// Ordered, capped sequence of a user's memory entries.
#[derive(Clone)]
pub struct MemoryLog {
    store: Arc<dyn DocumentStore>,
}

impl MemoryLog {
    pub fn new(store: Arc<dyn DocumentStore>) -> Self {
        Self { store }
    }

    /// Persist a new entry stamped with store time, then evict.
    ///
    /// Returns the generated entry id. An eviction failure does not fail
    /// the append.
    #[instrument(skip(self, memory), fields(user_id = %user))]
    pub async fn append(&self, user: &UserId, memory: NewMemory) -> Result<String> {
        memory.validate()?;

        let now = self.store.now();
        let key_facts = memory.key_facts.len();
        let write = DocWrite::new()
            .set("userMessage", memory.user_message)
            .set("aiResponse", memory.ai_response)
            .set(
                "keyFacts",
                Value::Array(memory.key_facts.into_iter().map(Value::String).collect()),
            )
            .set("timestamp", format_timestamp(now))
            .set("conversationDate", now.format("%Y-%m-%d").to_string());

        let doc = self
            .store
            .create(&super::memory_entries(user)?, write)
            .await?;
        let id = doc.id().to_string();

        METRICS.inc_memories_stored();
        obs::emit_memory_stored(user.as_str(), &id, key_facts);

        self.evict(user).await;
        Ok(id)
    }

    /// Delete every entry beyond the newest [`MAX_MEMORY_ENTRIES`] in one
    /// atomic batch. Idempotent.
    #[instrument(skip(self), fields(user_id = %user))]
    pub async fn evict(&self, user: &UserId) -> EvictionOutcome {
        match self.try_evict(user).await {
            Ok(removed) => {
                if removed > 0 {
                    METRICS.add_entries_evicted(removed as u64);
                    obs::emit_memory_evicted(user.as_str(), removed);
                }
                EvictionOutcome::Evicted(removed)
            }
            Err(e) => {
                METRICS.inc_eviction_failures();
                obs::emit_evict_failed(user.as_str(), &e);
                EvictionOutcome::Failed
            }
        }
    }

    async fn try_evict(&self, user: &UserId) -> Result<usize> {
        let overflow = self
            .store
            .query(
                &super::memory_entries(user)?,
                &Query::all()
                    .order_by(OrderBy::desc("timestamp"))
                    .offset(MAX_MEMORY_ENTRIES),
            )
            .await?;

        if overflow.is_empty() {
            return Ok(0);
        }

        let paths: Vec<DocPath> = overflow.into_iter().map(|doc| doc.path).collect();
        debug!(count = paths.len(), "Evicting entries beyond retention cap");
        Ok(self.store.batch_delete(&paths).await?)
    }

    /// The `limit` most recent entries, newest first.
    ///
    /// `None` means [`DEFAULT_RECENT_LIMIT`]; `Some(0)` returns nothing
    /// without reading the store.
    #[instrument(skip(self), fields(user_id = %user))]
    pub async fn recent(&self, user: &UserId, limit: Option<usize>) -> Result<Vec<MemoryEntry>> {
        let limit = limit.unwrap_or(DEFAULT_RECENT_LIMIT);
        if limit == 0 {
            return Ok(Vec::new());
        }

        let docs = self
            .store
            .query(
                &super::memory_entries(user)?,
                &Query::all()
                    .order_by(OrderBy::desc("timestamp"))
                    .limit(limit),
            )
            .await?;
        Ok(docs.iter().map(MemoryEntry::from_document).collect())
    }

    /// Entries stamped at or after `cutoff`, newest first.
    pub async fn since(&self, user: &UserId, cutoff: DateTime<Utc>) -> Result<Vec<MemoryEntry>> {
        let docs = self
            .store
            .query(
                &super::memory_entries(user)?,
                &Query::all()
                    .filter(Filter::gte("timestamp", format_timestamp(cutoff)))
                    .order_by(OrderBy::desc("timestamp")),
            )
            .await?;
        Ok(docs.iter().map(MemoryEntry::from_document).collect())
    }

    /// Every stored entry, unordered.
    pub async fn all(&self, user: &UserId) -> Result<Vec<MemoryEntry>> {
        let docs = self
            .store
            .query(&super::memory_entries(user)?, &Query::all())
            .await?;
        Ok(docs.iter().map(MemoryEntry::from_document).collect())
    }
}
