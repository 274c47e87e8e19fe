//! Per-user memory subsystem.
//!
//! Provides the bounded memory log with its retention cap, the key-fact
//! table, the preference history, windowed summaries, full-history
//! analytics and the daily retention sweep.
//!
//! Layout under the store:
//! ```text
//! users/{userId}                          learnedPreferences: [snapshot, ...]
//! users/{userId}/memory_entries/{uuid}    userMessage, aiResponse, keyFacts, timestamp, conversationDate
//! users/{userId}/key_facts/{factType}     value, updatedAt, factType
//! ```

pub mod analytics;
pub mod key_facts;
pub mod log;
pub mod preferences;
pub mod retention;
pub mod summary;

pub use analytics::AnalyticsEngine;
pub use key_facts::KeyFactTable;
pub use log::{EvictionOutcome, MemoryLog, DEFAULT_RECENT_LIMIT, MAX_MEMORY_ENTRIES};
pub use preferences::PreferenceLog;
pub use retention::{RetentionSweeper, SweepReport};
pub use summary::{SummaryEngine, DEFAULT_SUMMARY_DAYS};

use recall_state::{CollectionPath, DocPath, StorageResult};

use crate::identity::UserId;

pub(crate) const USERS: &str = "users";
pub(crate) const MEMORY_ENTRIES: &str = "memory_entries";
pub(crate) const KEY_FACTS: &str = "key_facts";
pub(crate) const LEARNED_PREFERENCES: &str = "learnedPreferences";

pub(crate) fn user_doc(user: &UserId) -> StorageResult<DocPath> {
    CollectionPath::root(USERS)?.doc(user.as_str())
}

pub(crate) fn memory_entries(user: &UserId) -> StorageResult<CollectionPath> {
    user_doc(user)?.collection(MEMORY_ENTRIES)
}

pub(crate) fn key_facts(user: &UserId) -> StorageResult<CollectionPath> {
    user_doc(user)?.collection(KEY_FACTS)
}
