//! Authenticated operation surface.
//!
//! Every call resolves the caller from its [`CallContext`] before touching
//! the store. Store failures are logged with the user and operation, then
//! replaced by a fixed `Internal` message so backend details never reach
//! callers.

use std::collections::BTreeMap;
use std::sync::Arc;

use recall_state::DocumentStore;
use serde::{Deserialize, Serialize};
use serde_json::Value;
use tracing::{error, instrument};

use crate::domain::{
    Analytics, ErrorKind, KeyFact, MemoryEntry, NewMemory, PreferenceSnapshot, RecallError, Result,
    Summary,
};
use crate::identity::{CallContext, UserId};
use crate::memory::{AnalyticsEngine, KeyFactTable, MemoryLog, PreferenceLog, SummaryEngine};

// ---------------------------------------------------------------------------
// Requests and responses
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct StoreMemoryRequest {
    #[serde(default)]
    pub message: String,
    #[serde(default)]
    pub response: String,
    #[serde(default)]
    pub key_facts: Option<Vec<String>>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct StoreMemoryResponse {
    pub success: bool,
    pub memory_id: String,
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RecentMemoriesRequest {
    #[serde(default)]
    pub current_message: String,
    #[serde(default)]
    pub limit: Option<usize>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RecentMemoriesResponse {
    pub success: bool,
    pub memories: Vec<MemoryEntry>,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SetKeyFactRequest {
    #[serde(default)]
    pub fact_type: String,
    #[serde(default)]
    pub fact_value: Value,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SetKeyFactResponse {
    pub success: bool,
    pub fact_type: String,
    pub fact_value: Value,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct KeyFactsResponse {
    pub success: bool,
    pub key_facts: BTreeMap<String, Value>,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct AddPreferencesRequest {
    #[serde(default)]
    pub preferences: Value,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct SuccessResponse {
    pub success: bool,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PreferenceHistoryResponse {
    pub success: bool,
    pub preferences: Vec<PreferenceSnapshot>,
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SummaryRequest {
    #[serde(default)]
    pub days: Option<u32>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SummaryResponse {
    pub success: bool,
    pub summary: Summary,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct AnalyticsResponse {
    pub success: bool,
    pub analytics: Analytics,
}

// ---------------------------------------------------------------------------
// MemoryService
// ---------------------------------------------------------------------------

/// Replace backend failures with a fixed message after logging them.
fn conceal<'a>(
    user: &'a UserId,
    operation: &'static str,
    message: &'static str,
) -> impl FnOnce(RecallError) -> RecallError + 'a {
    move |err| match err.kind() {
        ErrorKind::Internal => {
            error!(user_id = %user, operation, error = %err, "{message}");
            RecallError::Internal(message.to_string())
        }
        _ => err,
    }
}

#[derive(Clone)]
pub struct MemoryService {
    log: MemoryLog,
    facts: KeyFactTable,
    preferences: PreferenceLog,
    summaries: SummaryEngine,
    analytics: AnalyticsEngine,
}

impl MemoryService {
    pub fn new(store: Arc<dyn DocumentStore>) -> Self {
        Self {
            log: MemoryLog::new(store.clone()),
            facts: KeyFactTable::new(store.clone()),
            preferences: PreferenceLog::new(store.clone()),
            summaries: SummaryEngine::new(store.clone()),
            analytics: AnalyticsEngine::new(store),
        }
    }

    #[instrument(skip_all)]
    pub async fn store_memory(
        &self,
        ctx: &CallContext,
        req: StoreMemoryRequest,
    ) -> Result<StoreMemoryResponse> {
        let user = ctx.require_user()?;
        let memory = NewMemory {
            user_message: req.message,
            ai_response: req.response,
            key_facts: req.key_facts.unwrap_or_default(),
        };
        let memory_id = self
            .log
            .append(user, memory)
            .await
            .map_err(conceal(user, "store_memory", "Failed to store memory"))?;
        Ok(StoreMemoryResponse {
            success: true,
            memory_id,
        })
    }

    /// Most recent memories, newest first. `currentMessage` is required but
    /// does not influence selection.
    #[instrument(skip_all)]
    pub async fn get_recent_memories(
        &self,
        ctx: &CallContext,
        req: RecentMemoriesRequest,
    ) -> Result<RecentMemoriesResponse> {
        let user = ctx.require_user()?;
        if req.current_message.is_empty() {
            return Err(RecallError::invalid("Current message is required"));
        }
        let memories = self
            .log
            .recent(user, req.limit)
            .await
            .map_err(conceal(user, "get_recent_memories", "Failed to retrieve memories"))?;
        Ok(RecentMemoriesResponse {
            success: true,
            memories,
        })
    }

    #[instrument(skip_all)]
    pub async fn set_key_fact(
        &self,
        ctx: &CallContext,
        req: SetKeyFactRequest,
    ) -> Result<SetKeyFactResponse> {
        let user = ctx.require_user()?;
        let fact = self
            .facts
            .upsert(user, &req.fact_type, req.fact_value)
            .await
            .map_err(conceal(user, "set_key_fact", "Failed to store fact"))?;
        Ok(SetKeyFactResponse {
            success: true,
            fact_type: fact.fact_type,
            fact_value: fact.value,
        })
    }

    /// One fact by type; `None` when the user never set it.
    #[instrument(skip_all)]
    pub async fn get_key_fact(
        &self,
        ctx: &CallContext,
        fact_type: &str,
    ) -> Result<Option<KeyFact>> {
        let user = ctx.require_user()?;
        self.facts
            .get(user, fact_type)
            .await
            .map_err(conceal(user, "get_key_fact", "Failed to retrieve facts"))
    }

    #[instrument(skip_all)]
    pub async fn get_all_key_facts(&self, ctx: &CallContext) -> Result<KeyFactsResponse> {
        let user = ctx.require_user()?;
        let key_facts = self
            .facts
            .get_all(user)
            .await
            .map_err(conceal(user, "get_all_key_facts", "Failed to retrieve facts"))?;
        Ok(KeyFactsResponse {
            success: true,
            key_facts,
        })
    }

    #[instrument(skip_all)]
    pub async fn add_preferences(
        &self,
        ctx: &CallContext,
        req: AddPreferencesRequest,
    ) -> Result<SuccessResponse> {
        let user = ctx.require_user()?;
        self.preferences
            .append(user, req.preferences)
            .await
            .map_err(conceal(user, "add_preferences", "Failed to update preferences"))?;
        Ok(SuccessResponse { success: true })
    }

    #[instrument(skip_all)]
    pub async fn get_preference_history(
        &self,
        ctx: &CallContext,
    ) -> Result<PreferenceHistoryResponse> {
        let user = ctx.require_user()?;
        let preferences = self.preferences.history(user).await.map_err(conceal(
            user,
            "get_preference_history",
            "Failed to retrieve preferences",
        ))?;
        Ok(PreferenceHistoryResponse {
            success: true,
            preferences,
        })
    }

    #[instrument(skip_all)]
    pub async fn get_summary(&self, ctx: &CallContext, req: SummaryRequest) -> Result<SummaryResponse> {
        let user = ctx.require_user()?;
        let summary = self
            .summaries
            .summarize(user, req.days)
            .await
            .map_err(conceal(user, "get_summary", "Failed to generate summary"))?;
        Ok(SummaryResponse {
            success: true,
            summary,
        })
    }

    #[instrument(skip_all)]
    pub async fn get_analytics(&self, ctx: &CallContext) -> Result<AnalyticsResponse> {
        let user = ctx.require_user()?;
        let analytics = self
            .analytics
            .analyze(user)
            .await
            .map_err(conceal(user, "get_analytics", "Failed to generate analytics"))?;
        Ok(AnalyticsResponse {
            success: true,
            analytics,
        })
    }
}
