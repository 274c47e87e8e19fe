//! Append-only preference history kept on the user document.

use std::sync::Arc;

use recall_state::{DocWrite, DocumentStore};
use serde_json::Value;
use tracing::instrument;

use crate::domain::{PreferenceSnapshot, RecallError, Result};
use crate::identity::UserId;

#[derive(Clone)]
pub struct PreferenceLog {
    store: Arc<dyn DocumentStore>,
}

impl PreferenceLog {
    pub fn new(store: Arc<dyn DocumentStore>) -> Self {
        Self { store }
    }

    /// Append `{preferences, learnedAt}` to `learnedPreferences`, creating
    /// the user document if needed. No deduplication.
    #[instrument(skip(self, preferences), fields(user_id = %user))]
    pub async fn append(&self, user: &UserId, preferences: Value) -> Result<PreferenceSnapshot> {
        if !preferences.is_object() {
            return Err(RecallError::invalid("Preferences object is required"));
        }

        let stored = self
            .store
            .array_append(
                &super::user_doc(user)?,
                super::LEARNED_PREFERENCES,
                DocWrite::new()
                    .set("preferences", preferences)
                    .server_timestamp("learnedAt"),
            )
            .await?;
        Ok(PreferenceSnapshot::from_value(&stored))
    }

    /// Snapshots in append order.
    pub async fn history(&self, user: &UserId) -> Result<Vec<PreferenceSnapshot>> {
        let Some(doc) = self.store.get(&super::user_doc(user)?).await? else {
            return Ok(Vec::new());
        };
        Ok(doc
            .get(super::LEARNED_PREFERENCES)
            .and_then(Value::as_array)
            .map(|items| items.iter().map(PreferenceSnapshot::from_value).collect())
            .unwrap_or_default())
    }
}
