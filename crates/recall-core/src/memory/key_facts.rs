//! Per-user key-fact table with merge-upsert semantics.

use std::collections::BTreeMap;
use std::sync::Arc;

use recall_state::{DocWrite, DocumentStore, Query, StorageError};
use serde_json::Value;
use tracing::instrument;

use crate::domain::{KeyFact, RecallError, Result};
use crate::identity::UserId;

/// `factType -> value` mapping for one user. Each fact is its own document.
#[derive(Clone)]
pub struct KeyFactTable {
    store: Arc<dyn DocumentStore>,
}

fn validate(fact_type: &str, value: &Value) -> Result<()> {
    let empty_value = match value {
        Value::Null => true,
        Value::String(s) => s.is_empty(),
        _ => false,
    };
    if fact_type.is_empty() || empty_value {
        return Err(RecallError::invalid("Fact type and value are required"));
    }
    Ok(())
}

impl KeyFactTable {
    pub fn new(store: Arc<dyn DocumentStore>) -> Self {
        Self { store }
    }

    /// Write `value`, `factType` and a store-stamped `updatedAt` at
    /// `key_facts/{factType}`. Other fields of that document survive.
    #[instrument(skip(self, value), fields(user_id = %user))]
    pub async fn upsert(&self, user: &UserId, fact_type: &str, value: Value) -> Result<KeyFact> {
        validate(fact_type, &value)?;

        let path = super::key_facts(user)?
            .doc(fact_type)
            .map_err(|e| match e {
                StorageError::InvalidPath { reason, .. } => {
                    RecallError::invalid(format!("invalid fact type '{fact_type}': {reason}"))
                }
                other => other.into(),
            })?;

        let doc = self
            .store
            .merge_upsert(
                &path,
                DocWrite::new()
                    .set("value", value)
                    .set("factType", fact_type)
                    .server_timestamp("updatedAt"),
            )
            .await?;
        Ok(KeyFact::from_document(&doc))
    }

    /// Every fact for the user, keyed by fact type.
    #[instrument(skip(self), fields(user_id = %user))]
    pub async fn get_all(&self, user: &UserId) -> Result<BTreeMap<String, Value>> {
        let docs = self
            .store
            .query(&super::key_facts(user)?, &Query::all())
            .await?;
        Ok(docs
            .iter()
            .map(|doc| {
                let fact = KeyFact::from_document(doc);
                (fact.fact_type, fact.value)
            })
            .collect())
    }

    pub async fn get(&self, user: &UserId, fact_type: &str) -> Result<Option<KeyFact>> {
        let Ok(path) = super::key_facts(user)?.doc(fact_type) else {
            return Ok(None);
        };
        Ok(self
            .store
            .get(&path)
            .await?
            .as_ref()
            .map(KeyFact::from_document))
    }
}
