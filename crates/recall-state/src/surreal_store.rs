//! SurrealDB-backed DocumentStore implementation
//!
//! Every document lives in the `documents` table under the record id
//! `documents:[collection, doc_id]`, with its body in the `fields` object.
//! Field names are validated identifiers before being embedded in SurrealQL;
//! all values travel as bound parameters.

use std::sync::Arc;

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use serde::Deserialize;
use serde_json::{json, Map, Value};
use tracing::{debug, instrument};

use crate::error::StorageError;
use crate::handle::SurrealHandle;
use crate::schema::{validate_field, CollectionPath, DocPath, DocWrite, Document};
use crate::storage_traits::{
    Clock, Direction, DocumentStore, Query, StorageResult, SystemClock,
};

const RECORD: &str = "type::thing('documents', [$collection, $doc_id])";

/// Row shape selected from the `documents` table.
#[derive(Debug, Deserialize)]
struct DbDocument {
    collection: String,
    doc_id: String,
    #[serde(default)]
    fields: Option<Map<String, Value>>,
}

impl DbDocument {
    fn into_document(self) -> StorageResult<Document> {
        let path = CollectionPath::parse(&self.collection)?.doc(&self.doc_id)?;
        Ok(Document {
            path,
            fields: self.fields.unwrap_or_default(),
        })
    }
}

#[derive(Debug, Deserialize)]
struct RootRow {
    root_id: String,
}

fn backend(err: surrealdb::Error) -> StorageError {
    StorageError::Backend(err.to_string())
}

/// SurrealDB-backed implementation of [`DocumentStore`].
#[derive(Clone)]
pub struct SurrealDocumentStore {
    handle: Arc<SurrealHandle>,
    clock: Arc<dyn Clock>,
}

impl SurrealDocumentStore {
    pub fn new(handle: Arc<SurrealHandle>) -> Self {
        Self {
            handle,
            clock: Arc::new(SystemClock),
        }
    }

    /// Replace the clock used to stamp documents.
    pub fn with_clock(mut self, clock: Arc<dyn Clock>) -> Self {
        self.clock = clock;
        self
    }

    /// Create an in-memory instance for testing.
    pub async fn in_memory() -> crate::Result<Self> {
        let handle = SurrealHandle::setup_db().await?;
        Ok(Self::new(Arc::new(handle)))
    }

    /// Create from environment variables.
    ///
    /// Uses the env-var chain of [`SurrealHandle::setup_from_env`].
    pub async fn from_env() -> crate::Result<Self> {
        let handle = SurrealHandle::setup_from_env().await?;
        Ok(Self::new(Arc::new(handle)))
    }

    // -- private helpers -----------------------------------------------------

    fn envelope(path: &DocPath, fields: &Map<String, Value>) -> Value {
        json!({
            "collection": path.parent().to_string(),
            "doc_id": path.id(),
            "root_collection": path.root_collection(),
            "root_id": path.root_id(),
            "fields": Value::Object(fields.clone()),
        })
    }

    /// Full-document write (`CREATE` or `UPSERT ... CONTENT`).
    async fn write_content(
        &self,
        verb: &str,
        path: &DocPath,
        write: DocWrite,
    ) -> StorageResult<Document> {
        let fields = write.resolve(self.now())?;
        let sql = format!("{verb} {RECORD} CONTENT $content RETURN NONE");

        self.handle
            .db()
            .query(sql)
            .bind(("collection", path.parent().to_string()))
            .bind(("doc_id", path.id().to_string()))
            .bind(("content", Self::envelope(path, &fields)))
            .await
            .map_err(backend)?
            .check()
            .map_err(backend)?;

        Ok(Document {
            path: path.clone(),
            fields,
        })
    }
}

#[async_trait]
impl DocumentStore for SurrealDocumentStore {
    fn now(&self) -> DateTime<Utc> {
        self.clock.now()
    }

    #[instrument(skip(self, write), fields(collection = %collection))]
    async fn create(
        &self,
        collection: &CollectionPath,
        write: DocWrite,
    ) -> StorageResult<Document> {
        let path = collection.doc(&uuid::Uuid::new_v4().to_string())?;
        debug!(doc_id = %path.id(), "Creating document");
        self.write_content("CREATE", &path, write).await
    }

    #[instrument(skip(self, write), fields(path = %path))]
    async fn put(&self, path: &DocPath, write: DocWrite) -> StorageResult<Document> {
        self.write_content("UPSERT", path, write).await
    }

    #[instrument(skip(self, write), fields(path = %path))]
    async fn merge_upsert(&self, path: &DocPath, write: DocWrite) -> StorageResult<Document> {
        let patch = write.resolve(self.now())?;

        let mut assignments = vec![
            "collection = $collection".to_string(),
            "doc_id = $doc_id".to_string(),
            "root_collection = $root_collection".to_string(),
            "root_id = $root_id".to_string(),
        ];
        for (i, field) in patch.keys().enumerate() {
            assignments.push(format!("fields.{field} = $f{i}"));
        }
        let sql = format!(
            "UPSERT {RECORD} SET {} RETURN NONE",
            assignments.join(", ")
        );

        let mut query = self
            .handle
            .db()
            .query(sql)
            .bind(("collection", path.parent().to_string()))
            .bind(("doc_id", path.id().to_string()))
            .bind(("root_collection", path.root_collection().to_string()))
            .bind(("root_id", path.root_id().to_string()));
        for (i, value) in patch.into_values().enumerate() {
            query = query.bind((format!("f{i}"), value));
        }
        query.await.map_err(backend)?.check().map_err(backend)?;

        self.get(path).await?.ok_or_else(|| {
            StorageError::Backend(format!("document {path} missing after merge-upsert"))
        })
    }

    #[instrument(skip(self), fields(path = %path))]
    async fn get(&self, path: &DocPath) -> StorageResult<Option<Document>> {
        let sql = format!("SELECT collection, doc_id, fields FROM {RECORD}");
        let mut res = self
            .handle
            .db()
            .query(sql)
            .bind(("collection", path.parent().to_string()))
            .bind(("doc_id", path.id().to_string()))
            .await
            .map_err(backend)?;

        let rows: Vec<DbDocument> = res.take(0).map_err(backend)?;
        rows.into_iter().next().map(DbDocument::into_document).transpose()
    }

    #[instrument(skip(self, query), fields(collection = %collection))]
    async fn query(
        &self,
        collection: &CollectionPath,
        query: &Query,
    ) -> StorageResult<Vec<Document>> {
        query.validate()?;

        let mut sql = String::from("SELECT collection, doc_id, fields");
        if let Some(order) = &query.order_by {
            sql.push_str(&format!(", fields.{} AS sort_key", order.field));
        }
        sql.push_str(" FROM documents WHERE collection = $collection");
        if let Some(order) = &query.order_by {
            sql.push_str(&format!(" AND fields.{} != NONE", order.field));
        }
        if let Some(filter) = &query.filter {
            sql.push_str(&format!(
                " AND fields.{} {} $filter_value",
                filter.field,
                filter.op.as_sql()
            ));
        }
        if let Some(order) = &query.order_by {
            let direction = match order.direction {
                Direction::Ascending => "ASC",
                Direction::Descending => "DESC",
            };
            sql.push_str(&format!(" ORDER BY sort_key {direction}"));
        }
        if query.limit.is_some() {
            sql.push_str(" LIMIT $limit");
        }
        if query.offset.is_some() {
            sql.push_str(" START $offset");
        }
        debug!(%sql, "Running collection query");

        let filter_value = query
            .filter
            .as_ref()
            .map(|f| f.value.clone())
            .unwrap_or(Value::Null);
        let mut res = self
            .handle
            .db()
            .query(sql)
            .bind(("collection", collection.to_string()))
            .bind(("filter_value", filter_value))
            .bind(("limit", query.limit.unwrap_or(0)))
            .bind(("offset", query.offset.unwrap_or(0)))
            .await
            .map_err(backend)?;

        let rows: Vec<DbDocument> = res.take(0).map_err(backend)?;
        rows.into_iter().map(DbDocument::into_document).collect()
    }

    #[instrument(skip(self, paths), fields(count = paths.len()))]
    async fn batch_delete(&self, paths: &[DocPath]) -> StorageResult<usize> {
        if paths.is_empty() {
            return Ok(0);
        }

        let keys: Vec<(String, String)> = paths
            .iter()
            .map(|p| (p.parent().to_string(), p.id().to_string()))
            .collect();

        // A single statement runs in its own transaction: all or nothing.
        let mut res = self
            .handle
            .db()
            .query("DELETE documents WHERE [collection, doc_id] INSIDE $keys RETURN BEFORE")
            .bind(("keys", keys))
            .await
            .map_err(backend)?;

        let deleted: Vec<DbDocument> = res.take(0).map_err(backend)?;
        debug!(deleted = deleted.len(), "Batch delete committed");
        Ok(deleted.len())
    }

    #[instrument(skip(self, element), fields(path = %path, field = %field))]
    async fn array_append(
        &self,
        path: &DocPath,
        field: &str,
        element: DocWrite,
    ) -> StorageResult<Value> {
        validate_field(field)?;
        let element = Value::Object(element.resolve(self.now())?);

        let sql = format!(
            "UPSERT {RECORD} SET collection = $collection, doc_id = $doc_id, \
             root_collection = $root_collection, root_id = $root_id, \
             fields.{field} = array::append(fields.{field} ?? [], $element) RETURN NONE"
        );
        self.handle
            .db()
            .query(sql)
            .bind(("collection", path.parent().to_string()))
            .bind(("doc_id", path.id().to_string()))
            .bind(("root_collection", path.root_collection().to_string()))
            .bind(("root_id", path.root_id().to_string()))
            .bind(("element", element.clone()))
            .await
            .map_err(backend)?
            .check()
            .map_err(backend)?;

        Ok(element)
    }

    #[instrument(skip(self))]
    async fn list_top_level_keys(&self, collection: &str) -> StorageResult<Vec<String>> {
        let mut res = self
            .handle
            .db()
            .query(
                "SELECT root_id FROM documents WHERE root_collection = $collection \
                 GROUP BY root_id ORDER BY root_id",
            )
            .bind(("collection", collection.to_string()))
            .await
            .map_err(backend)?;

        let rows: Vec<RootRow> = res.take(0).map_err(backend)?;
        Ok(rows.into_iter().map(|r| r.root_id).collect())
    }
}
