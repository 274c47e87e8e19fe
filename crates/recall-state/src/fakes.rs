//! In-memory fakes for storage traits (testing only)
//!
//! Provides `MemoryDocumentStore` and `ManualClock`. The store satisfies the
//! `DocumentStore` contract without external dependencies and can inject
//! faults for a given top-level document so callers can exercise their
//! failure paths.

use std::collections::{BTreeMap, BTreeSet, HashSet};
use std::sync::{Arc, Mutex};

use async_trait::async_trait;
use chrono::{DateTime, Duration, Utc};
use serde_json::{Map, Value};

use crate::error::StorageError;
use crate::schema::{CollectionPath, DocPath, DocWrite, Document};
use crate::storage_traits::*;

// ---------------------------------------------------------------------------
// ManualClock
// ---------------------------------------------------------------------------

/// Clock that only moves when told to.
#[derive(Debug)]
pub struct ManualClock {
    now: Mutex<DateTime<Utc>>,
}

impl ManualClock {
    pub fn new(start: DateTime<Utc>) -> Self {
        Self {
            now: Mutex::new(start),
        }
    }

    pub fn set(&self, to: DateTime<Utc>) {
        *self.now.lock().unwrap() = to;
    }

    pub fn advance(&self, by: Duration) {
        let mut now = self.now.lock().unwrap();
        *now += by;
    }
}

impl Clock for ManualClock {
    fn now(&self) -> DateTime<Utc> {
        *self.now.lock().unwrap()
    }
}

// ---------------------------------------------------------------------------
// MemoryDocumentStore
// ---------------------------------------------------------------------------

#[derive(Debug, Default)]
struct StoreState {
    /// collection path -> doc id -> fields
    collections: BTreeMap<CollectionPath, BTreeMap<String, Map<String, Value>>>,
    /// top-level document ids whose operations fail
    faulted: HashSet<String>,
    mutations: u64,
}

impl StoreState {
    fn check_fault(&self, root_id: Option<&str>) -> StorageResult<()> {
        match root_id {
            Some(id) if self.faulted.contains(id) => Err(StorageError::Backend(format!(
                "injected fault for '{id}'"
            ))),
            _ => Ok(()),
        }
    }

    fn doc_fields(&self, path: &DocPath) -> Option<&Map<String, Value>> {
        self.collections
            .get(path.parent())
            .and_then(|docs| docs.get(path.id()))
    }

    fn insert(&mut self, path: &DocPath, fields: Map<String, Value>) {
        self.collections
            .entry(path.parent().clone())
            .or_default()
            .insert(path.id().to_string(), fields);
        self.mutations += 1;
    }
}

/// In-memory document store backed by a `BTreeMap<collection, BTreeMap<id, fields>>`.
pub struct MemoryDocumentStore {
    state: Mutex<StoreState>,
    clock: Arc<dyn Clock>,
}

impl Default for MemoryDocumentStore {
    fn default() -> Self {
        Self::new()
    }
}

impl MemoryDocumentStore {
    pub fn new() -> Self {
        Self::with_clock(Arc::new(SystemClock))
    }

    pub fn with_clock(clock: Arc<dyn Clock>) -> Self {
        Self {
            state: Mutex::new(StoreState::default()),
            clock,
        }
    }

    /// Make every operation touching `users/{root_id}` (or any other
    /// top-level document with that id) fail with `StorageError::Backend`.
    pub fn fail_user(&self, root_id: &str) {
        self.state
            .lock()
            .unwrap()
            .faulted
            .insert(root_id.to_string());
    }

    /// Undo [`MemoryDocumentStore::fail_user`].
    pub fn heal_user(&self, root_id: &str) {
        self.state.lock().unwrap().faulted.remove(root_id);
    }

    /// Number of successful mutating operations so far.
    pub fn mutation_count(&self) -> u64 {
        self.state.lock().unwrap().mutations
    }

    /// Number of documents currently stored in a collection.
    pub fn count(&self, collection: &CollectionPath) -> usize {
        self.state
            .lock()
            .unwrap()
            .collections
            .get(collection)
            .map(BTreeMap::len)
            .unwrap_or(0)
    }
}

#[async_trait]
impl DocumentStore for MemoryDocumentStore {
    fn now(&self) -> DateTime<Utc> {
        self.clock.now()
    }

    async fn create(
        &self,
        collection: &CollectionPath,
        write: DocWrite,
    ) -> StorageResult<Document> {
        let path = collection.doc(&uuid::Uuid::new_v4().to_string())?;
        let fields = write.resolve(self.now())?;
        let mut state = self.state.lock().unwrap();
        state.check_fault(Some(path.root_id()))?;
        state.insert(&path, fields.clone());
        Ok(Document { path, fields })
    }

    async fn put(&self, path: &DocPath, write: DocWrite) -> StorageResult<Document> {
        let fields = write.resolve(self.now())?;
        let mut state = self.state.lock().unwrap();
        state.check_fault(Some(path.root_id()))?;
        state.insert(path, fields.clone());
        Ok(Document {
            path: path.clone(),
            fields,
        })
    }

    async fn merge_upsert(&self, path: &DocPath, write: DocWrite) -> StorageResult<Document> {
        let patch = write.resolve(self.now())?;
        let mut state = self.state.lock().unwrap();
        state.check_fault(Some(path.root_id()))?;
        let mut fields = state.doc_fields(path).cloned().unwrap_or_default();
        fields.extend(patch);
        state.insert(path, fields.clone());
        Ok(Document {
            path: path.clone(),
            fields,
        })
    }

    async fn get(&self, path: &DocPath) -> StorageResult<Option<Document>> {
        let state = self.state.lock().unwrap();
        state.check_fault(Some(path.root_id()))?;
        Ok(state.doc_fields(path).map(|fields| Document {
            path: path.clone(),
            fields: fields.clone(),
        }))
    }

    async fn query(
        &self,
        collection: &CollectionPath,
        query: &Query,
    ) -> StorageResult<Vec<Document>> {
        query.validate()?;
        let state = self.state.lock().unwrap();
        state.check_fault(collection.root_id())?;

        let Some(docs) = state.collections.get(collection) else {
            return Ok(Vec::new());
        };

        let mut matched: Vec<Document> = Vec::new();
        for (id, fields) in docs {
            if let Some(filter) = &query.filter {
                if !filter.matches(fields.get(&filter.field)) {
                    continue;
                }
            }
            if let Some(order) = &query.order_by {
                if !fields.contains_key(&order.field) {
                    continue;
                }
            }
            matched.push(Document {
                path: collection.doc(id)?,
                fields: fields.clone(),
            });
        }

        if let Some(order) = &query.order_by {
            matched.sort_by(|a, b| {
                let ord = match (a.get(&order.field), b.get(&order.field)) {
                    (Some(x), Some(y)) => compare_json(x, y).unwrap_or(std::cmp::Ordering::Equal),
                    _ => std::cmp::Ordering::Equal,
                };
                match order.direction {
                    Direction::Ascending => ord,
                    Direction::Descending => ord.reverse(),
                }
            });
        }

        let offset = query.offset.unwrap_or(0);
        let limit = query.limit.unwrap_or(usize::MAX);
        Ok(matched.into_iter().skip(offset).take(limit).collect())
    }

    async fn batch_delete(&self, paths: &[DocPath]) -> StorageResult<usize> {
        if paths.is_empty() {
            return Ok(0);
        }
        let mut state = self.state.lock().unwrap();
        // Check every path before touching anything: all or nothing.
        for path in paths {
            state.check_fault(Some(path.root_id()))?;
        }

        let mut deleted = 0;
        for path in paths {
            if let Some(docs) = state.collections.get_mut(path.parent()) {
                if docs.remove(path.id()).is_some() {
                    deleted += 1;
                }
                if docs.is_empty() {
                    state.collections.remove(path.parent());
                }
            }
        }
        state.mutations += 1;
        Ok(deleted)
    }

    async fn array_append(
        &self,
        path: &DocPath,
        field: &str,
        element: DocWrite,
    ) -> StorageResult<Value> {
        crate::schema::validate_field(field)?;
        let element = Value::Object(element.resolve(self.now())?);
        let mut state = self.state.lock().unwrap();
        state.check_fault(Some(path.root_id()))?;

        let mut fields = state.doc_fields(path).cloned().unwrap_or_default();
        match fields.get_mut(field) {
            Some(Value::Array(items)) => items.push(element.clone()),
            _ => {
                fields.insert(field.to_string(), Value::Array(vec![element.clone()]));
            }
        }
        state.insert(path, fields);
        Ok(element)
    }

    async fn list_top_level_keys(&self, collection: &str) -> StorageResult<Vec<String>> {
        let state = self.state.lock().unwrap();
        let mut keys = BTreeSet::new();
        for (path, docs) in &state.collections {
            if path.root_collection() != collection {
                continue;
            }
            match path.root_id() {
                Some(id) => {
                    keys.insert(id.to_string());
                }
                None => keys.extend(docs.keys().cloned()),
            }
        }
        Ok(keys.into_iter().collect())
    }
}
