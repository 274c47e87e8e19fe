//! Storage trait definitions for Recall
//!
//! - `Clock`: the store's notion of "now" (server time)
//! - `DocumentStore`: hierarchical keyed document store with ordered range
//!   queries, atomic batch deletes, field-level merge-upsert and atomic
//!   array append
//!
//! All traits are async and backend-agnostic. In-memory fakes are provided
//! for testing via the `fakes` module.

use std::cmp::Ordering;

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use serde_json::Value;

use crate::error::StorageError;
use crate::schema::{validate_field, CollectionPath, DocPath, DocWrite, Document};

/// Result type for storage operations
pub type StorageResult<T> = std::result::Result<T, StorageError>;

// ---------------------------------------------------------------------------
// Clock
// ---------------------------------------------------------------------------

/// Time source used by a store to stamp documents.
pub trait Clock: Send + Sync {
    fn now(&self) -> DateTime<Utc>;
}

/// Wall-clock time.
#[derive(Debug, Clone, Copy, Default)]
pub struct SystemClock;

impl Clock for SystemClock {
    fn now(&self) -> DateTime<Utc> {
        Utc::now()
    }
}

// ---------------------------------------------------------------------------
// Query model
// ---------------------------------------------------------------------------

/// Sort direction for [`OrderBy`].
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Direction {
    Ascending,
    Descending,
}

/// Order a query by a single field.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct OrderBy {
    pub field: String,
    pub direction: Direction,
}

impl OrderBy {
    pub fn asc(field: impl Into<String>) -> Self {
        Self {
            field: field.into(),
            direction: Direction::Ascending,
        }
    }

    pub fn desc(field: impl Into<String>) -> Self {
        Self {
            field: field.into(),
            direction: Direction::Descending,
        }
    }
}

/// Comparison operator for [`Filter`].
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FilterOp {
    Eq,
    Gt,
    Gte,
    Lt,
    Lte,
}

impl FilterOp {
    /// SurrealQL spelling of the operator.
    pub fn as_sql(&self) -> &'static str {
        match self {
            FilterOp::Eq => "=",
            FilterOp::Gt => ">",
            FilterOp::Gte => ">=",
            FilterOp::Lt => "<",
            FilterOp::Lte => "<=",
        }
    }

    fn accepts(&self, ord: Ordering) -> bool {
        match self {
            FilterOp::Eq => ord == Ordering::Equal,
            FilterOp::Gt => ord == Ordering::Greater,
            FilterOp::Gte => ord != Ordering::Less,
            FilterOp::Lt => ord == Ordering::Less,
            FilterOp::Lte => ord != Ordering::Greater,
        }
    }
}

/// Single-field predicate.
#[derive(Debug, Clone, PartialEq)]
pub struct Filter {
    pub field: String,
    pub op: FilterOp,
    pub value: Value,
}

impl Filter {
    pub fn new(field: impl Into<String>, op: FilterOp, value: impl Into<Value>) -> Self {
        Self {
            field: field.into(),
            op,
            value: value.into(),
        }
    }

    pub fn gte(field: impl Into<String>, value: impl Into<Value>) -> Self {
        Self::new(field, FilterOp::Gte, value)
    }

    /// Evaluate the predicate against a field value.
    ///
    /// Missing fields and mismatched JSON types never match.
    pub fn matches(&self, candidate: Option<&Value>) -> bool {
        candidate
            .and_then(|v| compare_json(v, &self.value))
            .map(|ord| self.op.accepts(ord))
            .unwrap_or(false)
    }
}

/// Collection query: optional filter, ordering, offset and limit.
///
/// Offset and limit are applied after ordering. Documents lacking the order
/// field are excluded from ordered results.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct Query {
    pub filter: Option<Filter>,
    pub order_by: Option<OrderBy>,
    pub limit: Option<usize>,
    pub offset: Option<usize>,
}

impl Query {
    /// Every document in the collection, unordered.
    pub fn all() -> Self {
        Self::default()
    }

    pub fn filter(mut self, filter: Filter) -> Self {
        self.filter = Some(filter);
        self
    }

    pub fn order_by(mut self, order: OrderBy) -> Self {
        self.order_by = Some(order);
        self
    }

    pub fn limit(mut self, limit: usize) -> Self {
        self.limit = Some(limit);
        self
    }

    pub fn offset(mut self, offset: usize) -> Self {
        self.offset = Some(offset);
        self
    }

    /// Reject field names that cannot be embedded in a backend query.
    pub fn validate(&self) -> StorageResult<()> {
        if let Some(filter) = &self.filter {
            validate_field(&filter.field)?;
        }
        if let Some(order) = &self.order_by {
            validate_field(&order.field)?;
        }
        Ok(())
    }
}

/// Compare two JSON values of the same kind.
///
/// Numbers compare numerically, strings lexicographically, booleans
/// false < true. Any other combination is incomparable.
pub fn compare_json(a: &Value, b: &Value) -> Option<Ordering> {
    match (a, b) {
        (Value::Number(x), Value::Number(y)) => x.as_f64()?.partial_cmp(&y.as_f64()?),
        (Value::String(x), Value::String(y)) => Some(x.cmp(y)),
        (Value::Bool(x), Value::Bool(y)) => Some(x.cmp(y)),
        _ => None,
    }
}

// ---------------------------------------------------------------------------
// DocumentStore
// ---------------------------------------------------------------------------

/// Hierarchical keyed document store.
///
/// Guarantees:
/// - Fields registered as server timestamps are stamped with [`DocumentStore::now`].
/// - `merge_upsert` only touches the fields it names.
/// - `batch_delete` is all-or-nothing.
/// - `array_append` appends atomically; concurrent appends are never lost.
#[async_trait]
pub trait DocumentStore: Send + Sync {
    /// Current store time. Every stamped field uses this clock.
    fn now(&self) -> DateTime<Utc>;

    /// Create a document with a generated id.
    async fn create(&self, collection: &CollectionPath, write: DocWrite)
        -> StorageResult<Document>;

    /// Replace a document entirely, creating it if absent.
    async fn put(&self, path: &DocPath, write: DocWrite) -> StorageResult<Document>;

    /// Write only the named fields, creating the document if absent.
    async fn merge_upsert(&self, path: &DocPath, write: DocWrite) -> StorageResult<Document>;

    /// Fetch a document. `None` if absent.
    async fn get(&self, path: &DocPath) -> StorageResult<Option<Document>>;

    /// Run a query over one collection.
    async fn query(&self, collection: &CollectionPath, query: &Query)
        -> StorageResult<Vec<Document>>;

    /// Atomically delete a set of documents, returning how many existed.
    /// Missing documents are ignored; an empty batch is a no-op.
    async fn batch_delete(&self, paths: &[DocPath]) -> StorageResult<usize>;

    /// Atomically append one element to an array field, creating the
    /// document and the field if needed. Returns the stored element.
    async fn array_append(&self, path: &DocPath, field: &str, element: DocWrite)
        -> StorageResult<Value>;

    /// Ids of every document in a top-level collection, including ids that
    /// only own nested collections.
    async fn list_top_level_keys(&self, collection: &str) -> StorageResult<Vec<String>>;
}
