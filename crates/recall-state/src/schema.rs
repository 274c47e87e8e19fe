//! Document model shared by every store backend
//!
//! - `CollectionPath` / `DocPath`: slash-separated hierarchical addresses
//!   (`users/u1/memory_entries/<id>`)
//! - `Document`: a stored document and its fields
//! - `DocWrite`: a set of field assignments, some of which are stamped
//!   with the store clock at write time
//! - timestamp helpers: fixed-width RFC 3339 strings so that lexicographic
//!   order equals chronological order in every backend

use chrono::{DateTime, SecondsFormat, Utc};
use serde_json::{Map, Value};

use crate::error::StorageError;
use crate::storage_traits::StorageResult;

/// Format a timestamp the way every backend stores it.
///
/// Always UTC with microsecond precision, e.g. `2026-10-18T02:00:00.000000Z`.
pub fn format_timestamp(ts: DateTime<Utc>) -> String {
    ts.to_rfc3339_opts(SecondsFormat::Micros, true)
}

/// Parse a stored timestamp. Returns `None` for anything unparseable.
pub fn parse_timestamp(raw: &str) -> Option<DateTime<Utc>> {
    DateTime::parse_from_rfc3339(raw)
        .ok()
        .map(|ts| ts.with_timezone(&Utc))
}

/// Field names must be plain identifiers so they can be embedded in queries.
pub(crate) fn validate_field(field: &str) -> StorageResult<()> {
    if field.is_empty()
        || !field
            .chars()
            .all(|c| c.is_ascii_alphanumeric() || c == '_')
    {
        return Err(StorageError::InvalidField {
            field: field.to_string(),
        });
    }
    Ok(())
}

fn validate_segment(path: &str, segment: &str) -> StorageResult<()> {
    if segment.is_empty() {
        return Err(StorageError::InvalidPath {
            path: path.to_string(),
            reason: "empty segment".to_string(),
        });
    }
    if segment.contains('/') {
        return Err(StorageError::InvalidPath {
            path: path.to_string(),
            reason: format!("segment '{segment}' contains '/'"),
        });
    }
    Ok(())
}

/// Address of a collection.
///
/// Always has an odd number of segments: `users` or `users/u1/key_facts`.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct CollectionPath {
    segments: Vec<String>,
}

impl CollectionPath {
    /// A top-level collection such as `users`.
    pub fn root(name: &str) -> StorageResult<Self> {
        validate_segment(name, name)?;
        Ok(Self {
            segments: vec![name.to_string()],
        })
    }

    /// Parse a slash-separated collection path.
    pub fn parse(raw: &str) -> StorageResult<Self> {
        let segments: Vec<String> = raw.split('/').map(str::to_string).collect();
        for segment in &segments {
            validate_segment(raw, segment)?;
        }
        if segments.len() % 2 == 0 {
            return Err(StorageError::InvalidPath {
                path: raw.to_string(),
                reason: "collection paths have an odd number of segments".to_string(),
            });
        }
        Ok(Self { segments })
    }

    /// Address a document inside this collection.
    pub fn doc(&self, id: &str) -> StorageResult<DocPath> {
        validate_segment(id, id)?;
        Ok(DocPath {
            collection: self.clone(),
            id: id.to_string(),
        })
    }

    /// Last segment (the collection's own name).
    pub fn name(&self) -> &str {
        self.segments.last().map(String::as_str).unwrap_or_default()
    }

    /// Name of the top-level collection this path lives under.
    pub fn root_collection(&self) -> &str {
        &self.segments[0]
    }

    /// Id of the top-level document owning this collection, if nested.
    pub fn root_id(&self) -> Option<&str> {
        self.segments.get(1).map(String::as_str)
    }
}

impl std::fmt::Display for CollectionPath {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.segments.join("/"))
    }
}

/// Address of a single document.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct DocPath {
    collection: CollectionPath,
    id: String,
}

impl DocPath {
    /// Parse a slash-separated document path (even segment count).
    pub fn parse(raw: &str) -> StorageResult<Self> {
        let (parent, id) = raw.rsplit_once('/').ok_or_else(|| StorageError::InvalidPath {
            path: raw.to_string(),
            reason: "document paths have an even number of segments".to_string(),
        })?;
        CollectionPath::parse(parent)?.doc(id)
    }

    /// The document id (last segment).
    pub fn id(&self) -> &str {
        &self.id
    }

    /// The collection containing this document.
    pub fn parent(&self) -> &CollectionPath {
        &self.collection
    }

    /// A sub-collection nested under this document.
    pub fn collection(&self, name: &str) -> StorageResult<CollectionPath> {
        validate_segment(name, name)?;
        let mut segments = self.collection.segments.clone();
        segments.push(self.id.clone());
        segments.push(name.to_string());
        Ok(CollectionPath { segments })
    }

    /// Name of the top-level collection this document lives under.
    pub fn root_collection(&self) -> &str {
        self.collection.root_collection()
    }

    /// Id of the top-level document that owns this document.
    ///
    /// For a top-level document this is its own id.
    pub fn root_id(&self) -> &str {
        self.collection.root_id().unwrap_or(&self.id)
    }
}

impl std::fmt::Display for DocPath {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}/{}", self.collection, self.id)
    }
}

/// A stored document.
#[derive(Debug, Clone, PartialEq)]
pub struct Document {
    pub path: DocPath,
    pub fields: Map<String, Value>,
}

impl Document {
    pub fn id(&self) -> &str {
        self.path.id()
    }

    pub fn get(&self, field: &str) -> Option<&Value> {
        self.fields.get(field)
    }

    pub fn get_str(&self, field: &str) -> Option<&str> {
        self.fields.get(field).and_then(Value::as_str)
    }

    /// Read a store-stamped timestamp field.
    pub fn get_timestamp(&self, field: &str) -> Option<DateTime<Utc>> {
        self.get_str(field).and_then(parse_timestamp)
    }
}

/// Field assignments for a write.
///
/// Fields registered with [`DocWrite::server_timestamp`] are filled in by the
/// store with its own clock, never by the caller.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct DocWrite {
    fields: Map<String, Value>,
    stamped: Vec<String>,
}

impl DocWrite {
    pub fn new() -> Self {
        Self::default()
    }

    /// Assign a plain value.
    pub fn set(mut self, field: impl Into<String>, value: impl Into<Value>) -> Self {
        self.fields.insert(field.into(), value.into());
        self
    }

    /// Ask the store to stamp `field` with its current time.
    pub fn server_timestamp(mut self, field: impl Into<String>) -> Self {
        let field = field.into();
        self.fields.remove(&field);
        self.stamped.push(field);
        self
    }

    /// Validate field names and substitute stamped fields with `now`.
    pub fn resolve(self, now: DateTime<Utc>) -> StorageResult<Map<String, Value>> {
        let mut fields = self.fields;
        for field in fields.keys() {
            validate_field(field)?;
        }
        let stamp = format_timestamp(now);
        for field in self.stamped {
            validate_field(&field)?;
            fields.insert(field, Value::String(stamp.clone()));
        }
        Ok(fields)
    }
}
