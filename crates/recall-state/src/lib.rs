//! Recall-State: Document Store Backends for Recall
//!
//! This crate provides the persistence layer for Recall's conversational
//! memory. It models the store as a hierarchical keyed document database
//! (`users/{id}/memory_entries/{entry}`) and handles all I/O with SurrealDB.
//!
//! ## Layer 0 - Data/Persistence
//!
//! Focus: store-assigned timestamps, ordered range queries, atomic batch
//! deletes and field-level merge-upsert.
//!
//! ## Key Components
//!
//! - `DocumentStore`: backend-agnostic async trait
//! - `SurrealDocumentStore`: SurrealDB implementation (`mem://`, `surrealkv://`, cloud)
//! - `fakes::MemoryDocumentStore`: in-memory implementation with fault injection

mod error;
pub mod fakes;
mod handle;
pub mod migrations;
mod schema;
pub mod storage_traits;
pub mod surreal_store;

pub use error::{StateError, StorageError};
pub use handle::{CloudConfig, SurrealHandle};
pub use schema::{
    format_timestamp, parse_timestamp, CollectionPath, DocPath, DocWrite, Document,
};
pub use storage_traits::{
    compare_json, Clock, Direction, DocumentStore, Filter, FilterOp, OrderBy, Query,
    StorageResult, SystemClock,
};
pub use surreal_store::SurrealDocumentStore;

/// Result type for connection and schema operations
pub type Result<T> = std::result::Result<T, StateError>;
