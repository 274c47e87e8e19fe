//! SurrealDB schema migrations and initialization
//!
//! Every logical collection (`users`, `users/{id}/memory_entries`, ...) is
//! stored in a single `documents` table keyed by `[collection, doc_id]`.

use crate::Result;
use surrealdb::engine::any::Any;
use surrealdb::Surreal;
use tracing::{debug, info};

/// Initialize all Recall tables in SurrealDB
///
/// This should be called once on first connection to set up the schema.
/// Safe to call multiple times (idempotent).
pub async fn init_schema(db: &Surreal<Any>) -> Result<()> {
    info!("Initializing Recall SurrealDB schema");

    init_documents_table(db).await?;

    info!("Recall schema initialization complete");
    Ok(())
}

/// Initialize `documents` table with indexes
///
/// Schema:
/// ```text
/// TABLE documents {
///   id:               [collection, doc_id]
///   collection:       STRING (indexed, e.g. "users/u1/memory_entries")
///   doc_id:           STRING
///   root_collection:  STRING (first path segment, e.g. "users")
///   root_id:          STRING (owning top-level document id)
///   fields:           OBJECT (document body)
/// }
/// ```
///
/// Constraints:
/// - `(collection, doc_id)` is unique by construction of the record id
/// - `(root_collection, root_id)` drives top-level key enumeration
async fn init_documents_table(db: &Surreal<Any>) -> Result<()> {
    debug!("Initializing documents table");

    let sql = r#"
        DEFINE TABLE IF NOT EXISTS documents SCHEMALESS;

        -- Collection scans (ordered queries, analytics)
        DEFINE INDEX IF NOT EXISTS idx_documents_collection ON TABLE documents COLUMNS collection;

        -- Known-user enumeration for the retention sweep
        DEFINE INDEX IF NOT EXISTS idx_documents_root ON TABLE documents COLUMNS root_collection, root_id;
    "#;

    db.query(sql).await?.check()?;
    info!("✓ documents table initialized");
    Ok(())
}
