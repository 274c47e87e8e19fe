//! Recall domain types: memory entries, key facts, preference snapshots,
//! digests and the error taxonomy.

pub mod error;
pub mod fact;
pub mod insight;
pub mod memory;
pub mod preference;

pub use error::{ErrorKind, RecallError, Result};
pub use fact::KeyFact;
pub use insight::{Analytics, Summary};
pub use memory::{MemoryEntry, NewMemory};
pub use preference::PreferenceSnapshot;
