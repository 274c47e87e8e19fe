//! Structured observability hooks for memory and retention events.
//!
//! This module provides:
//! - User-scoped tracing spans via `UserSpan` RAII guard
//! - Emission functions for memory writes, evictions and sweep completion
//!
//! Events are emitted at `info!` level (`warn!` for failures). For JSON
//! output, set `RECALL_LOG_FORMAT=json`.

use tracing::{info, warn};

/// Span tagging everything inside it with a user id.
///
/// Attach to futures with `tracing::Instrument::instrument`.
pub fn user_span(user_id: &str) -> tracing::Span {
    tracing::info_span!("recall.user", user_id = %user_id)
}

/// RAII guard that enters a user-scoped tracing span.
///
/// # Example
///
/// ```ignore
/// let _span = UserSpan::enter("user-42");
/// // every event below carries user_id = "user-42"
/// ```
pub struct UserSpan {
    _span: tracing::span::EnteredSpan,
}

impl UserSpan {
    /// Create and enter a span tagged with the user id.
    pub fn enter(user_id: &str) -> Self {
        Self {
            _span: user_span(user_id).entered(),
        }
    }
}

/// Emit event: a memory entry was stored.
pub fn emit_memory_stored(user_id: &str, memory_id: &str, key_facts: usize) {
    info!(
        event = "memory.stored",
        user_id = %user_id,
        memory_id = %memory_id,
        key_facts = key_facts,
    );
}

/// Emit event: entries beyond the retention cap were deleted.
pub fn emit_memory_evicted(user_id: &str, removed: usize) {
    info!(event = "memory.evicted", user_id = %user_id, removed = removed);
}

/// Emit event: eviction failed for a user (warning level).
pub fn emit_evict_failed(user_id: &str, error: &dyn std::fmt::Display) {
    warn!(event = "memory.evict_failed", user_id = %user_id, error = %error);
}

/// Emit event: a retention sweep finished.
pub fn emit_sweep_finished(
    users_scanned: usize,
    entries_removed: usize,
    failed_users: usize,
    duration_ms: u64,
) {
    info!(
        event = "sweep.finished",
        users_scanned = users_scanned,
        entries_removed = entries_removed,
        failed_users = failed_users,
        duration_ms = duration_ms,
    );
}
