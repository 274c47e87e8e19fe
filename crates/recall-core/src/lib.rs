//! Recall Core Library
//!
//! Per-user conversational memory: a capped memory log with
//! evict-after-append, key facts with merge-upsert, an append-only
//! preference history, windowed summaries, full-history analytics and the
//! daily retention sweep. [`MemoryService`] is the authenticated surface
//! over all of it.

pub mod config;
pub mod domain;
pub mod identity;
pub mod memory;
pub mod metrics;
pub mod obs;
pub mod schedule;
pub mod service;
pub mod telemetry;

pub use config::RecallConfig;
pub use domain::{
    Analytics, ErrorKind, KeyFact, MemoryEntry, NewMemory, PreferenceSnapshot, RecallError,
    Result, Summary,
};
pub use identity::{CallContext, UserId};
pub use memory::{
    AnalyticsEngine, EvictionOutcome, KeyFactTable, MemoryLog, PreferenceLog, RetentionSweeper,
    SummaryEngine, SweepReport, DEFAULT_RECENT_LIMIT, DEFAULT_SUMMARY_DAYS, MAX_MEMORY_ENTRIES,
};
pub use schedule::SweepTime;
pub use service::{
    AddPreferencesRequest, AnalyticsResponse, KeyFactsResponse, MemoryService,
    PreferenceHistoryResponse, RecentMemoriesRequest, RecentMemoriesResponse, SetKeyFactRequest,
    SetKeyFactResponse, StoreMemoryRequest, StoreMemoryResponse, SuccessResponse,
    SummaryRequest, SummaryResponse,
};

pub use recall_state::{DocumentStore, SurrealDocumentStore};

pub use metrics::METRICS;
pub use obs::{
    emit_evict_failed, emit_memory_evicted, emit_memory_stored, emit_sweep_finished, user_span,
    UserSpan,
};
pub use telemetry::init_tracing;

/// Recall version
pub const VERSION: &str = env!("CARGO_PKG_VERSION");
