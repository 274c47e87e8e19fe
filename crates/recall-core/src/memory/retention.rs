//! Daily retention sweep across every known user.
//!
//! The sweep re-applies [`MemoryLog::evict`] per user so that caps left
//! unenforced by failed or racing appends still converge. One user's
//! failure never stops the others.

use std::sync::Arc;
use std::time::Instant;

use futures::stream::{self, StreamExt};
use recall_state::DocumentStore;
use serde::{Deserialize, Serialize};
use tracing::{info, instrument, warn, Instrument};

use super::log::{EvictionOutcome, MemoryLog};
use crate::domain::Result;
use crate::identity::UserId;
use crate::metrics::METRICS;
use crate::obs;

/// Result of a sweep pass.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct SweepReport {
    pub users_scanned: usize,
    /// Users that had at least one entry removed.
    pub users_trimmed: usize,
    pub entries_removed: usize,
    /// Users whose eviction failed, sorted.
    pub failed_users: Vec<String>,
    pub duration_ms: u64,
}

#[derive(Clone)]
pub struct RetentionSweeper {
    store: Arc<dyn DocumentStore>,
    log: MemoryLog,
    concurrency: usize,
}

impl RetentionSweeper {
    /// Sequential sweeper.
    pub fn new(store: Arc<dyn DocumentStore>) -> Self {
        Self {
            log: MemoryLog::new(store.clone()),
            store,
            concurrency: 1,
        }
    }

    /// Evict up to `n` users at a time. Zero is treated as one.
    pub fn with_concurrency(mut self, n: usize) -> Self {
        self.concurrency = n.max(1);
        self
    }

    /// Evict for every known user, continuing past per-user failures.
    ///
    /// Only a failure to enumerate users is returned as an error.
    #[instrument(skip(self), fields(concurrency = self.concurrency))]
    pub async fn sweep_all(&self) -> Result<SweepReport> {
        let started = Instant::now();
        let user_ids = self.store.list_top_level_keys(super::USERS).await?;
        info!(users = user_ids.len(), "Starting retention sweep");

        let outcomes: Vec<(String, EvictionOutcome)> = stream::iter(user_ids)
            .map(|raw| async move {
                let outcome = match UserId::parse(raw.as_str()) {
                    Ok(user) => {
                        self.log
                            .evict(&user)
                            .instrument(obs::user_span(user.as_str()))
                            .await
                    }
                    Err(e) => {
                        warn!(user_id = %raw, error = %e, "Skipping unusable user id");
                        EvictionOutcome::Failed
                    }
                };
                (raw, outcome)
            })
            .buffer_unordered(self.concurrency)
            .collect()
            .await;

        let mut report = SweepReport {
            users_scanned: outcomes.len(),
            ..SweepReport::default()
        };
        for (user_id, outcome) in outcomes {
            match outcome {
                EvictionOutcome::Evicted(0) => {}
                EvictionOutcome::Evicted(n) => {
                    report.users_trimmed += 1;
                    report.entries_removed += n;
                }
                EvictionOutcome::Failed => report.failed_users.push(user_id),
            }
        }
        report.failed_users.sort();
        report.duration_ms = started.elapsed().as_millis() as u64;

        METRICS.inc_sweeps();
        obs::emit_sweep_finished(
            report.users_scanned,
            report.entries_removed,
            report.failed_users.len(),
            report.duration_ms,
        );
        Ok(report)
    }
}
