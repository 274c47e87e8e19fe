//! recalld - runs the retention sweep once a day at a fixed UTC time.

use std::sync::Arc;
use std::time::Duration as StdDuration;

use anyhow::{Context, Result};
use chrono::{DateTime, Utc};
use clap::Parser;
use recall_core::{RecallConfig, RetentionSweeper, SweepTime, METRICS};
use recall_state::{DocumentStore, SurrealDocumentStore};
use tracing::{error, info, Level};

#[derive(Parser)]
#[command(name = "recalld")]
#[command(author = "Stevedores Org")]
#[command(version = env!("CARGO_PKG_VERSION"))]
#[command(about = "Recall retention daemon", long_about = None)]
struct Args {
    /// Enable verbose output
    #[arg(short, long)]
    verbose: bool,

    /// Emit JSON-formatted log lines
    #[arg(long)]
    json: bool,

    /// Run a single sweep and exit
    #[arg(long)]
    once: bool,

    /// Daily sweep time, HH:MM UTC (overrides RECALL_SWEEP_AT)
    #[arg(long)]
    at: Option<SweepTime>,

    /// Users evicted concurrently (overrides RECALL_SWEEP_CONCURRENCY)
    #[arg(short, long)]
    concurrency: Option<usize>,
}

/// How long to sleep from `now` until the next firing of `at`.
fn until_next(at: SweepTime, now: DateTime<Utc>) -> StdDuration {
    (at.next_after(now) - now)
        .to_std()
        .unwrap_or(StdDuration::ZERO)
}

/// One sweep; a failure to enumerate users is logged, not fatal.
async fn run_sweep(sweeper: &RetentionSweeper) {
    match sweeper.sweep_all().await {
        Ok(report) => info!(
            users_scanned = report.users_scanned,
            users_trimmed = report.users_trimmed,
            entries_removed = report.entries_removed,
            failed_users = report.failed_users.len(),
            "Daily memory cleanup completed"
        ),
        Err(e) => error!(error = %e, "Error in daily cleanup"),
    }
    METRICS.flush();
}

#[tokio::main]
async fn main() -> Result<()> {
    dotenvy::dotenv().ok();
    let args = Args::parse();
    let config = RecallConfig::from_env().context("Invalid Recall configuration")?;

    let level = if args.verbose {
        Level::DEBUG
    } else {
        Level::INFO
    };
    recall_core::init_tracing(args.json || config.json_logs, level);

    let store: Arc<dyn DocumentStore> = Arc::new(
        SurrealDocumentStore::from_env()
            .await
            .context("Failed to connect to Recall database")?,
    );
    let sweeper = RetentionSweeper::new(store)
        .with_concurrency(args.concurrency.unwrap_or(config.sweep_concurrency));

    if args.once {
        run_sweep(&sweeper).await;
        return Ok(());
    }

    let at = args.at.unwrap_or(config.sweep_at);
    info!(sweep_at = %at, "recalld started");

    loop {
        let wait = until_next(at, Utc::now());
        info!(seconds = wait.as_secs(), "Next sweep scheduled");

        tokio::select! {
            _ = tokio::time::sleep(wait) => run_sweep(&sweeper).await,
            _ = tokio::signal::ctrl_c() => {
                info!("Shutdown requested");
                break;
            }
        }
    }

    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone;
    use recall_core::{MemoryLog, NewMemory, UserId, MAX_MEMORY_ENTRIES};
    use recall_state::fakes::MemoryDocumentStore;

    #[test]
    fn test_until_next() {
        let at = SweepTime::new(2, 0).unwrap();
        let now = Utc.with_ymd_and_hms(2026, 10, 18, 1, 30, 0).unwrap();
        assert_eq!(until_next(at, now), StdDuration::from_secs(30 * 60));

        let now = Utc.with_ymd_and_hms(2026, 10, 18, 2, 0, 0).unwrap();
        assert_eq!(until_next(at, now), StdDuration::from_secs(24 * 3600));
    }

    #[test]
    fn test_args_parse_sweep_time() {
        let args = Args::try_parse_from(["recalld", "--once", "--at", "03:15"]).unwrap();
        assert!(args.once);
        assert_eq!(args.at, Some(SweepTime::new(3, 15).unwrap()));
        assert!(Args::try_parse_from(["recalld", "--at", "3pm"]).is_err());
    }

    #[tokio::test]
    async fn test_run_sweep_trims_users() {
        let store = Arc::new(MemoryDocumentStore::new());
        let log = MemoryLog::new(store.clone());
        let user = UserId::parse("u1").unwrap();
        for i in 0..(MAX_MEMORY_ENTRIES + 3) {
            log.append(&user, NewMemory::new(format!("m{i}"), "r"))
                .await
                .unwrap();
        }

        run_sweep(&RetentionSweeper::new(store.clone())).await;
        assert_eq!(
            log.recent(&user, Some(100)).await.unwrap().len(),
            MAX_MEMORY_ENTRIES
        );
    }
}
