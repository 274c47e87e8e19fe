//! Recall CLI - per-user conversational memory
//!
//! The `recall` command exposes every memory operation for one user, plus a
//! manual retention sweep across all users. Results are printed as JSON.
//!
//! ## Commands
//!
//! - `store`: Record one exchange (evicts beyond the retention cap)
//! - `recent`: Show the most recent memories
//! - `fact`: Set, get or list key facts
//! - `prefs`: Append learned preferences or show their history
//! - `summary`: Digest of the last N days
//! - `analytics`: Full-history aggregates
//! - `sweep`: Run the retention sweep now

use std::sync::Arc;

use anyhow::{Context, Result};
use clap::{Parser, Subcommand};
use recall_core::{
    AddPreferencesRequest, CallContext, MemoryService, RecallConfig,
    RecentMemoriesRequest, RetentionSweeper, SetKeyFactRequest, StoreMemoryRequest,
    SummaryRequest, UserId, UserSpan, METRICS,
};
use recall_state::{DocumentStore, SurrealDocumentStore};
use serde::Serialize;
use serde_json::Value;
use tracing::{info, Level};

#[derive(Parser)]
#[command(name = "recall")]
#[command(author = "Stevedores Org")]
#[command(version = env!("CARGO_PKG_VERSION"))]
#[command(about = "Per-user conversational memory with daily retention", long_about = None)]
struct Cli {
    /// Enable verbose output
    #[arg(short, long, global = true)]
    verbose: bool,

    /// Emit JSON-formatted log lines
    #[arg(long, global = true)]
    json: bool,

    /// Verified user id the command acts for
    #[arg(short, long, global = true, env = "RECALL_USER")]
    user: Option<String>,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Record one conversational exchange
    Store {
        /// What the user said
        #[arg(short, long)]
        message: String,

        /// What the assistant answered
        #[arg(short, long)]
        response: String,

        /// Topic tag (repeatable)
        #[arg(short = 'f', long = "fact")]
        facts: Vec<String>,
    },

    /// Show the most recent memories, newest first
    Recent {
        /// The message being answered (required, not used for ranking)
        #[arg(short, long)]
        message: String,

        /// Maximum number of memories (default: 10)
        #[arg(short, long)]
        limit: Option<usize>,
    },

    /// Manage key facts
    Fact {
        #[command(subcommand)]
        action: FactAction,
    },

    /// Manage learned preferences
    Prefs {
        #[command(subcommand)]
        action: PrefsAction,
    },

    /// Summarize recent conversations
    Summary {
        /// Window in days (default: 7)
        #[arg(short, long)]
        days: Option<u32>,
    },

    /// Show full-history analytics
    Analytics,

    /// Trim every user's memory log to the retention cap
    Sweep {
        /// Users evicted concurrently (default: RECALL_SWEEP_CONCURRENCY or 1)
        #[arg(short, long)]
        concurrency: Option<usize>,
    },
}

#[derive(Subcommand)]
enum FactAction {
    /// Create or replace a fact
    Set {
        /// Fact type (document key)
        fact_type: String,

        /// Value: JSON if it parses, otherwise a plain string
        value: String,
    },

    /// Show one fact with its update time
    Get {
        /// Fact type
        fact_type: String,
    },

    /// List every fact
    List,
}

#[derive(Subcommand)]
enum PrefsAction {
    /// Append a preferences snapshot
    Add {
        /// JSON object, e.g. '{"tone":"casual"}'
        preferences: String,
    },

    /// Show every snapshot in order
    History,
}

#[tokio::main]
async fn main() -> Result<()> {
    dotenvy::dotenv().ok();
    let cli = Cli::parse();
    let config = RecallConfig::from_env().context("Invalid Recall configuration")?;

    // Setup logging
    let level = if cli.verbose {
        Level::DEBUG
    } else {
        Level::INFO
    };
    recall_core::init_tracing(cli.json || config.json_logs, level);

    // Initialize database connection
    let store: Arc<dyn DocumentStore> = Arc::new(
        SurrealDocumentStore::from_env()
            .await
            .context("Failed to connect to Recall database")?,
    );

    let ctx = match cli.user.as_deref() {
        Some(raw) => CallContext::authenticated(UserId::parse(raw).context("Invalid --user")?),
        None => CallContext::anonymous(),
    };
    let _span = ctx.user().map(|u| UserSpan::enter(u.as_str()));
    let service = MemoryService::new(store.clone());

    match cli.command {
        Commands::Store {
            message,
            response,
            facts,
        } => cmd_store(&service, &ctx, message, response, facts).await,
        Commands::Recent { message, limit } => cmd_recent(&service, &ctx, message, limit).await,
        Commands::Fact { action } => match action {
            FactAction::Set { fact_type, value } => {
                cmd_fact_set(&service, &ctx, fact_type, &value).await
            }
            FactAction::Get { fact_type } => cmd_fact_get(&service, &ctx, &fact_type).await,
            FactAction::List => print_json(&service.get_all_key_facts(&ctx).await?),
        },
        Commands::Prefs { action } => match action {
            PrefsAction::Add { preferences } => cmd_prefs_add(&service, &ctx, &preferences).await,
            PrefsAction::History => print_json(&service.get_preference_history(&ctx).await?),
        },
        Commands::Summary { days } => {
            print_json(&service.get_summary(&ctx, SummaryRequest { days }).await?)
        }
        Commands::Analytics => print_json(&service.get_analytics(&ctx).await?),
        Commands::Sweep { concurrency } => {
            cmd_sweep(store, concurrency.unwrap_or(config.sweep_concurrency)).await
        }
    }
}

fn print_json<T: Serialize>(value: &T) -> Result<()> {
    println!("{}", serde_json::to_string_pretty(value)?);
    Ok(())
}

/// Values that parse as JSON are kept as JSON; anything else is a string.
fn parse_value(raw: &str) -> Value {
    serde_json::from_str(raw).unwrap_or_else(|_| Value::String(raw.to_string()))
}

async fn cmd_store(
    service: &MemoryService,
    ctx: &CallContext,
    message: String,
    response: String,
    facts: Vec<String>,
) -> Result<()> {
    let stored = service
        .store_memory(
            ctx,
            StoreMemoryRequest {
                message,
                response,
                key_facts: Some(facts),
            },
        )
        .await?;
    info!(memory_id = %stored.memory_id, "Memory stored");
    print_json(&stored)
}

async fn cmd_recent(
    service: &MemoryService,
    ctx: &CallContext,
    message: String,
    limit: Option<usize>,
) -> Result<()> {
    let recent = service
        .get_recent_memories(
            ctx,
            RecentMemoriesRequest {
                current_message: message,
                limit,
            },
        )
        .await?;
    print_json(&recent)
}

async fn cmd_fact_set(
    service: &MemoryService,
    ctx: &CallContext,
    fact_type: String,
    value: &str,
) -> Result<()> {
    let resp = service
        .set_key_fact(
            ctx,
            SetKeyFactRequest {
                fact_type,
                fact_value: parse_value(value),
            },
        )
        .await?;
    print_json(&resp)
}

async fn cmd_fact_get(service: &MemoryService, ctx: &CallContext, fact_type: &str) -> Result<()> {
    let user = ctx.require_user()?;
    match service.get_key_fact(ctx, fact_type).await? {
        Some(fact) => print_json(&fact),
        None => {
            println!("No fact '{}' for {}", fact_type, user);
            Ok(())
        }
    }
}

async fn cmd_prefs_add(service: &MemoryService, ctx: &CallContext, raw: &str) -> Result<()> {
    let preferences: Value =
        serde_json::from_str(raw).context("Preferences must be a JSON object")?;
    let resp = service
        .add_preferences(ctx, AddPreferencesRequest { preferences })
        .await?;
    print_json(&resp)
}

async fn cmd_sweep(store: Arc<dyn DocumentStore>, concurrency: usize) -> Result<()> {
    let report = RetentionSweeper::new(store)
        .with_concurrency(concurrency)
        .sweep_all()
        .await
        .context("Retention sweep failed")?;
    METRICS.flush();
    print_json(&report)
}
