//! ARIA - keyword routing and memory retention CLI
//!
//! The `aria` command exposes the router and the retention engine.
//!
//! ## Commands
//!
//! - `dispatch`: Route a message to a handler by keyword; memory commands run
//!   against the store
//! - `routes`: Show the routing table and handler status
//! - `store`: Classify, score and store a memory
//! - `retrieve`: List memories of a category by relevance
//! - `purge`: Deactivate stale low-importance memories
//! - `stats`: Per-category memory statistics

use anyhow::{Context, Result};
use clap::{Parser, Subcommand};
use serde::Serialize;
use serde_json::Value;
use std::future::Future;
use std::path::PathBuf;
use std::sync::Arc;
use tracing::{info, warn, Level};

use aria_core::memory::{
    MemoryResponse, PurgeRequest, RecordMetadata, RetentionEngine, RetrievalQuery,
    MEMORY_MANAGER_HANDLER,
};
use aria_core::metrics::METRICS;
use aria_core::obs::RequestSpan;
use aria_core::{AriaConfig, ChatCompletionsClassifier, Importance, RouteDecision, Router};
use aria_state::{MemoryCategory, StoreLocation, SurrealMemoryStore};

#[derive(Parser)]
#[command(name = "aria")]
#[command(version = env!("CARGO_PKG_VERSION"))]
#[command(about = "ARIA keyword routing and memory retention", long_about = None)]
struct Cli {
    /// Enable verbose output
    #[arg(short, long, global = true)]
    verbose: bool,

    /// Emit JSON-formatted log lines
    #[arg(long, global = true)]
    json: bool,

    /// Configuration file (TOML); built-in defaults when omitted
    #[arg(short, long, global = true, env = "ARIA_CONFIG")]
    config: Option<PathBuf>,

    /// Store location: `memory`, a directory, or a SurrealDB URL
    #[arg(long, global = true)]
    store: Option<String>,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Route a message to the handler owning the first matching keyword
    ///
    /// Messages for the memory manager (store / retrieve / statistics) are
    /// then executed against the store.
    Dispatch {
        /// Message text
        message: String,
    },

    /// Show the routing table and handler status
    Routes,

    /// Classify, score and store a memory
    Store {
        /// Memory content
        content: String,

        /// Mission this memory belongs to
        #[arg(long)]
        mission_id: Option<String>,

        /// Priority label (high, medium, low)
        #[arg(long)]
        priority: Option<String>,

        /// Where the memory came from (e.g. user_explicit)
        #[arg(long)]
        source: Option<String>,

        /// Agent recording the memory
        #[arg(long)]
        agent: Option<String>,
    },

    /// List active memories of a category, most relevant first
    Retrieve {
        /// Category (short_term, long_term, mission_specific, reflective)
        #[arg(value_parser = parse_category)]
        category: MemoryCategory,

        /// Maximum number of records
        #[arg(short, long, default_value = "100")]
        limit: usize,

        /// Minimum importance (1-10)
        #[arg(long, default_value = "1")]
        min_importance: u8,

        /// Only memories of this mission
        #[arg(long)]
        mission_id: Option<String>,

        /// Only memories recorded by this agent
        #[arg(long)]
        agent: Option<String>,
    },

    /// Deactivate memories below an importance that are old or expired
    Purge {
        /// Category to purge
        #[arg(value_parser = parse_category)]
        category: MemoryCategory,

        /// Records with importance strictly below this value are candidates
        #[arg(long)]
        min_importance: u8,

        /// Also match records created more than this many days ago
        #[arg(long)]
        older_than_days: Option<u32>,

        /// Report what would be purged without changing anything
        #[arg(long)]
        dry_run: bool,
    },

    /// Per-category memory statistics
    Stats,
}

fn parse_category(raw: &str) -> std::result::Result<MemoryCategory, String> {
    raw.parse::<MemoryCategory>().map_err(|e| e.to_string())
}

#[tokio::main]
async fn main() -> Result<()> {
    dotenvy::dotenv().ok();

    let cli = Cli::parse();

    let level = if cli.verbose {
        Level::DEBUG
    } else {
        Level::INFO
    };
    aria_core::init_tracing(cli.json, level);

    let config = AriaConfig::load(cli.config.as_deref()).context("Failed to load configuration")?;

    let output = match cli.command {
        Commands::Dispatch { message } => {
            let router = config.router().context("Failed to build router")?;
            cmd_dispatch(&router, &message, || async {
                build_engine(&config, &store_location(cli.store.as_deref())).await
            })
            .await?
        }
        Commands::Routes => {
            let router = config.router().context("Failed to build router")?;
            cmd_routes(&router)?
        }
        command => {
            let engine = build_engine(&config, &store_location(cli.store.as_deref())).await?;
            run_memory_command(&engine, command).await?
        }
    };

    println!("{}", serde_json::to_string_pretty(&output)?);
    METRICS.flush();
    Ok(())
}

fn store_location(store: Option<&str>) -> StoreLocation {
    store
        .map(StoreLocation::parse)
        .unwrap_or_else(StoreLocation::from_env)
}

/// Connect the store and wire up the engine, with the classifier when configured.
async fn build_engine(config: &AriaConfig, location: &StoreLocation) -> Result<RetentionEngine> {
    info!(store = %location.describe(), "opening memory store");
    let store = SurrealMemoryStore::connect(location)
        .await
        .with_context(|| format!("Failed to open memory store at {}", location.describe()))?;

    let mut engine = RetentionEngine::new(Arc::new(store), config.policies);
    if let Some(classifier_config) = &config.classifier {
        match ChatCompletionsClassifier::from_config(classifier_config) {
            Ok(classifier) => engine = engine.with_classifier(Arc::new(classifier)),
            Err(e) => warn!(error = %e, "classifier disabled"),
        }
    }
    Ok(engine)
}

async fn run_memory_command(engine: &RetentionEngine, command: Commands) -> Result<Value> {
    match command {
        Commands::Store {
            content,
            mission_id,
            priority,
            source,
            agent,
        } => {
            let metadata = RecordMetadata {
                mission_id,
                priority,
                source,
                agent_name: agent,
                ..RecordMetadata::default()
            };
            cmd_store(engine, &content, metadata).await
        }
        Commands::Retrieve {
            category,
            limit,
            min_importance,
            mission_id,
            agent,
        } => {
            let mut query = RetrievalQuery::new(category)
                .with_limit(limit)
                .with_min_importance(Importance::clamped(i64::from(min_importance)));
            if let Some(mission_id) = mission_id.as_deref() {
                query = query.with_mission(mission_id);
            }
            if let Some(agent) = agent.as_deref() {
                query = query.with_agent(agent);
            }
            cmd_retrieve(engine, &query).await
        }
        Commands::Purge {
            category,
            min_importance,
            older_than_days,
            dry_run,
        } => {
            let mut request = PurgeRequest::new(category, min_importance);
            if let Some(days) = older_than_days {
                request = request.older_than(chrono::Utc::now() - chrono::Duration::days(days.into()));
            }
            if dry_run {
                request = request.dry_run();
            }
            cmd_purge(engine, &request).await
        }
        Commands::Stats => cmd_stats(engine).await,
        Commands::Dispatch { .. } | Commands::Routes => {
            anyhow::bail!("routing commands do not use the memory store")
        }
    }
}

fn to_json<T: Serialize>(value: &T) -> Result<Value> {
    serde_json::to_value(value).context("Failed to serialize output")
}

#[derive(Serialize)]
struct DispatchOutput {
    #[serde(flatten)]
    decision: RouteDecision,
    /// Present when the memory manager handled the message.
    #[serde(skip_serializing_if = "Option::is_none")]
    memory: Option<MemoryResponse>,
}

/// Route a message and report the decision. Messages for the memory manager
/// are then run against the store, which is only opened in that case.
async fn cmd_dispatch<F, Fut>(router: &Router, message: &str, open_engine: F) -> Result<Value>
where
    F: FnOnce() -> Fut,
    Fut: Future<Output = Result<RetentionEngine>>,
{
    let _span = RequestSpan::enter("dispatch");
    let decision = router.route(message);
    if !decision.available {
        warn!(handler = %decision.target, "handler is registered but inactive");
    }

    let memory = if decision.available && decision.target.as_str() == MEMORY_MANAGER_HANDLER {
        let engine = open_engine().await?;
        Some(engine.handle(message, RecordMetadata::new()).await)
    } else {
        None
    };
    to_json(&DispatchOutput { decision, memory })
}

/// Show the routing table
fn cmd_routes(router: &Router) -> Result<Value> {
    let _span = RequestSpan::enter("routes");
    to_json(&router.status())
}

/// Analyze and store a memory; rejections and store failures are reported, not raised
async fn cmd_store(engine: &RetentionEngine, content: &str, metadata: RecordMetadata) -> Result<Value> {
    let _span = RequestSpan::enter("store");
    let outcome = engine.analyze_and_store(content, metadata).await;
    to_json(&outcome)
}

async fn cmd_retrieve(engine: &RetentionEngine, query: &RetrievalQuery) -> Result<Value> {
    let _span = RequestSpan::enter("retrieve");
    let records = engine
        .retrieve(query)
        .await
        .context("Failed to retrieve memories")?;
    to_json(&records)
}

async fn cmd_purge(engine: &RetentionEngine, request: &PurgeRequest) -> Result<Value> {
    let _span = RequestSpan::enter("purge");
    let result = engine
        .purge(request)
        .await
        .context("Failed to purge memories")?;
    to_json(&result)
}

async fn cmd_stats(engine: &RetentionEngine) -> Result<Value> {
    let _span = RequestSpan::enter("stats");
    let stats = engine
        .statistics()
        .await
        .context("Failed to compute statistics")?;
    to_json(&stats)
}
