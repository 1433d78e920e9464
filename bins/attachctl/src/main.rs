//! Syncgate attachment CLI
//!
//! Usage:
//!   attachctl put <doc> <rev> <file.json> [--parent <rev>]  - Ingest and store a revision
//!   attachctl get <doc> <rev> [--since <revpos>] [--follows] - Load a revision's attachments

use std::collections::BTreeMap;
use std::path::PathBuf;
use std::sync::Arc;

use anyhow::{Context, anyhow};
use clap::Parser;
use tracing::info;
use tracing_subscriber::{EnvFilter, fmt, layer::SubscriberExt, util::SubscriberInitExt};

use syncgate_core::attachment::{AttachmentService, find_attachments};
use syncgate_core::delta::{DeltaResolver, NoDelta};
use syncgate_core::revision::{RevisionTree, generation_of};
use syncgate_core::storage::{StorageConfig, StorageService};
use syncgate_shared::{AppConfig, LogSettings};

/// Store and inspect document attachments.
#[derive(Parser, Debug)]
#[command(name = "attachctl", version, about)]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(clap::Subcommand, Debug)]
enum Commands {
    /// Ingest a revision body and store it.
    Put(PutArgs),
    /// Load the attachments of a stored revision.
    Get(GetArgs),
}

#[derive(clap::Args, Debug)]
struct PutArgs {
    /// Document ID.
    doc: String,
    /// Revision ID, `{generation}-{suffix}`.
    rev: String,
    /// JSON file holding the revision body.
    file: PathBuf,
    /// Parent revision that stubs are resolved against.
    #[arg(long)]
    parent: Option<String>,
}

#[derive(clap::Args, Debug)]
struct GetArgs {
    /// Document ID.
    doc: String,
    /// Revision ID.
    rev: String,
    /// Only attachments changed at or after this generation.
    #[arg(long, default_value_t = 0)]
    since: u64,
    /// Describe attachments as separate MIME parts.
    #[arg(long)]
    follows: bool,
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    // Load .env file if present
    dotenvy::dotenv().ok();

    let config = AppConfig::load().context("failed to load configuration")?;
    init_tracing(&config.log);

    let cli = Cli::parse();

    let storage = Arc::new(StorageService::from_config(StorageConfig::from_settings(
        &config.storage,
    ))?);
    info!(
        provider = storage.provider_name(),
        bucket = config.storage.provider.bucket(),
        "storage configured"
    );

    match cli.command {
        Commands::Put(args) => put(&storage, args).await,
        Commands::Get(args) => get(&storage, args).await,
    }
}

/// Log to stderr; stdout carries command output.
fn init_tracing(settings: &LogSettings) {
    let filter =
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(&settings.filter));
    let registry = tracing_subscriber::registry().with(filter);

    if settings.json {
        registry
            .with(fmt::layer().json().with_writer(std::io::stderr))
            .init();
    } else {
        registry.with(fmt::layer().with_writer(std::io::stderr)).init();
    }
}

async fn put(storage: &Arc<StorageService>, args: PutArgs) -> anyhow::Result<()> {
    let generation =
        generation_of(&args.rev).ok_or_else(|| anyhow!("invalid revision ID {:?}", args.rev))?;
    let text = std::fs::read_to_string(&args.file)
        .with_context(|| format!("failed to read {}", args.file.display()))?;
    let raw: serde_json::Value = serde_json::from_str(&text).context("invalid JSON body")?;

    let service = AttachmentService::new(
        storage.clone(),
        storage.clone(),
        storage.attachment_namespace(),
    );
    let body = service
        .ingest(&args.doc, raw, generation, args.parent.as_deref())
        .await?;
    storage.put_revision_body(&args.doc, &args.rev, &body).await?;
    info!(doc = %args.doc, rev = %args.rev, "stored revision");

    println!("{}", serde_json::to_string_pretty(&body.to_value())?);
    Ok(())
}

async fn get(storage: &Arc<StorageService>, args: GetArgs) -> anyhow::Result<()> {
    let body = storage
        .get_revision_body(&args.doc, &args.rev)
        .await?
        .ok_or_else(|| anyhow!("revision {}/{} not found", args.doc, args.rev))?;

    let resolver = DeltaResolver::new(
        storage.clone(),
        Arc::new(NoDelta),
        Arc::new(NoDelta),
        storage.attachment_namespace(),
    );

    let mut copy = body.mutable_attachments_copy();
    for mut attachment in find_attachments(&mut copy, args.since, &BTreeMap::new()) {
        let size = attachment.load_data(&resolver, false).await?.len();
        if args.follows {
            attachment.set_follows()?;
        }

        println!("{}\t{size} bytes", attachment.name());
        for (name, value) in &attachment.headers(!args.follows) {
            println!("  {name}: {}", value.to_str().unwrap_or("<binary>"));
        }
    }
    Ok(())
}
