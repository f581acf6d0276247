mod cli;

use std::path::{Path, PathBuf};
use std::sync::Arc;

use anyhow::{Context, Result, anyhow};
use clap::Parser;
use tokio::io::{AsyncReadExt, AsyncWriteExt};
use tracing_subscriber::EnvFilter;

use cli::{Cli, Command, ResolveCommand, RunCommand, TransformCommand};
use relay_core::app::{CoordinatorBuilder, EnvelopeResolver, PartitionRemap, TransformStage};
use relay_core::config::RelayConfig;
use relay_core::domain::{ContentType, StorageReference};
use relay_core::impls::{
    InMemoryBlobStore, InMemoryDeliveryQueue, JsonlDeadLetterSink, LocalBlobStore, LoggingTopic,
};

const DEAD_LETTER_FILE: &str = "dead-letter.jsonl";

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();

    // Initialize logging (stdout is reserved for command output)
    let default_level = if cli.verbose { "debug" } else { "info" };
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(default_level));
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .try_init()
        .map_err(|e| anyhow!(e))
        .context("Failed to set logging subscriber")?;

    let config = load_config(&cli)?;

    match &cli.command {
        Command::Resolve(cmd) => resolve(cmd, &config).await?,
        Command::Transform(cmd) => transform(cmd, &config).await?,
        Command::Run(cmd) => run(cmd, config).await?,
    }

    Ok(())
}

fn load_config(cli: &Cli) -> Result<RelayConfig> {
    let mut config = match &cli.config {
        Some(path) => RelayConfig::from_file(path)
            .with_context(|| format!("Failed to load config {}", path.display()))?,
        None => RelayConfig::default(),
    };
    if let Some(store) = &cli.store {
        config.store = store.clone();
    }
    config.validate().context("Invalid configuration")?;
    Ok(config)
}

async fn resolve(cmd: &ResolveCommand, config: &RelayConfig) -> Result<()> {
    let payload = match &cmd.file {
        Some(path) => tokio::fs::read_to_string(path)
            .await
            .with_context(|| format!("Failed to read payload {}", path.display()))?,
        None => {
            let mut buf = String::new();
            tokio::io::stdin()
                .read_to_string(&mut buf)
                .await
                .context("Failed to read payload from stdin")?;
            buf
        }
    };

    let reference = EnvelopeResolver::new().resolve(&payload)?;
    let target_key = PartitionRemap::new(&config.source_segment, &config.target_segment)
        .target_key_for(reference.key())?;

    let out = serde_json::json!({
        "reference": reference,
        "uri": reference.to_string(),
        "target_key": target_key,
    });
    println!("{}", serde_json::to_string_pretty(&out)?);
    Ok(())
}

async fn transform(cmd: &TransformCommand, config: &RelayConfig) -> Result<()> {
    let content = tokio::fs::read(&cmd.file)
        .await
        .with_context(|| format!("Failed to read {}", cmd.file.display()))?;

    let store = InMemoryBlobStore::new();
    let reference = StorageReference::new(&config.store, &cmd.key);
    store.insert(reference.clone(), content, ContentType::Csv).await;

    let stage = TransformStage::new(
        Arc::new(store),
        PartitionRemap::new(&config.source_segment, &config.target_segment),
    );
    let blob = stage.fetch(&reference).await?;
    let transformed = stage.transform(&blob)?;
    tracing::info!(output = %transformed.reference, rows = transformed.rows, "transformed");

    let mut stdout = tokio::io::stdout();
    stdout.write_all(&transformed.content).await?;
    stdout.flush().await?;
    Ok(())
}

async fn run(cmd: &RunCommand, config: RelayConfig) -> Result<()> {
    let queue = Arc::new(InMemoryDeliveryQueue::new().with_visibility_timeout(config.visibility_timeout()));
    if let Some(dir) = &cmd.payloads {
        for path in payload_files(dir).await? {
            let payload = tokio::fs::read_to_string(&path)
                .await
                .with_context(|| format!("Failed to read payload {}", path.display()))?;
            let message_id = queue.send(payload).await;
            tracing::debug!(%message_id, file = %path.display(), "enqueued");
        }
    }

    let coordinator = CoordinatorBuilder::new()
        .with_queue(queue.clone())
        .with_blob_store(Arc::new(LocalBlobStore::new(&cmd.root)))
        .with_topic(Arc::new(LoggingTopic))
        .with_dead_letter(Arc::new(JsonlDeadLetterSink::new(cmd.root.join(DEAD_LETTER_FILE))))
        .with_config(config)
        .build()
        .context("Failed to build pipeline")?;

    let summary = coordinator
        .drain(cmd.max_batches)
        .await
        .context("Queue receive failed")?;

    let counts = queue.counts().await;
    tracing::info!(visible = counts.visible, in_flight = counts.in_flight, "queue state after run");

    println!("{}", serde_json::to_string_pretty(&summary)?);
    Ok(())
}

/// Every `*.json` file in `dir`, sorted by name.
async fn payload_files(dir: &Path) -> Result<Vec<PathBuf>> {
    let mut entries = tokio::fs::read_dir(dir)
        .await
        .with_context(|| format!("Failed to read payload directory {}", dir.display()))?;
    let mut files = Vec::new();
    while let Some(entry) = entries.next_entry().await? {
        let path = entry.path();
        if path.extension().is_some_and(|ext| ext == "json") {
            files.push(path);
        }
    }
    files.sort();
    Ok(files)
}
