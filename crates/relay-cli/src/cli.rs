//! Command-line interface

use std::path::PathBuf;

use clap::{Args, Parser, Subcommand};

/// Local runner for the relay transform pipeline
#[derive(Debug, Parser, Clone)]
#[command(name = "relay")]
#[command(version)]
#[command(about = "Resolve, transform and relay landed market-data files", long_about = None)]
pub struct Cli {
    #[command(subcommand)]
    pub command: Command,

    /// Enable verbose logging
    #[arg(short, long, global = true)]
    pub verbose: bool,

    /// Path to a TOML config file
    #[arg(short, long, global = true, env = "RELAY_CONFIG")]
    pub config: Option<PathBuf>,

    /// Store (bucket) `transform` files its input under, overrides the config
    /// file. `run` takes the bucket from each payload
    #[arg(long, global = true, env = "RELAY_STORE")]
    pub store: Option<String>,
}

/// Available commands
#[derive(Debug, Subcommand, Clone)]
pub enum Command {
    /// Resolve a queue payload to its source object and target key
    Resolve(ResolveCommand),

    /// Run the CSV transform on a local file
    Transform(TransformCommand),

    /// Drain a local queue seeded from payload files
    Run(RunCommand),
}

#[derive(Debug, Args, Clone)]
pub struct ResolveCommand {
    /// Payload file (reads stdin when omitted)
    pub file: Option<PathBuf>,
}

#[derive(Debug, Args, Clone)]
pub struct TransformCommand {
    /// Object key the file was stored under, e.g. raw/x/2024/01/01/0101.csv
    #[arg(short, long)]
    pub key: String,

    /// CSV file to transform
    pub file: PathBuf,
}

#[derive(Debug, Args, Clone)]
pub struct RunCommand {
    /// Root directory of the local blob store
    #[arg(short, long)]
    pub root: PathBuf,

    /// Directory of *.json payloads to enqueue
    #[arg(short, long)]
    pub payloads: Option<PathBuf>,

    /// Stop after this many batches
    #[arg(long)]
    pub max_batches: Option<usize>,
}
