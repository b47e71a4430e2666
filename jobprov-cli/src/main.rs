//! Jobprov CLI: record and report provenance for portal compute jobs.

mod commands;

use clap::Parser;
use std::path::PathBuf;
use tracing_subscriber::layer::SubscriberExt;
use tracing_subscriber::util::SubscriberInitExt;
use tracing_subscriber::{EnvFilter, Layer};

/// Jobprov: PROV-O provenance for cloud compute jobs
#[derive(Parser, Debug)]
#[command(name = "jobprov", version, about, long_about = None)]
struct Cli {
    /// Workspace directory
    #[arg(short, long, default_value = ".")]
    workspace: PathBuf,

    /// Configuration file path
    #[arg(short, long)]
    config: Option<PathBuf>,

    /// Increase verbosity (-v, -vv)
    #[arg(short, long, action = clap::ArgAction::Count)]
    verbose: u8,

    /// Suppress non-essential output
    #[arg(short, long)]
    quiet: bool,

    #[command(subcommand)]
    command: Commands,
}

#[derive(clap::Subcommand, Debug)]
enum Commands {
    /// Manage configuration
    Config {
        #[command(subcommand)]
        action: ConfigAction,
    },
    /// Print the activity URI of a job
    ActivityUri {
        #[arg(long)]
        job_id: u64,
        /// Portal base URL (defaults to the configured server_url)
        #[arg(long)]
        server: Option<String>,
    },
    /// Print the URI of one of a job's output files
    OutputUri {
        #[arg(long)]
        job_id: u64,
        /// Storage key of the file
        #[arg(long)]
        key: String,
        /// Portal base URL (defaults to the configured server_url)
        #[arg(long)]
        server: Option<String>,
    },
    /// Record start-of-job provenance and store it with the job's files
    Start {
        /// Job description (JSON)
        #[arg(long)]
        job: PathBuf,
        /// Solution description (JSON)
        #[arg(long)]
        solution: PathBuf,
        /// Profile link of the responsible user (overrides the identity table)
        #[arg(long)]
        user_link: Option<String>,
    },
    /// Record completion, store the extended graph, and report it
    Complete {
        /// Job description (JSON)
        #[arg(long)]
        job: PathBuf,
        /// Store the extended graph without reporting it
        #[arg(long)]
        no_submit: bool,
    },
    /// Report a job's stored activity to the registry again
    Report {
        /// Job description (JSON)
        #[arg(long)]
        job: PathBuf,
    },
    /// Parse a Turtle file and print it in canonical form
    Canonicalize {
        /// Turtle file to read
        file: PathBuf,
        /// Base IRI for relative references
        #[arg(long)]
        base: Option<String>,
    },
}

#[derive(clap::Subcommand, Debug)]
enum ConfigAction {
    /// Create default configuration file
    Init,
    /// Show current configuration
    Show,
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    // Load .env file if present
    let _ = dotenvy::dotenv();

    let cli = Cli::parse();

    // Set up tracing: human-readable stderr + JSON file logging
    let filter = match cli.verbose {
        0 if cli.quiet => "error",
        0 => "info",
        1 => "debug",
        _ => "trace",
    };

    // Human-readable layer for stderr (always active)
    let stderr_layer = tracing_subscriber::fmt::layer()
        .with_target(false)
        .with_writer(std::io::stderr)
        .with_filter(EnvFilter::new(filter));

    // JSON file layer for structured logging
    let log_dir = directories::ProjectDirs::from("org", "jobprov", "jobprov")
        .map(|d| d.data_dir().join("logs"))
        .unwrap_or_else(|| PathBuf::from("."));
    let _ = std::fs::create_dir_all(&log_dir);
    let file_appender = tracing_appender::rolling::daily(&log_dir, "jobprov.log");
    let (non_blocking, _guard) = tracing_appender::non_blocking(file_appender);
    let json_layer = tracing_subscriber::fmt::layer()
        .json()
        .with_writer(non_blocking)
        .with_filter(EnvFilter::new("debug"));

    tracing_subscriber::registry()
        .with(stderr_layer)
        .with(json_layer)
        .init();

    // Resolve workspace
    let workspace = cli
        .workspace
        .canonicalize()
        .unwrap_or_else(|_| std::env::current_dir().unwrap_or_else(|_| PathBuf::from(".")));

    commands::handle_command(cli.command, &workspace, cli.config.as_deref()).await
}
