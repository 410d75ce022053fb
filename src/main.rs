//! CCR-Corpus main entry point
//!
//! Command-line interface for the two-phase crawl-and-extract pipeline:
//! `discover` walks the browse hierarchy, `extract` builds the record log,
//! `validate` and `retry-list` operate on existing output.

use anyhow::Context;
use ccr_corpus::checkpoint;
use ccr_corpus::config::{load_config_with_hash, Config};
use ccr_corpus::crawler::DiscoveryDriver;
use ccr_corpus::events::{EventSink, TracingSink};
use ccr_corpus::extract::ExtractionDriver;
use ccr_corpus::fetch::{FetchGate, RenderClient};
use ccr_corpus::output::{build_retry_list, print_report, validate_records};
use clap::{Parser, Subcommand};
use std::path::PathBuf;
use std::sync::Arc;
use tracing_subscriber::EnvFilter;

/// CCR-Corpus: crawl and extraction pipeline for the California Code of
/// Regulations publication site
#[derive(Parser, Debug)]
#[command(name = "ccr-corpus")]
#[command(version)]
#[command(about = "Build a structured corpus from the CCR publication site", long_about = None)]
struct Cli {
    /// Path to TOML configuration file
    #[arg(short, long, value_name = "CONFIG", default_value = "config.toml")]
    config: PathBuf,

    /// Increase logging verbosity (-v, -vv, -vvv)
    #[arg(short, long, action = clap::ArgAction::Count)]
    verbose: u8,

    /// Suppress non-error output
    #[arg(short, long, conflicts_with = "verbose")]
    quiet: bool,

    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand, Debug)]
enum Command {
    /// Discover section URLs by breadth-first traversal of the browse pages
    Discover {
        /// Start from the seed URL, ignoring any existing checkpoint
        #[arg(long)]
        fresh: bool,
    },

    /// Extract one record per discovered section URL, resuming from the
    /// existing record log
    Extract,

    /// Validate an existing record log and print statistics
    Validate,

    /// List failed URLs that still lack a successful record
    RetryList {
        /// Write the list to a file instead of stdout
        #[arg(long, value_name = "FILE")]
        output: Option<PathBuf>,
    },
}

#[tokio::main(flavor = "current_thread")]
async fn main() -> anyhow::Result<()> {
    let cli = Cli::parse();

    setup_logging(cli.verbose, cli.quiet);

    tracing::info!("Loading configuration from: {}", cli.config.display());
    let (config, config_hash) = load_config_with_hash(&cli.config)
        .with_context(|| format!("failed to load {}", cli.config.display()))?;
    tracing::info!("Configuration loaded (hash: {})", config_hash);

    match cli.command {
        Command::Discover { fresh } => handle_discover(config, config_hash, fresh).await,
        Command::Extract => handle_extract(config, config_hash).await,
        Command::Validate => handle_validate(&config),
        Command::RetryList { output } => handle_retry_list(&config, output),
    }
}

/// Sets up the logging/tracing subscriber based on verbosity level
fn setup_logging(verbose: u8, quiet: bool) {
    let filter = if quiet {
        EnvFilter::new("error")
    } else {
        match verbose {
            0 => EnvFilter::new("ccr_corpus=info,warn"),
            1 => EnvFilter::new("ccr_corpus=debug,info"),
            2 => EnvFilter::new("ccr_corpus=trace,debug"),
            _ => EnvFilter::new("trace"),
        }
    };

    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_target(false)
        .with_thread_ids(false)
        .with_file(false)
        .init();
}

/// Builds the fetch gate shared by both drivers
fn build_gate(config: &Config) -> anyhow::Result<Arc<FetchGate>> {
    let backend = RenderClient::new(&config.fetch)?;
    Ok(Arc::new(FetchGate::new(backend, &config.fetch)))
}

/// Handles the discover subcommand
async fn handle_discover(config: Config, config_hash: String, fresh: bool) -> anyhow::Result<()> {
    if fresh {
        tracing::info!("Starting fresh discovery (ignoring previous state)");
    } else {
        tracing::info!("Starting discovery (will resume if a checkpoint exists)");
    }

    let config = Arc::new(config);
    let gate = build_gate(&config)?;
    let sink: Arc<dyn EventSink> = Arc::new(TracingSink);

    let mut driver =
        DiscoveryDriver::new(Arc::clone(&config), gate, sink, Some(config_hash), fresh)?;
    let summary = driver.run().await?;

    println!("=== Discovery Summary ===\n");
    println!("  URLs visited: {}", summary.visited);
    println!("  Sections discovered: {}", summary.discovered);
    println!("  Queue remaining: {}", summary.queued);
    if summary.interrupted {
        println!("\n  Interrupted - rerun `discover` to resume from the checkpoint");
    }
    println!(
        "\n  Discovered list: {}",
        config.paths.discovered_urls().display()
    );

    Ok(())
}

/// Handles the extract subcommand
async fn handle_extract(config: Config, config_hash: String) -> anyhow::Result<()> {
    let config = Arc::new(config);
    let gate = build_gate(&config)?;
    let sink: Arc<dyn EventSink> = Arc::new(TracingSink);

    let driver = ExtractionDriver::new(Arc::clone(&config), gate, sink, Some(config_hash));
    let summary = driver.run().await?;

    println!("=== Extraction Summary ===\n");
    println!("  Input URLs: {}", summary.total);
    println!("  Records in log: {}", summary.processed);
    println!("  Failed extractions: {}", summary.failed);
    println!("  Success rate: {:.1}%", summary.success_rate());
    if summary.interrupted {
        println!("\n  Interrupted - rerun `extract` to resume from the record log");
    }
    println!("\n  Record log: {}", config.paths.records().display());
    println!("  Failure ledger: {}", config.paths.failures().display());

    Ok(())
}

/// Handles the validate subcommand
fn handle_validate(config: &Config) -> anyhow::Result<()> {
    let records_path = config.paths.records();
    println!("Record log: {}\n", records_path.display());

    let report = validate_records(&records_path)?;
    print_report(&report);

    Ok(())
}

/// Handles the retry-list subcommand
fn handle_retry_list(config: &Config, output: Option<PathBuf>) -> anyhow::Result<()> {
    let retry = build_retry_list(&config.paths.failures(), &config.paths.records())?;

    match output {
        Some(path) => {
            checkpoint::save_url_list(&path, &retry)?;
            println!("{} URLs written to {}", retry.len(), path.display());
        }
        None => {
            for url in &retry {
                println!("{}", url);
            }
            tracing::info!("{} URLs still need a successful extraction", retry.len());
        }
    }

    Ok(())
}
