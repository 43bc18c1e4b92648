//! Directory Harvester main entry point
//!
//! This is the command-line interface for the public-official directory
//! harvester.

use anyhow::Context;
use clap::Parser;
use directory_harvester::config::{
    load_config_with_hash, validate, Config, OutputFormat, PaginationMode, SiteVariant,
};
use directory_harvester::crawler::{Harvester, TracingProgress};
use directory_harvester::output::{
    date_stamp, export_records, generate_markdown_summary, print_statistics, RecordCollection,
    RunSummary,
};
use std::path::{Path, PathBuf};
use std::sync::Arc;
use tracing_subscriber::EnvFilter;

/// Directory Harvester: a bounded, polite directory crawler
///
/// Walks the paginated officials directory, fetches every detail page with a
/// bounded worker pool and exports one record per official.
#[derive(Parser, Debug)]
#[command(name = "directory-harvester")]
#[command(version = "1.0.0")]
#[command(about = "Harvests public-official directory records", long_about = None)]
struct Cli {
    /// Path to TOML configuration file (defaults apply when omitted)
    #[arg(short, long, value_name = "CONFIG")]
    config: Option<PathBuf>,

    /// Worker pool size for each phase
    #[arg(short, long)]
    workers: Option<usize>,

    /// Crawl pages 1..=N, ignoring the last-page indicator
    #[arg(long, value_name = "N", conflicts_with = "discover")]
    pages: Option<u32>,

    /// Discover pages sequentially until an empty page
    #[arg(long)]
    discover: bool,

    /// Output path; {date} expands to YYYYMMDD
    #[arg(short, long)]
    output: Option<String>,

    /// Output format: csv, jsonl or json
    #[arg(short, long)]
    format: Option<OutputFormat>,

    /// CSV field separator
    #[arg(long)]
    delimiter: Option<char>,

    /// Per-request timeout in seconds
    #[arg(long, value_name = "SECS")]
    timeout: Option<u64>,

    /// Retries per failed request
    #[arg(long)]
    retries: Option<u32>,

    /// Use the legacy page layout selectors
    #[arg(long)]
    legacy: bool,

    /// Validate config and show what would be harvested without fetching
    #[arg(long)]
    dry_run: bool,

    /// Increase logging verbosity (-v, -vv, -vvv)
    #[arg(short, long, action = clap::ArgAction::Count)]
    verbose: u8,

    /// Suppress non-error output
    #[arg(short, long, conflicts_with = "verbose")]
    quiet: bool,
}

impl Cli {
    /// Applies command-line overrides on top of the file configuration
    fn apply_overrides(&self, config: &mut Config) {
        if let Some(workers) = self.workers {
            config.crawler.workers = workers;
        }
        if let Some(pages) = self.pages {
            config.crawler.page_count = Some(pages);
        }
        if self.discover {
            config.crawler.pagination = PaginationMode::Discovery;
            config.crawler.page_count = None;
        }
        if let Some(output) = &self.output {
            config.output.path = output.clone();
        }
        if let Some(format) = self.format {
            config.output.format = format;
        }
        if let Some(delimiter) = self.delimiter {
            config.output.delimiter = delimiter;
        }
        if let Some(timeout) = self.timeout {
            config.crawler.timeout_secs = timeout;
        }
        if let Some(retries) = self.retries {
            config.crawler.retry_times = retries;
        }
        if self.legacy {
            config.site.variant = SiteVariant::Legacy;
        }
    }
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let cli = Cli::parse();

    // Setup logging based on verbosity
    setup_logging(cli.verbose, cli.quiet);

    let (mut config, config_hash) = match &cli.config {
        Some(path) => {
            tracing::info!("Loading configuration from: {}", path.display());
            let (config, hash) = load_config_with_hash(path)
                .with_context(|| format!("failed to load {}", path.display()))?;
            tracing::info!("Configuration loaded successfully (hash: {})", hash);
            (config, Some(hash))
        }
        None => {
            tracing::info!("No configuration file given, using defaults");
            (Config::default(), None)
        }
    };

    cli.apply_overrides(&mut config);
    validate(&config).context("invalid configuration")?;

    if cli.dry_run {
        handle_dry_run(&config);
        return Ok(());
    }

    handle_harvest(config, config_hash).await
}

/// Sets up the logging/tracing subscriber based on verbosity level
fn setup_logging(verbose: u8, quiet: bool) {
    let filter = if quiet {
        // Only show errors
        EnvFilter::new("error")
    } else {
        match verbose {
            0 => EnvFilter::new("directory_harvester=info,warn"),
            1 => EnvFilter::new("directory_harvester=debug,info"),
            2 => EnvFilter::new("directory_harvester=trace,debug"),
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

/// Handles the --dry-run mode: shows the resolved configuration
fn handle_dry_run(config: &Config) {
    println!("=== Directory Harvester Dry Run ===\n");

    println!("Site:");
    println!("  Base URL: {}", config.site.base_url);
    println!("  Listing path: {}", config.site.listing_path);
    println!("  Page parameter: {}", config.site.page_param);
    println!("  Variant: {:?}", config.site.variant);
    println!("  User agent: {}", config.site.user_agent);

    println!("\nCrawler:");
    println!("  Workers: {}", config.crawler.workers);
    println!("  Timeout: {}s", config.crawler.timeout_secs);
    println!("  Retries: {}", config.crawler.retry_times);
    println!("  Retry delay: {}ms", config.crawler.retry_delay_ms);
    match config.crawler.page_count {
        Some(pages) => println!("  Pages: 1..={} (fixed)", pages),
        None => println!("  Pagination: {:?}", config.crawler.pagination),
    }

    println!("\nOutput:");
    println!(
        "  Path: {}",
        config.output.resolved_path(&date_stamp()).display()
    );
    println!("  Format: {}", config.output.format);
    if config.output.format == OutputFormat::Csv {
        println!("  Delimiter: {:?}", config.output.delimiter);
        println!("  UTF-8 BOM: {}", config.output.utf8_bom);
    }
    if let Some(summary) = &config.output.summary_path {
        println!("  Summary: {}", summary);
    }

    println!("\n✓ Configuration is valid");
}

/// Handles the main harvest operation
async fn handle_harvest(config: Config, config_hash: Option<String>) -> anyhow::Result<()> {
    let started_at = chrono::Local::now().format("%Y-%m-%d %H:%M:%S").to_string();
    let output_config = config.output.clone();

    let harvester = Harvester::new(config, Arc::new(TracingProgress::default()))?;
    let job = match harvester.run().await {
        Ok(job) => job,
        Err(e) => {
            tracing::error!("Harvest failed: {}", e);
            return Err(e.into());
        }
    };

    let mut summary = RunSummary::from_job(&job, started_at);
    if let Some(hash) = config_hash {
        summary = summary.with_config_hash(hash);
    }

    let collection = RecordCollection::new(job.records);
    let path = export_records(&collection, &output_config)
        .with_context(|| format!("failed to export records to {}", output_config.path))?;
    summary = summary.with_output_path(path.display().to_string());

    print_statistics(&summary.statistics);

    if let Some(summary_path) = &output_config.summary_path {
        generate_markdown_summary(&summary, Path::new(summary_path))
            .with_context(|| format!("failed to write summary to {}", summary_path))?;
        println!("\n✓ Summary exported to: {}", summary_path);
    }

    println!("✓ {} records written to {}", collection.len(), path.display());
    Ok(())
}
