//! Job-Harvest main entry point
//!
//! This is the command-line interface for the Job-Harvest job-board harvester.

use anyhow::{Context, Result};
use clap::Parser;
use job_harvest::browser::HttpBrowser;
use job_harvest::config::{load_config_with_hash, Config};
use job_harvest::crawler::Coordinator;
use job_harvest::output::{export_latest_run, load_statistics, print_statistics, write_run_outputs};
use job_harvest::site::SiteAdapter;
use job_harvest::storage::{open_storage, RunStatus};
use std::path::{Path, PathBuf};
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use tracing_subscriber::EnvFilter;

/// Job-Harvest: a paced job-board harvester
///
/// Job-Harvest walks paginated job-board searches, visits every listing's
/// detail page and writes a deduplicated dataset. Navigation is sequential
/// and paced, and the run stops early when the board starts blocking it.
#[derive(Parser, Debug)]
#[command(name = "job-harvest")]
#[command(version = "1.0.0")]
#[command(about = "A paced job-board harvester", long_about = None)]
struct Cli {
    /// Path to TOML configuration file
    #[arg(value_name = "CONFIG")]
    config: PathBuf,

    /// Increase logging verbosity (-v, -vv, -vvv)
    #[arg(short, long, action = clap::ArgAction::Count)]
    verbose: u8,

    /// Suppress non-error output
    #[arg(short, long, conflicts_with = "verbose")]
    quiet: bool,

    /// Validate config and show the searches without harvesting
    #[arg(long, conflicts_with_all = ["stats", "export"])]
    dry_run: bool,

    /// Show statistics of the latest run from the database and exit
    #[arg(long, conflicts_with_all = ["dry_run", "export"])]
    stats: bool,

    /// Rebuild the CSV dataset from the latest run's stored records and exit
    #[arg(long, conflicts_with_all = ["dry_run", "stats"])]
    export: bool,
}

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();

    // Setup logging based on verbosity
    setup_logging(cli.verbose, cli.quiet);

    // Load and validate configuration
    tracing::info!("Loading configuration from: {}", cli.config.display());
    let (config, config_hash) = load_config_with_hash(&cli.config)
        .with_context(|| format!("Failed to load configuration from {}", cli.config.display()))?;
    tracing::info!("Configuration loaded successfully (hash: {})", config_hash);

    // Handle different modes
    if cli.dry_run {
        handle_dry_run(&config)
    } else if cli.stats {
        handle_stats(&config)
    } else if cli.export {
        handle_export(&config)
    } else {
        handle_harvest(config, &config_hash).await
    }
}

/// Sets up the logging/tracing subscriber based on verbosity level
fn setup_logging(verbose: u8, quiet: bool) {
    let filter = if quiet {
        // Only show errors
        EnvFilter::new("error")
    } else {
        match verbose {
            0 => EnvFilter::new("job_harvest=info,warn"),
            1 => EnvFilter::new("job_harvest=debug,info"),
            2 => EnvFilter::new("job_harvest=trace,debug"),
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

/// Handles the --dry-run mode: validates config and shows what would be harvested
fn handle_dry_run(config: &Config) -> Result<()> {
    let site = SiteAdapter::from_config(&config.site)?;

    println!("=== Job-Harvest Dry Run ===\n");

    println!("Site:");
    println!("  Preset: {}", site.name);
    println!("  Expected domain: {}", site.expected_domain);

    println!("\nCrawler Configuration:");
    println!(
        "  Max consecutive failures: {}",
        config.crawler.max_consecutive_failures
    );
    println!(
        "  Backoff: base {}ms, factor {}, decay {}, ceiling {}x",
        config.crawler.backoff_base_ms,
        config.crawler.backoff_factor,
        config.crawler.backoff_decay,
        config.crawler.max_backoff_multiplier
    );
    println!("  Block policy: {:?}", config.crawler.block_policy);
    println!("  Detail timeout: {}ms", config.crawler.detail_timeout_ms);
    if let Some(cap) = config.crawler.max_listings_per_page {
        println!("  Listings per page: {}", cap);
    }

    println!("\nBrowser:");
    println!("  User agent: {}", config.browser.user_agent);
    println!(
        "  Proxy: {}",
        config.browser.proxy.as_deref().unwrap_or("none")
    );

    println!("\nOutput:");
    println!("  Dataset: {}", config.output.csv_path);
    println!("  Database: {}", config.output.database_path);
    println!("  Summary: {}", config.output.summary_path);

    let targets = config.search_targets();
    println!("\nSearches ({}):", targets.len());
    for target in &targets {
        println!(
            "  - [{}] {} (up to {} pages)",
            target.tag.as_deref().unwrap_or("-"),
            target.query_url_template,
            target.max_pages
        );
    }

    println!("\n✓ Configuration is valid");
    println!(
        "✓ Would walk up to {} result pages",
        targets.iter().map(|t| u64::from(t.max_pages)).sum::<u64>()
    );

    Ok(())
}

/// Handles the --stats mode: shows statistics from the database
fn handle_stats(config: &Config) -> Result<()> {
    println!("Database: {}\n", config.output.database_path);

    let storage = open_storage(Path::new(&config.output.database_path))
        .context("Failed to open database")?;

    match load_statistics(&storage)? {
        Some(stats) => print_statistics(&stats),
        None => println!("No harvest runs recorded yet."),
    }

    Ok(())
}

/// Handles the --export mode: rebuilds the dataset from stored records
fn handle_export(config: &Config) -> Result<()> {
    println!("=== Exporting Dataset ===\n");
    println!("Database: {}", config.output.database_path);
    println!("Output: {}", config.output.csv_path);
    println!();

    let storage = open_storage(Path::new(&config.output.database_path))
        .context("Failed to open database")?;

    match export_latest_run(&storage, Path::new(&config.output.csv_path))? {
        Some((run_id, rows)) => println!("✓ Exported {} postings from run {}", rows, run_id),
        None => println!("No harvest runs recorded yet."),
    }

    Ok(())
}

/// Handles the main harvest operation
async fn handle_harvest(config: Config, config_hash: &str) -> Result<()> {
    tracing::info!(
        "Harvesting {} searches on '{}'",
        config.targets.len(),
        config.site.preset
    );

    let stop = Arc::new(AtomicBool::new(false));
    {
        let stop = Arc::clone(&stop);
        tokio::spawn(async move {
            while tokio::signal::ctrl_c().await.is_ok() {
                if stop.swap(true, Ordering::SeqCst) {
                    tracing::error!("Second interrupt received, exiting without writing outputs");
                    std::process::exit(130);
                }
                tracing::warn!(
                    "Interrupt received, stopping after the current step (press Ctrl-C again to force)"
                );
            }
        });
    }

    let storage = open_storage(Path::new(&config.output.database_path))
        .context("Failed to open database")?;
    let browser = HttpBrowser::new(&config.browser).context("Failed to start browser session")?;

    let coordinator = Coordinator::new(
        config.clone(),
        config_hash,
        Box::new(browser),
        Box::new(storage),
        stop,
    )?;
    let report = coordinator.run().await;

    // The coordinator's storage handle is gone; reopen to build the summary
    let storage = open_storage(Path::new(&config.output.database_path))
        .context("Failed to reopen database")?;
    write_run_outputs(&config, &report, &storage).context("Failed to write run outputs")?;

    match report.status {
        RunStatus::Completed => {
            println!(
                "✓ Harvest complete: {} unique postings written to {}",
                report.results.len(),
                config.output.csv_path
            );
            Ok(())
        }
        RunStatus::Blocked => {
            println!(
                "⚠ Harvest stopped early (blocked): {} postings written to {}",
                report.results.len(),
                config.output.csv_path
            );
            Ok(())
        }
        RunStatus::Interrupted => {
            println!(
                "⚠ Harvest interrupted: {} postings written to {}",
                report.results.len(),
                config.output.csv_path
            );
            Ok(())
        }
        RunStatus::Failed | RunStatus::Running => {
            let message = report.error.unwrap_or_else(|| "unknown error".to_string());
            anyhow::bail!(
                "Harvest failed after {} postings (partial dataset written): {}",
                report.results.len(),
                message
            )
        }
    }
}
