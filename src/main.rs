//! Doc-Harvest main entry point
//!
//! This is the command-line interface for the Doc-Harvest catalog downloader.

use anyhow::Context;
use clap::Parser;
use doc_harvest::config::{load_config_with_hash, Config, RendererKind};
use doc_harvest::crawler::harvest;
use std::path::PathBuf;
use tracing_subscriber::EnvFilter;

/// Doc-Harvest: a catalog-driven document downloader
///
/// Doc-Harvest renders each configured catalog page, extracts PDF and
/// archive links, and downloads every unique asset once into per-kind
/// directories.
#[derive(Parser, Debug)]
#[command(name = "doc-harvest")]
#[command(version = "1.0.0")]
#[command(about = "A catalog-driven document downloader", long_about = None)]
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

    /// Validate config and show what would be harvested without downloading
    #[arg(long)]
    dry_run: bool,
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let cli = Cli::parse();

    setup_logging(cli.verbose, cli.quiet);

    tracing::info!("Loading configuration from: {}", cli.config.display());
    let (config, config_hash) = load_config_with_hash(&cli.config)
        .with_context(|| format!("failed to load configuration {}", cli.config.display()))?;
    tracing::info!("Configuration loaded successfully (hash: {})", config_hash);

    if cli.dry_run {
        handle_dry_run(&config);
        return Ok(());
    }

    handle_harvest(&config).await
}

/// Sets up the logging/tracing subscriber based on verbosity level
fn setup_logging(verbose: u8, quiet: bool) {
    let filter = if quiet {
        EnvFilter::new("error")
    } else {
        match verbose {
            0 => EnvFilter::new("doc_harvest=info,warn"),
            1 => EnvFilter::new("doc_harvest=debug,info"),
            2 => EnvFilter::new("doc_harvest=trace,debug"),
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

/// Handles the --dry-run mode: shows the effective configuration and catalog
fn handle_dry_run(config: &Config) {
    println!("=== Doc-Harvest Dry Run ===\n");

    println!("Crawler Configuration:");
    println!("  Base origin: {}", config.crawler.base_origin);
    println!("  Inter-page delay: {}ms", config.crawler.inter_page_delay);
    println!("  Render timeout: {}s", config.crawler.render_timeout);

    println!("\nRenderer:");
    match config.renderer.kind {
        RendererKind::Chrome => println!("  Headless Chrome ({})", config.renderer.chrome_binary),
        RendererKind::Http => println!("  Plain HTTP"),
    }
    if let Some(cache_dir) = &config.renderer.cache_dir {
        println!("  Cache: {}", cache_dir);
    }

    println!("\nFetch:");
    println!("  Timeout: {}s", config.fetch.timeout);
    println!("  Decompress: {}", config.fetch.decompress);
    println!(
        "  Document types: {}",
        config.fetch.document_content_types.join(", ")
    );
    println!(
        "  Archive types: {}",
        config.fetch.archive_content_types.join(", ")
    );

    println!("\nExtraction:");
    println!("  Selector: {}", config.extract.link_selector);
    println!(
        "  Document extensions: {}",
        config.extract.document_extensions.join(", ")
    );
    println!(
        "  Archive extensions: {}",
        config.extract.archive_extensions.join(", ")
    );

    println!("\nOutput:");
    println!("  Documents: {}", config.output.documents_dir);
    println!("  Archives: {}", config.output.archives_dir);

    println!("\nCatalog ({} pages):", config.catalog.pages.len());
    for page in &config.catalog.pages {
        println!("  - {}", page);
    }

    println!("\n✓ Configuration is valid");
}

/// Handles the main harvest operation
async fn handle_harvest(config: &Config) -> anyhow::Result<()> {
    tracing::info!(
        "Harvesting {} catalog pages from {}",
        config.catalog.pages.len(),
        config.crawler.base_origin
    );

    let stats = harvest(config).await.context("harvest failed")?;

    if stats.failed_downloads() > 0 {
        tracing::warn!(
            "Harvest finished with {} failed downloads",
            stats.failed_downloads()
        );
    } else {
        tracing::info!("Harvest completed successfully");
    }

    Ok(())
}
