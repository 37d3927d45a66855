//! Wiki-Outline main entry point
//!
//! This is the command-line interface for the Wiki-Outline crawler.

use anyhow::Context;
use clap::Parser;
use std::path::PathBuf;
use wiki_outline::config::{load_config_with_hash, Config};
use wiki_outline::crawler::{run_crawl, RelevanceClassifier, RunOptions};
use wiki_outline::logging::{setup_logging, LogSession};
use wiki_outline::output::{build_prompts, RunStatus};

/// Wiki-Outline: a topical wiki crawler
///
/// Wiki-Outline walks the link graph of a wiki from a set of seed articles,
/// keeps the articles that look relevant to the configured subject and
/// writes each one as tab-delimited breadcrumb/body outline lines.
#[derive(Parser, Debug)]
#[command(name = "wiki-outline")]
#[command(version = "1.0.0")]
#[command(about = "A topical wiki crawler and outline extractor", long_about = None)]
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

    /// Skip documents recorded in the visited snapshots of a previous run
    #[arg(long)]
    resume: bool,

    /// Validate config and show what would be crawled without actually crawling
    #[arg(long, conflicts_with = "prompts")]
    dry_run: bool,

    /// Print topic prompts for the written articles as JSON lines and exit
    #[arg(long, conflicts_with = "dry_run")]
    prompts: bool,
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let cli = Cli::parse();

    let (config, config_hash) = load_config_with_hash(&cli.config)
        .with_context(|| format!("Failed to load configuration from {}", cli.config.display()))?;

    // File logging only for real crawls
    let session = (!cli.dry_run && !cli.prompts).then(|| LogSession::new(config.output.log_dir()));
    setup_logging(cli.verbose, cli.quiet, session.clone());
    tracing::info!("Configuration loaded successfully (hash: {})", config_hash);

    if cli.dry_run {
        handle_dry_run(&config);
    } else if cli.prompts {
        handle_prompts(&config)?;
    } else {
        handle_crawl(config, config_hash, cli.resume, session).await?;
    }

    Ok(())
}

/// Handles the --dry-run mode: shows what would be crawled
fn handle_dry_run(config: &Config) {
    println!("=== Wiki-Outline Dry Run ===\n");

    println!("Crawler Configuration:");
    println!("  Traversal: {}", config.crawler.traversal.as_str());
    match config.crawler.max_levels {
        Some(levels) => println!("  Max levels: {}", levels),
        None => println!("  Max levels: unlimited"),
    }
    println!(
        "  Max recursion depth: {}",
        config.crawler.max_recursion_depth
    );
    println!("  Max attempts: {}", config.crawler.max_attempts);
    println!(
        "  Backoff: {}ms (x{})",
        config.crawler.backoff_ms, config.crawler.backoff_multiplier
    );

    println!("\nUser Agent:");
    println!("  {}", config.user_agent.header_value());

    println!("\nSite:");
    println!("  Base URL: {}", config.site.base_url);
    println!("  Content root: {}", config.site.content_root);

    let classifier = RelevanceClassifier::from_config(&config.relevance);
    println!("\nRelevance:");
    println!(
        "  {} of {} keywords required",
        classifier.threshold(),
        config.relevance.keywords.len()
    );

    println!("\nOutput:");
    println!("  Directory: {}", config.output.directory.display());
    println!("  Articles: {}", config.output.articles_dir().display());
    println!("  Logs: {}", config.output.log_dir().display());

    println!("\nSeeds ({}):", config.site.seeds.len());
    for seed in &config.site.seeds {
        println!("  - {}", seed);
    }

    println!("\n✓ Configuration is valid");
}

/// Handles the --prompts mode: prints one JSON object per prompt
fn handle_prompts(config: &Config) -> anyhow::Result<()> {
    let articles_dir = config.output.articles_dir();
    let classifier = RelevanceClassifier::from_config(&config.relevance);

    let prompts = build_prompts(&articles_dir, &classifier, &config.prompts)
        .with_context(|| format!("Failed to read articles from {}", articles_dir.display()))?;

    for prompt in &prompts {
        println!("{}", serde_json::to_string(prompt)?);
    }
    tracing::info!("Built {} prompts", prompts.len());

    Ok(())
}

/// Handles the main crawl operation
async fn handle_crawl(
    config: Config,
    config_hash: String,
    resume: bool,
    log_session: Option<LogSession>,
) -> anyhow::Result<()> {
    if resume {
        tracing::info!("Resuming from previous visited snapshots");
    } else {
        tracing::info!("Starting fresh crawl");
    }

    let options = RunOptions {
        config_hash,
        resume,
        log_session,
    };

    let summary = run_crawl(config, options).await.context("Crawl failed")?;

    match &summary.status {
        RunStatus::Completed => tracing::info!("Crawl completed successfully"),
        RunStatus::Aborted(reason) => tracing::error!("Crawl aborted: {}", reason),
    }

    Ok(())
}
