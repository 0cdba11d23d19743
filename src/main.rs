use anyhow::{Context, Result};
use clap::{Parser, Subcommand};
use std::path::PathBuf;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

use profscout::config::Config;

mod commands;

#[derive(Parser)]
#[command(
    name = "profscout",
    version,
    about = "Faculty directory crawler with research interest matching",
    long_about = None
)]
struct Cli {
    #[command(subcommand)]
    command: Commands,

    /// Enable verbose logging
    #[arg(short, long, global = true)]
    verbose: bool,

    /// Log format (text, json); defaults to the configured format
    #[arg(long, global = true)]
    log_format: Option<String>,

    /// TOML configuration file
    #[arg(short, long, global = true)]
    config: Option<PathBuf>,
}

#[derive(Subcommand)]
enum Commands {
    /// Crawl a faculty directory and extract professor interests
    Crawl {
        /// Seed directory URL
        seed: String,

        /// Maximum number of profile links to fetch
        #[arg(long)]
        max_links: Option<usize>,

        /// Maximum number of directory pages to visit
        #[arg(long)]
        max_pages: Option<usize>,

        /// Number of concurrent fetch workers
        #[arg(short, long)]
        workers: Option<usize>,

        /// Per-request timeout in seconds
        #[arg(long)]
        timeout: Option<u64>,

        /// Retries after the first failed attempt
        #[arg(long)]
        retries: Option<u32>,

        /// Write the crawl result as JSON
        #[arg(short, long)]
        output: Option<PathBuf>,

        /// Comma-separated interests to rank the professors against
        #[arg(short, long)]
        interests: Option<String>,

        /// Number of ranked professors to print
        #[arg(long, default_value = "10")]
        top: usize,
    },

    /// Rank the professors of a saved crawl result
    Match {
        /// Crawl result JSON file
        #[arg(short = 'f', long)]
        input: PathBuf,

        /// Comma-separated interests
        #[arg(short, long)]
        interests: String,

        /// Number of results to print
        #[arg(short, long, default_value = "10")]
        k: usize,
    },
}

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();

    let mut config = match &cli.config {
        Some(path) => Config::from_file(path)
            .with_context(|| format!("Failed to load config from {}", path.display()))?,
        None => Config::default(),
    };
    config.apply_env();

    let format = cli
        .log_format
        .clone()
        .unwrap_or_else(|| config.logging.format.clone());
    setup_tracing(&format, &config.logging.level, cli.verbose)?;

    tracing::info!("profscout starting");

    match cli.command {
        Commands::Crawl {
            seed,
            max_links,
            max_pages,
            workers,
            timeout,
            retries,
            output,
            interests,
            top,
        } => {
            let crawler = &mut config.crawler;
            if let Some(v) = max_links {
                crawler.max_links = v;
            }
            if let Some(v) = max_pages {
                crawler.max_pages = v;
            }
            if let Some(v) = workers {
                crawler.workers = v;
            }
            if let Some(v) = timeout {
                crawler.request_timeout_secs = v;
            }
            if let Some(v) = retries {
                crawler.max_retries = v;
            }
            config.validate()?;

            tracing::info!(
                seed = %seed,
                max_links = config.crawler.max_links,
                max_pages = config.crawler.max_pages,
                workers = config.crawler.workers,
                "Starting crawl command"
            );
            let args = commands::CrawlArgs {
                seed,
                output,
                interests,
                top,
            };
            commands::crawl(config, args).await?;
        }

        Commands::Match { input, interests, k } => {
            config.validate()?;

            tracing::info!(
                input = %input.display(),
                interests = %interests,
                k = k,
                "Starting match command"
            );
            commands::match_interests(config, &input, &interests, k).await?;
        }
    }

    tracing::info!("profscout completed successfully");
    Ok(())
}

fn setup_tracing(format: &str, level: &str, verbose: bool) -> Result<()> {
    let env_filter = if verbose {
        tracing_subscriber::EnvFilter::new("profscout=debug,info")
    } else {
        tracing_subscriber::EnvFilter::try_new(format!("profscout={level},warn"))
            .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new("profscout=info,warn"))
    };

    match format {
        "json" => {
            tracing_subscriber::registry()
                .with(env_filter)
                .with(tracing_subscriber::fmt::layer().json())
                .init();
        }
        _ => {
            tracing_subscriber::registry()
                .with(env_filter)
                .with(tracing_subscriber::fmt::layer().pretty())
                .init();
        }
    }

    Ok(())
}
