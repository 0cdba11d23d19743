use anyhow::{Context, Result};
use std::path::PathBuf;

use profscout::config::Config;
use profscout::crawler::Crawler;
use profscout::matching::Scorer;
use profscout::models::{CrawlErrorKind, CrawlResult, SimilarityQuery};
use profscout::utils::truncate_text;

use super::print_ranking;

/// Options of the `crawl` subcommand
#[derive(Debug)]
pub struct CrawlArgs {
    pub seed: String,
    pub output: Option<PathBuf>,
    pub interests: Option<String>,
    pub top: usize,
}

pub async fn crawl(config: Config, args: CrawlArgs) -> Result<()> {
    println!("Starting Faculty Directory Crawl");
    println!("================================");
    println!("Seed: {}", args.seed);
    println!(
        "Budgets: {} pages, {} profile links, {} workers",
        config.crawler.max_pages, config.crawler.max_links, config.crawler.workers
    );

    let scoring = config.scoring.clone();
    let crawler = Crawler::from_config(config).context("Failed to initialize crawler")?;

    let signal = crawler.cancel_signal();
    let interrupt = tokio::spawn(async move {
        if tokio::signal::ctrl_c().await.is_ok() {
            tracing::warn!("Interrupt received, finishing in-flight pages");
            signal.cancel();
        }
    });

    let result = crawler.crawl(&args.seed).await;
    interrupt.abort();

    let result = result.with_context(|| format!("Crawl of {} failed", args.seed))?;

    print_summary(&result);

    if let Some(path) = &args.output {
        let json = serde_json::to_string_pretty(&result).context("Failed to serialize result")?;
        tokio::fs::write(path, json)
            .await
            .with_context(|| format!("Failed to write {}", path.display()))?;
        println!("Result written to {}", path.display());
    }

    if let Some(interests) = &args.interests {
        let query = SimilarityQuery::parse_list(interests);
        let ranked = Scorer::new(scoring).rank_result(&query, &result);
        print_ranking(&ranked, args.top);
    }

    Ok(())
}

fn print_summary(result: &CrawlResult) {
    println!("\nCrawl Summary");
    println!("=============");
    println!("Session: {}", result.session_id);
    println!("Directory pages visited: {}", result.directory_pages_visited);
    println!("Profile links found: {}", result.profile_links_found);
    println!("Professors extracted: {}", result.professors.len());
    if !result.non_professor_pages.is_empty() {
        println!("Not professor pages: {}", result.non_professor_pages.len());
    }
    println!("Walk state: {:?}", result.walk_state);
    if result.cancelled {
        println!("Cancelled: partial result");
    }

    let elapsed = result.finished_at - result.started_at;
    println!("Elapsed: {:.1}s", elapsed.num_milliseconds() as f64 / 1000.0);

    if !result.errors.is_empty() {
        println!("\nErrors ({})", result.errors.len());
        println!("------");
        for kind in [
            CrawlErrorKind::Transport,
            CrawlErrorKind::Parse,
            CrawlErrorKind::Extraction,
        ] {
            let count = result.errors_of(kind).count();
            if count > 0 {
                println!("{kind:?}: {count}");
            }
        }
        for error in result.errors.iter().take(10) {
            println!(
                "  {} ({} attempts): {}",
                error.url,
                error.attempts,
                truncate_text(&error.message, 120)
            );
        }
    }
}
