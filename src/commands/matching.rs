use anyhow::{Context, Result};
use std::path::Path;

use profscout::config::Config;
use profscout::matching::Scorer;
use profscout::models::{CrawlResult, SimilarityQuery};

use super::print_ranking;

/// Rank the professors of a saved crawl result against a list of interests
pub async fn match_interests(config: Config, input: &Path, interests: &str, top: usize) -> Result<()> {
    let content = tokio::fs::read_to_string(input)
        .await
        .with_context(|| format!("Failed to read {}", input.display()))?;
    let result: CrawlResult =
        serde_json::from_str(&content).context("Input is not a saved crawl result")?;

    let query = SimilarityQuery::parse_list(interests);
    if query.is_empty() {
        anyhow::bail!("No interests given");
    }

    println!(
        "Matching {} interests against {} professors from {}",
        query.query_interests.len(),
        result.professors.len(),
        result.seed_url
    );

    let ranked = Scorer::new(config.scoring).rank_result(&query, &result);
    print_ranking(&ranked, top);

    Ok(())
}
