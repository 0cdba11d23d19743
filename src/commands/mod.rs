pub mod crawl;
pub mod matching;

pub use crawl::{crawl, CrawlArgs};
pub use matching::match_interests;

use profscout::models::MatchResult;

/// Print the top `k` matches as a table
pub(crate) fn print_ranking(ranked: &[MatchResult], k: usize) {
    println!("\nTop Matches");
    println!("===========");

    if ranked.is_empty() {
        println!("No professors to rank");
        return;
    }

    for (idx, result) in ranked.iter().take(k).enumerate() {
        let name = result.professor.name.as_deref().unwrap_or("(unnamed)");
        println!("{:>2}. {:.3}  {name}", idx + 1, result.score);
        println!(
            "      {} (professor page confidence {:.0}%)",
            result.professor.source_url,
            result.professor.confidence * 100.0
        );

        if !result.matched_terms.is_empty() {
            let terms: Vec<_> = result.matched_terms.iter().map(String::as_str).collect();
            println!("      matched: {}", terms.join(", "));
        }
        if !result.fuzzy_terms.is_empty() {
            let terms: Vec<_> = result.fuzzy_terms.iter().map(String::as_str).collect();
            println!("      related: {}", terms.join(", "));
        }
    }
}
