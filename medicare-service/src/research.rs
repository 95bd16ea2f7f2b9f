use anyhow::anyhow;
use serde_json::{Value, json};
use tracing::{info, warn};

use crate::models::ResearchResult;

const TAVILY_URL: &str = "https://api.tavily.com/search";

/// Search recent medical literature and health sources via the Tavily API.
///
/// A failed or empty search returns an empty list rather than an error, so
/// the route can still answer with a summary of "nothing found".
pub async fn search_medical_research(
    query: &str,
    max_results: u8,
) -> anyhow::Result<Vec<ResearchResult>> {
    let api_key = std::env::var("TAVILY_API_KEY")
        .map_err(|_| anyhow!("TAVILY_API_KEY not set"))?;

    let client = reqwest::Client::new();
    let payload = json!({
        "api_key": api_key,
        "query": format!("medical research {}", query),
        "max_results": max_results,
        "search_depth": "basic"
    });

    let response = client.post(TAVILY_URL).json(&payload).send().await?;

    if !response.status().is_success() {
        return Err(anyhow!("Search API request failed: {}", response.status()));
    }

    let body: Value = response.json().await?;
    let results = parse_search_results(&body);

    if results.is_empty() {
        warn!(query = %query, "Search returned no results");
    } else {
        info!(query = %query, count = results.len(), "Search completed");
    }

    Ok(results)
}

fn parse_search_results(body: &Value) -> Vec<ResearchResult> {
    let Some(entries) = body["results"].as_array() else {
        return Vec::new();
    };

    entries
        .iter()
        .filter_map(|entry| {
            Some(ResearchResult {
                title: entry["title"].as_str()?.to_string(),
                url: entry["url"].as_str()?.to_string(),
                content: entry["content"].as_str().unwrap_or_default().to_string(),
                score: entry["score"].as_f64().unwrap_or(0.0),
            })
        })
        .collect()
}

/// Prompt asking the chat pipeline for a short digest of the top results.
pub fn summary_prompt(results: &[ResearchResult]) -> String {
    let results_text = results
        .iter()
        .take(3)
        .map(|r| format!("Source: {}\n{}", r.title, r.content))
        .collect::<Vec<_>>()
        .join("\n\n");

    format!(
        "Based on these medical research results, provide a brief summary in 2-3 sentences:\n\n{}\n\nFocus on the key takeaways and most important information.",
        results_text
    )
}
