//! Web search backend (Tavily-style search API)

use std::time::Duration;

use serde::Deserialize;
use serde_json::json;

const SEARCH_API_URL: &str = "https://api.tavily.com/search";
const REQUEST_TIMEOUT: Duration = Duration::from_secs(10);
const SNIPPET_LIMIT: usize = 200;

pub(crate) const DEFAULT_MAX_RESULTS: u64 = 5;

#[derive(Debug, Deserialize)]
struct SearchResponse {
    #[serde(default)]
    answer: Option<String>,
    #[serde(default)]
    results: Vec<SearchResult>,
}

#[derive(Debug, Deserialize)]
struct SearchResult {
    #[serde(default)]
    title: String,
    #[serde(default)]
    content: String,
    #[serde(default)]
    url: String,
}

pub(crate) async fn search_web(
    http: &reqwest::Client,
    api_key: Option<&str>,
    query: &str,
    max_results: u64,
) -> String {
    let Some(api_key) = api_key else {
        return "Web search unavailable - API key not provided.".to_string();
    };

    let payload = json!({
        "api_key": api_key,
        "query": query,
        "search_depth": "basic",
        "include_answer": true,
        "include_raw_content": false,
        "max_results": max_results,
    });

    let response = match http
        .post(SEARCH_API_URL)
        .timeout(REQUEST_TIMEOUT)
        .json(&payload)
        .send()
        .await
    {
        Ok(response) => response,
        Err(err) => {
            tracing::error!(%err, "web search request failed");
            return "Web search encountered an error.".to_string();
        }
    };

    if !response.status().is_success() {
        tracing::error!(status = %response.status(), "search API error");
        return "Web search temporarily unavailable.".to_string();
    }

    match response.json::<SearchResponse>().await {
        Ok(body) => format_results(&body, max_results),
        Err(err) => {
            tracing::error!(%err, "failed to decode search response");
            "Web search encountered an error.".to_string()
        }
    }
}

fn format_results(body: &SearchResponse, max_results: u64) -> String {
    let mut sections = Vec::new();

    if let Some(answer) = body.answer.as_deref().filter(|a| !a.is_empty()) {
        sections.push(format!("Quick Answer: {answer}"));
    }

    for (i, result) in body.results.iter().take(max_results as usize).enumerate() {
        let mut content = result.content.clone();
        if content.len() > SNIPPET_LIMIT {
            let cut = content
                .char_indices()
                .map(|(idx, _)| idx)
                .take_while(|idx| *idx <= SNIPPET_LIMIT)
                .last()
                .unwrap_or(0);
            content.truncate(cut);
            content.push_str("...");
        }
        sections.push(format!(
            "{}. {}\n{}\nSource: {}",
            i + 1,
            result.title,
            content,
            result.url
        ));
    }

    if sections.is_empty() {
        "No search results found.".to_string()
    } else {
        sections.join("\n\n")
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_format_answer_and_results() {
        let body = SearchResponse {
            answer: Some("42".into()),
            results: vec![SearchResult {
                title: "The Answer".into(),
                content: "short snippet".into(),
                url: "https://example.com".into(),
            }],
        };
        let text = format_results(&body, 5);
        assert!(text.starts_with("Quick Answer: 42"));
        assert!(text.contains("1. The Answer"));
        assert!(text.contains("Source: https://example.com"));
    }

    #[test]
    fn test_format_truncates_long_snippets() {
        let body = SearchResponse {
            answer: None,
            results: vec![SearchResult {
                title: "Long".into(),
                content: "x".repeat(500),
                url: "https://example.com".into(),
            }],
        };
        let text = format_results(&body, 5);
        assert!(text.contains("..."));
        assert!(text.len() < 500);
    }

    #[test]
    fn test_format_respects_max_results() {
        let result = |title: &str| SearchResult {
            title: title.into(),
            content: "c".into(),
            url: "u".into(),
        };
        let body = SearchResponse {
            answer: None,
            results: vec![result("t1"), result("t2")],
        };
        let text = format_results(&body, 1);
        assert!(text.contains("1. t1"));
        assert!(!text.contains("2. t2"));
    }

    #[test]
    fn test_format_empty() {
        let body = SearchResponse {
            answer: None,
            results: vec![],
        };
        assert_eq!(format_results(&body, 5), "No search results found.");
    }
}
