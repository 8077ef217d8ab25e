//! Web search through the Tavily API.

use serde::{Deserialize, Serialize};
use std::time::Duration;
use tracing::debug;

pub const TAVILY_URL: &str = "https://api.tavily.com";

pub const DEFAULT_MAX_RESULTS: u32 = 5;

#[derive(Serialize, Debug)]
struct SearchRequest<'a> {
    query: &'a str,
    max_results: u32,
    include_answer: bool,
}

/// One search hit.
#[derive(Deserialize, Debug, Clone, PartialEq)]
pub struct SearchResult {
    #[serde(default)]
    pub title: String,
    #[serde(default)]
    pub url: String,
    #[serde(default)]
    pub content: String,
    pub score: Option<f64>,
}

#[derive(Deserialize, Debug, Clone, Default, PartialEq)]
pub struct SearchResponse {
    /// Short synthesized answer, when requested and available.
    pub answer: Option<String>,
    #[serde(default)]
    pub results: Vec<SearchResult>,
}

/// Client for the Tavily `/search` endpoint.
pub struct SearchClient {
    client: reqwest::Client,
    api_key: String,
    base_url: String,
}

impl SearchClient {
    pub fn new(api_key: impl Into<String>) -> Result<Self, String> {
        Self::with_base_url(api_key, TAVILY_URL)
    }

    pub fn with_base_url(
        api_key: impl Into<String>,
        base_url: impl Into<String>,
    ) -> Result<Self, String> {
        let client = reqwest::Client::builder()
            .timeout(Duration::from_secs(30))
            .build()
            .map_err(|e| format!("failed to build HTTP client: {e}"))?;
        Ok(Self {
            client,
            api_key: api_key.into(),
            base_url: base_url.into().trim_end_matches('/').to_string(),
        })
    }

    pub async fn search(&self, query: &str, max_results: u32) -> Result<SearchResponse, String> {
        let query = query.trim();
        if query.is_empty() {
            return Err("search query is empty".to_string());
        }
        debug!("Web search: query={query:?}, max_results={max_results}");

        let resp = self
            .client
            .post(format!("{}/search", self.base_url))
            .bearer_auth(&self.api_key)
            .json(&SearchRequest {
                query,
                max_results,
                include_answer: true,
            })
            .send()
            .await
            .map_err(|e| format!("request failed: {e}"))?;

        let status = resp.status();
        let text = resp
            .text()
            .await
            .map_err(|e| format!("failed to read response: {e}"))?;
        if !status.is_success() {
            return Err(format!("Tavily API HTTP {status}: {text}"));
        }

        let parsed: SearchResponse = serde_json::from_str(&text)
            .map_err(|e| format!("failed to parse search response: {e}"))?;
        debug!("Web search returned {} result(s)", parsed.results.len());
        Ok(parsed)
    }
}

/// Render a response as an optional answer followed by numbered results.
pub fn format_results(response: &SearchResponse) -> String {
    let mut out = Vec::new();
    if let Some(answer) = response.answer.as_deref().filter(|a| !a.trim().is_empty()) {
        out.push(format!("Answer: {}", answer.trim()));
    }
    for (i, r) in response.results.iter().enumerate() {
        let title = if r.title.is_empty() { &r.url } else { &r.title };
        let mut entry = format!("{}. {title}\n   {}", i + 1, r.url);
        if !r.content.is_empty() {
            entry.push_str(&format!("\n   {}", r.content.trim()));
        }
        out.push(entry);
    }
    if out.is_empty() {
        return "No results found.".to_string();
    }
    out.join("\n\n")
}

#[cfg(test)]
mod tests {
    use super::*;
    use wiremock::matchers::{body_json, header, method, path};
    use wiremock::{Mock, MockServer, ResponseTemplate};

    fn hit(title: &str, url: &str, content: &str) -> SearchResult {
        SearchResult {
            title: title.into(),
            url: url.into(),
            content: content.into(),
            score: None,
        }
    }

    #[test]
    fn format_numbers_results_after_answer() {
        let response = SearchResponse {
            answer: Some("Rust 1.0 shipped in 2015.".into()),
            results: vec![
                hit("Rust blog", "https://blog.rust-lang.org", "Announcing Rust 1.0"),
                hit("", "https://example.com", ""),
            ],
        };
        let text = format_results(&response);
        assert!(text.starts_with("Answer: Rust 1.0 shipped in 2015."));
        assert!(text.contains("1. Rust blog\n   https://blog.rust-lang.org\n   Announcing Rust 1.0"));
        assert!(text.contains("2. https://example.com\n   https://example.com"));
    }

    #[test]
    fn format_empty_response() {
        assert_eq!(format_results(&SearchResponse::default()), "No results found.");
    }

    #[tokio::test]
    async fn search_posts_query_with_bearer_auth() {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .and(path("/search"))
            .and(header("authorization", "Bearer tvly-key"))
            .and(body_json(serde_json::json!({
                "query": "rust async",
                "max_results": 3,
                "include_answer": true
            })))
            .respond_with(ResponseTemplate::new(200).set_body_json(serde_json::json!({
                "answer": "Use tokio.",
                "results": [{"title": "Tokio", "url": "https://tokio.rs", "content": "runtime", "score": 0.9}]
            })))
            .mount(&server)
            .await;

        let client = SearchClient::with_base_url("tvly-key", format!("{}/", server.uri())).unwrap();
        let response = client.search("  rust async ", 3).await.unwrap();
        assert_eq!(response.answer.as_deref(), Some("Use tokio."));
        assert_eq!(response.results.len(), 1);
        assert_eq!(response.results[0].score, Some(0.9));
    }

    #[tokio::test]
    async fn search_reports_http_errors() {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .respond_with(ResponseTemplate::new(400).set_body_string("plan limit"))
            .mount(&server)
            .await;

        let client = SearchClient::with_base_url("k", server.uri()).unwrap();
        let err = client.search("anything", 5).await.unwrap_err();
        assert!(err.contains("HTTP 400"), "{err}");
    }

    #[tokio::test]
    async fn empty_query_is_rejected_locally() {
        let client = SearchClient::new("k").unwrap();
        assert!(client.search("   ", 5).await.is_err());
    }
}
