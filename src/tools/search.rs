//! Web and news search
//!
//! Two independent sub-fetches run concurrently:
//! - general results: DuckDuckGo text + DuckDuckGo news
//! - news summaries: Google News article URLs, each summarized from its page
//!
//! One failing sub-fetch leaves its lists empty; only when both fail is the
//! call reported as an error. Each sub-fetch runs under its own deadline,
//! shorter than the caller's retrieval deadline, so a slow one is dropped
//! instead of taking the whole call down with it.

use crate::deadline::with_deadline;
use crate::error::AssistantError;
use crate::models::{
    NewsResult, NewsSummary, SearchResults, TextResult, ToolPayload, ToolRequest, ToolResult,
    SEARCH_TOOL,
};
use crate::tools::{build_http_client, mismatched_request, Tool};
use crate::Result;
use async_trait::async_trait;
use chrono::DateTime;
use reqwest::Client;
use scraper::{Html, Selector};
use serde_json::{json, Value};
use std::sync::Arc;
use std::time::{Duration, Instant};
use tracing::{debug, warn};
use url::Url;

const MAX_TEXT_RESULTS: usize = 5;
const MAX_NEWS_RESULTS: usize = 3;
const MAX_NEWS_URLS: usize = 5;
const SUMMARY_CHARS: usize = 250;

/// Hosts never treated as news articles
const BLOCKED_URL_PREFIXES: &[&str] = &[
    "https://www.google.com",
    "https://maps.google.com",
    "https://play.google.com",
    "https://policies.google.com",
    "https://support.google.com",
    "https://accounts.google",
];

#[async_trait]
pub trait SearchProvider: Send + Sync {
    async fn text(&self, query: &str, max_results: usize) -> Result<Vec<TextResult>>;
    async fn news(&self, query: &str, max_results: usize) -> Result<Vec<NewsResult>>;
    async fn news_urls(&self, query: &str, max_results: usize) -> Result<Vec<String>>;
    async fn article(&self, url: &str) -> Result<NewsSummary>;
}

pub struct WebSearchTool {
    provider: Arc<dyn SearchProvider>,
    sub_fetch_limit: Duration,
}

impl WebSearchTool {
    /// `retrieval` is the deadline the caller puts around the whole search
    pub fn new(provider: Arc<dyn SearchProvider>, retrieval: Duration) -> Self {
        Self {
            provider,
            sub_fetch_limit: retrieval * 4 / 5,
        }
    }

    pub async fn search(&self, query: &str) -> ToolResult {
        let query = query.trim();
        if query.is_empty() {
            return ToolResult::error("search query must not be empty");
        }

        let start = Instant::now();
        let (general, summaries) =
            tokio::join!(self.fetch_general(query), self.fetch_summaries(query));

        match (general, summaries) {
            (Err(general_err), Err(summary_err)) => {
                warn!(
                    %query,
                    general = %general_err,
                    summaries = %summary_err,
                    "Both search sub-fetches failed"
                );
                ToolResult::error(format!("Search failed: {}", general_err))
            }
            (general, summaries) => {
                let (text_results, news_results) = general.unwrap_or_else(|e| {
                    warn!(%query, error = %e, "General search failed, continuing with news summaries");
                    (vec![], vec![])
                });
                let news_summaries = summaries.unwrap_or_else(|e| {
                    warn!(%query, error = %e, "News summary fetch failed, continuing with general results");
                    vec![]
                });

                debug!(
                    %query,
                    text = text_results.len(),
                    news = news_results.len(),
                    summaries = news_summaries.len(),
                    elapsed_ms = start.elapsed().as_millis() as u64,
                    "Search completed"
                );

                ToolResult::Success(ToolPayload::Search(SearchResults {
                    text_results,
                    news_results,
                    news_summaries,
                }))
            }
        }
    }

    async fn fetch_general(&self, query: &str) -> Result<(Vec<TextResult>, Vec<NewsResult>)> {
        with_deadline("general search", self.sub_fetch_limit, async {
            tokio::try_join!(
                self.provider.text(query, MAX_TEXT_RESULTS),
                self.provider.news(query, MAX_NEWS_RESULTS)
            )
        })
        .await
    }

    /// Articles already summarized are kept when the budget runs out
    async fn fetch_summaries(&self, query: &str) -> Result<Vec<NewsSummary>> {
        let deadline = tokio::time::Instant::now() + self.sub_fetch_limit;
        let urls = with_deadline(
            "news discovery",
            self.sub_fetch_limit,
            self.provider.news_urls(query, MAX_NEWS_URLS),
        )
        .await?;

        let mut summaries = Vec::with_capacity(urls.len());
        for url in urls {
            let remaining = deadline.saturating_duration_since(tokio::time::Instant::now());
            if remaining.is_zero() {
                warn!(
                    %url,
                    kept = summaries.len(),
                    "Summary budget spent, skipping remaining articles"
                );
                break;
            }
            match with_deadline("article", remaining, self.provider.article(&url)).await {
                Ok(summary) => summaries.push(summary),
                Err(e) => warn!(%url, error = %e, "Skipping article"),
            }
        }

        Ok(summaries)
    }
}

#[async_trait]
impl Tool for WebSearchTool {
    fn name(&self) -> &'static str {
        SEARCH_TOOL
    }

    fn description(&self) -> &'static str {
        "Search the web for stock-related information. Returns general search results, recent news articles and short article summaries. Example queries: \"AAPL stock price today\", \"Tesla earnings report\"."
    }

    fn parameters(&self) -> Value {
        json!({
            "type": "object",
            "properties": {
                "query": { "type": "string", "description": "Search query" }
            },
            "required": ["query"]
        })
    }

    async fn execute(&self, request: &ToolRequest) -> ToolResult {
        match request {
            ToolRequest::Search(args) => self.search(&args.query).await,
            other => mismatched_request(SEARCH_TOOL, other),
        }
    }
}

//
// ================= Live Provider =================
//

/// DuckDuckGo for general results and news, Google News for article discovery
pub struct DuckDuckGoProvider {
    client: Client,
}

impl DuckDuckGoProvider {
    pub fn new(timeout: Duration) -> Result<Self> {
        Ok(Self {
            client: build_http_client(timeout)?,
        })
    }

    async fn get_text(&self, url: &str, query: &[(&str, &str)]) -> Result<String> {
        let response = self
            .client
            .get(url)
            .query(query)
            .send()
            .await
            .map_err(|e| AssistantError::Retrieval(format!("request to {} failed: {}", url, e)))?;

        let status = response.status();
        if !status.is_success() {
            return Err(AssistantError::Retrieval(format!(
                "{} returned {}",
                url, status
            )));
        }

        response
            .text()
            .await
            .map_err(|e| AssistantError::Retrieval(format!("unreadable body from {}: {}", url, e)))
    }
}

#[async_trait]
impl SearchProvider for DuckDuckGoProvider {
    async fn text(&self, query: &str, max_results: usize) -> Result<Vec<TextResult>> {
        let response = self
            .client
            .post("https://html.duckduckgo.com/html/")
            .form(&[("q", query)])
            .send()
            .await
            .map_err(|e| AssistantError::Retrieval(format!("DuckDuckGo search failed: {}", e)))?;

        if !response.status().is_success() {
            return Err(AssistantError::Retrieval(format!(
                "DuckDuckGo search returned {}",
                response.status()
            )));
        }

        let body = response.text().await.map_err(|e| {
            AssistantError::Retrieval(format!("DuckDuckGo body unreadable: {}", e))
        })?;

        Ok(parse_duckduckgo_html(&body, max_results))
    }

    async fn news(&self, query: &str, max_results: usize) -> Result<Vec<NewsResult>> {
        let landing = self.get_text("https://duckduckgo.com/", &[("q", query)]).await?;
        let vqd = extract_vqd(&landing).ok_or_else(|| {
            AssistantError::Retrieval("DuckDuckGo news token not found".to_string())
        })?;

        let body = self
            .get_text(
                "https://duckduckgo.com/news.js",
                &[
                    ("l", "us-en"),
                    ("o", "json"),
                    ("noamp", "1"),
                    ("q", query),
                    ("vqd", vqd.as_str()),
                    ("p", "-1"),
                ],
            )
            .await?;

        let value: Value = serde_json::from_str(&body)?;
        Ok(parse_duckduckgo_news(&value, max_results))
    }

    async fn news_urls(&self, query: &str, max_results: usize) -> Result<Vec<String>> {
        let search_query = format!("{} news", query);
        let body = self
            .get_text(
                "https://www.google.com/search",
                &[("q", search_query.as_str()), ("tbm", "nws")],
            )
            .await?;

        Ok(extract_news_urls(&body, max_results))
    }

    async fn article(&self, url: &str) -> Result<NewsSummary> {
        let body = self.get_text(url, &[]).await?;
        summarize_article(url, &body)
    }
}

//
// ================= HTML / JSON Parsing =================
//

fn selector(css: &str) -> Option<Selector> {
    Selector::parse(css).ok()
}

fn collapse_whitespace(text: &str) -> String {
    text.split_whitespace().collect::<Vec<_>>().join(" ")
}

fn strip_tags(fragment: &str) -> String {
    let parsed = Html::parse_fragment(fragment);
    collapse_whitespace(&parsed.root_element().text().collect::<String>())
}

/// DuckDuckGo wraps outbound links in `/l/?uddg=<target>`
fn resolve_duckduckgo_link(href: &str) -> String {
    let absolute = if href.starts_with("//") {
        format!("https:{}", href)
    } else if href.starts_with('/') {
        format!("https://duckduckgo.com{}", href)
    } else {
        href.to_string()
    };

    Url::parse(&absolute)
        .ok()
        .filter(|u| u.path() == "/l/")
        .and_then(|u| {
            u.query_pairs()
                .find(|(k, _)| k == "uddg")
                .map(|(_, v)| v.into_owned())
        })
        .unwrap_or(absolute)
}

fn parse_duckduckgo_html(html: &str, max_results: usize) -> Vec<TextResult> {
    let (Some(result_sel), Some(title_sel), Some(snippet_sel)) = (
        selector("div.result"),
        selector("a.result__a"),
        selector(".result__snippet"),
    ) else {
        return vec![];
    };

    let document = Html::parse_document(html);

    document
        .select(&result_sel)
        .filter(|el| !el.value().classes().any(|c| c == "result--ad"))
        .filter_map(|el| {
            let anchor = el.select(&title_sel).next()?;
            let href = anchor.value().attr("href")?;
            let snippet = el
                .select(&snippet_sel)
                .next()
                .map(|s| collapse_whitespace(&s.text().collect::<String>()))
                .unwrap_or_default();

            Some(TextResult {
                title: collapse_whitespace(&anchor.text().collect::<String>()),
                snippet,
                link: resolve_duckduckgo_link(href),
            })
        })
        .take(max_results)
        .collect()
}

fn extract_vqd(html: &str) -> Option<String> {
    for (open, close) in [("vqd=\"", "\""), ("vqd=", "&"), ("vqd='", "'")] {
        if let Some(start) = html.find(open) {
            let rest = &html[start + open.len()..];
            if let Some(end) = rest.find(close) {
                let token = &rest[..end];
                if !token.is_empty() {
                    return Some(token.to_string());
                }
            }
        }
    }
    None
}

fn parse_duckduckgo_news(value: &Value, max_results: usize) -> Vec<NewsResult> {
    let Some(results) = value.get("results").and_then(Value::as_array) else {
        return vec![];
    };

    let field = |item: &Value, key: &str| {
        item.get(key)
            .and_then(Value::as_str)
            .unwrap_or_default()
            .to_string()
    };

    results
        .iter()
        .filter_map(|item| {
            let link = field(item, "url");
            if link.is_empty() {
                return None;
            }
            let date = item
                .get("date")
                .and_then(Value::as_i64)
                .and_then(|ts| DateTime::from_timestamp(ts, 0))
                .map(|dt| dt.to_rfc3339())
                .unwrap_or_default();

            Some(NewsResult {
                title: strip_tags(&field(item, "title")),
                snippet: strip_tags(&field(item, "excerpt")),
                link,
                date,
            })
        })
        .take(max_results)
        .collect()
}

fn extract_news_urls(html: &str, max_results: usize) -> Vec<String> {
    let Some(anchor_sel) = selector("a[href]") else {
        return vec![];
    };

    let document = Html::parse_document(html);
    let mut urls: Vec<String> = Vec::new();

    for anchor in document.select(&anchor_sel) {
        let Some(href) = anchor.value().attr("href") else {
            continue;
        };
        if !href.contains("/url?q=") {
            continue;
        }

        let target = href
            .rsplit("/url?q=")
            .next()
            .and_then(|rest| rest.split('&').next())
            .unwrap_or_default();

        let allowed = target.contains("http")
            && !target.contains("msn")
            && !BLOCKED_URL_PREFIXES.iter().any(|b| target.contains(b));

        if allowed && !urls.iter().any(|u| u == target) {
            urls.push(target.to_string());
            if urls.len() >= max_results {
                break;
            }
        }
    }

    urls
}

fn summarize_article(url: &str, html: &str) -> Result<NewsSummary> {
    let source = Url::parse(url)
        .ok()
        .and_then(|u| u.host_str().map(str::to_string))
        .ok_or_else(|| AssistantError::Retrieval(format!("invalid article url: {}", url)))?;

    let document = Html::parse_document(html);

    let meta = |css: &str| -> Option<String> {
        let sel = selector(css)?;
        document
            .select(&sel)
            .next()?
            .value()
            .attr("content")
            .map(collapse_whitespace)
            .filter(|s| !s.is_empty())
    };

    let title = meta(r#"meta[property="og:title"]"#)
        .or_else(|| {
            let sel = selector("title")?;
            document
                .select(&sel)
                .next()
                .map(|t| collapse_whitespace(&t.text().collect::<String>()))
                .filter(|s| !s.is_empty())
        })
        .unwrap_or_default();

    let description = meta(r#"meta[property="og:description"]"#)
        .or_else(|| meta(r#"meta[name="description"]"#));

    let summary = match description {
        Some(description) => description,
        None => {
            let body = selector("p")
                .map(|sel| {
                    document
                        .select(&sel)
                        .map(|p| collapse_whitespace(&p.text().collect::<String>()))
                        .filter(|p| !p.is_empty())
                        .collect::<Vec<_>>()
                        .join(" ")
                })
                .unwrap_or_default();
            body.chars().take(SUMMARY_CHARS).collect()
        }
    };

    if title.is_empty() && summary.is_empty() {
        return Err(AssistantError::Retrieval(format!(
            "no readable content at {}",
            url
        )));
    }

    Ok(NewsSummary {
        title,
        summary,
        source,
        url: url.to_string(),
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::Timeouts;

    const RETRIEVAL: Duration = Duration::from_secs(30);

    /// Provider with per-source canned output
    #[derive(Default)]
    struct FakeProvider {
        fail_text: bool,
        fail_news_urls: bool,
        broken_articles: Vec<String>,
        article_delay: Option<Duration>,
        news_urls_delay: Option<Duration>,
    }

    #[async_trait]
    impl SearchProvider for FakeProvider {
        async fn text(&self, query: &str, max_results: usize) -> Result<Vec<TextResult>> {
            if self.fail_text {
                return Err(AssistantError::Retrieval("ratelimited".to_string()));
            }
            Ok((0..max_results)
                .map(|i| TextResult {
                    title: format!("{} result {}", query, i),
                    snippet: "snippet".to_string(),
                    link: format!("https://example.com/{}", i),
                })
                .collect())
        }

        async fn news(&self, query: &str, max_results: usize) -> Result<Vec<NewsResult>> {
            Ok((0..max_results)
                .map(|i| NewsResult {
                    title: format!("{} headline {}", query, i),
                    snippet: "excerpt".to_string(),
                    link: format!("https://news.example.com/{}", i),
                    date: "2024-05-01T12:00:00+00:00".to_string(),
                })
                .collect())
        }

        async fn news_urls(&self, _query: &str, max_results: usize) -> Result<Vec<String>> {
            if let Some(delay) = self.news_urls_delay {
                tokio::time::sleep(delay).await;
            }
            if self.fail_news_urls {
                return Err(AssistantError::Retrieval("blocked".to_string()));
            }
            Ok((0..max_results)
                .map(|i| format!("https://press.example.org/story-{}", i))
                .collect())
        }

        async fn article(&self, url: &str) -> Result<NewsSummary> {
            if let Some(delay) = self.article_delay {
                tokio::time::sleep(delay).await;
            }
            if self.broken_articles.iter().any(|b| b == url) {
                return Err(AssistantError::Retrieval("404".to_string()));
            }
            Ok(NewsSummary {
                title: "Story".to_string(),
                summary: "Summary".to_string(),
                source: "press.example.org".to_string(),
                url: url.to_string(),
            })
        }
    }

    fn results(result: ToolResult) -> SearchResults {
        match result {
            ToolResult::Success(ToolPayload::Search(results)) => results,
            other => panic!("expected search payload, got {:?}", other),
        }
    }

    #[tokio::test]
    async fn test_search_combines_both_sub_fetches() {
        let tool = WebSearchTool::new(Arc::new(FakeProvider::default()), RETRIEVAL);
        let results = results(tool.search("AAPL stock price today").await);

        assert_eq!(results.text_results.len(), MAX_TEXT_RESULTS);
        assert_eq!(results.news_results.len(), MAX_NEWS_RESULTS);
        assert_eq!(results.news_summaries.len(), MAX_NEWS_URLS);
    }

    #[tokio::test]
    async fn test_general_failure_keeps_summaries() {
        let provider = FakeProvider {
            fail_text: true,
            ..Default::default()
        };
        let tool = WebSearchTool::new(Arc::new(provider), RETRIEVAL);
        let results = results(tool.search("TSLA").await);

        assert!(results.text_results.is_empty());
        assert!(results.news_results.is_empty());
        assert_eq!(results.news_summaries.len(), MAX_NEWS_URLS);
    }

    #[tokio::test]
    async fn test_summary_failure_keeps_general_results() {
        let provider = FakeProvider {
            fail_news_urls: true,
            ..Default::default()
        };
        let tool = WebSearchTool::new(Arc::new(provider), RETRIEVAL);
        let results = results(tool.search("TSLA").await);

        assert_eq!(results.text_results.len(), MAX_TEXT_RESULTS);
        assert!(results.news_summaries.is_empty());
    }

    /// Runs the search under the same outer deadline the agent applies
    async fn search_within_retrieval(tool: &WebSearchTool, query: &str) -> Result<ToolResult> {
        with_deadline("retrieval", Timeouts::default().retrieval, async {
            Ok(tool.search(query).await)
        })
        .await
    }

    #[tokio::test(start_paused = true)]
    async fn test_slow_articles_keep_general_results() {
        let provider = FakeProvider {
            article_delay: Some(Duration::from_secs(10)),
            ..Default::default()
        };
        let tool = WebSearchTool::new(Arc::new(provider), Timeouts::default().retrieval);

        let result = tokio_test::assert_ok!(search_within_retrieval(&tool, "AAPL").await);
        assert_eq!(result.to_json()["status"], "success");

        let results = results(result);
        assert_eq!(results.text_results.len(), MAX_TEXT_RESULTS);
        assert_eq!(results.news_results.len(), MAX_NEWS_RESULTS);
        // 24s budget: two 10s articles fit, the third is cut off
        assert_eq!(results.news_summaries.len(), 2);
    }

    #[tokio::test(start_paused = true)]
    async fn test_hung_news_discovery_keeps_general_results() {
        let provider = FakeProvider {
            news_urls_delay: Some(Duration::from_secs(3600)),
            ..Default::default()
        };
        let tool = WebSearchTool::new(Arc::new(provider), Timeouts::default().retrieval);

        let results = results(tokio_test::assert_ok!(
            search_within_retrieval(&tool, "TSLA").await
        ));
        assert_eq!(results.text_results.len(), MAX_TEXT_RESULTS);
        assert!(results.news_summaries.is_empty());
    }

    #[tokio::test]
    async fn test_both_failures_is_error() {
        let provider = FakeProvider {
            fail_text: true,
            fail_news_urls: true,
            ..Default::default()
        };
        let tool = WebSearchTool::new(Arc::new(provider), RETRIEVAL);
        let result = tool.search("TSLA").await;

        let json = result.to_json();
        assert_eq!(json["status"], "error");
        assert!(json.get("results").is_none());
    }

    #[tokio::test]
    async fn test_broken_articles_are_skipped() {
        let provider = FakeProvider {
            broken_articles: vec!["https://press.example.org/story-1".to_string()],
            ..Default::default()
        };
        let tool = WebSearchTool::new(Arc::new(provider), RETRIEVAL);
        let results = results(tool.search("NVDA").await);

        assert_eq!(results.news_summaries.len(), MAX_NEWS_URLS - 1);
        assert!(results
            .news_summaries
            .iter()
            .all(|s| s.url != "https://press.example.org/story-1"));
    }

    #[tokio::test]
    async fn test_empty_query_rejected() {
        let tool = WebSearchTool::new(Arc::new(FakeProvider::default()), RETRIEVAL);
        assert!(!tool.search("   ").await.is_success());
    }

    #[test]
    fn test_parse_duckduckgo_html() {
        let html = r#"
            <div class="result results_links result--ad">
                <a class="result__a" href="https://ads.example.com">Sponsored</a>
            </div>
            <div class="result results_links">
                <h2><a class="result__a" href="//duckduckgo.com/l/?uddg=https%3A%2F%2Ffinance.yahoo.com%2Fquote%2FAAPL%2F&amp;rut=abc">Apple Inc. (AAPL)   Stock Price</a></h2>
                <a class="result__snippet">Find the latest <b>Apple</b> stock quote.</a>
            </div>
            <div class="result results_links">
                <a class="result__a" href="https://www.nasdaq.com/market-activity/stocks/aapl">AAPL Nasdaq</a>
            </div>
        "#;

        let results = parse_duckduckgo_html(html, 5);
        assert_eq!(results.len(), 2);
        assert_eq!(results[0].title, "Apple Inc. (AAPL) Stock Price");
        assert_eq!(results[0].link, "https://finance.yahoo.com/quote/AAPL/");
        assert_eq!(results[0].snippet, "Find the latest Apple stock quote.");
        assert_eq!(results[1].snippet, "");
    }

    #[test]
    fn test_extract_vqd_variants() {
        assert_eq!(
            extract_vqd(r#"<script>vqd="4-1234567";</script>"#).as_deref(),
            Some("4-1234567")
        );
        assert_eq!(
            extract_vqd("/d.js?q=aapl&vqd=4-999&p=1").as_deref(),
            Some("4-999")
        );
        assert_eq!(extract_vqd("<html></html>"), None);
    }

    #[test]
    fn test_parse_duckduckgo_news() {
        let value = json!({
            "results": [
                { "title": "Apple <b>beats</b> estimates", "excerpt": "Shares rose", "url": "https://news.example.com/a", "date": 1714564800 },
                { "title": "No url", "excerpt": "skip me" },
                { "title": "Second", "excerpt": "", "url": "https://news.example.com/b" }
            ]
        });

        let news = parse_duckduckgo_news(&value, 3);
        assert_eq!(news.len(), 2);
        assert_eq!(news[0].title, "Apple beats estimates");
        assert!(news[0].date.starts_with("2024-05-01"));
        assert_eq!(news[1].date, "");
    }

    #[test]
    fn test_extract_news_urls_filters_and_dedups() {
        let html = r#"
            <a href="/url?q=https://www.reuters.com/markets/apple-1&amp;sa=U">Reuters</a>
            <a href="/url?q=https://www.reuters.com/markets/apple-1&amp;sa=U">Reuters again</a>
            <a href="/url?q=https://maps.google.com/place&amp;sa=U">Maps</a>
            <a href="/url?q=https://www.msn.com/en-us/money&amp;sa=U">MSN</a>
            <a href="/search?q=more">More</a>
            <a href="/url?q=https://www.cnbc.com/apple-2&amp;sa=U">CNBC</a>
            <a href="/url?q=https://www.ft.com/apple-3&amp;sa=U">FT</a>
        "#;

        let urls = extract_news_urls(html, 2);
        assert_eq!(
            urls,
            vec![
                "https://www.reuters.com/markets/apple-1".to_string(),
                "https://www.cnbc.com/apple-2".to_string(),
            ]
        );
    }

    #[test]
    fn test_summarize_article_prefers_meta_description() {
        let html = r#"
            <html><head>
                <title>Fallback title</title>
                <meta property="og:title" content="Apple hits record high">
                <meta name="description" content="Apple shares closed at a record.">
            </head><body><p>Body text.</p></body></html>
        "#;

        let summary = summarize_article("https://www.cnbc.com/2024/apple.html", html).unwrap();
        assert_eq!(summary.title, "Apple hits record high");
        assert_eq!(summary.summary, "Apple shares closed at a record.");
        assert_eq!(summary.source, "www.cnbc.com");
    }

    #[test]
    fn test_summarize_article_truncates_body() {
        let paragraph = "word ".repeat(200);
        let html = format!(
            "<html><head><title>Long read</title></head><body><p>{}</p></body></html>",
            paragraph
        );

        let summary = summarize_article("https://example.com/long", &html).unwrap();
        assert_eq!(summary.title, "Long read");
        assert_eq!(summary.summary.chars().count(), SUMMARY_CHARS);
    }

    #[test]
    fn test_summarize_article_rejects_empty_page() {
        assert!(summarize_article("https://example.com/empty", "<html></html>").is_err());
        assert!(summarize_article("not a url", "<title>x</title>").is_err());
    }
}
