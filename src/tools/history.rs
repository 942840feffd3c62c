//! Historical price lookup
//!
//! One network call per invocation, no retry. An empty series is reported as
//! a typed "no data" error rather than an empty success.

use crate::error::AssistantError;
use crate::models::{
    HistoryArgs, HistoryQuery, PriceRecord, ToolPayload, ToolRequest, ToolResult, HISTORY_TOOL,
    NO_DATA_MESSAGE,
};
use crate::tools::{build_http_client, mismatched_request, Tool};
use crate::Result;
use async_trait::async_trait;
use chrono::{DateTime, NaiveDate};
use reqwest::Client;
use serde::Deserialize;
use serde_json::{json, Value};
use std::sync::Arc;
use std::time::{Duration, Instant};
use tracing::{debug, warn};

/// Source of daily OHLCV bars
#[async_trait]
pub trait PriceSource: Send + Sync {
    /// Daily records in `[start, end)`, ordered by date. Unknown symbols yield an empty series.
    async fn daily_history(&self, query: &HistoryQuery) -> Result<Vec<PriceRecord>>;
}

pub struct StockHistoryTool {
    source: Arc<dyn PriceSource>,
}

impl StockHistoryTool {
    pub fn new(source: Arc<dyn PriceSource>) -> Self {
        Self { source }
    }

    pub async fn lookup(&self, args: &HistoryArgs) -> ToolResult {
        let query = match args.validate() {
            Ok(query) => query,
            Err(e) => return ToolResult::error(e.to_string()),
        };

        let start = Instant::now();
        match self.source.daily_history(&query).await {
            Ok(records) if records.is_empty() => {
                debug!(ticker = %query.ticker, "No price data in range");
                ToolResult::error(NO_DATA_MESSAGE)
            }
            Ok(records) => {
                debug!(
                    ticker = %query.ticker,
                    rows = records.len(),
                    elapsed_ms = start.elapsed().as_millis() as u64,
                    "Price history fetched"
                );
                ToolResult::Success(ToolPayload::History(records))
            }
            Err(e) => {
                warn!(ticker = %query.ticker, error = %e, "Price history fetch failed");
                ToolResult::error(format!("Failed to fetch history for {}: {}", query.ticker, e))
            }
        }
    }
}

#[async_trait]
impl Tool for StockHistoryTool {
    fn name(&self) -> &'static str {
        HISTORY_TOOL
    }

    fn description(&self) -> &'static str {
        "Fetch daily historical stock prices (open, high, low, close, volume) for a ticker between two dates. Dates use YYYY-MM-DD; the end date is exclusive."
    }

    fn parameters(&self) -> Value {
        json!({
            "type": "object",
            "properties": {
                "ticker": { "type": "string", "description": "Stock symbol, e.g. AAPL" },
                "start_date": { "type": "string", "description": "First day, YYYY-MM-DD" },
                "end_date": { "type": "string", "description": "Day after the last day, YYYY-MM-DD" }
            },
            "required": ["ticker", "start_date", "end_date"]
        })
    }

    async fn execute(&self, request: &ToolRequest) -> ToolResult {
        match request {
            ToolRequest::StockHistory(args) => self.lookup(args).await,
            other => mismatched_request(HISTORY_TOOL, other),
        }
    }
}

//
// ================= Yahoo Finance =================
//

const YAHOO_BASE_URL: &str = "https://query1.finance.yahoo.com";

/// Daily bars from the Yahoo Finance chart API
pub struct YahooFinanceSource {
    client: Client,
    base_url: String,
}

impl YahooFinanceSource {
    pub fn new(timeout: Duration) -> Result<Self> {
        Self::with_base_url(YAHOO_BASE_URL, timeout)
    }

    pub fn with_base_url(base_url: &str, timeout: Duration) -> Result<Self> {
        Ok(Self {
            client: build_http_client(timeout)?,
            base_url: base_url.trim_end_matches('/').to_string(),
        })
    }
}

#[async_trait]
impl PriceSource for YahooFinanceSource {
    async fn daily_history(&self, query: &HistoryQuery) -> Result<Vec<PriceRecord>> {
        let url = format!("{}/v8/finance/chart/{}", self.base_url, query.ticker);

        let response = self
            .client
            .get(&url)
            .query(&[
                ("period1", unix_midnight(query.start).to_string()),
                ("period2", unix_midnight(query.end).to_string()),
                ("interval", "1d".to_string()),
                ("includePrePost", "false".to_string()),
                ("events", "div,splits".to_string()),
            ])
            .send()
            .await
            .map_err(|e| AssistantError::Retrieval(format!("price request failed: {}", e)))?;

        let status = response.status();
        let body = response
            .text()
            .await
            .map_err(|e| AssistantError::Retrieval(format!("price response unreadable: {}", e)))?;

        // Unknown symbols come back as 404 with a structured chart error
        let records = match parse_chart_response(&body) {
            Ok(records) => records,
            Err(_) if !status.is_success() => {
                return Err(AssistantError::Retrieval(format!(
                    "price service returned {}",
                    status
                )))
            }
            Err(e) => return Err(e),
        };

        Ok(records
            .into_iter()
            .filter(|r| r.date >= query.start && r.date < query.end)
            .collect())
    }
}

fn unix_midnight(date: NaiveDate) -> i64 {
    date.and_hms_opt(0, 0, 0)
        .map(|dt| dt.and_utc().timestamp())
        .unwrap_or_default()
}

#[derive(Debug, Deserialize)]
struct ChartEnvelope {
    chart: Chart,
}

#[derive(Debug, Deserialize)]
struct Chart {
    result: Option<Vec<ChartResult>>,
    error: Option<ChartError>,
}

#[derive(Debug, Deserialize)]
struct ChartError {
    code: String,
    #[serde(default)]
    description: String,
}

#[derive(Debug, Deserialize)]
struct ChartResult {
    #[serde(default)]
    meta: ChartMeta,
    #[serde(default)]
    timestamp: Vec<i64>,
    indicators: Indicators,
}

#[derive(Debug, Default, Deserialize)]
struct ChartMeta {
    #[serde(default)]
    gmtoffset: i64,
}

#[derive(Debug, Deserialize)]
struct Indicators {
    #[serde(default)]
    quote: Vec<Quote>,
}

#[derive(Debug, Deserialize)]
struct Quote {
    #[serde(default)]
    open: Vec<Option<f64>>,
    #[serde(default)]
    high: Vec<Option<f64>>,
    #[serde(default)]
    low: Vec<Option<f64>>,
    #[serde(default)]
    close: Vec<Option<f64>>,
    #[serde(default)]
    volume: Vec<Option<f64>>,
}

fn parse_chart_response(body: &str) -> Result<Vec<PriceRecord>> {
    let envelope: ChartEnvelope = serde_json::from_str(body)?;

    if let Some(error) = envelope.chart.error {
        if error.code == "Not Found" {
            return Ok(vec![]);
        }
        return Err(AssistantError::Retrieval(format!(
            "{}: {}",
            error.code, error.description
        )));
    }

    let Some(result) = envelope.chart.result.and_then(|r| r.into_iter().next()) else {
        return Ok(vec![]);
    };
    let Some(quote) = result.indicators.quote.into_iter().next() else {
        return Ok(vec![]);
    };

    let at = |series: &[Option<f64>], i: usize| series.get(i).copied().flatten();

    let mut records: Vec<PriceRecord> = result
        .timestamp
        .iter()
        .enumerate()
        .filter_map(|(i, ts)| {
            let close = at(&quote.close, i)?;
            let date = DateTime::from_timestamp(ts + result.meta.gmtoffset, 0)?.date_naive();
            Some(PriceRecord {
                date,
                open: at(&quote.open, i).unwrap_or(close),
                high: at(&quote.high, i).unwrap_or(close),
                low: at(&quote.low, i).unwrap_or(close),
                close,
                volume: at(&quote.volume, i).unwrap_or(0.0).max(0.0) as u64,
            })
        })
        .collect();

    records.sort_by_key(|r| r.date);
    records.dedup_by_key(|r| r.date);

    Ok(records)
}
