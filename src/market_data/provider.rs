// =============================================================================
// Chart Data Provider Client — daily bars by ticker
// =============================================================================
//
// Talks to a Yahoo-style `v8/finance/chart` endpoint. The response is turned
// into a `RawTable` whose column labels are `(Field, TICKER)` pairs, the same
// multi-level header shape ticker data libraries hand out. Flattening and
// cleaning are left to the preparation pipeline.
// =============================================================================

use anyhow::{bail, Context, Result};
use chrono::{DateTime, NaiveDate};
use reqwest::header::{HeaderMap, HeaderValue, USER_AGENT};
use tracing::{debug, info, instrument};

use crate::table::{ColumnLabel, RawCell, RawColumn, RawTable, RowKey};

/// Quote fields read from `indicators.quote[0]`, with their column names.
const QUOTE_FIELDS: &[(&str, &str)] = &[
    ("open", "Open"),
    ("high", "High"),
    ("low", "Low"),
    ("close", "Close"),
    ("volume", "Volume"),
];

/// HTTP client for the chart endpoint.
#[derive(Clone)]
pub struct ChartProviderClient {
    base_url: String,
    client: reqwest::Client,
}

impl ChartProviderClient {
    pub fn new(base_url: impl Into<String>) -> Result<Self> {
        let mut default_headers = HeaderMap::new();
        default_headers.insert(USER_AGENT, HeaderValue::from_static("stock-analyzer/1.0"));

        let client = reqwest::Client::builder()
            .default_headers(default_headers)
            .timeout(std::time::Duration::from_secs(15))
            .build()
            .context("failed to build HTTP client")?;

        let base_url = base_url.into().trim_end_matches('/').to_string();
        debug!(base_url = %base_url, "ChartProviderClient initialised");

        Ok(Self { base_url, client })
    }

    /// GET daily bars for `ticker` in `[start, end)`.
    #[instrument(skip(self), name = "provider::fetch_daily")]
    pub async fn fetch_daily(&self, ticker: &str, start: NaiveDate, end: NaiveDate) -> Result<RawTable> {
        if end <= start {
            bail!("end date {end} must be after start date {start}");
        }
        let ticker = ticker.trim().to_uppercase();
        let url = chart_url(&self.base_url, &ticker, start, end);

        let resp = self
            .client
            .get(&url)
            .send()
            .await
            .with_context(|| format!("GET chart for {ticker} failed"))?;

        let status = resp.status();
        let body: serde_json::Value = resp
            .json()
            .await
            .context("failed to parse chart response")?;

        if !status.is_success() {
            bail!("chart endpoint returned {} for {}: {}", status, ticker, body);
        }

        let table = parse_chart_response(&ticker, &body)?;
        info!(ticker = %ticker, rows = table.row_count(), "daily bars fetched");
        Ok(table)
    }
}

impl std::fmt::Debug for ChartProviderClient {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ChartProviderClient")
            .field("base_url", &self.base_url)
            .finish()
    }
}

pub fn chart_url(base_url: &str, ticker: &str, start: NaiveDate, end: NaiveDate) -> String {
    let epoch = |d: NaiveDate| d.and_hms_opt(0, 0, 0).map_or(0, |ts| ts.and_utc().timestamp());
    format!(
        "{}/v8/finance/chart/{}?period1={}&period2={}&interval=1d&events=history",
        base_url,
        ticker,
        epoch(start),
        epoch(end)
    )
}

/// Convert a chart response body into a raw table with composite labels.
///
/// Expected shape:
/// ```json
/// { "chart": { "result": [ {
///     "timestamp": [1704205800, ...],
///     "indicators": {
///       "quote": [ { "open": [..], "high": [..], "low": [..], "close": [..], "volume": [..] } ],
///       "adjclose": [ { "adjclose": [..] } ]
///     } } ], "error": null } }
/// ```
pub fn parse_chart_response(ticker: &str, body: &serde_json::Value) -> Result<RawTable> {
    let chart = &body["chart"];
    if let Some(err) = chart["error"].as_object() {
        let description = err
            .get("description")
            .and_then(|d| d.as_str())
            .unwrap_or("unknown error");
        bail!("provider error for {ticker}: {description}");
    }

    let result = chart["result"]
        .as_array()
        .and_then(|r| r.first())
        .context("chart response missing 'result'")?;

    let timestamps = match result["timestamp"].as_array() {
        Some(ts) if !ts.is_empty() => ts,
        _ => bail!("no data returned for {ticker} in the selected range"),
    };

    let index = timestamps
        .iter()
        .map(|t| {
            t.as_i64()
                .and_then(|secs| DateTime::from_timestamp(secs, 0))
                .and_then(|dt| dt.date_naive().and_hms_opt(0, 0, 0))
                .map(RowKey::Timestamp)
                .with_context(|| format!("invalid timestamp {t}"))
        })
        .collect::<Result<Vec<_>>>()?;

    let quote = &result["indicators"]["quote"][0];
    if !quote.is_object() {
        bail!("chart response missing 'indicators.quote'");
    }

    let mut columns = Vec::with_capacity(QUOTE_FIELDS.len() + 1);
    for (key, name) in QUOTE_FIELDS {
        if let Some(values) = quote[*key].as_array() {
            columns.push(composite_column(name, ticker, values, index.len()));
        }
    }
    if let Some(values) = result["indicators"]["adjclose"][0]["adjclose"].as_array() {
        // Keep the provider's column order: Adj Close sits after Close.
        let position = columns
            .iter()
            .position(|c| c.label.primary() == "Close")
            .map_or(columns.len(), |i| i + 1);
        columns.insert(position, composite_column("Adj Close", ticker, values, index.len()));
    }

    Ok(RawTable::new(index, columns))
}

fn composite_column(name: &str, ticker: &str, values: &[serde_json::Value], rows: usize) -> RawColumn {
    let cells = (0..rows)
        .map(|i| match values.get(i) {
            Some(serde_json::Value::Number(n)) => n.as_f64().map_or(RawCell::Empty, RawCell::Number),
            Some(serde_json::Value::String(s)) => RawCell::from_text(s),
            _ => RawCell::Empty,
        })
        .collect();
    RawColumn::new(ColumnLabel::composite([name, ticker]), cells)
}
