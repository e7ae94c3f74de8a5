use std::time::Duration;

use async_trait::async_trait;
use chrono::{DateTime, Datelike, NaiveDate, Utc};
use futures_util::future::join_all;
use screener_core::{
    Frequency, FundamentalsProvider, FundamentalsRecord, Interval, PriceBar, PriceHistoryProvider,
    ScreenerError, StatementKind, Window,
};

mod chart;
mod timeseries;

pub use chart::parse_chart;
pub use timeseries::parse_timeseries;

const CHART_URL: &str = "https://query2.finance.yahoo.com/v8/finance/chart";
const TIMESERIES_URL: &str =
    "https://query2.finance.yahoo.com/ws/fundamentals-timeseries/v1/finance/timeseries";

/// Years of history requested for statement data.
const FUNDAMENTALS_LOOKBACK_YEARS: i32 = 5;

/// Market-data provider backed by Yahoo Finance's public chart and
/// fundamentals-timeseries endpoints. One request per symbol, fanned out
/// concurrently; a failed symbol degrades to missing rows.
#[derive(Clone)]
pub struct YahooClient {
    client: reqwest::Client,
}

impl YahooClient {
    pub fn new() -> Self {
        Self::with_timeout(Duration::from_secs(30))
    }

    /// Every request carries this bounded timeout; a timeout surfaces as an
    /// empty result for the affected symbol.
    pub fn with_timeout(timeout: Duration) -> Self {
        let client = reqwest::Client::builder()
            .user_agent("Mozilla/5.0 (Windows NT 10.0; Win64; x64) AppleWebKit/537.36")
            .timeout(timeout)
            .build()
            .unwrap_or_else(|_| reqwest::Client::new());
        Self { client }
    }

    async fn get_json(&self, url: &str, query: &[(&str, String)]) -> Result<serde_json::Value, ScreenerError> {
        let response = self
            .client
            .get(url)
            .query(query)
            .send()
            .await
            .map_err(|e| ScreenerError::Provider(e.to_string()))?;

        if !response.status().is_success() {
            return Err(ScreenerError::Provider(format!(
                "HTTP {}: {}",
                response.status(),
                response.text().await.unwrap_or_default()
            )));
        }

        response
            .json()
            .await
            .map_err(|e| ScreenerError::Provider(e.to_string()))
    }

    async fn fetch_symbol_history(
        &self,
        symbol: &str,
        window: &Window,
        interval: Interval,
    ) -> Result<Vec<PriceBar>, ScreenerError> {
        let url = format!("{}/{}", CHART_URL, symbol);
        let mut query = vec![("interval", interval.as_str().to_string())];
        match window {
            Window::Period(period) => query.push(("range", period.clone())),
            Window::Range { start, end } => {
                query.push(("period1", date_to_unix(*start).to_string()));
                // period2 is exclusive; extend by one day to include `end`.
                query.push(("period2", (date_to_unix(*end) + 86_400).to_string()));
            }
        }

        let json = self.get_json(&url, &query).await?;
        parse_chart(symbol, &json)
    }

    async fn fetch_symbol_statement(
        &self,
        symbol: &str,
        types: &[String],
    ) -> Result<Vec<FundamentalsRecord>, ScreenerError> {
        let url = format!("{}/{}", TIMESERIES_URL, symbol);
        let now = Utc::now();
        let start = now
            .date_naive()
            .with_year(now.year() - FUNDAMENTALS_LOOKBACK_YEARS)
            .unwrap_or_else(|| now.date_naive());
        let query = vec![
            ("symbol", symbol.to_string()),
            ("type", types.join(",")),
            ("period1", date_to_unix(start).to_string()),
            ("period2", now.timestamp().to_string()),
        ];

        let json = self.get_json(&url, &query).await?;
        parse_timeseries(symbol, &json)
    }
}

impl Default for YahooClient {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait]
impl PriceHistoryProvider for YahooClient {
    async fn fetch_history(
        &self,
        symbols: &[String],
        window: &Window,
        interval: Interval,
    ) -> Result<Vec<PriceBar>, ScreenerError> {
        let fetches = symbols
            .iter()
            .map(|symbol| self.fetch_symbol_history(symbol, window, interval));

        let mut bars = Vec::new();
        for (symbol, result) in symbols.iter().zip(join_all(fetches).await) {
            match result {
                Ok(symbol_bars) => bars.extend(symbol_bars),
                Err(e) => {
                    tracing::warn!("history fetch failed for {}: {}", symbol, e);
                }
            }
        }
        Ok(bars)
    }
}

#[async_trait]
impl FundamentalsProvider for YahooClient {
    async fn fetch_statement(
        &self,
        symbols: &[String],
        kind: &StatementKind,
        frequency: Frequency,
        trailing: bool,
    ) -> Result<Vec<FundamentalsRecord>, ScreenerError> {
        let types = statement_types(kind, frequency, trailing);

        let fetches = symbols
            .iter()
            .map(|symbol| self.fetch_symbol_statement(symbol, &types));

        let mut records = Vec::new();
        for (symbol, result) in symbols.iter().zip(join_all(fetches).await) {
            match result {
                Ok(symbol_records) => records.extend(symbol_records),
                Err(e) => {
                    tracing::warn!("fundamentals fetch failed for {}: {}", symbol, e);
                }
            }
        }
        Ok(records)
    }
}

/// Resolves a statement kind to the prefixed type names the timeseries
/// endpoint expects, e.g. `annualTotalAssets` or `trailingPeRatio`.
pub fn statement_types(kind: &StatementKind, frequency: Frequency, trailing: bool) -> Vec<String> {
    let metrics = kind.metrics();
    let mut types: Vec<String> = metrics
        .iter()
        .map(|m| format!("{}{}", frequency.as_str(), m))
        .collect();
    if trailing {
        types.extend(metrics.iter().map(|m| format!("trailing{}", m)));
    }
    types
}

fn date_to_unix(date: NaiveDate) -> i64 {
    date.and_hms_opt(0, 0, 0)
        .map(|dt| DateTime::<Utc>::from_naive_utc_and_offset(dt, Utc).timestamp())
        .unwrap_or_default()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn statement_types_carry_the_frequency_prefix() {
        let types = statement_types(&StatementKind::BalanceSheet, Frequency::Annual, false);
        assert!(types.contains(&"annualTotalAssets".to_string()));
        assert!(types.iter().all(|t| t.starts_with("annual")));
    }

    #[test]
    fn trailing_adds_trailing_variants() {
        let kind = StatementKind::Selected(vec!["PeRatio".to_string()]);
        let types = statement_types(&kind, Frequency::Quarterly, true);
        assert_eq!(
            types,
            vec!["quarterlyPeRatio".to_string(), "trailingPeRatio".to_string()]
        );
    }
}
