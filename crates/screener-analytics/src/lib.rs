//! Analytics engine for the equities screener: turns raw per-symbol price
//! history into cumulative-return series and summary risk/return metrics,
//! and flattens financial-statement data for the dashboard grid.
//!
//! Every operation is a pure function of its inputs plus the provider's
//! current response; nothing is cached across requests.

use std::collections::HashMap;
use std::sync::Arc;

use chrono::{NaiveDate, Utc};
use screener_core::{
    minus_business_days, Frequency, FundamentalsProvider, FundamentalsRecord, Interval, PriceBar,
    PriceHistoryProvider, ReturnPoint, ScreenerError, StatementKind, SummaryMetrics, Window,
};
use statrs::statistics::Statistics;

mod returns;

pub use returns::{derive_return_series, group_by_symbol};

/// Business-day lookbacks for the short trailing windows. The year-based
/// windows go through the provider's own period semantics instead; the two
/// windowing methods intentionally differ.
const TRAILING_1M_BDAYS: u32 = 21;
const TRAILING_3M_BDAYS: u32 = 63;

pub struct AnalyticsEngine<P> {
    provider: Arc<P>,
}

impl<P> AnalyticsEngine<P>
where
    P: PriceHistoryProvider + FundamentalsProvider,
{
    pub fn new(provider: Arc<P>) -> Self {
        Self { provider }
    }

    /// Fetches price history for the requested symbols, filtered to exactly
    /// that symbol set. A failed or empty provider response degrades to an
    /// empty result; only input validation fails hard.
    pub async fn fetch_history(
        &self,
        symbols: &[String],
        window: &Window,
        interval: Interval,
    ) -> Result<Vec<PriceBar>, ScreenerError> {
        validate_symbols(symbols)?;

        let bars = match self.provider.fetch_history(symbols, window, interval).await {
            Ok(bars) => bars,
            Err(e) => {
                tracing::warn!("provider history fetch degraded to empty: {}", e);
                Vec::new()
            }
        };

        Ok(bars
            .into_iter()
            .filter(|bar| symbols.iter().any(|s| s == &bar.symbol))
            .collect())
    }

    /// Per-symbol period returns and base-100 cumulative index over the
    /// window, concatenated in the order symbols first appear in the fetch.
    pub async fn cumulative_returns(
        &self,
        symbols: &[String],
        window: &Window,
        interval: Interval,
    ) -> Result<Vec<ReturnPoint>, ScreenerError> {
        let bars = self.fetch_history(symbols, window, interval).await?;
        Ok(derive_return_series(&group_by_symbol(bars)))
    }

    /// Annualized return/volatility/Sharpe, cumulative return, and five
    /// independently windowed trailing returns per symbol. Symbols the
    /// provider had no data for are omitted. All outputs are rounded to two
    /// decimals at this boundary.
    pub async fn summary_metrics(
        &self,
        symbols: &[String],
        window: &Window,
        interval: Interval,
    ) -> Result<Vec<SummaryMetrics>, ScreenerError> {
        validate_symbols(symbols)?;
        let scaling = interval.periods_per_year();

        let primary = self.cumulative_returns(symbols, window, interval).await?;

        // Trailing windows always end at the request's end date when one was
        // given. The 1m/3m windows are explicit business-day ranges; 1y/2y/3y
        // pass period strings through to the provider, as the dashboard
        // always has.
        let end = window.end_date().unwrap_or_else(|| Utc::now().date_naive());
        let (t1m, t3m, t1y, t2y, t3y) = tokio::join!(
            self.trailing_window(symbols, range_window(end, TRAILING_1M_BDAYS)),
            self.trailing_window(symbols, range_window(end, TRAILING_3M_BDAYS)),
            self.trailing_window(symbols, Window::period("1y")),
            self.trailing_window(symbols, Window::period("2y")),
            self.trailing_window(symbols, Window::period("3y")),
        );

        let primary_last = last_indices(&primary);
        let mut metrics = Vec::new();
        for symbol in ordered_symbols(&primary) {
            let rets: Vec<f64> = primary
                .iter()
                .filter(|p| p.symbol == symbol)
                .map(|p| p.period_return)
                .collect();
            let last_index = primary_last.get(&symbol).copied().unwrap_or(100.0);

            let annualized_return = rets.as_slice().mean() * scaling * 100.0;
            let annualized_volatility = rets.as_slice().std_dev() * scaling.sqrt() * 100.0;
            // Intentionally unguarded: zero volatility yields a non-finite
            // Sharpe that callers must handle.
            let annualized_sharpe = annualized_return / annualized_volatility;

            metrics.push(SummaryMetrics {
                symbol: symbol.clone(),
                annualized_return: round2(annualized_return),
                annualized_volatility: round2(annualized_volatility),
                annualized_sharpe: round2(annualized_sharpe),
                cumulative_return_pct: round2(last_index - 100.0),
                trailing_1m: trailing_for(&t1m, &symbol),
                trailing_3m: trailing_for(&t3m, &symbol),
                trailing_1y: trailing_for(&t1y, &symbol),
                trailing_2y: trailing_for(&t2y, &symbol),
                trailing_3y: trailing_for(&t3y, &symbol),
            });
        }
        Ok(metrics)
    }

    /// Financial-statement rows for the symbols, flattened by the provider
    /// into one record per (symbol, asOfDate, period).
    pub async fn fundamentals(
        &self,
        symbols: &[String],
        kind: &StatementKind,
        frequency: Frequency,
        trailing: bool,
    ) -> Result<Vec<FundamentalsRecord>, ScreenerError> {
        validate_symbols(symbols)?;

        match self
            .provider
            .fetch_statement(symbols, kind, frequency, trailing)
            .await
        {
            Ok(records) => Ok(records),
            Err(e) => {
                tracing::warn!("provider statement fetch degraded to empty: {}", e);
                Ok(Vec::new())
            }
        }
    }

    /// One independent lookback fetch; always daily bars regardless of the
    /// primary interval.
    async fn trailing_window(
        &self,
        symbols: &[String],
        window: Window,
    ) -> HashMap<String, f64> {
        match self
            .cumulative_returns(symbols, &window, Interval::Day1)
            .await
        {
            Ok(series) => last_indices(&series),
            Err(e) => {
                tracing::warn!("trailing window fetch degraded to empty: {}", e);
                HashMap::new()
            }
        }
    }
}

fn validate_symbols(symbols: &[String]) -> Result<(), ScreenerError> {
    if symbols.is_empty() {
        return Err(ScreenerError::EmptySymbolList);
    }
    Ok(())
}

fn range_window(end: NaiveDate, business_days: u32) -> Window {
    Window::range(minus_business_days(end, business_days), end)
}

/// Symbols in order of first appearance in the series.
fn ordered_symbols(series: &[ReturnPoint]) -> Vec<String> {
    let mut symbols: Vec<String> = Vec::new();
    for point in series {
        if !symbols.contains(&point.symbol) {
            symbols.push(point.symbol.clone());
        }
    }
    symbols
}

/// Final cumulative index per symbol. Series are date-ascending within each
/// symbol group, so the last occurrence wins.
fn last_indices(series: &[ReturnPoint]) -> HashMap<String, f64> {
    let mut last = HashMap::new();
    for point in series {
        last.insert(point.symbol.clone(), point.cumulative_index);
    }
    last
}

fn trailing_for(indices: &HashMap<String, f64>, symbol: &str) -> Option<f64> {
    indices.get(symbol).map(|index| round2(index - 100.0))
}

fn round2(value: f64) -> f64 {
    (value * 100.0).round() / 100.0
}

#[cfg(test)]
mod tests {
    use super::*;
    use async_trait::async_trait;

    /// In-memory provider returning a fixed snapshot for every window.
    struct MockProvider {
        bars: Vec<PriceBar>,
        records: Vec<FundamentalsRecord>,
        fail: bool,
    }

    impl MockProvider {
        fn with_bars(bars: Vec<PriceBar>) -> Self {
            Self {
                bars,
                records: Vec::new(),
                fail: false,
            }
        }

        fn failing() -> Self {
            Self {
                bars: Vec::new(),
                records: Vec::new(),
                fail: true,
            }
        }
    }

    #[async_trait]
    impl PriceHistoryProvider for MockProvider {
        async fn fetch_history(
            &self,
            _symbols: &[String],
            _window: &Window,
            _interval: Interval,
        ) -> Result<Vec<PriceBar>, ScreenerError> {
            if self.fail {
                return Err(ScreenerError::Provider("unreachable".into()));
            }
            Ok(self.bars.clone())
        }
    }

    #[async_trait]
    impl FundamentalsProvider for MockProvider {
        async fn fetch_statement(
            &self,
            _symbols: &[String],
            _kind: &StatementKind,
            _frequency: Frequency,
            _trailing: bool,
        ) -> Result<Vec<FundamentalsRecord>, ScreenerError> {
            if self.fail {
                return Err(ScreenerError::Provider("unreachable".into()));
            }
            Ok(self.records.clone())
        }
    }

    fn bar(symbol: &str, day: u32, close: f64) -> PriceBar {
        PriceBar {
            symbol: symbol.to_string(),
            date: NaiveDate::from_ymd_opt(2024, 6, day).unwrap(),
            close,
            adj_close: None,
        }
    }

    fn engine(provider: MockProvider) -> AnalyticsEngine<MockProvider> {
        AnalyticsEngine::new(Arc::new(provider))
    }

    fn symbols(names: &[&str]) -> Vec<String> {
        names.iter().map(|s| s.to_string()).collect()
    }

    fn aapl_four_days() -> Vec<PriceBar> {
        vec![
            bar("AAPL", 3, 100.0),
            bar("AAPL", 4, 101.0),
            bar("AAPL", 5, 99.0),
            bar("AAPL", 6, 99.0),
        ]
    }

    #[tokio::test]
    async fn four_day_scenario_matches_expected_series() {
        let engine = engine(MockProvider::with_bars(aapl_four_days()));
        let series = engine
            .cumulative_returns(&symbols(&["AAPL"]), &Window::period("1y"), Interval::Day1)
            .await
            .unwrap();

        let rets: Vec<f64> = series.iter().map(|p| p.period_return).collect();
        assert_eq!(rets[0], 0.0);
        assert!((rets[1] - 0.01).abs() < 1e-12);
        assert!((rets[2] + 0.019802).abs() < 1e-6);
        assert_eq!(rets[3], 0.0);

        let indices: Vec<f64> = series.iter().map(|p| p.cumulative_index).collect();
        assert_eq!(indices[0], 100.0);
        assert!((indices[1] - 101.0).abs() < 1e-9);
        assert!((indices[2] - 99.0).abs() < 1e-9);
        assert!((indices[3] - 99.0).abs() < 1e-9);
    }

    #[tokio::test]
    async fn cumulative_returns_are_idempotent() {
        let engine = engine(MockProvider::with_bars(aapl_four_days()));
        let syms = symbols(&["AAPL"]);
        let window = Window::period("1y");
        let first = engine
            .cumulative_returns(&syms, &window, Interval::Day1)
            .await
            .unwrap();
        let second = engine
            .cumulative_returns(&syms, &window, Interval::Day1)
            .await
            .unwrap();
        assert_eq!(first.len(), second.len());
        for (a, b) in first.iter().zip(&second) {
            assert_eq!(a.period_return, b.period_return);
            assert_eq!(a.cumulative_index, b.cumulative_index);
        }
    }

    #[tokio::test]
    async fn missing_symbol_is_omitted_without_error() {
        let engine = engine(MockProvider::with_bars(aapl_four_days()));
        let series = engine
            .cumulative_returns(
                &symbols(&["AAPL", "MSFT"]),
                &Window::period("1y"),
                Interval::Day1,
            )
            .await
            .unwrap();
        assert!(series.iter().all(|p| p.symbol == "AAPL"));

        let metrics = engine
            .summary_metrics(
                &symbols(&["AAPL", "MSFT"]),
                &Window::period("1y"),
                Interval::Day1,
            )
            .await
            .unwrap();
        assert_eq!(metrics.len(), 1);
        assert_eq!(metrics[0].symbol, "AAPL");
    }

    #[tokio::test]
    async fn extra_provider_symbols_are_filtered_out() {
        let mut bars = aapl_four_days();
        bars.push(bar("SPY", 3, 520.0));
        let engine = engine(MockProvider::with_bars(bars));
        let history = engine
            .fetch_history(&symbols(&["AAPL"]), &Window::period("1y"), Interval::Day1)
            .await
            .unwrap();
        assert!(history.iter().all(|b| b.symbol == "AAPL"));
    }

    #[tokio::test]
    async fn summary_matches_independent_series() {
        let engine = engine(MockProvider::with_bars(aapl_four_days()));
        let syms = symbols(&["AAPL"]);
        let window = Window::range(
            NaiveDate::from_ymd_opt(2024, 6, 3).unwrap(),
            NaiveDate::from_ymd_opt(2024, 6, 6).unwrap(),
        );

        let series = engine
            .cumulative_returns(&syms, &window, Interval::Day1)
            .await
            .unwrap();
        let last = series.last().unwrap().cumulative_index;

        let metrics = engine
            .summary_metrics(&syms, &window, Interval::Day1)
            .await
            .unwrap();
        assert_eq!(metrics[0].cumulative_return_pct, round2(last - 100.0));
        // The mock serves the same snapshot for every window, so the
        // independently fetched trailing returns agree too.
        assert_eq!(metrics[0].trailing_1m, Some(round2(last - 100.0)));
        assert_eq!(metrics[0].trailing_3y, Some(round2(last - 100.0)));
    }

    #[tokio::test]
    async fn constant_prices_give_non_finite_sharpe() {
        let bars = vec![
            bar("KO", 3, 60.0),
            bar("KO", 4, 60.0),
            bar("KO", 5, 60.0),
        ];
        let engine = engine(MockProvider::with_bars(bars));
        let metrics = engine
            .summary_metrics(&symbols(&["KO"]), &Window::period("1y"), Interval::Day1)
            .await
            .unwrap();
        assert_eq!(metrics[0].annualized_volatility, 0.0);
        assert!(!metrics[0].annualized_sharpe.is_finite());
    }

    #[tokio::test]
    async fn empty_symbol_list_fails_fast() {
        let engine = engine(MockProvider::with_bars(Vec::new()));
        let err = engine
            .cumulative_returns(&[], &Window::period("1y"), Interval::Day1)
            .await
            .unwrap_err();
        assert!(matches!(err, ScreenerError::EmptySymbolList));

        let err = engine
            .fundamentals(&[], &StatementKind::All, Frequency::Annual, true)
            .await
            .unwrap_err();
        assert!(matches!(err, ScreenerError::EmptySymbolList));
    }

    #[tokio::test]
    async fn provider_failure_degrades_to_empty_output() {
        let engine = engine(MockProvider::failing());
        let syms = symbols(&["AAPL"]);

        let series = engine
            .cumulative_returns(&syms, &Window::period("1y"), Interval::Day1)
            .await
            .unwrap();
        assert!(series.is_empty());

        let metrics = engine
            .summary_metrics(&syms, &Window::period("1y"), Interval::Day1)
            .await
            .unwrap();
        assert!(metrics.is_empty());

        let records = engine
            .fundamentals(&syms, &StatementKind::All, Frequency::Annual, false)
            .await
            .unwrap();
        assert!(records.is_empty());
    }

    #[tokio::test]
    async fn fundamentals_pass_through_provider_records() {
        let record = FundamentalsRecord {
            symbol: "AAPL".to_string(),
            as_of_date: NaiveDate::from_ymd_opt(2023, 9, 30).unwrap(),
            period: "12M".to_string(),
            values: [(
                "TotalDebt".to_string(),
                serde_json::Value::from(111088000000.0),
            )]
            .into_iter()
            .collect(),
        };
        let engine = engine(MockProvider {
            bars: Vec::new(),
            records: vec![record],
            fail: false,
        });

        let records = engine
            .fundamentals(
                &symbols(&["AAPL"]),
                &StatementKind::BalanceSheet,
                Frequency::Annual,
                false,
            )
            .await
            .unwrap();
        assert_eq!(records.len(), 1);
        assert!(records[0].values.contains_key("TotalDebt"));
    }

    #[tokio::test]
    async fn summary_rows_follow_fetch_order() {
        let bars = vec![
            bar("MSFT", 3, 400.0),
            bar("MSFT", 4, 404.0),
            bar("AAPL", 3, 190.0),
            bar("AAPL", 4, 191.0),
        ];
        let engine = engine(MockProvider::with_bars(bars));
        let metrics = engine
            .summary_metrics(
                &symbols(&["AAPL", "MSFT"]),
                &Window::period("1y"),
                Interval::Day1,
            )
            .await
            .unwrap();
        let order: Vec<&str> = metrics.iter().map(|m| m.symbol.as_str()).collect();
        assert_eq!(order, vec!["MSFT", "AAPL"]);
    }
}
