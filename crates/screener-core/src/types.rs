use std::collections::BTreeMap;

use chrono::NaiveDate;
use serde::{Deserialize, Serialize};

/// One observation of a symbol's price on a date, as returned by the
/// market-data provider. Immutable once fetched.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PriceBar {
    pub symbol: String,
    pub date: NaiveDate,
    pub close: f64,
    /// Split/dividend adjusted close. Preferred over `close` for return
    /// computation when the provider supplies it.
    #[serde(default)]
    pub adj_close: Option<f64>,
}

impl PriceBar {
    /// Price used for return computation.
    pub fn return_price(&self) -> f64 {
        self.adj_close.unwrap_or(self.close)
    }
}

/// One point of a per-symbol return series, ordered by date ascending.
/// The first point per symbol always has `period_return == 0.0` and
/// `cumulative_index == 100.0`.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ReturnPoint {
    pub symbol: String,
    pub date: NaiveDate,
    /// Fractional change from the prior bar of the same symbol.
    pub period_return: f64,
    /// Base-100 running product: `100 * prod(1 + period_return)`.
    pub cumulative_index: f64,
}

/// Summary risk/return metrics for one symbol over a primary window.
///
/// The trailing fields are each computed over their own independently
/// fetched lookback window ending at the request's end date, so they can
/// reflect different date ranges than the headline annualized metrics.
/// They are `None` when the provider had no data for that window.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SummaryMetrics {
    pub symbol: String,
    /// mean(period return) * periods-per-year * 100
    pub annualized_return: f64,
    /// stdev(period return) * sqrt(periods-per-year) * 100
    pub annualized_volatility: f64,
    /// annualized return / annualized volatility. Non-finite when the
    /// volatility is exactly 0; callers must handle that.
    pub annualized_sharpe: f64,
    /// Final cumulative index minus 100.
    pub cumulative_return_pct: f64,
    pub trailing_1m: Option<f64>,
    pub trailing_3m: Option<f64>,
    pub trailing_1y: Option<f64>,
    pub trailing_2y: Option<f64>,
    pub trailing_3y: Option<f64>,
}

/// One flattened row of financial-statement data, keyed by
/// (symbol, as_of_date, period).
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct FundamentalsRecord {
    pub symbol: String,
    pub as_of_date: NaiveDate,
    /// Reporting period tag, e.g. "12M", "3M", "TTM".
    pub period: String,
    /// Metric name -> reported value.
    pub values: BTreeMap<String, serde_json::Value>,
}
