use axum::{
    extract::{Query, State},
    Json,
};
use chrono::NaiveDate;
use screener_core::{
    Frequency, FundamentalsRecord, Interval, ReturnPoint, ScreenerError, StatementKind,
    SummaryMetrics, Window,
};
use serde::Deserialize;

use crate::{ApiResponse, AppError, AppState};

#[derive(Debug, Deserialize)]
pub struct HistoryQuery {
    /// Comma-separated ticker symbols.
    pub symbols: String,
    pub period: Option<String>,
    pub start: Option<NaiveDate>,
    pub end: Option<NaiveDate>,
    pub interval: Option<String>,
}

impl HistoryQuery {
    fn symbols(&self) -> Vec<String> {
        split_csv(&self.symbols)
    }

    /// An explicit date pair wins over a period string; with neither, the
    /// provider-side default window applies.
    fn window(&self) -> Window {
        match (self.start, self.end) {
            (Some(start), Some(end)) => Window::range(start, end),
            _ => Window::period(self.period.clone().unwrap_or_else(|| "1y".to_string())),
        }
    }

    fn interval(&self) -> Result<Interval, ScreenerError> {
        self.interval.as_deref().unwrap_or("1d").parse()
    }
}

#[derive(Debug, Deserialize)]
pub struct FundamentalsQuery {
    pub symbols: String,
    /// balance-sheet | income-statement | cash-flow | valuation | all | selected
    pub kind: Option<String>,
    pub frequency: Option<Frequency>,
    pub trailing: Option<bool>,
    /// Comma-separated metric names, only for kind=selected.
    pub metrics: Option<String>,
}

impl FundamentalsQuery {
    fn kind(&self) -> Result<StatementKind, ScreenerError> {
        let metrics = self
            .metrics
            .as_deref()
            .map(split_csv)
            .unwrap_or_default();
        StatementKind::parse(self.kind.as_deref().unwrap_or("all"), &metrics)
    }
}

fn split_csv(raw: &str) -> Vec<String> {
    raw.split(',')
        .map(str::trim)
        .filter(|s| !s.is_empty())
        .map(str::to_string)
        .collect()
}

pub async fn health() -> Json<ApiResponse<&'static str>> {
    Json(ApiResponse::success("ok"))
}

pub async fn get_returns(
    State(state): State<AppState>,
    Query(query): Query<HistoryQuery>,
) -> Result<Json<ApiResponse<Vec<ReturnPoint>>>, AppError> {
    let series = state
        .engine
        .cumulative_returns(&query.symbols(), &query.window(), query.interval()?)
        .await?;
    Ok(Json(ApiResponse::success(series)))
}

pub async fn get_summary(
    State(state): State<AppState>,
    Query(query): Query<HistoryQuery>,
) -> Result<Json<ApiResponse<Vec<SummaryMetrics>>>, AppError> {
    let metrics = state
        .engine
        .summary_metrics(&query.symbols(), &query.window(), query.interval()?)
        .await?;
    Ok(Json(ApiResponse::success(metrics)))
}

pub async fn get_fundamentals(
    State(state): State<AppState>,
    Query(query): Query<FundamentalsQuery>,
) -> Result<Json<ApiResponse<Vec<FundamentalsRecord>>>, AppError> {
    let records = state
        .engine
        .fundamentals(
            &split_csv(&query.symbols),
            &query.kind()?,
            query.frequency.unwrap_or(Frequency::Annual),
            query.trailing.unwrap_or(true),
        )
        .await?;
    Ok(Json(ApiResponse::success(records)))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn explicit_dates_win_over_period() {
        let query = HistoryQuery {
            symbols: "AAPL, MSFT".to_string(),
            period: Some("1y".to_string()),
            start: NaiveDate::from_ymd_opt(2024, 1, 2),
            end: NaiveDate::from_ymd_opt(2024, 6, 28),
            interval: None,
        };
        assert_eq!(query.symbols(), vec!["AAPL", "MSFT"]);
        assert!(matches!(query.window(), Window::Range { .. }));
        assert_eq!(query.interval().unwrap(), Interval::Day1);
    }

    #[test]
    fn bad_interval_is_a_validation_error() {
        let query = HistoryQuery {
            symbols: "AAPL".to_string(),
            period: None,
            start: None,
            end: None,
            interval: Some("7x".to_string()),
        };
        let err = query.interval().unwrap_err();
        assert!(err.is_validation());
    }

    #[test]
    fn selected_kind_reads_the_metrics_list() {
        let query = FundamentalsQuery {
            symbols: "AAPL".to_string(),
            kind: Some("selected".to_string()),
            frequency: None,
            trailing: None,
            metrics: Some("TotalDebt,EBITDA".to_string()),
        };
        let kind = query.kind().unwrap();
        assert_eq!(
            kind.metrics(),
            vec!["TotalDebt".to_string(), "EBITDA".to_string()]
        );
    }

    #[test]
    fn unknown_kind_is_rejected() {
        let query = FundamentalsQuery {
            symbols: "AAPL".to_string(),
            kind: Some("dividends".to_string()),
            frequency: None,
            trailing: None,
            metrics: None,
        };
        assert!(query.kind().is_err());
    }
}
