use chrono::DateTime;
use screener_core::{PriceBar, ScreenerError};

/// Parses a chart-endpoint payload into price bars, date ascending.
///
/// Indices where the close array holds null (halted or unpriced sessions)
/// are skipped rather than zero-filled.
pub fn parse_chart(symbol: &str, json: &serde_json::Value) -> Result<Vec<PriceBar>, ScreenerError> {
    if let Some(error) = json
        .get("chart")
        .and_then(|v| v.get("error"))
        .filter(|v| !v.is_null())
    {
        return Err(ScreenerError::Provider(format!(
            "chart error for {}: {}",
            symbol, error
        )));
    }

    let result = json
        .get("chart")
        .and_then(|v| v.get("result"))
        .and_then(|v| v.as_array())
        .and_then(|arr| arr.first())
        .ok_or_else(|| ScreenerError::Provider(format!("no chart data for {}", symbol)))?;

    let timestamps = match result.get("timestamp").and_then(|v| v.as_array()) {
        Some(ts) => ts,
        // A valid but empty window (e.g. symbol listed after the range).
        None => return Ok(Vec::new()),
    };

    let quote = result
        .get("indicators")
        .and_then(|v| v.get("quote"))
        .and_then(|v| v.as_array())
        .and_then(|arr| arr.first())
        .ok_or_else(|| ScreenerError::Provider(format!("no quote indicators for {}", symbol)))?;

    let closes = quote
        .get("close")
        .and_then(|v| v.as_array())
        .ok_or_else(|| ScreenerError::Provider(format!("no close series for {}", symbol)))?;

    let adj_closes = result
        .get("indicators")
        .and_then(|v| v.get("adjclose"))
        .and_then(|v| v.as_array())
        .and_then(|arr| arr.first())
        .and_then(|v| v.get("adjclose"))
        .and_then(|v| v.as_array());

    let mut bars = Vec::with_capacity(timestamps.len());
    for (i, ts) in timestamps.iter().enumerate() {
        let Some(ts) = ts.as_i64() else { continue };
        let Some(close) = closes.get(i).and_then(|v| v.as_f64()) else {
            continue;
        };
        let Some(date) = DateTime::from_timestamp(ts, 0).map(|dt| dt.date_naive()) else {
            continue;
        };
        let adj_close = adj_closes
            .and_then(|arr| arr.get(i))
            .and_then(|v| v.as_f64());

        bars.push(PriceBar {
            symbol: symbol.to_string(),
            date,
            close,
            adj_close,
        });
    }

    Ok(bars)
}
