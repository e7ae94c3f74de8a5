use std::collections::BTreeMap;

use chrono::NaiveDate;
use screener_core::{FundamentalsRecord, ScreenerError};

/// Parses a fundamentals-timeseries payload into flattened records, one per
/// (symbol, asOfDate, period), date ascending.
pub fn parse_timeseries(
    symbol: &str,
    json: &serde_json::Value,
) -> Result<Vec<FundamentalsRecord>, ScreenerError> {
    if let Some(error) = json
        .get("timeseries")
        .and_then(|v| v.get("error"))
        .filter(|v| !v.is_null())
    {
        return Err(ScreenerError::Provider(format!(
            "timeseries error for {}: {}",
            symbol, error
        )));
    }

    let results = json
        .get("timeseries")
        .and_then(|v| v.get("result"))
        .and_then(|v| v.as_array())
        .ok_or_else(|| ScreenerError::Provider(format!("no timeseries data for {}", symbol)))?;

    // (asOfDate, period) -> metric name -> value
    let mut grouped: BTreeMap<(NaiveDate, String), BTreeMap<String, serde_json::Value>> =
        BTreeMap::new();

    for result in results {
        let Some(type_name) = result
            .get("meta")
            .and_then(|v| v.get("type"))
            .and_then(|v| v.as_array())
            .and_then(|arr| arr.first())
            .and_then(|v| v.as_str())
        else {
            continue;
        };

        let Some(entries) = result.get(type_name).and_then(|v| v.as_array()) else {
            continue;
        };

        let metric = strip_frequency_prefix(type_name);
        for entry in entries.iter().filter(|e| !e.is_null()) {
            let Some(as_of_date) = entry
                .get("asOfDate")
                .and_then(|v| v.as_str())
                .and_then(|s| NaiveDate::parse_from_str(s, "%Y-%m-%d").ok())
            else {
                continue;
            };
            let period = entry
                .get("periodType")
                .and_then(|v| v.as_str())
                .unwrap_or("12M")
                .to_string();
            let Some(value) = entry.get("reportedValue").and_then(|v| v.get("raw")) else {
                continue;
            };

            grouped
                .entry((as_of_date, period))
                .or_default()
                .insert(metric.to_string(), value.clone());
        }
    }

    Ok(grouped
        .into_iter()
        .map(|((as_of_date, period), values)| FundamentalsRecord {
            symbol: symbol.to_string(),
            as_of_date,
            period,
            values,
        })
        .collect())
}

/// `annualTotalAssets` -> `TotalAssets`, `trailingPeRatio` -> `PeRatio`.
fn strip_frequency_prefix(type_name: &str) -> &str {
    for prefix in ["annual", "quarterly", "trailing"] {
        if let Some(stripped) = type_name.strip_prefix(prefix) {
            if stripped.starts_with(char::is_uppercase) {
                return stripped;
            }
        }
    }
    type_name
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn timeseries_payload() -> serde_json::Value {
        json!({
            "timeseries": {
                "result": [
                    {
                        "meta": {"symbol": ["AAPL"], "type": ["annualTotalAssets"]},
                        "annualTotalAssets": [
                            {"asOfDate": "2022-09-30", "periodType": "12M",
                             "reportedValue": {"raw": 352755000000.0, "fmt": "352.76B"}},
                            {"asOfDate": "2023-09-30", "periodType": "12M",
                             "reportedValue": {"raw": 352583000000.0, "fmt": "352.58B"}}
                        ]
                    },
                    {
                        "meta": {"symbol": ["AAPL"], "type": ["annualTotalDebt"]},
                        "annualTotalDebt": [
                            null,
                            {"asOfDate": "2023-09-30", "periodType": "12M",
                             "reportedValue": {"raw": 111088000000.0, "fmt": "111.09B"}}
                        ]
                    }
                ],
                "error": null
            }
        })
    }

    #[test]
    fn flattens_metrics_into_one_record_per_period() {
        let records = parse_timeseries("AAPL", &timeseries_payload()).unwrap();
        assert_eq!(records.len(), 2);

        let latest = &records[1];
        assert_eq!(latest.symbol, "AAPL");
        assert_eq!(latest.period, "12M");
        assert_eq!(latest.values.len(), 2);
        assert_eq!(
            latest.values.get("TotalDebt").and_then(|v| v.as_f64()),
            Some(111088000000.0)
        );

        // The 2022 row only saw one metric; null entries are dropped.
        assert_eq!(records[0].values.len(), 1);
    }

    #[test]
    fn prefix_stripping_keeps_unknown_types_intact() {
        assert_eq!(strip_frequency_prefix("quarterlyEBITDA"), "EBITDA");
        assert_eq!(strip_frequency_prefix("trailingPeRatio"), "PeRatio");
        assert_eq!(strip_frequency_prefix("annualized"), "annualized");
        assert_eq!(strip_frequency_prefix("somethingElse"), "somethingElse");
    }
}
