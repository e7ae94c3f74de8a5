use std::fmt;
use std::str::FromStr;

use chrono::{Datelike, NaiveDate};
use serde::{Deserialize, Serialize};

use crate::ScreenerError;

/// Bar interval vocabulary accepted by the market-data provider.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum Interval {
    Min1,
    Min2,
    Min5,
    Min15,
    Min30,
    Min60,
    Min90,
    Hour1,
    Day1,
    Day5,
    Week1,
    Month1,
    Month3,
}

/// US trading calendar: 252 sessions per year, 8-hour sessions for the
/// intraday factors.
const SESSIONS_PER_YEAR: f64 = 252.0;
const HOURS_PER_SESSION: f64 = 8.0;

impl Interval {
    /// Fixed trading-periods-per-year factor used to annualize per-period
    /// return statistics. Declared per interval, never derived.
    pub fn periods_per_year(&self) -> f64 {
        match self {
            Interval::Min1 => SESSIONS_PER_YEAR * HOURS_PER_SESSION * 60.0,
            Interval::Min2 => SESSIONS_PER_YEAR * HOURS_PER_SESSION * 30.0,
            Interval::Min5 => SESSIONS_PER_YEAR * HOURS_PER_SESSION * 12.0,
            Interval::Min15 => SESSIONS_PER_YEAR * HOURS_PER_SESSION * 4.0,
            Interval::Min30 => SESSIONS_PER_YEAR * HOURS_PER_SESSION * 2.0,
            Interval::Min60 | Interval::Hour1 => SESSIONS_PER_YEAR * HOURS_PER_SESSION,
            Interval::Min90 => SESSIONS_PER_YEAR * HOURS_PER_SESSION * (2.0 / 3.0),
            Interval::Day1 => SESSIONS_PER_YEAR,
            Interval::Day5 | Interval::Week1 => SESSIONS_PER_YEAR / 5.0,
            Interval::Month1 => SESSIONS_PER_YEAR / 21.0,
            Interval::Month3 => SESSIONS_PER_YEAR / 63.0,
        }
    }

    /// The provider-side interval string.
    pub fn as_str(&self) -> &'static str {
        match self {
            Interval::Min1 => "1m",
            Interval::Min2 => "2m",
            Interval::Min5 => "5m",
            Interval::Min15 => "15m",
            Interval::Min30 => "30m",
            Interval::Min60 => "60m",
            Interval::Min90 => "90m",
            Interval::Hour1 => "1h",
            Interval::Day1 => "1d",
            Interval::Day5 => "5d",
            Interval::Week1 => "1wk",
            Interval::Month1 => "1mo",
            Interval::Month3 => "3mo",
        }
    }
}

impl FromStr for Interval {
    type Err = ScreenerError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "1m" => Ok(Interval::Min1),
            "2m" => Ok(Interval::Min2),
            "5m" => Ok(Interval::Min5),
            "15m" => Ok(Interval::Min15),
            "30m" => Ok(Interval::Min30),
            "60m" => Ok(Interval::Min60),
            "90m" => Ok(Interval::Min90),
            "1h" => Ok(Interval::Hour1),
            "1d" => Ok(Interval::Day1),
            "5d" => Ok(Interval::Day5),
            "1wk" => Ok(Interval::Week1),
            "1mo" => Ok(Interval::Month1),
            "3mo" => Ok(Interval::Month3),
            other => Err(ScreenerError::UnsupportedInterval(other.to_string())),
        }
    }
}

impl fmt::Display for Interval {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Date window for a history request: either a provider-side period string
/// ("1y", "3mo", ...) or an explicit closed date range.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub enum Window {
    Period(String),
    Range { start: NaiveDate, end: NaiveDate },
}

impl Window {
    pub fn period(p: impl Into<String>) -> Self {
        Window::Period(p.into())
    }

    pub fn range(start: NaiveDate, end: NaiveDate) -> Self {
        Window::Range { start, end }
    }

    /// The end date this window resolves to, when it carries one.
    pub fn end_date(&self) -> Option<NaiveDate> {
        match self {
            Window::Range { end, .. } => Some(*end),
            Window::Period(_) => None,
        }
    }
}

/// Walks `n` business days (Mon-Fri) back from `date`. Holidays are not
/// observed, matching the lookback arithmetic of the trailing windows.
pub fn minus_business_days(date: NaiveDate, n: u32) -> NaiveDate {
    let mut current = date;
    let mut remaining = n;
    while remaining > 0 {
        current = current.pred_opt().unwrap_or(current);
        if matches!(
            current.weekday(),
            chrono::Weekday::Sat | chrono::Weekday::Sun
        ) {
            continue;
        }
        remaining -= 1;
    }
    current
}
