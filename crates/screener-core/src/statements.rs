use std::fmt;

use serde::{Deserialize, Serialize};

use crate::ScreenerError;

/// Balance-sheet metrics requested from the fundamentals provider.
pub const BALANCE_SHEET_METRICS: &[&str] = &[
    "TotalAssets",
    "TotalDebt",
    "CurrentAssets",
    "CurrentLiabilities",
    "CashAndCashEquivalents",
    "StockholdersEquity",
];

/// Income-statement metrics.
pub const INCOME_STATEMENT_METRICS: &[&str] = &[
    "TotalRevenue",
    "GrossProfit",
    "EBIT",
    "EBITDA",
    "OperatingIncome",
    "NetIncome",
    "BasicEPS",
];

/// Cash-flow-statement metrics.
pub const CASH_FLOW_METRICS: &[&str] = &[
    "OperatingCashFlow",
    "InvestingCashFlow",
    "FinancingCashFlow",
    "FreeCashFlow",
    "CapitalExpenditure",
];

/// Valuation-measure metrics.
pub const VALUATION_METRICS: &[&str] = &[
    "MarketCap",
    "EnterpriseValue",
    "PeRatio",
    "PbRatio",
    "PsRatio",
    "EnterprisesValueEBITDARatio",
];

/// Which financial statement to fetch. `All` is the union of the four fixed
/// menus; `Selected` carries an explicit metric subset.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub enum StatementKind {
    BalanceSheet,
    IncomeStatement,
    CashFlow,
    Valuation,
    All,
    Selected(Vec<String>),
}

impl StatementKind {
    /// Parses the request vocabulary. `metrics` is only consulted for the
    /// "selected" kind.
    pub fn parse(kind: &str, metrics: &[String]) -> Result<Self, ScreenerError> {
        match kind {
            "balance-sheet" => Ok(StatementKind::BalanceSheet),
            "income-statement" => Ok(StatementKind::IncomeStatement),
            "cash-flow" => Ok(StatementKind::CashFlow),
            "valuation" => Ok(StatementKind::Valuation),
            "all" => Ok(StatementKind::All),
            "selected" if !metrics.is_empty() => Ok(StatementKind::Selected(metrics.to_vec())),
            other => Err(ScreenerError::UnsupportedStatementKind(other.to_string())),
        }
    }

    /// The metric names this kind resolves to.
    pub fn metrics(&self) -> Vec<String> {
        let fixed = |menu: &[&str]| menu.iter().map(|m| m.to_string()).collect::<Vec<_>>();
        match self {
            StatementKind::BalanceSheet => fixed(BALANCE_SHEET_METRICS),
            StatementKind::IncomeStatement => fixed(INCOME_STATEMENT_METRICS),
            StatementKind::CashFlow => fixed(CASH_FLOW_METRICS),
            StatementKind::Valuation => fixed(VALUATION_METRICS),
            StatementKind::All => [
                BALANCE_SHEET_METRICS,
                INCOME_STATEMENT_METRICS,
                CASH_FLOW_METRICS,
                VALUATION_METRICS,
            ]
            .into_iter()
            .flat_map(|menu| menu.iter().map(|m| m.to_string()))
            .collect(),
            StatementKind::Selected(metrics) => metrics.clone(),
        }
    }
}

/// Reporting frequency for statement data.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Frequency {
    Annual,
    Quarterly,
}

impl Frequency {
    pub fn as_str(&self) -> &'static str {
        match self {
            Frequency::Annual => "annual",
            Frequency::Quarterly => "quarterly",
        }
    }
}

impl fmt::Display for Frequency {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}
