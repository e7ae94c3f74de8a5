use async_trait::async_trait;

use crate::{Frequency, FundamentalsRecord, Interval, PriceBar, ScreenerError, StatementKind, Window};

/// Trait for market-data providers serving historical price bars.
#[async_trait]
pub trait PriceHistoryProvider: Send + Sync {
    async fn fetch_history(
        &self,
        symbols: &[String],
        window: &Window,
        interval: Interval,
    ) -> Result<Vec<PriceBar>, ScreenerError>;
}

/// Trait for providers serving financial-statement data.
#[async_trait]
pub trait FundamentalsProvider: Send + Sync {
    async fn fetch_statement(
        &self,
        symbols: &[String],
        kind: &StatementKind,
        frequency: Frequency,
        trailing: bool,
    ) -> Result<Vec<FundamentalsRecord>, ScreenerError>;
}
