use thiserror::Error;

#[derive(Error, Debug)]
pub enum ScreenerError {
    #[error("Unsupported interval: {0}")]
    UnsupportedInterval(String),

    #[error("Unsupported statement kind: {0}")]
    UnsupportedStatementKind(String),

    #[error("Symbol list is empty")]
    EmptySymbolList,

    #[error("Provider error: {0}")]
    Provider(String),
}

impl ScreenerError {
    /// Input-validation errors must reach the caller; provider failures
    /// are absorbed into empty results at the engine layer.
    pub fn is_validation(&self) -> bool {
        !matches!(self, ScreenerError::Provider(_))
    }
}
