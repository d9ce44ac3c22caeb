/// Result alias that carries the custom [`RankChartError`] type.
pub type Result<T> = std::result::Result<T, RankChartError>;

/// Common error type for the core crate.
#[derive(Debug, thiserror::Error)]
pub enum RankChartError {
    /// No entity has a finite value for the requested period.
    #[error("no entity has a value for period `{period}`")]
    EmptyPeriod { period: String },
    /// The requested period is not one of the table's period columns.
    #[error("unknown period `{period}`")]
    UnknownPeriod { period: String },
    /// The source table does not have the expected shape.
    #[error("malformed data table: {0}")]
    DataFormat(String),
    /// Free-form failure surfaced to the host application.
    #[error("{0}")]
    Message(String),
    /// Wrapper around standard IO errors.
    #[error("{0}")]
    Io(#[from] std::io::Error),
    /// Wrapper around JSON decoding errors.
    #[error("{0}")]
    Json(#[from] serde_json::Error),
}

impl RankChartError {
    /// Creates a new error that simply wraps the provided message.
    pub fn msg<T: Into<String>>(msg: T) -> Self {
        Self::Message(msg.into())
    }

    pub(crate) fn format<T: Into<String>>(msg: T) -> Self {
        Self::DataFormat(msg.into())
    }

    /// Returns `true` for the recoverable "nothing to show" condition.
    pub fn is_empty_period(&self) -> bool {
        matches!(self, Self::EmptyPeriod { .. })
    }
}

impl From<&str> for RankChartError {
    fn from(value: &str) -> Self {
        Self::msg(value)
    }
}

impl From<String> for RankChartError {
    fn from(value: String) -> Self {
        Self::Message(value)
    }
}
