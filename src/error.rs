use thiserror::Error;

/// Failure taxonomy for the aggregation and query core.
///
/// Nothing in this crate propagates one of these past its public contract
/// boundary: each operation catches its own failures, logs them, and returns
/// an empty or degraded result. The variants exist so internal code can say
/// *which* kind of degradation happened instead of stringly-typed logging.
#[derive(Debug, Error)]
pub enum InsightError {
    /// A date or numeric field could not be parsed. The field degrades to
    /// null and processing continues.
    #[error("unparseable {field}: {value}")]
    ParseFailure { field: String, value: String },

    /// A data source returned no rows or could not be reached. Callers
    /// convert this to an empty table, never an exception to the user.
    #[error("data unavailable: {0}")]
    DataUnavailable(String),

    /// The external inference service was unreachable or returned a
    /// malformed body. The fallback chain proceeds.
    #[error("classification failed: {0}")]
    ClassificationFailure(String),

    /// A chart or report item failed to render. The one item is skipped.
    #[error("export failed: {0}")]
    ExportFailure(String),
}

impl From<std::io::Error> for InsightError {
    fn from(err: std::io::Error) -> Self {
        InsightError::DataUnavailable(err.to_string())
    }
}

impl From<reqwest::Error> for InsightError {
    fn from(err: reqwest::Error) -> Self {
        InsightError::DataUnavailable(err.to_string())
    }
}

impl From<csv::Error> for InsightError {
    fn from(err: csv::Error) -> Self {
        InsightError::DataUnavailable(err.to_string())
    }
}
