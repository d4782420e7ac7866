// errors.rs
use thiserror::Error;

/// Errors that abort an operation and are handed back to the caller.
#[derive(Debug, Error)]
pub enum ScraperError {
    #[error("Network error: {0}")]
    Network(String),
    #[error("Configuration error: {0}")]
    Config(String),
    #[error("HTML parse error: {0}")]
    HtmlParse(String),
    #[error("JSON parse error: {0}")]
    JsonParse(String),
    #[error("IO error: {0}")]
    Io(String),
    #[error("Database error: {0}")]
    Db(String),
    #[error("Failed to fetch {url}: {reason}")]
    Fetch { url: String, reason: String },
}

impl From<std::io::Error> for ScraperError {
    fn from(e: std::io::Error) -> Self {
        ScraperError::Io(e.to_string())
    }
}

impl From<serde_json::Error> for ScraperError {
    fn from(e: serde_json::Error) -> Self {
        ScraperError::JsonParse(e.to_string())
    }
}

impl From<rusqlite::Error> for ScraperError {
    fn from(e: rusqlite::Error) -> Self {
        ScraperError::Db(e.to_string())
    }
}

/// Recoverable problems met while extracting a listing.
///
/// None of these stop the enclosing listing; they only leave a value unset.
#[derive(Debug, Clone, PartialEq)]
pub enum Diagnostic {
    DiscoveryStrategyFailure { strategy: &'static str, reason: String },
    FieldExtractionMiss { field: &'static str },
    SubPageFetchFailure { url: Option<String>, reason: String },
    AggregationGap { field: &'static str },
}

impl Diagnostic {
    pub fn kind(&self) -> &'static str {
        match self {
            Diagnostic::DiscoveryStrategyFailure { .. } => "discovery_strategy_failure",
            Diagnostic::FieldExtractionMiss { .. } => "field_extraction_miss",
            Diagnostic::SubPageFetchFailure { .. } => "sub_page_fetch_failure",
            Diagnostic::AggregationGap { .. } => "aggregation_gap",
        }
    }
}

/// Observability collaborator that receives every [`Diagnostic`].
pub trait DiagnosticSink {
    fn report(&self, diagnostic: Diagnostic);
}

/// Default sink: forwards diagnostics to `tracing`.
#[derive(Debug, Default, Clone, Copy)]
pub struct TracingSink;

impl DiagnosticSink for TracingSink {
    fn report(&self, diagnostic: Diagnostic) {
        let kind = diagnostic.kind();
        match diagnostic {
            Diagnostic::DiscoveryStrategyFailure { strategy, reason } => {
                tracing::warn!(kind, strategy, %reason, "discovery strategy failed");
            }
            Diagnostic::FieldExtractionMiss { field } => {
                tracing::debug!(kind, field, "field not found");
            }
            Diagnostic::SubPageFetchFailure { url, reason } => {
                tracing::warn!(kind, url = url.as_deref().unwrap_or("<none>"), %reason, "homesite enrichment failed");
            }
            Diagnostic::AggregationGap { field } => {
                tracing::debug!(kind, field, "no values to aggregate");
            }
        }
    }
}
