use thiserror::Error;
use tracing::{debug, error, info, warn};

/// Problems with the shape of the schema graph or with field references into it.
#[derive(Debug, Clone, PartialEq, Error)]
pub enum SchemaError {
    #[error("Unknown field: {0}")]
    UnknownField(String),

    #[error("Unknown type: {0}")]
    UnknownType(String),

    #[error("Unknown query: {0}")]
    UnknownQuery(String),

    #[error("Malformed field '{name}': {reason}")]
    MalformedField { name: String, reason: String },
}

/// Configuration the user must fix before a stage, request or spec is usable.
#[derive(Debug, Clone, PartialEq, Error)]
pub enum ValidationError {
    #[error("Required value '{0}' is missing")]
    MissingValue(String),

    #[error("Custom stage is not valid JSON: {0}")]
    InvalidJson(String),

    #[error("Sort field '{0}' is not available at the end of the pipeline")]
    SortFieldMissing(String),

    #[error("Sort field '{0}' is not a scalar")]
    SortFieldNotScalar(String),

    #[error("Sort order '{0}' is not one of asc, desc")]
    InvalidSortOrder(String),

    #[error("Page size must be greater than zero")]
    InvalidPageSize,

    #[error("Stage index {index} out of bounds (pipeline has {len} stages)")]
    StageOutOfBounds { index: usize, len: usize },

    #[error("Context filters are not valid JSON: {0}")]
    InvalidContextFilters(String),
}

/// Failures talking to the metadata or aggregation backends.
#[derive(Debug, Clone, PartialEq, Error)]
pub enum NetworkError {
    #[error("{}", first_message(.0))]
    GraphQl(Vec<String>),

    #[error("Transport error: {0}")]
    Transport(String),

    #[error("Backend responded with status {status}: {body}")]
    Status { status: u16, body: String },

    #[error("Unexpected response payload: {0}")]
    Decode(String),

    #[error("Request timed out after {0} ms")]
    Timeout(u64),
}

fn first_message(messages: &[String]) -> &str {
    messages
        .first()
        .map(String::as_str)
        .unwrap_or("GraphQL request failed")
}

impl NetworkError {
    /// All messages joined for display in an inline banner.
    pub fn banner(&self) -> String {
        match self {
            NetworkError::GraphQl(messages) if !messages.is_empty() => messages.join(", "),
            other => other.to_string(),
        }
    }
}

/// Non-fatal notes about places where propagation cannot be precise.
#[derive(Debug, Clone, PartialEq, Error)]
pub enum EngineWarning {
    #[error("Unwind on '{field}' ignored: field is {kind}, not a list")]
    UnwindNotList { field: String, kind: String },

    #[error("Unwind on '{field}' dropped '{child}': a sibling field already has that name")]
    UnwindNameCollision { field: String, child: String },

    #[error("Custom stage output is not checked; downstream fields may not exist")]
    UncheckedCustomStage,
}

#[derive(Debug, Clone, PartialEq, Error)]
pub enum EngineError {
    #[error("Schema error: {0}")]
    Schema(#[from] SchemaError),

    #[error("Validation error: {0}")]
    Validation(#[from] ValidationError),

    #[error("Network error: {0}")]
    Network(#[from] NetworkError),
}

impl EngineError {
    pub fn log_error(&self) {
        match self {
            EngineError::Schema(e) => {
                error!(target: "aggview::engine", "Schema error: {}", e);
                debug!(target: "aggview::engine", "Schema error details: {:?}", e);
            }
            EngineError::Validation(e) => {
                warn!(target: "aggview::engine", "Validation error: {}", e);
                debug!(target: "aggview::engine", "Validation error details: {:?}", e);
            }
            EngineError::Network(e) => {
                error!(target: "aggview::engine", "Network error: {}", e);
                debug!(target: "aggview::engine", "Network error details: {:?}", e);
            }
        }
    }
}

impl EngineWarning {
    pub fn log(&self, stage: usize) {
        info!(target: "aggview::propagation", stage, "{}", self);
    }
}
