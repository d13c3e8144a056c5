//! Error types for the functional core

/// Failure to turn an API payload into the uniform row model
#[derive(Debug, thiserror::Error)]
pub enum DecodeError {
    #[error("Malformed XML: {0}")]
    Xml(String),

    #[error("Malformed JSON: {0}")]
    Json(#[from] serde_json::Error),

    #[error("Malformed CSV: {0}")]
    Csv(#[from] csv::Error),

    #[error("Marker line '{0}' not found in delimited response")]
    MarkerNotFound(&'static str),

    #[error("Missing field '{0}' in response")]
    MissingField(String),

    #[error("Unexpected shape at '{path}': {detail}")]
    Shape { path: String, detail: String },

    #[error("API returned status {status}: {message}")]
    Api { status: u32, message: String },
}

impl From<quick_xml::Error> for DecodeError {
    fn from(err: quick_xml::Error) -> Self {
        DecodeError::Xml(err.to_string())
    }
}

impl From<quick_xml::events::attributes::AttrError> for DecodeError {
    fn from(err: quick_xml::events::attributes::AttrError) -> Self {
        DecodeError::Xml(err.to_string())
    }
}

/// Input rejected before any network call is made
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum ValidationError {
    #[error("Application ID is not set")]
    MissingAppId,

    #[error("Application ID must contain only lowercase letters and digits: {0}")]
    InvalidAppId(String),

    #[error("Response format is not selected")]
    MissingFormat,

    #[error("Unknown response format: {0}")]
    UnknownFormat(String),

    #[error("Statistics table ID must be exactly {expected} digits: {id}")]
    InvalidStatsDataId { id: String, expected: usize },

    #[error("Chunk size must be at least 1")]
    InvalidChunkSize,

    #[error("Page size must be at least 1")]
    InvalidPageSize,
}

/// Invalid filter configuration
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum FilterError {
    #[error("Filtering requires a match mode (substring or exact)")]
    MatchModeRequired,

    #[error("Unknown match mode: {0}")]
    UnknownMatchMode(String),

    #[error("Unknown combine mode: {0}")]
    UnknownCombineMode(String),

    #[error("At least one keyword is required")]
    NoKeywords,

    #[error("Keywords must not be empty")]
    EmptyKeyword,

    #[error("A combine mode (or/and) is required with {0} keywords")]
    CombineModeRequired(usize),

    #[error("Keywords do not form a valid pattern: {0}")]
    InvalidPattern(String),
}

/// Failure while writing or reading listing chunk files
#[derive(Debug, thiserror::Error)]
pub enum ChunkError {
    #[error("IO error on {path}: {source}")]
    Io {
        path: String,
        #[source]
        source: std::io::Error,
    },

    #[error("Malformed chunk file {path}: {source}")]
    Csv {
        path: String,
        #[source]
        source: csv::Error,
    },

    #[error("No listing files found in {0}")]
    Empty(String),

    #[error(transparent)]
    Invalid(#[from] ValidationError),
}
