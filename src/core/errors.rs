use thiserror::Error;

/// Fatal errors that abort a whole query and are surfaced to the caller.
#[derive(Error, Debug)]
pub enum ExchangeError {
    #[error("HTTP request failed: {0}")]
    HttpError(#[from] reqwest::Error),

    #[error("JSON parsing error: {0}")]
    JsonError(#[from] serde_json::Error),

    #[error("Network error: {0}")]
    NetworkError(String),

    #[error("{exchange} query responded with error status code: {status} and text: {body}")]
    StatusError {
        exchange: String,
        status: u16,
        body: String,
    },

    #[error("{exchange} returned invalid JSON response: {body}")]
    InvalidJson { exchange: String, body: String },

    #[error("{exchange} query for \"{command}\" returned error: {message}")]
    ApiError {
        exchange: String,
        command: String,
        message: String,
    },

    #[error(
        "Got a recoverable {exchange} error and did not manage to get a request through \
         even after {retries} incremental backoff retries"
    )]
    RetriesExhausted { exchange: String, retries: u32 },

    #[error("{exchange} query for {command} did not return a {expected} result. Got: {actual}")]
    UnexpectedShape {
        exchange: String,
        command: String,
        expected: &'static str,
        actual: &'static str,
    },

    #[error("Unexpected {exchange} response for {command}: {reason}")]
    UnexpectedResponse {
        exchange: String,
        command: String,
        reason: String,
    },

    #[error("{exchange} pagination for {command} did not finish after {pages} pages")]
    PaginationLimit {
        exchange: String,
        command: String,
        pages: u32,
    },

    #[error("Authentication error: {0}")]
    AuthError(String),

    #[error("Other error: {0}")]
    Other(String),
}

/// A single record could not be turned into its canonical form.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
#[error("{0}")]
pub struct DeserializationError(pub String);

impl DeserializationError {
    pub fn new(message: impl Into<String>) -> Self {
        Self(message.into())
    }

}

impl From<serde_json::Error> for DeserializationError {
    fn from(error: serde_json::Error) -> Self {
        Self(error.to_string())
    }
}

/// Errors raised while resolving an exchange symbol to a canonical asset.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum AssetError {
    #[error("Found unsupported asset {identifier}")]
    Unsupported { identifier: String },

    #[error("Unknown asset {identifier} provided")]
    Unknown { identifier: String },

    #[error("{0}")]
    Deserialization(#[from] DeserializationError),
}

/// Everything that can go wrong while mapping one raw record.
///
/// None of these are fatal: the batch driver reports and skips the record.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum RecordError {
    #[error("Found unsupported asset {0}")]
    UnsupportedAsset(String),

    #[error("Unknown asset {0}")]
    UnknownAsset(String),

    #[error("Unprocessable pair {0} encountered.")]
    UnprocessablePair(String),

    #[error("{0}")]
    Deserialization(#[from] DeserializationError),
}

impl From<AssetError> for RecordError {
    fn from(error: AssetError) -> Self {
        match error {
            AssetError::Unsupported { identifier } => Self::UnsupportedAsset(identifier),
            AssetError::Unknown { identifier } => Self::UnknownAsset(identifier),
            AssetError::Deserialization(e) => Self::Deserialization(e),
        }
    }
}
