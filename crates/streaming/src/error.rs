use formats::GridCodecError;
use reqwest::StatusCode;
use thiserror::Error;

/// The request did not produce a successful response body.
#[derive(Debug, Error)]
pub enum TransportError {
    #[error("HTTP error {status} from {url}")]
    Status { url: String, status: StatusCode },
    #[error("request to {url} failed: {source}")]
    Request {
        url: String,
        #[source]
        source: reqwest::Error,
    },
    #[error("failed to encode request body: {0}")]
    Encode(#[from] serde_json::Error),
    #[error("failed to build HTTP client: {0}")]
    Client(#[source] reqwest::Error),
}

impl TransportError {
    /// HTTP status, when the server answered at all.
    pub fn status(&self) -> Option<StatusCode> {
        match self {
            TransportError::Status { status, .. } => Some(*status),
            TransportError::Request { source, .. } => source.status(),
            TransportError::Encode(_) | TransportError::Client(_) => None,
        }
    }
}

/// Failure of a fetch-and-decode call.
#[derive(Debug, Error)]
pub enum FetchError {
    #[error(transparent)]
    Transport(#[from] TransportError),
    #[error(transparent)]
    Malformed(#[from] GridCodecError),
}
