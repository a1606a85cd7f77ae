//! Errors raised by the REST clients.

use reqwest::StatusCode;
use thiserror::Error;

#[derive(Debug, Error)]
pub enum RestError {
    #[error("request failed: {0}")]
    Transport(#[from] reqwest::Error),
    #[error("server returned {status}: {body}")]
    Status { status: StatusCode, body: String },
    #[error("failed to decode response: {0}")]
    Decode(#[from] serde_json::Error),
    #[error("invalid endpoint url: {0}")]
    InvalidUrl(#[from] url::ParseError),
    #[error("'{0}' cannot be used as a base url")]
    CannotBeABase(String),
    #[error("server rejected the request: {0}")]
    Rejected(String),
}
