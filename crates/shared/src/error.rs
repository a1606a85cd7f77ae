use std::fmt;

use serde::{Deserialize, Serialize};
use thiserror::Error;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum FetchPluginErrorType {
    EmptyResponse,
    GenericError,
}

impl FetchPluginErrorType {
    pub fn as_str(self) -> &'static str {
        match self {
            Self::EmptyResponse => "EMPTY_RESPONSE",
            Self::GenericError => "GENERIC_ERROR",
        }
    }
}

impl fmt::Display for FetchPluginErrorType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Error, Serialize, Deserialize)]
#[error("{kind}: {}", .message.as_deref().unwrap_or("no details"))]
pub struct FetchPluginError {
    pub kind: FetchPluginErrorType,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub message: Option<String>,
}

impl FetchPluginError {
    pub fn new(kind: FetchPluginErrorType) -> Self {
        Self {
            kind,
            message: None,
        }
    }

    pub fn with_message(kind: FetchPluginErrorType, message: impl Into<String>) -> Self {
        Self {
            kind,
            message: Some(message.into()),
        }
    }
}
