use chrono::{DateTime, Utc};
use reqwest::StatusCode;
use thiserror::Error;

#[derive(Error, Debug)]
pub enum GraphError {
    #[error("HTTP error: {0}")]
    Http(#[from] reqwest::Error),

    #[error("Transport error: {0}")]
    Middleware(#[from] reqwest_middleware::Error),

    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    #[error("Invalid resource URL: {0}")]
    Url(#[from] url::ParseError),

    #[error("Graph API error {status}: {body}")]
    Api { status: StatusCode, body: String },
}

pub type Result<T> = std::result::Result<T, GraphError>;

#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum SessionError {
    #[error("no authenticated session available")]
    Missing,

    #[error("authenticated session expired at {expired_at}")]
    Expired { expired_at: DateTime<Utc> },

    #[error("invalid session data: {0}")]
    Invalid(String),
}

#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum ValidationError {
    #[error("invalid application id '{0}': expected a hyphenated UUID")]
    InvalidAppId(String),

    #[error("invalid scope tag id '{0}': expected digits only")]
    InvalidScopeTagId(String),
}

#[derive(Error, Debug)]
pub enum ConfigError {
    #[error("failed to read config file {path}: {source}")]
    Read {
        path: String,
        #[source]
        source: std::io::Error,
    },

    #[error("failed to parse config file {path}: {source}")]
    Parse {
        path: String,
        #[source]
        source: toml::de::Error,
    },
}
