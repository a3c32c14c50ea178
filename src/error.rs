//! Error kinds surfaced by the poll loop.
use std::fmt;
use thiserror::Error;

use crate::config::ConfigError;

/// Response shape problems found while validating the API body.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ShapeError {
    #[error("response is not a mapping")]
    NotAMapping,
    #[error("response has no \"homeworks\" key")]
    MissingHomeworks,
    #[error("\"homeworks\" is not a list")]
    NotAList,
}

/// Problems with a single submission object.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum FieldError {
    #[error("submission is not a mapping")]
    NotAnObject,
    #[error("submission has no \"homework_name\" key")]
    MissingName,
    #[error("submission has no \"status\" key")]
    MissingStatus,
    #[error("undocumented homework status: {0:?}")]
    UnknownStatus(String),
}

#[derive(Debug, Error)]
pub enum BotError {
    #[error("configuration error: {0}")]
    Config(#[from] ConfigError),
    #[error("failed to reach endpoint {url}: {source}")]
    Transport {
        url: String,
        #[source]
        source: reqwest::Error,
    },
    #[error("endpoint {url} is unavailable, status code {status}")]
    Http { url: String, status: u16 },
    #[error("failed to decode JSON response: {0}")]
    Decode(#[source] serde_json::Error),
    #[error(transparent)]
    Shape(#[from] ShapeError),
    #[error(transparent)]
    Field(#[from] FieldError),
    #[error("failed to send telegram message: {0}")]
    Notify(String),
}

/// Coarse classification of a [`BotError`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ErrorKind {
    Config,
    Transport,
    Decode,
    Shape,
    Field,
    Notify,
}

impl ErrorKind {
    pub fn as_str(&self) -> &'static str {
        match self {
            ErrorKind::Config => "config",
            ErrorKind::Transport => "transport",
            ErrorKind::Decode => "decode",
            ErrorKind::Shape => "shape",
            ErrorKind::Field => "field",
            ErrorKind::Notify => "notify",
        }
    }
}

impl fmt::Display for ErrorKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl BotError {
    pub fn kind(&self) -> ErrorKind {
        match self {
            BotError::Config(_) => ErrorKind::Config,
            BotError::Transport { .. } | BotError::Http { .. } => ErrorKind::Transport,
            BotError::Decode(_) => ErrorKind::Decode,
            BotError::Shape(_) => ErrorKind::Shape,
            BotError::Field(_) => ErrorKind::Field,
            BotError::Notify(_) => ErrorKind::Notify,
        }
    }
}
