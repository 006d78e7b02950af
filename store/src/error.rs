//! Error types shared by every store layer.

use thiserror::Error;

/// All possible errors from a store operation.
///
/// Decorators propagate inner errors unchanged; the REST boundary maps
/// these to HTTP status codes and back.
#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum Error {
    #[error("object already exists")]
    ObjectExists,

    #[error("object does not exist")]
    NoSuchObject,

    #[error("method not allowed")]
    InvalidMethod,

    #[error("invalid request path")]
    InvalidPath,

    #[error("invalid filter key")]
    InvalidFilter,

    #[error("unknown kind {0}")]
    UnknownKind(String),

    #[error("invalid option: {0}")]
    InvalidOption(String),

    #[error("serialization error: {0}")]
    Serde(String),

    #[error("sql error: {0}")]
    Sql(String),

    #[error("document store error: {0}")]
    Mongo(String),

    #[error("http {status}")]
    Http { status: u16, message: String },

    #[error("transport error: {0}")]
    Transport(String),

    /// Free-form error raised by application callbacks.
    #[error("{0}")]
    Internal(String),
}

impl Error {
    /// Map a wire error message back to its taxonomy variant, if it is one
    /// of the fixed messages a server emits.
    pub fn from_wire(message: &str) -> Option<Self> {
        match message {
            "object already exists" => Some(Error::ObjectExists),
            "object does not exist" => Some(Error::NoSuchObject),
            "method not allowed" => Some(Error::InvalidMethod),
            "invalid request path" => Some(Error::InvalidPath),
            "invalid filter key" => Some(Error::InvalidFilter),
            _ => None,
        }
    }
}

impl From<serde_json::Error> for Error {
    fn from(err: serde_json::Error) -> Self {
        Error::Serde(err.to_string())
    }
}

impl From<sqlx::Error> for Error {
    fn from(err: sqlx::Error) -> Self {
        Error::Sql(err.to_string())
    }
}

impl From<mongodb::error::Error> for Error {
    fn from(err: mongodb::error::Error) -> Self {
        Error::Mongo(err.to_string())
    }
}

impl From<reqwest::Error> for Error {
    fn from(err: reqwest::Error) -> Self {
        Error::Transport(err.to_string())
    }
}

/// Result type for store operations.
pub type Result<T> = std::result::Result<T, Error>;
