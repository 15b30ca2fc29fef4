//! Error types for the swiftmx library.

use std::io;
use thiserror::Error;

/// Result type alias for library operations.
pub type Result<T> = std::result::Result<T, Error>;

/// Error types that can occur during configuration loading, parsing, and
/// XML output.
#[derive(Debug, Error)]
pub enum Error {
    /// I/O error occurred during read or write operations.
    #[error("I/O error: {0}")]
    Io(#[from] io::Error),

    /// Error deserializing a JSON configuration file.
    #[error("configuration error: {0}")]
    Config(#[from] serde_json::Error),

    /// A block the schema declares mandatory is absent from the message.
    #[error("missing required block {{{block}:}}")]
    MissingRequiredBlock { block: u8 },

    /// A block marker is present but the block cannot be delimited.
    #[error("malformed block {{{block}:}}: {reason}")]
    MalformedBlock { block: u8, reason: String },

    /// Schema configuration failed a structural sanity check.
    #[error("invalid schema: {0}")]
    InvalidSchema(String),

    /// A mapping destination path could not be parsed.
    #[error("invalid mapping path: {0}")]
    InvalidPath(String),

    /// A validation rule pattern could not be compiled.
    #[error("invalid validation pattern: {0}")]
    InvalidPattern(String),

    /// Error writing XML output.
    #[error("XML error: {0}")]
    Xml(String),

    /// Unknown message type specified.
    #[error("unknown message type: {0}")]
    UnknownMessageType(String),
}

impl From<quick_xml::Error> for Error {
    fn from(err: quick_xml::Error) -> Self {
        Error::Xml(err.to_string())
    }
}
