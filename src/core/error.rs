//! Error types for SVS sync.

use thiserror::Error;

/// Errors produced while decoding an encoded version vector.
#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum CodecError {
    /// An entry between separators was empty.
    #[error("empty vector entry at position {0}")]
    EmptyEntry(usize),

    /// An entry was not of the form `node-seq`.
    #[error("malformed vector entry: {0:?}")]
    MalformedEntry(String),

    /// A number was not a canonical unsigned decimal.
    #[error("invalid number: {0:?}")]
    InvalidNumber(String),

    /// Node ids were not strictly ascending.
    #[error("node {node} out of order after {previous}")]
    OutOfOrder {
        /// Node id that broke the ordering.
        node: u64,
        /// Node id that preceded it.
        previous: u64,
    },

    /// The payload was not valid UTF-8.
    #[error("vector payload is not valid utf-8")]
    InvalidUtf8,
}

/// Errors produced while parsing a sync interest name.
#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum NameError {
    /// The name does not start with the expected prefix.
    #[error("name {name:?} is not under prefix {prefix:?}")]
    WrongPrefix {
        /// The offending name.
        name: String,
        /// The prefix that was expected.
        prefix: String,
    },

    /// A required component is missing.
    #[error("missing {0} component")]
    MissingComponent(&'static str),

    /// More components than a sync name carries.
    #[error("unexpected trailing components")]
    TrailingComponents,

    /// The node id component is not a number.
    #[error("invalid node id: {0:?}")]
    InvalidNodeId(String),

    /// The timestamp component is not a number.
    #[error("invalid timestamp: {0:?}")]
    InvalidTimestamp(String),
}

/// Errors produced while decoding a transport frame.
#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum FrameError {
    /// Input data is shorter than required.
    #[error("frame too short: expected {expected} bytes, got {actual}")]
    TooShort {
        /// Minimum bytes required.
        expected: usize,
        /// Actual bytes received.
        actual: usize,
    },

    /// Unknown frame kind byte.
    #[error("unknown frame kind: {0:#04x}")]
    UnknownKind(u8),

    /// The name is not valid UTF-8.
    #[error("frame name is not valid utf-8")]
    InvalidName,

    /// Encoded frame would not fit in one datagram.
    #[error("frame too large: {size} bytes exceeds {max}")]
    TooLarge {
        /// Encoded size.
        size: usize,
        /// Maximum allowed size.
        max: usize,
    },
}

/// Errors in the transport layer.
#[derive(Debug, Error)]
pub enum TransportError {
    /// I/O error from the underlying socket.
    #[error("i/o error: {0}")]
    Io(#[from] std::io::Error),

    /// Frame encoding failed.
    #[error("frame error: {0}")]
    Frame(#[from] FrameError),

    /// The transport has been shut down.
    #[error("transport closed")]
    Closed,
}

/// Top-level SVS sync errors.
#[derive(Debug, Error)]
pub enum SyncError {
    /// Vector codec error.
    #[error("codec error: {0}")]
    Codec(#[from] CodecError),

    /// Name parsing error.
    #[error("name error: {0}")]
    Name(#[from] NameError),

    /// Transport error.
    #[error("transport error: {0}")]
    Transport(#[from] TransportError),

    /// The engine was created outside a tokio runtime.
    #[error("no tokio runtime available")]
    NoRuntime,

    /// Configuration error.
    #[error("configuration error: {0}")]
    Config(String),
}
