use std::io;
use thiserror::Error;

/// How the connection driver must react to a [`ParseError`].
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ErrorKind {
    /// More input is needed; wait for the socket to become readable again.
    NotReady,
    /// The client broke the protocol. Answer with a client error, then close.
    Malformed,
    /// The peer went away or the stream failed. Close without a response.
    Abandoned,
    /// A line did not fit into the fixed-capacity buffer.
    ResourceExhausted,
}

#[derive(Error, Debug)]
pub enum ParseError {
    #[error("incomplete input, more data required")]
    Incomplete,

    #[error("malformed request line: {reason}")]
    MalformedRequestLine { reason: String },

    #[error("missing multipart boundary: {reason}")]
    MissingBoundary { reason: String },

    #[error("malformed part header: {reason}")]
    MalformedPartHeader { reason: String },

    #[error("line exceeds the buffer capacity of {max_size} bytes")]
    LineTooLong { max_size: usize },

    #[error("peer closed the connection mid-request")]
    Closed,

    #[error("io error: {source}")]
    Io {
        #[from]
        source: io::Error,
    },

    #[error("sink write failed: {source}")]
    Sink { source: io::Error },
}

impl ParseError {
    pub fn malformed_request_line<S: ToString>(str: S) -> Self {
        Self::MalformedRequestLine { reason: str.to_string() }
    }

    pub fn missing_boundary<S: ToString>(str: S) -> Self {
        Self::MissingBoundary { reason: str.to_string() }
    }

    pub fn malformed_part_header<S: ToString>(str: S) -> Self {
        Self::MalformedPartHeader { reason: str.to_string() }
    }

    pub fn sink<E: Into<io::Error>>(e: E) -> Self {
        Self::Sink { source: e.into() }
    }

    pub fn kind(&self) -> ErrorKind {
        match self {
            ParseError::Incomplete => ErrorKind::NotReady,
            ParseError::MalformedRequestLine { .. } | ParseError::MissingBoundary { .. } => {
                ErrorKind::Malformed
            }
            ParseError::LineTooLong { .. } => ErrorKind::ResourceExhausted,
            ParseError::Closed
            | ParseError::Io { .. }
            | ParseError::MalformedPartHeader { .. }
            | ParseError::Sink { .. } => ErrorKind::Abandoned,
        }
    }
}
