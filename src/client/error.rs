use std::io;

use thiserror::Error;

/// A type alias for results with possible `ClientError`s.
pub type Result<T> = ::std::result::Result<T, ClientError>;

/// Errors raised by the Pedro client.
///
/// A request the server refuses is not an error: it is an ack of `0`.
#[derive(Debug)]
#[derive(Error)]
pub enum ClientError {
    #[error("I/O error during {stage}: {source}")]
    Io {
        stage: &'static str,
        #[source]
        source: io::Error,
    },
    #[error("handshake with {host}:{port} failed: {reason}")]
    Handshake {
        host: String,
        port: u16,
        reason: String,
    },
    #[error("{host}:{port} rejected the client: {reply:?}")]
    Rejected {
        host: String,
        port: u16,
        reply: String,
    },
    #[error("protocol violation: {0}")]
    Protocol(String),
    #[error("timed out during {stage}")]
    Timeout { stage: &'static str },
    #[error("not connected")]
    NotConnected,
    #[error("bad p2p address: {0}")]
    BadAddress(String),
}

impl ClientError {
    pub(crate) fn io(stage: &'static str) -> impl FnOnce(io::Error) -> ClientError {
        move |source| ClientError::Io { stage, source }
    }
}
