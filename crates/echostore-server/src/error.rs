//! Error types for the echostore runtime

use std::fmt;
use std::io;

/// Result type for server operations
pub type ServerResult<T> = Result<T, ServerError>;

/// Fatal startup errors.
///
/// Everything else in the server is handled locally: a transient accept
/// failure is logged and the loop continues, a read/write failure kills only
/// its connection's worker. Only setup failures reach `main` and change the
/// exit status.
#[derive(Debug)]
pub enum ServerError {
    /// socket/bind/listen, signal registration, daemonization or data-file
    /// creation failed
    Setup {
        stage: &'static str,
        source: io::Error,
    },
}

impl ServerError {
    pub(crate) fn setup(stage: &'static str, source: io::Error) -> Self {
        ServerError::Setup { stage, source }
    }
}

impl fmt::Display for ServerError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ServerError::Setup { stage, source } => {
                write!(f, "setup failed at {}: {}", stage, source)
            }
        }
    }
}

impl std::error::Error for ServerError {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        match self {
            ServerError::Setup { source, .. } => Some(source),
        }
    }
}

/// Errors from a single store operation.
///
/// These terminate at most one connection's worker; the store itself and the
/// rest of the service keep going.
#[derive(Debug)]
pub enum StoreError {
    /// Reading the backing resource failed
    Read(io::Error),

    /// Appending to the backing resource, or forwarding a snapshot chunk to
    /// the sink, failed
    Write(io::Error),

    /// The device rejected a cursor reposition
    Seek(io::Error),

    /// Reposition requested on a file-backed resource
    SeekUnsupported,
}

impl fmt::Display for StoreError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            StoreError::Read(e) => write!(f, "store read failed: {}", e),
            StoreError::Write(e) => write!(f, "store write failed: {}", e),
            StoreError::Seek(e) => write!(f, "store reposition failed: {}", e),
            StoreError::SeekUnsupported => {
                write!(f, "reposition is not supported by a file-backed store")
            }
        }
    }
}

impl std::error::Error for StoreError {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        match self {
            StoreError::Read(e) | StoreError::Write(e) | StoreError::Seek(e) => Some(e),
            StoreError::SeekUnsupported => None,
        }
    }
}
