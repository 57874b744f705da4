//! Relay error types.
//!
//! [`RelayError`] is the central error type for the relay. Inside a
//! connection handler it only ends that one session. Returned from startup
//! (configuration, bind) or from the accept loop it is fatal to the whole
//! server.

/// Server-side error enum.
#[derive(Debug, thiserror::Error)]
pub enum RelayError {
    /// Socket-level failure (bind, listen, accept, read, write).
    #[error("io error: {0}")]
    Io(#[from] std::io::Error),

    /// A configuration value could not be used.
    #[error("invalid configuration: {0}")]
    InvalidConfig(String),
}

impl RelayError {
    /// Returns `true` if the error means the peer went away, as opposed to
    /// a local failure.
    #[must_use]
    pub fn is_disconnect(&self) -> bool {
        match self {
            Self::Io(err) => matches!(
                err.kind(),
                std::io::ErrorKind::BrokenPipe
                    | std::io::ErrorKind::ConnectionReset
                    | std::io::ErrorKind::ConnectionAborted
                    | std::io::ErrorKind::UnexpectedEof
            ),
            Self::InvalidConfig(_) => false,
        }
    }
}
