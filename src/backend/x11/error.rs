use x11rb::errors::{ConnectError, ConnectionError, ReplyError, ReplyOrIdError};

use crate::backend::BackendError;

/// An error emitted by the X11 backend.
#[derive(Debug, thiserror::Error)]
pub enum X11Error {
    /// Connecting to the X server failed.
    #[error("Connecting to the X server failed: {0}")]
    ConnectionFailed(#[from] ConnectError),

    /// Connection to X server was lost.
    #[error("Connection to the X server was lost")]
    ConnectionLost,

    /// Some protocol error occurred.
    #[error("X11 protocol error: {0}")]
    Protocol(#[from] ReplyOrIdError),

    /// The window does not belong to this backend or was already destroyed.
    #[error("The window does not belong to this X11 backend")]
    UnknownWindow,

    /// No visual fulfilling the requirements was found.
    #[error("No visual fulfilling the requirements was found")]
    NoVisual,
}

impl From<ReplyError> for X11Error {
    fn from(err: ReplyError) -> Self {
        match err {
            ReplyError::ConnectionError(_) => Self::ConnectionLost,
            err => Self::Protocol(err.into()),
        }
    }
}

impl From<ConnectionError> for X11Error {
    fn from(_: ConnectionError) -> Self {
        Self::ConnectionLost
    }
}

impl From<X11Error> for BackendError {
    fn from(err: X11Error) -> Self {
        match err {
            X11Error::ConnectionLost => BackendError::ConnectionLost,
            X11Error::UnknownWindow => BackendError::UnknownWindow,
            err => BackendError::Platform(Box::new(err)),
        }
    }
}
