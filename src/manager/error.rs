use crate::backend::{graphics::GraphicsError, BackendError};

use super::WindowId;

/// Errors of the per window operations
#[derive(Debug, thiserror::Error)]
pub enum WindowError {
    /// The window manager was already destroyed
    #[error("The window manager was destroyed")]
    Destroyed,
    /// The id names no open window
    #[error("There is no open window with id {}", .0.index())]
    InvalidId(WindowId),
    /// No more windows can be opened
    #[error("The maximum of {0} open windows was reached")]
    CapacityReached(usize),
    /// The windowing backend failed
    #[error(transparent)]
    Backend(#[from] BackendError),
    /// The graphics binder failed
    #[error(transparent)]
    Graphics(#[from] GraphicsError),
}

/// Errors of window manager initialization
#[derive(Debug, thiserror::Error)]
pub enum InitError {
    /// The display connection could not be opened
    #[error("Failed to open the display connection: {0}")]
    Backend(#[source] BackendError),
}
