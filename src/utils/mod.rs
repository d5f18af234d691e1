//! Various utilities functions and types

mod geometry;

pub use self::geometry::{Point, Size};

use tracing::error;

/// Log an unrecoverable failure and terminate the process.
///
/// Used where the window manager cannot continue in a meaningful state, such as a lost
/// display connection or a failed shared graphics context.
#[cold]
pub(crate) fn fatal(message: std::fmt::Arguments<'_>) -> ! {
    error!("{}", message);
    std::process::exit(1)
}
