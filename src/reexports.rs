//! Reexports of crates, that are part of the public api, for convenience

#[cfg(feature = "vulkan")]
pub use ash;
pub use cursor_icon;
pub use raw_window_handle;
#[cfg(feature = "backend_x11")]
pub use x11rb;
