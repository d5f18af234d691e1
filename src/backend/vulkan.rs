//! Helpers to present with Vulkan to the windows of a backend.
//!
//! Instance, device and swapchain management are left to the application, this module only
//! bridges the native handles of the backends to [`ash`](https://crates.io/crates/ash)
//! through [`ash_window`].

use std::ffi::c_char;

use ash::{vk, Entry, Instance};
use tracing::debug;

use super::{NativeDisplay, NativeWindow};

/// Error that may occur when bridging to vulkan
#[derive(Debug, thiserror::Error)]
pub enum VulkanError {
    /// The backend has no native handle vulkan could use
    #[error("The backend provides no native handle for vulkan")]
    NoHandle,
    /// A vulkan call failed
    #[error("Vulkan call failed: {0}")]
    Vk(#[from] vk::Result),
}

/// Instance extensions required to create surfaces on this display
pub fn required_extensions(display: &NativeDisplay) -> Result<&'static [*const c_char], VulkanError> {
    let handle = display.raw_display_handle().ok_or(VulkanError::NoHandle)?;
    Ok(ash_window::enumerate_required_extensions(handle)?)
}

/// Create a surface for a window.
///
/// # Safety
///
/// The `instance` must have been created from `entry` with the extensions returned by
/// [`required_extensions`] enabled. The surface must be destroyed before the window.
pub unsafe fn create_surface(
    entry: &Entry,
    instance: &Instance,
    display: &NativeDisplay,
    window: &NativeWindow,
) -> Result<vk::SurfaceKHR, VulkanError> {
    let display_handle = display.raw_display_handle().ok_or(VulkanError::NoHandle)?;
    let window_handle = window.raw_window_handle().ok_or(VulkanError::NoHandle)?;

    let surface = ash_window::create_surface(entry, instance, display_handle, window_handle, None)?;
    debug!(?surface, "Created vulkan surface");
    Ok(surface)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn headless_has_no_vulkan_handles() {
        assert!(matches!(
            required_extensions(&NativeDisplay::Headless),
            Err(VulkanError::NoHandle)
        ));
    }

    #[test]
    fn xcb_needs_the_xcb_surface_extension() {
        let display = NativeDisplay::X11 {
            connection: std::ptr::null_mut(),
            screen: 0,
        };
        let extensions = required_extensions(&display).unwrap();
        let names: Vec<_> = extensions
            .iter()
            .map(|name| unsafe { std::ffi::CStr::from_ptr(*name) })
            .collect();
        assert!(names.contains(&ash::extensions::khr::Surface::name()));
        assert!(names.contains(&ash::extensions::khr::XcbSurface::name()));
    }
}
