//! Backend (windowing/graphics) creation helpers
//!
//! Collection of common traits and implementation about creating native windows,
//! receiving input from them and binding graphics surfaces to them.
//!
//! Supported windowing backends:
//!
//! - x11 (feature `backend_x11`)
//! - winapi (feature `backend_winapi`, Windows only)
//! - headless, always available, drives the window manager without a display server
//!
//! Supported graphics binders:
//!
//! - egl (feature `egl`), one shared OpenGL ES 3.0 context for all windows, the default on X11
//! - wgl (feature `backend_winapi`, Windows only), one shared desktop OpenGL context, the default
//!   on Windows. EGL stays available there for applications shipping an EGL implementation
//!   such as ANGLE.
//! - none, for applications that render through vulkan or not at all
//!
//! Every windowing backend implements the [`Backend`] trait. The window manager only
//! ever talks to that trait, which keeps all platform specific code behind this module.

use std::{error::Error, ffi::c_void, fmt};

use cursor_icon::CursorIcon;
use raw_window_handle::{
    RawDisplayHandle, RawWindowHandle, Win32WindowHandle, WindowsDisplayHandle, XcbDisplayHandle,
    XcbWindowHandle,
};

use crate::utils::{Point, Size};

pub mod graphics;
pub mod headless;
pub mod input;

#[cfg(feature = "egl")]
pub mod egl;
#[cfg(feature = "vulkan")]
pub mod vulkan;
#[cfg(all(windows, feature = "backend_winapi"))]
pub mod wgl;
#[cfg(all(windows, feature = "backend_winapi"))]
pub mod winapi;
#[cfg(feature = "backend_x11")]
pub mod x11;

use self::input::{AxisEvent, ButtonState, DropEvent, KeyEvent, MouseButton};

/// The windowing system a backend talks to
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Platform {
    /// X Window System through xcb
    X11,
    /// Win32 windowing API
    Win32,
    /// In-memory backend without a display server
    Headless,
}

/// Native handle of the display connection
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum NativeDisplay {
    /// An xcb connection
    X11 {
        /// Raw `xcb_connection_t` pointer
        connection: *mut c_void,
        /// Default screen number of the connection
        screen: i32,
    },
    /// The module instance that registered the window class
    Win32 {
        /// Raw `HINSTANCE`
        hinstance: isize,
    },
    /// The headless backend has no native display
    Headless,
}

impl NativeDisplay {
    /// Get the raw display handle, as used by graphics APIs like vulkan
    pub fn raw_display_handle(&self) -> Option<RawDisplayHandle> {
        match *self {
            NativeDisplay::X11 { connection, screen } => {
                let mut handle = XcbDisplayHandle::empty();
                handle.connection = connection;
                handle.screen = screen;
                Some(RawDisplayHandle::Xcb(handle))
            }
            NativeDisplay::Win32 { .. } => Some(RawDisplayHandle::Windows(WindowsDisplayHandle::empty())),
            NativeDisplay::Headless => None,
        }
    }
}

/// Native handle of a single window
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum NativeWindow {
    /// An X11 window
    X11 {
        /// The window XID
        window: u32,
        /// Visual the window was created with
        visual_id: u32,
    },
    /// A Win32 window
    Win32 {
        /// Raw `HWND`
        hwnd: isize,
        /// Raw `HINSTANCE` of the window class
        hinstance: isize,
    },
    /// A window of the headless backend
    Headless(u64),
}

impl NativeWindow {
    /// Get the raw window handle, as used by graphics APIs like vulkan
    pub fn raw_window_handle(&self) -> Option<RawWindowHandle> {
        match *self {
            NativeWindow::X11 { window, visual_id } => {
                let mut handle = XcbWindowHandle::empty();
                handle.window = window;
                handle.visual_id = visual_id;
                Some(RawWindowHandle::Xcb(handle))
            }
            NativeWindow::Win32 { hwnd, hinstance } => {
                let mut handle = Win32WindowHandle::empty();
                handle.hwnd = hwnd as *mut c_void;
                handle.hinstance = hinstance as *mut c_void;
                Some(RawWindowHandle::Win32(handle))
            }
            NativeWindow::Headless(_) => None,
        }
    }
}

/// An event reported by a backend for one of its windows
#[derive(Debug, Clone, PartialEq)]
pub struct BackendEvent<W> {
    /// Native window the event belongs to
    pub window: W,
    /// What happened
    pub kind: EventKind,
}

/// The kinds of window events a backend reports
#[derive(Debug, Clone, PartialEq)]
pub enum EventKind {
    /// The user asked the window to close, usually through the title bar
    CloseRequested,
    /// The window was destroyed by the window system.
    ///
    /// The native window is already gone, backends forget it before reporting this event so
    /// only its graphics surface is left to release.
    Destroyed,
    /// The window got a new size
    Resized(Size<u32>),
    /// Part of the window needs to be redrawn
    Exposed,
    /// The pointer moved inside the window
    PointerMotion(Point<f64>),
    /// The pointer entered the window
    PointerEnter(Point<f64>),
    /// The pointer left the window
    PointerLeave,
    /// A pointer button changed state
    PointerButton {
        /// Affected button
        button: MouseButton,
        /// New button state
        state: ButtonState,
    },
    /// The user scrolled
    PointerAxis(AxisEvent),
    /// A key changed state
    Key(KeyEvent),
    /// The window gained keyboard focus
    FocusIn,
    /// The window lost keyboard focus
    FocusOut,
    /// Something was dropped onto the window
    Dropped(DropEvent),
}

/// Errors a windowing backend may report
#[derive(Debug, thiserror::Error)]
pub enum BackendError {
    /// The connection to the display server was lost
    #[error("The connection to the display server was lost")]
    ConnectionLost,
    /// The window does not belong to this backend, or was already destroyed
    #[error("The window does not belong to this backend")]
    UnknownWindow,
    /// The backend cannot perform this request
    #[error("The operation is not supported by the {0:?} backend")]
    Unsupported(Platform),
    /// A platform specific failure
    #[error(transparent)]
    Platform(Box<dyn Error + Send + Sync>),
}

/// Errors of the clipboard operations
#[derive(Debug, thiserror::Error)]
pub enum ClipboardError {
    /// The clipboard could not be opened
    #[error("The clipboard could not be opened")]
    OpenFailed,
    /// Writing the clipboard failed
    #[error("Failed to write the clipboard")]
    WriteFailed,
    /// The clipboard holds no data of the requested type
    #[error("The clipboard holds no text")]
    Empty,
    /// The backend has no clipboard support
    #[error("The clipboard is not supported by the {0:?} backend")]
    Unsupported(Platform),
}

/// A windowing system connection owning native windows.
///
/// Implementations must never block in [`Backend::poll_event`]; the window manager
/// drains a bounded number of events per call and returns control to the application.
pub trait Backend: fmt::Debug {
    /// Native window identifier of this backend
    type Window: Copy + Eq + fmt::Debug;

    /// The windowing system this backend talks to
    fn platform(&self) -> Platform;

    /// Native handle of the display connection
    fn native_display(&self) -> NativeDisplay;

    /// Native handle of one of this backend's windows
    fn native_window(&self, window: Self::Window) -> NativeWindow;

    /// Create a new window, not yet shown.
    fn create_window(
        &mut self,
        title: &str,
        position: Point<i32>,
        size: Size<u32>,
    ) -> Result<Self::Window, BackendError>;

    /// Make a window visible, once its graphics surface is bound
    fn show_window(&mut self, window: Self::Window) -> Result<(), BackendError>;

    /// Destroy a window. Unknown windows are ignored.
    fn destroy_window(&mut self, window: Self::Window);

    /// Query the current size of a window from the window system
    fn window_size(&self, window: Self::Window) -> Result<Size<u32>, BackendError>;

    /// Allow or forbid interactive resizing
    fn set_resizable(&mut self, window: Self::Window, resizable: bool) -> Result<(), BackendError>;

    /// Show or hide the window decorations
    fn set_decorations(&mut self, window: Self::Window, enabled: bool) -> Result<(), BackendError>;

    /// Set the opacity of the whole window, `0.0` to `1.0`
    fn set_opacity(&mut self, window: Self::Window, opacity: f32) -> Result<(), BackendError>;

    /// Ask the compositor to blur whatever is behind the window
    fn set_blur(&mut self, window: Self::Window, enabled: bool, radius: u32) -> Result<(), BackendError>;

    /// Make the window background transparent
    fn set_background_transparent(&mut self, window: Self::Window) -> Result<(), BackendError>;

    /// Set the cursor shown while the pointer is above the window
    fn set_cursor(&mut self, window: Self::Window, icon: CursorIcon) -> Result<(), BackendError>;

    /// Fetch the next pending event without blocking
    fn poll_event(&mut self) -> Result<Option<BackendEvent<Self::Window>>, BackendError>;

    /// Ask the window system to repaint a window
    fn request_redraw(&mut self, window: Self::Window) -> Result<(), BackendError>;

    /// Flush pending requests to the window system
    fn flush(&mut self) -> Result<(), BackendError>;

    /// Place text on the system clipboard
    fn set_clipboard(&mut self, mime: &str, data: &str) -> Result<(), ClipboardError>;

    /// Read text from the system clipboard
    fn clipboard(&mut self) -> Result<String, ClipboardError>;

    /// Close the display connection. Calling this more then once has no effect.
    fn close(&mut self);
}

/// The windowing backend native to the compiled platform
#[cfg(all(windows, feature = "backend_winapi"))]
pub type DefaultBackend = winapi::WinapiBackend;

/// The windowing backend native to the compiled platform
#[cfg(all(not(windows), feature = "backend_x11"))]
pub type DefaultBackend = x11::X11Backend;

/// The graphics binder native to the compiled platform
#[cfg(all(windows, feature = "backend_winapi"))]
pub type DefaultGraphics = wgl::WglGraphics;

/// The graphics binder native to the compiled platform
#[cfg(all(not(all(windows, feature = "backend_winapi")), feature = "egl"))]
pub type DefaultGraphics = egl::EglGraphics;

/// The graphics binder native to the compiled platform
#[cfg(all(not(all(windows, feature = "backend_winapi")), not(feature = "egl")))]
pub type DefaultGraphics = graphics::NoGraphics;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn x11_handles() {
        let window = NativeWindow::X11 {
            window: 0x0040_0001,
            visual_id: 0x21,
        };
        match window.raw_window_handle() {
            Some(RawWindowHandle::Xcb(handle)) => {
                assert_eq!(handle.window, 0x0040_0001);
                assert_eq!(handle.visual_id, 0x21);
            }
            other => panic!("unexpected handle {:?}", other),
        }
        assert!(NativeWindow::Headless(1).raw_window_handle().is_none());
        assert!(NativeDisplay::Headless.raw_display_handle().is_none());
    }
}
