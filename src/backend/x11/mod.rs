//! Implementation of the backend types using X11.
//!
//! This backend opens one connection to the X server and creates plain top level windows on
//! its default screen. Window events are read without blocking and translated into
//! [`BackendEvent`]s.
//!
//! ## Example usage
//!
//! ```rust,no_run
//! # use std::error::Error;
//! use glps::backend::x11::X11Backend;
//! use glps::backend::graphics::NoGraphics;
//! use glps::WindowManager;
//!
//! fn run() -> Result<(), Box<dyn Error>> {
//!     // Connect to the X server given by $DISPLAY.
//!     let backend = X11Backend::new()?;
//!     let mut wm = WindowManager::with_graphics(backend, NoGraphics::default());
//!     let window = wm.window_create("Plain X11 window", 640, 480)?;
//!
//!     while !wm.should_close() {
//!         wm.window_update(window)?;
//!     }
//!     Ok(())
//! }
//! ```
//!
//! ## EGL
//!
//! The connection handle returned by [`Backend::native_display`] may be passed to the
//! [`EglGraphics`](crate::backend::egl::EglGraphics) binder, which renders to the windows
//! through the X11 EGL platform.

mod cursor;
mod error;
mod input;
mod keymap;
mod window_inner;

use std::{collections::HashMap, fmt};

use cursor_icon::CursorIcon;
use tracing::{debug, error, info, info_span, trace};
use x11rb::{
    atom_manager,
    connection::Connection,
    protocol::{
        xproto::{self as x11, ColormapAlloc, ConnectionExt},
        Event,
    },
    xcb_ffi::XCBConnection,
};

pub use self::error::X11Error;
use self::{
    cursor::CursorCache,
    keymap::Keymap,
    window_inner::{WindowInner, WindowParams},
};
use super::{
    Backend, BackendError, BackendEvent, ClipboardError, EventKind, NativeDisplay, NativeWindow, Platform,
};
use crate::utils::{Point, Size};

atom_manager! {
    pub(crate) Atoms: AtomCollectionCookie {
        WM_PROTOCOLS,
        WM_DELETE_WINDOW,
        _NET_WM_NAME,
        UTF8_STRING,
        _NET_WM_WINDOW_TYPE,
        _NET_WM_WINDOW_TYPE_NORMAL,
        _NET_WM_WINDOW_TYPE_DOCK,
        _MOTIF_WM_HINTS,
        _NET_WM_WINDOW_OPACITY,
        _KDE_NET_WM_BLUR_BEHIND_REGION,
    }
}

/// Represents an active connection to the X server and the windows created through it.
pub struct X11Backend {
    connection: XCBConnection,
    screen_number: usize,
    params: WindowParams,
    atoms: Atoms,
    windows: HashMap<x11::Window, WindowInner>,
    cursors: CursorCache,
    keymap: Keymap,
    text_font: x11::Font,
    closed: bool,
    span: tracing::Span,
}

impl fmt::Debug for X11Backend {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("X11Backend")
            .field("screen_number", &self.screen_number)
            .field("params", &self.params)
            .field("windows", &self.windows.keys().collect::<Vec<_>>())
            .field("closed", &self.closed)
            .finish_non_exhaustive()
    }
}

impl X11Backend {
    /// Initializes the X11 backend by connecting to the X server.
    pub fn new() -> Result<X11Backend, X11Error> {
        let span = info_span!("backend_x11");
        let _guard = span.enter();

        info!("Connecting to the X server");

        let (connection, screen_number) = XCBConnection::connect(None)?;
        info!("Connected to screen {}", screen_number);

        let screen = connection
            .setup()
            .roots
            .get(screen_number)
            .ok_or(X11Error::NoVisual)?;
        let (root, depth, visual_id, border_pixel) = (
            screen.root,
            screen.root_depth,
            screen.root_visual,
            screen.black_pixel,
        );

        // Make a colormap
        let colormap = connection.generate_id()?;
        connection.create_colormap(ColormapAlloc::NONE, colormap, root, visual_id)?;

        let atoms = Atoms::new(&connection)?.reply()?;

        let text_font = connection.generate_id()?;
        connection.open_font(text_font, b"fixed")?;

        let cursors = CursorCache::new(&connection)?;
        let keymap = Keymap::fetch(&connection)?;
        connection.flush()?;

        drop(_guard);
        Ok(X11Backend {
            connection,
            screen_number,
            params: WindowParams {
                root,
                depth,
                visual_id,
                colormap,
                border_pixel,
            },
            atoms,
            windows: HashMap::new(),
            cursors,
            keymap,
            text_font,
            closed: false,
            span,
        })
    }

    /// The underlying xcb connection
    pub fn connection(&self) -> &XCBConnection {
        &self.connection
    }

    /// Number of the screen windows are created on
    pub fn screen_number(&self) -> usize {
        self.screen_number
    }

    /// The "fixed" core font, for drawing text with core requests
    pub fn text_font(&self) -> x11::Font {
        self.text_font
    }

    fn window(&self, window: x11::Window) -> Result<&WindowInner, X11Error> {
        self.windows.get(&window).ok_or(X11Error::UnknownWindow)
    }

    fn refresh_keymap(&mut self) {
        match Keymap::fetch(&self.connection) {
            Ok(keymap) => self.keymap = keymap,
            Err(err) => debug!("Failed to refresh the keyboard mapping: {}", err),
        }
    }
}

impl Backend for X11Backend {
    type Window = x11::Window;

    fn platform(&self) -> Platform {
        Platform::X11
    }

    fn native_display(&self) -> NativeDisplay {
        NativeDisplay::X11 {
            connection: self.connection.get_raw_xcb_connection(),
            screen: self.screen_number as i32,
        }
    }

    fn native_window(&self, window: x11::Window) -> NativeWindow {
        NativeWindow::X11 {
            window,
            visual_id: self.params.visual_id,
        }
    }

    fn create_window(
        &mut self,
        title: &str,
        position: Point<i32>,
        size: Size<u32>,
    ) -> Result<x11::Window, BackendError> {
        let _guard = self.span.enter();
        if self.closed {
            return Err(BackendError::ConnectionLost);
        }

        let window = WindowInner::new(&self.connection, &self.params, self.atoms, title, position, size)?;
        let id = window.id;
        debug!(window = id, title, "Created window");
        self.windows.insert(id, window);
        Ok(id)
    }

    fn show_window(&mut self, window: x11::Window) -> Result<(), BackendError> {
        Ok(self.window(window)?.map(&self.connection)?)
    }

    fn destroy_window(&mut self, window: x11::Window) {
        if let Some(inner) = self.windows.remove(&window) {
            inner.destroy(&self.connection);
            let _ = self.connection.flush();
        }
    }

    fn window_size(&self, window: x11::Window) -> Result<Size<u32>, BackendError> {
        Ok(self.window(window)?.size(&self.connection)?)
    }

    fn set_resizable(&mut self, window: x11::Window, resizable: bool) -> Result<(), BackendError> {
        Ok(self.window(window)?.set_resizable(&self.connection, resizable)?)
    }

    fn set_decorations(&mut self, window: x11::Window, enabled: bool) -> Result<(), BackendError> {
        Ok(self.window(window)?.set_decorations(&self.connection, enabled)?)
    }

    fn set_opacity(&mut self, window: x11::Window, opacity: f32) -> Result<(), BackendError> {
        Ok(self.window(window)?.set_opacity(&self.connection, opacity)?)
    }

    fn set_blur(&mut self, window: x11::Window, enabled: bool, radius: u32) -> Result<(), BackendError> {
        Ok(self.window(window)?.set_blur(&self.connection, enabled, radius)?)
    }

    fn set_background_transparent(&mut self, window: x11::Window) -> Result<(), BackendError> {
        Ok(self.window(window)?.set_background_transparent(&self.connection)?)
    }

    fn set_cursor(&mut self, window: x11::Window, icon: CursorIcon) -> Result<(), BackendError> {
        let cursor = self.cursors.get(&self.connection, icon)?;
        let inner = self.windows.get(&window).ok_or(BackendError::UnknownWindow)?;
        Ok(inner.set_cursor(&self.connection, cursor)?)
    }

    fn poll_event(&mut self) -> Result<Option<BackendEvent<x11::Window>>, BackendError> {
        let span = self.span.clone();
        let _guard = span.enter();

        loop {
            let event = match self.connection.poll_for_event() {
                Ok(Some(event)) => event,
                Ok(None) => return Ok(None),
                Err(err) => {
                    error!("Connection to the X server was lost: {}", err);
                    return Err(BackendError::ConnectionLost);
                }
            };

            match event {
                Event::Error(ref err) => {
                    error!("X11 protocol error: {:?}", err);
                    continue;
                }
                Event::MappingNotify(_) => {
                    self.refresh_keymap();
                    continue;
                }
                _ => {}
            }

            let Some(translated) = input::translate(&event, &self.atoms, &self.keymap) else {
                continue;
            };
            if !self.windows.contains_key(&translated.window) {
                trace!(window = translated.window, "Event for a destroyed window");
                continue;
            }
            if matches!(translated.kind, EventKind::Destroyed) {
                // The server already destroyed it, never destroy it a second time
                self.windows.remove(&translated.window);
            }
            return Ok(Some(translated));
        }
    }

    fn request_redraw(&mut self, window: x11::Window) -> Result<(), BackendError> {
        self.window(window)?.request_redraw(&self.connection)?;
        self.flush()
    }

    fn flush(&mut self) -> Result<(), BackendError> {
        self.connection
            .flush()
            .map_err(|_| BackendError::ConnectionLost)
    }

    fn set_clipboard(&mut self, _mime: &str, _data: &str) -> Result<(), ClipboardError> {
        Err(ClipboardError::Unsupported(Platform::X11))
    }

    fn clipboard(&mut self) -> Result<String, ClipboardError> {
        Err(ClipboardError::Unsupported(Platform::X11))
    }

    fn close(&mut self) {
        if self.closed {
            return;
        }
        let _guard = self.span.enter();

        for (_, window) in self.windows.drain() {
            window.destroy(&self.connection);
        }
        self.cursors.free(&self.connection);
        let _ = self.connection.close_font(self.text_font);
        let _ = self.connection.free_colormap(self.params.colormap);
        let _ = self.connection.flush();
        self.closed = true;
        info!("Disconnected from the X server");
    }
}

impl Drop for X11Backend {
    fn drop(&mut self) {
        self.close();
    }
}
