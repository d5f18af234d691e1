/**
A note for future contributors and maintainers:

When editing this file, grab the nearest copy of the ICCCM. Following the ICCCM is paramount to
X11 clients behaving properly and preventing scenarios such as windows not being resized in tiling
window managers.

Pay particular attention to "Section 4: Client to Window Manager Communication"

A link to the ICCCM Section 4: https://tronche.com/gui/x/icccm/sec-4.html
*/
use tracing::debug;
use x11rb::{
    connection::Connection,
    properties::WmSizeHints,
    protocol::xproto::{
        self as x11, AtomEnum, ChangeWindowAttributesAux, ConnectionExt, CreateWindowAux, EventMask,
        ExposeEvent, PropMode, WindowClass,
    },
    wrapper::ConnectionExt as _,
    NONE,
};

use super::{Atoms, X11Error};
use crate::utils::{Point, Size};

// _MOTIF_WM_HINTS flag telling the window manager the decorations field is set
const MWM_HINTS_DECORATIONS: u32 = 1 << 1;

/// Visual parameters every window of a backend is created with
#[derive(Debug, Clone, Copy)]
pub(crate) struct WindowParams {
    pub root: x11::Window,
    pub depth: u8,
    pub visual_id: x11::Visualid,
    pub colormap: x11::Colormap,
    pub border_pixel: u32,
}

/// Run `undo` when `result` is an error, passing the result through
fn undo_on_error<T, E>(result: Result<T, E>, undo: impl FnOnce()) -> Result<T, E> {
    if result.is_err() {
        undo();
    }
    result
}

#[derive(Debug)]
pub(crate) struct WindowInner {
    pub id: x11::Window,
    atoms: Atoms,
}

impl WindowInner {
    pub fn new<C: Connection>(
        connection: &C,
        params: &WindowParams,
        atoms: Atoms,
        title: &str,
        position: Point<i32>,
        size: Size<u32>,
    ) -> Result<WindowInner, X11Error> {
        // Generate the xid for the window
        let window = connection.generate_id()?;

        // The event mask never include `EventMask::RESIZE_REDIRECT`, resizes are followed
        // through ConfigureNotify events from the STRUCTURE_NOTIFY event mask.
        let window_aux = CreateWindowAux::new()
            .event_mask(
                EventMask::EXPOSURE // Be told when the window is exposed
                    | EventMask::STRUCTURE_NOTIFY
                    | EventMask::KEY_PRESS // Key press and release
                    | EventMask::KEY_RELEASE
                    | EventMask::BUTTON_PRESS // Mouse button press and release
                    | EventMask::BUTTON_RELEASE
                    | EventMask::POINTER_MOTION // Mouse movement
                    | EventMask::ENTER_WINDOW // Track whether the cursor enters of leaves the window.
                    | EventMask::LEAVE_WINDOW
                    | EventMask::FOCUS_CHANGE,
            )
            // Border pixel and color map need to be set if our depth may differ from the root depth.
            .border_pixel(params.border_pixel)
            .colormap(params.colormap);

        let size = size.to_u16_saturating();
        connection.create_window(
            params.depth,
            window,
            params.root,
            position.x.clamp(i16::MIN as i32, i16::MAX as i32) as i16,
            position.y.clamp(i16::MIN as i32, i16::MAX as i32) as i16,
            size.w.max(1),
            size.h.max(1),
            0,
            WindowClass::INPUT_OUTPUT,
            params.visual_id,
            &window_aux,
        )?;

        let window = WindowInner { id: window, atoms };
        // the xid exists from here on, it must not leak if a later request fails
        undo_on_error(window.set_properties(connection, title), || {
            debug!(window = window.id, "Window setup failed, destroying it again");
            window.destroy(connection);
            let _ = connection.flush();
        })?;

        Ok(window)
    }

    fn set_properties<C: Connection>(&self, connection: &C, title: &str) -> Result<(), X11Error> {
        // Enable WM_DELETE_WINDOW so our client is not disconnected upon our toplevel window being destroyed.
        connection.change_property32(
            PropMode::REPLACE,
            self.id,
            self.atoms.WM_PROTOCOLS,
            AtomEnum::ATOM,
            &[self.atoms.WM_DELETE_WINDOW],
        )?;

        // WM class cannot be safely changed later.
        connection.change_property8(
            PropMode::REPLACE,
            self.id,
            AtomEnum::WM_CLASS,
            AtomEnum::STRING,
            b"glps\0glps\0",
        )?;

        self.set_title(connection, title)?;
        connection.flush()?;
        Ok(())
    }

    pub fn map<C: Connection>(&self, connection: &C) -> Result<(), X11Error> {
        connection.map_window(self.id)?;
        // Flush requests to server so window is displayed.
        connection.flush()?;
        Ok(())
    }

    pub fn destroy<C: Connection>(&self, connection: &C) {
        let _ = connection.destroy_window(self.id);
    }

    pub fn size<C: Connection>(&self, connection: &C) -> Result<Size<u32>, X11Error> {
        let geometry = connection.get_geometry(self.id)?.reply()?;
        Ok(Size::new(geometry.width as u32, geometry.height as u32))
    }

    pub fn set_title<C: Connection>(&self, connection: &C, title: &str) -> Result<(), X11Error> {
        // _NET_WM_NAME should be preferred by window managers, but set both properties.
        connection.change_property8(
            PropMode::REPLACE,
            self.id,
            AtomEnum::WM_NAME,
            AtomEnum::STRING,
            title.as_bytes(),
        )?;
        connection.change_property8(
            PropMode::REPLACE,
            self.id,
            self.atoms._NET_WM_NAME,
            self.atoms.UTF8_STRING,
            title.as_bytes(),
        )?;
        Ok(())
    }

    /// Pin the size hints to the current size, or lift them again
    pub fn set_resizable<C: Connection>(&self, connection: &C, resizable: bool) -> Result<(), X11Error> {
        let mut hints = WmSizeHints::new();
        if !resizable {
            let size = self.size(connection)?;
            let size = (size.w as i32, size.h as i32);
            hints.min_size = Some(size);
            hints.max_size = Some(size);
        }
        hints.set_normal_hints(connection, self.id)?;
        Ok(())
    }

    pub fn set_decorations<C: Connection>(&self, connection: &C, enabled: bool) -> Result<(), X11Error> {
        // flags, functions, decorations, input mode, status
        let hints = [MWM_HINTS_DECORATIONS, 0, enabled as u32, 0, 0];
        connection.change_property32(
            PropMode::REPLACE,
            self.id,
            self.atoms._MOTIF_WM_HINTS,
            self.atoms._MOTIF_WM_HINTS,
            &hints,
        )?;

        let window_type = if enabled {
            self.atoms._NET_WM_WINDOW_TYPE_NORMAL
        } else {
            self.atoms._NET_WM_WINDOW_TYPE_DOCK
        };
        connection.change_property32(
            PropMode::REPLACE,
            self.id,
            self.atoms._NET_WM_WINDOW_TYPE,
            AtomEnum::ATOM,
            &[window_type],
        )?;
        Ok(())
    }

    pub fn set_opacity<C: Connection>(&self, connection: &C, opacity: f32) -> Result<(), X11Error> {
        let opacity = (opacity.clamp(0.0, 1.0) as f64 * u32::MAX as f64) as u32;
        connection.change_property32(
            PropMode::REPLACE,
            self.id,
            self.atoms._NET_WM_WINDOW_OPACITY,
            AtomEnum::CARDINAL,
            &[opacity],
        )?;
        Ok(())
    }

    /// Request blur behind the whole window. Only KDE honours this hint.
    pub fn set_blur<C: Connection>(&self, connection: &C, enabled: bool, radius: u32) -> Result<(), X11Error> {
        if enabled {
            debug!(window = self.id, radius, "Blur radius is chosen by the compositor");
            // An empty region covers the whole window
            connection.change_property32(
                PropMode::REPLACE,
                self.id,
                self.atoms._KDE_NET_WM_BLUR_BEHIND_REGION,
                AtomEnum::CARDINAL,
                &[],
            )?;
        } else {
            connection.delete_property(self.id, self.atoms._KDE_NET_WM_BLUR_BEHIND_REGION)?;
        }
        Ok(())
    }

    /// Stop the server from painting the background.
    ///
    /// Actual transparency needs a compositing manager and a visual with alpha.
    pub fn set_background_transparent<C: Connection>(&self, connection: &C) -> Result<(), X11Error> {
        connection.change_window_attributes(
            self.id,
            &ChangeWindowAttributesAux::new().background_pixmap(NONE),
        )?;
        Ok(())
    }

    pub fn set_cursor<C: Connection>(&self, connection: &C, cursor: x11::Cursor) -> Result<(), X11Error> {
        connection.change_window_attributes(self.id, &ChangeWindowAttributesAux::new().cursor(cursor))?;
        Ok(())
    }

    /// Ask for a repaint through a synthetic expose covering the window
    pub fn request_redraw<C: Connection>(&self, connection: &C) -> Result<(), X11Error> {
        let size = self.size(connection)?.to_u16_saturating();
        let expose = ExposeEvent {
            response_type: x11::EXPOSE_EVENT,
            sequence: 0, // Ignored by X server
            window: self.id,
            x: 0,
            y: 0,
            width: size.w,
            height: size.h,
            count: 0,
        };
        connection.send_event(false, self.id, EventMask::EXPOSURE, expose)?;
        Ok(())
    }
}

impl PartialEq for WindowInner {
    fn eq(&self, other: &Self) -> bool {
        self.id == other.id
    }
}

#[cfg(test)]
mod tests {
    use std::cell::Cell;

    use super::*;

    #[test]
    fn failed_setup_is_undone() {
        let destroyed = Cell::new(false);
        let result: Result<(), X11Error> = undo_on_error(Err(X11Error::UnknownWindow), || destroyed.set(true));
        assert!(result.is_err());
        assert!(destroyed.get());
    }

    #[test]
    fn successful_setup_is_kept() {
        let destroyed = Cell::new(false);
        let result: Result<u32, X11Error> = undo_on_error(Ok(7), || destroyed.set(true));
        assert_eq!(result.unwrap(), 7);
        assert!(!destroyed.get());
    }
}
