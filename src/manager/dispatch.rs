use tracing::{debug, trace};

use super::{
    callbacks::Callbacks,
    registry::{WindowEntry, WindowRegistry},
};
use crate::backend::{graphics::GraphicsBinder, Backend, BackendEvent, EventKind};

/// Routes backend events to the registered callbacks
pub(super) struct Dispatcher<'a, B: Backend, G: GraphicsBinder> {
    pub backend: &'a mut B,
    pub graphics: &'a mut G,
    pub registry: &'a mut WindowRegistry<B::Window, G::Surface>,
    pub callbacks: &'a mut Callbacks,
}

impl<'a, B: Backend, G: GraphicsBinder> Dispatcher<'a, B, G> {
    pub fn dispatch(&mut self, event: BackendEvent<B::Window>) {
        let Some(id) = self.registry.position(event.window) else {
            debug!(window = ?event.window, kind = ?event.kind, "Event for unknown window, ignoring");
            return;
        };
        trace!(%id, kind = ?event.kind, "Dispatching event");

        let callbacks = &mut *self.callbacks;
        match event.kind {
            EventKind::CloseRequested | EventKind::Destroyed => {
                if let Some(close) = callbacks.close.as_mut() {
                    close(id);
                }
                if let Some(entry) = self.registry.remove(id) {
                    debug!(%id, title = %entry.title, "Window closed");
                    teardown(self.backend, self.graphics, entry);
                }
            }
            EventKind::Resized(size) => {
                let Some(entry) = self.registry.get_mut(id) else {
                    return;
                };
                if entry.size == size {
                    return;
                }
                entry.size = size;
                if let Some(resize) = callbacks.resize.as_mut() {
                    resize(id, size);
                }
            }
            EventKind::Exposed => {
                if let Some(frame_update) = callbacks.frame_update.as_mut() {
                    frame_update(id);
                }
            }
            EventKind::PointerMotion(location) => {
                if let Some(mouse_move) = callbacks.mouse_move.as_mut() {
                    mouse_move(id, location);
                }
            }
            EventKind::PointerEnter(location) => {
                if let Some(mouse_enter) = callbacks.mouse_enter.as_mut() {
                    mouse_enter(id, location);
                }
            }
            EventKind::PointerLeave => {
                if let Some(mouse_leave) = callbacks.mouse_leave.as_mut() {
                    mouse_leave(id);
                }
            }
            EventKind::PointerButton { button, state } => {
                if let Some(mouse_click) = callbacks.mouse_click.as_mut() {
                    mouse_click(id, button, state);
                }
            }
            EventKind::PointerAxis(axis) => {
                if let Some(scroll) = callbacks.scroll.as_mut() {
                    scroll(id, axis);
                }
            }
            EventKind::Key(key) => {
                if let Some(keyboard) = callbacks.keyboard.as_mut() {
                    keyboard(id, &key);
                }
            }
            EventKind::FocusIn => {
                if let Some(keyboard_enter) = callbacks.keyboard_enter.as_mut() {
                    keyboard_enter(id);
                }
            }
            EventKind::FocusOut => {
                if let Some(keyboard_leave) = callbacks.keyboard_leave.as_mut() {
                    keyboard_leave(id);
                }
            }
            EventKind::Dropped(dropped) => {
                if let Some(drag_n_drop) = callbacks.drag_n_drop.as_mut() {
                    drag_n_drop(id, &dropped);
                }
            }
        }
    }
}

/// Release the resources of a removed window, surface first
pub(super) fn teardown<B: Backend, G: GraphicsBinder>(
    backend: &mut B,
    graphics: &mut G,
    entry: WindowEntry<B::Window, G::Surface>,
) {
    if let Some(surface) = entry.surface {
        graphics.destroy_surface(surface);
    }
    backend.destroy_window(entry.native);
}
