use std::fmt;

use super::WindowId;
use crate::{
    backend::input::{AxisEvent, ButtonState, DropEvent, KeyEvent, MouseButton},
    utils::{Point, Size},
};

pub(crate) type WindowCallback = Box<dyn FnMut(WindowId)>;
pub(crate) type ResizeCallback = Box<dyn FnMut(WindowId, Size<u32>)>;
pub(crate) type PointerCallback = Box<dyn FnMut(WindowId, Point<f64>)>;
pub(crate) type ClickCallback = Box<dyn FnMut(WindowId, MouseButton, ButtonState)>;
pub(crate) type ScrollCallback = Box<dyn FnMut(WindowId, AxisEvent)>;
pub(crate) type KeyCallback = Box<dyn FnMut(WindowId, &KeyEvent)>;
pub(crate) type DropCallback = Box<dyn FnMut(WindowId, &DropEvent)>;

/// One optional handler per event category.
///
/// Registering a handler replaces the previous one of the same category.
#[derive(Default)]
pub(crate) struct Callbacks {
    pub frame_update: Option<WindowCallback>,
    pub resize: Option<ResizeCallback>,
    pub close: Option<WindowCallback>,
    pub keyboard_enter: Option<WindowCallback>,
    pub keyboard_leave: Option<WindowCallback>,
    pub keyboard: Option<KeyCallback>,
    pub mouse_enter: Option<PointerCallback>,
    pub mouse_leave: Option<WindowCallback>,
    pub mouse_move: Option<PointerCallback>,
    pub mouse_click: Option<ClickCallback>,
    pub scroll: Option<ScrollCallback>,
    pub drag_n_drop: Option<DropCallback>,
}

impl Callbacks {
    pub fn clear(&mut self) {
        *self = Callbacks::default();
    }
}

impl fmt::Debug for Callbacks {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Callbacks")
            .field("frame_update", &self.frame_update.is_some())
            .field("resize", &self.resize.is_some())
            .field("close", &self.close.is_some())
            .field("keyboard_enter", &self.keyboard_enter.is_some())
            .field("keyboard_leave", &self.keyboard_leave.is_some())
            .field("keyboard", &self.keyboard.is_some())
            .field("mouse_enter", &self.mouse_enter.is_some())
            .field("mouse_leave", &self.mouse_leave.is_some())
            .field("mouse_move", &self.mouse_move.is_some())
            .field("mouse_click", &self.mouse_click.is_some())
            .field("scroll", &self.scroll.is_some())
            .field("drag_n_drop", &self.drag_n_drop.is_some())
            .finish()
    }
}
