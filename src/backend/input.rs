//! Platform independent input types
//!
//! Every backend translates its native events into these types before they reach
//! the window manager, so user callbacks never see platform specific values.

use crate::utils::Point;

/// State of key on a keyboard. Either pressed or released
#[derive(Debug, PartialEq, Eq, Clone, Copy)]
pub enum KeyState {
    /// Key is released
    Released,
    /// Key is pressed
    Pressed,
}

impl KeyState {
    /// Whether this is the pressed state
    #[inline]
    pub fn is_pressed(self) -> bool {
        self == KeyState::Pressed
    }
}

impl From<bool> for KeyState {
    #[inline]
    fn from(pressed: bool) -> Self {
        if pressed {
            KeyState::Pressed
        } else {
            KeyState::Released
        }
    }
}

/// A particular mouse button
#[derive(Debug, PartialEq, Eq, Clone, Copy)]
pub enum MouseButton {
    /// Left mouse button
    Left,
    /// Middle mouse button
    Middle,
    /// Right mouse button
    Right,
    /// Other mouse button with index
    Other(u8),
}

/// State of a button on a mouse. Either pressed or released
#[derive(Debug, PartialEq, Eq, Clone, Copy)]
pub enum ButtonState {
    /// Button is released
    Released,
    /// Button is pressed
    Pressed,
}

impl From<bool> for ButtonState {
    #[inline]
    fn from(pressed: bool) -> Self {
        if pressed {
            ButtonState::Pressed
        } else {
            ButtonState::Released
        }
    }
}

/// Axis when scrolling
#[derive(Debug, PartialEq, Eq, Clone, Copy)]
pub enum Axis {
    /// Vertical axis
    Vertical,
    /// Horizontal axis
    Horizontal,
}

/// Source of an axis when scrolling
#[derive(Debug, PartialEq, Eq, Clone, Copy)]
pub enum AxisSource {
    /// Finger. Mostly used for trackpads.
    Finger,
    /// Continuous scrolling device. Almost identical to `Finger`
    Continuous,
    /// Scroll wheel.
    ///
    /// Scrolling is in discrete steps. It is up to the caller how to interpret such
    /// different step sizes.
    Wheel,
}

/// A single scroll step
#[derive(Debug, PartialEq, Clone, Copy)]
pub struct AxisEvent {
    /// Scrolled axis
    pub axis: Axis,
    /// Device that produced the scroll
    pub source: AxisSource,
    /// Scroll amount, positive values scroll up or to the right
    pub amount: f64,
    /// Number of discrete wheel steps, if the device has any
    pub discrete: Option<i32>,
}

/// A translated keyboard event
#[derive(Debug, PartialEq, Eq, Clone)]
pub struct KeyEvent {
    /// Whether the key was pressed or released
    pub state: KeyState,
    /// Text produced by the key, or the platform name of the key like `Escape` or `Shift_L`
    /// when it produces no printable character.
    ///
    /// Empty only for keys the platform has no symbol for.
    pub text: String,
    /// Platform key code, the X keycode on X11 and the scan code on Win32
    pub keycode: u32,
}

/// Data dropped onto a window
#[derive(Debug, PartialEq, Clone)]
pub struct DropEvent {
    /// Mime type of the payload, `text/uri-list` for files
    pub mime: String,
    /// Dropped payload
    pub data: String,
    /// Drop position relative to the window
    pub location: Point<f64>,
}

/// What a pointer button index stands for in the X11 core protocol.
///
/// Win32 reports the same information through separate messages, the headless backend
/// reuses this table to emulate X11 input.
#[derive(Debug, PartialEq, Clone, Copy)]
pub enum ButtonAction {
    /// A regular button press or release
    Button(MouseButton),
    /// A wheel click, only meaningful on press
    Scroll(AxisEvent),
}

/// Map a core protocol button index to its meaning.
///
/// Buttons 4 and 5 scroll vertically, 6 and 7 scroll horizontally.
pub fn button_action(index: u8) -> ButtonAction {
    let scroll = |axis, amount: f64| {
        ButtonAction::Scroll(AxisEvent {
            axis,
            source: AxisSource::Wheel,
            amount,
            discrete: Some(amount as i32),
        })
    };

    match index {
        1 => ButtonAction::Button(MouseButton::Left),
        2 => ButtonAction::Button(MouseButton::Middle),
        3 => ButtonAction::Button(MouseButton::Right),
        4 => scroll(Axis::Vertical, 1.0),
        5 => scroll(Axis::Vertical, -1.0),
        6 => scroll(Axis::Horizontal, -1.0),
        7 => scroll(Axis::Horizontal, 1.0),
        x => ButtonAction::Button(MouseButton::Other(x)),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn wheel_buttons_scroll() {
        let ButtonAction::Scroll(up) = button_action(4) else {
            panic!("button 4 should scroll");
        };
        assert_eq!(up.axis, Axis::Vertical);
        assert_eq!(up.amount, 1.0);

        let ButtonAction::Scroll(left) = button_action(6) else {
            panic!("button 6 should scroll");
        };
        assert_eq!(left.axis, Axis::Horizontal);
        assert_eq!(left.amount, -1.0);
        assert_eq!(left.discrete, Some(-1));
    }

    #[test]
    fn regular_buttons() {
        assert_eq!(button_action(1), ButtonAction::Button(MouseButton::Left));
        assert_eq!(button_action(3), ButtonAction::Button(MouseButton::Right));
        assert_eq!(button_action(9), ButtonAction::Button(MouseButton::Other(9)));
    }
}
