//! Translation of X11 core protocol events

use x11rb::protocol::{
    xproto::{NotifyMode, Window},
    Event,
};

use super::{keymap::Keymap, Atoms};
use crate::{
    backend::{
        input::{button_action, ButtonAction, ButtonState, KeyEvent, KeyState},
        BackendEvent, EventKind,
    },
    utils::{Point, Size},
};

/// Turn an X11 event into a backend event.
///
/// Returns `None` for events the window manager has no use for.
pub(crate) fn translate(event: &Event, atoms: &Atoms, keymap: &Keymap) -> Option<BackendEvent<Window>> {
    let (window, kind) = match event {
        Event::ButtonPress(press) => match button_action(press.detail) {
            ButtonAction::Button(button) => (
                press.event,
                EventKind::PointerButton {
                    button,
                    state: ButtonState::Pressed,
                },
            ),
            ButtonAction::Scroll(axis) => (press.event, EventKind::PointerAxis(axis)),
        },

        // Wheel clicks are reported as a press immediately followed by a release, the press
        // already produced the scroll.
        Event::ButtonRelease(release) => match button_action(release.detail) {
            ButtonAction::Button(button) => (
                release.event,
                EventKind::PointerButton {
                    button,
                    state: ButtonState::Released,
                },
            ),
            ButtonAction::Scroll(_) => return None,
        },

        Event::KeyPress(key) | Event::KeyRelease(key) => {
            let state = if matches!(event, Event::KeyPress(_)) {
                KeyState::Pressed
            } else {
                KeyState::Released
            };
            (
                key.event,
                EventKind::Key(KeyEvent {
                    state,
                    text: keymap.text(key.detail, key.state),
                    keycode: key.detail as u32,
                }),
            )
        }

        // event_x/y are relative to the window receiving the event
        Event::MotionNotify(motion) => (
            motion.event,
            EventKind::PointerMotion(Point::new(motion.event_x as f64, motion.event_y as f64)),
        ),

        Event::EnterNotify(enter) => (
            enter.event,
            EventKind::PointerEnter(Point::new(enter.event_x as f64, enter.event_y as f64)),
        ),
        Event::LeaveNotify(leave) => (leave.event, EventKind::PointerLeave),

        Event::FocusIn(focus) if !is_grab(focus.mode) => (focus.event, EventKind::FocusIn),
        Event::FocusOut(focus) if !is_grab(focus.mode) => (focus.event, EventKind::FocusOut),

        Event::ConfigureNotify(configure) => (
            configure.window,
            EventKind::Resized(Size::new(configure.width as u32, configure.height as u32)),
        ),

        // Only the last expose of a series triggers a redraw
        Event::Expose(expose) if expose.count == 0 => (expose.window, EventKind::Exposed),

        Event::ClientMessage(message)
            if message.format == 32
                && message.type_ == atoms.WM_PROTOCOLS
                && message.data.as_data32()[0] == atoms.WM_DELETE_WINDOW =>
        {
            (message.window, EventKind::CloseRequested)
        }

        Event::DestroyNotify(destroy) => (destroy.window, EventKind::Destroyed),

        _ => return None,
    };

    Some(BackendEvent { window, kind })
}

fn is_grab(mode: NotifyMode) -> bool {
    mode == NotifyMode::GRAB || mode == NotifyMode::UNGRAB
}

#[cfg(test)]
mod tests {
    use x11rb::protocol::xproto::{
        ButtonPressEvent, ClientMessageEvent, ConfigureNotifyEvent, ExposeEvent, FocusInEvent, KeyButMask,
        KeyPressEvent, Motion, MotionNotifyEvent, NotifyDetail, BUTTON_PRESS_EVENT, BUTTON_RELEASE_EVENT,
        CONFIGURE_NOTIFY_EVENT, EXPOSE_EVENT, FOCUS_IN_EVENT, KEY_PRESS_EVENT, MOTION_NOTIFY_EVENT,
    };

    use super::*;
    use crate::backend::input::{Axis, AxisSource, MouseButton};

    const WINDOW: Window = 0x0060_0001;

    fn atoms() -> Atoms {
        Atoms {
            WM_PROTOCOLS: 100,
            WM_DELETE_WINDOW: 101,
            _NET_WM_NAME: 103,
            UTF8_STRING: 104,
            _NET_WM_WINDOW_TYPE: 105,
            _NET_WM_WINDOW_TYPE_NORMAL: 106,
            _NET_WM_WINDOW_TYPE_DOCK: 107,
            _MOTIF_WM_HINTS: 108,
            _NET_WM_WINDOW_OPACITY: 109,
            _KDE_NET_WM_BLUR_BEHIND_REGION: 110,
        }
    }

    fn keymap() -> Keymap {
        Keymap::from_raw(8, 1, vec![0; 8 * 32])
    }

    fn button(detail: u8, pressed: bool) -> Event {
        let event = ButtonPressEvent {
            response_type: if pressed {
                BUTTON_PRESS_EVENT
            } else {
                BUTTON_RELEASE_EVENT
            },
            detail,
            sequence: 0,
            time: 0,
            root: 1,
            event: WINDOW,
            child: 0,
            root_x: 0,
            root_y: 0,
            event_x: 5,
            event_y: 6,
            state: KeyButMask::from(0u16),
            same_screen: true,
        };
        if pressed {
            Event::ButtonPress(event)
        } else {
            Event::ButtonRelease(event)
        }
    }

    fn translate_kind(event: &Event) -> Option<EventKind> {
        translate(event, &atoms(), &keymap()).map(|event| {
            assert_eq!(event.window, WINDOW);
            event.kind
        })
    }

    #[test]
    fn wheel_press_scrolls_and_release_is_dropped() {
        for (detail, axis, amount) in [
            (4, Axis::Vertical, 1.0),
            (5, Axis::Vertical, -1.0),
            (6, Axis::Horizontal, -1.0),
            (7, Axis::Horizontal, 1.0),
        ] {
            match translate_kind(&button(detail, true)) {
                Some(EventKind::PointerAxis(event)) => {
                    assert_eq!(event.axis, axis);
                    assert_eq!(event.amount, amount);
                    assert_eq!(event.source, AxisSource::Wheel);
                }
                other => panic!("button {} produced {:?}", detail, other),
            }
            assert_eq!(translate_kind(&button(detail, false)), None);
        }
    }

    #[test]
    fn buttons_click() {
        assert_eq!(
            translate_kind(&button(3, false)),
            Some(EventKind::PointerButton {
                button: MouseButton::Right,
                state: ButtonState::Released,
            })
        );
    }

    #[test]
    fn keys_report_the_x_keycode() {
        let key = KeyPressEvent {
            response_type: KEY_PRESS_EVENT,
            detail: 9,
            sequence: 0,
            time: 0,
            root: 1,
            event: WINDOW,
            child: 0,
            root_x: 0,
            root_y: 0,
            event_x: 0,
            event_y: 0,
            state: KeyButMask::from(0u16),
            same_screen: true,
        };
        let keymap = Keymap::from_raw(8, 1, vec![0x61, 0xff1b]);
        let event = translate(&Event::KeyPress(key), &atoms(), &keymap).unwrap();
        assert_eq!(
            event.kind,
            EventKind::Key(KeyEvent {
                state: KeyState::Pressed,
                text: "Escape".into(),
                keycode: 9,
            })
        );
    }

    #[test]
    fn motion_is_window_relative() {
        let motion = MotionNotifyEvent {
            response_type: MOTION_NOTIFY_EVENT,
            detail: Motion::NORMAL,
            sequence: 0,
            time: 0,
            root: 1,
            event: WINDOW,
            child: 0,
            root_x: 500,
            root_y: 600,
            event_x: 12,
            event_y: 34,
            state: KeyButMask::from(0u16),
            same_screen: true,
        };
        assert_eq!(
            translate_kind(&Event::MotionNotify(motion)),
            Some(EventKind::PointerMotion(Point::new(12.0, 34.0)))
        );
    }

    #[test]
    fn configure_reports_size() {
        let configure = ConfigureNotifyEvent {
            response_type: CONFIGURE_NOTIFY_EVENT,
            sequence: 0,
            event: WINDOW,
            window: WINDOW,
            above_sibling: 0,
            x: 10,
            y: 10,
            width: 800,
            height: 600,
            border_width: 0,
            override_redirect: false,
        };
        assert_eq!(
            translate_kind(&Event::ConfigureNotify(configure)),
            Some(EventKind::Resized(Size::new(800, 600)))
        );
    }

    #[test]
    fn only_last_expose_redraws() {
        let expose = |count| {
            Event::Expose(ExposeEvent {
                response_type: EXPOSE_EVENT,
                sequence: 0,
                window: WINDOW,
                x: 0,
                y: 0,
                width: 10,
                height: 10,
                count,
            })
        };
        assert_eq!(translate_kind(&expose(2)), None);
        assert_eq!(translate_kind(&expose(0)), Some(EventKind::Exposed));
    }

    #[test]
    fn delete_window_requests_close() {
        let atoms = atoms();
        let close = ClientMessageEvent::new(
            32,
            WINDOW,
            atoms.WM_PROTOCOLS,
            [atoms.WM_DELETE_WINDOW, 0, 0, 0, 0],
        );
        assert_eq!(
            translate_kind(&Event::ClientMessage(close)),
            Some(EventKind::CloseRequested)
        );

        let other = ClientMessageEvent::new(32, WINDOW, atoms.WM_PROTOCOLS, [42, 0, 0, 0, 0]);
        assert_eq!(translate_kind(&Event::ClientMessage(other)), None);
    }

    #[test]
    fn grab_focus_changes_are_ignored() {
        let focus = |mode| {
            Event::FocusIn(FocusInEvent {
                response_type: FOCUS_IN_EVENT,
                detail: NotifyDetail::NONLINEAR,
                sequence: 0,
                event: WINDOW,
                mode,
            })
        };
        assert_eq!(translate_kind(&focus(NotifyMode::NORMAL)), Some(EventKind::FocusIn));
        assert_eq!(translate_kind(&focus(NotifyMode::GRAB)), None);
    }
}
