//! Keycode to text translation from the core keyboard mapping
//!
//! The X server hands out a table of keysyms per keycode. The first column is the
//! unshifted symbol, the second one the shifted symbol. Printable keysyms are turned
//! into their character, every other keysym into its xkb name.

use x11rb::{
    connection::Connection,
    protocol::xproto::{ConnectionExt, KeyButMask, Keycode, Keysym},
};
use xkbcommon::xkb;

use super::X11Error;

const NO_SYMBOL: Keysym = 0;

/// Core protocol keyboard mapping
#[derive(Debug, Clone, Default)]
pub(crate) struct Keymap {
    min_keycode: Keycode,
    keysyms_per_keycode: usize,
    keysyms: Vec<Keysym>,
}

impl Keymap {
    /// Fetch the mapping of every keycode from the server
    pub fn fetch<C: Connection>(connection: &C) -> Result<Keymap, X11Error> {
        let setup = connection.setup();
        let (min, max) = (setup.min_keycode, setup.max_keycode);
        let reply = connection
            .get_keyboard_mapping(min, max - min + 1)?
            .reply()?;
        Ok(Keymap::from_raw(
            min,
            reply.keysyms_per_keycode as usize,
            reply.keysyms,
        ))
    }

    pub fn from_raw(min_keycode: Keycode, keysyms_per_keycode: usize, keysyms: Vec<Keysym>) -> Keymap {
        Keymap {
            min_keycode,
            keysyms_per_keycode,
            keysyms,
        }
    }

    fn keysym(&self, keycode: Keycode, column: usize) -> Keysym {
        if keycode < self.min_keycode || column >= self.keysyms_per_keycode {
            return NO_SYMBOL;
        }
        let index = (keycode - self.min_keycode) as usize * self.keysyms_per_keycode + column;
        self.keysyms.get(index).copied().unwrap_or(NO_SYMBOL)
    }

    /// Text produced by a key in the given modifier state
    pub fn text(&self, keycode: Keycode, state: KeyButMask) -> String {
        let lower = self.keysym(keycode, 0);
        let upper = match self.keysym(keycode, 1) {
            NO_SYMBOL => lower,
            keysym => keysym,
        };

        let shift = state.contains(KeyButMask::SHIFT);
        let lock = state.contains(KeyButMask::LOCK);
        let keysym = if is_latin_letter(lower) {
            if shift != lock {
                upper
            } else {
                lower
            }
        } else if shift {
            upper
        } else {
            lower
        };

        keysym_text(keysym)
    }
}

fn is_latin_letter(keysym: Keysym) -> bool {
    matches!(keysym, 0x61..=0x7a)
}

/// Character of a keysym, or its name if it produces no printable character
pub(crate) fn keysym_text(keysym: Keysym) -> String {
    if keysym == NO_SYMBOL {
        return String::new();
    }

    let sym = xkb::Keysym::from(keysym);
    match char::from_u32(xkb::keysym_to_utf32(sym)) {
        Some(c) if c != '\0' && !c.is_control() => c.into(),
        _ => xkb::keysym_get_name(sym),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn keymap() -> Keymap {
        // keycode 8: a/A, keycode 9: 1/!, keycode 10: Escape, keycode 11: F5
        Keymap::from_raw(
            8,
            2,
            vec![0x61, 0x41, 0x31, 0x21, 0xff1b, NO_SYMBOL, 0xffc2, NO_SYMBOL],
        )
    }

    #[test]
    fn letters_follow_shift_and_lock() {
        let keymap = keymap();
        let none = KeyButMask::from(0u16);
        assert_eq!(keymap.text(8, none), "a");
        assert_eq!(keymap.text(8, KeyButMask::SHIFT), "A");
        assert_eq!(keymap.text(8, KeyButMask::LOCK), "A");
        assert_eq!(keymap.text(8, KeyButMask::SHIFT | KeyButMask::LOCK), "a");
    }

    #[test]
    fn symbols_ignore_lock() {
        let keymap = keymap();
        assert_eq!(keymap.text(9, KeyButMask::LOCK), "1");
        assert_eq!(keymap.text(9, KeyButMask::SHIFT), "!");
    }

    #[test]
    fn special_keys_are_named() {
        let keymap = keymap();
        assert_eq!(keymap.text(10, KeyButMask::SHIFT), "Escape");
        assert_eq!(keymap.text(11, KeyButMask::from(0u16)), "F5");
        assert_eq!(keysym_text(0xff54), "Down");
        assert_eq!(keysym_text(0x0100_20ac), "€");
    }

    #[test]
    fn keys_without_text_fall_back_to_their_name() {
        assert_eq!(keysym_text(0xffe1), "Shift_L");
        assert_eq!(keysym_text(0xffe3), "Control_L");
        assert_eq!(keysym_text(0xffe5), "Caps_Lock");
        assert_eq!(keysym_text(0xff0d), "Return");
    }

    #[test]
    fn non_latin_keysyms_produce_text() {
        assert_eq!(keysym_text(0x6c1), "а");
        assert_eq!(keysym_text(0xffab), "+");
        assert_eq!(keysym_text(0xffb7), "7");
    }

    #[test]
    fn unmapped_keycodes_are_empty() {
        let keymap = keymap();
        assert_eq!(keymap.text(3, KeyButMask::from(0u16)), "");
        assert_eq!(keymap.text(200, KeyButMask::from(0u16)), "");
    }
}
