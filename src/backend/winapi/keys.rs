//! Names of the keys that produce no text

use windows::Win32::UI::Input::KeyboardAndMouse::{
    VIRTUAL_KEY, VK_BACK, VK_DELETE, VK_DOWN, VK_END, VK_ESCAPE, VK_F1, VK_F12, VK_HOME, VK_INSERT, VK_LEFT,
    VK_NEXT, VK_PRIOR, VK_RETURN, VK_RIGHT, VK_TAB, VK_UP,
};

const SPECIAL_KEYS: &[(VIRTUAL_KEY, &str)] = &[
    (VK_ESCAPE, "Escape"),
    (VK_BACK, "Backspace"),
    (VK_RETURN, "Enter"),
    (VK_TAB, "Tab"),
    (VK_DELETE, "Delete"),
    (VK_INSERT, "Insert"),
    (VK_HOME, "Home"),
    (VK_END, "End"),
    (VK_PRIOR, "PageUp"),
    (VK_NEXT, "PageDown"),
    (VK_LEFT, "ArrowLeft"),
    (VK_RIGHT, "ArrowRight"),
    (VK_UP, "ArrowUp"),
    (VK_DOWN, "ArrowDown"),
];

/// Name of a virtual key without a character, like `Escape` or `F4`
pub(crate) fn special_key_name(vk: u16) -> Option<String> {
    if (VK_F1.0..=VK_F12.0).contains(&vk) {
        return Some(format!("F{}", vk - VK_F1.0 + 1));
    }
    SPECIAL_KEYS
        .iter()
        .find(|(key, _)| key.0 == vk)
        .map(|(_, name)| (*name).to_owned())
}

/// Text reported for a key.
///
/// Printable characters win over key names, control characters produced by keys like
/// Escape or Enter are replaced by the name of the key.
pub(crate) fn key_text(vk: u16, translated: &[u16], fallback: impl FnOnce() -> String) -> String {
    let text: String = char::decode_utf16(translated.iter().copied())
        .filter_map(Result::ok)
        .filter(|c| !c.is_control())
        .collect();
    if !text.is_empty() {
        return text;
    }
    special_key_name(vk).unwrap_or_else(fallback)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn function_keys_are_numbered() {
        assert_eq!(special_key_name(VK_F1.0).as_deref(), Some("F1"));
        assert_eq!(special_key_name(VK_F12.0).as_deref(), Some("F12"));
        assert_eq!(special_key_name(VK_PRIOR.0).as_deref(), Some("PageUp"));
        assert_eq!(special_key_name(0x41), None);
    }

    #[test]
    fn characters_win_over_names() {
        assert_eq!(key_text(0x41, &[0x61], String::new), "a");
        // Escape translates to the ESC control character
        assert_eq!(key_text(VK_ESCAPE.0, &[0x1b], String::new), "Escape");
        assert_eq!(key_text(0xe2, &[], || "OEM 102".to_owned()), "OEM 102");
    }
}
