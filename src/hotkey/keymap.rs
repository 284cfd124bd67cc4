//! Virtual key codes (macOS `kVK_*` numbering) and their display names

pub const KEY_A: u16 = 0;
pub const KEY_F: u16 = 3;
pub const KEY_V: u16 = 9;
pub const KEY_RETURN: u16 = 36;
pub const KEY_TAB: u16 = 48;
pub const KEY_SPACE: u16 = 49;
pub const KEY_ESCAPE: u16 = 53;

const NAMES: &[(u16, &str)] = &[
    (0, "A"),
    (1, "S"),
    (2, "D"),
    (3, "F"),
    (4, "H"),
    (5, "G"),
    (6, "Z"),
    (7, "X"),
    (8, "C"),
    (9, "V"),
    (11, "B"),
    (12, "Q"),
    (13, "W"),
    (14, "E"),
    (15, "R"),
    (16, "Y"),
    (17, "T"),
    (18, "1"),
    (19, "2"),
    (20, "3"),
    (21, "4"),
    (22, "6"),
    (23, "5"),
    (24, "="),
    (25, "9"),
    (26, "7"),
    (27, "-"),
    (28, "8"),
    (29, "0"),
    (30, "]"),
    (31, "O"),
    (32, "U"),
    (33, "["),
    (34, "I"),
    (35, "P"),
    (36, "Return"),
    (37, "L"),
    (38, "J"),
    (39, "'"),
    (40, "K"),
    (41, ";"),
    (42, "\\"),
    (43, ","),
    (44, "/"),
    (45, "N"),
    (46, "M"),
    (47, "."),
    (48, "Tab"),
    (49, "Space"),
    (50, "`"),
    (51, "Delete"),
    (53, "Esc"),
    (96, "F5"),
    (97, "F6"),
    (98, "F7"),
    (99, "F3"),
    (100, "F8"),
    (101, "F9"),
    (103, "F11"),
    (109, "F10"),
    (111, "F12"),
    (118, "F4"),
    (120, "F2"),
    (122, "F1"),
];

/// Display name for a virtual key code, if known
pub fn key_name(code: u16) -> Option<&'static str> {
    NAMES
        .iter()
        .find(|(c, _)| *c == code)
        .map(|(_, name)| *name)
}

/// Translate an evdev key into the virtual key space.
/// Keys without a counterpart cannot be part of a hotkey.
#[cfg(target_os = "linux")]
pub fn from_evdev(key: evdev::Key) -> Option<u16> {
    use evdev::Key;

    let code = match key {
        Key::KEY_A => 0,
        Key::KEY_S => 1,
        Key::KEY_D => 2,
        Key::KEY_F => 3,
        Key::KEY_H => 4,
        Key::KEY_G => 5,
        Key::KEY_Z => 6,
        Key::KEY_X => 7,
        Key::KEY_C => 8,
        Key::KEY_V => 9,
        Key::KEY_B => 11,
        Key::KEY_Q => 12,
        Key::KEY_W => 13,
        Key::KEY_E => 14,
        Key::KEY_R => 15,
        Key::KEY_Y => 16,
        Key::KEY_T => 17,
        Key::KEY_1 => 18,
        Key::KEY_2 => 19,
        Key::KEY_3 => 20,
        Key::KEY_4 => 21,
        Key::KEY_6 => 22,
        Key::KEY_5 => 23,
        Key::KEY_EQUAL => 24,
        Key::KEY_9 => 25,
        Key::KEY_7 => 26,
        Key::KEY_MINUS => 27,
        Key::KEY_8 => 28,
        Key::KEY_0 => 29,
        Key::KEY_RIGHTBRACE => 30,
        Key::KEY_O => 31,
        Key::KEY_U => 32,
        Key::KEY_LEFTBRACE => 33,
        Key::KEY_I => 34,
        Key::KEY_P => 35,
        Key::KEY_ENTER => 36,
        Key::KEY_L => 37,
        Key::KEY_J => 38,
        Key::KEY_APOSTROPHE => 39,
        Key::KEY_K => 40,
        Key::KEY_SEMICOLON => 41,
        Key::KEY_BACKSLASH => 42,
        Key::KEY_COMMA => 43,
        Key::KEY_SLASH => 44,
        Key::KEY_N => 45,
        Key::KEY_M => 46,
        Key::KEY_DOT => 47,
        Key::KEY_TAB => 48,
        Key::KEY_SPACE => 49,
        Key::KEY_GRAVE => 50,
        Key::KEY_BACKSPACE => 51,
        Key::KEY_ESC => 53,
        Key::KEY_F1 => 122,
        Key::KEY_F2 => 120,
        Key::KEY_F3 => 99,
        Key::KEY_F4 => 118,
        Key::KEY_F5 => 96,
        Key::KEY_F6 => 97,
        Key::KEY_F7 => 98,
        Key::KEY_F8 => 100,
        Key::KEY_F9 => 101,
        Key::KEY_F10 => 109,
        Key::KEY_F11 => 103,
        Key::KEY_F12 => 111,
        _ => return None,
    };
    Some(code)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn named_constants_agree_with_table() {
        assert_eq!(key_name(KEY_A), Some("A"));
        assert_eq!(key_name(KEY_F), Some("F"));
        assert_eq!(key_name(KEY_V), Some("V"));
        assert_eq!(key_name(KEY_RETURN), Some("Return"));
        assert_eq!(key_name(KEY_TAB), Some("Tab"));
        assert_eq!(key_name(KEY_SPACE), Some("Space"));
        assert_eq!(key_name(KEY_ESCAPE), Some("Esc"));
        assert_eq!(key_name(10), None);
    }

    #[cfg(target_os = "linux")]
    #[test]
    fn evdev_letters_map_to_virtual_codes() {
        assert_eq!(from_evdev(evdev::Key::KEY_F), Some(KEY_F));
        assert_eq!(from_evdev(evdev::Key::KEY_SPACE), Some(KEY_SPACE));
        assert_eq!(from_evdev(evdev::Key::KEY_LEFTCTRL), None);
    }
}
