//! Keycode tables: modifier identification and human-readable display names.
//! Keycodes follow the hook contract described in [crate::input_api].

use std::borrow::Cow;

pub const VC_CONTROL_L: u16 = 0x001D;
pub const VC_CONTROL_R: u16 = 0x0E1D;
pub const VC_ALT_L: u16 = 0x0038;
pub const VC_ALT_R: u16 = 0x0E38;
pub const VC_SHIFT_L: u16 = 0x002A;
pub const VC_SHIFT_R: u16 = 0x0036;
pub const VC_META_L: u16 = 0x0E5B;
pub const VC_META_R: u16 = 0x0E5C;

/// A modifier key. The left and right physical variants collapse to the
/// same logical identity.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ModifierKey {
    Ctrl,
    Alt,
    Shift,
    Meta,
}

impl ModifierKey {
    /// The fixed order modifiers appear in within a combo label,
    /// regardless of the order they were pressed in.
    pub const LABEL_ORDER: [ModifierKey; 4] = [
        ModifierKey::Meta,
        ModifierKey::Ctrl,
        ModifierKey::Alt,
        ModifierKey::Shift,
    ];

    pub fn name(self) -> &'static str {
        match self {
            ModifierKey::Ctrl => "Ctrl",
            ModifierKey::Alt => "Alt",
            ModifierKey::Shift => "Shift",
            ModifierKey::Meta => "Win",
        }
    }
}

pub fn modifier_of(keycode: u16) -> Option<ModifierKey> {
    match keycode {
        VC_CONTROL_L | VC_CONTROL_R => Some(ModifierKey::Ctrl),
        VC_ALT_L | VC_ALT_R => Some(ModifierKey::Alt),
        VC_SHIFT_L | VC_SHIFT_R => Some(ModifierKey::Shift),
        VC_META_L | VC_META_R => Some(ModifierKey::Meta),
        _ => None,
    }
}

/// Display name for a keycode. Codes outside the table render as `Key{code}`
/// so nothing is ever silently dropped from the frequency tables.
pub fn key_name(keycode: u16) -> Cow<'static, str> {
    let name = match keycode {
        0x0001 => "Esc",
        0x003B => "F1",
        0x003C => "F2",
        0x003D => "F3",
        0x003E => "F4",
        0x003F => "F5",
        0x0040 => "F6",
        0x0041 => "F7",
        0x0042 => "F8",
        0x0043 => "F9",
        0x0044 => "F10",
        0x0057 => "F11",
        0x0058 => "F12",

        0x0002 => "1",
        0x0003 => "2",
        0x0004 => "3",
        0x0005 => "4",
        0x0006 => "5",
        0x0007 => "6",
        0x0008 => "7",
        0x0009 => "8",
        0x000A => "9",
        0x000B => "0",

        0x0010 => "Q",
        0x0011 => "W",
        0x0012 => "E",
        0x0013 => "R",
        0x0014 => "T",
        0x0015 => "Y",
        0x0016 => "U",
        0x0017 => "I",
        0x0018 => "O",
        0x0019 => "P",
        0x001E => "A",
        0x001F => "S",
        0x0020 => "D",
        0x0021 => "F",
        0x0022 => "G",
        0x0023 => "H",
        0x0024 => "J",
        0x0025 => "K",
        0x0026 => "L",
        0x002C => "Z",
        0x002D => "X",
        0x002E => "C",
        0x002F => "V",
        0x0030 => "B",
        0x0031 => "N",
        0x0032 => "M",

        VC_SHIFT_L | VC_SHIFT_R => "Shift",
        VC_CONTROL_L | VC_CONTROL_R => "Ctrl",
        VC_ALT_L | VC_ALT_R => "Alt",
        VC_META_L | VC_META_R => "Win",

        0x0039 => "Space",
        0x000F => "Tab",
        0x001C => "Enter",
        0x000E => "Backspace",
        0x0E53 => "Delete",
        0x0E52 => "Insert",
        0x0E47 => "Home",
        0x0E4F => "End",
        0x0E49 => "PageUp",
        0x0E51 => "PageDown",
        0x003A => "CapsLock",

        0x0E48 => "↑",
        0x0E50 => "↓",
        0x0E4B => "←",
        0x0E4D => "→",

        0x000C => "-",
        0x000D => "=",
        0x001A => "[",
        0x001B => "]",
        0x002B => "\\",
        0x0027 => ";",
        0x0028 => "'",
        0x0029 => "`",
        0x0033 => ",",
        0x0034 => ".",
        0x0035 => "/",

        _ => return Cow::Owned(format!("Key{keycode}")),
    };
    Cow::Borrowed(name)
}
