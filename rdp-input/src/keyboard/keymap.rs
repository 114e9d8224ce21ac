//! Static key mapping tables.
//!
//! Two tables exist: the direct table maps hardware/IME key codes reported by
//! the host, the extended table maps the key codes of the engine's own
//! on-screen auxiliary keyboards (function keys, numpad, cursor keys and the
//! modifier toggles).

use super::vk::*;
use crate::events::KeyboardLayout;
use serde::{Deserialize, Serialize};

/// Host key codes (Android `KeyEvent` numbering).
pub mod host_keys {
    pub const KEYCODE_0: u32 = 7;
    pub const KEYCODE_9: u32 = 16;
    pub const KEYCODE_A: u32 = 29;
    pub const KEYCODE_Z: u32 = 54;
    pub const KEYCODE_SPACE: u32 = 62;
    pub const KEYCODE_ENTER: u32 = 66;
    pub const KEYCODE_DEL: u32 = 67;
}

/// Key codes of the on-screen auxiliary keyboards.
pub mod overlay_keys {
    pub const F1: u32 = 1;
    pub const F12: u32 = 12;
    pub const TAB: u32 = 13;
    pub const PRINT: u32 = 14;
    pub const INSERT: u32 = 15;
    pub const DELETE: u32 = 16;
    pub const HOME: u32 = 17;
    pub const END: u32 = 18;
    pub const PAGE_UP: u32 = 19;
    pub const PAGE_DOWN: u32 = 20;
    pub const NUMPAD_0: u32 = 21;
    pub const NUMPAD_9: u32 = 30;
    pub const NUMPAD_NUMLOCK: u32 = 31;
    pub const NUMPAD_ADD: u32 = 32;
    pub const NUMPAD_COMMA: u32 = 33;
    pub const NUMPAD_DIVIDE: u32 = 34;
    pub const NUMPAD_ENTER: u32 = 35;
    pub const NUMPAD_MULTIPLY: u32 = 36;
    pub const NUMPAD_SUBTRACT: u32 = 37;
    pub const NUMPAD_EQUALS: u32 = 38;
    pub const NUMPAD_LEFT_PAREN: u32 = 39;
    pub const NUMPAD_RIGHT_PAREN: u32 = 40;
    pub const UP: u32 = 41;
    pub const DOWN: u32 = 42;
    pub const LEFT: u32 = 43;
    pub const RIGHT: u32 = 44;
    pub const ENTER: u32 = 45;
    pub const BACKSPACE: u32 = 46;
    pub const WIN: u32 = 47;
    pub const MENU: u32 = 48;
    pub const ESC: u32 = 49;
    pub const FUNCTION_KEYS_KEYBOARD: u32 = 50;
    pub const NUMPAD_KEYBOARD: u32 = 51;
    pub const CURSOR_KEYBOARD: u32 = 52;
    pub const TOGGLE_SHIFT: u32 = 53;
    pub const TOGGLE_CTRL: u32 = 54;
    pub const TOGGLE_ALT: u32 = 55;
    pub const TOGGLE_WIN: u32 = 56;
}

/// Modifiers the auxiliary keyboard can toggle and lock.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ModifierKey {
    Shift,
    Ctrl,
    Alt,
    Meta,
}

impl ModifierKey {
    /// Release order used when modifiers are reset after input.
    pub const ALL: [ModifierKey; 4] = [
        ModifierKey::Shift,
        ModifierKey::Ctrl,
        ModifierKey::Alt,
        ModifierKey::Meta,
    ];

    /// Virtual key sent for this modifier (left-hand variant).
    pub fn virtual_key_code(self) -> u16 {
        match self {
            ModifierKey::Shift => VK_LSHIFT,
            ModifierKey::Ctrl => VK_LCONTROL,
            ModifierKey::Alt => VK_LMENU,
            ModifierKey::Meta => VK_LWIN | VK_EXT_KEY,
        }
    }

    pub(crate) fn index(self) -> usize {
        self as usize
    }
}

/// What a key code translates to.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum KeyMapping {
    VirtualKey(u16),
    /// Virtual key that must carry the extended-key flag.
    ExtendedVirtualKey(u16),
    Unicode(u32),
    ToggleModifier(ModifierKey),
    KeyboardSwitch(KeyboardLayout),
}

impl KeyMapping {
    /// The code to send for key-type mappings, extended flag included.
    pub fn virtual_key_code(self) -> Option<u16> {
        match self {
            KeyMapping::VirtualKey(vk) => Some(vk),
            KeyMapping::ExtendedVirtualKey(vk) => Some(vk | VK_EXT_KEY),
            _ => None,
        }
    }
}

/// Look up a host key code in the direct table.
pub const fn host_key_mapping(code: u32) -> Option<KeyMapping> {
    use host_keys::*;
    use KeyMapping::VirtualKey;
    Some(match code {
        KEYCODE_0..=KEYCODE_9 => VirtualKey(VK_KEY_0 + (code - KEYCODE_0) as u16),
        KEYCODE_A..=KEYCODE_Z => VirtualKey(VK_KEY_A + (code - KEYCODE_A) as u16),
        KEYCODE_SPACE => VirtualKey(VK_SPACE),
        KEYCODE_ENTER => VirtualKey(VK_RETURN),
        KEYCODE_DEL => VirtualKey(VK_BACK),
        _ => return None,
    })
}

/// Look up an auxiliary-keyboard key code in the extended table.
pub const fn overlay_key_mapping(code: u32) -> Option<KeyMapping> {
    use overlay_keys::*;
    use KeyMapping::{
        ExtendedVirtualKey as Ext, KeyboardSwitch, ToggleModifier, Unicode, VirtualKey,
    };
    Some(match code {
        F1..=F12 => VirtualKey(VK_F1 + (code - F1) as u16),
        TAB => VirtualKey(VK_TAB),
        PRINT => VirtualKey(VK_PRINT),
        INSERT => Ext(VK_INSERT),
        DELETE => Ext(VK_DELETE),
        HOME => Ext(VK_HOME),
        END => Ext(VK_END),
        PAGE_UP => Ext(VK_PRIOR),
        PAGE_DOWN => Ext(VK_NEXT),

        NUMPAD_0..=NUMPAD_9 => VirtualKey(VK_NUMPAD0 + (code - NUMPAD_0) as u16),
        NUMPAD_NUMLOCK => VirtualKey(VK_NUMLOCK),
        NUMPAD_ADD => VirtualKey(VK_ADD),
        NUMPAD_COMMA => VirtualKey(VK_DECIMAL),
        NUMPAD_DIVIDE => Ext(VK_DIVIDE),
        NUMPAD_ENTER => Ext(VK_RETURN),
        NUMPAD_MULTIPLY => VirtualKey(VK_MULTIPLY),
        NUMPAD_SUBTRACT => VirtualKey(VK_SUBTRACT),
        NUMPAD_EQUALS => Unicode('=' as u32),
        NUMPAD_LEFT_PAREN => Unicode('(' as u32),
        NUMPAD_RIGHT_PAREN => Unicode(')' as u32),

        UP => Ext(VK_UP),
        DOWN => Ext(VK_DOWN),
        LEFT => Ext(VK_LEFT),
        RIGHT => Ext(VK_RIGHT),
        ENTER => Ext(VK_RETURN),
        BACKSPACE => VirtualKey(VK_BACK),

        WIN => Ext(VK_LWIN),
        MENU => Ext(VK_APPS),
        ESC => VirtualKey(VK_ESCAPE),

        FUNCTION_KEYS_KEYBOARD => KeyboardSwitch(KeyboardLayout::FunctionKeys),
        NUMPAD_KEYBOARD => KeyboardSwitch(KeyboardLayout::Numpad),
        CURSOR_KEYBOARD => KeyboardSwitch(KeyboardLayout::Cursor),

        TOGGLE_SHIFT => ToggleModifier(ModifierKey::Shift),
        TOGGLE_CTRL => ToggleModifier(ModifierKey::Ctrl),
        TOGGLE_ALT => ToggleModifier(ModifierKey::Alt),
        TOGGLE_WIN => ToggleModifier(ModifierKey::Meta),
        _ => return None,
    })
}
