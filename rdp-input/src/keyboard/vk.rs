//! Windows virtual-key codes sent to the remote session.
//!
//! Only the codes the engine emits are listed. Keys that need the extended
//! scancode prefix are sent with [`VK_EXT_KEY`] or'ed in.

/// Extended-key flag.
pub const VK_EXT_KEY: u16 = 0x0100;

pub const VK_BACK: u16 = 0x08;
pub const VK_TAB: u16 = 0x09;
pub const VK_RETURN: u16 = 0x0D;
pub const VK_ESCAPE: u16 = 0x1B;
pub const VK_SPACE: u16 = 0x20;
pub const VK_PRIOR: u16 = 0x21; // Page Up
pub const VK_NEXT: u16 = 0x22; // Page Down
pub const VK_END: u16 = 0x23;
pub const VK_HOME: u16 = 0x24;
pub const VK_LEFT: u16 = 0x25;
pub const VK_UP: u16 = 0x26;
pub const VK_RIGHT: u16 = 0x27;
pub const VK_DOWN: u16 = 0x28;
pub const VK_PRINT: u16 = 0x2A;
pub const VK_INSERT: u16 = 0x2D;
pub const VK_DELETE: u16 = 0x2E;

pub const VK_KEY_0: u16 = 0x30;
pub const VK_KEY_9: u16 = 0x39;
pub const VK_KEY_A: u16 = 0x41;
pub const VK_KEY_Z: u16 = 0x5A;

pub const VK_LWIN: u16 = 0x5B;
pub const VK_APPS: u16 = 0x5D; // Menu key

pub const VK_NUMPAD0: u16 = 0x60;
pub const VK_NUMPAD9: u16 = 0x69;
pub const VK_MULTIPLY: u16 = 0x6A;
pub const VK_ADD: u16 = 0x6B;
pub const VK_SUBTRACT: u16 = 0x6D;
pub const VK_DECIMAL: u16 = 0x6E;
pub const VK_DIVIDE: u16 = 0x6F;

pub const VK_F1: u16 = 0x70;
pub const VK_F4: u16 = 0x73;
pub const VK_F12: u16 = 0x7B;

pub const VK_NUMLOCK: u16 = 0x90;
pub const VK_LSHIFT: u16 = 0xA0;
pub const VK_LCONTROL: u16 = 0xA2;
pub const VK_LMENU: u16 = 0xA4; // Left Alt
