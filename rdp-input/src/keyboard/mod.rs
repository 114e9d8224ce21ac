//! Keyboard translation and modifier state.
//!
//! Host key events are mapped to Windows virtual-key or Unicode input. The
//! auxiliary on-screen keyboards can additionally toggle the Shift, Ctrl, Alt
//! and Win modifiers: a toggled modifier stays pressed until the next key has
//! been sent, and hitting the same toggle twice in quick succession locks it
//! until it is toggled again.

mod keymap;
pub mod vk;

pub use keymap::{
    host_key_mapping, host_keys, overlay_key_mapping, overlay_keys, KeyMapping, ModifierKey,
};

use crate::events::{HostKeyEvent, KeyPhase, MetaState, SessionCommand};
use crate::timer::DelayedCallback;
use serde::{Deserialize, Serialize};
use tracing::{debug, trace};
use vk::{VK_F4, VK_LMENU, VK_LSHIFT};

/// Default window for a second toggle hit to lock the modifier.
pub const DEFAULT_LOCK_WINDOW_MS: u64 = 800;

/// Press state of one toggleable modifier.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct ModifierState {
    pub pressed: bool,
    pub locked: bool,
}

/// How a modifier toggle should be highlighted.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ModifierDisplayState {
    Off,
    On,
    Locked,
}

/// Translates key events and tracks toggle/lock state of the modifiers.
#[derive(Debug)]
pub struct KeyboardModifierStateMachine {
    modifiers: [ModifierState; 4],
    lock_window_ms: u64,
    /// Open while a second hit of the same toggle would lock it.
    lock_window: DelayedCallback<ModifierKey>,
}

impl Default for KeyboardModifierStateMachine {
    fn default() -> Self {
        Self::new(DEFAULT_LOCK_WINDOW_MS)
    }
}

impl KeyboardModifierStateMachine {
    pub fn new(lock_window_ms: u64) -> Self {
        Self {
            modifiers: [ModifierState::default(); 4],
            lock_window_ms,
            lock_window: DelayedCallback::new(),
        }
    }

    /// Current state of `key`.
    pub fn modifier_state(&self, key: ModifierKey) -> ModifierState {
        self.modifiers[key.index()]
    }

    /// True if any modifier is currently pressed (locked or not).
    pub fn any_modifier_pressed(&self) -> bool {
        self.modifiers.iter().any(|m| m.pressed)
    }

    /// Translate a host key event.
    ///
    /// Key-up events are ignored: every translated key is sent as a complete
    /// press and release.
    pub fn process_host_key_event(&mut self, ev: &HostKeyEvent) -> Vec<SessionCommand> {
        let mut out = Vec::new();
        match ev.phase {
            KeyPhase::Up => {}
            KeyPhase::Multiple => {
                out.extend(ev.characters.chars().map(|c| SessionCommand::UnicodeKey {
                    codepoint: c as u32,
                }));
            }
            KeyPhase::Down => {
                let modifier_active = self.any_modifier_pressed();
                let mapping = host_key_mapping(ev.key_code);

                if let Some(KeyMapping::Unicode(codepoint)) = mapping {
                    out.push(SessionCommand::UnicodeKey { codepoint });
                } else if let Some(vk) = mapping.and_then(KeyMapping::virtual_key_code) {
                    if !ev
                        .meta
                        .intersects(MetaState::ALT | MetaState::SHIFT | MetaState::SYM)
                    {
                        push_key_press(&mut out, vk);
                    } else if ev.meta.contains(MetaState::SHIFT) {
                        out.push(key(VK_LSHIFT, true));
                        push_key_press(&mut out, vk);
                        out.push(key(VK_LSHIFT, false));
                    } else if ev.unicode_char != 0 {
                        out.push(SessionCommand::UnicodeKey {
                            codepoint: ev.unicode_char,
                        });
                    }
                } else if ev.unicode_char != 0 {
                    out.push(SessionCommand::UnicodeKey {
                        codepoint: ev.unicode_char,
                    });
                }

                if out.is_empty() {
                    trace!("Dropping unmapped host key {}", ev.key_code);
                    return out;
                }
                if modifier_active {
                    self.release_modifiers(false, &mut out);
                }
            }
        }
        out
    }

    /// Translate a key of the auxiliary keyboards. `now_ms` drives the lock window.
    pub fn process_overlay_key_event(&mut self, code: u32, now_ms: u64) -> Vec<SessionCommand> {
        let mut out = Vec::new();
        let Some(mapping) = overlay_key_mapping(code) else {
            trace!("Ignoring unknown auxiliary key {}", code);
            return out;
        };

        match mapping {
            KeyMapping::ToggleModifier(modifier) => {
                self.toggle_modifier(modifier, now_ms, &mut out);
                out.push(SessionCommand::ModifierStateChanged);
            }
            KeyMapping::KeyboardSwitch(layout) => {
                out.push(SessionCommand::KeyboardLayoutChange { layout });
            }
            KeyMapping::Unicode(codepoint) => {
                out.push(SessionCommand::UnicodeKey { codepoint });
                self.release_modifiers(false, &mut out);
            }
            KeyMapping::VirtualKey(_) | KeyMapping::ExtendedVirtualKey(_) => {
                if let Some(vk) = mapping.virtual_key_code() {
                    push_key_press(&mut out, vk);
                }
                self.release_modifiers(false, &mut out);
            }
        }
        out
    }

    /// Display state of a modifier toggle key, `None` for any other code.
    pub fn modifier_display_state(&self, code: u32) -> Option<ModifierDisplayState> {
        let KeyMapping::ToggleModifier(modifier) = overlay_key_mapping(code)? else {
            return None;
        };
        let state = self.modifier_state(modifier);
        Some(match (state.pressed, state.locked) {
            (false, _) => ModifierDisplayState::Off,
            (true, false) => ModifierDisplayState::On,
            (true, true) => ModifierDisplayState::Locked,
        })
    }

    /// Release every pressed modifier, locked ones included.
    pub fn clear_all_modifiers(&mut self) -> Vec<SessionCommand> {
        let mut out = Vec::new();
        self.release_modifiers(true, &mut out);
        out
    }

    /// Forget all modifier state without sending anything (new session).
    pub fn reset(&mut self) {
        self.modifiers = [ModifierState::default(); 4];
        self.lock_window.cancel();
    }

    /// Alt+F4 as a complete key sequence.
    pub fn send_alt_f4(&self) -> Vec<SessionCommand> {
        vec![
            key(VK_LMENU, true),
            key(VK_F4, true),
            key(VK_F4, false),
            key(VK_LMENU, false),
        ]
    }

    fn toggle_modifier(
        &mut self,
        modifier: ModifierKey,
        now_ms: u64,
        out: &mut Vec<SessionCommand>,
    ) {
        let lock_hit = self.lock_window.payload() == Some(&modifier)
            && self.lock_window.is_pending(now_ms);
        let state = &mut self.modifiers[modifier.index()];

        if lock_hit {
            // The window closes so the next hit toggles (and unlocks) again
            self.lock_window.cancel();
            state.locked = true;
            debug!("{:?} locked", modifier);
            return;
        }

        self.lock_window
            .schedule(now_ms, self.lock_window_ms, modifier);
        state.locked = false;
        state.pressed = !state.pressed;
        debug!("{:?} toggled {}", modifier, if state.pressed { "on" } else { "off" });
        out.push(key(modifier.virtual_key_code(), state.pressed));
    }

    /// Release pressed modifiers in Shift, Ctrl, Alt, Win order, skipping
    /// locked ones unless `force` is set, then report the change.
    fn release_modifiers(&mut self, force: bool, out: &mut Vec<SessionCommand>) {
        for modifier in ModifierKey::ALL {
            let state = &mut self.modifiers[modifier.index()];
            if state.pressed && (!state.locked || force) {
                out.push(key(modifier.virtual_key_code(), false));
                state.pressed = false;
            }
            if force {
                state.locked = false;
            }
        }
        out.push(SessionCommand::ModifierStateChanged);
    }
}

fn key(code: u16, down: bool) -> SessionCommand {
    SessionCommand::Key { code, down }
}

fn push_key_press(out: &mut Vec<SessionCommand>, code: u16) {
    out.push(key(code, true));
    out.push(key(code, false));
}
