//! Raw host events consumed by the engine and the session commands it produces.

use bitflags::bitflags;
use rdp_common::PointF;
use serde::{Deserialize, Serialize};

/// Phase of a raw pointer event.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum PointerPhase {
    Down,
    Move,
    Up,
    Cancel,
}

/// One raw touch/pointer sample from the host, in view pixels.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct PointerEvent {
    pub pointer_id: u32,
    pub x: f32,
    pub y: f32,
    pub timestamp_ms: u64,
    pub phase: PointerPhase,
}

impl PointerEvent {
    pub fn new(pointer_id: u32, x: f32, y: f32, timestamp_ms: u64, phase: PointerPhase) -> Self {
        Self {
            pointer_id,
            x,
            y,
            timestamp_ms,
            phase,
        }
    }

    pub fn position(&self) -> PointF {
        PointF::new(self.x, self.y)
    }

    pub fn sample(&self) -> PointerSample {
        PointerSample {
            pointer_id: self.pointer_id,
            position: self.position(),
            timestamp_ms: self.timestamp_ms,
        }
    }
}

/// A captured pointer position, owned by the recognizer that recorded it.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct PointerSample {
    pub pointer_id: u32,
    pub position: PointF,
    pub timestamp_ms: u64,
}

/// Phase of a raw key event.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum KeyPhase {
    Down,
    Up,
    /// A batch of characters delivered at once (IME commit, paste).
    Multiple,
}

bitflags! {
    /// Host modifier flags attached to a key event.
    #[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
    pub struct MetaState: u32 {
        const SHIFT = 1 << 0;
        const ALT   = 1 << 1;
        const SYM   = 1 << 2;
        const CTRL  = 1 << 3;
        const META  = 1 << 4;
    }
}

/// One raw key event from the host keyboard.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct HostKeyEvent {
    pub key_code: u32,
    #[serde(default)]
    pub meta: MetaState,
    /// Unicode character the host produced for this key, 0 if none.
    #[serde(default)]
    pub unicode_char: u32,
    pub phase: KeyPhase,
    /// Characters of a [`KeyPhase::Multiple`] event.
    #[serde(default)]
    pub characters: String,
}

impl HostKeyEvent {
    /// A key-down event.
    pub fn down(key_code: u32, meta: MetaState, unicode_char: u32) -> Self {
        Self {
            key_code,
            meta,
            unicode_char,
            phase: KeyPhase::Down,
            characters: String::new(),
        }
    }

    /// A key-up event.
    pub fn up(key_code: u32) -> Self {
        Self {
            key_code,
            meta: MetaState::empty(),
            unicode_char: 0,
            phase: KeyPhase::Up,
            characters: String::new(),
        }
    }

    /// A multi-character event.
    pub fn multiple(characters: impl Into<String>) -> Self {
        Self {
            key_code: 0,
            meta: MetaState::empty(),
            unicode_char: 0,
            phase: KeyPhase::Multiple,
            characters: characters.into(),
        }
    }
}

/// Remote pointer buttons.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum MouseButton {
    Left,
    Right,
}

impl MouseButton {
    /// The other button.
    pub fn swapped(self) -> Self {
        match self {
            MouseButton::Left => MouseButton::Right,
            MouseButton::Right => MouseButton::Left,
        }
    }
}

/// Wheel direction sent to the remote session.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ScrollDirection {
    Up,
    Down,
}

impl ScrollDirection {
    pub fn inverted(self) -> Self {
        match self {
            ScrollDirection::Up => ScrollDirection::Down,
            ScrollDirection::Down => ScrollDirection::Up,
        }
    }
}

/// Auxiliary on-screen keyboards the host can switch to.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum KeyboardLayout {
    FunctionKeys,
    Numpad,
    Cursor,
}

/// Everything the engine asks the session and view layers to do.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "command", rename_all = "kebab-case")]
pub enum SessionCommand {
    /// Pointer button press/release at remote-surface coordinates.
    PointerButton {
        x: i32,
        y: i32,
        button: MouseButton,
        down: bool,
    },
    /// Pointer move to remote-surface coordinates.
    PointerMove { x: i32, y: i32 },
    /// One wheel tick.
    PointerScroll { direction: ScrollDirection },
    /// Virtual key press/release (the extended-key flag may be set).
    Key { code: u16, down: bool },
    /// A Unicode code point typed as a whole.
    UnicodeKey { codepoint: u32 },
    /// Switch the auxiliary keyboard.
    KeyboardLayoutChange { layout: KeyboardLayout },
    /// Modifier highlighting should be refreshed.
    ModifierStateChanged,
    /// A touch interaction on the session view started (view scrolling should pause).
    BeginTouch,
    /// The touch interaction ended.
    EndTouch,
    /// Zoom or scroll offset changed.
    ViewportChanged {
        scale: f32,
        scroll_x: f32,
        scroll_y: f32,
    },
    /// A fling the view layer may animate.
    Fling { velocity_x: f32, velocity_y: f32 },
    ToggleSystemKeyboard,
    ToggleExtendedKeyboard,
    /// The touch pointer overlay closed itself.
    OverlayClosed,
}

impl SessionCommand {
    /// Returns true for commands that reach the remote session (as opposed to view notifications).
    pub fn is_remote_input(&self) -> bool {
        matches!(
            self,
            SessionCommand::PointerButton { .. }
                | SessionCommand::PointerMove { .. }
                | SessionCommand::PointerScroll { .. }
                | SessionCommand::Key { .. }
                | SessionCommand::UnicodeKey { .. }
        )
    }

    /// Deliver this command to `sink`.
    pub fn dispatch(&self, sink: &mut dyn SessionSink) {
        match *self {
            SessionCommand::PointerButton { x, y, button, down } => {
                sink.send_pointer_button(x, y, button, down)
            }
            SessionCommand::PointerMove { x, y } => sink.send_pointer_move(x, y),
            SessionCommand::PointerScroll { direction } => sink.send_pointer_scroll(direction),
            SessionCommand::Key { code, down } => sink.send_key(code, down),
            SessionCommand::UnicodeKey { codepoint } => sink.send_unicode_key(codepoint),
            SessionCommand::KeyboardLayoutChange { layout } => {
                sink.on_keyboard_layout_change(layout)
            }
            SessionCommand::ModifierStateChanged => sink.on_modifier_state_changed(),
            SessionCommand::BeginTouch => sink.on_begin_touch(),
            SessionCommand::EndTouch => sink.on_end_touch(),
            SessionCommand::ViewportChanged {
                scale,
                scroll_x,
                scroll_y,
            } => sink.on_viewport_changed(scale, scroll_x, scroll_y),
            SessionCommand::Fling {
                velocity_x,
                velocity_y,
            } => sink.on_fling(velocity_x, velocity_y),
            SessionCommand::ToggleSystemKeyboard => sink.on_toggle_system_keyboard(),
            SessionCommand::ToggleExtendedKeyboard => sink.on_toggle_extended_keyboard(),
            SessionCommand::OverlayClosed => sink.on_overlay_closed(),
        }
    }
}

/// Receiver for resolved input, implemented by the session/protocol layer.
///
/// View notifications have empty default implementations.
pub trait SessionSink {
    fn send_pointer_button(&mut self, x: i32, y: i32, button: MouseButton, down: bool);
    fn send_pointer_move(&mut self, x: i32, y: i32);
    fn send_pointer_scroll(&mut self, direction: ScrollDirection);
    fn send_key(&mut self, virtual_key_code: u16, down: bool);
    fn send_unicode_key(&mut self, codepoint: u32);
    fn on_keyboard_layout_change(&mut self, layout: KeyboardLayout);
    fn on_modifier_state_changed(&mut self);

    fn on_begin_touch(&mut self) {}
    fn on_end_touch(&mut self) {}
    fn on_viewport_changed(&mut self, _scale: f32, _scroll_x: f32, _scroll_y: f32) {}
    fn on_fling(&mut self, _velocity_x: f32, _velocity_y: f32) {}
    fn on_toggle_system_keyboard(&mut self) {}
    fn on_toggle_extended_keyboard(&mut self) {}
    fn on_overlay_closed(&mut self) {}
}

/// Recording sink: collects every command in order.
impl SessionSink for Vec<SessionCommand> {
    fn send_pointer_button(&mut self, x: i32, y: i32, button: MouseButton, down: bool) {
        self.push(SessionCommand::PointerButton { x, y, button, down });
    }

    fn send_pointer_move(&mut self, x: i32, y: i32) {
        self.push(SessionCommand::PointerMove { x, y });
    }

    fn send_pointer_scroll(&mut self, direction: ScrollDirection) {
        self.push(SessionCommand::PointerScroll { direction });
    }

    fn send_key(&mut self, virtual_key_code: u16, down: bool) {
        self.push(SessionCommand::Key {
            code: virtual_key_code,
            down,
        });
    }

    fn send_unicode_key(&mut self, codepoint: u32) {
        self.push(SessionCommand::UnicodeKey { codepoint });
    }

    fn on_keyboard_layout_change(&mut self, layout: KeyboardLayout) {
        self.push(SessionCommand::KeyboardLayoutChange { layout });
    }

    fn on_modifier_state_changed(&mut self) {
        self.push(SessionCommand::ModifierStateChanged);
    }

    fn on_begin_touch(&mut self) {
        self.push(SessionCommand::BeginTouch);
    }

    fn on_end_touch(&mut self) {
        self.push(SessionCommand::EndTouch);
    }

    fn on_viewport_changed(&mut self, scale: f32, scroll_x: f32, scroll_y: f32) {
        self.push(SessionCommand::ViewportChanged {
            scale,
            scroll_x,
            scroll_y,
        });
    }

    fn on_fling(&mut self, velocity_x: f32, velocity_y: f32) {
        self.push(SessionCommand::Fling {
            velocity_x,
            velocity_y,
        });
    }

    fn on_toggle_system_keyboard(&mut self) {
        self.push(SessionCommand::ToggleSystemKeyboard);
    }

    fn on_toggle_extended_keyboard(&mut self) {
        self.push(SessionCommand::ToggleExtendedKeyboard);
    }

    fn on_overlay_closed(&mut self) {
        self.push(SessionCommand::OverlayClosed);
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_dispatch_round_trips_through_recording_sink() {
        let commands = vec![
            SessionCommand::PointerButton {
                x: 1,
                y: 2,
                button: MouseButton::Right,
                down: true,
            },
            SessionCommand::Key {
                code: 0x41,
                down: false,
            },
            SessionCommand::KeyboardLayoutChange {
                layout: KeyboardLayout::Numpad,
            },
            SessionCommand::EndTouch,
        ];
        let mut sink: Vec<SessionCommand> = Vec::new();
        for cmd in &commands {
            cmd.dispatch(&mut sink);
        }
        assert_eq!(sink, commands);
    }

    #[test]
    fn test_remote_input_classification() {
        assert!(SessionCommand::PointerMove { x: 0, y: 0 }.is_remote_input());
        assert!(SessionCommand::UnicodeKey { codepoint: 0x20 }.is_remote_input());
        assert!(!SessionCommand::ModifierStateChanged.is_remote_input());
        assert!(!SessionCommand::BeginTouch.is_remote_input());
    }

    #[test]
    fn test_command_serializes_tagged() {
        let text = toml::to_string(&SessionCommand::PointerScroll {
            direction: ScrollDirection::Down,
        })
        .unwrap();
        assert_eq!(text, "command = \"pointer-scroll\"\ndirection = \"down\"\n");
    }

    #[test]
    fn test_button_swap_and_scroll_invert() {
        assert_eq!(MouseButton::Left.swapped(), MouseButton::Right);
        assert_eq!(ScrollDirection::Up.inverted(), ScrollDirection::Down);
    }
}
